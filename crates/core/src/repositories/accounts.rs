//! The identity store.
//!
//! Registration, credential verification, and admin-side patient
//! management. Email uniqueness is enforced case-insensitively under the
//! accounts write guard, so two concurrent registrations for the same
//! address cannot both pass the existence check.

use std::sync::Arc;

use chrono::Utc;
use medibook_types::{EmailAddress, NonEmptyText};
use uuid::Uuid;

use crate::account::{Account, AccountView, Role};
use crate::appointment::Appointment;
use crate::credential::CredentialHash;
use crate::error::{ClinicError, ClinicResult};
use crate::provider::Provider;
use crate::store::{Collection, Store};

use super::cascade::{delete_all_or_restore, StagedDoc};

/// Validated registration input.
#[derive(Clone, Debug)]
pub struct RegisterInput {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub password: String,
    pub phone: String,
    pub role: Role,
}

/// Service for account registration, lookup, and admin patient management.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<Store>,
}

impl AccountService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Registers a new account.
    ///
    /// A doctor registration also creates the placeholder provider profile
    /// so the doctor can log in before submitting profile details. If the
    /// profile write fails, the freshly written account is removed again.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::DuplicateEmail` if an account already exists
    /// for the address (case-insensitive), or `ClinicError::Validation`
    /// for an unacceptable password.
    pub fn register(&self, input: RegisterInput) -> ClinicResult<Account> {
        let credential = CredentialHash::derive(&input.password)?;

        let _guard = self.store.lock_write(Collection::Accounts);

        let existing: Vec<Account> = self.store.scan(Collection::Accounts)?;
        if existing.iter().any(|a| a.email == input.email) {
            return Err(ClinicError::DuplicateEmail(input.email.to_string()));
        }

        let account = Account {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            credential,
            role: input.role,
            created_at: Utc::now(),
        };
        self.store.put(Collection::Accounts, &account.id, &account)?;

        if account.role == Role::Doctor {
            let profile = Provider::placeholder(account.id);
            if let Err(profile_error) =
                self.store.put(Collection::Providers, &profile.id, &profile)
            {
                if let Err(rollback_error) =
                    self.store.remove(Collection::Accounts, &account.id)
                {
                    return Err(ClinicError::CascadeRollbackFailed {
                        collection: Collection::Providers.dir_name(),
                        delete_error: Box::new(profile_error),
                        rollback_error: Box::new(rollback_error),
                    });
                }
                return Err(profile_error);
            }
        }

        Ok(account)
    }

    /// Verifies a login credential and returns the matching account.
    ///
    /// Unknown address and wrong password both map to
    /// `ClinicError::InvalidCredentials` so callers cannot probe which
    /// addresses are registered.
    pub fn login(&self, email: &str, password: &str) -> ClinicResult<Account> {
        let normalized = email.trim().to_ascii_lowercase();

        let accounts: Vec<Account> = self.store.scan(Collection::Accounts)?;
        let account = accounts
            .into_iter()
            .find(|a| a.email.as_str() == normalized)
            .ok_or(ClinicError::InvalidCredentials)?;

        if !account.credential.verify(password) {
            return Err(ClinicError::InvalidCredentials);
        }

        Ok(account)
    }

    /// Loads an account by id.
    pub fn get(&self, id: Uuid) -> ClinicResult<Account> {
        self.store
            .get(Collection::Accounts, &id)?
            .ok_or(ClinicError::AccountNotFound)
    }

    /// Lists every patient-role account, credential-free.
    pub fn list_patients(&self) -> ClinicResult<Vec<AccountView>> {
        let accounts: Vec<Account> = self.store.scan(Collection::Accounts)?;
        let mut patients: Vec<AccountView> = accounts
            .iter()
            .filter(|a| a.role == Role::Patient)
            .map(Account::view)
            .collect();
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(patients)
    }

    /// Deletes a patient account and every appointment that references it,
    /// as one compensated sequence.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::AccountNotFound` if the id does not resolve
    /// to a patient-role account.
    pub fn delete_patient(&self, id: Uuid) -> ClinicResult<()> {
        let _guards = self.store.lock_all_write();

        let account: Account = self
            .store
            .get(Collection::Accounts, &id)?
            .filter(|a: &Account| a.role == Role::Patient)
            .ok_or(ClinicError::AccountNotFound)?;

        let appointments: Vec<Appointment> = self.store.scan(Collection::Appointments)?;

        let mut staged = Vec::new();
        for appointment in appointments.iter().filter(|a| a.patient_id == id) {
            staged.push(StagedDoc::new(
                Collection::Appointments,
                appointment.id,
                appointment,
            )?);
        }
        staged.push(StagedDoc::new(Collection::Accounts, account.id, &account)?);

        delete_all_or_restore(&self.store, &staged)
    }
}
