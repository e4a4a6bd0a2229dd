//! The provider directory.
//!
//! Listing and detail reads with approval-based visibility, doctor-owned
//! profile and availability updates, and the admin operations (approval,
//! cascading deletion).

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::account::Account;
use crate::appointment::Appointment;
use crate::error::{ClinicError, ClinicResult};
use crate::provider::{AvailabilitySlot, Provider, ProviderView, Specialization};
use crate::store::{Collection, Store};

use super::cascade::{delete_all_or_restore, StagedDoc};

/// A doctor's profile update, already parsed into domain types.
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
    pub specialization: Specialization,
    pub experience_years: i32,
    pub qualifications: String,
    pub consultation_fee: f64,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

/// Service for the provider directory.
#[derive(Clone)]
pub struct ProviderService {
    store: Arc<Store>,
}

impl ProviderService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Lists providers.
    ///
    /// Non-admin callers (`include_unapproved == false`) only ever see
    /// approved profiles. An optional specialization narrows the result.
    /// Listings omit availability slots; use [`Self::get_approved`] or
    /// [`Self::profile_for_account`] for the full detail view.
    pub fn list(
        &self,
        filter: Option<Specialization>,
        include_unapproved: bool,
    ) -> ClinicResult<Vec<ProviderView>> {
        let providers: Vec<Provider> = self.store.scan(Collection::Providers)?;
        let accounts = self.account_index()?;

        let mut views: Vec<ProviderView> = providers
            .into_iter()
            .filter(|p| include_unapproved || p.is_approved)
            .filter(|p| filter.map_or(true, |wanted| p.specialization == wanted))
            .map(|p| join_view(p, &accounts, false))
            .collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }

    /// Loads a single approved provider with its availability.
    ///
    /// Unapproved profiles are indistinguishable from absent ones here
    /// (both are `ProviderNotFound`), so the approval flag fully gates
    /// patient visibility.
    pub fn get_approved(&self, provider_id: Uuid) -> ClinicResult<ProviderView> {
        let provider: Provider = self
            .store
            .get(Collection::Providers, &provider_id)?
            .filter(|p: &Provider| p.is_approved)
            .ok_or(ClinicError::ProviderNotFound)?;

        let accounts = self.account_index()?;
        Ok(join_view(provider, &accounts, true))
    }

    /// Loads the profile owned by the given doctor account.
    pub fn profile_for_account(&self, account_id: Uuid) -> ClinicResult<ProviderView> {
        let provider = self.find_by_account(account_id)?;
        let accounts = self.account_index()?;
        Ok(join_view(provider, &accounts, true))
    }

    /// Applies a doctor's update to their own profile.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` for negative experience or fee,
    /// and `ClinicError::ProviderNotFound` if the account owns no profile.
    pub fn update_profile(
        &self,
        account_id: Uuid,
        update: ProfileUpdate,
    ) -> ClinicResult<ProviderView> {
        if update.experience_years < 0 {
            return Err(ClinicError::Validation(
                "experience must be non-negative".into(),
            ));
        }
        if !(update.consultation_fee >= 0.0) || !update.consultation_fee.is_finite() {
            return Err(ClinicError::Validation(
                "consultation fee must be non-negative".into(),
            ));
        }

        let _guard = self.store.lock_write(Collection::Providers);

        let mut provider = self.find_by_account(account_id)?;
        provider.specialization = update.specialization;
        provider.experience_years = update.experience_years;
        provider.qualifications = update.qualifications;
        provider.consultation_fee = update.consultation_fee;
        if let Some(bio) = update.bio {
            provider.bio = bio;
        }
        if let Some(image) = update.profile_image {
            provider.profile_image = image;
        }

        self.store
            .put(Collection::Providers, &provider.id, &provider)?;

        let accounts = self.account_index()?;
        Ok(join_view(provider, &accounts, true))
    }

    /// Replaces the full weekly availability list atomically.
    ///
    /// Each window must have `start < end`; overlap between windows is
    /// accepted; the permissive behaviour is intentional (see the tests).
    pub fn set_availability(
        &self,
        account_id: Uuid,
        slots: Vec<AvailabilitySlot>,
    ) -> ClinicResult<ProviderView> {
        for slot in &slots {
            if slot.start_time >= slot.end_time {
                return Err(ClinicError::Validation(format!(
                    "slot {} {}-{} must start before it ends",
                    slot.day, slot.start_time, slot.end_time
                )));
            }
        }

        let _guard = self.store.lock_write(Collection::Providers);

        let mut provider = self.find_by_account(account_id)?;
        provider.available_slots = slots;
        self.store
            .put(Collection::Providers, &provider.id, &provider)?;

        let accounts = self.account_index()?;
        Ok(join_view(provider, &accounts, true))
    }

    /// Sets the approval flag. Idempotent: approving an approved provider
    /// is a no-op that still returns the profile.
    pub fn approve(&self, provider_id: Uuid) -> ClinicResult<ProviderView> {
        let _guard = self.store.lock_write(Collection::Providers);

        let mut provider: Provider = self
            .store
            .get(Collection::Providers, &provider_id)?
            .ok_or(ClinicError::ProviderNotFound)?;

        if !provider.is_approved {
            provider.is_approved = true;
            self.store
                .put(Collection::Providers, &provider.id, &provider)?;
        }

        let accounts = self.account_index()?;
        Ok(join_view(provider, &accounts, true))
    }

    /// Deletes a provider, cascading over every appointment that references
    /// it and the owning doctor account, as one compensated sequence.
    ///
    /// Deletion order is appointments, then the account, then the profile,
    /// so a partial failure can never leave appointments pointing at a
    /// missing profile.
    pub fn delete(&self, provider_id: Uuid) -> ClinicResult<()> {
        let _guards = self.store.lock_all_write();

        let provider: Provider = self
            .store
            .get(Collection::Providers, &provider_id)?
            .ok_or(ClinicError::ProviderNotFound)?;

        let appointments: Vec<Appointment> = self.store.scan(Collection::Appointments)?;

        let mut staged = Vec::new();
        for appointment in appointments.iter().filter(|a| a.provider_id == provider_id) {
            staged.push(StagedDoc::new(
                Collection::Appointments,
                appointment.id,
                appointment,
            )?);
        }
        let owning_account: Option<Account> =
            self.store.get(Collection::Accounts, &provider.account_id)?;
        if let Some(account) = &owning_account {
            staged.push(StagedDoc::new(Collection::Accounts, account.id, account)?);
        }
        staged.push(StagedDoc::new(
            Collection::Providers,
            provider.id,
            &provider,
        )?);

        delete_all_or_restore(&self.store, &staged)
    }

    /// Finds the profile owned by an account id.
    pub fn find_by_account(&self, account_id: Uuid) -> ClinicResult<Provider> {
        let providers: Vec<Provider> = self.store.scan(Collection::Providers)?;
        providers
            .into_iter()
            .find(|p| p.account_id == account_id)
            .ok_or(ClinicError::ProviderNotFound)
    }

    fn account_index(&self) -> ClinicResult<HashMap<Uuid, Account>> {
        let accounts: Vec<Account> = self.store.scan(Collection::Accounts)?;
        Ok(accounts.into_iter().map(|a| (a.id, a)).collect())
    }
}

fn join_view(
    provider: Provider,
    accounts: &HashMap<Uuid, Account>,
    include_slots: bool,
) -> ProviderView {
    let (name, email, phone) = match accounts.get(&provider.account_id) {
        Some(account) => (
            account.name.to_string(),
            account.email.to_string(),
            account.phone.clone(),
        ),
        None => {
            tracing::warn!(
                "provider {} references missing account {}",
                provider.id,
                provider.account_id
            );
            (String::new(), String::new(), String::new())
        }
    };

    ProviderView {
        id: provider.id,
        account_id: provider.account_id,
        name,
        email,
        phone,
        specialization: provider.specialization,
        experience_years: provider.experience_years,
        qualifications: provider.qualifications,
        consultation_fee: provider.consultation_fee,
        bio: provider.bio,
        profile_image: provider.profile_image,
        available_slots: include_slots.then_some(provider.available_slots),
        is_approved: provider.is_approved,
        rating: provider.rating,
        rating_count: provider.rating_count,
        created_at: provider.created_at,
    }
}
