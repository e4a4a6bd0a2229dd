//! Compensated multi-document deletion.
//!
//! The store has no cross-document transactions, so cascading deletes stage
//! a copy of every document before touching any of them. If a later delete
//! fails, the already-deleted documents are written back from the staged
//! copies; if that restoration also fails the caller gets a
//! [`ClinicError::CascadeRollbackFailed`] carrying both errors. Either way,
//! a cascade never leaves a silently half-deleted graph.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ClinicError, ClinicResult};
use crate::store::{Collection, Store};

/// A document staged for deletion, retaining enough to restore it.
pub(crate) struct StagedDoc {
    pub collection: Collection,
    pub id: Uuid,
    body: Value,
}

impl StagedDoc {
    pub fn new<T: Serialize>(collection: Collection, id: Uuid, doc: &T) -> ClinicResult<Self> {
        Ok(Self {
            collection,
            id,
            body: serde_json::to_value(doc).map_err(ClinicError::Serialization)?,
        })
    }
}

/// Deletes every staged document in order, restoring the prefix already
/// deleted if any step fails.
///
/// Staging order is deletion order; callers stage dependents first
/// (appointments before the account that owns them) so a partial failure
/// can never leave a dangling reference behind.
pub(crate) fn delete_all_or_restore(store: &Store, staged: &[StagedDoc]) -> ClinicResult<()> {
    for (deleted_so_far, doc) in staged.iter().enumerate() {
        let delete_error = match store.remove(doc.collection, &doc.id) {
            Ok(_) => continue,
            Err(e) => e,
        };

        for restored in &staged[..deleted_so_far] {
            if let Err(rollback_error) =
                store.put(restored.collection, &restored.id, &restored.body)
            {
                return Err(ClinicError::CascadeRollbackFailed {
                    collection: doc.collection.dir_name(),
                    delete_error: Box::new(delete_error),
                    rollback_error: Box::new(rollback_error),
                });
            }
        }

        return Err(delete_error);
    }

    Ok(())
}
