use medibook_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("an account already exists for {0}")]
    DuplicateEmail(String),
    #[error("time slot already booked")]
    SlotTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account not found")]
    AccountNotFound,
    #[error("doctor not found")]
    ProviderNotFound,
    #[error("appointment not found")]
    AppointmentNotFound,
    #[error("doctor not found or not approved")]
    ProviderUnavailable,
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("storage unavailable after {attempts} attempts: {last_error}")]
    StorageUnavailable {
        attempts: u32,
        #[source]
        last_error: std::io::Error,
    },
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(serde_json::Error),
    #[error(
        "cascade delete failed and rollback also failed (collection: {collection}): \
         delete={delete_error}; rollback={rollback_error}"
    )]
    CascadeRollbackFailed {
        collection: &'static str,
        #[source]
        delete_error: Box<ClinicError>,
        rollback_error: Box<ClinicError>,
    },
}

impl From<TextError> for ClinicError {
    fn from(err: TextError) -> Self {
        ClinicError::Validation(err.to_string())
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
