/// Error taxonomy for the sync pipeline
use crate::credentials::CredentialError;
use crate::strings::EntryConflict;
use thiserror::Error;

/// Failures of a single HTTP exchange with the repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Received response code: {0}")]
    BadResponseCode(u16),
    #[error("Could not decode: {0}")]
    CouldNotDecode(String),
    #[error("No response")]
    NoResponse,
    #[error("Request error: {0}")]
    Transport(String),
    #[error("Incorrect username or password")]
    BadCredentials,
    #[error("User has no credentials stored")]
    NoCredentials,
    #[error("Repository returned no commits")]
    NoCommits,
    #[error("No commit has been loaded yet")]
    NoCommitPinned,
}

/// Outcome of a failed `load`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("User has no credentials stored")]
    NoCredentials,
    #[error("Incorrect username or password")]
    BadCredentials,
    #[error(transparent)]
    Request(RequestError),
}

impl From<RequestError> for LoadError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::BadCredentials => LoadError::BadCredentials,
            RequestError::NoCredentials => LoadError::NoCredentials,
            other => LoadError::Request(other),
        }
    }
}

/// Outcome of a failed credential check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Incorrect username or password")]
    BadCredentials,
    #[error("Could not save credentials: {0}")]
    CredentialStore(#[from] CredentialError),
    #[error(transparent)]
    Load(LoadError),
}

impl From<LoadError> for LoginError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::BadCredentials | LoadError::NoCredentials => LoginError::BadCredentials,
            other => LoginError::Load(other),
        }
    }
}

/// Outcome of a failed add/edit/push round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StringEditError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Request(RequestError),
    #[error("Request returned no strings")]
    NoStringsExist,
    #[error("\"{0}\" already exists in the json")]
    KeyAlreadyExists(String),
    #[error("{0}")]
    InvalidEntry(EntryConflict),
    #[error("Could not encode strings: {0}")]
    Encode(String),
}

impl From<EntryConflict> for StringEditError {
    fn from(conflict: EntryConflict) -> Self {
        match conflict {
            EntryConflict::DuplicateKey(key) => StringEditError::KeyAlreadyExists(key),
            other => StringEditError::InvalidEntry(other),
        }
    }
}
