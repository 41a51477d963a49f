pub mod commit;
pub mod config;
pub mod credentials;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod http;
pub mod strings;

pub use commit::RepositoryCommit;
pub use config::{
    default_settings_path, Environment, Platform, SettingsError, SettingsStore, SyncSettings,
};
pub use credentials::{basic_authorization, CredentialError, CredentialStore, MemoryCredentialStore};
pub use endpoint::{build_request, Endpoint};
pub use engine::{LoadingState, SyncEngine};
pub use error::{LoadError, LoginError, RequestError, StringEditError};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestClient};
pub use strings::{
    EntryConflict, FlatStrings, KeyAndValue, Language, PartitionedStrings, StringsFile,
    TranslationDictionary, CONTENT_VERSION_KEY,
};
