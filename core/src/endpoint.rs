/// Maps logical repository operations onto concrete requests
use crate::config::{Platform, SyncSettings};
use crate::http::{HttpMethod, HttpRequest};

pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Newest-first commit listing.
    Commits,
    /// Strings file of the active platform at a pinned commit.
    Strings(String),
    /// Commit upload.
    Src,
}

impl Endpoint {
    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Commits | Endpoint::Strings(_) => HttpMethod::Get,
            Endpoint::Src => HttpMethod::Post,
        }
    }

    pub fn path(&self, platform: Platform) -> String {
        match self {
            Endpoint::Commits => "commits".to_string(),
            Endpoint::Strings(hash) => platform.platform_path(hash),
            Endpoint::Src => "src".to_string(),
        }
    }

    pub fn url(&self, settings: &SyncSettings) -> String {
        format!("{}/{}", settings.base_url(), self.path(settings.platform))
    }

    /// Form field that carries the file contents on push.
    pub fn form_key(platform: Platform) -> &'static str {
        platform.file_location()
    }
}

/// Builds an authenticated request. `authorization` is the stored Basic secret.
pub fn build_request(
    endpoint: &Endpoint,
    settings: &SyncSettings,
    authorization: &str,
    body: Option<Vec<u8>>,
) -> HttpRequest {
    let mut request = HttpRequest::new(endpoint.method(), endpoint.url(settings))
        .with_header("Authorization", format!("Basic {authorization}"))
        .with_header("Cache-Control", "no-cache");
    if let Some(body) = body {
        request = request
            .with_header("Content-Type", FORM_URL_ENCODED)
            .with_body(body);
    }
    request
}
