//! Sync engine state machine.
//!
//! Pipeline: fetch the newest commit, pull the strings file pinned to it,
//! mutate it in memory and push it back as a new commit. Operations take
//! `&mut self`, so only one pipeline can be in flight per engine.
//!
//! ```text
//! Idle -> Fetching -> Pulling -> Complete | Error
//!                                Complete -> Pushing -> Complete | Error
//! ```

use crate::commit::{CommitPage, RepositoryCommit};
use crate::config::{Environment, Platform, SettingsStore, SyncSettings};
use crate::credentials::CredentialStore;
use crate::endpoint::{build_request, Endpoint};
use crate::error::{LoadError, LoginError, RequestError, StringEditError};
use crate::http::{HttpClient, HttpResponse};
use crate::strings::{KeyAndValue, StringsFile};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

const STATE_CHANNEL_CAPACITY: usize = 32;

/// Observable phase of the engine. Never used for control decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingState {
    Idle,
    Fetching,
    Pulling,
    Pushing,
    Complete,
    Error(LoadError),
}

impl LoadingState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LoadingState::Fetching | LoadingState::Pulling | LoadingState::Pushing
        )
    }
}

pub struct SyncEngine<C, S> {
    client: C,
    credentials: S,
    settings: SettingsStore,
    hash: Option<String>,
    latest_message: Option<String>,
    latest_strings: Option<StringsFile>,
    last_pulled_at: Option<DateTime<Utc>>,
    state: LoadingState,
    events: broadcast::Sender<LoadingState>,
}

impl<C: HttpClient, S: CredentialStore> SyncEngine<C, S> {
    pub fn new(client: C, credentials: S, settings: SettingsStore) -> Self {
        let (events, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Self {
            client,
            credentials,
            settings,
            hash: None,
            latest_message: None,
            latest_strings: None,
            last_pulled_at: None,
            state: LoadingState::Idle,
            events,
        }
    }

    /// Receives every state transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LoadingState> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &LoadingState {
        &self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn credential_store(&self) -> &S {
        &self.credentials
    }

    pub fn settings(&self) -> &SyncSettings {
        self.settings.settings()
    }

    pub fn platform(&self) -> Platform {
        self.settings.platform()
    }

    pub fn pinned_hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn latest_message(&self) -> Option<&str> {
        self.latest_message.as_deref()
    }

    pub fn latest_strings(&self) -> Option<&StringsFile> {
        self.latest_strings.as_ref()
    }

    pub fn last_pulled_at(&self) -> Option<DateTime<Utc>> {
        self.last_pulled_at
    }

    /// Fetches the newest commit, pins it and pulls the strings file at that commit.
    ///
    /// A failed strings pull leaves the new commit pinned.
    pub async fn load(&mut self) -> Result<(), LoadError> {
        let result = self.fetch_and_pull().await;
        if let Err(error) = &result {
            self.record_failure(error);
        }
        result
    }

    /// Reloads, applies additions then edits, and pushes the result as a commit.
    ///
    /// The engine does not reload after the push; call [`SyncEngine::load`] to
    /// observe the new commit.
    pub async fn add_to_strings(
        &mut self,
        additions: &[KeyAndValue],
        edits: &BTreeMap<String, KeyAndValue>,
        message: &str,
    ) -> Result<(), StringEditError> {
        self.load().await?;

        let platform = self.settings.platform();
        let branch = self.settings.settings().branch_name();
        let strings = self
            .latest_strings
            .as_mut()
            .ok_or(StringEditError::NoStringsExist)?;

        if let Err(conflict) = strings.add_entries(additions) {
            warn!("not pushing strings: {conflict}");
            return Err(conflict.into());
        }
        if !edits.is_empty() {
            strings.edit_entries(edits);
        }

        let body = strings
            .serialize_for_push(Endpoint::form_key(platform), message, branch)
            .map_err(|err| StringEditError::Encode(err.to_string()))?;
        self.push(body).await
    }

    /// Persists the platform choice and re-pulls its file at the pinned commit.
    pub async fn change_platform(&mut self, platform: Platform) -> Result<(), LoadError> {
        self.settings.set_platform(platform);
        if self.latest_strings.as_ref().map(StringsFile::platform) != Some(platform) {
            self.latest_strings = None;
        }

        let result = self.pull_pinned().await;
        if let Err(error) = &result {
            self.record_failure(error);
        }
        result
    }

    /// Switches repository target. The pinned commit belongs to the old target and is dropped.
    pub fn set_environment(&mut self, environment: Environment) {
        if self.settings.environment() == environment {
            return;
        }
        self.settings.set_environment(environment);
        self.hash = None;
        self.latest_message = None;
        self.latest_strings = None;
        self.set_state(LoadingState::Idle);
    }

    /// Stores candidate credentials and keeps them only if a load succeeds with them.
    pub async fn check_credentials(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        self.credentials.store(username, password)?;

        if let Err(error) = self.load().await {
            warn!("login failed, discarding candidate credentials: {error}");
            self.credentials.delete();
            return Err(error.into());
        }
        Ok(())
    }

    async fn fetch_and_pull(&mut self) -> Result<(), LoadError> {
        let authorization = self.authorization()?;
        let commit = self.fetch_latest_commit(&authorization).await?;
        info!("pinned commit {} ({})", commit.hash(), commit.message());
        self.hash = Some(commit.hash().to_string());
        self.latest_message = Some(commit.message().to_string());

        self.pull_strings(&authorization, commit.hash()).await?;
        self.set_state(LoadingState::Complete);
        Ok(())
    }

    async fn pull_pinned(&mut self) -> Result<(), LoadError> {
        let authorization = self.authorization()?;
        let hash = self.hash.clone().ok_or(RequestError::NoCommitPinned)?;
        self.pull_strings(&authorization, &hash).await?;
        self.set_state(LoadingState::Complete);
        Ok(())
    }

    async fn fetch_latest_commit(
        &mut self,
        authorization: &str,
    ) -> Result<RepositoryCommit, RequestError> {
        self.set_state(LoadingState::Fetching);
        let request = build_request(
            &Endpoint::Commits,
            self.settings.settings(),
            authorization,
            None,
        );
        let page: CommitPage = self.client.send(request).await?.decode()?;
        page.into_latest().ok_or(RequestError::NoCommits)
    }

    async fn pull_strings(&mut self, authorization: &str, hash: &str) -> Result<(), RequestError> {
        self.set_state(LoadingState::Pulling);
        let platform = self.settings.platform();
        let request = build_request(
            &Endpoint::Strings(hash.to_string()),
            self.settings.settings(),
            authorization,
            None,
        );
        let body = self.client.send(request).await?.into_body()?;
        let strings = StringsFile::from_json(platform, &body)
            .map_err(|err| RequestError::CouldNotDecode(err.to_string()))?;

        info!("pulled {} strings at {hash}", platform.as_str());
        self.latest_strings = Some(strings);
        self.last_pulled_at = Some(Utc::now());
        Ok(())
    }

    async fn push(&mut self, body: Vec<u8>) -> Result<(), StringEditError> {
        let authorization = match self.authorization() {
            Ok(authorization) => authorization,
            Err(error) => {
                self.record_failure(&error);
                return Err(error.into());
            }
        };

        self.set_state(LoadingState::Pushing);
        let request = build_request(
            &Endpoint::Src,
            self.settings.settings(),
            &authorization,
            Some(body),
        );
        match self
            .client
            .send(request)
            .await
            .and_then(HttpResponse::ensure_success)
        {
            Ok(_) => {
                info!("pushed strings to {}", self.settings.settings().branch_name());
                self.set_state(LoadingState::Complete);
                Ok(())
            }
            Err(error) => {
                self.record_failure(&LoadError::from(error.clone()));
                Err(StringEditError::Request(error))
            }
        }
    }

    fn authorization(&self) -> Result<String, LoadError> {
        self.credentials
            .credentials()
            .ok_or(LoadError::NoCredentials)
    }

    fn record_failure(&mut self, error: &LoadError) {
        if *error == LoadError::BadCredentials {
            warn!(
                "credentials rejected, removing stored secret for {}",
                self.credentials.service()
            );
            self.credentials.delete();
        }
        self.set_state(LoadingState::Error(error.clone()));
    }

    fn set_state(&mut self, state: LoadingState) {
        debug!("loading state -> {state:?}");
        self.state = state.clone();
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(state);
    }
}
