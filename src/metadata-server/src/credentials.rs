// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The credentials backing the emulated metadata server.
//!
//! Exactly one [CredentialSource] is selected at startup, using the first
//! option that applies:
//!
//! 1. Static tokens and identity from the environment, see
//!    [EnvironmentOverride].
//! 2. Impersonation of `--serviceAccountEmail`, with Application Default
//!    Credentials as the source credentials.
//! 3. A service account key (or `authorized_user`) file given by
//!    `--serviceAccountFile`.
//!
//! The source never changes afterwards.

pub(crate) mod adc;
pub(crate) mod idtoken;
pub(crate) mod impersonated;
pub(crate) mod service_account;
pub(crate) mod user_account;

use crate::BuildResult;
use crate::build_errors::Error as BuilderError;
use crate::constants::*;
use crate::token::{IdTokenProvider, TokenProvider};
use crate::token_cache::TokenCache;
use idtoken::impersonated::ImpersonatedIdTokenProvider;
use idtoken::service_account::ServiceAccountIdTokenProvider;
use impersonated::ImpersonatedTokenProvider;
use service_account::{ServiceAccountKey, ServiceAccountTokenProvider};
use std::path::PathBuf;
use std::sync::Arc;
use user_account::{AuthorizedUser, UserTokenProvider};

/// The credential mode selected at startup.
#[derive(Clone, Debug)]
pub enum CredentialSource {
    /// Static values from the environment. No token is ever fetched.
    EnvironmentOverride(EnvironmentOverride),
    /// Tokens minted for another service account through the IAM
    /// Credentials API.
    Impersonated(ImpersonatedSource),
    /// Tokens from a credentials file.
    KeyFile(KeyFileSource),
}

impl CredentialSource {
    /// The project id carried by the credentials themselves.
    ///
    /// Empty for the environment override, which has its own project id.
    pub fn embedded_project_id(&self) -> &str {
        match self {
            Self::EnvironmentOverride(_) => "",
            Self::Impersonated(s) => &s.project_id,
            Self::KeyFile(s) => &s.project_id,
        }
    }
}

/// Tokens and identity taken verbatim from environment variables.
///
/// Selected only when all of `GOOGLE_ACCESS_TOKEN`, `GOOGLE_ID_TOKEN`,
/// `GOOGLE_ACCOUNT_EMAIL`, `GOOGLE_PROJECT_ID` and
/// `GOOGLE_NUMERIC_PROJECT_ID` are set to non-empty values.
#[derive(Clone, PartialEq)]
pub struct EnvironmentOverride {
    pub access_token: String,
    pub id_token: String,
    pub account_email: String,
    pub project_id: String,
    pub numeric_project_id: String,
}

impl std::fmt::Debug for EnvironmentOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentOverride")
            .field("access_token", &"[censored]")
            .field("id_token", &"[censored]")
            .field("account_email", &self.account_email)
            .field("project_id", &self.project_id)
            .field("numeric_project_id", &self.numeric_project_id)
            .finish()
    }
}

impl EnvironmentOverride {
    /// Reads the override from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the override using `lookup` to resolve variable names.
    ///
    /// Returns `None` unless every variable resolves to a non-empty value.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Some(Self {
            access_token: get(GOOGLE_ACCESS_TOKEN_VAR)?,
            id_token: get(GOOGLE_ID_TOKEN_VAR)?,
            account_email: get(GOOGLE_ACCOUNT_EMAIL_VAR)?,
            project_id: get(GOOGLE_PROJECT_ID_VAR)?,
            numeric_project_id: get(GOOGLE_NUMERIC_PROJECT_ID_VAR)?,
        })
    }
}

/// Impersonation of a target service account.
#[derive(Clone, Debug)]
pub struct ImpersonatedSource {
    target_principal: String,
    scopes: Vec<String>,
    project_id: String,
    numeric_project_id: String,
    pub(crate) access: Arc<dyn TokenProvider>,
    pub(crate) id_tokens: Arc<dyn IdTokenProvider>,
}

impl ImpersonatedSource {
    /// The email of the impersonated service account.
    pub fn target_principal(&self) -> &str {
        &self.target_principal
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn numeric_project_id(&self) -> &str {
        &self.numeric_project_id
    }
}

/// Credentials loaded from a file.
#[derive(Clone)]
pub struct KeyFileSource {
    raw_json: String,
    scopes: Vec<String>,
    project_id: String,
    numeric_project_id: String,
    pub(crate) access: Arc<dyn TokenProvider>,
    pub(crate) id_tokens: Arc<dyn IdTokenProvider>,
}

impl std::fmt::Debug for KeyFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFileSource")
            .field("raw_json", &"[censored]")
            .field("scopes", &self.scopes)
            .field("project_id", &self.project_id)
            .field("numeric_project_id", &self.numeric_project_id)
            .field("access", &self.access)
            .field("id_tokens", &self.id_tokens)
            .finish()
    }
}

impl KeyFileSource {
    /// The file contents, exactly as read.
    pub fn raw_json(&self) -> &str {
        &self.raw_json
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn numeric_project_id(&self) -> &str {
        &self.numeric_project_id
    }
}

#[cfg(test)]
impl KeyFileSource {
    pub(crate) fn new_for_test(
        access: Arc<dyn TokenProvider>,
        id_tokens: Arc<dyn IdTokenProvider>,
    ) -> Self {
        Self {
            raw_json: "{}".to_string(),
            scopes: vec![EMAIL_SCOPE.to_string()],
            project_id: String::new(),
            numeric_project_id: String::new(),
            access,
            id_tokens,
        }
    }
}

/// The credentials documents accepted as key files and as ADC.
#[derive(serde::Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

impl CredentialsFile {
    pub(crate) fn parse(contents: &str) -> BuildResult<Self> {
        serde_json::from_str(contents).map_err(BuilderError::parsing)
    }

    pub(crate) fn credentials_type(&self) -> &'static str {
        match self {
            Self::ServiceAccount(_) => "service_account",
            Self::AuthorizedUser(_) => "authorized_user",
        }
    }

    fn project_id(&self) -> &str {
        match self {
            Self::ServiceAccount(key) => &key.project_id,
            Self::AuthorizedUser(_) => "",
        }
    }

    /// Returns a caching access token provider for `scopes`.
    pub(crate) fn access_token_provider(&self, scopes: &[String]) -> Arc<dyn TokenProvider> {
        match self {
            Self::ServiceAccount(key) => Arc::new(TokenCache::new(
                ServiceAccountTokenProvider::new(key.clone(), scopes),
            )),
            Self::AuthorizedUser(user) => {
                Arc::new(TokenCache::new(UserTokenProvider::new(user.clone(), scopes)))
            }
        }
    }

    fn id_token_provider(&self) -> Arc<dyn IdTokenProvider> {
        match self {
            Self::ServiceAccount(key) => Arc::new(ServiceAccountIdTokenProvider::new(key.clone())),
            Self::AuthorizedUser(_) => Arc::new(idtoken::Unsupported {
                credentials_type: self.credentials_type(),
            }),
        }
    }
}

/// Resolves the [CredentialSource] from the server configuration.
///
/// # Example
/// ```no_run
/// # use gce_metadata_server::credentials::{Builder, EnvironmentOverride};
/// # async fn sample() -> Result<(), gce_metadata_server::build_errors::Error> {
/// let source = Builder::default()
///     .with_scopes(["https://www.googleapis.com/auth/cloud-platform"])
///     .with_environment_override(EnvironmentOverride::from_env())
///     .with_service_account_file("/path/to/key.json")
///     .build()
///     .await?;
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Builder {
    scopes: Vec<String>,
    project_id: String,
    numeric_project_id: String,
    service_account_email: String,
    service_account_file: Option<PathBuf>,
    impersonate: bool,
    environment_override: Option<EnvironmentOverride>,
    iam_endpoint: String,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            scopes: vec![EMAIL_SCOPE.to_string()],
            project_id: String::new(),
            numeric_project_id: String::new(),
            service_account_email: String::new(),
            service_account_file: None,
            impersonate: false,
            environment_override: None,
            iam_endpoint: IAM_CREDENTIALS_ENDPOINT.to_string(),
        }
    }
}

impl Builder {
    /// Sets the scopes requested for access tokens.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn with_project_id<S: Into<String>>(mut self, v: S) -> Self {
        self.project_id = v.into();
        self
    }

    pub fn with_numeric_project_id<S: Into<String>>(mut self, v: S) -> Self {
        self.numeric_project_id = v.into();
        self
    }

    /// Sets the service account email. With impersonation, this is the
    /// target principal.
    pub fn with_service_account_email<S: Into<String>>(mut self, v: S) -> Self {
        self.service_account_email = v.into();
        self
    }

    pub fn with_service_account_file<P: Into<PathBuf>>(mut self, v: P) -> Self {
        self.service_account_file = Some(v.into());
        self
    }

    pub fn with_impersonate(mut self, v: bool) -> Self {
        self.impersonate = v;
        self
    }

    /// Sets the environment override, usually [EnvironmentOverride::from_env].
    pub fn with_environment_override(mut self, v: Option<EnvironmentOverride>) -> Self {
        self.environment_override = v;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_iam_endpoint<S: Into<String>>(mut self, v: S) -> Self {
        self.iam_endpoint = v.into();
        self
    }

    /// Selects the credential source.
    ///
    /// # Errors
    ///
    /// - A configuration error if a setting required by the selected mode is
    ///   missing.
    /// - A loading error if the key file, or the Application Default
    ///   Credentials used for impersonation, cannot be found or read.
    /// - A parsing error if that file is not a supported credentials document.
    pub async fn build(self) -> BuildResult<CredentialSource> {
        if let Some(o) = self.environment_override {
            tracing::info!("using credentials from the environment");
            return Ok(CredentialSource::EnvironmentOverride(o));
        }
        if self.impersonate {
            return self.build_impersonated().await;
        }
        self.build_key_file().await
    }

    async fn build_impersonated(self) -> BuildResult<CredentialSource> {
        for (name, value) in [
            ("numericProjectId", &self.numeric_project_id),
            ("projectId", &self.project_id),
            ("serviceAccountEmail", &self.service_account_email),
        ] {
            if value.is_empty() {
                return Err(BuilderError::missing_field(name));
            }
        }

        let source = adc::source_credentials().await?;
        let access = ImpersonatedTokenProvider::new(
            source.clone(),
            &self.iam_endpoint,
            &self.service_account_email,
            self.scopes.clone(),
        );
        let id_tokens = ImpersonatedIdTokenProvider::new(
            source,
            &self.iam_endpoint,
            &self.service_account_email,
        );
        tracing::info!("impersonating {}", self.service_account_email);
        Ok(CredentialSource::Impersonated(ImpersonatedSource {
            target_principal: self.service_account_email,
            scopes: self.scopes,
            project_id: self.project_id,
            numeric_project_id: self.numeric_project_id,
            access: Arc::new(TokenCache::new(access)),
            id_tokens: Arc::new(id_tokens),
        }))
    }

    async fn build_key_file(self) -> BuildResult<CredentialSource> {
        let path = self
            .service_account_file
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| BuilderError::missing_field("serviceAccountFile"))?;
        let raw_json = tokio::fs::read_to_string(&path).await.map_err(|e| {
            BuilderError::loading(format!("cannot read {}: {e}", path.display()))
        })?;
        let file = CredentialsFile::parse(&raw_json)?;
        tracing::info!(
            "using {} credentials from {}",
            file.credentials_type(),
            path.display()
        );
        Ok(CredentialSource::KeyFile(KeyFileSource {
            project_id: file.project_id().to_string(),
            access: file.access_token_provider(&self.scopes),
            id_tokens: file.id_token_provider(),
            raw_json,
            scopes: self.scopes,
            numeric_project_id: self.numeric_project_id,
        }))
    }
}
