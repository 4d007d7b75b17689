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

//! Project and service account identity reported by the metadata endpoints.

use crate::constants::DEFAULT_ALIAS;
use crate::credentials::CredentialSource;

/// The service account email cannot be derived from the key file.
///
/// Reported per request. The server keeps running.
#[derive(thiserror::Error, Debug)]
pub enum EmailError {
    #[error("cannot parse the credentials file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("credentials of type `{0}` have no service account email")]
    NotServiceAccount(String),
}

#[derive(serde::Deserialize)]
struct ClientEmail {
    #[serde(rename = "type")]
    credentials_type: String,
    #[serde(default)]
    client_email: String,
}

/// Derives identity values from the credential source and the configuration.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    source: CredentialSource,
    project_id: String,
    service_account_email: String,
    scopes: Vec<String>,
}

impl IdentityResolver {
    pub fn new(source: CredentialSource) -> Self {
        Self {
            source,
            project_id: String::new(),
            service_account_email: String::new(),
            scopes: Vec::new(),
        }
    }

    /// Sets the explicitly configured project id. Empty means not configured.
    pub fn with_project_id<S: Into<String>>(mut self, v: S) -> Self {
        self.project_id = v.into();
        self
    }

    /// Sets the explicitly configured email. Empty means not configured.
    pub fn with_service_account_email<S: Into<String>>(mut self, v: S) -> Self {
        self.service_account_email = v.into();
        self
    }

    pub fn with_scopes(mut self, v: Vec<String>) -> Self {
        self.scopes = v;
        self
    }

    /// The override, then the configured value, then the project id in the
    /// credentials.
    pub fn project_id(&self) -> &str {
        if let CredentialSource::EnvironmentOverride(o) = &self.source {
            return &o.project_id;
        }
        if !self.project_id.is_empty() {
            return &self.project_id;
        }
        self.source.embedded_project_id()
    }

    /// The override, then the configured value.
    ///
    /// Unlike [Self::project_id] there is no fallback to the credentials.
    pub fn numeric_project_id(&self) -> &str {
        match &self.source {
            CredentialSource::EnvironmentOverride(o) => &o.numeric_project_id,
            CredentialSource::Impersonated(s) => s.numeric_project_id(),
            CredentialSource::KeyFile(s) => s.numeric_project_id(),
        }
    }

    /// The override, then the configured value, then the `client_email` of
    /// the key file.
    pub fn service_account_email(&self) -> Result<String, EmailError> {
        let key_file = match &self.source {
            CredentialSource::EnvironmentOverride(o) => return Ok(o.account_email.clone()),
            _ if !self.service_account_email.is_empty() => {
                return Ok(self.service_account_email.clone());
            }
            CredentialSource::Impersonated(s) => return Ok(s.target_principal().to_string()),
            CredentialSource::KeyFile(s) => s,
        };
        let parsed = serde_json::from_str::<ClientEmail>(key_file.raw_json())?;
        if parsed.credentials_type != "service_account" {
            return Err(EmailError::NotServiceAccount(parsed.credentials_type));
        }
        Ok(parsed.client_email)
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn aliases(&self) -> &str {
        DEFAULT_ALIAS
    }
}
