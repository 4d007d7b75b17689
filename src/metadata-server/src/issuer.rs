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

//! Issues the access and ID tokens served by the metadata endpoints.

use crate::credentials::CredentialSource;
use crate::errors::CredentialsError;
use crate::token::Token;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};

/// The JSON body of the `token` endpoint.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetadataToken {
    pub access_token: String,
    /// Seconds until the token expires. Zero if unknown or already expired.
    pub expires_in: i64,
    pub token_type: String,
}

impl MetadataToken {
    fn new(token: Token, now: OffsetDateTime) -> Self {
        Self {
            expires_in: expires_in(token.expires_at, now),
            access_token: token.token,
            token_type: token.token_type,
        }
    }
}

// Rounds the remaining lifetime to the nearest second.
fn expires_in(expires_at: Option<OffsetDateTime>, now: OffsetDateTime) -> i64 {
    expires_at
        .map(|e| (e - now + time::Duration::milliseconds(500)).whole_seconds())
        .unwrap_or(0)
        .max(0)
}

/// Fetches tokens from the [CredentialSource].
///
/// At most one fetch runs at a time, across both operations and all
/// requests.
#[derive(Debug)]
pub struct TokenIssuer {
    source: CredentialSource,
    lock: Mutex<()>,
    lock_timeout: Option<Duration>,
}

impl TokenIssuer {
    pub fn new(source: CredentialSource) -> Self {
        Self {
            source,
            lock: Mutex::new(()),
            lock_timeout: None,
        }
    }

    /// Fail requests that wait longer than `timeout` for another fetch to
    /// finish. By default requests wait indefinitely.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    async fn lock(&self) -> Result<MutexGuard<'_, ()>, CredentialsError> {
        let Some(timeout) = self.lock_timeout else {
            return Ok(self.lock.lock().await);
        };
        tokio::time::timeout(timeout, self.lock.lock())
            .await
            .map_err(|_| {
                CredentialsError::from_msg(
                    true,
                    format!(
                        "timed out after {} waiting for another token request",
                        humantime::format_duration(timeout)
                    ),
                )
            })
    }

    /// Returns an access token for the configured scopes.
    pub async fn access_token(&self) -> Result<MetadataToken, CredentialsError> {
        let _guard = self.lock().await?;
        let provider = match &self.source {
            CredentialSource::EnvironmentOverride(o) => {
                return Ok(MetadataToken {
                    access_token: o.access_token.clone(),
                    expires_in: 0,
                    token_type: "Bearer".to_string(),
                });
            }
            CredentialSource::Impersonated(s) => &s.access,
            CredentialSource::KeyFile(s) => &s.access,
        };
        let token = provider.token().await.inspect_err(|e| {
            tracing::error!("cannot fetch access token: {e}");
        })?;
        Ok(MetadataToken::new(token, OffsetDateTime::now_utc()))
    }

    /// Returns an ID token for `audience`.
    ///
    /// The environment override returns the same token for every audience.
    pub async fn id_token(&self, audience: &str) -> Result<String, CredentialsError> {
        let _guard = self.lock().await?;
        let provider = match &self.source {
            CredentialSource::EnvironmentOverride(o) => return Ok(o.id_token.clone()),
            CredentialSource::Impersonated(s) => &s.id_tokens,
            CredentialSource::KeyFile(s) => &s.id_tokens,
        };
        provider.id_token(audience).await.inspect_err(|e| {
            tracing::error!("cannot fetch ID token for {audience}: {e}");
        })
    }
}
