// Copyright 2024 Google LLC
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

//! Types and traits to work with access and identity tokens.

use crate::Result;
use time::OffsetDateTime;

/// Represents an access token returned by a token provider.
#[derive(Clone, PartialEq)]
pub struct Token {
    /// The actual token string.
    pub token: String,

    /// The type of the token, typically `"Bearer"`.
    pub token_type: String,

    /// The UTC instant at which the token expires.
    ///
    /// If `None`, the token does not expire, or the provider did not say.
    pub expires_at: Option<OffsetDateTime>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("token", &"[censored]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Fetches access tokens from an identity provider.
#[async_trait::async_trait]
pub(crate) trait TokenProvider: std::fmt::Debug + Send + Sync {
    async fn token(&self) -> Result<Token>;
}

/// Fetches identity tokens for a given audience.
///
/// Implementations must not reuse a token across audiences.
#[async_trait::async_trait]
pub(crate) trait IdTokenProvider: std::fmt::Debug + Send + Sync {
    async fn id_token(&self, audience: &str) -> Result<String>;
}
