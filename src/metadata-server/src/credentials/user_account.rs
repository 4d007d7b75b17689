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

//! Access tokens for [user accounts].
//!
//! These are the `authorized_user` documents created by
//! `gcloud auth application-default login`. They hold a long-lived refresh
//! token that is exchanged for short-lived access tokens.
//!
//! [user accounts]: https://cloud.google.com/docs/authentication#user-accounts

use crate::Result;
use crate::constants::{OAUTH2_TOKEN_SERVER_URL, REFRESH_TOKEN_GRANT_TYPE};
use crate::credentials::service_account::Oauth2TokenResponse;
use crate::errors::{self, CredentialsError};
use crate::token::{Token, TokenProvider};
use reqwest::Client;

#[derive(serde::Deserialize, Clone)]
pub(crate) struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("refresh_token", &"[censored]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(serde::Serialize, Debug, PartialEq)]
struct Oauth2RefreshRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
}

#[derive(Debug)]
pub(crate) struct UserTokenProvider {
    user: AuthorizedUser,
    scopes: Option<String>,
}

impl UserTokenProvider {
    pub(crate) fn new(user: AuthorizedUser, scopes: &[String]) -> Self {
        let scopes = Some(scopes.join(" ")).filter(|s| !s.is_empty());
        Self { user, scopes }
    }

    fn endpoint(&self) -> &str {
        self.user
            .token_uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(OAUTH2_TOKEN_SERVER_URL)
    }
}

#[async_trait::async_trait]
impl TokenProvider for UserTokenProvider {
    async fn token(&self) -> Result<Token> {
        const MSG: &str = "failed to refresh the user access token";
        let client = Client::new();

        let req = Oauth2RefreshRequest {
            grant_type: REFRESH_TOKEN_GRANT_TYPE,
            client_id: &self.user.client_id,
            client_secret: &self.user.client_secret,
            refresh_token: &self.user.refresh_token,
            scope: self.scopes.as_deref(),
        };
        let resp = client
            .post(self.endpoint())
            .form(&req)
            .send()
            .await
            .map_err(|e| errors::from_http_error(e, MSG))?;

        if !resp.status().is_success() {
            return Err(errors::from_http_response(resp, MSG).await);
        }
        let response = resp.json::<Oauth2TokenResponse>().await.map_err(|e| {
            let retryable = !e.is_decode();
            CredentialsError::from_source(retryable, e)
        })?;
        Ok(response.into())
    }
}
