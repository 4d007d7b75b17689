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

//! Access tokens for an [impersonated service account].
//!
//! The source credentials (found via Application Default Credentials) call
//! the IAM Credentials API to mint tokens on behalf of the target principal.
//!
//! [impersonated service account]: https://cloud.google.com/docs/authentication/use-service-account-impersonation

use crate::Result;
use crate::errors::{self, CredentialsError};
use crate::token::{Token, TokenProvider};
use http::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

pub(crate) const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);
const MSG: &str = "failed to fetch the impersonated token";

/// Returns the IAM Credentials URL for `method` on `target_principal`.
pub(crate) fn iam_url(endpoint: &str, target_principal: &str, method: &str) -> String {
    format!(
        "{}/v1/projects/-/serviceAccounts/{target_principal}:{method}",
        endpoint.trim_end_matches('/')
    )
}

/// Sends `request` authorized by a token from `source`, returning the
/// decoded JSON response.
pub(crate) async fn call_iam<R>(source: &dyn TokenProvider, request: RequestBuilder) -> Result<R>
where
    R: serde::de::DeserializeOwned,
{
    let source_token = source.token().await?;
    let response = request
        .header(
            AUTHORIZATION,
            format!("{} {}", source_token.token_type, source_token.token),
        )
        .send()
        .await
        .map_err(|e| errors::from_http_error(e, MSG))?;

    if !response.status().is_success() {
        return Err(errors::from_http_response(response, MSG).await);
    }

    response.json::<R>().await.map_err(|e| {
        let retryable = !e.is_decode();
        CredentialsError::from_source(retryable, e)
    })
}

#[derive(serde::Serialize, Debug, PartialEq)]
struct GenerateAccessTokenRequest<'a> {
    scope: &'a [String],
    lifetime: String,
}

#[derive(serde::Deserialize)]
struct GenerateAccessTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "expireTime")]
    expire_time: String,
}

#[derive(Debug)]
pub(crate) struct ImpersonatedTokenProvider {
    source: Arc<dyn TokenProvider>,
    url: String,
    scopes: Vec<String>,
}

impl ImpersonatedTokenProvider {
    pub(crate) fn new(
        source: Arc<dyn TokenProvider>,
        endpoint: &str,
        target_principal: &str,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            source,
            url: iam_url(endpoint, target_principal, "generateAccessToken"),
            scopes,
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for ImpersonatedTokenProvider {
    async fn token(&self) -> Result<Token> {
        let body = GenerateAccessTokenRequest {
            scope: &self.scopes,
            lifetime: format!("{}s", DEFAULT_LIFETIME.as_secs()),
        };
        let request = Client::new().post(&self.url).json(&body);
        let response: GenerateAccessTokenResponse =
            call_iam(self.source.as_ref(), request).await?;

        let expires_at = OffsetDateTime::parse(
            &response.expire_time,
            &time::format_description::well_known::Rfc3339,
        )
        .map_err(errors::non_retryable)?;

        Ok(Token {
            token: response.access_token,
            token_type: "Bearer".to_string(),
            expires_at: Some(expires_at),
        })
    }
}
