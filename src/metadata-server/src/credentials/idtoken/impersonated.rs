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

use crate::Result;
use crate::credentials::impersonated::{call_iam, iam_url};
use crate::token::{IdTokenProvider, TokenProvider};
use reqwest::Client;
use std::sync::Arc;

#[derive(serde::Serialize, Debug, PartialEq)]
struct GenerateIdTokenRequest<'a> {
    audience: &'a str,
    #[serde(rename = "includeEmail")]
    include_email: bool,
}

#[derive(serde::Deserialize)]
struct GenerateIdTokenResponse {
    token: String,
}

/// ID tokens for an impersonated service account.
///
/// Tokens always include the `email` claim.
#[derive(Debug)]
pub(crate) struct ImpersonatedIdTokenProvider {
    source: Arc<dyn TokenProvider>,
    url: String,
}

impl ImpersonatedIdTokenProvider {
    pub(crate) fn new(
        source: Arc<dyn TokenProvider>,
        endpoint: &str,
        target_principal: &str,
    ) -> Self {
        Self {
            source,
            url: iam_url(endpoint, target_principal, "generateIdToken"),
        }
    }
}

#[async_trait::async_trait]
impl IdTokenProvider for ImpersonatedIdTokenProvider {
    async fn id_token(&self, audience: &str) -> Result<String> {
        let body = GenerateIdTokenRequest {
            audience,
            include_email: true,
        };
        let request = Client::new().post(&self.url).json(&body);
        let response: GenerateIdTokenResponse = call_iam(self.source.as_ref(), request).await?;
        Ok(response.token)
    }
}
