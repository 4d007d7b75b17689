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
use crate::credentials::service_account::{ServiceAccountKey, exchange_assertion};
use crate::token::IdTokenProvider;

#[derive(serde::Deserialize)]
struct IdTokenResponse {
    id_token: String,
}

/// ID tokens signed by Google for a service account key.
///
/// The key signs an assertion carrying the audience as `target_audience`,
/// which the OAuth endpoint exchanges for an ID token.
#[derive(Debug)]
pub(crate) struct ServiceAccountIdTokenProvider {
    service_account_key: ServiceAccountKey,
}

impl ServiceAccountIdTokenProvider {
    pub(crate) fn new(service_account_key: ServiceAccountKey) -> Self {
        Self {
            service_account_key,
        }
    }
}

#[async_trait::async_trait]
impl IdTokenProvider for ServiceAccountIdTokenProvider {
    async fn id_token(&self, audience: &str) -> Result<String> {
        let key = &self.service_account_key;
        let claims = key.claims(None, Some(audience.to_string()));
        let assertion = key.assertion(&claims)?;
        let response = exchange_assertion::<IdTokenResponse>(key.token_uri(), assertion).await?;
        Ok(response.id_token)
    }
}
