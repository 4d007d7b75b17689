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

//! Identity (OIDC) tokens.
//!
//! Every call fetches a fresh token for the requested audience. Nothing here
//! caches: tokens minted for one audience are never handed out for another.

pub(crate) mod impersonated;
pub(crate) mod service_account;

use crate::Result;
use crate::errors;
use crate::token::IdTokenProvider;

/// Credentials that cannot mint ID tokens, such as user accounts.
#[derive(Debug)]
pub(crate) struct Unsupported {
    pub(crate) credentials_type: &'static str,
}

#[async_trait::async_trait]
impl IdTokenProvider for Unsupported {
    async fn id_token(&self, _audience: &str) -> Result<String> {
        Err(errors::non_retryable_from_str(format!(
            "ID tokens are not supported for `{}` credentials",
            self.credentials_type
        )))
    }
}
