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

use crate::Result;
use crate::token::{Token, TokenProvider};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;

// Tokens this close to their expiration are refreshed before being handed
// out. Callers of the metadata server often cache the token for its reported
// lifetime, so they need some margin too.
const EXPIRY_DELTA: Duration = Duration::from_secs(10);

/// Reuses an access token until it is about to expire.
///
/// Errors are never cached, the next call retries the inner provider.
#[derive(Debug)]
pub(crate) struct TokenCache<T>
where
    T: TokenProvider,
{
    token: Mutex<Option<Token>>,
    inner: T,
}

// Returns true if the token has expired, or expires within `EXPIRY_DELTA`.
fn expired(token: &Token, now: OffsetDateTime) -> bool {
    token
        .expires_at
        .is_some_and(|e| e <= now + EXPIRY_DELTA)
}

impl<T: TokenProvider> TokenCache<T> {
    pub(crate) fn new(inner: T) -> TokenCache<T> {
        TokenCache {
            token: Mutex::new(None),
            inner,
        }
    }
}

#[async_trait::async_trait]
impl<T: TokenProvider> TokenProvider for TokenCache<T> {
    async fn token(&self) -> Result<Token> {
        // Holding the lock across the refresh means concurrent callers wait
        // for a single refresh instead of starting their own.
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if !expired(token, OffsetDateTime::now_utc()) {
                return Ok(token.clone());
            }
        }
        let token = self.inner.token().await?;
        *guard = Some(token.clone());
        Ok(token)
    }
}
