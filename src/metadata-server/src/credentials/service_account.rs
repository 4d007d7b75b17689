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

//! Access tokens from a [service account key].
//!
//! The key signs a JWT assertion which is exchanged at the OAuth token
//! endpoint using the two-legged flow described in [RFC 7523]. The same
//! assertion, with a `target_audience` claim instead of a scope, yields ID
//! tokens (see [crate::credentials::idtoken]).
//!
//! [service account key]: https://cloud.google.com/iam/docs/keys-create-delete#creating
//! [RFC 7523]: https://datatracker.ietf.org/doc/html/rfc7523

pub(crate) mod jws;

use crate::Result;
use crate::constants::{JWT_BEARER_GRANT_TYPE, OAUTH2_TOKEN_SERVER_URL};
use crate::errors::{self, CredentialsError};
use crate::token::{Token, TokenProvider};
use jws::{CLOCK_SKEW_FUDGE, DEFAULT_TOKEN_TIMEOUT, JwsClaims, JwsHeader};
use reqwest::Client;
use rustls::crypto::CryptoProvider;
use rustls::sign::Signer;
use rustls_pki_types::{PrivateKeyDer, pem::PemObject};
use serde::de::DeserializeOwned;
use std::time::Duration;
use time::OffsetDateTime;

/// A [service account key] in the format described by [aip/4112].
///
/// [aip/4112]: https://google.aip.dev/auth/4112
/// [service account key]: https://cloud.google.com/iam/docs/keys-create-delete#creating
#[derive(serde::Deserialize, Default, Clone)]
pub(crate) struct ServiceAccountKey {
    /// The client email address of the service account.
    pub client_email: String,
    /// ID of the service account's private key.
    #[serde(default)]
    pub private_key_id: String,
    /// The PEM-encoded PKCS#8 private key.
    pub private_key: String,
    /// The project id the service account belongs to.
    #[serde(default)]
    pub project_id: String,
    /// Where to exchange assertions. Defaults to the Google OAuth endpoint.
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[censored]")
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub(crate) fn token_uri(&self) -> &str {
        self.token_uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(OAUTH2_TOKEN_SERVER_URL)
    }

    /// Returns claims valid for one hour, issued by this service account.
    pub(crate) fn claims(
        &self,
        scope: Option<String>,
        target_audience: Option<String>,
    ) -> JwsClaims {
        // The claims encode a unix timestamp, backdated to tolerate skew.
        let now = OffsetDateTime::now_utc() - CLOCK_SKEW_FUDGE;
        JwsClaims {
            iss: self.client_email.clone(),
            scope,
            aud: self.token_uri().to_string(),
            exp: now + DEFAULT_TOKEN_TIMEOUT,
            iat: now,
            sub: Some(self.client_email.clone()),
            target_audience,
        }
    }

    /// Returns the signed, compact-serialized JWT for `claims`.
    pub(crate) fn assertion(&self, claims: &JwsClaims) -> Result<String> {
        let signer = self.signer()?;
        let header = JwsHeader {
            alg: "RS256",
            typ: "JWT",
            kid: Some(self.private_key_id.as_str()).filter(|k| !k.is_empty()),
        };
        let encoded_header_claims = format!("{}.{}", header.encode()?, claims.encode()?);
        let sig = signer
            .sign(encoded_header_claims.as_bytes())
            .map_err(errors::non_retryable)?;
        use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
        Ok(format!(
            "{}.{}",
            encoded_header_claims,
            &BASE64_URL_SAFE_NO_PAD.encode(sig)
        ))
    }

    // Creates a signer using the private key stored in the service account file.
    fn signer(&self) -> Result<Box<dyn Signer>> {
        let key_provider = CryptoProvider::get_default().map_or_else(
            || rustls::crypto::aws_lc_rs::default_provider().key_provider,
            |p| p.key_provider,
        );

        let private_key = PrivateKeyDer::from_pem_slice(self.private_key.as_bytes())
            .map_err(errors::non_retryable)?;
        let sk = key_provider
            .load_private_key(private_key)
            .map_err(errors::non_retryable)?;
        sk.choose_scheme(&[rustls::SignatureScheme::RSA_PKCS1_SHA256])
            .ok_or_else(|| {
                errors::non_retryable_from_str(
                    "unable to choose RSA_PKCS1_SHA256 signing scheme as it is not supported by current signer",
                )
            })
    }
}

/// Exchanges a signed assertion at `token_uri` and decodes the JSON response.
pub(crate) async fn exchange_assertion<R>(token_uri: &str, assertion: String) -> Result<R>
where
    R: DeserializeOwned,
{
    const MSG: &str = "failed to exchange the service account assertion";
    let client = Client::new();
    let response = client
        .post(token_uri)
        .form(&[
            ("grant_type", JWT_BEARER_GRANT_TYPE.to_string()),
            ("assertion", assertion),
        ])
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

#[derive(serde::Deserialize)]
pub(crate) struct Oauth2TokenResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn bearer() -> String {
    "Bearer".to_string()
}

impl From<Oauth2TokenResponse> for Token {
    fn from(response: Oauth2TokenResponse) -> Self {
        Token {
            token: response.access_token,
            token_type: response.token_type,
            expires_at: response
                .expires_in
                .map(|d| OffsetDateTime::now_utc() + Duration::from_secs(d)),
        }
    }
}

/// Access tokens for the configured scopes from a service account key.
#[derive(Debug)]
pub(crate) struct ServiceAccountTokenProvider {
    service_account_key: ServiceAccountKey,
    scopes: String,
}

impl ServiceAccountTokenProvider {
    pub(crate) fn new(service_account_key: ServiceAccountKey, scopes: &[String]) -> Self {
        Self {
            service_account_key,
            scopes: scopes.join(" "),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn token(&self) -> Result<Token> {
        let key = &self.service_account_key;
        let claims = key.claims(Some(self.scopes.clone()), None);
        let assertion = key.assertion(&claims)?;
        let response =
            exchange_assertion::<Oauth2TokenResponse>(key.token_uri(), assertion).await?;
        Ok(response.into())
    }
}
