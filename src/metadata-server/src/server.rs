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

//! The HTTP surface of the metadata server.
//!
//! Every request must name one of the metadata hosts, and every request other
//! than `/` must carry the `Metadata-Flavor` header. Client libraries rely on
//! both checks to detect a real metadata server.

use crate::attributes::AttributeStore;
use crate::constants::{METADATA_FLAVOR, METADATA_FLAVOR_VALUE, METADATA_HOSTS, SERVER_NAME};
use crate::identity::IdentityResolver;
use crate::issuer::TokenIssuer;
use axum::Router;
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{CONTENT_TYPE, HOST, LOCATION, SERVER};
use axum::http::{HeaderName, HeaderValue, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::collections::HashMap;
use std::sync::Arc;

const APPLICATION_TEXT: &str = "application/text";
const APPLICATION_JSON: &str = "application/json";
const TEXT_HTML: &str = "text/html";
const ERROR_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

const PROJECT_ID: &str = "/computeMetadata/v1/project/project-id";
const NUMERIC_PROJECT_ID: &str = "/computeMetadata/v1/project/numeric-project-id";
const ATTRIBUTE: &str = "/computeMetadata/v1/project/attributes/{key}";
const SERVICE_ACCOUNTS: &str = "/computeMetadata/v1/instance/service-accounts/";
const SERVICE_ACCOUNT_INDEX: &str = "/computeMetadata/v1/instance/service-accounts/{acct}/";
const SERVICE_ACCOUNT_KEY: &str = "/computeMetadata/v1/instance/service-accounts/{acct}/{key}";

/// The state shared by all requests.
#[derive(Debug)]
pub struct MetadataServer {
    issuer: TokenIssuer,
    identity: IdentityResolver,
    attributes: Arc<AttributeStore>,
}

impl MetadataServer {
    pub fn new(
        issuer: TokenIssuer,
        identity: IdentityResolver,
        attributes: Arc<AttributeStore>,
    ) -> Self {
        Self {
            issuer,
            identity,
            attributes,
        }
    }
}

type AppState = Arc<MetadataServer>;

/// Returns the router for all metadata endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(PROJECT_ID, get(project_id))
        .route(NUMERIC_PROJECT_ID, get(numeric_project_id))
        .route(ATTRIBUTE, get(attribute))
        .route(SERVICE_ACCOUNTS, get(list_service_accounts))
        .route(SERVICE_ACCOUNT_INDEX, get(service_account_index))
        .route(SERVICE_ACCOUNT_KEY, get(service_account_key))
        // Non-canonical forms redirect, with or without the trailing slash.
        .route(&format!("{PROJECT_ID}/"), get(remove_trailing_slash))
        .route(&format!("{NUMERIC_PROJECT_ID}/"), get(remove_trailing_slash))
        .route(&format!("{ATTRIBUTE}/"), get(remove_trailing_slash))
        .route(&format!("{SERVICE_ACCOUNT_KEY}/"), get(remove_trailing_slash))
        .route(SERVICE_ACCOUNTS.trim_end_matches('/'), get(add_trailing_slash))
        .route(SERVICE_ACCOUNT_INDEX.trim_end_matches('/'), get(add_trailing_slash))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(check_metadata_headers))
        .layer(middleware::from_fn(set_metadata_headers))
}

async fn set_metadata_headers(request: Request, next: Next) -> Response {
    tracing::debug!("got request: {} {}", request.method(), request.uri());
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    headers.insert(
        HeaderName::from_static(METADATA_FLAVOR),
        HeaderValue::from_static(METADATA_FLAVOR_VALUE),
    );
    headers.insert(
        HeaderName::from_static("x-xss-protection"),
        HeaderValue::from_static("0"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("0"),
    );
    response
}

async fn check_metadata_headers(request: Request, next: Next) -> Response {
    if !is_metadata_host(&request) {
        tracing::warn!("rejecting request with host {:?}", host(&request));
        return error(StatusCode::FORBIDDEN);
    }
    // An empty value counts as missing.
    let has_flavor = request
        .headers()
        .get(METADATA_FLAVOR)
        .is_some_and(|v| !v.is_empty());
    if !has_flavor && request.uri() != "/" {
        tracing::warn!("rejecting {} without metadata flavor", request.uri());
        return error(StatusCode::FORBIDDEN);
    }
    next.run(request).await
}

fn host(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
}

// The host must match exactly, a port is not allowed.
fn is_metadata_host(request: &Request) -> bool {
    host(request).is_some_and(|h| METADATA_HOSTS.contains(&h))
}

fn text<S: Into<String>>(content_type: &'static str, body: S) -> Response {
    ([(CONTENT_TYPE, content_type)], body.into()).into_response()
}

fn error(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or_default();
    (status, [(CONTENT_TYPE, ERROR_CONTENT_TYPE)], format!("{reason}\n")).into_response()
}

async fn root() -> Response {
    text(APPLICATION_TEXT, "ok")
}

async fn project_id(State(state): State<AppState>) -> Response {
    text(APPLICATION_TEXT, state.identity.project_id())
}

async fn numeric_project_id(State(state): State<AppState>) -> Response {
    text(APPLICATION_TEXT, state.identity.numeric_project_id())
}

async fn attribute(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    // Unknown keys answer 200 with the status code as the body.
    let value = state
        .attributes
        .get(&key)
        .unwrap_or_else(|| StatusCode::NOT_FOUND.as_str().to_string());
    text(APPLICATION_TEXT, value)
}

fn email(state: &MetadataServer) -> Result<String, Response> {
    state.identity.service_account_email().map_err(|e| {
        tracing::error!("cannot determine the service account email: {e}");
        error(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

async fn list_service_accounts(State(state): State<AppState>) -> Response {
    match email(&state) {
        Ok(email) => text(
            APPLICATION_TEXT,
            format!("{}/\n{email}/\n", state.identity.aliases()),
        ),
        Err(response) => response,
    }
}

#[derive(Debug, serde::Serialize)]
struct ServiceAccountIndex {
    aliases: String,
    email: String,
    scopes: String,
}

fn scopes(state: &MetadataServer) -> String {
    state
        .identity
        .scopes()
        .iter()
        .map(|s| format!("{s}\n"))
        .collect()
}

async fn service_account_index(
    State(state): State<AppState>,
    Path(acct): Path<String>,
) -> Response {
    let email = match email(&state) {
        Ok(e) => e,
        Err(response) => return response,
    };
    let index = ServiceAccountIndex {
        aliases: acct,
        email,
        scopes: scopes(&state),
    };
    json(&index)
}

fn json<T: serde::Serialize>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => text(APPLICATION_JSON, body),
        Err(e) => {
            tracing::error!("cannot serialize response: {e}");
            error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn service_account_key(
    State(state): State<AppState>,
    Path((_acct, key)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    match key.as_str() {
        "aliases" => text(APPLICATION_TEXT, state.identity.aliases()),
        "email" => match email(&state) {
            Ok(email) => text(APPLICATION_TEXT, email),
            Err(response) => response,
        },
        "identity" => {
            let Some(audience) = query.get("audience").filter(|a| !a.is_empty()) else {
                return (
                    StatusCode::BAD_REQUEST,
                    [(CONTENT_TYPE, TEXT_HTML)],
                    "non-empty audience parameter required",
                )
                    .into_response();
            };
            match state.issuer.id_token(audience).await {
                Ok(token) => text(TEXT_HTML, token),
                Err(_) => error(StatusCode::INTERNAL_SERVER_ERROR),
            }
        }
        "scopes" => text(APPLICATION_TEXT, scopes(&state)),
        "token" => match state.issuer.access_token().await {
            Ok(token) => json(&token),
            Err(_) => error(StatusCode::INTERNAL_SERVER_ERROR),
        },
        _ => {
            tracing::warn!("unknown service account attribute {key:?}");
            error(StatusCode::NOT_FOUND)
        }
    }
}

async fn remove_trailing_slash(uri: Uri) -> Response {
    let path = uri.path().trim_end_matches('/');
    moved_permanently(path, &uri)
}

async fn add_trailing_slash(uri: Uri) -> Response {
    let path = format!("{}/", uri.path());
    moved_permanently(&path, &uri)
}

fn moved_permanently(path: &str, uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    };
    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response()
}

async fn not_found(uri: Uri) -> Response {
    tracing::warn!("{} called but is not implemented", uri.path());
    error(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialSource, KeyFileSource};
    use crate::errors::CredentialsError;
    use crate::issuer::MetadataToken;
    use crate::issuer::tests::test_override;
    use crate::token::Token;
    use crate::token::tests::{MockIdTokenProvider, MockTokenProvider};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use mockall::predicate::eq;
    use test_case::test_case;
    use tower::ServiceExt;

    type TestResult = anyhow::Result<()>;

    fn override_app() -> Router {
        let source = CredentialSource::EnvironmentOverride(test_override());
        app(source)
    }

    fn app(source: CredentialSource) -> Router {
        let identity = IdentityResolver::new(source.clone())
            .with_scopes(vec!["scope1".to_string(), "scope2".to_string()]);
        let server = MetadataServer::new(
            TokenIssuer::new(source),
            identity,
            Arc::new(AttributeStore::default()),
        );
        router(Arc::new(server))
    }

    fn metadata_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("host", "metadata.google.internal")
            .header("metadata-flavor", "Google")
            .body(Body::empty())
            .unwrap()
    }

    async fn send(
        app: Router,
        request: Request<Body>,
    ) -> anyhow::Result<(axum::http::Response<()>, String)> {
        let response = app.oneshot(request).await?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await?.to_bytes();
        let body = String::from_utf8(body.to_vec())?;
        Ok((axum::http::Response::from_parts(parts, ()), body))
    }

    fn content_type<T>(response: &axum::http::Response<T>) -> Option<&str> {
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn root_without_flavor() -> TestResult {
        let request = Request::builder()
            .uri("/")
            .header("host", "metadata")
            .body(Body::empty())?;
        let (response, body) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body, "ok");
        Ok(())
    }

    #[test_case("metadata")]
    #[test_case("metadata.google.internal")]
    #[test_case("169.254.169.254")]
    #[tokio::test]
    async fn allowed_hosts(host: &str) -> TestResult {
        let request = Request::builder()
            .uri(PROJECT_ID)
            .header("host", host)
            .header("metadata-flavor", "Google")
            .body(Body::empty())?;
        let (response, body) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(body, "override-project");
        Ok(())
    }

    #[test_case("evil.example.com")]
    #[test_case("localhost")]
    #[test_case("metadata.evil.example.com")]
    #[test_case("metadata:8080"; "with port")]
    #[test_case("169.254.169.254:80"; "address with port")]
    #[test_case("METADATA"; "different case")]
    #[tokio::test]
    async fn rejected_hosts(host: &str) -> TestResult {
        let request = Request::builder()
            .uri(PROJECT_ID)
            .header("host", host)
            .header("metadata-flavor", "Google")
            .body(Body::empty())?;
        let (response, _) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(content_type(&response), Some(ERROR_CONTENT_TYPE));
        // The identifying headers are set even on rejected requests.
        assert_eq!(
            response.headers().get("metadata-flavor").map(|v| v.as_bytes()),
            Some("Google".as_bytes())
        );
        Ok(())
    }

    #[tokio::test]
    async fn host_from_authority() -> TestResult {
        let request = Request::builder()
            .uri(format!("http://169.254.169.254{PROJECT_ID}"))
            .header("metadata-flavor", "Google")
            .body(Body::empty())?;
        let (response, body) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body, "override-project");
        Ok(())
    }

    #[tokio::test]
    async fn missing_host() -> TestResult {
        let request = Request::builder()
            .uri(PROJECT_ID)
            .header("metadata-flavor", "Google")
            .body(Body::empty())?;
        let (response, _) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn missing_flavor() -> TestResult {
        let request = Request::builder()
            .uri(PROJECT_ID)
            .header("host", "metadata")
            .body(Body::empty())?;
        let (response, body) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body, "Forbidden\n");
        Ok(())
    }

    #[tokio::test]
    async fn empty_flavor() -> TestResult {
        let request = Request::builder()
            .uri(PROJECT_ID)
            .header("host", "metadata")
            .header("metadata-flavor", "")
            .body(Body::empty())?;
        let (response, body) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body, "Forbidden\n");
        Ok(())
    }

    #[tokio::test]
    async fn response_headers() -> TestResult {
        let (response, _) = send(override_app(), metadata_request("/")).await?;
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(header("server").as_deref(), Some(SERVER_NAME));
        assert_eq!(header("metadata-flavor").as_deref(), Some("Google"));
        assert_eq!(header("x-xss-protection").as_deref(), Some("0"));
        assert_eq!(header("x-frame-options").as_deref(), Some("0"));
        Ok(())
    }

    #[test_case(PROJECT_ID, "override-project")]
    #[test_case(NUMERIC_PROJECT_ID, "111111")]
    #[test_case("/computeMetadata/v1/project/attributes/k1", "v1")]
    #[test_case("/computeMetadata/v1/project/attributes/k2", "v2")]
    #[test_case("/computeMetadata/v1/project/attributes/unknown", "404")]
    #[test_case(SERVICE_ACCOUNTS, "default/\noverride@example.com/\n")]
    #[test_case("/computeMetadata/v1/instance/service-accounts/default/aliases", "default")]
    #[test_case(
        "/computeMetadata/v1/instance/service-accounts/default/email",
        "override@example.com"
    )]
    #[test_case(
        "/computeMetadata/v1/instance/service-accounts/default/scopes",
        "scope1\nscope2\n"
    )]
    #[tokio::test]
    async fn plain_values(uri: &str, want: &str) -> TestResult {
        let (response, body) = send(override_app(), metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(content_type(&response), Some(APPLICATION_TEXT));
        assert_eq!(body, want);
        Ok(())
    }

    #[tokio::test]
    async fn key_file_scopes() -> TestResult {
        let app = app(CredentialSource::KeyFile(KeyFileSource::new_for_test(
            Arc::new(MockTokenProvider::new()),
            Arc::new(MockIdTokenProvider::new()),
        )));
        let uri = "/computeMetadata/v1/instance/service-accounts/default/scopes";
        let (response, body) = send(app, metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(content_type(&response), Some(APPLICATION_TEXT));
        assert_eq!(body, "scope1\nscope2\n");
        Ok(())
    }

    #[tokio::test]
    async fn service_account_index() -> TestResult {
        let uri = "/computeMetadata/v1/instance/service-accounts/default/";
        let (response, body) = send(override_app(), metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(content_type(&response), Some(APPLICATION_JSON));
        let got = serde_json::from_str::<serde_json::Value>(&body)?;
        assert_eq!(
            got,
            serde_json::json!({
                "aliases": "default",
                "email": "override@example.com",
                "scopes": "scope1\nscope2\n",
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn service_account_index_echoes_account() -> TestResult {
        let uri = "/computeMetadata/v1/instance/service-accounts/override@example.com/";
        let (_, body) = send(override_app(), metadata_request(uri)).await?;
        let got = serde_json::from_str::<serde_json::Value>(&body)?;
        assert_eq!(got["aliases"], "override@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_service_account_key() -> TestResult {
        let uri = "/computeMetadata/v1/instance/service-accounts/default/ssh-keys";
        let (response, _) = send(override_app(), metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn override_token() -> TestResult {
        let uri = "/computeMetadata/v1/instance/service-accounts/default/token";
        let (response, body) = send(override_app(), metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(content_type(&response), Some(APPLICATION_JSON));
        let got = serde_json::from_str::<MetadataToken>(&body)?;
        assert_eq!(
            got,
            MetadataToken {
                access_token: "override-access-token".to_string(),
                expires_in: 0,
                token_type: "Bearer".to_string(),
            }
        );
        Ok(())
    }

    #[test_case("https://a.example.com")]
    #[test_case("https%3A%2F%2Fb.example.com%2Fpath")]
    #[tokio::test]
    async fn override_identity(audience: &str) -> TestResult {
        let uri = format!(
            "/computeMetadata/v1/instance/service-accounts/default/identity?audience={audience}"
        );
        let (response, body) = send(override_app(), metadata_request(&uri)).await?;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(content_type(&response), Some(TEXT_HTML));
        assert_eq!(body, "override-id-token");
        Ok(())
    }

    #[test_case(""; "no query")]
    #[test_case("?audience="; "empty audience")]
    #[test_case("?format=full"; "other parameters")]
    #[tokio::test]
    async fn identity_requires_audience(query: &str) -> TestResult {
        let uri = format!("/computeMetadata/v1/instance/service-accounts/default/identity{query}");
        let (response, body) = send(override_app(), metadata_request(&uri)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body, "non-empty audience parameter required");
        Ok(())
    }

    #[tokio::test]
    async fn identity_per_audience() -> TestResult {
        let mut id_tokens = MockIdTokenProvider::new();
        id_tokens
            .expect_id_token()
            .with(eq("https://a.example.com"))
            .times(1)
            .returning(|_| Ok("token-a".to_string()));
        id_tokens
            .expect_id_token()
            .with(eq("https://b.example.com"))
            .times(1)
            .returning(|_| Ok("token-b".to_string()));
        let app = app(CredentialSource::KeyFile(KeyFileSource::new_for_test(
            Arc::new(MockTokenProvider::new()),
            Arc::new(id_tokens),
        )));

        let base = "/computeMetadata/v1/instance/service-accounts/default/identity";
        let (_, body) = send(
            app.clone(),
            metadata_request(&format!("{base}?audience=https://a.example.com")),
        )
        .await?;
        assert_eq!(body, "token-a");
        let (_, body) = send(
            app,
            metadata_request(&format!("{base}?audience=https://b.example.com")),
        )
        .await?;
        assert_eq!(body, "token-b");
        Ok(())
    }

    #[tokio::test]
    async fn token_from_provider() -> TestResult {
        let mut access = MockTokenProvider::new();
        access.expect_token().times(1).returning(|| {
            Ok(Token {
                token: "test-access-token".to_string(),
                token_type: "Bearer".to_string(),
                expires_at: Some(time::OffsetDateTime::now_utc() + time::Duration::seconds(600)),
            })
        });
        let app = app(CredentialSource::KeyFile(KeyFileSource::new_for_test(
            Arc::new(access),
            Arc::new(MockIdTokenProvider::new()),
        )));
        let uri = "/computeMetadata/v1/instance/service-accounts/default/token";
        let (response, body) = send(app, metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        let got = serde_json::from_str::<MetadataToken>(&body)?;
        assert_eq!(got.access_token, "test-access-token");
        assert!((599..=600).contains(&got.expires_in), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn token_errors() -> TestResult {
        let mut access = MockTokenProvider::new();
        access
            .expect_token()
            .times(1)
            .returning(|| Err(CredentialsError::from_msg(false, "bad credentials")));
        let mut id_tokens = MockIdTokenProvider::new();
        id_tokens
            .expect_id_token()
            .times(1)
            .returning(|_| Err(CredentialsError::from_msg(true, "try again")));
        let app = app(CredentialSource::KeyFile(KeyFileSource::new_for_test(
            Arc::new(access),
            Arc::new(id_tokens),
        )));

        let base = "/computeMetadata/v1/instance/service-accounts/default";
        let (response, _) = send(app.clone(), metadata_request(&format!("{base}/token"))).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let (response, _) = send(
            app,
            metadata_request(&format!("{base}/identity?audience=https://example.com")),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn email_error() -> TestResult {
        // A test key file source holds `{}`, which has no `type`.
        let app = app(CredentialSource::KeyFile(KeyFileSource::new_for_test(
            Arc::new(MockTokenProvider::new()),
            Arc::new(MockIdTokenProvider::new()),
        )));
        let (response, _) = send(app.clone(), metadata_request(SERVICE_ACCOUNTS)).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let uri = "/computeMetadata/v1/instance/service-accounts/default/email";
        let (response, _) = send(app, metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[test_case("/computeMetadata/v1/project/project-id/", PROJECT_ID)]
    #[test_case(
        "/computeMetadata/v1/project/attributes/k1/",
        "/computeMetadata/v1/project/attributes/k1"
    )]
    #[test_case("/computeMetadata/v1/instance/service-accounts", SERVICE_ACCOUNTS)]
    #[test_case(
        "/computeMetadata/v1/instance/service-accounts/default",
        "/computeMetadata/v1/instance/service-accounts/default/"
    )]
    #[test_case(
        "/computeMetadata/v1/instance/service-accounts/default/identity/?audience=a",
        "/computeMetadata/v1/instance/service-accounts/default/identity?audience=a"
    )]
    #[tokio::test]
    async fn trailing_slash_redirects(uri: &str, want: &str) -> TestResult {
        let (response, _) = send(override_app(), metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        let location = response.headers().get("location").and_then(|v| v.to_str().ok());
        assert_eq!(location, Some(want));
        Ok(())
    }

    #[test_case("/computeMetadata/v1/instance/disks/")]
    #[test_case("/computeMetadata/v1/instance/hostname")]
    #[test_case("/favicon.ico")]
    #[tokio::test]
    async fn not_implemented(uri: &str) -> TestResult {
        let (response, body) = send(override_app(), metadata_request(uri)).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found\n");
        Ok(())
    }

    #[tokio::test]
    async fn wrong_method() -> TestResult {
        let request = Request::builder()
            .method("POST")
            .uri(PROJECT_ID)
            .header("host", "metadata")
            .header("metadata-flavor", "Google")
            .body(Body::empty())?;
        let (response, _) = send(override_app(), request).await?;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        Ok(())
    }
}
