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

use http::StatusCode;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::Arc;

/// Represents an error fetching a token at request time.
///
/// These errors never stop the server. The request that triggered the fetch
/// fails with an internal error and subsequent requests try again.
#[derive(Clone, Debug)]
pub struct CredentialsError {
    /// A boolean value indicating whether the error is transient.
    ///
    /// If `true`, the operation that resulted in this error might succeed upon
    /// retry. The server never retries on its own, the flag is only reported.
    is_transient: bool,

    /// The underlying source of the error.
    source: CredentialsErrorImpl,
}

#[derive(Clone, Debug)]
enum CredentialsErrorImpl {
    SimpleMessage(String),
    Source(Arc<dyn Error + Send + Sync>),
}

impl CredentialsError {
    /// Creates a new `CredentialsError` from an existing error.
    ///
    /// # Arguments
    /// * `is_transient` - A boolean indicating whether the error is transient.
    /// * `source` - The underlying error that caused the failure.
    pub fn from_source<T: Error + Send + Sync + 'static>(is_transient: bool, source: T) -> Self {
        CredentialsError {
            is_transient,
            source: CredentialsErrorImpl::Source(Arc::new(source)),
        }
    }

    /// Creates a new `CredentialsError` from a message.
    ///
    /// # Arguments
    /// * `is_transient` - A boolean indicating whether the error is transient.
    /// * `message` - A description of the failure.
    pub fn from_msg<T: Into<String>>(is_transient: bool, message: T) -> Self {
        CredentialsError {
            is_transient,
            source: CredentialsErrorImpl::SimpleMessage(message.into()),
        }
    }

    /// Returns `true` if the error is transient; otherwise returns `false`.
    pub fn is_transient(&self) -> bool {
        self.is_transient
    }
}

impl std::error::Error for CredentialsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            CredentialsErrorImpl::SimpleMessage(_) => None,
            CredentialsErrorImpl::Source(source) => Some(source.as_ref()),
        }
    }
}

const TRANSIENT_MSG: &str = "but future attempts may succeed";
const PERMANENT_MSG: &str = "and future attempts will not succeed";

impl Display for CredentialsError {
    /// Formats the error message to include transience and source.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let msg = if self.is_transient {
            TRANSIENT_MSG
        } else {
            PERMANENT_MSG
        };
        match &self.source {
            CredentialsErrorImpl::SimpleMessage(m) => {
                write!(f, "cannot fetch token, {msg}, source: {m}")
            }
            CredentialsErrorImpl::Source(s) => write!(f, "cannot fetch token, {msg}, source: {s}"),
        }
    }
}

/// A helper to create a non-transient error.
pub(crate) fn non_retryable<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::from_source(false, source)
}

pub(crate) fn non_retryable_from_str<T: Into<String>>(message: T) -> CredentialsError {
    CredentialsError::from_msg(false, message)
}

/// Classifies a failure to send a request, or to receive its response.
pub(crate) fn from_http_error(err: reqwest::Error, msg: &str) -> CredentialsError {
    let transient = err.is_connect() || err.is_timeout() || err.is_request();
    CredentialsError::from_msg(transient, format!("{msg}: {err}"))
}

/// Converts an unsuccessful HTTP response into an error, preserving the body.
pub(crate) async fn from_http_response(response: reqwest::Response, msg: &str) -> CredentialsError {
    let status = response.status();
    let transient = is_retryable(status);
    match response.text().await {
        Ok(body) => {
            CredentialsError::from_msg(transient, format!("{msg}, status {status}: {body}"))
        }
        Err(e) => CredentialsError::from_msg(transient, format!("{msg}, status {status}: {e}")),
    }
}

pub(crate) fn is_retryable(c: StatusCode) -> bool {
    match c {
        // Internal server errors do not indicate that there is anything wrong
        // with our request, so we retry them.
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => true,
        _ => false,
    }
}
