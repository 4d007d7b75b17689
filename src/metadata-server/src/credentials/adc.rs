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

//! [Application Default Credentials] discovery.
//!
//! Impersonation needs source credentials to call the IAM Credentials API.
//! They come from the file named by `GOOGLE_APPLICATION_CREDENTIALS`, or
//! failing that, from the file written by
//! `gcloud auth application-default login`.
//!
//! [Application Default Credentials]: https://cloud.google.com/docs/authentication/application-default-credentials

use crate::BuildResult;
use crate::build_errors::Error as BuilderError;
use crate::constants::{DEFAULT_SCOPE, GOOGLE_APPLICATION_CREDENTIALS_VAR};
use crate::credentials::CredentialsFile;
use crate::token::TokenProvider;
use std::path::PathBuf;
use std::sync::Arc;

const WINDOWS_APPDATA: &str = "APPDATA";
const UNIX_HOME: &str = "HOME";
const USER_CREDENTIAL_FILE: &str = "application_default_credentials.json";

/// Returns the path of the gcloud ADC file, whether or not it exists.
fn well_known_path() -> Option<PathBuf> {
    let mut path = PathBuf::new();
    if cfg!(windows) {
        path.push(std::env::var_os(WINDOWS_APPDATA)?);
    } else {
        path.push(std::env::var_os(UNIX_HOME)?);
        path.push(".config");
    }
    path.push("gcloud");
    path.push(USER_CREDENTIAL_FILE);
    Some(path)
}

/// Finds the ADC file: the environment variable wins, even if the file it
/// names does not exist.
pub(crate) fn adc_path() -> BuildResult<PathBuf> {
    if let Some(path) = std::env::var_os(GOOGLE_APPLICATION_CREDENTIALS_VAR) {
        if !path.is_empty() {
            return Ok(path.into());
        }
    }
    match well_known_path() {
        Some(path) if path.exists() => Ok(path),
        Some(path) => Err(BuilderError::loading(format!(
            "no Application Default Credentials: {GOOGLE_APPLICATION_CREDENTIALS_VAR} is not set and {} does not exist",
            path.display()
        ))),
        None => Err(BuilderError::loading(format!(
            "no Application Default Credentials: {GOOGLE_APPLICATION_CREDENTIALS_VAR} is not set and the home directory is unknown"
        ))),
    }
}

/// Loads the ADC file and returns a cloud-platform scoped token provider.
pub(crate) async fn source_credentials() -> BuildResult<Arc<dyn TokenProvider>> {
    let path = adc_path()?;
    let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
        BuilderError::loading(format!(
            "cannot read Application Default Credentials from {}: {e}",
            path.display()
        ))
    })?;
    let file = CredentialsFile::parse(&contents)?;
    tracing::info!(
        "using {} Application Default Credentials from {}",
        file.credentials_type(),
        path.display()
    );
    Ok(file.access_token_provider(&[DEFAULT_SCOPE.to_string()]))
}
