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

//! Errors created while resolving the credential source at startup.

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for [CredentialSource] resolution.
///
/// All of these errors are fatal: the server logs them and exits before it
/// starts accepting connections.
///
/// [CredentialSource]: crate::credentials::CredentialSource
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// A required setting is missing for the selected credential mode.
    pub fn is_configuration(&self) -> bool {
        matches!(self.0, ErrorKind::Configuration(_))
    }

    /// A problem finding or reading a credentials file.
    pub fn is_loading(&self) -> bool {
        matches!(self.0, ErrorKind::Loading(_))
    }

    /// A problem parsing a credentials JSON document.
    pub fn is_parsing(&self) -> bool {
        matches!(self.0, ErrorKind::Parsing(_))
    }

    /// A required setting was not provided.
    pub(crate) fn missing_field(field: &'static str) -> Error {
        Error(ErrorKind::Configuration(
            format!("missing required setting: {field}").into(),
        ))
    }

    /// Create an error representing problems loading or reading a credentials
    /// file.
    pub(crate) fn loading<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Loading(source.into()))
    }

    /// A problem parsing a credentials specification.
    pub(crate) fn parsing<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Parsing(source.into()))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("invalid configuration: {0}")]
    Configuration(#[source] BoxError),
    #[error("could not find or open the credentials file: {0}")]
    Loading(#[source] BoxError),
    #[error("cannot parse the credentials file: {0}")]
    Parsing(#[source] BoxError),
}
