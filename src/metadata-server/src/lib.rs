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

//! An emulator for the Compute Engine [metadata server].
//!
//! Code written against the metadata server (client libraries looking up the
//! project id, the service account identity, access tokens or ID tokens) can
//! run off Google Cloud by pointing it at this server. The server answers with
//! a locally supplied credential: static values from the environment, an
//! impersonated service account, or a credentials file.
//!
//! Only the subset of the metadata surface used for authentication is
//! emulated. There are no disks, network interfaces or ssh keys.
//!
//! [metadata server]: https://cloud.google.com/compute/docs/metadata/overview

pub mod attributes;
pub mod build_errors;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod errors;
pub mod identity;
pub mod issuer;
pub mod server;

/// Types and traits to work with access and identity tokens.
pub(crate) mod token;

/// The token cache
pub(crate) mod token_cache;

/// A `Result` alias where the `Err` case is
/// `gce_metadata_server::errors::CredentialsError`.
pub(crate) type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;

/// A `Result` alias where the `Err` case is
/// `gce_metadata_server::build_errors::Error`.
pub type BuildResult<T> = std::result::Result<T, build_errors::Error>;
