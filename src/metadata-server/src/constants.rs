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

pub(crate) const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
/// The scope requested when no `--tokenScopes` are configured.
pub const EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

pub(crate) const OAUTH2_TOKEN_SERVER_URL: &str = "https://oauth2.googleapis.com/token";
pub(crate) const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub(crate) const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";
pub(crate) const IAM_CREDENTIALS_ENDPOINT: &str = "https://iamcredentials.googleapis.com";

/// Environment variables that, when all set, bypass every other credential source.
pub const GOOGLE_ACCESS_TOKEN_VAR: &str = "GOOGLE_ACCESS_TOKEN";
pub const GOOGLE_ID_TOKEN_VAR: &str = "GOOGLE_ID_TOKEN";
pub const GOOGLE_ACCOUNT_EMAIL_VAR: &str = "GOOGLE_ACCOUNT_EMAIL";
pub const GOOGLE_NUMERIC_PROJECT_ID_VAR: &str = "GOOGLE_NUMERIC_PROJECT_ID";
pub const GOOGLE_PROJECT_ID_VAR: &str = "GOOGLE_PROJECT_ID";

pub(crate) const GOOGLE_APPLICATION_CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

pub(crate) const METADATA_FLAVOR: &str = "metadata-flavor";
pub(crate) const METADATA_FLAVOR_VALUE: &str = "Google";
pub(crate) const SERVER_NAME: &str = "Metadata Server for VM";

/// The `Host` values accepted by the server.
pub(crate) const METADATA_HOSTS: [&str; 3] =
    ["metadata", "metadata.google.internal", "169.254.169.254"];

/// The alias every emulated service account answers to.
pub const DEFAULT_ALIAS: &str = "default";
