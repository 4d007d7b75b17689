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

//! Command-line configuration.

use crate::constants::EMAIL_SCOPE;
use crate::credentials::{Builder as CredentialsBuilder, CredentialSource, EnvironmentOverride};
use crate::identity::IdentityResolver;
use anyhow::bail;
use clap::Parser;
use humantime::parse_duration;
use std::path::PathBuf;
use std::time::Duration;

const DESCRIPTION: &str = concat!(
    "Emulates the Compute Engine metadata server.",
    " Access tokens, ID tokens and identity come from the environment,",
    " from an impersonated service account, or from a credentials file."
);

/// Configuration options for the server.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = DESCRIPTION)]
pub struct Args {
    /// The address to listen on, as `[host]:port`.
    ///
    /// An empty host listens on all interfaces.
    #[arg(long, default_value = ":8080")]
    pub port: String,

    /// The numeric project id reported by the server.
    #[arg(long = "numericProjectId", default_value = "")]
    pub numeric_project_id: String,

    /// Comma-separated scopes requested for access tokens.
    #[arg(long = "tokenScopes", default_value = EMAIL_SCOPE)]
    pub token_scopes: String,

    /// The project id reported by the server.
    ///
    /// Defaults to the project of the service account key file.
    #[arg(long = "projectId", default_value = "")]
    pub project_id: String,

    /// The service account email reported by the server.
    ///
    /// With `--impersonate` this is the account to impersonate.
    #[arg(long = "serviceAccountEmail", default_value = "")]
    pub service_account_email: String,

    /// A `service_account` or `authorized_user` credentials file.
    #[arg(long = "serviceAccountFile")]
    pub service_account_file: Option<PathBuf>,

    /// A JSON object of custom project attributes, with string values.
    #[arg(long = "customAttributeFile")]
    pub custom_attribute_file: Option<PathBuf>,

    /// Impersonate `--serviceAccountEmail` using Application Default
    /// Credentials.
    #[arg(long, default_value_t = false)]
    pub impersonate: bool,

    /// Fail token requests that wait longer than this for another token
    /// request to finish. Waits forever if unset.
    #[arg(long = "tokenLockTimeout", value_parser = parse_duration)]
    pub token_lock_timeout: Option<Duration>,

    /// How long in-flight requests may run after a shutdown signal.
    #[arg(long = "shutdownGracePeriod", value_parser = parse_duration, default_value = "5s")]
    pub shutdown_grace_period: Duration,
}

impl Args {
    /// Validates the arguments after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.listen_address()?;
        if self.scopes().iter().any(|s| s.is_empty()) {
            bail!("invalid --tokenScopes {:?}, scopes cannot be empty", self.token_scopes)
        }
        if self.token_lock_timeout.is_some_and(|t| t.is_zero()) {
            bail!("invalid --tokenLockTimeout, should be > 0")
        }
        Ok(())
    }

    /// The address to bind, with an empty host replaced by `0.0.0.0`.
    pub fn listen_address(&self) -> anyhow::Result<String> {
        let Some((host, port)) = self.port.rsplit_once(':') else {
            bail!("invalid --port {:?}, expected [host]:port", self.port)
        };
        if port.parse::<u16>().is_err() {
            bail!("invalid --port {:?}, {port:?} is not a port number", self.port)
        }
        let host = if host.is_empty() { "0.0.0.0" } else { host };
        Ok(format!("{host}:{port}"))
    }

    /// The scopes in `--tokenScopes`, in order.
    pub fn scopes(&self) -> Vec<String> {
        self.token_scopes.split(',').map(str::to_string).collect()
    }

    /// Returns a builder for the credential source described by the
    /// arguments.
    pub fn credentials_builder(
        &self,
        environment_override: Option<EnvironmentOverride>,
    ) -> CredentialsBuilder {
        let builder = CredentialsBuilder::default()
            .with_scopes(self.scopes())
            .with_project_id(&self.project_id)
            .with_numeric_project_id(&self.numeric_project_id)
            .with_service_account_email(&self.service_account_email)
            .with_impersonate(self.impersonate)
            .with_environment_override(environment_override);
        self.service_account_file
            .iter()
            .fold(builder, |b, v| b.with_service_account_file(v))
    }

    pub fn identity_resolver(&self, source: CredentialSource) -> IdentityResolver {
        IdentityResolver::new(source)
            .with_project_id(&self.project_id)
            .with_service_account_email(&self.service_account_email)
            .with_scopes(self.scopes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["program"])?;
        assert_eq!(args.port, ":8080");
        assert_eq!(args.listen_address()?, "0.0.0.0:8080");
        assert_eq!(args.scopes(), [EMAIL_SCOPE]);
        assert_eq!(args.project_id, "");
        assert_eq!(args.service_account_file, None);
        assert!(!args.impersonate);
        assert_eq!(args.token_lock_timeout, None);
        assert_eq!(args.shutdown_grace_period, Duration::from_secs(5));
        let got = args.validate();
        assert!(got.is_ok(), "{got:?} {args:?}");
        Ok(())
    }

    #[test]
    fn all_flags() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "program",
            "--port=127.0.0.1:9090",
            "--numericProjectId=123456",
            "--tokenScopes=scope1,scope2",
            "--projectId=test-project",
            "--serviceAccountEmail=sa@test-project.iam.gserviceaccount.com",
            "--serviceAccountFile=/path/to/key.json",
            "--customAttributeFile=/path/to/attributes.json",
            "--impersonate",
            "--tokenLockTimeout=2s",
            "--shutdownGracePeriod=250ms",
        ])?;
        assert_eq!(args.listen_address()?, "127.0.0.1:9090");
        assert_eq!(args.numeric_project_id, "123456");
        assert_eq!(args.scopes(), ["scope1", "scope2"]);
        assert_eq!(args.project_id, "test-project");
        assert_eq!(
            args.service_account_email,
            "sa@test-project.iam.gserviceaccount.com"
        );
        assert_eq!(
            args.service_account_file,
            Some(PathBuf::from("/path/to/key.json"))
        );
        assert_eq!(
            args.custom_attribute_file,
            Some(PathBuf::from("/path/to/attributes.json"))
        );
        assert!(args.impersonate);
        assert_eq!(args.token_lock_timeout, Some(Duration::from_secs(2)));
        assert_eq!(args.shutdown_grace_period, Duration::from_millis(250));
        args.validate()?;
        Ok(())
    }

    #[test_case(":8080", "0.0.0.0:8080")]
    #[test_case("localhost:8080", "localhost:8080")]
    #[test_case("[::1]:8080", "[::1]:8080")]
    fn listen_address(port: &str, want: &str) -> anyhow::Result<()> {
        let args = Args::try_parse_from(["program", "--port", port])?;
        assert_eq!(args.listen_address()?, want);
        Ok(())
    }

    #[test_case(&["program", "--port=8080"])]
    #[test_case(&["program", "--port=:http"])]
    #[test_case(&["program", "--port=:99999"])]
    #[test_case(&["program", "--tokenScopes=scope1,,scope2"])]
    #[test_case(&["program", "--tokenLockTimeout=0s"])]
    fn validate(input: &[&str]) -> anyhow::Result<()> {
        let args = Args::try_parse_from(input)?;
        let got = args.validate();
        assert!(got.is_err(), "{got:?} {args:?}");
        Ok(())
    }

    #[test]
    fn invalid_duration() {
        let got = Args::try_parse_from(["program", "--shutdownGracePeriod=soon"]);
        assert!(got.is_err(), "{got:?}");
    }

    #[tokio::test]
    async fn credentials_builder_key_file_required() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["program"])?;
        let err = args.credentials_builder(None).build().await.unwrap_err();
        assert!(err.is_configuration(), "{err:?}");
        Ok(())
    }
}
