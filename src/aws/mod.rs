//! Account, region and credential pre-flight helpers.
//!
//! `check_credentials` only blocks a command when it is confident the
//! credentials themselves are the problem. Failures it cannot classify are
//! reported as usable so the real operation surfaces its own error.
mod probe;

use std::{env, fmt, io, sync::Arc};

use tracing::debug;

use crate::{config::ToolkitConfig, lib::errors::IdentityError};

pub use probe::{
    parse_simulated_error, CallerIdentity, EnvIdentityProvider, IdentityProvider,
    StsIdentityProvider, IDENTITY_ACCOUNT_ENV, IDENTITY_ERROR_ENV, IDENTITY_REGION_ENV,
};

/// Region used when nothing in the environment names one.
pub const DEFAULT_REGION: &str = "us-west-2";
/// Selects the identity provider; `env` or `mock` use environment variables.
pub const IDENTITY_PROBE_ENV: &str = "AGENTCORE_IDENTITY_PROBE";

const EXPIRED_TOKEN_CODES: [&str; 3] = ["ExpiredToken", "ExpiredTokenException", "RequestExpired"];
const INVALID_TOKEN_CODES: [&str; 2] = ["InvalidClientTokenId", "UnrecognizedClientException"];

/// Why the ambient credentials cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialDiagnostic {
    Missing,
    Incomplete,
    Expired,
    Invalid,
    ValidationFailed { detail: String },
}

impl fmt::Display for CredentialDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialDiagnostic::Missing => f.write_str("No AWS credentials found."),
            CredentialDiagnostic::Incomplete => {
                f.write_str("AWS credentials are incomplete or misconfigured.")
            }
            CredentialDiagnostic::Expired => {
                f.write_str("AWS credentials have expired. Please refresh or re-authenticate.")
            }
            CredentialDiagnostic::Invalid => f.write_str("AWS credentials are invalid."),
            CredentialDiagnostic::ValidationFailed { detail } => {
                write!(f, "AWS credential validation failed: {detail}")
            }
        }
    }
}

/// Outcome of `check_credentials`: usable, or a diagnostic explaining why not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheck {
    diagnostic: Option<CredentialDiagnostic>,
}

impl CredentialCheck {
    pub const fn passed() -> Self {
        Self { diagnostic: None }
    }

    pub const fn failed(diagnostic: CredentialDiagnostic) -> Self {
        Self {
            diagnostic: Some(diagnostic),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.diagnostic.is_none()
    }

    pub fn message(&self) -> Option<String> {
        self.diagnostic.as_ref().map(ToString::to_string)
    }

    pub fn diagnostic(&self) -> Option<&CredentialDiagnostic> {
        self.diagnostic.as_ref()
    }
}

/// Map an identity failure to a diagnostic. `None` means the failure says
/// nothing certain about the credentials.
pub fn classify_identity_error(error: &IdentityError) -> Option<CredentialDiagnostic> {
    match error {
        IdentityError::NoCredentials => Some(CredentialDiagnostic::Missing),
        IdentityError::IncompleteCredentials { .. } => Some(CredentialDiagnostic::Incomplete),
        IdentityError::Rejected { code, message } => {
            if EXPIRED_TOKEN_CODES.contains(&code.as_str()) {
                return Some(CredentialDiagnostic::Expired);
            }
            if INVALID_TOKEN_CODES.contains(&code.as_str()) {
                return Some(CredentialDiagnostic::Invalid);
            }
            let detail = message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(code.as_str())
                .to_string();
            Some(CredentialDiagnostic::ValidationFailed { detail })
        }
        IdentityError::Unclassified { .. } => None,
    }
}

/// Resolve the caller's account id with one identity lookup.
pub fn get_account_id(provider: &dyn IdentityProvider) -> Result<String, IdentityError> {
    provider.caller_identity().map(|identity| identity.account)
}

/// Ambient region, or `DEFAULT_REGION` when none is configured.
pub fn get_region(provider: &dyn IdentityProvider) -> String {
    provider
        .region()
        .filter(|region| !region.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// Make one identity lookup and explain credential problems it reveals.
pub fn check_credentials(provider: &dyn IdentityProvider) -> CredentialCheck {
    let error = match provider.caller_identity() {
        Ok(identity) => {
            debug!(
                target: "agentcore::aws",
                account = %identity.account,
                "AWS credentials validated"
            );
            return CredentialCheck::passed();
        }
        Err(error) => error,
    };

    match classify_identity_error(&error) {
        Some(diagnostic) => {
            debug!(
                target: "agentcore::aws",
                reason = %error,
                diagnostic = %diagnostic,
                "AWS credential check failed"
            );
            CredentialCheck::failed(diagnostic)
        }
        None => {
            debug!(
                target: "agentcore::aws",
                reason = %error,
                "Ignoring non-credential failure during credential check"
            );
            CredentialCheck::passed()
        }
    }
}

/// Pick the identity provider for this process.
pub fn identity_provider_from_env(config: &ToolkitConfig) -> io::Result<Arc<dyn IdentityProvider>> {
    match env::var(IDENTITY_PROBE_ENV).ok().as_deref() {
        Some("env") | Some("mock") => Ok(Arc::new(EnvIdentityProvider::new(&config.aws))),
        _ => Ok(Arc::new(StsIdentityProvider::new(config.aws.clone())?)),
    }
}
