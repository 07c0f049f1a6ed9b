use std::{env, io, sync::OnceLock};

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::{error::CredentialsError, ProvideCredentials};
use aws_sdk_sts::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::get_caller_identity::GetCallerIdentityError,
};
use tokio::runtime::{Builder, Runtime};

use crate::{config::AwsSection, lib::errors::IdentityError};

use super::DEFAULT_REGION;

pub const IDENTITY_ACCOUNT_ENV: &str = "AGENTCORE_IDENTITY_ACCOUNT";
pub const IDENTITY_ERROR_ENV: &str = "AGENTCORE_IDENTITY_ERROR";
pub const IDENTITY_REGION_ENV: &str = "AGENTCORE_IDENTITY_REGION";
const SIMULATED_ACCOUNT: &str = "123456789012";

/// Result of a successful "who am I" lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

/// Abstraction over the ambient cloud identity during credential checks.
pub trait IdentityProvider: Send + Sync {
    /// Perform one caller-identity lookup.
    fn caller_identity(&self) -> Result<CallerIdentity, IdentityError>;
    /// Region configured for this environment, if any.
    fn region(&self) -> Option<String>;
}

/// Provider that calls STS `GetCallerIdentity` with the SDK's default chain.
pub struct StsIdentityProvider {
    overrides: AwsSection,
    runtime: Runtime,
    shared: OnceLock<SdkConfig>,
}

impl StsIdentityProvider {
    pub fn new(overrides: AwsSection) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            overrides,
            runtime,
            shared: OnceLock::new(),
        })
    }

    fn sdk_config(&self) -> &SdkConfig {
        self.shared
            .get_or_init(|| self.runtime.block_on(load_sdk_config(&self.overrides)))
    }
}

async fn load_sdk_config(overrides: &AwsSection) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = &overrides.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &overrides.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &overrides.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}

impl IdentityProvider for StsIdentityProvider {
    fn caller_identity(&self) -> Result<CallerIdentity, IdentityError> {
        let shared = self.sdk_config();
        self.runtime.block_on(async {
            let provider = shared
                .credentials_provider()
                .ok_or(IdentityError::NoCredentials)?;
            // Resolve once up front so a missing or broken chain is reported
            // as such instead of as an opaque dispatch failure.
            let credentials = provider
                .provide_credentials()
                .await
                .map_err(map_credentials_error)?;

            let mut builder = aws_sdk_sts::config::Builder::from(shared).credentials_provider(credentials);
            if shared.region().is_none() {
                builder = builder.region(Region::new(DEFAULT_REGION));
            }
            let client = aws_sdk_sts::Client::from_conf(builder.build());

            let output = client
                .get_caller_identity()
                .send()
                .await
                .map_err(map_sdk_error)?;
            let account = output
                .account()
                .map(str::to_string)
                .ok_or_else(|| IdentityError::Unclassified {
                    message: "GetCallerIdentity response did not include an account".into(),
                })?;

            Ok(CallerIdentity {
                account,
                arn: output.arn().map(str::to_string),
                user_id: output.user_id().map(str::to_string),
            })
        })
    }

    fn region(&self) -> Option<String> {
        self.overrides.region.clone().or_else(|| {
            self.sdk_config()
                .region()
                .map(|region| region.as_ref().to_string())
        })
    }
}

fn map_credentials_error(err: CredentialsError) -> IdentityError {
    match err {
        CredentialsError::CredentialsNotLoaded(_) => IdentityError::NoCredentials,
        CredentialsError::InvalidConfiguration(_) => IdentityError::IncompleteCredentials {
            message: DisplayErrorContext(&err).to_string(),
        },
        other => IdentityError::Unclassified {
            message: DisplayErrorContext(&other).to_string(),
        },
    }
}

fn map_sdk_error(err: SdkError<GetCallerIdentityError>) -> IdentityError {
    match err.code() {
        Some(code) => IdentityError::Rejected {
            code: code.to_string(),
            message: err.message().map(str::to_string),
        },
        None => IdentityError::Unclassified {
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

/// Provider driven by environment variables, for exercising the CLI without
/// cloud access.
///
/// `AGENTCORE_IDENTITY_ERROR` accepts `no_credentials`, `incomplete`,
/// `code:<Code>[:<Message>]` and `unclassified:<message>`.
#[derive(Debug, Clone, Default)]
pub struct EnvIdentityProvider {
    region_override: Option<String>,
}

impl EnvIdentityProvider {
    pub fn new(overrides: &AwsSection) -> Self {
        Self {
            region_override: overrides.region.clone(),
        }
    }
}

impl IdentityProvider for EnvIdentityProvider {
    fn caller_identity(&self) -> Result<CallerIdentity, IdentityError> {
        if let Some(raw) = non_empty_env(IDENTITY_ERROR_ENV) {
            return Err(parse_simulated_error(&raw));
        }
        let account = non_empty_env(IDENTITY_ACCOUNT_ENV).unwrap_or_else(|| SIMULATED_ACCOUNT.into());
        Ok(CallerIdentity {
            arn: Some(format!("arn:aws:iam::{account}:user/agentcore")),
            account,
            user_id: None,
        })
    }

    fn region(&self) -> Option<String> {
        self.region_override
            .clone()
            .or_else(|| non_empty_env(IDENTITY_REGION_ENV))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Turn an `AGENTCORE_IDENTITY_ERROR` value into the failure it simulates.
pub fn parse_simulated_error(raw: &str) -> IdentityError {
    match raw {
        "no_credentials" => return IdentityError::NoCredentials,
        "incomplete" => {
            return IdentityError::IncompleteCredentials {
                message: "simulated partial credentials".into(),
            }
        }
        _ => {}
    }

    if let Some(rest) = raw.strip_prefix("code:") {
        let mut parts = rest.splitn(2, ':');
        let code = parts.next().unwrap_or_default().to_string();
        let message = parts.next().map(str::to_string);
        if !code.is_empty() {
            return IdentityError::Rejected { code, message };
        }
    }

    let message = raw.strip_prefix("unclassified:").unwrap_or(raw);
    IdentityError::Unclassified {
        message: message.to_string(),
    }
}
