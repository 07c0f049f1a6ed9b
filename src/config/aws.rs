use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lib::errors::ConfigError;

/// `[aws]` overrides applied on top of the SDK's own configuration chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AwsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawAwsSection {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

pub fn parse_aws_section(raw: Option<RawAwsSection>, path: &Path) -> Result<AwsSection, ConfigError> {
    let raw = raw.unwrap_or_default();

    let profile = non_blank(raw.profile);
    let region = non_blank(raw.region);
    if let Some(region) = &region {
        validate_region(region, path)?;
    }
    let endpoint_url = non_blank(raw.endpoint_url);
    if let Some(url) = &endpoint_url {
        validate_endpoint(url, path)?;
    }

    Ok(AwsSection {
        profile,
        region,
        endpoint_url,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_region(region: &str, path: &Path) -> Result<(), ConfigError> {
    let well_formed = region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && region.contains('-')
        && !region.starts_with('-')
        && !region.ends_with('-');
    if well_formed {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "aws.region",
        message: format!("`{region}` is not a region name such as `us-west-2`"),
    })
}

fn validate_endpoint(url: &str, path: &Path) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "aws.endpoint_url",
        message: "Use an absolute http(s) URL".into(),
    })
}
