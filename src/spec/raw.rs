//! Serde model of the spec document as authored.
//!
//! Everything is optional or defaulted here; required fields are enforced by the
//! normalizer so a missing `project.name` surfaces as a [`MalformedSpecError`]
//! naming the field instead of a generic deserialization failure.
//!
//! [`MalformedSpecError`]: crate::core::MalformedSpecError

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::error::Result;

/// Raw spec document, usually parsed from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSpec {
    pub project: Option<RawProject>,
    pub production_patterns: Option<RawProductionPatterns>,
    pub error_handling: Option<RawErrorHandling>,
    pub external_dependencies: Option<RawExternalDependencies>,
    pub tools: Option<Vec<RawTool>>,
    pub configuration: Option<RawConfiguration>,
}

impl RawSpec {
    /// Parse a spec from YAML text. JSON is valid YAML, so both are accepted.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read and parse a spec file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_yaml_str(&content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProject {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Target language identifier, e.g. `typescript` or `python`
    pub sdk: Option<String>,
    pub node_version: Option<String>,
    pub python_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProductionPatterns {
    pub enabled: Vec<String>,
    pub long_running_operations: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawErrorHandling {
    pub expected_scenarios: Vec<String>,
    pub custom_errors: Vec<RawCustomError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCustomError {
    pub code: String,
    pub message: String,
    pub retry_after: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExternalDependencies {
    pub enabled: bool,
    pub primary_url: Option<String>,
    pub fallback_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_config: Option<RawRetryConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRetryConfig {
    pub max_retries: Option<u32>,
    pub backoff_multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTool {
    pub name: Option<String>,
    pub description: Option<String>,
    pub long_running: bool,
    pub progress_notifications: bool,
    pub estimated_duration_seconds: Option<u64>,
    pub parameters: Vec<RawParameter>,
    pub behavior: Option<RawBehavior>,
    pub caching: Option<RawCaching>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParameter {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<JsonValue>,
    pub validation: Option<RawValidation>,
}

/// Validation rules with the document's snake_case keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawValidation {
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBehavior {
    pub api_endpoint: Option<String>,
    pub returns: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCaching {
    pub enabled: bool,
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfiguration {
    pub environment_variables: Vec<RawEnvVar>,
    pub runtime_options: Vec<RawRuntimeOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEnvVar {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub default: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRuntimeOption {
    pub name: String,
    #[serde(rename = "type")]
    pub option_type: Option<String>,
    pub default: Option<JsonValue>,
    pub description: Option<String>,
}
