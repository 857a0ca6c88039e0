//! Strict, normalized spec model.
//!
//! Produced once per run by [`normalize`](super::normalize) and read-only afterwards.
//! Serialized field names are camelCase since the model is handed to templates
//! and printed by `mcpforge plan`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::language::Language;
use crate::core::utils::to_screaming_snake_case;

/// Recognized error conditions, each with a fixed class name, status and retryability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorScenario {
    InvalidInput,
    ApiUnavailable,
    RateLimiting,
    AuthFailure,
    NetworkTimeout,
    ResourceNotFound,
    ValidationError,
    InternalError,
}

impl ErrorScenario {
    pub const ALL: [ErrorScenario; 8] = [
        ErrorScenario::InvalidInput,
        ErrorScenario::ApiUnavailable,
        ErrorScenario::RateLimiting,
        ErrorScenario::AuthFailure,
        ErrorScenario::NetworkTimeout,
        ErrorScenario::ResourceNotFound,
        ErrorScenario::ValidationError,
        ErrorScenario::InternalError,
    ];

    /// Look up a scenario by its document identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn id(&self) -> &'static str {
        match self {
            ErrorScenario::InvalidInput => "invalid_input",
            ErrorScenario::ApiUnavailable => "api_unavailable",
            ErrorScenario::RateLimiting => "rate_limiting",
            ErrorScenario::AuthFailure => "auth_failure",
            ErrorScenario::NetworkTimeout => "network_timeout",
            ErrorScenario::ResourceNotFound => "resource_not_found",
            ErrorScenario::ValidationError => "validation_error",
            ErrorScenario::InternalError => "internal_error",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorScenario::InvalidInput => "InvalidInputError",
            ErrorScenario::ApiUnavailable => "ApiUnavailableError",
            ErrorScenario::RateLimiting => "RateLimitError",
            ErrorScenario::AuthFailure => "AuthenticationError",
            ErrorScenario::NetworkTimeout => "NetworkTimeoutError",
            ErrorScenario::ResourceNotFound => "ResourceNotFoundError",
            ErrorScenario::ValidationError => "ValidationError",
            ErrorScenario::InternalError => "InternalServerError",
        }
    }

    /// HTTP-equivalent status code
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorScenario::InvalidInput => 400,
            ErrorScenario::ApiUnavailable => 503,
            ErrorScenario::RateLimiting => 429,
            ErrorScenario::AuthFailure => 401,
            ErrorScenario::NetworkTimeout => 504,
            ErrorScenario::ResourceNotFound => 404,
            ErrorScenario::ValidationError => 422,
            ErrorScenario::InternalError => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorScenario::ApiUnavailable
                | ErrorScenario::RateLimiting
                | ErrorScenario::NetworkTimeout
        )
    }

    /// Machine error code, e.g. `RATE_LIMITING`
    pub fn error_code(&self) -> String {
        to_screaming_snake_case(self.id())
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorScenario::InvalidInput => "The provided input is invalid",
            ErrorScenario::ApiUnavailable => "The external API is temporarily unavailable",
            ErrorScenario::RateLimiting => "Rate limit exceeded, please try again later",
            ErrorScenario::AuthFailure => "Authentication failed",
            ErrorScenario::NetworkTimeout => "The request timed out",
            ErrorScenario::ResourceNotFound => "The requested resource was not found",
            ErrorScenario::ValidationError => "Input validation failed",
            ErrorScenario::InternalError => "An internal error occurred",
        }
    }
}

impl fmt::Display for ErrorScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Project-wide production pattern toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionPattern {
    ErrorHandling,
    ProgressNotifications,
    InputValidation,
    Logging,
    GracefulDegradation,
}

impl ProductionPattern {
    pub const ALL: [ProductionPattern; 5] = [
        ProductionPattern::ErrorHandling,
        ProductionPattern::ProgressNotifications,
        ProductionPattern::InputValidation,
        ProductionPattern::Logging,
        ProductionPattern::GracefulDegradation,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn id(&self) -> &'static str {
        match self {
            ProductionPattern::ErrorHandling => "error_handling",
            ProductionPattern::ProgressNotifications => "progress_notifications",
            ProductionPattern::InputValidation => "input_validation",
            ProductionPattern::Logging => "logging",
            ProductionPattern::GracefulDegradation => "graceful_degradation",
        }
    }
}

/// Abstract parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Unrecognized in the document; mapped to the target's top type
    Any,
}

impl ParamType {
    /// Parse a document type name; `integer` folds into `number`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "string" => Some(ParamType::String),
            "number" | "integer" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Any => "any",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Linear,
    #[default]
    Exponential,
}

impl BackoffStrategy {
    /// A multiplier of exactly 1 means constant steps; anything else grows
    pub fn from_multiplier(multiplier: Option<f64>) -> Self {
        match multiplier {
            Some(m) if m == 1.0 => BackoffStrategy::Linear,
            _ => BackoffStrategy::Exponential,
        }
    }
}

/// Normalized spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSpec {
    pub metadata: ProjectMetadata,
    pub patterns: PatternConfig,
    pub dependencies: Dependencies,
    pub tools: Vec<ToolDefinition>,
    pub configuration: Configuration,
}

impl NormalizedSpec {
    pub fn language(&self) -> Language {
        self.metadata.language
    }

    /// Resolved pattern config for a tool
    pub fn tool_config(&self, tool_name: &str) -> Option<&ToolPatternConfig> {
        self.patterns.tools.get(tool_name)
    }

    pub fn has_enabled_external_dependency(&self) -> bool {
        self.dependencies.external.iter().any(|d| d.enabled)
    }

    /// First enabled external dependency, the source of retry and timeout defaults
    pub fn primary_external_dependency(&self) -> Option<&ExternalDependency> {
        self.dependencies.external.iter().find(|d| d.enabled)
    }

    pub fn has_fallback_url(&self) -> bool {
        self.dependencies
            .external
            .iter()
            .any(|d| d.fallback_url.is_some())
    }

    /// Whether any tool parameter carries at least one validation rule
    pub fn has_validated_parameters(&self) -> bool {
        self.tools.iter().any(ToolDefinition::has_validated_parameters)
    }

    /// Explicit production pattern toggles plus those implied by the global config
    pub fn production_toggles(&self) -> BTreeSet<ProductionPattern> {
        let global = &self.patterns.global;
        let mut toggles = self.patterns.enabled.clone();
        if global.error_handling.enabled {
            toggles.insert(ProductionPattern::ErrorHandling);
        }
        if global.logging.enabled {
            toggles.insert(ProductionPattern::Logging);
        }
        if global.validation.enabled {
            toggles.insert(ProductionPattern::InputValidation);
        }
        if self.has_enabled_external_dependency() {
            toggles.insert(ProductionPattern::GracefulDegradation);
        }
        toggles
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    pub global: GlobalPatternConfig,
    /// One entry per declared tool
    pub tools: BTreeMap<String, ToolPatternConfig>,
    /// Recognized toggles from `production_patterns.enabled`
    pub enabled: BTreeSet<ProductionPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPatternConfig {
    pub error_handling: ErrorHandlingConfig,
    pub logging: LoggingConfig,
    pub validation: ValidationConfig,
    pub long_running_operations: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlingConfig {
    pub enabled: bool,
    pub scenarios: Vec<ErrorScenario>,
    pub custom_error_types: bool,
    pub custom_errors: Vec<CustomError>,
}

impl ErrorHandlingConfig {
    /// Whether the project gets an error-types module. Custom errors are extra
    /// classes in that module and never select it on their own.
    pub fn needs_error_types(&self) -> bool {
        self.enabled && !self.scenarios.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: LogLevel,
    pub structured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    pub enabled: bool,
    pub strict: bool,
}

/// Per-tool pattern configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPatternConfig {
    pub long_running: bool,
    pub progress_notifications: bool,
    pub retryable: bool,
    pub retry_config: Option<RetryConfig>,
    /// Timeout in milliseconds
    pub timeout: u64,
    pub caching: Option<CachingConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_strategy: BackoffStrategy,
    pub retryable_errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachingConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    pub external: Vec<ExternalDependency>,
    pub internal: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDependency {
    pub enabled: bool,
    pub primary_url: Option<String>,
    pub fallback_url: Option<String>,
    pub timeout_seconds: u64,
    pub max_retries: Option<u32>,
    pub backoff_multiplier: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub long_running: bool,
    pub progress_notifications: bool,
    pub estimated_duration_seconds: Option<u64>,
    pub parameters: Vec<ToolParameter>,
    pub returns: Option<String>,
    pub api_endpoint: Option<String>,
}

impl ToolDefinition {
    pub fn has_validated_parameters(&self) -> bool {
        self.parameters.iter().any(|p| p.has_validation_rules())
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// Whether invocations report progress
    pub fn reports_progress(&self) -> bool {
        self.long_running || self.progress_notifications
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<JsonValue>,
    pub validation: Option<Validation>,
}

impl ToolParameter {
    pub fn has_validation_rules(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| !v.is_empty())
    }
}

/// Parameter validation rules with internal field names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<String>>,
}

impl Validation {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.enum_values.as_ref().is_none_or(|e| e.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub environment_variables: Vec<EnvVarDefinition>,
    pub runtime_config: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarDefinition {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub default_value: Option<String>,
}
