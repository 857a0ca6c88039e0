//! Typed render contexts, one variant per pattern.
//!
//! The pattern identifier of a selection is derived from its context variant, so a
//! selection can never name one pattern while carrying another pattern's data.
//! Contexts serialize with camelCase keys; that key set is the contract with the
//! template library.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tera::Context;

use crate::core::error::Result;
use crate::core::language::Language;
use crate::core::utils::{escape_string_literal, to_pascal_case, to_snake_case};
use crate::patterns::kinds::{GlobalPattern, ToolPattern};
use crate::patterns::requirements::{GlobalPatternRequirements, ToolPatternRequirements};
use crate::spec::model::{
    BackoffStrategy, EnvVarDefinition, ErrorScenario, ExternalDependency, LogLevel,
    NormalizedSpec, ParamType, ToolDefinition, ToolParameter, Validation,
};

use super::helpers::map_type;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const LONG_RUNNING_DURATION_MS: u64 = 30_000;
pub const SHORT_DURATION_MS: u64 = 5_000;
pub const CUSTOM_ERROR_STATUS: u16 = 500;

const DEFAULT_RETRYABLE_ERRORS: [&str; 3] =
    ["NetworkTimeoutError", "ApiUnavailableError", "RateLimitError"];
const PROGRESS_STEPS: [&str; 3] = ["initializing", "processing", "finalizing"];

/// Build a Tera context from any serializable value whose JSON form is an object.
///
/// Each top-level key becomes a template variable.
pub fn tera_context<T: Serialize>(value: &T) -> Result<Context> {
    let mut context = Context::new();
    if let JsonValue::Object(map) = serde_json::to_value(value)? {
        for (key, value) in map {
            context.insert(key, &value);
        }
    }
    Ok(context)
}

/// Render context of a global pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pattern", content = "context", rename_all = "kebab-case")]
pub enum GlobalContext {
    ErrorTypes(ErrorTypesContext),
    ErrorHandler(ErrorHandlerContext),
    Logger(LoggerContext),
    ConfigLoader(ConfigLoaderContext),
    ValidationSchemas(ValidationSchemasContext),
    HealthCheck(HealthCheckContext),
}

impl GlobalContext {
    /// Build the context a global pattern's template expects
    pub fn build(pattern: GlobalPattern, spec: &NormalizedSpec) -> Self {
        let project = ProjectInfo::from_spec(spec);
        match pattern {
            GlobalPattern::ErrorTypes => GlobalContext::ErrorTypes(ErrorTypesContext {
                error_classes: error_classes(spec),
                custom_error_types: spec.patterns.global.error_handling.custom_error_types,
                include_base_class: true,
                include_error_codes: true,
                project,
            }),
            GlobalPattern::ErrorHandler => {
                let logging = spec.patterns.global.logging;
                GlobalContext::ErrorHandler(ErrorHandlerContext {
                    scenarios: spec
                        .patterns
                        .global
                        .error_handling
                        .scenarios
                        .iter()
                        .map(|s| s.id().to_string())
                        .collect(),
                    error_classes: if spec.patterns.global.error_handling.needs_error_types() {
                        error_classes(spec)
                    } else {
                        Vec::new()
                    },
                    include_logging: logging.enabled,
                    log_level: logging.level,
                    structured_logging: logging.structured,
                    project,
                })
            }
            GlobalPattern::Logger => {
                let logging = spec.patterns.global.logging;
                GlobalContext::Logger(LoggerContext {
                    log_level: logging.level,
                    structured: logging.structured,
                    project,
                })
            }
            GlobalPattern::ConfigLoader => GlobalContext::ConfigLoader(ConfigLoaderContext {
                env_vars: spec.configuration.environment_variables.clone(),
                runtime_config: spec.configuration.runtime_config.clone(),
                project,
            }),
            GlobalPattern::ValidationSchemas => {
                let language = spec.language();
                GlobalContext::ValidationSchemas(ValidationSchemasContext {
                    tools: spec
                        .tools
                        .iter()
                        .map(|tool| ToolSchemaContext {
                            name: tool.name.clone(),
                            schema_name: schema_name(&tool.name),
                            parameters: parameter_contexts(tool, language),
                        })
                        .collect(),
                    strict: spec.patterns.global.validation.strict,
                    project,
                })
            }
            GlobalPattern::HealthCheck => GlobalContext::HealthCheck(HealthCheckContext {
                external_dependencies: spec.dependencies.external.clone(),
                include_logging: spec.patterns.global.logging.enabled,
                include_config: !spec.configuration.environment_variables.is_empty(),
                project,
            }),
        }
    }

    pub fn pattern(&self) -> GlobalPattern {
        match self {
            GlobalContext::ErrorTypes(_) => GlobalPattern::ErrorTypes,
            GlobalContext::ErrorHandler(_) => GlobalPattern::ErrorHandler,
            GlobalContext::Logger(_) => GlobalPattern::Logger,
            GlobalContext::ConfigLoader(_) => GlobalPattern::ConfigLoader,
            GlobalContext::ValidationSchemas(_) => GlobalPattern::ValidationSchemas,
            GlobalContext::HealthCheck(_) => GlobalPattern::HealthCheck,
        }
    }

    pub fn to_tera_context(&self) -> Result<Context> {
        match self {
            GlobalContext::ErrorTypes(c) => tera_context(c),
            GlobalContext::ErrorHandler(c) => tera_context(c),
            GlobalContext::Logger(c) => tera_context(c),
            GlobalContext::ConfigLoader(c) => tera_context(c),
            GlobalContext::ValidationSchemas(c) => tera_context(c),
            GlobalContext::HealthCheck(c) => tera_context(c),
        }
    }
}

/// Keys every context carries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub server_name: String,
    pub server_version: String,
    pub language: Language,
}

impl ProjectInfo {
    pub fn from_spec(spec: &NormalizedSpec) -> Self {
        Self {
            server_name: spec.metadata.name.clone(),
            server_version: spec.metadata.version.clone(),
            language: spec.language(),
        }
    }
}

/// One generated error class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorClass {
    pub class_name: String,
    pub error_code: String,
    pub http_status: u16,
    pub retryable: bool,
    pub message: String,
    /// Declared under `custom_errors` rather than a recognized scenario
    pub custom: bool,
}

impl ErrorClass {
    pub fn from_scenario(scenario: ErrorScenario) -> Self {
        Self {
            class_name: scenario.class_name().to_string(),
            error_code: scenario.error_code(),
            http_status: scenario.http_status(),
            retryable: scenario.is_retryable(),
            message: scenario.default_message().to_string(),
            custom: false,
        }
    }
}

fn error_classes(spec: &NormalizedSpec) -> Vec<ErrorClass> {
    let errors = &spec.patterns.global.error_handling;
    let scenarios = errors.scenarios.iter().copied().map(ErrorClass::from_scenario);
    let custom = errors.custom_errors.iter().map(|e| ErrorClass {
        class_name: format!("{}Error", to_pascal_case(&e.code)),
        error_code: e.code.to_uppercase(),
        http_status: CUSTOM_ERROR_STATUS,
        retryable: e.retryable,
        message: e.message.clone(),
        custom: true,
    });
    scenarios.chain(custom).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTypesContext {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub error_classes: Vec<ErrorClass>,
    pub custom_error_types: bool,
    pub include_base_class: bool,
    pub include_error_codes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlerContext {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub scenarios: Vec<String>,
    pub error_classes: Vec<ErrorClass>,
    pub include_logging: bool,
    pub log_level: LogLevel,
    pub structured_logging: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerContext {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub log_level: LogLevel,
    pub structured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLoaderContext {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub env_vars: Vec<EnvVarDefinition>,
    pub runtime_config: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSchemasContext {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub tools: Vec<ToolSchemaContext>,
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchemaContext {
    pub name: String,
    pub schema_name: String,
    pub parameters: Vec<ParameterContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckContext {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub external_dependencies: Vec<ExternalDependency>,
    pub include_logging: bool,
    pub include_config: bool,
}

/// Parameter as seen by templates, with target-language types pre-resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterContext {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub ts_type: String,
    pub py_type: String,
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<JsonValue>,
    pub has_validation: bool,
    pub validation: Option<Validation>,
    /// Schema expression for the target language: a zod chain or a pydantic field
    pub schema: String,
}

impl ParameterContext {
    pub fn new(param: &ToolParameter, language: Language) -> Self {
        Self {
            name: param.name.clone(),
            param_type: param.param_type,
            ts_type: map_type(param.param_type.as_str(), Language::TypeScript),
            py_type: map_type(param.param_type.as_str(), Language::Python),
            required: param.required,
            description: param.description.clone(),
            default: param.default.clone(),
            has_validation: param.has_validation_rules(),
            validation: param.validation.clone(),
            schema: schema_expression(param, language),
        }
    }
}

fn parameter_contexts(tool: &ToolDefinition, language: Language) -> Vec<ParameterContext> {
    tool.parameters
        .iter()
        .map(|p| ParameterContext::new(p, language))
        .collect()
}

/// Identifier of a tool's implementation function. Tool names may contain `-`,
/// which no target language accepts in identifiers.
pub fn function_name(tool_name: &str, language: Language) -> String {
    match language {
        Language::TypeScript => tool_name.replace('-', "_"),
        Language::Python => to_snake_case(tool_name),
    }
}

pub fn schema_name(tool_name: &str) -> String {
    format!("{}Schema", to_pascal_case(tool_name))
}

/// Schema expression for one parameter in the target language
pub fn schema_expression(param: &ToolParameter, language: Language) -> String {
    match language {
        Language::TypeScript => zod_expression(param),
        Language::Python => pydantic_field(param),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn zod_expression(param: &ToolParameter) -> String {
    let rules = param.validation.clone().unwrap_or_default();
    let mut expr = match param.param_type {
        ParamType::String => match rules.enum_values.as_ref().filter(|e| !e.is_empty()) {
            Some(values) => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| format!("'{}'", escape_string_literal(v, '\'')))
                    .collect();
                format!("z.enum([{}])", quoted.join(", "))
            }
            None => {
                let mut expr = String::from("z.string()");
                if let Some(min) = rules.min_length {
                    expr.push_str(&format!(".min({min})"));
                }
                if let Some(max) = rules.max_length {
                    expr.push_str(&format!(".max({max})"));
                }
                if let Some(pattern) = &rules.pattern {
                    expr.push_str(&format!(
                        ".regex(new RegExp('{}'))",
                        escape_string_literal(pattern, '\'')
                    ));
                }
                expr
            }
        },
        ParamType::Number => {
            let mut expr = String::from("z.number()");
            if let Some(min) = rules.minimum {
                expr.push_str(&format!(".min({})", format_number(min)));
            }
            if let Some(max) = rules.maximum {
                expr.push_str(&format!(".max({})", format_number(max)));
            }
            expr
        }
        ParamType::Boolean => "z.boolean()".to_string(),
        ParamType::Array => "z.array(z.unknown())".to_string(),
        ParamType::Object => "z.record(z.string(), z.unknown())".to_string(),
        ParamType::Any => "z.unknown()".to_string(),
    };

    if let Some(description) = &param.description {
        expr.push_str(&format!(
            ".describe('{}')",
            escape_string_literal(description, '\'')
        ));
    }
    if !param.required {
        expr.push_str(".optional()");
    }
    expr
}

fn python_literal(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "None".to_string(),
        JsonValue::Bool(true) => "True".to_string(),
        JsonValue::Bool(false) => "False".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => format!("'{}'", escape_string_literal(s, '\'')),
        other => format!("'{}'", escape_string_literal(&other.to_string(), '\'')),
    }
}

fn pydantic_field(param: &ToolParameter) -> String {
    let rules = param.validation.clone().unwrap_or_default();
    let mut annotation = match rules.enum_values.as_ref().filter(|e| !e.is_empty()) {
        Some(values) if param.param_type == ParamType::String => {
            let quoted: Vec<String> = values
                .iter()
                .map(|v| format!("'{}'", escape_string_literal(v, '\'')))
                .collect();
            format!("Literal[{}]", quoted.join(", "))
        }
        _ => map_type(param.param_type.as_str(), Language::Python),
    };

    let default = if param.required {
        "...".to_string()
    } else {
        annotation = format!("Optional[{annotation}]");
        param
            .default
            .as_ref()
            .map(python_literal)
            .unwrap_or_else(|| "None".to_string())
    };

    let mut args = vec![default];
    if let Some(min) = rules.min_length {
        args.push(format!("min_length={min}"));
    }
    if let Some(max) = rules.max_length {
        args.push(format!("max_length={max}"));
    }
    if let Some(pattern) = &rules.pattern {
        args.push(format!("pattern='{}'", escape_string_literal(pattern, '\'')));
    }
    if let Some(min) = rules.minimum {
        args.push(format!("ge={}", format_number(min)));
    }
    if let Some(max) = rules.maximum {
        args.push(format!("le={}", format_number(max)));
    }
    if let Some(description) = &param.description {
        args.push(format!(
            "description='{}'",
            escape_string_literal(description, '\'')
        ));
    }

    format!("{annotation} = Field({})", args.join(", "))
}

/// Which global files exist for tool templates to import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableGlobals {
    pub error_types: bool,
    pub error_handler: bool,
    pub logger: bool,
    pub config_loader: bool,
    pub validation_schemas: bool,
    pub health_check: bool,
}

impl From<&GlobalPatternRequirements> for AvailableGlobals {
    fn from(req: &GlobalPatternRequirements) -> Self {
        Self {
            error_types: req.error_types,
            error_handler: req.error_handler,
            logger: req.logger,
            config_loader: req.config_loader,
            validation_schemas: req.validation_schemas,
            health_check: req.health_check,
        }
    }
}

/// Context shared by every tool pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolContext {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub tool_name: String,
    /// Identifier of the exported implementation function
    pub function_name: String,
    pub description: String,
    pub schema_name: String,
    pub input_type_name: String,
    pub parameters: Vec<ParameterContext>,
    pub required_parameters: Vec<String>,
    pub returns: String,
    pub api_endpoint: Option<String>,
    pub long_running: bool,
    pub progress_notifications: bool,
    pub retryable: bool,
    /// Timeout in milliseconds
    pub timeout: u64,
    pub has_validation: bool,
    pub requirements: ToolPatternRequirements,
    pub globals: AvailableGlobals,
}

impl ToolContext {
    pub fn new(
        tool: &ToolDefinition,
        spec: &NormalizedSpec,
        requirements: &ToolPatternRequirements,
        globals: &GlobalPatternRequirements,
    ) -> Self {
        let language = spec.language();
        let config = spec.tool_config(&tool.name);
        Self {
            project: ProjectInfo::from_spec(spec),
            tool_name: tool.name.clone(),
            function_name: function_name(&tool.name, language),
            description: tool.description.clone(),
            schema_name: schema_name(&tool.name),
            input_type_name: format!("{}Input", to_pascal_case(&tool.name)),
            parameters: parameter_contexts(tool, language),
            required_parameters: tool.required_parameters().map(|p| p.name.clone()).collect(),
            returns: tool.returns.clone().unwrap_or_else(|| "unknown".to_string()),
            api_endpoint: tool.api_endpoint.clone(),
            long_running: tool.long_running,
            progress_notifications: tool.progress_notifications,
            retryable: config.is_some_and(|c| c.retryable),
            timeout: config.map(|c| c.timeout).unwrap_or(DEFAULT_TIMEOUT_MS),
            has_validation: tool.has_validated_parameters(),
            requirements: *requirements,
            globals: globals.into(),
        }
    }
}

/// Retry knobs resolved through tool config, external dependency, then defaults
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySettings {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub backoff_strategy: BackoffStrategy,
    pub retryable_errors: Vec<String>,
    pub fallback_enabled: bool,
    pub fallback_url: Option<String>,
    pub timeout_ms: u64,
}

impl RetrySettings {
    pub fn resolve(tool: &ToolDefinition, spec: &NormalizedSpec) -> Self {
        let config = spec.tool_config(&tool.name);
        let retry = config.and_then(|c| c.retry_config.as_ref());
        let dependency = spec.primary_external_dependency();

        let max_retries = retry
            .map(|r| r.max_attempts)
            .or_else(|| dependency.and_then(|d| d.max_retries).filter(|n| *n > 0))
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let backoff_strategy = retry
            .map(|r| r.backoff_strategy)
            .or_else(|| dependency.map(|d| BackoffStrategy::from_multiplier(d.backoff_multiplier)))
            .unwrap_or_default();
        let retryable_errors = retry
            .map(|r| r.retryable_errors.clone())
            .filter(|errors| !errors.is_empty())
            .unwrap_or_else(|| DEFAULT_RETRYABLE_ERRORS.iter().map(|e| e.to_string()).collect());
        let timeout_ms = config
            .map(|c| c.timeout)
            .or_else(|| dependency.map(|d| d.timeout_seconds * 1000))
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let fallback_url = dependency.and_then(|d| d.fallback_url.clone());

        Self {
            max_retries,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: dependency
                .and_then(|d| d.backoff_multiplier)
                .unwrap_or(DEFAULT_BACKOFF_MULTIPLIER),
            backoff_strategy,
            retryable_errors,
            fallback_enabled: fallback_url.is_some(),
            fallback_url,
            timeout_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSettings {
    pub progress_enabled: bool,
    /// Expected duration in milliseconds
    pub estimated_duration: u64,
    pub progress_steps: Vec<String>,
}

impl ProgressSettings {
    pub fn resolve(tool: &ToolDefinition) -> Self {
        let estimated_duration = match tool.estimated_duration_seconds {
            Some(seconds) if seconds > 0 => seconds * 1000,
            _ if tool.long_running => LONG_RUNNING_DURATION_MS,
            _ => SHORT_DURATION_MS,
        };
        Self {
            progress_enabled: tool.reports_progress(),
            estimated_duration,
            progress_steps: PROGRESS_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub param_name: String,
    pub rules: Validation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedToolContext {
    #[serde(flatten)]
    pub base: ToolContext,
    pub validation_enabled: bool,
    pub strict_validation: bool,
    pub validation_rules: Vec<ValidationRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressToolContext {
    #[serde(flatten)]
    pub base: ToolContext,
    #[serde(flatten)]
    pub progress: ProgressSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryToolContext {
    #[serde(flatten)]
    pub base: ToolContext,
    #[serde(flatten)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToolContext {
    #[serde(flatten)]
    pub base: ToolContext,
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningToolContext {
    #[serde(flatten)]
    pub base: ToolContext,
    #[serde(flatten)]
    pub retry: RetrySettings,
    #[serde(flatten)]
    pub progress: ProgressSettings,
}

/// Render context of a tool pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pattern", content = "context", rename_all = "kebab-case")]
pub enum ToolPatternContext {
    BasicTool(ToolContext),
    ValidatedTool(ValidatedToolContext),
    ProgressTool(ProgressToolContext),
    RetryTool(RetryToolContext),
    CachedTool(CachedToolContext),
    LongRunningTool(LongRunningToolContext),
}

impl ToolPatternContext {
    /// Build the context a tool pattern's template expects
    pub fn build(
        pattern: ToolPattern,
        tool: &ToolDefinition,
        spec: &NormalizedSpec,
        requirements: &ToolPatternRequirements,
        globals: &GlobalPatternRequirements,
    ) -> Self {
        let base = ToolContext::new(tool, spec, requirements, globals);
        match pattern {
            ToolPattern::BasicTool => ToolPatternContext::BasicTool(base),
            ToolPattern::ValidatedTool => {
                let validation = spec.patterns.global.validation;
                ToolPatternContext::ValidatedTool(ValidatedToolContext {
                    validation_enabled: validation.enabled || requirements.validation,
                    strict_validation: validation.strict,
                    validation_rules: tool
                        .parameters
                        .iter()
                        .filter(|p| p.has_validation_rules())
                        .filter_map(|p| {
                            p.validation.clone().map(|rules| ValidationRule {
                                param_name: p.name.clone(),
                                rules,
                            })
                        })
                        .collect(),
                    base,
                })
            }
            ToolPattern::ProgressTool => ToolPatternContext::ProgressTool(ProgressToolContext {
                progress: ProgressSettings::resolve(tool),
                base,
            }),
            ToolPattern::RetryTool => ToolPatternContext::RetryTool(RetryToolContext {
                retry: RetrySettings::resolve(tool, spec),
                base,
            }),
            ToolPattern::CachedTool => {
                let caching = spec.tool_config(&tool.name).and_then(|c| c.caching);
                ToolPatternContext::CachedTool(CachedToolContext {
                    cache_enabled: caching.is_some_and(|c| c.enabled),
                    cache_ttl_seconds: caching
                        .map(|c| c.ttl_seconds)
                        .unwrap_or(crate::spec::normalizer::DEFAULT_CACHE_TTL_SECONDS),
                    base,
                })
            }
            ToolPattern::LongRunningTool => {
                ToolPatternContext::LongRunningTool(LongRunningToolContext {
                    retry: RetrySettings::resolve(tool, spec),
                    progress: ProgressSettings::resolve(tool),
                    base,
                })
            }
        }
    }

    pub fn pattern(&self) -> ToolPattern {
        match self {
            ToolPatternContext::BasicTool(_) => ToolPattern::BasicTool,
            ToolPatternContext::ValidatedTool(_) => ToolPattern::ValidatedTool,
            ToolPatternContext::ProgressTool(_) => ToolPattern::ProgressTool,
            ToolPatternContext::RetryTool(_) => ToolPattern::RetryTool,
            ToolPatternContext::CachedTool(_) => ToolPattern::CachedTool,
            ToolPatternContext::LongRunningTool(_) => ToolPattern::LongRunningTool,
        }
    }

    /// Shared tool data
    pub fn base(&self) -> &ToolContext {
        match self {
            ToolPatternContext::BasicTool(c) => c,
            ToolPatternContext::ValidatedTool(c) => &c.base,
            ToolPatternContext::ProgressTool(c) => &c.base,
            ToolPatternContext::RetryTool(c) => &c.base,
            ToolPatternContext::CachedTool(c) => &c.base,
            ToolPatternContext::LongRunningTool(c) => &c.base,
        }
    }

    pub fn to_tera_context(&self) -> Result<Context> {
        match self {
            ToolPatternContext::BasicTool(c) => tera_context(c),
            ToolPatternContext::ValidatedTool(c) => tera_context(c),
            ToolPatternContext::ProgressTool(c) => tera_context(c),
            ToolPatternContext::RetryTool(c) => tera_context(c),
            ToolPatternContext::CachedTool(c) => tera_context(c),
            ToolPatternContext::LongRunningTool(c) => tera_context(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{RawSpec, normalize};

    fn spec(yaml: &str) -> NormalizedSpec {
        normalize(&RawSpec::from_yaml_str(yaml).unwrap()).unwrap()
    }

    const RETRY_SPEC: &str = r#"
project:
  name: weather
error_handling:
  expected_scenarios: [rate_limiting, invalid_input]
  custom_errors:
    - code: quota_exceeded
      message: Quota exceeded
      retry_after: true
external_dependencies:
  enabled: true
  fallback_url: https://backup.example.com
  timeout_seconds: 20
  retry_config:
    max_retries: 5
    backoff_multiplier: 3
tools:
  - name: get_forecast
    description: Gets the "forecast"
    long_running: true
    parameters:
      - name: city
        type: string
        required: true
        description: City's name
        validation:
          min_length: 2
      - name: days
        type: number
        validation:
          minimum: 1
          maximum: 7
"#;

    #[test]
    fn test_error_types_context() {
        let spec = spec(RETRY_SPEC);
        let GlobalContext::ErrorTypes(context) =
            GlobalContext::build(GlobalPattern::ErrorTypes, &spec)
        else {
            panic!("wrong variant");
        };

        assert_eq!(context.project.server_name, "weather");
        assert_eq!(context.error_classes.len(), 3);
        let rate = &context.error_classes[0];
        assert_eq!(rate.class_name, "RateLimitError");
        assert_eq!(rate.error_code, "RATE_LIMITING");
        assert_eq!(rate.http_status, 429);
        assert!(rate.retryable);
        let custom = &context.error_classes[2];
        assert_eq!(custom.class_name, "QuotaExceededError");
        assert_eq!(custom.error_code, "QUOTA_EXCEEDED");
        assert_eq!(custom.http_status, CUSTOM_ERROR_STATUS);
        assert!(custom.custom);
        assert!(context.custom_error_types);
    }

    #[test]
    fn test_error_handler_references_classes_only_with_error_types() {
        let handler_classes = |yaml: &str| {
            match GlobalContext::build(GlobalPattern::ErrorHandler, &spec(yaml)) {
                GlobalContext::ErrorHandler(context) => context.error_classes.len(),
                _ => panic!("wrong variant"),
            }
        };
        assert_eq!(handler_classes(RETRY_SPEC), 3);

        let custom_only = r#"
project:
  name: quota
production_patterns:
  enabled: [error_handling]
error_handling:
  custom_errors:
    - code: quota_exceeded
      message: Out of quota
tools:
  - name: t
"#;
        assert_eq!(handler_classes(custom_only), 0);
    }

    #[test]
    fn test_function_names_are_identifiers() {
        assert_eq!(function_name("get-weather", Language::TypeScript), "get_weather");
        assert_eq!(function_name("get_weather", Language::TypeScript), "get_weather");
        assert_eq!(function_name("get-weather", Language::Python), "get_weather");

        let spec = spec("project:\n  name: x\ntools:\n  - name: get-weather\n");
        let context = ToolContext::new(
            &spec.tools[0],
            &spec,
            &ToolPatternRequirements::default(),
            &GlobalPatternRequirements::default(),
        );
        assert_eq!(context.tool_name, "get-weather");
        assert_eq!(context.function_name, "get_weather");
    }

    #[test]
    fn test_pattern_is_derived_from_variant() {
        let spec = spec(RETRY_SPEC);
        for pattern in GlobalPattern::ALL {
            assert_eq!(GlobalContext::build(pattern, &spec).pattern(), pattern);
        }
        let tool = &spec.tools[0];
        let req = ToolPatternRequirements::default();
        let globals = GlobalPatternRequirements::default();
        for pattern in ToolPattern::ALL {
            let context = ToolPatternContext::build(pattern, tool, &spec, &req, &globals);
            assert_eq!(context.pattern(), pattern);
            assert_eq!(context.base().tool_name, "get_forecast");
        }
    }

    #[test]
    fn test_retry_settings_fall_back_through_chain() {
        let spec = spec(RETRY_SPEC);
        let retry = RetrySettings::resolve(&spec.tools[0], &spec);

        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.backoff_strategy, BackoffStrategy::Exponential);
        assert_eq!(retry.backoff_multiplier, 3.0);
        assert_eq!(retry.timeout_ms, 20_000);
        assert!(retry.fallback_enabled);
        assert_eq!(retry.retryable_errors, vec!["NetworkTimeoutError", "RateLimitError"]);
    }

    #[test]
    fn test_retry_settings_hard_defaults() {
        let spec = spec("project:\n  name: x\ntools:\n  - name: t\n");
        let retry = RetrySettings::resolve(&spec.tools[0], &spec);

        assert_eq!(retry.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(retry.backoff_strategy, BackoffStrategy::Exponential);
        assert_eq!(retry.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(retry.retryable_errors, DEFAULT_RETRYABLE_ERRORS);
        assert!(!retry.fallback_enabled);
    }

    #[test]
    fn test_progress_settings() {
        let spec = spec(RETRY_SPEC);
        let progress = ProgressSettings::resolve(&spec.tools[0]);
        assert!(progress.progress_enabled);
        assert_eq!(progress.estimated_duration, LONG_RUNNING_DURATION_MS);
        assert_eq!(progress.progress_steps, PROGRESS_STEPS);
    }

    #[test]
    fn test_zod_and_pydantic_expressions() {
        let spec = spec(RETRY_SPEC);
        let city = &spec.tools[0].parameters[0];
        let days = &spec.tools[0].parameters[1];

        assert_eq!(
            schema_expression(city, Language::TypeScript),
            "z.string().min(2).describe('City\\'s name')"
        );
        assert_eq!(
            schema_expression(days, Language::TypeScript),
            "z.number().min(1).max(7).optional()"
        );
        assert_eq!(
            schema_expression(city, Language::Python),
            "str = Field(..., min_length=2, description='City\\'s name')"
        );
        assert_eq!(
            schema_expression(days, Language::Python),
            "Optional[float] = Field(None, ge=1, le=7)"
        );
    }

    #[test]
    fn test_long_running_context_flattens_settings() {
        let spec = spec(RETRY_SPEC);
        let tool = &spec.tools[0];
        let req = ToolPatternRequirements {
            progress: true,
            retry: true,
            ..Default::default()
        };
        let context = ToolPatternContext::build(
            ToolPattern::LongRunningTool,
            tool,
            &spec,
            &req,
            &GlobalPatternRequirements::default(),
        );
        let tera = context.to_tera_context().unwrap().into_json();

        assert_eq!(tera["toolName"], "get_forecast");
        assert_eq!(tera["schemaName"], "GetForecastSchema");
        assert_eq!(tera["maxRetries"], 5);
        assert_eq!(tera["estimatedDuration"], 30_000);
        assert_eq!(tera["requiredParameters"], serde_json::json!(["city"]));
        assert_eq!(tera["requirements"]["retry"], true);
        assert_eq!(tera["serverName"], "weather");
    }

    #[test]
    fn test_selection_serialization_carries_pattern_tag() {
        let spec = spec(RETRY_SPEC);
        let context = GlobalContext::build(GlobalPattern::Logger, &spec);
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["pattern"], "logger");
        assert_eq!(json["context"]["logLevel"], "info");
    }
}
