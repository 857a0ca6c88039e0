//! Spec normalization: raw document in, strict [`NormalizedSpec`] out.
//!
//! Required fields (`project.name`, `tools`) are checked and reported with
//! [`MalformedSpecError`]; everything else falls back to a documented default.
//! Unrecognized scenarios, toggles and parameter types are dropped with a warning.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::core::error::MalformedSpecError;
use crate::core::language::Language;
use crate::core::utils::to_snake_case;

use super::model::{
    BackoffStrategy, CachingConfig, Configuration, CustomError, Dependencies, EnvVarDefinition,
    ErrorHandlingConfig, ErrorScenario, ExternalDependency, GlobalPatternConfig, LogLevel,
    LoggingConfig, NormalizedSpec, ParamType, PatternConfig, ProductionPattern, ProjectMetadata,
    RetryConfig, ToolDefinition, ToolParameter, ToolPatternConfig, Validation, ValidationConfig,
};
use super::raw::{
    RawConfiguration, RawErrorHandling, RawExternalDependencies, RawParameter, RawSpec, RawTool,
    RawValidation,
};

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Errors a retry wrapper treats as transient when the spec configures retries
/// Tool names become file names and identifiers in the generated project
static TOOL_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("tool name pattern is a valid regex")
});

const RETRYABLE_ERRORS: [&str; 2] = ["NetworkTimeoutError", "RateLimitError"];

/// Normalize a raw spec document
pub fn normalize(raw: &RawSpec) -> Result<NormalizedSpec, MalformedSpecError> {
    let project = raw
        .project
        .as_ref()
        .ok_or_else(|| MalformedSpecError::missing("project"))?;
    let name = non_blank(project.name.as_deref())
        .ok_or_else(|| MalformedSpecError::missing("project.name"))?;
    let raw_tools = raw
        .tools
        .as_ref()
        .ok_or_else(|| MalformedSpecError::missing("tools"))?;

    let language = Language::from_sdk(project.sdk.as_deref());
    if let Some(sdk) = project.sdk.as_deref() {
        if !sdk.eq_ignore_ascii_case(language.as_str()) && !sdk.eq_ignore_ascii_case("py") {
            warn!(sdk, fallback = %language, "Unrecognized sdk, using default language");
        }
    }

    let enabled = normalize_toggles(raw);
    let error_handling = normalize_error_handling(raw.error_handling.as_ref(), &enabled);
    let global = GlobalPatternConfig {
        error_handling,
        logging: LoggingConfig {
            enabled: enabled.contains(&ProductionPattern::Logging),
            level: LogLevel::Info,
            structured: true,
        },
        validation: ValidationConfig {
            enabled: enabled.contains(&ProductionPattern::InputValidation),
            strict: true,
        },
        long_running_operations: raw
            .production_patterns
            .as_ref()
            .is_some_and(|p| p.long_running_operations),
    };

    let external = raw.external_dependencies.as_ref();
    let mut tools = Vec::with_capacity(raw_tools.len());
    let mut tool_configs = BTreeMap::new();
    // Keyed by identifier so `get-data` and `get_data` cannot both claim `get_data`
    let mut seen: HashMap<String, String> = HashMap::new();

    for (index, raw_tool) in raw_tools.iter().enumerate() {
        let tool = normalize_tool(index, raw_tool)?;
        if let Some(existing) = seen.insert(to_snake_case(&tool.name), tool.name.clone()) {
            return Err(MalformedSpecError::new(
                format!("tools[{index}].name"),
                format!("duplicates tool `{existing}`"),
            ));
        }
        tool_configs.insert(tool.name.clone(), tool_pattern_config(raw_tool, external));
        tools.push(tool);
    }

    let spec = NormalizedSpec {
        metadata: ProjectMetadata {
            name: name.to_string(),
            version: non_blank(project.version.as_deref())
                .unwrap_or(DEFAULT_VERSION)
                .to_string(),
            description: project.description.clone().unwrap_or_default(),
            language,
        },
        patterns: PatternConfig {
            global,
            tools: tool_configs,
            enabled,
        },
        dependencies: Dependencies {
            external: normalize_external(external).into_iter().collect(),
            internal: Vec::new(),
        },
        tools,
        configuration: normalize_configuration(raw.configuration.as_ref()),
    };

    debug!(
        project = %spec.metadata.name,
        language = %spec.metadata.language,
        tools = spec.tools.len(),
        scenarios = spec.patterns.global.error_handling.scenarios.len(),
        external = spec.dependencies.external.len(),
        "Normalized spec"
    );

    Ok(spec)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_toggles(raw: &RawSpec) -> BTreeSet<ProductionPattern> {
    let Some(patterns) = raw.production_patterns.as_ref() else {
        return BTreeSet::new();
    };

    patterns
        .enabled
        .iter()
        .filter_map(|id| {
            let toggle = ProductionPattern::from_id(id.trim());
            if toggle.is_none() {
                warn!(pattern = %id, "Dropping unrecognized production pattern");
            }
            toggle
        })
        .collect()
}

fn normalize_error_handling(
    raw: Option<&RawErrorHandling>,
    enabled: &BTreeSet<ProductionPattern>,
) -> ErrorHandlingConfig {
    let mut scenarios: Vec<ErrorScenario> = Vec::new();
    let mut custom_errors = Vec::new();

    if let Some(raw) = raw {
        for id in &raw.expected_scenarios {
            match ErrorScenario::from_id(id.trim()) {
                Some(scenario) if !scenarios.contains(&scenario) => scenarios.push(scenario),
                Some(_) => {}
                None => warn!(scenario = %id, "Dropping unrecognized error scenario"),
            }
        }

        for (index, custom) in raw.custom_errors.iter().enumerate() {
            if custom.code.trim().is_empty() {
                warn!(index, "Dropping custom error without a code");
                continue;
            }
            custom_errors.push(CustomError {
                code: custom.code.trim().to_string(),
                message: custom.message.clone(),
                retryable: custom.retry_after,
            });
        }
    }

    if scenarios.is_empty() && !custom_errors.is_empty() {
        warn!(
            count = custom_errors.len(),
            "Custom errors are generated only alongside expected scenarios"
        );
    }

    ErrorHandlingConfig {
        enabled: enabled.contains(&ProductionPattern::ErrorHandling) || !scenarios.is_empty(),
        scenarios,
        custom_error_types: !custom_errors.is_empty(),
        custom_errors,
    }
}

fn normalize_tool(index: usize, raw: &RawTool) -> Result<ToolDefinition, MalformedSpecError> {
    let name = non_blank(raw.name.as_deref())
        .ok_or_else(|| MalformedSpecError::missing(format!("tools[{index}].name")))?;
    if !TOOL_NAME.is_match(name) {
        return Err(MalformedSpecError::new(
            format!("tools[{index}].name"),
            format!("`{name}` must be a letter or `_` followed by letters, digits, `_` or `-`"),
        ));
    }

    let parameters = raw
        .parameters
        .iter()
        .enumerate()
        .map(|(param_index, param)| normalize_parameter(index, param_index, name, param))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ToolDefinition {
        name: name.to_string(),
        description: raw.description.clone().unwrap_or_default(),
        long_running: raw.long_running,
        progress_notifications: raw.progress_notifications,
        estimated_duration_seconds: raw.estimated_duration_seconds,
        parameters,
        returns: raw.behavior.as_ref().and_then(|b| b.returns.clone()),
        api_endpoint: raw.behavior.as_ref().and_then(|b| b.api_endpoint.clone()),
    })
}

fn normalize_parameter(
    tool_index: usize,
    index: usize,
    tool_name: &str,
    raw: &RawParameter,
) -> Result<ToolParameter, MalformedSpecError> {
    let name = non_blank(raw.name.as_deref()).ok_or_else(|| {
        MalformedSpecError::missing(format!("tools[{tool_index}].parameters[{index}].name"))
    })?;

    let param_type = match raw.param_type.as_deref() {
        None => ParamType::String,
        Some(type_name) => ParamType::from_name(type_name).unwrap_or_else(|| {
            warn!(
                tool = tool_name,
                parameter = name,
                param_type = type_name,
                "Unrecognized parameter type, treating as any"
            );
            ParamType::Any
        }),
    };

    Ok(ToolParameter {
        name: name.to_string(),
        param_type,
        required: raw.required,
        description: raw.description.clone(),
        default: raw.default.clone(),
        validation: raw.validation.as_ref().map(convert_validation),
    })
}

fn convert_validation(raw: &RawValidation) -> Validation {
    Validation {
        pattern: raw.pattern.clone(),
        min_length: raw.min_length,
        max_length: raw.max_length,
        minimum: raw.minimum,
        maximum: raw.maximum,
        enum_values: raw.enum_values.clone(),
    }
}

fn tool_pattern_config(
    raw: &RawTool,
    external: Option<&RawExternalDependencies>,
) -> ToolPatternConfig {
    let retry = external.and_then(|e| e.retry_config.as_ref());
    let max_retries = retry.and_then(|r| r.max_retries).unwrap_or(0);

    ToolPatternConfig {
        long_running: raw.long_running,
        progress_notifications: raw.progress_notifications,
        retryable: external.is_some_and(|e| e.enabled) && max_retries > 0,
        retry_config: retry.map(|r| RetryConfig {
            max_attempts: r
                .max_retries
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            backoff_strategy: BackoffStrategy::from_multiplier(r.backoff_multiplier),
            retryable_errors: RETRYABLE_ERRORS.iter().map(|e| e.to_string()).collect(),
        }),
        timeout: timeout_seconds(external) * 1000,
        caching: raw.caching.as_ref().map(|c| CachingConfig {
            enabled: c.enabled,
            ttl_seconds: c.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
        }),
    }
}

fn timeout_seconds(external: Option<&RawExternalDependencies>) -> u64 {
    external
        .and_then(|e| e.timeout_seconds)
        .filter(|t| *t > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
}

fn normalize_external(raw: Option<&RawExternalDependencies>) -> Option<ExternalDependency> {
    let raw = raw.filter(|e| e.enabled)?;
    let retry = raw.retry_config.as_ref();

    Some(ExternalDependency {
        enabled: true,
        primary_url: raw.primary_url.clone(),
        fallback_url: raw.fallback_url.clone(),
        timeout_seconds: timeout_seconds(Some(raw)),
        max_retries: retry.and_then(|r| r.max_retries),
        backoff_multiplier: retry.and_then(|r| r.backoff_multiplier),
    })
}

fn normalize_configuration(raw: Option<&RawConfiguration>) -> Configuration {
    let Some(raw) = raw else {
        return Configuration::default();
    };

    let environment_variables = raw
        .environment_variables
        .iter()
        .filter(|v| !v.name.trim().is_empty())
        .map(|v| EnvVarDefinition {
            name: v.name.trim().to_string(),
            description: v.description.clone(),
            required: v.required,
            default_value: v.default.as_ref().and_then(scalar_to_string),
        })
        .collect();

    let runtime_config = raw
        .runtime_options
        .iter()
        .filter(|o| !o.name.trim().is_empty())
        .map(|o| {
            (
                o.name.trim().to_string(),
                o.default.clone().unwrap_or(JsonValue::Null),
            )
        })
        .collect();

    Configuration {
        environment_variables,
        runtime_config,
    }
}

/// Render a document value the way it would appear in a `.env` file
fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn parse(yaml: &str) -> RawSpec {
        RawSpec::from_yaml_str(yaml).unwrap()
    }

    const MINIMAL: &str = r#"
project:
  name: hello-server
tools:
  - name: say_hello
    description: Greets someone
    parameters:
      - name: name
        type: string
        required: true
"#;

    #[test]
    fn test_minimal_spec_defaults() {
        let spec = normalize(&parse(MINIMAL)).unwrap();

        assert_eq!(spec.metadata.name, "hello-server");
        assert_eq!(spec.metadata.version, DEFAULT_VERSION);
        assert_eq!(spec.metadata.language, Language::TypeScript);
        assert!(!spec.patterns.global.error_handling.enabled);
        assert!(!spec.patterns.global.logging.enabled);
        assert!(spec.dependencies.external.is_empty());

        let config = spec.tool_config("say_hello").unwrap();
        assert!(!config.retryable);
        assert_eq!(config.retry_config, None);
        assert_eq!(config.timeout, 10_000);
        assert_eq!(config.caching, None);
    }

    #[test]
    fn test_missing_required_fields() {
        let error = normalize(&parse("tools: []\n")).unwrap_err();
        assert_eq!(error.field, "project");

        let error = normalize(&parse("project:\n  version: 1.0.0\ntools: []\n")).unwrap_err();
        assert_eq!(error.field, "project.name");

        let error = normalize(&parse("project:\n  name: x\n")).unwrap_err();
        assert_eq!(error.field, "tools");

        let error = normalize(&parse(
            "project:\n  name: x\ntools:\n  - description: nameless\n",
        ))
        .unwrap_err();
        assert_eq!(error.field, "tools[0].name");

        let error = normalize(&parse(
            "project:\n  name: x\ntools:\n  - name: t\n    parameters:\n      - type: string\n",
        ))
        .unwrap_err();
        assert_eq!(error.field, "tools[0].parameters[0].name");
    }

    #[test]
    fn test_duplicate_tool_names_are_malformed() {
        let error = normalize(&parse(
            "project:\n  name: x\ntools:\n  - name: t\n  - name: t\n",
        ))
        .unwrap_err();
        assert_eq!(error.field, "tools[1].name");
        assert!(error.reason.contains("duplicates"));

        let error = normalize(&parse(
            "project:\n  name: x\ntools:\n  - name: get-data\n  - name: get_data\n",
        ))
        .unwrap_err();
        assert_eq!(error.field, "tools[1].name");
        assert!(error.reason.contains("`get-data`"));
    }

    #[test]
    fn test_tool_names_must_be_identifiers() {
        let rejected = [
            "'../../../escaped'",
            "'a/b'",
            "'a\\b'",
            "'..'",
            "'9lives'",
            "'has space'",
        ];
        for bad in rejected {
            let yaml = format!("project:\n  name: x\ntools:\n  - name: ok\n  - name: {bad}\n");
            let error = normalize(&parse(&yaml)).unwrap_err();
            assert_eq!(error.field, "tools[1].name", "{bad}");
        }

        let spec = normalize(&parse(
            "project:\n  name: x\ntools:\n  - name: get-weather\n  - name: _private2\n",
        ))
        .unwrap();
        assert_eq!(spec.tools[0].name, "get-weather");
    }

    #[test]
    fn test_every_tool_has_one_pattern_config() {
        let spec = normalize(&parse(
            "project:\n  name: x\ntools:\n  - name: a\n  - name: b\n  - name: c\n",
        ))
        .unwrap();
        assert_eq!(spec.patterns.tools.len(), spec.tools.len());
        for tool in &spec.tools {
            assert!(spec.tool_config(&tool.name).is_some());
        }
    }

    #[traced_test]
    #[test]
    fn test_unknown_scenarios_are_dropped_and_logged() {
        let spec = normalize(&parse(
            r#"
project:
  name: x
error_handling:
  expected_scenarios: [rate_limiting, solar_flare, rate_limiting, auth_failure]
tools: []
"#,
        ))
        .unwrap();

        assert_eq!(
            spec.patterns.global.error_handling.scenarios,
            vec![ErrorScenario::RateLimiting, ErrorScenario::AuthFailure]
        );
        assert!(spec.patterns.global.error_handling.enabled);
        assert!(logs_contain("Dropping unrecognized error scenario"));
        assert!(logs_contain("solar_flare"));
    }

    #[traced_test]
    #[test]
    fn test_unknown_toggles_and_types_are_logged() {
        let spec = normalize(&parse(
            r#"
project:
  name: x
production_patterns:
  enabled: [logging, telemetry]
tools:
  - name: t
    parameters:
      - name: when
        type: date
"#,
        ))
        .unwrap();

        assert_eq!(
            spec.patterns.enabled,
            BTreeSet::from([ProductionPattern::Logging])
        );
        assert!(spec.patterns.global.logging.enabled);
        assert_eq!(spec.tools[0].parameters[0].param_type, ParamType::Any);
        assert!(logs_contain("telemetry"));
        assert!(logs_contain("Unrecognized parameter type"));
    }

    #[test]
    fn test_validation_keys_are_converted() {
        let spec = normalize(&parse(
            r#"
project:
  name: x
tools:
  - name: t
    parameters:
      - name: code
        type: string
        validation:
          pattern: "^[A-Z]+$"
          min_length: 2
          max_length: 8
      - name: count
        type: number
        validation:
          minimum: 1
          maximum: 10
"#,
        ))
        .unwrap();

        let code = spec.tools[0].parameters[0].validation.as_ref().unwrap();
        assert_eq!(code.pattern.as_deref(), Some("^[A-Z]+$"));
        assert_eq!(code.min_length, Some(2));
        assert_eq!(code.max_length, Some(8));
        let count = spec.tools[0].parameters[1].validation.as_ref().unwrap();
        assert_eq!(count.minimum, Some(1.0));
        assert_eq!(count.maximum, Some(10.0));
        assert!(spec.has_validated_parameters());
    }

    #[test]
    fn test_retry_requires_enabled_dependency_and_positive_count() {
        let with = |enabled: bool, retries: u32| {
            parse(&format!(
                r#"
project:
  name: x
external_dependencies:
  enabled: {enabled}
  timeout_seconds: 30
  retry_config:
    max_retries: {retries}
    backoff_multiplier: 1
tools:
  - name: t
"#
            ))
        };

        let spec = normalize(&with(true, 5)).unwrap();
        let config = spec.tool_config("t").unwrap();
        assert!(config.retryable);
        assert_eq!(config.timeout, 30_000);
        let retry = config.retry_config.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.backoff_strategy, BackoffStrategy::Linear);
        assert_eq!(retry.retryable_errors, RETRYABLE_ERRORS);

        let spec = normalize(&with(false, 5)).unwrap();
        assert!(!spec.tool_config("t").unwrap().retryable);
        assert!(spec.dependencies.external.is_empty());

        let spec = normalize(&with(true, 0)).unwrap();
        let config = spec.tool_config("t").unwrap();
        assert!(!config.retryable);
        assert_eq!(
            config.retry_config.as_ref().unwrap().max_attempts,
            DEFAULT_MAX_ATTEMPTS
        );
    }

    #[test]
    fn test_supplemented_fields() {
        let spec = normalize(&parse(
            r#"
project:
  name: x
  sdk: python
error_handling:
  custom_errors:
    - code: quota_exceeded
      message: Daily quota exceeded
      retry_after: true
external_dependencies:
  enabled: true
  primary_url: https://api.example.com
  fallback_url: https://backup.example.com
tools:
  - name: t
    estimated_duration_seconds: 45
    behavior:
      api_endpoint: /forecast
      returns: Forecast data
    caching:
      enabled: true
configuration:
  environment_variables:
    - name: PORT
      description: Port
      default: 8080
    - name: DEBUG
      description: Debug mode
      default: false
  runtime_options:
    - name: max_items
      type: number
      default: 50
"#,
        ))
        .unwrap();

        assert_eq!(spec.language(), Language::Python);
        let errors = &spec.patterns.global.error_handling;
        assert!(errors.custom_error_types);
        assert_eq!(errors.custom_errors[0].code, "quota_exceeded");
        assert!(errors.custom_errors[0].retryable);

        let dep = spec.primary_external_dependency().unwrap();
        assert_eq!(dep.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert!(spec.has_fallback_url());

        let tool = &spec.tools[0];
        assert_eq!(tool.estimated_duration_seconds, Some(45));
        assert_eq!(tool.api_endpoint.as_deref(), Some("/forecast"));
        assert_eq!(tool.returns.as_deref(), Some("Forecast data"));
        assert_eq!(
            spec.tool_config("t").unwrap().caching,
            Some(CachingConfig {
                enabled: true,
                ttl_seconds: DEFAULT_CACHE_TTL_SECONDS
            })
        );

        let env = &spec.configuration.environment_variables;
        assert_eq!(env[0].default_value.as_deref(), Some("8080"));
        assert_eq!(env[1].default_value.as_deref(), Some("false"));
        assert_eq!(
            spec.configuration.runtime_config.get("max_items"),
            Some(&serde_json::json!(50))
        );
    }

    #[test]
    fn test_production_toggles_include_implied() {
        let spec = normalize(&parse(
            r#"
project:
  name: x
error_handling:
  expected_scenarios: [invalid_input]
external_dependencies:
  enabled: true
tools: []
"#,
        ))
        .unwrap();

        let toggles = spec.production_toggles();
        assert!(toggles.contains(&ProductionPattern::ErrorHandling));
        assert!(toggles.contains(&ProductionPattern::GracefulDegradation));
        assert!(!toggles.contains(&ProductionPattern::Logging));
    }
}
