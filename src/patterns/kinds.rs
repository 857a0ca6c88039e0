//! Pattern identifiers and their fixed properties.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::language::Language;
use crate::core::utils::to_pascal_case;

/// Patterns realized as one standalone file shared by the whole project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalPattern {
    ErrorTypes,
    ErrorHandler,
    Logger,
    ConfigLoader,
    ValidationSchemas,
    HealthCheck,
}

impl GlobalPattern {
    /// All global patterns in priority order
    pub const ALL: [GlobalPattern; 6] = [
        GlobalPattern::ErrorTypes,
        GlobalPattern::ErrorHandler,
        GlobalPattern::Logger,
        GlobalPattern::ConfigLoader,
        GlobalPattern::ValidationSchemas,
        GlobalPattern::HealthCheck,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GlobalPattern::ErrorTypes => "error-types",
            GlobalPattern::ErrorHandler => "error-handler",
            GlobalPattern::Logger => "logger",
            GlobalPattern::ConfigLoader => "config-loader",
            GlobalPattern::ValidationSchemas => "validation-schemas",
            GlobalPattern::HealthCheck => "health-check",
        }
    }

    /// Generation priority. Lower values are dependencies of higher ones.
    pub fn priority(&self) -> u8 {
        match self {
            GlobalPattern::ErrorTypes => 1,
            GlobalPattern::ErrorHandler => 2,
            GlobalPattern::Logger => 3,
            GlobalPattern::ConfigLoader => 4,
            GlobalPattern::ValidationSchemas => 5,
            GlobalPattern::HealthCheck => 6,
        }
    }

    pub fn template_name(&self) -> &'static str {
        self.id()
    }

    /// Other global patterns this one imports, when they are selected too
    pub fn depends_on(&self) -> &'static [GlobalPattern] {
        match self {
            GlobalPattern::ErrorHandler => &[GlobalPattern::ErrorTypes],
            GlobalPattern::HealthCheck => &[GlobalPattern::Logger, GlobalPattern::ConfigLoader],
            _ => &[],
        }
    }

    /// Deterministic output path for the target language
    pub fn output_path(&self, language: Language) -> String {
        let (dir, stem) = match self {
            GlobalPattern::ErrorTypes => ("errors", "error-types"),
            GlobalPattern::ErrorHandler => ("errors", "error-handler"),
            GlobalPattern::Logger => ("utils", "logger"),
            GlobalPattern::ConfigLoader => ("config", "config-loader"),
            GlobalPattern::ValidationSchemas => ("schemas", "tool-schemas"),
            GlobalPattern::HealthCheck => ("health", "health-check"),
        };
        format!(
            "src/{dir}/{}.{}",
            language.module_stem(stem),
            language.file_extension()
        )
    }

    /// Coarse section classification, for documentation only
    pub fn section(&self) -> Section {
        match self {
            GlobalPattern::ErrorTypes => Section::Classes,
            GlobalPattern::ValidationSchemas => Section::Types,
            _ => Section::Functions,
        }
    }
}

impl fmt::Display for GlobalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Patterns realized inside a single tool's implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolPattern {
    BasicTool,
    ValidatedTool,
    ProgressTool,
    RetryTool,
    CachedTool,
    LongRunningTool,
}

impl ToolPattern {
    pub const ALL: [ToolPattern; 6] = [
        ToolPattern::BasicTool,
        ToolPattern::ValidatedTool,
        ToolPattern::ProgressTool,
        ToolPattern::RetryTool,
        ToolPattern::CachedTool,
        ToolPattern::LongRunningTool,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ToolPattern::BasicTool => "basic-tool",
            ToolPattern::ValidatedTool => "validated-tool",
            ToolPattern::ProgressTool => "progress-tool",
            ToolPattern::RetryTool => "retry-tool",
            ToolPattern::CachedTool => "cached-tool",
            ToolPattern::LongRunningTool => "long-running-tool",
        }
    }

    pub fn template_name(&self) -> &'static str {
        self.id()
    }

    /// Whether the pattern's implementation already retries
    pub fn encodes_retry(&self) -> bool {
        matches!(self, ToolPattern::RetryTool | ToolPattern::LongRunningTool)
    }

    /// Whether the pattern's implementation already reports progress
    pub fn encodes_progress(&self) -> bool {
        matches!(self, ToolPattern::ProgressTool | ToolPattern::LongRunningTool)
    }

    /// Output path of a tool implementation
    pub fn tool_output_path(tool_name: &str, language: Language) -> String {
        format!(
            "src/tools/{}.{}",
            module_stem(tool_name, language),
            language.file_extension()
        )
    }
}

/// File stem of a tool module. Python imports modules by name, so `-` is not allowed there.
fn module_stem(tool_name: &str, language: Language) -> String {
    match language {
        Language::TypeScript => tool_name.to_string(),
        Language::Python => tool_name.replace('-', "_"),
    }
}

impl fmt::Display for ToolPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Standalone decorator added when the primary pattern lacks a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapperKind {
    Retry,
    Progress,
}

impl WrapperKind {
    /// Tool pattern the wrapper provides
    pub fn pattern(&self) -> ToolPattern {
        match self {
            WrapperKind::Retry => ToolPattern::RetryTool,
            WrapperKind::Progress => ToolPattern::ProgressTool,
        }
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            WrapperKind::Retry => "retry-wrapper",
            WrapperKind::Progress => "progress-wrapper",
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            WrapperKind::Retry => "retry",
            WrapperKind::Progress => "progress",
        }
    }

    pub fn output_path(&self, tool_name: &str, language: Language) -> String {
        format!(
            "src/tools/wrappers/{}_{}.{}",
            module_stem(tool_name, language),
            self.suffix(),
            language.file_extension()
        )
    }

    /// Name of the higher-order function a wrapper module exports
    pub fn function_name(&self, tool_function: &str, language: Language) -> String {
        match language {
            Language::TypeScript => format!("{tool_function}With{}", to_pascal_case(self.suffix())),
            Language::Python => format!("{tool_function}_with_{}", self.suffix()),
        }
    }
}

/// How a tool's primary pattern combines with its secondary capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionStrategy {
    /// Each capability applied as a decorator around the primary pattern
    Wrap,
    /// The primary pattern already encodes the single capability
    Extend,
    /// Validation and error handling folded into the pattern directly
    Mixin,
}

/// Section classification of a rendered fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Types,
    Constants,
    Classes,
    Functions,
    Exports,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priorities_follow_declaration_order() {
        let priorities: Vec<u8> = GlobalPattern::ALL.iter().map(|p| p.priority()).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_dependencies_have_lower_priority() {
        for pattern in GlobalPattern::ALL {
            for dep in pattern.depends_on() {
                assert!(dep.priority() < pattern.priority(), "{dep} before {pattern}");
            }
        }
    }

    #[test]
    fn test_global_output_paths() {
        assert_eq!(
            GlobalPattern::ErrorTypes.output_path(Language::TypeScript),
            "src/errors/error-types.ts"
        );
        assert_eq!(
            GlobalPattern::ValidationSchemas.output_path(Language::TypeScript),
            "src/schemas/tool-schemas.ts"
        );
        assert_eq!(
            GlobalPattern::ConfigLoader.output_path(Language::Python),
            "src/config/config_loader.py"
        );
        assert_eq!(
            GlobalPattern::Logger.output_path(Language::Python),
            "src/utils/logger.py"
        );
    }

    #[test]
    fn test_tool_and_wrapper_paths() {
        assert_eq!(
            ToolPattern::tool_output_path("say_hello", Language::TypeScript),
            "src/tools/say_hello.ts"
        );
        assert_eq!(
            WrapperKind::Retry.output_path("fetch", Language::Python),
            "src/tools/wrappers/fetch_retry.py"
        );
        assert_eq!(
            ToolPattern::tool_output_path("get-weather", Language::TypeScript),
            "src/tools/get-weather.ts"
        );
        assert_eq!(
            ToolPattern::tool_output_path("get-weather", Language::Python),
            "src/tools/get_weather.py"
        );
        assert_eq!(
            WrapperKind::Progress.output_path("get-weather", Language::Python),
            "src/tools/wrappers/get_weather_progress.py"
        );
        assert_eq!(WrapperKind::Progress.template_name(), "progress-wrapper");
        assert_eq!(WrapperKind::Progress.pattern(), ToolPattern::ProgressTool);
    }

    #[test]
    fn test_wrapper_function_names() {
        assert_eq!(
            WrapperKind::Retry.function_name("fetch_data", Language::TypeScript),
            "fetch_dataWithRetry"
        );
        assert_eq!(
            WrapperKind::Progress.function_name("fetch_data", Language::Python),
            "fetch_data_with_progress"
        );
    }

    #[test]
    fn test_serialized_ids_match() {
        for pattern in ToolPattern::ALL {
            let json = serde_json::to_value(pattern).unwrap();
            assert_eq!(json, pattern.id());
        }
        for pattern in GlobalPattern::ALL {
            let json = serde_json::to_value(pattern).unwrap();
            assert_eq!(json, pattern.id());
        }
    }

    #[test]
    fn test_sections() {
        assert_eq!(GlobalPattern::ErrorTypes.section(), Section::Classes);
        assert_eq!(GlobalPattern::ValidationSchemas.section(), Section::Types);
        assert_eq!(GlobalPattern::HealthCheck.section(), Section::Functions);
    }
}
