//! README synthesis for the generated project.

use crate::core::language::Language;
use crate::core::utils::table_cell;
use crate::patterns::manifest::PatternSelectionManifest;
use crate::spec::model::NormalizedSpec;

/// Human-readable project summary: enabled patterns, tools and environment
pub fn readme(spec: &NormalizedSpec, manifest: &PatternSelectionManifest) -> String {
    let metadata = &spec.metadata;
    let language = spec.language();

    let mut doc = format!("# {}\n\n", metadata.name);
    if !metadata.description.is_empty() {
        doc.push_str(&format!("{}\n\n", metadata.description));
    }

    doc.push_str("## Architecture\n\nThis MCP server implements production patterns for reliability:\n\n");
    for bullet in pattern_bullets(spec, manifest) {
        doc.push_str(&format!("- {bullet}\n"));
    }

    doc.push_str("\n### Pattern Selection\n\n| Tool | Pattern | Composition | Wrappers |\n|------|---------|-------------|----------|\n");
    for tool in &spec.tools {
        let Some(primary) = manifest.primary_tool_pattern(&tool.name) else {
            continue;
        };
        let wrappers: Vec<String> = manifest
            .wrappers(&tool.name)
            .map(|w| format!("`{}`", w.template))
            .collect();
        doc.push_str(&format!(
            "| `{}` | `{}` | {:?} | {} |\n",
            tool.name,
            primary.pattern(),
            primary.composition_strategy,
            if wrappers.is_empty() {
                "-".to_string()
            } else {
                wrappers.join(", ")
            }
        ));
    }

    let (install, run) = match language {
        Language::TypeScript => ("npm install\nnpm run build", "node dist/index.js"),
        Language::Python => ("pip install -e .", "python -m src.server"),
    };
    doc.push_str(&format!(
        "\n## Installation\n\n```bash\n{install}\n```\n\n## Testing with MCP Inspector\n\n```bash\nnpx @modelcontextprotocol/inspector {run}\n```\n\n"
    ));

    let (command, args) = match language {
        Language::TypeScript => (
            "node",
            format!("\"/absolute/path/to/{}/dist/index.js\"", metadata.name),
        ),
        Language::Python => ("python", "\"-m\", \"src.server\"".to_string()),
    };
    doc.push_str(&format!(
        "## Client Configuration\n\nAdd to your MCP client configuration:\n\n```json\n{{\n  \"mcpServers\": {{\n    \"{}\": {{\n      \"command\": \"{command}\",\n      \"args\": [{args}]\n    }}\n  }}\n}}\n```\n\n",
        metadata.name
    ));

    doc.push_str("## Available Tools\n\n");
    for tool in &spec.tools {
        doc.push_str(&format!("### `{}`\n\n", tool.name));
        if !tool.description.is_empty() {
            doc.push_str(&format!("{}\n\n", tool.description));
        }
        if tool.parameters.is_empty() {
            doc.push_str("No parameters.\n\n");
            continue;
        }
        doc.push_str("**Parameters:**\n\n| Name | Type | Required | Description |\n|------|------|----------|-------------|\n");
        for param in &tool.parameters {
            doc.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                param.name,
                param.param_type,
                yes_no(param.required),
                table_cell(param.description.as_deref().unwrap_or_default())
            ));
        }
        doc.push('\n');
    }

    doc.push_str("## Environment Variables\n\n");
    let env_vars = &spec.configuration.environment_variables;
    if env_vars.is_empty() {
        doc.push_str("No environment variables required.\n");
    } else {
        doc.push_str("| Variable | Description | Required | Default |\n|----------|-------------|----------|---------|\n");
        for var in env_vars {
            doc.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                var.name,
                table_cell(&var.description),
                yes_no(var.required),
                table_cell(var.default_value.as_deref().unwrap_or_default())
            ));
        }
    }

    let development = match language {
        Language::TypeScript => {
            "npm run dev    # Watch mode\nnpm test       # Run tests\nnpm run lint   # Lint code"
        }
        Language::Python => "pip install -e '.[dev]'\npytest",
    };
    doc.push_str(&format!(
        "\n## Development\n\n```bash\n{development}\n```\n\n## License\n\nMIT\n"
    ));

    doc
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn pattern_bullets(spec: &NormalizedSpec, manifest: &PatternSelectionManifest) -> Vec<String> {
    let global = &spec.patterns.global;
    let mut bullets = Vec::new();

    if global.error_handling.enabled {
        bullets.push(
            "**Error Handling**: Structured error types with MCP protocol codes".to_string(),
        );
    }
    if global.validation.enabled || spec.has_validated_parameters() {
        let schemas = match spec.language() {
            Language::TypeScript => "Zod schemas",
            Language::Python => "Pydantic models",
        };
        bullets.push(format!("**Input Validation**: {schemas} for runtime type safety"));
    }
    if global.logging.enabled {
        bullets.push("**Logging**: Structured logging via MCP notifications".to_string());
    }
    if spec.has_enabled_external_dependency() {
        bullets.push(
            "**Graceful Degradation**: Fallback strategies for external services".to_string(),
        );
    }
    if global.long_running_operations || spec.tools.iter().any(|t| t.reports_progress()) {
        bullets.push(
            "**Progress Notifications**: Real-time updates for long operations".to_string(),
        );
    }

    let selections = || manifest.tool_patterns.values().flatten();
    if selections().any(|s| s.pattern().encodes_retry()) {
        bullets.push("**Retry**: Backoff for transient failures of external calls".to_string());
    }
    if selections().any(|s| s.pattern() == crate::patterns::ToolPattern::CachedTool) {
        bullets.push("**Caching**: Time-bounded result caching per tool".to_string());
    }

    if bullets.is_empty() {
        bullets.push(
            "**Basic Tools**: Plain tool implementations without extra hardening".to_string(),
        );
    }
    bullets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternSelector;
    use crate::spec::{RawSpec, normalize};

    fn readme_for(yaml: &str) -> String {
        let spec = normalize(&RawSpec::from_yaml_str(yaml).unwrap()).unwrap();
        let manifest = PatternSelector::default().build_manifest(&spec).unwrap();
        readme(&spec, &manifest)
    }

    const SPEC: &str = r#"
project:
  name: weather
  description: Weather data
production_patterns:
  enabled: [error_handling, logging]
external_dependencies:
  enabled: true
  primary_url: https://api.example.com
  retry_config:
    max_retries: 3
configuration:
  environment_variables:
    - name: API_KEY
      description: Key for | the API
      required: true
tools:
  - name: get_forecast
    description: Forecast for a city
    long_running: true
    parameters:
      - name: city
        type: string
        required: true
        description: "City name,
          as typed"
  - name: ping
"#;

    #[test]
    fn test_pattern_bullets() {
        let doc = readme_for(SPEC);
        assert!(doc.starts_with("# weather\n\nWeather data\n"));
        assert!(doc.contains("- **Error Handling**"));
        assert!(doc.contains("- **Logging**"));
        assert!(doc.contains("- **Graceful Degradation**"));
        assert!(doc.contains("- **Progress Notifications**"));
        assert!(doc.contains("- **Retry**"));
        assert!(!doc.contains("- **Caching**"));
    }

    #[test]
    fn test_tool_tables() {
        let doc = readme_for(SPEC);
        assert!(doc.contains("| `get_forecast` | `long-running-tool` | Wrap | - |"));
        assert!(doc.contains("| `city` | string | Yes | City name, as typed |"));
        assert!(doc.contains("### `ping`\n\nNo parameters.\n"));
        assert!(doc.contains("| `API_KEY` | Key for \\| the API | Yes | - |"));
    }

    #[test]
    fn test_python_commands() {
        let doc = readme_for("project: {name: p, sdk: python}\ntools: [{name: t}]\n");
        assert!(doc.contains("pip install -e ."));
        assert!(doc.contains("npx @modelcontextprotocol/inspector python -m src.server"));
        assert!(doc.contains("No environment variables required."));
    }
}
