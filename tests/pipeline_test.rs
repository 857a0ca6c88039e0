//! End-to-end tests of the generation pipeline against templates written by the test

use std::path::Path;
use std::sync::Arc;

use mcpforge::core::{Error, FailureMode, GeneratorConfig, Language, RenderPolicy};
use mcpforge::generation::{FileKind, Generator, PLACEHOLDER_MARKER};
use mcpforge::patterns::{GlobalPattern, NodeId, ToolPattern};
use mcpforge::spec::RawSpec;
use mcpforge::templates::TemplateCache;
use tempfile::TempDir;

const GLOBAL_TEMPLATES: [&str; 6] = [
    "error-types",
    "error-handler",
    "logger",
    "config-loader",
    "validation-schemas",
    "health-check",
];

const TOOL_TEMPLATES: [&str; 8] = [
    "basic-tool",
    "validated-tool",
    "progress-tool",
    "retry-tool",
    "cached-tool",
    "long-running-tool",
    "retry-wrapper",
    "progress-wrapper",
];

const WEATHER_SPEC: &str = r#"
project:
  name: weather-server
  version: 1.2.0
  description: Forecasts on demand
production_patterns:
  enabled: [error_handling, logging]
error_handling:
  expected_scenarios: [rate_limiting, api_unavailable, solar_flare]
external_dependencies:
  enabled: true
  primary_url: https://api.weather.example
  retry_config:
    max_retries: 3
configuration:
  environment_variables:
    - name: WEATHER_API_KEY
      description: API key
      required: true
tools:
  - name: get_forecast
    description: Forecast for a city
    long_running: true
    progress_notifications: true
    parameters:
      - name: city
        type: string
        required: true
      - name: days
        type: number
        required: true
        validation:
          minimum: 1
          maximum: 7
      - name: units
        type: string
  - name: ping
"#;

/// Write one tiny template per name under `<root>/typescript/`
fn write_templates(root: &Path, names: &[&str]) {
    let dir = root.join(Language::TypeScript.as_str());
    std::fs::create_dir_all(&dir).expect("Failed to create template dir");
    for name in names {
        let body = if TOOL_TEMPLATES.contains(name) {
            format!("// {name} for {{{{ toolName }}}} ({{{{ functionName }}}})\n")
        } else {
            format!("// {name} for {{{{ serverName }}}}\n")
        };
        std::fs::write(dir.join(format!("{name}.tera")), body).expect("Failed to write template");
    }
}

fn all_templates() -> Vec<&'static str> {
    GLOBAL_TEMPLATES.iter().chain(TOOL_TEMPLATES.iter()).copied().collect()
}

fn generator_for(templates: &TempDir, output: &TempDir) -> Generator {
    Generator::new(GeneratorConfig {
        template_dir: templates.path().to_path_buf(),
        output_dir: output.path().join("out"),
        ..Default::default()
    })
}

fn raw(yaml: &str) -> RawSpec {
    RawSpec::from_yaml_str(yaml).expect("Failed to parse spec")
}

#[tokio::test]
async fn test_simple_tool_selects_validated_pattern() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let generator = generator_for(&templates, &output);

    let spec = raw("project: {name: hello}\ntools:\n  - name: say_hello\n");
    let plan = generator.plan(&spec).unwrap();
    assert_eq!(
        plan.manifest.primary_tool_pattern("say_hello").unwrap().pattern(),
        ToolPattern::ValidatedTool
    );

    let files = generator.generate(&spec).await.unwrap();
    let tool_files: Vec<_> = files
        .paths()
        .filter(|p| p.starts_with("src/tools"))
        .collect();
    assert_eq!(tool_files, vec![Path::new("src/tools/say_hello.ts")]);
    assert!(!files.paths().any(|p| p.starts_with("src/tools/wrappers")));
    assert!(!files.contains("src/config/config-loader.ts"));

    let tool = files.get("src/tools/say_hello.ts").unwrap();
    assert_eq!(tool.content, "// validated-tool for say_hello (say_hello)\n");
}

#[tokio::test]
async fn test_config_loader_follows_environment_variables() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let generator = generator_for(&templates, &output);

    let spec = raw(
        "project: {name: hello}\nconfiguration:\n  environment_variables:\n    - {name: TOKEN, required: true}\ntools: [{name: say_hello}]\n",
    );
    let files = generator.generate(&spec).await.unwrap();
    assert!(files.contains("src/config/config-loader.ts"));
    assert!(files.get(".env.example").unwrap().content.contains("TOKEN="));
}

#[tokio::test]
async fn test_long_running_tool_with_retry() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let generator = generator_for(&templates, &output);

    let spec = raw(WEATHER_SPEC);
    let plan = generator.plan(&spec).unwrap();
    assert_eq!(
        plan.manifest.primary_tool_pattern("get_forecast").unwrap().pattern(),
        ToolPattern::LongRunningTool
    );
    assert_eq!(plan.manifest.wrappers("get_forecast").count(), 0);

    let files = generator.generate(&spec).await.unwrap();
    let entry = files.get("src/index.ts").unwrap();
    assert!(
        entry.content.contains("await sendProgress(server, progressToken, 0, 'Starting get_forecast');")
    );
    assert!(
        entry.content.contains("await sendProgress(server, progressToken, 100, 'get_forecast complete');")
    );
    assert!(files.contains("src/health/health-check.ts"));
    assert!(files.dependencies.contains(&"node-fetch".to_string()));
}

#[tokio::test]
async fn test_entry_point_lists_required_parameters_and_dispatches_once() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());

    let files = generator_for(&templates, &output)
        .generate(&raw(WEATHER_SPEC))
        .await
        .unwrap();
    let entry = &files.get("src/index.ts").unwrap().content;

    assert!(entry.contains("required: ['city', 'days'],"));
    assert!(entry.contains("required: [],"));
    for tool in ["get_forecast", "ping"] {
        assert_eq!(entry.matches(&format!("case '{tool}':")).count(), 1, "{tool}");
    }
    assert!(entry.contains("Unknown tool: ${name}"));
}

#[tokio::test]
async fn test_error_types_generated_before_error_handler() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let generator = generator_for(&templates, &output);

    let plan = generator.plan(&raw(WEATHER_SPEC)).unwrap();
    let manifest = &plan.manifest;
    let types = manifest
        .position(&NodeId::Global(GlobalPattern::ErrorTypes))
        .unwrap();
    let handler = manifest
        .position(&NodeId::Global(GlobalPattern::ErrorHandler))
        .unwrap();
    assert!(types < handler);
}

#[tokio::test]
async fn test_generation_is_idempotent() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let generator = generator_for(&templates, &output);

    let spec = raw(WEATHER_SPEC);
    let first = generator.generate(&spec).await.unwrap();
    let second = generator.generate(&spec).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_logger_template_yields_placeholder() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let without_logger: Vec<&str> = all_templates()
        .into_iter()
        .filter(|name| *name != "logger")
        .collect();
    write_templates(templates.path(), &without_logger);

    let files = generator_for(&templates, &output)
        .generate(&raw(WEATHER_SPEC))
        .await
        .unwrap();
    let logger = files.get("src/utils/logger.ts").unwrap();
    assert!(logger.content.contains(PLACEHOLDER_MARKER));
    assert!(logger.content.contains("logger"));
}

#[tokio::test]
async fn test_missing_tool_template_aborts_run() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &GLOBAL_TEMPLATES);
    let generator = generator_for(&templates, &output);

    let err = generator
        .generate_and_write(&raw(WEATHER_SPEC), None)
        .await
        .unwrap_err();
    match err {
        Error::TemplateInjection(e) => {
            assert_eq!(e.template, "long-running-tool");
            assert!(e.template_path.ends_with("typescript/long-running-tool.tera"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.path().join("out").exists());
}

#[tokio::test]
async fn test_tool_failures_recover_when_policy_allows() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &GLOBAL_TEMPLATES);
    let generator = Generator::new(GeneratorConfig {
        template_dir: templates.path().to_path_buf(),
        policy: RenderPolicy {
            global: FailureMode::Recover,
            tool: FailureMode::Recover,
        },
        ..Default::default()
    });

    let files = generator.generate(&raw(WEATHER_SPEC)).await.unwrap();
    let tool = files.get("src/tools/get_forecast.ts").unwrap();
    assert!(tool.content.contains(PLACEHOLDER_MARKER));
}

#[tokio::test]
async fn test_missing_tools_rejected_before_writing() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let generator = generator_for(&templates, &output);

    let err = generator
        .generate_and_write(&raw("project: {name: empty}\n"), None)
        .await
        .unwrap_err();
    match err {
        Error::MalformedSpec(e) => assert_eq!(e.field, "tools"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.path().join("out").exists());
}

#[tokio::test]
async fn test_path_like_tool_names_rejected_before_writing() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let generator = generator_for(&templates, &output);

    let yaml = "project: {name: sneaky}\ntools:\n  - name: '../../../escaped'\n";
    let err = generator.generate_and_write(&raw(yaml), None).await.unwrap_err();
    match err {
        Error::MalformedSpec(e) => assert_eq!(e.field, "tools[0].name"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.path().join("out").exists());
    assert!(!output.path().join("escaped.ts").exists());
}

#[tokio::test]
async fn test_generate_and_write_round_trip() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let generator = generator_for(&templates, &output);

    let spec_path = templates.path().join("weather.yaml");
    std::fs::write(&spec_path, WEATHER_SPEC).unwrap();
    let files = generator.generate_from_file(&spec_path).await.unwrap();
    let root = generator.write_files(&files, None).await.unwrap();
    assert_eq!(root, output.path().join("out"));

    for file in &files.files {
        let written = std::fs::read_to_string(root.join(&file.path)).unwrap();
        assert_eq!(written, file.content, "{}", file.path.display());
    }
    assert_eq!(files.of_kind(FileKind::Test).count(), 2);
    assert_eq!(files.of_kind(FileKind::Docs).count(), 1);

    // A second write overwrites in place
    generator.write_files(&files, None).await.unwrap();
    let readme = std::fs::read_to_string(root.join("README.md")).unwrap();
    assert!(readme.starts_with("# weather-server"));
}

#[tokio::test]
async fn test_shared_cache_reads_each_template_once() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_templates(templates.path(), &all_templates());
    let cache = Arc::new(TemplateCache::new());
    let generator = generator_for(&templates, &output).with_cache(cache.clone());

    let spec = raw(WEATHER_SPEC);
    generator.generate(&spec).await.unwrap();
    let populated = cache.stats().await;
    assert!(populated.templates.contains(&"typescript/long-running-tool".to_string()));

    // Templates removed from disk are still served from the cache
    std::fs::remove_dir_all(templates.path().join("typescript")).unwrap();
    let again = generator.generate(&spec).await.unwrap();
    assert!(!again.files.iter().any(|f| f.content.contains(PLACEHOLDER_MARKER)));
    assert_eq!(cache.stats().await, populated);

    cache.clear().await;
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_python_project_layout() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let dir = templates.path().join("python");
    std::fs::create_dir_all(&dir).unwrap();
    for name in all_templates() {
        std::fs::write(dir.join(format!("{name}.tera")), format!("# {name}\n")).unwrap();
    }

    let spec = WEATHER_SPEC.replace("name: weather-server", "name: weather-server\n  sdk: python");
    let files = generator_for(&templates, &output)
        .generate(&raw(&spec))
        .await
        .unwrap();

    for path in [
        "src/server.py",
        "src/tools/get_forecast.py",
        "src/errors/error_types.py",
        "src/utils/logger.py",
        "pyproject.toml",
        "tests/test_get_forecast.py",
    ] {
        assert!(files.contains(path), "missing {path}");
    }
    assert_eq!(files.entry_point, Path::new("src/server.py"));
    assert!(files.dependencies.contains(&"httpx".to_string()));
}
