//! Per-tool test stubs: jest suites for TypeScript, pytest modules for Python.

use regex::Regex;

use crate::core::language::Language;
use crate::core::utils::escape_string_literal;
use crate::patterns::kinds::{ToolPattern, WrapperKind};
use crate::patterns::manifest::PatternSelectionManifest;
use crate::spec::model::{NormalizedSpec, ParamType, ToolDefinition, ToolParameter, Validation};
use crate::templates::context::{function_name, schema_name};

use super::entry_point::import_path;
use super::files::GeneratedFile;

pub fn test_path(tool_name: &str, language: Language) -> String {
    match language {
        Language::TypeScript => format!("tests/{tool_name}.test.ts"),
        Language::Python => format!("tests/test_{tool_name}.py"),
    }
}

/// One test stub per declared tool, in declaration order
pub fn test_stubs(
    spec: &NormalizedSpec,
    manifest: &PatternSelectionManifest,
) -> Vec<GeneratedFile> {
    let language = spec.language();
    spec.tools
        .iter()
        .map(|tool| {
            let subject = Subject::resolve(tool, language, manifest);
            let content = match language {
                Language::TypeScript => jest_suite(tool, &subject),
                Language::Python => pytest_module(tool, &subject),
            };
            GeneratedFile::test(test_path(&tool.name, language), content)
        })
        .collect()
}

/// Names a stub imports from the generated tool modules
struct Subject {
    function_name: String,
    schema_name: String,
    module: String,
    /// Progress wrapper `(module, function)` when the primary pattern lacks progress
    progress_wrapper: Option<(String, String)>,
}

impl Subject {
    fn resolve(
        tool: &ToolDefinition,
        language: Language,
        manifest: &PatternSelectionManifest,
    ) -> Self {
        let primary = manifest.primary_tool_pattern(&tool.name);
        let function_name = primary
            .map(|s| s.context.base().function_name.clone())
            .unwrap_or_else(|| function_name(&tool.name, language));
        let output_path = primary
            .map(|s| s.output_path.clone())
            .unwrap_or_else(|| ToolPattern::tool_output_path(&tool.name, language));
        let progress_wrapper = manifest
            .wrappers(&tool.name)
            .find(|s| s.wrapper == Some(WrapperKind::Progress))
            .map(|s| {
                (
                    import_path(&s.output_path, language),
                    WrapperKind::Progress.function_name(&function_name, language),
                )
            });

        Self {
            schema_name: schema_name(&tool.name),
            module: import_path(&output_path, language),
            function_name,
            progress_wrapper,
        }
    }

    /// Expression invoked by the progress test
    fn progress_handler(&self) -> String {
        match &self.progress_wrapper {
            Some((_, wrapper)) => format!("{wrapper}({})", self.function_name),
            None => self.function_name.clone(),
        }
    }
}

fn number_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Candidate string shapes tried against length bounds and patterns, best first
const SAMPLE_TEXTS: [&str; 6] = ["test-value", "abc", "1", "ABC", "a1", "test@example.com"];

/// Left in a stub whose positive cases could not be generated
const UNSYNTHESIZABLE: &str =
    "No sample input satisfies the declared string patterns; write valid-input cases by hand";

/// Longest sample tried when only a pattern constrains the value
const MAX_SAMPLE_LENGTH: usize = 32;

/// A string satisfying the length bounds and pattern, if one of the samples fits.
///
/// Each sample is cycled to its natural length clamped into bounds, then to
/// shorter lengths, then to longer ones.
fn sample_string(rules: &Validation) -> Option<String> {
    let min = rules.min_length.map_or(0, |n| n as usize);
    let max = rules.max_length.map_or(usize::MAX, |n| n as usize);
    if min > max {
        return None;
    }
    let pattern = match rules.pattern.as_deref() {
        Some(pattern) => Some(Regex::new(pattern).ok()?),
        None => None,
    };
    let accepts = |text: &str| pattern.as_ref().is_none_or(|re| re.is_match(text));
    let upper = max.min(min.max(MAX_SAMPLE_LENGTH));

    SAMPLE_TEXTS.iter().find_map(|sample| {
        let natural = sample.chars().count().clamp(min, max);
        (min..=natural)
            .rev()
            .chain(natural + 1..=upper)
            .map(|len| sample.chars().cycle().take(len).collect::<String>())
            .find(|text| accepts(text))
    })
}

/// A value the parameter's schema accepts, or `None` when none can be derived
fn valid_value(param: &ToolParameter, language: Language) -> Option<String> {
    let rules = param.validation.clone().unwrap_or_default();
    let value = match param.param_type {
        ParamType::String => {
            let text = match rules.enum_values.as_ref().and_then(|e| e.first()) {
                Some(first) => first.clone(),
                None => sample_string(&rules)?,
            };
            format!("'{}'", escape_string_literal(&text, '\''))
        }
        ParamType::Number => {
            let value = match (rules.minimum, rules.maximum) {
                (Some(min), _) => min,
                (None, Some(max)) if max < 42.0 => max,
                _ => 42.0,
            };
            number_literal(value)
        }
        ParamType::Boolean => match language {
            Language::TypeScript => "true".to_string(),
            Language::Python => "True".to_string(),
        },
        ParamType::Array => "[]".to_string(),
        ParamType::Object => "{}".to_string(),
        ParamType::Any => match language {
            Language::TypeScript => "null".to_string(),
            Language::Python => "None".to_string(),
        },
    };
    Some(value)
}

/// A value of the wrong type, or `None` when the parameter accepts anything
fn invalid_value(param: &ToolParameter) -> Option<&'static str> {
    match param.param_type {
        ParamType::String => Some("123"),
        ParamType::Number => Some("'not-a-number'"),
        ParamType::Boolean => Some("'not-a-boolean'"),
        ParamType::Array => Some("'not-an-array'"),
        ParamType::Object => Some("'not-an-object'"),
        ParamType::Any => None,
    }
}

fn object_literal<'a>(
    entries: impl Iterator<Item = (&'a str, String)>,
    language: Language,
    indent: &str,
) -> String {
    let fields: Vec<String> = entries
        .map(|(name, value)| {
            let key = escape_string_literal(name, '\'');
            match language {
                Language::TypeScript => format!("{indent}  '{key}': {value},"),
                Language::Python => format!("{indent}    '{key}': {value},"),
            }
        })
        .collect();
    if fields.is_empty() {
        return "{}".to_string();
    }
    format!("{{\n{}\n{indent}}}", fields.join("\n"))
}

/// Required parameters with accepted values, or `None` when any of them has no derivable value
fn valid_input(tool: &ToolDefinition, language: Language, indent: &str) -> Option<String> {
    let entries = tool
        .required_parameters()
        .map(|p| valid_value(p, language).map(|v| (p.name.as_str(), v)))
        .collect::<Option<Vec<_>>>()?;
    Some(object_literal(entries.into_iter(), language, indent))
}

fn invalid_input(tool: &ToolDefinition, language: Language, indent: &str) -> Option<String> {
    let entries: Vec<(&str, String)> = tool
        .parameters
        .iter()
        .filter_map(|p| invalid_value(p).map(|v| (p.name.as_str(), v.to_string())))
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(object_literal(entries.into_iter(), language, indent))
}

/// Rebase an entry-point relative specifier (`./tools/x.js`) onto `tests/`
fn from_tests_dir(module: &str) -> String {
    match module.strip_prefix("./") {
        Some(relative) => format!("../src/{relative}"),
        None => module.to_string(),
    }
}

fn jest_suite(tool: &ToolDefinition, subject: &Subject) -> String {
    let language = Language::TypeScript;
    let name = escape_string_literal(&tool.name, '\'');
    let function = &subject.function_name;
    let schema = &subject.schema_name;

    let mut code = format!(
        "/**\n * Tests for {name}\n */\n\nimport {{ {function}, {schema} }} from '{}';\n",
        from_tests_dir(&subject.module)
    );
    if let Some((module, wrapper)) = &subject.progress_wrapper {
        code.push_str(&format!(
            "import {{ {wrapper} }} from '{}';\n",
            from_tests_dir(module)
        ));
    }

    code.push_str(&format!(
        "\ndescribe('{name}', () => {{\n  const mockServer = {{\n    notification: jest.fn().mockResolvedValue(undefined),\n  }} as any;\n\n  beforeEach(() => {{\n    jest.clearAllMocks();\n  }});\n\n  describe('input validation', () => {{\n"
    ));
    if tool.required_parameters().next().is_some() {
        code.push_str(&format!(
            "    it('should reject invalid input', async () => {{\n      const result = await {function}({{}}, mockServer);\n      expect(result.isError).toBe(true);\n    }});\n\n"
        ));
    }
    let valid = valid_input(tool, language, "      ");
    match &valid {
        Some(input) => code.push_str(&format!(
            "    it('should accept valid input', async () => {{\n      const validInput = {input};\n\n      const result = await {function}(validInput, mockServer);\n      expect(result.isError).toBeFalsy();\n    }});\n  }});\n\n"
        )),
        None => code.push_str(&format!(
            "    // {UNSYNTHESIZABLE}\n    it.todo('should accept valid input');\n  }});\n\n"
        )),
    }

    code.push_str("  describe('schema validation', () => {\n");
    match &valid {
        Some(input) => code.push_str(&format!(
            "    it('should validate correct types', () => {{\n      const validInput = {input};\n\n      const result = {schema}.safeParse(validInput);\n      expect(result.success).toBe(true);\n    }});\n"
        )),
        None => code.push_str("    it.todo('should validate correct types');\n"),
    }
    if let Some(invalid) = invalid_input(tool, language, "      ") {
        code.push_str(&format!(
            "\n    it('should reject incorrect types', () => {{\n      const invalidInput = {invalid};\n\n      const result = {schema}.safeParse(invalidInput);\n      expect(result.success).toBe(false);\n    }});\n"
        ));
    }
    code.push_str("  });\n");

    if tool.reports_progress() {
        code.push_str("\n  describe('progress notifications', () => {\n");
        match &valid {
            Some(input) => code.push_str(&format!(
                "    it('should send progress updates', async () => {{\n      const validInput = {input};\n\n      await {}(validInput, mockServer, 'test-token');\n\n      expect(mockServer.notification).toHaveBeenCalledWith(\n        expect.objectContaining({{\n          method: 'notifications/progress',\n        }})\n      );\n    }});\n",
                subject.progress_handler()
            )),
            None => code.push_str("    it.todo('should send progress updates');\n"),
        }
        code.push_str("  });\n");
    }

    code.push_str("});\n");
    code
}

fn pytest_module(tool: &ToolDefinition, subject: &Subject) -> String {
    let language = Language::Python;
    let function = &subject.function_name;
    let schema = &subject.schema_name;

    let mut code = format!(
        "\"\"\"Tests for {}\"\"\"\n\nfrom unittest.mock import AsyncMock, MagicMock\n\nimport pytest\nfrom pydantic import ValidationError\n\nfrom {} import {function}, {schema}\n",
        tool.name, subject.module
    );
    if let Some((module, wrapper)) = &subject.progress_wrapper {
        code.push_str(&format!("from {module} import {wrapper}\n"));
    }

    code.push_str(
        "\n\n@pytest.fixture\ndef mock_server():\n    server = MagicMock()\n    server.request_context.session.send_progress_notification = AsyncMock()\n    return server\n",
    );

    if tool.required_parameters().next().is_some() {
        code.push_str(&format!(
            "\n\n@pytest.mark.asyncio\nasync def test_rejects_invalid_input(mock_server):\n    result = await {function}({{}}, mock_server, None)\n    assert result.isError\n"
        ));
    }
    let valid = valid_input(tool, language, "    ");
    match &valid {
        Some(input) => {
            code.push_str(&format!(
                "\n\n@pytest.mark.asyncio\nasync def test_accepts_valid_input(mock_server):\n    valid_input = {input}\n    result = await {function}(valid_input, mock_server, None)\n    assert not result.isError\n"
            ));
            code.push_str(&format!(
                "\n\ndef test_schema_accepts_correct_types():\n    {schema}.model_validate({input})\n"
            ));
        }
        None => code.push_str(&format!(
            "\n\n@pytest.mark.skip(reason=\"{UNSYNTHESIZABLE}\")\ndef test_accepts_valid_input():\n    pass\n"
        )),
    }
    if let Some(invalid) = invalid_input(tool, language, "    ") {
        code.push_str(&format!(
            "\n\ndef test_schema_rejects_incorrect_types():\n    with pytest.raises(ValidationError):\n        {schema}.model_validate({invalid})\n"
        ));
    }

    if let (true, Some(input)) = (tool.reports_progress(), &valid) {
        code.push_str(&format!(
            "\n\n@pytest.mark.asyncio\nasync def test_sends_progress_updates(mock_server):\n    valid_input = {input}\n    await {}(valid_input, mock_server, \"test-token\")\n    mock_server.request_context.session.send_progress_notification.assert_awaited()\n",
            subject.progress_handler()
        ));
    }

    code
}
