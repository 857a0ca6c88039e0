//! Entry point synthesis.
//!
//! The entry point imports every tool implementation, lists tool metadata for
//! discovery, dispatches calls by tool name and answers unknown names with an
//! error result. Tools that report progress get a notification at 0% before and
//! 100% after the call.

use crate::core::language::Language;
use crate::core::utils::escape_string_literal;
use crate::patterns::kinds::{GlobalPattern, ToolPattern, WrapperKind};
use crate::patterns::manifest::PatternSelectionManifest;
use crate::spec::model::{NormalizedSpec, ParamType, ToolDefinition, ToolParameter};
use crate::templates::context::function_name;

/// A tool as the entry point sees it
struct ToolEntry<'a> {
    tool: &'a ToolDefinition,
    function_name: String,
    /// `(module import path, exported function)` per wrapper, innermost first
    wrappers: Vec<(String, String)>,
    module: String,
}

impl ToolEntry<'_> {
    /// Identifier the dispatcher calls
    fn handler(&self, language: Language) -> String {
        if self.wrappers.is_empty() {
            return self.function_name.clone();
        }
        match language {
            Language::TypeScript => format!("{}Handler", self.function_name),
            Language::Python => format!("{}_handler", self.function_name),
        }
    }

    /// Wrapped handler expression, e.g. `fWithProgress(fWithRetry(f))`
    fn composed(&self) -> String {
        self.wrappers
            .iter()
            .fold(self.function_name.clone(), |inner, (_, wrapper)| {
                format!("{wrapper}({inner})")
            })
    }
}

fn entries<'a>(
    spec: &'a NormalizedSpec,
    manifest: &PatternSelectionManifest,
) -> Vec<ToolEntry<'a>> {
    let language = spec.language();
    spec.tools
        .iter()
        .map(|tool| {
            let primary = manifest.primary_tool_pattern(&tool.name);
            let function_name = primary
                .map(|s| s.context.base().function_name.clone())
                .unwrap_or_else(|| function_name(&tool.name, language));
            let module = primary
                .map(|s| import_path(&s.output_path, language))
                .unwrap_or_else(|| {
                    import_path(&ToolPattern::tool_output_path(&tool.name, language), language)
                });
            let wrappers = manifest
                .wrappers(&tool.name)
                .filter_map(|s| s.wrapper.map(|kind| (kind, &s.output_path)))
                .map(|(kind, path): (WrapperKind, &String)| {
                    (
                        import_path(path, language),
                        kind.function_name(&function_name, language),
                    )
                })
                .collect();
            ToolEntry {
                tool,
                function_name,
                wrappers,
                module,
            }
        })
        .collect()
}

/// Module specifier of a generated file as imported from the entry point.
///
/// TypeScript imports are relative to `src/` with a `.js` suffix; Python imports
/// are dotted paths from the project root.
pub fn import_path(output_path: &str, language: Language) -> String {
    let stem = output_path
        .strip_suffix(&format!(".{}", language.file_extension()))
        .unwrap_or(output_path);
    match language {
        Language::TypeScript => {
            let relative = stem.strip_prefix("src/").unwrap_or(stem);
            format!("./{relative}.js")
        }
        Language::Python => stem.replace('/', "."),
    }
}

/// Synthesize the entry point source for the spec's language
pub fn entry_point(spec: &NormalizedSpec, manifest: &PatternSelectionManifest) -> String {
    match spec.language() {
        Language::TypeScript => typescript_entry_point(spec, manifest),
        Language::Python => python_entry_point(spec, manifest),
    }
}

fn json_schema_type(param_type: ParamType) -> Option<&'static str> {
    match param_type {
        ParamType::Any => None,
        other => Some(other.as_str()),
    }
}

fn required_list(tool: &ToolDefinition, quote: char) -> String {
    tool.required_parameters()
        .map(|p| format!("{quote}{}{quote}", escape_string_literal(&p.name, quote)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ts_property(param: &ToolParameter) -> String {
    let mut property = format!("              {}: {{\n", ts_key(&param.name));
    if let Some(ty) = json_schema_type(param.param_type) {
        property.push_str(&format!("                type: '{ty}',\n"));
    }
    property.push_str(&format!(
        "                description: '{}',\n",
        escape_string_literal(param.description.as_deref().unwrap_or_default(), '\'')
    ));
    property.push_str("              },\n");
    property
}

/// Object key, quoted unless it is a plain identifier
fn ts_key(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", escape_string_literal(name, '\''))
    }
}

fn typescript_entry_point(spec: &NormalizedSpec, manifest: &PatternSelectionManifest) -> String {
    let language = Language::TypeScript;
    let metadata = &spec.metadata;
    let tools = entries(spec, manifest);
    let logger = manifest.global(GlobalPattern::Logger);

    let mut code = format!(
        "#!/usr/bin/env node\n/**\n * {} - MCP Server\n * {}\n */\n\n",
        metadata.name, metadata.description
    );
    code.push_str(
        "import { Server } from '@modelcontextprotocol/sdk/server/index.js';\n\
         import { StdioServerTransport } from '@modelcontextprotocol/sdk/server/stdio.js';\n\
         import {\n  CallToolRequestSchema,\n  ListToolsRequestSchema,\n} from '@modelcontextprotocol/sdk/types.js';\n\n",
    );

    for entry in &tools {
        code.push_str(&format!(
            "import {{ {} }} from '{}';\n",
            entry.function_name, entry.module
        ));
        for (module, wrapper) in &entry.wrappers {
            code.push_str(&format!("import {{ {wrapper} }} from '{module}';\n"));
        }
    }
    if let Some(logger) = logger {
        code.push_str(&format!(
            "import {{ logger }} from '{}';\n",
            import_path(&logger.output_path, language)
        ));
    }

    let wrapped: Vec<&ToolEntry> = tools.iter().filter(|t| !t.wrappers.is_empty()).collect();
    if !wrapped.is_empty() {
        code.push('\n');
        for entry in wrapped {
            code.push_str(&format!(
                "const {} = {};\n",
                entry.handler(language),
                entry.composed()
            ));
        }
    }

    if tools.iter().any(|t| t.tool.reports_progress()) {
        code.push_str(
            "\n/**\n * Send a progress notification when the caller asked for one\n */\n\
             async function sendProgress(\n  server: Server,\n  progressToken: string | number | undefined,\n  progress: number,\n  message: string\n): Promise<void> {\n  if (progressToken === undefined) {\n    return;\n  }\n  await server.notification({\n    method: 'notifications/progress',\n    params: {\n      progressToken,\n      progress,\n      total: 100,\n      message,\n    },\n  });\n}\n",
        );
    }

    code.push_str(&format!(
        "\n/**\n * Initialize and start the MCP server\n */\nasync function main() {{\n  const server = new Server(\n    {{\n      name: '{}',\n      version: '{}',\n    }},\n    {{\n      capabilities: {{\n        tools: {{}},\n      }},\n    }}\n  );\n\n",
        escape_string_literal(&metadata.name, '\''),
        escape_string_literal(&metadata.version, '\'')
    ));

    code.push_str(
        "  server.setRequestHandler(ListToolsRequestSchema, async () => {\n    return {\n      tools: [\n",
    );
    for entry in &tools {
        let tool = entry.tool;
        code.push_str(&format!(
            "        {{\n          name: '{}',\n          description: '{}',\n          inputSchema: {{\n            type: 'object',\n            properties: {{\n",
            escape_string_literal(&tool.name, '\''),
            escape_string_literal(&tool.description, '\'')
        ));
        for param in &tool.parameters {
            code.push_str(&ts_property(param));
        }
        code.push_str(&format!(
            "            }},\n            required: [{}],\n          }},\n        }},\n",
            required_list(tool, '\'')
        ));
    }
    code.push_str("      ],\n    };\n  });\n\n");

    code.push_str(
        "  server.setRequestHandler(CallToolRequestSchema, async (request) => {\n    const { name, arguments: args } = request.params;\n    const progressToken = request.params._meta?.progressToken;\n\n    switch (name) {\n",
    );
    for entry in &tools {
        let name = escape_string_literal(&entry.tool.name, '\'');
        let handler = entry.handler(language);
        if entry.tool.reports_progress() {
            code.push_str(&format!(
                "      case '{name}': {{\n        await sendProgress(server, progressToken, 0, 'Starting {name}');\n        const result = await {handler}(args, server, progressToken);\n        await sendProgress(server, progressToken, 100, '{name} complete');\n        return result;\n      }}\n\n"
            ));
        } else {
            code.push_str(&format!(
                "      case '{name}':\n        return {handler}(args, server, progressToken);\n\n"
            ));
        }
    }
    code.push_str(
        "      default:\n        return {\n          content: [{\n            type: 'text',\n            text: `Unknown tool: ${name}`,\n          }],\n          isError: true,\n        };\n    }\n  });\n\n",
    );

    code.push_str("  const transport = new StdioServerTransport();\n  await server.connect(transport);\n");
    let started = escape_string_literal(&format!("{} MCP server started", metadata.name), '\'');
    if logger.is_some() {
        code.push_str(&format!("  logger.info('{started}');\n"));
    } else {
        code.push_str(&format!("  console.error('{started}');\n"));
    }
    code.push_str(
        "}\n\nmain().catch((error) => {\n  console.error('Fatal error:', error);\n  process.exit(1);\n});\n",
    );

    code
}

fn python_entry_point(spec: &NormalizedSpec, manifest: &PatternSelectionManifest) -> String {
    let language = Language::Python;
    let metadata = &spec.metadata;
    let tools = entries(spec, manifest);
    let logger = manifest.global(GlobalPattern::Logger);

    let mut code = format!(
        "\"\"\"{} - MCP Server\n\n{}\n\"\"\"\n\n",
        metadata.name, metadata.description
    );
    code.push_str(
        "import asyncio\nfrom typing import Any\n\nimport mcp.types as types\nfrom mcp.server import Server\nfrom mcp.server.stdio import stdio_server\n\n",
    );

    for entry in &tools {
        code.push_str(&format!(
            "from {} import {}\n",
            entry.module, entry.function_name
        ));
        for (module, wrapper) in &entry.wrappers {
            code.push_str(&format!("from {module} import {wrapper}\n"));
        }
    }
    if let Some(logger) = logger {
        code.push_str(&format!(
            "from {} import logger\n",
            import_path(&logger.output_path, language)
        ));
    }

    let wrapped: Vec<&ToolEntry> = tools.iter().filter(|t| !t.wrappers.is_empty()).collect();
    if !wrapped.is_empty() {
        code.push('\n');
        for entry in wrapped {
            code.push_str(&format!(
                "{} = {}\n",
                entry.handler(language),
                entry.composed()
            ));
        }
    }

    code.push_str(&format!(
        "\nserver = Server(\"{}\")\n\nTOOLS: list[types.Tool] = [\n",
        escape_string_literal(&metadata.name, '"')
    ));
    for entry in &tools {
        let tool = entry.tool;
        code.push_str(&format!(
            "    types.Tool(\n        name=\"{}\",\n        description=\"{}\",\n        inputSchema={{\n            \"type\": \"object\",\n            \"properties\": {{\n",
            escape_string_literal(&tool.name, '"'),
            escape_string_literal(&tool.description, '"')
        ));
        for param in &tool.parameters {
            let mut fields = Vec::new();
            if let Some(ty) = json_schema_type(param.param_type) {
                fields.push(format!("\"type\": \"{ty}\""));
            }
            fields.push(format!(
                "\"description\": \"{}\"",
                escape_string_literal(param.description.as_deref().unwrap_or_default(), '"')
            ));
            code.push_str(&format!(
                "                \"{}\": {{{}}},\n",
                escape_string_literal(&param.name, '"'),
                fields.join(", ")
            ));
        }
        code.push_str(&format!(
            "            }},\n            \"required\": [{}],\n        }},\n    ),\n",
            required_list(tool, '"')
        ));
    }
    code.push_str("]\n");

    if tools.iter().any(|t| t.tool.reports_progress()) {
        code.push_str(
            "\n\nasync def send_progress(progress_token: str | int | None, progress: float, message: str) -> None:\n    \"\"\"Send a progress notification when the caller asked for one\"\"\"\n    if progress_token is None:\n        return\n    await server.request_context.session.send_progress_notification(\n        progress_token, progress, total=100, message=message\n    )\n",
        );
    }

    code.push_str(
        "\n\n@server.list_tools()\nasync def list_tools() -> list[types.Tool]:\n    return TOOLS\n\n\n@server.call_tool()\nasync def call_tool(name: str, arguments: dict[str, Any] | None) -> types.CallToolResult:\n    args = arguments or {}\n    meta = server.request_context.meta\n    progress_token = meta.progressToken if meta else None\n\n",
    );
    for entry in &tools {
        let name = escape_string_literal(&entry.tool.name, '"');
        let handler = entry.handler(language);
        if entry.tool.reports_progress() {
            code.push_str(&format!(
                "    if name == \"{name}\":\n        await send_progress(progress_token, 0, \"Starting {name}\")\n        result = await {handler}(args, server, progress_token)\n        await send_progress(progress_token, 100, \"{name} complete\")\n        return result\n"
            ));
        } else {
            code.push_str(&format!(
                "    if name == \"{name}\":\n        return await {handler}(args, server, progress_token)\n"
            ));
        }
    }
    code.push_str(
        "\n    return types.CallToolResult(\n        content=[types.TextContent(type=\"text\", text=f\"Unknown tool: {name}\")],\n        isError=True,\n    )\n",
    );

    code.push_str(
        "\n\nasync def main() -> None:\n    async with stdio_server() as (read_stream, write_stream):\n",
    );
    if logger.is_some() {
        code.push_str(&format!(
            "        logger.info(\"{} MCP server started\")\n",
            escape_string_literal(&metadata.name, '"')
        ));
    }
    code.push_str(
        "        await server.run(read_stream, write_stream, server.create_initialization_options())\n\n\nif __name__ == \"__main__\":\n    asyncio.run(main())\n",
    );

    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternSelector;
    use crate::spec::{RawSpec, normalize};

    fn build(yaml: &str) -> String {
        let spec = normalize(&RawSpec::from_yaml_str(yaml).unwrap()).unwrap();
        let manifest = PatternSelector::default().build_manifest(&spec).unwrap();
        entry_point(&spec, &manifest)
    }

    const TWO_TOOLS: &str = r#"
project:
  name: weather
  description: Weather data
production_patterns:
  enabled: [logging]
tools:
  - name: get_forecast
    description: It's the forecast
    parameters:
      - name: city
        type: string
        required: true
      - name: days
        type: integer
  - name: build_report
    long_running: true
    parameters:
      - name: region
        required: true
      - name: format
        required: true
"#;

    #[test]
    fn test_import_paths() {
        assert_eq!(
            import_path("src/tools/get_forecast.ts", Language::TypeScript),
            "./tools/get_forecast.js"
        );
        assert_eq!(
            import_path("src/utils/logger.py", Language::Python),
            "src.utils.logger"
        );
    }

    #[test]
    fn test_typescript_dispatch_and_required_lists() {
        let code = build(TWO_TOOLS);

        assert_eq!(code.matches("case 'get_forecast':").count(), 1);
        assert_eq!(code.matches("case 'build_report':").count(), 1);
        assert!(code.contains("required: ['city'],"));
        assert!(code.contains("required: ['region', 'format'],"));
        assert!(code.contains("description: 'It\\'s the forecast',"));
        assert!(code.contains("import { get_forecast } from './tools/get_forecast.js';"));
        assert!(code.contains("import { logger } from './utils/logger.js';"));
        assert!(code.contains("text: `Unknown tool: ${name}`"));
    }

    #[test]
    fn test_kebab_case_tool_names_dispatch_to_identifiers() {
        let yaml = "project:\n  name: weather\ntools:\n  - name: get-weather\n";
        let code = build(yaml);

        assert!(code.contains("import { get_weather } from './tools/get-weather.js';"));
        assert!(code.contains("case 'get-weather':"));
        assert!(code.contains("return get_weather(args, server, progressToken);"));
        assert!(!code.contains("import { get-weather }"));

        let code = build(&yaml.replace("  name: weather\n", "  name: weather\n  sdk: python\n"));
        assert!(code.contains("from src.tools.get_weather import get_weather"));
    }

    #[test]
    fn test_progress_emitted_around_long_running_tool() {
        let code = build(TWO_TOOLS);

        assert!(
            code.contains("await sendProgress(server, progressToken, 0, 'Starting build_report');")
        );
        assert!(
            code.contains("await sendProgress(server, progressToken, 100, 'build_report complete');")
        );
        assert!(!code.contains("'Starting get_forecast'"));
    }

    #[test]
    fn test_wrapped_handlers_are_composed() {
        let yaml = r#"
project:
  name: cache
external_dependencies:
  enabled: true
  primary_url: https://api.example.com
  retry_config:
    max_retries: 2
tools:
  - name: lookup
    caching:
      enabled: true
"#;
        let code = build(yaml);
        assert!(
            code.contains("import { lookupWithRetry } from './tools/wrappers/lookup_retry.js';")
        );
        assert!(code.contains("const lookupHandler = lookupWithRetry(lookup);"));
        assert!(code.contains("return lookupHandler(args, server, progressToken);"));
    }

    #[test]
    fn test_python_entry_point() {
        let yaml = TWO_TOOLS.replace("  description: Weather data", "  description: Weather data\n  sdk: python");
        let code = build(&yaml);

        assert!(code.contains("from src.tools.get_forecast import get_forecast"));
        assert!(code.contains("from src.utils.logger import logger"));
        assert_eq!(code.matches("if name == \"get_forecast\":").count(), 1);
        assert!(code.contains("\"required\": [\"region\", \"format\"],"));
        assert!(code.contains("await send_progress(progress_token, 0, \"Starting build_report\")"));
        assert!(
            code.contains("await send_progress(progress_token, 100, \"build_report complete\")")
        );
        assert!(code.contains("isError=True"));
    }
}
