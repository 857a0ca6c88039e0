//! Project scaffolding: build manifests, ignore list, environment template,
//! placeholders and the runtime dependency list.
//!
//! All of it is fixed, data-driven text; nothing here depends on templates.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::error::Result;
use crate::core::language::Language;
use crate::core::utils::{to_camel_case, to_screaming_snake_case};
use crate::spec::model::NormalizedSpec;

use super::files::GeneratedFile;

/// Marker written into every placeholder file
pub const PLACEHOLDER_MARKER: &str = "mcpforge:placeholder";

const TS_DEPENDENCIES: [(&str, &str); 2] =
    [("@modelcontextprotocol/sdk", "^1.0.0"), ("zod", "^3.22.4")];
const TS_HTTP_DEPENDENCY: (&str, &str) = ("node-fetch", "^3.3.2");
const TS_DEV_DEPENDENCIES: [(&str, &str); 5] = [
    ("@types/jest", "^29.5.12"),
    ("@types/node", "^20.11.0"),
    ("jest", "^29.7.0"),
    ("ts-jest", "^29.1.2"),
    ("typescript", "^5.3.3"),
];

const PY_DEPENDENCIES: [(&str, &str); 2] = [("mcp", ">=1.0.0"), ("pydantic", ">=2.0")];
const PY_HTTP_DEPENDENCY: (&str, &str) = ("httpx", ">=0.27");
const PY_DEV_DEPENDENCIES: [&str; 2] = ["pytest>=8.0", "pytest-asyncio>=0.23"];

/// Runtime packages of the generated project
pub fn dependencies(spec: &NormalizedSpec) -> Vec<String> {
    runtime_packages(spec)
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect()
}

fn runtime_packages(spec: &NormalizedSpec) -> Vec<(&'static str, &'static str)> {
    let (base, http) = match spec.language() {
        Language::TypeScript => (TS_DEPENDENCIES, TS_HTTP_DEPENDENCY),
        Language::Python => (PY_DEPENDENCIES, PY_HTTP_DEPENDENCY),
    };
    let mut packages = base.to_vec();
    if spec.has_enabled_external_dependency() {
        packages.push(http);
    }
    packages
}

/// Build manifests, ignore list and environment template
pub fn project_files(spec: &NormalizedSpec) -> Result<Vec<GeneratedFile>> {
    let mut files = match spec.language() {
        Language::TypeScript => vec![
            GeneratedFile::config("package.json", package_json(spec)?),
            GeneratedFile::config("tsconfig.json", tsconfig_json()?),
        ],
        Language::Python => vec![GeneratedFile::config("pyproject.toml", pyproject_toml(spec)?)],
    };
    files.push(GeneratedFile::config(".gitignore", gitignore(spec.language())));
    files.push(GeneratedFile::config(".env.example", env_example(spec)));
    Ok(files)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson<'a> {
    name: &'a str,
    version: &'a str,
    description: &'a str,
    #[serde(rename = "type")]
    module_type: &'a str,
    main: &'a str,
    scripts: BTreeMap<&'a str, &'a str>,
    dependencies: BTreeMap<&'a str, &'a str>,
    dev_dependencies: BTreeMap<&'a str, &'a str>,
    engines: BTreeMap<&'a str, &'a str>,
}

pub fn package_json(spec: &NormalizedSpec) -> Result<String> {
    let metadata = &spec.metadata;
    let package = PackageJson {
        name: &metadata.name,
        version: &metadata.version,
        description: &metadata.description,
        module_type: "module",
        main: "dist/index.js",
        scripts: BTreeMap::from([
            ("build", "tsc"),
            ("dev", "tsc -w"),
            ("lint", "eslint src --ext .ts"),
            ("start", "node dist/index.js"),
            ("test", "jest"),
        ]),
        dependencies: runtime_packages(spec).into_iter().collect(),
        dev_dependencies: TS_DEV_DEPENDENCIES.into_iter().collect(),
        engines: BTreeMap::from([("node", ">=18.0.0")]),
    };
    Ok(serde_json::to_string_pretty(&package)? + "\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    compiler_options: CompilerOptions,
    include: Vec<&'static str>,
    exclude: Vec<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    target: &'static str,
    module: &'static str,
    module_resolution: &'static str,
    lib: Vec<&'static str>,
    out_dir: &'static str,
    root_dir: &'static str,
    strict: bool,
    es_module_interop: bool,
    skip_lib_check: bool,
    force_consistent_casing_in_file_names: bool,
    declaration: bool,
    declaration_map: bool,
    source_map: bool,
}

pub fn tsconfig_json() -> Result<String> {
    let config = TsConfig {
        compiler_options: CompilerOptions {
            target: "ES2022",
            module: "NodeNext",
            module_resolution: "NodeNext",
            lib: vec!["ES2022"],
            out_dir: "./dist",
            root_dir: "./src",
            strict: true,
            es_module_interop: true,
            skip_lib_check: true,
            force_consistent_casing_in_file_names: true,
            declaration: true,
            declaration_map: true,
            source_map: true,
        },
        include: vec!["src/**/*"],
        exclude: vec!["node_modules", "dist"],
    };
    Ok(serde_json::to_string_pretty(&config)? + "\n")
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct PyProject {
    project: PyProjectTable,
    build_system: BuildSystem,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct PyProjectTable {
    name: String,
    version: String,
    description: String,
    requires_python: &'static str,
    dependencies: Vec<String>,
    optional_dependencies: BTreeMap<&'static str, Vec<&'static str>>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct BuildSystem {
    requires: Vec<&'static str>,
    build_backend: &'static str,
}

pub fn pyproject_toml(spec: &NormalizedSpec) -> Result<String> {
    let metadata = &spec.metadata;
    let pyproject = PyProject {
        project: PyProjectTable {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            description: metadata.description.clone(),
            requires_python: ">=3.10",
            dependencies: runtime_packages(spec)
                .into_iter()
                .map(|(name, version)| format!("{name}{version}"))
                .collect(),
            optional_dependencies: BTreeMap::from([("dev", PY_DEV_DEPENDENCIES.to_vec())]),
        },
        build_system: BuildSystem {
            requires: vec!["hatchling"],
            build_backend: "hatchling.build",
        },
    };
    Ok(toml::to_string_pretty(&pyproject)?)
}

pub fn gitignore(language: Language) -> String {
    let specific = match language {
        Language::TypeScript => {
            "# Dependencies\nnode_modules/\n\n# Build output\ndist/\n\n# Logs\n*.log\nnpm-debug.log*\n\n# Test coverage\ncoverage/\n"
        }
        Language::Python => {
            "# Bytecode\n__pycache__/\n*.py[cod]\n\n# Virtual environments\n.venv/\nvenv/\n\n# Build output\ndist/\nbuild/\n*.egg-info/\n\n# Test cache\n.pytest_cache/\n.coverage\n"
        }
    };
    format!(
        "{specific}\n# Environment\n.env\n.env.local\n\n# IDE\n.vscode/\n.idea/\n\n# OS\n.DS_Store\nThumbs.db\n"
    )
}

pub fn env_example(spec: &NormalizedSpec) -> String {
    let mut content = format!("# {} Environment Variables\n\n", spec.metadata.name);
    for var in &spec.configuration.environment_variables {
        if !var.description.is_empty() {
            content.push_str(&format!("# {}\n", var.description));
        }
        if var.required {
            content.push_str("# (required)\n");
        }
        content.push_str(&format!(
            "{}={}\n\n",
            var.name,
            var.default_value.as_deref().unwrap_or_default()
        ));
    }
    content
}

/// Stand-in for a pattern whose template could not be rendered
pub fn placeholder(pattern: &str, language: Language) -> String {
    match language {
        Language::TypeScript => format!(
            "/**\n * {pattern} - Placeholder\n * {PLACEHOLDER_MARKER} {pattern}\n *\n * The `{pattern}` template could not be rendered; implement this module by hand\n * or add the template and regenerate.\n */\n\nexport const {}Placeholder = true;\n",
            to_camel_case(pattern)
        ),
        Language::Python => format!(
            "\"\"\"{pattern} - Placeholder\n\n{PLACEHOLDER_MARKER} {pattern}\n\nThe `{pattern}` template could not be rendered; implement this module by hand\nor add the template and regenerate.\n\"\"\"\n\n{}_PLACEHOLDER = True\n",
            to_screaming_snake_case(pattern)
        ),
    }
}
