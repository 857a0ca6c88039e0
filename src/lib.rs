//! mcpforge turns a declarative tool spec into a ready-to-build MCP server
//! project.
//!
//! The pipeline has four stages:
//!
//! 1. [`spec`]: parse the raw document and normalize it.
//! 2. [`patterns`]: select the production patterns each tool and the project need.
//! 3. [`templates`]: render each selected pattern from its template.
//! 4. [`generation`]: assemble the file set and optionally write it out.
//!
//! ```no_run
//! use mcpforge::core::GeneratorConfig;
//! use mcpforge::generation::Generator;
//!
//! # async fn run() -> mcpforge::core::Result<()> {
//! let generator = Generator::new(GeneratorConfig::default());
//! let files = generator.generate_from_file("weather.yaml").await?;
//! generator.write_files(&files, None).await?;
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod core;
pub mod generation;
pub mod infrastructure;
pub mod patterns;
pub mod spec;
pub mod templates;
