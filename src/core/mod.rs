//! Core building blocks shared by every pipeline stage: errors, configuration,
//! target languages and string utilities.

pub mod config;
pub mod error;
pub mod language;
pub mod utils;

pub use config::{FailureMode, GeneratorConfig, RenderPolicy, RenderStage, SelectorConfig};
pub use error::{Error, MalformedSpecError, Result, TemplateInjectionError};
pub use language::Language;
