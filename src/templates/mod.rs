//! Template rendering: sources, the compiled-template cache, the helper library
//! and typed per-pattern contexts.

pub mod cache;
pub mod context;
pub mod helpers;
pub mod renderer;
pub mod source;

pub use cache::{CacheStats, TemplateCache};
pub use context::{GlobalContext, ToolPatternContext, tera_context};
pub use helpers::register_helpers;
pub use renderer::{CompiledTemplate, RenderedFragment, TemplateRenderer, extract_imports};
pub use source::{FileSystemTemplateSource, TemplateSource};
