//! Generation orchestration - turns a spec into a complete project file set
//!
//! The orchestrator renders every selected pattern through the template
//! renderer, then synthesizes the files that do not come from templates: the
//! entry point, build manifests, README and per-tool test stubs.

pub mod docs;
pub mod entry_point;
pub mod files;
pub mod orchestrator;
pub mod scaffold;
pub mod test_stubs;

pub use files::{FileKind, GeneratedFile, GeneratedFileSet};
pub use orchestrator::{GenerationPlan, Generator};
pub use scaffold::PLACEHOLDER_MARKER;
