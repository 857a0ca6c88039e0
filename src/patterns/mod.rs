//! Pattern selection: which hardening patterns apply to each tool and to the
//! project, and the order in which they are generated.

pub mod graph;
pub mod kinds;
pub mod manifest;
pub mod requirements;
pub mod selector;

pub use graph::{DependencyGraph, NodeId};
pub use kinds::{CompositionStrategy, GlobalPattern, Section, ToolPattern, WrapperKind};
pub use manifest::{GlobalPatternSelection, PatternSelectionManifest, ToolPatternSelection};
pub use requirements::{GlobalPatternRequirements, ToolPatternRequirements};
pub use selector::PatternSelector;
