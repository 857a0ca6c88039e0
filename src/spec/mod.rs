//! Spec document handling: the raw serde model and its normalization.

pub mod model;
pub mod normalizer;
pub mod raw;

pub use model::{
    ErrorScenario, NormalizedSpec, ParamType, ProductionPattern, ToolDefinition, ToolParameter,
    ToolPatternConfig,
};
pub use normalizer::normalize;
pub use raw::RawSpec;
