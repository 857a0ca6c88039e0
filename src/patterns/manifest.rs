//! The pattern selection manifest handed from the selector to the renderer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::error::Result;
use crate::templates::context::{GlobalContext, ToolPatternContext};

use super::graph::{DependencyGraph, NodeId};
use super::kinds::{CompositionStrategy, GlobalPattern, ToolPattern, WrapperKind};

/// One selected global pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPatternSelection {
    #[serde(flatten)]
    pub context: GlobalContext,
    pub template: String,
    pub output_path: String,
    pub priority: u8,
}

impl GlobalPatternSelection {
    pub fn new(context: GlobalContext, output_path: String) -> Self {
        let pattern = context.pattern();
        Self {
            template: pattern.template_name().to_string(),
            priority: pattern.priority(),
            output_path,
            context,
        }
    }

    pub fn pattern(&self) -> GlobalPattern {
        self.context.pattern()
    }
}

/// One pattern applied to one tool: its primary implementation or a wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPatternSelection {
    #[serde(flatten)]
    pub context: ToolPatternContext,
    pub template: String,
    /// For wrappers, the pattern whose capability the wrapper adds
    pub wrapper_template: Option<String>,
    pub wrapper: Option<WrapperKind>,
    pub composition_strategy: CompositionStrategy,
    pub output_path: String,
}

impl ToolPatternSelection {
    pub fn pattern(&self) -> ToolPattern {
        self.context.pattern()
    }

    pub fn tool_name(&self) -> &str {
        &self.context.base().tool_name
    }

    pub fn is_wrapper(&self) -> bool {
        self.wrapper.is_some()
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::tool(self.tool_name(), self.pattern())
    }
}

/// Full pattern selection for one spec
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSelectionManifest {
    pub global_patterns: Vec<GlobalPatternSelection>,
    pub tool_patterns: BTreeMap<String, Vec<ToolPatternSelection>>,
    pub dependencies: DependencyGraph,
    pub generation_order: Vec<NodeId>,
}

impl PatternSelectionManifest {
    pub fn global(&self, pattern: GlobalPattern) -> Option<&GlobalPatternSelection> {
        self.global_patterns.iter().find(|s| s.pattern() == pattern)
    }

    pub fn has_global(&self, pattern: GlobalPattern) -> bool {
        self.global(pattern).is_some()
    }

    /// Selections for one tool, primary first
    pub fn tool_selections(&self, tool_name: &str) -> &[ToolPatternSelection] {
        self.tool_patterns
            .get(tool_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn primary_tool_pattern(&self, tool_name: &str) -> Option<&ToolPatternSelection> {
        self.tool_selections(tool_name).iter().find(|s| !s.is_wrapper())
    }

    pub fn wrappers(&self, tool_name: &str) -> impl Iterator<Item = &ToolPatternSelection> {
        self.tool_selections(tool_name).iter().filter(|s| s.is_wrapper())
    }

    /// Position of a node in the generation order
    pub fn position(&self, node: &NodeId) -> Option<usize> {
        self.generation_order.iter().position(|n| n == node)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
