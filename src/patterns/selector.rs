//! Rule-based pattern selection.
//!
//! The selector reads a [`NormalizedSpec`] and decides which hardening patterns each
//! tool and the project as a whole need, then lays them out in a
//! [`PatternSelectionManifest`] with a dependency graph and generation order.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::config::SelectorConfig;
use crate::core::error::Result;
use crate::spec::model::{NormalizedSpec, ProductionPattern, ToolDefinition};
use crate::templates::context::{GlobalContext, ToolPatternContext};

use super::graph::{DependencyGraph, NodeId};
use super::kinds::{CompositionStrategy, GlobalPattern, ToolPattern, WrapperKind};
use super::manifest::{GlobalPatternSelection, PatternSelectionManifest, ToolPatternSelection};
use super::requirements::{GlobalPatternRequirements, ToolPatternRequirements};

/// Global patterns every non-basic tool pattern imports when they are selected
const TOOL_GLOBAL_DEPENDENCIES: [GlobalPattern; 3] = [
    GlobalPattern::ErrorTypes,
    GlobalPattern::ErrorHandler,
    GlobalPattern::ValidationSchemas,
];

#[derive(Debug, Clone, Default)]
pub struct PatternSelector {
    config: SelectorConfig,
}

impl PatternSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Capabilities a single tool needs
    pub fn analyze_tool(
        &self,
        tool: &ToolDefinition,
        spec: &NormalizedSpec,
    ) -> ToolPatternRequirements {
        let toggles = spec.production_toggles();
        let global = &spec.patterns.global;
        let tool_config = spec.tool_config(&tool.name);

        ToolPatternRequirements {
            error_handling: self.config.always_include_error_handling
                || toggles.contains(&ProductionPattern::ErrorHandling),
            progress: tool.progress_notifications
                || tool.long_running
                || toggles.contains(&ProductionPattern::ProgressNotifications),
            validation: self.config.always_include_validation
                || toggles.contains(&ProductionPattern::InputValidation)
                || tool.has_validated_parameters(),
            logging: global.logging.enabled
                || toggles.contains(&ProductionPattern::Logging)
                || self.config.default_logging_enabled,
            graceful_degradation: spec.has_enabled_external_dependency()
                || toggles.contains(&ProductionPattern::GracefulDegradation)
                || spec.has_fallback_url(),
            retry: tool_config.is_some_and(|c| c.retryable && c.retry_config.is_some())
                && spec.has_enabled_external_dependency(),
            caching: tool_config
                .and_then(|c| c.caching)
                .is_some_and(|c| c.enabled),
        }
    }

    /// Global files the project needs
    pub fn analyze_global(&self, spec: &NormalizedSpec) -> GlobalPatternRequirements {
        let global = &spec.patterns.global;
        let error_handling = &global.error_handling;

        GlobalPatternRequirements {
            error_types: error_handling.needs_error_types(),
            error_handler: error_handling.enabled || self.config.always_include_error_handling,
            logger: global.logging.enabled,
            config_loader: !spec.configuration.environment_variables.is_empty(),
            validation_schemas: global.validation.enabled || spec.has_validated_parameters(),
            health_check: spec.has_enabled_external_dependency(),
        }
    }

    /// Selected global patterns sorted by priority
    pub fn select_global_patterns(&self, spec: &NormalizedSpec) -> Vec<GlobalPatternSelection> {
        let mut selections: Vec<GlobalPatternSelection> = self
            .analyze_global(spec)
            .selected()
            .into_iter()
            .map(|pattern| {
                GlobalPatternSelection::new(
                    GlobalContext::build(pattern, spec),
                    pattern.output_path(spec.language()),
                )
            })
            .collect();
        selections.sort_by_key(|s| s.priority);
        selections
    }

    pub fn select_primary_tool_pattern(
        &self,
        requirements: &ToolPatternRequirements,
    ) -> ToolPattern {
        requirements.primary_pattern()
    }

    /// Primary selection for a tool, followed by any wrapper selections
    pub fn select_tool_patterns(
        &self,
        tool: &ToolDefinition,
        spec: &NormalizedSpec,
        globals: &GlobalPatternRequirements,
    ) -> Vec<ToolPatternSelection> {
        let requirements = self.analyze_tool(tool, spec);
        let primary = self.select_primary_tool_pattern(&requirements);
        let strategy = requirements.composition_strategy();
        let language = spec.language();

        debug!(
            tool = %tool.name,
            ?requirements,
            primary = %primary,
            strategy = ?strategy,
            "Selected tool patterns"
        );

        let mut selections = vec![ToolPatternSelection {
            context: ToolPatternContext::build(primary, tool, spec, &requirements, globals),
            template: primary.template_name().to_string(),
            wrapper_template: None,
            wrapper: None,
            composition_strategy: strategy,
            output_path: ToolPattern::tool_output_path(&tool.name, language),
        }];

        let mut wrappers = Vec::new();
        if requirements.retry && !primary.encodes_retry() {
            wrappers.push(WrapperKind::Retry);
        }
        if requirements.progress && !primary.encodes_progress() {
            wrappers.push(WrapperKind::Progress);
        }

        for kind in wrappers {
            let pattern = kind.pattern();
            selections.push(ToolPatternSelection {
                context: ToolPatternContext::build(pattern, tool, spec, &requirements, globals),
                template: kind.template_name().to_string(),
                wrapper_template: Some(pattern.template_name().to_string()),
                wrapper: Some(kind),
                composition_strategy: CompositionStrategy::Wrap,
                output_path: kind.output_path(&tool.name, language),
            });
        }

        selections
    }

    /// Select every pattern for the spec and order their generation
    pub fn build_manifest(&self, spec: &NormalizedSpec) -> Result<PatternSelectionManifest> {
        let globals = self.analyze_global(spec);
        let global_patterns = self.select_global_patterns(spec);

        let mut graph = DependencyGraph::new();
        for selection in &global_patterns {
            graph.add_node(NodeId::Global(selection.pattern()));
        }
        for selection in &global_patterns {
            let pattern = selection.pattern();
            for dep in pattern.depends_on() {
                if globals.requires(*dep) {
                    graph.add_edge(NodeId::Global(pattern), NodeId::Global(*dep));
                }
            }
        }

        let mut tool_patterns = BTreeMap::new();
        for tool in &spec.tools {
            let selections = self.select_tool_patterns(tool, spec, &globals);
            let mut primary_node = None;

            for selection in &selections {
                let node = selection.node_id();
                graph.add_node(node.clone());

                if selection.pattern() != ToolPattern::BasicTool {
                    for dep in TOOL_GLOBAL_DEPENDENCIES {
                        if globals.requires(dep) {
                            graph.add_edge(node.clone(), NodeId::Global(dep));
                        }
                    }
                }

                match &primary_node {
                    None => primary_node = Some(node),
                    Some(primary) => graph.add_edge(node, primary.clone()),
                }
            }

            tool_patterns.insert(tool.name.clone(), selections);
        }

        let generation_order = graph.topological_order()?;
        debug!(
            globals = global_patterns.len(),
            tools = tool_patterns.len(),
            nodes = generation_order.len(),
            "Built pattern manifest"
        );

        Ok(PatternSelectionManifest {
            global_patterns,
            tool_patterns,
            dependencies: graph,
            generation_order,
        })
    }
}
