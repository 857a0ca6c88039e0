//! Requirement sets derived from the normalized spec, and the fixed decision
//! rules that turn them into patterns.

use serde::Serialize;

use super::kinds::{CompositionStrategy, GlobalPattern, ToolPattern};

/// Cross-cutting capabilities one tool needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPatternRequirements {
    pub error_handling: bool,
    pub progress: bool,
    pub validation: bool,
    pub logging: bool,
    pub graceful_degradation: bool,
    pub retry: bool,
    pub caching: bool,
}

impl ToolPatternRequirements {
    /// Select the primary tool pattern.
    ///
    /// Decision order: progress and retry, caching, retry, progress,
    /// validation or error handling, and finally the basic pattern.
    pub fn primary_pattern(&self) -> ToolPattern {
        if self.progress && self.retry {
            ToolPattern::LongRunningTool
        } else if self.caching {
            ToolPattern::CachedTool
        } else if self.retry {
            ToolPattern::RetryTool
        } else if self.progress {
            ToolPattern::ProgressTool
        } else if self.validation || self.error_handling {
            ToolPattern::ValidatedTool
        } else {
            ToolPattern::BasicTool
        }
    }

    /// Number of decorating capabilities (retry, progress, caching)
    pub fn capability_count(&self) -> usize {
        [self.retry, self.progress, self.caching]
            .into_iter()
            .filter(|needed| *needed)
            .count()
    }

    pub fn composition_strategy(&self) -> CompositionStrategy {
        match self.capability_count() {
            0 => CompositionStrategy::Mixin,
            1 => CompositionStrategy::Extend,
            _ => CompositionStrategy::Wrap,
        }
    }
}

/// Which global files the project needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPatternRequirements {
    pub error_types: bool,
    pub error_handler: bool,
    pub logger: bool,
    pub config_loader: bool,
    pub validation_schemas: bool,
    pub health_check: bool,
}

impl GlobalPatternRequirements {
    pub fn requires(&self, pattern: GlobalPattern) -> bool {
        match pattern {
            GlobalPattern::ErrorTypes => self.error_types,
            GlobalPattern::ErrorHandler => self.error_handler,
            GlobalPattern::Logger => self.logger,
            GlobalPattern::ConfigLoader => self.config_loader,
            GlobalPattern::ValidationSchemas => self.validation_schemas,
            GlobalPattern::HealthCheck => self.health_check,
        }
    }

    /// Required patterns in priority order
    pub fn selected(&self) -> Vec<GlobalPattern> {
        GlobalPattern::ALL
            .into_iter()
            .filter(|p| self.requires(*p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements_from_bits(bits: u8) -> ToolPatternRequirements {
        ToolPatternRequirements {
            error_handling: bits & 1 != 0,
            progress: bits & 2 != 0,
            validation: bits & 4 != 0,
            logging: bits & 8 != 0,
            graceful_degradation: bits & 16 != 0,
            retry: bits & 32 != 0,
            caching: bits & 64 != 0,
        }
    }

    #[test]
    fn test_primary_pattern_is_total_and_ordered() {
        for bits in 0..128u8 {
            let req = requirements_from_bits(bits);
            let expected = if req.progress && req.retry {
                ToolPattern::LongRunningTool
            } else if req.caching {
                ToolPattern::CachedTool
            } else if req.retry && !req.progress {
                ToolPattern::RetryTool
            } else if req.progress {
                ToolPattern::ProgressTool
            } else if req.validation || req.error_handling {
                ToolPattern::ValidatedTool
            } else {
                ToolPattern::BasicTool
            };

            let selected = req.primary_pattern();
            assert_eq!(selected, expected, "requirements {req:?}");
            assert_eq!(
                ToolPattern::ALL.iter().filter(|p| **p == selected).count(),
                1
            );
        }
    }

    #[test]
    fn test_logging_and_degradation_never_change_primary() {
        for bits in 0..128u8 {
            let req = requirements_from_bits(bits);
            let stripped = ToolPatternRequirements {
                logging: false,
                graceful_degradation: false,
                ..req
            };
            assert_eq!(req.primary_pattern(), stripped.primary_pattern());
        }
    }

    #[test]
    fn test_composition_strategy_by_count() {
        for bits in 0..128u8 {
            let req = requirements_from_bits(bits);
            let count = [req.retry, req.progress, req.caching]
                .iter()
                .filter(|b| **b)
                .count();
            let expected = match count {
                0 => CompositionStrategy::Mixin,
                1 => CompositionStrategy::Extend,
                _ => CompositionStrategy::Wrap,
            };
            assert_eq!(req.composition_strategy(), expected);
        }
    }

    #[test]
    fn test_selected_globals_keep_priority_order() {
        let req = GlobalPatternRequirements {
            health_check: true,
            error_types: true,
            logger: true,
            ..Default::default()
        };
        assert_eq!(
            req.selected(),
            vec![
                GlobalPattern::ErrorTypes,
                GlobalPattern::Logger,
                GlobalPattern::HealthCheck
            ]
        );
    }
}
