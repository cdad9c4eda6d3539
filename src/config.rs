// src/config.rs
use crate::error::{validation::validate_step_size, IntegratorResult};
use bitflags::bitflags;

bitflags! {
    /// Build-time rewrites applied by the step compiler
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompileFlags: u32 {
        const NONE           = 0;
        /// Fold constant sub-expressions of symbolic right-hand sides
        const FOLD_CONSTANTS = 1 << 0;
        /// Prefix unit-local symbols with `_<variable>_` when merging
        const ISOLATE_NAMES  = 1 << 1;
    }
}

/// What the compiler hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// A plain step function for direct use
    #[default]
    Standalone,
    /// A reusable unit to be combined into a [`crate::compiler::System`]
    Merge,
}

/// Integrator construction settings, read once when a step function is built
#[derive(Debug, Clone)]
pub struct IntegratorConfig {
    pub dt: f64,
    pub merge_mode: MergeMode,
    pub flags: CompileFlags,
}

impl IntegratorConfig {
    pub fn with_dt(dt: f64) -> Self {
        Self {
            dt,
            ..Default::default()
        }
    }

    pub fn merged(mut self) -> Self {
        self.merge_mode = MergeMode::Merge;
        self
    }

    /// Validate the integrator configuration
    pub fn validate(&self) -> IntegratorResult<()> {
        validate_step_size(self.dt)
    }
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        IntegratorConfig {
            dt: 0.1,
            merge_mode: MergeMode::Standalone,
            flags: CompileFlags::FOLD_CONSTANTS | CompileFlags::ISOLATE_NAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegratorError;

    #[test]
    fn test_default_config() {
        let config = IntegratorConfig::default();
        assert_eq!(config.dt, 0.1);
        assert_eq!(config.merge_mode, MergeMode::Standalone);
        assert!(config.flags.contains(CompileFlags::FOLD_CONSTANTS));
        assert!(config.flags.contains(CompileFlags::ISOLATE_NAMES));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_dt() {
        for dt in [0.0, -0.01, f64::NAN] {
            let result = IntegratorConfig::with_dt(dt).validate();
            assert!(matches!(
                result,
                Err(IntegratorError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn test_merged_builder() {
        let config = IntegratorConfig::with_dt(0.01).merged();
        assert_eq!(config.merge_mode, MergeMode::Merge);
        assert_eq!(config.dt, 0.01);
    }
}
