// src/error.rs
use std::fmt;

/// Errors raised while resolving, building or merging integrators
#[derive(Debug, Clone, PartialEq)]
pub enum IntegratorError {
    /// Method name not present in the scheme registry
    UnknownIntegrationMethod { method: String, valid: Vec<String> },

    /// The scheme has no builder for this kind of equation
    UnsupportedEquation { method: String, stochastic: bool },

    /// Diffusion term is neither a function nor a usable numeric constant
    InvalidDiffusionTerm { variable: String, reason: String },

    /// Out-of-domain scheme parameter (e.g. beta = 0 for RK2)
    InvalidSchemeParameter {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Exponential SDE scheme requested on a drift without a linear coefficient
    MissingLinearCoefficient { variable: String },

    /// Malformed equation descriptor
    InvalidEquation { field: String, reason: String },

    /// Invalid configuration
    InvalidConfiguration { field: String, reason: String },

    /// Expression could not be parsed or bound
    SymbolicError { expression: String, reason: String },

    /// Two merged integrators claim the same name
    NameCollision { name: String },

    /// A merged integrator needs an argument that nobody provides
    UnboundArgument { variable: String, argument: String },
}

impl fmt::Display for IntegratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegratorError::UnknownIntegrationMethod { method, valid } => {
                write!(
                    f,
                    "Unknown integration method '{}'. Valid methods: {}",
                    method,
                    valid.join(", ")
                )
            }
            IntegratorError::UnsupportedEquation { method, stochastic } => {
                let kind = if *stochastic { "stochastic" } else { "deterministic" };
                write!(f, "Method '{}' does not support {} equations", method, kind)
            }
            IntegratorError::InvalidDiffusionTerm { variable, reason } => {
                write!(f, "Invalid diffusion term for '{}': {}", variable, reason)
            }
            IntegratorError::InvalidSchemeParameter {
                parameter,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid scheme parameter '{}' = {}: {}",
                    parameter, value, constraint
                )
            }
            IntegratorError::MissingLinearCoefficient { variable } => {
                write!(
                    f,
                    "Exponential Euler for stochastic '{}' needs a drift returning its linear coefficient",
                    variable
                )
            }
            IntegratorError::InvalidEquation { field, reason } => {
                write!(f, "Invalid equation '{}': {}", field, reason)
            }
            IntegratorError::InvalidConfiguration { field, reason } => {
                write!(f, "Invalid configuration for '{}': {}", field, reason)
            }
            IntegratorError::SymbolicError { expression, reason } => {
                write!(f, "Cannot handle expression '{}': {}", expression, reason)
            }
            IntegratorError::NameCollision { name } => {
                write!(f, "Name '{}' is already used in the merged system", name)
            }
            IntegratorError::UnboundArgument { variable, argument } => {
                write!(
                    f,
                    "Argument '{}' of '{}' is neither a state variable nor an input",
                    argument, variable
                )
            }
        }
    }
}

impl std::error::Error for IntegratorError {}

/// Result type alias for integrator operations
pub type IntegratorResult<T> = Result<T, IntegratorError>;

/// Validation utilities
pub mod validation {
    use super::{IntegratorError, IntegratorResult};

    /// Validate that a step size is positive and finite
    pub fn validate_step_size(dt: f64) -> IntegratorResult<()> {
        if !dt.is_finite() || dt <= 0.0 {
            Err(IntegratorError::InvalidConfiguration {
                field: "dt".to_string(),
                reason: format!("must be positive and finite, got {}", dt),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a scheme parameter is finite and non-zero
    pub fn validate_nonzero(name: &str, value: f64) -> IntegratorResult<()> {
        if !value.is_finite() || value == 0.0 {
            Err(IntegratorError::InvalidSchemeParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be finite and non-zero".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate a model parameter that must be positive and finite
    pub fn validate_positive(name: &str, value: f64) -> IntegratorResult<()> {
        if !value.is_finite() || value <= 0.0 {
            Err(IntegratorError::InvalidEquation {
                field: name.to_string(),
                reason: format!("must be positive and finite, got {}", value),
            })
        } else {
            Ok(())
        }
    }

    /// Validate an identifier: non-empty, starts with a letter or underscore,
    /// continues with letters, digits or underscores
    pub fn validate_identifier(field: &str, name: &str) -> IntegratorResult<()> {
        let mut chars = name.chars();
        let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_head || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Err(IntegratorError::InvalidEquation {
                field: field.to_string(),
                reason: format!("'{}' is not a valid identifier", name),
            })
        } else {
            Ok(())
        }
    }

    /// Validate paths count
    pub fn validate_paths(paths: usize) -> IntegratorResult<()> {
        if paths == 0 {
            Err(IntegratorError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> IntegratorResult<()> {
        if steps == 0 {
            Err(IntegratorError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_step_size() {
        assert!(validate_step_size(0.1).is_ok());
        assert!(validate_step_size(0.0).is_err());
        assert!(validate_step_size(-0.1).is_err());
        assert!(validate_step_size(f64::NAN).is_err());
        assert!(validate_step_size(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_nonzero() {
        assert!(validate_nonzero("beta", 0.5).is_ok());
        assert!(matches!(
            validate_nonzero("beta", 0.0),
            Err(IntegratorError::InvalidSchemeParameter { .. })
        ));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("variable", "V").is_ok());
        assert!(validate_identifier("variable", "_m_gate2").is_ok());
        assert!(validate_identifier("variable", "").is_err());
        assert!(validate_identifier("variable", "2V").is_err());
        assert!(validate_identifier("variable", "V m").is_err());
    }

    #[test]
    fn test_unknown_method_display() {
        let error = IntegratorError::UnknownIntegrationMethod {
            method: "leapfrog".to_string(),
            valid: vec!["euler".to_string(), "rk4".to_string()],
        };

        let display = format!("{}", error);
        assert!(display.contains("leapfrog"));
        assert!(display.contains("euler, rk4"));
    }

    #[test]
    fn test_scheme_parameter_display() {
        let error = IntegratorError::InvalidSchemeParameter {
            parameter: "beta".to_string(),
            value: 0.0,
            constraint: "must be finite and non-zero".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("beta"));
        assert!(display.contains("non-zero"));
    }
}
