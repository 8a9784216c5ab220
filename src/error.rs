//! Error type shared by construction, binding and verification.
use crate::store::{Ident, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CircuitError {
    // --- Configuration ---
    #[error("No value supplied for variable {ident}")]
    MissingBinding { ident: Ident },
    #[error("Variable {ident} is not bound; call bind() before verify()")]
    UnboundVariable { ident: Ident },
    #[error("Invalid solver config: {0}")]
    InvalidConfig(String),
    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    // --- Construction-time domain guards ---
    #[error("Cannot divide by the constant 0")]
    ConstantDivisorZero,
    #[error("Cannot take the square root of the negative constant {value}")]
    NegativeConstantSqrt { value: f64 },

    // --- Evaluation-time domain guards ---
    #[error("Division by zero while solving hint {hint}")]
    DivisionByZero { hint: Ident },
    #[error("Square root of negative value {value} while solving hint {hint}")]
    NegativeSqrt { hint: Ident, value: f64 },

    // --- Structural ---
    #[error("Node {node} does not belong to this builder")]
    UnknownNode { node: NodeId },
    #[error("No hint registered under id {ident}")]
    MissingHint { ident: Ident },
    #[error("Unsolvable dependency cycle or missing hint; {} node(s) never became ready", pending.len())]
    Unsolvable { pending: Vec<NodeId> },
    #[error("Cycle detected")]
    CycleDetected,

    // --- Interchange ---
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CircuitError {
    fn from(err: serde_json::Error) -> Self {
        CircuitError::Serialization(err.to_string())
    }
}

pub type Result<T, E = CircuitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_convert_to_serialization() {
        let json_err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let err = CircuitError::from(json_err);
        assert!(matches!(err, CircuitError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization failed: "));
    }
}
