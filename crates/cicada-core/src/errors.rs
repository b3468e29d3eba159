//! Structured error types shared across cicada crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CicadaError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (node ids, spans, counts, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the cicada decoding core.
///
/// `EmptyDerivation` and `BudgetExhausted` from the spec are deliberately
/// absent here: per the error handling design, "no derivation" outcomes are
/// data (`Hypergraph::is_valid() == false`), not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CicadaError {
    /// Rule/attribute/grammar text failed to parse, or arity invariants were violated.
    #[error("malformed input: {0}")]
    MalformedInput(ErrorInfo),
    /// A hypergraph transform observed a structural violation (e.g. an epsilon
    /// edge with arity != 1, or a required-valid goal that is unreachable).
    #[error("malformed graph: {0}")]
    MalformedGraph(ErrorInfo),
    /// A `Model` or `Transducer` implementation violated its contract (state
    /// size mismatch, null rule pointer equivalent). Always fatal.
    #[error("model contract violation: {0}")]
    ModelContract(ErrorInfo),
}

impl CicadaError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CicadaError::MalformedInput(info)
            | CicadaError::MalformedGraph(info)
            | CicadaError::ModelContract(info) => info,
        }
    }

    /// Builds a [`CicadaError::MalformedInput`] from a code/message pair.
    pub fn malformed_input(code: impl Into<String>, message: impl Into<String>) -> Self {
        CicadaError::MalformedInput(ErrorInfo::new(code, message))
    }

    /// Builds a [`CicadaError::MalformedGraph`] from a code/message pair.
    pub fn malformed_graph(code: impl Into<String>, message: impl Into<String>) -> Self {
        CicadaError::MalformedGraph(ErrorInfo::new(code, message))
    }

    /// Builds a [`CicadaError::ModelContract`] from a code/message pair.
    pub fn model_contract(code: impl Into<String>, message: impl Into<String>) -> Self {
        CicadaError::ModelContract(ErrorInfo::new(code, message))
    }
}
