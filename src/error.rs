//! Error types for the encoded expression optimizer.
//!
//! There are two failure classes:
//!
//! - [`CodecError`]: misuse of the codec or the registry (stale ids, decoding
//!   `INVALID`, exhausted capacities). Every occurrence is a bug in the caller.
//! - [`TimeOutError`]: the cooperative effort budget ran out. The caller may
//!   retry with a larger budget or keep the unoptimized expression.

use std::time::Duration;

use thiserror::Error;

use crate::node::Node;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Cannot decode the INVALID node")]
    InvalidNode,
    #[error("Node {node} is a combined expression reference, expected a leaf or special set")]
    CombinedNotAllowed { node: Node },
    #[error("Node {node} is a special set, expected a leaf")]
    SpecialSetNotAllowed { node: Node },
    #[error("Node {node} is not a combined expression reference")]
    NotCombined { node: Node },
    #[error("Node {node} is not a reference match")]
    NotAReference { node: Node },
    #[error("Node {node} carries no valid operator tag")]
    UnknownOperatorTag { node: Node },
    #[error("Expected a leaf or special set, got a combined expression")]
    NotALeafExpression,
    #[error("Malformed leaf on argument '{arg_name}': {reason}")]
    MalformedLeaf { arg_name: String, reason: String },
    #[error("Argument name '{name}' is not part of the dictionary")]
    UnknownArgName { name: String },
    #[error("Value '{value}' is not part of the dictionary")]
    UnknownValue { value: String },
    #[error("Name index {index} is not part of the dictionary")]
    UnknownNameIndex { index: u32 },
    #[error("Value index {index} is not part of the dictionary")]
    UnknownValueIndex { index: u32 },
    #[error("Dictionary capacity exceeded: at most {max} distinct {kind} supported")]
    DictionaryCapacityExceeded { kind: &'static str, max: usize },
    #[error("Combined expression id {id} exceeds the addressable range (max: {max})")]
    IdOutOfRange { id: u32, max: u32 },
    #[error("Member array id {id} was never issued")]
    UnknownMemberArrayId { id: u32 },
    #[error("Member array id {id} no longer exists (reclaimed by housekeeping)")]
    ReclaimedMemberArrayId { id: u32 },
    #[error("Member array contains the INVALID node")]
    InvalidMember,
    #[error("Tree has no root")]
    NoRoot,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeOutError {
    #[error("Time budget of {budget:?} exceeded after {elapsed:?}")]
    Elapsed { budget: Duration, elapsed: Duration },
    #[error("Step budget of {budget} checks exhausted")]
    StepsExhausted { budget: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    TimeOut(#[from] TimeOutError),
}

impl OptimizerError {
    /// Returns true if this error is a recoverable time-out.
    pub fn is_time_out(&self) -> bool {
        matches!(self, OptimizerError::TimeOut(_))
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
pub type OptimizerResult<T> = Result<T, OptimizerError>;
