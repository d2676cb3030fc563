//! Error types for the cache substrate.
//!
//! Following the taxonomy in the design spec: contract violations and
//! policy exhaustion are programmer errors and surface as panics (see the
//! `# Panics` sections throughout [`crate::cache`] and [`crate::policies`]).
//! The one recoverable error surface is checkpoint parsing, which returns
//! [`CheckpointError`] instead of aborting, since a malformed input file is
//! not a programming bug.

use thiserror::Error;

/// Failure parsing a text checkpoint produced by
/// [`crate::cache::Cache::save_cache_state`] or a policy's `save_state`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckpointError {
    /// A line did not match the expected `key=value`/`key: value` shape.
    #[error("malformed checkpoint line: {0:?}")]
    MalformedLine(String),

    /// A `status=` field named a status outside the closed enumeration.
    #[error("unknown line status: {0:?}")]
    UnknownStatus(String),

    /// A `valid=`/`dirty=` bit-vector string was not exactly
    /// `num_objects_per_line + 2` characters (the `0b` prefix plus bits).
    #[error("bit vector {field:?} has length {actual}, expected {expected}")]
    BadBitVectorLength {
        /// Which field (`"valid"` or `"dirty"`) was malformed.
        field: &'static str,
        /// The length actually seen.
        actual: usize,
        /// The length required given the cache's `num_objects_per_line`.
        expected: usize,
    },

    /// A required field (`S`, `W`, `tag`, `status`, `valid`, `dirty`, or
    /// `ownerId`) was missing from a line record.
    #[error("checkpoint line is missing required field {0:?}")]
    MissingField(&'static str),

    /// A numeric field could not be parsed as the expected integer.
    #[error("could not parse field {field:?} value {value:?} as an integer")]
    BadInteger {
        /// Which field failed to parse.
        field: &'static str,
        /// The raw text that failed to parse.
        value: String,
    },

    /// The checkpoint stream ended without a terminating `DONE` line.
    #[error("checkpoint stream ended without a DONE terminator")]
    MissingTerminator,

    /// A policy-specific LRU/recency checkpoint payload did not match the
    /// format the active policy expects on restore.
    #[error("malformed replacement-policy checkpoint payload: {0:?}")]
    MalformedPolicyState(String),
}
