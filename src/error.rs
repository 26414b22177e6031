//! Unified error type for hypersection public APIs.
//!
//! Only user-supplied input (hypergraph files, raw adjacency arrays,
//! community labels) is fallible. Violations of the protocol's structural
//! invariants indicate a programming bug and fail hard via assertions
//! instead of surfacing here.

use thiserror::Error;

/// Unified error type for hypersection operations.
#[derive(Debug, Error)]
pub enum HypersectionError {
    /// Underlying I/O failure while reading a hypergraph file.
    #[error("I/O error reading hypergraph file: {0}")]
    Io(#[from] std::io::Error),
    /// The hMETIS header declared a type outside {0, 1, 10, 11}.
    #[error("hypergraph file has unsupported type {0} (expected 0, 1, 10 or 11)")]
    UnsupportedHypergraphType(i64),
    /// A pin id does not fit the declared number of hypernodes.
    #[error("pin id {pin} out of range for {num_hypernodes} hypernodes")]
    PinOutOfRange { pin: u64, num_hypernodes: usize },
    /// A line could not be parsed as the expected sequence of integers.
    #[error("malformed {what} on line {line}: `{token}`")]
    MalformedLine {
        what: &'static str,
        line: usize,
        token: String,
    },
    /// The file ended before all declared entities were read.
    #[error("unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),
    /// Community labels must cover every hypernode exactly once.
    #[error("community labels length {got} does not match number of hypernodes {expected}")]
    CommunityLabelMismatch { got: usize, expected: usize },
    /// Raw adjacency input violated the CSR contract.
    #[error("invalid adjacency input: {0}")]
    InvalidAdjacency(&'static str),
}
