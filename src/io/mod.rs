//! Hypergraph I/O.
//!
//! Currently the hMETIS `.hgr` text format (the input format of the
//! multilevel partitioners this crate's coarsening protocol serves).

pub mod hgr;

pub use hgr::{parse_hgr, read_hgr};
