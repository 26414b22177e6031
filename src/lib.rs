//! # hypersection
//!
//! hypersection implements the community decomposition protocol of a
//! parallel multilevel hypergraph coarsener: a hypergraph is split into
//! community-induced *section subhypergraphs*, each section is coarsened
//! independently on its own worker, and the coarsened states are merged
//! back into the original hypergraph without locks, preserving the
//! incidence-array ordering that later uncontraction depends on.
//!
//! ## Features
//! - Flat-incidence-array hypergraph container with contraction mementos
//!   and enabled-prefix/disabled-suffix slot layout
//! - Section extraction with per-hyperedge write-slot planning, so
//!   merge-back writes of different communities never collide
//! - Three-phase parallel merge-back (Rayon): window writes, contraction
//!   indexing, incidence normalization
//! - hMETIS `.hgr` reader
//!
//! ## Usage
//! ```no_run
//! use hypersection::prelude::*;
//!
//! let mut hg = read_hgr("netlist.hgr")?;
//! hg.set_communities(vec![0, 0, 1, 1])?;
//! let history = coarsen_communities(&mut hg, &CoarseningConfig::default(), |section| {
//!     // rating-driven contractions inside one community, e.g.:
//!     vec![section.subhypergraph.contract(0, 1)]
//! });
//! # Ok::<(), hypersection::error::HypersectionError>(())
//! ```
//!
//! The inner coarsening policy, community detection, and the partitioning
//! layers above are out of scope; the crate provides the container, the
//! extraction/merge protocol, and the reader they share.

pub mod community;
pub mod error;
pub mod hypergraph;
pub mod io;
pub mod parallel;

/// A convenient prelude to import the most-used types and entry points:
pub mod prelude {
    pub use crate::community::{
        coarsen_communities, extract_community_section, merge_community_sections,
        CoarseningConfig, CommunityHyperedge, CommunitySubhypergraph,
    };
    pub use crate::error::HypersectionError;
    pub use crate::hypergraph::{
        ContractionMemento, Hypergraph, HyperedgeId, HypernodeId, PartitionId,
    };
    pub use crate::io::{parse_hgr, read_hgr};
    pub use crate::parallel::build_thread_pool;
}
