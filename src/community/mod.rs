//! Community-induced section subhypergraphs.
//!
//! A hypergraph is coarsened in parallel by decomposing it into one section
//! subhypergraph per community: the section for community `C` contains every
//! hyperedge with at least one pin in `C`, together with *all* pins of those
//! hyperedges (so hyperedge sizes inside the section match the original and
//! rating functions see the same neighbourhoods as a sequential coarsener
//! would). Each section is coarsened independently, then
//! [`merge_community_sections`] writes the section states back into the
//! original hypergraph.
//!
//! [`coarsen_communities`] drives the full protocol: extract → parallel
//! coarsen → merge, returning the global contraction history.

pub mod extract;
pub mod merge;
#[cfg(test)]
mod tests;

pub use extract::extract_community_section;
pub use merge::{build_contraction_index, merge_community_sections};

use rayon::prelude::*;

use crate::hypergraph::{
    ContractionMemento, Hypergraph, HyperedgeId, HypernodeId, PartitionId,
};
use crate::parallel::build_thread_pool;

/// A hyperedge of a section subhypergraph together with the community's
/// reserved write window inside the original hyperedge's incidence slot.
///
/// `incidence_array_start` and `incidence_array_end` are offsets relative to
/// `first_entry(original_he)` in the original hypergraph. Windows of
/// different communities on the same hyperedge are disjoint and their union
/// covers the enabled pin range, so merge-back can write concurrently
/// without locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityHyperedge {
    pub original_he: HyperedgeId,
    pub incidence_array_start: usize,
    pub incidence_array_end: usize,
}

/// The extracted state of one community: an owned child hypergraph plus the
/// maps back into the original hypergraph.
///
/// Local hypernode ids are dense from 0; `local_to_global_hn[local]` is the
/// original id. `local_to_global_he` has one entry per section hyperedge in
/// section order. The two `*_not_in_community` counters record how much of
/// the section belongs to *other* communities, which merge-back needs to
/// reconstitute the aggregate counts of the original hypergraph.
#[derive(Debug)]
pub struct CommunitySubhypergraph {
    pub community_id: PartitionId,
    pub num_hn_not_in_community: usize,
    pub num_pins_not_in_community: usize,
    pub subhypergraph: Hypergraph,
    pub local_to_global_hn: Vec<HypernodeId>,
    pub local_to_global_he: Vec<CommunityHyperedge>,
}

impl CommunitySubhypergraph {
    pub(crate) fn new(community_id: PartitionId) -> Self {
        Self {
            community_id,
            num_hn_not_in_community: 0,
            num_pins_not_in_community: 0,
            subhypergraph: Hypergraph::default(),
            local_to_global_hn: Vec::new(),
            local_to_global_he: Vec::new(),
        }
    }

    pub(crate) fn add_hypernode(&mut self, hg: &Hypergraph, original_hn: HypernodeId) {
        self.local_to_global_hn.push(original_hn);
        if hg.community_id(original_hn) != self.community_id {
            self.num_hn_not_in_community += 1;
        }
    }

    pub(crate) fn add_pin(&mut self, hg: &Hypergraph, original_pin: HypernodeId) {
        if hg.community_id(original_pin) != self.community_id {
            self.num_pins_not_in_community += 1;
        }
    }

    pub(crate) fn sort_hypernodes(&mut self) {
        self.local_to_global_hn.sort_unstable();
    }

    pub(crate) fn add_hyperedge(
        &mut self,
        original_he: HyperedgeId,
        incidence_array_start: usize,
        incidence_array_end: usize,
    ) {
        self.local_to_global_he.push(CommunityHyperedge {
            original_he,
            incidence_array_start,
            incidence_array_end,
        });
    }
}

/// Configuration of the community coarsening driver.
#[derive(Debug, Clone)]
pub struct CoarseningConfig {
    /// Renumber section hypernodes in ascending original-id order. Costs a
    /// sort per section; makes section states reproducible independent of
    /// traversal order.
    pub respect_order_of_hypernodes: bool,
    /// Worker count for coarsening and merge-back. `None` lets Rayon pick.
    pub num_threads: Option<usize>,
}

impl Default for CoarseningConfig {
    fn default() -> Self {
        Self {
            respect_order_of_hypernodes: true,
            num_threads: None,
        }
    }
}

/// Run the full protocol: extract one section per community, coarsen every
/// section in parallel with `coarsen`, and merge the results back into `hg`.
///
/// `coarsen` receives a mutable section and returns the contractions it
/// performed, in order, as local-id mementos; the driver translates them to
/// original ids and returns the concatenated global history (the input for
/// later uncontraction).
pub fn coarsen_communities<F>(
    hg: &mut Hypergraph,
    config: &CoarseningConfig,
    coarsen: F,
) -> Vec<ContractionMemento>
where
    F: Fn(&mut CommunitySubhypergraph) -> Vec<ContractionMemento> + Sync,
{
    let mut community_ids: Vec<PartitionId> = hg.nodes().map(|v| hg.community_id(v)).collect();
    community_ids.sort_unstable();
    community_ids.dedup();

    let mut sections: Vec<CommunitySubhypergraph> = community_ids
        .iter()
        .map(|&c| extract_community_section(hg, c, config.respect_order_of_hypernodes))
        .collect();

    let pool = build_thread_pool(config.num_threads);
    let local_histories: Vec<Vec<ContractionMemento>> =
        pool.install(|| sections.par_iter_mut().map(&coarsen).collect());

    let mut history = Vec::new();
    for (section, local) in sections.iter().zip(local_histories) {
        for memento in local {
            history.push(ContractionMemento {
                u: section.local_to_global_hn[memento.u as usize],
                v: section.local_to_global_hn[memento.v as usize],
            });
        }
    }

    merge_community_sections(hg, &pool, &sections, &history);
    history
}
