//! Extraction of community-induced section subhypergraphs.
//!
//! Two passes over the original hypergraph. The pin-collection pass walks
//! the community's hypernodes and pulls in every pin of every incident
//! hyperedge, renumbering pins densely as they are first seen. The
//! hyperedge-construction pass then emits each touched hyperedge with its
//! pins translated to local ids and plans the community's reserved window
//! inside the hyperedge's original incidence slot.

use bitvec::prelude::*;
use hashbrown::HashMap as FastMap;
use log::debug;

use crate::community::CommunitySubhypergraph;
use crate::hypergraph::{Hypergraph, HypernodeId, PartitionId};

/// Extract the section subhypergraph induced by `community`.
///
/// The section contains every hyperedge of `hg` with at least one pin in
/// the community, with all pins. A community without members yields a
/// section with an empty child hypergraph.
pub fn extract_community_section(
    hg: &Hypergraph,
    community: PartitionId,
    respect_order_of_hypernodes: bool,
) -> CommunitySubhypergraph {
    let num_nodes = hg.initial_num_nodes();
    let mut section = CommunitySubhypergraph::new(community);
    // One bitset over both id spaces: hypernodes first, hyperedges offset
    // by the hypernode count.
    let mut visited = bitvec![usize, Lsb0; 0; num_nodes + hg.initial_num_edges()];

    for hn in hg.nodes() {
        if hg.community_id(hn) != community {
            continue;
        }
        for &he in hg.incident_edges(hn) {
            if visited[num_nodes + he as usize] {
                continue;
            }
            for &pin in hg.pins(he) {
                if !visited[pin as usize] {
                    section.add_hypernode(hg, pin);
                    visited.set(pin as usize, true);
                }
                section.add_pin(hg, pin);
            }
            visited.set(num_nodes + he as usize, true);
        }
    }

    if respect_order_of_hypernodes {
        section.sort_hypernodes();
    }

    if section.local_to_global_hn.is_empty() {
        debug!("community {community} has no members, section is empty");
        return section;
    }

    let mut global_to_local: FastMap<HypernodeId, HypernodeId> =
        FastMap::with_capacity(section.local_to_global_hn.len());
    for (local, &global) in section.local_to_global_hn.iter().enumerate() {
        global_to_local.insert(global, local as HypernodeId);
    }

    let mut edge_indices = vec![0usize];
    let mut local_pins: Vec<HypernodeId> = Vec::new();
    let mut edge_weights = Vec::new();
    let mut community_sizes: FastMap<PartitionId, usize> = FastMap::new();
    for he in hg.edges() {
        if !visited[num_nodes + he as usize] {
            continue;
        }
        community_sizes.clear();
        for &pin in hg.pins(he) {
            let local = *global_to_local
                .get(&pin)
                .expect("touched hyperedge has a pin outside the section");
            local_pins.push(local);
            *community_sizes.entry(hg.community_id(pin)).or_insert(0) += 1;
        }
        edge_indices.push(local_pins.len());
        edge_weights.push(hg.edge_weight(he));
        let (start, end) = community_slot(&community_sizes, community);
        section.add_hyperedge(he, start, end);
    }

    let node_weights: Vec<_> = section
        .local_to_global_hn
        .iter()
        .map(|&global| hg.node_weight(global))
        .collect();
    let communities: Vec<_> = section
        .local_to_global_hn
        .iter()
        .map(|&global| hg.community_id(global))
        .collect();
    let mut child = Hypergraph::from_adjacency(
        section.local_to_global_hn.len(),
        &edge_indices,
        &local_pins,
        Some(&edge_weights),
        Some(&node_weights),
    )
    .expect("section adjacency is dense by construction");
    child
        .set_communities(communities)
        .expect("one label per section hypernode");

    debug!(
        "community {community}: {} hypernodes ({} external), {} hyperedges, {} pins",
        section.local_to_global_hn.len(),
        section.num_hn_not_in_community,
        section.local_to_global_he.len(),
        local_pins.len()
    );
    section.subhypergraph = child;
    section
}

/// The window reserved for `community` inside a hyperedge's incidence slot,
/// as offsets relative to the slot start.
///
/// Communities are laid out in ascending id order: the window starts after
/// the pins of every smaller community and spans the community's own pin
/// count.
pub(crate) fn community_slot(
    community_sizes: &FastMap<PartitionId, usize>,
    community: PartitionId,
) -> (usize, usize) {
    let mut start = 0;
    let mut len = None;
    for (&comm, &size) in community_sizes {
        if comm < community {
            start += size;
        } else if comm == community {
            len = Some(size);
        }
    }
    let len = len.expect("hyperedge does not touch the community it was planned for");
    (start, start + len)
}
