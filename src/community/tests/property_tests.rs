//! Randomized invariant checks for the extraction/merge protocol.

use proptest::prelude::*;

use crate::community::{
    coarsen_communities, extract_community_section, CoarseningConfig, CommunitySubhypergraph,
};
use crate::hypergraph::{
    pin_hash, Hypergraph, HyperedgeId, HypernodeId, PartitionId, EDGE_HASH_SEED,
};
use crate::community::merge::build_contraction_index;

/// Random hypergraph plus community labels. A final hyperedge containing
/// every hypernode guarantees that each hypernode is a pin of some
/// hyperedge, so the sections jointly cover the whole hypergraph (the
/// counter reconciliation of merge-back assumes exactly that).
fn arb_labeled_hypergraph() -> impl Strategy<Value = Hypergraph> {
    (1usize..10).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(
                prop::collection::btree_set(0..n as HypernodeId, 1..=n),
                0..6,
            ),
            prop::collection::vec(0 as PartitionId..4, n),
        )
            .prop_map(|(n, edges, communities)| {
                let mut edge_indices = vec![0];
                let mut pins: Vec<HypernodeId> = Vec::new();
                for edge in &edges {
                    pins.extend(edge.iter().copied());
                    edge_indices.push(pins.len());
                }
                pins.extend(0..n as HypernodeId);
                edge_indices.push(pins.len());
                let mut hg =
                    Hypergraph::from_adjacency(n, &edge_indices, &pins, None, None).unwrap();
                hg.set_communities(communities).unwrap();
                hg
            })
    })
}

fn distinct_communities(hg: &Hypergraph) -> Vec<PartitionId> {
    let mut ids: Vec<PartitionId> = hg.nodes().map(|v| hg.community_id(v)).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn extract_all(hg: &Hypergraph) -> Vec<CommunitySubhypergraph> {
    distinct_communities(hg)
        .into_iter()
        .map(|c| extract_community_section(hg, c, true))
        .collect()
}

fn sorted(mut pins: Vec<HypernodeId>) -> Vec<HypernodeId> {
    pins.sort_unstable();
    pins
}

proptest! {
    #[test]
    fn slots_partition_every_touched_hyperedge(hg in arb_labeled_hypergraph()) {
        let sections = extract_all(&hg);
        for e in 0..hg.initial_num_edges() as HyperedgeId {
            let mut windows: Vec<(usize, usize)> = sections
                .iter()
                .flat_map(|s| {
                    s.local_to_global_he
                        .iter()
                        .filter(|w| w.original_he == e)
                        .map(|w| (w.incidence_array_start, w.incidence_array_end))
                })
                .collect();
            windows.sort_unstable();
            // Disjoint, gap-free, and covering the whole enabled range.
            let mut expected_start = 0;
            for (start, end) in windows {
                prop_assert_eq!(start, expected_start);
                prop_assert!(end > start);
                expected_start = end;
            }
            prop_assert_eq!(expected_start, hg.pins(e).len());
        }
    }

    #[test]
    fn sections_are_complete_and_ordered(hg in arb_labeled_hypergraph()) {
        for section in extract_all(&hg) {
            let c = section.community_id;
            // Renumbering respects the original order and is injective.
            prop_assert!(section.local_to_global_hn.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(
                section.num_hn_not_in_community,
                section
                    .local_to_global_hn
                    .iter()
                    .filter(|&&v| hg.community_id(v) != c)
                    .count()
            );
            // Every hyperedge touching the community appears with all its
            // pins, in original pin order.
            let mut touched = 0;
            for e in 0..hg.initial_num_edges() as HyperedgeId {
                if !hg.pins(e).iter().any(|&p| hg.community_id(p) == c) {
                    continue;
                }
                let local_he = section
                    .local_to_global_he
                    .iter()
                    .position(|w| w.original_he == e);
                prop_assert!(local_he.is_some());
                let local_he = local_he.unwrap() as HyperedgeId;
                let child = &section.subhypergraph;
                let global_pins: Vec<HypernodeId> = child
                    .pins(local_he)
                    .iter()
                    .map(|&p| section.local_to_global_hn[p as usize])
                    .collect();
                prop_assert_eq!(&global_pins[..], hg.pins(e));
                touched += 1;
            }
            prop_assert_eq!(touched, section.local_to_global_he.len());
        }
    }

    #[test]
    fn identity_coarsening_round_trips(hg in arb_labeled_hypergraph()) {
        let mut hg = hg;
        let original = hg.clone();
        let config = CoarseningConfig {
            respect_order_of_hypernodes: true,
            num_threads: Some(3),
        };
        let history = coarsen_communities(&mut hg, &config, |_| Vec::new());
        prop_assert!(history.is_empty());

        prop_assert_eq!(hg.current_num_nodes(), original.current_num_nodes());
        prop_assert_eq!(hg.current_num_edges(), original.current_num_edges());
        prop_assert_eq!(hg.current_num_pins(), original.current_num_pins());
        for v in 0..hg.initial_num_nodes() as HypernodeId {
            prop_assert!(hg.is_node_enabled(v));
            prop_assert_eq!(hg.node_weight(v), original.node_weight(v));
            prop_assert_eq!(hg.incident_edges(v), original.incident_edges(v));
        }
        for e in 0..hg.initial_num_edges() as HyperedgeId {
            prop_assert_eq!(hg.edge_weight(e), original.edge_weight(e));
            // The merged slot is a permutation of the original, grouped by
            // ascending community id.
            prop_assert_eq!(
                sorted(hg.pins(e).to_vec()),
                sorted(original.pins(e).to_vec())
            );
            prop_assert!(hg
                .pins(e)
                .windows(2)
                .all(|w| hg.community_id(w[0]) <= hg.community_id(w[1])));
            prop_assert_eq!(hg.edge_hash(e), original.edge_hash(e));
        }
    }

    #[test]
    fn full_collapse_satisfies_merge_postconditions(hg in arb_labeled_hypergraph()) {
        let mut hg = hg;
        let original = hg.clone();
        let config = CoarseningConfig {
            respect_order_of_hypernodes: true,
            num_threads: Some(2),
        };
        // Contract every community down to its first member.
        let history = coarsen_communities(&mut hg, &config, |section| {
            let child = &mut section.subhypergraph;
            let members: Vec<HypernodeId> = (0..child.initial_num_nodes() as HypernodeId)
                .filter(|&v| child.community_id(v) == section.community_id)
                .collect();
            let (&representative, rest) = members.split_first().unwrap();
            rest.iter().map(|&v| child.contract(representative, v)).collect()
        });

        let num_communities = distinct_communities(&original).len();
        prop_assert_eq!(history.len(), original.initial_num_nodes() - num_communities);
        prop_assert_eq!(hg.current_num_nodes(), num_communities);
        prop_assert_eq!(
            hg.nodes().count(),
            num_communities
        );

        let contraction_index =
            build_contraction_index(&history, hg.initial_num_nodes(), 1);
        for e in 0..hg.initial_num_edges() as HyperedgeId {
            // Enabled prefix, disabled suffix in strictly descending
            // contraction order.
            prop_assert!(hg.pins(e).iter().all(|&p| hg.is_node_enabled(p)));
            let suffix = &hg.incidence()[hg.first_invalid_entry(e)..hg.first_entry(e + 1)];
            prop_assert!(suffix.iter().all(|&p| !hg.is_node_enabled(p)));
            prop_assert!(suffix
                .windows(2)
                .all(|w| contraction_index[w[0] as usize] > contraction_index[w[1] as usize]));
            prop_assert!(suffix.iter().all(|&p| contraction_index[p as usize] >= 0));
            // Hash over enabled pins only, and monotone weights.
            let expected_hash = hg
                .pins(e)
                .iter()
                .fold(EDGE_HASH_SEED, |h, &p| h.wrapping_add(pin_hash(p)));
            prop_assert_eq!(hg.edge_hash(e), expected_hash);
            prop_assert!(hg.edge_weight(e) >= original.edge_weight(e));
        }
    }
}
