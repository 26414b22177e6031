//! Merge-back of coarsened community sections.
//!
//! Three parallel phases separated by pool barriers. Phase 1 writes each
//! section's community-owned hypernodes and pins back into the original
//! hypergraph; pin writes target the reserved windows planned at extraction
//! time, so concurrent sections never touch the same incidence index.
//! Phase 2 derives the contraction index of every contracted hypernode from
//! the global history. Phase 3 rebuilds every incidence slot so enabled
//! pins occupy the prefix and disabled pins form a suffix in strictly
//! descending contraction order, the layout uncontraction relies on.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use bitvec::prelude::*;
use log::debug;
use rayon::prelude::*;

use crate::community::CommunitySubhypergraph;
use crate::hypergraph::{
    pin_hash, ContractionMemento, Hyperedge, Hypergraph, Hypernode, HyperedgeId, HypernodeId,
    EDGE_HASH_SEED,
};
use crate::parallel::{chunk_borders, SharedSlice};

/// Merge the coarsened `sections` back into `hg`.
///
/// `history` is the concatenated contraction history of all sections with
/// mementos translated to original hypernode ids; the position of a memento
/// is its contraction index. `sections` must contain one entry per
/// community of `hg` — the aggregate counters are reconstituted from the
/// section states.
pub fn merge_community_sections(
    hg: &mut Hypergraph,
    pool: &rayon::ThreadPool,
    sections: &[CommunitySubhypergraph],
    history: &[ContractionMemento],
) {
    // Pre-phase: reconcile aggregate counters from the section states.
    let mut nodes = 0;
    let mut pins = 0;
    let mut edges = hg.current_num_edges();
    for section in sections {
        let child = &section.subhypergraph;
        nodes += child.current_num_nodes() - section.num_hn_not_in_community;
        pins += child.current_num_pins() - section.num_pins_not_in_community;
        edges -= child.initial_num_edges() - child.current_num_edges();
    }
    hg.set_current_stats(nodes, edges, pins);

    let num_edges = hg.initial_num_edges();
    let edge_weights: Vec<AtomicI32> = (0..num_edges)
        .map(|e| AtomicI32::new(hg.edge_weight(e as HyperedgeId)))
        .collect();
    let edge_disabled: Vec<AtomicBool> = (0..num_edges).map(|_| AtomicBool::new(false)).collect();

    // Phase 1: write community-owned state into the reserved windows.
    {
        let (hyperedges, incidence, hypernodes) = hg.phase1_views();
        pool.install(|| {
            sections.par_iter().for_each(|section| {
                write_section(
                    section,
                    hyperedges,
                    incidence,
                    hypernodes,
                    &edge_weights,
                    &edge_disabled,
                );
            });
        });
    }
    // Weight and disable reconciliation, applied once all writers are done.
    for e in 0..num_edges {
        let e = e as HyperedgeId;
        let weight = edge_weights[e as usize].load(Ordering::Relaxed);
        if weight > hg.edge_weight(e) {
            hg.set_edge_weight(e, weight);
        }
        if edge_disabled[e as usize].load(Ordering::Relaxed) {
            hg.disable_edge(e);
        }
    }

    let num_threads = pool.current_num_threads();

    // Phase 2: contraction index from the global history.
    let contraction_index =
        pool.install(|| build_contraction_index(history, hg.initial_num_nodes(), num_threads));

    // Phase 3: per-slot normalization.
    pool.install(|| normalize_incidence(hg, &contraction_index, num_threads));

    debug!(
        "merged {} sections, {} contractions, {} hypernodes and {} hyperedges remain",
        sections.len(),
        history.len(),
        hg.current_num_nodes(),
        hg.current_num_edges()
    );
}

/// Phase-1 body for one section.
fn write_section(
    section: &CommunitySubhypergraph,
    hyperedges: &[Hyperedge],
    incidence: SharedSlice<'_, HypernodeId>,
    hypernodes: SharedSlice<'_, Hypernode>,
    edge_weights: &[AtomicI32],
    edge_disabled: &[AtomicBool],
) {
    let community = section.community_id;
    let child = &section.subhypergraph;
    let mut visited = bitvec![usize, Lsb0; 0; child.initial_num_edges()];

    for hn in 0..child.initial_num_nodes() as HypernodeId {
        if child.community_id(hn) != community {
            continue;
        }
        let original_hn = section.local_to_global_hn[hn as usize];
        // Contractions happen only inside a community, so the incident nets
        // of a community hypernode are exactly the child's incident nets
        // mapped back to original ids.
        let mut incident_nets = Vec::with_capacity(child.incident_edges(hn).len());
        for &he in child.incident_edges(hn) {
            let window = &section.local_to_global_he[he as usize];
            let original_he = window.original_he;
            incident_nets.push(original_he);
            if visited[he as usize] {
                continue;
            }

            let slot_base = hyperedges[original_he as usize].first_entry;
            let mut cursor = slot_base + window.incidence_array_start;
            for i in child.first_entry(he)..child.first_entry(he + 1) {
                let pin = child.incidence()[i];
                if child.community_id(pin) == community {
                    // SAFETY: the slot planner reserves disjoint windows for
                    // different communities of the same hyperedge, and this
                    // section is the only writer of its window.
                    unsafe { incidence.write(cursor, section.local_to_global_hn[pin as usize]) };
                    cursor += 1;
                }
            }
            assert_eq!(
                cursor,
                slot_base + window.incidence_array_end,
                "community {community} wrote past its reserved window of hyperedge {original_he}"
            );

            edge_weights[original_he as usize].fetch_max(child.edge_weight(he), Ordering::Relaxed);
            // A hyperedge becomes disabled inside at most one section: the
            // single-pin and parallel-net conditions are decided by
            // contractions within one community only.
            if !child.is_edge_enabled(he) {
                edge_disabled[original_he as usize].store(true, Ordering::Relaxed);
            }
            visited.set(he as usize, true);
        }

        let record = Hypernode::new(
            incident_nets,
            child.node_weight(hn),
            child.is_node_enabled(hn),
        );
        // SAFETY: a hypernode belongs to exactly one community, so no other
        // section writes this record.
        unsafe { hypernodes.write(original_hn as usize, record) };
    }
}

/// Phase 2: map every contracted hypernode to its position in `history`.
///
/// Unset entries stay `-1`. Histories shorter than the worker count are
/// filled sequentially.
pub fn build_contraction_index(
    history: &[ContractionMemento],
    num_nodes: usize,
    num_threads: usize,
) -> Vec<i32> {
    let index: Vec<AtomicI32> = (0..num_nodes).map(|_| AtomicI32::new(-1)).collect();
    let step = history.len() / num_threads.max(1);
    if step >= 1 && num_threads > 1 {
        history
            .par_chunks(step)
            .enumerate()
            .for_each(|(chunk, mementos)| {
                for (offset, memento) in mementos.iter().enumerate() {
                    record_contraction(&index, memento.v, (chunk * step + offset) as i32);
                }
            });
    } else {
        for (position, memento) in history.iter().enumerate() {
            record_contraction(&index, memento.v, position as i32);
        }
    }
    index.into_iter().map(AtomicI32::into_inner).collect()
}

fn record_contraction(index: &[AtomicI32], v: HypernodeId, position: i32) {
    let previous = index[v as usize].swap(position, Ordering::Relaxed);
    assert_eq!(
        previous, -1,
        "hypernode {v} occurs more than once in the contraction history"
    );
}

/// Phase 3: compact every slot to enabled-prefix/disabled-suffix form,
/// recompute the edge hashes, and sort each suffix by strictly descending
/// contraction index.
fn normalize_incidence(hg: &mut Hypergraph, contraction_index: &[i32], num_threads: usize) {
    let num_edges = hg.initial_num_edges();
    if num_edges == 0 {
        return;
    }
    let total_pins = hg.incidence().len();
    let borders = chunk_borders(num_edges, num_threads);
    // Slot boundaries do not move during this phase, so the hyperedge
    // records and the incidence array can be split into per-worker ranges.
    let incidence_borders: Vec<usize> = borders
        .iter()
        .map(|&b| {
            if b == num_edges {
                total_pins
            } else {
                hg.first_entry(b as HyperedgeId)
            }
        })
        .collect();

    let (mut he_rest, mut inc_rest, hypernodes) = hg.phase3_views();
    rayon::scope(|scope| {
        for w in 0..borders.len() - 1 {
            let (he_chunk, he_tail) =
                std::mem::take(&mut he_rest).split_at_mut(borders[w + 1] - borders[w]);
            he_rest = he_tail;
            let (inc_chunk, inc_tail) = std::mem::take(&mut inc_rest)
                .split_at_mut(incidence_borders[w + 1] - incidence_borders[w]);
            inc_rest = inc_tail;
            let base = incidence_borders[w];
            scope.spawn(move |_| {
                normalize_chunk(he_chunk, inc_chunk, base, hypernodes, contraction_index);
            });
        }
    });
}

fn normalize_chunk(
    hyperedges: &mut [Hyperedge],
    incidence: &mut [HypernodeId],
    base: usize,
    hypernodes: &[Hypernode],
    contraction_index: &[i32],
) {
    for k in 0..hyperedges.len() {
        let slot_end = if k + 1 < hyperedges.len() {
            hyperedges[k + 1].first_entry
        } else {
            base + incidence.len()
        };
        let he = &mut hyperedges[k];
        let first = he.first_entry - base;

        he.hash = EDGE_HASH_SEED;
        let mut j = first;
        while j < first + he.size {
            let pin = incidence[j];
            if hypernodes[pin as usize].enabled {
                he.hash = he.hash.wrapping_add(pin_hash(pin));
                j += 1;
            } else {
                // Swap disabled pins behind the shrinking enabled prefix and
                // reprocess position j.
                incidence.swap(j, first + he.size - 1);
                he.size -= 1;
            }
        }

        let suffix = &mut incidence[first + he.size..slot_end - base];
        suffix.sort_unstable_by_key(|&pin| Reverse(contraction_index[pin as usize]));
        debug_assert!(
            suffix
                .iter()
                .all(|&pin| contraction_index[pin as usize] >= 0),
            "disabled suffix contains a pin missing from the contraction history"
        );
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn contraction_index_matches_history_positions() {
        let history = [
            ContractionMemento { u: 0, v: 5 },
            ContractionMemento { u: 0, v: 3 },
            ContractionMemento { u: 1, v: 7 },
        ];
        let index = build_contraction_index(&history, 8, 1);
        assert_eq!(index[5], 0);
        assert_eq!(index[3], 1);
        assert_eq!(index[7], 2);
        assert!(index
            .iter()
            .enumerate()
            .filter(|(v, _)| ![3, 5, 7].contains(v))
            .all(|(_, &i)| i == -1));
    }

    #[test]
    fn contraction_index_parallel_matches_sequential() {
        let history: Vec<ContractionMemento> = (0..100u32)
            .map(|i| ContractionMemento { u: 100 + i, v: i })
            .collect();
        let sequential = build_contraction_index(&history, 200, 1);
        let parallel = build_contraction_index(&history, 200, 4);
        assert_eq!(sequential, parallel);
    }

    #[test]
    #[should_panic(expected = "more than once")]
    fn contraction_index_rejects_duplicate_hypernode() {
        let history = [
            ContractionMemento { u: 0, v: 2 },
            ContractionMemento { u: 1, v: 2 },
        ];
        build_contraction_index(&history, 4, 1);
    }
}
