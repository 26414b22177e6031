//! The concrete hypergraph container.
//!
//! Pins are stored in one flat incidence array. Each hyperedge owns the
//! contiguous slot `[first_entry(e), first_entry(e + 1))`; the prefix
//! `[first_entry(e), first_invalid_entry(e))` lists the currently enabled
//! pins and the remainder holds pins disabled by earlier contractions. A
//! sentinel hyperedge record at index `m` carries the total incidence length
//! so `first_entry(e + 1)` is well-defined for every real hyperedge.
//!
//! [`Hypergraph::contract`] and [`Hypergraph::remove_edge`] are the two
//! mutations a coarsener applies inside a community subhypergraph; both keep
//! the per-edge pin hash and the aggregate counters up to date.

use std::hash::Hasher;

use ahash::AHasher;

use crate::error::HypersectionError;

pub type HypernodeId = u32;
pub type HyperedgeId = u32;
pub type PartitionId = i32;
pub type HypernodeWeight = i32;
pub type HyperedgeWeight = i32;

/// Seed of every per-hyperedge pin hash.
pub const EDGE_HASH_SEED: u64 = 42;

/// Stable hash of a single pin id; `edge_hash(e)` is the seeded wrapping sum
/// of `pin_hash` over the enabled pins of `e`.
#[inline]
pub fn pin_hash(hn: HypernodeId) -> u64 {
    let mut h = AHasher::default();
    h.write_u32(hn);
    h.finish()
}

/// One contraction of the coarsening history: `v` was merged into `u`.
///
/// The position of a memento in the history is its contraction index, which
/// orders the disabled suffix of every incidence slot after merge-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractionMemento {
    pub u: HypernodeId,
    pub v: HypernodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hypernode {
    pub(crate) incident_nets: Vec<HyperedgeId>,
    pub(crate) weight: HypernodeWeight,
    pub(crate) enabled: bool,
}

impl Hypernode {
    pub(crate) fn new(
        incident_nets: Vec<HyperedgeId>,
        weight: HypernodeWeight,
        enabled: bool,
    ) -> Self {
        Self {
            incident_nets,
            weight,
            enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hyperedge {
    pub(crate) first_entry: usize,
    pub(crate) size: usize,
    pub(crate) weight: HyperedgeWeight,
    pub(crate) hash: u64,
    pub(crate) enabled: bool,
}

/// A hypergraph over hypernodes `0..n` and hyperedges `0..m`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypergraph {
    hypernodes: Vec<Hypernode>,
    /// `m + 1` records; the last one is the sentinel.
    hyperedges: Vec<Hyperedge>,
    incidence_array: Vec<HypernodeId>,
    communities: Vec<PartitionId>,
    current_num_hypernodes: usize,
    current_num_hyperedges: usize,
    current_num_pins: usize,
}

impl Default for Hypergraph {
    /// The empty hypergraph (sentinel record only).
    fn default() -> Self {
        Self::from_adjacency(0, &[0], &[], None, None).expect("empty adjacency is valid")
    }
}

impl Hypergraph {
    /// Construct a hypergraph from a CSR-style adjacency description.
    ///
    /// `edge_indices` has one entry per hyperedge plus a terminating entry
    /// equal to `edges.len()`; hyperedge `e` has pins
    /// `edges[edge_indices[e]..edge_indices[e + 1]]`. Missing weights
    /// default to 1. Community labels default to 0 for every hypernode; set
    /// them with [`Hypergraph::set_communities`].
    pub fn from_adjacency(
        num_nodes: usize,
        edge_indices: &[usize],
        edges: &[HypernodeId],
        edge_weights: Option<&[HyperedgeWeight]>,
        node_weights: Option<&[HypernodeWeight]>,
    ) -> Result<Self, HypersectionError> {
        let Some((&last, _)) = edge_indices.split_last() else {
            return Err(HypersectionError::InvalidAdjacency(
                "edge index array must contain at least the terminating entry",
            ));
        };
        if last != edges.len() {
            return Err(HypersectionError::InvalidAdjacency(
                "edge index array must terminate with the pin count",
            ));
        }
        if edge_indices.windows(2).any(|w| w[0] > w[1]) {
            return Err(HypersectionError::InvalidAdjacency(
                "edge index array must be non-decreasing",
            ));
        }
        let num_edges = edge_indices.len() - 1;
        if edge_weights.is_some_and(|w| w.len() != num_edges) {
            return Err(HypersectionError::InvalidAdjacency(
                "hyperedge weight count must match hyperedge count",
            ));
        }
        if node_weights.is_some_and(|w| w.len() != num_nodes) {
            return Err(HypersectionError::InvalidAdjacency(
                "hypernode weight count must match hypernode count",
            ));
        }
        for &pin in edges {
            if pin as usize >= num_nodes {
                return Err(HypersectionError::PinOutOfRange {
                    pin: pin as u64,
                    num_hypernodes: num_nodes,
                });
            }
        }

        let mut hyperedges = Vec::with_capacity(num_edges + 1);
        for e in 0..num_edges {
            let first_entry = edge_indices[e];
            let size = edge_indices[e + 1] - first_entry;
            let hash = edges[first_entry..first_entry + size]
                .iter()
                .fold(EDGE_HASH_SEED, |h, &pin| h.wrapping_add(pin_hash(pin)));
            hyperedges.push(Hyperedge {
                first_entry,
                size,
                weight: edge_weights.map_or(1, |w| w[e]),
                hash,
                enabled: true,
            });
        }
        // Sentinel: carries the total incidence length, nothing else.
        hyperedges.push(Hyperedge {
            first_entry: edges.len(),
            size: 0,
            weight: 0,
            hash: EDGE_HASH_SEED,
            enabled: false,
        });

        let mut hypernodes: Vec<Hypernode> = (0..num_nodes)
            .map(|v| Hypernode::new(Vec::new(), node_weights.map_or(1, |w| w[v]), true))
            .collect();
        for e in 0..num_edges {
            for &pin in &edges[edge_indices[e]..edge_indices[e + 1]] {
                hypernodes[pin as usize].incident_nets.push(e as HyperedgeId);
            }
        }

        Ok(Self {
            hypernodes,
            hyperedges,
            incidence_array: edges.to_vec(),
            communities: vec![0; num_nodes],
            current_num_hypernodes: num_nodes,
            current_num_hyperedges: num_edges,
            current_num_pins: edges.len(),
        })
    }

    pub fn initial_num_nodes(&self) -> usize {
        self.hypernodes.len()
    }

    pub fn initial_num_edges(&self) -> usize {
        self.hyperedges.len() - 1
    }

    pub fn current_num_nodes(&self) -> usize {
        self.current_num_hypernodes
    }

    pub fn current_num_edges(&self) -> usize {
        self.current_num_hyperedges
    }

    pub fn current_num_pins(&self) -> usize {
        self.current_num_pins
    }

    /// Enabled hypernodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = HypernodeId> + '_ {
        self.hypernodes
            .iter()
            .enumerate()
            .filter(|(_, hn)| hn.enabled)
            .map(|(v, _)| v as HypernodeId)
    }

    /// Enabled hyperedges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = HyperedgeId> + '_ {
        self.hyperedges[..self.initial_num_edges()]
            .iter()
            .enumerate()
            .filter(|(_, he)| he.enabled)
            .map(|(e, _)| e as HyperedgeId)
    }

    /// Hyperedges incident to `v`, in insertion order.
    pub fn incident_edges(&self, v: HypernodeId) -> &[HyperedgeId] {
        &self.hypernodes[v as usize].incident_nets
    }

    /// Enabled pins of `e`, in incidence-array order.
    pub fn pins(&self, e: HyperedgeId) -> &[HypernodeId] {
        let he = &self.hyperedges[e as usize];
        &self.incidence_array[he.first_entry..he.first_entry + he.size]
    }

    /// The full flat pin storage, including disabled suffixes.
    pub fn incidence(&self) -> &[HypernodeId] {
        &self.incidence_array
    }

    pub fn community_id(&self, v: HypernodeId) -> PartitionId {
        self.communities[v as usize]
    }

    pub fn communities(&self) -> &[PartitionId] {
        &self.communities
    }

    /// Assign one community label per hypernode.
    pub fn set_communities(
        &mut self,
        communities: Vec<PartitionId>,
    ) -> Result<(), HypersectionError> {
        if communities.len() != self.hypernodes.len() {
            return Err(HypersectionError::CommunityLabelMismatch {
                got: communities.len(),
                expected: self.hypernodes.len(),
            });
        }
        self.communities = communities;
        Ok(())
    }

    pub fn node_weight(&self, v: HypernodeId) -> HypernodeWeight {
        self.hypernodes[v as usize].weight
    }

    pub fn edge_weight(&self, e: HyperedgeId) -> HyperedgeWeight {
        self.hyperedges[e as usize].weight
    }

    pub fn set_edge_weight(&mut self, e: HyperedgeId, weight: HyperedgeWeight) {
        self.hyperedges[e as usize].weight = weight;
    }

    pub fn edge_hash(&self, e: HyperedgeId) -> u64 {
        self.hyperedges[e as usize].hash
    }

    /// Offset of `e`'s slot in the incidence array; `e == m` yields the
    /// total incidence length.
    pub fn first_entry(&self, e: HyperedgeId) -> usize {
        self.hyperedges[e as usize].first_entry
    }

    /// One past the last enabled pin of `e`.
    pub fn first_invalid_entry(&self, e: HyperedgeId) -> usize {
        let he = &self.hyperedges[e as usize];
        he.first_entry + he.size
    }

    pub fn is_node_enabled(&self, v: HypernodeId) -> bool {
        self.hypernodes[v as usize].enabled
    }

    pub fn is_edge_enabled(&self, e: HyperedgeId) -> bool {
        self.hyperedges[e as usize].enabled
    }

    /// Flip `e` disabled without touching counters or incident-net lists.
    pub fn disable_edge(&mut self, e: HyperedgeId) {
        self.hyperedges[e as usize].enabled = false;
    }

    pub fn enable_edge(&mut self, e: HyperedgeId) {
        self.hyperedges[e as usize].enabled = true;
    }

    /// Shrink the enabled prefix of `e` by one pin.
    pub fn decrement_size(&mut self, e: HyperedgeId) {
        let he = &mut self.hyperedges[e as usize];
        debug_assert!(he.size > 0);
        he.size -= 1;
    }

    /// Contract hypernode `v` into `u` and return the memento.
    ///
    /// For every net of `v`: if `u` is already a pin, `v` is swapped into
    /// the disabled suffix and the net shrinks; otherwise `v`'s slot entry
    /// is rewritten to `u` and `u` inherits the net. `v` keeps its
    /// incident-net list (merge-back reads it) but is disabled.
    pub fn contract(&mut self, u: HypernodeId, v: HypernodeId) -> ContractionMemento {
        assert_ne!(u, v, "cannot contract hypernode {u} with itself");
        assert!(
            self.hypernodes[u as usize].enabled,
            "contraction representative {u} is disabled"
        );
        assert!(
            self.hypernodes[v as usize].enabled,
            "contracted hypernode {v} is disabled"
        );

        let contracted_weight = self.hypernodes[v as usize].weight;
        self.hypernodes[u as usize].weight += contracted_weight;
        let nets = self.hypernodes[v as usize].incident_nets.clone();
        for he in nets {
            let e = he as usize;
            let first = self.hyperedges[e].first_entry;
            let last = first + self.hyperedges[e].size;
            let slot = &self.incidence_array[first..last];
            let pos = first
                + slot
                    .iter()
                    .position(|&p| p == v)
                    .expect("contracted hypernode missing from its incident net");
            if slot.contains(&u) {
                self.incidence_array.swap(pos, last - 1);
                self.hyperedges[e].size -= 1;
                self.hyperedges[e].hash = self.hyperedges[e].hash.wrapping_sub(pin_hash(v));
                self.current_num_pins -= 1;
            } else {
                self.incidence_array[pos] = u;
                self.hyperedges[e].hash = self.hyperedges[e]
                    .hash
                    .wrapping_sub(pin_hash(v))
                    .wrapping_add(pin_hash(u));
                self.hypernodes[u as usize].incident_nets.push(he);
            }
        }
        self.hypernodes[v as usize].enabled = false;
        self.current_num_hypernodes -= 1;
        ContractionMemento { u, v }
    }

    /// Remove a hyperedge during coarsening (single-pin or parallel net):
    /// disable it and adjust the aggregate counters.
    ///
    /// Incident-net lists keep their entry for `e` — merge-back discovers
    /// the disabled state by walking the nets of community hypernodes, and
    /// uncontraction restores the edge in place. Callers enumerating nets
    /// filter with [`Hypergraph::is_edge_enabled`].
    pub fn remove_edge(&mut self, e: HyperedgeId) {
        assert!(
            self.hyperedges[e as usize].enabled,
            "hyperedge {e} is already removed"
        );
        let he = &mut self.hyperedges[e as usize];
        he.enabled = false;
        self.current_num_pins -= he.size;
        self.current_num_hyperedges -= 1;
    }

    pub(crate) fn set_current_stats(&mut self, nodes: usize, edges: usize, pins: usize) {
        self.current_num_hypernodes = nodes;
        self.current_num_hyperedges = edges;
        self.current_num_pins = pins;
    }

    /// Borrow split for merge Phase 1: read-only hyperedge records plus
    /// shared write handles to the incidence array and the hypernode
    /// records.
    pub(crate) fn phase1_views(
        &mut self,
    ) -> (
        &[Hyperedge],
        crate::parallel::SharedSlice<'_, HypernodeId>,
        crate::parallel::SharedSlice<'_, Hypernode>,
    ) {
        let Hypergraph {
            ref hyperedges,
            ref mut incidence_array,
            ref mut hypernodes,
            ..
        } = *self;
        (
            hyperedges,
            crate::parallel::SharedSlice::new(incidence_array),
            crate::parallel::SharedSlice::new(hypernodes),
        )
    }

    /// Borrow split for merge Phase 3: mutable hyperedge records (sentinel
    /// excluded), the mutable incidence array, and read-only hypernodes.
    pub(crate) fn phase3_views(
        &mut self,
    ) -> (&mut [Hyperedge], &mut [HypernodeId], &[Hypernode]) {
        let m = self.hyperedges.len() - 1;
        let Hypergraph {
            ref mut hyperedges,
            ref mut incidence_array,
            ref hypernodes,
            ..
        } = *self;
        (
            &mut hyperedges[..m],
            incidence_array.as_mut_slice(),
            hypernodes.as_slice(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recomputed_hash(hg: &Hypergraph, e: HyperedgeId) -> u64 {
        hg.pins(e)
            .iter()
            .fold(EDGE_HASH_SEED, |h, &pin| h.wrapping_add(pin_hash(pin)))
    }

    fn two_edge_graph() -> Hypergraph {
        // e0 = {0, 1, 2}, e1 = {1, 2, 3}
        Hypergraph::from_adjacency(4, &[0, 3, 6], &[0, 1, 2, 1, 2, 3], None, None).unwrap()
    }

    #[test]
    fn from_adjacency_basic() {
        let hg = two_edge_graph();
        assert_eq!(hg.initial_num_nodes(), 4);
        assert_eq!(hg.initial_num_edges(), 2);
        assert_eq!(hg.current_num_pins(), 6);
        assert_eq!(hg.pins(0), &[0, 1, 2]);
        assert_eq!(hg.pins(1), &[1, 2, 3]);
        assert_eq!(hg.incident_edges(1), &[0, 1]);
        assert_eq!(hg.first_entry(2), 6);
        assert_eq!(hg.first_invalid_entry(1), 6);
        assert_eq!(hg.edge_hash(0), recomputed_hash(&hg, 0));
        assert_eq!(hg.node_weight(3), 1);
        assert_eq!(hg.edge_weight(1), 1);
    }

    #[test]
    fn from_adjacency_rejects_bad_terminator() {
        let err = Hypergraph::from_adjacency(2, &[0, 1], &[0, 1], None, None).unwrap_err();
        assert!(matches!(
            err,
            crate::error::HypersectionError::InvalidAdjacency(_)
        ));
    }

    #[test]
    fn from_adjacency_rejects_out_of_range_pin() {
        let err = Hypergraph::from_adjacency(2, &[0, 2], &[0, 5], None, None).unwrap_err();
        assert!(matches!(
            err,
            crate::error::HypersectionError::PinOutOfRange {
                pin: 5,
                num_hypernodes: 2
            }
        ));
    }

    #[test]
    fn contract_without_shared_net_replaces_pin() {
        let mut hg = two_edge_graph();
        // 3 only pins e1; 0 only pins e0. Contract 3 into 0.
        let memento = hg.contract(0, 3);
        assert_eq!(memento, ContractionMemento { u: 0, v: 3 });
        assert_eq!(hg.pins(1), &[1, 2, 0]);
        assert_eq!(hg.incident_edges(0), &[0, 1]);
        assert!(!hg.is_node_enabled(3));
        assert_eq!(hg.node_weight(0), 2);
        assert_eq!(hg.current_num_nodes(), 3);
        assert_eq!(hg.current_num_pins(), 6);
        assert_eq!(hg.edge_hash(1), recomputed_hash(&hg, 1));
    }

    #[test]
    fn contract_with_shared_net_shrinks_slot() {
        let mut hg = two_edge_graph();
        // 1 and 2 share both nets; 2 moves into both disabled suffixes.
        hg.contract(1, 2);
        assert_eq!(hg.pins(0), &[0, 1]);
        assert_eq!(hg.pins(1), &[1, 3]);
        // Slots keep the contracted pin in their suffix.
        assert_eq!(hg.incidence()[2], 2);
        assert_eq!(hg.incidence()[5], 2);
        assert_eq!(hg.current_num_pins(), 4);
        assert_eq!(hg.node_weight(1), 2);
        assert_eq!(hg.edge_hash(0), recomputed_hash(&hg, 0));
        assert_eq!(hg.edge_hash(1), recomputed_hash(&hg, 1));
    }

    #[test]
    fn remove_edge_disables_and_adjusts_counters() {
        let mut hg = two_edge_graph();
        hg.remove_edge(0);
        assert!(!hg.is_edge_enabled(0));
        assert_eq!(hg.current_num_edges(), 1);
        assert_eq!(hg.current_num_pins(), 3);
        // Incident-net lists keep the entry; callers filter by enabledness.
        assert_eq!(hg.incident_edges(1), &[0, 1]);
    }

    #[test]
    fn enumeration_skips_disabled() {
        let mut hg = two_edge_graph();
        hg.contract(1, 2);
        hg.remove_edge(0);
        assert_eq!(hg.nodes().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(hg.edges().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn community_labels_round_trip() {
        let mut hg = two_edge_graph();
        assert_eq!(hg.community_id(2), 0);
        hg.set_communities(vec![0, 0, 1, 1]).unwrap();
        assert_eq!(hg.community_id(2), 1);
        let err = hg.set_communities(vec![0, 1]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::HypersectionError::CommunityLabelMismatch { got: 2, expected: 4 }
        ));
    }
}
