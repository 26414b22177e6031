//! Reader for the hMETIS `.hgr` hypergraph format.
//!
//! Layout: an optional block of `%` comment lines, then a header
//! `num_hyperedges num_hypernodes [type]`, then one line per hyperedge
//! (an optional weight followed by 1-based pin ids), then one weight line
//! per hypernode if the type carries hypernode weights. Type bit 0 signals
//! hyperedge weights, the tens digit signals hypernode weights.

use std::path::Path;
use std::str::FromStr;

use crate::error::HypersectionError;
use crate::hypergraph::{Hypergraph, HypernodeId, HypernodeWeight, HyperedgeWeight};

fn parse_num<T: FromStr>(
    token: Option<&str>,
    what: &'static str,
    line: usize,
) -> Result<T, HypersectionError> {
    let token = token.ok_or(HypersectionError::MalformedLine {
        what,
        line,
        token: "<missing>".to_string(),
    })?;
    token.parse().map_err(|_| HypersectionError::MalformedLine {
        what,
        line,
        token: token.to_string(),
    })
}

/// Parse a `.hgr` document into a [`Hypergraph`].
pub fn parse_hgr(input: &str) -> Result<Hypergraph, HypersectionError> {
    let mut lines = input.lines().enumerate();

    let (header_line, header) = lines
        .by_ref()
        .find(|(_, line)| !line.trim_start().starts_with('%'))
        .ok_or(HypersectionError::UnexpectedEof("header"))?;
    let line_no = header_line + 1;
    let mut fields = header.split_whitespace();
    let num_hyperedges: usize = parse_num(fields.next(), "hyperedge count", line_no)?;
    let num_hypernodes: usize = parse_num(fields.next(), "hypernode count", line_no)?;
    let hypergraph_type: i64 = match fields.next() {
        Some(token) => parse_num(Some(token), "hypergraph type", line_no)?,
        None => 0,
    };
    if !matches!(hypergraph_type, 0 | 1 | 10 | 11) {
        return Err(HypersectionError::UnsupportedHypergraphType(hypergraph_type));
    }
    let has_edge_weights = hypergraph_type == 1 || hypergraph_type == 11;
    let has_node_weights = hypergraph_type == 10 || hypergraph_type == 11;

    let mut edge_indices = Vec::with_capacity(num_hyperedges + 1);
    edge_indices.push(0);
    let mut pins: Vec<HypernodeId> = Vec::new();
    let mut edge_weights: Vec<HyperedgeWeight> = Vec::with_capacity(num_hyperedges);
    for _ in 0..num_hyperedges {
        let (i, line) = lines
            .next()
            .ok_or(HypersectionError::UnexpectedEof("hyperedge lines"))?;
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();
        if has_edge_weights {
            edge_weights.push(parse_num(tokens.next(), "hyperedge weight", line_no)?);
        }
        for token in tokens {
            let pin: u64 = parse_num(Some(token), "pin id", line_no)?;
            // Pins are 1-based in the file.
            if pin == 0 || pin > num_hypernodes as u64 {
                return Err(HypersectionError::PinOutOfRange {
                    pin,
                    num_hypernodes,
                });
            }
            pins.push((pin - 1) as HypernodeId);
        }
        edge_indices.push(pins.len());
    }

    let mut node_weights: Vec<HypernodeWeight> = Vec::with_capacity(num_hypernodes);
    if has_node_weights {
        for _ in 0..num_hypernodes {
            let (i, line) = lines
                .next()
                .ok_or(HypersectionError::UnexpectedEof("hypernode weight lines"))?;
            node_weights.push(parse_num(
                line.split_whitespace().next(),
                "hypernode weight",
                i + 1,
            )?);
        }
    }

    Hypergraph::from_adjacency(
        num_hypernodes,
        &edge_indices,
        &pins,
        has_edge_weights.then_some(edge_weights.as_slice()),
        has_node_weights.then_some(node_weights.as_slice()),
    )
}

/// Read a `.hgr` file from disk.
pub fn read_hgr<P: AsRef<Path>>(path: P) -> Result<Hypergraph, HypersectionError> {
    let contents = std::fs::read_to_string(path)?;
    parse_hgr(&contents)
}
