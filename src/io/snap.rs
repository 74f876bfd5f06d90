//! SNAP edge lists.
//!
//! A header `n m` is followed by `m` lines `from to`. Labels are arbitrary
//! integers and are renumbered densely in order of first appearance. Lines
//! starting with `#` are comments.

use std::collections::HashMap;
use std::io::BufRead;

use tracing::{debug, instrument};

use super::{parse_token, NumberedLines};
use crate::errors::{FormatError, FormatResult};
use crate::graph::{Graph, NodeId};

#[instrument(level = "debug", skip(reader))]
pub fn read_snap<R: BufRead>(reader: R) -> FormatResult<Graph> {
    let mut lines = NumberedLines::new(reader);
    let header = lines
        .next_content(Some('#'))?
        .ok_or_else(|| FormatError::UnexpectedEof("missing header".to_string()))?;
    let header_line = lines.line_no();
    let mut tokens = header.split_whitespace();
    let node_count: usize = parse_token(tokens.next(), header_line, "node count")?;
    let edge_count: usize = parse_token(tokens.next(), header_line, "edge count")?;

    let mut graph =
        Graph::try_new(node_count).map_err(|e| FormatError::malformed(header_line, e.to_string()))?;
    let mut labels: HashMap<u64, NodeId> = HashMap::new();
    for edge in 0..edge_count {
        let line = lines.next_content(Some('#'))?.ok_or_else(|| {
            FormatError::UnexpectedEof(format!("expected {} edges, found {}", edge_count, edge))
        })?;
        let line_no = lines.line_no();
        let mut tokens = line.split_whitespace();
        let from: u64 = parse_token(tokens.next(), line_no, "from label")?;
        let to: u64 = parse_token(tokens.next(), line_no, "to label")?;

        let mut node_of = |label: u64| -> FormatResult<NodeId> {
            let next = labels.len();
            let node = *labels.entry(label).or_insert(next);
            if node >= node_count {
                return Err(FormatError::malformed(
                    line_no,
                    format!("more than {} distinct labels", node_count),
                ));
            }
            Ok(node)
        };
        let (from, to) = (node_of(from)?, node_of(to)?);
        graph
            .set_edge_weight(from, to, 1)
            .map_err(|e| FormatError::malformed(line_no, e.to_string()))?;
    }
    debug!("read SNAP graph, {} labels seen", labels.len());
    Ok(graph)
}
