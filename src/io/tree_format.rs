//! Plain-text tree format.
//!
//! ```text
//! <node_count> <root_id>
//! <from_id> <to_id> <weight>
//! ...
//! ```

use std::io::{BufRead, Write};

use tracing::{debug, instrument};

use super::{parse_token, NumberedLines};
use crate::arena::RootedTree;
use crate::errors::{FormatError, FormatResult};
use crate::graph::{Graph, NodeId, Weight};

/// A tree read from a file, with the root its header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub graph: Graph,
    pub root: NodeId,
}

/// Reads a tree. With `one_indexed` the ids in the file start at 1.
#[instrument(level = "debug", skip(reader))]
pub fn read_tree<R: BufRead>(reader: R, one_indexed: bool) -> FormatResult<TreeFile> {
    let mut lines = NumberedLines::new(reader);
    let header = lines
        .next_content(None)?
        .ok_or_else(|| FormatError::UnexpectedEof("missing header".to_string()))?;
    let header_line = lines.line_no();
    let mut tokens = header.split_whitespace();
    let node_count: usize = parse_token(tokens.next(), header_line, "node count")?;
    let root = to_zero_based(parse_token(tokens.next(), header_line, "root id")?, one_indexed, header_line)?;
    if node_count == 0 {
        return Err(FormatError::malformed(header_line, "node count must be at least 1"));
    }
    if root >= node_count {
        return Err(FormatError::malformed(
            header_line,
            format!("root {} outside 0..{}", root, node_count),
        ));
    }

    let mut graph =
        Graph::try_new(node_count).map_err(|e| FormatError::malformed(header_line, e.to_string()))?;
    for edge in 0..node_count - 1 {
        let line = lines.next_content(None)?.ok_or_else(|| {
            FormatError::UnexpectedEof(format!("expected {} edges, found {}", node_count - 1, edge))
        })?;
        let line_no = lines.line_no();
        let mut tokens = line.split_whitespace();
        let from = to_zero_based(parse_token(tokens.next(), line_no, "from id")?, one_indexed, line_no)?;
        let to = to_zero_based(parse_token(tokens.next(), line_no, "to id")?, one_indexed, line_no)?;
        let weight: Weight = parse_token(tokens.next(), line_no, "weight")?;

        if graph.has_edge(from, to) {
            return Err(FormatError::malformed(line_no, format!("duplicate edge {} {}", from, to)));
        }
        graph
            .set_edge_weight(from, to, weight)
            .map_err(|e| FormatError::malformed(line_no, e.to_string()))?;
    }

    if !graph.is_connected() {
        return Err(FormatError::malformed(lines.line_no(), "edges do not form a tree"));
    }
    debug!("read tree with {} nodes rooted at {}", node_count, root);
    Ok(TreeFile { graph, root })
}

fn to_zero_based(id: usize, one_indexed: bool, line: usize) -> FormatResult<usize> {
    if !one_indexed {
        return Ok(id);
    }
    id.checked_sub(1)
        .ok_or_else(|| FormatError::malformed(line, "id 0 in a one-indexed file"))
}

/// Writes the tree with edges grouped by parent, both in ascending order.
pub fn write_tree<W: Write>(writer: &mut W, tree: &RootedTree) -> FormatResult<()> {
    let root = tree
        .root_id()
        .ok_or_else(|| FormatError::Unsupported("cannot write an empty tree".to_string()))?;
    let mut edges = tree.edges();
    edges.sort_unstable_by_key(|&(parent, child, _)| (parent, child));

    writeln!(writer, "{} {}", tree.len(), root)?;
    for (parent, child, weight) in edges {
        writeln!(writer, "{} {} {}", parent, child, weight)?;
    }
    Ok(())
}
