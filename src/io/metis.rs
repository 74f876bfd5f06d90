//! METIS graph format.
//!
//! Header `n m [fmt [ncon]]`, then one line per node with an optional node
//! weight followed by 1-based neighbor ids, each with an optional edge weight.
//! Lines starting with `%` are comments.

use std::io::{BufRead, Write};

use tracing::{debug, instrument};

use super::{parse_token, NumberedLines};
use crate::errors::{FormatError, FormatResult};
use crate::graph::{Graph, NodeId, Weight};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Fmt {
    node_weights: bool,
    edge_weights: bool,
}

fn parse_fmt(token: &str, line: usize) -> FormatResult<Fmt> {
    if token.len() > 3 || !token.chars().all(|c| c == '0' || c == '1') {
        return Err(FormatError::malformed(line, format!("invalid fmt '{}'", token)));
    }
    let padded = format!("{:0>3}", token);
    let flags: Vec<bool> = padded.chars().map(|c| c == '1').collect();
    if flags[0] {
        return Err(FormatError::Unsupported("node sizes".to_string()));
    }
    Ok(Fmt {
        node_weights: flags[1],
        edge_weights: flags[2],
    })
}

#[instrument(level = "debug", skip(reader))]
pub fn read_metis<R: BufRead>(reader: R) -> FormatResult<Graph> {
    let mut lines = NumberedLines::new(reader);
    let header = lines
        .next_content(Some('%'))?
        .ok_or_else(|| FormatError::UnexpectedEof("missing header".to_string()))?;
    let header_line = lines.line_no();
    let mut tokens = header.split_whitespace();
    let node_count: usize = parse_token(tokens.next(), header_line, "node count")?;
    let edge_count: usize = parse_token(tokens.next(), header_line, "edge count")?;
    let fmt = match tokens.next() {
        Some(token) => parse_fmt(token, header_line)?,
        None => Fmt::default(),
    };
    if let Some(token) = tokens.next() {
        let ncon: usize = parse_token(Some(token), header_line, "ncon")?;
        if ncon != 1 {
            return Err(FormatError::Unsupported(format!("{} node weights per node", ncon)));
        }
    }

    let mut graph =
        Graph::try_new(node_count).map_err(|e| FormatError::malformed(header_line, e.to_string()))?;
    let mut node: NodeId = 0;
    while node < node_count {
        let line = lines.next_raw()?.ok_or_else(|| {
            FormatError::UnexpectedEof(format!("expected {} node lines, found {}", node_count, node))
        })?;
        if line.trim_start().starts_with('%') {
            continue;
        }
        let line_no = lines.line_no();
        let mut tokens = line.split_whitespace();

        if fmt.node_weights {
            let weight: Weight = parse_token(tokens.next(), line_no, "node weight")?;
            graph
                .set_node_weight(node, weight)
                .map_err(|e| FormatError::malformed(line_no, e.to_string()))?;
        }

        while let Some(token) = tokens.next() {
            let neighbor: usize = parse_token(Some(token), line_no, "neighbor id")?;
            if neighbor == 0 || neighbor > node_count {
                return Err(FormatError::malformed(
                    line_no,
                    format!("neighbor {} outside 1..={}", neighbor, node_count),
                ));
            }
            let neighbor = neighbor - 1;
            let weight: Weight = if fmt.edge_weights {
                parse_token(tokens.next(), line_no, "edge weight")?
            } else {
                1
            };
            match graph.edge_weight(node, neighbor) {
                Some(existing) if existing != weight => {
                    return Err(FormatError::malformed(
                        line_no,
                        format!(
                            "edge {} {} has weights {} and {}",
                            node + 1,
                            neighbor + 1,
                            existing,
                            weight
                        ),
                    ));
                }
                _ => graph
                    .set_edge_weight(node, neighbor, weight)
                    .map_err(|e| FormatError::malformed(line_no, e.to_string()))?,
            }
        }
        node += 1;
    }

    if graph.edge_count() != edge_count {
        return Err(FormatError::malformed(
            header_line,
            format!("header declares {} edges, found {}", edge_count, graph.edge_count()),
        ));
    }
    debug!("read METIS graph with {} nodes, {} edges", node_count, edge_count);
    Ok(graph)
}

/// Writes node and edge weights (`fmt = 011`).
pub fn write_metis<W: Write>(writer: &mut W, graph: &Graph) -> FormatResult<()> {
    writeln!(writer, "{} {} 011", graph.node_count(), graph.edge_count())?;
    for node in 0..graph.node_count() {
        let weight = graph
            .node_weight(node)
            .map_err(|e| FormatError::Unsupported(e.to_string()))?;
        write!(writer, "{}", weight)?;
        for (neighbor, edge_weight) in graph.neighbors(node) {
            write!(writer, " {} {}", neighbor + 1, edge_weight)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_unweighted() {
        let input = "% triangle\n3 3\n2 3\n1 3\n1 2\n";
        let graph = read_metis(input.as_bytes()).unwrap();
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edge_weight(0, 2), Some(1));
    }

    #[test]
    fn test_read_weighted_with_isolated_node() {
        let input = "3 1 011\n4 2 7\n2 1 7\n1\n";
        let graph = read_metis(input.as_bytes()).unwrap();
        assert_eq!(graph.node_weight(0).unwrap(), 4);
        assert_eq!(graph.node_weight(1).unwrap(), 2);
        assert_eq!(graph.edge_weight(0, 1), Some(7));
        assert_eq!(graph.degree(2), 0);
    }

    #[test]
    fn test_blank_line_is_isolated_node() {
        let graph = read_metis("3 1\n2\n1\n\n".as_bytes()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.degree(2), 0);
    }

    #[test]
    fn test_short_fmt_is_left_padded() {
        let graph = read_metis("2 1 1\n2 9\n1 9\n".as_bytes()).unwrap();
        assert_eq!(graph.edge_weight(0, 1), Some(9));
    }

    #[test]
    fn test_node_sizes_unsupported() {
        let err = read_metis("2 1 100\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::Unsupported(_)));
    }

    #[test]
    fn test_multiple_constraints_unsupported() {
        let err = read_metis("2 1 010 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::Unsupported(_)));
    }

    #[test]
    fn test_edge_count_mismatch() {
        let err = read_metis("2 2\n2\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_missing_edge_weight_reports_line() {
        let err = read_metis("2 1 001\n2\n1 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_write_then_read_preserves_weights() {
        let mut graph = Graph::new(3);
        graph.set_node_weight(1, 5).unwrap();
        graph.set_edge_weight(0, 1, 3).unwrap();
        graph.set_edge_weight(1, 2, 8).unwrap();

        let mut out = Vec::new();
        write_metis(&mut out, &graph).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "3 2 011\n1 2 3\n5 1 3 3 8\n1 2 8\n");
        assert_eq!(read_metis(text.as_bytes()).unwrap(), graph);
    }
}
