use std::io::Write;

use crate::errors::{FormatError, FormatResult};
use crate::graph::Graph;

/// Writes an undirected DOT graph. With a partition, node `v` is filled with
/// color `/spectral9/<partition[v] + 1>`.
pub fn write_graphviz<W: Write>(writer: &mut W, graph: &Graph, partition: Option<&[usize]>) -> FormatResult<()> {
    if let Some(parts) = partition {
        if parts.len() != graph.node_count() {
            return Err(FormatError::Unsupported(format!(
                "partition covers {} nodes, graph has {}",
                parts.len(),
                graph.node_count()
            )));
        }
    }

    writeln!(writer, "graph G {{")?;
    for node in 0..graph.node_count() {
        let weight = graph
            .node_weight(node)
            .map_err(|e| FormatError::Unsupported(e.to_string()))?;
        write!(writer, "\t{}[label=\"id: {}, w: {}\"", node, node, weight)?;
        if let Some(parts) = partition {
            write!(writer, ", style=filled, color=\"/spectral9/{}\"", parts[node] + 1)?;
        }
        writeln!(writer, "];")?;
        for (neighbor, edge_weight) in graph.neighbors(node).filter(|&(n, _)| n > node) {
            writeln!(writer, "\t{} -- {}[label=\"{}\"];", node, neighbor, edge_weight)?;
        }
    }
    writeln!(writer, "}}")?;
    Ok(())
}
