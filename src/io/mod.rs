//! Graph file formats.

use std::io::BufRead;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::errors::{FormatError, FormatResult};
use crate::graph::Graph;

pub mod graphviz;
pub mod metis;
pub mod snap;
pub mod tree_format;

pub use graphviz::write_graphviz;
pub use metis::{read_metis, write_metis};
pub use snap::read_snap;
pub use tree_format::{read_tree, write_tree, TreeFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// `<n> <root>` header followed by `from to weight` lines
    Tree,
    /// METIS graph file
    Metis,
    /// SNAP edge list
    Snap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Tree,
    Metis,
    Graphviz,
}

/// Reads a graph in `format`; the root of a tree file is dropped.
#[instrument(level = "debug", skip(reader))]
pub fn read_graph<R: BufRead>(reader: R, format: InputFormat, one_indexed: bool) -> FormatResult<Graph> {
    match format {
        InputFormat::Tree => read_tree(reader, one_indexed).map(|file| file.graph),
        InputFormat::Metis => read_metis(reader),
        InputFormat::Snap => read_snap(reader),
    }
}

/// Line reader that tracks 1-based line numbers for error messages.
pub(crate) struct NumberedLines<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> NumberedLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }

    /// Next line, including blank ones.
    pub(crate) fn next_raw(&mut self) -> FormatResult<Option<String>> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    /// Next line that is neither blank nor starts with `comment`.
    pub(crate) fn next_content(&mut self, comment: Option<char>) -> FormatResult<Option<String>> {
        while let Some(line) = self.next_raw()? {
            let trimmed = line.trim();
            if trimmed.is_empty() || comment.is_some_and(|c| trimmed.starts_with(c)) {
                continue;
            }
            return Ok(Some(line));
        }
        Ok(None)
    }
}

/// Parses one whitespace-separated token.
pub(crate) fn parse_token<T: FromStr>(token: Option<&str>, line: usize, what: &str) -> FormatResult<T> {
    let token = token.ok_or_else(|| FormatError::malformed(line, format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| FormatError::malformed(line, format!("invalid {} '{}'", what, token)))
}
