//! Partitioning experiments: every try is partitioned independently on the
//! rayon pool, and reports come back in try order.

use std::io::Write;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::arena::RootedTree;
use crate::cli::args::{GeneratorKind, GeneratorOptions, OutputKind, OutputMod};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::generate::{
    GraphEdgeProb, GraphGenerator, GraphPrefAttach, TreeFat, TreePrefAttach, TreeRandAttach, WeightRanges,
};
use crate::graph::{Graph, SpanningTree};
use crate::io::{write_graphviz, write_metis, write_tree};
use crate::partition::{partition_graph, Partition};
use crate::rational::Rational;

/// Builds the generator `kind` for `node_count` nodes.
pub fn build_generator(
    kind: GeneratorKind,
    node_count: usize,
    options: &GeneratorOptions,
    weights: WeightRanges,
) -> CliResult<Box<dyn GraphGenerator>> {
    let max_degree = options.max_degree.unwrap_or(usize::MAX);
    let generator: Box<dyn GraphGenerator> = match kind {
        GeneratorKind::TreeRandAttach => Box::new(
            TreeRandAttach::new(node_count)
                .with_max_degree(max_degree)
                .with_weights(weights),
        ),
        GeneratorKind::TreePrefAttach => Box::new(
            TreePrefAttach::new(node_count)
                .with_max_degree(max_degree)
                .with_weights(weights),
        ),
        GeneratorKind::TreeFat => {
            let (Some(min), Some(max)) = (options.min_child, options.max_child) else {
                return Err(CliError::Usage(
                    "tree-fat needs --min-child and --max-child".to_string(),
                ));
            };
            Box::new(TreeFat::new(node_count, min..=max).with_weights(weights))
        }
        GeneratorKind::GraphPrefAttach => {
            let Some(per_node) = options.edges_per_node else {
                return Err(CliError::Usage(
                    "graph-pref-attach needs --edges-per-node".to_string(),
                ));
            };
            Box::new(
                GraphPrefAttach::new(node_count, node_count.saturating_mul(per_node))
                    .with_max_degree(max_degree)
                    .with_weights(weights),
            )
        }
        GeneratorKind::GraphEdgeProb => {
            let Some(edge_prob) = options.edge_prob else {
                return Err(CliError::Usage("graph-edge-prob needs --edge-prob".to_string()));
            };
            Box::new(GraphEdgeProb::new(node_count, edge_prob).with_weights(weights))
        }
    };
    Ok(generator)
}

/// One unit of work for the runner.
#[derive(Debug)]
pub enum Job {
    /// Draw a graph from a generator
    Generate {
        kind: GeneratorKind,
        node_count: usize,
        seed: u64,
    },
    /// Partition a graph along one of its spanning trees
    Graph { label: String, graph: Graph, seed: u64 },
    /// Partition a graph along a given spanning tree; node weights come from the graph
    Tree {
        label: String,
        graph: Graph,
        tree: Graph,
        root: usize,
    },
}

/// Outcome of one try.
#[derive(Debug)]
pub struct TryReport {
    pub label: String,
    pub graph: Graph,
    /// Spanning tree that was partitioned, as a graph and rooted
    pub tree_graph: Graph,
    pub tree: RootedTree,
    pub partition: Partition,
    pub elapsed: Duration,
}

/// Parameters shared by every try.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub part_cnt: usize,
    pub eps: Rational,
    pub prep: SpanningTree,
    pub weights: WeightRanges,
    pub options: GeneratorOptions,
}

impl Experiment {
    /// Spanning tree of `graph`; a tree is its own spanning tree.
    fn spanning_tree(&self, graph: &Graph, seed: u64) -> CliResult<Graph> {
        if graph.is_tree() {
            return Ok(graph.clone());
        }
        debug!("graph is not a tree, using {} spanning tree", self.prep);
        Ok(graph.spanning_tree(self.prep, seed)?)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn run_job(&self, job: Job) -> CliResult<TryReport> {
        let (label, graph, tree_graph, root) = match job {
            Job::Generate {
                kind,
                node_count,
                seed,
            } => {
                let generator = build_generator(kind, node_count, &self.options, self.weights.clone())?;
                let graph = generator.generate(seed)?;
                let tree_graph = self.spanning_tree(&graph, seed)?;
                (format!("{} n={} seed={}", kind, node_count, seed), graph, tree_graph, 0)
            }
            Job::Graph { label, graph, seed } => {
                let tree_graph = self.spanning_tree(&graph, seed)?;
                (label, graph, tree_graph, 0)
            }
            Job::Tree {
                label,
                graph,
                mut tree,
                root,
            } => {
                for node in 0..tree.node_count().min(graph.node_count()) {
                    tree.set_node_weight(node, graph.node_weight(node)?)?;
                }
                (label, graph, tree, root)
            }
        };

        let tree = tree_graph.root_at(root)?;
        let start = Instant::now();
        let partition = partition_graph(&graph, &tree, self.part_cnt, &self.eps)?;
        let elapsed = start.elapsed();
        info!(
            "{}: cut cost {} in {:.3} ms",
            label,
            partition.cut_cost,
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(TryReport {
            label,
            graph,
            tree_graph,
            tree,
            partition,
            elapsed,
        })
    }

    /// Runs all jobs on a pool of `threads` workers (0: one per core).
    /// Results keep the order of `jobs`.
    pub fn run_all(&self, jobs: Vec<Job>, threads: usize) -> CliResult<Vec<CliResult<TryReport>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))?;
        debug!("running {} tries on {} threads", jobs.len(), pool.current_num_threads());
        Ok(pool.install(|| jobs.into_par_iter().map(|job| self.run_job(job)).collect()))
    }
}

/// Writes the requested outputs of one try.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &TryReport,
    outputs: &[OutputKind],
    output_mod: OutputMod,
) -> CliResult<()> {
    for output in outputs {
        match output {
            OutputKind::Part => {
                for part in &report.partition.assignment {
                    writeln!(out, "{}", part)?;
                }
                writeln!(out)?;
            }
            OutputKind::CutCost => writeln!(out, "{}", report.partition.cut_cost)?,
            OutputKind::Time => writeln!(out, "{:.3}", report.elapsed.as_secs_f64() * 1000.0)?,
            OutputKind::Graph => {
                if output_mod.shows_graph() {
                    write_metis(out, &report.graph)?;
                    writeln!(out)?;
                }
                if output_mod.shows_tree() {
                    write_tree(out, &report.tree)?;
                    writeln!(out)?;
                }
            }
            OutputKind::Graphviz | OutputKind::GraphvizPart => {
                let parts = (*output == OutputKind::GraphvizPart).then_some(report.partition.assignment.as_slice());
                if output_mod.shows_graph() {
                    write_graphviz(out, &report.graph, parts)?;
                    writeln!(out)?;
                }
                if output_mod.shows_tree() {
                    write_graphviz(out, &report.tree_graph, parts)?;
                    writeln!(out)?;
                }
            }
        }
    }
    Ok(())
}

/// Writes every successful try in order and returns the first failure.
///
/// Later failures are only reported as warnings.
pub fn write_reports<W: Write>(
    out: &mut W,
    reports: Vec<CliResult<TryReport>>,
    outputs: &[OutputKind],
    output_mod: OutputMod,
) -> CliResult<()> {
    let mut first_error = None;
    for report in reports {
        match report {
            Ok(report) => write_report(out, &report, outputs, output_mod)?,
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => output::warning(&e),
        }
    }
    out.flush()?;
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
