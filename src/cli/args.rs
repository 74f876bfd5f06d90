//! CLI argument definitions using clap

use std::fmt;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::graph::{SpanningTree, Weight};
use crate::io::{InputFormat, OutputFormat};

/// Balanced tree partitioning: generate graphs, cut spanning trees into k parts, run experiments
#[derive(Parser, Debug)]
#[command(name = "treepart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding the local .treepart.toml (default: cwd)
    #[arg(short = 'C', long, global = true, env = "TREEPART_CONFIG_DIR", value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a random tree or graph
    Gen(GenArgs),

    /// Partition generated graphs or graph files
    Partition(PartitionArgs),

    /// Print the component size bounds for n nodes and k parts
    Bounds {
        /// Node count
        #[arg(short, long)]
        nodes: usize,
        /// Number of parts (default: config kparts)
        #[arg(short, long)]
        kparts: Option<usize>,
        /// Imbalance as a/b, integer or decimal (default: config imbalance)
        #[arg(short, long)]
        imbalance: Option<String>,
    },

    /// Convert a graph between file formats
    Convert {
        /// Input file, - for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Input format
        #[arg(long, value_enum, default_value_t = InputFormat::Metis)]
        from: InputFormat,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Metis)]
        to: OutputFormat,
        /// Node ids in tree files start at 1
        #[arg(long)]
        one_indexed: bool,
    },

    /// Print a tree file as a text tree
    Show {
        /// Tree file, - for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node ids start at 1
        #[arg(long)]
        one_indexed: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorKind {
    /// Tree, each node attaches to a uniformly chosen earlier node
    TreeRandAttach,
    /// Tree, parents drawn proportionally to degree
    TreePrefAttach,
    /// Level-wise tree with a random child count per level
    TreeFat,
    /// Graph, endpoints drawn proportionally to degree
    GraphPrefAttach,
    /// Erdős–Rényi graph
    GraphEdgeProb,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Generator parameters shared by `gen` and `partition`.
#[derive(Args, Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Maximum node degree (tree-rand-attach, tree-pref-attach, graph-pref-attach)
    #[arg(long)]
    pub max_degree: Option<usize>,

    /// Minimum child count per level (tree-fat)
    #[arg(long, requires = "max_child")]
    pub min_child: Option<usize>,

    /// Maximum child count per level (tree-fat)
    #[arg(long, requires = "min_child")]
    pub max_child: Option<usize>,

    /// Edges per node (graph-pref-attach)
    #[arg(short, long)]
    pub edges_per_node: Option<usize>,

    /// Edge probability (graph-edge-prob)
    #[arg(long)]
    pub edge_prob: Option<f64>,

    /// Smallest generated edge weight
    #[arg(long)]
    pub edge_weight_min: Option<Weight>,

    /// Largest generated edge weight
    #[arg(long)]
    pub edge_weight_max: Option<Weight>,

    /// Smallest generated node weight
    #[arg(long)]
    pub node_weight_min: Option<Weight>,

    /// Largest generated node weight
    #[arg(long)]
    pub node_weight_max: Option<Weight>,
}

#[derive(Args, Debug, Clone)]
pub struct GenArgs {
    /// Number of nodes
    pub nodes: usize,

    /// Generator to use
    #[arg(short, long, value_enum, default_value_t = GeneratorKind::TreeRandAttach)]
    pub generator: GeneratorKind,

    /// Seed (default: config seed)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub options: GeneratorOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// Part of every node, one per line
    Part,
    /// Cut cost on the graph
    CutCost,
    /// Partitioning time in milliseconds
    Time,
    /// Input graph (METIS) and/or spanning tree (tree format)
    Graph,
    /// Input graph and/or spanning tree as Graphviz
    Graphviz,
    /// Graphviz colored by part
    GraphvizPart,
}

/// Which graph the graph outputs show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputMod {
    /// The input graph
    #[default]
    Graph,
    /// The spanning tree that was partitioned
    Tree,
    Both,
}

impl OutputMod {
    pub fn shows_graph(self) -> bool {
        self != OutputMod::Tree
    }

    pub fn shows_tree(self) -> bool {
        self != OutputMod::Graph
    }
}

#[derive(Args, Debug, Clone)]
pub struct PartitionArgs {
    /// Generators to draw graphs from
    #[arg(short, long, value_enum, num_args = 1.., value_delimiter = ',')]
    pub generator: Vec<GeneratorKind>,

    /// Node counts for the generators
    #[arg(short, long, num_args = 1.., value_delimiter = ',', requires = "generator")]
    pub nodes: Vec<usize>,

    /// Tries per generator and node count, and per input file or file pair
    #[arg(short, long, default_value_t = 1)]
    pub tries: usize,

    /// Initial seed; try i uses seed + i (default: config seed)
    #[arg(short, long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub options: GeneratorOptions,

    /// Graph file, - for stdin
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub file: Vec<PathBuf>,

    /// Tree file; each one pairs with the --graph-file at the same position
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub tree_file: Vec<PathBuf>,

    /// Graph file partitioned along the matching --tree-file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub graph_file: Vec<PathBuf>,

    /// Format of --file and --graph-file inputs
    #[arg(long, value_enum, default_value_t = InputFormat::Metis)]
    pub input_format: InputFormat,

    /// Node ids in tree files start at 1
    #[arg(long)]
    pub one_indexed: bool,

    /// Number of parts (default: config kparts)
    #[arg(short, long)]
    pub kparts: Option<usize>,

    /// Imbalance as a/b, integer or decimal (default: config imbalance)
    #[arg(short, long)]
    pub imbalance: Option<String>,

    /// Spanning tree for graphs that are not trees (default: config prep)
    #[arg(short, long, value_enum)]
    pub prep: Option<SpanningTree>,

    /// Data to print for every try
    #[arg(short, long, value_enum, num_args = 1.., value_delimiter = ',', default_value = "cut-cost")]
    pub output: Vec<OutputKind>,

    /// Graph shown by the graph outputs
    #[arg(long, value_enum, default_value_t = OutputMod::Graph)]
    pub output_mod: OutputMod,

    /// Worker threads for parallel tries, 0 for one per core (default: config threads)
    #[arg(long)]
    pub threads: Option<usize>,
}
