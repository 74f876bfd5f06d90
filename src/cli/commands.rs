//! Command dispatch

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, GenArgs, GeneratorOptions, PartitionArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::runner::{build_generator, write_reports, Experiment, Job};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::cut::{lower_component_size_bounds, upper_component_size_bounds};
use crate::errors::FormatError;
use crate::generate::WeightRanges;
use crate::graph::Graph;
use crate::io::{read_graph, read_tree, write_graphviz, write_metis, write_tree, InputFormat, OutputFormat, TreeFile};
use crate::partition::part_capacity;
use crate::rational::{self, Rational};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let settings = Settings::load(Some(&config_dir))?;
    debug!("settings: {:?}", settings);

    match command {
        Commands::Gen(args) => cmd_gen(args, &settings),
        Commands::Partition(args) => cmd_partition(args, &settings),
        Commands::Bounds {
            nodes,
            kparts,
            imbalance,
        } => cmd_bounds(*nodes, kparts.unwrap_or(settings.kparts), imbalance.as_deref(), &settings),
        Commands::Convert {
            file,
            from,
            to,
            one_indexed,
        } => cmd_convert(file, *from, *to, *one_indexed),
        Commands::Show { file, one_indexed } => cmd_show(file, *one_indexed),
        Commands::Config { command } => cmd_config(command, &settings, &config_dir),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Opens `path` for reading; `-` is stdin.
fn open_input(path: &Path) -> CliResult<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

fn with_path(path: &Path) -> impl FnOnce(FormatError) -> CliError + '_ {
    move |source| CliError::Input {
        path: path.to_path_buf(),
        source,
    }
}

fn read_graph_file(path: &Path, format: InputFormat, one_indexed: bool) -> CliResult<Graph> {
    read_graph(open_input(path)?, format, one_indexed).map_err(with_path(path))
}

fn read_tree_file(path: &Path, one_indexed: bool) -> CliResult<TreeFile> {
    read_tree(open_input(path)?, one_indexed).map_err(with_path(path))
}

fn imbalance_of(flag: Option<&str>, settings: &Settings) -> CliResult<Rational> {
    match flag {
        Some(text) => Ok(rational::parse(text)?),
        None => Ok(settings.imbalance_ratio()?),
    }
}

/// Config weight ranges with command line overrides.
fn weight_ranges(settings: &Settings, options: &GeneratorOptions) -> WeightRanges {
    let defaults = settings.weight_ranges();
    WeightRanges {
        node: options.node_weight_min.unwrap_or(*defaults.node.start())
            ..=options.node_weight_max.unwrap_or(*defaults.node.end()),
        edge: options.edge_weight_min.unwrap_or(*defaults.edge.start())
            ..=options.edge_weight_max.unwrap_or(*defaults.edge.end()),
    }
}

fn write_graph<W: Write>(out: &mut W, graph: &Graph, root: usize, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Tree => {
            if !graph.is_tree() {
                return Err(CliError::Usage(
                    "graph is not a tree, pick --format metis or graphviz".to_string(),
                ));
            }
            write_tree(out, &graph.root_at(root)?)?
        }
        OutputFormat::Metis => write_metis(out, graph)?,
        OutputFormat::Graphviz => write_graphviz(out, graph, None)?,
    }
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_gen(args: &GenArgs, settings: &Settings) -> CliResult<()> {
    let seed = args.seed.unwrap_or(settings.seed);
    let weights = weight_ranges(settings, &args.options);
    let generator = build_generator(args.generator, args.nodes, &args.options, weights)?;
    let graph = generator.generate(seed)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_graph(&mut out, &graph, 0, args.format)?;
    out.flush()?;
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_partition(args: &PartitionArgs, settings: &Settings) -> CliResult<()> {
    if args.generator.is_empty() && args.file.is_empty() && args.tree_file.is_empty() {
        return Err(CliError::Usage(
            "graph generator or input file required".to_string(),
        ));
    }
    if !args.generator.is_empty() && args.nodes.is_empty() {
        return Err(CliError::Usage("--generator needs --nodes".to_string()));
    }
    if args.tree_file.len() != args.graph_file.len() {
        return Err(CliError::Usage(format!(
            "{} tree files but {} graph files",
            args.tree_file.len(),
            args.graph_file.len()
        )));
    }
    if args.tries == 0 {
        return Err(CliError::Usage("--tries must be at least 1".to_string()));
    }

    let jobs = partition_jobs(args, args.seed.unwrap_or(settings.seed))?;
    let experiment = Experiment {
        part_cnt: args.kparts.unwrap_or(settings.kparts),
        eps: imbalance_of(args.imbalance.as_deref(), settings)?,
        prep: args.prep.unwrap_or(settings.prep),
        weights: weight_ranges(settings, &args.options),
        options: args.options.clone(),
    };
    let reports = experiment.run_all(jobs, args.threads.unwrap_or(settings.threads))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_reports(&mut out, reports, &args.output, args.output_mod)
}

/// One job per input and try; try `t` uses seed `seed + t`.
pub fn partition_jobs(args: &PartitionArgs, seed: u64) -> CliResult<Vec<Job>> {
    let seeds = || (0..args.tries as u64).map(move |t| seed.wrapping_add(t));
    let mut jobs = Vec::new();

    for (kind, &node_count) in args.generator.iter().cartesian_product(&args.nodes) {
        jobs.extend(seeds().map(|seed| Job::Generate {
            kind: *kind,
            node_count,
            seed,
        }));
    }
    for path in &args.file {
        let graph = read_graph_file(path, args.input_format, args.one_indexed)?;
        jobs.extend(seeds().map(|seed| Job::Graph {
            label: format!("{} seed={}", path.display(), seed),
            graph: graph.clone(),
            seed,
        }));
    }
    for (tree_path, graph_path) in args.tree_file.iter().zip(&args.graph_file) {
        let tree = read_tree_file(tree_path, args.one_indexed)?;
        let graph = read_graph_file(graph_path, args.input_format, args.one_indexed)?;
        jobs.extend(seeds().map(|seed| Job::Tree {
            label: format!("{} along {} seed={}", graph_path.display(), tree_path.display(), seed),
            graph: graph.clone(),
            tree: tree.graph.clone(),
            root: tree.root,
        }));
    }
    debug!("{} partition jobs", jobs.len());
    Ok(jobs)
}

fn cmd_bounds(nodes: usize, kparts: usize, imbalance: Option<&str>, settings: &Settings) -> CliResult<()> {
    let eps = imbalance_of(imbalance, settings)?;
    let upper = upper_component_size_bounds(&eps, nodes, kparts)?;
    let lower = lower_component_size_bounds(&eps, nodes, kparts)?;
    let capacity = part_capacity(&eps, nodes, kparts)?;

    output::header(&format!(
        "n={} k={} eps={}",
        nodes,
        kparts,
        rational::display(&eps)
    ));
    output::action("upper", &upper.iter().join(" "));
    output::action("lower", &lower.iter().join(" "));
    for (class, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
        output::detail(&format!("class {}: [{}, {})", class, lo, hi));
    }
    output::action("part capacity", &capacity);
    Ok(())
}

#[instrument]
fn cmd_convert(file: &Path, from: InputFormat, to: OutputFormat, one_indexed: bool) -> CliResult<()> {
    let (graph, root) = match from {
        InputFormat::Tree => {
            let tree = read_tree_file(file, one_indexed)?;
            (tree.graph, tree.root)
        }
        _ => (read_graph_file(file, from, one_indexed)?, 0),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_graph(&mut out, &graph, root, to)?;
    out.flush()?;
    Ok(())
}

#[instrument]
fn cmd_show(file: &Path, one_indexed: bool) -> CliResult<()> {
    let tree = read_tree_file(file, one_indexed)?;
    let rooted = tree.graph.root_at(tree.root)?;
    print!("{}", rooted.to_tree_string());
    Ok(())
}

fn cmd_config(command: &ConfigCommands, settings: &Settings, config_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::header("# effective configuration");
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let global = global_config_path();
            let local = local_config_path(config_dir);
            match &global {
                Some(path) => output::action("global", &describe_path(path)),
                None => output::action("global", &"<no config directory>"),
            }
            output::action("local", &describe_path(&local));
            Ok(())
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path()
                    .ok_or_else(|| CliError::Usage("no global config directory on this system".to_string()))?
            } else {
                local_config_path(config_dir)
            };
            init_config(&path, *force)?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
    }
}

fn describe_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (missing)", path.display())
    }
}

/// Writes the config template to `path`.
pub fn init_config(path: &Path, force: bool) -> CliResult<PathBuf> {
    if path.exists() && !force {
        return Err(CliError::Usage(format!(
            "{} already exists, use --force to overwrite",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Settings::template())?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_weight_overrides_replace_config_bounds() {
        let options = GeneratorOptions {
            edge_weight_max: Some(5),
            node_weight_min: Some(2),
            node_weight_max: Some(3),
            ..Default::default()
        };
        let ranges = weight_ranges(&Settings::default(), &options);
        assert_eq!(ranges.edge, 1..=5);
        assert_eq!(ranges.node, 2..=3);
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = local_config_path(dir.path());

        init_config(&path, false).unwrap();
        assert!(matches!(init_config(&path, false), Err(CliError::Usage(_))));
        assert!(init_config(&path, true).is_ok());

        let settings = Settings::load_from(None, Some(&path)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_missing_input_maps_to_open_error() {
        let err = read_graph_file(Path::new("/nonexistent/graph.metis"), InputFormat::Metis, false).unwrap_err();
        assert!(matches!(err, CliError::Open { .. }));
    }

    #[test]
    fn test_non_tree_cannot_be_written_as_tree() {
        let mut graph = Graph::new(3);
        graph.set_edge_weight(0, 1, 1).unwrap();
        graph.set_edge_weight(1, 2, 1).unwrap();
        graph.set_edge_weight(0, 2, 1).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            write_graph(&mut out, &graph, 0, OutputFormat::Tree),
            Err(CliError::Usage(_))
        ));
    }
}
