//! Integration tests for command line parsing and command execution.

use std::fs;

use clap::{CommandFactory, Parser};
use rstest::rstest;
use tempfile::TempDir;

use treepart::cli::args::{ConfigCommands, GeneratorKind, OutputKind, OutputMod};
use treepart::cli::commands::{execute_command, init_config, partition_jobs};
use treepart::cli::runner::Job;
use treepart::cli::{Cli, CliError, Commands};
use treepart::graph::SpanningTree;

#[test]
fn given_cli_definition_when_checked_then_is_consistent() {
    Cli::command().debug_assert();
}

// ============================================================
// Parsing
// ============================================================

#[test]
fn given_partition_flags_when_parsed_then_lists_are_split() {
    // Act
    let cli = Cli::try_parse_from([
        "treepart",
        "partition",
        "-g",
        "tree-rand-attach,graph-pref-attach",
        "-n",
        "10,20",
        "-e",
        "3",
        "-t",
        "4",
        "-k",
        "3",
        "-i",
        "1/3",
        "-p",
        "rst",
        "-o",
        "part,cut-cost,time",
        "--output-mod",
        "both",
    ])
    .expect("parse partition");

    // Assert
    let Some(Commands::Partition(args)) = cli.command else {
        panic!("expected partition command");
    };
    assert_eq!(
        args.generator,
        vec![GeneratorKind::TreeRandAttach, GeneratorKind::GraphPrefAttach]
    );
    assert_eq!(args.nodes, vec![10, 20]);
    assert_eq!(args.options.edges_per_node, Some(3));
    assert_eq!(args.tries, 4);
    assert_eq!(args.kparts, Some(3));
    assert_eq!(args.imbalance.as_deref(), Some("1/3"));
    assert_eq!(args.prep, Some(SpanningTree::Rst));
    assert_eq!(args.output, vec![OutputKind::Part, OutputKind::CutCost, OutputKind::Time]);
    assert_eq!(args.output_mod, OutputMod::Both);
}

#[test]
fn given_partition_without_output_when_parsed_then_defaults_to_cut_cost() {
    let cli = Cli::try_parse_from(["treepart", "partition", "-f", "g.metis"]).unwrap();

    let Some(Commands::Partition(args)) = cli.command else {
        panic!("expected partition command");
    };
    assert_eq!(args.output, vec![OutputKind::CutCost]);
    assert_eq!(args.output_mod, OutputMod::Graph);
    assert_eq!(args.tries, 1);
}

#[rstest]
#[case::nodes_without_generator(&["treepart", "partition", "-n", "10"])]
#[case::min_child_alone(&["treepart", "gen", "10", "--min-child", "2"])]
#[case::unknown_generator(&["treepart", "gen", "10", "-g", "tree-thin"])]
#[case::bounds_without_nodes(&["treepart", "bounds"])]
fn given_invalid_arguments_when_parsed_then_rejected(#[case] argv: &[&str]) {
    assert!(Cli::try_parse_from(argv).is_err());
}

#[test]
fn given_global_flags_after_subcommand_when_parsed_then_applied() {
    let cli = Cli::try_parse_from(["treepart", "config", "init", "-g", "-dd", "-C", "/tmp"]).unwrap();

    assert_eq!(cli.debug, 2);
    assert_eq!(cli.config_dir.as_deref(), Some(std::path::Path::new("/tmp")));
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommands::Init { global: true, force: false }
        })
    ));
}

// ============================================================
// Execution
// ============================================================

#[test]
fn given_config_file_when_init_without_force_then_refused() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".treepart.toml");
    fs::write(&path, "kparts = 3\n").unwrap();

    // Act
    let result = init_config(&path, false);

    // Assert
    assert!(matches!(result, Err(CliError::Usage(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), "kparts = 3\n");
}

#[test]
fn given_bounds_command_when_executed_then_succeeds() {
    let dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "treepart",
        "-C",
        dir.path().to_str().unwrap(),
        "bounds",
        "-n",
        "100",
        "-k",
        "6",
    ])
    .unwrap();

    assert!(execute_command(&cli).is_ok());
}

#[test]
fn given_partition_of_missing_file_when_executed_then_open_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.metis");
    let cli = Cli::try_parse_from([
        "treepart",
        "-C",
        dir.path().to_str().unwrap(),
        "partition",
        "-f",
        missing.to_str().unwrap(),
    ])
    .unwrap();

    // Act
    let result = execute_command(&cli);

    // Assert
    assert!(matches!(result, Err(CliError::Open { .. })));
}

#[test]
fn given_partition_of_tree_file_when_executed_then_succeeds() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let tree = dir.path().join("tree.txt");
    fs::write(&tree, "4 0\n0 1 5\n1 2 1\n2 3 5\n").unwrap();
    let cli = Cli::try_parse_from([
        "treepart",
        "-C",
        dir.path().to_str().unwrap(),
        "partition",
        "-f",
        tree.to_str().unwrap(),
        "--input-format",
        "tree",
        "-k",
        "2",
    ])
    .unwrap();

    // Act / Assert
    assert!(execute_command(&cli).is_ok());
}

#[test]
fn given_tree_and_graph_files_with_tries_when_building_jobs_then_one_job_per_seed() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let tree = dir.path().join("tree.txt");
    let graph = dir.path().join("graph.metis");
    fs::write(&tree, "3 0\n0 1 1\n1 2 1\n").unwrap();
    fs::write(&graph, "3 3\n2 3\n1 3\n1 2\n").unwrap();
    let cli = Cli::try_parse_from([
        "treepart",
        "partition",
        "--tree-file",
        tree.to_str().unwrap(),
        "--graph-file",
        graph.to_str().unwrap(),
        "-t",
        "3",
    ])
    .unwrap();
    let Some(Commands::Partition(args)) = cli.command else {
        panic!("expected partition command");
    };

    // Act
    let jobs = partition_jobs(&args, 10).unwrap();

    // Assert
    let seeds: Vec<String> = jobs
        .iter()
        .map(|job| match job {
            Job::Tree { label, .. } => label.rsplit(' ').next().unwrap().to_string(),
            other => panic!("expected tree job, got {:?}", other),
        })
        .collect();
    assert_eq!(seeds, vec!["seed=10", "seed=11", "seed=12"]);
}

#[test]
fn given_failing_try_next_to_good_ones_when_partitioning_then_first_error_is_returned() {
    // Arrange: a path of three nodes weighing 2 cannot fit two parts of capacity 3
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.metis");
    let heavy = dir.path().join("heavy.metis");
    fs::write(&good, "4 3\n2\n1 3\n2 4\n3\n").unwrap();
    fs::write(&heavy, "3 2 010\n2 2\n2 1 3\n2 2\n").unwrap();
    let cli = Cli::try_parse_from([
        "treepart",
        "-C",
        dir.path().to_str().unwrap(),
        "partition",
        "-f",
        good.to_str().unwrap(),
        "-f",
        heavy.to_str().unwrap(),
        "-f",
        good.to_str().unwrap(),
        "-k",
        "2",
        "-i",
        "1/4",
    ])
    .unwrap();

    // Act
    let result = execute_command(&cli);

    // Assert
    assert!(matches!(
        result,
        Err(CliError::Partition(treepart::PartitionError::Infeasible { part_cnt: 2 }))
    ));
}
