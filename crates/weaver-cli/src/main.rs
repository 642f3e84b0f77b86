//! Weaver CLI - PRD-driven execution planning
//!
//! Usage:
//!   weaver analyze <file>       Analyze a PRD and print its structure
//!   weaver plan <file>          Produce a phased execution plan
//!   weaver example              Print a built-in example PRD

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use weaver_core::{PlannerConfig, PlannerConfigOverrides};
use weaver_planning::{
    example_prd_text, minimal_prd_text, DependencyGraphBuilder, ExecutionPlanner, PrdAnalyzer,
    TaskDecomposer,
};

#[derive(Parser)]
#[command(name = "weaver")]
#[command(version, about = "PRD-driven execution planning for agent teams")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a PRD file and print its structure
    Analyze {
        /// Path to the PRD markdown file
        file: PathBuf,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Produce a phased execution plan from a PRD file
    Plan {
        /// Path to the PRD markdown file
        file: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Force one task per phase
        #[arg(long)]
        no_parallel: bool,

        /// Override the maximum task tree depth
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
    },

    /// Print a built-in example PRD
    Example {
        /// Print the minimal template instead of the full example
        #[arg(long)]
        minimal: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Analyze { file, json } => analyze(&file, json),
        Commands::Plan {
            file,
            json,
            no_parallel,
            max_depth,
        } => plan(&file, json, no_parallel, max_depth),
        Commands::Example { minimal } => {
            if minimal {
                print!("{}", minimal_prd_text());
            } else {
                print!("{}", example_prd_text());
            }
            Ok(())
        }
    }
}

fn read_prd(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading PRD file {}", file.display()))
}

fn analyze(file: &Path, json: bool) -> Result<()> {
    let text = read_prd(file)?;
    let analyzer = PrdAnalyzer::new(PlannerConfig::default());
    let analysis = analyzer.analyze(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Project: {}", analysis.title);
    if let Some(version) = &analysis.version {
        println!("Version: {}", version);
    }
    if !analysis.goals.is_empty() {
        println!("Goals:");
        for goal in &analysis.goals {
            println!("  - {}", goal);
        }
    }
    println!("Features: {}", analysis.features.len());
    for feature in &analysis.features {
        println!(
            "  {} [{}, {}] - {} requirements, {} acceptance criteria",
            feature.name,
            feature.priority,
            feature.estimated_complexity,
            feature.requirements.len(),
            feature.acceptance_criteria.len()
        );
        if !feature.depends_on.is_empty() {
            println!("    depends on: {}", feature.depends_on.join(", "));
        }
    }
    if !analysis.global_requirements.is_empty() {
        println!("Global requirements: {}", analysis.global_requirements.len());
    }
    if !analysis.constraints.is_empty() {
        println!("Constraints: {}", analysis.constraints.len());
    }

    Ok(())
}

fn plan(file: &Path, json: bool, no_parallel: bool, max_depth: Option<usize>) -> Result<()> {
    let text = read_prd(file)?;

    let config = PlannerConfig::with_overrides(PlannerConfigOverrides {
        enable_parallelization: no_parallel.then_some(false),
        max_task_depth: max_depth,
        ..Default::default()
    });

    let analyzer = PrdAnalyzer::new(config.clone());
    let decomposer = TaskDecomposer::new(config.clone())?;
    let planner = ExecutionPlanner::new(config);

    let analysis = analyzer.analyze(&text);
    let tree = decomposer.decompose(&analysis);
    let graph = DependencyGraphBuilder::build(&tree.tasks_in_order());

    let stats = graph.stats();
    tracing::debug!(
        nodes = stats.total_nodes,
        edges = stats.total_edges,
        max_depth = stats.max_depth,
        "Dependency graph ready"
    );

    let plan = planner.create_plan(&graph)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    for phase in &plan.phases {
        let marker = if phase.can_parallelize {
            " (parallel)"
        } else {
            ""
        };
        println!("Phase {}{}:", phase.phase_number, marker);
        for task in &phase.tasks {
            println!(
                "  {}  {} [{}, {}, effort {:.1}]",
                task.id, task.name, task.agent_type, task.priority, task.estimated_effort
            );
        }
    }
    println!();
    print!("{}", plan.summary());

    Ok(())
}
