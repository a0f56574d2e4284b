//! Sitetrack CLI - construction WBS progress tracking

mod store;

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sitetrack_core::config::Config;
use sitetrack_core::domain::lifecycle::TaskLifecycle;
use sitetrack_core::domain::progress::{Allocation, DistributionStrategy, QuantityDistributor};
use sitetrack_core::domain::wbs::{NodePath, lookup};
use sitetrack_core::service::{IdentityProvider, ProjectTracker};
use sitetrack_core::tree::{
    RenderOptions, TextTreeRenderer, TreeBatchOperations, TreeRenderer, TreeView,
};
use tracing::debug;

use store::JsonFileRepository;

#[derive(Parser)]
#[command(name = "sitetrack")]
#[command(author, version, about = "Construction WBS progress tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding one `<project id>.json` file per project
    #[arg(long, global = true, default_value = "./data")]
    data_dir: PathBuf,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Verdict {
    Approve,
    Reject,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the WBS tree of a project
    Tree {
        /// Project ID
        project: String,
        /// Expand every node above this level (0-3)
        #[arg(short, long)]
        level: Option<u8>,
        /// Only show nodes matching this text, plus their ancestors
        #[arg(short, long)]
        search: Option<String>,
        /// First row to show
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Number of rows to show (defaults to tree.window_size)
        #[arg(long)]
        limit: Option<usize>,
        /// Bounded breadth-first expansion instead of a fixed level
        #[arg(long)]
        smart: bool,
        /// ASCII markers only
        #[arg(long)]
        ascii: bool,
        /// Show node ids
        #[arg(long)]
        ids: bool,
    },

    /// Count nodes by type and level
    Stats {
        /// Project ID
        project: String,
        /// Expansion level to count at (defaults to every level)
        #[arg(short, long)]
        level: Option<u8>,
    },

    /// Show one node (dotted path: 0, 0.1, 0.1.2)
    Show { project: String, path: String },

    /// Replace the submitters and reviewers of a task
    Assign {
        project: String,
        path: String,
        /// Comma-separated user ids
        #[arg(long, value_delimiter = ',')]
        submitters: Vec<String>,
        /// Comma-separated user ids
        #[arg(long, value_delimiter = ',')]
        reviewers: Vec<String>,
    },

    /// Submit progress on a task
    Submit {
        project: String,
        path: String,
        completed: i64,
        total: i64,
    },

    /// Approve or reject a submitted task
    Review {
        project: String,
        path: String,
        verdict: Verdict,
        /// Review comment (required when rejecting)
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Split a quantity over the children of a package or subpackage
    Distribute {
        project: String,
        path: String,
        total: i64,
        /// equal, proportional or manual (defaults to distribution.default_strategy)
        #[arg(long)]
        strategy: Option<String>,
        /// Comma-separated manual allocations, one per child
        #[arg(long, value_delimiter = ',')]
        alloc: Vec<i64>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

/// Current user from `SITETRACK_USER`
struct EnvIdentity;

impl IdentityProvider for EnvIdentity {
    fn current_user_id(&self) -> Option<String> {
        env::var("SITETRACK_USER")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitetrack=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let result = run(cli).await;

    if let Err(err) = &result {
        if let Some(core) = err.downcast_ref::<sitetrack_core::Error>() {
            eprintln!("[{}] {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
            std::process::exit(1);
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let repo = Arc::new(JsonFileRepository::new(&cli.data_dir));
    debug!(data_dir = %cli.data_dir.display(), "Using data directory");
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Tree {
            project,
            level,
            search,
            offset,
            limit,
            smart,
            ascii,
            ids,
        } => {
            let opts = TreeArgs {
                level,
                search,
                offset,
                limit,
                smart,
                ascii,
                ids,
            };
            cmd_tree(repo, &project, opts, out).await
        }

        Commands::Stats { project, level } => cmd_stats(repo, &project, level, out).await,

        Commands::Show { project, path } => cmd_show(repo, &project, &path, out).await,

        Commands::Assign {
            project,
            path,
            submitters,
            reviewers,
        } => cmd_assign(repo, &project, &path, submitters, reviewers, out).await,

        Commands::Submit {
            project,
            path,
            completed,
            total,
        } => cmd_submit(repo, &project, &path, completed, total, out).await,

        Commands::Review {
            project,
            path,
            verdict,
            comment,
        } => cmd_review(repo, &project, &path, verdict, comment, out).await,

        Commands::Distribute {
            project,
            path,
            total,
            strategy,
            alloc,
        } => cmd_distribute(repo, &project, &path, total, strategy.as_deref(), alloc, out).await,

        Commands::Config { action } => cmd_config(action, out.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

struct TreeArgs {
    level: Option<u8>,
    search: Option<String>,
    offset: usize,
    limit: Option<usize>,
    smart: bool,
    ascii: bool,
    ids: bool,
}

type Tracker = ProjectTracker<JsonFileRepository>;

async fn open(repo: Arc<JsonFileRepository>, project_id: &str) -> anyhow::Result<Tracker> {
    Ok(ProjectTracker::open(repo, project_id).await?)
}

fn parse_path(path: &str) -> anyhow::Result<NodePath> {
    Ok(NodePath::parse_dotted(path)?)
}

fn parse_users(ids: Vec<String>) -> BTreeSet<String> {
    ids.into_iter().map(|id| id.trim().to_string()).collect()
}

async fn cmd_tree(
    repo: Arc<JsonFileRepository>,
    project_id: &str,
    args: TreeArgs,
    out: Output,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let tracker = open(repo, project_id).await?;
    let project = tracker.project();

    let mut view = TreeView::from_config(&config.tree);
    if args.smart {
        view.smart_expand(project, config.tree.smart_expand_max_nodes);
    } else {
        let level = args.level.unwrap_or(config.tree.default_expand_level);
        view.expand_to_level(project, level);
    }
    view.set_search(args.search);
    view.reveal_search(project);

    let limit = args.limit.unwrap_or(config.tree.window_size);
    let window = view.window(project, args.offset, limit);

    match out.format {
        OutputFormat::Json => out.json(&window)?,
        OutputFormat::Text => {
            let options = if args.ascii {
                RenderOptions::ascii()
            } else {
                RenderOptions::default()
            }
            .with_ids(args.ids);
            let mut renderer = TextTreeRenderer::with_options(options);
            renderer.render(&window);
            print!("{}", renderer.take_output());
            if !out.quiet {
                println!("{}", TextTreeRenderer::render_footer(&window));
            }
        }
    }
    Ok(())
}

async fn cmd_stats(
    repo: Arc<JsonFileRepository>,
    project_id: &str,
    level: Option<u8>,
    out: Output,
) -> anyhow::Result<()> {
    let tracker = open(repo, project_id).await?;
    let project = tracker.project();

    let mut view = TreeView::new();
    view.expand_to_level(project, level.unwrap_or(sitetrack_core::config::MAX_EXPAND_LEVEL));
    let stats = TreeBatchOperations::calculate_stats(&view.items(project));

    match out.format {
        OutputFormat::Json => out.json(&stats)?,
        OutputFormat::Text => {
            if !out.quiet {
                println!("Project: {} ({}%)", project.name, project.progress);
            }
            println!("Nodes: {} ({} expanded)", stats.total, stats.expanded);
            for (node_type, count) in &stats.by_type {
                println!("  {}: {}", node_type, count);
            }
            for (level, count) in &stats.by_level {
                println!("  level {}: {}", level, count);
            }
        }
    }
    Ok(())
}

async fn cmd_show(
    repo: Arc<JsonFileRepository>,
    project_id: &str,
    path: &str,
    out: Output,
) -> anyhow::Result<()> {
    let tracker = open(repo, project_id).await?;
    let path = parse_path(path)?;
    let node = lookup::resolve(tracker.project(), &path)?;

    if out.format == OutputFormat::Json {
        return out.json(&node);
    }

    let (completed, total, progress) = node.quantities();
    println!("{}: {}", node.node_type(), node.name());
    if !path.dotted().is_empty() {
        println!("  Path: {}", path.dotted());
    }
    println!("  Quantity: {}/{} ({}%)", completed, total, progress);

    if let Some(task) = node.as_task() {
        println!("  Status: {}", task.status);
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
        println!("  Submitters: {}", join(&task.submitters));
        println!("  Reviewers: {}", join(&task.reviewers));
        if let Some(at) = task.submitted_at {
            println!("  Submitted: {}", at.format("%Y-%m-%d %H:%M:%S"));
        }
        if let Some(at) = task.approved_at {
            println!("  Approved: {}", at.format("%Y-%m-%d %H:%M:%S"));
        }
        if let Some(comment) = &task.review_comment {
            println!("  Review comment: {}", comment);
        }

        let allowed: Vec<&str> = TaskLifecycle::allowed_events(task.status)
            .iter()
            .map(|kind| kind.as_str())
            .collect();
        println!("  Allowed: {}", allowed.join(", "));

        if !out.quiet {
            let affordances = tracker.affordances(&path, &EnvIdentity)?;
            if affordances.any() {
                let mut offered = Vec::new();
                if affordances.can_submit {
                    offered.push("submit");
                }
                if affordances.can_review {
                    offered.push("review");
                }
                println!("  You can: {}", offered.join(", "));
            }
        }
    } else {
        println!("  Children: {}", node.child_count());
    }
    Ok(())
}

async fn cmd_assign(
    repo: Arc<JsonFileRepository>,
    project_id: &str,
    path: &str,
    submitters: Vec<String>,
    reviewers: Vec<String>,
    out: Output,
) -> anyhow::Result<()> {
    let mut tracker = open(repo, project_id).await?;
    let path = parse_path(path)?;
    let task = tracker
        .assign(&path, parse_users(submitters), parse_users(reviewers))
        .await?;

    match out.format {
        OutputFormat::Json => out.json(task)?,
        OutputFormat::Text if !out.quiet => {
            println!("Assigned '{}' ({})", task.name, task.status);
        }
        OutputFormat::Text => {}
    }
    Ok(())
}

async fn cmd_submit(
    repo: Arc<JsonFileRepository>,
    project_id: &str,
    path: &str,
    completed: i64,
    total: i64,
    out: Output,
) -> anyhow::Result<()> {
    let mut tracker = open(repo, project_id).await?;
    let path = parse_path(path)?;
    let task = tracker.submit_progress(&path, completed, total).await?;

    match out.format {
        OutputFormat::Json => out.json(task)?,
        OutputFormat::Text if !out.quiet => {
            println!(
                "Submitted {}/{} on '{}' ({})",
                task.completed, task.total, task.name, task.status
            );
        }
        OutputFormat::Text => {}
    }
    Ok(())
}

async fn cmd_review(
    repo: Arc<JsonFileRepository>,
    project_id: &str,
    path: &str,
    verdict: Verdict,
    comment: Option<String>,
    out: Output,
) -> anyhow::Result<()> {
    let mut tracker = open(repo, project_id).await?;
    let path = parse_path(path)?;
    let task = tracker
        .review(&path, verdict == Verdict::Approve, comment)
        .await?;

    match out.format {
        OutputFormat::Json => out.json(task)?,
        OutputFormat::Text if !out.quiet => {
            println!("Reviewed '{}' ({})", task.name, task.status);
        }
        OutputFormat::Text => {}
    }
    Ok(())
}

async fn cmd_distribute(
    repo: Arc<JsonFileRepository>,
    project_id: &str,
    path: &str,
    total: i64,
    strategy: Option<&str>,
    alloc: Vec<i64>,
    out: Output,
) -> anyhow::Result<()> {
    let mut tracker = open(repo, project_id).await?;
    let path = parse_path(path)?;

    let strategy = match strategy {
        Some(s) => s.parse::<DistributionStrategy>()?,
        None if !alloc.is_empty() => DistributionStrategy::Manual,
        None => Config::load()?.distribution.default_strategy,
    };

    let manual = if strategy == DistributionStrategy::Manual {
        let children = QuantityDistributor::children_of(tracker.project(), &path)?;
        if alloc.len() != children.len() {
            anyhow::bail!(
                "--alloc needs one amount per child ({} children, got {})",
                children.len(),
                alloc.len()
            );
        }
        Some(
            children
                .iter()
                .zip(&alloc)
                .map(|(child, &amount)| Allocation::new(child.index, child.name.clone(), amount))
                .collect(),
        )
    } else {
        None
    };

    let request = tracker.distribute(&path, strategy, total, manual).await?;

    match out.format {
        OutputFormat::Json => out.json(&request)?,
        OutputFormat::Text => {
            for allocation in &request.distributions {
                println!("  {}: {}", allocation.name, allocation.allocated);
            }
            if !out.quiet {
                println!(
                    "Distributed {} over {} children ({})",
                    request.parent_total,
                    request.distributions.len(),
                    strategy
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
