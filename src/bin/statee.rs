use std::io::Write;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use statee::app::{ListResult, Portal, find_table};
use statee::client::StatHttpClient;
use statee::config::ConfigLoader;
use statee::error::StatError;
use statee::output::{JsonOutput, OutputMode, TextOutput};

#[derive(Parser)]
#[command(name = "statee")]
#[command(about = "Browse and download tables from the Statistics Estonia PX-Web portal")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print the category tree (slow: crawls every root category)")]
    Tree,
    #[command(about = "List the tables of one dataset group")]
    List(TargetArgs),
    #[command(about = "Download one table as delimited text")]
    Fetch(FetchArgs),
}

#[derive(Args, Clone)]
struct TargetArgs {
    /// Normalized labels joined with `/`, e.g. `Majandus/Ehitus`
    label_path: Option<String>,

    /// Raw listing locator; skips crawling the tree
    #[arg(long, conflicts_with = "label_path")]
    locator: Option<String>,
}

#[derive(Args, Clone)]
struct FetchArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[arg(long)]
    table: String,

    #[arg(long)]
    output: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<StatError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &StatError) -> u8 {
    match error {
        StatError::CategoryNotFound(_)
        | StatError::TableNotFound(_)
        | StatError::Validation(_) => 2,
        StatError::Http(_) | StatError::Status { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let client = StatHttpClient::new(&config)?;
    let portal = Portal::new(client, config);

    match cli.command {
        Commands::Tree => run_tree(&portal, output_mode),
        Commands::List(args) => run_list(&portal, args, output_mode),
        Commands::Fetch(args) => run_fetch(&portal, args),
    }
}

fn run_tree(portal: &Portal<StatHttpClient>, output_mode: OutputMode) -> miette::Result<()> {
    eprintln!("Crawling the portal, this can take up to a minute...");
    let tree = portal.load_tree()?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_tree(&tree).into_diagnostic(),
        OutputMode::Text => TextOutput::print_tree(&tree).into_diagnostic(),
    }
}

fn run_list(
    portal: &Portal<StatHttpClient>,
    args: TargetArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let result = list_target(portal, &args)?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_list(&result).into_diagnostic(),
        OutputMode::Text => TextOutput::print_list(&result).into_diagnostic(),
    }
}

fn run_fetch(portal: &Portal<StatHttpClient>, args: FetchArgs) -> miette::Result<()> {
    let listing = list_target(portal, &args.target)?;
    let descriptor = find_table(&listing.datasets, &args.table)?;
    let fetched = portal.fetch(descriptor)?;

    match args.output {
        Some(path) => {
            std::fs::write(path.as_std_path(), fetched.body.as_bytes())
                .map_err(|err| StatError::Filesystem(format!("write {path}: {err}")))?;
            eprintln!("Saved {} to {path}", fetched.name);
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(fetched.body.as_bytes()).into_diagnostic()?;
        }
    }
    Ok(())
}

fn list_target(portal: &Portal<StatHttpClient>, args: &TargetArgs) -> miette::Result<ListResult> {
    if let Some(locator) = &args.locator {
        return Ok(portal.list_locator(locator)?);
    }
    let Some(label_path) = &args.label_path else {
        return Err(miette::Report::msg(
            "a label path or --locator is required (try `statee tree`)",
        ));
    };

    eprintln!("Crawling the portal, this can take up to a minute...");
    let tree = portal.load_tree()?;
    let leaf = tree.find_leaf(label_path)?;
    let datasets = portal.datasets(leaf)?;
    Ok(ListResult {
        locator: leaf.locator().to_string(),
        datasets: datasets.to_vec(),
    })
}
