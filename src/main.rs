use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;

use declsweep::report::{ReportFormat, Reporter};
use declsweep::{Config, Driver, IndexBundle, SyntaxTable};

/// declsweep - unused declaration analysis driven by compiler symbol indexes
#[derive(Parser, Debug)]
#[command(name = "declsweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the index bundle (JSON) produced by the build
    index: PathBuf,

    /// Path to the syntax report file (JSON)
    #[arg(short, long)]
    syntax: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Retain declarations with public or open accessibility
    #[arg(long)]
    retain_public: bool,

    /// Retain declarations bridged to the objc runtime
    #[arg(long)]
    retain_objc_accessible: bool,

    /// Do not report properties that are only assigned
    #[arg(long)]
    retain_assign_only_properties: bool,

    /// Do not report unused parameters on protocol methods
    #[arg(long)]
    retain_unused_protocol_func_params: bool,

    /// Ignore in-source comment commands
    #[arg(long)]
    ignore_comment_commands: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: ReportFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => {
            let root = cli
                .index
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            Config::from_default_locations(&root)?
        }
    };
    config.retain_public |= cli.retain_public;
    config.retain_objc_accessible |= cli.retain_objc_accessible;
    config.retain_assign_only_properties |= cli.retain_assign_only_properties;
    config.retain_unused_protocol_func_params |= cli.retain_unused_protocol_func_params;
    config.ignore_comment_commands |= cli.ignore_comment_commands;

    let bundle = IndexBundle::load(&cli.index)?;
    info!(
        "Loaded {} compilation units covering {} files",
        bundle.units.len(),
        bundle.files().len()
    );

    let syntax = match &cli.syntax {
        Some(path) => SyntaxTable::load(path).into_diagnostic()?,
        None => SyntaxTable::new(),
    };

    let mut driver = Driver::new(config);
    let results = driver.scan(&bundle, &syntax).into_diagnostic()?;

    Reporter::new(cli.format, cli.output).report(&results)?;

    if results.is_empty() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
