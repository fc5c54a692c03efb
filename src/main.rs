//! boofar - reorganizes a music collection by its tags.
//!
//! Usage:
//!   boofar -t <DIR>                     Reorganize in place (GENRE/ARTIST/ALBUM)
//!   boofar -t <DIR> -d <OUT>            Build the new layout under another root
//!   boofar -t <DIR> -g artist album     Choose grouping keys, outermost first
//!   boofar -t <DIR> -f                  Also rename files from their title tag
//!   boofar --help                       Show help

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use boofar_core::{CollisionPolicy, DEFAULT_EVENT_POLL_MS, GroupingOrder, OrganizeConfig, TagKey};
use boofar_ops::{OrganizeReport, Organizer};

#[derive(Parser)]
#[command(
    name = "boofar",
    version,
    about = "Reorganize a music library by its tags",
    long_about = "boofar moves every music file under the target directory into \
                  <destination>/<group1>/<group2>/<group3>/, where each group is the \
                  file's tag value for one grouping key. Directories left empty \
                  afterwards are removed; the target directory itself is always kept."
)]
struct Cli {
    /// Path to the music library
    #[arg(short, long)]
    target: PathBuf,

    /// Where to build the new layout (defaults to the target)
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Grouping keys, outermost first (default: genre artist album)
    #[arg(short, long, value_enum, num_args = 1..=3, ignore_case = true)]
    group: Vec<GroupKey>,

    /// Rename files from their title tag
    #[arg(short, long)]
    fix_filenames: bool,

    /// Files processed concurrently (0 = twice the number of cores)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Replace files already present at the destination instead of skipping them
    #[arg(long)]
    overwrite: bool,

    /// Keep directories left empty by the run (the target itself is never removed)
    #[arg(long)]
    no_cleanup: bool,

    /// Milliseconds between event consumer wake-ups
    #[arg(long, default_value_t = DEFAULT_EVENT_POLL_MS, hide = true)]
    event_poll_ms: u64,

    /// Output format for the final report
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupKey {
    Artist,
    Album,
    Genre,
}

impl From<GroupKey> for TagKey {
    fn from(key: GroupKey) -> Self {
        match key {
            GroupKey::Artist => TagKey::Artist,
            GroupKey::Album => TagKey::Album,
            GroupKey::Genre => TagKey::Genre,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    let organizer = Organizer::new(config);

    let report = match cli.format {
        OutputFormat::Text => organizer.run().await,
        // Keep stdout for the JSON document.
        OutputFormat::Json => organizer.run_with_writer(std::io::stderr()).await,
    }
    .context("Reorganization failed")?;

    if let Some(err) = &report.event_error {
        tracing::warn!(dropped = report.events_dropped, "progress output stopped early: {err}");
    }

    let mut stdout = std::io::stdout().lock();
    let printed = match cli.format {
        OutputFormat::Text => print_summary(&mut stdout, &report),
        OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?),
    };
    if let Err(err) = printed {
        tracing::warn!("could not print the report: {err}");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Translate command line flags into a run configuration.
fn build_config(cli: &Cli) -> Result<OrganizeConfig> {
    let grouping = if cli.group.is_empty() {
        GroupingOrder::default()
    } else {
        GroupingOrder::new(cli.group.iter().copied().map(TagKey::from))
            .context("Invalid grouping")?
    };

    let mut builder = OrganizeConfig::builder();
    builder
        .source(cli.target.clone())
        .grouping(grouping)
        .fix_filenames(cli.fix_filenames)
        .threads(cli.threads)
        .collision(if cli.overwrite {
            CollisionPolicy::Overwrite
        } else {
            CollisionPolicy::Fail
        })
        .event_poll_ms(cli.event_poll_ms)
        .prune_empty_dirs(!cli.no_cleanup);
    if let Some(destination) = &cli.destination {
        builder.destination(destination.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Print the end-of-run summary.
fn print_summary(out: &mut impl Write, report: &OrganizeReport) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "─".repeat(60))?;
    writeln!(out, " {}", report.summary())?;
    writeln!(
        out,
        " {} moved in {:.2}s",
        format_size(report.bytes_moved),
        report.elapsed.as_secs_f64()
    )?;
    writeln!(out, "{}", "─".repeat(60))?;

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, " Files not organized:")?;
        for failure in &report.failures {
            writeln!(out, "   {}", failure.message)?;
        }
    }

    let skipped = report.cleanup.as_ref().map_or(0, |c| c.skipped.len());
    if skipped > 0 || !report.scan_warnings.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "{} warning(s) during scan, {} directories could not be cleaned up",
            report.scan_warnings.len(),
            skipped
        )?;
    }
    out.flush()
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
