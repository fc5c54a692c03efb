//! Wave-synchronous reorganization driver.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use boofar_core::{CollisionPolicy, OrganizeConfig};
use boofar_scan::MusicScanner;

use crate::chunk::{chunk, wave_size};
use crate::cleanup::prune_empty_dirs;
use crate::coordinator::DirectoryCoordinator;
use crate::error::OrganizeError;
use crate::events::{EventBus, EventMessage, EventSender};
use crate::move_op::{MoveOutcome, move_file};
use crate::reader::{LoftyTagReader, TagReader};
use crate::report::OrganizeReport;
use crate::resolver::DestinationResolver;

/// State shared by every task of one run.
struct RunContext {
    resolver: DestinationResolver,
    coordinator: DirectoryCoordinator,
    events: EventSender,
    destination_root: PathBuf,
    fix_filenames: bool,
    collision: CollisionPolicy,
}

impl RunContext {
    /// Task body: report, relocate, report.
    fn process(&self, source: &Path) -> Result<MoveOutcome, OrganizeError> {
        self.events.send(EventMessage::Starting {
            source: source.to_path_buf(),
        });

        let result = self.relocate(source);

        let message = match &result {
            Ok(MoveOutcome::Moved { destination, .. }) => EventMessage::Moved {
                source: source.to_path_buf(),
                destination: destination.clone(),
            },
            Ok(MoveOutcome::InPlace { destination }) => EventMessage::InPlace {
                path: destination.clone(),
            },
            Err(OrganizeError::Collision { destination, .. }) => EventMessage::Collision {
                source: source.to_path_buf(),
                destination: destination.clone(),
            },
            Err(err) => EventMessage::Failed {
                source: source.to_path_buf(),
                reason: err.to_string(),
            },
        };
        self.events.send(message);

        result
    }

    fn relocate(&self, source: &Path) -> Result<MoveOutcome, OrganizeError> {
        let plan = self
            .resolver
            .plan(source, &self.destination_root, self.fix_filenames)?;

        self.coordinator
            .ensure_dir(&plan.directory)
            .map_err(|e| OrganizeError::create_dir(&plan.directory, e))?;

        move_file(
            source,
            &plan.destination(),
            self.collision,
            &self.coordinator,
        )
    }
}

/// Reorganizes a music collection according to an [`OrganizeConfig`].
///
/// Every call to [`Organizer::run`] gets its own directory coordinator and
/// event bus, so runs never share state.
pub struct Organizer {
    config: OrganizeConfig,
    reader: Arc<dyn TagReader>,
    scanner: MusicScanner,
}

impl Organizer {
    /// Create an organizer reading tags with lofty.
    pub fn new(config: OrganizeConfig) -> Self {
        Self::with_reader(config, Arc::new(LoftyTagReader::new()))
    }

    /// Create an organizer with a custom tag reader.
    pub fn with_reader(config: OrganizeConfig, reader: Arc<dyn TagReader>) -> Self {
        Self {
            config,
            reader,
            scanner: MusicScanner::new(),
        }
    }

    pub fn config(&self) -> &OrganizeConfig {
        &self.config
    }

    /// Run, printing events to stdout.
    pub async fn run(&self) -> Result<OrganizeReport, OrganizeError> {
        self.run_with_writer(std::io::stdout()).await
    }

    /// Run, writing one `#EVENT<n>: ...` line per event to `writer`.
    ///
    /// Per-file failures are collected in the report; only setup problems
    /// (bad config, unreadable source root, uncreatable destination root)
    /// abort the run. Once files start moving the run always returns a
    /// report, even if `writer` fails.
    pub async fn run_with_writer<W>(&self, writer: W) -> Result<OrganizeReport, OrganizeError>
    where
        W: Write + Send + 'static,
    {
        let start = Instant::now();
        self.config.validate()?;

        let scanner = self.scanner.clone();
        let source = self.config.source.clone();
        let scan = tokio::task::spawn_blocking(move || scanner.discover(&source))
            .await
            .map_err(|e| OrganizeError::Task {
                message: format!("discovery: {e}"),
            })??;

        let destination_root = prepare_destination(self.config.destination_root())?;
        let wave_size = wave_size(self.config.threads);

        let mut report = OrganizeReport {
            source_root: scan.root.clone(),
            destination_root: destination_root.clone(),
            discovered: scan.files.len(),
            wave_size: wave_size.get(),
            scan_warnings: scan
                .warnings
                .iter()
                .map(|w| format!("{}: {}", w.path.display(), w.message))
                .collect(),
            ..Default::default()
        };

        tracing::info!(
            source = %report.source_root.display(),
            destination = %destination_root.display(),
            grouping = %self.config.grouping,
            files = report.discovered,
            wave_size = report.wave_size,
            "starting reorganization"
        );

        let bus = EventBus::spawn(writer, self.config.event_poll_interval());
        let context = Arc::new(RunContext {
            resolver: DestinationResolver::new(
                Arc::clone(&self.reader),
                self.config.grouping.clone(),
            ),
            coordinator: DirectoryCoordinator::new(),
            events: bus.sender(),
            destination_root,
            fix_filenames: self.config.fix_filenames,
            collision: self.config.collision,
        });

        let waves = chunk(scan.files, wave_size);
        report.waves = waves.len();

        for (index, wave) in waves.into_iter().enumerate() {
            tracing::info!(wave = index + 1, of = report.waves, files = wave.len(), "wave started");

            let handles: Vec<_> = wave
                .into_iter()
                .map(|source| {
                    let context = Arc::clone(&context);
                    let path = source.clone();
                    (
                        source,
                        tokio::task::spawn_blocking(move || context.process(&path)),
                    )
                })
                .collect();

            // Join barrier: the next wave starts only after all of these end.
            for (source, handle) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(err) => {
                        let err = OrganizeError::Task {
                            message: err.to_string(),
                        };
                        context.events.send(EventMessage::Failed {
                            source: source.clone(),
                            reason: err.to_string(),
                        });
                        Err(err)
                    }
                };

                if let Err(err) = &result {
                    tracing::warn!(path = %source.display(), "file not organized: {err}");
                }
                report.record(source, result);
            }
        }

        drop(context);
        let events = bus.shutdown().await;
        report.events_delivered = events.delivered;
        report.events_dropped = events.dropped;
        if let Some(err) = events.error {
            tracing::warn!(dropped = events.dropped, "event output incomplete: {err}");
            report.event_error = Some(err.to_string());
        }

        if self.config.prune_empty_dirs {
            let root = report.source_root.clone();
            match tokio::task::spawn_blocking(move || prune_empty_dirs(&root)).await {
                Ok(cleanup) => report.cleanup = Some(cleanup),
                Err(err) => tracing::warn!("cleanup task failed: {err}"),
            }
        }

        report.elapsed = start.elapsed();
        tracing::info!(elapsed = ?report.elapsed, "{}", report.summary());

        Ok(report)
    }
}

/// Create the destination root if needed and return its canonical form.
fn prepare_destination(root: &Path) -> Result<PathBuf, OrganizeError> {
    std::fs::create_dir_all(root).map_err(|e| OrganizeError::create_dir(root, e))?;
    root.canonicalize()
        .map_err(|e| OrganizeError::create_dir(root, e))
}
