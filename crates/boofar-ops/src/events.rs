//! Ordered progress events: many producers, one consumer.
//!
//! Workers push [`EventMessage`]s through cheap [`EventSender`] handles
//! without ever waiting on the consumer. A single consumer task drains the
//! queue in arrival order and numbers each event as it writes it, so the
//! printed sequence is always `1..=K` with no gaps.
//!
//! Shutdown sets a stop flag and wakes the consumer once. The consumer also
//! wakes on its own every poll interval, and it only exits once the stop
//! flag is set *and* the queue is empty. A writer that fails stops output
//! for the rest of the run but never stops the run itself.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::OrganizeError;

/// What a worker has to say about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMessage {
    /// Processing of a file began.
    Starting { source: PathBuf },
    /// A file was moved.
    Moved { source: PathBuf, destination: PathBuf },
    /// A file already sat at its destination.
    InPlace { path: PathBuf },
    /// The destination was occupied.
    Collision { source: PathBuf, destination: PathBuf },
    /// Processing of a file failed.
    Failed { source: PathBuf, reason: String },
}

impl fmt::Display for EventMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting { source } => {
                write!(f, "Starting to process \"{}\"", source.display())
            }
            Self::Moved {
                source,
                destination,
            } => write!(
                f,
                "Moved \"{}\" ===> \"{}\"",
                source.display(),
                destination.display()
            ),
            Self::InPlace { path } => write!(f, "Already in place \"{}\"", path.display()),
            Self::Collision {
                source,
                destination,
            } => write!(
                f,
                "Collision: \"{}\" not moved, \"{}\" already exists",
                source.display(),
                destination.display()
            ),
            Self::Failed { source, reason } => {
                write!(f, "Failed \"{}\": {reason}", source.display())
            }
        }
    }
}

/// A message with the sequence number it was consumed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position in consumption order, starting at 1.
    pub seq: u64,
    pub message: EventMessage,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#EVENT{}: {}", self.seq, self.message)
    }
}

/// Producer handle. Cloning is cheap; sending never blocks.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<EventMessage>,
}

impl EventSender {
    pub fn send(&self, message: EventMessage) {
        if let Err(err) = self.tx.send(message) {
            tracing::warn!("event consumer already stopped, dropping: {}", err.0);
        }
    }
}

/// What the consumer managed to write during one run.
#[derive(Debug, Default)]
pub struct EventStats {
    /// Events written, numbered `1..=delivered`.
    pub delivered: u64,
    /// Events discarded after the writer failed.
    pub dropped: u64,
    /// The write error that stopped output, if any.
    pub error: Option<OrganizeError>,
}

/// Event pipeline scoped to one run.
#[derive(Debug)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<EventMessage>,
    stop: CancellationToken,
    consumer: JoinHandle<EventStats>,
}

impl EventBus {
    /// Start the consumer, writing one line per event to `writer`.
    ///
    /// Writes happen on the blocking pool. Must be called from within a
    /// tokio runtime.
    pub fn spawn<W>(writer: W, poll_interval: Duration) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();
        let consumer = tokio::spawn(consume(rx, stop.clone(), poll_interval, writer));

        Self { tx, stop, consumer }
    }

    /// Get a producer handle.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Request stop and wait for the queue to drain.
    ///
    /// A failing writer never fails the shutdown; it shows up in
    /// [`EventStats::error`].
    pub async fn shutdown(self) -> EventStats {
        let Self { tx, stop, consumer } = self;
        drop(tx);
        stop.cancel();

        match consumer.await {
            Ok(stats) => stats,
            Err(err) => EventStats {
                error: Some(OrganizeError::Task {
                    message: format!("event consumer: {err}"),
                }),
                ..Default::default()
            },
        }
    }
}

/// Consumer-side owner of the writer.
///
/// After the first write error the writer is dropped and later events are
/// only counted, so producers keep a live channel until shutdown.
struct EventOutput<W> {
    writer: Option<W>,
    stats: EventStats,
}

impl<W: Write + Send + 'static> EventOutput<W> {
    async fn emit(&mut self, batch: Vec<EventMessage>) {
        if batch.is_empty() {
            return;
        }
        let total = batch.len() as u64;
        let Some(mut writer) = self.writer.take() else {
            self.stats.dropped += total;
            return;
        };

        let first_seq = self.stats.delivered + 1;
        let task = tokio::task::spawn_blocking(move || {
            let outcome = write_batch(&mut writer, first_seq, batch);
            (writer, outcome)
        });

        match task.await {
            Ok((writer, (written, Ok(())))) => {
                self.stats.delivered += written;
                self.writer = Some(writer);
            }
            Ok((_, (written, Err(err)))) => {
                self.stats.delivered += written;
                self.stats.dropped += total - written;
                tracing::warn!("event output failed, discarding further events: {err}");
                self.stats.error = Some(OrganizeError::Events(err));
            }
            Err(err) => {
                self.stats.dropped += total;
                self.stats.error = Some(OrganizeError::Task {
                    message: format!("event writer: {err}"),
                });
            }
        }
    }
}

async fn consume<W: Write + Send + 'static>(
    mut rx: mpsc::UnboundedReceiver<EventMessage>,
    stop: CancellationToken,
    poll_interval: Duration,
    writer: W,
) -> EventStats {
    let mut output = EventOutput {
        writer: Some(writer),
        stats: EventStats::default(),
    };

    loop {
        tokio::select! {
            biased;
            message = rx.recv() => match message {
                Some(message) => {
                    let mut batch = vec![message];
                    collect_pending(&mut rx, &mut batch);
                    output.emit(batch).await;
                }
                // Every producer is gone and the queue is empty.
                None => break,
            },
            () = stop.cancelled() => {}
            () = tokio::time::sleep(poll_interval) => {}
        }

        if stop.is_cancelled() {
            let mut batch = Vec::new();
            collect_pending(&mut rx, &mut batch);
            output.emit(batch).await;
            break;
        }
    }

    let stats = output.stats;
    tracing::debug!(
        delivered = stats.delivered,
        dropped = stats.dropped,
        "event consumer finished"
    );
    stats
}

fn collect_pending(rx: &mut mpsc::UnboundedReceiver<EventMessage>, batch: &mut Vec<EventMessage>) {
    while let Ok(message) = rx.try_recv() {
        batch.push(message);
    }
}

/// Write `batch` numbered from `first_seq`, returning how many lines made it.
fn write_batch<W: Write>(
    writer: &mut W,
    first_seq: u64,
    batch: Vec<EventMessage>,
) -> (u64, std::io::Result<()>) {
    let mut written = 0;
    for (seq, message) in (first_seq..).zip(batch) {
        if let Err(err) = writeln!(writer, "{}", Event { seq, message }) {
            return (written, Err(err));
        }
        written += 1;
    }
    (written, writer.flush())
}
