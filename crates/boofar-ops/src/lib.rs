//! Concurrent reorganization engine for boofar.
//!
//! Moves every discovered music file into `destination/<group1>/.../<groupN>/`
//! where each group is the file's tag value for one key of the grouping
//! order.
//!
//! # Overview
//!
//! - **Waves**: files are processed in batches of `2 × cores`, one blocking
//!   task per file, with a join barrier between batches.
//! - **Coordination**: directory creation is serialized per run, and
//!   destinations are claimed so two files never land on one path.
//! - **Events**: workers report through a multi-producer, single-consumer
//!   bus that prints `#EVENT<n>: <message>` lines in arrival order.
//! - **Cleanup**: directories emptied by the run are pruned bottom-up.
//!
//! # Example
//!
//! ```rust,no_run
//! use boofar_core::OrganizeConfig;
//! use boofar_ops::Organizer;
//!
//! # async fn demo() -> Result<(), boofar_ops::OrganizeError> {
//! let organizer = Organizer::new(OrganizeConfig::new("/path/to/music"));
//! let report = organizer.run().await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

mod chunk;
mod cleanup;
mod coordinator;
mod error;
mod events;
mod move_op;
mod organizer;
mod reader;
mod report;
mod resolver;

pub use chunk::{FALLBACK_THREAD_COUNT, THREADS_PER_CORE, chunk, estimate_thread_count, wave_size};
pub use cleanup::{CleanupReport, CleanupWarning, prune_empty_dirs};
pub use coordinator::DirectoryCoordinator;
pub use error::{OrganizeError, TagError};
pub use events::{Event, EventBus, EventMessage, EventSender, EventStats};
pub use move_op::{MoveOutcome, move_file};
pub use organizer::Organizer;
pub use reader::{LoftyTagReader, MemoryTagReader, TagReader};
pub use report::{FailureKind, FileFailure, OrganizeReport};
pub use resolver::{DestinationResolver, Resolution, file_name_from_tags};

// Re-export core types for convenience
pub use boofar_core::{CollisionPolicy, GroupingOrder, OrganizeConfig, TagKey, TagMap};
