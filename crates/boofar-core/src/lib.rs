//! Core types for boofar.
//!
//! This crate provides the data shared by the scanner and the
//! reorganization engine: tag keys and their fallback labels, grouping
//! orders, tag snapshots and run configuration.

mod config;
mod error;
mod tags;

pub use config::{CollisionPolicy, DEFAULT_EVENT_POLL_MS, OrganizeConfig, OrganizeConfigBuilder};
pub use error::ConfigError;
pub use tags::{
    GENERIC_FALLBACK, GroupingOrder, MAX_GROUPING_DEPTH, SEPARATOR_REPLACEMENT, TagKey, TagMap,
    TagSnapshot, is_usable_segment, sanitize_segment, tag_segment,
};
