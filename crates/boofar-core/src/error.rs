//! Configuration errors.

use thiserror::Error;

use crate::tags::{MAX_GROUPING_DEPTH, TagKey};

/// Errors raised while validating run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No grouping keys were given.
    #[error("Grouping order needs at least one key")]
    EmptyGrouping,

    /// More keys than directory levels allowed.
    #[error("Grouping order has {count} keys, at most {MAX_GROUPING_DEPTH} allowed")]
    GroupingTooDeep { count: usize },

    /// The same key appears twice.
    #[error("Grouping key {key} appears more than once")]
    DuplicateGroupKey { key: TagKey },

    /// Key cannot be used for directory grouping.
    #[error("Tag {key} cannot be used for grouping (expected ARTIST, ALBUM or GENRE)")]
    NotGroupable { key: TagKey },

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::GroupingTooDeep { count: 4 };
        assert_eq!(
            err.to_string(),
            "Grouping order has 4 keys, at most 3 allowed"
        );

        let err = ConfigError::NotGroupable { key: TagKey::Title };
        assert!(err.to_string().contains("TITLE"));
    }
}
