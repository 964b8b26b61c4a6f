use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, TicklineError>;

/// Validation failures on malformed input. None of these are transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicklineError {
    /// The range start lies after its end.
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A view mode string other than day, week or month.
    #[error("unsupported view mode '{0}' (expected day, week or month)")]
    UnsupportedMode(String),

    /// The timezone id is not in the IANA database.
    #[error("invalid timezone '{id}': {reason}")]
    InvalidTimezone { id: String, reason: String },

    #[error("unsupported locale '{0}' (expected ja, en or iso)")]
    UnsupportedLocale(String),

    #[error("unrecognized instant '{0}'")]
    InvalidInstant(String),

    /// A timestamp without an explicit UTC offset under the strict policy.
    #[error("timestamp '{0}' has no UTC offset; add one (e.g. +09:00 or Z)")]
    MissingOffset(String),

    #[error("local time '{input}' does not exist in {timezone}")]
    NonexistentLocalTime { input: String, timezone: String },

    /// The instant's local date in `timezone` is past the representable
    /// calendar range.
    #[error("instant {instant} has no representable date in {timezone}")]
    DateOutOfRange {
        instant: DateTime<Utc>,
        timezone: String,
    },

    #[error("invalid calendar date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("range produces more than {limit} ticks")]
    RangeTooLarge { limit: usize },
}
