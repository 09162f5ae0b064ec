use thiserror::Error;

/// Rejected user input.  Every variant maps to a `400 Bad Request` at the
/// HTTP boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Points must be between {min} and {max}, got {got}")]
    PointsOutOfRange { got: i64, min: u32, max: u32 },

    #[error("{0} must not start or end with whitespace")]
    SurroundingWhitespace(&'static str),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown recurrence '{0}'")]
    UnknownRecurrence(String),

    #[error("Cannot add yourself as a friend")]
    SelfFriend,
}
