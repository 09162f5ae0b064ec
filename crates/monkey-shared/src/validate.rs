//! Input checks applied before anything reaches the store.

use chrono::NaiveDate;

use crate::constants::{DATE_FORMAT, MAX_TASK_POINTS, MIN_TASK_POINTS};
use crate::error::ValidationError;

/// Reject empty or whitespace-only values for a required field.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

/// Usernames are stored and looked up verbatim, so surrounding whitespace is
/// refused rather than stripped.
pub fn username<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    required(field, value)?;
    if value.trim() != value {
        return Err(ValidationError::SurroundingWhitespace(field));
    }
    Ok(value)
}

/// Task points must fall within `MIN_TASK_POINTS..=MAX_TASK_POINTS`.
pub fn task_points(points: i64) -> Result<u32, ValidationError> {
    let out_of_range = ValidationError::PointsOutOfRange {
        got: points,
        min: MIN_TASK_POINTS,
        max: MAX_TASK_POINTS,
    };
    let points = u32::try_from(points).map_err(|_| out_of_range.clone())?;
    if !(MIN_TASK_POINTS..=MAX_TASK_POINTS).contains(&points) {
        return Err(out_of_range);
    }
    Ok(points)
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn calendar_date(date: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("name", "  Read  ").unwrap(), "Read");
        assert_eq!(
            required("name", "   "),
            Err(ValidationError::MissingField("name"))
        );
    }

    #[test]
    fn test_username_is_verbatim() {
        assert_eq!(username("username", "alice").unwrap(), "alice");
        assert_eq!(username("username", "mary jane").unwrap(), "mary jane");
        assert_eq!(
            username("username", "alice "),
            Err(ValidationError::SurroundingWhitespace("username"))
        );
        assert_eq!(
            username("friendUsername", "\tbob"),
            Err(ValidationError::SurroundingWhitespace("friendUsername"))
        );
        assert_eq!(
            username("username", " "),
            Err(ValidationError::MissingField("username"))
        );
    }

    #[test]
    fn test_task_points_bounds() {
        assert_eq!(task_points(1).unwrap(), 1);
        assert_eq!(task_points(100).unwrap(), 100);
        assert!(task_points(0).is_err());
        assert!(task_points(101).is_err());
        assert!(task_points(-5).is_err());
        assert!(task_points(i64::MAX).is_err());
    }

    #[test]
    fn test_calendar_date() {
        assert!(calendar_date("2024-03-04").is_ok());
        assert!(calendar_date("2024-3-4x").is_err());
        assert!(calendar_date("04/03/2024").is_err());
        assert!(calendar_date("2024-02-30").is_err());
    }
}
