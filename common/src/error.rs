//! エラー型定義

use crate::reconcile::MissingCondition;
use crate::types::LocationId;
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid location: {0:?} is not a non-negative integer")]
    InvalidLocation(String),

    #[error(
        "{} condition(s) failed validation for Location {location} ({anatomy}): {}",
        .missing.len(),
        format_missing(.missing)
    )]
    ValidationMismatch {
        location: LocationId,
        anatomy: String,
        missing: Vec<MissingCondition>,
    },
}

fn format_missing(missing: &[MissingCondition]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolvedPoint;

    #[test]
    fn test_error_display_invalid_location() {
        let error = Error::InvalidLocation("abc".to_string());
        assert!(error.to_string().contains("\"abc\""));
    }

    #[test]
    fn test_validation_mismatch_lists_each_condition() {
        let missing = vec![
            MissingCondition {
                index: 0,
                expected: "gout".into(),
                displayed: vec![],
                coordinates: ResolvedPoint::new(378.0, 73.0),
            },
            MissingCondition {
                index: 2,
                expected: "bursitis".into(),
                displayed: vec!["tendinitis".into()],
                coordinates: ResolvedPoint::new(385.0, 348.0),
            },
        ];
        let error = Error::ValidationMismatch {
            location: LocationId(1),
            anatomy: "Foot/Ankle/Leg".into(),
            missing,
        };
        let display = error.to_string();
        assert!(display.starts_with("2 condition(s) failed validation for Location 1 (Foot/Ankle/Leg)"));
        assert!(display.contains("point 1 \"gout\" at (378, 73)"));
        assert!(display.contains("point 3 \"bursitis\" at (385, 348)"));
    }

    #[test]
    fn test_error_kinds() {
        // I/Oを持たないクレートなので、照合に関するエラーだけを持つ
        let kind = |e: &Error| match e {
            Error::InvalidLocation(_) => "location",
            Error::ValidationMismatch { .. } => "mismatch",
        };
        assert_eq!(kind(&Error::InvalidLocation("x".into())), "location");
        let mismatch = Error::ValidationMismatch {
            location: LocationId(2),
            anatomy: "Foot/Ankle/Leg".into(),
            missing: vec![],
        };
        assert_eq!(kind(&mismatch), "mismatch");
    }
}
