//! Tests for error module

use chrono::NaiveDate;
use trajscope::error::{ErrorKind, OptionExt, TrajectoryError};

#[test]
fn test_error_display() {
    let err = TrajectoryError::InconsistentCategory {
        identifier: "car-1".to_string(),
        first: 2,
        conflicting: 5,
    };
    let text = err.to_string();
    assert!(text.contains("car-1"));
    assert!(text.contains("category 5"));

    let err = TrajectoryError::MalformedGeometry {
        document_id: "doc-9".to_string(),
        reason: "bad point".to_string(),
    };
    assert!(err.to_string().contains("doc-9"));
}

#[test]
fn test_error_kinds() {
    let t = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let cases = vec![
        (TrajectoryError::InvalidRange { from: t, to: t }, ErrorKind::Validation),
        (
            TrajectoryError::InvalidHour {
                name: "start",
                value: 25.0,
                allowed: "[0, 24)",
            },
            ErrorKind::Validation,
        ),
        (
            TrajectoryError::Decode {
                line: 1,
                reason: "x".to_string(),
            },
            ErrorKind::Validation,
        ),
        (
            TrajectoryError::EmptyGroup {
                identifier: "a".to_string(),
            },
            ErrorKind::DataQuality,
        ),
        (
            TrajectoryError::DuplicateTimestamp {
                identifier: "a".to_string(),
                timestamp: t,
            },
            ErrorKind::DataQuality,
        ),
        (
            TrajectoryError::invalid_geometry("rectangle", "zero area"),
            ErrorKind::Geometry,
        ),
        (TrajectoryError::NotFound, ErrorKind::NotFound),
        (TrajectoryError::Storage("down".to_string()), ErrorKind::Storage),
    ];
    for (err, kind) in cases {
        assert_eq!(err.kind(), kind, "{err}");
    }
}

#[test]
fn test_json_error_converts() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
    let err: TrajectoryError = parse.unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn test_option_ext() {
    let none: Option<f64> = None;
    let result = none.ok_or_validation("start_hour", "is required");
    assert!(matches!(
        result,
        Err(TrajectoryError::Validation { ref parameter, .. }) if parameter == "start_hour"
    ));
    assert_eq!(Some(3.0).ok_or_validation("start_hour", "is required").unwrap(), 3.0);
}
