use super::*;

#[test]
fn defaults_match_the_documented_surface() {
    let o = CaptureOptions::default();
    assert_eq!(o.format, "png");
    assert_eq!(o.frames, None);
    assert_eq!(o.parallel_write_limit, 8);
    assert_eq!(o.resolve_format().unwrap().id, FormatId::Png);
}

#[test]
fn zero_frames_means_unbounded() {
    assert_eq!(CaptureOptions::default().with_frames(0).target_frames(), None);
    assert_eq!(
        CaptureOptions::default().with_frames(12).target_frames(),
        Some(12)
    );
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let o = CaptureOptions::from_json_str(r#"{ "format": "webp-lossless", "frames": 30 }"#)
        .unwrap();
    assert_eq!(o.resolve_format().unwrap().id, FormatId::WebpLossless);
    assert_eq!(o.target_frames(), Some(30));
    assert_eq!(o.parallel_write_limit, DEFAULT_PARALLEL_WRITE_LIMIT);

    let o = CaptureOptions::from_json_str(r#"{ "parallelWriteLimit": 0 }"#).unwrap();
    assert_eq!(o.parallel_write_limit, 0);
    assert_eq!(o.format, "png");
}

#[test]
fn json_rejects_unknown_fields_and_bad_types() {
    assert!(matches!(
        CaptureOptions::from_json_str(r#"{ "fps": 60 }"#),
        Err(CaptureError::Validation(_))
    ));
    assert!(CaptureOptions::from_json_str(r#"{ "frames": -1 }"#).is_err());
}

#[test]
fn unknown_format_is_only_caught_at_resolution() {
    let o = CaptureOptions::from_json_str(r#"{ "format": "gif" }"#).unwrap();
    assert!(matches!(
        o.resolve_format(),
        Err(CaptureError::UnsupportedFormat(name)) if name == "gif"
    ));
}

#[test]
fn from_path_reports_missing_files() {
    let err = CaptureOptions::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("failed to read options file"));
}
