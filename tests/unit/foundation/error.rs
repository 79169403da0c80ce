use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CaptureError::unsupported_format("gif")
            .to_string()
            .contains("unsupported format: gif")
    );
    assert!(CaptureError::no_sink("x").to_string().contains("no sink:"));
    assert!(
        CaptureError::codec_init("x")
            .to_string()
            .contains("codec init error:")
    );
    assert!(CaptureError::encode("x").to_string().contains("encode error:"));
    assert!(
        CaptureError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert_eq!(
        CaptureError::AlreadyAttached.to_string(),
        "capturer already attached"
    );
    assert_eq!(
        CaptureError::Cancelled.to_string(),
        "capture start cancelled"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("disk full");
    let err = CaptureError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("disk full"));
}
