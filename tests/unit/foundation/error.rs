use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(DriftError::setup("x").to_string().contains("setup error:"));
    assert!(DriftError::render("x").to_string().contains("render error:"));
    assert!(DriftError::io("x").to_string().contains("io error:"));
    assert!(
        DriftError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DriftError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_setup());
}

#[test]
fn setup_is_classified() {
    assert!(DriftError::setup("too few slots").is_setup());
    assert!(!DriftError::render("x").is_setup());
}
