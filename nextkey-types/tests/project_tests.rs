use nextkey_types::{Error, ProjectMode};
use pretty_assertions::assert_eq;

#[test]
fn mode_round_trips_through_str() {
    for mode in [ProjectMode::Free, ProjectMode::Paid] {
        let parsed: ProjectMode = mode.as_str().parse().unwrap();
        assert_eq!(parsed, mode);
        assert_eq!(mode.to_string(), mode.as_str());
    }
}

#[test]
fn unknown_mode_is_rejected() {
    let err = "trial".parse::<ProjectMode>().unwrap_err();
    assert!(matches!(err, Error::InvalidMode(ref m) if m == "trial"));
}

#[test]
fn mode_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&ProjectMode::Paid).unwrap(), "\"paid\"");
    let mode: ProjectMode = serde_json::from_str("\"free\"").unwrap();
    assert_eq!(mode, ProjectMode::Free);
}

#[test]
fn default_mode_is_free() {
    assert_eq!(ProjectMode::default(), ProjectMode::Free);
}
