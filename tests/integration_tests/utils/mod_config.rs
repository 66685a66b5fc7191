use nexusgate::{Acknowledgment, ClientOptions, DbError, ReadMode};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn loads_toml_file() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(file, "[read_preference]\nmode = \"secondary\"\n[write_concern]\nw = 2").unwrap();
    let opts = ClientOptions::from_file(file.path()).unwrap();
    assert_eq!(opts.read_preference.mode(), ReadMode::Secondary);
    assert_eq!(opts.write_concern.acknowledgment(), Some(&Acknowledgment::Nodes(2)));
}

#[test]
fn loads_json_file() {
    let mut file = NamedTempFile::with_suffix(".json").unwrap();
    write!(
        file,
        r#"{{ "app_name": "billing", "write_concern": {{ "w": "dc-east", "j": true }}, "logging": {{ "level": "warn" }} }}"#
    )
    .unwrap();
    let opts = ClientOptions::from_file(file.path()).unwrap();
    assert_eq!(opts.app_name.as_deref(), Some("billing"));
    assert_eq!(opts.write_concern.acknowledgment(), Some(&Acknowledgment::Tag("dc-east".into())));
    assert_eq!(opts.logging.level.as_deref(), Some("warn"));
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClientOptions::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, DbError::Config(_)));
}

#[test]
fn primary_with_tags_is_rejected() {
    let err = ClientOptions::from_toml_str(
        "[read_preference]\nmode = \"primary\"\ntagSets = [{ dc = \"east\" }]\n",
    )
    .unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)));
}
