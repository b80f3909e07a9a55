//! Tests for layered settings loading

use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use dtrules::application::ApplicationError;
use dtrules::config::{local_config_path, RawSettings, Settings};
use dtrules::domain::SingleChildPolicy;

fn write_global(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("dtrules.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_only_global_config_when_loading_then_global_applies() {
    let temp = TempDir::new().unwrap();
    let global = write_global(&temp, "single_child = \"reject\"\n");

    let settings = Settings::load_from(Some(global.as_path()), None).unwrap();

    assert_eq!(settings.single_child, SingleChildPolicy::Reject);
    assert_eq!(settings.features_file, None);
}

#[test]
fn given_local_without_policy_when_loading_then_global_policy_kept() {
    let temp = TempDir::new().unwrap();
    let global = write_global(&temp, "single_child = \"reject\"\n");
    let local = TempDir::new().unwrap();
    std::fs::write(
        local_config_path(local.path()),
        "features_file = \"/abs/features.txt\"\n",
    )
    .unwrap();

    let settings = Settings::load_from(Some(global.as_path()), Some(local.path())).unwrap();

    assert_eq!(settings.single_child, SingleChildPolicy::Reject);
    assert_eq!(
        settings.features_file,
        Some(PathBuf::from("/abs/features.txt"))
    );
}

#[rstest]
#[case::bad_policy("single_child = \"maybe\"\n")]
#[case::bad_toml("single_child = \n")]
fn given_invalid_global_when_loading_then_config_error(#[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let global = write_global(&temp, content);

    let err = Settings::load_from(Some(global.as_path()), None).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }), "{err}");
}

#[test]
fn given_template_when_parsing_then_all_keys_commented_out() {
    let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
    assert!(raw.single_child.is_none());
    assert!(raw.features_file.is_none());
}

#[test]
fn given_effective_settings_when_rendering_toml_then_round_trips() {
    let settings = Settings {
        single_child: SingleChildPolicy::Reject,
        features_file: Some(PathBuf::from("/data/features.txt")),
    };

    let rendered = settings.to_toml().unwrap();
    let raw: RawSettings = toml::from_str(&rendered).unwrap();

    assert_eq!(raw.single_child, Some(SingleChildPolicy::Reject));
    assert_eq!(raw.features_file, settings.features_file);
}
