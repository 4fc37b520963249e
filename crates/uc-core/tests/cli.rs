//! CLI tests for uc-core.
//!
//! Validates:
//! - `resolve` binds files, presets and overrides, in every output format
//! - `validate` collects every error and maps failures to exit codes
//! - `check-version` follows the compatibility policy
//! - `init` writes a file that resolves cleanly
//! - plugin commands respect the plugin-support binding

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

/// uc-core with an isolated config directory and no UTILS_CONF_* variables.
fn uc_core(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("uc-core");
    cmd.timeout(Duration::from_secs(60))
        .env("XDG_CONFIG_HOME", home.path())
        .arg("--no-env");
    cmd
}

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("utils_conf.toml");
    fs::write(&path, content).expect("write config");
    path.display().to_string()
}

fn stdout_json(cmd: &mut Command, code: i32) -> Value {
    let output = cmd.assert().code(code).get_output().stdout.clone();
    serde_json::from_slice(&output).expect("parse JSON")
}

// ============================================================================
// resolve
// ============================================================================

#[test]
fn resolve_versioned_file_is_clean() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "schema-version = \"1.5.0\"\nlog-level = \"debug\"\ntrace-on-enter-exit = true\n",
    );
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "resolve"]), 0);

    assert_eq!(json["library_version"], "1.5.0");
    assert_eq!(json["compatibility"], "exact");
    assert_eq!(json["bindings"]["log"]["level"], "debug");
    assert_eq!(json["bindings"]["log"]["trace_enter_exit"], true);
    assert_eq!(json["bindings"]["general_alloc"]["malloc_symbol"], "malloc");
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
    assert!(json["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn resolve_without_file_warns_unversioned() {
    let dir = tempdir().unwrap();
    let json = stdout_json(uc_core(&dir).arg("resolve"), 1);
    assert_eq!(json["warnings"][0]["kind"], "unversioned");
    assert_eq!(json["bindings"]["check_handle_method"], "error-log");
}

#[test]
fn minor_drift_resolves_with_warning_exit() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "schema-version = \"1.6.0\"\nfuture-option = 3\n",
    );
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "resolve"]), 1);
    assert_eq!(json["compatibility"], "minor_drift");
    let kinds: Vec<&str> = json["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"minor_schema_drift"));
    assert!(kinds.contains(&"ignored_unknown_option"));
}

#[test]
fn major_mismatch_exits_incompatible() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "schema-version = \"2.0.0\"\n");
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "resolve"]), 12);
    assert_eq!(json["status"], "error");
    assert!(json["error"].as_str().unwrap().contains("2.0.0"));
}

#[test]
fn overrides_beat_the_file() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "schema-version = \"1.5.0\"\nlog-level = \"info\"\n");
    let json = stdout_json(
        uc_core(&dir).args(["--config", &config, "--set", "log_level=error", "resolve"]),
        0,
    );
    assert_eq!(json["bindings"]["log"]["level"], "error");
}

#[test]
fn environment_applies_unless_disabled() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "schema-version = \"1.5.0\"\n");
    let mut cmd = cargo_bin_cmd!("uc-core");
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .env("UTILS_CONF_CHECK_HANDLE_METHOD", "assert")
        .args(["--config", &config, "resolve"]);
    let json = stdout_json(&mut cmd, 0);
    assert_eq!(json["bindings"]["check_handle_method"], "assert");

    let json = stdout_json(
        uc_core(&dir)
            .env("UTILS_CONF_CHECK_HANDLE_METHOD", "assert")
            .args(["--config", &config, "resolve"]),
        0,
    );
    assert_eq!(json["bindings"]["check_handle_method"], "error-log");
}

#[test]
fn unrelated_environment_variables_are_skipped() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "schema-version = \"1.5.0\"\n");
    let mut cmd = cargo_bin_cmd!("uc-core");
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .env("UTILS_CONF_UNRELATED", "1")
        .env("UTILS_CONF_LOG_LEVEL", "warning")
        .args(["--config", &config, "resolve"]);
    let json = stdout_json(&mut cmd, 0);
    assert_eq!(json["bindings"]["log"]["level"], "warning");
}

#[test]
fn numeric_and_boolean_overrides_bind_as_custom_symbols() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "schema-version = \"1.5.0\"\ngeneral-alloc-type = \"custom\"\n",
    );
    let json = stdout_json(
        uc_core(&dir).args([
            "--config",
            &config,
            "--set",
            "custom-alloc-include=1",
            "--set",
            "custom-malloc-symbol=2",
            "--set",
            "custom-free-symbol=true",
            "resolve",
        ]),
        0,
    );
    assert_eq!(json["bindings"]["general_alloc"]["include"], "1");
    assert_eq!(json["bindings"]["general_alloc"]["malloc_symbol"], "2");
    assert_eq!(json["bindings"]["general_alloc"]["free_symbol"], "true");
}

#[test]
fn resolve_rust_format_emits_constants() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "schema-version = \"1.5.0\"\ngeneral-alloc-type = \"platform-heap\"\nplatform-heap-align = 16\n",
    );
    uc_core(&dir)
        .args(["--format", "rust", "--config", &config, "resolve"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains(
            "pub const GENERAL_ALLOC_MALLOC: Option<&str> = Some(\"heap_caps_aligned_alloc\");",
        ))
        .stdout(predicate::str::contains("pub const GENERAL_ALLOC_ALIGN: Option<u32> = Some(0x10);"));
}

#[test]
fn resolve_toml_format_lists_effective_options() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "schema-version = \"1.5.0\"\n");
    uc_core(&dir)
        .args(["--format", "toml", "--config", &config, "resolve"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("general-alloc-type = \"standard-library\""))
        .stdout(predicate::str::contains("platform-heap-align").not());
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn validate_collects_every_error() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "schema-version = \"1.5.0\"\nlog-level = \"verbose\"\ngeneral-alloc-type = \"custom\"\ncustom-malloc-symbol = \"my_malloc\"\n",
    );
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "validate"]), 11);
    assert_eq!(json["valid"], false);
    let errors = json["errors"].as_array().unwrap();
    let keys: Vec<&str> = errors.iter().filter_map(|e| e["key"].as_str()).collect();
    assert!(keys.contains(&"log-level"));
    assert!(keys.contains(&"custom-alloc-include"));
    assert!(keys.contains(&"custom-free-symbol"));
    assert!(!keys.contains(&"custom-malloc-symbol"));
}

#[test]
fn validate_ignores_inactive_options() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "schema-version = \"1.5.0\"\nplatform-heap-align = 3\ncustom-free-symbol = \"\"\n",
    );
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "validate"]), 0);
    assert_eq!(json["valid"], true);
}

#[test]
fn unknown_option_is_an_error_without_drift() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "schema-version = \"1.5.0\"\nturbo = true\n");
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "validate"]), 11);
    assert_eq!(json["errors"][0]["kind"], "unknown_option");
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "log-level = \n");
    uc_core(&dir)
        .args(["--config", &config, "validate"])
        .assert()
        .code(10);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    uc_core(&dir)
        .args(["--config", missing.to_str().unwrap(), "resolve"])
        .assert()
        .code(13);
}

// ============================================================================
// get / options / check-version / presets / schema
// ============================================================================

#[test]
fn get_reports_default_and_activity() {
    let dir = tempdir().unwrap();
    let json = stdout_json(uc_core(&dir).args(["get", "TRACE_ON_ENTER_EXIT"]), 0);
    assert_eq!(json["key"], "trace-on-enter-exit");
    assert_eq!(json["value"], false);
    assert_eq!(json["set"], false);
    assert_eq!(json["active"], false);
}

#[test]
fn get_unknown_key_fails() {
    let dir = tempdir().unwrap();
    uc_core(&dir).args(["get", "turbo"]).assert().code(11);
}

#[test]
fn options_lists_the_catalog() {
    let dir = tempdir().unwrap();
    let json = stdout_json(uc_core(&dir).arg("options"), 0);
    let options = json["option"].as_array().unwrap();
    let align = options
        .iter()
        .find(|o| o["key"] == "platform-heap-align")
        .unwrap();
    assert_eq!(align["gate"], "general-alloc-type = platform-heap");
    assert_eq!(align["default"], "1");
    let include = options
        .iter()
        .find(|o| o["key"] == "custom-alloc-include")
        .unwrap();
    assert!(include.get("default").is_none());
}

#[test]
fn check_version_follows_policy() {
    let dir = tempdir().unwrap();
    let json = stdout_json(uc_core(&dir).args(["check-version", "1.5.0"]), 0);
    assert_eq!(json["compatibility"], "exact");
    let json = stdout_json(uc_core(&dir).args(["check-version", "1.5.1"]), 0);
    assert_eq!(json["compatibility"], "patch_drift");
    let json = stdout_json(uc_core(&dir).args(["check-version", "1.6.0"]), 1);
    assert_eq!(json["compatibility"], "minor_drift");
    let json = stdout_json(uc_core(&dir).args(["check-version", "2.0.0"]), 12);
    assert_eq!(json["compatible"], false);
    uc_core(&dir).args(["check-version", "one.five"]).assert().code(11);
}

#[test]
fn presets_list_and_show() {
    let dir = tempdir().unwrap();
    let json = stdout_json(uc_core(&dir).arg("presets"), 0);
    assert_eq!(json["preset"].as_array().unwrap().len(), 4);
    let json = stdout_json(uc_core(&dir).args(["presets", "debug"]), 0);
    assert_eq!(json["check-handle-method"], "assert");
    uc_core(&dir).args(["presets", "turbo"]).assert().code(10);
}

#[test]
fn schema_describes_binding_set() {
    let dir = tempdir().unwrap();
    let json = stdout_json(uc_core(&dir).arg("schema"), 0);
    assert!(json["properties"]["general_alloc"].is_object());
    assert!(json["properties"]["plugin_support"].is_object());
}

#[test]
fn baked_bindings_are_available() {
    let dir = tempdir().unwrap();
    let json = stdout_json(uc_core(&dir).arg("baked"), 0);
    assert_eq!(json["bindings"]["schema_version"], "1.5.0");
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

// ============================================================================
// init
// ============================================================================

#[test]
fn init_writes_resolvable_file_and_refuses_overwrite() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("conf").join("utils_conf.toml");
    let out_str = out.to_str().unwrap();

    let json = stdout_json(uc_core(&dir).args(["init", "--preset", "psram", "-o", out_str]), 0);
    assert_eq!(json["status"], "created");
    assert!(fs::read_to_string(&out).unwrap().contains("preset: psram"));

    let json = stdout_json(uc_core(&dir).args(["--config", out_str, "resolve"]), 0);
    assert_eq!(json["bindings"]["general_alloc"]["backend"], "platform-heap");
    assert_eq!(json["bindings"]["cxx_global_alloc"]["backend"], "platform-heap");

    uc_core(&dir)
        .args(["init", "--preset", "minimal", "-o", out_str])
        .assert()
        .code(10);
    uc_core(&dir)
        .args(["init", "--preset", "minimal", "-o", out_str, "--force"])
        .assert()
        .code(0);
}

// ============================================================================
// plugin
// ============================================================================

#[test]
fn plugins_require_support() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "schema-version = \"1.5.0\"\n");
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "plugin", "list"]), 10);
    assert!(json["error"].as_str().unwrap().contains("disabled"));
}

#[test]
fn plugin_invoke_by_id() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "schema-version = \"1.5.0\"\nplugin-support = true\nlog-level = \"warning\"\n",
    );
    let json = stdout_json(uc_core(&dir).args(["--config", &config, "plugin", "list"]), 0);
    let ids: Vec<&str> = json["plugin"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["utils-conf.bindings", "utils-conf.option"]);

    let json = stdout_json(
        uc_core(&dir).args([
            "--config",
            &config,
            "plugin",
            "invoke",
            "utils-conf.option",
            "--input",
            r#"{"key": "log-level"}"#,
        ]),
        0,
    );
    assert_eq!(json["status"], "ok");
    assert_eq!(json["output"]["value"], "warning");

    uc_core(&dir)
        .args(["--config", &config, "plugin", "invoke", "nope"])
        .assert()
        .code(10);
}
