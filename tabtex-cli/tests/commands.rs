use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn themes_lists_builtins_and_marks_nothing_current_by_default() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("tabtex");
    cmd.current_dir(dir.path()).arg("themes");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("  minimal (built-in)"))
        .stdout(predicate::str::contains("  striped (built-in)"))
        .stdout(predicate::str::contains("*").not());
}

#[test]
fn themes_include_configured_themes() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(
        &config,
        r#"[style]
theme = "report"

[themes.report]
shading_color = "gray!15"
striped = true
"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("tabtex");
    cmd.current_dir(dir.path())
        .arg("themes")
        .arg("--config")
        .arg(config.as_os_str());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("* report (custom)"));
}

#[test]
fn project_config_is_picked_up_from_the_working_directory() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("tabtex.toml"),
        "[document]\nclass_options = [\"11pt\"]\n",
    )
    .unwrap();
    fs::write(dir.path().join("data.csv"), "a,b\n1,2\n").unwrap();

    let mut cmd = cargo_bin_cmd!("tabtex");
    cmd.current_dir(dir.path())
        .arg("data.csv")
        .arg("--source-only");

    cmd.assert().success();
    let source = fs::read_to_string(dir.path().join("data.tex")).unwrap();
    assert!(source.starts_with("\\documentclass[11pt]{article}"));
}

#[test]
fn broken_config_exits_with_failure() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[output]\ncrop = \"sometimes\"\n").unwrap();

    let mut cmd = cargo_bin_cmd!("tabtex");
    cmd.current_dir(dir.path())
        .arg("themes")
        .arg("--config")
        .arg(config.as_os_str());

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn check_reports_a_missing_compiler() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("tabtex");
    cmd.current_dir(dir.path())
        .env("TABTEX_COMPILER", dir.path().join("no-compiler"))
        .arg("check");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("missing"));
}

#[cfg(unix)]
#[test]
fn check_succeeds_when_tools_exist() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let tool = dir.path().join("tool");
    fs::write(&tool, "#!/bin/sh\n").unwrap();
    let mut perms = fs::metadata(&tool).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&tool, perms).unwrap();

    let mut cmd = cargo_bin_cmd!("tabtex");
    cmd.current_dir(dir.path())
        .env("TABTEX_COMPILER", &tool)
        .env("TABTEX_CROPPER", &tool)
        .arg("check");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(tool.to_string_lossy().to_string()));
}
