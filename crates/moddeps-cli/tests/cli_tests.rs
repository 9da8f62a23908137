use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn moddeps_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("moddeps"))
}

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// x -> {y, z}, y -> {z}
fn write_xyz(dir: &Path) {
    write(
        dir,
        "src/x.js",
        indoc! {r#"
            base.defineModule("x")
                .stylesheet("x")
                .dependsOn("y", "z")
                .exportsTo("xyz", function() { });
        "#},
    );
    write(
        dir,
        "src/y.js",
        indoc! {r#"
            base.defineModule("y")
                .dependsOn("z")
                .exportsTo("xyz", function() { });
        "#},
    );
    write(
        dir,
        "src/z.js",
        indoc! {r#"
            base.defineModule("z")
                .exportsTo("xyz", function() { });
        "#},
    );
}

// ============================================================================
// OUTPUT FORMATS
// ============================================================================

#[test]
fn test_prints_names_in_load_order() {
    let temp_dir = TempDir::new().unwrap();
    write_xyz(temp_dir.path());

    moddeps_cmd()
        .current_dir(&temp_dir)
        .arg("src/x.js")
        .assert()
        .success()
        .stdout("z\ny\nx\n");
}

#[test]
fn test_prints_paths() {
    let temp_dir = TempDir::new().unwrap();
    write_xyz(temp_dir.path());

    let output = moddeps_cmd()
        .current_dir(&temp_dir)
        .args(["--format", "paths", "src/x.js"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("z.js"));
    assert!(lines[1].ends_with("y.js"));
    assert_eq!(lines[2], "src/x.js");
}

#[test]
fn test_prints_json_manifest() {
    let temp_dir = TempDir::new().unwrap();
    write_xyz(temp_dir.path());

    moddeps_cmd()
        .current_dir(&temp_dir)
        .args(["--format", "json", "src/x.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scripts\""))
        .stdout(predicate::str::contains("\"styleSheets\""));
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_search_path_flag() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "lib/base.js", "base.defineModule('base');");
    write(
        temp_dir.path(),
        "app/main.js",
        "base.defineModule('main').dependsOn('base');",
    );

    moddeps_cmd()
        .current_dir(&temp_dir)
        .args(["-I", "lib", "app/main.js"])
        .assert()
        .success()
        .stdout("base\nmain\n");
}

#[test]
fn test_default_config_file_is_picked_up() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "moddeps.yaml", "searchPaths:\n  - lib\n");
    write(temp_dir.path(), "lib/base.js", "base.defineModule('base');");
    write(
        temp_dir.path(),
        "app/main.js",
        "base.defineModule('main').dependsOn('base');",
    );

    moddeps_cmd()
        .current_dir(&temp_dir)
        .arg("app/main.js")
        .assert()
        .success()
        .stdout("base\nmain\n");
}

#[test]
fn test_allow_undeclared_flag() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "src/legacy.js", "window.legacy = {};");
    write(
        temp_dir.path(),
        "src/app.js",
        "base.defineModule('app').dependsOn('legacy');",
    );

    moddeps_cmd()
        .current_dir(&temp_dir)
        .arg("src/app.js")
        .assert()
        .failure();

    moddeps_cmd()
        .current_dir(&temp_dir)
        .args(["--allow-undeclared", "src/app.js"])
        .assert()
        .success()
        .stdout("legacy\napp\n");
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "broken.json", "{ nope");
    write_xyz(temp_dir.path());

    moddeps_cmd()
        .current_dir(&temp_dir)
        .args(["--config", "broken.json", "src/x.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_missing_dependency_fails() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "src/a.js",
        "base.defineModule('a').dependsOn('nonexistent');",
    );

    moddeps_cmd()
        .current_dir(&temp_dir)
        .arg("src/a.js")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'nonexistent'"));
}

#[test]
fn test_cycle_fails() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "src/a.js", "base.defineModule('a').dependsOn('b');");
    write(temp_dir.path(), "src/b.js", "base.defineModule('b').dependsOn('a');");

    moddeps_cmd()
        .current_dir(&temp_dir)
        .arg("src/a.js")
        .assert()
        .failure()
        .stderr(predicate::str::contains("a -> b -> a"));
}

#[test]
fn test_requires_input_files() {
    moddeps_cmd().assert().failure();
}
