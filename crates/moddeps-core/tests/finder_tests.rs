use std::fs;
use std::path::Path;
use std::sync::Arc;

use moddeps_core::fs::MockFileSystem;
use moddeps_core::{
    calc_load_sequence, calc_load_sequence_with, DeclarationPolicy, LoadManifest, ResolveError,
    ResolverConfig, ResourceFinder,
};
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_entry_resolves_sibling_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "src/base.js", "base.defineModule('base');");
    write(
        temp_dir.path(),
        "src/unittest.js",
        "base.defineModule('unittest').dependsOn('base');",
    );

    let finder = ResourceFinder::new(&ResolverConfig::default());
    let sequence = calc_load_sequence(&[temp_dir.path().join("src/unittest.js")], &finder).unwrap();

    assert_eq!(sequence.names(), vec!["base", "unittest"]);
    let base = sequence.modules().next().unwrap();
    assert_eq!(base.filename(), Some(temp_dir.path().join("src/base.js").as_path()));
}

#[test]
fn test_search_paths_used_after_siblings() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "lib/util.js", "defineModule('util').stylesheet('util');");
    write(
        temp_dir.path(),
        "app/main.js",
        "defineModule('main').stylesheet('main').dependsOn('util');",
    );

    let config = ResolverConfig {
        search_paths: vec![temp_dir.path().join("lib")],
        ..ResolverConfig::default()
    };
    let finder = ResourceFinder::new(&config);
    let sequence = calc_load_sequence(&[temp_dir.path().join("app/main.js")], &finder).unwrap();

    let manifest = LoadManifest::from_sequence(&sequence);
    assert_eq!(manifest.style_sheets, vec!["util", "main"]);
}

#[test]
fn test_missing_entry_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let finder = ResourceFinder::new(&ResolverConfig::default());

    let err = calc_load_sequence(&[temp_dir.path().join("absent.js")], &finder).unwrap_err();
    assert!(matches!(err, ResolveError::Io { .. }));
}

#[test]
fn test_custom_extension_with_mock_file_system() {
    let mut mock = MockFileSystem::new();
    mock.add_file("/web/app.mjs", "defineModule('app').dependsOn('dom')");
    mock.add_file("/web/dom.mjs", "defineModule('dom')");

    let config = ResolverConfig {
        extension: "mjs".to_string(),
        ..ResolverConfig::default()
    };
    let finder = ResourceFinder::with_file_system(Arc::new(mock), &config);
    let sequence = calc_load_sequence(&["/web/app.mjs"], &finder).unwrap();

    assert_eq!(sequence.names(), vec!["dom", "app"]);
}

#[test]
fn test_undeclared_dependency_allowed_by_policy() {
    let mut mock = MockFileSystem::new();
    mock.add_file("/web/app.js", "defineModule('app').dependsOn('legacy')");
    mock.add_file("/web/legacy.js", "window.legacy = {};");
    let finder = ResourceFinder::with_file_system(Arc::new(mock), &ResolverConfig::default());

    let err = calc_load_sequence(&["/web/app.js"], &finder).unwrap_err();
    assert!(matches!(err, ResolveError::MalformedDeclaration { .. }));

    let sequence =
        calc_load_sequence_with(&["/web/app.js"], &finder, DeclarationPolicy::Optional).unwrap();
    assert_eq!(sequence.names(), vec!["legacy", "app"]);
}
