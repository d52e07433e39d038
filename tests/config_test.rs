mod common;

use common::write_tree;
use prept::config::BoilerplateConfig;
use prept::error::Error;
use prept::install::InstallRoot;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

fn boilerplate(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_tree(dir.path(), &[("preptconfig.json", config)]);
    dir
}

fn invalid_field(err: Error) -> String {
    match err {
        Error::InvalidConfig { field, .. } => field,
        other => panic!("Expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn test_load_minimal() {
    let dir = boilerplate(r#"{"name": "my-bp_1"}"#);
    let config = BoilerplateConfig::load(dir.path()).unwrap();

    assert_eq!(config.name(), "my-bp_1");
    assert_eq!(config.default_generate_directory(), "my-bp_1");
    assert!(config.template_provider().is_none());
    assert!(!config.allow_extra_variables());
    assert!(config.template_variables().is_empty());
}

#[test]
fn test_name_validation() {
    for name in ["my-bp_1", "_x", "A"] {
        let dir = boilerplate(&json!({ "name": name }).to_string());
        assert!(BoilerplateConfig::load(dir.path()).is_ok(), "{name} should be accepted");
    }
    for name in ["1bad", "-x", "has space", ""] {
        let dir = boilerplate(&json!({ "name": name }).to_string());
        let err = BoilerplateConfig::load(dir.path()).unwrap_err();
        assert_eq!(invalid_field(err), "name", "{name} should be rejected");
    }
}

#[test]
fn test_missing_name() {
    let dir = boilerplate(r#"{"summary": "no name"}"#);
    assert_eq!(invalid_field(BoilerplateConfig::load(dir.path()).unwrap_err()), "name");
}

#[test]
fn test_invalid_version_is_an_error() {
    let dir = boilerplate(r#"{"name": "bp", "version": "one point oh"}"#);
    assert_eq!(invalid_field(BoilerplateConfig::load(dir.path()).unwrap_err()), "version");

    let dir = boilerplate(r#"{"name": "bp", "version": "1.2.3"}"#);
    let config = BoilerplateConfig::load(dir.path()).unwrap();
    assert_eq!(config.version().unwrap().to_string(), "1.2.3");
}

#[test]
fn test_each_field_is_validated() {
    let cases = [
        (json!({"name": "bp", "summary": 3}), "summary"),
        (json!({"name": "bp", "ignore_paths": ["ok", 1]}), "ignore_paths"),
        (json!({"name": "bp", "template_files": "*.txt"}), "template_files"),
        (json!({"name": "bp", "template_provider": false}), "template_provider"),
        (json!({"name": "bp", "allow_extra_variables": "yes"}), "allow_extra_variables"),
        (json!({"name": "bp", "template_variables": {"bad-name": {}}}), "template_variables.bad-name"),
        (json!({"name": "bp", "template_variables": {"v": {"summary": 1}}}), "template_variables.v.summary"),
    ];
    for (config, field) in cases {
        let dir = boilerplate(&config.to_string());
        assert_eq!(invalid_field(BoilerplateConfig::load(dir.path()).unwrap_err()), field);
    }
}

#[test]
fn test_config_not_found() {
    let dir = TempDir::new().unwrap();
    match BoilerplateConfig::load(dir.path()).unwrap_err() {
        Error::ConfigNotFound { path } => assert_eq!(path, dir.path()),
        other => panic!("Expected ConfigNotFound, got {other:?}"),
    }
}

#[test]
fn test_malformed_file_is_invalid_schema() {
    let dir = boilerplate("{ \"name\": ");
    assert!(matches!(
        BoilerplateConfig::load(dir.path()).unwrap_err(),
        Error::InvalidSchema { .. }
    ));
}

#[test]
fn test_yaml_config() {
    let dir = TempDir::new().unwrap();
    write_tree(
        dir.path(),
        &[(
            "preptconfig.yml",
            "name: yaml-bp\ntemplate_variables:\n  project:\n    summary: Project name\n",
        )],
    );
    let config = BoilerplateConfig::load(dir.path()).unwrap();

    assert_eq!(config.name(), "yaml-bp");
    assert_eq!(config.template_variables()["project"].summary(), Some("Project name"));
}

#[test]
fn test_dump_round_trip() {
    let schema = json!({
        "name": "full",
        "summary": "A full boilerplate",
        "version": "2.0.0-beta.1",
        "ignore_paths": [".git/", "*.log"],
        "default_generate_directory": "out",
        "template_provider": "stringsub",
        "template_files": ["*.txt"],
        "template_variables": {
            "project": {"summary": "Project name"},
            "license": {"default": "MIT"},
            "author": {"required": false},
            "empty": {"default": ""}
        },
        "allow_extra_variables": true
    });
    let dir = boilerplate(&schema.to_string());
    let config = BoilerplateConfig::load(dir.path()).unwrap();

    let dumped: serde_json::Map<String, Value> = config.dump().into_iter().collect();
    assert_eq!(Value::Object(dumped), schema);
}

#[test]
fn test_dump_omits_defaults() {
    let dir = boilerplate(r#"{"name": "bp", "ignore_paths": [], "allow_extra_variables": false}"#);
    let config = BoilerplateConfig::load(dir.path()).unwrap();

    assert_eq!(config.dump().keys().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    BoilerplateConfig::new(dir.path(), "fresh").unwrap().with_summary("Fresh").save().unwrap();

    let config = BoilerplateConfig::load(dir.path()).unwrap();
    assert_eq!(config.name(), "fresh");
    assert_eq!(config.summary(), Some("Fresh"));
}

#[test]
fn test_generated_files_exclude_config_and_ignored() {
    let dir = boilerplate(r#"{"name": "bp", "ignore_paths": ["*.secret", "!keep.secret"]}"#);
    write_tree(
        dir.path(),
        &[("a.secret", ""), ("keep.secret", ""), ("b.txt", ""), ("sub/preptconfig.json", "")],
    );
    let config = BoilerplateConfig::load(dir.path()).unwrap();

    assert_eq!(
        config.generated_files().unwrap(),
        vec![
            PathBuf::from("b.txt"),
            PathBuf::from("keep.secret"),
            PathBuf::from("sub/preptconfig.json"),
        ]
    );
    assert_eq!(config.installation_files().unwrap().len(), 5);
}

#[test]
fn test_is_template() {
    let dir = boilerplate(r#"{"name": "bp", "template_files": ["*.tmpl", "!skip.tmpl"]}"#);
    let config = BoilerplateConfig::load(dir.path()).unwrap();

    assert!(config.is_template("src/main.tmpl"));
    assert!(!config.is_template("skip.tmpl"));
    assert!(!config.is_template("main.rs"));
}

#[test]
fn test_resolve_by_path_then_name() {
    let home = TempDir::new().unwrap();
    let root = InstallRoot::new(home.path());
    write_tree(home.path(), &[("boilerplates/webapp/preptconfig.json", r#"{"name": "WebApp"}"#)]);

    let by_name = BoilerplateConfig::resolve("WEBAPP", &root).unwrap();
    assert_eq!(by_name.name(), "WebApp");

    let local = boilerplate(r#"{"name": "local"}"#);
    let by_path = BoilerplateConfig::resolve(local.path().to_str().unwrap(), &root).unwrap();
    assert_eq!(by_path.name(), "local");
}

#[test]
fn test_resolve_falls_through_when_path_has_no_config() {
    let home = TempDir::new().unwrap();
    let root = InstallRoot::new(home.path());
    let empty = TempDir::new().unwrap();

    match BoilerplateConfig::resolve(empty.path().to_str().unwrap(), &root).unwrap_err() {
        Error::BoilerplateNotFound { identifier } => {
            assert_eq!(identifier, empty.path().to_str().unwrap())
        }
        other => panic!("Expected BoilerplateNotFound, got {other:?}"),
    }
}

#[test]
fn test_resolve_reports_invalid_config_at_path() {
    let home = TempDir::new().unwrap();
    let root = InstallRoot::new(home.path());
    let broken = boilerplate(r#"{"name": "9lives"}"#);

    let err = BoilerplateConfig::resolve(broken.path().to_str().unwrap(), &root).unwrap_err();
    assert_eq!(invalid_field(err), "name");
}

#[test]
fn test_resolve_unknown_name() {
    let home = TempDir::new().unwrap();
    let root = InstallRoot::new(home.path());

    assert!(matches!(
        BoilerplateConfig::resolve("nothing-here", &root).unwrap_err(),
        Error::BoilerplateNotFound { .. }
    ));
}

#[test]
fn test_sibling_schema_files_are_not_generated() {
    let dir = boilerplate(r#"{"name": "bp"}"#);
    write_tree(
        dir.path(),
        &[("preptconfig.yml", "name: other\n"), ("preptconfig.yaml", "name: other\n"), ("a.txt", "")],
    );
    let config = BoilerplateConfig::load(dir.path()).unwrap();

    assert_eq!(config.generated_files().unwrap(), vec![PathBuf::from("a.txt")]);
    assert_eq!(config.installation_files().unwrap().len(), 4);
}

#[test]
fn test_load_bare_config_file_name() {
    let dir = boilerplate(r#"{"name": "bp"}"#);
    write_tree(dir.path(), &[("src/lib.rs", "")]);

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let loaded = BoilerplateConfig::load("preptconfig.json")
        .and_then(|config| Ok((config.path().to_path_buf(), config.generated_files()?)));
    std::env::set_current_dir(previous).unwrap();

    let (root, files) = loaded.unwrap();
    assert_eq!(root, PathBuf::from("."));
    assert_eq!(files, vec![PathBuf::from("src/lib.rs")]);
}
