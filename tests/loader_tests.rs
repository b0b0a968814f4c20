//! Loading YIN modules from disk and walking them

use cfgwalk::error::Error;
use cfgwalk::loaders::YinLoader;
use cfgwalk::schema::{NodeKind, SchemaTree};
use cfgwalk::settings::{Overrides, WalkSettings};
use cfgwalk::walker::{Row, Walker};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(names: &[&str]) -> SchemaTree {
    let mut loader = YinLoader::new();
    for name in names {
        loader.add_file(fixture(name)).unwrap();
    }
    loader.load().unwrap()
}

fn values<'r>(rows: &'r [Row], path: &str) -> Vec<&'r str> {
    rows.iter().filter_map(|r| r.value(path)).collect()
}

#[test]
fn test_load_fixture_module() {
    let tree = load(&["net-system.yin"]);
    assert_eq!(tree.modules(), &["net-system".to_string()]);
    assert!(tree.is_finalized());

    let server = tree.find("/system/clock/ntp/server").unwrap();
    assert_eq!(tree.node(server).data_path, "/system/server");
    let clock = tree.find("/system/clock").unwrap();
    assert_eq!(tree.node(clock).kind, NodeKind::Choice);

    let uptime = tree.find("/system/uptime").unwrap();
    assert!(!tree.node(uptime).config);
    assert_eq!(tree.typedefs().count(), 1);
    assert_eq!(tree.leaves().len(), 8);
}

#[test]
fn test_walk_fixture_module() {
    let tree = load(&["net-system.yin"]);
    let overrides = Overrides::new();
    let mut walker = Walker::new(&tree, &overrides, WalkSettings::new());
    let rows = walker.run().unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(values(&rows, "/system/mgmt-vlan"), vec!["1", "2047", "4094"]);
    assert_eq!(
        values(&rows, "/system/login"),
        vec!["net-system:ssh", "net-system:telnet", "net-system:ssh"]
    );
    assert_eq!(values(&rows, "/system/timezone"), vec!["UTC", "CET"]);
    assert_eq!(values(&rows, "/system/logging/level"), vec!["info"]);
    assert!(values(&rows, "/system/uptime").is_empty());
    for row in &rows {
        assert!(row.value("/system/server").is_none() || row.value("/system/timezone").is_none());
    }
    for hostname in values(&rows, "/system/hostname") {
        assert!((1..=8).contains(&hostname.chars().count()), "{} breaks the length facet", hostname);
    }

    let stats = walker.stats();
    assert_eq!(stats.total_leaves, 7);
    assert!(stats.omitted.is_empty());
}

#[test]
fn test_augmenting_module_from_second_file() {
    let tree = load(&["net-ext.yin", "net-system.yin"]);
    let disable = tree.find("/system/banner/disable").unwrap();
    assert_eq!(tree.node(disable).module, "net-ext");
    assert!(tree.node(disable).hints.full_command);

    let overrides = Overrides::new();
    let rows = Walker::new(&tree, &overrides, WalkSettings::new()).run().unwrap();
    for row in &rows {
        if row.value("/system/banner/disable").is_some() {
            assert!(row.value("/system/banner/motd").is_none());
        }
    }
    assert_eq!(values(&rows, "/system/banner/disable"), vec!["<empty-true>"]);
}

#[test]
fn test_overrides_file_drives_walk() {
    let tree = load(&["net-system.yin"]);
    let overrides = Overrides::from_json_file(fixture("overrides.json")).unwrap();
    let rows = Walker::new(&tree, &overrides, WalkSettings::new()).run().unwrap();

    assert_eq!(values(&rows, "/system/hostname"), vec!["r1", "r2", "r1"]);
    assert_eq!(values(&rows, "/system/mgmt-vlan"), vec!["10", "10", "10"]);
    assert!(values(&rows, "/system/login").is_empty());
}

#[test]
fn test_overrides_written_to_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overrides.json");
    fs::write(
        &path,
        r#"{ "leaf_map": { "/system/timezone": ["UTC"] }, "avoid_map": { "logging": null } }"#,
    )
    .unwrap();

    let tree = load(&["net-system.yin"]);
    let overrides = Overrides::from_json_file(&path).unwrap();
    let rows = Walker::new(&tree, &overrides, WalkSettings::new()).run().unwrap();
    assert_eq!(values(&rows, "/system/timezone"), vec!["UTC"]);
    assert!(values(&rows, "/system/logging/enabled").is_empty());
}

#[test]
fn test_unknown_override_section_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{ "leaves": {} }"#).unwrap();
    assert!(matches!(Overrides::from_json_file(&path), Err(Error::Json(_))));
}

#[test]
fn test_missing_schema_file() {
    let mut loader = YinLoader::new();
    let result = loader.add_file(fixture("does-not-exist.yin"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_error_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yin");
    fs::write(
        &path,
        r#"<module name="broken" xmlns="urn:ietf:params:xml:ns:yang:yin:1">
             <prefix value="b"/>
             <leaf name="x"/>
           </module>"#,
    )
    .unwrap();

    let err = YinLoader::load_file(&path).unwrap_err();
    match err {
        Error::MalformedInput(pe) => {
            let source = pe.source.unwrap();
            assert!(source.contains("broken.yin:3:"), "source was {}", source);
        }
        other => panic!("unexpected {:?}", other),
    }
}
