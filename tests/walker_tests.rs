//! End-to-end walker behaviour on schemas built in code

use cfgwalk::error::{Error, MapKind};
use cfgwalk::schema::{IntegerKind, PatternFacet, RangeFacet, SchemaBuilder, SchemaTree, TypeSpec};
use cfgwalk::settings::{Overrides, WalkSettings};
use cfgwalk::walker::{Row, WalkItem, Walker};
use cfgwalk::xpath::XPathOverride;
use pretty_assertions::assert_eq;

fn walk(tree: &SchemaTree, overrides: &Overrides) -> Vec<Row> {
    Walker::new(tree, overrides, WalkSettings::new()).run().unwrap()
}

fn values<'r>(rows: &'r [Row], path: &str) -> Vec<&'r str> {
    rows.iter().filter_map(|r| r.value(path)).collect()
}

fn ranged(kind: IntegerKind, range: &str) -> TypeSpec {
    TypeSpec::Integer {
        kind,
        range: Some(RangeFacet::parse(range).unwrap()),
    }
}

// ============================================================================
// Domains and ordering
// ============================================================================

#[test]
fn test_integer_range_boundaries() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "n", ranged(IntegerKind::Uint16, "1..10")).unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(values(&rows, "/c/n"), vec!["1", "5", "10"]);
}

#[test]
fn test_enumeration_follows_declaration_order() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "color", TypeSpec::enumeration(["red", "green", "blue"]))
        .unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(values(&rows, "/c/color"), vec!["red", "green", "blue"]);
    let indices: Vec<usize> = rows.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_rounds_follow_the_largest_domain() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "on", TypeSpec::Boolean).unwrap();
    b.leaf(Some(c), "e", TypeSpec::enumeration(["a", "b", "c", "d"]))
        .unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(rows.len(), 4);
    assert_eq!(values(&rows, "/c/on"), vec!["false", "true", "false", "true"]);
    assert_eq!(values(&rows, "/c/e"), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_generated_strings_change_per_pass() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "name", TypeSpec::string()).unwrap();
    b.leaf(Some(c), "e", TypeSpec::enumeration(["a", "b"])).unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(values(&rows, "/c/name"), vec!["c-name1", "c-name2"]);
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn test_leaf_map_beats_type_map() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "mtu", TypeSpec::integer(IntegerKind::Uint16)).unwrap();
    b.leaf(Some(c), "port", TypeSpec::integer(IntegerKind::Uint16)).unwrap();
    let tree = b.build().unwrap();

    let overrides = Overrides::new()
        .with_type("uint16", ["7"])
        .with_leaf("/c/mtu", ["42", "43"]);
    let rows = walk(&tree, &overrides);
    assert_eq!(values(&rows, "/c/mtu"), vec!["42", "43"]);
    assert_eq!(values(&rows, "/c/port"), vec!["7", "7"]);
}

#[test]
fn test_pattern_map_supplies_pattern_strings() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    let pattern = TypeSpec::String {
        length: None,
        patterns: vec![PatternFacet::new("[a-z]+[0-9]")],
    };
    b.leaf(Some(c), "ifname", pattern).unwrap();
    let tree = b.build().unwrap();

    let overrides = Overrides::new().with_pattern("[a-z]+[0-9]", ["eth0", "eth1"]);
    let rows = walk(&tree, &overrides);
    assert_eq!(values(&rows, "/c/ifname"), vec!["eth0", "eth1"]);
}

#[test]
fn test_avoided_leaf_never_emitted() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "name", TypeSpec::string()).unwrap();
    b.leaf(Some(c), "secret", TypeSpec::Boolean).unwrap();
    let tree = b.build().unwrap();

    let overrides = Overrides::new().avoid("/c/secret");
    let mut walker = Walker::new(&tree, &overrides, WalkSettings::new());
    let rows = walker.run().unwrap();
    assert!(!rows.is_empty());
    assert!(values(&rows, "/c/secret").is_empty());

    let stats = walker.stats();
    assert_eq!(stats.avoided, vec!["/c/secret".to_string()]);
    assert_eq!(stats.omitted, vec!["/c/secret".to_string()]);
}

// ============================================================================
// Choices
// ============================================================================

#[test]
fn test_choice_cases_are_exclusive() {
    let mut b = SchemaBuilder::new("m");
    let sys = b.container(None, "sys").unwrap();
    let mode = b.choice(Some(sys), "mode").unwrap();
    let a = b.case(mode, "a").unwrap();
    b.leaf(Some(a), "x", TypeSpec::Boolean).unwrap();
    let bcase = b.case(mode, "b").unwrap();
    b.leaf(Some(bcase), "y", TypeSpec::enumeration(["p", "q", "r"]))
        .unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(rows.len(), 5);
    for row in &rows {
        let x = row.value("/sys/x").is_some();
        let y = row.value("/sys/y").is_some();
        assert!(x != y, "row {} mixes cases", row.index);
    }
    assert_eq!(values(&rows, "/sys/mode/a/x"), vec!["false", "true"]);
    assert_eq!(values(&rows, "/sys/y"), vec!["p", "q", "r"]);
}

#[test]
fn test_nested_choice_carries_into_outer_case() {
    let mut b = SchemaBuilder::new("m");
    let top = b.container(None, "top").unwrap();
    let outer = b.choice(Some(top), "o").unwrap();
    let c1 = b.case(outer, "c1").unwrap();
    let inner = b.choice(Some(c1), "i").unwrap();
    let i1 = b.case(inner, "i1").unwrap();
    b.leaf(Some(i1), "a", TypeSpec::Boolean).unwrap();
    let i2 = b.case(inner, "i2").unwrap();
    b.leaf(Some(i2), "b", TypeSpec::enumeration(["p", "q", "r"]))
        .unwrap();
    let c2 = b.case(outer, "c2").unwrap();
    let z = b.leaf(Some(c2), "z", TypeSpec::Boolean).unwrap();
    b.must(z, "../z = 'never'");
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    let seen: Vec<(&str, &str)> = rows
        .iter()
        .map(|row| {
            assert_eq!(row.len(), 1, "row {} mixes branches", row.index);
            ["a", "b", "z"]
                .into_iter()
                .find_map(|leaf| row.value(&format!("/top/{}", leaf)).map(|v| (leaf, v)))
                .unwrap()
        })
        .collect();
    assert_eq!(
        seen,
        vec![
            ("a", "false"),
            ("a", "true"),
            ("b", "p"),
            ("b", "q"),
            ("b", "r"),
            ("z", "false"),
            ("z", "true"),
        ]
    );
}

#[test]
fn test_compact_syntax_full_command_closes_line() {
    let mut b = SchemaBuilder::new("m");
    let intf = b.container(None, "intf").unwrap();
    b.hint(intf, "cli-compact-syntax");
    let shutdown = b.leaf(Some(intf), "shutdown", TypeSpec::Empty).unwrap();
    b.hint(shutdown, "cli-full-command");
    b.leaf(Some(intf), "mtu", ranged(IntegerKind::Uint16, "1..10")).unwrap();
    let tree = b.build().unwrap();

    let overrides = Overrides::new();
    let mut walker = Walker::new(&tree, &overrides, WalkSettings::new());
    let rows = walker.run().unwrap();
    assert_eq!(walker.groups().len(), 1);

    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.assignments.iter().map(ToString::to_string).collect())
        .collect();
    assert_eq!(
        rendered,
        vec![
            vec!["/intf/mtu = 1".to_string()],
            vec!["/intf/shutdown = <empty-true>".to_string()],
            vec!["/intf/mtu = 10".to_string()],
        ]
    );
}

// ============================================================================
// Conditions and CLI hints
// ============================================================================

#[test]
fn test_when_prunes_dependent_leaf() {
    let mut b = SchemaBuilder::new("m");
    let sys = b.container(None, "system").unwrap();
    b.leaf(Some(sys), "mode", TypeSpec::enumeration(["A", "B"])).unwrap();
    let extra = b.leaf(Some(sys), "extra", TypeSpec::Boolean).unwrap();
    b.when(extra, "../mode = 'A'");
    let tree = b.build().unwrap();

    let overrides = Overrides::new();
    let mut walker = Walker::new(&tree, &overrides, WalkSettings::new());
    let rows = walker.run().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value("/system/extra"), Some("false"));
    assert_eq!(rows[1].value("/system/mode"), Some("B"));
    assert_eq!(rows[1].value("/system/extra"), None);
    assert!(walker.stats().omitted.is_empty());
}

#[test]
fn test_when_disables_whole_container() {
    let mut b = SchemaBuilder::new("m");
    let sys = b.container(None, "system").unwrap();
    b.leaf(Some(sys), "enabled", TypeSpec::Boolean).unwrap();
    let opts = b.container(Some(sys), "opts").unwrap();
    b.when(opts, "../enabled = 'true'");
    b.leaf(Some(opts), "level", TypeSpec::enumeration(["lo", "hi"])).unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    for row in &rows {
        if row.value("/system/enabled") == Some("false") {
            assert_eq!(row.value("/system/opts/level"), None);
        }
    }
    assert!(!values(&rows, "/system/opts/level").is_empty());
}

#[test]
fn test_xpath_map_fixes_unparsable_condition() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "a", TypeSpec::Boolean).unwrap();
    let gated = b.leaf(Some(c), "b", TypeSpec::Boolean).unwrap();
    b.when(gated, "count(../a) > 1");
    let tree = b.build().unwrap();

    let overrides = Overrides::new().with_xpath("count(../a) > 1", XPathOverride::Fixed(false));
    let rows = walk(&tree, &overrides);
    assert_eq!(rows.len(), 2);
    assert!(values(&rows, "/c/b").is_empty());

    let missing = Walker::new(&tree, &Overrides::new(), WalkSettings::new()).run();
    match missing {
        Err(Error::MissingMapEntry { map, key, node }) => {
            assert_eq!(map, MapKind::XPath);
            assert_eq!(key, "count(../a) > 1");
            assert_eq!(node, "/c/b");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_sequence_break_drops_trailing_children() {
    let mut b = SchemaBuilder::new("m");
    let cmd = b.container(None, "cmd").unwrap();
    b.hint(cmd, "cli-sequence-commands");
    b.leaf(Some(cmd), "a", TypeSpec::Empty).unwrap();
    b.leaf(Some(cmd), "b", TypeSpec::Boolean).unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_empty());
    assert_eq!(rows[1].value("/cmd/a"), Some("<empty-true>"));
    assert_eq!(rows[1].value("/cmd/b"), Some("true"));
}

#[test]
fn test_sequence_ignores_state_children() {
    let mut b = SchemaBuilder::new("m");
    let cmd = b.container(None, "cmd").unwrap();
    b.hint(cmd, "cli-sequence-commands");
    let a = b.leaf(Some(cmd), "a", TypeSpec::Boolean).unwrap();
    b.mandatory(a, true);
    let counter = b
        .leaf(Some(cmd), "counter", TypeSpec::integer(IntegerKind::Uint32))
        .unwrap();
    b.config(counter, false);
    b.leaf(Some(cmd), "b", TypeSpec::enumeration(["x", "y"])).unwrap();
    let tree = b.build().unwrap();

    let overrides = Overrides::new();
    let mut walker = Walker::new(&tree, &overrides, WalkSettings::new());
    let rows = walker.run().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(values(&rows, "/cmd/a"), vec!["false", "true"]);
    assert_eq!(values(&rows, "/cmd/b"), vec!["x", "y"]);
    assert!(values(&rows, "/cmd/counter").is_empty());
    assert!(walker.stats().omitted.is_empty());
}

#[test]
fn test_incomplete_command_needs_a_follower() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    let vlan = b.leaf(Some(c), "vlan", TypeSpec::Boolean).unwrap();
    b.hint(vlan, "cli-incomplete-command");
    b.leaf(Some(c), "tagged", TypeSpec::Empty).unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    for row in &rows {
        if row.value("/c/vlan").is_some() {
            assert!(row.value("/c/tagged").is_some(), "dangling vlan in row {}", row.index);
        }
    }
    assert_eq!(values(&rows, "/c/vlan"), vec!["true"]);
}

// ============================================================================
// Leafrefs
// ============================================================================

#[test]
fn test_leafref_adopts_target_value() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "target", TypeSpec::enumeration(["r1", "r2"])).unwrap();
    b.leaf(Some(c), "ref", TypeSpec::leafref("../target")).unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.value("/c/ref"), row.value("/c/target"));
    }
}

#[test]
fn test_leafref_without_target_is_dropped() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "on", TypeSpec::Boolean).unwrap();
    let target = b.leaf(Some(c), "target", TypeSpec::enumeration(["r1"])).unwrap();
    b.when(target, "../on = 'true'");
    b.leaf(Some(c), "strict", TypeSpec::leafref("../target")).unwrap();
    b.leaf(
        Some(c),
        "loose",
        TypeSpec::Leafref {
            path: "../target".to_string(),
            require_instance: false,
        },
    )
    .unwrap();
    let tree = b.build().unwrap();

    let rows = walk(&tree, &Overrides::new());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value("/c/target"), None);
    assert_eq!(rows[0].value("/c/strict"), None);
    assert_eq!(rows[0].value("/c/loose"), None);
    assert_eq!(rows[1].value("/c/target"), Some("r1"));
    assert_eq!(rows[1].value("/c/strict"), Some("r1"));
    assert_eq!(rows[1].value("/c/loose"), Some("r1"));
}

// ============================================================================
// Errors and streaming
// ============================================================================

#[test]
fn test_fatal_errors_surface_before_any_row() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "ok", TypeSpec::Boolean).unwrap();
    b.leaf(Some(c), "path", TypeSpec::InstanceIdentifier).unwrap();
    let tree = b.build().unwrap();

    let overrides = Overrides::new();
    let mut items = Walker::new(&tree, &overrides, WalkSettings::new());
    match items.next() {
        Some(Err(err)) => assert!(err.is_missing_entry()),
        other => panic!("expected an error first, got {:?}", other),
    }
    assert!(items.next().is_none());

    let overrides = Overrides::new().with_type("instance-identifier", ["/c/ok"]);
    let rows = walk(&tree, &overrides);
    assert_eq!(values(&rows, "/c/path"), vec!["/c/ok", "/c/ok"]);
}

#[test]
fn test_stream_matches_rows() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "e", TypeSpec::enumeration(["a", "b", "c"])).unwrap();
    b.leaf(Some(c), "on", TypeSpec::Boolean).unwrap();
    let tree = b.build().unwrap();
    let overrides = Overrides::new();

    let rows = walk(&tree, &overrides);
    let items: Vec<WalkItem> = Walker::new(&tree, &overrides, WalkSettings::new())
        .collect::<Result<_, _>>()
        .unwrap();
    let boundaries = items.iter().filter(|i| **i == WalkItem::Boundary).count();
    assert_eq!(boundaries, rows.len());
    let assigned = items.len() - boundaries;
    assert_eq!(assigned, rows.iter().map(Row::len).sum::<usize>());
}

#[test]
fn test_walk_root_limits_scope() {
    let mut b = SchemaBuilder::new("m");
    let a = b.container(None, "a").unwrap();
    b.leaf(Some(a), "x", TypeSpec::Boolean).unwrap();
    let other = b.container(None, "b").unwrap();
    b.leaf(Some(other), "y", TypeSpec::Boolean).unwrap();
    let tree = b.build().unwrap();

    let overrides = Overrides::new();
    let mut walker = Walker::new(&tree, &overrides, WalkSettings::new().with_root("/b"));
    let rows = walker.run().unwrap();
    assert!(values(&rows, "/a/x").is_empty());
    assert_eq!(values(&rows, "/b/y"), vec!["false", "true"]);
    assert_eq!(walker.stats().total_leaves, 1);
}

#[test]
fn test_init_walk_restarts_session() {
    let mut b = SchemaBuilder::new("m");
    let c = b.container(None, "c").unwrap();
    b.leaf(Some(c), "on", TypeSpec::Boolean).unwrap();
    let tree = b.build().unwrap();
    let overrides = Overrides::new();

    let mut walker = Walker::new(&tree, &overrides, WalkSettings::new());
    let first = walker.run().unwrap();
    assert!(walker.is_terminated());
    walker.init_walk().unwrap();
    let second = walker.run().unwrap();
    assert_eq!(first, second);
}
