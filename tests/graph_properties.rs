//! Integration tests for the property graph core
//!
//! Covers property round-trips, key index mirroring and backfill,
//! predicate semantics, manual index overlays and the reference scenario,
//! against the in-memory store and the synchronous index backend.

use propgraph::{
    Comparator, Direction, Edge, ElementClass, GraphBuilder, GraphError, Indexed, PropertyGraph,
    PropertyValue, Session, Transactional, Vertex,
};
use std::collections::{BTreeMap, BTreeSet};

fn session() -> Session {
    GraphBuilder::new().build().unwrap().open_session().unwrap()
}

fn people(s: &mut Session, ages: &[i64]) -> Vec<Vertex> {
    ages.iter()
        .map(|age| {
            let v = s.add_vertex(None).unwrap();
            s.set_property(&v, "age", *age).unwrap();
            v
        })
        .collect()
}

fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items
}

#[test]
fn test_property_round_trip() {
    let mut s = session();
    let v = s.add_vertex(None).unwrap();
    let w = s.add_vertex(None).unwrap();
    let e = s.add_edge(None, &v, &w, "knows").unwrap();

    let mut map = BTreeMap::new();
    map.insert("nested".to_string(), PropertyValue::Integer(1));
    let values: Vec<PropertyValue> = vec![
        true.into(),
        42i64.into(),
        2.5.into(),
        "marko".into(),
        vec![PropertyValue::Integer(1), "two".into()].into(),
        map.into(),
        vec![0u8, 1, 2].into(),
    ];

    for (i, value) in values.iter().enumerate() {
        let key = format!("k{}", i);
        s.set_property(&v, &key, value.clone()).unwrap();
        s.set_property(&e, &key, value.clone()).unwrap();
        assert_eq!(s.get_property(&v, &key).unwrap().as_ref(), Some(value));
        assert_eq!(s.get_property(&e, &key).unwrap().as_ref(), Some(value));
    }
    assert_eq!(s.property_keys(&v).unwrap().len(), values.len());

    for i in 0..values.len() {
        let key = format!("k{}", i);
        assert!(s.remove_property(&v, &key).unwrap().is_some());
        assert_eq!(s.get_property(&v, &key).unwrap(), None);
    }
    assert!(s.property_keys(&v).unwrap().is_empty());
    assert_eq!(s.remove_property(&v, "k0").unwrap(), None);
}

#[test]
fn test_key_index_mirrors_properties() {
    let mut s = session();
    s.create_key_index("name", ElementClass::Vertex).unwrap();
    let marko = s.add_vertex(None).unwrap();
    let josh = s.add_vertex(None).unwrap();
    s.set_property(&marko, "name", "marko").unwrap();
    s.set_property(&josh, "name", "marko").unwrap();

    assert_eq!(sorted(s.get_vertices("name", "marko").unwrap()), vec![marko, josh]);

    s.set_property(&josh, "name", "josh").unwrap();
    assert_eq!(s.get_vertices("name", "marko").unwrap(), vec![marko]);
    assert_eq!(s.get_vertices("name", "josh").unwrap(), vec![josh]);

    s.remove_property(&marko, "name").unwrap();
    assert!(s.get_vertices("name", "marko").unwrap().is_empty());

    s.remove_vertex(&josh).unwrap();
    assert!(s.get_vertices("name", "josh").unwrap().is_empty());
}

#[test]
fn test_edge_key_index() {
    let mut s = session();
    s.create_key_index("weight", ElementClass::Edge).unwrap();
    let a = s.add_vertex(None).unwrap();
    let b = s.add_vertex(None).unwrap();
    let e = s.add_edge(None, &a, &b, "knows").unwrap();
    s.set_property(&e, "weight", 0.5).unwrap();

    assert_eq!(s.get_edges("weight", 0.5).unwrap(), vec![e]);
    assert_eq!(s.indexed_keys(ElementClass::Edge).unwrap(), vec!["weight"]);
    assert!(s.indexed_keys(ElementClass::Vertex).unwrap().is_empty());

    s.remove_edge(&e).unwrap();
    assert!(s.get_edges("weight", 0.5).unwrap().is_empty());
}

#[test]
fn test_backfill_completeness() {
    let mut s = session();
    let vs = people(&mut s, &[29, 27, 29]);

    s.create_key_index("age", ElementClass::Vertex).unwrap();
    let found = sorted(s.get_vertices("age", 29i64).unwrap());
    assert_eq!(found, vec![vs[0], vs[2]]);

    // creating it again is a no-op
    s.create_key_index("age", ElementClass::Vertex).unwrap();
    assert_eq!(s.get_vertices("age", 29i64).unwrap().len(), 2);
}

#[test]
fn test_unindexed_lookup_scans() {
    let mut s = session();
    let vs = people(&mut s, &[29, 27, 29]);
    assert_eq!(sorted(s.get_vertices("age", 29i64).unwrap()), vec![vs[0], vs[2]]);
    assert!(s.get_vertices("age", 29.0).unwrap().is_empty());
}

#[test]
fn test_dropped_key_index_falls_back_to_scan() {
    let mut s = session();
    let vs = people(&mut s, &[29, 27]);
    s.create_key_index("age", ElementClass::Vertex).unwrap();
    s.drop_key_index("age", ElementClass::Vertex).unwrap();
    assert!(s.indexed_keys(ElementClass::Vertex).unwrap().is_empty());
    assert_eq!(s.get_vertices("age", 27i64).unwrap(), vec![vs[1]]);
}

#[test]
fn test_interval_is_half_open() {
    let mut s = session();
    let vs = people(&mut s, &[27, 29, 32, 35]);

    let found = s.query().interval("age", 29i64, 32i64).unwrap().vertices().unwrap();
    assert_eq!(found, vec![vs[1]]);

    s.create_key_index("age", ElementClass::Vertex).unwrap();
    let found = s.query().interval("age", 29i64, 32i64).unwrap().vertices().unwrap();
    assert_eq!(found, vec![vs[1]]);
}

#[test]
fn test_predicates_combine() {
    let mut s = session();
    let vs = people(&mut s, &[27, 29, 32, 35]);
    s.set_property(&vs[2], "name", "josh").unwrap();
    s.set_property(&vs[3], "name", "peter").unwrap();

    let found = s
        .query()
        .has_cmp("age", Comparator::GreaterThan, 30i64)
        .unwrap()
        .has_cmp("name", Comparator::NotEqual, "peter")
        .unwrap()
        .vertices()
        .unwrap();
    assert_eq!(found, vec![vs[2]]);

    // absent properties equal null
    let unnamed = s.query().has("name", PropertyValue::Null).unwrap().vertices().unwrap();
    assert_eq!(unnamed, vec![vs[0], vs[1]]);

    let none = s
        .query()
        .has_cmp("name", Comparator::LessThan, PropertyValue::Null)
        .unwrap()
        .vertices()
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_indexed_equality_drives_query() {
    let mut s = session();
    let vs = people(&mut s, &[29, 29, 35]);
    s.set_property(&vs[0], "name", "marko").unwrap();
    s.set_property(&vs[1], "name", "vadas").unwrap();
    s.create_key_index("age", ElementClass::Vertex).unwrap();

    let found = s
        .query()
        .has("name", "vadas")
        .unwrap()
        .has("age", 29i64)
        .unwrap()
        .vertices()
        .unwrap();
    assert_eq!(found, vec![vs[1]]);
}

#[test]
fn test_query_argument_validation() {
    let mut s = session();
    assert!(matches!(s.query().limit(0), Err(GraphError::ArgumentInvalid(_))));
    assert!(matches!(s.query().has("", 1i64), Err(GraphError::ArgumentInvalid(_))));
    assert!(matches!(
        s.query()
            .has_cmp("m", Comparator::GreaterThan, PropertyValue::Map(BTreeMap::new())),
        Err(GraphError::ArgumentInvalid(_))
    ));
}

#[test]
fn test_limit() {
    let mut s = session();
    let hub = s.add_vertex(None).unwrap();
    for i in 0..10i64 {
        let other = s.add_vertex(None).unwrap();
        let e = s.add_edge(None, &hub, &other, "knows").unwrap();
        s.set_property(&e, "rank", i).unwrap();
    }

    for n in [1usize, 3, 10, 25] {
        let found = s.query().limit(n).unwrap().edges().unwrap();
        assert_eq!(found.len(), n.min(10));
    }

    let heavy = s
        .query()
        .has_cmp("rank", Comparator::GreaterThanEqual, 7i64)
        .unwrap()
        .limit(5)
        .unwrap()
        .edges()
        .unwrap();
    assert_eq!(heavy.len(), 3);
}

#[test]
fn test_overlay_visibility() {
    let mut s = session();
    let index = s.create_index::<Vertex>("people").unwrap();
    let v = s.add_vertex(None).unwrap();

    s.begin().unwrap();
    index.put(&mut s, "name", "marko", &v).unwrap();
    assert_eq!(index.get(&mut s, "name", "marko").unwrap(), vec![v]);
    assert_eq!(index.count(&mut s, "name", "marko").unwrap(), 1);
    s.rollback().unwrap();
    assert!(index.get(&mut s, "name", "marko").unwrap().is_empty());

    s.begin().unwrap();
    index.put(&mut s, "name", "marko", &v).unwrap();
    s.commit().unwrap();
    assert!(!s.in_transaction());
    assert!(!s.is_dirty());
    assert_eq!(index.get(&mut s, "name", "marko").unwrap(), vec![v]);
}

#[test]
fn test_overlay_tombstone_masks_committed_hits() {
    let mut s = session();
    let index = s.create_index::<Vertex>("people").unwrap();
    let a = s.add_vertex(None).unwrap();
    let b = s.add_vertex(None).unwrap();
    index.put(&mut s, "name", "marko", &a).unwrap();
    index.put(&mut s, "name", "marko", &b).unwrap();

    s.begin().unwrap();
    index.remove(&mut s, "name", "marko", &a).unwrap();
    assert_eq!(index.count(&mut s, "name", "marko").unwrap(), 0);
    s.commit().unwrap();

    assert_eq!(index.get(&mut s, "name", "marko").unwrap(), vec![b]);
}

#[test]
fn test_manual_index_namespace() {
    let mut s = session();
    s.create_index::<Vertex>("things").unwrap();
    assert!(matches!(
        s.create_index::<Edge>("things"),
        Err(GraphError::AlreadyExists(_))
    ));
    s.create_index::<Edge>("links").unwrap();

    let names: Vec<String> = s.get_indices().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["things", "links"]);
    assert!(s.get_index::<Edge>("things").unwrap().is_none());
    assert!(s.get_index::<Vertex>("missing").unwrap().is_none());
}

#[test]
fn test_generation_wait_is_idempotent() {
    let mut s = session();
    let v = s.add_vertex(None).unwrap();
    s.create_key_index("age", ElementClass::Vertex).unwrap();
    s.set_property(&v, "age", 29i64).unwrap();
    assert!(s.is_dirty());

    s.wait_for_generation().unwrap();
    assert!(!s.is_dirty());
    let before = s.last_generation();
    s.wait_for_generation().unwrap();
    assert_eq!(s.last_generation(), before);
}

#[test]
fn test_remove_vertex_cascades() {
    let mut s = session();
    let a = s.add_vertex(None).unwrap();
    let b = s.add_vertex(None).unwrap();
    let c = s.add_vertex(None).unwrap();
    s.add_edge(None, &a, &b, "knows").unwrap();
    s.add_edge(None, &c, &a, "knows").unwrap();
    let kept = s.add_edge(None, &b, &c, "created").unwrap();

    s.remove_vertex(&a).unwrap();
    assert_eq!(s.edges().unwrap(), vec![kept]);
    assert_eq!(s.vertex_edges(&b, Direction::Both, &[]).unwrap(), vec![kept]);
    assert_eq!(s.vertex_edges(&c, Direction::Both, &[]).unwrap(), vec![kept]);
    assert_eq!(sorted(s.vertices().unwrap()), vec![b, c]);
}

#[test]
fn test_reference_scenario() {
    let mut s = session();
    let v1 = s.add_vertex(None).unwrap();
    let v2 = s.add_vertex(None).unwrap();
    s.set_property(&v1, "age", 29i64).unwrap();
    s.set_property(&v2, "age", 27i64).unwrap();
    let e = s.add_edge(None, &v1, &v2, "knows").unwrap();
    s.set_property(&e, "weight", 0.5).unwrap();

    s.create_key_index("age", ElementClass::Vertex).unwrap();

    let found = s
        .query()
        .has_cmp("age", Comparator::Equal, 29i64)
        .unwrap()
        .vertices()
        .unwrap();
    assert_eq!(found, vec![v1]);

    let found = s
        .query()
        .has_cmp("weight", Comparator::GreaterThan, 0.4)
        .unwrap()
        .edges()
        .unwrap();
    assert_eq!(found, vec![e]);
    assert_eq!(s.edge_vertex(&e, Direction::Out).unwrap(), v1);
    assert_eq!(s.edge_vertex(&e, Direction::In).unwrap(), v2);

    s.remove_vertex(&v1).unwrap();
    assert!(s.edges().unwrap().is_empty());
    let adjacent: BTreeSet<Vertex> = s
        .adjacent_vertices(&v2, Direction::Both, &[])
        .unwrap()
        .into_iter()
        .collect();
    assert!(!adjacent.contains(&v1));
    assert!(s.vertex_edges(&v2, Direction::Both, &[]).unwrap().is_empty());
}

#[test]
fn test_shutdown_invalidates_sessions() {
    let graph = GraphBuilder::new().build().unwrap();
    let mut s = graph.open_session().unwrap();
    assert_eq!(graph.session_count(), 1);
    graph.shutdown().unwrap();

    assert!(s.is_closed());
    assert!(matches!(s.add_vertex(None), Err(GraphError::InvariantViolation(_))));
    drop(s);
    assert_eq!(graph.session_count(), 0);
}
