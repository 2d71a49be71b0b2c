use super::*;

const DOC: &str = r#"{
    "id": 3,
    "timeWidth": 300,
    "begin": 1000,
    "pixelWidth": 1000,
    "pixelHeight": 40,
    "states": [ { "name": "idle", "value": 0 }, { "name": "run", "value": 1 } ],
    "tags": [ { "state": 1, "tag": "t0", "proc": "sh" } ],
    "entities": {
        "cpu0": { "data": [ { "t": 1000, "s": 0 }, { "t": 1100, "s": 1 } ] },
        "cpu1": {
            "description": "late",
            "data": [ { "t": 1200, "s": 1, "g": { "0": 0.5, "9": 0.5 } }, { "t": 1050, "s": 0 } ]
        }
    }
}"#;

#[test]
fn loads_entities_in_document_order() {
    let map = Statemap::from_json(DOC).unwrap();
    assert_eq!(map.id(), StatemapId(3));
    assert_eq!(map.entities().len(), 2);

    let cpu1 = map.entity_by_name("cpu1").unwrap();
    assert_eq!(cpu1.position(), 1);
    assert_eq!(cpu1.statemap, StatemapId(3));
    assert_eq!(cpu1.description.as_deref(), Some("late"));
    assert_eq!(map.element_id(cpu1.id).as_deref(), Some("statemap-entity-cpu1"));
    assert_eq!(map.strip_height(), 20.0);
    assert_eq!(map.entity_kind(), "Entity");
}

#[test]
fn repairs_order_and_dangling_tags() {
    let map = Statemap::from_json(DOC).unwrap();
    let cpu1 = &map.entity_by_name("cpu1").unwrap().series;
    let times: Vec<u64> = cpu1.samples().iter().map(|s| s.time).collect();
    assert_eq!(times, vec![1050, 1200]);

    let tags = cpu1.get(1).unwrap().tags.as_ref().unwrap();
    assert_eq!(tags.len(), 1);
    assert!(tags.contains_key(&crate::foundation::core::TagDefId(0)));
}

#[test]
fn series_end_is_absolute_dataset_end() {
    let map = Statemap::from_json(DOC).unwrap();
    assert_eq!(map.entities()[0].series.end(), 1300.0);
    assert_eq!(map.geometry().begin, 1000.0);
}

#[test]
fn lookups() {
    let map = Statemap::from_json(DOC).unwrap();
    assert_eq!(map.state_by_name("run").unwrap(), StateId(1));
    assert_eq!(map.state_name(StateId(1)), "run");
    assert_eq!(map.state_name(StateId(7)), "state 7");
    assert!(matches!(
        map.entity_by_name("nope"),
        Err(StatemapError::Lookup(_))
    ));
    assert!(map.state_by_name("nope").is_err());
    assert!(map.entity(EntityId(2)).is_none());
}

#[test]
fn zero_geometry_is_fatal() {
    let text = DOC.replace("\"pixelHeight\": 40", "\"pixelHeight\": 0");
    assert!(matches!(
        Statemap::from_json(&text),
        Err(StatemapError::Validation(_))
    ));
}
