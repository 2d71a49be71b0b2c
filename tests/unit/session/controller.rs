use super::*;
use crate::dataset::model::Dataset;
use crate::foundation::core::Affine;
use crate::foundation::math::approx_eq;
use crate::session::render::RecordingRenderer;

const DOC: &str = r#"{
    "timeWidth": 1000,
    "pixelWidth": 1000,
    "pixelHeight": 40,
    "entityKind": "CPU",
    "states": [ { "name": "idle", "value": 0 }, { "name": "run", "value": 1 } ],
    "tags": [
        { "state": 1, "reason": "io" },
        { "state": 1, "reason": "mutex" },
        { "state": 0, "reason": "spin" }
    ],
    "entities": {
        "cpu0": { "data": [
            { "t": 0, "s": 0 },
            { "t": 400, "s": 1, "g": { "0": 1.0 } },
            { "t": 800, "s": 0 }
        ] },
        "cpu1": { "data": [
            { "t": 0, "s": 1, "g": { "0": 0.25, "1": 0.75 } },
            { "t": 600, "s": 0 }
        ] }
    }
}"#;

const RUN: StateId = StateId(1);
const IDLE: StateId = StateId(0);

fn session_with(opts: SessionOpts) -> Session<RecordingRenderer> {
    let map = Arc::new(Statemap::from_json(DOC).unwrap());
    Session::new(map, RecordingRenderer::new(), opts)
}

fn session() -> Session<RecordingRenderer> {
    session_with(SessionOpts::default())
}

fn click(x: f64) -> Gesture {
    Gesture::PrimaryClick { x, hit: None }
}

fn click_entity(x: f64, entity: usize) -> Gesture {
    Gesture::PrimaryClick {
        x,
        hit: Some(EntityHit {
            entity: EntityId(entity),
            sample: None,
        }),
    }
}

fn key(k: &str) -> Gesture {
    Gesture::TagKeyClick { key: k.to_string() }
}

fn value(v: &str) -> Gesture {
    Gesture::TagValueClick {
        value: v.to_string(),
    }
}

fn percent(s: &Session<RecordingRenderer>, value: &str) -> f64 {
    s.snapshot()
        .selection
        .and_then(|p| p.breakdown)
        .and_then(|b| b.percent_of(value))
        .unwrap()
}

#[test]
fn new_session_publishes_identity() {
    let s = session();
    assert_eq!(s.renderer().span_label(), "span = 1000.00ns");
    assert_eq!(s.renderer().transform(), Affine::IDENTITY);
    assert!(s.viewport().is_identity());
}

#[test]
fn primary_click_places_marker_and_totals() {
    let mut s = session();
    assert_eq!(s.handle(click(500.0)), Outcome::Applied);

    let snap = s.snapshot();
    let marker = snap.marker.unwrap();
    assert_eq!(marker.time, 500.0);
    assert_eq!(marker.x, Some(500.0));
    assert_eq!(marker.text, "offset = 500.00ns");

    let totals = snap.state_totals.unwrap();
    assert_eq!(totals.get(RUN).unwrap().label(), "2 (100%)");
    assert_eq!(s.renderer().live_markers(), vec![500.0]);
    assert_eq!(
        s.renderer().live_labels(),
        vec!["2 (100%)", "offset = 500.00ns"]
    );
}

#[test]
fn replacing_marker_releases_everything() {
    let mut s = session();
    s.handle(click_entity(500.0, 1));
    s.handle(Gesture::ModifierClick { x: 700.0 });
    s.handle(click(100.0));

    let r = s.renderer();
    assert_eq!(r.live_markers(), vec![100.0]);
    assert_eq!(r.live_labels(), vec!["1 (50%)", "1 (50%)", "offset = 100.00ns"]);
    assert_eq!(r.stale_removals(), 0);
    assert!(s.snapshot().detail.is_none());
    assert!(s.snapshot().delta.is_none());
}

#[test]
fn entity_hit_produces_detail() {
    let mut s = session();
    s.handle(click_entity(500.0, 1));
    let detail = s.snapshot().detail.unwrap();
    assert_eq!(detail.text, "CPU cpu1, run at 0 for 600.00ns");
    assert_eq!(detail.sample, 0);

    assert_eq!(s.handle(Gesture::DismissDetail), Outcome::Applied);
    assert!(s.snapshot().detail.is_none());
    assert_eq!(s.handle(Gesture::DismissDetail), Outcome::Ignored);
}

#[test]
fn unknown_entity_hit_still_places_marker() {
    let mut s = session();
    assert_eq!(s.handle(click_entity(500.0, 9)), Outcome::Applied);
    assert!(s.snapshot().marker.is_some());
    assert!(s.snapshot().detail.is_none());
}

#[test]
fn modifier_click_needs_marker() {
    let mut s = session();
    assert_eq!(s.handle(Gesture::ModifierClick { x: 700.0 }), Outcome::Ignored);

    s.handle(click(500.0));
    assert_eq!(s.handle(Gesture::ModifierClick { x: 700.0 }), Outcome::Applied);
    let delta = s.snapshot().delta.unwrap();
    assert_eq!(delta.text, "+200.00ns");

    s.handle(Gesture::ModifierClick { x: 200.0 });
    assert_eq!(s.snapshot().delta.unwrap().text, "-300.00ns");
    assert_eq!(s.renderer().live_markers().len(), 2);
    assert_eq!(s.renderer().stale_removals(), 0);
}

#[test]
fn dismiss_marker_removes_marker_and_delta() {
    let mut s = session();
    assert_eq!(s.handle(Gesture::DismissMarker), Outcome::Ignored);
    s.handle(click(500.0));
    s.handle(Gesture::ModifierClick { x: 700.0 });
    assert_eq!(s.handle(Gesture::DismissMarker), Outcome::Applied);
    assert!(s.renderer().live_markers().is_empty());
    assert!(s.renderer().live_labels().is_empty());
}

#[test]
fn legend_click_toggles_and_switches() {
    let mut s = session();
    assert_eq!(s.handle(Gesture::LegendClick { state: RUN }), Outcome::Applied);
    let panel = s.renderer().tag_panel().unwrap().clone();
    assert_eq!(panel.state_name, "run");
    assert_eq!(panel.keys, vec!["reason"]);
    assert!(panel.breakdown.is_none());

    s.handle(key("reason"));
    s.handle(Gesture::LegendClick { state: IDLE });
    let panel = s.renderer().tag_panel().unwrap();
    assert_eq!(panel.state, IDLE);
    assert!(panel.active_key.is_none());
    assert_eq!(s.renderer().highlighted().iter().copied().collect::<Vec<_>>(), vec![IDLE]);

    assert_eq!(s.handle(Gesture::LegendClick { state: IDLE }), Outcome::Applied);
    assert!(s.renderer().tag_panel().is_none());
    assert!(s.renderer().highlighted().is_empty());
    assert!(s.snapshot().selection.is_none());
}

#[test]
fn legend_click_ignores_unknown_states() {
    let mut s = session();
    assert_eq!(s.handle(Gesture::LegendClick { state: StateId(7) }), Outcome::Ignored);
}

#[test]
fn legend_click_without_tags_is_ignored() {
    let mut ds = Dataset::from_json(DOC).unwrap();
    ds.tags.clear();
    let map = Statemap::from_dataset(ds).unwrap();
    assert!(map.tags().is_empty());
    let mut s = Session::new(Arc::new(map), RecordingRenderer::new(), SessionOpts::default());
    assert_eq!(s.handle(Gesture::LegendClick { state: RUN }), Outcome::Ignored);
}

#[test]
fn tag_breakdown_at_marker() {
    let mut s = session();
    s.handle(click(500.0));
    s.handle(Gesture::LegendClick { state: RUN });
    assert_eq!(s.handle(key("reason")), Outcome::Applied);

    assert!(approx_eq(percent(&s, "io"), 62.5, 1e-9));
    assert!(approx_eq(percent(&s, "mutex"), 37.5, 1e-9));
    let panel = s.snapshot().selection.unwrap();
    assert_eq!(panel.header.as_deref(), Some("By reason at 500.00ns:"));
    assert!(approx_eq(panel.breakdown.unwrap().total, 100.0, 1e-9));
}

#[test]
fn tag_breakdown_over_visible_span() {
    let mut s = session();
    s.handle(Gesture::LegendClick { state: RUN });
    s.handle(key("reason"));
    assert!(approx_eq(percent(&s, "io"), 27.5, 1e-9));
    assert!(approx_eq(percent(&s, "mutex"), 22.5, 1e-9));
    assert_eq!(
        s.snapshot().selection.unwrap().header.as_deref(),
        Some("By reason over span:")
    );

    s.handle(Gesture::Zoom {
        factor: 2.0,
        anchor: None,
    });
    assert!(approx_eq(percent(&s, "io"), 43.75, 1e-9));
    assert!(approx_eq(percent(&s, "mutex"), 26.25, 1e-9));
}

#[test]
fn detail_pins_breakdown_to_entity() {
    let mut s = session();
    s.handle(Gesture::LegendClick { state: RUN });
    s.handle(key("reason"));
    s.handle(click_entity(500.0, 1));
    assert!(approx_eq(percent(&s, "io"), 25.0, 1e-9));
    assert_eq!(
        s.snapshot().selection.unwrap().header.as_deref(),
        Some("CPU cpu1 by reason at 500.00ns:")
    );

    s.handle(Gesture::DismissDetail);
    assert!(approx_eq(percent(&s, "io"), 62.5, 1e-9));

    s.handle(Gesture::DismissMarker);
    assert!(approx_eq(percent(&s, "io"), 27.5, 1e-9));
}

#[test]
fn tag_key_toggles_off() {
    let mut s = session();
    assert_eq!(s.handle(key("reason")), Outcome::Ignored);
    s.handle(Gesture::LegendClick { state: RUN });
    assert_eq!(s.handle(key("nope")), Outcome::Ignored);
    s.handle(key("reason"));
    s.handle(key("reason"));
    let panel = s.snapshot().selection.unwrap();
    assert!(panel.active_key.is_none());
    assert!(panel.breakdown.is_none());
}

#[test]
fn tag_value_paints_matching_samples() {
    let mut s = session();
    s.handle(Gesture::LegendClick { state: RUN });
    assert_eq!(s.handle(value("io")), Outcome::Ignored);
    s.handle(key("reason"));
    assert_eq!(s.handle(value("zzz")), Outcome::Ignored);
    assert_eq!(s.handle(value("spin")), Outcome::Ignored);

    assert_eq!(s.handle(value("io")), Outcome::Applied);
    let paint = s.renderer().paint().clone();
    assert_eq!(paint.len(), 2);
    assert_eq!(paint[&(EntityId(0), 1)], 0.0);
    assert_eq!(paint[&(EntityId(1), 0)], 0.75);
    assert_eq!(
        s.renderer().tag_panel().unwrap().active_value.as_deref(),
        Some("io")
    );

    s.handle(value("mutex"));
    assert_eq!(s.renderer().paint().len(), 1);
    assert_eq!(s.renderer().paint()[&(EntityId(1), 0)], 0.25);

    s.handle(value("mutex"));
    assert!(s.renderer().paint().is_empty());
    assert!(s.renderer().tag_panel().unwrap().active_value.is_none());
}

#[test]
fn leaving_inspection_clears_paint() {
    let mut s = session();
    s.handle(Gesture::LegendClick { state: RUN });
    s.handle(key("reason"));
    s.handle(value("io"));
    s.handle(Gesture::LegendClick { state: RUN });
    assert!(s.renderer().paint().is_empty());
}

#[test]
fn zoom_follows_marker_and_pan_hides_it() {
    let mut s = session();
    s.handle(click(500.0));
    s.handle(Gesture::Zoom {
        factor: 2.0,
        anchor: Some(100.0),
    });
    assert_eq!(s.viewport().translate_x, -500.0);
    let marker = s.snapshot().marker.unwrap();
    assert_eq!(marker.x, Some(500.0));
    assert_eq!(marker.text, "offset = 500.00ns, 500.00ns overall");

    s.handle(Gesture::Pan { dx: 600.0, dy: 0.0 });
    assert_eq!(s.snapshot().marker.unwrap().x, None);
    assert!(s.renderer().live_markers().is_empty());
    assert_eq!(s.renderer().live_labels(), vec!["2 (100%)"]);

    s.handle(Gesture::Pan { dx: -600.0, dy: 0.0 });
    assert_eq!(s.snapshot().marker.unwrap().x, Some(400.0));
    assert_eq!(s.renderer().stale_removals(), 0);
}

#[test]
fn zoom_without_follow_keeps_anchor() {
    let mut s = session_with(SessionOpts {
        zoom_follows_marker: false,
        ..SessionOpts::default()
    });
    s.handle(click(100.0));
    s.handle(Gesture::Zoom {
        factor: 4.0,
        anchor: None,
    });
    assert_eq!(s.viewport().translate_x, -1500.0);
    assert_eq!(s.snapshot().marker.unwrap().x, None);

    let mut s = session();
    s.handle(click(100.0));
    s.handle(Gesture::Zoom {
        factor: 4.0,
        anchor: None,
    });
    assert_eq!(s.viewport().translate_x, 0.0);
    assert_eq!(s.snapshot().marker.unwrap().x, Some(400.0));
}

#[test]
fn viewport_changes_publish_transform_and_span() {
    let mut s = session();
    s.handle(Gesture::Zoom {
        factor: 2.0,
        anchor: None,
    });
    assert_eq!(
        s.renderer().transform().as_coeffs(),
        [2.0, 0.0, 0.0, 1.0, -500.0, 0.0]
    );
    assert_eq!(
        s.renderer().span_label(),
        "span = 500.00ns; offset = 250.00ns, 250.00ns overall"
    );
    assert_eq!(s.snapshot().span_label, s.renderer().span_label());
}

#[test]
fn no_op_gestures_leave_no_trace() {
    let mut s = session();
    s.renderer_mut().take_ops();
    assert_eq!(s.handle(Gesture::Pan { dx: -50.0, dy: 0.0 }), Outcome::Ignored);
    assert_eq!(
        s.handle(Gesture::Zoom {
            factor: 0.8,
            anchor: None
        }),
        Outcome::Ignored
    );
    assert_eq!(
        s.handle(Gesture::Zoom {
            factor: f64::NAN,
            anchor: None
        }),
        Outcome::Ignored
    );
    assert_eq!(s.handle(Gesture::DismissMarker), Outcome::Ignored);
    assert!(s.renderer().ops().is_empty());
}

#[test]
fn malformed_coordinates_are_clamped() {
    let mut s = session();
    s.handle(click(f64::NAN));
    assert_eq!(s.snapshot().marker.unwrap().time, 0.0);
    s.handle(click(1e12));
    let time = s.snapshot().marker.unwrap().time;
    assert!(time < 1000.0 && approx_eq(time, 1000.0, 1e-9));
}

#[test]
fn click_past_right_edge_stays_visible_across_zooms() {
    let mut s = session();
    s.handle(click(5000.0));
    let x = s.snapshot().marker.unwrap().x.unwrap();
    assert!(x < 1000.0);

    assert_eq!(
        s.handle(Gesture::Zoom {
            factor: 2.0,
            anchor: None
        }),
        Outcome::Applied
    );
    assert!(s.snapshot().marker.unwrap().x.is_some());

    assert_eq!(
        s.handle(Gesture::Zoom {
            factor: 0.5,
            anchor: None
        }),
        Outcome::Applied
    );
    assert!(s.viewport().is_identity());
    let back = s.snapshot().marker.unwrap().x.unwrap();
    assert!(approx_eq(back, x, 1e-9));
    assert_eq!(s.renderer().live_markers().len(), 1);

    s.handle(Gesture::ModifierClick { x: 5000.0 });
    assert!(s.snapshot().delta.unwrap().x.is_some());
}

#[test]
fn snapshot_serializes() {
    let mut s = session();
    s.handle(click_entity(500.0, 0));
    s.handle(Gesture::LegendClick { state: RUN });
    s.handle(key("reason"));
    let json = serde_json::to_value(s.snapshot()).unwrap();
    assert_eq!(json["marker"]["text"], "offset = 500.00ns");
    assert_eq!(json["selection"]["active_key"], "reason");
    assert_eq!(json["viewport"]["scale"], 1.0);
}
