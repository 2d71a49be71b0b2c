use super::*;

#[test]
fn geometry_rejects_degenerate_extents() {
    assert!(MapGeometry::new(0.0, 100.0, 1.0, 0.0).is_err());
    assert!(MapGeometry::new(100.0, 100.0, 0.0, 0.0).is_err());
    assert!(MapGeometry::new(100.0, f64::NAN, 1.0, 0.0).is_err());
    assert!(MapGeometry::new(100.0, 100.0, 1.0, -5.0).is_err());
    assert!(MapGeometry::new(100.0, 100.0, 1.0, 0.0).is_ok());
}

#[test]
fn geometry_end_and_absolute_include_begin() {
    let g = MapGeometry::new(1000.0, 200.0, 300.0, 50.0).unwrap();
    assert_eq!(g.end(), 350.0);
    assert_eq!(g.absolute(10.0), 60.0);
}

#[test]
fn coordinates_are_clamped_not_rejected() {
    let g = MapGeometry::new(1000.0, 200.0, 300.0, 0.0).unwrap();
    assert_eq!(g.clamp_x(-4.0), 0.0);
    assert_eq!(g.clamp_x(1e12), 1000.0);
    assert_eq!(g.clamp_x(f64::NAN), 0.0);

    let right = g.clamp_click_x(1e12);
    assert!(right < 1000.0 && right > 999.999);
    assert_eq!(g.clamp_click_x(1000.0), right);
    assert_eq!(g.clamp_click_x(999.5), 999.5);
    assert_eq!(g.clamp_click_x(f64::NAN), 0.0);
}

#[test]
fn ids_serialize_transparently() {
    assert_eq!(serde_json::to_string(&StateId(3)).unwrap(), "3");
    let id: TagDefId = serde_json::from_str("7").unwrap();
    assert_eq!(id, TagDefId(7));
}
