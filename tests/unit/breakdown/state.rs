use super::*;
use crate::dataset::sample::Sample;
use crate::foundation::math::{EPSILON, approx_eq};

const IDLE: StateId = StateId(0);
const RUN: StateId = StateId(1);

fn cpu0() -> TimeSeries {
    TimeSeries::new(
        vec![Sample::single(0, 0), Sample::single(100, 1), Sample::single(300, 0)],
        300.0,
    )
}

fn cpu1() -> TimeSeries {
    TimeSeries::new(
        vec![Sample::blend(0, [(0, 0.25), (1, 0.75)]), Sample::single(200, 0)],
        300.0,
    )
}

#[test]
fn state_at_single_and_blend() {
    assert_eq!(state_at(&cpu0(), 150.0).into_iter().collect::<Vec<_>>(), vec![(RUN, 1.0)]);
    let blend = state_at(&cpu1(), 10.0);
    assert_eq!(blend.get(&IDLE), Some(&0.25));
    assert_eq!(blend.get(&RUN), Some(&0.75));
}

#[test]
fn state_at_before_first_sample_is_empty() {
    let late = TimeSeries::new(vec![Sample::single(100, 0)], 300.0);
    assert!(state_at(&late, 50.0).is_empty());
    assert!(state_at(&TimeSeries::default(), 50.0).is_empty());
}

#[test]
fn interval_weights_by_clipped_span() {
    let mix = state_over_interval(&cpu0(), 0.0, 300.0);
    assert!(approx_eq(mix[&IDLE], 1.0 / 3.0, EPSILON));
    assert!(approx_eq(mix[&RUN], 2.0 / 3.0, EPSILON));
    assert!(approx_eq(mix.values().sum::<f64>(), 1.0, EPSILON));
}

#[test]
fn interval_over_blends_sums_to_one() {
    let mix = state_over_interval(&cpu1(), 100.0, 300.0);
    assert!(approx_eq(mix[&IDLE], 0.5 * 0.25 + 0.5, EPSILON));
    assert!(approx_eq(mix[&RUN], 0.5 * 0.75, EPSILON));
    assert!(approx_eq(mix.values().sum::<f64>(), 1.0, EPSILON));
}

#[test]
fn degenerate_intervals() {
    assert!(state_over_interval(&cpu0(), 200.0, 100.0).is_empty());
    assert_eq!(state_over_interval(&cpu0(), 150.0, 150.0), state_at(&cpu0(), 150.0));
    assert!(state_over_interval(&cpu0(), f64::NAN, 100.0).is_empty());
}

#[test]
fn totals_across_entities() {
    let a = cpu0();
    let b = cpu1();
    let totals = state_totals([&a, &b], 150.0, None);
    assert_eq!(totals.sum, 2.0);
    let run = totals.get(RUN).unwrap();
    assert_eq!(run.total, 1.75);
    assert_eq!(run.label(), "1 (87%)");
    let idle = totals.get(IDLE).unwrap();
    assert_eq!(idle.label(), "0 (12%)");
    assert_eq!(totals.rows[0].state, RUN);
}

#[test]
fn totals_over_range() {
    let a = cpu0();
    let totals = state_totals([&a], 0.0, Some(300.0));
    assert!(approx_eq(totals.sum, 1.0, EPSILON));
    assert!(approx_eq(totals.get(RUN).unwrap().fraction, 2.0 / 3.0, EPSILON));
}

#[test]
fn totals_of_nothing_are_empty() {
    let totals = state_totals(std::iter::empty(), 0.0, None);
    assert!(totals.rows.is_empty());
    assert_eq!(totals.sum, 0.0);
}
