//! Interactive analysis engine for statemaps.
//!
//! A statemap shows, for many entities (threads, CPUs, queues), which discrete state each
//! one occupied over time. The picture itself is produced offline; this crate is the
//! engine behind exploring it:
//!
//! 1. **Index**: per-entity sorted samples with point and range lookups ([`TimeSeries`]).
//! 2. **Viewport**: pixel↔time mapping under pan and zoom ([`Viewport`]).
//! 3. **Breakdown**: state occupancy at a point or over an interval, and occupancy by tag
//!    value within one state ([`state_over_interval`], [`tag_breakdown`]).
//! 4. **Session**: a gesture-driven controller that keeps the marker, entity detail and
//!    state inspection consistent and tells a [`Renderer`] what to show ([`Session`]).
//!
//! Everything is synchronous and headless. A loaded [`Statemap`] is read-only and can be
//! shared between sessions behind an `Arc`.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod breakdown;
mod dataset;
mod foundation;
mod index;
mod session;
mod viewport;

pub use breakdown::state::{
    StateMix, StateTotal, StateTotals, state_at, state_over_interval, state_totals,
};
pub use breakdown::tag::{TagBreakdown, TagLabel, TagQuery, TagRow, tag_breakdown};
pub use dataset::model::{Dataset, EntityDef, StateDef};
pub use dataset::sample::{Sample, SampleKind};
pub use dataset::statemap::{Entity, Statemap};
pub use dataset::tags::{TagCatalog, TagDefinition};
pub use foundation::core::{Affine, EntityId, MapGeometry, StateId, StatemapId, TagDefId};
pub use foundation::error::{StatemapError, StatemapResult};
pub use foundation::math::{EPSILON, approx_eq};
pub use foundation::units::{percent, signed_time_units, time_units};
pub use index::timeseries::{RangeVisit, RangeVisits, TimeSeries};
pub use session::controller::{MarkerSnapshot, Outcome, Session, SessionOpts, SessionSnapshot};
pub use session::detail::{EntityDetail, entity_detail, span_text, tag_header, time_to_text};
pub use session::gesture::{EntityHit, Gesture, ScriptStep, Shorthand};
pub use session::render::{
    Anchor, LabelHandle, MarkerHandle, RecordingRenderer, RenderOp, Renderer, TagPanel,
};
pub use viewport::transform::Viewport;
