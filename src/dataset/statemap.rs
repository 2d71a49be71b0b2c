use crate::{
    dataset::model::{Dataset, StateDef},
    dataset::sample::Sample,
    dataset::tags::TagCatalog,
    foundation::core::{EntityId, MapGeometry, StateId, StatemapId},
    foundation::error::{StatemapError, StatemapResult},
    index::timeseries::TimeSeries,
};

/// One tracked entity (thread, CPU, queue) and its state history.
#[derive(Clone, Debug)]
pub struct Entity {
    /// Identifier; equal to the vertical position.
    pub id: EntityId,
    /// Display name, unique within the statemap.
    pub name: String,
    /// Optional description shown next to the name.
    pub description: Option<String>,
    /// Statemap this entity belongs to.
    pub statemap: StatemapId,
    /// Sample store.
    pub series: TimeSeries,
}

impl Entity {
    /// Integer rank from the top of the statemap.
    pub fn position(&self) -> usize {
        self.id.0
    }
}

/// A loaded, read-only statemap: geometry, legend, tag catalogue and entities.
///
/// Built once from a [`Dataset`] and never mutated; sessions share it behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Statemap {
    id: StatemapId,
    title: Option<String>,
    geometry: MapGeometry,
    start: Option<[u64; 2]>,
    entity_prefix: String,
    entity_kind: String,
    states: Vec<StateDef>,
    tags: TagCatalog,
    entities: Vec<Entity>,
}

impl Statemap {
    /// Parse and load a dataset document.
    pub fn from_json(text: &str) -> StatemapResult<Self> {
        Self::from_dataset(Dataset::from_json(text)?)
    }

    /// Build a statemap from a dataset, repairing what can be repaired.
    ///
    /// Only unusable geometry is rejected. Unsorted samples are sorted and tag weights
    /// that reference unknown definitions are dropped; both are logged at `warn`.
    #[tracing::instrument(skip(ds), fields(entities = ds.entities.len(), tags = ds.tags.len()))]
    pub fn from_dataset(ds: Dataset) -> StatemapResult<Self> {
        let geometry = MapGeometry::new(
            f64::from(ds.pixel_width),
            f64::from(ds.pixel_height),
            ds.time_width as f64,
            ds.begin as f64,
        )?;
        let ntags = ds.tags.len();

        let mut entities = Vec::with_capacity(ds.entities.len());
        for (position, (name, def)) in ds.entities.into_iter().enumerate() {
            let mut data = def.data;
            if !data.windows(2).all(|w| w[0].time <= w[1].time) {
                tracing::warn!(entity = %name, "samples out of order; sorting");
                data.sort_by_key(|s| s.time);
            }
            let dropped = drop_dangling_tags(&mut data, ntags);
            if dropped > 0 {
                tracing::warn!(
                    entity = %name,
                    dropped,
                    "dropped tag weights with unknown definitions"
                );
            }

            entities.push(Entity {
                id: EntityId(position),
                name,
                description: def.description,
                statemap: ds.id,
                series: TimeSeries::new(data, geometry.end()),
            });
        }

        tracing::debug!(entities = entities.len(), "statemap loaded");
        Ok(Self {
            id: ds.id,
            title: ds.title,
            geometry,
            start: ds.start,
            entity_prefix: ds.entity_prefix,
            entity_kind: ds.entity_kind,
            states: ds.states,
            tags: TagCatalog::new(ds.tags),
            entities,
        })
    }

    /// Statemap instance identifier.
    pub fn id(&self) -> StatemapId {
        self.id
    }

    /// Optional title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Pixel and time extents.
    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    /// Epoch reference `[seconds, nanoseconds]`, if the producer recorded one.
    pub fn start(&self) -> Option<[u64; 2]> {
        self.start
    }

    /// Display noun for an entity.
    pub fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    /// Element id the scene uses for `entity`.
    pub fn element_id(&self, entity: EntityId) -> Option<String> {
        self.entity(entity)
            .map(|e| format!("{}{}", self.entity_prefix, e.name))
    }

    /// Legend entries in legend order.
    pub fn states(&self) -> &[StateDef] {
        &self.states
    }

    /// Tag definition catalogue.
    pub fn tags(&self) -> &TagCatalog {
        &self.tags
    }

    /// Entities in position order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity by id.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    /// Entity by name.
    pub fn entity_by_name(&self, name: &str) -> StatemapResult<&Entity> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| StatemapError::lookup(format!("unknown entity '{name}'")))
    }

    /// State value by legend name.
    pub fn state_by_name(&self, name: &str) -> StatemapResult<StateId> {
        self.states
            .iter()
            .find(|s| s.name == name)
            .map(|s| StateId(s.value))
            .ok_or_else(|| StatemapError::lookup(format!("unknown state '{name}'")))
    }

    /// Display name of `state`, or `state N` when the legend does not name it.
    pub fn state_name(&self, state: StateId) -> String {
        self.states
            .iter()
            .find(|s| s.value == state.0)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("state {state}"))
    }

    /// Height of one entity strip in pixels.
    pub fn strip_height(&self) -> f64 {
        self.geometry.height / self.entities.len().max(1) as f64
    }
}

fn drop_dangling_tags(data: &mut [Sample], ntags: usize) -> usize {
    let mut dropped = 0;
    for sample in data {
        if let Some(tags) = &mut sample.tags {
            let before = tags.len();
            tags.retain(|id, _| id.0 < ntags);
            dropped += before - tags.len();
        }
    }
    dropped
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/statemap.rs"]
mod tests;
