pub(crate) mod model;
pub(crate) mod sample;
pub(crate) mod statemap;
pub(crate) mod tags;
