pub(crate) mod controller;
pub(crate) mod detail;
pub(crate) mod gesture;
pub(crate) mod render;
