//! Domain primitives shared by every pipeline stage.
//!
//! Rows are owned by the grid editor; this module only defines the typed
//! identities and cell values the pipeline reads from them.

pub mod value_objects;

pub use value_objects::*;
