pub mod entities;
pub mod graph;
pub mod repositories;
pub mod value_objects;
