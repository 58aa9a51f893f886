//! Renderable objects module.

mod points;

pub use points::Points;
