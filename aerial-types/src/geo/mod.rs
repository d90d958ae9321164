//! Geographic positions and their projection onto the Web-Mercator tile matrix.

mod datum;
mod point;
pub mod web_mercator;

pub use datum::Datum;
pub use point::ReferencePoint;
