//! Serializers for traced outlines.

pub mod svg;

pub use svg::{to_svg, write_svg};
