//! pricut-export: Pure preview serializers (sans-IO)
//!
//! Renders extracted contours for visual inspection. Currently supports
//! SVG.

pub mod svg;

pub use crate::svg::{SvgMetadata, build_path_data, to_svg};
