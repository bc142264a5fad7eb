//! pricut-geometry: contour extraction for laser-cut drawings (sans-IO).
//!
//! Turns the unordered line geometry of a flattened CAD drawing into
//! ordered outlines through:
//! ingest (validate, quantize, deduplicate) -> partition (connected
//! components) -> order (clockwise walk) -> figures (area, perimeter,
//! nesting).
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! data and returns structured results. Reading drawings and writing
//! previews lives in the CLI and `pricut-export`.

pub mod contour;
pub mod coord;
pub mod diagnostics;
pub mod figure;
pub mod ingest;
pub mod partition;
pub mod pipeline;
pub mod polyline;
pub mod types;

pub use contour::{Contour, StartSelector, Winding};
pub use coord::{Coord, QuantizeError};
pub use figure::{Figure, FigureSet};
pub use ingest::{Graph, ingest, ingest_raw};
pub use partition::{Component, partition};
pub use pipeline::Pipeline;
pub use polyline::Polyline;
pub use types::{
    ContourConfig, Drawing, EdgeKey, GeometryError, Point, ProcessResult, RawCoord, RawPoint,
    RawPolyline, RawSegment, Segment, StartRule,
};

/// Run the full contour extraction pipeline.
///
/// # Pipeline steps
///
/// 1. Validate and quantize every coordinate, drop duplicate segments
/// 2. Split the segment graph into connected components
/// 3. Walk each component clockwise into a contour
/// 4. Promote closed contours to figures
///
/// # Errors
///
/// Returns [`GeometryError::MalformedSegment`],
/// [`GeometryError::DegenerateSegment`] or
/// [`GeometryError::MalformedPolyline`] for bad input, and
/// [`GeometryError::UnclosedFigure`] when a contour is not closed and
/// `config.require_closed` is set.
pub fn process(drawing: &Drawing, config: &ContourConfig) -> Result<ProcessResult, GeometryError> {
    Ok(Pipeline::new(drawing, config.clone())
        .ingest()?
        .partition()
        .order()
        .build_figures()?
        .into_result())
}

/// Order loose segments into contours without building figures.
///
/// Open contours are returned as they are.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateSegment`] for the first
/// zero-length segment.
pub fn extract_contours(segments: &[Segment], rule: StartRule) -> Result<Vec<Contour>, GeometryError> {
    let graph = ingest(segments)?;
    Ok(contour::order_components(&partition(&graph), &rule))
}
