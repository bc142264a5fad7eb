//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use pricut_geometry::{ContourConfig, Drawing, GeometryError, Pipeline};
//! # fn run(drawing: Drawing) -> Result<(), GeometryError> {
//! let result = Pipeline::new(&drawing, ContourConfig::default())
//!     .ingest()?
//!     .partition()
//!     .order()
//!     .build_figures()?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), so stages cannot be skipped or run
//! out of order.

use crate::contour::{Contour, double_signed_area, order_components};
use crate::diagnostics::StageMetrics;
use crate::figure::FigureSet;
use crate::ingest::{Graph, ingest_raw, parse_point};
use crate::partition::{Component, partition};
use crate::polyline::Polyline;
use crate::types::{ContourConfig, Drawing, GeometryError, Point, ProcessResult};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing: call .ingest() to continue"]
pub struct Pending<'a> {
    config: ContourConfig,
    drawing: &'a Drawing,
}

impl<'a> Pending<'a> {
    /// The unvalidated input drawing.
    #[must_use]
    pub const fn drawing(&self) -> &'a Drawing {
        self.drawing
    }

    /// Validate the drawing and build the segment graph.
    ///
    /// Loose segments are ingested first. Closed polylines become
    /// contours directly, reversed if they were drawn counter-clockwise;
    /// open ones are added to the graph segment by segment.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MalformedSegment`] or
    /// [`GeometryError::DegenerateSegment`] for a bad loose segment and
    /// [`GeometryError::MalformedPolyline`] for a polyline with a bad
    /// point.
    pub fn ingest(self) -> Result<Ingested, GeometryError> {
        let mut graph = ingest_raw(&self.drawing.segments)?;
        let mut direct = Vec::new();
        for (index, raw) in self.drawing.polylines.iter().enumerate() {
            let points = raw
                .iter()
                .enumerate()
                .map(|(i, point)| parse_point(point).map_err(|e| format!("point {i}: {e}")))
                .collect::<Result<Vec<Point>, String>>()
                .map_err(|reason| GeometryError::MalformedPolyline { index, reason })?;
            let polyline = Polyline::new(points);
            if polyline.is_closed() {
                let mut points = polyline.into_points();
                if double_signed_area(&points) > 0 {
                    points.reverse();
                }
                direct.push(Contour::new(points, true));
            } else {
                graph.insert_chain(&polyline);
            }
        }
        tracing::debug!(
            polylines = self.drawing.polylines.len(),
            closed = direct.len(),
            edges = graph.edge_count(),
            "polylines ingested",
        );
        Ok(Ingested {
            config: self.config,
            raw_segment_count: self.drawing.segments.len(),
            polyline_count: self.drawing.polylines.len(),
            graph,
            direct,
        })
    }
}

// ───────────────────────── Stage 1: Ingested ─────────────────────────

/// Pipeline state after validation and deduplication.
#[must_use = "pipeline stages are consumed by advancing: call .partition() to continue"]
pub struct Ingested {
    config: ContourConfig,
    raw_segment_count: usize,
    polyline_count: usize,
    graph: Graph,
    direct: Vec<Contour>,
}

impl Ingested {
    /// The deduplicated segment graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Contours taken directly from closed polylines.
    #[must_use]
    pub fn direct_contours(&self) -> &[Contour] {
        &self.direct
    }

    /// Split the graph into connected components.
    pub fn partition(self) -> Partitioned {
        let components = partition(&self.graph);
        Partitioned {
            config: self.config,
            graph: self.graph,
            direct: self.direct,
            components,
        }
    }
}

// ──────────────────────── Stage 2: Partitioned ───────────────────────

/// Pipeline state after connected-component partitioning.
#[must_use = "pipeline stages are consumed by advancing: call .order() to continue"]
pub struct Partitioned {
    config: ContourConfig,
    graph: Graph,
    direct: Vec<Contour>,
    components: Vec<Component>,
}

impl Partitioned {
    /// The components, sorted by smallest point.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Walk every component clockwise.
    pub fn order(self) -> Ordered {
        let mut contours = order_components(&self.components, &self.config.start_rule);
        let walked: usize = contours.iter().map(Contour::edge_count).sum();
        let untraversed = self.graph.edge_count().saturating_sub(walked);
        contours.extend(self.direct);
        Ordered {
            config: self.config,
            component_count: self.components.len(),
            untraversed,
            contours,
        }
    }
}

// ───────────────────────── Stage 3: Ordered ──────────────────────────

/// Pipeline state after clockwise ordering.
#[must_use = "pipeline stages are consumed by advancing: call .build_figures() to continue"]
pub struct Ordered {
    config: ContourConfig,
    component_count: usize,
    untraversed: usize,
    contours: Vec<Contour>,
}

impl Ordered {
    /// One contour per component, then one per closed polyline.
    #[must_use]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Component edges that no walk covered.
    #[must_use]
    pub const fn untraversed_edges(&self) -> usize {
        self.untraversed
    }

    /// Promote closed contours to figures.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnclosedFigure`] when a contour cannot be
    /// a figure and `require_closed` is set.
    pub fn build_figures(self) -> Result<Figured, GeometryError> {
        let figures = crate::figure::build_figures(&self.contours, &self.config)?;
        Ok(Figured {
            contours: self.contours,
            figures,
        })
    }
}

// ───────────────────────── Stage 4: Figured ──────────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to take the output"]
pub struct Figured {
    contours: Vec<Contour>,
    figures: FigureSet,
}

impl Figured {
    /// The figures built from closed contours.
    #[must_use]
    pub const fn figures(&self) -> &FigureSet {
        &self.figures
    }

    /// Consume the pipeline and return the [`ProcessResult`].
    #[must_use]
    pub fn into_result(self) -> ProcessResult {
        ProcessResult {
            contours: self.contours,
            figures: self.figures,
        }
    }
}

// ───────────────────────── PipelineStage trait ───────────────────────

/// Implemented by every stage that has done work, for uniform
/// diagnostics.
pub trait PipelineStage {
    /// Human-readable stage name.
    const NAME: &str;

    /// Zero-based stage index (`1` for [`Ingested`] through `4` for
    /// [`Figured`]).
    const INDEX: usize;

    /// Metrics describing the work done to reach this stage.
    fn metrics(&self) -> StageMetrics;
}

impl PipelineStage for Ingested {
    const NAME: &str = "ingest";
    const INDEX: usize = 1;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Ingest {
            raw_segments: self.raw_segment_count,
            polylines: self.polyline_count,
            closed_polylines: self.direct.len(),
            unique_edges: self.graph.edge_count(),
            duplicates: self.graph.duplicate_count(),
            nodes: self.graph.node_count(),
        }
    }
}

impl PipelineStage for Partitioned {
    const NAME: &str = "partition";
    const INDEX: usize = 2;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Partition {
            components: self.components.len(),
            largest_component_edges: self
                .components
                .iter()
                .map(Component::edge_count)
                .max()
                .unwrap_or(0),
        }
    }
}

impl PipelineStage for Ordered {
    const NAME: &str = "order";
    const INDEX: usize = 3;

    fn metrics(&self) -> StageMetrics {
        let closed = self.contours.iter().filter(|c| c.is_closed()).count();
        StageMetrics::Order {
            components: self.component_count,
            closed_contours: closed,
            open_contours: self.contours.len() - closed,
            untraversed_edges: self.untraversed,
        }
    }
}

impl PipelineStage for Figured {
    const NAME: &str = "figures";
    const INDEX: usize = 4;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Figures {
            figures: self.figures.len(),
            holes: self.figures.holes().count(),
            net_area: self.figures.net_area(),
            cut_length: self.figures.cut_length(),
        }
    }
}

/// Entry point for the staged pipeline.
///
/// See the [module docs](self) for the stage sequence.
pub struct Pipeline;

impl Pipeline {
    /// Borrow the drawing and store the config; no processing happens yet.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(drawing: &Drawing, config: ContourConfig) -> Pending<'_> {
        Pending { config, drawing }
    }
}
