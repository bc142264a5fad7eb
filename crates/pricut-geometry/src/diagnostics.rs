//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! Every call to [`process_with_diagnostics`] runs the staged pipeline
//! and records how long each stage took and what it produced.
//!
//! Time is read through the [`Clock`] trait so this crate stays free of
//! platform time sources; the caller supplies the implementation.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{ContourConfig, Drawing, GeometryError, ProcessResult};

/// Source of monotonic time for stage measurements.
pub trait Clock {
    /// An opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: validation and deduplication.
    pub ingest: StageDiagnostics,
    /// Stage 2: connected components.
    pub partition: StageDiagnostics,
    /// Stage 3: clockwise ordering.
    pub order: StageDiagnostics,
    /// Stage 4: figure measurement and nesting.
    pub figures: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Ingestion metrics.
    Ingest {
        /// Loose segments in the input.
        raw_segments: usize,
        /// Polylines in the input.
        polylines: usize,
        /// Polylines that were already closed.
        closed_polylines: usize,
        /// Edges left after deduplication.
        unique_edges: usize,
        /// Segments dropped as duplicates.
        duplicates: usize,
        /// Distinct endpoints.
        nodes: usize,
    },
    /// Partitioning metrics.
    Partition {
        /// Number of connected components.
        components: usize,
        /// Edge count of the biggest component.
        largest_component_edges: usize,
    },
    /// Ordering metrics.
    Order {
        /// Components walked.
        components: usize,
        /// Contours that returned to their start.
        closed_contours: usize,
        /// Contours that ended at a dead end.
        open_contours: usize,
        /// Component edges no walk covered.
        untraversed_edges: usize,
    },
    /// Figure metrics.
    Figures {
        /// Number of figures.
        figures: usize,
        /// Figures nested at odd depth.
        holes: usize,
        /// Outer area minus hole area (square units).
        net_area: f64,
        /// Sum of figure perimeters (units).
        cut_length: f64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Segments and polylines in the input.
    pub input_entities: usize,
    /// Contours produced.
    pub contour_count: usize,
    /// Figures produced.
    pub figure_count: usize,
}

impl PipelineDiagnostics {
    /// Display name and diagnostics of each stage, in run order.
    #[must_use]
    pub const fn stages(&self) -> [(&'static str, &StageDiagnostics); 4] {
        [
            ("Ingest", &self.ingest),
            ("Partition", &self.partition),
            ("Order", &self.order),
            ("Figures", &self.figures),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!("Input entities: {}", self.summary.input_entities));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Figures: {}",
            self.summary.contour_count, self.summary.figure_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Ingest {
            raw_segments,
            polylines,
            closed_polylines,
            unique_edges,
            duplicates,
            nodes,
        } => format!(
            "{raw_segments} segs + {polylines} polys ({closed_polylines} closed) -> {unique_edges} edges, {nodes} nodes, {duplicates} dup",
        ),
        StageMetrics::Partition {
            components,
            largest_component_edges,
        } => format!("{components} components (largest {largest_component_edges} edges)"),
        StageMetrics::Order {
            components,
            closed_contours,
            open_contours,
            untraversed_edges,
        } => format!(
            "{components} walks, {closed_contours} closed, {open_contours} open, {untraversed_edges} edges untraversed",
        ),
        StageMetrics::Figures {
            figures,
            holes,
            net_area,
            cut_length,
        } => format!("{figures} figures ({holes} holes), area={net_area:.3} cut={cut_length:.3}"),
    }
}

fn timed<C: Clock, T>(
    clock: &C,
    f: impl FnOnce() -> Result<T, GeometryError>,
) -> Result<(T, Duration), GeometryError> {
    let start = clock.now();
    let value = f()?;
    Ok((value, clock.elapsed(&start)))
}

fn stage<S: PipelineStage>(stage: &S, duration: Duration) -> StageDiagnostics {
    StageDiagnostics {
        duration,
        metrics: stage.metrics(),
    }
}

/// Run the pipeline and collect per-stage diagnostics.
///
/// # Errors
///
/// Returns the same errors as [`crate::process`].
pub fn process_with_diagnostics<C: Clock>(
    drawing: &Drawing,
    config: &ContourConfig,
    clock: &C,
) -> Result<(ProcessResult, PipelineDiagnostics), GeometryError> {
    let total_start = clock.now();

    let (ingested, d) = timed(clock, || Pipeline::new(drawing, config.clone()).ingest())?;
    let ingest = stage(&ingested, d);

    let (partitioned, d) = timed(clock, || Ok(ingested.partition()))?;
    let partition = stage(&partitioned, d);

    let (ordered, d) = timed(clock, || Ok(partitioned.order()))?;
    let order = stage(&ordered, d);

    let (figured, d) = timed(clock, || ordered.build_figures())?;
    let figures = stage(&figured, d);

    let result = figured.into_result();
    let total_duration = clock.elapsed(&total_start);

    let summary = PipelineSummary {
        input_entities: drawing.segments.len() + drawing.polylines.len(),
        contour_count: result.contours.len(),
        figure_count: result.figures.len(),
    };
    tracing::debug!(
        contours = summary.contour_count,
        figures = summary.figure_count,
        total_ms = duration_ms(total_duration),
        "pipeline finished",
    );

    Ok((
        result,
        PipelineDiagnostics {
            ingest,
            partition,
            order,
            figures,
            total_duration,
            summary,
        },
    ))
}
