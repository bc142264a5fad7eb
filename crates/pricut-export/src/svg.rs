//! SVG preview serializer.
//!
//! Converts extracted contours into an SVG string with `<path>` elements
//! using the [`svg`] crate for document construction, XML escaping, and
//! path data formatting.
//!
//! Each contour becomes a separate `<path>`: `M` to its start, `L` to
//! each following point, and `Z` when the contour is closed. Drawing
//! coordinates grow upward while SVG coordinates grow downward, so the
//! y axis is flipped and the `viewBox` is fitted to the drawing's
//! bounding box plus a margin.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::collections::HashSet;

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use pricut_geometry::{Contour, Figure, Point, ProcessResult};

/// Margin around the drawing as a fraction of its larger extent.
const MARGIN_RATIO: f64 = 0.05;

/// Stroke colour of outer outlines.
const OUTLINE_STROKE: &str = "black";
/// Stroke colour of holes.
const HOLE_STROKE: &str = "#d62728";
/// Stroke colour of open contours.
const OPEN_STROKE: &str = "#ff7f0e";

/// Metadata to embed in the SVG document.
///
/// When present, a `<title>` and/or `<desc>` element is emitted
/// immediately after the opening `<svg>` tag. Text values are
/// XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, typically the drawing file stem.
    pub title: Option<&'a str>,

    /// Document description, typically the extraction settings.
    pub description: Option<&'a str>,

    /// Serialized [`ContourConfig`](pricut_geometry::ContourConfig),
    /// emitted inside `<metadata>` so previews carry the settings that
    /// produced them.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a contour, in drawing
/// coordinates.
///
/// Returns an empty string for contours with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use pricut_geometry::{Contour, Point};
/// use pricut_export::build_path_data;
///
/// let contour = Contour::new(vec![Point::from_int(1, 2), Point::from_int(3, 4)], false);
/// assert_eq!(build_path_data(&contour), "M1,2 L3,4");
/// ```
#[must_use]
pub fn build_path_data(contour: &Contour) -> String {
    path_data(contour, |p| p.to_f64())
}

/// Maps drawing coordinates into the flipped, margin-padded `viewBox`.
#[derive(Debug, Clone, Copy)]
struct ViewTransform {
    min_x: f64,
    max_y: f64,
    margin: f64,
    width: f64,
    height: f64,
}

impl ViewTransform {
    fn fit(contours: &[Contour]) -> Self {
        let mut points = contours.iter().flat_map(Contour::points).map(|p| p.to_f64());
        let Some((x0, y0)) = points.next() else {
            return Self {
                min_x: 0.0,
                max_y: 0.0,
                margin: 0.0,
                width: 1.0,
                height: 1.0,
            };
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let extent = (max_x - min_x).max(max_y - min_y);
        let margin = if extent > 0.0 {
            extent * MARGIN_RATIO
        } else {
            1.0
        };
        Self {
            min_x,
            max_y,
            margin,
            width: 2.0f64.mul_add(margin, max_x - min_x),
            height: 2.0f64.mul_add(margin, max_y - min_y),
        }
    }

    fn apply(&self, point: Point) -> (f64, f64) {
        let (x, y) = point.to_f64();
        (x - self.min_x + self.margin, self.max_y - y + self.margin)
    }
}

fn path_data(contour: &Contour, tx: impl Fn(Point) -> (f64, f64)) -> String {
    let points = if contour.is_closed() {
        contour.vertices()
    } else {
        contour.points()
    };
    if points.len() < 2 {
        return String::new();
    }

    let mut data = Data::new().move_to(tx(points[0]));
    for &p in &points[1..] {
        data = data.line_to(tx(p));
    }
    if contour.is_closed() {
        data = data.close();
    }
    String::from(Value::from(data))
}

/// Serialize contours into an SVG preview document.
///
/// Closed contours that are holes of another figure are stroked in a
/// distinct colour; open contours are dashed. Contours with fewer than
/// 2 points are skipped.
///
/// # Examples
///
/// ```
/// use pricut_geometry::{ContourConfig, Drawing, process};
/// use pricut_export::{SvgMetadata, to_svg};
///
/// let drawing: Drawing = serde_json::from_str(
///     r#"{"segments": [[[0, 0], [4, 0]], [[4, 0], [0, 3]], [[0, 3], [0, 0]]]}"#,
/// ).unwrap();
/// let result = process(&drawing, &ContourConfig::default()).unwrap();
/// let metadata = SvgMetadata {
///     title: Some("triangle"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&result, &metadata);
/// assert!(svg.contains("<title>triangle</title>"));
/// assert_eq!(svg.matches("<path").count(), 1);
/// ```
#[must_use]
pub fn to_svg(result: &ProcessResult, metadata: &SvgMetadata<'_>) -> String {
    let view = ViewTransform::fit(&result.contours);
    let holes: HashSet<&[Point]> = result.figures.holes().map(Figure::ring).collect();

    let mut doc = Document::new()
        .set("width", view.width)
        .set("height", view.height)
        .set("viewBox", (0, 0, view.width, view.height));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("pricut:config");
        config_el.assign("xmlns:pricut", "urn:pricut:config");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    for contour in &result.contours {
        let d = path_data(contour, |p| view.apply(p));
        if d.is_empty() {
            continue;
        }

        let stroke = if !contour.is_closed() {
            OPEN_STROKE
        } else if holes.contains(contour.vertices()) {
            HOLE_STROKE
        } else {
            OUTLINE_STROKE
        };
        let mut path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", stroke)
            .set("stroke-width", 1)
            .set("vector-effect", "non-scaling-stroke");
        if !contour.is_closed() {
            path = path.set("stroke-dasharray", "4 2");
        }
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
