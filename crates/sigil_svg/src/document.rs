//! Icon Document
//!
//! The parsed result: a viewport, an ordered display list of resolved
//! drawable items, the gradient and definition tables and any captured
//! metadata text. Construction is incremental during parsing; afterwards the
//! document is immutable except for the viewport-to-target transform, and is
//! safe to share read-only across concurrent draws against independent
//! drivers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path as FilePath;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;

use sigil_core::{
    DashOptions, Driver, Filler, Fixed, Gradient, GradientUnits, Matrix2D, Paint, Path, Point,
    Rect, StrokeOptions, Stroker,
};

use crate::cursor::{Definition, IconCursor};
use crate::error::{ErrorMode, SvgError};
use crate::style::{PaintValue, PathStyle};

/// The source-space rectangle defining the icon's native coordinate extent
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One display-list item: a resolved path with its style snapshot
///
/// The style snapshot carries the transform composed from the document root
/// down to the emitting element.
#[derive(Clone, Debug)]
pub struct StyledPath {
    pub path: Path,
    pub style: PathStyle,
}

/// A parsed icon
#[derive(Clone, Debug, Default)]
pub struct Icon {
    pub view_box: ViewBox,
    /// Drawable items in document order; later items paint over earlier ones
    pub paths: Vec<StyledPath>,
    /// Deferred definition groups, replayable by `use`
    pub defs: FxHashMap<String, Vec<Definition>>,
    /// Gradients keyed by identifier, resolved at draw time
    pub grads: FxHashMap<String, Gradient>,
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    /// Viewport-to-target transform applied when drawing
    pub transform: Matrix2D,
}

impl Icon {
    /// Parses icon markup from a string.
    ///
    /// This supports a subset of SVG, enough to draw many icons; `mode`
    /// selects whether constructs outside the subset abort the parse, are
    /// skipped silently, or are skipped with a warning.
    pub fn parse(markup: &str, mode: ErrorMode) -> Result<Icon, SvgError> {
        Self::from_reader(markup.as_bytes(), mode)
    }

    /// Parses icon markup from a buffered reader.
    pub fn from_reader<R: BufRead>(reader: R, mode: ErrorMode) -> Result<Icon, SvgError> {
        let mut xml = Reader::from_reader(reader);
        let mut cursor = IconCursor::new(mode);
        let mut buf = Vec::new();

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let (name, attrs) = element_parts(&e)?;
                    cursor.start_element(&name, &attrs)?;
                }
                Event::Empty(e) => {
                    // a self-closing element is a start/end pair
                    let (name, attrs) = element_parts(&e)?;
                    cursor.start_element(&name, &attrs)?;
                    cursor.end_element(&name);
                }
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    cursor.end_element(&name);
                }
                Event::Text(t) => cursor.text(&t.unescape()?),
                Event::CData(t) => {
                    let data = t.into_inner();
                    cursor.text(&String::from_utf8_lossy(&data));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let icon = cursor.into_icon();
        tracing::debug!(paths = icon.paths.len(), "parsed icon markup");
        Ok(icon)
    }

    /// Parses icon markup from a file.
    pub fn from_file(path: impl AsRef<FilePath>, mode: ErrorMode) -> Result<Icon, SvgError> {
        Self::from_reader(BufReader::new(File::open(path)?), mode)
    }

    /// Computes the transform mapping the viewport onto the target
    /// rectangle; subsequent draws render into that rectangle.
    pub fn set_target(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let vb = self.view_box;
        if vb.w <= 0.0 || vb.h <= 0.0 {
            self.transform = Matrix2D::translate(x - vb.x, y - vb.y);
            return;
        }
        self.transform = Matrix2D::translate(x, y)
            .mult(Matrix2D::scale(w / vb.w, h / vb.h))
            .mult(Matrix2D::translate(-vb.x, -vb.y));
    }

    /// Replays the display list against `driver` in document order.
    ///
    /// `opacity` multiplies every item's own fill and stroke opacity.
    pub fn draw(&self, driver: &mut dyn Driver, opacity: f32) {
        for item in &self.paths {
            item.draw_transformed(driver, opacity, &self.grads, self.transform);
        }
    }
}

impl StyledPath {
    /// Draws this item under an extra transform applied after the item's
    /// own (typically the document's viewport transform).
    pub fn draw_transformed(
        &self,
        driver: &mut dyn Driver,
        opacity: f32,
        grads: &FxHashMap<String, Gradient>,
        target: Matrix2D,
    ) {
        let style = &self.style;
        if style.hidden || self.path.is_empty() {
            return;
        }
        let m = target.mult(style.transform);

        let want_fill = paint_available(&style.fill, grads);
        let want_stroke = paint_available(&style.stroke, grads);
        if !want_fill && !want_stroke {
            return;
        }

        let (filler, stroker) = driver.setup_drawers(want_fill, want_stroke);

        if let Some(filler) = filler {
            filler.set_winding(style.use_non_zero_winding);
            self.path.draw_transformed(filler, m);
            if let Some(paint) = resolve_paint(&style.fill, grads, m, filler.path_extent()) {
                filler.draw(&paint, style.fill_opacity as f32 * opacity);
            }
        }

        if let Some(stroker) = stroker {
            stroker.set_stroke_options(&stroke_options(style, m));
            self.path.draw_transformed(stroker, m);
            if let Some(paint) = resolve_paint(&style.stroke, grads, m, stroker.path_extent()) {
                stroker.draw(&paint, style.stroke_opacity as f32 * opacity);
            }
        }
    }
}

/// Whether a paint value will produce a draw call. An unresolved gradient
/// reference resolves to no paint at all: the drawer is never requested,
/// for fill and stroke alike.
fn paint_available(value: &PaintValue, grads: &FxHashMap<String, Gradient>) -> bool {
    match value {
        PaintValue::None => false,
        PaintValue::Color(_) => true,
        PaintValue::Ref(id) => grads.contains_key(id),
    }
}

fn resolve_paint(
    value: &PaintValue,
    grads: &FxHashMap<String, Gradient>,
    m: Matrix2D,
    extent: Option<(Point, Point)>,
) -> Option<Paint> {
    match value {
        PaintValue::None => None,
        PaintValue::Color(c) => Some(Paint::Solid(*c)),
        PaintValue::Ref(id) => {
            let mut grad = grads.get(id)?.clone();
            match grad.units {
                GradientUnits::ObjectBoundingBox => {
                    // evaluated against the shape's rendered extent
                    let (min, max) = extent?;
                    grad.bounds = Rect::from_extent(min, max);
                }
                GradientUnits::UserSpaceOnUse => {
                    // geometry streams in device space, so the gradient's
                    // user-space coordinates ride along the same transform
                    grad.matrix = m.mult(grad.matrix);
                }
            }
            Some(Paint::Gradient(grad))
        }
    }
}

/// Stroke parameters for this item, with scalar quantities scaled the same
/// way the geometry is.
fn stroke_options(style: &PathStyle, m: Matrix2D) -> StrokeOptions {
    let scale = m.scale_factor();
    StrokeOptions {
        width: Fixed::from_f64(style.line_width * scale),
        join: style.join,
        dash: DashOptions {
            pattern: style.dash.pattern.iter().map(|d| d * scale).collect(),
            offset: style.dash.offset * scale,
        },
    }
}

fn element_parts(e: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>), SvgError> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok((name, attrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_target_maps_viewport_corners() {
        let mut icon = Icon {
            view_box: ViewBox {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 10.0,
            },
            ..Icon::default()
        };
        icon.set_target(0.0, 0.0, 100.0, 50.0);
        assert_eq!(icon.transform.apply_point(0.0, 0.0), (0.0, 0.0));
        assert_eq!(icon.transform.apply_point(10.0, 10.0), (100.0, 50.0));
    }

    #[test]
    fn set_target_honors_viewbox_origin() {
        let mut icon = Icon {
            view_box: ViewBox {
                x: 5.0,
                y: 5.0,
                w: 10.0,
                h: 10.0,
            },
            ..Icon::default()
        };
        icon.set_target(0.0, 0.0, 10.0, 10.0);
        assert_eq!(icon.transform.apply_point(5.0, 5.0), (0.0, 0.0));
    }

    #[test]
    fn degenerate_viewbox_falls_back_to_translation() {
        let mut icon = Icon::default();
        icon.set_target(3.0, 4.0, 100.0, 100.0);
        assert_eq!(icon.transform.apply_point(0.0, 0.0), (3.0, 4.0));
    }
}
