//! Driver Protocol
//!
//! The seam between parsed geometry and a rasterizing backend. The core only
//! ever talks to these traits: it streams path-construction primitives into a
//! filler and/or stroker handle, hands over a resolved paint with an opacity,
//! and reads back the accumulated extent when a bounding-box-relative
//! gradient needs the painted shape's bounds. Concrete backends implement the
//! traits independently; the core never rasterizes pixels itself.

use crate::geom::{Fixed, Point};
use crate::paint::Paint;

// ─────────────────────────────────────────────────────────────────────────────
// Stroke Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Cap style for stroke endpoints
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CapStyle {
    /// Flat cap at the endpoint
    #[default]
    Butt,
    /// Square cap extending past the endpoint
    Square,
    /// Rounded cap
    Round,
    /// Cubic-approximated rounded cap
    Cubic,
    /// Quadratic-approximated rounded cap
    Quadratic,
}

/// Join style for stroke corners
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinStyle {
    /// Miter join, sharp corner
    #[default]
    Miter,
    /// Miter join clipped at the miter limit
    MiterClip,
    /// Round join
    Round,
    /// Flat corner
    Bevel,
    /// Circular-arc join
    Arc,
    /// Circular-arc join clipped at the miter limit
    ArcClip,
}

/// Gap style used between dash segments
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapStyle {
    #[default]
    Flat,
    Round,
    Cubic,
    Quadratic,
}

/// Corner and endpoint treatment for a stroke
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JoinOptions {
    /// Limit on the miter length, in stroke widths
    pub miter_limit: Fixed,
    pub join: JoinStyle,
    /// Cap at the start of an open subpath
    pub lead_cap: CapStyle,
    /// Cap at the end of an open subpath
    pub trail_cap: CapStyle,
    pub gap: GapStyle,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            miter_limit: Fixed::from_f64(4.0),
            join: JoinStyle::default(),
            lead_cap: CapStyle::default(),
            trail_cap: CapStyle::default(),
            gap: GapStyle::default(),
        }
    }
}

/// Dash pattern in user units; an empty pattern strokes solid
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashOptions {
    pub pattern: Vec<f64>,
    pub offset: f64,
}

/// Full stroke parameter set handed to a stroker before geometry streams
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrokeOptions {
    pub width: Fixed,
    pub join: JoinOptions,
    pub dash: DashOptions,
}

// ─────────────────────────────────────────────────────────────────────────────
// Protocol Traits
// ─────────────────────────────────────────────────────────────────────────────

/// Receiver of path-construction primitives
pub trait PathSink {
    /// Starts a new subpath at `at`. If a subpath is open it is implicitly
    /// terminated first, as by `stop(false)`.
    fn start(&mut self, at: Point);
    fn line_to(&mut self, to: Point);
    fn quad_to(&mut self, ctrl: Point, to: Point);
    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point);
    /// Ends the current subpath. With `close_loop` the ends are joined by a
    /// closing segment; without it the subpath is left open.
    fn stop(&mut self, close_loop: bool);
}

/// A handle that fills accumulated geometry
pub trait Filler: PathSink {
    /// Selects the fill rule for subsequent geometry. Backends without a
    /// configurable fill rule may ignore this.
    fn set_winding(&mut self, _use_non_zero: bool) {}

    /// Commits the accumulated geometry with the given paint and opacity.
    /// Afterwards the accumulated geometry is consumed and the handle is
    /// ready for a fresh stream.
    fn draw(&mut self, paint: &Paint, opacity: f32);

    /// Bounding box (min, max) of the geometry accumulated since the last
    /// commit, or `None` when nothing has been streamed. Control points
    /// count toward the extent.
    fn path_extent(&self) -> Option<(Point, Point)>;
}

/// A handle that strokes accumulated geometry
pub trait Stroker: Filler {
    /// Configures stroke parameters; called before geometry is streamed.
    fn set_stroke_options(&mut self, options: &StrokeOptions);
}

/// A rendering backend
pub trait Driver {
    /// Returns handles for the requested capabilities only. A backend that
    /// cannot fill or stroke returns `None` for that slot even when asked.
    fn setup_drawers(
        &mut self,
        want_fill: bool,
        want_stroke: bool,
    ) -> (Option<&mut dyn Filler>, Option<&mut dyn Stroker>);
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording Driver
// ─────────────────────────────────────────────────────────────────────────────

/// One recorded path-construction call
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedOp {
    Start(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Stop(bool),
}

/// In-memory handle recording every protocol call it receives
#[derive(Clone, Debug, Default)]
pub struct RecordingHandle {
    /// Every path-construction call, across commits
    pub ops: Vec<RecordedOp>,
    /// One entry per `draw` call
    pub draws: Vec<(Paint, f32)>,
    /// Last stroke options received, if any
    pub stroke_options: Option<StrokeOptions>,
    /// Last winding selection received, if any
    pub winding: Option<bool>,
    extent: Option<(Point, Point)>,
}

impl RecordingHandle {
    fn include(&mut self, p: Point) {
        self.extent = Some(match self.extent {
            Some((min, max)) => (min.min(p), max.max(p)),
            None => (p, p),
        });
    }
}

impl PathSink for RecordingHandle {
    fn start(&mut self, at: Point) {
        self.ops.push(RecordedOp::Start(at));
        self.include(at);
    }

    fn line_to(&mut self, to: Point) {
        self.ops.push(RecordedOp::LineTo(to));
        self.include(to);
    }

    fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.ops.push(RecordedOp::QuadTo(ctrl, to));
        self.include(ctrl);
        self.include(to);
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.ops.push(RecordedOp::CubicTo(ctrl1, ctrl2, to));
        self.include(ctrl1);
        self.include(ctrl2);
        self.include(to);
    }

    fn stop(&mut self, close_loop: bool) {
        self.ops.push(RecordedOp::Stop(close_loop));
    }
}

impl Filler for RecordingHandle {
    fn set_winding(&mut self, use_non_zero: bool) {
        self.winding = Some(use_non_zero);
    }

    fn draw(&mut self, paint: &Paint, opacity: f32) {
        self.draws.push((paint.clone(), opacity));
        self.extent = None;
    }

    fn path_extent(&self) -> Option<(Point, Point)> {
        self.extent
    }
}

impl Stroker for RecordingHandle {
    fn set_stroke_options(&mut self, options: &StrokeOptions) {
        self.stroke_options = Some(options.clone());
    }
}

/// A driver that records instead of rasterizing, for tests and debugging
#[derive(Clone, Debug, Default)]
pub struct RecordingDriver {
    pub filler: RecordingHandle,
    pub stroker: RecordingHandle,
    /// How many times a fill handle was requested
    pub fill_requests: usize,
    /// How many times a stroke handle was requested
    pub stroke_requests: usize,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for RecordingDriver {
    fn setup_drawers(
        &mut self,
        want_fill: bool,
        want_stroke: bool,
    ) -> (Option<&mut dyn Filler>, Option<&mut dyn Stroker>) {
        let Self {
            filler,
            stroker,
            fill_requests,
            stroke_requests,
        } = self;
        let f = if want_fill {
            *fill_requests += 1;
            Some(filler as &mut dyn Filler)
        } else {
            None
        };
        let s = if want_stroke {
            *stroke_requests += 1;
            Some(stroker as &mut dyn Stroker)
        } else {
            None
        };
        (f, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Path;
    use crate::paint::Color;
    use crate::transform::Matrix2D;

    fn pt(x: f64, y: f64) -> Point {
        Point::from_f64(x, y)
    }

    #[test]
    fn new_subpath_implicitly_terminates_previous() {
        let mut path = Path::new();
        path.start(pt(0.0, 0.0));
        path.line_to(pt(1.0, 0.0));
        path.start(pt(5.0, 5.0));
        path.line_to(pt(6.0, 5.0));
        path.stop(true);

        let mut handle = RecordingHandle::default();
        path.draw_transformed(&mut handle, Matrix2D::IDENTITY);

        assert_eq!(
            handle.ops,
            vec![
                RecordedOp::Stop(false),
                RecordedOp::Start(pt(0.0, 0.0)),
                RecordedOp::LineTo(pt(1.0, 0.0)),
                RecordedOp::Stop(false),
                RecordedOp::Start(pt(5.0, 5.0)),
                RecordedOp::LineTo(pt(6.0, 5.0)),
                RecordedOp::Stop(true),
            ]
        );
    }

    #[test]
    fn extent_tracks_accumulated_geometry_and_resets_on_draw() {
        let mut handle = RecordingHandle::default();
        assert_eq!(handle.path_extent(), None);

        handle.start(pt(10.0, 10.0));
        handle.line_to(pt(20.0, 30.0));
        assert_eq!(handle.path_extent(), Some((pt(10.0, 10.0), pt(20.0, 30.0))));

        handle.draw(&Paint::Solid(Color::RED), 1.0);
        assert_eq!(handle.path_extent(), None);
        assert_eq!(handle.draws.len(), 1);
    }

    #[test]
    fn setup_drawers_honors_capability_requests() {
        let mut driver = RecordingDriver::new();
        let (f, s) = driver.setup_drawers(true, false);
        assert!(f.is_some());
        assert!(s.is_none());
        assert_eq!(driver.fill_requests, 1);
        assert_eq!(driver.stroke_requests, 0);
    }
}
