//! Fixed-Point Path Geometry
//!
//! Paths store their coordinates as 26.6 fixed point (1/64 unit granularity),
//! so repeated transforms and replays never accumulate floating-point drift in
//! the stored geometry. Every higher-level shape is reduced to a sequence of
//! five path operations; replaying a path against a driver dispatches on the
//! operation variant at a single call site.

use std::fmt;

use crate::driver::PathSink;
use crate::transform::Matrix2D;

// ─────────────────────────────────────────────────────────────────────────────
// Fixed-Point Coordinates
// ─────────────────────────────────────────────────────────────────────────────

/// 26.6 signed fixed-point coordinate (64 units per integer step)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(64);

    pub fn from_f32(v: f32) -> Self {
        Fixed((v * 64.0).round() as i32)
    }

    pub fn from_f64(v: f64) -> Self {
        Fixed((v * 64.0).round() as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 64.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 64.0
    }

    pub fn min(self, other: Fixed) -> Fixed {
        Fixed(self.0.min(other.0))
    }

    pub fn max(self, other: Fixed) -> Fixed {
        Fixed(self.0.max(other.0))
    }
}

impl fmt::Display for Fixed {
    /// Prints the decimal value with 3 fractional digits, the precision used
    /// by the canonical path text form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.to_f64())
    }
}

/// 2D point in fixed-point user units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: Fixed,
    pub y: Fixed,
}

impl Point {
    pub const ZERO: Point = Point {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: Fixed::from_f64(x),
            y: Fixed::from_f64(y),
        }
    }

    /// Componentwise minimum (used for extent tracking)
    pub fn min(self, other: Point) -> Point {
        Point::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Componentwise maximum (used for extent tracking)
    pub fn max(self, other: Point) -> Point {
        Point::new(self.x.max(other.x), self.y.max(other.y))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Operations
// ─────────────────────────────────────────────────────────────────────────────

/// A single path operation
///
/// The set is closed: everything drawable reduces to these five variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathOp {
    /// Start a new subpath at the given point
    MoveTo(Point),
    /// Straight segment to the given point
    LineTo(Point),
    /// Quadratic Bézier segment (control, end)
    QuadTo(Point, Point),
    /// Cubic Bézier segment (control1, control2, end)
    CubicTo(Point, Point, Point),
    /// Close the current subpath with a joining segment
    Close,
}

impl PathOp {
    /// Replay this operation on `sink` after applying the transform `m`.
    ///
    /// A `MoveTo` first terminates any open subpath without a closing segment;
    /// this is the canonical way one subpath ends and the next begins.
    pub fn draw_to<S: PathSink + ?Sized>(&self, sink: &mut S, m: Matrix2D) {
        match *self {
            PathOp::MoveTo(p) => {
                sink.stop(false);
                sink.start(m.tr_point(p));
            }
            PathOp::LineTo(p) => sink.line_to(m.tr_point(p)),
            PathOp::QuadTo(ctrl, end) => sink.quad_to(m.tr_point(ctrl), m.tr_point(end)),
            PathOp::CubicTo(c1, c2, end) => {
                sink.cubic_to(m.tr_point(c1), m.tr_point(c2), m.tr_point(end))
            }
            PathOp::Close => sink.stop(true),
        }
    }
}

/// An ordered sequence of path operations
///
/// Empty paths are valid and draw nothing. Operations other than the first
/// `MoveTo` of a subpath must be preceded by the `MoveTo` that opened it;
/// that is a builder contract, not a runtime check at this layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path(pub Vec<PathOp>);

impl Path {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empties the path in place, keeping its allocation.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Starts a new subpath at the given point.
    pub fn start(&mut self, at: Point) {
        self.0.push(PathOp::MoveTo(at));
    }

    /// Adds a straight segment to the current subpath.
    pub fn line_to(&mut self, to: Point) {
        self.0.push(PathOp::LineTo(to));
    }

    /// Adds a quadratic Bézier segment to the current subpath.
    pub fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.0.push(PathOp::QuadTo(ctrl, to));
    }

    /// Adds a cubic Bézier segment to the current subpath.
    pub fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.0.push(PathOp::CubicTo(ctrl1, ctrl2, to));
    }

    /// Ends the current subpath, joining its ends when `close_loop` is set.
    pub fn stop(&mut self, close_loop: bool) {
        if close_loop {
            self.0.push(PathOp::Close);
        }
    }

    /// Appends all operations of `other`, composing the two sequences.
    pub fn concat(&mut self, other: &Path) {
        self.0.extend_from_slice(&other.0);
    }

    /// Returns the path under `m` as a new operation sequence.
    pub fn transformed(&self, m: Matrix2D) -> Path {
        Path(self.0.iter().map(|op| m.tr_op(op)).collect())
    }

    /// Replays every operation on `sink` under the transform `m`.
    ///
    /// A trailing open subpath is terminated with `stop(false)` so the sink
    /// never ends a replay with geometry in limbo.
    pub fn draw_transformed<S: PathSink + ?Sized>(&self, sink: &mut S, m: Matrix2D) {
        for op in &self.0 {
            op.draw_to(sink, m);
        }
        if !matches!(self.0.last(), None | Some(PathOp::Close)) {
            sink.stop(false);
        }
    }

    /// Renders the canonical textual form: `M`/`L`/`Q`/`C`/`Z` letters with
    /// decimal coordinates, commas within an operation, spaces between them.
    pub fn to_svg_path(&self) -> String {
        let chunks: Vec<String> = self
            .0
            .iter()
            .map(|op| match *op {
                PathOp::MoveTo(p) => format!("M{},{}", p.x, p.y),
                PathOp::LineTo(p) => format!("L{},{}", p.x, p.y),
                PathOp::QuadTo(c, p) => format!("Q{},{},{},{}", c.x, c.y, p.x, p.y),
                PathOp::CubicTo(c1, c2, p) => {
                    format!("C{},{},{},{},{},{}", c1.x, c1.y, c2.x, c2.y, p.x, p.y)
                }
                PathOp::Close => "Z".to_string(),
            })
            .collect();
        chunks.join(" ")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_svg_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::from_f64(x, y)
    }

    #[test]
    fn fixed_round_trips_through_f64() {
        for v in [-12.5, 0.0, 0.015625, 3.75, 100.0] {
            assert_eq!(Fixed::from_f64(v).to_f64(), v);
        }
    }

    #[test]
    fn builder_produces_expected_ops() {
        let mut path = Path::new();
        path.start(pt(1.0, 2.0));
        path.line_to(pt(3.0, 2.0));
        path.quad_to(pt(4.0, 2.0), pt(4.0, 3.0));
        path.stop(true);

        assert_eq!(
            path.ops(),
            &[
                PathOp::MoveTo(pt(1.0, 2.0)),
                PathOp::LineTo(pt(3.0, 2.0)),
                PathOp::QuadTo(pt(4.0, 2.0), pt(4.0, 3.0)),
                PathOp::Close,
            ]
        );
    }

    #[test]
    fn stop_without_close_adds_nothing() {
        let mut path = Path::new();
        path.start(pt(0.0, 0.0));
        path.line_to(pt(1.0, 0.0));
        path.stop(false);
        assert_eq!(path.ops().len(), 2);
    }

    #[test]
    fn textual_form_is_stable() {
        let mut path = Path::new();
        path.start(pt(10.0, 10.0));
        path.line_to(pt(20.5, 10.0));
        path.cubic_to(pt(21.0, 11.0), pt(21.0, 12.0), pt(20.0, 13.0));
        path.stop(true);

        assert_eq!(
            path.to_svg_path(),
            "M10.000,10.000 L20.500,10.000 \
             C21.000,11.000,21.000,12.000,20.000,13.000 Z"
        );
    }

    #[test]
    fn concat_appends_in_order() {
        let mut a = Path::new();
        a.start(pt(0.0, 0.0));
        let mut b = Path::new();
        b.line_to(pt(5.0, 5.0));
        a.concat(&b);
        assert_eq!(a.ops().len(), 2);
        assert_eq!(a.ops()[1], PathOp::LineTo(pt(5.0, 5.0)));
    }

    #[test]
    fn empty_path_is_valid() {
        let path = Path::new();
        assert!(path.is_empty());
        assert_eq!(path.to_svg_path(), "");
    }
}
