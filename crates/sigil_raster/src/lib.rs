//! Sigil Raster
//!
//! A CPU rasterizing backend for the Sigil driver protocol, built on
//! `tiny-skia`. The driver accumulates the streamed path geometry into
//! `tiny-skia` path builders and commits each `draw` call into a shared
//! pixmap, producing anti-aliased RGBA output.
//!
//! Cap, join and gap variants `tiny-skia` cannot express collapse to the
//! nearest expressible style; gap styles are accepted and ignored.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tiny_skia::{
    FillRule, GradientStop as SkStop, LinearGradient, Paint as SkPaint, PathBuilder, Pixmap,
    Point as SkPoint, RadialGradient, Shader, SpreadMode, Stroke, StrokeDash, Transform,
};

use sigil_core::{
    CapStyle, Color, Driver, Filler, Gradient, GradientKind, JoinStyle, Matrix2D, Paint,
    PathSink, Point, Spread, StrokeOptions, Stroker,
};
use sigil_svg::{ErrorMode, Icon, SvgError};

/// Errors raised while rasterizing an icon
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("invalid raster dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error(transparent)]
    Svg(#[from] SvgError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry Accumulation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder plus the running extent of everything streamed since the last
/// commit. The extent includes control points, which keeps it conservative.
struct PathAccum {
    builder: PathBuilder,
    extent: Option<(Point, Point)>,
}

impl PathAccum {
    fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
            extent: None,
        }
    }

    fn include(&mut self, p: Point) {
        self.extent = Some(match self.extent {
            Some((min, max)) => (min.min(p), max.max(p)),
            None => (p, p),
        });
    }

    fn start(&mut self, at: Point) {
        // a move both terminates the open contour and starts the next
        self.builder.move_to(at.x.to_f32(), at.y.to_f32());
        self.include(at);
    }

    fn line_to(&mut self, to: Point) {
        self.builder.line_to(to.x.to_f32(), to.y.to_f32());
        self.include(to);
    }

    fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.builder
            .quad_to(ctrl.x.to_f32(), ctrl.y.to_f32(), to.x.to_f32(), to.y.to_f32());
        self.include(ctrl);
        self.include(to);
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.builder.cubic_to(
            ctrl1.x.to_f32(),
            ctrl1.y.to_f32(),
            ctrl2.x.to_f32(),
            ctrl2.y.to_f32(),
            to.x.to_f32(),
            to.y.to_f32(),
        );
        self.include(ctrl1);
        self.include(ctrl2);
        self.include(to);
    }

    fn stop(&mut self, close_loop: bool) {
        if close_loop {
            self.builder.close();
        }
    }

    /// Consumes the accumulated geometry, leaving the accumulator fresh.
    fn take_path(&mut self) -> Option<tiny_skia::Path> {
        self.extent = None;
        std::mem::replace(&mut self.builder, PathBuilder::new()).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Filling handle painting into the shared pixmap
pub struct SkiaFiller {
    pixmap: Rc<RefCell<Pixmap>>,
    acc: PathAccum,
    fill_rule: FillRule,
}

impl PathSink for SkiaFiller {
    fn start(&mut self, at: Point) {
        self.acc.start(at);
    }

    fn line_to(&mut self, to: Point) {
        self.acc.line_to(to);
    }

    fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.acc.quad_to(ctrl, to);
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.acc.cubic_to(ctrl1, ctrl2, to);
    }

    fn stop(&mut self, close_loop: bool) {
        self.acc.stop(close_loop);
    }
}

impl Filler for SkiaFiller {
    fn set_winding(&mut self, use_non_zero: bool) {
        self.fill_rule = if use_non_zero {
            FillRule::Winding
        } else {
            FillRule::EvenOdd
        };
    }

    fn draw(&mut self, paint: &Paint, opacity: f32) {
        let path = match self.acc.take_path() {
            Some(path) => path,
            None => return,
        };
        if let Some(paint) = to_sk_paint(paint, opacity) {
            self.pixmap.borrow_mut().fill_path(
                &path,
                &paint,
                self.fill_rule,
                Transform::identity(),
                None,
            );
        }
    }

    fn path_extent(&self) -> Option<(Point, Point)> {
        self.acc.extent
    }
}

/// Stroking handle painting into the shared pixmap
pub struct SkiaStroker {
    pixmap: Rc<RefCell<Pixmap>>,
    acc: PathAccum,
    stroke: Stroke,
}

impl PathSink for SkiaStroker {
    fn start(&mut self, at: Point) {
        self.acc.start(at);
    }

    fn line_to(&mut self, to: Point) {
        self.acc.line_to(to);
    }

    fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.acc.quad_to(ctrl, to);
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.acc.cubic_to(ctrl1, ctrl2, to);
    }

    fn stop(&mut self, close_loop: bool) {
        self.acc.stop(close_loop);
    }
}

impl Filler for SkiaStroker {
    fn draw(&mut self, paint: &Paint, opacity: f32) {
        let path = match self.acc.take_path() {
            Some(path) => path,
            None => return,
        };
        if let Some(paint) = to_sk_paint(paint, opacity) {
            self.pixmap.borrow_mut().stroke_path(
                &path,
                &paint,
                &self.stroke,
                Transform::identity(),
                None,
            );
        }
    }

    fn path_extent(&self) -> Option<(Point, Point)> {
        self.acc.extent
    }
}

impl Stroker for SkiaStroker {
    fn set_stroke_options(&mut self, options: &StrokeOptions) {
        self.stroke = Stroke {
            width: options.width.to_f32(),
            miter_limit: options.join.miter_limit.to_f32(),
            line_cap: to_line_cap(options.join.lead_cap),
            line_join: to_line_join(options.join.join),
            dash: to_stroke_dash(&options.dash.pattern, options.dash.offset),
        };
    }
}

/// A rasterizing driver writing into an owned pixmap
pub struct SkiaDriver {
    pixmap: Rc<RefCell<Pixmap>>,
    filler: SkiaFiller,
    stroker: SkiaStroker,
}

impl SkiaDriver {
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let pixmap =
            Pixmap::new(width, height).ok_or(RasterError::InvalidDimensions(width, height))?;
        let pixmap = Rc::new(RefCell::new(pixmap));
        Ok(Self {
            filler: SkiaFiller {
                pixmap: Rc::clone(&pixmap),
                acc: PathAccum::new(),
                fill_rule: FillRule::Winding,
            },
            stroker: SkiaStroker {
                pixmap: Rc::clone(&pixmap),
                acc: PathAccum::new(),
                stroke: Stroke::default(),
            },
            pixmap,
        })
    }

    /// Consumes the driver and returns the rendered pixmap.
    pub fn into_pixmap(self) -> Pixmap {
        let Self {
            pixmap,
            filler,
            stroker,
        } = self;
        drop(filler);
        drop(stroker);
        match Rc::try_unwrap(pixmap) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => shared.borrow().clone(),
        }
    }
}

impl Driver for SkiaDriver {
    fn setup_drawers(
        &mut self,
        want_fill: bool,
        want_stroke: bool,
    ) -> (Option<&mut dyn Filler>, Option<&mut dyn Stroker>) {
        let Self {
            filler, stroker, ..
        } = self;
        let f = if want_fill {
            Some(filler as &mut dyn Filler)
        } else {
            None
        };
        let s = if want_stroke {
            Some(stroker as &mut dyn Stroker)
        } else {
            None
        };
        (f, s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paint Conversion
// ─────────────────────────────────────────────────────────────────────────────

fn to_sk_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        c.r.clamp(0.0, 1.0),
        c.g.clamp(0.0, 1.0),
        c.b.clamp(0.0, 1.0),
        c.a.clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

fn to_transform(m: Matrix2D) -> Transform {
    Transform::from_row(
        m.a as f32, m.b as f32, m.c as f32, m.d as f32, m.e as f32, m.f as f32,
    )
}

fn to_line_cap(cap: CapStyle) -> tiny_skia::LineCap {
    match cap {
        CapStyle::Butt => tiny_skia::LineCap::Butt,
        CapStyle::Square => tiny_skia::LineCap::Square,
        CapStyle::Round | CapStyle::Cubic | CapStyle::Quadratic => tiny_skia::LineCap::Round,
    }
}

fn to_line_join(join: JoinStyle) -> tiny_skia::LineJoin {
    match join {
        JoinStyle::Miter => tiny_skia::LineJoin::Miter,
        JoinStyle::MiterClip => tiny_skia::LineJoin::MiterClip,
        JoinStyle::Bevel => tiny_skia::LineJoin::Bevel,
        JoinStyle::Round | JoinStyle::Arc | JoinStyle::ArcClip => tiny_skia::LineJoin::Round,
    }
}

fn to_stroke_dash(pattern: &[f64], offset: f64) -> Option<StrokeDash> {
    if pattern.is_empty() {
        return None;
    }
    let mut array: Vec<f32> = pattern.iter().map(|d| *d as f32).collect();
    // an odd-length list repeats itself
    if array.len() % 2 != 0 {
        let copy = array.clone();
        array.extend(copy);
    }
    StrokeDash::new(array, offset as f32)
}

fn to_sk_paint(paint: &Paint, opacity: f32) -> Option<SkPaint<'static>> {
    let shader = match paint {
        Paint::Solid(c) => Shader::SolidColor(to_sk_color(c.modulate_alpha(opacity))),
        Paint::Gradient(g) => to_shader(g, opacity)?,
    };
    let mut sk = SkPaint::default();
    sk.shader = shader;
    sk.anti_alias = true;
    Some(sk)
}

fn to_shader(g: &Gradient, opacity: f32) -> Option<Shader<'static>> {
    let stops: Vec<SkStop> = g
        .stops
        .iter()
        .map(|s| {
            let color = s.color.modulate_alpha(s.opacity as f32 * opacity);
            SkStop::new(s.offset as f32, to_sk_color(color))
        })
        .collect();
    match stops.len() {
        0 => return None,
        1 => {
            // a single stop degenerates to its solid color
            let color = g.stops[0].color.modulate_alpha(g.stops[0].opacity as f32 * opacity);
            return Some(Shader::SolidColor(to_sk_color(color)));
        }
        _ => {}
    }

    let spread = match g.spread {
        Spread::Pad => SpreadMode::Pad,
        Spread::Reflect => SpreadMode::Reflect,
        Spread::Repeat => SpreadMode::Repeat,
    };
    let transform = to_transform(g.matrix);

    match g.kind {
        GradientKind::Linear { x1, y1, x2, y2 } => {
            let (sx, sy) = g.user_point(x1, y1);
            let (ex, ey) = g.user_point(x2, y2);
            LinearGradient::new(
                SkPoint::from_xy(sx as f32, sy as f32),
                SkPoint::from_xy(ex as f32, ey as f32),
                stops,
                spread,
                transform,
            )
        }
        GradientKind::Radial { cx, cy, fx, fy, .. } => {
            let (cx, cy) = g.user_point(cx, cy);
            let (fx, fy) = g.user_point(fx, fy);
            let r = g.user_radius().unwrap_or(0.0);
            RadialGradient::new(
                SkPoint::from_xy(fx as f32, fy as f32),
                SkPoint::from_xy(cx as f32, cy as f32),
                r as f32,
                stops,
                spread,
                transform,
            )
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering Entry Points
// ─────────────────────────────────────────────────────────────────────────────

/// Renders a parsed icon into a pixmap of the given size, scaling the
/// viewport to fill it.
pub fn render_icon(icon: &mut Icon, width: u32, height: u32) -> Result<Pixmap, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions(width, height));
    }
    icon.set_target(0.0, 0.0, width as f64, height as f64);
    let mut driver = SkiaDriver::new(width, height)?;
    icon.draw(&mut driver, 1.0);
    Ok(driver.into_pixmap())
}

/// Parses and renders icon markup. Zero dimensions fall back to the icon's
/// own viewport size.
pub fn render_str(
    markup: &str,
    width: u32,
    height: u32,
    mode: ErrorMode,
) -> Result<Pixmap, RasterError> {
    let mut icon = Icon::parse(markup, mode)?;
    let (mut w, mut h) = (width, height);
    if w == 0 || h == 0 {
        w = icon.view_box.w as u32;
        h = icon.view_box.h as u32;
    }
    render_icon(&mut icon, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let p = pixmap.pixel(x, y).unwrap().demultiply();
        (p.red(), p.green(), p.blue(), p.alpha())
    }

    #[test]
    fn fills_a_red_rect() {
        let pixmap = render_str(
            r##"<svg viewBox="0 0 10 10"><rect width="10" height="10" fill="#ff0000"/></svg>"##,
            20,
            20,
            ErrorMode::Fail,
        )
        .unwrap();

        assert_eq!(pixmap.width(), 20);
        assert_eq!(pixel(&pixmap, 10, 10), (255, 0, 0, 255));
    }

    #[test]
    fn zero_size_falls_back_to_viewport() {
        let pixmap = render_str(
            r##"<svg viewBox="0 0 16 12"><rect width="16" height="12" fill="#000"/></svg>"##,
            0,
            0,
            ErrorMode::Fail,
        )
        .unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (16, 12));
    }

    #[test]
    fn no_viewport_and_no_size_is_an_error() {
        let result = render_str("<svg></svg>", 0, 0, ErrorMode::Ignore);
        assert!(matches!(
            result,
            Err(RasterError::InvalidDimensions(0, 0))
        ));
    }

    #[test]
    fn strokes_without_fill_leave_interior_empty() {
        let pixmap = render_str(
            r##"<svg viewBox="0 0 20 20">
                <rect x="4" y="4" width="12" height="12" fill="none"
                      stroke="#0000ff" stroke-width="2"/>
            </svg>"##,
            20,
            20,
            ErrorMode::Fail,
        )
        .unwrap();

        // on the edge: blue; in the middle: untouched
        assert_eq!(pixel(&pixmap, 10, 4), (0, 0, 255, 255));
        assert_eq!(pixel(&pixmap, 10, 10).3, 0);
    }

    #[test]
    fn linear_gradient_shades_across_the_shape() {
        let pixmap = render_str(
            r##"<svg viewBox="0 0 20 20">
                <linearGradient id="fade" x1="0" y1="0" x2="1" y2="0">
                    <stop offset="0" stop-color="#000000"/>
                    <stop offset="1" stop-color="#ffffff"/>
                </linearGradient>
                <rect width="20" height="20" fill="url(#fade)"/>
            </svg>"##,
            20,
            20,
            ErrorMode::Fail,
        )
        .unwrap();

        let left = pixel(&pixmap, 1, 10).0;
        let right = pixel(&pixmap, 18, 10).0;
        assert!(left < 40, "left edge should be near black, got {left}");
        assert!(right > 215, "right edge should be near white, got {right}");
    }

    #[test]
    fn group_transforms_scale_with_the_target() {
        // icon space 10x10 rendered at 2x: the translated rect lands at 2x
        let pixmap = render_str(
            r##"<svg viewBox="0 0 10 10">
                <g transform="translate(5,5)"><rect width="5" height="5" fill="#00ff00"/></g>
            </svg>"##,
            20,
            20,
            ErrorMode::Fail,
        )
        .unwrap();

        assert_eq!(pixel(&pixmap, 15, 15), (0, 255, 0, 255));
        assert_eq!(pixel(&pixmap, 5, 5).3, 0);
    }
}
