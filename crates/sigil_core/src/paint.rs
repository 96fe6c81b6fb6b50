//! Paint Model
//!
//! The resolved values a driver receives: solid colors and gradients. Style
//! records in the markup layer reference gradients by identifier; by the time
//! a `Paint` reaches a driver the reference has been resolved and, for
//! bounding-box-relative gradients, the `bounds` rectangle has been filled in
//! from the painted shape's extent.

use crate::geom::Point;
use crate::transform::Matrix2D;

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color with components in `0.0..=1.0`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Builds an opaque color from a `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Multiplies the alpha channel by `opacity`.
    pub fn modulate_alpha(mut self, opacity: f32) -> Self {
        self.a *= opacity;
        self
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gradients
// ─────────────────────────────────────────────────────────────────────────────

/// A rectangle in user units
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Builds a rectangle from a fixed-point min/max extent pair.
    pub fn from_extent(min: Point, max: Point) -> Self {
        let (x, y) = (min.x.to_f64(), min.y.to_f64());
        Self {
            x,
            y,
            w: max.x.to_f64() - x,
            h: max.y.to_f64() - y,
        }
    }
}

/// Single color stop along a gradient axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient (`0.0..=1.0`)
    pub offset: f64,
    pub color: Color,
    pub opacity: f64,
}

impl GradientStop {
    pub fn new(offset: f64, color: Color, opacity: f64) -> Self {
        Self {
            offset: offset.clamp(0.0, 1.0),
            color,
            opacity,
        }
    }
}

/// How a gradient extrapolates beyond its defined stop range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Spread {
    /// Extend the end colors
    #[default]
    Pad,
    /// Mirror the gradient
    Reflect,
    /// Tile the gradient
    Repeat,
}

/// Coordinate space the gradient geometry is expressed in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientUnits {
    /// Fractions of the painted shape's own extent
    #[default]
    ObjectBoundingBox,
    /// Absolute user-space units
    UserSpaceOnUse,
}

/// Gradient geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    /// Axis between two endpoints
    Linear { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Center, focal point and radius
    Radial {
        cx: f64,
        cy: f64,
        fx: f64,
        fy: f64,
        r: f64,
    },
}

/// A gradient definition plus the state needed to resolve it at draw time
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    /// Color stops ordered by offset
    pub stops: Vec<GradientStop>,
    pub spread: Spread,
    pub units: GradientUnits,
    /// The gradient's own transform
    pub matrix: Matrix2D,
    /// Extent of the painted shape; filled in at draw time when `units` is
    /// `ObjectBoundingBox`, unused otherwise
    pub bounds: Rect,
}

impl Gradient {
    pub fn linear(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            kind: GradientKind::Linear { x1, y1, x2, y2 },
            stops: Vec::new(),
            spread: Spread::default(),
            units: GradientUnits::default(),
            matrix: Matrix2D::IDENTITY,
            bounds: Rect::ZERO,
        }
    }

    pub fn radial(cx: f64, cy: f64, fx: f64, fy: f64, r: f64) -> Self {
        Self {
            kind: GradientKind::Radial { cx, cy, fx, fy, r },
            stops: Vec::new(),
            spread: Spread::default(),
            units: GradientUnits::default(),
            matrix: Matrix2D::IDENTITY,
            bounds: Rect::ZERO,
        }
    }

    /// Maps a gradient-space coordinate pair into user space, honoring the
    /// coordinate-space mode and the resolved bounds.
    pub fn user_point(&self, x: f64, y: f64) -> (f64, f64) {
        match self.units {
            GradientUnits::UserSpaceOnUse => (x, y),
            GradientUnits::ObjectBoundingBox => (
                self.bounds.x + x * self.bounds.w,
                self.bounds.y + y * self.bounds.h,
            ),
        }
    }

    /// For a linear gradient, the user-space position at parameter `t` along
    /// the axis. `None` for radial gradients.
    pub fn linear_point_at(&self, t: f64) -> Option<(f64, f64)> {
        match self.kind {
            GradientKind::Linear { x1, y1, x2, y2 } => {
                let (sx, sy) = self.user_point(x1, y1);
                let (ex, ey) = self.user_point(x2, y2);
                Some((sx + (ex - sx) * t, sy + (ey - sy) * t))
            }
            GradientKind::Radial { .. } => None,
        }
    }

    /// The user-space radius of a radial gradient. For bounding-box units
    /// the fraction applies to the normalized diagonal of the bounds.
    pub fn user_radius(&self) -> Option<f64> {
        match self.kind {
            GradientKind::Radial { r, .. } => Some(match self.units {
                GradientUnits::UserSpaceOnUse => r,
                GradientUnits::ObjectBoundingBox => {
                    let diag = (self.bounds.w * self.bounds.w + self.bounds.h * self.bounds.h)
                        .sqrt()
                        / std::f64::consts::SQRT_2;
                    r * diag
                }
            }),
            GradientKind::Linear { .. } => None,
        }
    }
}

/// A resolved paint, ready for a driver
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    Gradient(Gradient),
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}
