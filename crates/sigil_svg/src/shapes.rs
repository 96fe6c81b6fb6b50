//! Basic Shape Lowering
//!
//! Translates the basic shape elements into the canonical path operation
//! sequence. Circular and elliptical geometry is approximated with four
//! cubic segments using the standard kappa constant; rounded rectangle
//! corners use one quadratic per corner.

use sigil_core::{Path, Point};

/// Magic number for approximating a quarter circle with one cubic
const KAPPA: f64 = 0.552_284_749_8;

fn pt(x: f64, y: f64) -> Point {
    Point::from_f64(x, y)
}

/// Rectangle, optionally with rounded corners. Degenerate dimensions emit
/// nothing (a zero-sized rect disables rendering, it is not an error).
pub fn rect(x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> Path {
    let mut path = Path::new();
    if w <= 0.0 || h <= 0.0 {
        return path;
    }

    // clamp the corner radii to the half extents
    let rx = rx.max(0.0).min(w / 2.0);
    let ry = ry.max(0.0).min(h / 2.0);

    if rx == 0.0 || ry == 0.0 {
        path.start(pt(x, y));
        path.line_to(pt(x + w, y));
        path.line_to(pt(x + w, y + h));
        path.line_to(pt(x, y + h));
        path.stop(true);
        return path;
    }

    path.start(pt(x + rx, y));
    path.line_to(pt(x + w - rx, y));
    path.quad_to(pt(x + w, y), pt(x + w, y + ry));
    path.line_to(pt(x + w, y + h - ry));
    path.quad_to(pt(x + w, y + h), pt(x + w - rx, y + h));
    path.line_to(pt(x + rx, y + h));
    path.quad_to(pt(x, y + h), pt(x, y + h - ry));
    path.line_to(pt(x, y + ry));
    path.quad_to(pt(x, y), pt(x + rx, y));
    path.stop(true);
    path
}

pub fn circle(cx: f64, cy: f64, r: f64) -> Path {
    ellipse(cx, cy, r, r)
}

pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Path {
    let mut path = Path::new();
    if rx <= 0.0 || ry <= 0.0 {
        return path;
    }
    let ox = rx * KAPPA;
    let oy = ry * KAPPA;

    path.start(pt(cx + rx, cy));
    path.cubic_to(pt(cx + rx, cy + oy), pt(cx + ox, cy + ry), pt(cx, cy + ry));
    path.cubic_to(pt(cx - ox, cy + ry), pt(cx - rx, cy + oy), pt(cx - rx, cy));
    path.cubic_to(pt(cx - rx, cy - oy), pt(cx - ox, cy - ry), pt(cx, cy - ry));
    path.cubic_to(pt(cx + ox, cy - ry), pt(cx + rx, cy - oy), pt(cx + rx, cy));
    path.stop(true);
    path
}

pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Path {
    let mut path = Path::new();
    path.start(pt(x1, y1));
    path.line_to(pt(x2, y2));
    path
}

/// Polyline/polygon from a flat coordinate list; `close` distinguishes the
/// two. Fewer than two points emit nothing.
pub fn poly(coords: &[f64], close: bool) -> Path {
    let mut path = Path::new();
    let mut pairs = coords.chunks_exact(2);
    let first = match pairs.next() {
        Some(p) => p,
        None => return path,
    };
    if coords.len() < 4 {
        return path;
    }
    path.start(pt(first[0], first[1]));
    for p in pairs {
        path.line_to(pt(p[0], p[1]));
    }
    if close {
        path.stop(true);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::PathOp;

    #[test]
    fn rect_is_a_closed_quad() {
        let path = rect(0.0, 0.0, 10.0, 10.0, 0.0, 0.0);
        assert_eq!(path.ops().len(), 5);
        assert_eq!(path.ops()[0], PathOp::MoveTo(pt(0.0, 0.0)));
        assert_eq!(path.ops()[4], PathOp::Close);
    }

    #[test]
    fn degenerate_rect_emits_nothing() {
        assert!(rect(0.0, 0.0, 0.0, 10.0, 0.0, 0.0).is_empty());
        assert!(rect(0.0, 0.0, 10.0, -1.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn rounded_rect_uses_one_quad_per_corner() {
        let path = rect(0.0, 0.0, 10.0, 10.0, 2.0, 2.0);
        let quads = path
            .ops()
            .iter()
            .filter(|op| matches!(op, PathOp::QuadTo(..)))
            .count();
        assert_eq!(quads, 4);
        assert_eq!(path.ops()[0], PathOp::MoveTo(pt(2.0, 0.0)));
    }

    #[test]
    fn circle_is_four_cubics() {
        let path = circle(5.0, 5.0, 5.0);
        let cubics = path
            .ops()
            .iter()
            .filter(|op| matches!(op, PathOp::CubicTo(..)))
            .count();
        assert_eq!(cubics, 4);
        assert_eq!(path.ops()[0], PathOp::MoveTo(pt(10.0, 5.0)));
    }

    #[test]
    fn polygon_closes_polyline_does_not() {
        let coords = [0.0, 0.0, 10.0, 0.0, 5.0, 8.0];
        assert_eq!(poly(&coords, true).ops().last(), Some(&PathOp::Close));
        assert!(matches!(
            poly(&coords, false).ops().last(),
            Some(PathOp::LineTo(_))
        ));
    }

    #[test]
    fn short_point_lists_emit_nothing() {
        assert!(poly(&[1.0, 2.0], false).is_empty());
        assert!(poly(&[], true).is_empty());
    }
}
