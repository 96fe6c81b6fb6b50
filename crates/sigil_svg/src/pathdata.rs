//! Path Data Mini-Language
//!
//! Parses the `d` attribute grammar: the full `M L H V C S Q T A Z` command
//! set with relative forms, implicit command repetition, shorthand control
//! point reflection and elliptical arcs. Quadratics are kept as native
//! quadratic operations; arcs are lowered to cubic segments of at most 90°
//! using the center parameterization.

use std::f64::consts::PI;

use sigil_core::{Path, Point};

use crate::error::SvgError;

/// Parses `d` and appends the resulting operations to `path`.
///
/// On a syntax error the path keeps the operations parsed so far; the caller
/// decides (per error mode) whether to use or discard them.
pub fn parse_path_data(d: &str, path: &mut Path) -> Result<(), SvgError> {
    let mut scan = Scanner::new(d);
    let mut cmd: Option<char> = None;

    // current point, subpath start and shorthand reflection state,
    // all in user units
    let mut cur = (0.0_f64, 0.0_f64);
    let mut start = (0.0_f64, 0.0_f64);
    let mut last_cubic_ctrl: Option<(f64, f64)> = None;
    let mut last_quad_ctrl: Option<(f64, f64)> = None;

    loop {
        scan.skip_separators();
        if scan.at_end() {
            return Ok(());
        }

        let c = match scan.peek_command() {
            Some(c) => {
                scan.advance();
                cmd = Some(c);
                c
            }
            // No letter: the previous command repeats, except close which
            // takes no arguments and would loop forever.
            None => match cmd {
                Some(c) if c != 'Z' && c != 'z' => c,
                _ => return Err(scan.malformed()),
            },
        };
        let rel = c.is_ascii_lowercase();

        match c.to_ascii_uppercase() {
            'M' => {
                let p = scan.pair(rel, cur)?;
                path.start(fixed(p));
                cur = p;
                start = p;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
                // Subsequent coordinate pairs are implicit line-tos.
                cmd = Some(if rel { 'l' } else { 'L' });
            }
            'L' => {
                let p = scan.pair(rel, cur)?;
                path.line_to(fixed(p));
                cur = p;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            'H' => {
                let x = scan.coord(rel, cur.0)?;
                cur = (x, cur.1);
                path.line_to(fixed(cur));
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            'V' => {
                let y = scan.coord(rel, cur.1)?;
                cur = (cur.0, y);
                path.line_to(fixed(cur));
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            'C' => {
                let c1 = scan.pair(rel, cur)?;
                let c2 = scan.pair(rel, cur)?;
                let p = scan.pair(rel, cur)?;
                path.cubic_to(fixed(c1), fixed(c2), fixed(p));
                cur = p;
                last_cubic_ctrl = Some(c2);
                last_quad_ctrl = None;
            }
            'S' => {
                let c1 = reflect(cur, last_cubic_ctrl);
                let c2 = scan.pair(rel, cur)?;
                let p = scan.pair(rel, cur)?;
                path.cubic_to(fixed(c1), fixed(c2), fixed(p));
                cur = p;
                last_cubic_ctrl = Some(c2);
                last_quad_ctrl = None;
            }
            'Q' => {
                let ctrl = scan.pair(rel, cur)?;
                let p = scan.pair(rel, cur)?;
                path.quad_to(fixed(ctrl), fixed(p));
                cur = p;
                last_quad_ctrl = Some(ctrl);
                last_cubic_ctrl = None;
            }
            'T' => {
                let ctrl = reflect(cur, last_quad_ctrl);
                let p = scan.pair(rel, cur)?;
                path.quad_to(fixed(ctrl), fixed(p));
                cur = p;
                last_quad_ctrl = Some(ctrl);
                last_cubic_ctrl = None;
            }
            'A' => {
                let rx = scan.number()?;
                let ry = scan.number()?;
                let rot = scan.number()?;
                let large_arc = scan.arc_flag()?;
                let sweep = scan.arc_flag()?;
                let p = scan.pair(rel, cur)?;
                arc_to_cubics(path, cur, rx, ry, rot, large_arc, sweep, p);
                cur = p;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            'Z' => {
                path.stop(true);
                cur = start;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            _ => return Err(scan.malformed()),
        }
    }
}

fn fixed(p: (f64, f64)) -> Point {
    Point::from_f64(p.0, p.1)
}

/// Reflection of the previous control point about the current point, used by
/// the `S`/`T` shorthands. Falls back to the current point when the previous
/// segment set no control point.
fn reflect(cur: (f64, f64), prev_ctrl: Option<(f64, f64)>) -> (f64, f64) {
    match prev_ctrl {
        Some((px, py)) => (2.0 * cur.0 - px, 2.0 * cur.1 - py),
        None => cur,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Elliptical Arcs
// ─────────────────────────────────────────────────────────────────────────────

/// Lowers one elliptical arc to cubic segments, per the SVG 1.1
/// implementation notes (center parameterization, ≤90° per segment).
#[allow(clippy::too_many_arguments)]
fn arc_to_cubics(
    path: &mut Path,
    from: (f64, f64),
    rx_in: f64,
    ry_in: f64,
    x_axis_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    to: (f64, f64),
) {
    let (x0, y0) = from;
    let (x1, y1) = to;
    let mut rx = rx_in.abs();
    let mut ry = ry_in.abs();
    if rx == 0.0 || ry == 0.0 || (x0 == x1 && y0 == y1) {
        path.line_to(fixed(to));
        return;
    }

    let phi = x_axis_rotation_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // midpoint in the rotated frame
    let dx2 = (x0 - x1) / 2.0;
    let dy2 = (y0 - y1) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    // radii must be large enough to span the endpoints
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let x1p2 = x1p * x1p;
    let y1p2 = y1p * y1p;
    let num = rx2 * ry2 - rx2 * y1p2 - ry2 * x1p2;
    let den = rx2 * y1p2 + ry2 * x1p2;
    let mut coef = 0.0;
    if den != 0.0 {
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        coef = sign * (num / den).max(0.0).sqrt();
    }
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);

    let cx = cos_phi * cxp - sin_phi * cyp + (x0 + x1) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (y0 + y1) / 2.0;

    fn angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
        let dot = ux * vx + uy * vy;
        let det = ux * vy - uy * vx;
        det.atan2(dot)
    }

    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let mut theta1 = angle(1.0, 0.0, ux, uy);
    let mut dtheta = angle(ux, uy, vx, vy);
    if !sweep && dtheta > 0.0 {
        dtheta -= 2.0 * PI;
    } else if sweep && dtheta < 0.0 {
        dtheta += 2.0 * PI;
    }

    let segments = (dtheta.abs() / (PI / 2.0)).ceil().max(1.0) as i32;
    let delta = dtheta / segments as f64;

    for _ in 0..segments {
        let t2 = theta1 + delta;
        arc_segment(path, cx, cy, rx, ry, sin_phi, cos_phi, theta1, t2);
        theta1 = t2;
    }
}

/// One ≤90° ellipse arc segment as a cubic Bézier.
#[allow(clippy::too_many_arguments)]
fn arc_segment(
    path: &mut Path,
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    sin_phi: f64,
    cos_phi: f64,
    t1: f64,
    t2: f64,
) {
    let k = (4.0 / 3.0) * ((t2 - t1) / 4.0).tan();
    let (s1, c1) = t1.sin_cos();
    let (s2, c2) = t2.sin_cos();

    // unit-circle control points, then ellipse → rotate → translate
    let map = |x: f64, y: f64| -> (f64, f64) {
        let (x, y) = (rx * x, ry * y);
        (
            cx + cos_phi * x - sin_phi * y,
            cy + sin_phi * x + cos_phi * y,
        )
    };

    let ctrl1 = map(c1 - k * s1, s1 + k * c1);
    let ctrl2 = map(c2 + k * s2, s2 - k * c2);
    let end = map(c2, s2);
    path.cubic_to(fixed(ctrl1), fixed(ctrl2), fixed(end));
}

// ─────────────────────────────────────────────────────────────────────────────
// Byte Scanner
// ─────────────────────────────────────────────────────────────────────────────

struct Scanner<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.i >= self.bytes.len()
    }

    fn advance(&mut self) {
        self.i += 1;
    }

    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.i) {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b',') {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    fn peek_command(&self) -> Option<char> {
        match self.bytes.get(self.i) {
            Some(&b) if b.is_ascii_alphabetic() => Some(b as char),
            _ => None,
        }
    }

    /// Error pointing at the unconsumed remainder of the input.
    fn malformed(&self) -> SvgError {
        let rest = &self.bytes[self.i.min(self.bytes.len())..];
        let snippet = String::from_utf8_lossy(&rest[..rest.len().min(24)]).into_owned();
        SvgError::MalformedAttribute(snippet)
    }

    fn number(&mut self) -> Result<f64, SvgError> {
        self.skip_separators();
        let start = self.i;
        let mut digits = false;

        if matches!(self.bytes.get(self.i), Some(&b'+') | Some(&b'-')) {
            self.i += 1;
        }
        while matches!(self.bytes.get(self.i), Some(b) if b.is_ascii_digit()) {
            self.i += 1;
            digits = true;
        }
        if self.bytes.get(self.i) == Some(&b'.') {
            self.i += 1;
            while matches!(self.bytes.get(self.i), Some(b) if b.is_ascii_digit()) {
                self.i += 1;
                digits = true;
            }
        }
        if digits && matches!(self.bytes.get(self.i), Some(&b'e') | Some(&b'E')) {
            self.i += 1;
            if matches!(self.bytes.get(self.i), Some(&b'+') | Some(&b'-')) {
                self.i += 1;
            }
            let mut exp_digits = false;
            while matches!(self.bytes.get(self.i), Some(b) if b.is_ascii_digit()) {
                self.i += 1;
                exp_digits = true;
            }
            if !exp_digits {
                self.i = start;
                return Err(self.malformed());
            }
        }

        if !digits {
            self.i = start;
            return Err(self.malformed());
        }

        std::str::from_utf8(&self.bytes[start..self.i])
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| self.malformed())
    }

    /// One coordinate, resolved against `base` when the command is relative.
    fn coord(&mut self, rel: bool, base: f64) -> Result<f64, SvgError> {
        let v = self.number()?;
        Ok(if rel { base + v } else { v })
    }

    /// One coordinate pair, resolved against `base` when relative.
    fn pair(&mut self, rel: bool, base: (f64, f64)) -> Result<(f64, f64), SvgError> {
        let x = self.coord(rel, base.0)?;
        let y = self.coord(rel, base.1)?;
        Ok((x, y))
    }

    /// Arc flags are single `0`/`1` digits and may be written without any
    /// separator before the next token.
    fn arc_flag(&mut self) -> Result<bool, SvgError> {
        self.skip_separators();
        match self.bytes.get(self.i) {
            Some(&b'0') => {
                self.i += 1;
                Ok(false)
            }
            Some(&b'1') => {
                self.i += 1;
                Ok(true)
            }
            _ => Err(self.malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::PathOp;

    fn parse(d: &str) -> Path {
        let mut path = Path::new();
        parse_path_data(d, &mut path).unwrap();
        path
    }

    fn pt(x: f64, y: f64) -> Point {
        Point::from_f64(x, y)
    }

    #[test]
    fn parses_absolute_commands() {
        let path = parse("M10,10 L90,10 L90,90 Z");
        assert_eq!(
            path.ops(),
            &[
                PathOp::MoveTo(pt(10.0, 10.0)),
                PathOp::LineTo(pt(90.0, 10.0)),
                PathOp::LineTo(pt(90.0, 90.0)),
                PathOp::Close,
            ]
        );
    }

    #[test]
    fn relative_commands_accumulate() {
        let path = parse("m10 10 l5 0 v5 h-5 z");
        assert_eq!(
            path.ops(),
            &[
                PathOp::MoveTo(pt(10.0, 10.0)),
                PathOp::LineTo(pt(15.0, 10.0)),
                PathOp::LineTo(pt(15.0, 15.0)),
                PathOp::LineTo(pt(10.0, 15.0)),
                PathOp::Close,
            ]
        );
    }

    #[test]
    fn implicit_repetition_and_moveto_lineto() {
        let path = parse("M0 0 10 0 10 10");
        assert_eq!(
            path.ops(),
            &[
                PathOp::MoveTo(pt(0.0, 0.0)),
                PathOp::LineTo(pt(10.0, 0.0)),
                PathOp::LineTo(pt(10.0, 10.0)),
            ]
        );
    }

    #[test]
    fn quadratics_stay_quadratic() {
        let path = parse("M0,0 Q5,10 10,0");
        assert_eq!(
            path.ops(),
            &[
                PathOp::MoveTo(pt(0.0, 0.0)),
                PathOp::QuadTo(pt(5.0, 10.0), pt(10.0, 0.0)),
            ]
        );
    }

    #[test]
    fn smooth_shorthands_reflect_control_points() {
        let path = parse("M0,0 C0,5 5,5 5,0 S10,-5 10,0");
        match path.ops()[2] {
            // the reflected control of (5,5) about (5,0) is (5,-5)
            PathOp::CubicTo(c1, _, _) => assert_eq!(c1, pt(5.0, -5.0)),
            ref op => panic!("expected cubic, got {op:?}"),
        }
    }

    #[test]
    fn arcs_lower_to_cubics() {
        let path = parse("M0,0 A10,10 0 0 1 20,0");
        assert!(matches!(path.ops()[0], PathOp::MoveTo(_)));
        assert!(path.ops().len() >= 2);
        assert!(path
            .ops()
            .iter()
            .skip(1)
            .all(|op| matches!(op, PathOp::CubicTo(..))));
        // the arc must land exactly on the endpoint
        match path.ops().last().unwrap() {
            PathOp::CubicTo(_, _, end) => {
                assert!((end.x.to_f64() - 20.0).abs() < 0.02);
                assert!(end.y.to_f64().abs() < 0.02);
            }
            op => panic!("expected cubic, got {op:?}"),
        }
    }

    #[test]
    fn compact_arc_flags_without_separators() {
        let path = parse("M0,0 a5,5 0 011,1");
        assert!(path.ops().len() >= 2);
    }

    #[test]
    fn scientific_notation_coordinates() {
        let path = parse("M1e1,0 L1.5e2,0");
        assert_eq!(
            path.ops(),
            &[
                PathOp::MoveTo(pt(10.0, 0.0)),
                PathOp::LineTo(pt(150.0, 0.0)),
            ]
        );
    }

    #[test]
    fn malformed_data_is_an_error() {
        let mut path = Path::new();
        assert!(parse_path_data("M10,10 L90", &mut path).is_err());
        assert!(parse_path_data("10 10", &mut path).is_err());
        assert!(parse_path_data("M0,0 W5", &mut path).is_err());
    }

    #[test]
    fn textual_form_round_trips() {
        let mut original = Path::new();
        original.start(pt(1.25, 2.5));
        original.line_to(pt(10.0, 2.5));
        original.quad_to(pt(12.0, 4.0), pt(10.0, 8.0));
        original.cubic_to(pt(8.0, 10.0), pt(4.0, 10.0), pt(1.25, 8.0));
        original.stop(true);

        let text = original.to_svg_path();
        let mut reparsed = Path::new();
        parse_path_data(&text, &mut reparsed).unwrap();
        // 3 fractional digits round-trip exactly on the 1/64 grid
        assert_eq!(reparsed, original);
    }
}
