//! Attribute value scanners
//!
//! Small parsers for the literal grammars that appear inside attribute
//! values: numbers with unit suffixes, number lists, percentages, transform
//! lists, colors and paint references. All of them report malformed input as
//! [`SvgError::MalformedAttribute`]; how that is handled is the cursor's
//! business, not theirs.

use sigil_core::{Color, Matrix2D};

use crate::error::SvgError;
use crate::style::PaintValue;

/// Looks up an attribute by (local) name.
pub fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn malformed(value: &str) -> SvgError {
    SvgError::MalformedAttribute(value.to_string())
}

/// Parses a scalar, stripping the length-unit suffixes the subset accepts.
pub fn number(value: &str) -> Result<f64, SvgError> {
    let v = value.trim();
    let v = v
        .strip_suffix("px")
        .or_else(|| v.strip_suffix("pt"))
        .or_else(|| v.strip_suffix("cm"))
        .or_else(|| v.strip_suffix("mm"))
        .or_else(|| v.strip_suffix("in"))
        .unwrap_or(v)
        .trim();
    v.parse::<f64>().map_err(|_| malformed(value))
}

/// Parses a scalar where a `%` suffix divides by 100.
pub fn number_or_percent(value: &str) -> Result<f64, SvgError> {
    let v = value.trim();
    match v.strip_suffix('%') {
        Some(pct) => Ok(pct.trim().parse::<f64>().map_err(|_| malformed(value))? / 100.0),
        None => number(v),
    }
}

/// Parses an opacity literal (number or percentage), clamped to `0.0..=1.0`.
pub fn opacity(value: &str) -> Result<f64, SvgError> {
    Ok(number_or_percent(value)?.clamp(0.0, 1.0))
}

/// Parses a whitespace/comma separated list of numbers. Every entry must
/// parse; a stray token makes the whole list malformed.
pub fn number_list(value: &str) -> Result<Vec<f64>, SvgError> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| malformed(value)))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform Lists
// ─────────────────────────────────────────────────────────────────────────────

/// Parses a `transform` attribute: a list of `translate`/`scale`/`rotate`/
/// `skewX`/`skewY`/`matrix` calls, composed left to right.
pub fn transform(value: &str) -> Result<Matrix2D, SvgError> {
    let mut out = Matrix2D::IDENTITY;
    let mut rest = value.trim();

    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(|| malformed(value))?;
        let name = rest[..open].trim();
        let close = rest[open + 1..]
            .find(')')
            .ok_or_else(|| malformed(value))?;
        let args = number_list(&rest[open + 1..open + 1 + close])?;

        let m = match name {
            "translate" => {
                let tx = *args.first().ok_or_else(|| malformed(value))?;
                let ty = args.get(1).copied().unwrap_or(0.0);
                Matrix2D::translate(tx, ty)
            }
            "scale" => {
                let sx = *args.first().ok_or_else(|| malformed(value))?;
                let sy = args.get(1).copied().unwrap_or(sx);
                Matrix2D::scale(sx, sy)
            }
            "rotate" => {
                let a = args.first().ok_or_else(|| malformed(value))?.to_radians();
                match args.len() {
                    1 => Matrix2D::rotate(a),
                    3 => Matrix2D::rotate_about(a, args[1], args[2]),
                    _ => return Err(malformed(value)),
                }
            }
            "skewX" => {
                let a = args.first().ok_or_else(|| malformed(value))?.to_radians();
                Matrix2D::skew_x(a)
            }
            "skewY" => {
                let a = args.first().ok_or_else(|| malformed(value))?.to_radians();
                Matrix2D::skew_y(a)
            }
            "matrix" => {
                if args.len() != 6 {
                    return Err(malformed(value));
                }
                Matrix2D {
                    a: args[0],
                    b: args[1],
                    c: args[2],
                    d: args[3],
                    e: args[4],
                    f: args[5],
                }
            }
            _ => return Err(malformed(value)),
        };

        out = out.mult(m);
        rest = rest[open + 1 + close + 1..].trim_start();
    }

    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Colors and Paints
// ─────────────────────────────────────────────────────────────────────────────

/// Named colors the subset recognizes
const NAMED_COLORS: &[(&str, u32)] = &[
    ("aqua", 0x00FFFF),
    ("black", 0x000000),
    ("blue", 0x0000FF),
    ("brown", 0xA52A2A),
    ("cyan", 0x00FFFF),
    ("darkgray", 0xA9A9A9),
    ("fuchsia", 0xFF00FF),
    ("gold", 0xFFD700),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("grey", 0x808080),
    ("lightgray", 0xD3D3D3),
    ("lime", 0x00FF00),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("navy", 0x000080),
    ("olive", 0x808000),
    ("orange", 0xFFA500),
    ("pink", 0xFFC0CB),
    ("purple", 0x800080),
    ("red", 0xFF0000),
    ("silver", 0xC0C0C0),
    ("teal", 0x008080),
    ("white", 0xFFFFFF),
    ("yellow", 0xFFFF00),
];

/// Parses a color literal: `#rgb`, `#rrggbb`, `rgb(...)`, a named color,
/// or `transparent`. Returns `None` for the keyword `none`.
pub fn color(value: &str) -> Result<Option<Color>, SvgError> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if v.eq_ignore_ascii_case("transparent") {
        return Ok(Some(Color::TRANSPARENT));
    }

    if let Some(hex) = v.strip_prefix('#') {
        return hex_color(hex).map(Some).ok_or_else(|| malformed(value));
    }

    if let Some(args) = v
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return rgb_color(args).map(Some).ok_or_else(|| malformed(value));
    }

    let lower = v.to_ascii_lowercase();
    match NAMED_COLORS.binary_search_by(|(name, _)| name.cmp(&lower.as_str())) {
        Ok(i) => Ok(Some(Color::from_hex(NAMED_COLORS[i].1))),
        Err(_) => Err(malformed(value)),
    }
}

fn hex_color(hex: &str) -> Option<Color> {
    match hex.len() {
        3 => {
            let v = u32::from_str_radix(hex, 16).ok()?;
            let r = (v >> 8) & 0xF;
            let g = (v >> 4) & 0xF;
            let b = v & 0xF;
            Some(Color::from_hex(
                (r << 20 | r << 16) | (g << 12 | g << 8) | (b << 4 | b),
            ))
        }
        6 => Some(Color::from_hex(u32::from_str_radix(hex, 16).ok()?)),
        _ => None,
    }
}

fn rgb_color(args: &str) -> Option<Color> {
    let channel = |s: &str| -> Option<f32> {
        let s = s.trim();
        match s.strip_suffix('%') {
            Some(pct) => Some((pct.trim().parse::<f32>().ok()? / 100.0).clamp(0.0, 1.0)),
            None => Some((s.parse::<f32>().ok()? / 255.0).clamp(0.0, 1.0)),
        }
    };
    let mut it = args.split(',');
    let r = channel(it.next()?)?;
    let g = channel(it.next()?)?;
    let b = channel(it.next()?)?;
    if it.next().is_some() {
        return None;
    }
    Some(Color::rgb(r, g, b))
}

/// Parses a paint literal: a color, `none`, or a `url(#id)` reference.
pub fn paint(value: &str) -> Result<PaintValue, SvgError> {
    let v = value.trim();
    if let Some(id) = v
        .strip_prefix("url(#")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        if id.is_empty() {
            return Err(malformed(value));
        }
        return Ok(PaintValue::Ref(id.to_string()));
    }
    Ok(match color(v)? {
        Some(c) => PaintValue::Color(c),
        None => PaintValue::None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_strip_unit_suffixes() {
        assert_eq!(number("12").unwrap(), 12.0);
        assert_eq!(number(" 1.5px ").unwrap(), 1.5);
        assert_eq!(number("-3pt").unwrap(), -3.0);
        assert!(number("12q").is_err());
    }

    #[test]
    fn percentages_divide_by_hundred() {
        assert_eq!(number_or_percent("50%").unwrap(), 0.5);
        assert_eq!(opacity("150%").unwrap(), 1.0);
    }

    #[test]
    fn number_lists_reject_stray_tokens() {
        assert_eq!(number_list("1 2,3").unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(number_list("1 x 3").is_err());
    }

    #[test]
    fn transform_lists_compose_left_to_right() {
        let m = transform("translate(10) scale(2)").unwrap();
        assert_eq!(m.apply_point(1.0, 1.0), (12.0, 2.0));
    }

    #[test]
    fn rotate_takes_degrees() {
        let m = transform("rotate(90)").unwrap();
        let (x, y) = m.apply_point(1.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!((y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_transform_function_is_malformed() {
        assert!(transform("wobble(3)").is_err());
        assert!(transform("translate(").is_err());
    }

    #[test]
    fn colors_parse_hex_and_names() {
        assert_eq!(color("#ff0000").unwrap(), Some(Color::RED));
        assert_eq!(color("#f00").unwrap(), Some(Color::RED));
        assert_eq!(color("RED").unwrap(), Some(Color::RED));
        assert_eq!(color("none").unwrap(), None);
        assert_eq!(color("transparent").unwrap(), Some(Color::TRANSPARENT));
        assert!(color("#f0").is_err());
        assert!(color("notacolor").is_err());
    }

    #[test]
    fn rgb_functional_notation() {
        assert_eq!(color("rgb(255, 0, 0)").unwrap(), Some(Color::RED));
        assert_eq!(color("rgb(100%, 0%, 0%)").unwrap(), Some(Color::RED));
        assert!(color("rgb(1, 2)").is_err());
    }

    #[test]
    fn paints_recognize_references() {
        assert_eq!(
            paint("url(#grad1)").unwrap(),
            PaintValue::Ref("grad1".to_string())
        );
        assert_eq!(paint("none").unwrap(), PaintValue::None);
        assert_eq!(paint("#00ff00").unwrap(), PaintValue::Color(Color::GREEN));
    }
}
