//! Cascading Style Records
//!
//! Each open element gets its own immutable style scope: a clone of the
//! parent overlaid with only the attributes the element spells out. Unset
//! attributes inherit the parent's already-resolved value, so popping a scope
//! is just discarding the top of the stack and can never corrupt a parent.

use sigil_core::{
    CapStyle, Color, DashOptions, Fixed, JoinOptions, JoinStyle, Matrix2D,
};

use crate::error::SvgError;
use crate::values;

/// A fill or stroke paint as written in markup
///
/// Gradient references stay symbolic until draw time, because
/// bounding-box-relative gradients need the painted shape's extent.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintValue {
    /// No paint; the corresponding drawer is never requested
    None,
    Color(Color),
    /// Reference to a gradient registered under this identifier
    Ref(String),
}

impl PaintValue {
    pub fn is_none(&self) -> bool {
        matches!(self, PaintValue::None)
    }
}

/// Resolved style scope for one element
#[derive(Clone, Debug, PartialEq)]
pub struct PathStyle {
    pub fill: PaintValue,
    pub stroke: PaintValue,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    /// Stroke width in user units, scaled by the transform at draw time
    pub line_width: f64,
    /// Non-zero winding fill rule when set, even-odd otherwise
    pub use_non_zero_winding: bool,
    pub join: JoinOptions,
    pub dash: DashOptions,
    /// Element excluded from rendering entirely (`display: none`)
    pub hidden: bool,
    /// Transform composed from the root down to this scope
    pub transform: Matrix2D,
}

impl Default for PathStyle {
    /// The document-root style: black fill, no stroke, full opacity.
    fn default() -> Self {
        Self {
            fill: PaintValue::Color(Color::BLACK),
            stroke: PaintValue::None,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            line_width: 2.0,
            use_non_zero_winding: true,
            join: JoinOptions::default(),
            dash: DashOptions::default(),
            hidden: false,
            transform: Matrix2D::IDENTITY,
        }
    }
}

impl PathStyle {
    /// Produces the child scope for an element with the given attributes:
    /// a clone of `self` overlaid with every recognized style attribute
    /// present. Unrecognized attributes are ignored, never an error.
    pub fn push(&self, attrs: &[(String, String)]) -> Result<PathStyle, SvgError> {
        let mut child = self.clone();
        for (name, value) in attrs {
            if name == "style" {
                // Inline declarations go through the same property switch.
                for decl in value.split(';') {
                    let decl = decl.trim();
                    if decl.is_empty() {
                        continue;
                    }
                    let (prop, val) = decl
                        .split_once(':')
                        .ok_or_else(|| SvgError::MalformedAttribute(value.clone()))?;
                    child.apply(prop.trim(), val.trim())?;
                }
            } else {
                child.apply(name, value)?;
            }
        }
        Ok(child)
    }

    fn apply(&mut self, name: &str, value: &str) -> Result<(), SvgError> {
        match name {
            "fill" => self.fill = values::paint(value)?,
            "stroke" => self.stroke = values::paint(value)?,
            // Opacity components compose multiplicatively down the cascade,
            // so a translucent group still dims children that set their own.
            "fill-opacity" => self.fill_opacity *= values::opacity(value)?,
            "stroke-opacity" => self.stroke_opacity *= values::opacity(value)?,
            "opacity" => {
                let o = values::opacity(value)?;
                self.fill_opacity *= o;
                self.stroke_opacity *= o;
            }
            "stroke-width" => self.line_width = values::number(value)?,
            "stroke-linecap" => {
                let cap = match value.trim() {
                    "butt" => CapStyle::Butt,
                    "round" => CapStyle::Round,
                    "square" => CapStyle::Square,
                    _ => return Err(SvgError::MalformedAttribute(value.to_string())),
                };
                self.join.lead_cap = cap;
                self.join.trail_cap = cap;
            }
            "stroke-linejoin" => {
                self.join.join = match value.trim() {
                    "miter" => JoinStyle::Miter,
                    "miter-clip" => JoinStyle::MiterClip,
                    "round" => JoinStyle::Round,
                    "bevel" => JoinStyle::Bevel,
                    "arcs" => JoinStyle::Arc,
                    _ => return Err(SvgError::MalformedAttribute(value.to_string())),
                };
            }
            "stroke-miterlimit" => {
                self.join.miter_limit = Fixed::from_f64(values::number(value)?);
            }
            "stroke-dasharray" => {
                if value.trim() == "none" {
                    self.dash.pattern.clear();
                } else {
                    self.dash.pattern = values::number_list(value)?;
                }
            }
            "stroke-dashoffset" => self.dash.offset = values::number(value)?,
            "fill-rule" => {
                self.use_non_zero_winding = match value.trim() {
                    "nonzero" => true,
                    "evenodd" => false,
                    _ => return Err(SvgError::MalformedAttribute(value.to_string())),
                };
            }
            "display" => self.hidden = value.trim() == "none",
            "transform" => {
                self.transform = self.transform.mult(values::transform(value)?);
            }
            // Part of the format's extensibility: unknown attributes are
            // never an error.
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(attrs: &[(&str, &str)]) -> Vec<(String, String)> {
        attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn push_without_overrides_equals_parent() {
        let parent = PathStyle::default();
        let child = parent.push(&owned(&[("id", "child"), ("class", "x")])).unwrap();
        assert_eq!(child, parent);
    }

    #[test]
    fn push_overlays_only_present_attributes() {
        let parent = PathStyle::default();
        let child = parent
            .push(&owned(&[("stroke", "#0000ff"), ("stroke-width", "4")]))
            .unwrap();
        assert_eq!(child.stroke, PaintValue::Color(Color::BLUE));
        assert_eq!(child.line_width, 4.0);
        // untouched attributes inherit the resolved parent value
        assert_eq!(child.fill, parent.fill);
        assert_eq!(child.fill_opacity, parent.fill_opacity);
    }

    #[test]
    fn element_opacity_multiplies_both_components() {
        let parent = PathStyle::default();
        let child = parent
            .push(&owned(&[("fill-opacity", "0.8"), ("opacity", "0.5")]))
            .unwrap();
        assert_eq!(child.fill_opacity, 0.4);
        assert_eq!(child.stroke_opacity, 0.5);
    }

    #[test]
    fn nested_opacity_cascades() {
        let parent = PathStyle::default();
        let mid = parent.push(&owned(&[("opacity", "0.5")])).unwrap();
        let leaf = mid.push(&owned(&[("opacity", "0.5")])).unwrap();
        assert_eq!(leaf.fill_opacity, 0.25);
    }

    #[test]
    fn inline_style_declarations_apply() {
        let parent = PathStyle::default();
        let child = parent
            .push(&owned(&[("style", "fill: none; stroke: red")]))
            .unwrap();
        assert_eq!(child.fill, PaintValue::None);
        assert_eq!(child.stroke, PaintValue::Color(Color::RED));
    }

    #[test]
    fn transforms_compose_child_after_parent() {
        let parent = PathStyle::default()
            .push(&owned(&[("transform", "translate(10, 0)")]))
            .unwrap();
        let child = parent.push(&owned(&[("transform", "scale(2)")])).unwrap();
        // child's local point is scaled first, then translated by the parent
        assert_eq!(child.transform.apply_point(1.0, 1.0), (12.0, 2.0));
    }

    #[test]
    fn malformed_values_are_reported() {
        let parent = PathStyle::default();
        assert!(parent.push(&owned(&[("fill", "#zzzzzz")])).is_err());
        assert!(parent.push(&owned(&[("stroke-width", "wide")])).is_err());
        assert!(parent.push(&owned(&[("fill-rule", "spiral")])).is_err());
    }

    #[test]
    fn display_none_hides_scope() {
        let child = PathStyle::default()
            .push(&owned(&[("display", "none")]))
            .unwrap();
        assert!(child.hidden);
    }
}
