//! Markup Cursor
//!
//! The single-pass parser state machine. The cursor consumes start-tag,
//! end-tag and character-data calls (a generic markup token stream; the
//! tokenizer lives elsewhere) and maintains the style stack, the transform
//! accumulator, the definitions accumulator, the gradient under construction
//! and the metadata text-capture flags. Shapes are emitted into the icon's
//! display list only at structurally valid points.
//!
//! Stack discipline: every start tag pushes exactly one style frame, whether
//! or not the element is recognized, so unrecognized elements still provide
//! style context for their children and the stack depth always equals the
//! element nesting depth.

use sigil_core::{Color, Gradient, GradientStop, GradientUnits, Matrix2D, Path, Spread};

use crate::document::{Icon, StyledPath, ViewBox};
use crate::error::{ErrorMode, SvgError};
use crate::pathdata::parse_path_data;
use crate::shapes;
use crate::style::PathStyle;
use crate::values;

/// One deferred element captured inside a definitions section
#[derive(Clone, Debug)]
pub struct Definition {
    pub id: String,
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

/// Marker entry recording a group close inside a definitions section, so a
/// later replay reproduces the nesting.
const END_GROUP: &str = "endg";

/// Replay depth cap; definition groups referencing themselves would
/// otherwise recurse without bound.
const MAX_USE_DEPTH: usize = 8;

/// The streaming parser state
pub struct IconCursor {
    icon: Icon,
    error_mode: ErrorMode,
    /// The scope outside the document element; never pushed or popped
    base_style: PathStyle,
    style_stack: Vec<PathStyle>,
    in_defs: bool,
    current_def: Vec<Definition>,
    in_grad: bool,
    current_grad: Option<(String, Gradient)>,
    in_title: bool,
    in_desc: bool,
    use_depth: usize,
}

impl IconCursor {
    pub fn new(error_mode: ErrorMode) -> Self {
        Self {
            icon: Icon::default(),
            error_mode,
            base_style: PathStyle::default(),
            style_stack: Vec::new(),
            in_defs: false,
            current_def: Vec::new(),
            in_grad: false,
            current_grad: None,
            in_title: false,
            in_desc: false,
            use_depth: 0,
        }
    }

    /// Element nesting depth seen so far (0 outside the document element).
    pub fn depth(&self) -> usize {
        self.style_stack.len()
    }

    /// The style scope currently in effect.
    pub fn style(&self) -> &PathStyle {
        self.style_stack.last().unwrap_or(&self.base_style)
    }

    pub fn into_icon(self) -> Icon {
        self.icon
    }

    // ─── token handling ──────────────────────────────────────────────────

    /// Handles one start tag: resolves the element's style scope, pushes it,
    /// and dispatches on the element name.
    pub fn start_element(
        &mut self,
        name: &str,
        attrs: &[(String, String)],
    ) -> Result<(), SvgError> {
        let parent = self.style().clone();
        match parent.push(attrs) {
            Ok(child) => self.style_stack.push(child),
            Err(err) => {
                // The frame is pushed regardless, so the pop on the matching
                // end tag stays balanced; the element's own overrides are
                // dropped.
                self.style_stack.push(parent);
                return self.tolerate(err);
            }
        }
        if let Err(err) = self.dispatch(name, attrs) {
            return self.tolerate(err);
        }
        Ok(())
    }

    /// Handles one end tag: pops the style scope and closes whichever
    /// section the element opened.
    pub fn end_element(&mut self, name: &str) {
        self.pop_style();
        match name {
            "g" => {
                if self.in_defs {
                    self.current_def.push(Definition {
                        id: String::new(),
                        tag: END_GROUP.to_string(),
                        attrs: Vec::new(),
                    });
                }
            }
            "title" => self.in_title = false,
            "desc" => self.in_desc = false,
            "defs" => {
                if !self.current_def.is_empty() {
                    let key = self.current_def[0].id.clone();
                    let group = std::mem::take(&mut self.current_def);
                    self.icon.defs.insert(key, group);
                }
                self.in_defs = false;
            }
            "linearGradient" | "radialGradient" => {
                if let Some((id, grad)) = self.current_grad.take() {
                    if !id.is_empty() {
                        self.icon.grads.insert(id, grad);
                    }
                }
                self.in_grad = false;
            }
            _ => {}
        }
    }

    /// Handles character data, appending to whichever metadata entry is
    /// being captured.
    pub fn text(&mut self, data: &str) {
        if self.in_title {
            if let Some(entry) = self.icon.titles.last_mut() {
                entry.push_str(data);
            }
        }
        if self.in_desc {
            if let Some(entry) = self.icon.descriptions.last_mut() {
                entry.push_str(data);
            }
        }
    }

    // ─── element dispatch ────────────────────────────────────────────────

    fn dispatch(&mut self, name: &str, attrs: &[(String, String)]) -> Result<(), SvgError> {
        match name {
            "svg" => self.read_viewport(attrs),
            "defs" => {
                self.in_defs = true;
                Ok(())
            }
            "g" => {
                if self.in_defs {
                    self.capture(name, attrs);
                }
                Ok(())
            }
            "title" => {
                self.in_title = true;
                self.icon.titles.push(String::new());
                Ok(())
            }
            "desc" => {
                self.in_desc = true;
                self.icon.descriptions.push(String::new());
                Ok(())
            }
            "linearGradient" => self.read_linear_gradient(attrs),
            "radialGradient" => self.read_radial_gradient(attrs),
            "stop" => self.read_stop(attrs),
            "path" | "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" => {
                if self.in_defs {
                    self.capture(name, attrs);
                    Ok(())
                } else {
                    self.read_shape(name, attrs)
                }
            }
            "use" => {
                if self.in_defs {
                    self.capture(name, attrs);
                    Ok(())
                } else {
                    self.replay_use(attrs)
                }
            }
            other => Err(SvgError::UnrecognizedElement(other.to_string())),
        }
    }

    fn tolerate(&self, err: SvgError) -> Result<(), SvgError> {
        match self.error_mode {
            ErrorMode::Fail => Err(err),
            ErrorMode::Ignore => Ok(()),
            ErrorMode::Warn => {
                tracing::warn!("skipping construct: {err}");
                Ok(())
            }
        }
    }

    fn pop_style(&mut self) {
        self.style_stack.pop();
    }

    fn capture(&mut self, tag: &str, attrs: &[(String, String)]) {
        let id = values::attr(attrs, "id").unwrap_or_default().to_string();
        self.current_def.push(Definition {
            id,
            tag: tag.to_string(),
            attrs: attrs.to_vec(),
        });
    }

    // ─── viewport ────────────────────────────────────────────────────────

    fn read_viewport(&mut self, attrs: &[(String, String)]) -> Result<(), SvgError> {
        if let Some(vb) = values::attr(attrs, "viewBox") {
            let n = values::number_list(vb)?;
            if n.len() != 4 {
                return Err(SvgError::MalformedAttribute(vb.to_string()));
            }
            self.icon.view_box = ViewBox {
                x: n[0],
                y: n[1],
                w: n[2],
                h: n[3],
            };
        } else {
            let w = num_attr(attrs, "width", 0.0)?;
            let h = num_attr(attrs, "height", 0.0)?;
            self.icon.view_box = ViewBox {
                x: 0.0,
                y: 0.0,
                w,
                h,
            };
        }
        Ok(())
    }

    // ─── shapes ──────────────────────────────────────────────────────────

    fn read_shape(&mut self, name: &str, attrs: &[(String, String)]) -> Result<(), SvgError> {
        let path = match name {
            "path" => {
                let mut path = Path::new();
                if let Some(d) = values::attr(attrs, "d") {
                    parse_path_data(d, &mut path)?;
                }
                path
            }
            "rect" => {
                let x = num_attr(attrs, "x", 0.0)?;
                let y = num_attr(attrs, "y", 0.0)?;
                let w = num_attr(attrs, "width", 0.0)?;
                let h = num_attr(attrs, "height", 0.0)?;
                // a missing radius takes the other's value
                let rx = values::attr(attrs, "rx").map(values::number).transpose()?;
                let ry = values::attr(attrs, "ry").map(values::number).transpose()?;
                let rx_v = rx.or(ry).unwrap_or(0.0);
                let ry_v = ry.or(rx).unwrap_or(0.0);
                shapes::rect(x, y, w, h, rx_v, ry_v)
            }
            "circle" => {
                let cx = num_attr(attrs, "cx", 0.0)?;
                let cy = num_attr(attrs, "cy", 0.0)?;
                let r = num_attr(attrs, "r", 0.0)?;
                shapes::circle(cx, cy, r)
            }
            "ellipse" => {
                let cx = num_attr(attrs, "cx", 0.0)?;
                let cy = num_attr(attrs, "cy", 0.0)?;
                let rx = num_attr(attrs, "rx", 0.0)?;
                let ry = num_attr(attrs, "ry", 0.0)?;
                shapes::ellipse(cx, cy, rx, ry)
            }
            "line" => {
                let x1 = num_attr(attrs, "x1", 0.0)?;
                let y1 = num_attr(attrs, "y1", 0.0)?;
                let x2 = num_attr(attrs, "x2", 0.0)?;
                let y2 = num_attr(attrs, "y2", 0.0)?;
                shapes::line(x1, y1, x2, y2)
            }
            "polyline" | "polygon" => {
                let coords = match values::attr(attrs, "points") {
                    Some(v) => values::number_list(v)?,
                    None => Vec::new(),
                };
                shapes::poly(&coords, name == "polygon")
            }
            _ => Path::new(),
        };

        if !path.is_empty() {
            self.icon.paths.push(StyledPath {
                path,
                style: self.style().clone(),
            });
        }
        Ok(())
    }

    // ─── use replay ──────────────────────────────────────────────────────

    fn replay_use(&mut self, attrs: &[(String, String)]) -> Result<(), SvgError> {
        // both `href` and `xlink:href` arrive with local name `href`
        let href = values::attr(attrs, "href")
            .ok_or_else(|| SvgError::UnresolvedReference(String::new()))?;
        let id = href.strip_prefix('#').unwrap_or(href);
        let entries = self
            .icon
            .defs
            .get(id)
            .cloned()
            .ok_or_else(|| SvgError::UnresolvedReference(id.to_string()))?;
        if self.use_depth >= MAX_USE_DEPTH {
            return Err(SvgError::UnresolvedReference(id.to_string()));
        }

        let x = num_attr(attrs, "x", 0.0)?;
        let y = num_attr(attrs, "y", 0.0)?;
        if x != 0.0 || y != 0.0 {
            if let Some(top) = self.style_stack.last_mut() {
                top.transform = top.transform.mult(Matrix2D::translate(x, y));
            }
        }

        self.use_depth += 1;
        let result = self.replay(&entries);
        self.use_depth -= 1;
        result
    }

    /// Replays a captured definition group under the current style scope.
    fn replay(&mut self, entries: &[Definition]) -> Result<(), SvgError> {
        for entry in entries {
            if entry.tag == END_GROUP {
                self.pop_style();
                continue;
            }
            self.start_element(&entry.tag, &entry.attrs)?;
            // leaf entries carry no end tag of their own; group frames stay
            // until their end-group marker
            if entry.tag != "g" {
                self.end_element(&entry.tag);
            }
        }
        Ok(())
    }

    // ─── gradients ───────────────────────────────────────────────────────

    fn read_linear_gradient(&mut self, attrs: &[(String, String)]) -> Result<(), SvgError> {
        let x1 = grad_coord(attrs, "x1", 0.0)?;
        let y1 = grad_coord(attrs, "y1", 0.0)?;
        let x2 = grad_coord(attrs, "x2", 1.0)?;
        let y2 = grad_coord(attrs, "y2", 0.0)?;
        let mut grad = Gradient::linear(x1, y1, x2, y2);
        read_gradient_common(&mut grad, attrs)?;
        self.begin_gradient(attrs, grad);
        Ok(())
    }

    fn read_radial_gradient(&mut self, attrs: &[(String, String)]) -> Result<(), SvgError> {
        let cx = grad_coord(attrs, "cx", 0.5)?;
        let cy = grad_coord(attrs, "cy", 0.5)?;
        let r = grad_coord(attrs, "r", 0.5)?;
        // the focal point defaults to the center
        let fx = grad_coord(attrs, "fx", cx)?;
        let fy = grad_coord(attrs, "fy", cy)?;
        let mut grad = Gradient::radial(cx, cy, fx, fy, r);
        read_gradient_common(&mut grad, attrs)?;
        self.begin_gradient(attrs, grad);
        Ok(())
    }

    fn begin_gradient(&mut self, attrs: &[(String, String)], grad: Gradient) {
        let id = values::attr(attrs, "id").unwrap_or_default().to_string();
        self.in_grad = true;
        self.current_grad = Some((id, grad));
    }

    fn read_stop(&mut self, attrs: &[(String, String)]) -> Result<(), SvgError> {
        if !self.in_grad {
            return Err(SvgError::UnrecognizedElement("stop".to_string()));
        }

        let mut offset = 0.0;
        let mut color = Color::BLACK;
        let mut opacity = 1.0;
        for (name, value) in attrs {
            match name.as_str() {
                "offset" => offset = values::number_or_percent(value)?,
                "stop-color" => color = values::color(value)?.unwrap_or(Color::TRANSPARENT),
                "stop-opacity" => opacity = values::opacity(value)?,
                "style" => {
                    for decl in value.split(';') {
                        let decl = decl.trim();
                        if decl.is_empty() {
                            continue;
                        }
                        match decl.split_once(':').map(|(p, v)| (p.trim(), v.trim())) {
                            Some(("stop-color", v)) => {
                                color = values::color(v)?.unwrap_or(Color::TRANSPARENT)
                            }
                            Some(("stop-opacity", v)) => opacity = values::opacity(v)?,
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some((_, grad)) = self.current_grad.as_mut() {
            grad.stops.push(GradientStop::new(offset, color, opacity));
        }
        Ok(())
    }
}

fn num_attr(attrs: &[(String, String)], name: &str, default: f64) -> Result<f64, SvgError> {
    match values::attr(attrs, name) {
        Some(v) => values::number(v),
        None => Ok(default),
    }
}

/// Gradient coordinates accept percentages as fractions of the reference box.
fn grad_coord(attrs: &[(String, String)], name: &str, default: f64) -> Result<f64, SvgError> {
    match values::attr(attrs, name) {
        Some(v) => values::number_or_percent(v),
        None => Ok(default),
    }
}

fn read_gradient_common(
    grad: &mut Gradient,
    attrs: &[(String, String)],
) -> Result<(), SvgError> {
    if let Some(v) = values::attr(attrs, "gradientUnits") {
        grad.units = match v.trim() {
            "userSpaceOnUse" => GradientUnits::UserSpaceOnUse,
            "objectBoundingBox" => GradientUnits::ObjectBoundingBox,
            _ => return Err(SvgError::MalformedAttribute(v.to_string())),
        };
    }
    if let Some(v) = values::attr(attrs, "gradientTransform") {
        grad.matrix = values::transform(v)?;
    }
    if let Some(v) = values::attr(attrs, "spreadMethod") {
        grad.spread = match v.trim() {
            "pad" => Spread::Pad,
            "reflect" => Spread::Reflect,
            "repeat" => Spread::Repeat,
            _ => return Err(SvgError::MalformedAttribute(v.to_string())),
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::PaintValue;

    fn owned(attrs: &[(&str, &str)]) -> Vec<(String, String)> {
        attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn stack_depth_returns_to_zero() {
        let mut cursor = IconCursor::new(ErrorMode::Ignore);
        assert_eq!(cursor.depth(), 0);

        cursor.start_element("svg", &owned(&[])).unwrap();
        cursor.start_element("g", &owned(&[])).unwrap();
        cursor
            .start_element("mystery", &owned(&[("fill", "red")]))
            .unwrap();
        cursor
            .start_element("rect", &owned(&[("width", "4"), ("height", "4")]))
            .unwrap();
        assert_eq!(cursor.depth(), 4);

        cursor.end_element("rect");
        cursor.end_element("mystery");
        cursor.end_element("g");
        cursor.end_element("svg");
        assert_eq!(cursor.depth(), 0);
    }

    #[test]
    fn unrecognized_element_still_provides_style_context() {
        let mut cursor = IconCursor::new(ErrorMode::Ignore);
        cursor.start_element("svg", &owned(&[])).unwrap();
        cursor
            .start_element("mystery", &owned(&[("fill", "#00ff00")]))
            .unwrap();
        // the unknown element was skipped, but its style frame is live
        assert_eq!(
            cursor.style().fill,
            PaintValue::Color(sigil_core::Color::GREEN)
        );
        cursor.end_element("mystery");
        cursor.end_element("svg");
    }

    #[test]
    fn unrecognized_element_fails_in_fail_mode() {
        let mut cursor = IconCursor::new(ErrorMode::Fail);
        cursor.start_element("svg", &owned(&[])).unwrap();
        let err = cursor.start_element("mystery", &owned(&[])).unwrap_err();
        assert!(matches!(err, SvgError::UnrecognizedElement(name) if name == "mystery"));
    }

    #[test]
    fn defs_commit_under_first_entry_id() {
        let mut cursor = IconCursor::new(ErrorMode::Fail);
        cursor.start_element("svg", &owned(&[])).unwrap();
        cursor.start_element("defs", &owned(&[])).unwrap();
        cursor
            .start_element(
                "rect",
                &owned(&[("id", "box"), ("width", "4"), ("height", "4")]),
            )
            .unwrap();
        cursor.end_element("rect");
        cursor.end_element("defs");

        let icon = cursor.into_icon();
        assert!(icon.defs.contains_key("box"));
        // nothing was drawn while inside defs
        assert!(icon.paths.is_empty());
    }

    #[test]
    fn use_replays_definition_into_display_list() {
        let mut cursor = IconCursor::new(ErrorMode::Fail);
        cursor.start_element("svg", &owned(&[])).unwrap();
        cursor.start_element("defs", &owned(&[])).unwrap();
        cursor
            .start_element(
                "rect",
                &owned(&[("id", "box"), ("width", "4"), ("height", "4")]),
            )
            .unwrap();
        cursor.end_element("rect");
        cursor.end_element("defs");

        cursor
            .start_element("use", &owned(&[("href", "#box"), ("x", "10")]))
            .unwrap();
        cursor.end_element("use");
        cursor.end_element("svg");

        let icon = cursor.into_icon();
        assert_eq!(icon.paths.len(), 1);
        // the x offset rides on the replayed item's transform
        assert_eq!(
            icon.paths[0].style.transform.apply_point(0.0, 0.0),
            (10.0, 0.0)
        );
    }

    #[test]
    fn use_of_unknown_id_is_unresolved() {
        let mut cursor = IconCursor::new(ErrorMode::Fail);
        cursor.start_element("svg", &owned(&[])).unwrap();
        let err = cursor
            .start_element("use", &owned(&[("href", "#ghost")]))
            .unwrap_err();
        assert!(matches!(err, SvgError::UnresolvedReference(id) if id == "ghost"));
    }

    #[test]
    fn gradient_registers_on_end_tag() {
        let mut cursor = IconCursor::new(ErrorMode::Fail);
        cursor.start_element("svg", &owned(&[])).unwrap();
        cursor
            .start_element("linearGradient", &owned(&[("id", "fade")]))
            .unwrap();
        cursor
            .start_element(
                "stop",
                &owned(&[("offset", "0%"), ("stop-color", "#ff0000")]),
            )
            .unwrap();
        cursor.end_element("stop");
        assert!(!cursor.icon.grads.contains_key("fade"));

        cursor.end_element("linearGradient");
        let icon = cursor.into_icon();
        let grad = &icon.grads["fade"];
        assert_eq!(grad.stops.len(), 1);
        assert_eq!(grad.stops[0].color, sigil_core::Color::RED);
    }

    #[test]
    fn stray_stop_is_rejected() {
        let mut cursor = IconCursor::new(ErrorMode::Fail);
        cursor.start_element("svg", &owned(&[])).unwrap();
        assert!(cursor
            .start_element("stop", &owned(&[("offset", "0")]))
            .is_err());
    }

    #[test]
    fn title_text_is_captured() {
        let mut cursor = IconCursor::new(ErrorMode::Fail);
        cursor.start_element("svg", &owned(&[])).unwrap();
        cursor.start_element("title", &owned(&[])).unwrap();
        cursor.text("Fancy ");
        cursor.text("icon");
        cursor.end_element("title");
        cursor.text("stray text outside");
        cursor.end_element("svg");

        let icon = cursor.into_icon();
        assert_eq!(icon.titles, vec!["Fancy icon".to_string()]);
        assert!(icon.descriptions.is_empty());
    }

    #[test]
    fn malformed_shape_is_skipped_in_ignore_mode() {
        let mut cursor = IconCursor::new(ErrorMode::Ignore);
        cursor.start_element("svg", &owned(&[])).unwrap();
        cursor
            .start_element("path", &owned(&[("d", "M10,10 L90")]))
            .unwrap();
        cursor.end_element("path");
        cursor
            .start_element("rect", &owned(&[("width", "4"), ("height", "4")]))
            .unwrap();
        cursor.end_element("rect");
        cursor.end_element("svg");

        let icon = cursor.into_icon();
        // only the well-formed sibling survived
        assert_eq!(icon.paths.len(), 1);
    }
}
