//! Style adapter between the engine and host elements.
//!
//! The host exposes each element through [`StyleTarget`]: the raw inline
//! transform list, the raw inline opacity and a single combined write. This
//! module does the parsing and formatting around it:
//! - reading a property's current value (`translateX(12px)` -> `12`, `px`)
//! - capturing which transform tokens an element already carries
//! - composing one transform string plus opacity per frame, so each frame
//!   costs one style assignment per element

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::types::{Property, PropertyMap, Unit, split_numeric};

/// One combined style assignment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleWrite {
    /// Full transform list, e.g. `translateX(50.00px) scaleX(2.00)`.
    pub transform: String,
    /// New opacity; `None` leaves the element's opacity untouched.
    pub opacity: Option<String>,
}

/// Host element whose inline style the engine animates.
pub trait StyleTarget {
    /// Name used in log output.
    fn label(&self) -> String {
        String::from("<target>")
    }

    /// Current inline transform list (empty when unset).
    fn inline_transform(&self) -> String;

    /// Current inline opacity, if set.
    fn inline_opacity(&self) -> Option<String>;

    /// Apply a combined write.
    fn commit(&self, write: &StyleWrite);
}

/// Shared handle to an animated element.
pub type Target = Rc<dyn StyleTarget>;

/// Numeric style value with the unit it was written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleValue {
    pub value: f64,
    pub unit: Option<Unit>,
}

impl StyleValue {
    /// The value assumed for `property` when nothing is set inline.
    pub fn default_for(property: Property) -> Self {
        Self {
            value: property.default_value(),
            unit: property.default_unit(),
        }
    }
}

/// One `name(args)` entry of a transform list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformToken {
    pub name: String,
    pub args: String,
}

impl fmt::Display for TransformToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args)
    }
}

/// Split a transform list into tokens. Parsing stops at the first malformed entry.
pub fn parse_transform(list: &str) -> Vec<TransformToken> {
    let mut tokens = Vec::new();
    let mut rest = list.trim();
    while !rest.is_empty() {
        let Some(open) = rest.find('(') else { break };
        let Some(close) = rest[open..].find(')').map(|i| open + i) else {
            break;
        };
        let name = rest[..open].trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            break;
        }
        tokens.push(TransformToken {
            name: name.to_string(),
            args: rest[open + 1..close].trim().to_string(),
        });
        rest = rest[close + 1..].trim_start();
    }
    tokens
}

fn parse_style_value(raw: &str, property: Property) -> Option<StyleValue> {
    let (value, suffix) = split_numeric(raw)?;
    let unit = match Unit::parse(suffix) {
        Ok(unit) => unit,
        Err(err) => {
            warn!(%property, %err, "unit treated as empty");
            None
        }
    };
    Some(StyleValue { value, unit })
}

/// Value of `property` among already parsed tokens, if present.
///
/// `scaleX`/`scaleY` fall back to the matching argument of a uniform
/// `scale(x[, y])` token.
fn value_in_tokens(tokens: &[TransformToken], property: Property) -> Option<StyleValue> {
    if let Some(token) = tokens.iter().find(|t| t.name == property.css_name()) {
        return parse_style_value(&token.args, property);
    }
    let axis = match property {
        Property::ScaleX => 0,
        Property::ScaleY => 1,
        _ => return None,
    };
    let token = tokens.iter().find(|t| t.name == "scale")?;
    let args: Vec<&str> = token.args.split(',').map(str::trim).collect();
    let raw = args.get(axis).or_else(|| args.first())?;
    parse_style_value(raw, property)
}

/// Current value of a transform property, or its default when absent.
pub fn read_transform_value(target: &dyn StyleTarget, property: Property) -> StyleValue {
    if property == Property::Opacity {
        return StyleValue {
            value: read_opacity(target),
            unit: None,
        };
    }
    let tokens = parse_transform(&target.inline_transform());
    value_in_tokens(&tokens, property).unwrap_or_else(|| StyleValue::default_for(property))
}

/// Current opacity, defaulting to 1 when unset or unparsable.
pub fn read_opacity(target: &dyn StyleTarget) -> f64 {
    target
        .inline_opacity()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .unwrap_or(1.0)
}

/// What an element carries inline when a step starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSnapshot {
    /// Properties present inline (transform tokens and opacity).
    pub present: PropertyMap<StyleValue>,
    /// Transform tokens outside the animatable set, kept verbatim.
    pub foreign: Vec<String>,
}

/// Capture an element's inline properties and unrecognized transform tokens.
pub fn snapshot(target: &dyn StyleTarget) -> StyleSnapshot {
    let tokens = parse_transform(&target.inline_transform());
    let mut present = PropertyMap::new();
    for property in Property::ALL.into_iter().filter(|p| p.is_transform()) {
        if let Some(value) = value_in_tokens(&tokens, property) {
            present.insert(property, value);
        }
    }
    if target.inline_opacity().is_some() {
        present.insert(
            Property::Opacity,
            StyleValue {
                value: read_opacity(target),
                unit: None,
            },
        );
    }
    let foreign = tokens
        .iter()
        .filter(|t| t.name != "scale" && Property::from_css_name(&t.name).is_none())
        .map(ToString::to_string)
        .collect();
    StyleSnapshot { present, foreign }
}

/// Round to two decimals for output, folding `-0` into `0`.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.2}")
}

/// Build the combined write for a set of tracked values.
///
/// Transform tokens come out in canonical order followed by `foreign` tokens.
/// Opacity is only written when tracked.
pub fn compose(values: &PropertyMap<StyleValue>, foreign: &[String]) -> StyleWrite {
    let mut parts: Vec<String> = values
        .iter()
        .filter(|(p, _)| p.is_transform())
        .map(|(p, v)| {
            let unit = v.unit.map(|u| u.as_str()).unwrap_or("");
            format!("{}({}{})", p.css_name(), format_number(v.value), unit)
        })
        .collect();
    parts.extend(foreign.iter().cloned());
    StyleWrite {
        transform: parts.join(" "),
        opacity: values.get(Property::Opacity).map(|v| format_number(v.value)),
    }
}

/// Commit a composed write to the element.
pub fn write_style(target: &dyn StyleTarget, values: &PropertyMap<StyleValue>, foreign: &[String]) {
    target.commit(&compose(values, foreign));
}

/// Clear the element's transform, leaving opacity alone.
pub fn reset(target: &dyn StyleTarget) {
    target.commit(&StyleWrite::default());
}

/// In-memory element for headless hosts and tests.
///
/// Holds an inline transform and opacity and records every commit.
#[derive(Debug, Default)]
pub struct MemoryElement {
    label: String,
    transform: RefCell<String>,
    opacity: RefCell<Option<String>>,
    history: RefCell<Vec<StyleWrite>>,
}

impl MemoryElement {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Start with an inline transform list.
    pub fn with_transform(self, transform: impl Into<String>) -> Self {
        *self.transform.borrow_mut() = transform.into();
        self
    }

    /// Start with an inline opacity.
    pub fn with_opacity(self, opacity: impl Into<String>) -> Self {
        *self.opacity.borrow_mut() = Some(opacity.into());
        self
    }

    pub fn transform(&self) -> String {
        self.transform.borrow().clone()
    }

    pub fn opacity(&self) -> Option<String> {
        self.opacity.borrow().clone()
    }

    /// Every write committed so far, oldest first.
    pub fn history(&self) -> Vec<StyleWrite> {
        self.history.borrow().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.history.borrow().len()
    }
}

impl StyleTarget for MemoryElement {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn inline_transform(&self) -> String {
        self.transform.borrow().clone()
    }

    fn inline_opacity(&self) -> Option<String> {
        self.opacity.borrow().clone()
    }

    fn commit(&self, write: &StyleWrite) {
        *self.transform.borrow_mut() = write.transform.clone();
        if let Some(opacity) = &write.opacity {
            *self.opacity.borrow_mut() = Some(opacity.clone());
        }
        self.history.borrow_mut().push(write.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transform() {
        let tokens = parse_transform("translateX(10px)  rotate(45deg) skewX(5deg)");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].name, "translateX");
        assert_eq!(tokens[0].args, "10px");
        assert_eq!(tokens[2].to_string(), "skewX(5deg)");
        assert!(parse_transform("").is_empty());
        assert_eq!(parse_transform("translateX(1px) broken(").len(), 1);
    }

    #[test]
    fn test_read_transform_value() {
        let el = MemoryElement::new("el").with_transform("translateX(12.5px) rotateZ(-30deg)");
        assert_eq!(
            read_transform_value(&el, Property::TranslateX),
            StyleValue {
                value: 12.5,
                unit: Some(Unit::Px)
            }
        );
        assert_eq!(read_transform_value(&el, Property::RotateZ).value, -30.0);
        // absent properties fall back to defaults
        assert_eq!(read_transform_value(&el, Property::TranslateY).value, 0.0);
        assert_eq!(read_transform_value(&el, Property::ScaleX).value, 1.0);
    }

    #[test]
    fn test_read_uniform_scale() {
        let el = MemoryElement::new("el").with_transform("scale(2, 3)");
        assert_eq!(read_transform_value(&el, Property::ScaleX).value, 2.0);
        assert_eq!(read_transform_value(&el, Property::ScaleY).value, 3.0);

        let el = MemoryElement::new("el").with_transform("scale(1.5)");
        assert_eq!(read_transform_value(&el, Property::ScaleY).value, 1.5);
    }

    #[test]
    fn test_read_opacity() {
        let el = MemoryElement::new("el");
        assert_eq!(read_opacity(&el), 1.0);
        let el = MemoryElement::new("el").with_opacity("0.25");
        assert_eq!(read_opacity(&el), 0.25);
        let el = MemoryElement::new("el").with_opacity("bogus");
        assert_eq!(read_opacity(&el), 1.0);
    }

    #[test]
    fn test_snapshot_splits_foreign_tokens() {
        let el = MemoryElement::new("el")
            .with_transform("skewX(5deg) translateY(4em) scale(2)")
            .with_opacity("0.5");
        let snap = snapshot(&el);
        assert_eq!(snap.foreign, vec!["skewX(5deg)".to_string()]);
        assert_eq!(
            snap.present.keys().collect::<Vec<_>>(),
            vec![
                Property::TranslateY,
                Property::ScaleX,
                Property::ScaleY,
                Property::Opacity
            ]
        );
        assert_eq!(
            snap.present.get(Property::TranslateY).unwrap().unit,
            Some(Unit::Em)
        );
    }

    #[test]
    fn test_compose_canonical_order() {
        let mut values = PropertyMap::new();
        values.insert(Property::ScaleY, StyleValue { value: 2.0, unit: None });
        values.insert(
            Property::TranslateX,
            StyleValue {
                value: 50.0,
                unit: Some(Unit::Px),
            },
        );
        values.insert(Property::ScaleX, StyleValue { value: 2.0, unit: None });
        values.insert(Property::Opacity, StyleValue { value: 0.333, unit: None });
        let write = compose(&values, &["skewX(5deg)".to_string()]);
        assert_eq!(
            write.transform,
            "translateX(50.00px) scaleX(2.00) scaleY(2.00) skewX(5deg)"
        );
        assert_eq!(write.opacity.as_deref(), Some("0.33"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(50.0), "50.00");
        assert_eq!(format_number(-0.001), "0.00");
        assert_eq!(format_number(1.005), "1.00");
        assert_eq!(format_number(-12.346), "-12.35");
    }

    #[test]
    fn test_memory_element_records_commits() {
        let el = MemoryElement::new("el").with_opacity("0.3");
        write_style(&el, &PropertyMap::new(), &[]);
        reset(&el);
        assert_eq!(el.commit_count(), 2);
        assert_eq!(el.transform(), "");
        // opacity untouched by transform-only writes
        assert_eq!(el.opacity().as_deref(), Some("0.3"));
    }
}
