//! Core animation types and data structures.
//!
//! This module defines the fundamental types for the animation engine:
//! - `PropertyKey` / `Property`: the closed animatable vocabulary and its slots
//! - `PropertyMap`: fixed-size per-property table
//! - `PropertyValue` / `PropertySet`: target values with optional units
//! - `Progress`, `StepState`, `StepOutcome`, `PlayOutcome`: runtime reporting

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::{AnimeError, Result};

/// Unit suffix attached to a numeric style value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Px,
    Em,
    Rem,
    Vw,
    Vh,
    Deg,
    Percent,
}

impl Unit {
    /// Parse a unit suffix. An empty suffix is `Ok(None)`.
    pub fn parse(suffix: &str) -> Result<Option<Self>> {
        let unit = match suffix.trim() {
            "" => return Ok(None),
            "px" => Self::Px,
            "em" => Self::Em,
            "rem" => Self::Rem,
            "vw" => Self::Vw,
            "vh" => Self::Vh,
            "deg" => Self::Deg,
            "%" => Self::Percent,
            other => return Err(AnimeError::UnsupportedUnit(other.to_string())),
        };
        Ok(Some(unit))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Vw => "vw",
            Self::Vh => "vh",
            Self::Deg => "deg",
            Self::Percent => "%",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete animated slot.
///
/// Every slot maps to exactly one field of the committed style: a transform
/// function token or `opacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    TranslateX,
    TranslateY,
    TranslateZ,
    Rotate,
    RotateX,
    RotateY,
    RotateZ,
    ScaleX,
    ScaleY,
    Opacity,
}

impl Property {
    pub const COUNT: usize = 10;

    /// All slots in canonical write order.
    pub const ALL: [Property; Property::COUNT] = [
        Self::TranslateX,
        Self::TranslateY,
        Self::TranslateZ,
        Self::Rotate,
        Self::RotateX,
        Self::RotateY,
        Self::RotateZ,
        Self::ScaleX,
        Self::ScaleY,
        Self::Opacity,
    ];

    /// Position in [`Property::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used both as the style token and as the input key.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::TranslateX => "translateX",
            Self::TranslateY => "translateY",
            Self::TranslateZ => "translateZ",
            Self::Rotate => "rotate",
            Self::RotateX => "rotateX",
            Self::RotateY => "rotateY",
            Self::RotateZ => "rotateZ",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Opacity => "opacity",
        }
    }

    /// Value assumed when the element carries no inline value.
    pub fn default_value(self) -> f64 {
        match self {
            Self::ScaleX | Self::ScaleY | Self::Opacity => 1.0,
            _ => 0.0,
        }
    }

    /// Unit appended when the target value does not carry one.
    pub fn default_unit(self) -> Option<Unit> {
        match self {
            Self::TranslateX | Self::TranslateY | Self::TranslateZ => Some(Unit::Px),
            Self::Rotate | Self::RotateX | Self::RotateY | Self::RotateZ => Some(Unit::Deg),
            Self::ScaleX | Self::ScaleY | Self::Opacity => None,
        }
    }

    /// True for slots serialized into the transform list.
    pub fn is_transform(self) -> bool {
        self != Self::Opacity
    }

    /// Look up a slot by its transform token name.
    pub fn from_css_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.css_name() == name)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

/// Input key accepted in a [`PropertySet`].
///
/// Identical to [`Property`] plus the uniform `scale` shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    TranslateX,
    TranslateY,
    TranslateZ,
    Rotate,
    RotateX,
    RotateY,
    RotateZ,
    Scale,
    ScaleX,
    ScaleY,
    Opacity,
}

impl PropertyKey {
    pub fn parse(key: &str) -> Result<Self> {
        let key = match key {
            "translateX" => Self::TranslateX,
            "translateY" => Self::TranslateY,
            "translateZ" => Self::TranslateZ,
            "rotate" => Self::Rotate,
            "rotateX" => Self::RotateX,
            "rotateY" => Self::RotateY,
            "rotateZ" => Self::RotateZ,
            "scale" => Self::Scale,
            "scaleX" => Self::ScaleX,
            "scaleY" => Self::ScaleY,
            "opacity" => Self::Opacity,
            other => return Err(AnimeError::UnsupportedProperty(other.to_string())),
        };
        Ok(key)
    }

    /// Slots written for this key. `scale` splits into both axes so it never
    /// stacks with an explicit `scaleX`/`scaleY`.
    pub fn expand(self) -> &'static [Property] {
        match self {
            Self::TranslateX => &[Property::TranslateX],
            Self::TranslateY => &[Property::TranslateY],
            Self::TranslateZ => &[Property::TranslateZ],
            Self::Rotate => &[Property::Rotate],
            Self::RotateX => &[Property::RotateX],
            Self::RotateY => &[Property::RotateY],
            Self::RotateZ => &[Property::RotateZ],
            Self::Scale => &[Property::ScaleX, Property::ScaleY],
            Self::ScaleX => &[Property::ScaleX],
            Self::ScaleY => &[Property::ScaleY],
            Self::Opacity => &[Property::Opacity],
        }
    }
}

/// Fixed-size table with one optional entry per [`Property`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMap<T> {
    slots: [Option<T>; Property::COUNT],
}

impl<T> Default for PropertyMap<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> PropertyMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: Property) -> Option<&T> {
        self.slots[property.index()].as_ref()
    }

    pub fn get_mut(&mut self, property: Property) -> Option<&mut T> {
        self.slots[property.index()].as_mut()
    }

    pub fn insert(&mut self, property: Property, value: T) -> Option<T> {
        self.slots[property.index()].replace(value)
    }

    pub fn contains(&self, property: Property) -> bool {
        self.slots[property.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Occupied slots in canonical order.
    pub fn keys(&self) -> impl Iterator<Item = Property> + '_ {
        Property::ALL
            .into_iter()
            .filter(move |p| self.slots[p.index()].is_some())
    }

    /// Occupied entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Property, &T)> + '_ {
        Property::ALL
            .into_iter()
            .filter_map(move |p| self.slots[p.index()].as_ref().map(|v| (p, v)))
    }
}

/// Target value for one property, optionally unit-tagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub value: f64,
    pub unit: Option<Unit>,
}

impl PropertyValue {
    pub fn new(value: f64) -> Self {
        Self { value, unit: None }
    }

    pub fn with_unit(value: f64, unit: Unit) -> Self {
        Self {
            value,
            unit: Some(unit),
        }
    }

    pub fn px(value: f64) -> Self {
        Self::with_unit(value, Unit::Px)
    }

    pub fn deg(value: f64) -> Self {
        Self::with_unit(value, Unit::Deg)
    }

    /// Unit to write for `property`: the explicit one, then the unit already
    /// inline on the element, then the canonical default.
    pub fn unit_for(&self, property: Property, inline: Option<Unit>) -> Option<Unit> {
        self.unit.or(inline).or_else(|| property.default_unit())
    }
}

/// Split `"12.5px"` into its numeric prefix and the trimmed suffix.
pub fn split_numeric(text: &str) -> Option<(f64, &str)> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let number = &text[..end];
    if !number[digits_start..].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = number.parse::<f64>().ok()?;
    Some((value, text[end..].trim()))
}

/// Raw value handed to [`PropertySet::set`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyInput {
    Number(f64),
    Text(String),
    Value(PropertyValue),
}

impl From<f64> for PropertyInput {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for PropertyInput {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for PropertyInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<PropertyValue> for PropertyInput {
    fn from(v: PropertyValue) -> Self {
        Self::Value(v)
    }
}

/// Ordered mapping from property key to target value.
///
/// Unknown keys and unparsable values are logged, recorded in
/// [`PropertySet::issues`] and skipped; they never abort construction.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    entries: Vec<(PropertyKey, PropertyValue)>,
    issues: Vec<AnimeError>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key: value` using the string vocabulary (`"translateX"`, `"scale"`, ...).
    pub fn set(mut self, key: impl AsRef<str>, value: impl Into<PropertyInput>) -> Self {
        let key_name = key.as_ref();
        let key = match PropertyKey::parse(key_name) {
            Ok(key) => key,
            Err(err) => {
                warn!(key = key_name, "skipping unsupported property");
                self.issues.push(err);
                return self;
            }
        };

        let value = match value.into() {
            PropertyInput::Number(v) => PropertyValue::new(v),
            PropertyInput::Value(v) => v,
            PropertyInput::Text(text) => match split_numeric(&text) {
                Some((v, suffix)) => {
                    let unit = match Unit::parse(suffix) {
                        Ok(unit) => unit,
                        Err(err) => {
                            warn!(key = key_name, %err, "unit treated as empty");
                            self.issues.push(err);
                            None
                        }
                    };
                    PropertyValue { value: v, unit }
                }
                None => {
                    warn!(key = key_name, value = %text, "skipping non-numeric value");
                    self.issues.push(AnimeError::InvalidValue {
                        key: key_name.to_string(),
                        value: text,
                    });
                    return self;
                }
            },
        };

        self.entries.push((key, value));
        self
    }

    pub fn entries(&self) -> &[(PropertyKey, PropertyValue)] {
        &self.entries
    }

    /// Problems recorded while building the set.
    pub fn issues(&self) -> &[AnimeError] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand keys into concrete slots.
    ///
    /// A uniform `scale` fills both axes first; explicit `scaleX`/`scaleY`
    /// then override it regardless of insertion order. For any other repeated
    /// key the last entry wins.
    pub fn resolve(&self) -> PropertyMap<PropertyValue> {
        let mut map = PropertyMap::new();
        for (key, value) in self.entries.iter().filter(|(k, _)| *k == PropertyKey::Scale) {
            for property in key.expand() {
                map.insert(*property, *value);
            }
        }
        for (key, value) in self.entries.iter().filter(|(k, _)| *k != PropertyKey::Scale) {
            for property in key.expand() {
                map.insert(*property, *value);
            }
        }
        map
    }
}

/// Observer payload delivered after every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based sequence number of the reporting step.
    pub sequence: u32,
    /// Queue-relative completion, 0..=100.
    pub percent: u32,
}

/// Lifecycle of an [`AnimationStep`](crate::step::AnimationStep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Constructed, never played (or reset).
    #[default]
    Idle,
    /// Frame loop active.
    Running,
    /// Frame loop ticking without updating properties.
    Paused,
    /// Completion condition met; waiters resolved.
    Settled,
    /// Frame request cancelled.
    Stopped,
}

/// How a step run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Every target reached its values with no absorbed errors.
    Completed,
    /// The run completed (or could not start) but errors were absorbed on the way.
    Degraded(Vec<AnimeError>),
    /// The run was stopped before completing.
    Stopped,
}

impl StepOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// How a [`Sequencer::play`](crate::sequencer::Sequencer::play) call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Every requested pass finished.
    Completed {
        passes: u32,
        degraded: Vec<AnimeError>,
    },
    /// `stop()` cancelled the traversal.
    Stopped,
    /// A traversal was already in flight; its paused step was resumed.
    Resumed,
    /// A traversal was already in flight and nothing was paused.
    AlreadyPlaying,
}
