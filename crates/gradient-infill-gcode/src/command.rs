//! Motion record types
//!
//! Every line of a toolpath program maps to exactly one [`MotionRecord`]:
//! either a linear move (`G0`/`G1`) with its typed fields, or a directive
//! carrying the raw line unchanged.

use serde::{Deserialize, Serialize};

/// Numeric field of a linear move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X coordinate
    X,
    /// Y coordinate
    Y,
    /// Z coordinate
    Z,
    /// Extrusion delta
    E,
    /// Feed rate
    F,
}

impl Axis {
    /// Canonical emission order for fields that have no recorded position
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::E, Axis::F];

    /// Field letter as written in G-code
    pub fn letter(self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
            Self::E => 'E',
            Self::F => 'F',
        }
    }

    /// Parse a field letter (case-insensitive)
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'Z' => Some(Self::Z),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            _ => None,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A `G0`/`G1` linear move
///
/// Coordinates are absolute positions; `e` is the relative extrusion delta
/// for this move. `raw` holds the original line for records that have not
/// been rewritten, so they can be emitted byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearMove {
    /// Command word as written (e.g. "G1", "G01", "G0")
    pub command: String,
    /// Target X
    pub x: Option<f64>,
    /// Target Y
    pub y: Option<f64>,
    /// Target Z
    pub z: Option<f64>,
    /// Extrusion delta
    pub e: Option<f64>,
    /// Feed rate
    pub f: Option<f64>,
    /// Order in which the numeric fields appeared on the line
    pub field_order: Vec<Axis>,
    /// Source text of each field value, dropped once the value is changed
    pub field_text: Vec<(Axis, String)>,
    /// Words this model does not interpret, kept verbatim
    pub extra_words: Vec<String>,
    /// Trailing comment including its leading ';'
    pub comment: Option<String>,
    /// Original line text, present until the move is rewritten
    pub raw: Option<String>,
}

impl LinearMove {
    /// Create an empty move with the given command word
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            x: None,
            y: None,
            z: None,
            e: None,
            f: None,
            field_order: Vec::new(),
            field_text: Vec::new(),
            extra_words: Vec::new(),
            comment: None,
            raw: None,
        }
    }

    /// Read a field
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::E => self.e,
            Axis::F => self.f,
        }
    }

    /// Write a field, recording its position the first time it is set
    pub fn set(&mut self, axis: Axis, value: Option<f64>) -> &mut Self {
        let slot = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::E => &mut self.e,
            Axis::F => &mut self.f,
        };
        *slot = value;
        self.field_text.retain(|(a, _)| *a != axis);
        if value.is_some() && !self.field_order.contains(&axis) {
            self.field_order.push(axis);
        }
        self
    }

    /// Write a field together with the text it was read from
    pub fn set_with_text(
        &mut self,
        axis: Axis,
        value: f64,
        text: impl Into<String>,
    ) -> &mut Self {
        self.set(axis, Some(value));
        self.field_text.push((axis, text.into()));
        self
    }

    /// Source text of a field, if it is still unchanged
    pub fn text_of(&self, axis: Axis) -> Option<&str> {
        self.field_text
            .iter()
            .find(|(a, _)| *a == axis)
            .map(|(_, text)| text.as_str())
    }

    /// Copy a field and its source text from `other`
    pub fn copy_field(&mut self, other: &LinearMove, axis: Axis) -> &mut Self {
        match (other.get(axis), other.text_of(axis)) {
            (Some(value), Some(text)) => self.set_with_text(axis, value, text),
            (value, None) => self.set(axis, value),
            (None, Some(_)) => self,
        }
    }

    /// Whether the move deposits material (non-null, non-zero delta)
    pub fn is_extruding(&self) -> bool {
        self.e.is_some_and(|e| e != 0.0)
    }

    /// Whether the move pushes material forward (retractions excluded)
    pub fn is_depositing(&self) -> bool {
        self.e.is_some_and(|e| e > 0.0)
    }

    /// Whether the move names a planar target
    pub fn has_xy(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// Whether the move has been rewritten (no raw text to fall back on)
    pub fn is_rewritten(&self) -> bool {
        self.raw.is_none()
    }

    /// Copy of this move that will be formatted from its fields
    pub fn detached(&self) -> Self {
        let mut copy = self.clone();
        copy.raw = None;
        copy
    }
}

/// Any line that is not a linear move, preserved verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// The line text without its line ending
    pub raw_text: String,
}

impl Directive {
    /// Create a new directive
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    /// First word of the line with comments removed, upper-cased (e.g. "M83")
    pub fn code(&self) -> Option<String> {
        let code_part = self.raw_text.split(';').next().unwrap_or_default();
        code_part
            .split_whitespace()
            .next()
            .map(|word| word.to_ascii_uppercase())
    }

    /// Whether the line is a comment or blank
    pub fn is_comment_or_blank(&self) -> bool {
        let trimmed = self.raw_text.trim_start();
        trimmed.is_empty() || trimmed.starts_with(';')
    }
}

/// One line of a toolpath program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionRecord {
    /// A `G0`/`G1` move
    LinearMove(LinearMove),
    /// Anything else
    Directive(Directive),
}

impl MotionRecord {
    /// The move, if this record is one
    pub fn as_move(&self) -> Option<&LinearMove> {
        match self {
            Self::LinearMove(m) => Some(m),
            Self::Directive(_) => None,
        }
    }

    /// The directive, if this record is one
    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            Self::LinearMove(_) => None,
            Self::Directive(d) => Some(d),
        }
    }

    /// Original text of the record, if it still has one
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::LinearMove(m) => m.raw.as_deref(),
            Self::Directive(d) => Some(&d.raw_text),
        }
    }
}
