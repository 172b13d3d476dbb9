//! Program parser and modal state tracking
//!
//! The parser turns program text into one [`MotionRecord`] per line plus the
//! structural [`MarkerEvent`]s found on directive lines. Unknown lines are
//! preserved verbatim; a recognised move with a malformed numeric field is a
//! hard error.

use gradient_infill_core::{ParseError, Point2D};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Axis, Directive, LinearMove, MarkerEvent, MarkerSet, MotionRecord};

/// Line terminator used when re-emitting the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Detect the ending used by the first line break of `text`
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if pos > 0 && text.as_bytes()[pos - 1] == b'\r' => Self::CrLf,
            _ => Self::Lf,
        }
    }

    /// The terminator text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Extrusion axis mode (M82 / M83)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrusionMode {
    /// No mode command seen yet
    #[default]
    Unknown,
    /// M82: E values are running totals
    Absolute,
    /// M83: E values are per-move deltas
    Relative,
}

/// Positioning mode (G90 / G91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositioningMode {
    /// G90
    #[default]
    Absolute,
    /// G91
    Relative,
}

/// Machine state while scanning a program
///
/// A pure fold: [`ModalState::apply`] maps `(state, record)` to the state
/// after that record, so every stage can replay the same position history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModalState {
    /// Last known X
    pub x: Option<f64>,
    /// Last known Y
    pub y: Option<f64>,
    /// Last known Z
    pub z: Option<f64>,
    /// Modal feed rate
    pub feed_rate: Option<f64>,
    /// Extrusion mode
    pub extrusion_mode: ExtrusionMode,
    /// Positioning mode
    pub positioning: PositioningMode,
}

impl ModalState {
    /// Create a new state with nothing known
    pub fn new() -> Self {
        Self::default()
    }

    /// Current planar position, once both X and Y are known
    pub fn position(&self) -> Option<Point2D> {
        Some(Point2D::new(self.x?, self.y?))
    }

    /// Planar target of `m` when executed from this state
    pub fn target_of(&self, m: &LinearMove) -> Option<Point2D> {
        let next = self.apply_move(m);
        next.position()
    }

    /// State after executing `record`
    pub fn apply(&self, record: &MotionRecord) -> ModalState {
        match record {
            MotionRecord::LinearMove(m) => self.apply_move(m),
            MotionRecord::Directive(d) => self.apply_directive(d),
        }
    }

    fn apply_move(&self, m: &LinearMove) -> ModalState {
        let mut next = *self;
        match self.positioning {
            PositioningMode::Absolute => {
                next.x = m.x.or(self.x);
                next.y = m.y.or(self.y);
                next.z = m.z.or(self.z);
            }
            PositioningMode::Relative => {
                next.x = offset(self.x, m.x);
                next.y = offset(self.y, m.y);
                next.z = offset(self.z, m.z);
            }
        }
        next.feed_rate = m.f.or(self.feed_rate);
        next
    }

    fn apply_directive(&self, d: &Directive) -> ModalState {
        let mut next = *self;
        match d.code().as_deref() {
            Some("M82") => next.extrusion_mode = ExtrusionMode::Absolute,
            Some("M83") => next.extrusion_mode = ExtrusionMode::Relative,
            Some("G90") => next.positioning = PositioningMode::Absolute,
            Some("G91") => next.positioning = PositioningMode::Relative,
            Some("G28") => {
                next.x = None;
                next.y = None;
                next.z = None;
            }
            Some("G92") => {
                for word in d.raw_text.split(';').next().unwrap_or_default().split_whitespace() {
                    let mut chars = word.chars();
                    let axis = chars.next().and_then(Axis::from_letter);
                    let value = chars.as_str().parse::<f64>().ok();
                    match (axis, value) {
                        (Some(Axis::X), Some(v)) => next.x = Some(v),
                        (Some(Axis::Y), Some(v)) => next.y = Some(v),
                        (Some(Axis::Z), Some(v)) => next.z = Some(v),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        next
    }
}

fn offset(base: Option<f64>, delta: Option<f64>) -> Option<f64> {
    match delta {
        Some(d) => base.map(|b| b + d),
        None => base,
    }
}

/// Result of parsing a whole program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedProgram {
    /// One record per input line, in input order
    pub records: Vec<MotionRecord>,
    /// Marker events in record order
    pub markers: Vec<MarkerEvent>,
    /// Line ending to reproduce on output
    pub line_ending: LineEnding,
}

impl ParsedProgram {
    /// 1-based line number of a record
    pub fn line_number(index: usize) -> usize {
        index + 1
    }

    /// Number of records (input lines)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the program has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of linear moves
    pub fn move_count(&self) -> usize {
        self.records.iter().filter(|r| r.as_move().is_some()).count()
    }
}

/// Toolpath program parser
#[derive(Debug, Clone, Default)]
pub struct ProgramParser {
    markers: MarkerSet,
}

impl ProgramParser {
    /// Create a parser for the given marker vocabulary
    pub fn new(markers: MarkerSet) -> Self {
        Self { markers }
    }

    /// Marker vocabulary in use
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Parse a whole program
    pub fn parse(&self, text: &str) -> Result<ParsedProgram, ParseError> {
        let line_ending = LineEnding::detect(text);
        let mut records = Vec::new();
        let mut markers = Vec::new();

        for (index, line) in text.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let record = self.parse_line(line, ParsedProgram::line_number(index))?;

            if let MotionRecord::Directive(d) = &record {
                if let Some(kind) = self.markers.recognize(&d.raw_text) {
                    markers.push(MarkerEvent {
                        record_index: index,
                        kind,
                    });
                }
            }
            records.push(record);
        }

        tracing::debug!(
            "Parsed {} lines ({} markers, line ending {:?})",
            records.len(),
            markers.len(),
            line_ending
        );

        Ok(ParsedProgram {
            records,
            markers,
            line_ending,
        })
    }

    /// Parse one line (without its terminator)
    pub fn parse_line(&self, line: &str, line_number: usize) -> Result<MotionRecord, ParseError> {
        let (code_part, comment) = match line.find(';') {
            Some(pos) => (&line[..pos], Some(line[pos..].to_string())),
            None => (line, None),
        };

        let mut words = code_part.split_whitespace();
        let command = match words.next() {
            Some(word) if is_linear_move_word(word) => word,
            _ => return Ok(MotionRecord::Directive(Directive::new(line))),
        };

        let mut m = LinearMove::new(command);
        m.comment = comment;
        m.raw = Some(line.to_string());

        for word in words {
            let mut chars = word.chars();
            let letter = match chars.next() {
                Some(c) => c,
                None => continue,
            };
            let Some(axis) = Axis::from_letter(letter) else {
                m.extra_words.push(word.to_string());
                continue;
            };

            let text = chars.as_str();
            if text.is_empty() {
                return Err(ParseError::MissingValue {
                    line_number,
                    field: axis.letter(),
                    content: line.to_string(),
                });
            }
            let value = text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseError::InvalidNumber {
                    line_number,
                    field: axis.letter(),
                    value: text.to_string(),
                    content: line.to_string(),
                })?;
            m.set_with_text(axis, value, text);
        }

        Ok(MotionRecord::LinearMove(m))
    }
}

/// Whether a command word is G0/G1 (with optional leading zeros)
fn is_linear_move_word(word: &str) -> bool {
    static MOVE_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let regex =
        MOVE_REGEX.get_or_init(|| Regex::new(r"^[Gg]0*[01]$").expect("invalid regex pattern"));
    regex.is_match(word)
}
