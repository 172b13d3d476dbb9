//! Program serializer
//!
//! Records that still carry their raw text are emitted unchanged. Rewritten
//! moves are formatted from their fields in the field order of the line they
//! came from. Fields that still carry their source text are written as read;
//! changed fields use fixed precision with trailing zeros trimmed.

use serde::{Deserialize, Serialize};

use super::{Axis, LineEnding, LinearMove, MotionRecord};

/// Decimal places used when formatting rewritten moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    /// Decimals for X, Y and Z
    pub coordinate_decimals: usize,
    /// Decimals for E
    pub extrusion_decimals: usize,
    /// Decimals for F
    pub feed_decimals: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            coordinate_decimals: 3,
            extrusion_decimals: 5,
            feed_decimals: 0,
        }
    }
}

impl NumberFormat {
    /// Decimal places for a field
    pub fn decimals_for(&self, axis: Axis) -> usize {
        match axis {
            Axis::X | Axis::Y | Axis::Z => self.coordinate_decimals,
            Axis::E => self.extrusion_decimals,
            Axis::F => self.feed_decimals,
        }
    }
}

/// Format a number with at most `decimals` places, trimming trailing zeros
pub fn format_number(value: f64, decimals: usize) -> String {
    let mut text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Serializer for motion records
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramSerializer {
    format: NumberFormat,
}

impl ProgramSerializer {
    /// Create a serializer with the given precision
    pub fn new(format: NumberFormat) -> Self {
        Self { format }
    }

    /// Text of one record (without line terminator)
    pub fn format_record(&self, record: &MotionRecord) -> String {
        match record.raw_text() {
            Some(raw) => raw.to_string(),
            None => match record {
                MotionRecord::LinearMove(m) => self.format_move(m),
                MotionRecord::Directive(d) => d.raw_text.clone(),
            },
        }
    }

    /// Format a move from its fields
    pub fn format_move(&self, m: &LinearMove) -> String {
        let mut parts = vec![m.command.clone()];

        let remaining = Axis::ALL.iter().filter(|a| !m.field_order.contains(a));
        for &axis in m.field_order.iter().chain(remaining) {
            if let Some(value) = m.get(axis) {
                let text = match m.text_of(axis) {
                    Some(text) => text.to_string(),
                    None => format_number(value, self.format.decimals_for(axis)),
                };
                parts.push(format!("{}{}", axis.letter(), text));
            }
        }

        parts.extend(m.extra_words.iter().cloned());

        let mut line = parts.join(" ");
        if let Some(comment) = &m.comment {
            line.push(' ');
            line.push_str(comment);
        }
        line
    }

    /// Join all records into program text
    pub fn serialize(&self, records: &[MotionRecord], line_ending: LineEnding) -> String {
        records
            .iter()
            .map(|r| self.format_record(r))
            .collect::<Vec<_>>()
            .join(line_ending.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Directive, ProgramParser};

    #[test]
    fn test_format_number_trims() {
        assert_eq!(format_number(5.0, 3), "5");
        assert_eq!(format_number(5.1, 3), "5.1");
        assert_eq!(format_number(0.123456, 5), "0.12346");
        assert_eq!(format_number(-0.00001, 3), "0");
        assert_eq!(format_number(1500.4, 0), "1500");
        assert_eq!(format_number(-2.5, 3), "-2.5");
    }

    #[test]
    fn test_raw_records_are_untouched() {
        let parser = ProgramParser::default();
        let text = "G1  X1.000 Y2 E0.5   ;keep spacing\nM83\n";
        let program = parser.parse(text).expect("parse");
        let out = ProgramSerializer::default().serialize(&program.records, program.line_ending);
        assert_eq!(out, text);
    }

    #[test]
    fn test_crlf_round_trip() {
        let parser = ProgramParser::default();
        let text = ";LAYER:0\r\nG1 X1 Y2 E0.5\r\n";
        let program = parser.parse(text).expect("parse");
        let out = ProgramSerializer::default().serialize(&program.records, program.line_ending);
        assert_eq!(out, text);
    }

    #[test]
    fn test_format_move_keeps_order_and_comment() {
        let mut m = LinearMove::new("G1");
        m.set(Axis::F, Some(2400.0))
            .set(Axis::X, Some(10.12345))
            .set(Axis::Y, Some(3.0))
            .set(Axis::E, Some(0.0312349));
        m.extra_words.push("S0".to_string());
        m.comment = Some(";note".to_string());

        let line = ProgramSerializer::default().format_move(&m);
        assert_eq!(line, "G1 F2400 X10.123 Y3 E0.03123 S0 ;note");
    }

    #[test]
    fn test_unchanged_fields_keep_source_text() {
        let parser = ProgramParser::default();
        let program = parser
            .parse("G1 F1234.5 X5.12345 Y6.98765 E1.0")
            .expect("parse");
        let mut m = program.records[0].as_move().expect("move").detached();
        m.set(Axis::E, Some(0.681984));

        let line = ProgramSerializer::default().format_move(&m);
        assert_eq!(line, "G1 F1234.5 X5.12345 Y6.98765 E0.68198");
    }

    #[test]
    fn test_fields_without_order_use_canonical_order() {
        let mut m = LinearMove::new("G1");
        m.e = Some(1.0);
        m.x = Some(2.0);
        m.y = Some(3.0);
        let line = ProgramSerializer::default().format_move(&m);
        assert_eq!(line, "G1 X2 Y3 E1");
    }

    #[test]
    fn test_directive_emitted_verbatim() {
        let record = MotionRecord::Directive(Directive::new("  ;odd   spacing "));
        assert_eq!(
            ProgramSerializer::default().format_record(&record),
            "  ;odd   spacing "
        );
    }
}
