use std::fmt;

use serde::Serialize;

use crate::consts::{COMMENT_GAP, OPERAND_SEPARATOR};
use crate::utils::format::{align_left, display_width, format_address, rtrim, spaces};

/// One disassembled native instruction and the comment lines attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionRecord {
    annotation: Option<String>,
    address: u64,
    modifier: Option<String>,
    mnemonic: String,
    operands: Vec<String>,
    comment_lines: Vec<String>,
}

impl InstructionRecord {
    pub fn new(
        annotation: Option<String>,
        address: u64,
        modifier: Option<String>,
        mnemonic: impl Into<String>,
        operands: Vec<String>,
        first_comment: Option<&str>,
    ) -> Self {
        let mut record = Self {
            annotation,
            address,
            modifier,
            mnemonic: mnemonic.into(),
            operands,
            comment_lines: Vec::new(),
        };
        record.add_comment_line(first_comment);
        record
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn modifier(&self) -> Option<&str> {
        self.modifier.as_deref()
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn operands(&self) -> &[String] {
        &self.operands
    }

    pub fn comment_lines(&self) -> &[String] {
        &self.comment_lines
    }

    /// All comment lines joined with `'\n'`.
    pub fn comment(&self) -> String {
        self.comment_lines.join("\n")
    }

    pub fn add_comment_line(&mut self, line: Option<&str>) {
        if let Some(line) = line {
            self.comment_lines.push(line.trim().to_string());
        }
    }

    // annotation, address, modifier, mnemonic and operands; no comment
    fn instruction_prefix(&self, annotation_width: usize) -> String {
        let mut out = align_left(self.annotation.as_deref(), annotation_width);
        out.push_str(&format_address(self.address));
        out.push_str(": ");

        if let Some(modifier) = &self.modifier {
            out.push_str(modifier);
            out.push(' ');
        }

        out.push_str(&self.mnemonic);

        if !self.operands.is_empty() {
            out.push(' ');
            out.push_str(&self.operands.join(OPERAND_SEPARATOR));
        }

        out
    }

    /// Renders the instruction with every comment line. The first comment
    /// sits on the instruction row; the rest are indented beneath it.
    pub fn render(&self, annotation_width: usize) -> String {
        let mut out = self.instruction_prefix(annotation_width);
        let indent = spaces(display_width(&out) + COMMENT_GAP.len());

        for (i, line) in self.comment_lines.iter().enumerate() {
            if i == 0 {
                out.push_str(COMMENT_GAP);
            } else {
                out.push('\n');
                out.push_str(&indent);
            }
            out.push_str(line);
        }

        rtrim(&out).to_string()
    }

    /// Renders one physical row of [`render`](Self::render): row 0 is the
    /// instruction plus its first comment, row `n` is only the indented
    /// `n`th comment line. Lets a row-per-line table map every row back to
    /// the same instruction.
    ///
    /// # Panics
    ///
    /// Panics if the record has comment lines and `line` is not below
    /// `comment_lines().len()`. Check the count first.
    pub fn render_line(&self, annotation_width: usize, line: usize) -> String {
        let prefix = self.instruction_prefix(annotation_width);

        if self.comment_lines.is_empty() {
            return rtrim(&prefix).to_string();
        }

        let out = if line == 0 {
            format!("{}{}{}", prefix, COMMENT_GAP, self.comment_lines[0])
        } else {
            format!(
                "{}{}",
                spaces(display_width(&prefix) + COMMENT_GAP.len()),
                self.comment_lines[line]
            )
        };

        rtrim(&out).to_string()
    }

    /// Number of text rows [`render`](Self::render) produces.
    pub fn row_count(&self) -> usize {
        self.comment_lines.len().max(1)
    }
}

impl fmt::Display for InstructionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

/// One physical text row of a listing, tagged with the instruction it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub instruction_index: usize,
    pub text: String,
}

/// Annotation column width for a set of records: the widest annotation
/// plus one separating space, or zero when none are annotated.
pub fn listing_width(records: &[InstructionRecord]) -> usize {
    records
        .iter()
        .filter_map(|r| r.annotation())
        .map(display_width)
        .max()
        .map(|w| w + 1)
        .unwrap_or(0)
}

pub fn listing_rows(records: &[InstructionRecord]) -> Vec<ListingRow> {
    let width = listing_width(records);
    let mut rows = Vec::new();

    for (index, record) in records.iter().enumerate() {
        for line in 0..record.row_count() {
            rows.push(ListingRow {
                instruction_index: index,
                text: record.render_line(width, line),
            });
        }
    }

    rows
}

pub fn render_listing(records: &[InstructionRecord]) -> String {
    let width = listing_width(records);
    records
        .iter()
        .map(|r| r.render(width))
        .collect::<Vec<_>>()
        .join("\n")
}
