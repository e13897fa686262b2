use std::sync::OnceLock;

use log::{debug, trace};
use regex::Regex;

use crate::consts::INSTRUCTION_MODIFIERS;
use crate::error::JitLensError;
use crate::models::InstructionRecord;

fn instruction_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(?P<anno>\S+)\s+)?0x(?P<addr>[0-9a-fA-F]+):(?P<rest>.*)$")
            .expect("instruction pattern is valid")
    })
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\[(?P<label>[^\]]+)\]\s*$").expect("label pattern is valid"))
}

/// Parses HotSpot `PrintAssembly` instruction text into [`InstructionRecord`]s.
///
/// Recognized lines:
/// - `[@5] 0x00007f3c1d0a4e2c: lock cmpxchg %rcx,(%rdx)  ;comment`
/// - `                        ;continuation comment`
/// - `[Verified Entry Point]` section labels, kept as the next instruction's annotation
///
/// Anything else (headers, blank lines) is skipped.
pub struct AssemblyParser;

impl Default for AssemblyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblyParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Result<Vec<InstructionRecord>, JitLensError> {
        let mut records: Vec<InstructionRecord> = Vec::new();
        let mut pending_label: Option<String> = None;

        for (line_no, line) in text.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with(';') {
                match records.last_mut() {
                    Some(last) => last.add_comment_line(Some(trimmed)),
                    None => trace!("Dropping comment before first instruction: {}", trimmed),
                }
                continue;
            }

            if let Some(caps) = label_regex().captures(line) {
                pending_label = Some(format!("[{}]", &caps["label"]));
                continue;
            }

            match instruction_regex().captures(line) {
                Some(caps) => {
                    let address = u64::from_str_radix(&caps["addr"], 16).map_err(|_| {
                        JitLensError::AssemblyParseError {
                            line: line_no + 1,
                            text: line.to_string(),
                        }
                    })?;

                    let label = pending_label.take();
                    let annotation = caps
                        .name("anno")
                        .map(|m| m.as_str().to_string())
                        .or(label);

                    let record = self
                        .parse_body(annotation, address, &caps["rest"])
                        .ok_or_else(|| JitLensError::AssemblyParseError {
                            line: line_no + 1,
                            text: line.to_string(),
                        })?;
                    records.push(record);
                }
                None => debug!("Skipping non-instruction line {}: {}", line_no + 1, trimmed),
            }
        }

        debug!("Parsed {} instructions", records.len());
        Ok(records)
    }

    // `rest` is everything after `0x...:`
    fn parse_body(&self, annotation: Option<String>, address: u64, rest: &str) -> Option<InstructionRecord> {
        let (body, comment) = match rest.find(';') {
            Some(pos) => (&rest[..pos], Some(rest[pos..].trim())),
            None => (rest, None),
        };

        let body = body.trim();
        let mut tokens = body.splitn(2, char::is_whitespace);
        let mut head = tokens.next().filter(|t| !t.is_empty())?;
        let mut tail = tokens.next().unwrap_or("").trim();

        let mut modifier = None;
        if self.is_modifier(head) && !tail.is_empty() {
            modifier = Some(head.to_string());
            let mut rest_tokens = tail.splitn(2, char::is_whitespace);
            head = rest_tokens.next()?;
            tail = rest_tokens.next().unwrap_or("").trim();
        }

        Some(InstructionRecord::new(
            annotation,
            address,
            modifier,
            head,
            split_operands(tail),
            comment.filter(|c| !c.is_empty()),
        ))
    }

    fn is_modifier(&self, token: &str) -> bool {
        let lower = token.to_ascii_lowercase();
        INSTRUCTION_MODIFIERS.contains(&lower.as_str())
    }
}

/// Splits on commas outside `()` and `[]`, so `0x10(%rsp,%rax,8)` stays whole.
pub fn split_operands(text: &str) -> Vec<String> {
    let mut operands = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for c in text.chars() {
        match c {
            '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth <= 0 => {
                operands.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() {
        operands.push(current.trim().to_string());
    }

    operands.retain(|op| !op.is_empty());
    operands
}
