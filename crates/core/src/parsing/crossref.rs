use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{InstructionRecord, MemberRef};

fn annotation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(\d+)\b").expect("annotation pattern is valid"))
}

fn scope_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^;?\s*-\s+([\w$./]+)::([\w$<>]+)@(\d+)(?:\s+\(line\s+(\d+)\))?")
            .expect("scope pattern is valid")
    })
}

/// One frame of a HotSpot debug scope, e.g. `; - org.example.Canvas::paint@5 (line 12)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame<'a> {
    pub class_name: &'a str,
    pub method_name: &'a str,
    pub bci: u32,
    pub source_line: Option<u32>,
}

pub fn parse_scope_line(line: &str) -> Option<ScopeFrame<'_>> {
    let caps = scope_regex().captures(line.trim())?;
    Some(ScopeFrame {
        class_name: caps.get(1)?.as_str(),
        method_name: caps.get(2)?.as_str(),
        bci: caps.get(3)?.as_str().parse().ok()?,
        source_line: caps.get(4).and_then(|m| m.as_str().parse().ok()),
    })
}

/// Bytecode offset named by an annotation such as `@5` or `bci@5`.
pub fn annotation_offset(annotation: &str) -> Option<u32> {
    annotation_regex()
        .captures(annotation)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Link from an instruction to a bytecode offset of the method being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossReference {
    pub offset: u32,
    /// The instruction belongs to a callee inlined at `offset`, not to the
    /// invoke at `offset` itself.
    pub inlined: bool,
}

/// Offsets of `member` that `record` was emitted for.
///
/// Scope lines come in blocks listed innermost frame first. Within a block,
/// the last frame naming `member` is its outermost activation; the link is
/// direct only when that frame is also the first line of the block.
pub fn cross_references(record: &InstructionRecord, member: &MemberRef) -> Vec<CrossReference> {
    let mut refs: Vec<CrossReference> = Vec::new();

    if let Some(offset) = record.annotation().and_then(annotation_offset) {
        refs.push(CrossReference { offset, inlined: false });
    }

    let mut block_position = 0usize;
    let mut candidate: Option<CrossReference> = None;

    for line in record.comment_lines() {
        match parse_scope_line(line) {
            Some(frame) => {
                if member.matches_frame(frame.class_name, frame.method_name) {
                    candidate = Some(CrossReference {
                        offset: frame.bci,
                        inlined: block_position > 0,
                    });
                }
                block_position += 1;
            }
            None => {
                if let Some(found) = candidate.take() {
                    refs.push(found);
                }
                block_position = 0;
            }
        }
    }

    if let Some(found) = candidate {
        refs.push(found);
    }

    // one link per offset, direct wins over inlined
    refs.sort_by_key(|r| (r.offset, r.inlined));
    refs.dedup_by_key(|r| r.offset);
    refs
}

/// Maps each bytecode offset of `member` to the indexes of the instructions
/// linked to it, in instruction order.
pub fn index_by_offset(
    instructions: &[InstructionRecord],
    member: &MemberRef,
) -> BTreeMap<u32, Vec<(usize, bool)>> {
    let mut index: BTreeMap<u32, Vec<(usize, bool)>> = BTreeMap::new();

    for (i, record) in instructions.iter().enumerate() {
        for link in cross_references(record, member) {
            index.entry(link.offset).or_default().push((i, link.inlined));
        }
    }

    index
}
