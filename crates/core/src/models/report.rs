use std::fmt;

use serde::Serialize;

use super::{CallKind, MemberRef};
use crate::utils::format::format_address;

/// A virtual or interface call site the compiler resolved statically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizedVirtualCall {
    calling_member: MemberRef,
    bytecode_offset: u32,
    original_call_kind: CallKind,
    target: MemberRef,
    resolution_evidence: String,
    evidence_address: u64,
}

impl OptimizedVirtualCall {
    pub(crate) fn new(
        calling_member: MemberRef,
        bytecode_offset: u32,
        original_call_kind: CallKind,
        target: MemberRef,
        resolution_evidence: String,
        evidence_address: u64,
    ) -> Self {
        Self {
            calling_member,
            bytecode_offset,
            original_call_kind,
            target,
            resolution_evidence,
            evidence_address,
        }
    }

    pub fn calling_member(&self) -> &MemberRef {
        &self.calling_member
    }

    pub fn bytecode_offset(&self) -> u32 {
        self.bytecode_offset
    }

    pub fn original_call_kind(&self) -> CallKind {
        self.original_call_kind
    }

    pub fn target(&self) -> &MemberRef {
        &self.target
    }

    pub fn resolution_evidence(&self) -> &str {
        &self.resolution_evidence
    }

    /// Address of the instruction the evidence was read from.
    pub fn evidence_address(&self) -> u64 {
        self.evidence_address
    }
}

impl fmt::Display for OptimizedVirtualCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} {} -> {} [{}] at {}",
            self.calling_member,
            self.bytecode_offset,
            self.original_call_kind.opcode(),
            self.target,
            self.resolution_evidence,
            format_address(self.evidence_address)
        )
    }
}

/// Findings of one analysis run, ordered by calling member then bytecode offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    calls: Vec<OptimizedVirtualCall>,
}

impl Report {
    /// Sorts `calls` into report order. The sort is stable.
    pub(crate) fn from_unsorted(mut calls: Vec<OptimizedVirtualCall>) -> Self {
        calls.sort_by_cached_key(|c| (c.calling_member.fully_qualified_name(), c.bytecode_offset));
        Self { calls }
    }

    pub fn calls(&self) -> &[OptimizedVirtualCall] {
        &self.calls
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptimizedVirtualCall> {
        self.calls.iter()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Findings whose calling member's fully-qualified name contains `filter`.
    pub fn for_member<'a>(&'a self, filter: &'a str) -> impl Iterator<Item = &'a OptimizedVirtualCall> + 'a {
        self.calls
            .iter()
            .filter(move |c| c.calling_member.fully_qualified_name().contains(filter))
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a OptimizedVirtualCall;
    type IntoIter = std::slice::Iter<'a, OptimizedVirtualCall>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.iter()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for call in &self.calls {
            writeln!(f, "{}", call)?;
        }
        Ok(())
    }
}
