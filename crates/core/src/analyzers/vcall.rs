use std::collections::BTreeMap;

use log::{debug, trace};

use crate::consts::{DISPATCH_MARKERS, OPTIMIZATION_MARKERS};
use crate::models::{
    AnalysisConfig, BytecodeCallSite, CompiledMethod, InstructionRecord, OptimizedVirtualCall, TypeHierarchy,
};
use crate::parsing::{index_by_offset, parse_scope_line};

#[derive(Debug, Clone)]
struct EvidenceMarker {
    text: String,
    needle: String,
}

impl EvidenceMarker {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            needle: text.to_lowercase(),
        }
    }
}

/// Decides which virtual and interface call sites of a compiled method
/// were resolved statically by the compiler.
///
/// Evidence comes from the comments of the instructions emitted directly
/// for the call site. With a [`TypeHierarchy`] attached, a call site that
/// has native code but no marker and no dispatch is also reported when the
/// hierarchy shows only one possible target.
#[derive(Debug, Clone)]
pub struct OptimizedCallFinder {
    markers: Vec<EvidenceMarker>,
    hierarchy: Option<TypeHierarchy>,
}

impl Default for OptimizedCallFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizedCallFinder {
    pub fn new() -> Self {
        Self {
            markers: OPTIMIZATION_MARKERS.iter().map(|m| EvidenceMarker::new(m)).collect(),
            hierarchy: None,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        let mut finder = Self::new();
        for marker in &config.extra_markers {
            finder.add_marker(marker);
        }
        finder
    }

    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    pub fn add_marker(&mut self, marker: &str) {
        let marker = marker.trim();
        if marker.is_empty() || self.markers.iter().any(|m| m.needle == marker.to_lowercase()) {
            return;
        }
        self.markers.push(EvidenceMarker::new(marker));
    }

    pub fn has_hierarchy(&self) -> bool {
        self.hierarchy.is_some()
    }

    /// Findings for `method`, ascending by bytecode offset, at most one per offset.
    /// Call sites with no native code or no evidence produce nothing.
    pub fn find(&self, method: &CompiledMethod) -> Vec<OptimizedVirtualCall> {
        let mut candidates: BTreeMap<u32, &BytecodeCallSite> = BTreeMap::new();
        for site in method.call_sites.iter().filter(|s| s.kind.is_dispatched()) {
            if candidates.contains_key(&site.offset) {
                debug!(
                    "Ignoring repeated call site {}@{}",
                    method.member, site.offset
                );
                continue;
            }
            candidates.insert(site.offset, site);
        }

        if candidates.is_empty() {
            return Vec::new();
        }

        let index = index_by_offset(&method.instructions, &method.member);
        let mut found = Vec::new();

        for (offset, site) in candidates {
            let Some(window) = index.get(&offset) else {
                trace!("No native code for {}@{}", method.member, offset);
                continue;
            };

            let direct: Vec<&InstructionRecord> = window
                .iter()
                .filter(|(_, inlined)| !inlined)
                .map(|(i, _)| &method.instructions[*i])
                .collect();

            if has_dispatch(&direct) {
                trace!("{}@{} emits a runtime dispatch", method.member, offset);
                continue;
            }

            let evidence = self.textual_evidence(&direct).or_else(|| {
                let first = window.first().map(|(i, _)| &method.instructions[*i]);
                self.hierarchy_evidence(site, &direct, first)
            });

            match evidence {
                Some((text, address)) => {
                    trace!("{}@{} optimized: {}", method.member, offset, text);
                    found.push(OptimizedVirtualCall::new(
                        method.member.clone(),
                        offset,
                        site.kind,
                        site.target.clone(),
                        text,
                        address,
                    ));
                }
                None => trace!("{}@{} keeps its dispatch", method.member, offset),
            }
        }

        if !found.is_empty() {
            debug!("{} optimized calls in {}", found.len(), method.member);
        }
        found
    }

    fn textual_evidence(&self, window: &[&InstructionRecord]) -> Option<(String, u64)> {
        for record in window {
            for line in annotation_lines(record) {
                let lower = line.to_lowercase();
                if let Some(marker) = self.markers.iter().find(|m| lower.contains(&m.needle)) {
                    return Some((marker.text.clone(), record.address()));
                }
            }
        }
        None
    }

    fn hierarchy_evidence(
        &self,
        site: &BytecodeCallSite,
        direct: &[&InstructionRecord],
        first: Option<&InstructionRecord>,
    ) -> Option<(String, u64)> {
        let hierarchy = self.hierarchy.as_ref()?;
        let proof = hierarchy.prove_monomorphic(&site.target)?;
        let address = direct.first().copied().or(first)?.address();
        Some((proof, address))
    }
}

// Comment lines that carry compiler annotations. Bytecode lines (`;*invoke...`)
// and scope lines name classes and methods, so they never count as evidence.
fn annotation_lines(record: &InstructionRecord) -> impl Iterator<Item = &str> + '_ {
    record.comment_lines().iter().map(String::as_str).filter(|line| {
        let body = line.trim_start_matches(';').trim_start();
        !body.starts_with('*') && parse_scope_line(line).is_none()
    })
}

fn has_dispatch(window: &[&InstructionRecord]) -> bool {
    window.iter().any(|record| {
        annotation_lines(record).any(|line| {
            let lower = line.to_lowercase();
            DISPATCH_MARKERS.iter().any(|m| lower.contains(m))
        })
    })
}

/// Findings for `method` using the built-in evidence markers only.
pub fn find_optimized_calls(method: &CompiledMethod) -> Vec<OptimizedVirtualCall> {
    OptimizedCallFinder::new().find(method)
}
