use log::info;

use super::OptimizedCallFinder;
use crate::error::JitLensError;
use crate::models::{AnalysisStats, CompiledMethod, OptimizedVirtualCall, Report};
use crate::traits::{ReadOnlyJitModel, TreeVisitor};
use crate::traversal::walk_tree;

/// Walks a model and collects every optimized virtual call into a [`Report`].
///
/// `build` takes `&mut self`, so one builder serves one run at a time; use
/// separate builders to analyze several snapshots concurrently.
#[derive(Debug, Clone, Default)]
pub struct OptimizedVCallReportBuilder {
    finder: OptimizedCallFinder,
    found: Vec<OptimizedVirtualCall>,
    stats: AnalysisStats,
}

impl OptimizedVCallReportBuilder {
    pub fn new(finder: OptimizedCallFinder) -> Self {
        Self {
            finder,
            found: Vec::new(),
            stats: AnalysisStats::default(),
        }
    }

    /// Runs a full walk of `model` and returns the sorted findings.
    ///
    /// On error nothing is returned; findings from an earlier run survive a
    /// structural error because the walk aborts before resetting.
    pub fn build<M>(&mut self, model: &M) -> Result<Report, JitLensError>
    where
        M: ReadOnlyJitModel + ?Sized,
    {
        walk_tree(model, self)?;

        let report = Report::from_unsorted(self.found.clone());
        self.stats.optimized_calls = report.len();

        info!(
            "Found {} optimized calls in {} compiled methods",
            report.len(),
            self.stats.methods_visited
        );
        Ok(report)
    }

    /// Findings accumulated since the last reset, in visit order.
    pub fn accumulated(&self) -> &[OptimizedVirtualCall] {
        &self.found
    }

    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    pub fn finder(&self) -> &OptimizedCallFinder {
        &self.finder
    }
}

impl TreeVisitor for OptimizedVCallReportBuilder {
    fn reset(&mut self) {
        self.found.clear();
        self.stats = AnalysisStats::default();
    }

    fn visit(&mut self, method: &CompiledMethod) -> Result<(), JitLensError> {
        self.stats.methods_visited += 1;
        self.stats.call_sites_examined += method.call_sites.len();
        self.stats.dispatched_call_sites += method.call_sites.iter().filter(|s| s.kind.is_dispatched()).count();

        self.found.extend(self.finder.find(method));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgramModel;

    fn model(optimized_marker: &str) -> ProgramModel {
        let json = format!(
            r#"{{
            "packages": [
                {{ "name": "org", "children": ["org.example"] }},
                {{ "name": "org.example", "parent": "org", "classes": [
                    {{ "name": "org.example.Zoo", "package": "org.example", "methods": [
                        {{ "class_name": "org.example.Zoo", "name": "feed", "descriptor": "()V",
                          "call_sites": [
                            {{ "offset": 5, "kind": "virtual", "target": {{ "class_name": "org.example.Animal", "name": "eat" }} }},
                            {{ "offset": 2, "kind": "static", "target": {{ "class_name": "org.example.Zoo", "name": "open" }} }}
                          ],
                          "instructions": [
                            {{ "address": 16, "mnemonic": "call", "operands": ["0x80"],
                               "comments": ["; - org.example.Zoo::open@2 (line 3)", "; {{optimized virtual_call}}"] }},
                            {{ "annotation": "@5", "address": 32, "mnemonic": "call", "operands": ["0x90"],
                               "comments": ["; {}"] }}
                          ] }}
                    ] }},
                    {{ "name": "org.example.Aviary", "package": "org.example", "methods": [
                        {{ "class_name": "org.example.Aviary", "name": "fly", "descriptor": "(I)V",
                          "call_sites": [
                            {{ "offset": 9, "kind": "interface", "target": {{ "class_name": "org.example.Bird", "name": "flap" }} }},
                            {{ "offset": 1, "kind": "virtual", "target": {{ "class_name": "org.example.Bird", "name": "land" }} }}
                          ],
                          "instructions": [
                            {{ "annotation": "@9", "address": 48, "mnemonic": "call", "comments": ["; direct call"] }},
                            {{ "annotation": "@1", "address": 64, "mnemonic": "call", "comments": ["; monomorphic"] }}
                          ] }}
                    ] }}
                ] }}
            ]
        }}"#,
            optimized_marker
        );
        ProgramModel::from_json(&json).unwrap()
    }

    fn keys(report: &Report) -> Vec<(String, u32)> {
        report
            .iter()
            .map(|c| (c.calling_member().fully_qualified_name(), c.bytecode_offset()))
            .collect()
    }

    #[test]
    fn test_build_report() {
        let mut builder = OptimizedVCallReportBuilder::default();
        let report = builder.build(&model("inlined, no dispatch")).unwrap();

        assert_eq!(
            keys(&report),
            vec![
                ("org.example.Aviary.fly(I)V".to_string(), 1),
                ("org.example.Aviary.fly(I)V".to_string(), 9),
                ("org.example.Zoo.feed()V".to_string(), 5),
            ]
        );
        assert_eq!(report.calls()[2].resolution_evidence(), "inlined, no dispatch");

        let stats = builder.stats();
        assert_eq!(stats.methods_visited, 2);
        assert_eq!(stats.call_sites_examined, 4);
        assert_eq!(stats.dispatched_call_sites, 3);
        assert_eq!(stats.optimized_calls, 3);
        assert_eq!(builder.accumulated().len(), 3);
    }

    #[test]
    fn test_build_is_stable() {
        let model = model("inlined, no dispatch");
        let mut builder = OptimizedVCallReportBuilder::default();
        let first = builder.build(&model).unwrap();
        let second = builder.build(&model).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(builder.accumulated().len(), 3);
    }

    #[test]
    fn test_rerun_against_changed_model() {
        let mut builder = OptimizedVCallReportBuilder::default();
        let before = builder.build(&model("inlined, no dispatch")).unwrap();
        let after = builder.build(&model("{virtual_call}")).unwrap();

        assert_eq!(before.len(), 3);
        assert_eq!(after.len(), 2);
        assert!(after.iter().all(|c| c.calling_member().class_name == "org.example.Aviary"));
    }

    #[test]
    fn test_uniqueness() {
        let mut builder = OptimizedVCallReportBuilder::default();
        let report = builder.build(&model("inlined, no dispatch")).unwrap();
        let mut pairs = keys(&report);
        let total = pairs.len();
        pairs.dedup();
        assert_eq!(pairs.len(), total);
    }

    #[test]
    fn test_recompiled_method_rejected() {
        let method = r#"{ "class_name": "p.A", "name": "f", "descriptor": "()V",
            "call_sites": [ { "offset": 5, "kind": "virtual", "target": { "class_name": "p.B", "name": "g" } } ],
            "instructions": [ { "annotation": "@5", "address": 16, "mnemonic": "call",
                                "comments": ["; {optimized virtual_call}"] } ] }"#;
        let json = format!(
            r#"{{ "packages": [ {{ "name": "p", "classes": [
                {{ "name": "p.A", "package": "p", "methods": [ {0}, {0} ] }} ] }} ] }}"#,
            method
        );
        let model = ProgramModel::from_json(&json).unwrap();

        let mut builder = OptimizedVCallReportBuilder::default();
        match builder.build(&model) {
            Err(JitLensError::DuplicateMethod { method, .. }) => assert_eq!(method, "p.A.f()V"),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(builder.accumulated().is_empty());
    }

    #[test]
    fn test_failed_build_keeps_previous_findings() {
        let mut builder = OptimizedVCallReportBuilder::default();
        builder.build(&model("inlined, no dispatch")).unwrap();

        let broken = ProgramModel::from_json(r#"{ "packages": [ { "name": "org", "children": ["org.gone"] } ] }"#).unwrap();
        assert!(builder.build(&broken).is_err());
        assert_eq!(builder.accumulated().len(), 3);

        builder.reset();
        assert!(builder.accumulated().is_empty());
    }
}
