use serde::Serialize;

use super::Report;

#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    /// Evidence markers to look for on top of the built-in ones
    pub extra_markers: Vec<String>,
    /// Confirm calls through the type hierarchy when no marker is found
    pub use_type_hierarchy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    /// Compiled methods handed to the detector
    pub methods_visited: usize,
    /// All bytecode call sites of those methods
    pub call_sites_examined: usize,
    /// Virtual and interface call sites among them
    pub dispatched_call_sites: usize,
    /// Findings in the report
    pub optimized_calls: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub report: Report,
    pub stats: AnalysisStats,
    /// Whether hierarchy confirmation was enabled for the run
    pub hierarchy_used: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_markers_only() {
        let config = AnalysisConfig::default();
        assert!(config.extra_markers.is_empty());
        assert!(!config.use_type_hierarchy);
    }
}
