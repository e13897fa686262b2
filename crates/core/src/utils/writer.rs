use std::fs;
use std::path::Path;

use log::info;

use crate::consts::{REPORT_JSON_FILE, REPORT_TEXT_FILE};
use crate::error::JitLensError;
use crate::models::AnalysisResult;

pub struct FileWriter;

impl Default for FileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_results(&self, result: &AnalysisResult, base_path: &Path) -> Result<(), JitLensError> {
        fs::create_dir_all(base_path)?;

        let json = serde_json::to_string_pretty(result)
            .map_err(|e| JitLensError::SerializationError(e.to_string()))?;
        fs::write(base_path.join(REPORT_JSON_FILE), json)?;

        fs::write(base_path.join(REPORT_TEXT_FILE), self.text_report(result))?;

        info!("Wrote results to {}", base_path.display());
        Ok(())
    }

    fn text_report(&self, result: &AnalysisResult) -> String {
        let stats = &result.stats;
        let mut text = result.report.to_string();
        if !text.is_empty() {
            text.push('\n');
        }

        text.push_str(&format!("methods visited: {}\n", stats.methods_visited));
        text.push_str(&format!("call sites examined: {}\n", stats.call_sites_examined));
        text.push_str(&format!("virtual/interface call sites: {}\n", stats.dispatched_call_sites));
        text.push_str(&format!("optimized calls: {}\n", stats.optimized_calls));
        text.push_str(&format!(
            "hierarchy confirmation: {}\n",
            if result.hierarchy_used { "on" } else { "off" }
        ));
        text
    }
}

pub fn write_results(result: &AnalysisResult, base_path: &Path) -> Result<(), JitLensError> {
    let writer = FileWriter::new();
    writer.write_results(result, base_path)
}
