use std::path::Path;

pub mod analyzers;
pub mod consts;
pub mod error;
pub mod models;
pub mod parsing;
pub mod traits;
pub mod traversal;
pub mod utils;

pub use analyzers::{find_optimized_calls, OptimizedCallFinder, OptimizedVCallReportBuilder};
pub use error::JitLensError;
pub use models::{
    render_listing, AnalysisConfig, AnalysisResult, AnalysisStats, CompiledMethod, InstructionRecord,
    OptimizedVirtualCall, ProgramModel, Report,
};
pub use parsing::AssemblyParser;
pub use traits::{ReadOnlyJitModel, TreeVisitor};
pub use traversal::walk_tree;
pub use utils::writer::{write_results as compile_results, FileWriter};

/// Runs the optimized-call analysis over an already loaded model
pub fn analyze_model(model: &ProgramModel, config: Option<AnalysisConfig>) -> Result<AnalysisResult, JitLensError> {
    let config = config.unwrap_or_default();

    let mut finder = OptimizedCallFinder::from_config(&config);
    if config.use_type_hierarchy {
        finder = finder.with_hierarchy(model.type_hierarchy());
    }
    let hierarchy_used = finder.has_hierarchy();

    let mut builder = OptimizedVCallReportBuilder::new(finder);
    let report = builder.build(model)?;

    Ok(AnalysisResult {
        report,
        stats: builder.stats().clone(),
        hierarchy_used,
    })
}

/// Loads a JSON model snapshot and analyzes it
pub fn analyze_snapshot(json: &str, config: Option<AnalysisConfig>) -> Result<AnalysisResult, JitLensError> {
    let model = ProgramModel::from_json(json)?;
    analyze_model(&model, config)
}

/// Loads a model snapshot from a `.json` file and analyzes it
pub fn analyze_file(file_path: &Path, config: Option<AnalysisConfig>) -> Result<AnalysisResult, JitLensError> {
    let model = load_model(file_path)?;
    analyze_model(&model, config)
}

pub fn load_model(file_path: &Path) -> Result<ProgramModel, JitLensError> {
    let is_snapshot = file_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(consts::SNAPSHOT_EXTENSION));
    if !is_snapshot {
        return Err(JitLensError::InvalidFileExtension);
    }

    let json = std::fs::read_to_string(file_path)?;
    ProgramModel::from_json(&json)
}

/// Writes analysis results to files
pub fn write_results(result: &AnalysisResult, base_path: &Path) -> Result<(), JitLensError> {
    compile_results(result, base_path)
}
