pub mod report;
pub mod vcall;

pub use report::OptimizedVCallReportBuilder;
pub use vcall::{find_optimized_calls, OptimizedCallFinder};
