pub mod assembly;
pub mod base;
pub mod hierarchy;
pub mod member;
pub mod program;
pub mod report;

pub use assembly::*;
pub use base::*;
pub use hierarchy::*;
pub use member::*;
pub use program::*;
pub use report::*;
