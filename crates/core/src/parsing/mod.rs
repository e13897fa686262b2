pub mod assembly;
pub mod crossref;

pub use assembly::*;
pub use crossref::*;
