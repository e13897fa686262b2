pub mod format;
pub mod writer;

pub use format::*;
pub use writer::*;
