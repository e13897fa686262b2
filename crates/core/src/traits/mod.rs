pub mod model;
pub mod visitor;

pub use model::*;
pub use visitor::*;
