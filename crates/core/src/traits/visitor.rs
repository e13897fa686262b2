use crate::error::JitLensError;
use crate::models::CompiledMethod;

pub trait TreeVisitor {
    /// Called once before a walk starts, to drop state from the previous run
    fn reset(&mut self);
    /// Called once per compiled method
    fn visit(&mut self, method: &CompiledMethod) -> Result<(), JitLensError>;
}
