use crate::models::PackageNode;

/// Read access to a populated program model. Implementations hand out
/// packages in any order; the traversal imposes its own.
pub trait ReadOnlyJitModel {
    fn package(&self, name: &str) -> Option<&PackageNode>;
    fn packages(&self) -> Vec<&PackageNode>;
    /// Packages without a parent
    fn root_packages(&self) -> Vec<&PackageNode>;
}
