use std::collections::HashSet;

use log::{debug, trace};

use crate::error::JitLensError;
use crate::models::{ClassNode, CompiledMethod, PackageNode};
use crate::traits::{ReadOnlyJitModel, TreeVisitor};

/// Walks every compiled method of `model` depth-first and hands it to `visitor`.
///
/// Order is stable for an unchanged model: root packages by name, and within
/// a package its child packages first, then its classes, then each class's
/// methods, all ascending by name. The model's structure is checked before
/// `visitor.reset()` is called, so a broken model leaves the visitor's
/// previous state untouched.
pub fn walk_tree<M, V>(model: &M, visitor: &mut V) -> Result<(), JitLensError>
where
    M: ReadOnlyJitModel + ?Sized,
    V: TreeVisitor + ?Sized,
{
    check_structure(model)?;

    visitor.reset();

    for root in sorted_packages(model.root_packages()) {
        walk_package(model, root, visitor)?;
    }

    Ok(())
}

fn walk_package<M, V>(model: &M, package: &PackageNode, visitor: &mut V) -> Result<(), JitLensError>
where
    M: ReadOnlyJitModel + ?Sized,
    V: TreeVisitor + ?Sized,
{
    trace!("Walking package {}", package.name);

    let children = child_names(package)
        .into_iter()
        .filter_map(|name| model.package(name))
        .collect();

    for child in sorted_packages(children) {
        walk_package(model, child, visitor)?;
    }

    let mut classes: Vec<&ClassNode> = package.classes.iter().collect();
    classes.sort_by(|a, b| a.name().cmp(b.name()));

    for class in classes {
        let mut methods: Vec<&CompiledMethod> = class.methods.iter().filter(|m| m.is_compiled()).collect();
        methods.sort_by_cached_key(|m| m.fully_qualified_name());

        for method in methods {
            visitor.visit(method)?;
        }
    }

    Ok(())
}

fn sorted_packages(mut packages: Vec<&PackageNode>) -> Vec<&PackageNode> {
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    packages
}

// a child listed twice is walked once
fn child_names(package: &PackageNode) -> Vec<&str> {
    let mut names: Vec<&str> = package.children.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Verifies the package tree is well formed: every listed child exists and
/// names its lister as parent, classes and methods sit under the package and
/// class they declare, no class or method appears twice in its container,
/// and every package is reachable from a root.
pub fn check_structure<M>(model: &M) -> Result<(), JitLensError>
where
    M: ReadOnlyJitModel + ?Sized,
{
    let mut reached: HashSet<&str> = HashSet::new();
    let mut path: Vec<&str> = Vec::new();

    for root in sorted_packages(model.root_packages()) {
        check_package(model, root, &mut path, &mut reached)?;
    }

    for package in sorted_packages(model.packages()) {
        if !reached.contains(package.name.as_str()) {
            return Err(explain_unreachable(model, package));
        }
    }

    debug!("Model structure ok, {} packages", reached.len());
    Ok(())
}

fn check_package<'m, M>(
    model: &'m M,
    package: &'m PackageNode,
    path: &mut Vec<&'m str>,
    reached: &mut HashSet<&'m str>,
) -> Result<(), JitLensError>
where
    M: ReadOnlyJitModel + ?Sized,
{
    let name = package.name.as_str();

    if path.contains(&name) {
        return Err(JitLensError::CyclicPackage(package.name.clone()));
    }
    if !reached.insert(name) {
        return Ok(());
    }

    let mut class_names: HashSet<&str> = HashSet::new();
    for class in &package.classes {
        if !class_names.insert(class.name()) {
            return Err(JitLensError::DuplicateClass {
                class: class.name().to_string(),
                package: package.name.clone(),
            });
        }
        if class.package != package.name {
            return Err(JitLensError::OrphanClass {
                class: class.name().to_string(),
                container: package.name.clone(),
                declared: class.package.clone(),
            });
        }
        let mut method_names: HashSet<String> = HashSet::new();
        for method in &class.methods {
            if !method_names.insert(method.fully_qualified_name()) {
                return Err(JitLensError::DuplicateMethod {
                    method: method.fully_qualified_name(),
                    class: class.name().to_string(),
                });
            }
            if method.member.class_name != class.name() {
                return Err(JitLensError::OrphanMethod {
                    method: method.fully_qualified_name(),
                    container: class.name().to_string(),
                    declared: method.member.class_name.clone(),
                });
            }
        }
    }

    path.push(name);
    for child_name in child_names(package) {
        let child = model.package(child_name).ok_or_else(|| JitLensError::MissingPackage {
            parent: package.name.clone(),
            child: child_name.to_string(),
        })?;

        if child.parent.as_deref() != Some(name) {
            return Err(JitLensError::ParentMismatch {
                package: child.name.clone(),
                listed_under: package.name.clone(),
                declared: child.parent.clone(),
            });
        }

        check_package(model, child, path, reached)?;
    }
    path.pop();

    Ok(())
}

// Follows the parent chain of a package no root reaches.
fn explain_unreachable<M>(model: &M, package: &PackageNode) -> JitLensError
where
    M: ReadOnlyJitModel + ?Sized,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = package;

    while let Some(parent_name) = current.parent.as_deref() {
        if !seen.insert(current.name.as_str()) {
            return JitLensError::CyclicPackage(current.name.clone());
        }
        match model.package(parent_name) {
            Some(parent) => current = parent,
            None => {
                return JitLensError::MissingParent {
                    package: current.name.clone(),
                    parent: parent_name.to_string(),
                }
            }
        }
    }

    JitLensError::UnreachablePackage(package.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstructionRecord, MemberRef, ProgramModel, TypeInfo};

    #[derive(Default)]
    struct Recorder {
        resets: usize,
        visited: Vec<String>,
    }

    impl TreeVisitor for Recorder {
        fn reset(&mut self) {
            self.resets += 1;
            self.visited.clear();
        }

        fn visit(&mut self, method: &CompiledMethod) -> Result<(), JitLensError> {
            self.visited.push(method.fully_qualified_name());
            Ok(())
        }
    }

    fn method(class: &str, name: &str, compiled: bool) -> CompiledMethod {
        let instructions = if compiled {
            vec![InstructionRecord::new(None, 0x10, None, "ret", vec![], None)]
        } else {
            vec![]
        };
        CompiledMethod::new(MemberRef::new(class, name, "()V"), vec![], instructions)
    }

    fn class(package: &str, name: &str, methods: Vec<CompiledMethod>) -> ClassNode {
        ClassNode {
            info: TypeInfo::class(name, None),
            package: package.to_string(),
            methods,
        }
    }

    fn package(name: &str, parent: Option<&str>, children: &[&str], classes: Vec<ClassNode>) -> PackageNode {
        PackageNode {
            name: name.to_string(),
            parent: parent.map(String::from),
            children: children.iter().map(|c| c.to_string()).collect(),
            classes,
        }
    }

    fn sample_model() -> ProgramModel {
        let mut model = ProgramModel::new();
        model
            .insert_package(package("org", None, &["org.zeta", "org.alpha"], vec![
                class("org", "org.Main", vec![method("org.Main", "main", true)]),
            ]))
            .unwrap();
        model
            .insert_package(package("org.zeta", Some("org"), &[], vec![
                class("org.zeta", "org.zeta.B", vec![method("org.zeta.B", "run", true)]),
                class("org.zeta", "org.zeta.A", vec![
                    method("org.zeta.A", "cold", false),
                    method("org.zeta.A", "b", true),
                    method("org.zeta.A", "a", true),
                ]),
            ]))
            .unwrap();
        model
            .insert_package(package("org.alpha", Some("org"), &[], vec![
                class("org.alpha", "org.alpha.C", vec![method("org.alpha.C", "go", true)]),
            ]))
            .unwrap();
        model
            .insert_package(package("com", None, &[], vec![
                class("com", "com.X", vec![method("com.X", "x", true)]),
            ]))
            .unwrap();
        model
    }

    #[test]
    fn test_walk_order() {
        let model = sample_model();
        let mut recorder = Recorder::default();
        walk_tree(&model, &mut recorder).unwrap();

        assert_eq!(recorder.resets, 1);
        assert_eq!(
            recorder.visited,
            vec![
                "com.X.x()V",
                "org.alpha.C.go()V",
                "org.zeta.A.a()V",
                "org.zeta.A.b()V",
                "org.zeta.B.run()V",
                "org.Main.main()V",
            ]
        );
    }

    #[test]
    fn test_walk_is_repeatable() {
        let model = sample_model();
        let mut recorder = Recorder::default();
        walk_tree(&model, &mut recorder).unwrap();
        let first = recorder.visited.clone();
        walk_tree(&model, &mut recorder).unwrap();

        assert_eq!(recorder.resets, 2);
        assert_eq!(recorder.visited, first);
    }

    #[test]
    fn test_missing_child() {
        let mut model = ProgramModel::new();
        model.insert_package(package("org", None, &["org.gone"], vec![])).unwrap();

        let mut recorder = Recorder::default();
        let err = walk_tree(&model, &mut recorder).unwrap_err();
        assert!(matches!(err, JitLensError::MissingPackage { ref child, .. } if child == "org.gone"));
        assert_eq!(recorder.resets, 0);
    }

    #[test]
    fn test_cycle() {
        let mut model = ProgramModel::new();
        model.insert_package(package("org", None, &[], vec![])).unwrap();
        model.insert_package(package("a", Some("b"), &["b"], vec![])).unwrap();
        model.insert_package(package("b", Some("a"), &["a"], vec![])).unwrap();

        let err = check_structure(&model).unwrap_err();
        assert!(matches!(err, JitLensError::CyclicPackage(_)));
    }

    #[test]
    fn test_missing_parent() {
        let mut model = ProgramModel::new();
        model.insert_package(package("org.lost", Some("org"), &[], vec![])).unwrap();

        match check_structure(&model) {
            Err(JitLensError::MissingParent { package, parent }) => {
                assert_eq!(package, "org.lost");
                assert_eq!(parent, "org");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_parent_mismatch_and_orphans() {
        let mut model = ProgramModel::new();
        model.insert_package(package("org", None, &["net"], vec![])).unwrap();
        model.insert_package(package("net", None, &[], vec![])).unwrap();
        assert!(matches!(check_structure(&model), Err(JitLensError::ParentMismatch { .. })));

        let mut model = ProgramModel::new();
        model
            .insert_package(package("org", None, &[], vec![class("net", "net.A", vec![])]))
            .unwrap();
        assert!(matches!(check_structure(&model), Err(JitLensError::OrphanClass { .. })));

        let mut model = ProgramModel::new();
        model
            .insert_package(package("org", None, &[], vec![class("org", "org.A", vec![method("org.B", "f", true)])]))
            .unwrap();
        assert!(matches!(check_structure(&model), Err(JitLensError::OrphanMethod { .. })));
    }

    #[test]
    fn test_duplicate_class_and_method() {
        let mut model = ProgramModel::new();
        model
            .insert_package(package("p", None, &[], vec![
                class("p", "p.A", vec![method("p.A", "f", true), method("p.A", "f", true)]),
            ]))
            .unwrap();

        let mut recorder = Recorder::default();
        match walk_tree(&model, &mut recorder) {
            Err(JitLensError::DuplicateMethod { method, class }) => {
                assert_eq!(method, "p.A.f()V");
                assert_eq!(class, "p.A");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(recorder.resets, 0);

        let mut model = ProgramModel::new();
        model
            .insert_package(package("p", None, &[], vec![class("p", "p.A", vec![]), class("p", "p.A", vec![])]))
            .unwrap();
        assert!(matches!(
            check_structure(&model),
            Err(JitLensError::DuplicateClass { ref class, .. }) if class == "p.A"
        ));
    }

    #[test]
    fn test_visitor_error_propagates() {
        struct Failing;
        impl TreeVisitor for Failing {
            fn reset(&mut self) {}
            fn visit(&mut self, method: &CompiledMethod) -> Result<(), JitLensError> {
                Err(JitLensError::VisitorError {
                    member: method.fully_qualified_name(),
                    reason: "boom".into(),
                })
            }
        }

        let err = walk_tree(&sample_model(), &mut Failing).unwrap_err();
        assert!(matches!(err, JitLensError::VisitorError { ref member, .. } if member == "com.X.x()V"));
    }
}
