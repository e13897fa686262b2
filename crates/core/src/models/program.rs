use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{BytecodeCallSite, CompiledMethod, InstructionRecord, MemberRef, TypeHierarchy, TypeInfo};
use crate::error::JitLensError;
use crate::parsing::AssemblyParser;
use crate::traits::ReadOnlyJitModel;

/// Serialized form of a populated program model, as handed over by a log parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub packages: Vec<PackageSnapshot>,
    /// Types known to the runtime that were never compiled
    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSnapshot {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSnapshot {
    #[serde(flatten)]
    pub info: TypeInfo,
    pub package: String,
    #[serde(default)]
    pub methods: Vec<MethodSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSnapshot {
    pub class_name: String,
    pub name: String,
    #[serde(default)]
    pub descriptor: String,
    #[serde(default)]
    pub call_sites: Vec<BytecodeCallSite>,
    #[serde(default)]
    pub instructions: Vec<InstructionSnapshot>,
    /// Raw `PrintAssembly` text, parsed after any structured instructions
    #[serde(default)]
    pub assembly: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionSnapshot {
    #[serde(default)]
    pub annotation: Option<String>,
    pub address: u64,
    #[serde(default)]
    pub modifier: Option<String>,
    pub mnemonic: String,
    #[serde(default)]
    pub operands: Vec<String>,
    #[serde(default)]
    pub comments: Vec<String>,
}

impl InstructionSnapshot {
    fn into_record(self) -> Result<InstructionRecord, JitLensError> {
        if self.mnemonic.trim().is_empty() {
            return Err(JitLensError::EmptyMnemonic(self.address));
        }

        let mut comments = self.comments.into_iter();
        let first = comments.next();
        let mut record = InstructionRecord::new(
            self.annotation,
            self.address,
            self.modifier,
            self.mnemonic,
            self.operands,
            first.as_deref(),
        );
        for line in comments {
            record.add_comment_line(Some(&line));
        }
        Ok(record)
    }
}

impl MethodSnapshot {
    fn into_method(self, parser: &AssemblyParser) -> Result<CompiledMethod, JitLensError> {
        let member = MemberRef::new(self.class_name, self.name, self.descriptor);

        let mut instructions = self
            .instructions
            .into_iter()
            .map(InstructionSnapshot::into_record)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(text) = &self.assembly {
            instructions.extend(parser.parse(text)?);
        }

        Ok(CompiledMethod::new(member, self.call_sites, instructions))
    }
}

#[derive(Debug, Clone)]
pub struct ClassNode {
    pub info: TypeInfo,
    /// Package this class declares itself a member of
    pub package: String,
    pub methods: Vec<CompiledMethod>,
}

impl ClassNode {
    pub fn name(&self) -> &str {
        &self.info.name
    }
}

#[derive(Debug, Clone)]
pub struct PackageNode {
    pub name: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub classes: Vec<ClassNode>,
}

/// Read-only program model: packages keyed by name, each holding classes
/// and their compiled methods. Package links are by name, so a snapshot
/// can describe a broken tree; [`walk_tree`](crate::traversal::walk_tree)
/// rejects those.
#[derive(Debug, Clone, Default)]
pub struct ProgramModel {
    packages: BTreeMap<String, PackageNode>,
    extra_types: Vec<TypeInfo>,
}

impl ProgramModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, JitLensError> {
        let snapshot: ModelSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: ModelSnapshot) -> Result<Self, JitLensError> {
        let parser = AssemblyParser::new();
        let mut model = Self::new();

        for package in snapshot.packages {
            let classes = package
                .classes
                .into_iter()
                .map(|class| {
                    let methods = class
                        .methods
                        .into_iter()
                        .map(|m| m.into_method(&parser))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(ClassNode {
                        info: class.info,
                        package: class.package,
                        methods,
                    })
                })
                .collect::<Result<Vec<_>, JitLensError>>()?;

            model.insert_package(PackageNode {
                name: package.name,
                parent: package.parent,
                children: package.children,
                classes,
            })?;
        }

        model.extra_types = snapshot.types;

        info!(
            "Loaded model with {} packages, {} classes, {} methods",
            model.packages.len(),
            model.class_count(),
            model.method_count()
        );
        Ok(model)
    }

    pub fn insert_package(&mut self, package: PackageNode) -> Result<(), JitLensError> {
        if self.packages.contains_key(&package.name) {
            return Err(JitLensError::DuplicatePackage(package.name));
        }
        debug!("Adding package {}", package.name);
        self.packages.insert(package.name.clone(), package);
        Ok(())
    }

    pub fn add_type(&mut self, info: TypeInfo) {
        self.extra_types.push(info);
    }

    pub fn class_count(&self) -> usize {
        self.packages.values().map(|p| p.classes.len()).sum()
    }

    pub fn method_count(&self) -> usize {
        self.methods().count()
    }

    pub fn methods(&self) -> impl Iterator<Item = &CompiledMethod> {
        self.packages
            .values()
            .flat_map(|p| p.classes.iter())
            .flat_map(|c| c.methods.iter())
    }

    /// Methods whose fully-qualified name contains `filter`, in name order.
    pub fn find_methods(&self, filter: &str) -> Vec<&CompiledMethod> {
        let mut found: Vec<&CompiledMethod> = self
            .methods()
            .filter(|m| m.fully_qualified_name().contains(filter))
            .collect();
        found.sort_by_cached_key(|m| m.fully_qualified_name());
        found
    }

    /// Hierarchy over every class in the model plus the extra snapshot types.
    pub fn type_hierarchy(&self) -> TypeHierarchy {
        let classes = self
            .packages
            .values()
            .flat_map(|p| p.classes.iter())
            .map(|c| &c.info);
        TypeHierarchy::from_types(classes.chain(self.extra_types.iter()))
    }
}

impl ReadOnlyJitModel for ProgramModel {
    fn package(&self, name: &str) -> Option<&PackageNode> {
        self.packages.get(name)
    }

    fn packages(&self) -> Vec<&PackageNode> {
        self.packages.values().collect()
    }

    fn root_packages(&self) -> Vec<&PackageNode> {
        self.packages.values().filter(|p| p.parent.is_none()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "packages": [
            { "name": "org", "children": ["org.example"] },
            { "name": "org.example", "parent": "org", "classes": [
                { "name": "org.example.Canvas", "package": "org.example", "superclass": "java.lang.Object",
                  "methods": [
                    { "class_name": "org.example.Canvas", "name": "paint", "descriptor": "()V",
                      "call_sites": [ { "offset": 5, "kind": "invokevirtual",
                                        "target": { "class_name": "org.example.Shape", "name": "area", "descriptor": "()D" } } ],
                      "instructions": [ { "annotation": "@5", "address": 16, "mnemonic": "call",
                                          "operands": ["0x40"], "comments": ["  ;*invokevirtual area ", "; {optimized virtual_call}"] } ],
                      "assembly": "  0x0000000000000018: ret\n" }
                  ] }
            ] }
        ],
        "types": [ { "name": "org.example.Shape", "superclass": "java.lang.Object" } ]
    }"#;

    #[test]
    fn test_from_json() {
        let model = ProgramModel::from_json(SNAPSHOT).unwrap();

        assert_eq!(model.packages().len(), 2);
        assert_eq!(model.root_packages().len(), 1);
        assert_eq!(model.class_count(), 1);

        let methods = model.find_methods("paint");
        assert_eq!(methods.len(), 1);
        let paint = methods[0];
        assert_eq!(paint.fully_qualified_name(), "org.example.Canvas.paint()V");
        assert_eq!(paint.instructions.len(), 2);
        assert_eq!(paint.instructions[0].comment_lines()[0], ";*invokevirtual area");
        assert_eq!(paint.instructions[1].mnemonic(), "ret");
        assert!(paint.is_compiled());

        let hierarchy = model.type_hierarchy();
        assert_eq!(hierarchy.len(), 2);
        assert_eq!(hierarchy.direct_subclasses("java.lang.Object").len(), 2);
    }

    #[test]
    fn test_duplicate_package() {
        let json = r#"{ "packages": [ { "name": "org" }, { "name": "org" } ] }"#;
        match ProgramModel::from_json(json) {
            Err(JitLensError::DuplicatePackage(name)) => assert_eq!(name, "org"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_empty_mnemonic() {
        let json = r#"{ "packages": [ { "name": "p", "classes": [ { "name": "p.A", "package": "p", "methods": [
            { "class_name": "p.A", "name": "f", "instructions": [ { "address": 1, "mnemonic": " " } ] } ] } ] } ] }"#;
        assert!(matches!(ProgramModel::from_json(json), Err(JitLensError::EmptyMnemonic(1))));
    }
}
