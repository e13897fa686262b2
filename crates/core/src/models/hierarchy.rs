use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::MemberRef;

/// Declared shape of one class or interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_interface: bool,
    /// Names of methods declared `final` in this type
    #[serde(default)]
    pub final_methods: Vec<String>,
}

impl TypeInfo {
    pub fn class(name: impl Into<String>, superclass: Option<&str>) -> Self {
        Self {
            name: name.into(),
            superclass: superclass.map(String::from),
            interfaces: Vec::new(),
            is_final: false,
            is_interface: false,
            final_methods: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            is_interface: true,
            ..Self::class(name, None)
        }
    }
}

/// Index of the types a snapshot knows about, used to confirm that a
/// dispatched call can only reach one implementation.
///
/// This is a closed-world view: a type that was never loaded is invisible,
/// so confirmations only hold for the classes present in the snapshot.
#[derive(Debug, Default, Clone)]
pub struct TypeHierarchy {
    types: HashMap<String, TypeInfo>,
    subclasses: HashMap<String, Vec<String>>,
    implementors: HashMap<String, Vec<String>>,
    subinterfaces: HashMap<String, Vec<String>>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_types<'a>(types: impl IntoIterator<Item = &'a TypeInfo>) -> Self {
        let mut hierarchy = Self::new();
        for info in types {
            hierarchy.add_type(info.clone());
        }
        hierarchy
    }

    /// Registers a type. The first registration of a name wins.
    pub fn add_type(&mut self, info: TypeInfo) {
        if self.types.contains_key(&info.name) {
            debug!("Type {} already registered, ignoring duplicate", info.name);
            return;
        }

        if info.is_interface {
            for parent in &info.interfaces {
                self.subinterfaces.entry(parent.clone()).or_default().push(info.name.clone());
            }
        } else {
            if let Some(parent) = &info.superclass {
                self.subclasses.entry(parent.clone()).or_default().push(info.name.clone());
            }
            for iface in &info.interfaces {
                self.implementors.entry(iface.clone()).or_default().push(info.name.clone());
            }
        }

        self.types.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn direct_subclasses(&self, name: &str) -> &[String] {
        self.subclasses.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn direct_implementors(&self, name: &str) -> &[String] {
        self.implementors.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Explains why a call to `target` can only reach one implementation,
    /// or `None` when the hierarchy cannot show that.
    pub fn prove_monomorphic(&self, target: &MemberRef) -> Option<String> {
        let info = self.get(&target.class_name)?;

        if info.is_interface {
            if self.subinterfaces.get(&info.name).is_some_and(|s| !s.is_empty()) {
                return None;
            }
            return match self.direct_implementors(&info.name) {
                [only] if self.direct_subclasses(only).is_empty() => {
                    Some(format!("single implementor {}", only))
                }
                _ => None,
            };
        }

        if info.is_final {
            return Some(format!("receiver class {} is final", info.name));
        }

        if info.final_methods.iter().any(|m| *m == target.name) {
            return Some(format!("method {} is final", target.fully_qualified_name()));
        }

        if self.direct_subclasses(&info.name).is_empty() {
            return Some(format!("no loaded subclasses of {}", info.name));
        }

        None
    }
}
