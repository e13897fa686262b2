use std::fmt;

use serde::{Deserialize, Serialize};

use super::InstructionRecord;

/// How a bytecode call site selects its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    #[serde(alias = "invokevirtual")]
    Virtual,
    #[serde(alias = "invokeinterface")]
    Interface,
    #[serde(alias = "invokestatic")]
    Static,
    #[serde(alias = "invokespecial")]
    Special,
}

impl CallKind {
    /// Virtual and interface calls dispatch on the receiver type at runtime.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, CallKind::Virtual | CallKind::Interface)
    }

    pub fn opcode(&self) -> &'static str {
        match self {
            CallKind::Virtual => "invokevirtual",
            CallKind::Interface => "invokeinterface",
            CallKind::Static => "invokestatic",
            CallKind::Special => "invokespecial",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallKind::Virtual => "virtual",
            CallKind::Interface => "interface",
            CallKind::Static => "static",
            CallKind::Special => "special",
        };
        write!(f, "{}", name)
    }
}

/// A method identity: declaring class, name and descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    /// Dotted class name, e.g. `org.example.Shape`
    pub class_name: String,
    pub name: String,
    /// JVM descriptor, e.g. `(I)V`; may be empty
    #[serde(default)]
    pub descriptor: String,
}

impl MemberRef {
    pub fn new(class_name: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}.{}{}", self.class_name, self.name, self.descriptor)
    }

    /// True when a HotSpot scope frame `class::method` names this member.
    /// Descriptors are not part of scope lines, so overloads match alike.
    pub fn matches_frame(&self, class_name: &str, method_name: &str) -> bool {
        self.name == method_name && self.class_name == class_name.replace('/', ".")
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fully_qualified_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeCallSite {
    /// Bytecode index of the invoke instruction
    pub offset: u32,
    pub kind: CallKind,
    pub target: MemberRef,
}

/// A method the JIT emitted native code for, as held by the program model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMethod {
    pub member: MemberRef,
    pub call_sites: Vec<BytecodeCallSite>,
    pub instructions: Vec<InstructionRecord>,
}

impl CompiledMethod {
    pub fn new(member: MemberRef, call_sites: Vec<BytecodeCallSite>, instructions: Vec<InstructionRecord>) -> Self {
        Self {
            member,
            call_sites,
            instructions,
        }
    }

    pub fn fully_qualified_name(&self) -> String {
        self.member.fully_qualified_name()
    }

    pub fn is_compiled(&self) -> bool {
        !self.instructions.is_empty()
    }
}
