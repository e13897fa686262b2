use thiserror::Error;

#[derive(Error, Debug)]
pub enum JitLensError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse model snapshot: {0}")]
    SnapshotParseError(#[from] serde_json::Error),
    #[error("Invalid file extension")]
    InvalidFileExtension,
    #[error("Duplicate package in snapshot: {0}")]
    DuplicatePackage(String),
    #[error("Package cycle detected at {0}")]
    CyclicPackage(String),
    #[error("Package {parent} references missing child package {child}")]
    MissingPackage { parent: String, child: String },
    #[error("Package {package} declares missing parent package {parent}")]
    MissingParent { package: String, parent: String },
    #[error("Package {package} is listed under {listed_under} but declares parent {declared:?}")]
    ParentMismatch {
        package: String,
        listed_under: String,
        declared: Option<String>,
    },
    #[error("Package {0} is not reachable from any root package")]
    UnreachablePackage(String),
    #[error("Class {class} is held by package {container} but declares package {declared}")]
    OrphanClass {
        class: String,
        container: String,
        declared: String,
    },
    #[error("Method {method} is held by class {container} but declares class {declared}")]
    OrphanMethod {
        method: String,
        container: String,
        declared: String,
    },
    #[error("Class {class} appears more than once in package {package}")]
    DuplicateClass { class: String, package: String },
    #[error("Method {method} appears more than once in class {class}")]
    DuplicateMethod { method: String, class: String },
    #[error("Instruction at {0:#x} has no mnemonic")]
    EmptyMnemonic(u64),
    #[error("Unparseable assembly line {line}: {text}")]
    AssemblyParseError { line: usize, text: String },
    #[error("Visitor failed on {member}: {reason}")]
    VisitorError { member: String, reason: String },
    #[error("Failed to serialize to JSON: {0}")]
    SerializationError(String),
}
