// Rendered before every native address
pub const ADDRESS_PREFIX: &str = "0x";
pub const ADDRESS_HEX_WIDTH: usize = 16;

pub const OPERAND_SEPARATOR: &str = ", ";
pub const COMMENT_GAP: &str = "  ";

/// Comment text HotSpot (or a post-processor) leaves on instructions whose
/// dispatch was resolved at compile time. Matched case-insensitively.
pub const OPTIMIZATION_MARKERS: &[&str] = &[
    "optimized virtual_call",
    "inlined, no dispatch",
    "type check eliminated",
    "null check eliminated",
    "direct call",
    "monomorphic",
    "inline (hot)",
];

/// Comment text showing a real runtime dispatch was emitted.
pub const DISPATCH_MARKERS: &[&str] = &[
    "{virtual_call}",
    "vtable",
    "itable",
];

/// x86 prefixes the assembly parser splits off ahead of the mnemonic.
pub const INSTRUCTION_MODIFIERS: &[&str] = &[
    "lock",
    "rep",
    "repe",
    "repz",
    "repne",
    "repnz",
    "data16",
    "data32",
    "addr32",
    "notrack",
    "bnd",
    "rex",
    "rex.w",
    "rex.r",
    "rex.x",
    "rex.b",
    "rex.wb",
    "rex.wr",
    "rex.wrb",
    "rex.wxb",
    "rex.wrxb",
    "cs",
    "ds",
    "es",
    "fs",
    "gs",
    "ss",
];

pub const SNAPSHOT_EXTENSION: &str = "json";

pub const REPORT_JSON_FILE: &str = "vcall_report.json";
pub const REPORT_TEXT_FILE: &str = "vcall_report.txt";
