//! Error type for every stage of a load: parsing, allocation, symbol
//! resolution, and relocation.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Everything that can make a load fail.
pub enum Error {
    #[error("file does not start with the ELF magic number")]
    BadMagic,
    #[error("image read of {len} bytes at offset {offset} failed")]
    ImageReadError { offset: usize, len: usize },
    #[error("required section `{name}` is missing")]
    MissingRequiredSection { name: &'static str },
    #[error("host allocator returned null for a {size}-byte {kind} allocation")]
    AllocFailed { kind: AllocKind, size: usize },
    #[error(
        "RELA section at index {rela_index} targets section {sh_info}, which is not a prior section"
    )]
    MalformedRela { rela_index: usize, sh_info: usize },
    #[error(
        "relocation at offset {offset:#x} in section {section} references an unresolvable symbol `{symbol}`"
    )]
    UnresolvedSymbol {
        section: usize,
        offset: u32,
        symbol: String,
    },
    #[error(
        "relocation at address {address:#x} does not match any known Xtensa instruction encoding (word {word:#010x})"
    )]
    UnsupportedEncoding { address: usize, word: u32 },
    #[error("relocation type {reloc_type} is not one of the five Xtensa types this loader supports")]
    UnsupportedRelocationType { reloc_type: u32 },
    #[error("relocation at address {address:#x} computed delta {delta} out of range")]
    RangeViolation { address: usize, delta: i32 },
    #[error("relocation at address {address:#x} computed delta {delta} is not aligned to {required}")]
    AlignmentViolation {
        address: usize,
        delta: i32,
        required: u32,
    },
    #[error("no symbol named `{name}` resolves to an address")]
    EntryPointNotFound { name: String },
    #[error("run() called before a successful set_entry()")]
    EntryPointNotSet,
    #[error("offset {offset} is out of range for a {len}-byte image")]
    OutOfRange { offset: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which host allocator failed.
pub enum AllocKind {
    /// `alloc_exec`
    Exec,
    /// `alloc_data`
    Data,
}

impl std::fmt::Display for AllocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exec => write!(f, "executable"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
