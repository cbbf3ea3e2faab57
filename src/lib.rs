//! A dynamic loader for relocatable ELF32 object files targeting the
//! Xtensa instruction set, as used to side-load small compiled tasks into a
//! running ESP32-class host process.
//!
//! The crate owns ELF parsing, the section/symbol model, and the Xtensa
//! relocation engine. The host's memory allocators, its byte-addressable
//! image of the object file, and the symbol table it exports to loaded
//! code are abstracted behind the traits in [`host`]; nothing in this
//! crate assumes a concrete backing for any of them.
//!
//! ```text
//! ByteView -> ElfReader -> SectionTable -> SymbolResolver -> RelocEngine -> Loader
//! ```
//!
//! [`loader::Loader::load`] runs the three-pass load procedure and hands
//! back a [`loader::LoaderContext`] that owns every allocated section
//! buffer for the lifetime of the loaded object.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

pub mod base;
pub mod error;
pub mod header;
pub mod host;
pub mod loader;
pub mod reader;
pub mod reloc;
pub mod section;
pub mod symbol;

pub use error::{Error, Result};
pub use loader::{EntryPoint, Loader, LoaderContext};
