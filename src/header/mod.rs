//! On-disk structures of an ELF32 relocatable object file: the file header,
//! section headers, symbol table entries, and RELA relocation entries.

pub mod elf;
pub mod identification;
pub mod relocation;
pub mod section;
pub mod symbol;
