//! Symbol table entries (`Elf32_Sym`).

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use crate::base::{Elf32Addr, Elf32Half, Elf32Word};
use crate::error::{Error, Result};
use crate::host::Image;

/// Size in bytes of one `Elf32_Sym` entry.
pub const SYMBOL_SIZE: usize = 16;

/// Reserved section index meaning "undefined" (`SHN_UNDEF`): a symbol with
/// this `st_shndx` is either external or genuinely has no definition.
pub const SHN_UNDEF: u16 = 0;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[non_exhaustive]
/// The symbol binding, i.e. its linkage visibility (high 4 bits of `st_info`).
pub enum SymbolBinding {
    /// Not visible outside the object file (`STB_LOCAL`).
    Local = 0,
    /// Visible to all object files (`STB_GLOBAL`).
    Global = 1,
    /// Global, but with lower precedence (`STB_WEAK`).
    Weak = 2,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[non_exhaustive]
/// The symbol's type (low 4 bits of `st_info`).
pub enum SymbolType {
    /// Type not specified (`STT_NOTYPE`).
    NoType = 0,
    /// Data object, e.g. a variable (`STT_OBJECT`).
    Object = 1,
    /// Function (`STT_FUNC`).
    Func = 2,
    /// Associated with a section (`STT_SECTION`).
    Section = 3,
    /// The source file's name (`STT_FILE`).
    File = 4,
}

/// One entry of the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfSymbol {
    /// Offset into the string table, or 0 for an anonymous symbol (see
    /// [`crate::reader::ElfReader::read_symbol`] for the anonymous-name
    /// fallback).
    pub st_name: Elf32Word,
    /// The symbol's value: a section-relative offset for a defined symbol,
    /// meaningless (and sometimes reused as a fallback absolute address
    /// when the symbol is otherwise unresolvable) for an undefined one.
    pub st_value: Elf32Addr,
    /// Size of the object the symbol describes, if known.
    pub st_size: Elf32Word,
    /// Symbol binding.
    pub st_bind: Option<SymbolBinding>,
    /// Symbol type.
    pub st_type: Option<SymbolType>,
    /// Index of the section this symbol is defined in, or [`SHN_UNDEF`].
    pub st_shndx: Elf32Half,
}

impl ElfSymbol {
    /// True if this symbol has no in-image definition.
    pub fn is_undefined(&self) -> bool {
        self.st_shndx == SHN_UNDEF
    }

    /// Read entry `n` of the symbol table, which starts at `symtab_offset`
    /// in `image`.
    pub fn read(image: &dyn Image, symtab_offset: u32, n: u32) -> Result<Self> {
        let offset = symtab_offset as usize + n as usize * SYMBOL_SIZE;
        let mut buf = [0u8; SYMBOL_SIZE];
        image
            .read(offset, &mut buf)
            .map_err(|_| Error::ImageReadError {
                offset,
                len: SYMBOL_SIZE,
            })?;

        let st_info = buf[12];
        Ok(Self {
            st_name: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            st_value: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            st_size: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            st_bind: SymbolBinding::from_u8(st_info >> 4),
            st_type: SymbolType::from_u8(st_info & 0xf),
            st_shndx: u16::from_le_bytes([buf[14], buf[15]]),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Encode one `Elf32_Sym` entry.
    pub fn symbol_bytes(st_name: u32, st_value: u32, st_info: u8, st_shndx: u16) -> Vec<u8> {
        let mut buf = vec![0u8; SYMBOL_SIZE];
        buf[0..4].copy_from_slice(&st_name.to_le_bytes());
        buf[4..8].copy_from_slice(&st_value.to_le_bytes());
        buf[12] = st_info;
        buf[14..16].copy_from_slice(&st_shndx.to_le_bytes());
        buf
    }
}
