//! The ELF32 section header (`Elf32_Shdr`) and the section header table it
//! is an entry of.

use bitflags::bitflags;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use crate::base::{Elf32Addr, Elf32Off, Elf32Word};
use crate::error::{Error, Result};
use crate::host::Image;

/// Size in bytes of one `Elf32_Shdr` entry.
pub const SECTION_HEADER_SIZE: usize = 40;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[non_exhaustive]
/// The type of a section (`sh_type`). Only the handful this loader acts on
/// carry specific meaning; everything else is treated as opaque.
pub enum SectionType {
    /// Inactive; no associated section (`SHT_NULL`).
    Null = 0,
    /// Program-defined contents (`SHT_PROGBITS`), e.g. `.text`, `.data`, `.rodata`.
    ProgBits = 1,
    /// Symbol table (`SHT_SYMTAB`).
    SymTab = 2,
    /// String table (`SHT_STRTAB`).
    StrTab = 3,
    /// Relocations with explicit addends (`SHT_RELA`), the only
    /// relocation section type this loader reads.
    Rela = 4,
    /// Occupies no file space, zero-initialized at load (`SHT_NOBITS`),
    /// e.g. `.bss`.
    NoBits = 8,
}

bitflags! {
    /// Section attribute flags (`sh_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u32 {
        /// Section occupies memory at runtime and must be loaded (`SHF_WRITE`
        /// is tracked separately; this loader does not need it, since host
        /// allocators already hand out writable data memory).
        const ALLOC = 0x2;
        /// Section contains executable machine instructions (`SHF_EXECINSTR`).
        const EXECINSTR = 0x4;
    }
}

/// One entry of the section header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfSectionHeader {
    /// Offset into the section name string table (`sh_name`).
    pub sh_name: Elf32Word,
    /// Section type.
    pub sh_type: Option<SectionType>,
    /// Section attribute flags.
    pub sh_flags: SectionFlags,
    /// For `SHT_RELA` sections, the index of the section the relocations
    /// apply to (`sh_info`). Meaningless for other section types.
    pub sh_info: Elf32Word,
    /// File offset of the section's contents (meaningless for `SHT_NOBITS`).
    pub sh_offset: Elf32Off,
    /// Size in bytes of the section's contents.
    pub sh_size: Elf32Word,
    /// Virtual address the section is to be loaded at, if any (unused by
    /// this loader: sections are relocated to wherever the host allocator
    /// happens to place them).
    pub sh_addr: Elf32Addr,
}

impl ElfSectionHeader {
    /// Read entry `n` of the section header table, which starts at
    /// `shoff` in `image`.
    pub fn read(image: &dyn Image, shoff: u32, n: u16) -> Result<Self> {
        let offset = shoff as usize + n as usize * SECTION_HEADER_SIZE;
        let mut buf = [0u8; SECTION_HEADER_SIZE];
        image
            .read(offset, &mut buf)
            .map_err(|_| Error::ImageReadError {
                offset,
                len: SECTION_HEADER_SIZE,
            })?;

        let word = |start: usize| -> u32 {
            u32::from_le_bytes([buf[start], buf[start + 1], buf[start + 2], buf[start + 3]])
        };

        Ok(Self {
            sh_name: word(0),
            sh_type: SectionType::from_u32(word(4)),
            sh_flags: SectionFlags::from_bits_truncate(word(8)),
            sh_addr: word(12),
            sh_offset: word(16),
            sh_size: word(20),
            sh_info: word(28),
        })
    }
}


#[cfg(test)]
mod test {
    use super::test_support::section_header_bytes;
    use super::*;

    #[test]
    fn parses_alloc_execinstr_section() {
        let image = section_header_bytes(1, 1, 0x6, 0, 0x54, 0x10, 0, 0);
        let header = ElfSectionHeader::read(&image, 0, 0).unwrap();
        assert_eq!(header.sh_type, Some(SectionType::ProgBits));
        assert!(header.sh_flags.contains(SectionFlags::ALLOC));
        assert!(header.sh_flags.contains(SectionFlags::EXECINSTR));
        assert_eq!(header.sh_size, 0x10);
    }

    #[test]
    fn unknown_section_type_is_none_not_an_error() {
        let image = section_header_bytes(0, 0x7000_0001, 0, 0, 0, 0, 0, 0);
        let header = ElfSectionHeader::read(&image, 0, 0).unwrap();
        assert_eq!(header.sh_type, None);
    }
}
