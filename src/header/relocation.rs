//! RELA relocation entries (`Elf32_Rela`).

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use crate::base::{Elf32Addr, Elf32Sword, Elf32Word};
use crate::error::{Error, Result};
use crate::host::Image;

/// Size in bytes of one `Elf32_Rela` entry.
pub const RELA_SIZE: usize = 12;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[non_exhaustive]
/// The five Xtensa relocation types this loader's engine understands.
/// Any other value is [`crate::error::Error::UnsupportedRelocationType`].
pub enum RelocationType {
    /// No relocation; a placeholder entry.
    XtensaNone = 0,
    /// Add the symbol's address (plus addend) into the 32-bit word at the
    /// target offset.
    Xtensa32 = 1,
    /// Assembler-only hint with no effect on the patched bytes.
    XtensaAsmExpand = 11,
    /// Patch the Xtensa instruction whose opcode occupies slot 0 at the
    /// target offset; the actual rewrite depends on the instruction's
    /// encoding family (see [`crate::reloc`]).
    XtensaSlot0Op = 20,
}

/// One RELA relocation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfRela {
    /// Offset within the target section to patch (`r_offset`).
    pub r_offset: Elf32Addr,
    /// Index into the symbol table of the referenced symbol
    /// (`ELF32_R_SYM(r_info)`).
    pub r_sym: Elf32Word,
    /// The relocation type (`ELF32_R_TYPE(r_info)`), if it's one of the
    /// five this loader supports.
    pub r_type: Option<RelocationType>,
    /// The raw relocation type value, retained so an unsupported type can
    /// still be named in an error.
    pub r_type_raw: Elf32Word,
    /// Signed addend applied to the resolved symbol address.
    pub r_addend: Elf32Sword,
}

impl ElfRela {
    /// Read entry `n` of a RELA table located at `offset` in `image`.
    pub fn read(image: &dyn Image, offset: u32, n: u32) -> Result<Self> {
        let entry_offset = offset as usize + n as usize * RELA_SIZE;
        let mut buf = [0u8; RELA_SIZE];
        image
            .read(entry_offset, &mut buf)
            .map_err(|_| Error::ImageReadError {
                offset: entry_offset,
                len: RELA_SIZE,
            })?;

        let r_info = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let r_type_raw = r_info & 0xff;
        Ok(Self {
            r_offset: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            r_sym: r_info >> 8,
            r_type: RelocationType::from_u32(r_type_raw),
            r_type_raw,
            r_addend: i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}


#[cfg(test)]
mod test {
    use super::test_support::rela_bytes;
    use super::*;

    #[test]
    fn decodes_sym_and_type_from_r_info() {
        let image = rela_bytes(0x10, 5, RelocationType::Xtensa32 as u32, 4);
        let rela = ElfRela::read(&image, 0, 0).unwrap();
        assert_eq!(rela.r_offset, 0x10);
        assert_eq!(rela.r_sym, 5);
        assert_eq!(rela.r_type, Some(RelocationType::Xtensa32));
        assert_eq!(rela.r_addend, 4);
    }

    #[test]
    fn unsupported_type_is_none_but_raw_value_kept() {
        let image = rela_bytes(0, 0, 99, 0);
        let rela = ElfRela::read(&image, 0, 0).unwrap();
        assert_eq!(rela.r_type, None);
        assert_eq!(rela.r_type_raw, 99);
    }
}
