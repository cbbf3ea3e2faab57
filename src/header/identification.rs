//! The `e_ident` field of the ELF header: the magic number and the class
//! and data-encoding bytes that tell a general-purpose reader how to decode
//! the rest of the file.
//!
//! This loader only ever accepts one combination (32-bit, little-endian),
//! but it still validates the bytes explicitly rather than assuming them,
//! so a mismatched object produces [`crate::error::Error::BadMagic`] instead
//! of being silently misparsed.

use crate::error::{Error, Result};

/// The four magic bytes every ELF file starts with.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Byte offset of `e_ident[EI_CLASS]`.
const EI_CLASS: usize = 4;
/// Byte offset of `e_ident[EI_DATA]`.
const EI_DATA: usize = 5;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The file's class, i.e. whether it is 32-bit or 64-bit. This loader
/// supports only [`ElfClass::Elf32`].
pub enum ElfClass {
    /// 32-bit objects (`ELFCLASS32`).
    Elf32 = 1,
    /// 64-bit objects (`ELFCLASS64`), parsed but rejected, since this
    /// loader's relocation engine is ELF32-only.
    Elf64 = 2,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The file's data encoding. This loader supports only
/// [`ElfDataEncoding::Lsb`] (little-endian), matching Xtensa's native
/// encoding.
pub enum ElfDataEncoding {
    /// Little-endian (`ELFDATA2LSB`).
    Lsb = 1,
    /// Big-endian (`ELFDATA2MSB`), parsed but rejected.
    Msb = 2,
}

/// The identifier bytes at the start of the ELF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeaderIdentifier {
    /// The file's class. See [`ElfClass`].
    pub class: ElfClass,
    /// The file's data encoding. See [`ElfDataEncoding`].
    pub data_encoding: ElfDataEncoding,
}

impl ElfHeaderIdentifier {
    /// Parse and validate the 16-byte `e_ident` array, requiring the ELF32
    /// little-endian combination this loader supports. A recognized but
    /// unsupported combination (64-bit, big-endian) is rejected the same as
    /// a garbled one: there is no well-formed object this loader can make
    /// of it, so `BadMagic` covers both.
    pub fn parse(e_ident: &[u8; 16]) -> Result<Self> {
        if e_ident[0..4] != ELF_MAGIC {
            return Err(Error::BadMagic);
        }
        let class = match e_ident[EI_CLASS] {
            1 => ElfClass::Elf32,
            _ => return Err(Error::BadMagic),
        };
        let data_encoding = match e_ident[EI_DATA] {
            1 => ElfDataEncoding::Lsb,
            _ => return Err(Error::BadMagic),
        };
        Ok(Self {
            class,
            data_encoding,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ident(class: u8, data: u8) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&ELF_MAGIC);
        bytes[EI_CLASS] = class;
        bytes[EI_DATA] = data;
        bytes
    }

    #[test]
    fn accepts_elf32_lsb() {
        let parsed = ElfHeaderIdentifier::parse(&ident(1, 1)).unwrap();
        assert_eq!(parsed.class, ElfClass::Elf32);
        assert_eq!(parsed.data_encoding, ElfDataEncoding::Lsb);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = ident(1, 1);
        bytes[0] = 0x00;
        assert_eq!(ElfHeaderIdentifier::parse(&bytes), Err(Error::BadMagic));
    }

    #[test]
    fn rejects_elf64_and_msb_combinations() {
        assert_eq!(ElfHeaderIdentifier::parse(&ident(2, 1)), Err(Error::BadMagic));
        assert_eq!(ElfHeaderIdentifier::parse(&ident(1, 2)), Err(Error::BadMagic));
    }
}
