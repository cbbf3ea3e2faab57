//! The ELF file header (`Elf32_Ehdr`), located at offset 0 of the image.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use crate::base::{Elf32Addr, Elf32Half, Elf32Off, Elf32Word};
use crate::error::{Error, Result};
use crate::header::identification::ElfHeaderIdentifier;
use crate::host::Image;

/// Size in bytes of `Elf32_Ehdr`.
pub const ELF_HEADER_SIZE: usize = 52;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[non_exhaustive]
/// The object file's type (`e_type`). The loader accepts only
/// [`ElfType::Relocatable`]; other types aren't something a side-loaded
/// task would ever be compiled as.
pub enum ElfType {
    /// No file type.
    None = 0,
    /// Relocatable file (`ET_REL`), the only type this loader accepts.
    Relocatable = 1,
    /// Executable file (`ET_EXEC`).
    Executable = 2,
    /// Shared object file (`ET_DYN`).
    Dynamic = 3,
    /// Core file (`ET_CORE`).
    Core = 4,
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[non_exhaustive]
/// The target instruction set architecture (`e_machine`). The loader
/// accepts only [`ElfMachine::Xtensa`].
pub enum ElfMachine {
    /// No machine.
    None = 0,
    /// Tensilica Xtensa Processor (`EM_XTENSA`), the only architecture
    /// this loader's relocation engine understands.
    Xtensa = 94,
}

/// The ELF32 file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    /// Identification bytes (class, data encoding).
    pub identifier: ElfHeaderIdentifier,
    /// Object file type.
    pub e_type: ElfType,
    /// Target architecture.
    pub e_machine: ElfMachine,
    /// Object file version.
    pub e_version: Elf32Word,
    /// Entry point virtual address (unused by this loader; the entry point
    /// is resolved by name through [`crate::loader::Loader::set_entry`]).
    pub e_entry: Elf32Addr,
    /// Program header table file offset (unused: relocatable objects have
    /// no program headers that matter to this loader).
    pub e_phoff: Elf32Off,
    /// Section header table file offset.
    pub e_shoff: Elf32Off,
    /// Processor-specific flags.
    pub e_flags: Elf32Word,
    /// Size of this header in bytes.
    pub e_ehsize: Elf32Half,
    /// Size of one program header table entry.
    pub e_phentsize: Elf32Half,
    /// Number of program header table entries.
    pub e_phnum: Elf32Half,
    /// Size of one section header table entry.
    pub e_shentsize: Elf32Half,
    /// Number of section header table entries.
    pub e_shnum: Elf32Half,
    /// Section header table index of the section name string table.
    pub e_shstrndx: Elf32Half,
}

impl ElfHeader {
    /// Parse the file header out of `image`, which must have the ELF magic
    /// at offset 0.
    pub fn parse(image: &dyn Image) -> Result<Self> {
        let mut buf = [0u8; ELF_HEADER_SIZE];
        image.read(0, &mut buf).map_err(|_| Error::ImageReadError {
            offset: 0,
            len: ELF_HEADER_SIZE,
        })?;

        let mut e_ident = [0u8; 16];
        e_ident.copy_from_slice(&buf[0..16]);
        let identifier = ElfHeaderIdentifier::parse(&e_ident)?;

        let e_type = ElfType::from_u16(u16::from_le_bytes([buf[16], buf[17]])).unwrap_or(ElfType::None);
        let e_machine =
            ElfMachine::from_u16(u16::from_le_bytes([buf[18], buf[19]])).unwrap_or(ElfMachine::None);

        Ok(Self {
            identifier,
            e_type,
            e_machine,
            e_version: u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]),
            e_entry: u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]),
            e_phoff: u32::from_le_bytes([buf[28], buf[29], buf[30], buf[31]]),
            e_shoff: u32::from_le_bytes([buf[32], buf[33], buf[34], buf[35]]),
            e_flags: u32::from_le_bytes([buf[36], buf[37], buf[38], buf[39]]),
            e_ehsize: u16::from_le_bytes([buf[40], buf[41]]),
            e_phentsize: u16::from_le_bytes([buf[42], buf[43]]),
            e_phnum: u16::from_le_bytes([buf[44], buf[45]]),
            e_shentsize: u16::from_le_bytes([buf[46], buf[47]]),
            e_shnum: u16::from_le_bytes([buf[48], buf[49]]),
            e_shstrndx: u16::from_le_bytes([buf[50], buf[51]]),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a minimal, well-formed `Elf32_Ehdr` for a relocatable Xtensa
    /// object with `shnum` section headers starting at `shoff`, the section
    /// name string table at index `shstrndx`.
    pub fn header_bytes(shoff: u32, shnum: u16, shstrndx: u16) -> Vec<u8> {
        let mut buf = vec![0u8; ELF_HEADER_SIZE];
        buf[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
        buf[4] = 1; // ELFCLASS32
        buf[5] = 1; // ELFDATA2LSB
        buf[6] = 1; // EI_VERSION
        buf[16..18].copy_from_slice(&1u16.to_le_bytes()); // ET_REL
        buf[18..20].copy_from_slice(&94u16.to_le_bytes()); // EM_XTENSA
        buf[20..24].copy_from_slice(&1u32.to_le_bytes());
        buf[40..42].copy_from_slice(&(ELF_HEADER_SIZE as u16).to_le_bytes());
        buf[46..48].copy_from_slice(&40u16.to_le_bytes()); // e_shentsize
        buf[32..36].copy_from_slice(&shoff.to_le_bytes());
        buf[48..50].copy_from_slice(&shnum.to_le_bytes());
        buf[50..52].copy_from_slice(&shstrndx.to_le_bytes());
        buf
    }
}
