//! Parses the file header, section header table, and symbol table out of
//! an [`Image`], resolving names through the relevant string tables.

use crate::error::{Error, Result};
use crate::header::elf::ElfHeader;
use crate::header::section::ElfSectionHeader;
use crate::header::symbol::ElfSymbol;
use crate::host::Image;

/// Section and symbol names longer than this are truncated into a bounded
/// buffer (the original loader this is ported from uses a 32-byte stack
/// buffer for the same purpose).
pub const MAX_NAME_LEN: usize = 255;

/// Reads the structural pieces of an ELF32 object out of an [`Image`]:
/// the file header, section headers (with names resolved through the
/// section-name string table), and symbol table entries (with names
/// resolved through the symbol string table, falling back to the defining
/// section's name for anonymous symbols).
pub struct ElfReader<'a> {
    image: &'a dyn Image,
    header: ElfHeader,
    shstrtab_offset: u32,
}

impl<'a> ElfReader<'a> {
    /// Parse the file header and locate the section-name string table.
    pub fn new(image: &'a dyn Image) -> Result<Self> {
        let header = ElfHeader::parse(image)?;
        let shstrtab_header =
            ElfSectionHeader::read(image, header.e_shoff, header.e_shstrndx)?;
        Ok(Self {
            image,
            header,
            shstrtab_offset: shstrtab_header.sh_offset,
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// The underlying image, for callers (such as [`crate::reloc::RelocEngine`])
    /// that need to read structures this reader doesn't expose directly.
    pub fn image(&self) -> &dyn Image {
        self.image
    }

    /// Number of entries in the section header table.
    pub fn section_count(&self) -> u16 {
        self.header.e_shnum
    }

    /// Read entry `n` of the section header table, with its name resolved
    /// through the section-name string table.
    pub fn read_section_header(&self, n: u16) -> Result<(ElfSectionHeader, String)> {
        let header = ElfSectionHeader::read(self.image, self.header.e_shoff, n)?;
        let name = if header.sh_name == 0 {
            String::new()
        } else {
            self.read_string(self.shstrtab_offset + header.sh_name)?
        };
        Ok((header, name))
    }

    /// Read entry `n` of the symbol table located at `symtab_offset`, with
    /// its name resolved through `strtab_offset`. If the symbol's
    /// `st_name` is zero, the name is taken from the defining section's
    /// name instead.
    pub fn read_symbol(
        &self,
        symtab_offset: u32,
        strtab_offset: u32,
        n: u32,
    ) -> Result<(ElfSymbol, String)> {
        let symbol = ElfSymbol::read(self.image, symtab_offset, n)?;
        let name = if symbol.st_name != 0 {
            self.read_string(strtab_offset + symbol.st_name)?
        } else {
            let (_, section_name) = self.read_section_header(symbol.st_shndx)?;
            section_name
        };
        Ok((symbol, name))
    }

    /// Read a NUL-terminated string at `offset`, bounded to
    /// [`MAX_NAME_LEN`] bytes.
    fn read_string(&self, offset: u32) -> Result<String> {
        let mut bytes = Vec::with_capacity(32);
        let mut cursor = offset as usize;
        loop {
            let mut byte = [0u8; 1];
            self.image
                .read(cursor, &mut byte)
                .map_err(|_| Error::ImageReadError { offset: cursor, len: 1 })?;
            if byte[0] == 0 || bytes.len() >= MAX_NAME_LEN {
                break;
            }
            bytes.push(byte[0]);
            cursor += 1;
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
