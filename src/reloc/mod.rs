//! Applies the relocations recorded in a RELA section to the section they
//! target.

pub mod xtensa;

use crate::base::{ByteView, UNRESOLVED};
use crate::error::{Error, Result};
use crate::header::relocation::{ElfRela, RelocationType};
use crate::reader::ElfReader;
use crate::section::SectionTable;
use crate::symbol::SymbolResolver;

/// A view over a single section's buffer addressed from a given byte
/// offset, so the [`xtensa`] patch routines can work in instruction-local
/// coordinates without knowing about the enclosing section.
struct Window<'a> {
    section: &'a mut dyn ByteView,
    base: usize,
}

impl ByteView for Window<'_> {
    fn len(&self) -> usize {
        self.section.len().saturating_sub(self.base)
    }

    fn get8(&self, offset: usize) -> Result<u8> {
        self.section.get8(self.base + offset)
    }

    fn set8(&mut self, offset: usize, value: u8) -> Result<()> {
        self.section.set8(self.base + offset, value)
    }
}

/// Applies every RELA entry in one relocation section to the section it
/// targets.
pub struct RelocEngine<'reader, 'sym> {
    reader: &'reader ElfReader<'reader>,
    resolver: &'sym SymbolResolver<'sym>,
    symtab_offset: u32,
    strtab_offset: u32,
}

impl<'reader, 'sym> RelocEngine<'reader, 'sym> {
    /// Build an engine over the given symbol table location and resolver.
    pub fn new(
        reader: &'reader ElfReader<'reader>,
        resolver: &'sym SymbolResolver<'sym>,
        symtab_offset: u32,
        strtab_offset: u32,
    ) -> Self {
        Self {
            reader,
            resolver,
            symtab_offset,
            strtab_offset,
        }
    }

    /// Apply every entry of the RELA section at `rela_offset`
    /// (`rela_count` entries long) to `target_index`, whose buffer lives in
    /// `sections`. Every entry is attempted even after a failure, so every
    /// error in the section is logged; the first error (if any) is
    /// returned once the whole section has been processed.
    pub fn relocate_section(
        &self,
        sections: &mut SectionTable,
        target_index: u16,
        rela_offset: u32,
        rela_count: u32,
    ) -> Result<()> {
        let mut first_error = None;
        for n in 0..rela_count {
            let rela = match ElfRela::read(self.reader.image(), rela_offset, n) {
                Ok(rela) => rela,
                Err(err) => {
                    log::error!("section {target_index}: failed to read relocation {n}: {err}");
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            if let Err(err) = self.apply(sections, target_index, &rela) {
                log::error!(
                    "section {target_index}: relocation at offset {:#x} failed: {err}",
                    rela.r_offset
                );
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn apply(&self, sections: &mut SectionTable, target_index: u16, rela: &ElfRela) -> Result<()> {
        let (symbol, name) =
            self.reader
                .read_symbol(self.symtab_offset, self.strtab_offset, rela.r_sym)?;

        let resolved = self.resolver.resolve(&symbol, &name, sections);
        let mut sym_addr = resolved.wrapping_add(rela.r_addend as u32);
        if sym_addr == UNRESOLVED {
            if symbol.st_value == 0 {
                return Err(Error::UnresolvedSymbol {
                    section: target_index as usize,
                    offset: rela.r_offset,
                    symbol: name,
                });
            }
            sym_addr = symbol.st_value;
        }

        let Some(r_type) = rela.r_type else {
            return Err(Error::UnsupportedRelocationType {
                reloc_type: rela.r_type_raw,
            });
        };

        let section = sections
            .find_mut(target_index)
            .ok_or(Error::OutOfRange {
                offset: rela.r_offset as usize,
                len: 0,
            })?;
        let pc = (section.base_address() as u32).wrapping_add(rela.r_offset);

        match r_type {
            RelocationType::XtensaNone | RelocationType::XtensaAsmExpand => Ok(()),
            RelocationType::Xtensa32 => {
                let offset = rela.r_offset as usize;
                let existing = section.data.get32(offset)?;
                section.data.set32(offset, existing.wrapping_add(sym_addr))?;
                Ok(())
            }
            RelocationType::XtensaSlot0Op => {
                let offset = rela.r_offset as usize;
                let word = section.data.get32(offset)?;
                let family = xtensa::decode(word).ok_or(Error::UnsupportedEncoding {
                    address: pc as usize,
                    word,
                })?;
                let mut window = Window {
                    section: &mut section.data,
                    base: offset,
                };
                xtensa::patch(family, &mut window, pc, sym_addr)?;
                Ok(())
            }
        }
    }
}
