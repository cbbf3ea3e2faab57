//! The top-level orchestrator: parses an object, allocates and copies its
//! allocatable sections, relocates them, resolves a named entry point, and
//! invokes it.
//!
//! [`Loader::load`] runs the fixed three-pass procedure (header parse,
//! section allocation, relocation) and hands back an owning
//! [`LoaderContext`]; [`LoaderContext::set_entry`]
//! and [`LoaderContext::run`] correspond to `elfLoaderSetFunc` and
//! `elfLoaderRun` in the original C loader this crate is ported from.

use crate::base::UNRESOLVED;
use crate::error::{Error, Result};
use crate::header::relocation::RELA_SIZE;
use crate::header::section::{SectionFlags, SectionType};
use crate::header::symbol::SYMBOL_SIZE;
use crate::host::{
    alloc_data_or_err, alloc_exec_or_err, DataAllocator, ExecAllocator, ExportedSymbolTable, Image,
};
use crate::reader::ElfReader;
use crate::reloc::RelocEngine;
use crate::section::{Section, SectionTable};
use crate::symbol::SymbolResolver;

/// The calling convention a loaded entry point follows: it receives a byte
/// buffer and its length, and returns a byte buffer. The returned pointer's
/// lifetime is the callee's responsibility; this crate never frees it.
pub type EntryPoint = unsafe extern "C" fn(*mut u8, usize) -> *mut u8;

/// Loads an ELF32 Xtensa relocatable object against a host environment.
///
/// Stateless: all mutable state produced by a load lives in the returned
/// [`LoaderContext`], so nothing here prevents loading two objects
/// independently.
pub struct Loader;

impl Loader {
    /// Run the full parse, allocate and copy, relocate procedure in its
    /// three fixed passes.
    ///
    /// `exported` is the host's symbol table; `exec` and `data` are the
    /// host's capability-providing allocators for executable and ordinary
    /// memory respectively. On any failure, everything allocated so far is
    /// released (by ordinary drop of the partially built [`SectionTable`])
    /// before the error is returned.
    pub fn load<'image>(
        image: &'image dyn Image,
        exported: ExportedSymbolTable<'image>,
        exec: &mut dyn ExecAllocator,
        data: &mut dyn DataAllocator,
    ) -> Result<LoaderContext<'image>> {
        // Pass 1: header parse (magic check, section header table location,
        // section-name string table location) happens inside `ElfReader::new`.
        let reader = ElfReader::new(image)?;

        let mut sections = SectionTable::new();
        let mut symtab_offset = None;
        let mut strtab_offset = None;
        let mut symtab_count = 0u32;
        let mut text_base = None;

        // Pass 2: allocate and classify every section.
        for n in 1..reader.section_count() {
            let (header, name) = reader.read_section_header(n)?;

            if header.sh_flags.contains(SectionFlags::ALLOC) {
                if header.sh_size == 0 {
                    continue;
                }
                let size = header.sh_size as usize;
                let mut buffer = if header.sh_flags.contains(SectionFlags::EXECINSTR) {
                    alloc_exec_or_err(exec, size)?
                } else {
                    alloc_data_or_err(data, size)?
                };
                if header.sh_type == Some(SectionType::NoBits) {
                    buffer.fill(0);
                } else {
                    image.read(header.sh_offset as usize, &mut buffer)?;
                }
                if name == ".text" {
                    text_base = Some(buffer.address());
                }
                sections.add(Section {
                    original_index: n,
                    data: buffer,
                    rela_index: None,
                });
            } else if header.sh_type == Some(SectionType::Rela) {
                if header.sh_info >= n as u32 {
                    return Err(Error::MalformedRela {
                        rela_index: n as usize,
                        sh_info: header.sh_info as usize,
                    });
                }
                if let Some(target) = sections.find_mut(header.sh_info as u16) {
                    target.rela_index = Some(n);
                }
            } else if name == ".symtab" {
                symtab_offset = Some(header.sh_offset);
                symtab_count = header.sh_size / SYMBOL_SIZE as u32;
            } else if name == ".strtab" {
                strtab_offset = Some(header.sh_offset);
            }
        }

        let Some(symtab_offset) = symtab_offset else {
            return Err(Error::MissingRequiredSection { name: ".symtab" });
        };
        let Some(strtab_offset) = strtab_offset else {
            return Err(Error::MissingRequiredSection { name: ".strtab" });
        };

        // Pass 3: relocate every section that has a companion RELA section.
        // Every section with relocations is attempted, even after an
        // earlier one fails, so the aggregate result surfaces every error.
        let resolver = SymbolResolver::new(exported);
        let engine = RelocEngine::new(&reader, &resolver, symtab_offset, strtab_offset);
        let targets: Vec<(u16, u16)> = sections
            .iter()
            .filter_map(|section| section.rela_index.map(|rela| (section.original_index, rela)))
            .collect();

        let mut first_error = None;
        for (target_index, rela_index) in targets {
            let (rela_header, _) = reader.read_section_header(rela_index)?;
            let rela_count = rela_header.sh_size / RELA_SIZE as u32;
            if let Err(err) = engine.relocate_section(
                &mut sections,
                target_index,
                rela_header.sh_offset,
                rela_count,
            ) {
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        Ok(LoaderContext {
            reader,
            exported,
            sections,
            symtab_offset,
            strtab_offset,
            symtab_count,
            text_base,
            entry: None,
        })
    }
}

/// The owning root of a completed load: holds every allocated section
/// buffer, the parsed structural metadata needed to resolve symbols by
/// name, and (once [`set_entry`](Self::set_entry) has been called) the
/// resolved entry point address.
///
/// Dropping a `LoaderContext` releases every owned section buffer (see
/// [`crate::host::HostBuffer`]'s `Drop` impl): a context is the single owner
/// of everything it allocates, and tearing it down tears down all of it.
pub struct LoaderContext<'image> {
    reader: ElfReader<'image>,
    exported: ExportedSymbolTable<'image>,
    sections: SectionTable,
    symtab_offset: u32,
    strtab_offset: u32,
    symtab_count: u32,
    text_base: Option<usize>,
    entry: Option<usize>,
}

impl<'image> LoaderContext<'image> {
    /// The loaded `.text` section's base address, if the object has one.
    pub fn text_address(&self) -> Option<usize> {
        self.text_base
    }

    /// The catalog of every loaded, allocatable section.
    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    /// Scan the symbol table for a symbol named `name` whose address
    /// resolves successfully (host export or in-image definition), and
    /// record it as the entry point. The first matching name whose address
    /// resolves wins; a name that appears more than once in the table but
    /// never resolves is still a failure.
    pub fn set_entry(&mut self, name: &str) -> Result<()> {
        let resolver = SymbolResolver::new(self.exported);
        for n in 0..self.symtab_count {
            let (symbol, symbol_name) =
                self.reader
                    .read_symbol(self.symtab_offset, self.strtab_offset, n)?;
            if symbol_name != name {
                continue;
            }
            let address = resolver.resolve(&symbol, &symbol_name, &self.sections);
            if address != UNRESOLVED {
                self.entry = Some(address as usize);
                return Ok(());
            }
        }
        Err(Error::EntryPointNotFound {
            name: name.to_string(),
        })
    }

    /// Invoke the entry point set by [`set_entry`](Self::set_entry) with
    /// the `(byte_buffer, length) -> byte_buffer` calling convention. The
    /// returned pointer's lifetime is the callee's responsibility.
    ///
    /// # Safety
    ///
    /// The caller must ensure the entry point address was resolved against
    /// code actually present (and still mapped executable) in this
    /// context's sections, and that the loaded function honors the
    /// documented calling convention.
    pub unsafe fn run(&self, arg: &mut [u8]) -> Result<*mut u8> {
        let entry = self.entry.ok_or(Error::EntryPointNotSet)?;
        // SAFETY: `entry` was produced by `set_entry`, which only accepts
        // addresses that `SymbolResolver` resolved either to a host export
        // or to an offset inside one of this context's own section
        // buffers; the caller upholds the rest of the calling-convention
        // contract per this function's own safety doctum.
        let func: EntryPoint = std::mem::transmute(entry);
        Ok(func(arg.as_mut_ptr(), arg.len()))
    }
}
