//! Resolves a symbol to an absolute address, consulting the host-exported
//! table first and the table of loaded in-image sections second.

use crate::base::UNRESOLVED;
use crate::header::symbol::ElfSymbol;
use crate::host::ExportedSymbolTable;
use crate::section::SectionTable;

/// Resolves symbol references against the host's exported symbols and
/// against the sections loaded for the current object.
pub struct SymbolResolver<'a> {
    exported: ExportedSymbolTable<'a>,
}

impl<'a> SymbolResolver<'a> {
    /// Build a resolver over the host's exported symbol table. The loaded
    /// [`SectionTable`] is passed to [`resolve`](Self::resolve) directly
    /// rather than stored, since it is still being populated while the
    /// loader's first pass runs.
    pub fn new(exported: ExportedSymbolTable<'a>) -> Self {
        Self { exported }
    }

    /// Resolve `symbol` (named `name`) to an absolute address.
    ///
    /// Host-export name match takes precedence over an in-image
    /// definition: an exact host-export name match wins even if the
    /// in-image symbol table also defines `name`. Failing that, if the
    /// symbol is defined in a section present in `sections`, its address
    /// is `base(section) + st_value`. Otherwise [`UNRESOLVED`] is returned;
    /// the caller decides whether `st_value` can serve as a fallback.
    pub fn resolve(&self, symbol: &ElfSymbol, name: &str, sections: &SectionTable) -> u32 {
        if let Some(address) = self.exported.get(name) {
            return address as u32;
        }
        if let Some(section) = sections.find(symbol.st_shndx) {
            return (section.base_address() as u32).wrapping_add(symbol.st_value);
        }
        UNRESOLVED
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::symbol::SHN_UNDEF;
    use crate::host::{ExportedSymbol, HostBuffer};
    use crate::section::Section;

    fn symbol(st_value: u32, st_shndx: u16) -> ElfSymbol {
        ElfSymbol {
            st_name: 1,
            st_value,
            st_size: 0,
            st_bind: None,
            st_type: None,
            st_shndx,
        }
    }

    #[test]
    fn host_export_takes_precedence_over_in_image_definition() {
        let exports = [ExportedSymbol {
            name: "task_main",
            address: 0xdead_beef,
        }];
        let resolver = SymbolResolver::new(ExportedSymbolTable::new(&exports));

        let mut sections = SectionTable::new();
        sections.add(Section {
            original_index: 1,
            data: HostBuffer::zeroed(16),
            rela_index: None,
        });

        let sym = symbol(4, 1);
        assert_eq!(
            resolver.resolve(&sym, "task_main", &sections),
            0xdead_beef
        );
    }

    #[test]
    fn falls_back_to_in_image_definition() {
        let resolver = SymbolResolver::new(ExportedSymbolTable::new(&[]));
        let mut sections = SectionTable::new();
        sections.add(Section {
            original_index: 2,
            data: HostBuffer::zeroed(16),
            rela_index: None,
        });
        let base = sections.find(2).unwrap().base_address() as u32;

        let sym = symbol(8, 2);
        assert_eq!(resolver.resolve(&sym, "local_fn", &sections), base + 8);
    }

    #[test]
    fn unresolved_when_neither_applies() {
        let resolver = SymbolResolver::new(ExportedSymbolTable::new(&[]));
        let sections = SectionTable::new();
        let sym = symbol(0, SHN_UNDEF);
        assert_eq!(resolver.resolve(&sym, "missing", &sections), UNRESOLVED);
    }
}
