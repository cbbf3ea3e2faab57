//! The in-memory catalog of a loaded object's allocatable sections.

use crate::base::ByteView;
use crate::host::HostBuffer;

/// A single allocated, in-memory section.
pub struct Section {
    /// This section's index in the source file's section header table.
    pub original_index: u16,
    /// Owned, contiguous memory backing this section: executable memory
    /// if the section had `SHF_EXECINSTR` set, ordinary data memory
    /// otherwise.
    pub data: HostBuffer,
    /// Index of the companion RELA section whose entries target this
    /// section, if any.
    pub rela_index: Option<u16>,
}

impl Section {
    /// This section's loaded base address.
    pub fn base_address(&self) -> usize {
        self.data.address()
    }

    /// Size in bytes of this section's buffer.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// The catalog of every allocatable section loaded for one object.
///
/// The catalog is small in practice (tens of entries), so lookup by
/// original index is a linear scan rather than an index. Dropping a
/// `SectionTable` drops every owned [`HostBuffer`] in turn, releasing all
/// section memory, which is what `free_all` does explicitly for callers
/// that want to name the operation.
#[derive(Default)]
pub struct SectionTable {
    sections: Vec<Section>,
}

impl SectionTable {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `section`, taking ownership of its buffer.
    pub fn add(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Find the loaded section whose `original_index` matches, if any.
    pub fn find(&self, original_index: u16) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.original_index == original_index)
    }

    /// Find the loaded section whose `original_index` matches, mutably.
    pub fn find_mut(&mut self, original_index: u16) -> Option<&mut Section> {
        self.sections
            .iter_mut()
            .find(|section| section.original_index == original_index)
    }

    /// Iterate over every loaded section.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Number of loaded sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True if no sections were loaded (e.g. an object with only the null
    /// section).
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Release every owned buffer and forget every entry. Equivalent to
    /// dropping and replacing `self`; provided explicitly so callers can
    /// name the spec operation.
    pub fn free_all(&mut self) {
        self.sections.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn section(original_index: u16, size: usize) -> Section {
        Section {
            original_index,
            data: HostBuffer::zeroed(size),
            rela_index: None,
        }
    }

    #[test]
    fn find_returns_the_unique_match() {
        let mut table = SectionTable::new();
        table.add(section(1, 16));
        table.add(section(2, 32));
        assert_eq!(table.find(2).unwrap().size(), 32);
        assert!(table.find(3).is_none());
    }

    #[test]
    fn free_all_drops_every_buffer() {
        let mut table = SectionTable::new();
        table.add(section(1, 16));
        table.free_all();
        assert!(table.is_empty());
        assert!(table.find(1).is_none());
    }
}
