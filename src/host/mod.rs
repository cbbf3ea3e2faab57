//! Abstract interfaces the embedding host implements: the byte-addressable
//! image, the executable/data memory allocators, and the exported-symbol
//! table. The loader never assumes a concrete backing for any of these.

use std::ops::{Deref, DerefMut};

use crate::base::ByteView;
use crate::error::{AllocKind, Error, Result};

/// A byte-addressable source of the object file being loaded.
///
/// The loader never mutates an `Image` and never assumes it is a flat,
/// directly-addressable buffer: a host may back this with a flash-mapped
/// region, a heap buffer, or a streamed read from storage.
pub trait Image {
    /// Copy `dest.len()` bytes from the image at `offset` into `dest`.
    fn read(&self, offset: usize, dest: &mut [u8]) -> Result<()>;
}

impl Image for [u8] {
    fn read(&self, offset: usize, dest: &mut [u8]) -> Result<()> {
        let end = offset
            .checked_add(dest.len())
            .filter(|&end| end <= self.len())
            .ok_or(Error::ImageReadError {
                offset,
                len: dest.len(),
            })?;
        dest.copy_from_slice(&self[offset..end]);
        Ok(())
    }
}

impl Image for Vec<u8> {
    fn read(&self, offset: usize, dest: &mut [u8]) -> Result<()> {
        self.as_slice().read(offset, dest)
    }
}

/// A chunk of host-allocated memory owned by exactly one [`crate::section::Section`].
///
/// Construction is the allocator's responsibility ([`HostBuffer::zeroed`] for
/// a plain heap buffer, [`HostBuffer::from_raw`] for memory obtained through
/// an FFI capability such as ESP-IDF's `heap_caps_malloc`). Either way,
/// dropping a `HostBuffer` releases the memory exactly once: this is the
/// Rust-native replacement for an explicit `free()` call, and it is what
/// lets [`crate::section::SectionTable`] and [`crate::loader::LoaderContext`]
/// rely on ordinary drop order instead of hand-written teardown.
pub struct HostBuffer {
    storage: Storage,
}

enum Storage {
    Boxed(Box<[u8]>),
    Raw {
        ptr: *mut u8,
        len: usize,
        free: unsafe fn(*mut u8),
    },
}

impl HostBuffer {
    /// Wrap a heap-allocated, zero-initialized buffer of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            storage: Storage::Boxed(vec![0u8; size].into_boxed_slice()),
        }
    }

    /// Take ownership of a raw buffer obtained from a host capability, to
    /// be released with `free` on drop.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for as long
    /// as the returned `HostBuffer` (and anything it is moved into) is
    /// alive, and `free` must be the correct release function for memory
    /// obtained the way `ptr` was.
    pub unsafe fn from_raw(ptr: *mut u8, len: usize, free: unsafe fn(*mut u8)) -> Self {
        Self {
            storage: Storage::Raw { ptr, len, free },
        }
    }

    /// Raw base address of this buffer, for use in relocation arithmetic
    /// and for invoking the entry point.
    pub fn address(&self) -> usize {
        self.as_slice().as_ptr() as usize
    }

    fn as_slice(&self) -> &[u8] {
        match &self.storage {
            Storage::Boxed(b) => b,
            // SAFETY: constructor requires `ptr`/`len` stay valid for the
            // lifetime of this buffer.
            Storage::Raw { ptr, len, .. } => unsafe { std::slice::from_raw_parts(*ptr, *len) },
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Boxed(b) => b,
            // SAFETY: see `as_slice`.
            Storage::Raw { ptr, len, .. } => unsafe {
                std::slice::from_raw_parts_mut(*ptr, *len)
            },
        }
    }
}

impl Deref for HostBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for HostBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl ByteView for HostBuffer {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get8(&self, offset: usize) -> Result<u8> {
        <[u8] as ByteView>::get8(self.as_slice(), offset)
    }

    fn set8(&mut self, offset: usize, value: u8) -> Result<()> {
        <[u8] as ByteView>::set8(self.as_mut_slice(), offset, value)
    }
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        if let Storage::Raw { ptr, free, .. } = self.storage {
            // SAFETY: constructor requires `free` be the correct release
            // function for `ptr`, and a `HostBuffer` is only ever dropped
            // once.
            unsafe { free(ptr) }
        }
    }
}

/// Allocator for executable memory, supplied by the host.
pub trait ExecAllocator {
    /// Allocate `size` bytes of memory the CPU is permitted to execute.
    /// Returns `None` on OOM.
    fn alloc_exec(&mut self, size: usize) -> Option<HostBuffer>;
}

/// Allocator for ordinary (non-executable) data memory, supplied by the host.
pub trait DataAllocator {
    /// Allocate `size` bytes of ordinary data memory. Returns `None` on OOM.
    fn alloc_data(&mut self, size: usize) -> Option<HostBuffer>;
}

pub(crate) fn alloc_exec_or_err(
    allocator: &mut dyn ExecAllocator,
    size: usize,
) -> Result<HostBuffer> {
    allocator.alloc_exec(size).ok_or(Error::AllocFailed {
        kind: AllocKind::Exec,
        size,
    })
}

pub(crate) fn alloc_data_or_err(
    allocator: &mut dyn DataAllocator,
    size: usize,
) -> Result<HostBuffer> {
    allocator.alloc_data(size).ok_or(Error::AllocFailed {
        kind: AllocKind::Data,
        size,
    })
}

/// A single `(name, address)` binding the host makes available to loaded
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportedSymbol<'a> {
    /// The symbol's name, matched by exact byte equality.
    pub name: &'a str,
    /// The symbol's absolute address.
    pub address: usize,
}

/// The finite, read-only, unordered set of symbols the host exports to
/// loaded code.
#[derive(Debug, Clone, Copy)]
pub struct ExportedSymbolTable<'a> {
    symbols: &'a [ExportedSymbol<'a>],
}

impl<'a> ExportedSymbolTable<'a> {
    /// Wrap a flat slice of exported symbols. Names are assumed unique;
    /// if a name appears twice, the first match wins.
    pub fn new(symbols: &'a [ExportedSymbol<'a>]) -> Self {
        Self { symbols }
    }

    /// Look up `name` by exact byte equality.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.symbols
            .iter()
            .find(|symbol| symbol.name == name)
            .map(|symbol| symbol.address)
    }
}
