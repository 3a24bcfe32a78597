// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Region descriptors and the owned heap allocations used to exercise them.
//!
//! A [`Region`] is an ownership-free view: it names a span of virtual memory
//! and the allocation strategy it came from, nothing more. The walker only
//! reads through it and must never outlive the caller-managed backing.
//! [`HeapRegion`] is the owning counterpart used by tools and tests.

use core::fmt;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

use thiserror::Error;

use crate::addr::{VirtAddr, PAGE_SIZE};

/// The allocation strategy a region was obtained through.
///
/// The strategy decides which resolver kind can translate the region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackingKind {
    /// Physically contiguous memory inside a linear direct-map window.
    DirectMap,
    /// Virtually contiguous but physically scattered pages.
    Scattered,
    /// Demand-paged user heap memory, translated via the entry table.
    UserHeap,
}

impl fmt::Display for BackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DirectMap => "direct-map",
            Self::Scattered => "scattered",
            Self::UserHeap => "user-heap",
        };
        f.write_str(name)
    }
}

/// An ownership-free descriptor of a walkable memory span.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Region {
    base: VirtAddr,
    len: u64,
    kind: BackingKind,
}

impl Region {
    /// Describes `len` bytes starting at `base`.
    #[inline]
    pub const fn new(base: VirtAddr, len: u64, kind: BackingKind) -> Self {
        Self { base, len, kind }
    }

    /// Returns the (unaligned) base address.
    #[inline]
    pub const fn base(self) -> VirtAddr {
        self.base
    }

    /// Returns the length in bytes as given by the caller.
    #[inline]
    pub const fn len(self) -> u64 {
        self.len
    }

    /// Whether the region covers zero bytes.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns the allocation strategy behind the region.
    #[inline]
    pub const fn kind(self) -> BackingKind {
        self.kind
    }

    /// Number of pages a walk over this region visits: `ceil(len / PAGE_SIZE)`.
    #[inline]
    pub const fn page_count(self) -> u64 {
        self.len.div_ceil(PAGE_SIZE as u64)
    }

    /// Iterates the page-aligned virtual addresses of the region in
    /// ascending order, starting from the base rounded down to a page
    /// boundary.
    pub fn pages(self) -> impl Iterator<Item = VirtAddr> {
        let start = self.base.align_down();
        (0..self.page_count())
            .map_while(move |index| start.checked_add(index * PAGE_SIZE as u64))
    }

    /// Faults every page of the region in by touching one byte per page.
    ///
    /// Demand-paged allocations have no frame until written; this optional
    /// pre-walk step forces residency without changing contents (each byte is
    /// read and written back through volatile accesses).
    ///
    /// # Safety
    ///
    /// The region must describe live, readable and writable memory of the
    /// current process for its whole span.
    pub unsafe fn touch(self) {
        for va in self.pages() {
            let ptr = va.as_raw() as *mut u8;
            let byte = core::ptr::read_volatile(ptr);
            core::ptr::write_volatile(ptr, byte);
        }
    }
}

/// Region allocation failed before any walk began.
#[derive(Debug, Error)]
pub enum AllocError {
    /// The allocator returned no memory for the requested span.
    #[error("allocation of {0} bytes failed")]
    Exhausted(u64),
    /// The requested size cannot be expressed as a layout.
    #[error("invalid allocation size: {0}")]
    InvalidSize(u64),
}

/// An owned, page-aligned, zero-initialised heap allocation.
///
/// Used by the control surface and the tests to obtain regions with a known
/// lifetime. The span constructor mirrors the single-big-block mode of the
/// original diagnostics tool; [`HeapRegion::blocks`] mirrors the
/// many-small-blocks mode, with each block exactly one page.
pub struct HeapRegion {
    ptr: NonNull<u8>,
    layout: Layout,
    len: u64,
}

impl HeapRegion {
    /// Allocates one contiguous zeroed span, rounded up to whole pages.
    pub fn span(bytes: u64) -> Result<Self, AllocError> {
        if bytes == 0 {
            return Err(AllocError::InvalidSize(0));
        }
        let rounded = bytes
            .checked_next_multiple_of(PAGE_SIZE as u64)
            .ok_or(AllocError::InvalidSize(bytes))?;
        let size = usize::try_from(rounded).map_err(|_| AllocError::InvalidSize(bytes))?;
        let layout =
            Layout::from_size_align(size, PAGE_SIZE).map_err(|_| AllocError::InvalidSize(bytes))?;
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(AllocError::Exhausted(rounded))?;
        log::trace!(target: "walk", "allocated span of {rounded} bytes");
        Ok(Self { ptr, layout, len: rounded })
    }

    /// Allocates `pages` independent one-page blocks.
    ///
    /// The blocks are not virtually contiguous; each is its own one-page
    /// region and is translated on its own.
    pub fn blocks(pages: u64) -> Result<Vec<Self>, AllocError> {
        if pages == 0 {
            return Err(AllocError::InvalidSize(0));
        }
        let mut blocks = Vec::with_capacity(pages as usize);
        for _ in 0..pages {
            blocks.push(Self::span(PAGE_SIZE as u64)?);
        }
        Ok(blocks)
    }

    /// Returns the virtual base address of the allocation.
    #[inline]
    pub fn base(&self) -> VirtAddr {
        VirtAddr::from_raw(self.ptr.as_ptr() as u64)
    }

    /// Returns the allocated length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the allocation is empty (never true for a live value).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Describes the allocation as a walkable region.
    #[inline]
    pub fn region(&self, kind: BackingKind) -> Region {
        Region::new(self.base(), self.len, kind)
    }

    /// Faults every page of the allocation in.
    pub fn touch(&mut self) {
        // SAFETY: the allocation is live, writable, and spans `len` bytes.
        unsafe { self.region(BackingKind::UserHeap).touch() }
    }
}

impl Drop for HeapRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/layout come from alloc_zeroed in span().
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}
