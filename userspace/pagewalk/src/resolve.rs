// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The three per-page resolvers behind one tagged dispatch.
//!
//! A resolver answers "which physical frame backs this virtual address" for
//! exactly one allocation strategy. The kinds are a closed set chosen at
//! walk-construction time, so [`Resolver`] is an enum dispatched once per
//! page rather than a trait hierarchy; the host-supplied lookup machinery
//! behind the scattered and table variants stays pluggable through the
//! [`DescriptorTable`] and [`EntrySource`] collaborator traits.

use core::ops::Range;

use thiserror::Error;

use crate::addr::{PageFrame, PhysAddr, VirtAddr};
use crate::source::{EntrySource, SourceError};

/// The per-page outcome of a translation.
///
/// Absence is a successful, negative determination and is modelled as data;
/// it is never conflated with a failure to determine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Translation {
    /// The page is backed by physical memory at this address.
    Mapped(PhysAddr),
    /// The page has no physical backing.
    Unmapped,
}

/// Errors surfaced while resolving a page.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The address lies outside the resolver's valid domain.
    #[error("address {0} outside the direct-map window")]
    OutOfRange(VirtAddr),
    /// The entry source could not be read; no determination was made.
    #[error("entry source failed: {0}")]
    Source(#[from] SourceError),
}

/// Linear-transform resolver for memory inside a direct-map window.
///
/// Translation is a fixed offset subtraction; direct-mapped memory is
/// physically backed by construction, so this resolver has no unmapped
/// outcome. Addresses outside the window are rejected instead of silently
/// producing a wrong physical address.
#[derive(Clone, Debug)]
pub struct DirectMap {
    offset: u64,
    window: Range<u64>,
}

impl DirectMap {
    /// Creates a resolver for the window starting at `offset`.
    ///
    /// The offset is the host-provided linear displacement between the
    /// direct-mapped virtual window and physical memory. Until narrowed with
    /// [`DirectMap::with_window`], every address at or above the offset is
    /// considered in-window.
    pub fn new(offset: u64) -> Self {
        Self { offset, window: offset..u64::MAX }
    }

    /// Restricts the valid virtual window to `base..base + len`.
    pub fn with_window(offset: u64, base: VirtAddr, len: u64) -> Self {
        let start = base.as_raw().max(offset);
        let end = base.as_raw().saturating_add(len);
        Self { offset, window: start..end }
    }

    /// Returns the configured displacement.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Translates `va` by offset subtraction.
    pub fn resolve(&self, va: VirtAddr) -> Result<Translation, ResolveError> {
        if !self.window.contains(&va.as_raw()) {
            return Err(ResolveError::OutOfRange(va));
        }
        let pa = va
            .as_raw()
            .checked_sub(self.offset)
            .ok_or(ResolveError::OutOfRange(va))?;
        Ok(Translation::Mapped(PhysAddr::from_raw(pa)))
    }
}

/// The page-metadata record backing one scattered page.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageDescriptor {
    frame: PageFrame,
}

impl PageDescriptor {
    /// Creates a descriptor for the given backing frame.
    #[inline]
    pub const fn new(frame: PageFrame) -> Self {
        Self { frame }
    }

    /// Returns the physical frame backing the described page.
    #[inline]
    pub const fn frame(self) -> PageFrame {
        self.frame
    }
}

/// Host-provided lookup from virtual addresses to page descriptors.
///
/// The analogue of a `vmalloc_to_page`-style query: scattered allocations
/// are virtually contiguous but each page's frame must be looked up
/// individually. A `None` result is the legitimate "never faulted in"
/// outcome, not an error.
pub trait DescriptorTable {
    /// Returns the descriptor owning `va`, if one exists.
    fn descriptor_of(&self, va: VirtAddr) -> Option<PageDescriptor>;
}

impl<T: DescriptorTable + ?Sized> DescriptorTable for &T {
    fn descriptor_of(&self, va: VirtAddr) -> Option<PageDescriptor> {
        (**self).descriptor_of(va)
    }
}

fn frame_address(frame: PageFrame, va: VirtAddr) -> PhysAddr {
    // Frame base plus in-page offset. A 55-bit PFN shifted by 12 can nominally
    // exceed 64 bits; saturate instead of wrapping so a garbage entry cannot
    // alias a small physical address.
    PhysAddr::from_raw(frame.base().as_raw().saturating_add(va.page_offset()))
}

fn resolve_scattered(table: &dyn DescriptorTable, va: VirtAddr) -> Translation {
    match table.descriptor_of(va) {
        Some(descriptor) => Translation::Mapped(frame_address(descriptor.frame(), va)),
        None => Translation::Unmapped,
    }
}

fn resolve_table(
    source: &mut dyn EntrySource,
    va: VirtAddr,
) -> Result<Translation, ResolveError> {
    let entry = source.read_entry(va.page_number())?;
    match entry.frame() {
        Some(frame) => Ok(Translation::Mapped(frame_address(frame, va))),
        None => Ok(Translation::Unmapped),
    }
}

/// A translation capability for one allocation strategy.
///
/// The variant is fixed for the lifetime of a walk.
pub enum Resolver<'a> {
    /// Offset subtraction inside a direct-map window.
    DirectMap(DirectMap),
    /// Per-page descriptor lookup for scattered allocations.
    Scattered(&'a dyn DescriptorTable),
    /// Per-page entry-table read for user heap memory.
    Table(&'a mut dyn EntrySource),
}

impl Resolver<'_> {
    /// Resolves a single page-granular virtual address.
    pub fn resolve(&mut self, va: VirtAddr) -> Result<Translation, ResolveError> {
        match self {
            Self::DirectMap(map) => map.resolve(va),
            Self::Scattered(table) => Ok(resolve_scattered(&**table, va)),
            Self::Table(source) => resolve_table(&mut **source, va),
        }
    }
}
