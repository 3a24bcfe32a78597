// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![deny(clippy::all, missing_docs)]

//! CONTEXT: Page-granular virtual-to-physical translation over pluggable resolvers
//! OWNERS: @runtime
//! PUBLIC API: VirtAddr, PhysAddr, PageFrame, PagemapEntry, Region, Resolver, walk
//! INVARIANTS: translations are page-aligned; absence is data, never a sentinel PA
//!
//! The crate answers one question: given a virtual address and the allocation
//! strategy it came from, which physical frame backs it? Three resolver kinds
//! cover the strategies (linear direct map, physically scattered pages, and a
//! queryable per-process entry table); a single region walker steps any of
//! them page by page and reports `(VA, PA-or-unmapped)` pairs in order.
//!
//! Hosts supply the lookup machinery as collaborators: an offset constant for
//! the direct map, a [`DescriptorTable`] for scattered pages, and an
//! [`EntrySource`] (seek + 8-byte read) for the entry table. The walker never
//! owns the memory it describes.

pub mod addr;
pub mod entry;
pub mod region;
pub mod report;
pub mod resolve;
pub mod source;
pub mod walk;

pub use addr::{PhysAddr, PageFrame, VirtAddr, PAGE_SHIFT, PAGE_SIZE};
pub use entry::{EntryFlags, PagemapEntry};
pub use region::{AllocError, BackingKind, HeapRegion, Region};
pub use report::{LineWriter, ReportSink};
pub use resolve::{DescriptorTable, DirectMap, PageDescriptor, ResolveError, Resolver, Translation};
pub use source::{EntrySource, FileEntrySource, SharedEntrySource, SourceError};
pub use walk::{walk, walk_direct, walk_into, walk_scattered, walk_table, PageMapping, WalkError};
