// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-page entry records as exposed by the process pagemap.
//!
//! One 64-bit record per virtual page: a present flag in the top bit, the
//! backing frame number in the low 55 bits, and a handful of informational
//! flags in between. The decode is explicit masking and shifting so the
//! boundary between the flag bits and the PFN field stays independently
//! testable.

use bitflags::bitflags;

use crate::addr::PageFrame;

/// Size in bytes of one entry record in the source stream.
pub const RECORD_SIZE: u64 = 8;

/// Mask selecting the frame-number field (bits 0-54).
const PFN_MASK: u64 = (1 << 55) - 1;

bitflags! {
    /// Flag bits carried by a pagemap entry (bits 55-63).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EntryFlags: u64 {
        /// Page is resident in memory.
        const PRESENT = 1 << 63;
        /// Page is backed by a swap slot.
        const SWAPPED = 1 << 62;
        /// File-backed or shared-anonymous page.
        const FILE_SHARED = 1 << 61;
        /// Page is mapped exclusively by this process.
        const EXCLUSIVE = 1 << 56;
        /// Soft-dirty tracking bit.
        const SOFT_DIRTY = 1 << 55;
    }
}

/// A decoded view over one 64-bit pagemap record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct PagemapEntry(u64);

impl PagemapEntry {
    /// Wraps a raw 64-bit record.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw record value.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Returns the flag bits of this entry.
    #[inline]
    pub const fn flags(self) -> EntryFlags {
        EntryFlags::from_bits_truncate(self.0)
    }

    /// Whether the page is resident.
    #[inline]
    pub const fn is_present(self) -> bool {
        self.0 & EntryFlags::PRESENT.bits() != 0
    }

    /// Returns the backing frame, or `None` for a non-resident page.
    ///
    /// **Invariant**: when the present bit is clear the PFN field carries no
    /// meaning, so the low bits are never exposed regardless of their value.
    #[inline]
    pub fn frame(self) -> Option<PageFrame> {
        if self.is_present() {
            Some(PageFrame::from_raw(self.0 & PFN_MASK))
        } else {
            None
        }
    }
}
