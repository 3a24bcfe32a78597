// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Address newtypes and page-granularity helpers.
//!
//! Virtual and physical addresses share a 64-bit representation but are kept
//! as distinct types so a translation can never silently reinterpret one as
//! the other.

use core::fmt;

/// Size of a single translation page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Number of offset bits inside a page.
pub const PAGE_SHIFT: usize = 12;

/// A virtual address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(u64);

impl VirtAddr {
    /// Creates a virtual address from a raw value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw address value.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Returns the offset of this address inside its page.
    #[inline]
    pub const fn page_offset(self) -> u64 {
        self.0 % PAGE_SIZE as u64
    }

    /// Returns the virtual page number (`va / PAGE_SIZE`).
    #[inline]
    pub const fn page_number(self) -> u64 {
        self.0 >> PAGE_SHIFT
    }

    /// Rounds the address down to its page boundary.
    #[inline]
    pub const fn align_down(self) -> Self {
        Self(self.0 & !(PAGE_SIZE as u64 - 1))
    }

    /// Rounds the address up to the next page boundary, or `None` on
    /// overflow.
    #[inline]
    pub fn align_up(self) -> Option<Self> {
        self.0
            .checked_next_multiple_of(PAGE_SIZE as u64)
            .map(Self)
    }

    /// Returns `self + bytes`, or `None` on overflow.
    #[inline]
    pub fn checked_add(self, bytes: u64) -> Option<Self> {
        self.0.checked_add(bytes).map(Self)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A physical address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    /// Creates a physical address from a raw value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw address value.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A physical page frame number (PFN).
///
/// **Invariant**: `base()` is the only way back to a [`PhysAddr`]; frame
/// numbers never mix with byte addresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PageFrame(u64);

impl PageFrame {
    /// Creates a frame from a raw PFN.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw PFN.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Returns the physical address of the first byte of this frame.
    ///
    /// Saturates rather than wrapping if the PFN is implausibly large; a
    /// 55-bit PFN shifted by 12 still fits in 64 bits, so decoded pagemap
    /// frames never hit the saturation path.
    #[inline]
    pub fn base(self) -> PhysAddr {
        PhysAddr(self.0.saturating_mul(PAGE_SIZE as u64))
    }
}

impl fmt::Display for PageFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
