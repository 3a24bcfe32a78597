// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Entry sources: the seek-and-read collaborators behind the table resolver.
//!
//! An entry source is a byte-addressable stream of fixed-size records, one
//! per virtual page, indexed by page number. The core only needs "seek to
//! `index * 8`, read 8 bytes"; everything else (which process, which file,
//! which transport) belongs to the implementation.

#[cfg(target_os = "linux")]
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::entry::{PagemapEntry, RECORD_SIZE};

/// Failures while fetching an entry record.
///
/// Distinct from an unmapped page: a source error means the determination
/// could not be made at all, and it aborts the surrounding walk.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Seek or read failed (permissions, process exit, transport loss).
    #[error("entry read failed: {0}")]
    Io(#[from] io::Error),
    /// The stream ended before a full record was returned.
    #[error("short read: got {got} of {RECORD_SIZE} bytes")]
    ShortRead {
        /// Bytes actually returned.
        got: usize,
    },
    /// The record index does not fit the source's addressable range.
    #[error("entry index {0} out of range for this source")]
    BadIndex(u64),
}

/// A queryable stream of per-page entry records.
pub trait EntrySource {
    /// Reads the 64-bit record for the page at `index`.
    fn read_entry(&mut self, index: u64) -> Result<PagemapEntry, SourceError>;
}

impl<S: EntrySource + ?Sized> EntrySource for &mut S {
    fn read_entry(&mut self, index: u64) -> Result<PagemapEntry, SourceError> {
        (**self).read_entry(index)
    }
}

/// Entry source over any seekable byte stream, 8 bytes per record.
///
/// Records are read little-endian, matching the process pagemap layout.
pub struct FileEntrySource<R> {
    inner: R,
}

impl<R: Read + Seek> FileEntrySource<R> {
    /// Wraps a seekable stream of packed 8-byte records.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consumes the source and returns the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> EntrySource for FileEntrySource<R> {
    fn read_entry(&mut self, index: u64) -> Result<PagemapEntry, SourceError> {
        let offset = index
            .checked_mul(RECORD_SIZE)
            .ok_or(SourceError::BadIndex(index))?;
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; RECORD_SIZE as usize];
        let mut got = 0;
        while got < buf.len() {
            match self.inner.read(&mut buf[got..]) {
                Ok(0) => return Err(SourceError::ShortRead { got }),
                Ok(n) => got += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SourceError::Io(e)),
            }
        }
        Ok(PagemapEntry::from_raw(u64::from_le_bytes(buf)))
    }
}

/// An entry source shared between walks, serialising each seek+read pair.
///
/// There is no atomic seek-and-read primitive, so a handle shared across
/// threads must hold the lock for the whole pair; nothing may reposition the
/// stream in between.
pub struct SharedEntrySource<R> {
    inner: Arc<Mutex<FileEntrySource<R>>>,
}

impl<R: Read + Seek> SharedEntrySource<R> {
    /// Wraps a stream for shared use.
    pub fn new(inner: R) -> Self {
        Self { inner: Arc::new(Mutex::new(FileEntrySource::new(inner))) }
    }
}

impl<R> Clone for SharedEntrySource<R> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<R: Read + Seek> EntrySource for SharedEntrySource<R> {
    fn read_entry(&mut self, index: u64) -> Result<PagemapEntry, SourceError> {
        self.inner.lock().read_entry(index)
    }
}

/// Opens the pagemap of the current process.
#[cfg(target_os = "linux")]
pub fn self_pagemap() -> io::Result<FileEntrySource<File>> {
    let file = File::open("/proc/self/pagemap")?;
    Ok(FileEntrySource::new(file))
}

/// Opens the pagemap of an arbitrary process.
///
/// Requires the same ptrace-style privileges the kernel demands for reading
/// another process's pagemap.
#[cfg(target_os = "linux")]
pub fn pagemap_for(pid: u32) -> io::Result<FileEntrySource<File>> {
    let file = File::open(format!("/proc/{pid}/pagemap"))?;
    Ok(FileEntrySource::new(file))
}
