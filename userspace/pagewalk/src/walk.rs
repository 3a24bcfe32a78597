// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The region walker: steps a region page by page through one resolver.
//!
//! The walk visits `ceil(len / PAGE_SIZE)` pages in strictly ascending
//! address order, resolving each one synchronously before moving on. It is
//! purely observational; the region is never mutated. A resolver failure
//! aborts the walk with no mappings delivered — partial output would blur
//! "no physical backing" into "could not determine".

use std::io;

use thiserror::Error;

use crate::addr::VirtAddr;
use crate::region::Region;
use crate::report::ReportSink;
use crate::resolve::{DescriptorTable, DirectMap, ResolveError, Resolver, Translation};
use crate::source::EntrySource;

/// One page's worth of walk output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageMapping {
    /// Page-aligned virtual address of the page.
    pub va: VirtAddr,
    /// Outcome of the translation.
    pub translation: Translation,
}

/// Errors surfaced by the streaming walk.
#[derive(Debug, Error)]
pub enum WalkError {
    /// A page could not be resolved; the walk was aborted.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The report sink rejected a record.
    #[error("report sink failed: {0}")]
    Report(#[from] io::Error),
}

/// Walks `region` with `resolver`, collecting one mapping per page.
///
/// The result sequence is deterministic and repeatable for unchanged
/// resolver state; walking twice yields identical sequences. On error no
/// mappings are returned.
pub fn walk(region: &Region, resolver: &mut Resolver<'_>) -> Result<Vec<PageMapping>, ResolveError> {
    log::debug!(
        target: "walk",
        "walking {} region: base={} pages={}",
        region.kind(),
        region.base(),
        region.page_count()
    );
    let mut mappings = Vec::with_capacity(region.page_count() as usize);
    for va in region.pages() {
        let translation = resolver.resolve(va)?;
        log::trace!(target: "walk", "va={va} -> {translation:?}");
        mappings.push(PageMapping { va, translation });
    }
    Ok(mappings)
}

/// Streaming variant of [`walk`]: hands each mapping to `sink` as it is
/// produced and returns the number of pages reported.
///
/// Resolver errors abort before the failing page is reported; records
/// already handed to the sink stay delivered.
pub fn walk_into(
    region: &Region,
    resolver: &mut Resolver<'_>,
    sink: &mut dyn ReportSink,
) -> Result<usize, WalkError> {
    let mut reported = 0;
    for va in region.pages() {
        let translation = resolver.resolve(va)?;
        sink.record(&PageMapping { va, translation })?;
        reported += 1;
    }
    Ok(reported)
}

/// Walks a direct-mapped region. Entry point for the control surface.
pub fn walk_direct(region: &Region, map: &DirectMap) -> Result<Vec<PageMapping>, ResolveError> {
    walk(region, &mut Resolver::DirectMap(map.clone()))
}

/// Walks a scattered region against a descriptor table.
pub fn walk_scattered(
    region: &Region,
    table: &dyn DescriptorTable,
) -> Result<Vec<PageMapping>, ResolveError> {
    walk(region, &mut Resolver::Scattered(table))
}

/// Walks a user-heap region against a per-process entry source.
pub fn walk_table(
    region: &Region,
    source: &mut dyn EntrySource,
) -> Result<Vec<PageMapping>, ResolveError> {
    walk(region, &mut Resolver::Table(source))
}
