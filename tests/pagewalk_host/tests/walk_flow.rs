// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: End-to-end walks over all three resolver kinds
//! OWNERS: @runtime
//! STATUS: Functional
//!
//! TEST_SCOPE:
//!   - Walk length and strict ordering for page-granular regions
//!   - Direct-map offset subtraction and window rejection
//!   - Scattered lookup misses reported per page, not fatal
//!   - Table-entry decode through a file-backed entry source
//!   - Source failure aborts a walk with zero results
//!   - Shared entry source across threads
//!   - Live pagemap smoke test on Linux hosts

use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};
use std::thread;

use nexus_pagewalk::{
    walk_direct, walk_scattered, walk_table, BackingKind, DescriptorTable, DirectMap, EntrySource,
    FileEntrySource, LineWriter, PageDescriptor, PageFrame, PageMapping, PhysAddr, Region,
    ReportSink, ResolveError, Resolver, SharedEntrySource, SourceError, Translation, VirtAddr,
    PAGE_SIZE,
};

struct FixtureTable {
    frames: HashMap<u64, PageFrame>,
}

impl FixtureTable {
    fn new(entries: &[(u64, u64)]) -> Self {
        let frames = entries
            .iter()
            .map(|(va, pfn)| (*va, PageFrame::from_raw(*pfn)))
            .collect();
        Self { frames }
    }
}

impl DescriptorTable for FixtureTable {
    fn descriptor_of(&self, va: VirtAddr) -> Option<PageDescriptor> {
        self.frames
            .get(&va.align_down().as_raw())
            .map(|frame| PageDescriptor::new(*frame))
    }
}

fn pagemap_file(entries: &[u64]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    for raw in entries {
        file.write_all(&raw.to_le_bytes()).expect("write entry");
    }
    file.as_file_mut()
        .seek(SeekFrom::Start(0))
        .expect("rewind");
    file
}

#[test]
fn test_direct_map_canonical_two_pages() {
    let map = DirectMap::new(0x1000);
    let region = Region::new(VirtAddr::from_raw(0x2000), 8192, BackingKind::DirectMap);
    let mappings = walk_direct(&region, &map).expect("walk");
    assert_eq!(
        mappings,
        vec![
            PageMapping {
                va: VirtAddr::from_raw(0x2000),
                translation: Translation::Mapped(PhysAddr::from_raw(0x1000)),
            },
            PageMapping {
                va: VirtAddr::from_raw(0x3000),
                translation: Translation::Mapped(PhysAddr::from_raw(0x2000)),
            },
        ]
    );
}

#[test]
fn test_walk_count_and_order_hold_for_odd_lengths() {
    let map = DirectMap::new(0);
    for len in [1u64, 4095, 4096, 4097, 40960, 65536 + 17] {
        let region = Region::new(VirtAddr::from_raw(0x50_0000), len, BackingKind::DirectMap);
        let mappings = walk_direct(&region, &map).expect("walk");
        assert_eq!(mappings.len() as u64, len.div_ceil(PAGE_SIZE as u64));
        assert!(mappings.windows(2).all(|w| w[0].va < w[1].va));
    }
}

#[test]
fn test_direct_map_out_of_window_rejected_not_mistranslated() {
    let map = DirectMap::with_window(0x10_0000, VirtAddr::from_raw(0x10_0000), 0x4000);
    let outside = Region::new(VirtAddr::from_raw(0x20_0000), 4096, BackingKind::DirectMap);
    assert!(matches!(
        walk_direct(&outside, &map),
        Err(ResolveError::OutOfRange(_))
    ));
}

#[test]
fn test_scattered_walk_reports_misses_per_page() {
    // Pages 0 and 2 of the region are backed, page 1 was never faulted in.
    let base = 0x7000_0000u64;
    let table = FixtureTable::new(&[(base, 0x100), (base + 2 * 4096, 0x2FF)]);
    let region = Region::new(VirtAddr::from_raw(base), 3 * 4096, BackingKind::Scattered);
    let mappings = walk_scattered(&region, &table).expect("walk");
    assert_eq!(
        mappings[0].translation,
        Translation::Mapped(PhysAddr::from_raw(0x100 * 4096))
    );
    assert_eq!(mappings[1].translation, Translation::Unmapped);
    assert_eq!(
        mappings[2].translation,
        Translation::Mapped(PhysAddr::from_raw(0x2FF * 4096))
    );
}

#[test]
fn test_table_walk_decodes_present_and_absent_entries() {
    // Index 1: present in frame 5. Index 2: absent with stale low bits.
    let file = pagemap_file(&[0, 0x8000_0000_0000_0005, 0x0000_0000_0000_0009]);
    let mut source = FileEntrySource::new(file.reopen().expect("reopen"));
    let region = Region::new(VirtAddr::from_raw(0x1000), 2 * 4096, BackingKind::UserHeap);
    let mappings = walk_table(&region, &mut source).expect("walk");
    assert_eq!(
        mappings[0].translation,
        Translation::Mapped(PhysAddr::from_raw(0x5000))
    );
    assert_eq!(mappings[1].translation, Translation::Unmapped);
}

#[test]
fn test_table_walk_survives_arbitrary_in_region_offsets() {
    // A region whose base is mid-page still walks aligned pages.
    let file = pagemap_file(&[0x8000_0000_0000_0002, 0x8000_0000_0000_0003]);
    let mut source = FileEntrySource::new(file.reopen().expect("reopen"));
    let region = Region::new(VirtAddr::from_raw(0x0234), 2 * 4096, BackingKind::UserHeap);
    let mappings = walk_table(&region, &mut source).expect("walk");
    assert_eq!(mappings[0].va, VirtAddr::from_raw(0));
    assert_eq!(
        mappings[0].translation,
        Translation::Mapped(PhysAddr::from_raw(2 * 4096))
    );
}

#[test]
fn test_truncated_source_fails_walk_without_output() {
    // Region's pages index past the two records in the file.
    let file = pagemap_file(&[0, 0]);
    let mut source = FileEntrySource::new(file.reopen().expect("reopen"));
    let region = Region::new(
        VirtAddr::from_raw(10 * 4096),
        4096,
        BackingKind::UserHeap,
    );
    let err = walk_table(&region, &mut source).expect_err("walk must fail");
    assert!(matches!(
        err,
        ResolveError::Source(SourceError::ShortRead { .. })
    ));
}

#[test]
fn test_walks_are_idempotent_over_unchanged_state() {
    let file = pagemap_file(&[0x8000_0000_0000_0011, 0, 0x8000_0000_0000_0013]);
    let mut source = FileEntrySource::new(file.reopen().expect("reopen"));
    let region = Region::new(VirtAddr::from_raw(0), 3 * 4096, BackingKind::UserHeap);
    let first = walk_table(&region, &mut source).expect("walk");
    let second = walk_table(&region, &mut source).expect("walk");
    assert_eq!(first, second);
}

#[test]
fn test_shared_source_matches_exclusive_access() {
    let entries: Vec<u64> = (0..16)
        .map(|pfn| 0x8000_0000_0000_0000 | pfn)
        .collect();
    let file = pagemap_file(&entries);

    let mut exclusive = FileEntrySource::new(file.reopen().expect("reopen"));
    let region = Region::new(VirtAddr::from_raw(0), 16 * 4096, BackingKind::UserHeap);
    let expected = walk_table(&region, &mut exclusive).expect("walk");

    let shared = SharedEntrySource::new(file.reopen().expect("reopen"));
    let halves: Vec<Region> = vec![
        Region::new(VirtAddr::from_raw(0), 8 * 4096, BackingKind::UserHeap),
        Region::new(VirtAddr::from_raw(8 * 4096), 8 * 4096, BackingKind::UserHeap),
    ];
    let handles: Vec<_> = halves
        .into_iter()
        .map(|region| {
            let mut source = shared.clone();
            thread::spawn(move || walk_table(&region, &mut source).expect("walk"))
        })
        .collect();
    let mut combined = Vec::new();
    for handle in handles {
        combined.extend(handle.join().expect("join"));
    }
    combined.sort_by_key(|m| m.va);
    assert_eq!(combined, expected);
}

#[test]
fn test_line_writer_pairs_every_page_in_order() {
    let map = DirectMap::new(0x1000);
    let region = Region::new(VirtAddr::from_raw(0x2000), 2 * 4096, BackingKind::DirectMap);
    let mut buf = Vec::new();
    let mut sink = LineWriter::new(&mut buf);
    for mapping in walk_direct(&region, &map).expect("walk") {
        sink.record(&mapping).expect("record");
    }
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(
        text,
        "VA=0x2000 -> PA=0x1000\nVA=0x3000 -> PA=0x2000\n"
    );
}

#[cfg(target_os = "linux")]
#[test]
fn test_live_pagemap_reports_touched_heap_pages() {
    use nexus_pagewalk::source::self_pagemap;
    use nexus_pagewalk::HeapRegion;

    let mut heap = HeapRegion::span(4 * PAGE_SIZE as u64).expect("span");
    heap.touch();
    let region = heap.region(BackingKind::UserHeap);

    let mut source = match self_pagemap() {
        Ok(source) => source,
        // Pagemap may hide PFNs or be unreadable in sandboxes; reading at all
        // is the property under test, so skip when the file is off limits.
        Err(_) => return,
    };
    let mappings = walk_table(&region, &mut source).expect("walk");
    assert_eq!(mappings.len(), 4);
    assert!(mappings.windows(2).all(|w| w[0].va < w[1].va));
    for mapping in &mappings {
        assert_eq!(mapping.va.page_offset(), 0);
    }
}

#[test]
fn test_resolver_kind_is_fixed_per_walk() {
    // The same region walked under two kinds gives independent outcomes.
    let base = 0x9000u64;
    let region = Region::new(VirtAddr::from_raw(base), 4096, BackingKind::Scattered);
    let table = FixtureTable::new(&[(base, 7)]);
    let scattered = walk_scattered(&region, &table).expect("walk");
    let direct = walk_direct(&region, &DirectMap::new(0x1000)).expect("walk");
    assert_eq!(
        scattered[0].translation,
        Translation::Mapped(PhysAddr::from_raw(7 * 4096))
    );
    assert_eq!(
        direct[0].translation,
        Translation::Mapped(PhysAddr::from_raw(base - 0x1000))
    );
}

#[test]
fn test_resolver_enum_dispatch_matches_entry_points() {
    let file = pagemap_file(&[0x8000_0000_0000_0004]);
    let mut source = FileEntrySource::new(file.reopen().expect("reopen"));
    let region = Region::new(VirtAddr::from_raw(0), 4096, BackingKind::UserHeap);
    let via_entry_point = walk_table(&region, &mut source).expect("walk");

    let mut source = FileEntrySource::new(file.reopen().expect("reopen"));
    let mut resolver = Resolver::Table(&mut source);
    let via_enum = nexus_pagewalk::walk(&region, &mut resolver).expect("walk");
    assert_eq!(via_entry_point, via_enum);
}

#[test]
fn test_entry_source_trait_object_usable_through_reborrow() {
    // walk_table takes &mut dyn EntrySource; a &mut to a concrete source
    // must satisfy it through the blanket impl.
    let file = pagemap_file(&[0x8000_0000_0000_0001]);
    let mut concrete = FileEntrySource::new(file.reopen().expect("reopen"));
    let mut reborrowed: &mut dyn EntrySource = &mut concrete;
    let region = Region::new(VirtAddr::from_raw(0), 4096, BackingKind::UserHeap);
    let mappings = walk_table(&region, &mut reborrowed).expect("walk");
    assert_eq!(
        mappings[0].translation,
        Translation::Mapped(PhysAddr::from_raw(4096))
    );
}
