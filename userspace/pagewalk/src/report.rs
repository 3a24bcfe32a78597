// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reporting sinks for walk output.
//!
//! Formatting is peripheral, but the pairing is not: one record per page, in
//! the order the walker produced them.

use std::io::{self, Write};

use crate::resolve::Translation;
use crate::walk::PageMapping;

/// Receives walk output one page at a time.
pub trait ReportSink {
    /// Records a single page mapping.
    fn record(&mut self, mapping: &PageMapping) -> io::Result<()>;
}

/// Line-oriented sink writing `VA=0x... -> PA=0x...` records.
///
/// Unmapped pages render as `PA=<unmapped>`, keeping absence distinct from
/// physical address zero.
pub struct LineWriter<W> {
    out: W,
}

impl<W: Write> LineWriter<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for LineWriter<W> {
    fn record(&mut self, mapping: &PageMapping) -> io::Result<()> {
        match mapping.translation {
            Translation::Mapped(pa) => {
                writeln!(self.out, "VA={:#x} -> PA={:#x}", mapping.va, pa)
            }
            Translation::Unmapped => {
                writeln!(self.out, "VA={:#x} -> PA=<unmapped>", mapping.va)
            }
        }
    }
}
