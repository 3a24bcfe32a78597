// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Control-surface CLI for the pagewalk library
//! OWNERS: @runtime
//!
//! Allocates heap memory in one of two shapes (one contiguous span, or many
//! independent one-page blocks), faults it in, walks it against the process
//! pagemap, and writes one `VA=... -> PA=...` line per page. Thin glue by
//! design: everything interesting happens in `nexus-pagewalk`.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    /// One contiguous allocation walked page by page.
    Span,
    /// Independent one-page blocks, each translated on its own.
    Blocks,
}

#[derive(Parser, Debug)]
#[command(name = "pagewalk-dump", about = "Dump VA -> PA mappings for fresh heap memory")]
struct Args {
    /// Allocation shape to exercise.
    #[arg(long, value_enum, default_value = "span")]
    mode: Mode,

    /// Number of pages to allocate.
    #[arg(long, default_value_t = 256)]
    pages: u64,

    /// Output file for the mapping lines.
    #[arg(long, default_value = "out")]
    out: String,

    /// Skip the pre-walk residency touch (expect unmapped pages).
    #[arg(long)]
    no_touch: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(pages) => {
            info!(target: "pagewalk-dump", "reported {pages} pages to {}", args.out);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(target: "pagewalk-dump", "{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_os = "linux")]
fn run(args: &Args) -> Result<usize, Box<dyn std::error::Error>> {
    use std::fs::File;
    use std::io::BufWriter;

    use nexus_pagewalk::{walk_into, BackingKind, HeapRegion, LineWriter, Resolver, PAGE_SIZE};

    let out = File::create(&args.out)?;
    let mut sink = LineWriter::new(BufWriter::new(out));
    let mut source = nexus_pagewalk::source::self_pagemap()?;

    let mut reported = 0;
    match args.mode {
        Mode::Span => {
            let mut heap = HeapRegion::span(args.pages * PAGE_SIZE as u64)?;
            if !args.no_touch {
                heap.touch();
            }
            let region = heap.region(BackingKind::UserHeap);
            reported += walk_into(&region, &mut Resolver::Table(&mut source), &mut sink)?;
        }
        Mode::Blocks => {
            let mut blocks = HeapRegion::blocks(args.pages)?;
            for block in &mut blocks {
                if !args.no_touch {
                    block.touch();
                }
                let region = block.region(BackingKind::UserHeap);
                reported += walk_into(&region, &mut Resolver::Table(&mut source), &mut sink)?;
            }
        }
    }
    Ok(reported)
}

#[cfg(not(target_os = "linux"))]
fn run(_args: &Args) -> Result<usize, Box<dyn std::error::Error>> {
    Err("pagewalk-dump needs a per-process pagemap; only Linux hosts are supported".into())
}
