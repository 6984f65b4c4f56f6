//! Sample file decoder.
//!
//! Counterpart to `sample_encoder`: reads the `<base>.info` sidecar, scans
//! for surviving `<base>.d<i>` / `<base>.r<i>` block files, reconstructs
//! any missing data blocks and writes `<base>.reconstructed`, truncated to
//! the original file size.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cauchy_fec::{decode, initialize, Block};

#[derive(Parser)]
#[command(about = "Reconstruct a file from surviving Cauchy-Reed-Solomon blocks")]
struct Args {
    /// Base path of the encoded block set (the original file path).
    base: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    initialize();

    let base = args.base.display().to_string();
    let info = fs::read_to_string(format!("{base}.info"))
        .with_context(|| format!("failed to read {base}.info"))?;
    let fields: Vec<&str> = info.trim().split(',').collect();
    if fields.len() < 4 {
        bail!("invalid .info sidecar: expected originalSize,k,m,blockSize");
    }
    let original_size: usize = fields[0].parse().context("invalid originalSize")?;
    let k: usize = fields[1].parse().context("invalid k")?;
    let m: usize = fields[2].parse().context("invalid m")?;
    let block_size: usize = fields[3].parse().context("invalid blockSize")?;
    if k == 0 || m == 0 || k + m > 256 {
        bail!("invalid sidecar parameters: k={k}, m={m}");
    }

    info!(original_size, k, m, block_size, "read sidecar");

    // Fill a k-slot container: data blocks first, then recovery blocks only
    // to cover the shortfall, so reconstruction has slots left to write to.
    let mut blocks: Vec<Option<Block>> = vec![None; k];
    let mut found = 0usize;

    for i in 0..k {
        if let Some(payload) = read_block(&format!("{base}.d{i}"), block_size) {
            place(&mut blocks, Block::new(payload, i as u8));
            found += 1;
        }
    }

    let mut recovery_found = 0usize;
    for i in 0..m {
        if found + recovery_found >= k {
            break;
        }
        if let Some(payload) = read_block(&format!("{base}.r{i}"), block_size) {
            place(&mut blocks, Block::new(payload, (k + i) as u8));
            recovery_found += 1;
        }
    }

    if found + recovery_found < k {
        bail!(
            "not enough blocks to reconstruct: have {} data + {} recovery, need {k}",
            found,
            recovery_found
        );
    }

    decode(k, m, &mut blocks, block_size)?;

    // Reassemble by row and trim the padding.
    let mut out = vec![0u8; k * block_size];
    for block in blocks.iter().flatten() {
        let row = usize::from(block.row);
        if row >= k {
            continue;
        }
        out[row * block_size..(row + 1) * block_size].copy_from_slice(&block.data);
    }
    out.truncate(original_size);

    let out_path = format!("{base}.reconstructed");
    fs::write(&out_path, &out).with_context(|| format!("failed to write {out_path}"))?;
    info!(path = %out_path, size = out.len(), "file reconstructed");
    Ok(())
}

/// Read a block file if it exists and has the expected size.
fn read_block(path: &str, block_size: usize) -> Option<Vec<u8>> {
    if !Path::new(path).is_file() {
        return None;
    }
    match fs::read(path) {
        Ok(payload) if payload.len() == block_size => Some(payload),
        Ok(payload) => {
            warn!(path, size = payload.len(), "ignoring block with wrong size");
            None
        }
        Err(err) => {
            warn!(path, %err, "ignoring unreadable block");
            None
        }
    }
}

/// Put a block into the first empty slot.
fn place(blocks: &mut [Option<Block>], block: Block) {
    if let Some(slot) = blocks.iter_mut().find(|slot| slot.is_none()) {
        *slot = Some(block);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
