//! Sample file encoder.
//!
//! Splits a file into `k` data blocks, generates `m` recovery blocks, and
//! writes everything next to the input: `<file>.info` (ASCII
//! `originalSize,k,m,blockSize`), `<file>.d<i>` for each data block and
//! `<file>.r<i>` for each recovery block.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use cauchy_fec::{encode, initialize};

#[derive(Parser)]
#[command(about = "Encode a file into Cauchy-Reed-Solomon data and recovery blocks")]
struct Args {
    /// File to encode.
    file: PathBuf,

    /// Number of data blocks.
    #[arg(short, default_value_t = 4)]
    k: usize,

    /// Number of recovery blocks.
    #[arg(short, default_value_t = 2)]
    m: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    initialize();

    if args.k == 0 || args.m == 0 || args.k + args.m > 256 {
        bail!("k and m must be at least 1 with k + m <= 256");
    }

    let file_data = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    if file_data.is_empty() {
        bail!("cannot encode an empty file");
    }

    // Block size: ceil(size / k), rounded up to a multiple of 8.
    let block_size = file_data.len().div_ceil(args.k).div_ceil(8) * 8;

    info!(
        size = file_data.len(),
        k = args.k,
        m = args.m,
        block_size,
        "encoding file"
    );

    // Pad the file out to k full blocks.
    let mut padded = file_data.clone();
    padded.resize(args.k * block_size, 0);
    let data: Vec<&[u8]> = padded.chunks_exact(block_size).collect();

    let mut recovery = vec![0u8; args.m * block_size];
    encode(args.k, args.m, &data, &mut recovery, block_size)?;

    let base = args.file.display();
    let info = format!("{},{},{},{}", file_data.len(), args.k, args.m, block_size);
    fs::write(format!("{base}.info"), info)
        .with_context(|| format!("failed to write {base}.info"))?;

    for (i, block) in data.iter().enumerate() {
        fs::write(format!("{base}.d{i}"), block)
            .with_context(|| format!("failed to write {base}.d{i}"))?;
    }
    for (i, block) in recovery.chunks_exact(block_size).enumerate() {
        fs::write(format!("{base}.r{i}"), block)
            .with_context(|| format!("failed to write {base}.r{i}"))?;
    }

    info!(
        data_blocks = args.k,
        recovery_blocks = args.m,
        "wrote block files and .info sidecar"
    );
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
