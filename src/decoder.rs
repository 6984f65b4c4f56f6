//! Cauchy-Reed-Solomon decoder.
//!
//! Reconstructs missing data blocks from whichever data and recovery
//! blocks survived, in place in the caller's block container.

use tracing::debug;

use crate::error::CodingError;
use crate::gf256::{self, add_slice};
use crate::matrix::{cauchy_matrix, invert_matrix};

/// A received or reconstructed block: payload plus its coding row.
///
/// Rows `[0, k)` are data blocks, `[k, k+m)` recovery blocks. A missing
/// block is a `None` slot in the decode container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block payload, exactly `block_bytes` long.
    pub data: Vec<u8>,
    /// Coding row this payload belongs to.
    pub row: u8,
}

impl Block {
    /// Tag a payload with its coding row.
    pub fn new(data: Vec<u8>, row: u8) -> Self {
        Self { data, row }
    }
}

/// Recover the original data blocks from the blocks that survived.
///
/// `blocks` holds the surviving blocks in any order, `None` marking lost
/// ones; it must be at least `k` slots long. Use the same `k`, `m` and
/// `block_bytes` as the encoder. On success every data row in `[0, k)` is
/// present: rows that were missing are reconstructed into the first empty
/// slots. Callers should locate blocks by `row`, not by position.
///
/// # Errors
///
/// [`CodingError::InvalidParameters`] / [`CodingError::NullData`] /
/// [`CodingError::UninitializedContext`] for the same preconditions as
/// encode; [`CodingError::InsufficientBlocks`] when fewer recovery blocks
/// survived than data blocks were lost; [`CodingError::MatrixOperation`]
/// if the recovery submatrix cannot be inverted; and
/// [`CodingError::BlockBuffer`] when there is no empty slot to hold a
/// reconstructed block.
pub fn decode(
    k: usize,
    m: usize,
    blocks: &mut [Option<Block>],
    block_bytes: usize,
) -> Result<(), CodingError> {
    crate::check_parameters(k, m, block_bytes)?;
    if blocks.len() < k {
        return Err(CodingError::NullData("blocks container shorter than k"));
    }
    if blocks
        .iter()
        .flatten()
        .any(|block| block.data.len() != block_bytes)
    {
        return Err(CodingError::NullData("block payload length != block_bytes"));
    }
    let gf = gf256::context()?;

    // Which data rows are missing.
    let missing: Vec<bool> = (0..k)
        .map(|row| !blocks.iter().flatten().any(|b| usize::from(b.row) == row))
        .collect();
    let missing_indices: Vec<usize> = (0..k).filter(|&row| missing[row]).collect();
    let missing_count = missing_indices.len();

    if missing_count == 0 {
        debug!(k, m, "all data blocks present, nothing to reconstruct");
        return Ok(());
    }

    // Collect distinct surviving recovery rows, in scan order, until the
    // shortfall is covered.
    let mut recovery_rows: Vec<usize> = Vec::with_capacity(missing_count);
    for block in blocks.iter().flatten() {
        let row = usize::from(block.row);
        if row >= k && row < k + m && !recovery_rows.contains(&(row - k)) {
            recovery_rows.push(row - k);
            if recovery_rows.len() == missing_count {
                break;
            }
        }
    }
    if recovery_rows.len() < missing_count {
        return Err(CodingError::InsufficientBlocks {
            have: recovery_rows.len(),
            need: missing_count,
        });
    }

    let matrix = cauchy_matrix(gf, k, m);

    // Square submatrix: selected recovery rows x missing data columns.
    let submatrix: Vec<Vec<u8>> = recovery_rows
        .iter()
        .map(|&t| missing_indices.iter().map(|&u| matrix[t][u]).collect())
        .collect();
    let sub_inv = invert_matrix(gf, &submatrix)?;

    for (u, &missing_col) in missing_indices.iter().enumerate() {
        let mut acc = vec![0u8; block_bytes];

        for (t, &recovery_row) in recovery_rows.iter().enumerate() {
            let Some(parity) = blocks
                .iter()
                .flatten()
                .find(|b| usize::from(b.row) == recovery_row + k)
            else {
                return Err(CodingError::BlockBuffer(
                    "recovery block payload unexpectedly absent",
                ));
            };
            let mut scratch = parity.data.clone();

            // Subtract the contribution of every present data block.
            for (l, &lost) in missing.iter().enumerate() {
                if lost {
                    continue;
                }
                let Some(original) = blocks.iter().flatten().find(|b| usize::from(b.row) == l)
                else {
                    return Err(CodingError::BlockBuffer(
                        "data block payload unexpectedly absent",
                    ));
                };
                match matrix[recovery_row][l] {
                    0 => {}
                    1 => add_slice(&mut scratch, &original.data),
                    coef => gf.addmul_slice(&mut scratch, &original.data, coef),
                }
            }

            // Fold the purified recovery block through the inverse.
            match sub_inv[u][t] {
                0 => {}
                1 => add_slice(&mut acc, &scratch),
                coef => gf.addmul_slice(&mut acc, &scratch, coef),
            }
        }

        let Some(slot) = blocks.iter_mut().find(|slot| slot.is_none()) else {
            return Err(CodingError::BlockBuffer(
                "no empty slot for a reconstructed block",
            ));
        };
        *slot = Some(Block::new(acc, missing_col as u8));
    }

    debug!(
        k,
        m,
        block_bytes,
        recovered = missing_count,
        "reconstructed missing data blocks"
    );
    Ok(())
}
