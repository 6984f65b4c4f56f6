//! Cauchy-Reed-Solomon encoder.
//!
//! Multiplies the m x k Cauchy matrix with the k data blocks to produce m
//! recovery blocks, written end-to-end into a single caller-supplied
//! buffer.

use tracing::debug;

use crate::error::CodingError;
use crate::gf256::{self, add_slice};
use crate::matrix::cauchy_matrix;

/// Encode `k` data blocks into `m` recovery blocks.
///
/// `data` must hold exactly `k` blocks of `block_bytes` bytes each;
/// `recovery` must be `m * block_bytes` bytes and receives the recovery
/// blocks concatenated in row order. Transmit each data block with its row
/// index `i` in `[0, k)` and each recovery block with row `k + i`; the
/// decoder needs the same `k`, `m` and `block_bytes`.
///
/// # Errors
///
/// [`CodingError::InvalidParameters`] if the parameter invariants are
/// violated, [`CodingError::NullData`] if a buffer is mis-shaped, and
/// [`CodingError::UninitializedContext`] before
/// [`initialize`](crate::initialize).
pub fn encode(
    k: usize,
    m: usize,
    data: &[&[u8]],
    recovery: &mut [u8],
    block_bytes: usize,
) -> Result<(), CodingError> {
    crate::check_parameters(k, m, block_bytes)?;
    if data.len() != k {
        return Err(CodingError::NullData("expected exactly k data blocks"));
    }
    if data.iter().any(|block| block.len() != block_bytes) {
        return Err(CodingError::NullData("data block length != block_bytes"));
    }
    if recovery.len() != m * block_bytes {
        return Err(CodingError::NullData(
            "recovery buffer length != m * block_bytes",
        ));
    }
    let gf = gf256::context()?;

    let matrix = cauchy_matrix(gf, k, m);
    recovery.fill(0);

    for (i, out) in recovery.chunks_exact_mut(block_bytes).enumerate() {
        for (j, block) in data.iter().enumerate() {
            match matrix[i][j] {
                0 => {}
                1 => add_slice(out, block),
                coef => gf.addmul_slice(out, block, coef),
            }
        }
    }

    debug!(k, m, block_bytes, "encoded recovery blocks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf256::GfContext;
    use crate::initialize;

    #[test]
    fn rejects_invalid_parameters() {
        initialize();
        let block = [0u8; 8];
        let mut recovery = [0u8; 8];
        for (k, m, block_bytes) in [(0, 1, 8), (1, 0, 8), (1, 1, 0), (1, 1, 7), (1, 1, 12)] {
            let err = encode(k, m, &[&block], &mut recovery, block_bytes).unwrap_err();
            assert!(
                matches!(err, CodingError::InvalidParameters { .. }),
                "k={k} m={m} block_bytes={block_bytes}"
            );
        }
    }

    #[test]
    fn rejects_k_plus_m_over_256() {
        initialize();
        let block = [0u8; 8];
        let data: Vec<&[u8]> = vec![&block; 250];
        let mut recovery = vec![0u8; 7 * 8];
        let err = encode(250, 7, &data, &mut recovery, 8).unwrap_err();
        assert!(matches!(err, CodingError::InvalidParameters { .. }));
    }

    #[test]
    fn rejects_mis_shaped_buffers() {
        initialize();
        let block = [1u8; 8];
        let short = [1u8; 4];
        let mut recovery = vec![0u8; 2 * 8];

        // Wrong data block count.
        let err = encode(2, 2, &[&block[..]], &mut recovery, 8).unwrap_err();
        assert!(matches!(err, CodingError::NullData(_)));

        // Wrong data block length.
        let err = encode(2, 2, &[&block[..], &short[..]], &mut recovery, 8).unwrap_err();
        assert!(matches!(err, CodingError::NullData(_)));

        // Wrong recovery buffer length.
        let mut small = vec![0u8; 8];
        let err = encode(2, 2, &[&block[..], &block[..]], &mut small, 8).unwrap_err();
        assert!(matches!(err, CodingError::NullData(_)));
    }

    #[test]
    fn k1_m1_parity_mirrors_data() {
        initialize();
        // M[0][0] = inv(1 + 0) = 1, so the single recovery block is a copy.
        let data_block: Vec<u8> = (1..=8).collect();
        let mut recovery = vec![0u8; 8];
        encode(1, 1, &[&data_block], &mut recovery, 8).unwrap();
        assert_eq!(recovery, data_block);
    }

    #[test]
    fn zero_data_encodes_to_zero_parity() {
        initialize();
        let zeros = [0u8; 16];
        let data: Vec<&[u8]> = vec![&zeros; 3];
        let mut recovery = vec![0xAAu8; 2 * 16];
        encode(3, 2, &data, &mut recovery, 16).unwrap();
        assert_eq!(recovery, vec![0u8; 2 * 16]);
    }

    #[test]
    fn encode_is_deterministic() {
        initialize();
        let a: Vec<u8> = (0..16).map(|i| i * 3).collect();
        let b: Vec<u8> = (0..16).map(|i| i * 5 + 1).collect();
        let mut first = vec![0u8; 2 * 16];
        let mut second = vec![0u8; 2 * 16];
        encode(2, 2, &[&a, &b], &mut first, 16).unwrap();
        encode(2, 2, &[&a, &b], &mut second, 16).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parity_matches_elementwise_matrix_product() {
        initialize();
        let gf = GfContext::new();
        let (k, m, block_bytes) = (3, 2, 8);
        let data: Vec<Vec<u8>> = (0..k)
            .map(|j| (0..block_bytes).map(|p| ((j * 31 + p * 7) % 256) as u8).collect())
            .collect();
        let data_refs: Vec<&[u8]> = data.iter().map(Vec::as_slice).collect();
        let mut recovery = vec![0u8; m * block_bytes];
        encode(k, m, &data_refs, &mut recovery, block_bytes).unwrap();

        // Recompute each parity byte directly from the matrix definition.
        let matrix = crate::matrix::cauchy_matrix(&gf, k, m);
        for i in 0..m {
            for p in 0..block_bytes {
                let mut expected = 0u8;
                for (j, block) in data.iter().enumerate() {
                    expected ^= gf.mul(block[p], matrix[i][j]);
                }
                assert_eq!(recovery[i * block_bytes + p], expected, "row {i} byte {p}");
            }
        }
    }
}
