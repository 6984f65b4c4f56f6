// Copyright 2024 Saorsa Labs
// SPDX-License-Identifier: AGPL-3.0-or-later

//! GF(256) Galois field arithmetic for Cauchy-Reed-Solomon coding
//!
//! This module implements arithmetic operations over GF(2^8). The field is
//! defined by one of sixteen irreducible polynomials; the default is
//! x^8 + x^6 + x^3 + x^2 + 1 (0x14D). Addition is bitwise XOR;
//! multiplication and division are full 256x256 table lookups derived from
//! log/exp tables, so every element operation is a constant-time lookup.

use std::fmt;
use std::sync::OnceLock;

use tracing::info;

use crate::error::CodingError;

/// Low eight bits of the sixteen available generator polynomials for
/// GF(2^8). The full polynomial is `(GEN_POLY[i] << 1) | 1`.
pub const GEN_POLY: [u16; 16] = [
    0x8e, 0x95, 0x96, 0xa6, 0xaf, 0xb1, 0xb2, 0xb4, 0xb8, 0xc3, 0xc6, 0xd4, 0xe1, 0xe7, 0xf3,
    0xfa,
];

/// Index into [`GEN_POLY`] used when no explicit choice is made.
pub const DEFAULT_POLYNOMIAL_INDEX: usize = 3;

/// Exp table length: four periods of the multiplicative group plus a guard
/// entry. Entries past 2*255 are a zero sentinel zone reachable through the
/// `log(0) = 512` marker.
const EXP_TABLE_LEN: usize = 4 * 255 + 1;

/// Sentinel stored in `log[0]`; indexes into the zero region of the exp
/// table.
const LOG_ZERO: u16 = 512;

/// Immutable GF(256) arithmetic context.
///
/// Holds the exp/log tables and the derived 256x256 multiplication and
/// division tables for the selected polynomial. Built once via
/// [`initialize`] and shared read-only across threads.
pub struct GfContext {
    polynomial: u16,
    exp: Box<[u8; EXP_TABLE_LEN]>,
    log: Box<[u16; 256]>,
    mul: Box<[[u8; 256]; 256]>,
    div: Box<[[u8; 256]; 256]>,
    inv: Box<[u8; 256]>,
}

impl GfContext {
    /// Build a context over the default polynomial.
    pub fn new() -> Self {
        Self::with_polynomial_index(DEFAULT_POLYNOMIAL_INDEX)
    }

    /// Build a context over `GEN_POLY[index]`. An out-of-range index falls
    /// back to [`DEFAULT_POLYNOMIAL_INDEX`].
    pub fn with_polynomial_index(index: usize) -> Self {
        let mut ctx = Self {
            polynomial: poly_init(index),
            exp: Box::new([0; EXP_TABLE_LEN]),
            log: Box::new([0; 256]),
            mul: Box::new([[0; 256]; 256]),
            div: Box::new([[0; 256]; 256]),
            inv: Box::new([0; 256]),
        };
        ctx.exp_log_init();
        ctx.mul_div_init();
        ctx.inv_init();
        ctx
    }

    /// The full irreducible polynomial this context was built over.
    pub fn polynomial(&self) -> u16 {
        self.polynomial
    }

    /// Construct the EXP and LOG tables from the polynomial.
    fn exp_log_init(&mut self) {
        self.log[0] = LOG_ZERO;
        self.exp[0] = 1;

        for j in 1..255 {
            let mut next = u16::from(self.exp[j - 1]) << 1;
            if next >= 256 {
                next ^= self.polynomial;
            }
            self.exp[j] = next as u8;
            self.log[next as usize] = j as u16;
        }

        // One full period ends where it began: exp[255] = exp[0] = 1.
        self.exp[255] = self.exp[0];
        let wrap = self.exp[255] as usize;
        self.log[wrap] = 255;

        for j in 256..510 {
            self.exp[j] = self.exp[j % 255];
        }
        self.exp[510] = 1;
        // Entries 511.. stay zero: the log(0) sentinel lands here.
    }

    /// Fill the MUL and DIV tables from the LOG and EXP tables. Row 0 and
    /// column 0 of both tables are zero.
    fn mul_div_init(&mut self) {
        for y in 1..256 {
            let log_y = usize::from(self.log[y]);
            let log_yn = 255 - log_y;
            for x in 1..256 {
                let log_x = usize::from(self.log[x]);
                self.mul[y][x] = self.exp[(log_x + log_y) % 255];
                self.div[y][x] = self.exp[(log_x + log_yn) % 255];
            }
        }
    }

    /// Fill the INV table: `inv[x] = div(1, x)`. Entry 0 comes out of the
    /// zero row and is not a valid inverse.
    fn inv_init(&mut self) {
        for x in 0..256 {
            self.inv[x] = self.div[x][1];
        }
    }

    /// Add in GF(256): x + y.
    #[inline]
    pub fn add(&self, x: u8, y: u8) -> u8 {
        x ^ y
    }

    /// Multiply in GF(256): x * y.
    ///
    /// The table row is indexed by `y`; for repeated multiplication by a
    /// constant, put the constant in `y`.
    #[inline]
    pub fn mul(&self, x: u8, y: u8) -> u8 {
        self.mul[y as usize][x as usize]
    }

    /// Divide in GF(256): x / y. The caller must ensure `y != 0`; the zero
    /// row yields 0 rather than signalling an error.
    #[inline]
    pub fn div(&self, x: u8, y: u8) -> u8 {
        self.div[y as usize][x as usize]
    }

    /// Inverse in GF(256): 1 / x, defined for `x != 0`.
    #[inline]
    pub fn inv(&self, x: u8) -> u8 {
        self.inv[x as usize]
    }

    /// Multiply every element of `dst` by the constant `y` in place.
    pub fn mul_slice(&self, dst: &mut [u8], y: u8) {
        if y == 0 {
            dst.fill(0);
            return;
        }
        if y == 1 {
            return;
        }
        let row = &self.mul[y as usize];
        for d in dst.iter_mut() {
            *d = row[*d as usize];
        }
    }

    /// Multiply-accumulate: `dst[i] ^= src[i] * y` in GF(256).
    ///
    /// The hot loop of encode and decode. Batches eight table lookups per
    /// iteration and folds them in with a single u64 XOR; block payloads
    /// are multiples of 8 bytes so the remainder loop only runs for matrix
    /// rows.
    ///
    /// # Panics
    ///
    /// Panics if `src.len() != dst.len()`.
    pub fn addmul_slice(&self, dst: &mut [u8], src: &[u8], y: u8) {
        assert_eq!(dst.len(), src.len(), "slice length mismatch");
        if y == 0 {
            return;
        }
        if y == 1 {
            add_slice(dst, src);
            return;
        }
        let row = &self.mul[y as usize];
        let mut d_chunks = dst.chunks_exact_mut(8);
        let mut s_chunks = src.chunks_exact(8);
        for (d_chunk, s_chunk) in d_chunks.by_ref().zip(s_chunks.by_ref()) {
            let t = [
                row[s_chunk[0] as usize],
                row[s_chunk[1] as usize],
                row[s_chunk[2] as usize],
                row[s_chunk[3] as usize],
                row[s_chunk[4] as usize],
                row[s_chunk[5] as usize],
                row[s_chunk[6] as usize],
                row[s_chunk[7] as usize],
            ];
            let d_arr: [u8; 8] = d_chunk.try_into().expect("8 bytes");
            let folded = u64::from_ne_bytes(d_arr) ^ u64::from_ne_bytes(t);
            d_chunk.copy_from_slice(&folded.to_ne_bytes());
        }
        for (d, s) in d_chunks
            .into_remainder()
            .iter_mut()
            .zip(s_chunks.remainder())
        {
            *d ^= row[*s as usize];
        }
    }
}

impl Default for GfContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GfContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GfContext")
            .field("polynomial", &format_args!("{:#x}", self.polynomial))
            .finish_non_exhaustive()
    }
}

/// Resolve a polynomial index to the full polynomial, clamping out-of-range
/// indices to the default.
fn poly_init(index: usize) -> u16 {
    let index = if index < GEN_POLY.len() {
        index
    } else {
        DEFAULT_POLYNOMIAL_INDEX
    };
    (GEN_POLY[index] << 1) | 1
}

/// Add two slices in GF(256): `dst[i] ^= src[i]`, eight bytes at a time.
///
/// # Panics
///
/// Panics if `src.len() != dst.len()`.
pub fn add_slice(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len(), "slice length mismatch");
    let mut d_chunks = dst.chunks_exact_mut(8);
    let mut s_chunks = src.chunks_exact(8);
    for (d_chunk, s_chunk) in d_chunks.by_ref().zip(s_chunks.by_ref()) {
        let d_arr: [u8; 8] = d_chunk.try_into().expect("8 bytes");
        let s_arr: [u8; 8] = s_chunk.try_into().expect("8 bytes");
        let folded = u64::from_ne_bytes(d_arr) ^ u64::from_ne_bytes(s_arr);
        d_chunk.copy_from_slice(&folded.to_ne_bytes());
    }
    for (d, s) in d_chunks
        .into_remainder()
        .iter_mut()
        .zip(s_chunks.remainder())
    {
        *d ^= s;
    }
}

static GF_CONTEXT: OnceLock<GfContext> = OnceLock::new();

/// One-time bring-up of the GF(256) field tables.
///
/// Idempotent; repeated calls return immediately. Encode and decode fail
/// with [`CodingError::UninitializedContext`] until this has run once.
pub fn initialize() {
    GF_CONTEXT.get_or_init(|| {
        info!("initializing GF(256) context");
        let ctx = GfContext::new();
        info!(
            polynomial = format_args!("{:#x}", ctx.polynomial()),
            "GF(256) tables ready"
        );
        ctx
    });
}

/// The process-wide context, or `UninitializedContext` before
/// [`initialize`].
pub(crate) fn context() -> Result<&'static GfContext, CodingError> {
    GF_CONTEXT.get().ok_or(CodingError::UninitializedContext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> GfContext {
        GfContext::new()
    }

    #[test]
    fn default_polynomial_is_0x14d() {
        assert_eq!(ctx().polynomial(), 0x14d);
    }

    #[test]
    fn polynomial_index_selects_and_clamps() {
        assert_eq!(GfContext::with_polynomial_index(0).polynomial(), 0x11d);
        assert_eq!(GfContext::with_polynomial_index(15).polynomial(), 0x1f5);
        // Out of range falls back to the default.
        assert_eq!(GfContext::with_polynomial_index(16).polynomial(), 0x14d);
        assert_eq!(
            GfContext::with_polynomial_index(usize::MAX).polynomial(),
            0x14d
        );
    }

    #[test]
    fn exp_log_table_shape() {
        let gf = ctx();
        assert_eq!(gf.log[0], 512);
        assert_eq!(gf.exp[0], 1);
        assert_eq!(gf.exp[255], 1);
        assert_eq!(gf.exp[510], 1);
        for j in 256..510 {
            assert_eq!(gf.exp[j], gf.exp[j % 255], "period mismatch at {j}");
        }
        for j in 511..EXP_TABLE_LEN {
            assert_eq!(gf.exp[j], 0, "sentinel zone not zero at {j}");
        }
    }

    #[test]
    fn exp_table_generates_all_nonzero() {
        let gf = ctx();
        let mut seen = [false; 256];
        for j in 0..255 {
            let v = gf.exp[j] as usize;
            assert!(!seen[v], "duplicate exp[{j}] = {v}");
            seen[v] = true;
        }
        assert!(!seen[0], "zero should not be generated by the exp table");
    }

    #[test]
    fn log_exp_roundtrip() {
        let gf = ctx();
        for x in 1..=255u8 {
            assert_eq!(
                gf.exp[gf.log[x as usize] as usize],
                x,
                "roundtrip failed for {x}"
            );
        }
    }

    #[test]
    fn add_is_xor_and_self_inverse() {
        let gf = ctx();
        for x in 0..=255u8 {
            assert_eq!(gf.add(x, x), 0);
            assert_eq!(gf.add(x, 0), x);
            assert_eq!(gf.add(0, x), x);
        }
        assert_eq!(gf.add(31, 99), 124);
    }

    #[test]
    fn mul_zero_and_identity() {
        let gf = ctx();
        for x in 0..=255u8 {
            assert_eq!(gf.mul(x, 0), 0);
            assert_eq!(gf.mul(0, x), 0);
            assert_eq!(gf.mul(x, 1), x);
            assert_eq!(gf.mul(1, x), x);
        }
    }

    #[test]
    fn mul_commutative() {
        let gf = ctx();
        for x in (0..=255u8).step_by(7) {
            for y in (0..=255u8).step_by(11) {
                assert_eq!(gf.mul(x, y), gf.mul(y, x), "commutativity failed: {x} * {y}");
            }
        }
    }

    #[test]
    fn inverse_all_nonzero_elements() {
        let gf = ctx();
        assert_eq!(gf.inv(1), 1);
        for x in 1..=255u8 {
            let inv = gf.inv(x);
            assert_eq!(gf.mul(x, inv), 1, "{x} * inv({x}) should be 1");
            assert_eq!(gf.inv(inv), x, "inv(inv({x})) should be {x}");
        }
    }

    #[test]
    fn div_mul_roundtrip_full_sweep() {
        let gf = ctx();
        for x in 0..=255u8 {
            for y in 1..=255u8 {
                assert_eq!(gf.div(gf.mul(x, y), y), x, "({x} * {y}) / {y} should be {x}");
                assert_eq!(gf.mul(gf.div(x, y), y), x, "({x} / {y}) * {y} should be {x}");
            }
        }
    }

    #[test]
    fn div_of_zero_is_zero() {
        let gf = ctx();
        for y in 1..=255u8 {
            assert_eq!(gf.div(0, y), 0);
        }
    }

    #[test]
    fn div_matches_mul_by_inverse() {
        let gf = ctx();
        for x in (1..=255u8).step_by(19) {
            for y in (1..=255u8).step_by(23) {
                assert_eq!(gf.div(x, y), gf.mul(x, gf.inv(y)));
            }
        }
    }

    #[test]
    fn add_slice_xors_wide_and_remainder() {
        let src: Vec<u8> = (0..19).map(|i| i * 3).collect();
        let mut dst: Vec<u8> = (0..19).map(|i| i * 7).collect();
        let expected: Vec<u8> = dst.iter().zip(&src).map(|(d, s)| d ^ s).collect();
        add_slice(&mut dst, &src);
        assert_eq!(dst, expected);
    }

    #[test]
    fn mul_slice_by_zero_clears_and_one_is_noop() {
        let gf = ctx();
        let original = vec![1u8, 2, 3, 100, 255];
        let mut data = original.clone();
        gf.mul_slice(&mut data, 1);
        assert_eq!(data, original);
        gf.mul_slice(&mut data, 0);
        assert_eq!(data, vec![0; 5]);
    }

    #[test]
    fn mul_slice_matches_elementwise() {
        let gf = ctx();
        let original: Vec<u8> = (0..32u8).map(|i| i.wrapping_mul(37)).collect();
        let expected: Vec<u8> = original.iter().map(|&d| gf.mul(d, 13)).collect();
        let mut data = original;
        gf.mul_slice(&mut data, 13);
        assert_eq!(data, expected);
    }

    #[test]
    fn addmul_slice_matches_elementwise() {
        let gf = ctx();
        // 27 bytes: exercises both the wide path and the remainder loop.
        let src: Vec<u8> = (0..27u8).map(|i| i.wrapping_mul(29)).collect();
        let mut dst: Vec<u8> = (0..27u8).map(|i| i.wrapping_mul(41)).collect();
        let expected: Vec<u8> = dst
            .iter()
            .zip(&src)
            .map(|(&d, &s)| d ^ gf.mul(s, 113))
            .collect();
        gf.addmul_slice(&mut dst, &src, 113);
        assert_eq!(dst, expected);
    }

    #[test]
    fn addmul_slice_coefficient_fast_paths() {
        let gf = ctx();
        let src = vec![5u8; 16];
        let mut dst = vec![9u8; 16];
        gf.addmul_slice(&mut dst, &src, 0);
        assert_eq!(dst, vec![9u8; 16]);
        gf.addmul_slice(&mut dst, &src, 1);
        assert_eq!(dst, vec![9u8 ^ 5; 16]);
    }
}
