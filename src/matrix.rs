// Copyright 2024 Saorsa Labs
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cauchy matrix construction and Gauss-Jordan inversion in GF(256).

use crate::error::CodingError;
use crate::gf256::GfContext;

/// Build the m x k Cauchy coding matrix.
///
/// `M[i][j] = 1 / ((k + i) + j)` in GF(256). The row labels `{k..k+m-1}`
/// and column labels `{0..k-1}` are disjoint, so no denominator is zero,
/// and every square submatrix of a Cauchy matrix is non-singular. That is
/// what makes the code MDS: any k of the k+m blocks reconstruct the data.
pub fn cauchy_matrix(gf: &GfContext, k: usize, m: usize) -> Vec<Vec<u8>> {
    let mut matrix = vec![vec![0u8; k]; m];
    for (i, row) in matrix.iter_mut().enumerate() {
        let x = (k + i) as u8;
        for (j, elem) in row.iter_mut().enumerate() {
            let y = j as u8;
            *elem = gf.inv(gf.add(x, y));
        }
    }
    matrix
}

/// Invert a square matrix in GF(256) by Gauss-Jordan elimination on the
/// augmented `[A | I]` matrix.
///
/// The pivot for each column is the first row at or below the diagonal with
/// a non-zero entry; any deterministic non-zero choice is equivalent in
/// GF(256). Returns [`CodingError::MatrixOperation`] if the matrix is not
/// square or is singular.
pub fn invert_matrix(gf: &GfContext, matrix: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, CodingError> {
    let n = matrix.len();
    if n == 0 || matrix.iter().any(|row| row.len() != n) {
        return Err(CodingError::MatrixOperation(
            "matrix is not square".to_string(),
        ));
    }

    let mut aug: Vec<Vec<u8>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = vec![0u8; 2 * n];
            r[..n].copy_from_slice(row);
            r[n + i] = 1;
            r
        })
        .collect();

    for i in 0..n {
        let Some(pivot_row) = (i..n).find(|&p| aug[p][i] != 0) else {
            return Err(CodingError::MatrixOperation(format!(
                "singular matrix at column {i}"
            )));
        };
        aug.swap(i, pivot_row);

        // Scale the pivot row so the diagonal entry becomes 1.
        let pivot_inv = gf.inv(aug[i][i]);
        gf.mul_slice(&mut aug[i], pivot_inv);

        // Eliminate the column from every other row.
        let pivot = aug[i].clone();
        for (j, row) in aug.iter_mut().enumerate() {
            if j == i {
                continue;
            }
            let factor = row[i];
            if factor != 0 {
                gf.addmul_slice(row, &pivot, factor);
            }
        }
    }

    Ok(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}
