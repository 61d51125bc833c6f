// crates/af_physics/src/numerics/linear_algebra/preconditioner.rs

//! 预条件器模块
//!
//! 将 Ax = b 变换为条件数更好的 M⁻¹Ax = M⁻¹b。
//!
//! # 预条件器类型
//!
//! - [`IdentityPreconditioner`]: 恒等（无预条件）
//! - [`JacobiPreconditioner`]: 标量对角
//! - [`BlockJacobiPreconditioner`]: 4×4 对角块求逆（默认，
//!   对块强耦合的可压缩系统明显优于标量对角）

use super::bcsr::BlockCsrMatrix;
use crate::{JacobianBlock, N_VAR};

/// 预条件器 trait
///
/// 核心操作 `apply`: z = M⁻¹·r
pub trait Preconditioner: Send + Sync {
    /// 应用预条件器: z = M⁻¹·r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 预条件器名称
    fn name(&self) -> &'static str;

    /// 矩阵值更新后重建（稀疏结构不变）
    fn update(&mut self, matrix: &BlockCsrMatrix);
}

/// 恒等预条件器
#[derive(Debug, Clone, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn update(&mut self, _matrix: &BlockCsrMatrix) {}
}

/// 标量 Jacobi 预条件器: z_i = r_i / A_ii
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// 从矩阵构造
    pub fn from_matrix(matrix: &BlockCsrMatrix) -> Self {
        let mut p = Self {
            inv_diag: Vec::new(),
        };
        p.update(matrix);
        p
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        for (i, (zi, ri)) in z.iter_mut().zip(r.iter()).enumerate() {
            *zi = ri * self.inv_diag[i];
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }

    fn update(&mut self, matrix: &BlockCsrMatrix) {
        let n = matrix.n_scalar();
        self.inv_diag.clear();
        self.inv_diag.resize(n, 1.0);
        for row in 0..matrix.n_rows() {
            let blk = matrix.diag_block(row);
            for k in 0..N_VAR {
                let d = blk[k][k];
                if d.abs() > 1e-30 {
                    self.inv_diag[row * N_VAR + k] = 1.0 / d;
                }
            }
        }
    }
}

/// 块 Jacobi 预条件器: z_blk = (A_ii)⁻¹·r_blk
#[derive(Debug, Clone)]
pub struct BlockJacobiPreconditioner {
    inv_blocks: Vec<JacobianBlock>,
}

impl BlockJacobiPreconditioner {
    /// 从矩阵构造
    pub fn from_matrix(matrix: &BlockCsrMatrix) -> Self {
        let mut p = Self {
            inv_blocks: Vec::new(),
        };
        p.update(matrix);
        p
    }

    /// 4×4 块求逆（部分主元 Gauss-Jordan）
    ///
    /// 奇异块回退为单位块（对应行退化为恒等预条件）。
    fn invert_block(blk: &JacobianBlock) -> JacobianBlock {
        let mut a = *blk;
        let mut inv = [[0.0; N_VAR]; N_VAR];
        for (k, row) in inv.iter_mut().enumerate() {
            row[k] = 1.0;
        }

        for col in 0..N_VAR {
            // 部分主元
            let mut pivot_row = col;
            let mut pivot_val = a[col][col].abs();
            for row in (col + 1)..N_VAR {
                if a[row][col].abs() > pivot_val {
                    pivot_val = a[row][col].abs();
                    pivot_row = row;
                }
            }
            if pivot_val < 1e-30 {
                // 奇异：恒等回退
                let mut ident = [[0.0; N_VAR]; N_VAR];
                for (k, row) in ident.iter_mut().enumerate() {
                    row[k] = 1.0;
                }
                return ident;
            }
            a.swap(col, pivot_row);
            inv.swap(col, pivot_row);

            let inv_pivot = 1.0 / a[col][col];
            for l in 0..N_VAR {
                a[col][l] *= inv_pivot;
                inv[col][l] *= inv_pivot;
            }
            for row in 0..N_VAR {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for l in 0..N_VAR {
                    a[row][l] -= factor * a[col][l];
                    inv[row][l] -= factor * inv[col][l];
                }
            }
        }
        inv
    }
}

impl Preconditioner for BlockJacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        for (row, inv) in self.inv_blocks.iter().enumerate() {
            let base = row * N_VAR;
            let r_blk = &r[base..base + N_VAR];
            for k in 0..N_VAR {
                let mut sum = 0.0;
                for l in 0..N_VAR {
                    sum += inv[k][l] * r_blk[l];
                }
                z[base + k] = sum;
            }
        }
    }

    fn name(&self) -> &'static str {
        "BlockJacobi"
    }

    fn update(&mut self, matrix: &BlockCsrMatrix) {
        self.inv_blocks.clear();
        self.inv_blocks.reserve(matrix.n_rows());
        for row in 0..matrix.n_rows() {
            self.inv_blocks
                .push(Self::invert_block(matrix.diag_block(row)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ZERO_BLOCK;

    fn diag_matrix(values: &[f64; N_VAR]) -> BlockCsrMatrix {
        let mut m = BlockCsrMatrix::from_adjacency(1, &[Vec::new()]);
        let mut blk = ZERO_BLOCK;
        for k in 0..N_VAR {
            blk[k][k] = values[k];
        }
        m.add_to_diag(0, &blk);
        m
    }

    #[test]
    fn test_identity() {
        let p = IdentityPreconditioner;
        let r = vec![1.0, 2.0, 3.0, 4.0];
        let mut z = vec![0.0; 4];
        p.apply(&r, &mut z);
        assert_eq!(r, z);
    }

    #[test]
    fn test_jacobi() {
        let m = diag_matrix(&[2.0, 4.0, 8.0, 16.0]);
        let p = JacobiPreconditioner::from_matrix(&m);
        let r = vec![2.0, 4.0, 8.0, 16.0];
        let mut z = vec![0.0; 4];
        p.apply(&r, &mut z);
        for zi in z {
            assert!((zi - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_block_inverse_exact() {
        // 稠密可逆块: M⁻¹·(M·x) = x
        let mut blk = ZERO_BLOCK;
        let entries = [
            [4.0, 1.0, 0.0, 2.0],
            [1.0, 5.0, 1.0, 0.0],
            [0.0, 1.0, 6.0, 1.0],
            [2.0, 0.0, 1.0, 7.0],
        ];
        for k in 0..N_VAR {
            blk[k] = entries[k];
        }
        let inv = BlockJacobiPreconditioner::invert_block(&blk);

        // 检查 inv·blk = I
        for k in 0..N_VAR {
            for l in 0..N_VAR {
                let mut sum = 0.0;
                for m in 0..N_VAR {
                    sum += inv[k][m] * blk[m][l];
                }
                let expected = if k == l { 1.0 } else { 0.0 };
                assert!((sum - expected).abs() < 1e-12, "({},{}) = {}", k, l, sum);
            }
        }
    }

    #[test]
    fn test_singular_block_falls_back_to_identity() {
        let inv = BlockJacobiPreconditioner::invert_block(&ZERO_BLOCK);
        for k in 0..N_VAR {
            for l in 0..N_VAR {
                let expected = if k == l { 1.0 } else { 0.0 };
                assert!((inv[k][l] - expected).abs() < 1e-14);
            }
        }
    }
}
