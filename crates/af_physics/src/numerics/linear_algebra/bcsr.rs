// crates/af_physics/src/numerics/linear_algebra/bcsr.rs

//! 块 CSR 稀疏矩阵
//!
//! 块尺寸 = 每点状态变量数（4），块稀疏模式 = 点邻接 + 对角。
//! 模式与值分离：模式在求解器构造时建立一次，此后每个非线性
//! 迭代只重写值。
//!
//! 强 Dirichlet 边界通过 [`BlockCsrMatrix::delete_row_set_identity`]
//! 施加：删除一个标量行的所有非零元，再把对角置 1。

use rayon::prelude::*;

use crate::{FluxVector, JacobianBlock, N_VAR, ZERO_BLOCK};

// =============================================================================
// 稀疏模式（与值分离，跨迭代复用）
// =============================================================================

/// 块 CSR 稀疏模式
#[derive(Debug, Clone)]
pub struct BcsrPattern {
    /// 块行数（= 点数）
    n_rows: usize,
    /// 行指针
    row_ptr: Vec<usize>,
    /// 块列索引（每行内升序）
    col_idx: Vec<usize>,
    /// 对角块的值索引缓存
    diag_idx: Vec<usize>,
}

impl BcsrPattern {
    /// 由点邻接表构造（每行 = 邻点 + 自身，升序）
    pub fn from_adjacency(n_points: usize, adjacency: &[Vec<usize>]) -> Self {
        debug_assert_eq!(adjacency.len(), n_points);
        let mut row_ptr = Vec::with_capacity(n_points + 1);
        let mut col_idx = Vec::new();
        row_ptr.push(0);
        for (i, nbrs) in adjacency.iter().enumerate() {
            let mut cols: Vec<usize> = nbrs.clone();
            cols.push(i);
            cols.sort_unstable();
            cols.dedup();
            col_idx.extend_from_slice(&cols);
            row_ptr.push(col_idx.len());
        }

        let mut diag_idx = vec![usize::MAX; n_points];
        for i in 0..n_points {
            let start = row_ptr[i];
            let end = row_ptr[i + 1];
            let local = col_idx[start..end]
                .binary_search(&i)
                .expect("对角块必须存在");
            diag_idx[i] = start + local;
        }

        Self {
            n_rows: n_points,
            row_ptr,
            col_idx,
            diag_idx,
        }
    }

    /// 块行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 非零块数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 查找 (row, col) 块的值索引（列索引有序，二分查找）
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(local) => Some(start + local),
            Err(_) => None,
        }
    }

    /// 对角块值索引
    #[inline]
    pub fn diag_index(&self, row: usize) -> usize {
        self.diag_idx[row]
    }
}

// =============================================================================
// 矩阵主体
// =============================================================================

/// 块 CSR 矩阵
#[derive(Debug, Clone)]
pub struct BlockCsrMatrix {
    pattern: BcsrPattern,
    values: Vec<JacobianBlock>,
}

impl BlockCsrMatrix {
    /// 由点邻接表构造（值清零）
    pub fn from_adjacency(n_points: usize, adjacency: &[Vec<usize>]) -> Self {
        let pattern = BcsrPattern::from_adjacency(n_points, adjacency);
        let values = vec![ZERO_BLOCK; pattern.nnz()];
        Self { pattern, values }
    }

    /// 稀疏模式
    #[inline]
    pub fn pattern(&self) -> &BcsrPattern {
        &self.pattern
    }

    /// 块行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows()
    }

    /// 标量未知数个数
    #[inline]
    pub fn n_scalar(&self) -> usize {
        self.pattern.n_rows() * N_VAR
    }

    /// 所有值清零（模式不变）
    pub fn set_zero(&mut self) {
        self.values.fill(ZERO_BLOCK);
    }

    /// 获取 (row, col) 块
    pub fn block(&self, row: usize, col: usize) -> Option<&JacobianBlock> {
        self.pattern.find_index(row, col).map(|idx| &self.values[idx])
    }

    /// 向 (row, col) 块累加
    ///
    /// 位置不存在时返回 false（未修改）。
    pub fn add_block(&mut self, row: usize, col: usize, blk: &JacobianBlock) -> bool {
        match self.pattern.find_index(row, col) {
            Some(idx) => {
                let v = &mut self.values[idx];
                for k in 0..N_VAR {
                    for l in 0..N_VAR {
                        v[k][l] += blk[k][l];
                    }
                }
                true
            }
            None => false,
        }
    }

    /// 从 (row, col) 块减去
    pub fn sub_block(&mut self, row: usize, col: usize, blk: &JacobianBlock) -> bool {
        match self.pattern.find_index(row, col) {
            Some(idx) => {
                let v = &mut self.values[idx];
                for k in 0..N_VAR {
                    for l in 0..N_VAR {
                        v[k][l] -= blk[k][l];
                    }
                }
                true
            }
            None => false,
        }
    }

    /// 向对角块累加
    pub fn add_to_diag(&mut self, row: usize, blk: &JacobianBlock) {
        let idx = self.pattern.diag_index(row);
        let v = &mut self.values[idx];
        for k in 0..N_VAR {
            for l in 0..N_VAR {
                v[k][l] += blk[k][l];
            }
        }
    }

    /// 向对角块的对角线累加标量（伪时间项 V/Δt）
    pub fn add_scalar_to_diag(&mut self, row: usize, value: f64) {
        let idx = self.pattern.diag_index(row);
        for k in 0..N_VAR {
            self.values[idx][k][k] += value;
        }
    }

    /// 对角块
    #[inline]
    pub fn diag_block(&self, row: usize) -> &JacobianBlock {
        &self.values[self.pattern.diag_index(row)]
    }

    /// 删除标量行并把对角置 1（强 Dirichlet 施加）
    ///
    /// 点 `point` 的第 `var` 个标量行在所有块中清零，
    /// 然后对角块的 (var, var) 置 1。
    pub fn delete_row_set_identity(&mut self, point: usize, var: usize) {
        let start = self.pattern.row_ptr[point];
        let end = self.pattern.row_ptr[point + 1];
        for idx in start..end {
            self.values[idx][var] = [0.0; N_VAR];
        }
        let diag = self.pattern.diag_index(point);
        self.values[diag][var][var] = 1.0;
    }

    /// 矩阵-向量乘法 y = A·x（扁平标量向量，块行并行）
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_scalar(), "x 长度必须等于标量未知数个数");
        assert_eq!(y.len(), self.n_scalar(), "y 长度必须等于标量未知数个数");

        let pattern = &self.pattern;
        let values = &self.values;
        y.par_chunks_mut(N_VAR)
            .enumerate()
            .for_each(|(row, y_blk)| {
                let mut acc: FluxVector = [0.0; N_VAR];
                let start = pattern.row_ptr[row];
                let end = pattern.row_ptr[row + 1];
                for idx in start..end {
                    let col = pattern.col_idx[idx];
                    let blk = &values[idx];
                    let x_blk = &x[col * N_VAR..(col + 1) * N_VAR];
                    for k in 0..N_VAR {
                        let mut sum = 0.0;
                        for l in 0..N_VAR {
                            sum += blk[k][l] * x_blk[l];
                        }
                        acc[k] += sum;
                    }
                }
                y_blk.copy_from_slice(&acc);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 两点链的邻接
    fn chain2() -> BlockCsrMatrix {
        let adjacency = vec![vec![1], vec![0]];
        BlockCsrMatrix::from_adjacency(2, &adjacency)
    }

    fn identity_block() -> JacobianBlock {
        let mut b = ZERO_BLOCK;
        for k in 0..N_VAR {
            b[k][k] = 1.0;
        }
        b
    }

    #[test]
    fn test_pattern_shape() {
        let m = chain2();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.pattern().nnz(), 4); // 2 对角 + 2 非对角
        assert!(m.pattern().find_index(0, 1).is_some());
        assert!(m.pattern().find_index(0, 0).is_some());
    }

    #[test]
    fn test_add_block_outside_pattern() {
        let adjacency = vec![vec![1], vec![0], Vec::new()];
        let mut m = BlockCsrMatrix::from_adjacency(3, &adjacency);
        assert!(!m.add_block(0, 2, &identity_block()));
        assert!(m.add_block(0, 1, &identity_block()));
    }

    #[test]
    fn test_mul_vec_identity() {
        let mut m = chain2();
        m.add_to_diag(0, &identity_block());
        m.add_to_diag(1, &identity_block());
        let x: Vec<f64> = (0..2 * N_VAR).map(|i| i as f64).collect();
        let mut y = vec![0.0; 2 * N_VAR];
        m.mul_vec(&x, &mut y);
        assert_eq!(x, y);
    }

    #[test]
    fn test_off_diagonal_coupling() {
        let mut m = chain2();
        m.add_to_diag(0, &identity_block());
        m.add_to_diag(1, &identity_block());
        let mut coupling = ZERO_BLOCK;
        coupling[0][0] = 2.0;
        m.add_block(0, 1, &coupling);

        let mut x = vec![0.0; 2 * N_VAR];
        x[N_VAR] = 3.0; // 点1的第0分量
        let mut y = vec![0.0; 2 * N_VAR];
        m.mul_vec(&x, &mut y);
        assert!((y[0] - 6.0).abs() < 1e-14); // 耦合项 2*3
        assert!((y[N_VAR] - 3.0).abs() < 1e-14); // 对角
    }

    #[test]
    fn test_delete_row_set_identity() {
        // Dirichlet 性质: 删除后该标量行 = 单位行
        let mut m = chain2();
        let mut dense = ZERO_BLOCK;
        for k in 0..N_VAR {
            for l in 0..N_VAR {
                dense[k][l] = (k * N_VAR + l) as f64 + 1.0;
            }
        }
        m.add_to_diag(0, &dense);
        m.add_block(0, 1, &dense);

        // 删除点0的速度行 (var=1, 2)
        m.delete_row_set_identity(0, 1);
        m.delete_row_set_identity(0, 2);

        let diag = m.block(0, 0).unwrap();
        let off = m.block(0, 1).unwrap();
        for var in [1usize, 2] {
            for l in 0..N_VAR {
                let expected = if l == var { 1.0 } else { 0.0 };
                assert!((diag[var][l] - expected).abs() < 1e-14);
                assert!(off[var][l].abs() < 1e-14);
            }
        }
        // 其他行不受影响
        assert!((diag[0][0] - 1.0).abs() < 1e-14);
        assert!((diag[3][3] - 16.0).abs() < 1e-14);
    }

    #[test]
    fn test_add_scalar_to_diag() {
        let mut m = chain2();
        m.add_scalar_to_diag(1, 5.0);
        let diag = m.diag_block(1);
        for k in 0..N_VAR {
            assert!((diag[k][k] - 5.0).abs() < 1e-14);
        }
    }
}
