// crates/cs_cdo/src/linalg/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! CSR 使用三个数组存储：
//! - `row_ptr`: 行指针，长度 n_rows + 1，row_ptr[i] 是第 i 行第一个非零元的索引
//! - `col_idx`: 列索引，每行内升序
//! - `values`: 非零元值
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::linalg::csr::CsrBuilder;
//!
//! let mut builder = CsrBuilder::new_square(3);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 1, -1.0);
//! builder.set(1, 0, -1.0);
//! builder.set(1, 1, 4.0);
//! builder.set(1, 2, -1.0);
//! builder.set(2, 1, -1.0);
//! builder.set(2, 2, 4.0);
//!
//! let matrix = builder.build();
//! let mut y = vec![0.0; 3];
//! matrix.mul_vec(&[1.0, 2.0, 3.0], &mut y);
//! assert_eq!(y, vec![2.0, 4.0, 10.0]);
//! ```

use std::collections::BTreeMap;

// =============================================================================
// 稀疏模式
// =============================================================================

/// CSR 矩阵的稀疏模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrPattern {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 行指针
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// 第 row 行的非零元列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// 查找 (row, col) 对应的值索引
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        self.row_indices(row).binary_search(&col).ok().map(|k| start + k)
    }
}

// =============================================================================
// CSR 矩阵
// =============================================================================

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    pattern: CsrPattern,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 从原始 CSR 数据创建矩阵
    ///
    /// `row_ptr` 长度为 `n_rows + 1` 且末元素等于 `col_idx.len()`；
    /// 每行列索引升序。
    pub fn from_raw(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), n_rows + 1, "row_ptr 长度必须为 n_rows + 1");
        debug_assert_eq!(col_idx.len(), values.len(), "col_idx 和 values 长度必须相等");
        debug_assert_eq!(row_ptr[n_rows], col_idx.len(), "row_ptr 末尾必须等于 nnz");

        Self {
            pattern: CsrPattern {
                n_rows,
                n_cols,
                row_ptr,
                col_idx,
            },
            values,
        }
    }

    /// 单位矩阵
    pub fn identity(n: usize) -> Self {
        Self::diagonal(&vec![1.0; n])
    }

    /// 对角矩阵
    pub fn diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        Self::from_raw(n, n, (0..=n).collect(), (0..n).collect(), diag.to_vec())
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows()
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.pattern.n_cols()
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 稀疏模式
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 非零元值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// (row, col) 位置的值，不存在时为 0
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pattern.find_index(row, col).map_or(0.0, |idx| self.values[idx])
    }

    /// 设置已存在位置的值，位置不存在时返回 `false`
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        match self.pattern.find_index(row, col) {
            Some(idx) => {
                self.values[idx] = value;
                true
            }
            None => false,
        }
    }

    /// 累加到已存在位置，位置不存在时返回 `false`
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> bool {
        match self.pattern.find_index(row, col) {
            Some(idx) => {
                self.values[idx] += value;
                true
            }
            None => false,
        }
    }

    /// 第 row 行的 (列索引, 值) 迭代器
    #[inline]
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.pattern.row_ptr[row]..self.pattern.row_ptr[row + 1];
        self.pattern.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// 第 row 行的对角元
    #[inline]
    pub fn diagonal_value(&self, row: usize) -> Option<f64> {
        self.pattern.find_index(row, row).map(|idx| self.values[idx])
    }

    /// 对角线向量（缺失对角元取 0）
    pub fn extract_diagonal(&self) -> Vec<f64> {
        (0..self.n_rows())
            .map(|i| self.diagonal_value(i).unwrap_or(0.0))
            .collect()
    }

    /// y = A * x
    ///
    /// # Panics
    /// - `x.len() != self.n_cols()`
    /// - `y.len() != self.n_rows()`
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        for (row, yi) in y.iter_mut().enumerate() {
            *yi = self.row(row).map(|(col, a)| a * x[col]).sum();
        }
    }

    /// r = b - A * x
    pub fn residual(&self, b: &[f64], x: &[f64], r: &mut [f64]) {
        self.mul_vec(x, r);
        for (ri, &bi) in r.iter_mut().zip(b) {
            *ri = bi - *ri;
        }
    }

    /// 是否在容差内对称
    pub fn is_symmetric(&self, tol: f64) -> bool {
        (0..self.n_rows()).all(|i| {
            self.row(i)
                .filter(|&(j, _)| j > i)
                .all(|(j, a_ij)| (a_ij - self.get(j, i)).abs() <= tol)
        })
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 使用 BTreeMap 临时存储，构建时转换为紧凑 CSR 格式。
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 方阵构建器
    #[inline]
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// 创建构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// 索引越界
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.n_rows && col < self.n_cols, "索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// 索引越界
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.n_rows && col < self.n_cols, "索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 当前非零元总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建 CSR 矩阵
    pub fn build(self) -> CsrMatrix {
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row_map in self.rows {
            for (col, val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix::from_raw(self.n_rows, self.n_cols, row_ptr, col_idx, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_identity_and_diagonal() {
        let id = CsrMatrix::identity(4);
        assert_eq!(id.nnz(), 4);
        assert_eq!(id.get(2, 2), 1.0);
        assert_eq!(id.get(2, 1), 0.0);

        let d = CsrMatrix::diagonal(&[2.0, 3.0]);
        assert_eq!(d.extract_diagonal(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_builder_and_mul() {
        let mut builder = CsrBuilder::new_square(4);
        builder.set(0, 0, 2.0);
        builder.set(0, 1, -1.0);
        builder.add(0, 1, -0.5);
        builder.set(1, 0, -1.0);
        builder.set(1, 1, 2.0);
        builder.set(1, 2, -1.0);
        builder.set(2, 1, -1.0);
        builder.set(2, 2, 2.0);
        builder.set(2, 3, -1.0);
        builder.set(3, 3, 1.0);

        let mat = builder.build();
        assert_eq!(mat.nnz(), 9);

        let mut y = vec![0.0; 4];
        mat.mul_vec(&[1.0, 2.0, 3.0, 4.0], &mut y);
        // y[0] = 2*1 + (-1.5)*2 = -1
        assert!((y[0] + 1.0).abs() < EPS);
        assert!(y[1].abs() < EPS);
        assert!(y[2].abs() < EPS);
        assert!((y[3] - 4.0).abs() < EPS);
        assert!(!mat.is_symmetric(EPS));
    }

    #[test]
    fn test_set_add_missing_entry() {
        let mut mat = CsrMatrix::identity(2);
        assert!(mat.add(0, 0, 1.0));
        assert!(!mat.set(0, 1, 5.0));
        assert_eq!(mat.get(0, 0), 2.0);
        assert_eq!(mat.diagonal_value(1), Some(1.0));
    }

    #[test]
    fn test_residual_and_symmetry() {
        let mut builder = CsrBuilder::new_square(2);
        builder.set(0, 0, 2.0);
        builder.set(0, 1, 0.5);
        builder.set(1, 0, 0.5);
        builder.set(1, 1, 1.0);
        let mat = builder.build();
        assert!(mat.is_symmetric(EPS));

        let mut r = vec![0.0; 2];
        mat.residual(&[3.0, 2.0], &[1.0, 1.0], &mut r);
        assert!((r[0] - 0.5).abs() < EPS);
        assert!((r[1] - 0.5).abs() < EPS);
    }
}
