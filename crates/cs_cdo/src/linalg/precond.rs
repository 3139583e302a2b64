// crates/cs_cdo/src/linalg/precond.rs

//! 预条件器
//!
//! 预条件器把 Ax = b 转换为条件数更好的 M⁻¹Ax = M⁻¹b。核心操作是
//! `apply`: z = M⁻¹ r。
//!
//! # 预条件器类型
//!
//! - [`IdentityPreconditioner`]: 恒等（无预条件）
//! - [`JacobiPreconditioner`]: 对角预条件
//! - [`PolynomialPreconditioner`]: 以 Jacobi 为基的 Neumann 多项式

use super::csr::CsrMatrix;

/// 对角元绝对值低于此阈值时视为缺失
const DIAG_THRESHOLD: f64 = 1e-14;

/// 预条件器 trait
pub trait Preconditioner: Send + Sync {
    /// z = M⁻¹ r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 名称
    fn name(&self) -> &'static str;

    /// 矩阵值变化而结构不变时更新
    fn update(&mut self, matrix: &CsrMatrix);
}

/// 恒等预条件器
#[derive(Debug, Clone, Default)]
pub struct IdentityPreconditioner;

impl IdentityPreconditioner {
    /// 创建恒等预条件器
    pub fn new() -> Self {
        Self
    }
}

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn update(&mut self, _matrix: &CsrMatrix) {}
}

fn inverse_diagonal(matrix: &CsrMatrix) -> Vec<f64> {
    (0..matrix.n_rows())
        .map(|i| match matrix.diagonal_value(i) {
            Some(d) if d.abs() > DIAG_THRESHOLD => 1.0 / d,
            _ => 1.0,
        })
        .collect()
}

/// Jacobi 预条件器：z_i = r_i / A_ii
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// 从 CSR 矩阵创建
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        Self {
            inv_diag: inverse_diagonal(matrix),
        }
    }

    /// 对角元倒数
    pub fn inv_diag(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        for ((zi, &ri), &d) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * d;
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }

    fn update(&mut self, matrix: &CsrMatrix) {
        self.inv_diag = inverse_diagonal(matrix);
    }
}

/// Neumann 多项式预条件器
///
/// z₀ = D⁻¹r，z_{k+1} = z_k + D⁻¹(r - A z_k)，共 `degree` 次修正。
/// 0 阶即 Jacobi。
#[derive(Debug, Clone)]
pub struct PolynomialPreconditioner {
    degree: usize,
    matrix: CsrMatrix,
    inv_diag: Vec<f64>,
}

impl PolynomialPreconditioner {
    /// 从矩阵与多项式阶数创建
    pub fn new(matrix: &CsrMatrix, degree: usize) -> Self {
        Self {
            degree,
            matrix: matrix.clone(),
            inv_diag: inverse_diagonal(matrix),
        }
    }

    /// 多项式阶数
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl Preconditioner for PolynomialPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        for ((zi, &ri), &d) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * d;
        }
        if self.degree == 0 {
            return;
        }
        let mut res = vec![0.0; r.len()];
        for _ in 0..self.degree {
            self.matrix.residual(r, z, &mut res);
            for ((zi, &ri), &d) in z.iter_mut().zip(&res).zip(&self.inv_diag) {
                *zi += ri * d;
            }
        }
    }

    fn name(&self) -> &'static str {
        match self.degree {
            0 => "Jacobi",
            1 => "Poly1",
            _ => "Poly2",
        }
    }

    fn update(&mut self, matrix: &CsrMatrix) {
        self.matrix = matrix.clone();
        self.inv_diag = inverse_diagonal(matrix);
    }
}
