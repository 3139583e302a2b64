// crates/cs_cdo/src/linalg/krylov.rs

//! 迭代线性求解器
//!
//! # 求解器类型
//!
//! - [`PcgSolver`]: 预条件共轭梯度法（对称正定）
//! - [`BiCgStabSolver`]: 双共轭梯度稳定法（非对称）
//! - [`GmresSolver`]: 重启 GMRES（右预条件）
//! - [`StationarySolver`]: Jacobi / Gauss-Seidel / 对称 Gauss-Seidel
//!
//! 收敛判据为 `‖r‖ < max(atol, rtol · ‖·‖_ref)`，参考范数由
//! [`ResNormType`] 决定，见 [`convergence_threshold`]。
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::linalg::{CsrBuilder, JacobiPreconditioner, LinearSolver, PcgSolver, SolverConfig};
//!
//! let mut b = CsrBuilder::new_square(2);
//! b.set(0, 0, 4.0);
//! b.set(0, 1, 1.0);
//! b.set(1, 0, 1.0);
//! b.set(1, 1, 3.0);
//! let a = b.build();
//!
//! let precond = JacobiPreconditioner::from_matrix(&a);
//! let mut solver = PcgSolver::new(SolverConfig::new(1e-10, 50));
//! let mut x = vec![0.0; 2];
//! let result = solver.solve(&a, &[1.0, 2.0], &mut x, &precond);
//! assert!(result.is_converged());
//! ```

use super::csr::CsrMatrix;
use super::precond::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2, norm_inf};
use crate::sles_param::ResNormType;
use serde::{Deserialize, Serialize};

/// 分母低于此值视为中断
const BREAKDOWN_TOL: f64 = 1e-30;

// ============================================================================
// 配置与结果
// ============================================================================

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 残差归一化方式
    pub res_norm: ResNormType,
    /// 是否记录每次迭代的残差
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-14,
            max_iter: 1000,
            res_norm: ResNormType::None,
            verbose: false,
        }
    }
}

impl SolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    /// 设置残差归一化方式
    pub fn with_res_norm(mut self, res_norm: ResNormType) -> Self {
        self.res_norm = res_norm;
        self
    }

    /// 启用详细输出
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 相对残差
    pub relative_residual: f64,
}

impl SolverResult {
    fn new(status: SolverStatus, iterations: usize, residual_norm: f64, initial: f64) -> Self {
        Self {
            status,
            iterations,
            residual_norm,
            initial_residual_norm: initial,
            relative_residual: if initial > 0.0 { residual_norm / initial } else { 0.0 },
        }
    }

    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// 收敛阈值
///
/// - 不归一化：初始残差范数
/// - 右端项：‖b‖₂
/// - 加权：‖b‖₂ / √n
/// - 过滤：只计入 |b_i| 高于舍入量级的分量
pub fn convergence_threshold(config: &SolverConfig, b: &[f64], initial_residual: f64) -> f64 {
    let reference = match config.res_norm {
        ResNormType::None => initial_residual,
        ResNormType::NormRhs => norm2(b),
        ResNormType::WeightedRhs => {
            if b.is_empty() {
                0.0
            } else {
                norm2(b) / (b.len() as f64).sqrt()
            }
        }
        ResNormType::FilteredRhs => {
            let cutoff = f64::EPSILON * norm_inf(b);
            b.iter().filter(|v| v.abs() > cutoff).map(|v| v * v).sum::<f64>().sqrt()
        }
    };
    config.atol.max(config.rtol * reference)
}

/// 迭代求解器 trait
pub trait LinearSolver {
    /// 求解 Ax = b，`x` 输入初值、输出解
    fn solve(&mut self, matrix: &CsrMatrix, b: &[f64], x: &mut [f64], precond: &dyn Preconditioner) -> SolverResult;

    /// 求解器名称
    fn name(&self) -> &'static str;
}

fn trace_iteration(config: &SolverConfig, name: &str, iter: usize, res: f64) {
    if config.verbose {
        log::trace!("{} iter {}: residual = {:.6e}", name, iter, res);
    }
}

// ============================================================================
// PCG
// ============================================================================

/// 预条件共轭梯度法
pub struct PcgSolver {
    config: SolverConfig,
    r: Vec<f64>,
    z: Vec<f64>,
    p: Vec<f64>,
    ap: Vec<f64>,
}

impl PcgSolver {
    /// 创建 PCG 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            z: Vec::new(),
            p: Vec::new(),
            ap: Vec::new(),
        }
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.z = vec![0.0; n];
            self.p = vec![0.0; n];
            self.ap = vec![0.0; n];
        }
    }
}

impl LinearSolver for PcgSolver {
    fn solve(&mut self, matrix: &CsrMatrix, b: &[f64], x: &mut [f64], precond: &dyn Preconditioner) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);

        matrix.residual(b, x, &mut self.r);
        let initial_norm = norm2(&self.r);
        let tol = convergence_threshold(&self.config, b, initial_norm);
        if initial_norm < tol {
            return SolverResult::new(SolverStatus::Converged, 0, initial_norm, initial_norm);
        }

        precond.apply(&self.r, &mut self.z);
        copy(&self.z, &mut self.p);
        let mut rz = dot(&self.r, &self.z);

        for iter in 0..self.config.max_iter {
            matrix.mul_vec(&self.p, &mut self.ap);

            let pap = dot(&self.p, &self.ap);
            if pap.abs() < BREAKDOWN_TOL {
                return SolverResult::new(SolverStatus::Stagnated, iter, norm2(&self.r), initial_norm);
            }
            let alpha = rz / pap;

            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.ap, &mut self.r);

            let res_norm = norm2(&self.r);
            trace_iteration(&self.config, "PCG", iter + 1, res_norm);
            if res_norm < tol {
                return SolverResult::new(SolverStatus::Converged, iter + 1, res_norm, initial_norm);
            }

            precond.apply(&self.r, &mut self.z);
            let rz_new = dot(&self.r, &self.z);
            let beta = rz_new / rz;
            rz = rz_new;

            for i in 0..n {
                self.p[i] = self.z[i] + beta * self.p[i];
            }
        }

        SolverResult::new(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            norm2(&self.r),
            initial_norm,
        )
    }

    fn name(&self) -> &'static str {
        "PCG"
    }
}

// ============================================================================
// BiCGStab
// ============================================================================

/// 双共轭梯度稳定法
pub struct BiCgStabSolver {
    config: SolverConfig,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    z: Vec<f64>,
}

impl BiCgStabSolver {
    /// 创建 BiCGStab 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            z: Vec::new(),
        }
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.z = vec![0.0; n];
        }
    }
}

impl LinearSolver for BiCgStabSolver {
    fn solve(&mut self, matrix: &CsrMatrix, b: &[f64], x: &mut [f64], precond: &dyn Preconditioner) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);

        matrix.residual(b, x, &mut self.r);
        let initial_norm = norm2(&self.r);
        let tol = convergence_threshold(&self.config, b, initial_norm);
        if initial_norm < tol {
            return SolverResult::new(SolverStatus::Converged, 0, initial_norm, initial_norm);
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);
        self.v.fill(0.0);
        self.p.fill(0.0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);
            if rho.abs() < BREAKDOWN_TOL {
                return SolverResult::new(SolverStatus::Stagnated, iter, norm2(&self.r), initial_norm);
            }

            let beta = if iter == 0 { 0.0 } else { (rho / rho_old) * (alpha / omega) };
            rho_old = rho;

            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            precond.apply(&self.p, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < BREAKDOWN_TOL {
                return SolverResult::new(SolverStatus::Stagnated, iter, norm2(&self.r), initial_norm);
            }
            alpha = rho / r0v;

            // x += alpha * M⁻¹p
            axpy(alpha, &self.z, x);

            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }
            let s_norm = norm2(&self.s);
            if s_norm < tol {
                trace_iteration(&self.config, "BiCGStab", iter + 1, s_norm);
                return SolverResult::new(SolverStatus::Converged, iter + 1, s_norm, initial_norm);
            }

            precond.apply(&self.s, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt < BREAKDOWN_TOL { 0.0 } else { dot(&self.t, &self.s) / tt };
            if omega.abs() < BREAKDOWN_TOL {
                copy(&self.s, &mut self.r);
                return SolverResult::new(SolverStatus::Stagnated, iter + 1, s_norm, initial_norm);
            }

            axpy(omega, &self.z, x);
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            trace_iteration(&self.config, "BiCGStab", iter + 1, res_norm);
            if res_norm < tol {
                return SolverResult::new(SolverStatus::Converged, iter + 1, res_norm, initial_norm);
            }
            if !res_norm.is_finite() {
                return SolverResult::new(SolverStatus::Diverged, iter + 1, res_norm, initial_norm);
            }
        }

        SolverResult::new(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            norm2(&self.r),
            initial_norm,
        )
    }

    fn name(&self) -> &'static str {
        "BiCGStab"
    }
}

// ============================================================================
// GMRES
// ============================================================================

/// 重启 GMRES（右预条件，残差为真实残差）
pub struct GmresSolver {
    config: SolverConfig,
    restart: usize,
}

impl GmresSolver {
    /// 默认重启长度
    pub const DEFAULT_RESTART: usize = 30;

    /// 创建 GMRES 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            restart: Self::DEFAULT_RESTART,
        }
    }

    /// 设置重启长度
    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = restart.max(1);
        self
    }
}

impl LinearSolver for GmresSolver {
    fn solve(&mut self, matrix: &CsrMatrix, b: &[f64], x: &mut [f64], precond: &dyn Preconditioner) -> SolverResult {
        let n = b.len();
        let m = self.restart;
        let mut r = vec![0.0; n];
        let mut w = vec![0.0; n];
        let mut z = vec![0.0; n];

        matrix.residual(b, x, &mut r);
        let initial_norm = norm2(&r);
        let tol = convergence_threshold(&self.config, b, initial_norm);
        if initial_norm < tol {
            return SolverResult::new(SolverStatus::Converged, 0, initial_norm, initial_norm);
        }

        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(m + 1);
        let mut h = vec![vec![0.0; m]; m + 1];
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];
        let mut g = vec![0.0; m + 1];

        let mut iter = 0;
        let mut res_norm = initial_norm;

        while iter < self.config.max_iter {
            matrix.residual(b, x, &mut r);
            let beta = norm2(&r);
            res_norm = beta;
            if beta < tol {
                return SolverResult::new(SolverStatus::Converged, iter, beta, initial_norm);
            }

            basis.clear();
            basis.push(r.iter().map(|v| v / beta).collect());
            g.iter_mut().for_each(|v| *v = 0.0);
            g[0] = beta;

            let mut k = 0;
            while k < m && iter < self.config.max_iter {
                precond.apply(&basis[k], &mut z);
                matrix.mul_vec(&z, &mut w);

                // 修正 Gram-Schmidt
                for (i, v) in basis.iter().enumerate() {
                    h[i][k] = dot(&w, v);
                    axpy(-h[i][k], v, &mut w);
                }
                h[k + 1][k] = norm2(&w);
                let happy = h[k + 1][k] < BREAKDOWN_TOL;
                if !happy {
                    let inv = 1.0 / h[k + 1][k];
                    basis.push(w.iter().map(|v| v * inv).collect());
                }

                for i in 0..k {
                    let tmp = cs[i] * h[i][k] + sn[i] * h[i + 1][k];
                    h[i + 1][k] = -sn[i] * h[i][k] + cs[i] * h[i + 1][k];
                    h[i][k] = tmp;
                }
                let denom = h[k][k].hypot(h[k + 1][k]);
                if denom < BREAKDOWN_TOL {
                    return SolverResult::new(SolverStatus::Stagnated, iter, res_norm, initial_norm);
                }
                cs[k] = h[k][k] / denom;
                sn[k] = h[k + 1][k] / denom;
                h[k][k] = denom;
                h[k + 1][k] = 0.0;
                g[k + 1] = -sn[k] * g[k];
                g[k] *= cs[k];

                k += 1;
                iter += 1;
                res_norm = g[k].abs();
                trace_iteration(&self.config, "GMRES", iter, res_norm);
                if res_norm < tol || happy {
                    break;
                }
            }

            // 回代求 y，更新 x += M⁻¹ (V y)
            let mut y = vec![0.0; k];
            for i in (0..k).rev() {
                let s: f64 = ((i + 1)..k).map(|j| h[i][j] * y[j]).sum();
                y[i] = (g[i] - s) / h[i][i];
            }
            w.iter_mut().for_each(|v| *v = 0.0);
            for (yi, v) in y.iter().zip(&basis) {
                axpy(*yi, v, &mut w);
            }
            precond.apply(&w, &mut z);
            axpy(1.0, &z, x);

            if res_norm < tol {
                matrix.residual(b, x, &mut r);
                return SolverResult::new(SolverStatus::Converged, iter, norm2(&r), initial_norm);
            }
        }

        SolverResult::new(SolverStatus::MaxIterationsReached, iter, res_norm, initial_norm)
    }

    fn name(&self) -> &'static str {
        "GMRES"
    }
}

// ============================================================================
// 定常迭代
// ============================================================================

/// 定常迭代类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationaryKind {
    /// Jacobi
    Jacobi,
    /// 前向 Gauss-Seidel
    GaussSeidel,
    /// 前向 + 后向 Gauss-Seidel
    SymmetricGaussSeidel,
}

/// 定常迭代求解器（不使用预条件器）
pub struct StationarySolver {
    config: SolverConfig,
    kind: StationaryKind,
    r: Vec<f64>,
    prev: Vec<f64>,
}

impl StationarySolver {
    /// 创建定常迭代求解器
    pub fn new(config: SolverConfig, kind: StationaryKind) -> Self {
        Self {
            config,
            kind,
            r: Vec::new(),
            prev: Vec::new(),
        }
    }

    fn relax_row(matrix: &CsrMatrix, b: &[f64], src: &[f64], row: usize) -> f64 {
        let mut diag = 0.0;
        let mut off = 0.0;
        for (col, a) in matrix.row(row) {
            if col == row {
                diag = a;
            } else {
                off += a * src[col];
            }
        }
        if diag.abs() < BREAKDOWN_TOL {
            src[row]
        } else {
            (b[row] - off) / diag
        }
    }

    fn sweep(&mut self, matrix: &CsrMatrix, b: &[f64], x: &mut [f64]) {
        let n = b.len();
        match self.kind {
            StationaryKind::Jacobi => {
                copy(x, &mut self.prev);
                for i in 0..n {
                    x[i] = Self::relax_row(matrix, b, &self.prev, i);
                }
            }
            StationaryKind::GaussSeidel => {
                for i in 0..n {
                    x[i] = Self::relax_row(matrix, b, x, i);
                }
            }
            StationaryKind::SymmetricGaussSeidel => {
                for i in 0..n {
                    x[i] = Self::relax_row(matrix, b, x, i);
                }
                for i in (0..n).rev() {
                    x[i] = Self::relax_row(matrix, b, x, i);
                }
            }
        }
    }
}

impl LinearSolver for StationarySolver {
    fn solve(&mut self, matrix: &CsrMatrix, b: &[f64], x: &mut [f64], _precond: &dyn Preconditioner) -> SolverResult {
        let n = b.len();
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.prev = vec![0.0; n];
        }

        matrix.residual(b, x, &mut self.r);
        let initial_norm = norm2(&self.r);
        let tol = convergence_threshold(&self.config, b, initial_norm);
        if initial_norm < tol {
            return SolverResult::new(SolverStatus::Converged, 0, initial_norm, initial_norm);
        }

        for iter in 0..self.config.max_iter {
            self.sweep(matrix, b, x);
            matrix.residual(b, x, &mut self.r);
            let res_norm = norm2(&self.r);
            trace_iteration(&self.config, self.name(), iter + 1, res_norm);
            if res_norm < tol {
                return SolverResult::new(SolverStatus::Converged, iter + 1, res_norm, initial_norm);
            }
            if !res_norm.is_finite() {
                return SolverResult::new(SolverStatus::Diverged, iter + 1, res_norm, initial_norm);
            }
        }

        SolverResult::new(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            norm2(&self.r),
            initial_norm,
        )
    }

    fn name(&self) -> &'static str {
        match self.kind {
            StationaryKind::Jacobi => "Jacobi",
            StationaryKind::GaussSeidel => "Gauss-Seidel",
            StationaryKind::SymmetricGaussSeidel => "Symmetric Gauss-Seidel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::csr::CsrBuilder;
    use crate::linalg::precond::{IdentityPreconditioner, JacobiPreconditioner, PolynomialPreconditioner};

    /// 1D Poisson + 质量项，对称正定且对角占优
    fn poisson(n: usize) -> CsrMatrix {
        let mut b = CsrBuilder::new_square(n);
        for i in 0..n {
            b.set(i, i, 2.5);
            if i > 0 {
                b.set(i, i - 1, -1.0);
            }
            if i + 1 < n {
                b.set(i, i + 1, -1.0);
            }
        }
        b.build()
    }

    /// 带对流项的非对称矩阵
    fn convection(n: usize) -> CsrMatrix {
        let mut b = CsrBuilder::new_square(n);
        for i in 0..n {
            b.set(i, i, 3.0);
            if i > 0 {
                b.set(i, i - 1, -1.5);
            }
            if i + 1 < n {
                b.set(i, i + 1, -0.5);
            }
        }
        b.build()
    }

    fn check_solution(a: &CsrMatrix, b: &[f64], x: &[f64], tol: f64) {
        let mut r = vec![0.0; b.len()];
        a.residual(b, x, &mut r);
        assert!(norm2(&r) < tol, "residual {}", norm2(&r));
    }

    #[test]
    fn test_pcg_converges() {
        let a = poisson(50);
        let b = vec![1.0; 50];
        let mut x = vec![0.0; 50];
        let mut solver = PcgSolver::new(SolverConfig::new(1e-10, 200));
        let res = solver.solve(&a, &b, &mut x, &JacobiPreconditioner::from_matrix(&a));
        assert!(res.is_converged());
        check_solution(&a, &b, &x, 1e-8);
    }

    #[test]
    fn test_bicgstab_nonsymmetric() {
        let a = convection(40);
        let b: Vec<f64> = (0..40).map(|i| (i as f64).sin()).collect();
        let mut x = vec![0.0; 40];
        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-10, 200));
        let res = solver.solve(&a, &b, &mut x, &IdentityPreconditioner::new());
        assert!(res.is_converged());
        check_solution(&a, &b, &x, 1e-8);
    }

    #[test]
    fn test_gmres_with_restart() {
        let a = convection(60);
        let b = vec![1.0; 60];
        let mut x = vec![0.0; 60];
        let mut solver = GmresSolver::new(SolverConfig::new(1e-10, 500)).with_restart(5);
        let precond = PolynomialPreconditioner::new(&a, 1);
        let res = solver.solve(&a, &b, &mut x, &precond);
        assert!(res.is_converged(), "{:?}", res);
        check_solution(&a, &b, &x, 1e-8);
    }

    #[test]
    fn test_stationary_solvers() {
        let a = poisson(20);
        let b = vec![1.0; 20];
        let mut iters = Vec::new();
        for kind in [
            StationaryKind::Jacobi,
            StationaryKind::GaussSeidel,
            StationaryKind::SymmetricGaussSeidel,
        ] {
            let mut x = vec![0.0; 20];
            let mut solver = StationarySolver::new(SolverConfig::new(1e-10, 2000), kind);
            let res = solver.solve(&a, &b, &mut x, &IdentityPreconditioner::new());
            assert!(res.is_converged(), "{}", solver.name());
            check_solution(&a, &b, &x, 1e-8);
            iters.push(res.iterations);
        }
        // Gauss-Seidel 比 Jacobi 收敛快
        assert!(iters[1] < iters[0]);
    }

    #[test]
    fn test_threshold_by_norm_type() {
        let b = [3.0, 4.0, 0.0, 0.0];
        let cfg = SolverConfig::new(0.1, 10).with_res_norm(ResNormType::NormRhs);
        assert!((convergence_threshold(&cfg, &b, 100.0) - 0.5).abs() < 1e-14);

        let cfg = cfg.with_res_norm(ResNormType::WeightedRhs);
        assert!((convergence_threshold(&cfg, &b, 100.0) - 0.25).abs() < 1e-14);

        let cfg = cfg.with_res_norm(ResNormType::None);
        assert!((convergence_threshold(&cfg, &b, 100.0) - 10.0).abs() < 1e-12);

        let cfg = cfg.with_res_norm(ResNormType::FilteredRhs);
        assert!((convergence_threshold(&cfg, &[3.0, 4.0, 1e-300], 0.0) - 0.5).abs() < 1e-14);

        // 零右端项时退化为绝对容差
        let cfg = SolverConfig::new(0.1, 10).with_res_norm(ResNormType::NormRhs);
        assert_eq!(convergence_threshold(&cfg, &[0.0; 3], 1.0), cfg.atol);
    }

    #[test]
    fn test_zero_rhs_converges_immediately() {
        let a = poisson(5);
        let mut x = vec![0.0; 5];
        let mut solver = PcgSolver::new(SolverConfig::default());
        let res = solver.solve(&a, &[0.0; 5], &mut x, &IdentityPreconditioner::new());
        assert!(res.is_converged());
        assert_eq!(res.iterations, 0);
    }
}
