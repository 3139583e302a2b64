// crates/cs_cdo/src/sles/native.rs

//! 内置求解器族
//!
//! [`native_plan`] 把 `SlesParam` 翻译为内置求解器的配置方案：
//! 多项式预条件阶数、迭代方法、代数多重网格的循环与光滑器参数。
//! [`NativeSolver`] 按方案在 CSR 矩阵上实际求解。

use crate::linalg::{
    BiCgStabSolver, CsrMatrix, GmresSolver, IdentityPreconditioner, JacobiPreconditioner, LinearSolver,
    PcgSolver, PolynomialPreconditioner, Preconditioner, SolverConfig, SolverResult, StationaryKind,
    StationarySolver,
};
use crate::sles_param::{AmgType, IterativeSolver, Preconditioner as PrecondKind, ResNormType, SlesParam};
use cs_foundation::{CsError, CsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const FUNC: &str = "setup_sles";

// ============================================================================
// 配置方案
// ============================================================================

/// 内置迭代方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeKind {
    /// BiCGStab
    Bicgstab,
    /// BiCGStab2
    Bicgstab2,
    /// 预条件共轭梯度
    Pcg,
    /// 三项递推共轭残差
    Pcr3,
    /// 反向预条件（柔性）共轭梯度
    Ipcg,
    /// GMRES
    Gmres,
    /// Jacobi
    Jacobi,
    /// Gauss-Seidel
    GaussSeidel,
    /// 对称 Gauss-Seidel
    SymGaussSeidel,
    /// 代数多重网格作为求解器
    Multigrid,
}

impl NativeKind {
    /// 显示名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bicgstab => "BiCGstab",
            Self::Bicgstab2 => "BiCGstab2",
            Self::Pcg => "PCG",
            Self::Pcr3 => "PCR3",
            Self::Ipcg => "IPCG",
            Self::Gmres => "GMRES",
            Self::Jacobi => "Jacobi",
            Self::GaussSeidel => "Gauss-Seidel",
            Self::SymGaussSeidel => "Symmetric Gauss-Seidel",
            Self::Multigrid => "Multigrid",
        }
    }

    /// 定常迭代不使用预条件
    pub fn is_stationary(&self) -> bool {
        matches!(self, Self::Jacobi | Self::GaussSeidel | Self::SymGaussSeidel)
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 多重网格循环
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultigridCycle {
    /// V 循环
    V,
    /// K 循环
    K,
}

/// 聚合粗化参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseningOptions {
    /// 聚合上限
    pub aggregation_limit: usize,
    /// 最大层数
    pub n_max_levels: usize,
    /// 最粗层最小单元数
    pub min_g_cells: usize,
}

/// 多重网格参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultigridOptions {
    /// 循环类型
    pub cycle: MultigridCycle,
    /// 下行光滑器
    pub descent_smoother: NativeKind,
    /// 上行光滑器
    pub ascent_smoother: NativeKind,
    /// 最粗层求解器
    pub coarse_solver: NativeKind,
    /// 最大循环次数
    pub n_max_cycles: usize,
    /// 下行光滑迭代次数
    pub n_max_iter_descent: usize,
    /// 上行光滑迭代次数
    pub n_max_iter_ascent: usize,
    /// 最粗层迭代次数
    pub n_max_iter_coarse: usize,
    /// 下行/上行/最粗层的多项式预条件阶数
    pub poly_degrees: [i32; 3],
    /// 下行/上行/最粗层的精度乘子（负值表示固定迭代次数）
    pub precision_mult: [f64; 3],
    /// 粗化参数，`None` 表示默认
    pub coarsening: Option<CoarseningOptions>,
}

impl MultigridOptions {
    /// 作为求解器时的参数
    pub fn for_solver(cycle: MultigridCycle, n_max_cycles: usize) -> Self {
        match cycle {
            MultigridCycle::V => Self {
                cycle,
                descent_smoother: NativeKind::Jacobi,
                ascent_smoother: NativeKind::Jacobi,
                coarse_solver: NativeKind::Pcg,
                n_max_cycles,
                n_max_iter_descent: 5,
                n_max_iter_ascent: 5,
                n_max_iter_coarse: 1000,
                poly_degrees: [0, 0, -1],
                precision_mult: [1.0, 1.0, 1.0],
                coarsening: None,
            },
            MultigridCycle::K => Self {
                cycle,
                descent_smoother: NativeKind::SymGaussSeidel,
                ascent_smoother: NativeKind::SymGaussSeidel,
                coarse_solver: NativeKind::Pcg,
                n_max_cycles,
                n_max_iter_descent: 1,
                n_max_iter_ascent: 1,
                n_max_iter_coarse: 100,
                poly_degrees: [0, 0, 0],
                precision_mult: [-1.0, -1.0, 1.0],
                coarsening: None,
            },
        }
    }

    /// 作为 Krylov 预条件子时的参数
    pub fn for_preconditioner(cycle: MultigridCycle, n_max_cycles: usize) -> Self {
        let coarsening = match cycle {
            MultigridCycle::V => None,
            MultigridCycle::K => Some(CoarseningOptions {
                aggregation_limit: 8,
                n_max_levels: 10,
                min_g_cells: 50,
            }),
        };
        Self {
            cycle,
            descent_smoother: NativeKind::Pcg,
            ascent_smoother: NativeKind::Pcg,
            coarse_solver: NativeKind::Pcg,
            n_max_cycles,
            n_max_iter_descent: 4,
            n_max_iter_ascent: 4,
            n_max_iter_coarse: 200,
            poly_degrees: [0, 0, 0],
            precision_mult: [-1.0, -1.0, 1.0],
            coarsening,
        }
    }
}

/// 内置求解器配置方案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativePlan {
    /// 迭代方法
    pub kind: NativeKind,
    /// 多项式预条件阶数（-1 表示无多项式预条件）
    pub poly_degree: i32,
    /// 最大迭代次数
    pub n_max_iter: usize,
    /// 收敛阈值
    pub eps: f64,
    /// 残差归一化方式
    pub resnorm_type: ResNormType,
    /// 多重网格参数：`kind` 为多重网格时描述求解器，否则描述预条件子
    pub multigrid: Option<MultigridOptions>,
}

impl NativePlan {
    /// 是否以多重网格作为预条件子
    pub fn has_multigrid_preconditioner(&self) -> bool {
        self.kind != NativeKind::Multigrid && self.multigrid.is_some()
    }
}

fn house_cycle(eq_name: &str, amg: AmgType) -> CsResult<MultigridCycle> {
    match amg {
        AmgType::HouseV => Ok(MultigridCycle::V),
        AmgType::HouseK => Ok(MultigridCycle::K),
        other => Err(CsError::invalid_key_value(eq_name, FUNC, "amg_type", other.name())),
    }
}

/// 由求解器参数生成内置求解器配置方案
///
/// K 循环多重网格预条件下的 CG 改用柔性 CG（IPCG），不修改 `slesp`。
pub fn native_plan(eq_name: &str, slesp: &SlesParam) -> CsResult<NativePlan> {
    let mut solver = slesp.solver;
    let mut pc_cycle = None;

    let mut poly_degree = match slesp.precond {
        PrecondKind::Diag => 0,
        PrecondKind::Poly1 => 1,
        PrecondKind::Poly2 => 2,
        PrecondKind::Amg => {
            let cycle = house_cycle(eq_name, slesp.amg_type)?;
            if cycle == MultigridCycle::K && solver == IterativeSolver::Cg {
                solver = IterativeSolver::Fcg;
            }
            pc_cycle = Some(cycle);
            -1
        }
        _ => -1,
    };

    let kind = match solver {
        IterativeSolver::Amg => NativeKind::Multigrid,
        IterativeSolver::Bicg => NativeKind::Bicgstab,
        IterativeSolver::Bicgstab2 => NativeKind::Bicgstab2,
        IterativeSolver::Cg => NativeKind::Pcg,
        IterativeSolver::Cr3 => NativeKind::Pcr3,
        IterativeSolver::Fcg | IterativeSolver::GkbCg => NativeKind::Ipcg,
        IterativeSolver::Gmres | IterativeSolver::GkbGmres => NativeKind::Gmres,
        IterativeSolver::Jacobi => NativeKind::Jacobi,
        IterativeSolver::GaussSeidel => NativeKind::GaussSeidel,
        IterativeSolver::SymGaussSeidel => NativeKind::SymGaussSeidel,
        other => return Err(CsError::invalid_key_value(eq_name, FUNC, "itsol", other.name())),
    };
    if kind.is_stationary() {
        poly_degree = -1;
    }

    let multigrid = match (kind, pc_cycle) {
        (NativeKind::Multigrid, Some(_)) => {
            return Err(CsError::invalid_key_value(
                eq_name,
                FUNC,
                "precond",
                PrecondKind::Amg.name(),
            ))
        }
        (NativeKind::Multigrid, None) => Some(MultigridOptions::for_solver(
            house_cycle(eq_name, slesp.amg_type)?,
            slesp.n_max_iter,
        )),
        (_, Some(cycle)) => Some(MultigridOptions::for_preconditioner(cycle, slesp.n_max_iter)),
        (_, None) => None,
    };

    Ok(NativePlan {
        kind,
        poly_degree,
        n_max_iter: slesp.n_max_iter,
        eps: slesp.eps,
        resnorm_type: slesp.resnorm_type,
        multigrid,
    })
}

// ============================================================================
// 运行时求解
// ============================================================================

/// 内置求解器
///
/// # 使用示例
///
/// ```
/// use cs_cdo::linalg::CsrMatrix;
/// use cs_cdo::sles::NativeSolver;
/// use cs_cdo::sles_param::{IterativeSolver, SlesParam};
///
/// let mut param = SlesParam::default();
/// param.solver = IterativeSolver::Cg;
/// let mut solver = NativeSolver::from_param("demo", &param).unwrap();
///
/// let a = CsrMatrix::diagonal(&[2.0, 4.0]);
/// let mut x = vec![0.0; 2];
/// let result = solver.solve(&a, &[2.0, 2.0], &mut x).unwrap();
/// assert!(result.is_converged());
/// assert!((x[1] - 0.5).abs() < 1e-10);
/// ```
pub struct NativeSolver {
    plan: NativePlan,
    solver: Box<dyn LinearSolver + Send>,
}

impl NativeSolver {
    /// 按配置方案创建
    ///
    /// 多重网格（求解器或预条件子）与 PCR3 没有内置运行时实现。
    pub fn from_plan(plan: NativePlan) -> CsResult<Self> {
        if plan.multigrid.is_some() {
            return Err(CsError::unsupported("内置多重网格求解"));
        }

        let config = SolverConfig::new(plan.eps, plan.n_max_iter).with_res_norm(plan.resnorm_type);
        let solver: Box<dyn LinearSolver + Send> = match plan.kind {
            NativeKind::Pcg | NativeKind::Ipcg => Box::new(PcgSolver::new(config)),
            NativeKind::Bicgstab | NativeKind::Bicgstab2 => Box::new(BiCgStabSolver::new(config)),
            NativeKind::Gmres => Box::new(GmresSolver::new(config)),
            NativeKind::Jacobi => Box::new(StationarySolver::new(config, StationaryKind::Jacobi)),
            NativeKind::GaussSeidel => Box::new(StationarySolver::new(config, StationaryKind::GaussSeidel)),
            NativeKind::SymGaussSeidel => {
                Box::new(StationarySolver::new(config, StationaryKind::SymmetricGaussSeidel))
            }
            NativeKind::Pcr3 | NativeKind::Multigrid => {
                return Err(CsError::unsupported(format!("内置 {} 求解", plan.kind)));
            }
        };

        Ok(Self { plan, solver })
    }

    /// 由求解器参数创建
    pub fn from_param(eq_name: &str, slesp: &SlesParam) -> CsResult<Self> {
        Self::from_plan(native_plan(eq_name, slesp)?)
    }

    /// 配置方案
    pub fn plan(&self) -> &NativePlan {
        &self.plan
    }

    fn preconditioner(&self, matrix: &CsrMatrix) -> Box<dyn Preconditioner> {
        match self.plan.poly_degree {
            d if d < 0 => Box::new(IdentityPreconditioner::new()),
            0 => Box::new(JacobiPreconditioner::from_matrix(matrix)),
            d => Box::new(PolynomialPreconditioner::new(matrix, d as usize)),
        }
    }

    /// 求解 Ax = b
    ///
    /// 矩阵必须为方阵且与 `b`、`x` 长度一致。未收敛不视为错误，
    /// 由调用者根据 [`SolverResult::status`] 处理。
    pub fn solve(&mut self, matrix: &CsrMatrix, b: &[f64], x: &mut [f64]) -> CsResult<SolverResult> {
        CsError::check_size("matrix columns", matrix.n_rows(), matrix.n_cols())?;
        CsError::check_size("rhs", matrix.n_rows(), b.len())?;
        CsError::check_size("solution", matrix.n_rows(), x.len())?;

        let precond = self.preconditioner(matrix);
        let result = self.solver.solve(matrix, b, x, precond.as_ref());
        log::debug!(
            "{} ({}): {:?}, {} 次迭代, 残差 {:.3e}",
            self.solver.name(),
            precond.name(),
            result.status,
            result.iterations,
            result.residual_norm
        );
        Ok(result)
    }
}
