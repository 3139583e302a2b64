// crates/cs_cdo/src/sles/mod.rs

//! 线性求解器配置
//!
//! 根据方程的 [`SlesParam`](crate::sles_param::SlesParam) 生成求解器配置方案。
//! 每个方程只配置一次：成功后置位 `setup_done`，再次调用返回 `None`。
//!
//! # 模块概览
//!
//! - [`native`]: 内置求解器族的方案与运行时求解器
//! - [`petsc`]: PETSc / HYPRE 求解器族的方案
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::equation_param::EquationParam;
//! use cs_cdo::param::{BcType, EquationType};
//! use cs_cdo::sles::{setup_sles, SlesBackends, SlesPlan};
//!
//! let mut eqp = EquationParam::new("Temperature", EquationType::User, 1, BcType::HmgNeumann);
//! eqp.set_param_str("itsol", "cg").unwrap();
//!
//! let setup = setup_sles(&mut eqp, &SlesBackends::default()).unwrap().unwrap();
//! assert!(matches!(setup.plan, SlesPlan::Native(_)));
//! assert!(setup_sles(&mut eqp, &SlesBackends::default()).unwrap().is_none());
//! ```

pub mod native;
pub mod petsc;

pub use native::{native_plan, MultigridCycle, MultigridOptions, NativeKind, NativePlan, NativeSolver};
pub use petsc::{petsc_plan, KspNormType, PetscHook, PetscPlan};

use crate::equation_param::EquationParam;
use crate::sles_param::SolverClass;
use cs_foundation::CsResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 可用的外部求解器库
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlesBackends {
    /// PETSc
    pub petsc: bool,
    /// PETSc 内的 HYPRE
    pub hypre: bool,
    /// PETSc 内的 MUMPS
    pub mumps: bool,
}

impl SlesBackends {
    /// 只有 PETSc
    pub fn petsc_only() -> Self {
        Self {
            petsc: true,
            hypre: false,
            mumps: false,
        }
    }

    /// 全部可用
    pub fn all() -> Self {
        Self {
            petsc: true,
            hypre: true,
            mumps: true,
        }
    }
}

/// 配置方案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlesPlan {
    /// 内置求解器
    Native(NativePlan),
    /// PETSc / HYPRE
    Petsc(PetscPlan),
}

/// 一个方程的线性求解器配置结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlesSetup {
    /// 方程名
    pub eq_name: String,
    /// 关联场编号
    pub field_id: i32,
    /// 传给求解器的输出详细程度（`sles_verbosity > 1` 时）
    pub verbosity: Option<i32>,
    /// 是否输出收敛曲线（内置求解器且 `sles_verbosity > 3`）
    pub plot: bool,
    /// 配置方案
    pub plan: SlesPlan,
}

/// 配置方程的线性求解器
///
/// 已配置过（`setup_done`）时返回 `Ok(None)`，不做任何修改。出错时不置位。
pub fn setup_sles(eqp: &mut EquationParam, backends: &SlesBackends) -> CsResult<Option<SlesSetup>> {
    if eqp.sles().setup_done {
        log::debug!("方程 \"{}\": 线性求解器已配置，跳过", eqp.name());
        return Ok(None);
    }

    let slesp = eqp.sles();
    let plan = match slesp.solver_class {
        SolverClass::Cs => SlesPlan::Native(native_plan(eqp.name(), slesp)?),
        SolverClass::Petsc | SolverClass::Hypre => {
            SlesPlan::Petsc(petsc_plan(eqp.name(), eqp.dim(), slesp, backends)?)
        }
    };

    let setup = SlesSetup {
        eq_name: eqp.name().to_string(),
        field_id: slesp.field_id,
        verbosity: (slesp.verbosity > 1).then_some(slesp.verbosity),
        plot: slesp.solver_class == SolverClass::Cs && slesp.verbosity > 3,
        plan,
    };

    eqp.sles_mut().setup_done = true;
    log::info!("方程 \"{}\": {}", setup.eq_name, setup);
    Ok(Some(setup))
}

impl fmt::Display for SlesSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plan {
            SlesPlan::Native(p) => {
                write!(f, "内置 {} (多项式预条件阶数 {}", p.kind, p.poly_degree)?;
                if let Some(mg) = &p.multigrid {
                    let role = if p.kind == NativeKind::Multigrid { "求解器" } else { "预条件子" };
                    write!(f, ", {:?} 循环多重网格{}", mg.cycle, role)?;
                }
                write!(f, ", 最多 {} 次迭代, eps = {:e})", p.n_max_iter, p.eps)
            }
            SlesPlan::Petsc(p) => {
                write!(f, "PETSc ksp = {}, pc = {}", p.ksp_type, p.pc_type)?;
                if let Some(sub) = &p.sub_pc_type {
                    write!(f, " [{} × {}]", p.block_size, sub)?;
                }
                write!(f, " (rtol = {:e}, max_it = {})", p.rtol, p.max_it)
            }
        }
    }
}
