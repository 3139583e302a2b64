// crates/cs_cdo/src/sles/petsc.rs

//! PETSc / HYPRE 求解器族
//!
//! 不链接 PETSc，只生成等价的配置方案：KSP 类型、PC 类型、
//! 残差范数类型以及需要写入选项数据库的键值对。外部库缺失时
//! 能安全替代的情形记录警告并替代，否则返回错误。

use super::SlesBackends;
use crate::sles_param::{AmgType, IterativeSolver, Preconditioner, ResNormType, SlesParam, SolverClass};
use cs_foundation::{CsError, CsResult};
use serde::{Deserialize, Serialize};

const FUNC: &str = "setup_sles";

/// GMRES 重启长度
pub const GMRES_RESTART: usize = 40;

/// 求解前的设置钩子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PetscHook {
    /// 通用设置
    Generic,
    /// 按分量分块，每块 GAMG
    AmgBlockGamg,
    /// 按分量分块，每块 BoomerAMG
    AmgBlockBoomer,
    /// 按分量分块，每块块 Jacobi
    BlockJacobi,
}

/// KSP 残差范数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KspNormType {
    /// 不计算残差范数
    None,
    /// 未预条件残差
    Unpreconditioned,
}

/// PETSc 配置方案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetscPlan {
    /// 设置钩子
    pub hook: PetscHook,
    /// KSP 类型
    pub ksp_type: String,
    /// PC 类型
    pub pc_type: String,
    /// 分块时每个子块的 PC 类型
    pub sub_pc_type: Option<String>,
    /// 分块数（按分量）
    pub block_size: usize,
    /// 残差范数类型
    pub norm_type: KspNormType,
    /// 相对收敛阈值
    pub rtol: f64,
    /// 最大迭代次数
    pub max_it: usize,
    /// GMRES 重启长度
    pub gmres_restart: Option<usize>,
    /// 选项数据库键值
    pub options: Vec<(String, String)>,
}

impl PetscPlan {
    fn set_option(&mut self, key: &str, value: &str) {
        self.options.push((key.to_string(), value.to_string()));
    }

    fn pcmg_options(&mut self) {
        self.set_option("-mg_levels_ksp_type", "richardson");
        self.set_option("-mg_levels_pc_type", "sor");
        self.set_option("-mg_levels_ksp_max_it", "1");
    }

    fn gamg_options(&mut self) {
        self.pcmg_options();
        self.set_option("-pc_gamg_threshold", "0.02");
        self.set_option("-pc_gamg_reuse_interpolation", "TRUE");
        self.set_option("-pc_gamg_square_graph", "4");
    }

    fn boomer_options(&mut self) {
        self.set_option("-pc_hypre_type", "boomeramg");
        self.set_option("-pc_hypre_boomeramg_coarsen_type", "HMIS");
        self.set_option("-pc_hypre_boomeramg_interp_type", "ext+i-cc");
        self.set_option("-pc_hypre_boomeramg_agg_nl", "2");
        self.set_option("-pc_hypre_boomeramg_P_max", "4");
        self.set_option("-pc_hypre_boomeramg_strong_threshold", "0.5");
        self.set_option("-pc_hypre_boomeramg_no_CF", "");
    }

    /// 选项值
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

fn use_hypre(slesp: &SlesParam, backends: &SlesBackends) -> bool {
    slesp.solver_class == SolverClass::Hypre && backends.hypre
}

fn is_direct(solver: IterativeSolver) -> bool {
    matches!(solver, IterativeSolver::Mumps | IterativeSolver::MumpsLdlt)
}

fn select_hook(eq_name: &str, dim: usize, slesp: &SlesParam, backends: &SlesBackends) -> CsResult<PetscHook> {
    match slesp.precond {
        Preconditioner::AmgBlock => match slesp.amg_type {
            AmgType::PetscGamg => Ok(PetscHook::AmgBlockGamg),
            AmgType::HypreBoomer if backends.hypre => Ok(PetscHook::AmgBlockBoomer),
            AmgType::HypreBoomer => {
                log::warn!(
                    "方程 \"{}\": BoomerAMG 不可用 (未链接 HYPRE)，改用 GAMG",
                    eq_name
                );
                Ok(PetscHook::AmgBlockGamg)
            }
            other => Err(CsError::invalid_key_value(eq_name, FUNC, "amg_type", other.name())),
        },
        Preconditioner::BJacobIlu0 | Preconditioner::BJacobSgs if dim > 1 => Ok(PetscHook::BlockJacobi),
        _ => Ok(PetscHook::Generic),
    }
}

fn krylov_type(eq_name: &str, slesp: &SlesParam, backends: &SlesBackends) -> CsResult<&'static str> {
    let ksp = match slesp.solver {
        IterativeSolver::None => "preonly",
        IterativeSolver::Bicg => "ibcgs",
        IterativeSolver::Bicgstab2 => "bcgsl",
        IterativeSolver::Cg => match slesp.precond {
            Preconditioner::Amg | Preconditioner::AmgBlock => "fcg",
            _ => "cg",
        },
        IterativeSolver::Fcg => "fcg",
        IterativeSolver::Fgmres => "fgmres",
        IterativeSolver::Gmres => "lgmres",
        IterativeSolver::Minres => "minres",
        IterativeSolver::Mumps | IterativeSolver::MumpsLdlt => {
            if !backends.mumps {
                return Err(CsError::unsupported(format!(
                    "方程 \"{}\": MUMPS (未链接到 PETSc)",
                    eq_name
                )));
            }
            "preonly"
        }
        other => return Err(CsError::invalid_key_value(eq_name, FUNC, "itsol", other.name())),
    };
    Ok(ksp)
}

fn generic_pc(eq_name: &str, slesp: &SlesParam, backends: &SlesBackends, plan: &mut PetscPlan) -> CsResult<()> {
    match slesp.solver {
        IterativeSolver::Mumps => {
            plan.pc_type = "lu".to_string();
            return Ok(());
        }
        IterativeSolver::MumpsLdlt => {
            plan.pc_type = "cholesky".to_string();
            return Ok(());
        }
        _ => {}
    }

    let pc_type = match slesp.precond {
        Preconditioner::None => "none",
        Preconditioner::Diag => "jacobi",
        Preconditioner::BJacobIlu0 | Preconditioner::BJacobSgs => "bjacobi",
        Preconditioner::Ssor => "sor",
        Preconditioner::Icc0 | Preconditioner::Ilu0 if use_hypre(slesp, backends) => {
            plan.set_option("-pc_hypre_type", "euclid");
            plan.set_option("-pc_euclid_level", "0");
            "hypre"
        }
        Preconditioner::Icc0 => "icc",
        Preconditioner::Ilu0 => "bjacobi",
        Preconditioner::As => "asm",
        Preconditioner::Amg => match slesp.amg_type {
            AmgType::PetscGamg => {
                plan.gamg_options();
                "gamg"
            }
            AmgType::PetscPcmg => {
                plan.pcmg_options();
                "mg"
            }
            AmgType::HypreBoomer if backends.hypre => {
                plan.boomer_options();
                "hypre"
            }
            AmgType::HypreBoomer => {
                log::warn!(
                    "方程 \"{}\": BoomerAMG 不可用 (未链接 HYPRE)，改用 GAMG",
                    eq_name
                );
                plan.gamg_options();
                "gamg"
            }
            other => return Err(CsError::invalid_key_value(eq_name, FUNC, "amg_type", other.name())),
        },
        other => return Err(CsError::invalid_key_value(eq_name, FUNC, "precond", other.name())),
    };
    plan.pc_type = pc_type.to_string();
    Ok(())
}

/// 由求解器参数生成 PETSc 配置方案
///
/// 未链接 PETSc 时返回 [`CsError::Unsupported`]。
pub fn petsc_plan(eq_name: &str, dim: usize, slesp: &SlesParam, backends: &SlesBackends) -> CsResult<PetscPlan> {
    if !backends.petsc {
        return Err(CsError::unsupported(format!(
            "方程 \"{}\": 请求的 PETSc 求解器未链接",
            eq_name
        )));
    }

    let hook = select_hook(eq_name, dim, slesp, backends)?;
    let ksp_type = krylov_type(eq_name, slesp, backends)?;

    // BiCGStab 只支持未预条件残差范数
    let norm_type = match (slesp.resnorm_type, slesp.solver) {
        (_, IterativeSolver::Bicg) => KspNormType::Unpreconditioned,
        (ResNormType::None, _) => KspNormType::None,
        _ => KspNormType::Unpreconditioned,
    };

    let mut plan = PetscPlan {
        hook,
        ksp_type: ksp_type.to_string(),
        pc_type: String::new(),
        sub_pc_type: None,
        block_size: 1,
        norm_type,
        rtol: slesp.eps,
        max_it: slesp.n_max_iter,
        gmres_restart: None,
        options: Vec::new(),
    };

    if slesp.solver == IterativeSolver::Gmres {
        plan.set_option("-ksp_gmres_modifiedgramschmidt", "1");
        plan.gmres_restart = Some(GMRES_RESTART);
    }

    match hook {
        PetscHook::Generic => generic_pc(eq_name, slesp, backends, &mut plan)?,
        PetscHook::AmgBlockGamg | PetscHook::AmgBlockBoomer | PetscHook::BlockJacobi => {
            if is_direct(slesp.solver) {
                return Err(CsError::invalid_key_value(eq_name, FUNC, "itsol", slesp.solver.name()));
            }
            plan.pc_type = "fieldsplit".to_string();
            plan.block_size = dim;
            let sub = match hook {
                PetscHook::AmgBlockGamg => {
                    plan.gamg_options();
                    "gamg"
                }
                PetscHook::AmgBlockBoomer => {
                    plan.boomer_options();
                    "hypre"
                }
                _ if use_hypre(slesp, backends) => {
                    plan.set_option("-pc_hypre_type", "euclid");
                    "hypre"
                }
                _ if slesp.precond == Preconditioner::BJacobSgs => "bjacobi+eisenstat",
                _ => "bjacobi+ilu0",
            };
            plan.sub_pc_type = Some(sub.to_string());
        }
    }

    log::debug!(
        "方程 \"{}\": PETSc ksp = {}, pc = {} ({:?})",
        eq_name,
        plan.ksp_type,
        plan.pc_type,
        plan.hook
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(class: SolverClass, solver: IterativeSolver, precond: Preconditioner, amg: AmgType) -> SlesParam {
        SlesParam {
            solver_class: class,
            solver,
            precond,
            amg_type: amg,
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_petsc() {
        let p = param(SolverClass::Petsc, IterativeSolver::Cg, Preconditioner::Diag, AmgType::None);
        let err = petsc_plan("eq", 1, &p, &SlesBackends::default()).unwrap_err();
        assert!(matches!(err, CsError::Unsupported { .. }));
    }

    #[test]
    fn test_generic_hook() {
        let p = param(SolverClass::Petsc, IterativeSolver::Cg, Preconditioner::Diag, AmgType::None);
        let plan = petsc_plan("eq", 1, &p, &SlesBackends::petsc_only()).unwrap();
        assert_eq!(plan.hook, PetscHook::Generic);
        assert_eq!(plan.ksp_type, "cg");
        assert_eq!(plan.pc_type, "jacobi");
        assert_eq!(plan.norm_type, KspNormType::None);

        let p = param(SolverClass::Petsc, IterativeSolver::Gmres, Preconditioner::Amg, AmgType::PetscGamg);
        let plan = petsc_plan("eq", 1, &p, &SlesBackends::petsc_only()).unwrap();
        assert_eq!(plan.ksp_type, "lgmres");
        assert_eq!(plan.pc_type, "gamg");
        assert_eq!(plan.gmres_restart, Some(GMRES_RESTART));
        assert_eq!(plan.option("-pc_gamg_threshold"), Some("0.02"));
    }

    #[test]
    fn test_cg_with_amg_becomes_fcg() {
        let p = param(SolverClass::Petsc, IterativeSolver::Cg, Preconditioner::Amg, AmgType::PetscPcmg);
        let plan = petsc_plan("eq", 1, &p, &SlesBackends::petsc_only()).unwrap();
        assert_eq!(plan.ksp_type, "fcg");
        assert_eq!(plan.pc_type, "mg");
    }

    #[test]
    fn test_boomer_fallback() {
        let p = param(SolverClass::Hypre, IterativeSolver::Cg, Preconditioner::Amg, AmgType::HypreBoomer);
        let plan = petsc_plan("eq", 1, &p, &SlesBackends::petsc_only()).unwrap();
        assert_eq!(plan.pc_type, "gamg");

        let plan = petsc_plan("eq", 1, &p, &SlesBackends::all()).unwrap();
        assert_eq!(plan.pc_type, "hypre");
        assert_eq!(plan.option("-pc_hypre_type"), Some("boomeramg"));
    }

    #[test]
    fn test_block_hooks() {
        let p = param(SolverClass::Hypre, IterativeSolver::Cg, Preconditioner::AmgBlock, AmgType::HypreBoomer);
        let plan = petsc_plan("eq", 3, &p, &SlesBackends::petsc_only()).unwrap();
        assert_eq!(plan.hook, PetscHook::AmgBlockGamg);
        assert_eq!(plan.pc_type, "fieldsplit");
        assert_eq!(plan.block_size, 3);

        let p = param(SolverClass::Petsc, IterativeSolver::Bicg, Preconditioner::BJacobSgs, AmgType::None);
        let plan = petsc_plan("eq", 3, &p, &SlesBackends::petsc_only()).unwrap();
        assert_eq!(plan.hook, PetscHook::BlockJacobi);
        assert_eq!(plan.sub_pc_type.as_deref(), Some("bjacobi+eisenstat"));
        assert_eq!(plan.norm_type, KspNormType::Unpreconditioned);

        // 标量方程不分块
        let plan = petsc_plan("eq", 1, &p, &SlesBackends::petsc_only()).unwrap();
        assert_eq!(plan.hook, PetscHook::Generic);
        assert_eq!(plan.pc_type, "bjacobi");

        let p = param(SolverClass::Petsc, IterativeSolver::Cg, Preconditioner::AmgBlock, AmgType::HouseK);
        assert!(petsc_plan("eq", 3, &p, &SlesBackends::petsc_only()).is_err());
    }

    #[test]
    fn test_mumps() {
        let p = param(SolverClass::Petsc, IterativeSolver::MumpsLdlt, Preconditioner::None, AmgType::None);
        assert!(petsc_plan("eq", 1, &p, &SlesBackends::petsc_only()).is_err());
        let plan = petsc_plan("eq", 1, &p, &SlesBackends::all()).unwrap();
        assert_eq!(plan.ksp_type, "preonly");
        assert_eq!(plan.pc_type, "cholesky");
    }

    #[test]
    fn test_unsupported_combinations() {
        let p = param(SolverClass::Petsc, IterativeSolver::Jacobi, Preconditioner::Diag, AmgType::None);
        assert!(petsc_plan("eq", 1, &p, &SlesBackends::all()).is_err());
        let p = param(SolverClass::Petsc, IterativeSolver::Cg, Preconditioner::Poly1, AmgType::None);
        assert!(petsc_plan("eq", 1, &p, &SlesBackends::all()).is_err());
    }
}
