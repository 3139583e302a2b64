// crates/cs_cdo/src/equation_param/keys.rs

//! 字符串关键字设置
//!
//! 关键字名与取值均按设置文件中的拼写解析，取值先转为小写。

use super::EquationParam;
use crate::param::{
    keyword_enum, parse_hodge_coef, post_flag, AdvectionFormulation, AdvectionScheme,
    AssemblyStrategy, BcEnforcement, DofReduction, HodgeAlgo, HodgeType, SpaceScheme, TimeScheme,
};
use crate::sles_param::{AmgType, IterativeSolver, Preconditioner, ResNormType, SolverClass};
use cs_foundation::{CsError, CsResult};
use cs_mesh::QuadratureType;
use serde::{Deserialize, Serialize};

keyword_enum! {
    /// 方程参数关键字
    pub enum EquationKey {
        /// 对流项形式
        AdvFormulation => ["adv_formulation"], "adv_formulation",
        /// 对流格式
        AdvScheme => ["adv_scheme"], "adv_scheme",
        /// 混合格式迎风比例
        AdvUpwindPortion => ["adv_upwind_portion"], "adv_upwind_portion",
        /// AMG 类型
        AmgType => ["amg_type"], "amg_type",
        /// 边界条件施加方式
        BcEnforcement => ["bc_enforcement"], "bc_enforcement",
        /// 边界条件求积
        BcQuadrature => ["bc_quadrature"], "bc_quadrature",
        /// 强罚系数
        BcStrongPenaCoeff => ["bc_strong_pena_coeff"], "bc_strong_pena_coeff",
        /// 弱罚系数
        BcWeakPenaCoeff => ["bc_weak_pena_coeff"], "bc_weak_pena_coeff",
        /// 质量集中
        DoLumping => ["do_lumping"], "do_lumping",
        /// 自由度约化
        DofReduction => ["dof_reduction"], "dof_reduction",
        /// 附加后处理
        ExtraOp => ["extra_op"], "extra_op",
        /// 扩散 Hodge 算法
        HodgeDiffAlgo => ["hodge_diff_algo"], "hodge_diff_algo",
        /// 扩散 Hodge 系数
        HodgeDiffCoef => ["hodge_diff_coef"], "hodge_diff_coef",
        /// 时间 Hodge 算法
        HodgeTimeAlgo => ["hodge_time_algo"], "hodge_time_algo",
        /// 反应 Hodge 算法
        HodgeReacAlgo => ["hodge_reac_algo"], "hodge_reac_algo",
        /// 迭代求解器
        Itsol => ["itsol"], "itsol",
        /// 最大迭代次数
        ItsolMaxIter => ["itsol_max_iter"], "itsol_max_iter",
        /// 收敛阈值
        ItsolEps => ["itsol_eps"], "itsol_eps",
        /// 残差归一化
        ItsolResnormType => ["itsol_resnorm_type"], "itsol_resnorm_type",
        /// 并行装配策略
        OmpAssemblyStrategy => ["omp_assembly_strategy"], "omp_assembly_strategy",
        /// 预条件子
        Precond => ["precond"], "precond",
        /// 线性求解器输出详细程度
        SlesVerbosity => ["sles_verbosity"], "sles_verbosity",
        /// 求解器族
        SolverFamily => ["solver_family"], "solver_family",
        /// 空间格式
        SpaceScheme => ["space_scheme"], "space_scheme",
        /// 时间格式
        TimeScheme => ["time_scheme"], "time_scheme",
        /// theta 系数
        TimeTheta => ["time_theta"], "time_theta",
        /// 输出详细程度
        Verbosity => ["verbosity"], "verbosity",
    }
}

impl EquationKey {
    /// 该关键字可接受的取值；数值型关键字返回空
    pub fn accepted_values(&self) -> &'static [&'static str] {
        match self {
            Self::AdvFormulation => AdvectionFormulation::KEYWORDS,
            Self::AdvScheme => AdvectionScheme::KEYWORDS,
            Self::AmgType => AmgType::KEYWORDS,
            Self::BcEnforcement => BcEnforcement::KEYWORDS,
            Self::BcQuadrature => QuadratureType::KEYWORDS,
            Self::DoLumping => &["true", "1", "false", "0"],
            Self::DofReduction => DofReduction::KEYWORDS,
            Self::ExtraOp => post_flag::KEYWORDS,
            Self::HodgeDiffAlgo => HodgeAlgo::KEYWORDS,
            Self::HodgeDiffCoef => &["dga", "sushi", "gcr", "frac23", "2/3"],
            Self::HodgeTimeAlgo | Self::HodgeReacAlgo => &["voronoi", "wbs"],
            Self::Itsol => IterativeSolver::KEYWORDS,
            Self::ItsolResnormType => ResNormType::KEYWORDS,
            Self::OmpAssemblyStrategy => AssemblyStrategy::KEYWORDS,
            Self::Precond => Preconditioner::KEYWORDS,
            Self::SolverFamily => SolverClass::KEYWORDS,
            Self::SpaceScheme => SpaceScheme::KEYWORDS,
            Self::TimeScheme => TimeScheme::KEYWORDS,
            Self::AdvUpwindPortion
            | Self::BcStrongPenaCoeff
            | Self::BcWeakPenaCoeff
            | Self::ItsolMaxIter
            | Self::ItsolEps
            | Self::SlesVerbosity
            | Self::TimeTheta
            | Self::Verbosity => &[],
        }
    }
}

impl EquationParam {
    /// 以关键字名设置参数
    pub fn set_param_str(&mut self, key_name: &str, value: &str) -> CsResult<()> {
        let key = EquationKey::from_keyword(&key_name.to_lowercase())
            .ok_or_else(|| CsError::unknown_key(key_name))?;
        self.set_param(key, value)
    }

    /// 设置一个参数
    ///
    /// 取值不区分大小写。部分关键字带有联动效果，例如 `adv_scheme = cip`
    /// 会同时切换到非守恒形式，`space_scheme` 会重新选择各项的 Hodge 参数。
    pub fn set_param(&mut self, key: EquationKey, value: &str) -> CsResult<()> {
        self.ensure_unlocked("set_param")?;
        let val = value.trim().to_lowercase();
        let val = val.as_str();

        log::trace!("方程 \"{}\": {} = \"{}\"", self.name, key, val);

        match key {
            EquationKey::AdvFormulation => {
                self.advection.formulation = self.parse_kw(key, val, AdvectionFormulation::from_keyword)?;
            }
            EquationKey::AdvScheme => {
                let scheme = self.parse_kw(key, val, AdvectionScheme::from_keyword)?;
                if scheme.forces_non_conservative() {
                    self.advection.formulation = AdvectionFormulation::NonConservative;
                }
                self.advection.scheme = scheme;
            }
            EquationKey::AdvUpwindPortion => {
                self.advection.upwind_portion = self.parse_num(key, val)?;
            }
            EquationKey::AmgType => {
                let amg = self.parse_kw(key, val, AmgType::from_keyword)?;
                self.sles.amg_type = amg;
                if let Some(class) = amg.solver_class() {
                    self.sles.solver_class = class;
                }
            }
            EquationKey::BcEnforcement => {
                self.bc.enforcement = self.parse_kw(key, val, BcEnforcement::from_keyword)?;
            }
            EquationKey::BcQuadrature => {
                let qtype = self.parse_kw(key, val, QuadratureType::from_keyword)?;
                for def in &mut self.bc.defs {
                    def.set_quadrature(qtype);
                }
            }
            EquationKey::BcStrongPenaCoeff => {
                let coef: f64 = self.parse_num(key, val)?;
                if coef < 1.0 {
                    return Err(self.invalid(key, val));
                }
                self.bc.strong_pena_coeff = coef;
            }
            EquationKey::BcWeakPenaCoeff => {
                let coef: f64 = self.parse_num(key, val)?;
                if coef < 0.0 {
                    return Err(self.invalid(key, val));
                }
                self.bc.weak_pena_coeff = coef;
            }
            EquationKey::DoLumping => {
                self.time.do_lumping = matches!(val, "true" | "1");
            }
            EquationKey::DofReduction => {
                self.dof_reduction = self.parse_kw(key, val, DofReduction::from_keyword)?;
            }
            EquationKey::ExtraOp => {
                let f = self.parse_kw(key, val, post_flag::from_keyword)?;
                self.process_flag.insert(f);
            }
            EquationKey::HodgeDiffAlgo => {
                self.diffusion.hodge.algo = self.parse_kw(key, val, HodgeAlgo::from_keyword)?;
            }
            EquationKey::HodgeDiffCoef => {
                self.diffusion.hodge.coef = self.parse_kw(key, val, parse_hodge_coef)?;
            }
            EquationKey::HodgeTimeAlgo => {
                self.time.hodge.algo = self.parse_kw(key, val, diagonal_algo)?;
            }
            EquationKey::HodgeReacAlgo => {
                self.reaction.hodge.algo = self.parse_kw(key, val, diagonal_algo)?;
            }
            EquationKey::Itsol => {
                let solver = self.parse_kw(key, val, IterativeSolver::from_keyword)?;
                if matches!(solver, IterativeSolver::Mumps | IterativeSolver::MumpsLdlt) {
                    self.sles.precond = Preconditioner::None;
                    self.sles.solver_class = SolverClass::Petsc;
                }
                self.sles.solver = solver;
            }
            EquationKey::ItsolMaxIter => {
                self.sles.n_max_iter = self.parse_num(key, val)?;
            }
            EquationKey::ItsolEps => {
                self.sles.eps = self.parse_num(key, val)?;
            }
            EquationKey::ItsolResnormType => {
                self.sles.resnorm_type = self.parse_kw(key, val, ResNormType::from_keyword)?;
            }
            EquationKey::OmpAssemblyStrategy => {
                self.assembly = self.parse_kw(key, val, AssemblyStrategy::from_keyword)?;
            }
            EquationKey::Precond => {
                let precond = self.parse_kw(key, val, Preconditioner::from_keyword)?;
                self.set_precond(precond);
            }
            EquationKey::SlesVerbosity => {
                self.sles.verbosity = self.parse_num(key, val)?;
            }
            EquationKey::SolverFamily => {
                self.sles.solver_class = self.parse_kw(key, val, SolverClass::from_keyword)?;
            }
            EquationKey::SpaceScheme => {
                let scheme = self.parse_kw(key, val, SpaceScheme::from_keyword)?;
                self.set_space_scheme(scheme);
            }
            EquationKey::TimeScheme => {
                let scheme = self.parse_kw(key, val, TimeScheme::from_keyword)?;
                self.time.scheme = scheme;
                if let Some(theta) = scheme.implied_theta() {
                    self.time.theta = theta;
                }
            }
            EquationKey::TimeTheta => {
                self.time.theta = self.parse_num(key, val)?;
            }
            EquationKey::Verbosity => {
                self.verbosity = self.parse_num(key, val)?;
            }
        }
        Ok(())
    }

    fn invalid(&self, key: EquationKey, val: &str) -> CsError {
        CsError::invalid_key_value(&self.name, "set_param", key.name(), val)
    }

    fn parse_kw<T>(&self, key: EquationKey, val: &str, parse: impl Fn(&str) -> Option<T>) -> CsResult<T> {
        parse(val).ok_or_else(|| self.invalid(key, val))
    }

    fn parse_num<T: std::str::FromStr>(&self, key: EquationKey, val: &str) -> CsResult<T> {
        val.parse::<T>().map_err(|_| self.invalid(key, val))
    }

    fn set_precond(&mut self, precond: Preconditioner) {
        let sles = &mut self.sles;
        match precond {
            Preconditioner::None => {
                sles.precond = Preconditioner::None;
                sles.amg_type = AmgType::None;
            }
            Preconditioner::Amg => {
                sles.precond = Preconditioner::Amg;
                sles.amg_type = default_amg(sles.solver_class);
            }
            Preconditioner::AmgBlock if self.dim == 1 => {
                // HYPRE 族保留当前的 AMG 类型
                sles.precond = Preconditioner::Amg;
                if sles.solver_class != SolverClass::Hypre {
                    sles.amg_type = default_amg(sles.solver_class);
                }
            }
            Preconditioner::AmgBlock => {
                // HYPRE 不可用时在求解器配置阶段退回 GAMG
                sles.precond = Preconditioner::AmgBlock;
                sles.amg_type = AmgType::HypreBoomer;
                sles.solver_class = SolverClass::Hypre;
            }
            other => sles.precond = other,
        }
    }

    fn set_space_scheme(&mut self, scheme: SpaceScheme) {
        self.space_scheme = scheme;
        self.space_poly_degree = match scheme {
            SpaceScheme::HhoP1 => 1,
            SpaceScheme::HhoP2 => 2,
            _ => 0,
        };

        match scheme {
            SpaceScheme::CdoVb => {
                self.time.hodge.kind = HodgeType::Vpcd;
                self.diffusion.hodge.kind = HodgeType::Epfd;
                self.diffusion.hodge.algo = HodgeAlgo::Bubble;
                self.diffusion.hodge.coef = 2.0 / 3.0;
                self.reaction.hodge.kind = HodgeType::Vpcd;
                self.reaction.hodge.algo = HodgeAlgo::Wbs;
            }
            SpaceScheme::CdoVcb => {
                self.time.hodge.kind = HodgeType::Vpcd;
                self.diffusion.hodge.algo = HodgeAlgo::Wbs;
                self.diffusion.hodge.kind = HodgeType::Vc;
                self.reaction.hodge.kind = HodgeType::Vpcd;
                self.reaction.hodge.algo = HodgeAlgo::Wbs;
            }
            SpaceScheme::CdoFb => {
                self.time.hodge.kind = HodgeType::Cpvd;
                self.time.hodge.algo = HodgeAlgo::Voronoi;
                self.reaction.hodge.algo = HodgeAlgo::Voronoi;
                self.diffusion.hodge.kind = HodgeType::Edfp;
            }
            SpaceScheme::CdoEb => {
                self.time.hodge.kind = HodgeType::Epfd;
                self.diffusion.hodge.kind = HodgeType::Fped;
                self.reaction.hodge.kind = HodgeType::Epfd;
            }
            SpaceScheme::HhoP0 | SpaceScheme::HhoP1 | SpaceScheme::HhoP2 => {
                self.time.hodge.kind = HodgeType::Cpvd;
                self.diffusion.hodge.kind = HodgeType::Edfp;
            }
        }
    }
}

/// 类别默认的 AMG
fn default_amg(class: SolverClass) -> AmgType {
    match class {
        SolverClass::Cs => AmgType::HouseK,
        SolverClass::Petsc => AmgType::PetscGamg,
        SolverClass::Hypre => AmgType::HypreBoomer,
    }
}

/// 时间项与反应项只接受对角型 Hodge
fn diagonal_algo(s: &str) -> Option<HodgeAlgo> {
    match s {
        "voronoi" => Some(HodgeAlgo::Voronoi),
        "wbs" => Some(HodgeAlgo::Wbs),
        _ => None,
    }
}

/// 关键字-取值对，用于批量设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    /// 关键字
    pub key: EquationKey,
    /// 取值
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{BcType, EquationType};

    fn eq() -> EquationParam {
        EquationParam::new("Test", EquationType::User, 1, BcType::HmgNeumann)
    }

    #[test]
    fn test_every_key_parses() {
        for kw in EquationKey::KEYWORDS {
            assert!(EquationKey::from_keyword(kw).is_some(), "{}", kw);
        }
    }

    #[test]
    fn test_every_accepted_value_sets() {
        for &key in EquationKey::KEYWORDS {
            let key = EquationKey::from_keyword(key).unwrap();
            for val in key.accepted_values() {
                let mut e = eq();
                assert!(e.set_param(key, val).is_ok(), "{} = {}", key, val);
            }
        }
    }

    #[test]
    fn test_case_insensitive() {
        let mut e = eq();
        e.set_param(EquationKey::Itsol, "GMRES").unwrap();
        assert_eq!(e.sles().solver, IterativeSolver::Gmres);
        e.set_param_str("SPACE_SCHEME", "Cdo_Fb").unwrap();
        assert_eq!(e.space_scheme(), SpaceScheme::CdoFb);
    }

    #[test]
    fn test_invalid_value_reports_context() {
        let mut e = eq();
        let err = e.set_param(EquationKey::AdvScheme, "upwnd").unwrap_err();
        match err {
            CsError::InvalidKeyValue { eq, func, key, value } => {
                assert_eq!(eq, "Test");
                assert_eq!(func, "set_param");
                assert_eq!(key, "adv_scheme");
                assert_eq!(value, "upwnd");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(e.set_param_str("no_such_key", "1"), Err(CsError::UnknownKey { .. })));
        assert!(e.set_param(EquationKey::Verbosity, "abc").is_err());
        assert!(e.set_param(EquationKey::HodgeTimeAlgo, "cost").is_err());
    }

    #[test]
    fn test_cip_forces_non_conservative() {
        for scheme in ["cip", "cip_cw"] {
            let mut e = eq();
            e.set_param(EquationKey::AdvScheme, scheme).unwrap();
            assert_eq!(e.advection().formulation, AdvectionFormulation::NonConservative);
            e.set_param(EquationKey::AdvScheme, scheme).unwrap();
            assert_eq!(e.advection().formulation, AdvectionFormulation::NonConservative);
        }
        let mut e = eq();
        e.set_param(EquationKey::AdvScheme, "sg").unwrap();
        assert_eq!(e.advection().formulation, AdvectionFormulation::Conservative);
    }

    #[test]
    fn test_space_scheme_side_effects() {
        let mut e = eq();
        e.set_param(EquationKey::SpaceScheme, "cdo_vb").unwrap();
        assert_eq!(e.diffusion().hodge.algo, HodgeAlgo::Bubble);
        assert!((e.diffusion().hodge.coef - 2.0 / 3.0).abs() < 1e-15);

        e.set_param(EquationKey::SpaceScheme, "cdo_fb").unwrap();
        assert_eq!(e.time().hodge.kind, HodgeType::Cpvd);
        assert_eq!(e.time().hodge.algo, HodgeAlgo::Voronoi);
        assert_eq!(e.reaction().hodge.algo, HodgeAlgo::Voronoi);
        assert_eq!(e.diffusion().hodge.kind, HodgeType::Edfp);

        e.set_param(EquationKey::SpaceScheme, "hho_p2").unwrap();
        assert_eq!(e.space_poly_degree(), 2);
        e.set_param(EquationKey::SpaceScheme, "cdo_vcb").unwrap();
        assert_eq!(e.space_poly_degree(), 0);
        assert_eq!(e.diffusion().hodge.kind, HodgeType::Vc);
    }

    #[test]
    fn test_time_scheme_theta() {
        let mut e = eq();
        e.set_param(EquationKey::TimeScheme, "crank_nicolson").unwrap();
        assert_eq!(e.time().theta, 0.5);
        e.set_param(EquationKey::TimeTheta, "0.7").unwrap();
        e.set_param(EquationKey::TimeScheme, "theta_scheme").unwrap();
        assert_eq!(e.time().theta, 0.7);
        e.set_param(EquationKey::TimeScheme, "no").unwrap();
        assert_eq!(e.time().scheme, TimeScheme::Steady);
    }

    #[test]
    fn test_solver_side_effects() {
        let mut e = eq();
        e.set_param(EquationKey::Itsol, "mumps_ldlt").unwrap();
        assert_eq!(e.sles().precond, Preconditioner::None);
        assert_eq!(e.sles().solver_class, SolverClass::Petsc);

        let mut e = eq();
        e.set_param(EquationKey::Precond, "amg").unwrap();
        assert_eq!(e.sles().amg_type, AmgType::HouseK);
        e.set_param(EquationKey::AmgType, "gamg").unwrap();
        assert_eq!(e.sles().solver_class, SolverClass::Petsc);
        e.set_param(EquationKey::Precond, "none").unwrap();
        assert_eq!(e.sles().amg_type, AmgType::None);
    }

    #[test]
    fn test_amg_block_scalar_fallback() {
        let mut e = eq();
        e.set_param(EquationKey::Precond, "block_amg").unwrap();
        assert_eq!(e.sles().precond, Preconditioner::Amg);

        // HYPRE 族下标量方程不改动已选的 AMG 类型
        let mut h = eq();
        h.set_param(EquationKey::AmgType, "gamg").unwrap();
        h.set_param(EquationKey::SolverFamily, "hypre").unwrap();
        h.set_param(EquationKey::Precond, "amg_block").unwrap();
        assert_eq!(h.sles().precond, Preconditioner::Amg);
        assert_eq!(h.sles().amg_type, AmgType::PetscGamg);
        assert_eq!(h.sles().solver_class, SolverClass::Hypre);

        let mut v = EquationParam::new("V", EquationType::User, 3, BcType::HmgDirichlet);
        v.set_param(EquationKey::Precond, "amg_block").unwrap();
        assert_eq!(v.sles().precond, Preconditioner::AmgBlock);
        assert_eq!(v.sles().amg_type, AmgType::HypreBoomer);
        assert_eq!(v.sles().solver_class, SolverClass::Hypre);
    }

    #[test]
    fn test_penalization_bounds() {
        let mut e = eq();
        assert!(e.set_param(EquationKey::BcStrongPenaCoeff, "0.5").is_err());
        e.set_param(EquationKey::BcStrongPenaCoeff, "1e8").unwrap();
        assert_eq!(e.bc().strong_pena_coeff, 1e8);
        assert!(e.set_param(EquationKey::BcWeakPenaCoeff, "-1").is_err());
        e.set_param(EquationKey::BcWeakPenaCoeff, "0").unwrap();
        assert_eq!(e.bc().weak_pena_coeff, 0.0);
    }

    #[test]
    fn test_extra_op_accumulates() {
        let mut e = eq();
        e.set_param(EquationKey::ExtraOp, "balance").unwrap();
        e.set_param(EquationKey::ExtraOp, "peclet").unwrap();
        assert!(e.process_flag().contains(post_flag::BALANCE | post_flag::PECLET));
    }

    #[test]
    fn test_assembly_strategy() {
        let mut e = eq();
        e.set_param(EquationKey::OmpAssemblyStrategy, "atomic").unwrap();
        assert_eq!(e.assembly_strategy(), AssemblyStrategy::Atomic);
        assert_eq!(e.sles().precond, Preconditioner::Diag);
    }
}
