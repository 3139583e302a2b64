// crates/cs_cdo/src/equation_param/mod.rs

//! 方程参数
//!
//! `EquationParam` 保存一个未知量（标量或矢量）离散所需的全部设置：
//! 空间/时间格式、各项的离散 Hodge 参数、边界条件/初始条件/源项定义、
//! 内部自由度强制以及线性求解器参数。
//!
//! # 生命周期
//!
//! 新建后处于可修改状态；[`EquationParam::last_stage`] 完成最后的一致性
//! 调整并锁定，此后任何修改都返回 [`CsError::Locked`]。
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::equation_param::{EquationKey, EquationParam};
//! use cs_cdo::param::{AdvectionFormulation, BcType, EquationType};
//!
//! let mut eqp = EquationParam::new("Tracer", EquationType::User, 1, BcType::HmgNeumann);
//! eqp.set_param(EquationKey::AdvScheme, "CIP").unwrap();
//! assert_eq!(eqp.advection().formulation, AdvectionFormulation::NonConservative);
//!
//! eqp.last_stage().unwrap();
//! assert!(eqp.set_param(EquationKey::Verbosity, "3").is_err());
//! ```

mod keys;
mod summary;

pub use keys::{EquationKey, KeyValue};

use crate::param::{
    eq_flag, AdvectionFormulation, AdvectionScheme, AssemblyStrategy, BcEnforcement, BcType,
    DofReduction, EquationType, HodgeAlgo, HodgeParam, HodgeType, SpaceScheme, TimeScheme,
};
use crate::property::{AdvectionField, Property};
use crate::sles_param::SlesParam;
use crate::source_term;
use crate::xdef::{AnalyticFunc, DofFunc, XDef, XDefInput, XDefSupport};
use cs_foundation::flag::{self, state};
use cs_foundation::{CsError, CsResult, Flag};
use cs_mesh::{QuadratureType, ZoneRegistry};
use std::sync::Arc;

/// 强罚系数默认值
pub const STRONG_PENA_BC_COEF_DEFAULT: f64 = 1e12;
/// 弱罚系数默认值
pub const WEAK_PENA_BC_COEF_DEFAULT: f64 = 100.0;

// ============================================================================
// 分组设置
// ============================================================================

/// 边界条件设置
#[derive(Debug, Clone)]
pub struct BcSettings {
    /// 默认边界条件
    pub default_bc: BcType,
    /// 默认施加方式
    pub enforcement: BcEnforcement,
    /// 强罚系数
    pub strong_pena_coeff: f64,
    /// 弱罚系数
    pub weak_pena_coeff: f64,
    /// 边界条件定义
    pub defs: Vec<XDef>,
}

/// 非定常项设置
#[derive(Debug, Clone)]
pub struct TimeSettings {
    /// 时间项物性
    pub property: Option<Arc<Property>>,
    /// 时间格式
    pub scheme: TimeScheme,
    /// theta 系数
    pub theta: f64,
    /// 质量集中
    pub do_lumping: bool,
    /// 时间项 Hodge 参数
    pub hodge: HodgeParam,
}

/// 带物性的二阶项设置（扩散、旋度-旋度、梯度-散度）
#[derive(Debug, Clone)]
pub struct TermSettings {
    /// 物性
    pub property: Option<Arc<Property>>,
    /// Hodge 参数
    pub hodge: HodgeParam,
}

/// 对流项设置
#[derive(Debug, Clone)]
pub struct AdvectionSettings {
    /// 对流场
    pub field: Option<Arc<AdvectionField>>,
    /// 形式
    pub formulation: AdvectionFormulation,
    /// 格式
    pub scheme: AdvectionScheme,
    /// 混合格式中的迎风比例
    pub upwind_portion: f64,
}

/// 反应项设置
#[derive(Debug, Clone)]
pub struct ReactionSettings {
    /// 各反应项物性
    pub properties: Vec<Arc<Property>>,
    /// Hodge 参数
    pub hodge: HodgeParam,
}

/// 内部自由度强制的作用对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementTarget {
    /// 顶点自由度
    VertexDofs,
    /// 单元选择
    Cells,
}

/// 内部自由度强制
#[derive(Debug, Clone, PartialEq)]
pub struct Enforcement {
    /// 作用对象
    pub target: EnforcementTarget,
    /// 元素编号
    pub elt_ids: Vec<usize>,
    /// 逐元素取值（长度 dim × n）；`None` 表示使用参考值
    pub values: Option<Vec<f64>>,
}

impl Enforcement {
    /// 是否使用参考值
    #[inline]
    pub fn by_reference(&self) -> bool {
        self.values.is_none()
    }
}

// ============================================================================
// EquationParam
// ============================================================================

/// 方程参数
#[derive(Debug, Clone)]
pub struct EquationParam {
    name: String,
    eq_type: EquationType,
    dim: usize,
    verbosity: i32,
    flag: Flag,
    process_flag: Flag,

    space_scheme: SpaceScheme,
    dof_reduction: DofReduction,
    space_poly_degree: i32,

    bc: BcSettings,
    ic_defs: Vec<XDef>,
    time: TimeSettings,
    diffusion: TermSettings,
    curlcurl: TermSettings,
    graddiv: TermSettings,
    advection: AdvectionSettings,
    reaction: ReactionSettings,
    source_terms: Vec<XDef>,

    enforcement: Option<Enforcement>,
    enforcement_ref_value: Vec<f64>,

    sles: SlesParam,
    assembly: AssemblyStrategy,
}

impl EquationParam {
    /// 创建方程参数并设置默认值
    ///
    /// 默认使用顶点型 CDO、隐式 Euler、代数方式施加边界条件。
    pub fn new(name: impl Into<String>, eq_type: EquationType, dim: usize, default_bc: BcType) -> Self {
        Self {
            name: name.into(),
            eq_type,
            dim,
            verbosity: 2,
            flag: Flag::EMPTY,
            process_flag: Flag::EMPTY,
            space_scheme: SpaceScheme::CdoVb,
            dof_reduction: DofReduction::DeRham,
            space_poly_degree: 0,
            bc: BcSettings {
                default_bc,
                enforcement: BcEnforcement::Algebraic,
                strong_pena_coeff: STRONG_PENA_BC_COEF_DEFAULT,
                weak_pena_coeff: WEAK_PENA_BC_COEF_DEFAULT,
                defs: Vec::new(),
            },
            ic_defs: Vec::new(),
            time: TimeSettings {
                property: None,
                scheme: TimeScheme::EulerImplicit,
                theta: 1.0,
                do_lumping: false,
                hodge: HodgeParam::new(true, HodgeAlgo::Voronoi, HodgeType::Vpcd, 1.0),
            },
            diffusion: TermSettings {
                property: None,
                hodge: HodgeParam::new(false, HodgeAlgo::Cost, HodgeType::Epfd, 1.0 / 3.0),
            },
            curlcurl: TermSettings {
                property: None,
                hodge: HodgeParam::new(false, HodgeAlgo::Cost, HodgeType::Fped, 1.0 / 3.0),
            },
            graddiv: TermSettings {
                property: None,
                hodge: HodgeParam::new(true, HodgeAlgo::Voronoi, HodgeType::Epfd, 1.0 / 3.0),
            },
            advection: AdvectionSettings {
                field: None,
                formulation: AdvectionFormulation::Conservative,
                scheme: AdvectionScheme::Upwind,
                upwind_portion: 0.15,
            },
            reaction: ReactionSettings {
                properties: Vec::new(),
                hodge: HodgeParam::new(false, HodgeAlgo::Wbs, HodgeType::Vpcd, 0.0),
            },
            source_terms: Vec::new(),
            enforcement: None,
            enforcement_ref_value: vec![0.0; dim],
            sles: SlesParam::default(),
            assembly: AssemblyStrategy::Critical,
        }
    }

    // ========================================================================
    // 访问器
    // ========================================================================

    /// 方程名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 方程类别
    pub fn eq_type(&self) -> EquationType {
        self.eq_type
    }

    /// 未知量分量数
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// 输出详细程度
    pub fn verbosity(&self) -> i32 {
        self.verbosity
    }

    /// 方程项标志
    pub fn flag(&self) -> Flag {
        self.flag
    }

    /// 后处理附加操作标志
    pub fn process_flag(&self) -> Flag {
        self.process_flag
    }

    /// 空间格式
    pub fn space_scheme(&self) -> SpaceScheme {
        self.space_scheme
    }

    /// 自由度约化
    pub fn dof_reduction(&self) -> DofReduction {
        self.dof_reduction
    }

    /// 多项式阶数
    pub fn space_poly_degree(&self) -> i32 {
        self.space_poly_degree
    }

    /// 边界条件设置
    pub fn bc(&self) -> &BcSettings {
        &self.bc
    }

    /// 初始条件定义
    pub fn ic_defs(&self) -> &[XDef] {
        &self.ic_defs
    }

    /// 非定常项设置
    pub fn time(&self) -> &TimeSettings {
        &self.time
    }

    /// 扩散项设置
    pub fn diffusion(&self) -> &TermSettings {
        &self.diffusion
    }

    /// 旋度-旋度项设置
    pub fn curlcurl(&self) -> &TermSettings {
        &self.curlcurl
    }

    /// 梯度-散度项设置
    pub fn graddiv(&self) -> &TermSettings {
        &self.graddiv
    }

    /// 对流项设置
    pub fn advection(&self) -> &AdvectionSettings {
        &self.advection
    }

    /// 反应项设置
    pub fn reaction(&self) -> &ReactionSettings {
        &self.reaction
    }

    /// 源项定义
    pub fn source_terms(&self) -> &[XDef] {
        &self.source_terms
    }

    /// 内部自由度强制
    pub fn enforcement(&self) -> Option<&Enforcement> {
        self.enforcement.as_ref()
    }

    /// 强制参考值（长度 dim）
    pub fn enforcement_ref_value(&self) -> &[f64] {
        &self.enforcement_ref_value
    }

    /// 线性求解器参数
    pub fn sles(&self) -> &SlesParam {
        &self.sles
    }

    pub(crate) fn sles_mut(&mut self) -> &mut SlesParam {
        &mut self.sles
    }

    /// 装配策略
    pub fn assembly_strategy(&self) -> AssemblyStrategy {
        self.assembly
    }

    /// 是否已锁定
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.flag.contains(eq_flag::LOCKED)
    }

    /// 是否包含非定常项
    #[inline]
    pub fn is_unsteady(&self) -> bool {
        self.flag.contains(eq_flag::UNSTEADY)
    }

    fn ensure_unlocked(&self, func: &str) -> CsResult<()> {
        if self.is_locked() {
            return Err(CsError::locked(&self.name, func));
        }
        Ok(())
    }

    // ========================================================================
    // 生命周期
    // ========================================================================

    /// 从 `reference` 深拷贝全部设置
    ///
    /// 名称、求解器关联场编号、求解器配置完成标志与锁定状态不复制。
    pub fn update_from(&mut self, reference: &EquationParam) -> CsResult<()> {
        self.ensure_unlocked("update_from")?;

        self.eq_type = reference.eq_type;
        self.dim = reference.dim;
        self.verbosity = reference.verbosity;
        self.process_flag = reference.process_flag;
        self.flag = reference.flag;
        self.flag.remove(eq_flag::LOCKED);

        self.space_scheme = reference.space_scheme;
        self.dof_reduction = reference.dof_reduction;
        self.space_poly_degree = reference.space_poly_degree;

        self.bc = reference.bc.clone();
        self.ic_defs = reference.ic_defs.clone();
        self.time = reference.time.clone();
        self.diffusion = reference.diffusion.clone();
        self.curlcurl = reference.curlcurl.clone();
        self.graddiv = reference.graddiv.clone();
        self.advection = reference.advection.clone();
        self.reaction = reference.reaction.clone();
        self.source_terms = reference.source_terms.clone();

        self.enforcement = reference.enforcement.clone();
        self.enforcement_ref_value = reference.enforcement_ref_value.clone();

        let field_id = self.sles.field_id;
        self.sles = reference.sles.clone();
        self.sles.field_id = field_id;
        self.sles.setup_done = false;

        self.assembly = reference.assembly;
        Ok(())
    }

    /// 最后阶段：质量集中时调整 Hodge 与源项求积，随后锁定
    pub fn last_stage(&mut self) -> CsResult<()> {
        self.ensure_unlocked("last_stage")?;

        if self.time.do_lumping {
            self.reaction.hodge.algo = HodgeAlgo::Voronoi;
            self.time.hodge.algo = HodgeAlgo::Voronoi;
            for st in &mut self.source_terms {
                st.set_quadrature(QuadratureType::Bary);
            }
        }

        self.flag.insert(eq_flag::LOCKED);
        log::debug!("方程 \"{}\" 参数已锁定", self.name);
        Ok(())
    }

    // ========================================================================
    // 初始条件
    // ========================================================================

    fn ic_meta(z_id: usize) -> Flag {
        if z_id == 0 {
            flag::FULL_LOC
        } else {
            Flag::EMPTY
        }
    }

    /// 以常值定义初始条件，返回定义编号
    pub fn add_ic_by_value(&mut self, zones: &ZoneRegistry, z_name: &str, values: &[f64]) -> CsResult<usize> {
        self.ensure_unlocked("add_ic_by_value")?;
        XDef::check_value("add_ic_by_value", self.dim, values)?;
        let z_id = zones.volume_zone_id(z_name)?;
        let def = XDef::volume(
            self.dim,
            z_id,
            XDef::value_state(),
            Self::ic_meta(z_id),
            XDefInput::Value(values.to_vec()),
        );
        self.ic_defs.push(def);
        Ok(self.ic_defs.len() - 1)
    }

    /// 以单元内总量定义初始条件，返回定义编号
    pub fn add_ic_by_qov(&mut self, zones: &ZoneRegistry, z_name: &str, quantity: f64) -> CsResult<usize> {
        self.ensure_unlocked("add_ic_by_qov")?;
        let z_id = zones.volume_zone_id(z_name)?;
        let def = XDef::volume(self.dim, z_id, Flag::EMPTY, Self::ic_meta(z_id), XDefInput::Qov(quantity));
        self.ic_defs.push(def);
        Ok(self.ic_defs.len() - 1)
    }

    /// 以解析函数定义初始条件，返回定义编号
    pub fn add_ic_by_analytic(&mut self, zones: &ZoneRegistry, z_name: &str, func: AnalyticFunc) -> CsResult<usize> {
        self.ensure_unlocked("add_ic_by_analytic")?;
        let z_id = zones.volume_zone_id(z_name)?;
        let def = XDef::volume(self.dim, z_id, Flag::EMPTY, Self::ic_meta(z_id), XDefInput::Analytic(func));
        self.ic_defs.push(def);
        Ok(self.ic_defs.len() - 1)
    }

    // ========================================================================
    // 边界条件
    // ========================================================================

    /// 边界定义的分量数
    fn bc_def_dim(&self, func: &str, bc_type: BcType) -> CsResult<usize> {
        match bc_type {
            BcType::Neumann | BcType::HmgNeumann => Ok(3 * self.dim),
            BcType::Robin if self.dim == 1 => Ok(3),
            BcType::Robin => Err(CsError::invalid_definition(
                func,
                format!("方程 \"{}\": Robin 条件仅支持标量方程", self.name),
            )),
            _ => Ok(self.dim),
        }
    }

    /// 直接添加一个边界定义，返回定义编号
    pub fn add_xdef_bc(&mut self, def: XDef) -> CsResult<usize> {
        self.ensure_unlocked("add_xdef_bc")?;
        if def.support != XDefSupport::Boundary {
            return Err(CsError::invalid_definition("add_xdef_bc", "边界条件必须定义在边界区域上"));
        }
        self.bc.defs.push(def);
        Ok(self.bc.defs.len() - 1)
    }

    /// 以常值定义边界条件，返回定义编号
    ///
    /// Neumann 条件给出通量（标量方程为矢量），Robin 条件给出 (alpha, u0, beta)。
    pub fn add_bc_by_value(
        &mut self,
        bc_type: BcType,
        zones: &ZoneRegistry,
        z_name: &str,
        values: &[f64],
    ) -> CsResult<usize> {
        const FUNC: &str = "add_bc_by_value";
        self.ensure_unlocked(FUNC)?;
        let dim = self.bc_def_dim(FUNC, bc_type)?;
        XDef::check_value(FUNC, dim, values)?;
        let z_id = zones.boundary_zone_id(z_name)?;
        let def = XDef::boundary(dim, z_id, state::UNIFORM, bc_type.flag(), XDefInput::Value(values.to_vec()));
        self.bc.defs.push(def);
        Ok(self.bc.defs.len() - 1)
    }

    /// 以数组定义边界条件，返回定义编号
    ///
    /// 数组位置须为主网格的面、顶点或边（环量）。
    pub fn add_bc_by_array(
        &mut self,
        bc_type: BcType,
        zones: &ZoneRegistry,
        z_name: &str,
        loc: Flag,
        array: Vec<f64>,
    ) -> CsResult<usize> {
        const FUNC: &str = "add_bc_by_array";
        self.ensure_unlocked(FUNC)?;
        if !(loc.contains(flag::PRIMAL_FACE) || loc.contains(flag::PRIMAL_VTX) || loc.contains(flag::PRIMAL_EDGE)) {
            return Err(CsError::invalid_definition(FUNC, format!("不支持的数组位置 {}", loc)));
        }
        let dim = self.bc_def_dim(FUNC, bc_type)?;
        let z_id = zones.boundary_zone_id(z_name)?;
        let state_flag = if loc == flag::PRIMAL_FACE {
            state::FACEWISE
        } else {
            Flag::EMPTY
        };
        let input = XDefInput::Array {
            stride: self.dim,
            loc,
            values: array,
        };
        self.bc.defs.push(XDef::boundary(dim, z_id, state_flag, bc_type.flag(), input));
        Ok(self.bc.defs.len() - 1)
    }

    /// 以解析函数定义边界条件，返回定义编号
    ///
    /// 环量条件用于矢量方程，每条边上是一个标量。
    pub fn add_bc_by_analytic(
        &mut self,
        bc_type: BcType,
        zones: &ZoneRegistry,
        z_name: &str,
        func: AnalyticFunc,
    ) -> CsResult<usize> {
        const FUNC: &str = "add_bc_by_analytic";
        self.ensure_unlocked(FUNC)?;
        let dim = match bc_type {
            BcType::Circulation if self.dim == 3 => 1,
            BcType::Circulation => {
                return Err(CsError::invalid_definition(
                    FUNC,
                    format!("方程 \"{}\": 环量条件仅支持三维矢量方程", self.name),
                ))
            }
            _ => self.bc_def_dim(FUNC, bc_type)?,
        };
        let z_id = zones.boundary_zone_id(z_name)?;
        let def = XDef::boundary(dim, z_id, Flag::EMPTY, bc_type.flag(), XDefInput::Analytic(func));
        self.bc.defs.push(def);
        Ok(self.bc.defs.len() - 1)
    }

    /// 滑移条件：法向分量施加齐次 Dirichlet
    pub fn add_sliding_condition(&mut self, zones: &ZoneRegistry, z_name: &str) -> CsResult<usize> {
        const FUNC: &str = "add_sliding_condition";
        self.ensure_unlocked(FUNC)?;
        if self.dim < 3 {
            return Err(CsError::invalid_definition(
                FUNC,
                format!("方程 \"{}\" 的维度 {} 不支持滑移条件", self.name, self.dim),
            ));
        }
        let z_id = zones.boundary_zone_id(z_name)?;
        let def = XDef::boundary(
            1,
            z_id,
            state::UNIFORM,
            BcType::Sliding.flag(),
            XDefInput::Value(vec![0.0]),
        );
        self.bc.defs.push(def);
        Ok(self.bc.defs.len() - 1)
    }

    // ========================================================================
    // 方程项
    // ========================================================================

    /// 添加扩散项
    pub fn add_diffusion(&mut self, property: Arc<Property>) -> CsResult<()> {
        self.ensure_unlocked("add_diffusion")?;
        self.flag.insert(eq_flag::DIFFUSION);
        self.diffusion.hodge.is_iso = property.is_iso();
        self.diffusion.property = Some(property);
        Ok(())
    }

    /// 添加旋度-旋度项
    pub fn add_curlcurl(&mut self, property: Arc<Property>) -> CsResult<()> {
        self.ensure_unlocked("add_curlcurl")?;
        self.flag.insert(eq_flag::CURLCURL);
        self.curlcurl.hodge.is_iso = property.is_iso();
        self.curlcurl.property = Some(property);
        Ok(())
    }

    /// 添加梯度-散度项
    pub fn add_graddiv(&mut self, property: Arc<Property>) -> CsResult<()> {
        self.ensure_unlocked("add_graddiv")?;
        self.flag.insert(eq_flag::GRADDIV);
        self.graddiv.hodge.is_iso = property.is_iso();
        self.graddiv.property = Some(property);
        Ok(())
    }

    /// 添加非定常项
    pub fn add_time(&mut self, property: Arc<Property>) -> CsResult<()> {
        self.ensure_unlocked("add_time")?;
        self.flag.insert(eq_flag::UNSTEADY);
        self.time.property = Some(property);
        Ok(())
    }

    /// 添加对流项
    pub fn add_advection(&mut self, field: Arc<AdvectionField>) -> CsResult<()> {
        self.ensure_unlocked("add_advection")?;
        self.flag.insert(eq_flag::CONVECTION);
        self.advection.field = Some(field);
        Ok(())
    }

    /// 添加反应项，返回反应项编号
    pub fn add_reaction(&mut self, property: Arc<Property>) -> CsResult<usize> {
        self.ensure_unlocked("add_reaction")?;
        self.reaction.properties.push(property);
        self.flag.insert(eq_flag::REACTION);
        Ok(self.reaction.properties.len() - 1)
    }

    // ========================================================================
    // 源项
    // ========================================================================

    fn source_meta(&self, z_id: usize) -> CsResult<Flag> {
        let mut meta = source_term::default_flag(self.space_scheme)
            .map_err(|_| CsError::invalid_scheme(&self.name, "add_source_term", self.space_scheme))?;
        if z_id == 0 {
            meta |= flag::FULL_LOC;
        }
        Ok(meta)
    }

    fn push_source_term(&mut self, def: XDef) -> usize {
        self.source_terms.push(def);
        self.source_terms.len() - 1
    }

    /// 以常值（密度）定义源项，返回源项编号
    pub fn add_source_term_by_val(&mut self, zones: &ZoneRegistry, z_name: &str, values: &[f64]) -> CsResult<usize> {
        const FUNC: &str = "add_source_term_by_val";
        self.ensure_unlocked(FUNC)?;
        XDef::check_value(FUNC, self.dim, values)?;
        let z_id = zones.volume_zone_id(z_name)?;
        let meta = self.source_meta(z_id)?;
        let def = XDef::volume(
            self.dim,
            z_id,
            state::DENSITY | state::UNIFORM,
            meta,
            XDefInput::Value(values.to_vec()),
        );
        Ok(self.push_source_term(def))
    }

    /// 以解析函数（密度）定义源项，默认使用子四面体重心求积
    pub fn add_source_term_by_analytic(
        &mut self,
        zones: &ZoneRegistry,
        z_name: &str,
        func: AnalyticFunc,
    ) -> CsResult<usize> {
        self.ensure_unlocked("add_source_term_by_analytic")?;
        let z_id = zones.volume_zone_id(z_name)?;
        let meta = self.source_meta(z_id)?;
        let mut def = XDef::volume(self.dim, z_id, state::DENSITY, meta, XDefInput::Analytic(func));
        def.set_quadrature(QuadratureType::BarySubdiv);
        Ok(self.push_source_term(def))
    }

    /// 以自由度函数定义源项，`loc` 为函数输出所在位置
    pub fn add_source_term_by_dof_func(
        &mut self,
        zones: &ZoneRegistry,
        z_name: &str,
        loc: Flag,
        func: DofFunc,
    ) -> CsResult<usize> {
        self.ensure_unlocked("add_source_term_by_dof_func")?;
        let z_id = zones.volume_zone_id(z_name)?;
        let meta = self.source_meta(z_id)?;
        let mut def = XDef::volume(self.dim, z_id, state::DENSITY, meta, XDefInput::DofFunc { loc, func });
        def.set_quadrature(QuadratureType::BarySubdiv);
        Ok(self.push_source_term(def))
    }

    /// 以数组定义源项；位于主网格单元的数组标记为逐单元
    pub fn add_source_term_by_array(
        &mut self,
        zones: &ZoneRegistry,
        z_name: &str,
        loc: Flag,
        array: Vec<f64>,
    ) -> CsResult<usize> {
        self.ensure_unlocked("add_source_term_by_array")?;
        let z_id = zones.volume_zone_id(z_name)?;
        let meta = self.source_meta(z_id)?;
        let mut state_flag = state::DENSITY;
        if loc.contains(flag::PRIMAL_CELL) {
            state_flag |= state::CELLWISE;
        }
        let input = XDefInput::Array {
            stride: self.dim,
            loc,
            values: array,
        };
        Ok(self.push_source_term(XDef::volume(self.dim, z_id, state_flag, meta, input)))
    }

    /// 修改源项的求积类型
    pub fn set_source_term_quadrature(&mut self, st_id: usize, qtype: QuadratureType) -> CsResult<()> {
        self.ensure_unlocked("set_source_term_quadrature")?;
        let n = self.source_terms.len();
        let st = self
            .source_terms
            .get_mut(st_id)
            .ok_or(CsError::index_out_of_bounds("SourceTerm", st_id, n))?;
        st.set_quadrature(qtype);
        Ok(())
    }

    /// 切换源项的约化方式（对偶单元 ↔ 主网格顶点）
    pub fn set_source_term_reduction(&mut self, st_id: usize, reduction: Flag) -> CsResult<()> {
        self.ensure_unlocked("set_source_term_reduction")?;
        let n = self.source_terms.len();
        let st = self
            .source_terms
            .get_mut(st_id)
            .ok_or(CsError::index_out_of_bounds("SourceTerm", st_id, n))?;
        source_term::set_reduction(st, reduction)
    }

    // ========================================================================
    // 内部自由度强制
    // ========================================================================

    fn check_enforcement_values(
        &self,
        func: &str,
        n_elts: usize,
        ref_value: Option<&[f64]>,
        elt_values: Option<&[f64]>,
    ) -> CsResult<()> {
        if ref_value.is_none() && elt_values.is_none() {
            return Err(CsError::missing_value(&self.name, func, "强制取值（参考值或逐元素取值）"));
        }
        if let Some(r) = ref_value {
            CsError::check_size("ref_value", self.dim, r.len())?;
        }
        if let Some(v) = elt_values {
            CsError::check_size("elt_values", self.dim * n_elts, v.len())?;
        }
        Ok(())
    }

    fn set_enforcement(
        &mut self,
        target: EnforcementTarget,
        elt_ids: &[usize],
        ref_value: Option<&[f64]>,
        elt_values: Option<&[f64]>,
    ) {
        self.flag.insert(eq_flag::FORCE_VALUES);
        // 给出逐元素取值时参考值不生效
        if let (Some(r), None) = (ref_value, elt_values) {
            self.enforcement_ref_value.copy_from_slice(r);
        }
        self.enforcement = Some(Enforcement {
            target,
            elt_ids: elt_ids.to_vec(),
            values: elt_values.map(|v| v.to_vec()),
        });
    }

    /// 强制一组顶点自由度的取值（仅顶点型格式）
    ///
    /// 空选择直接返回；已存在按单元的强制时报错；给出逐元素取值时优先使用。
    pub fn enforce_vertex_dofs(
        &mut self,
        elt_ids: &[usize],
        ref_value: Option<&[f64]>,
        elt_values: Option<&[f64]>,
    ) -> CsResult<()> {
        const FUNC: &str = "enforce_vertex_dofs";
        if elt_ids.is_empty() {
            return Ok(());
        }
        self.ensure_unlocked(FUNC)?;
        if matches!(&self.enforcement, Some(e) if e.target == EnforcementTarget::Cells) {
            return Err(CsError::enforcement_conflict(&self.name, FUNC));
        }
        if !self.space_scheme.is_vertex_based() {
            return Err(CsError::invalid_scheme(&self.name, FUNC, self.space_scheme));
        }
        self.check_enforcement_values(FUNC, elt_ids.len(), ref_value, elt_values)?;
        self.set_enforcement(EnforcementTarget::VertexDofs, elt_ids, ref_value, elt_values);
        Ok(())
    }

    /// 强制一组单元内的取值
    pub fn enforce_by_cell_selection(
        &mut self,
        elt_ids: &[usize],
        ref_value: Option<&[f64]>,
        elt_values: Option<&[f64]>,
    ) -> CsResult<()> {
        const FUNC: &str = "enforce_by_cell_selection";
        if elt_ids.is_empty() {
            return Ok(());
        }
        self.ensure_unlocked(FUNC)?;
        if matches!(&self.enforcement, Some(e) if e.target == EnforcementTarget::VertexDofs) {
            return Err(CsError::enforcement_conflict(&self.name, FUNC));
        }
        self.check_enforcement_values(FUNC, elt_ids.len(), ref_value, elt_values)?;
        self.set_enforcement(EnforcementTarget::Cells, elt_ids, ref_value, elt_values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyKind;
    use cs_mesh::BoxMeshGenerator;

    fn zones() -> ZoneRegistry {
        let gen = BoxMeshGenerator::cube(2, 1.0);
        let mesh = gen.build();
        let quant = mesh.compute_quantities();
        let mut zones = ZoneRegistry::new(&mesh, &quant);
        gen.register_boundary_zones(&mut zones).unwrap();
        zones
    }

    #[test]
    fn test_defaults() {
        let eqp = EquationParam::new("T", EquationType::Thermal, 1, BcType::HmgDirichlet);
        assert_eq!(eqp.verbosity(), 2);
        assert_eq!(eqp.space_scheme(), SpaceScheme::CdoVb);
        assert_eq!(eqp.bc().strong_pena_coeff, 1e12);
        assert_eq!(eqp.bc().weak_pena_coeff, 100.0);
        assert_eq!(eqp.time().theta, 1.0);
        assert!(eqp.time().hodge.is_unity);
        assert_eq!(eqp.diffusion().hodge.algo, HodgeAlgo::Cost);
        assert!((eqp.diffusion().hodge.coef - 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(eqp.curlcurl().hodge.kind, HodgeType::Fped);
        assert!(eqp.graddiv().hodge.is_unity);
        assert_eq!(eqp.reaction().hodge.algo, HodgeAlgo::Wbs);
        assert_eq!(eqp.advection().upwind_portion, 0.15);
        assert_eq!(eqp.enforcement_ref_value(), &[0.0]);
        assert_eq!(eqp.assembly_strategy(), AssemblyStrategy::Critical);
        assert!(!eqp.is_locked());
    }

    #[test]
    fn test_terms() {
        let mut eqp = EquationParam::new("U", EquationType::User, 3, BcType::HmgDirichlet);
        eqp.add_diffusion(Property::new("mu", PropertyKind::Aniso)).unwrap();
        eqp.add_time(Property::new("rho", PropertyKind::Iso)).unwrap();
        let r0 = eqp.add_reaction(Property::new("k0", PropertyKind::Iso)).unwrap();
        let r1 = eqp.add_reaction(Property::new("k1", PropertyKind::Iso)).unwrap();
        assert_eq!((r0, r1), (0, 1));
        assert!(!eqp.diffusion().hodge.is_iso);
        assert!(eqp.flag().contains(eq_flag::DIFFUSION | eq_flag::UNSTEADY | eq_flag::REACTION));
        assert!(!eqp.flag().contains(eq_flag::CONVECTION));
    }

    #[test]
    fn test_bc_dims() {
        let z = zones();
        let mut scalar = EquationParam::new("S", EquationType::User, 1, BcType::HmgNeumann);
        let id = scalar.add_bc_by_value(BcType::Neumann, &z, "xmin", &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(scalar.bc().defs[id].dim, 3);
        let id = scalar.add_bc_by_value(BcType::Robin, &z, "xmax", &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(scalar.bc().defs[id].dim, 3);
        assert!(scalar.add_sliding_condition(&z, "ymin").is_err());
        assert!(scalar
            .add_bc_by_analytic(BcType::Circulation, &z, "", AnalyticFunc::scalar(|_, _| 0.0))
            .is_err());

        let mut vector = EquationParam::new("V", EquationType::User, 3, BcType::HmgDirichlet);
        assert!(vector.add_bc_by_value(BcType::Robin, &z, "xmin", &[0.0; 3]).is_err());
        let id = vector.add_bc_by_value(BcType::Neumann, &z, "xmin", &[0.0; 9]).unwrap();
        assert_eq!(vector.bc().defs[id].dim, 9);
        let id = vector
            .add_bc_by_analytic(BcType::Circulation, &z, "zmax", AnalyticFunc::scalar(|_, _| 1.0))
            .unwrap();
        assert_eq!(vector.bc().defs[id].dim, 1);
        let id = vector.add_sliding_condition(&z, "ymin").unwrap();
        assert!(vector.bc().defs[id].meta.contains(crate::param::bc_flag::SLIDING));
        assert!(vector.add_bc_by_value(BcType::Dirichlet, &z, "nowhere", &[0.0; 3]).is_err());
    }

    #[test]
    fn test_source_term_flags() {
        let mut z = zones();
        let mut eqp = EquationParam::new("S", EquationType::User, 1, BcType::HmgDirichlet);
        let all = eqp.add_source_term_by_val(&z, "", &[1.0]).unwrap();
        let st = &eqp.source_terms()[all];
        assert!(st.meta.contains(flag::DUAL_CELL | flag::FULL_LOC));
        assert!(st.state.contains(state::DENSITY | state::UNIFORM));

        z.add_volume_zone("half", vec![0, 1, 2, 3]).unwrap();
        let part = eqp
            .add_source_term_by_analytic(&z, "half", AnalyticFunc::scalar(|_, x| x.x))
            .unwrap();
        let st = &eqp.source_terms()[part];
        assert!(!st.is_full_location());
        assert_eq!(st.qtype, QuadratureType::BarySubdiv);

        let arr = eqp
            .add_source_term_by_array(&z, "", flag::PRIMAL_CELL, vec![1.0; 8])
            .unwrap();
        assert!(eqp.source_terms()[arr].state.contains(state::CELLWISE));
    }

    #[test]
    fn test_source_term_edge_based_rejected() {
        let z = zones();
        let mut eqp = EquationParam::new("E", EquationType::Maxwell, 3, BcType::HmgDirichlet);
        eqp.set_param(EquationKey::SpaceScheme, "cdo_eb").unwrap();
        assert!(matches!(
            eqp.add_source_term_by_val(&z, "", &[0.0; 3]),
            Err(CsError::InvalidScheme { .. })
        ));
    }

    #[test]
    fn test_enforcement_exclusive() {
        let mut eqp = EquationParam::new("P", EquationType::User, 1, BcType::HmgNeumann);
        eqp.enforce_vertex_dofs(&[], None, None).unwrap();
        assert!(eqp.enforcement().is_none());

        assert!(eqp.enforce_vertex_dofs(&[0, 1], None, None).is_err());
        eqp.enforce_vertex_dofs(&[0, 1], Some(&[2.0]), None).unwrap();
        let e = eqp.enforcement().unwrap();
        assert!(e.by_reference());
        assert_eq!(eqp.enforcement_ref_value(), &[2.0]);
        assert!(eqp.flag().contains(eq_flag::FORCE_VALUES));

        assert!(matches!(
            eqp.enforce_by_cell_selection(&[3], Some(&[1.0]), None),
            Err(CsError::EnforcementConflict { .. })
        ));

        // 同类请求替换原有选择
        eqp.enforce_vertex_dofs(&[5], Some(&[0.0]), Some(&[7.0])).unwrap();
        let e = eqp.enforcement().unwrap();
        assert_eq!(e.elt_ids, vec![5]);
        assert_eq!(e.values.as_deref(), Some(&[7.0][..]));
        // 逐元素取值优先，参考值保持上一次的设置
        assert_eq!(eqp.enforcement_ref_value(), &[2.0]);
    }

    #[test]
    fn test_enforce_vertex_dofs_requires_vertex_scheme() {
        let mut eqp = EquationParam::new("P", EquationType::User, 1, BcType::HmgNeumann);
        eqp.set_param(EquationKey::SpaceScheme, "cdo_fb").unwrap();
        assert!(eqp.enforce_vertex_dofs(&[0], Some(&[1.0]), None).is_err());
        eqp.enforce_by_cell_selection(&[0, 2], None, Some(&[1.0, 2.0])).unwrap();
        assert_eq!(eqp.enforcement().unwrap().target, EnforcementTarget::Cells);
    }

    #[test]
    fn test_lock_blocks_mutation() {
        let z = zones();
        let mut eqp = EquationParam::new("L", EquationType::User, 1, BcType::HmgNeumann);
        eqp.last_stage().unwrap();
        assert!(eqp.is_locked());
        assert!(matches!(eqp.last_stage(), Err(CsError::Locked { .. })));
        assert!(eqp.add_source_term_by_val(&z, "", &[1.0]).is_err());
        assert!(eqp.add_time(Property::new("rho", PropertyKind::Iso)).is_err());
        assert!(eqp.enforce_by_cell_selection(&[0], Some(&[0.0]), None).is_err());
    }

    #[test]
    fn test_lumping_at_last_stage() {
        let z = zones();
        let mut eqp = EquationParam::new("L", EquationType::User, 1, BcType::HmgNeumann);
        eqp.set_param(EquationKey::DoLumping, "true").unwrap();
        let id = eqp
            .add_source_term_by_analytic(&z, "", AnalyticFunc::scalar(|_, _| 1.0))
            .unwrap();
        eqp.set_source_term_quadrature(id, QuadratureType::Highest).unwrap();
        eqp.last_stage().unwrap();
        assert_eq!(eqp.source_terms()[id].qtype, QuadratureType::Bary);
        assert_eq!(eqp.reaction().hodge.algo, HodgeAlgo::Voronoi);
        assert_eq!(eqp.time().hodge.algo, HodgeAlgo::Voronoi);
    }

    #[test]
    fn test_update_from_deep_copy() {
        let z = zones();
        let mut reference = EquationParam::new("Ref", EquationType::User, 1, BcType::HmgNeumann);
        reference.set_param(EquationKey::SpaceScheme, "cdo_fb").unwrap();
        reference.set_param(EquationKey::Itsol, "cg").unwrap();
        reference.add_source_term_by_val(&z, "", &[3.0]).unwrap();
        reference.add_bc_by_value(BcType::Dirichlet, &z, "xmin", &[1.0]).unwrap();
        reference.enforce_by_cell_selection(&[1, 2], Some(&[4.0]), None).unwrap();
        reference.add_diffusion(Property::new("k", PropertyKind::Iso)).unwrap();
        reference.last_stage().unwrap();

        let mut dst = EquationParam::new("Dst", EquationType::Predefined, 1, BcType::HmgDirichlet);
        dst.sles_mut().field_id = 12;
        dst.update_from(&reference).unwrap();

        assert_eq!(dst.name(), "Dst");
        assert!(!dst.is_locked());
        assert_eq!(dst.space_scheme(), SpaceScheme::CdoFb);
        assert_eq!(dst.sles().field_id, 12);
        assert_eq!(dst.sles().solver, crate::sles_param::IterativeSolver::Cg);
        assert_eq!(dst.source_terms().len(), 1);
        assert_eq!(dst.bc().defs.len(), 1);
        assert_eq!(dst.enforcement(), reference.enforcement());
        assert_eq!(dst.enforcement_ref_value(), &[4.0]);
        assert!(dst.flag().contains(eq_flag::DIFFUSION));

        // 深拷贝：修改副本不影响参考方程
        dst.set_source_term_quadrature(0, QuadratureType::Highest).unwrap();
        assert_eq!(reference.source_terms()[0].qtype, QuadratureType::Bary);
        drop(reference);
        assert_eq!(dst.source_terms()[0].values(), Some(&[3.0][..]));
    }
}
