// crates/cs_cdo/src/source_term/mod.rs

//! 源项分派与逐单元求值
//!
//! 每个源项定义在设置阶段按 (空间格式 × 定义类型 × 求积类型) 选出唯一的
//! 逐单元核函数；组装阶段逐单元调用这些核函数，把贡献累加到局部向量。
//!
//! # 模块概览
//!
//! - [`vertex`]: 顶点型格式（Vb / VCb）的核函数
//! - [`face`]: 面型格式（Fb / HHO-P0）的核函数
//! - [`evaluate`]: 全局的密度/势求值
//!
//! # 局部向量布局
//!
//! | 格式 | 局部长度 | 全局长度 |
//! |------|----------|----------|
//! | Vb | `n_vc` | `n_vertices` |
//! | VCb | `n_vc + 1` | `n_vertices + n_cells` |
//! | Fb / HHO-P0 | `(n_fc + 1)·dim` | `n_cells·dim`（只回收单元部分） |
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::param::SpaceScheme;
//! use cs_cdo::source_term::{self, SourceTermSetup};
//! use cs_cdo::xdef::{XDef, XDefInput};
//! use cs_foundation::flag;
//! use cs_mesh::{BoxMeshGenerator, ZoneRegistry};
//!
//! let mesh = BoxMeshGenerator::cube(2, 1.0).build();
//! let quant = mesh.compute_quantities();
//! let zones = ZoneRegistry::new(&mesh, &quant);
//!
//! let meta = source_term::default_flag(SpaceScheme::CdoVb).unwrap() | flag::FULL_LOC;
//! let st = XDef::volume(1, 0, XDef::value_state(), meta, XDefInput::Value(vec![2.0]));
//! let defs = vec![st];
//!
//! let setup = SourceTermSetup::init(SpaceScheme::CdoVb, &defs, &zones).unwrap();
//! let rhs = setup.assemble(&defs, &mesh, &quant, 0.0).unwrap();
//! let total: f64 = rhs.iter().sum();
//! assert!((total - 2.0).abs() < 1e-12);
//! ```

pub mod evaluate;
pub mod face;
pub mod vertex;

pub use evaluate::{compute_from_density, compute_from_potential};

use crate::hodge::{CellBuilder, SourceHodge};
use crate::param::SpaceScheme;
use crate::xdef::{XDef, XDefInput, XDefKind};
use cs_foundation::flag;
use cs_foundation::{CsError, CsResult, Flag};
use cs_mesh::{CellMesh, CellMeshFlag, MeshQuantities, PolyMesh, QuadratureType, ZoneRegistry};
use rayon::prelude::*;
use std::fmt;

/// 掩码能容纳的源项数上限
pub const MAX_SOURCE_TERMS: usize = 32;

/// 系统级标志：组装阶段需要准备的内容
pub mod sys_flag {
    use cs_foundation::Flag;

    /// 存在源项
    pub const SOURCETERM: Flag = Flag(1 << 0);
    /// 需要构建局部 Hodge
    pub const HLOC_CONF: Flag = Flag(1 << 1);
    /// 源项需要局部 Hodge
    pub const SOURCES_HLOC: Flag = Flag(1 << 2);
}

// ============================================================================
// 元信息位
// ============================================================================

/// 空间格式下源项定义的默认元信息位
pub fn default_flag(scheme: SpaceScheme) -> CsResult<Flag> {
    match scheme {
        SpaceScheme::CdoVb => Ok(flag::DUAL | flag::CELL),
        SpaceScheme::CdoFb => Ok(flag::PRIMAL | flag::CELL),
        SpaceScheme::CdoVcb | SpaceScheme::HhoP0 | SpaceScheme::HhoP1 | SpaceScheme::HhoP2 => Ok(flag::PRIMAL),
        SpaceScheme::CdoEb => Err(CsError::invalid_definition(
            "default_flag",
            format!("{} 不支持源项", scheme),
        )),
    }
}

/// 源项定义的元信息位
#[inline]
pub fn get_flag(def: &XDef) -> Flag {
    def.meta
}

/// 切换约化方式
///
/// 若定义已带有请求的位则不做任何事。对偶单元与主网格顶点之间可以互换，
/// 维度与位置范围相关的位保持不变。
pub fn set_reduction(def: &mut XDef, reduction: Flag) -> CsResult<()> {
    if def.meta.intersects(reduction) {
        return Ok(());
    }

    let keep = flag::SCALAR | flag::VECTOR | flag::TENSOR | flag::BORDER | flag::BY_CELL | flag::FULL_LOC;
    let kept = def.meta & keep;

    if reduction.contains(flag::DUAL) {
        if def.meta.contains(flag::VERTEX) {
            def.meta = kept | flag::DUAL | flag::CELL;
            return Ok(());
        }
    } else if reduction.contains(flag::PRIMAL) && def.meta.contains(flag::CELL) {
        def.meta = kept | flag::PRIMAL | flag::VERTEX;
        return Ok(());
    }

    Err(CsError::invalid_definition(
        "set_reduction",
        format!("无法把元信息 {} 约化为 {}", def.meta, reduction),
    ))
}

// ============================================================================
// 核函数
// ============================================================================

/// 逐单元核函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKernel {
    /// 对偶单元，常值密度
    DcsdByValue,
    /// 对偶单元，对偶单元重心处求值
    DcsdBaryByAnalytic,
    /// 对偶单元，子四面体重心求积
    DcsdQ1o1ByAnalytic,
    /// 对偶单元，10 点公式
    DcsdQ10o2ByAnalytic,
    /// 对偶单元，5 点 Gauss 公式
    DcsdQ5o3ByAnalytic,
    /// 对偶单元，数组
    DcsdByArray,
    /// 对偶单元，自由度函数
    DcsdByDofFunc,
    /// 主网格顶点势，常值
    PvspByValue,
    /// 主网格顶点势，解析函数
    PvspByAnalytic,
    /// 顶点+单元势，常值
    VcspByValue,
    /// 顶点+单元势，解析函数
    VcspByAnalytic,
    /// 主网格单元标量密度，常值
    PcsdByValue,
    /// 主网格单元标量密度，单元形心求值
    PcsdBaryByAnalytic,
    /// 主网格单元标量密度，数组
    PcsdByArray,
    /// 主网格单元标量密度，自由度函数
    PcsdByDofFunc,
    /// 主网格单元矢量密度，常值
    PcvdByValue,
    /// 主网格单元矢量密度，单元形心求值
    PcvdBaryByAnalytic,
}

impl SourceKernel {
    /// 核函数名
    pub fn name(&self) -> &'static str {
        match self {
            Self::DcsdByValue => "dcsd_by_value",
            Self::DcsdBaryByAnalytic => "dcsd_bary_by_analytic",
            Self::DcsdQ1o1ByAnalytic => "dcsd_q1o1_by_analytic",
            Self::DcsdQ10o2ByAnalytic => "dcsd_q10o2_by_analytic",
            Self::DcsdQ5o3ByAnalytic => "dcsd_q5o3_by_analytic",
            Self::DcsdByArray => "dcsd_by_array",
            Self::DcsdByDofFunc => "dcsd_by_dof_func",
            Self::PvspByValue => "pvsp_by_value",
            Self::PvspByAnalytic => "pvsp_by_analytic",
            Self::VcspByValue => "vcsp_by_value",
            Self::VcspByAnalytic => "vcsp_by_analytic",
            Self::PcsdByValue => "pcsd_by_value",
            Self::PcsdBaryByAnalytic => "pcsd_bary_by_analytic",
            Self::PcsdByArray => "pcsd_by_array",
            Self::PcsdByDofFunc => "pcsd_by_dof_func",
            Self::PcvdByValue => "pcvd_by_value",
            Self::PcvdBaryByAnalytic => "pcvd_bary_by_analytic",
        }
    }

    /// 核函数需要的局部网格量
    pub fn cell_mesh_flag(&self) -> CellMeshFlag {
        use CellMeshFlag as F;
        match self {
            Self::DcsdByValue | Self::DcsdByArray | Self::DcsdByDofFunc => F::DEQ,
            Self::DcsdBaryByAnalytic => F::PVQ | F::EV | F::PFQ | F::HFQ | F::FE | F::FEQ | F::DEQ,
            Self::DcsdQ1o1ByAnalytic => F::PVQ | F::EV | F::PFQ | F::HFQ | F::FE | F::FEQ,
            Self::DcsdQ10o2ByAnalytic => {
                F::PVQ | F::PEQ | F::EV | F::PFQ | F::HFQ | F::FE | F::FEQ | F::DEQ
            }
            Self::DcsdQ5o3ByAnalytic => F::PVQ | F::PEQ | F::PFQ | F::FE | F::EV,
            Self::PvspByValue | Self::PvspByAnalytic | Self::VcspByValue | Self::VcspByAnalytic => {
                F::PVQ | F::DEQ
            }
            Self::PcsdByValue
            | Self::PcsdBaryByAnalytic
            | Self::PcsdByArray
            | Self::PcsdByDofFunc
            | Self::PcvdByValue
            | Self::PcvdBaryByAnalytic => F::PFQ,
        }
    }

    /// 是否需要局部 Hodge 矩阵
    pub fn needs_hodge(&self) -> bool {
        matches!(
            self,
            Self::PvspByValue | Self::PvspByAnalytic | Self::VcspByValue | Self::VcspByAnalytic
        )
    }

    /// 在单元上求值并累加到 `out`
    pub fn compute(&self, def: &XDef, cm: &CellMesh, time: f64, cb: &mut CellBuilder, out: &mut [f64]) {
        match self {
            Self::DcsdByValue => vertex::dcsd_by_value(def, cm, out),
            Self::DcsdBaryByAnalytic => vertex::dcsd_bary_by_analytic(def, cm, time, cb, out),
            Self::DcsdQ1o1ByAnalytic => vertex::dcsd_q1o1_by_analytic(def, cm, time, cb, out),
            Self::DcsdQ10o2ByAnalytic => vertex::dcsd_q10o2_by_analytic(def, cm, time, cb, out),
            Self::DcsdQ5o3ByAnalytic => vertex::dcsd_q5o3_by_analytic(def, cm, time, cb, out),
            Self::DcsdByArray => vertex::dcsd_by_array(def, cm, out),
            Self::DcsdByDofFunc => vertex::dcsd_by_dof_func(def, cm, cb, out),
            Self::PvspByValue => vertex::pvsp_by_value(def, cm, cb, out),
            Self::PvspByAnalytic => vertex::pvsp_by_analytic(def, cm, time, cb, out),
            Self::VcspByValue => vertex::vcsp_by_value(def, cm, cb, out),
            Self::VcspByAnalytic => vertex::vcsp_by_analytic(def, cm, time, cb, out),
            Self::PcsdByValue => face::pcsd_by_value(def, cm, out),
            Self::PcsdBaryByAnalytic => face::pcsd_bary_by_analytic(def, cm, time, out),
            Self::PcsdByArray => face::pcsd_by_array(def, cm, out),
            Self::PcsdByDofFunc => face::pcsd_by_dof_func(def, cm, cb, out),
            Self::PcvdByValue => face::pcvd_by_value(def, cm, out),
            Self::PcvdBaryByAnalytic => face::pcvd_bary_by_analytic(def, cm, time, out),
        }
    }
}

impl fmt::Display for SourceKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 为单个源项定义选择核函数
pub fn select_kernel(scheme: SpaceScheme, def: &XDef) -> CsResult<SourceKernel> {
    const FUNC: &str = "select_kernel";
    let kind = def.kind();
    let fail = |what: String| Err(CsError::invalid_definition(FUNC, what));

    if kind == XDefKind::Analytic && def.qtype == QuadratureType::None {
        return fail("解析源项未设置求积类型".to_string());
    }

    match scheme {
        SpaceScheme::CdoVb | SpaceScheme::CdoVcb => {
            if def.dim != 1 {
                return fail(format!("{} 只支持标量源项 (dim = {})", scheme, def.dim));
            }
            if def.meta.contains(flag::DUAL) {
                if scheme == SpaceScheme::CdoVcb {
                    return fail(format!("{} 不支持对偶单元约化", scheme));
                }
                return match kind {
                    XDefKind::Value => Ok(SourceKernel::DcsdByValue),
                    XDefKind::Analytic => match def.qtype {
                        QuadratureType::Bary => Ok(SourceKernel::DcsdBaryByAnalytic),
                        QuadratureType::BarySubdiv => Ok(SourceKernel::DcsdQ1o1ByAnalytic),
                        QuadratureType::Higher => Ok(SourceKernel::DcsdQ10o2ByAnalytic),
                        QuadratureType::Highest => Ok(SourceKernel::DcsdQ5o3ByAnalytic),
                        QuadratureType::None => fail("解析源项未设置求积类型".to_string()),
                    },
                    XDefKind::Array | XDefKind::DofFunc => {
                        let loc = data_location(def);
                        if ![flag::PRIMAL_CELL, flag::PRIMAL_VTX, flag::DUAL_CELL].iter().any(|&l| loc.contains(l)) {
                            return fail(format!("{} 的源项数据位置 {} 不可用", scheme, loc));
                        }
                        if kind == XDefKind::Array {
                            Ok(SourceKernel::DcsdByArray)
                        } else {
                            Ok(SourceKernel::DcsdByDofFunc)
                        }
                    }
                    XDefKind::Qov => fail(format!("{} 的源项不接受 {} 定义", scheme, kind)),
                };
            }
            if !def.meta.contains(flag::PRIMAL) {
                return fail(format!("源项元信息 {} 缺少约化位置", def.meta));
            }
            match (scheme, kind) {
                (SpaceScheme::CdoVb, XDefKind::Value) => Ok(SourceKernel::PvspByValue),
                (SpaceScheme::CdoVb, XDefKind::Analytic) => Ok(SourceKernel::PvspByAnalytic),
                (SpaceScheme::CdoVcb, XDefKind::Value) => Ok(SourceKernel::VcspByValue),
                (SpaceScheme::CdoVcb, XDefKind::Analytic) => Ok(SourceKernel::VcspByAnalytic),
                _ => fail(format!("{} 的势形式源项不接受 {} 定义", scheme, kind)),
            }
        }

        SpaceScheme::CdoFb | SpaceScheme::HhoP0 => match (def.dim, kind) {
            (_, XDefKind::Array | XDefKind::DofFunc) if !data_location(def).contains(flag::PRIMAL_CELL) => {
                fail(format!("{} 的源项数据必须位于主网格单元", scheme))
            }
            (1, XDefKind::Value) => Ok(SourceKernel::PcsdByValue),
            (1, XDefKind::Analytic) => Ok(SourceKernel::PcsdBaryByAnalytic),
            (1, XDefKind::Array) => Ok(SourceKernel::PcsdByArray),
            (1, XDefKind::DofFunc) => Ok(SourceKernel::PcsdByDofFunc),
            (3, XDefKind::Value) => Ok(SourceKernel::PcvdByValue),
            (3, XDefKind::Analytic) => Ok(SourceKernel::PcvdBaryByAnalytic),
            (dim, kind) => fail(format!("{} 不支持 dim = {} 的 {} 源项", scheme, dim, kind)),
        },

        SpaceScheme::CdoEb | SpaceScheme::HhoP1 | SpaceScheme::HhoP2 => {
            fail(format!("{} 尚无源项核函数", scheme))
        }
    }
}

/// 检查数组型源项的长度与网格是否一致
///
/// 位于主网格单元的数组需要 `n_cells·stride` 个值，其余位置（主网格顶点、
/// 对偶单元）需要 `n_vertices·stride` 个值。
pub fn check_array_sizes(defs: &[XDef], n_vertices: usize, n_cells: usize) -> CsResult<()> {
    for def in defs {
        if let XDefInput::Array { stride, loc, values } = &def.input {
            let n_elts = if loc.contains(flag::PRIMAL_CELL) {
                n_cells
            } else {
                n_vertices
            };
            CsError::check_size("source_term.array", n_elts * stride, values.len())?;
        }
    }
    Ok(())
}

/// 数组或自由度函数的数据位置
fn data_location(def: &XDef) -> Flag {
    match &def.input {
        XDefInput::Array { loc, .. } | XDefInput::DofFunc { loc, .. } => *loc,
        _ => Flag::EMPTY,
    }
}

// ============================================================================
// 设置与组装
// ============================================================================

/// 源项的设置结果：核函数表、掩码与所需局部量
#[derive(Debug, Clone)]
pub struct SourceTermSetup {
    scheme: SpaceScheme,
    kernels: Vec<SourceKernel>,
    mask: Option<Vec<u32>>,
    cell_flag: CellMeshFlag,
    sys_flag: Flag,
    hodge: Option<SourceHodge>,
}

impl SourceTermSetup {
    /// 为一组源项定义选择核函数并构建单元掩码
    pub fn init(scheme: SpaceScheme, defs: &[XDef], zones: &ZoneRegistry) -> CsResult<Self> {
        if defs.len() > MAX_SOURCE_TERMS {
            return Err(CsError::too_many_source_terms(defs.len(), MAX_SOURCE_TERMS));
        }

        let mut kernels = Vec::with_capacity(defs.len());
        let mut cell_flag = CellMeshFlag::EMPTY;
        let mut sys = Flag::EMPTY;
        let mut hodge = None;

        for def in defs {
            let kernel = select_kernel(scheme, def)?;
            cell_flag = cell_flag | kernel.cell_mesh_flag();
            if kernel.needs_hodge() {
                let kind = SourceHodge::for_scheme(scheme)?;
                cell_flag = cell_flag | kind.cell_mesh_flag();
                sys |= sys_flag::HLOC_CONF | sys_flag::SOURCES_HLOC;
                hodge = Some(kind);
            }
            log::debug!("源项 #{} ({}): {}", kernels.len(), def.describe(), kernel);
            kernels.push(kernel);
        }
        if !defs.is_empty() {
            sys |= sys_flag::SOURCETERM;
        }

        let mask = if defs.iter().all(XDef::is_full_location) {
            None
        } else {
            Some(build_mask(defs, zones)?)
        };

        Ok(Self {
            scheme,
            kernels,
            mask,
            cell_flag,
            sys_flag: sys,
            hodge,
        })
    }

    /// 空间格式
    #[inline]
    pub fn scheme(&self) -> SpaceScheme {
        self.scheme
    }

    /// 核函数表（与源项定义一一对应）
    #[inline]
    pub fn kernels(&self) -> &[SourceKernel] {
        &self.kernels
    }

    /// 单元掩码（全部源项覆盖整个计算域时为 `None`）
    #[inline]
    pub fn mask(&self) -> Option<&[u32]> {
        self.mask.as_deref()
    }

    /// 组装需要的局部网格量
    #[inline]
    pub fn cell_mesh_flag(&self) -> CellMeshFlag {
        self.cell_flag
    }

    /// 系统级标志
    #[inline]
    pub fn sys_flag(&self) -> Flag {
        self.sys_flag
    }

    /// 源项使用的局部 Hodge 构造
    #[inline]
    pub fn hodge(&self) -> Option<SourceHodge> {
        self.hodge
    }

    /// 单元局部向量长度
    pub fn n_local_dofs(&self, cm: &CellMesh, dim: usize) -> usize {
        match self.scheme {
            SpaceScheme::CdoVb => cm.n_vc(),
            SpaceScheme::CdoVcb => cm.n_vc() + 1,
            _ => (cm.n_fc() + 1) * dim,
        }
    }

    /// 在单元上计算全部源项的贡献
    ///
    /// `out` 先清零；若 SOURCETERM 未置位直接返回。需要局部 Hodge 时在
    /// `cb` 中就地构建。
    pub fn compute_cellwise(&self, defs: &[XDef], cm: &CellMesh, cb: &mut CellBuilder, time: f64, out: &mut [f64]) {
        debug_assert_eq!(defs.len(), self.kernels.len());
        out.iter_mut().for_each(|x| *x = 0.0);
        if !self.sys_flag.contains(sys_flag::SOURCETERM) {
            return;
        }

        if let Some(kind) = self.hodge {
            cb.build_hodge(kind, cm);
        }

        let cell_mask = self.mask.as_ref().map(|m| m[cm.c_id]);
        for (st_id, (def, kernel)) in defs.iter().zip(&self.kernels).enumerate() {
            if let Some(m) = cell_mask {
                if m & (1 << st_id) == 0 {
                    continue;
                }
            }
            kernel.compute(def, cm, time, cb, out);
        }
    }

    /// 组装全局源项向量
    ///
    /// 单元并行计算局部贡献，再串行累加到全局向量。数组型源项的长度与
    /// 网格不符时返回 [`CsError::SizeMismatch`]。
    pub fn assemble(&self, defs: &[XDef], mesh: &PolyMesh, quant: &MeshQuantities, time: f64) -> CsResult<Vec<f64>> {
        let n_cells = mesh.n_cells();
        let n_vertices = mesh.n_vertices();
        CsError::check_size("source_term.defs", self.kernels.len(), defs.len())?;
        check_array_sizes(defs, n_vertices, n_cells)?;
        let dim = defs.first().map_or(1, |d| d.dim);

        let global_len = match self.scheme {
            SpaceScheme::CdoVb => n_vertices,
            SpaceScheme::CdoVcb => n_vertices + n_cells,
            _ => n_cells * dim,
        };
        let mut rhs = vec![0.0; global_len];
        if !self.sys_flag.contains(sys_flag::SOURCETERM) {
            return Ok(rhs);
        }

        // 只有顶点型格式需要顶点编号
        let flag = match self.scheme {
            SpaceScheme::CdoVb | SpaceScheme::CdoVcb => self.cell_flag | CellMeshFlag::PV,
            _ => self.cell_flag | CellMeshFlag::PFQ,
        };

        let contributions: Vec<(usize, Vec<usize>, Vec<f64>)> = (0..n_cells)
            .into_par_iter()
            .filter(|&c| self.mask.as_ref().map_or(true, |m| m[c] != 0))
            .map_init(
                || (CellMesh::default(), CellBuilder::new()),
                |(cm, cb), c_id| {
                    cm.build(mesh, quant, c_id, flag);
                    let mut out = vec![0.0; self.n_local_dofs(cm, dim)];
                    self.compute_cellwise(defs, cm, cb, time, &mut out);
                    (c_id, cm.v_ids.clone(), out)
                },
            )
            .collect();

        for (c_id, v_ids, out) in contributions {
            match self.scheme {
                SpaceScheme::CdoVb => {
                    for (v, &v_id) in v_ids.iter().enumerate() {
                        rhs[v_id] += out[v];
                    }
                }
                SpaceScheme::CdoVcb => {
                    for (v, &v_id) in v_ids.iter().enumerate() {
                        rhs[v_id] += out[v];
                    }
                    rhs[n_vertices + c_id] += out[v_ids.len()];
                }
                _ => {
                    let cell_part = &out[out.len() - dim..];
                    for (k, &x) in cell_part.iter().enumerate() {
                        rhs[c_id * dim + k] += x;
                    }
                }
            }
        }

        log::trace!("源项组装完成: {} 个单元贡献, 全局长度 {}", n_cells, global_len);
        Ok(rhs)
    }
}

/// 构建单元掩码：第 `st_id` 位表示该单元受源项 `st_id` 作用
fn build_mask(defs: &[XDef], zones: &ZoneRegistry) -> CsResult<Vec<u32>> {
    let mut mask = vec![0u32; zones.n_cells()];
    for (st_id, def) in defs.iter().enumerate() {
        let bit = 1u32 << st_id;
        if def.is_full_location() {
            mask.par_iter_mut().for_each(|m| *m |= bit);
            continue;
        }
        let zone = zones
            .volume_zone(def.z_id)
            .ok_or_else(|| CsError::unknown_zone("volume", def.z_id.to_string()))?;
        for &c_id in &zone.elt_ids {
            mask[c_id] |= bit;
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xdef::{AnalyticFunc, DofFunc};
    use cs_foundation::flag::state;
    use cs_mesh::BoxMeshGenerator;

    fn vb_value(z_id: usize, v: f64) -> XDef {
        let mut meta = default_flag(SpaceScheme::CdoVb).unwrap();
        if z_id == 0 {
            meta |= flag::FULL_LOC;
        }
        XDef::volume(1, z_id, state::DENSITY | state::UNIFORM, meta, XDefInput::Value(vec![v]))
    }

    fn analytic(scheme: SpaceScheme, q: QuadratureType) -> XDef {
        let meta = default_flag(scheme).unwrap() | flag::FULL_LOC;
        let mut d = XDef::volume(
            1,
            0,
            state::DENSITY,
            meta,
            XDefInput::Analytic(AnalyticFunc::scalar(|_, x| x.x)),
        );
        d.set_quadrature(q);
        d
    }

    #[test]
    fn test_default_flags() {
        assert_eq!(default_flag(SpaceScheme::CdoVb).unwrap(), flag::DUAL_CELL);
        assert_eq!(default_flag(SpaceScheme::CdoFb).unwrap(), flag::PRIMAL_CELL);
        assert_eq!(default_flag(SpaceScheme::CdoVcb).unwrap(), flag::PRIMAL);
        assert_eq!(default_flag(SpaceScheme::HhoP1).unwrap(), flag::PRIMAL);
        assert!(default_flag(SpaceScheme::CdoEb).is_err());
    }

    #[test]
    fn test_set_reduction() {
        let mut d = vb_value(0, 1.0);
        set_reduction(&mut d, flag::PRIMAL).unwrap();
        assert!(d.meta.contains(flag::PRIMAL_VTX | flag::SCALAR | flag::FULL_LOC));
        assert!(!d.meta.contains(flag::DUAL));

        // 切回对偶单元
        set_reduction(&mut d, flag::DUAL).unwrap();
        assert!(d.meta.contains(flag::DUAL_CELL | flag::SCALAR));
        assert!(!d.meta.contains(flag::VERTEX));

        // 已带有请求位时不变
        let before = d.meta;
        set_reduction(&mut d, flag::DUAL).unwrap();
        assert_eq!(d.meta, before);

        let mut vcb = XDef::volume(1, 0, state::DENSITY, flag::PRIMAL, XDefInput::Value(vec![1.0]));
        assert!(set_reduction(&mut vcb, flag::DUAL).is_err());
        assert!(set_reduction(&mut vcb, flag::BORDER).is_err());
        assert_eq!(get_flag(&vcb), flag::PRIMAL | flag::SCALAR);
    }

    #[test]
    fn test_dispatch_vb() {
        let s = SpaceScheme::CdoVb;
        assert_eq!(select_kernel(s, &vb_value(0, 1.0)).unwrap(), SourceKernel::DcsdByValue);
        assert_eq!(
            select_kernel(s, &analytic(s, QuadratureType::Bary)).unwrap(),
            SourceKernel::DcsdBaryByAnalytic
        );
        assert_eq!(
            select_kernel(s, &analytic(s, QuadratureType::BarySubdiv)).unwrap(),
            SourceKernel::DcsdQ1o1ByAnalytic
        );
        assert_eq!(
            select_kernel(s, &analytic(s, QuadratureType::Higher)).unwrap(),
            SourceKernel::DcsdQ10o2ByAnalytic
        );
        assert_eq!(
            select_kernel(s, &analytic(s, QuadratureType::Highest)).unwrap(),
            SourceKernel::DcsdQ5o3ByAnalytic
        );
        assert!(select_kernel(s, &analytic(s, QuadratureType::None)).is_err());

        let mut primal = vb_value(0, 1.0);
        set_reduction(&mut primal, flag::PRIMAL).unwrap();
        let k = select_kernel(s, &primal).unwrap();
        assert_eq!(k, SourceKernel::PvspByValue);
        assert!(k.needs_hodge());
    }

    #[test]
    fn test_dispatch_face_and_errors() {
        let s = SpaceScheme::CdoFb;
        let meta = default_flag(s).unwrap();
        let vec_val = XDef::volume(3, 0, state::DENSITY, meta, XDefInput::Value(vec![1.0, 0.0, 0.0]));
        assert_eq!(select_kernel(s, &vec_val).unwrap(), SourceKernel::PcvdByValue);
        assert_eq!(
            select_kernel(SpaceScheme::HhoP0, &analytic(s, QuadratureType::Bary)).unwrap(),
            SourceKernel::PcsdBaryByAnalytic
        );
        let dof = XDef::volume(
            1,
            0,
            state::DENSITY,
            meta,
            XDefInput::DofFunc {
                loc: flag::PRIMAL_CELL,
                func: DofFunc::new(|_, _, _| {}),
            },
        );
        assert_eq!(select_kernel(s, &dof).unwrap(), SourceKernel::PcsdByDofFunc);

        let qov = XDef::volume(1, 0, state::DENSITY, meta, XDefInput::Qov(1.0));
        assert!(select_kernel(s, &qov).is_err());
        assert!(select_kernel(SpaceScheme::HhoP1, &vec_val).is_err());

        let vertex_array = XDef::volume(
            1,
            0,
            state::DENSITY,
            meta,
            XDefInput::Array {
                stride: 1,
                loc: flag::PRIMAL_VTX,
                values: vec![0.0; 8],
            },
        );
        assert!(select_kernel(s, &vertex_array).is_err());
        assert!(select_kernel(SpaceScheme::CdoEb, &vec_val).is_err());

        // VCb 不接受对偶单元约化
        assert!(select_kernel(SpaceScheme::CdoVcb, &vb_value(0, 1.0)).is_err());
    }

    #[test]
    fn test_too_many_terms() {
        let mesh = BoxMeshGenerator::cube(1, 1.0).build();
        let quant = mesh.compute_quantities();
        let zones = ZoneRegistry::new(&mesh, &quant);
        let defs: Vec<XDef> = (0..33).map(|_| vb_value(0, 1.0)).collect();
        assert!(matches!(
            SourceTermSetup::init(SpaceScheme::CdoVb, &defs, &zones),
            Err(CsError::TooManySourceTerms { count: 33, max: 32 })
        ));
    }

    #[test]
    fn test_mask_bits() {
        let mesh = BoxMeshGenerator::cube(2, 1.0).build();
        let quant = mesh.compute_quantities();
        let mut zones = ZoneRegistry::new(&mesh, &quant);
        let z = zones.add_volume_zone("corner", vec![0]).unwrap();

        let defs = vec![vb_value(0, 1.0), vb_value(z, 1.0)];
        let setup = SourceTermSetup::init(SpaceScheme::CdoVb, &defs, &zones).unwrap();
        let mask = setup.mask().unwrap();
        assert_eq!(mask[0], 0b11);
        assert!(mask[1..].iter().all(|&m| m == 0b01));
        assert!(setup.sys_flag().contains(sys_flag::SOURCETERM));
        assert!(!setup.sys_flag().contains(sys_flag::HLOC_CONF));

        let full = SourceTermSetup::init(SpaceScheme::CdoVb, &defs[..1], &zones).unwrap();
        assert!(full.mask().is_none());
    }

    fn vb_array(loc: Flag, values: Vec<f64>) -> XDef {
        let meta = default_flag(SpaceScheme::CdoVb).unwrap() | flag::FULL_LOC;
        XDef::volume(1, 0, state::DENSITY, meta, XDefInput::Array { stride: 1, loc, values })
    }

    #[test]
    fn test_array_size_checked() {
        let mesh = BoxMeshGenerator::cube(2, 1.0).build();
        let quant = mesh.compute_quantities();
        let zones = ZoneRegistry::new(&mesh, &quant);

        // 逐单元数组过短
        let defs = vec![vb_array(flag::PRIMAL_CELL, vec![1.0])];
        let setup = SourceTermSetup::init(SpaceScheme::CdoVb, &defs, &zones).unwrap();
        assert!(matches!(
            setup.assemble(&defs, &mesh, &quant, 0.0),
            Err(CsError::SizeMismatch { expected: 8, actual: 1, .. })
        ));

        // 逐顶点数组按单元数给出
        let defs = vec![vb_array(flag::PRIMAL_VTX, vec![1.0; 8])];
        assert!(matches!(
            check_array_sizes(&defs, mesh.n_vertices(), mesh.n_cells()),
            Err(CsError::SizeMismatch { expected: 27, actual: 8, .. })
        ));

        let defs = vec![vb_array(flag::PRIMAL_CELL, vec![1.0; 8])];
        let setup = SourceTermSetup::init(SpaceScheme::CdoVb, &defs, &zones).unwrap();
        let total: f64 = setup.assemble(&defs, &mesh, &quant, 0.0).unwrap().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_setup_assembles_zero() {
        let mesh = BoxMeshGenerator::cube(1, 1.0).build();
        let quant = mesh.compute_quantities();
        let zones = ZoneRegistry::new(&mesh, &quant);
        let setup = SourceTermSetup::init(SpaceScheme::CdoVb, &[], &zones).unwrap();
        assert!(setup.sys_flag().is_empty());
        let rhs = setup.assemble(&[], &mesh, &quant, 0.0).unwrap();
        assert_eq!(rhs.len(), 8);
        assert!(rhs.iter().all(|&x| x == 0.0));
    }
}
