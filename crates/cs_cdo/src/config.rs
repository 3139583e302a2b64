// crates/cs_cdo/src/config.rs

//! JSON 设置文件
//!
//! 一个设置文件描述长方体网格、体区域以及一组方程。每个方程给出关键字
//! 列表、初始条件、边界条件、源项、方程项和内部自由度强制；关键字按文件中的
//! 顺序经由 [`EquationParam::set_param_str`] 设置，因此与代码中逐项调用等价。
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::config::SetupConfig;
//!
//! let json = r#"{
//!     "mesh": { "n": [2, 2, 2] },
//!     "equations": [{
//!         "name": "Temperature",
//!         "keys": [
//!             { "key": "space_scheme", "value": "cdo_vb" },
//!             { "key": "itsol_eps", "value": 1e-10 }
//!         ],
//!         "source_terms": [
//!             { "definition": { "by": "value", "value": [1.0] } }
//!         ]
//!     }]
//! }"#;
//!
//! let setup = SetupConfig::from_json_str(json).unwrap().build().unwrap();
//! assert_eq!(setup.equations.len(), 1);
//! assert_eq!(setup.equations[0].source_terms().len(), 1);
//! ```

use crate::equation_param::EquationParam;
use crate::param::{BcType, EquationType};
use crate::property::{AdvectionField, Property, PropertyKind};
use crate::source_term;
use crate::xdef::AnalyticFunc;
use cs_foundation::flag;
use cs_foundation::{CsError, CsResult, Flag};
use cs_mesh::{BoxMeshGenerator, MeshQuantities, PolyMesh, QuadratureType, ZoneRegistry};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ============================================================================
// 网格与区域
// ============================================================================

/// 长方体网格参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxMeshConfig {
    /// 各方向单元数
    #[serde(default = "default_n")]
    pub n: [usize; 3],
    /// 各方向长度
    #[serde(default = "default_length")]
    pub length: [f64; 3],
    /// 原点
    #[serde(default)]
    pub origin: [f64; 3],
}

fn default_n() -> [usize; 3] {
    [4, 4, 4]
}
fn default_length() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for BoxMeshConfig {
    fn default() -> Self {
        Self {
            n: default_n(),
            length: default_length(),
            origin: [0.0; 3],
        }
    }
}

impl BoxMeshConfig {
    /// 网格生成器
    pub fn generator(&self) -> BoxMeshGenerator {
        let [nx, ny, nz] = self.n;
        let [lx, ly, lz] = self.length;
        BoxMeshGenerator::new(nx, ny, nz, lx, ly, lz).with_origin(DVec3::from_array(self.origin))
    }

    fn validate(&self) -> CsResult<()> {
        if self.n.iter().any(|&n| n == 0) {
            return Err(CsError::config("mesh.n 的每个分量必须大于 0"));
        }
        if self.length.iter().any(|&l| l <= 0.0) {
            return Err(CsError::config("mesh.length 的每个分量必须大于 0"));
        }
        Ok(())
    }
}

/// 体区域的选择方式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "select", rename_all = "snake_case")]
pub enum ZoneSelection {
    /// 显式单元编号
    Cells {
        /// 单元编号
        ids: Vec<usize>,
    },
    /// 单元中心落在包围盒内
    Box {
        /// 包围盒下角
        min: [f64; 3],
        /// 包围盒上角
        max: [f64; 3],
    },
}

/// 体区域
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// 区域名
    pub name: String,
    /// 选择方式
    #[serde(flatten)]
    pub selection: ZoneSelection,
}

// ============================================================================
// 定义
// ============================================================================

/// 内置解析函数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticConfig {
    /// `constant + gradient·x + rate·t`
    Linear {
        /// 常数项
        #[serde(default)]
        constant: f64,
        /// 梯度
        #[serde(default)]
        gradient: [f64; 3],
        /// 时间变化率
        #[serde(default)]
        rate: f64,
    },
    /// `scale · |x - center|²`
    Quadratic {
        /// 中心
        #[serde(default)]
        center: [f64; 3],
        /// 系数
        #[serde(default = "default_one")]
        scale: f64,
    },
    /// `amplitude · exp(-|x - center|² / sigma²)`
    Gaussian {
        /// 中心
        #[serde(default)]
        center: [f64; 3],
        /// 幅值
        #[serde(default = "default_one")]
        amplitude: f64,
        /// 宽度
        sigma: f64,
    },
}

fn default_one() -> f64 {
    1.0
}

/// 把标量函数复制到 `dim` 个分量
fn broadcast<F>(f: F, dim: usize) -> AnalyticFunc
where
    F: Fn(f64, DVec3) -> f64 + Send + Sync + 'static,
{
    if dim == 1 {
        return AnalyticFunc::scalar(f);
    }
    AnalyticFunc::new(move |t, ids, coords, dense, out| {
        let mut write = |r: usize, x: DVec3| {
            let v = f(t, x);
            out[r * dim..(r + 1) * dim].fill(v);
        };
        match ids {
            Some(ids) => {
                for (i, &id) in ids.iter().enumerate() {
                    write(if dense { i } else { id }, coords[id]);
                }
            }
            None => {
                for (i, x) in coords.iter().enumerate() {
                    write(i, *x);
                }
            }
        }
    })
}

impl AnalyticConfig {
    /// 构造 `dim` 分量的解析函数，每个分量取相同的值
    pub fn build(&self, dim: usize) -> CsResult<AnalyticFunc> {
        let func = match *self {
            Self::Linear {
                constant,
                gradient,
                rate,
            } => {
                let g = DVec3::from_array(gradient);
                broadcast(move |t, x| constant + g.dot(x) + rate * t, dim)
            }
            Self::Quadratic { center, scale } => {
                let c = DVec3::from_array(center);
                broadcast(move |_, x| scale * (x - c).length_squared(), dim)
            }
            Self::Gaussian {
                center,
                amplitude,
                sigma,
            } => {
                if sigma <= 0.0 {
                    return Err(CsError::config("gaussian.sigma 必须大于 0"));
                }
                let c = DVec3::from_array(center);
                let inv = 1.0 / (sigma * sigma);
                broadcast(move |_, x| amplitude * (-(x - c).length_squared() * inv).exp(), dim)
            }
        };
        Ok(func)
    }
}

/// 定义的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum InputConfig {
    /// 常值
    Value {
        /// 值（长度为方程维度）
        value: Vec<f64>,
    },
    /// 区域内总量（仅初始条件）
    Qov {
        /// 总量
        quantity: f64,
    },
    /// 解析函数
    Analytic {
        /// 函数
        function: AnalyticConfig,
    },
    /// 数组
    Array {
        /// 数据位置，如 `primal_cell`、`dual_cell`
        location: String,
        /// 数据
        values: Vec<f64>,
    },
}

impl fmt::Display for InputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Value { .. } => "value",
            Self::Qov { .. } => "qov",
            Self::Analytic { .. } => "analytic",
            Self::Array { .. } => "array",
        })
    }
}

/// 解析位置关键字
pub fn parse_location(s: &str) -> CsResult<Flag> {
    match s.to_lowercase().as_str() {
        "primal_vtx" | "vertex" => Ok(flag::PRIMAL_VTX),
        "primal_edge" | "edge" => Ok(flag::PRIMAL_EDGE),
        "primal_face" | "face" => Ok(flag::PRIMAL_FACE),
        "primal_cell" | "cell" => Ok(flag::PRIMAL_CELL),
        "dual_cell" => Ok(flag::DUAL_CELL),
        other => Err(CsError::config(format!("未知的位置 \"{}\"", other))),
    }
}

/// 初始条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialConditionConfig {
    /// 体区域名，空表示全部单元
    #[serde(default)]
    pub zone: String,
    /// 定义
    pub definition: InputConfig,
}

/// 边界条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConditionConfig {
    /// 边界条件类型关键字
    #[serde(rename = "type")]
    pub bc_type: String,
    /// 边界区域名
    pub zone: String,
    /// 定义；齐次条件与滑移条件可省略
    #[serde(default)]
    pub definition: Option<InputConfig>,
}

/// 源项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTermConfig {
    /// 体区域名，空表示全部单元
    #[serde(default)]
    pub zone: String,
    /// 定义
    pub definition: InputConfig,
    /// 求积类型关键字
    #[serde(default)]
    pub quadrature: Option<String>,
    /// 约化位置：`primal_vtx` 或 `dual_cell`
    #[serde(default)]
    pub reduction: Option<String>,
}

/// 物性引用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConfig {
    /// 物性名
    pub name: String,
    /// 张量类型
    #[serde(default)]
    pub kind: PropertyKind,
}

impl PropertyConfig {
    fn handle(&self) -> std::sync::Arc<Property> {
        Property::new(&self.name, self.kind)
    }
}

/// 方程项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermsConfig {
    /// 非定常项
    #[serde(default)]
    pub time: Option<PropertyConfig>,
    /// 扩散项
    #[serde(default)]
    pub diffusion: Option<PropertyConfig>,
    /// 旋度-旋度项
    #[serde(default)]
    pub curlcurl: Option<PropertyConfig>,
    /// 梯度-散度项
    #[serde(default)]
    pub graddiv: Option<PropertyConfig>,
    /// 对流场名
    #[serde(default)]
    pub advection: Option<String>,
    /// 反应项
    #[serde(default)]
    pub reaction: Vec<PropertyConfig>,
}

/// 强制对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementKind {
    /// 顶点自由度
    Vertices,
    /// 整个单元
    Cells,
}

/// 内部自由度强制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementConfig {
    /// 强制对象
    pub by: EnforcementKind,
    /// 元素编号
    pub ids: Vec<usize>,
    /// 参考值（长度为方程维度）
    #[serde(default)]
    pub ref_value: Option<Vec<f64>>,
    /// 逐元素值
    #[serde(default)]
    pub values: Option<Vec<f64>>,
}

/// 关键字取值：字符串、数值或布尔
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValueConfig {
    /// 字符串
    Text(String),
    /// 数值
    Number(f64),
    /// 布尔
    Bool(bool),
}

impl fmt::Display for KeyValueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// 一个关键字设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// 关键字名
    pub key: String,
    /// 取值
    pub value: KeyValueConfig,
}

/// 方程
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquationConfig {
    /// 方程名
    pub name: String,
    /// 方程类别关键字
    #[serde(rename = "type", default = "default_eq_type")]
    pub eq_type: String,
    /// 未知量分量数
    #[serde(default = "default_dim")]
    pub dim: usize,
    /// 默认边界条件关键字
    #[serde(default = "default_bc")]
    pub default_bc: String,
    /// 按顺序设置的关键字
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
    /// 方程项
    #[serde(default)]
    pub terms: TermsConfig,
    /// 初始条件
    #[serde(default)]
    pub initial_conditions: Vec<InitialConditionConfig>,
    /// 边界条件
    #[serde(default)]
    pub boundary_conditions: Vec<BoundaryConditionConfig>,
    /// 源项
    #[serde(default)]
    pub source_terms: Vec<SourceTermConfig>,
    /// 内部自由度强制
    #[serde(default)]
    pub enforcement: Option<EnforcementConfig>,
}

fn default_eq_type() -> String {
    "user".to_string()
}
fn default_dim() -> usize {
    1
}
fn default_bc() -> String {
    "hmg_neumann".to_string()
}

// ============================================================================
// 设置文件
// ============================================================================

/// 设置文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    /// 网格
    #[serde(default)]
    pub mesh: BoxMeshConfig,
    /// 体区域（按顺序注册，编号从 1 开始）
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    /// 源项求值时刻
    #[serde(default)]
    pub time: f64,
    /// 方程
    pub equations: Vec<EquationConfig>,
}

/// 由设置文件构建出的全部对象
#[derive(Debug)]
pub struct CdoSetup {
    /// 网格
    pub mesh: PolyMesh,
    /// 几何量
    pub quant: MeshQuantities,
    /// 区域
    pub zones: ZoneRegistry,
    /// 方程参数（未锁定）
    pub equations: Vec<EquationParam>,
}

impl SetupConfig {
    /// 从 JSON 字符串解析
    pub fn from_json_str(json: &str) -> CsResult<Self> {
        serde_json::from_str(json).map_err(|e| CsError::serialization(e.to_string()))
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> CsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CsError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> CsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CsError::serialization(e.to_string()))
    }

    /// 生成网格
    pub fn build_mesh(&self) -> CsResult<PolyMesh> {
        self.mesh.validate()?;
        Ok(self.mesh.generator().build())
    }

    /// 注册区域：六个外表面作为边界区域，随后按顺序注册体区域
    pub fn build_zones(&self, mesh: &PolyMesh, quant: &MeshQuantities) -> CsResult<ZoneRegistry> {
        let mut zones = ZoneRegistry::new(mesh, quant);
        self.mesh.generator().register_boundary_zones(&mut zones)?;
        for z in &self.zones {
            match &z.selection {
                ZoneSelection::Cells { ids } => zones.add_volume_zone(&z.name, ids.clone())?,
                ZoneSelection::Box { min, max } => zones.add_volume_zone_by_box(
                    &z.name,
                    DVec3::from_array(*min),
                    DVec3::from_array(*max),
                    quant,
                )?,
            };
        }
        Ok(zones)
    }

    /// 构建全部方程参数
    pub fn build_equations(&self, zones: &ZoneRegistry) -> CsResult<Vec<EquationParam>> {
        self.equations.iter().map(|eq| eq.build(zones)).collect()
    }

    /// 构建网格、区域与方程
    pub fn build(&self) -> CsResult<CdoSetup> {
        let mesh = self.build_mesh()?;
        let quant = mesh.compute_quantities();
        let zones = self.build_zones(&mesh, &quant)?;
        let equations = self.build_equations(&zones)?;
        for eqp in &equations {
            check_source_arrays(eqp, &mesh)?;
        }
        log::info!(
            "设置完成: {} 单元, {} 个体区域, {} 个方程",
            mesh.n_cells(),
            zones.volume_zones().len(),
            equations.len()
        );
        Ok(CdoSetup {
            mesh,
            quant,
            zones,
            equations,
        })
    }
}

/// 检查方程中数组型源项的长度与网格是否一致
pub fn check_source_arrays(eqp: &EquationParam, mesh: &PolyMesh) -> CsResult<()> {
    source_term::check_array_sizes(eqp.source_terms(), mesh.n_vertices(), mesh.n_cells())
        .map_err(|e| CsError::config(format!("方程 \"{}\" 的源项: {}", eqp.name(), e)))
}

impl EquationConfig {
    fn parse_kw<T>(&self, what: &str, value: &str, parse: fn(&str) -> Option<T>) -> CsResult<T> {
        parse(&value.to_lowercase())
            .ok_or_else(|| CsError::invalid_key_value(&self.name, "build_equation", what, value))
    }

    /// 构建方程参数
    pub fn build(&self, zones: &ZoneRegistry) -> CsResult<EquationParam> {
        let eq_type = self.parse_kw("type", &self.eq_type, EquationType::from_keyword)?;
        let default_bc = self.parse_kw("default_bc", &self.default_bc, BcType::from_keyword)?;
        if self.dim == 0 {
            return Err(CsError::config(format!("方程 \"{}\" 的维度必须大于 0", self.name)));
        }

        let mut eqp = EquationParam::new(&self.name, eq_type, self.dim, default_bc);

        for kv in &self.keys {
            eqp.set_param_str(&kv.key, &kv.value.to_string())?;
        }

        self.add_terms(&mut eqp)?;

        for ic in &self.initial_conditions {
            match &ic.definition {
                InputConfig::Value { value } => eqp.add_ic_by_value(zones, &ic.zone, value)?,
                InputConfig::Qov { quantity } => eqp.add_ic_by_qov(zones, &ic.zone, *quantity)?,
                InputConfig::Analytic { function } => {
                    eqp.add_ic_by_analytic(zones, &ic.zone, function.build(self.dim)?)?
                }
                other => return Err(self.unsupported_input("initial_conditions", other)),
            };
        }

        for bc in &self.boundary_conditions {
            let bc_type = self.parse_kw("boundary_conditions.type", &bc.bc_type, BcType::from_keyword)?;
            match (&bc.definition, bc_type) {
                (_, BcType::Sliding) => eqp.add_sliding_condition(zones, &bc.zone)?,
                (None, BcType::HmgDirichlet | BcType::HmgNeumann) => {
                    let zeros = vec![0.0; self.bc_dim(bc_type)];
                    eqp.add_bc_by_value(bc_type, zones, &bc.zone, &zeros)?
                }
                (None, _) => {
                    return Err(CsError::missing_value(
                        &self.name,
                        "build_equation",
                        format!("边界条件 \"{}\" 的定义", bc.bc_type),
                    ))
                }
                (Some(InputConfig::Value { value }), _) => eqp.add_bc_by_value(bc_type, zones, &bc.zone, value)?,
                (Some(InputConfig::Array { location, values }), _) => {
                    eqp.add_bc_by_array(bc_type, zones, &bc.zone, parse_location(location)?, values.clone())?
                }
                (Some(InputConfig::Analytic { function }), _) => {
                    eqp.add_bc_by_analytic(bc_type, zones, &bc.zone, function.build(self.bc_dim(bc_type))?)?
                }
                (Some(other), _) => return Err(self.unsupported_input("boundary_conditions", other)),
            };
        }

        for st in &self.source_terms {
            let st_id = match &st.definition {
                InputConfig::Value { value } => eqp.add_source_term_by_val(zones, &st.zone, value)?,
                InputConfig::Analytic { function } => {
                    eqp.add_source_term_by_analytic(zones, &st.zone, function.build(self.dim)?)?
                }
                InputConfig::Array { location, values } => {
                    eqp.add_source_term_by_array(zones, &st.zone, parse_location(location)?, values.clone())?
                }
                other => return Err(self.unsupported_input("source_terms", other)),
            };
            if let Some(q) = &st.quadrature {
                let qtype = self.parse_kw("source_terms.quadrature", q, QuadratureType::from_keyword)?;
                eqp.set_source_term_quadrature(st_id, qtype)?;
            }
            if let Some(r) = &st.reduction {
                eqp.set_source_term_reduction(st_id, parse_location(r)?)?;
            }
        }

        if let Some(enf) = &self.enforcement {
            let ref_value = enf.ref_value.as_deref();
            let values = enf.values.as_deref();
            match enf.by {
                EnforcementKind::Vertices => eqp.enforce_vertex_dofs(&enf.ids, ref_value, values)?,
                EnforcementKind::Cells => eqp.enforce_by_cell_selection(&enf.ids, ref_value, values)?,
            }
        }

        log::debug!(
            "方程 \"{}\": {} 个初始条件, {} 个边界条件, {} 个源项",
            self.name,
            eqp.ic_defs().len(),
            eqp.bc().defs.len(),
            eqp.source_terms().len()
        );
        Ok(eqp)
    }

    fn add_terms(&self, eqp: &mut EquationParam) -> CsResult<()> {
        let terms = &self.terms;
        if let Some(p) = &terms.time {
            eqp.add_time(p.handle())?;
        }
        if let Some(p) = &terms.diffusion {
            eqp.add_diffusion(p.handle())?;
        }
        if let Some(p) = &terms.curlcurl {
            eqp.add_curlcurl(p.handle())?;
        }
        if let Some(p) = &terms.graddiv {
            eqp.add_graddiv(p.handle())?;
        }
        if let Some(name) = &terms.advection {
            eqp.add_advection(AdvectionField::new(name))?;
        }
        for p in &terms.reaction {
            eqp.add_reaction(p.handle())?;
        }
        Ok(())
    }

    /// 解析函数边界条件的分量数
    fn bc_dim(&self, bc_type: BcType) -> usize {
        match bc_type {
            BcType::Neumann | BcType::HmgNeumann => 3 * self.dim,
            BcType::Robin => 3,
            BcType::Circulation => 1,
            _ => self.dim,
        }
    }

    fn unsupported_input(&self, section: &str, input: &InputConfig) -> CsError {
        CsError::config(format!(
            "方程 \"{}\": {} 不支持 \"{}\" 定义",
            self.name, section, input
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation_param::EnforcementTarget;
    use crate::param::SpaceScheme;
    use crate::sles_param::IterativeSolver;
    use crate::xdef::XDefKind;

    const FULL: &str = r#"{
        "mesh": { "n": [2, 2, 2], "length": [1.0, 1.0, 1.0] },
        "zones": [
            { "name": "left", "select": "box", "min": [0.0, 0.0, 0.0], "max": [0.5, 1.0, 1.0] },
            { "name": "first", "select": "cells", "ids": [0] }
        ],
        "equations": [{
            "name": "Temperature",
            "type": "thermal",
            "keys": [
                { "key": "space_scheme", "value": "CDO_VB" },
                { "key": "itsol", "value": "cg" },
                { "key": "itsol_max_iter", "value": 500 }
            ],
            "terms": {
                "diffusion": { "name": "conductivity", "kind": "iso" },
                "time": { "name": "rho_cp" }
            },
            "initial_conditions": [
                { "definition": { "by": "value", "value": [20.0] } }
            ],
            "boundary_conditions": [
                { "type": "dirichlet", "zone": "xmin", "definition": { "by": "value", "value": [1.0] } },
                { "type": "hmg_dirichlet", "zone": "xmax" }
            ],
            "source_terms": [
                { "zone": "left", "definition": { "by": "analytic",
                    "function": { "kind": "linear", "constant": 1.0, "gradient": [1.0, 0.0, 0.0] } },
                  "quadrature": "higher" },
                { "definition": { "by": "value", "value": [2.0] }, "reduction": "primal_vtx" }
            ],
            "enforcement": { "by": "vertices", "ids": [0, 1], "ref_value": [0.0] }
        }]
    }"#;

    #[test]
    fn test_full_setup() {
        let setup = SetupConfig::from_json_str(FULL).unwrap().build().unwrap();
        assert_eq!(setup.mesh.n_cells(), 8);
        assert_eq!(setup.zones.volume_zone_id("left").unwrap(), 1);
        assert_eq!(setup.zones.volume_zone(1).unwrap().elt_ids.len(), 4);

        let eq = &setup.equations[0];
        assert_eq!(eq.space_scheme(), SpaceScheme::CdoVb);
        assert_eq!(eq.sles().solver, IterativeSolver::Cg);
        assert_eq!(eq.sles().n_max_iter, 500);
        assert!(eq.is_unsteady());
        assert_eq!(eq.ic_defs().len(), 1);
        assert_eq!(eq.bc().defs.len(), 2);

        let st = eq.source_terms();
        assert_eq!(st.len(), 2);
        assert_eq!(st[0].kind(), XDefKind::Analytic);
        assert_eq!(st[0].qtype, QuadratureType::Higher);
        assert!(!st[0].is_full_location());
        assert!(st[1].meta.contains(flag::PRIMAL | flag::VERTEX));

        let enf = eq.enforcement().unwrap();
        assert_eq!(enf.target, EnforcementTarget::VertexDofs);
    }

    #[test]
    fn test_invalid_keyword() {
        let json = r#"{ "equations": [{ "name": "E", "keys": [{ "key": "adv_scheme", "value": "nope" }] }] }"#;
        let cfg = SetupConfig::from_json_str(json).unwrap();
        assert!(matches!(cfg.build(), Err(CsError::InvalidKeyValue { .. })));

        let json = r#"{ "equations": [{ "name": "E", "keys": [{ "key": "no_such_key", "value": 1 }] }] }"#;
        let cfg = SetupConfig::from_json_str(json).unwrap();
        assert!(matches!(cfg.build(), Err(CsError::UnknownKey { .. })));
    }

    #[test]
    fn test_unknown_zone() {
        let json = r#"{ "equations": [{ "name": "E",
            "source_terms": [{ "zone": "nowhere", "definition": { "by": "value", "value": [1.0] } }] }] }"#;
        let cfg = SetupConfig::from_json_str(json).unwrap();
        assert!(matches!(cfg.build(), Err(CsError::UnknownZone { .. })));
    }

    #[test]
    fn test_qov_source_rejected() {
        let json = r#"{ "equations": [{ "name": "E",
            "source_terms": [{ "definition": { "by": "qov", "quantity": 1.0 } }] }] }"#;
        let cfg = SetupConfig::from_json_str(json).unwrap();
        assert!(matches!(cfg.build(), Err(CsError::Config { .. })));
    }

    #[test]
    fn test_source_array_length_checked() {
        let short_cells = r#"{ "mesh": { "n": [2, 2, 2] }, "equations": [{ "name": "T",
            "source_terms": [{ "definition": { "by": "array", "location": "cell", "values": [1.0] } }] }] }"#;
        let err = SetupConfig::from_json_str(short_cells).unwrap().build().unwrap_err();
        assert!(matches!(&err, CsError::Config { message } if message.contains("\"T\"")));

        let short_vertices = r#"{ "mesh": { "n": [2, 2, 2] }, "equations": [{ "name": "T",
            "source_terms": [{ "definition": { "by": "array", "location": "vertex",
                "values": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0] } }] }] }"#;
        assert!(SetupConfig::from_json_str(short_vertices).unwrap().build().is_err());

        let cells = r#"{ "mesh": { "n": [2, 2, 2] }, "equations": [{ "name": "T",
            "source_terms": [{ "definition": { "by": "array", "location": "cell",
                "values": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0] } }] }] }"#;
        let setup = SetupConfig::from_json_str(cells).unwrap().build().unwrap();
        assert!(check_source_arrays(&setup.equations[0], &setup.mesh).is_ok());
    }

    #[test]
    fn test_analytic_broadcast() {
        let f = AnalyticConfig::Quadratic {
            center: [0.0; 3],
            scale: 2.0,
        }
        .build(3)
        .unwrap();
        let mut out = [0.0; 3];
        f.eval_at(0.0, DVec3::new(1.0, 1.0, 0.0), &mut out);
        assert_eq!(out, [4.0; 3]);

        let bad = AnalyticConfig::Gaussian {
            center: [0.0; 3],
            amplitude: 1.0,
            sigma: 0.0,
        };
        assert!(bad.build(1).is_err());
    }

    #[test]
    fn test_bad_mesh_and_file() {
        let json = r#"{ "mesh": { "n": [0, 1, 1] }, "equations": [] }"#;
        assert!(SetupConfig::from_json_str(json).unwrap().build_mesh().is_err());
        assert!(matches!(
            SetupConfig::from_file("/nonexistent/setup.json"),
            Err(CsError::FileNotFound { .. })
        ));
        assert!(SetupConfig::from_json_str("{").is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_key_order() {
        let cfg = SetupConfig::from_json_str(FULL).unwrap();
        let again = SetupConfig::from_json_str(&cfg.to_json().unwrap()).unwrap();
        let keys: Vec<_> = again.equations[0].keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, ["space_scheme", "itsol", "itsol_max_iter"]);
    }
}
