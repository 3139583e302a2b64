// crates/cs_cdo/src/xdef.rs

//! 扩展定义（xdef）
//!
//! 一个量在某个区域上如何给定：常值、单元内总量、解析函数、数组或自由度
//! 函数。定义还携带区域编号、求积类型以及状态/元信息位。
//!
//! 克隆是深拷贝：数组与常值各自拥有数据，函数对象通过 `Arc` 共享。

use cs_foundation::flag::{self, state};
use cs_foundation::{CsError, CsResult, Flag};
use cs_mesh::QuadratureType;
use glam::DVec3;
use std::fmt;
use std::sync::Arc;

/// 解析函数
///
/// 参数依次为：时间、可选的点编号子集、坐标、是否紧凑输出、输出缓冲。
/// 若给出编号，第 `i` 个点为 `coords[ids[i]]`；紧凑输出写入 `out[i*dim..]`，
/// 否则写入 `out[ids[i]*dim..]`。
pub type AnalyticFn = dyn Fn(f64, Option<&[usize]>, &[DVec3], bool, &mut [f64]) + Send + Sync;

/// 自由度函数
///
/// 参数依次为：元素编号、是否紧凑输出、输出缓冲。
pub type DofFn = dyn Fn(&[usize], bool, &mut [f64]) + Send + Sync;

/// 共享的解析函数
#[derive(Clone)]
pub struct AnalyticFunc(Arc<AnalyticFn>);

impl AnalyticFunc {
    /// 包装完整签名的函数
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64, Option<&[usize]>, &[DVec3], bool, &mut [f64]) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// 由逐点标量函数 `f(t, x)` 构造
    pub fn scalar<F>(f: F) -> Self
    where
        F: Fn(f64, DVec3) -> f64 + Send + Sync + 'static,
    {
        Self::new(move |t, ids, coords, dense, out| match ids {
            Some(ids) => {
                for (i, &id) in ids.iter().enumerate() {
                    let r = if dense { i } else { id };
                    out[r] = f(t, coords[id]);
                }
            }
            None => {
                for (i, x) in coords.iter().enumerate() {
                    out[i] = f(t, *x);
                }
            }
        })
    }

    /// 由逐点矢量函数 `f(t, x)` 构造
    pub fn vector<F>(f: F) -> Self
    where
        F: Fn(f64, DVec3) -> DVec3 + Send + Sync + 'static,
    {
        Self::new(move |t, ids, coords, dense, out| {
            let mut write = |r: usize, x: DVec3| {
                let v = f(t, x);
                out[3 * r..3 * r + 3].copy_from_slice(&v.to_array());
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

    /// 在一组点上求值（紧凑输出）
    #[inline]
    pub fn eval(&self, time: f64, coords: &[DVec3], out: &mut [f64]) {
        (self.0)(time, None, coords, true, out)
    }

    /// 在单点上求值
    #[inline]
    pub fn eval_at(&self, time: f64, x: DVec3, out: &mut [f64]) {
        (self.0)(time, None, std::slice::from_ref(&x), true, out)
    }

    /// 完整签名调用
    #[inline]
    pub fn call(&self, time: f64, ids: Option<&[usize]>, coords: &[DVec3], dense: bool, out: &mut [f64]) {
        (self.0)(time, ids, coords, dense, out)
    }
}

impl fmt::Debug for AnalyticFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnalyticFunc(..)")
    }
}

/// 共享的自由度函数
#[derive(Clone)]
pub struct DofFunc(Arc<DofFn>);

impl DofFunc {
    /// 包装函数
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[usize], bool, &mut [f64]) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// 调用
    #[inline]
    pub fn call(&self, ids: &[usize], dense: bool, out: &mut [f64]) {
        (self.0)(ids, dense, out)
    }
}

impl fmt::Debug for DofFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DofFunc(..)")
    }
}

/// 定义的支撑集
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XDefSupport {
    /// 体区域
    Volume,
    /// 边界区域
    Boundary,
}

/// 定义类型（不含数据）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XDefKind {
    /// 常值
    Value,
    /// 单元内总量
    Qov,
    /// 解析函数
    Analytic,
    /// 数组
    Array,
    /// 自由度函数
    DofFunc,
}

impl fmt::Display for XDefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Value => "value",
            Self::Qov => "quantity over a volume",
            Self::Analytic => "analytic function",
            Self::Array => "array",
            Self::DofFunc => "DoF function",
        };
        f.write_str(s)
    }
}

/// 定义的输入数据
#[derive(Debug, Clone)]
pub enum XDefInput {
    /// 常值（长度为 dim）
    Value(Vec<f64>),
    /// 单元内总量
    Qov(f64),
    /// 解析函数
    Analytic(AnalyticFunc),
    /// 数组
    Array {
        /// 每个元素的分量数
        stride: usize,
        /// 数组位置
        loc: Flag,
        /// 数据
        values: Vec<f64>,
    },
    /// 自由度函数
    DofFunc {
        /// 输出位置
        loc: Flag,
        /// 函数
        func: DofFunc,
    },
}

/// 扩展定义
#[derive(Debug, Clone)]
pub struct XDef {
    /// 支撑集
    pub support: XDefSupport,
    /// 定义的分量数
    pub dim: usize,
    /// 区域编号
    pub z_id: usize,
    /// 状态位
    pub state: Flag,
    /// 元信息位
    pub meta: Flag,
    /// 求积类型
    pub qtype: QuadratureType,
    /// 数据
    pub input: XDefInput,
}

impl XDef {
    /// 创建体定义，维度信息写入元信息位
    pub fn volume(dim: usize, z_id: usize, state: Flag, meta: Flag, input: XDefInput) -> Self {
        Self {
            support: XDefSupport::Volume,
            dim,
            z_id,
            state,
            meta: meta | dim_flag(dim),
            qtype: QuadratureType::Bary,
            input,
        }
    }

    /// 创建边界定义
    pub fn boundary(dim: usize, z_id: usize, state: Flag, meta: Flag, input: XDefInput) -> Self {
        Self {
            support: XDefSupport::Boundary,
            dim,
            z_id,
            state,
            meta,
            qtype: QuadratureType::Bary,
            input,
        }
    }

    /// 常值定义的状态位
    pub fn value_state() -> Flag {
        state::UNIFORM | state::STEADY
    }

    /// 检查常值长度
    pub fn check_value(func: &str, dim: usize, values: &[f64]) -> CsResult<()> {
        if values.len() != dim {
            return Err(CsError::invalid_definition(
                func,
                format!("常值长度 {} 与维度 {} 不一致", values.len(), dim),
            ));
        }
        Ok(())
    }

    /// 定义类型
    pub fn kind(&self) -> XDefKind {
        match &self.input {
            XDefInput::Value(_) => XDefKind::Value,
            XDefInput::Qov(_) => XDefKind::Qov,
            XDefInput::Analytic(_) => XDefKind::Analytic,
            XDefInput::Array { .. } => XDefKind::Array,
            XDefInput::DofFunc { .. } => XDefKind::DofFunc,
        }
    }

    /// 设置求积类型
    #[inline]
    pub fn set_quadrature(&mut self, qtype: QuadratureType) {
        self.qtype = qtype;
    }

    /// 是否覆盖整个计算域
    #[inline]
    pub fn is_full_location(&self) -> bool {
        self.meta.contains(flag::FULL_LOC)
    }

    /// 常值数据（若为常值定义）
    pub fn values(&self) -> Option<&[f64]> {
        match &self.input {
            XDefInput::Value(v) => Some(v),
            _ => None,
        }
    }

    /// 解析函数（若为解析定义）
    pub fn analytic(&self) -> Option<&AnalyticFunc> {
        match &self.input {
            XDefInput::Analytic(f) => Some(f),
            _ => None,
        }
    }

    /// 单行描述，用于设置摘要
    pub fn describe(&self) -> String {
        let data = match &self.input {
            XDefInput::Value(v) => format!("value {:?}", v),
            XDefInput::Qov(q) => format!("quantity {:e}", q),
            XDefInput::Analytic(_) => format!("analytic function (quadrature: {})", self.qtype),
            XDefInput::Array { stride, loc, values } => {
                format!("array of {} values (stride {}, location {})", values.len(), stride, loc)
            }
            XDefInput::DofFunc { loc, .. } => {
                format!("DoF function (location {}, quadrature: {})", loc, self.qtype)
            }
        };
        format!("dim {} | z_id {} | {}", self.dim, self.z_id, data)
    }
}

/// 维度对应的元信息位
pub fn dim_flag(dim: usize) -> Flag {
    match dim {
        1 => flag::SCALAR,
        3 => flag::VECTOR,
        9 => flag::TENSOR,
        _ => Flag::EMPTY,
    }
}
