// crates/cs_cdo/src/lib.rs

//! CDO 方程设置层
//!
//! 管理一个 CDO/HHO 方程的全部数值参数：空间与时间离散、边界与初始条件、
//! 方程项、源项、内部自由度强制以及线性求解器。源项在设置阶段按格式和
//! 定义类型选出逐单元核函数，组装阶段并行求值。
//!
//! # 模块概览
//!
//! - [`param`]: 离散格式、边界条件等关键字枚举
//! - [`sles_param`]: 线性求解器参数
//! - [`xdef`]: 扩展定义（常值、解析函数、数组、自由度函数）
//! - [`property`]: 物性与对流场句柄
//! - [`equation_param`]: 方程参数的创建、关键字设置、锁定与摘要
//! - [`source_term`]: 源项核函数的分派、逐单元求值与全局组装
//! - [`hodge`]: 源项使用的局部 Hodge 算子
//! - [`linalg`]: 内置的 CSR 矩阵、预条件器与迭代求解器
//! - [`sles`]: 按求解器族生成求解器配置方案
//! - [`config`]: JSON 设置文件
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::equation_param::EquationParam;
//! use cs_cdo::param::{BcType, EquationType, SpaceScheme};
//! use cs_cdo::source_term::SourceTermSetup;
//! use cs_mesh::{BoxMeshGenerator, ZoneRegistry};
//!
//! let mesh = BoxMeshGenerator::cube(2, 1.0).build();
//! let quant = mesh.compute_quantities();
//! let zones = ZoneRegistry::new(&mesh, &quant);
//!
//! let mut eqp = EquationParam::new("Scalar", EquationType::User, 1, BcType::HmgDirichlet);
//! eqp.set_param_str("space_scheme", "cdo_vb").unwrap();
//! eqp.add_source_term_by_val(&zones, "", &[2.0]).unwrap();
//! eqp.last_stage().unwrap();
//!
//! let st = SourceTermSetup::init(SpaceScheme::CdoVb, eqp.source_terms(), &zones).unwrap();
//! let rhs = st.assemble(eqp.source_terms(), &mesh, &quant, 0.0).unwrap();
//! let total: f64 = rhs.iter().sum();
//! assert!((total - 2.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod equation_param;
pub mod hodge;
pub mod linalg;
pub mod param;
pub mod property;
pub mod sles;
pub mod sles_param;
pub mod source_term;
pub mod xdef;

pub use equation_param::EquationParam;
pub use property::{AdvectionField, Property, PropertyKind};
pub use sles::{setup_sles, SlesBackends, SlesPlan, SlesSetup};
pub use source_term::SourceTermSetup;
pub use xdef::{AnalyticFunc, DofFunc, XDef};
