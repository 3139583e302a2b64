// crates/cs_mesh/src/lib.rs

//! CDO 网格层
//!
//! 为源项求积与方程设置提供最小的多面体网格支持。
//!
//! # 模块概览
//!
//! - [`polyhedral`]: 多面体网格与几何量（面心、体积、边、对偶体积）
//! - [`generation`]: 长方体六面体网格生成器
//! - [`zone`]: 体区域与边界区域注册表
//! - [`cell_mesh`]: 单元局部视图 `CellMesh`，供逐单元核函数使用
//! - [`quadrature`]: 求积类型与四面体求积公式
//!
//! # 使用示例
//!
//! ```
//! use cs_mesh::generation::BoxMeshGenerator;
//!
//! let mesh = BoxMeshGenerator::cube(2, 1.0).build();
//! let quant = mesh.compute_quantities();
//! let total: f64 = quant.cell_volumes.iter().sum();
//! assert!((total - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell_mesh;
pub mod generation;
pub mod polyhedral;
pub mod quadrature;
pub mod zone;

pub use cell_mesh::{CellMesh, CellMeshFlag};
pub use generation::BoxMeshGenerator;
pub use polyhedral::{MeshQuantities, PolyMesh};
pub use quadrature::QuadratureType;
pub use zone::{Zone, ZoneRegistry};
