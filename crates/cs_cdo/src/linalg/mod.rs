// crates/cs_cdo/src/linalg/mod.rs

//! 内置线性代数
//!
//! 内置求解器族的运行时部分：CSR 稀疏矩阵、向量运算、预条件器与迭代求解器。
//!
//! # 模块概览
//!
//! - [`csr`]: CSR 矩阵与构建器
//! - [`vector_ops`]: BLAS Level 1 风格向量运算
//! - [`precond`]: 恒等、Jacobi、Neumann 多项式预条件器
//! - [`krylov`]: PCG、BiCGStab、GMRES 与定常迭代

pub mod csr;
pub mod krylov;
pub mod precond;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, CsrPattern};
pub use krylov::{
    convergence_threshold, BiCgStabSolver, GmresSolver, LinearSolver, PcgSolver, SolverConfig, SolverResult,
    SolverStatus, StationaryKind, StationarySolver,
};
pub use precond::{IdentityPreconditioner, JacobiPreconditioner, PolynomialPreconditioner, Preconditioner};
