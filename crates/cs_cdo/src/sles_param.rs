// crates/cs_cdo/src/sles_param.rs

//! 线性求解器参数
//!
//! `SlesParam` 描述一个方程的线性系统如何求解：求解器族、预条件子、
//! Krylov 方法、代数多重网格类型、迭代上限、收敛阈值和残差归一化方式。

use crate::param::keyword_enum;
use serde::{Deserialize, Serialize};

keyword_enum! {
    /// 求解器族
    pub enum SolverClass {
        /// 内置求解器
        Cs => ["cs"], "native",
        /// PETSc
        Petsc => ["petsc"], "PETSc",
        /// HYPRE（经由 PETSc）
        Hypre => ["hypre"], "HYPRE",
    }
}

keyword_enum! {
    /// 预条件子
    pub enum Preconditioner {
        /// 无
        None => ["none"], "None",
        /// 对角（Jacobi）
        Diag => ["jacobi"], "Diagonal",
        /// 块 Jacobi + ILU(0)
        BJacobIlu0 => ["block_jacobi", "block_jacobi_ilu0", "jacobi_block"], "Block Jacobi with ILU(0)",
        /// 块 Jacobi + 对称 Gauss-Seidel
        BJacobSgs => ["block_jacobi_sgs", "block_jacobi_ssor"], "Block Jacobi with symmetric Gauss-Seidel",
        /// 一阶 Neumann 多项式
        Poly1 => ["poly1"], "Neumann polynomial (degree 1)",
        /// 二阶 Neumann 多项式
        Poly2 => ["poly2"], "Neumann polynomial (degree 2)",
        /// SSOR
        Ssor => ["ssor"], "SSOR",
        /// 不完全 LU
        Ilu0 => ["ilu0"], "ILU(0)",
        /// 不完全 Cholesky
        Icc0 => ["icc0"], "ICC(0)",
        /// 代数多重网格
        Amg => ["amg"], "Algebraic multigrid",
        /// 按块代数多重网格
        AmgBlock => ["amg_block", "block_amg"], "Algebraic multigrid by block",
        /// 加性 Schwarz
        As => ["as"], "Additive Schwarz",
    }
}

keyword_enum! {
    /// 迭代求解器
    pub enum IterativeSolver {
        /// 代数多重网格作为求解器
        Amg => ["amg"], "Algebraic multigrid",
        /// BiCGStab
        Bicg => ["bicg"], "BiCGstab",
        /// BiCGStab2
        Bicgstab2 => ["bicgstab2"], "BiCGstab2",
        /// 共轭梯度
        Cg => ["cg"], "CG",
        /// 三项递推共轭残差
        Cr3 => ["cr3"], "3-layer conjugate residual",
        /// 柔性共轭梯度
        Fcg => ["fcg"], "Flexible CG",
        /// Gauss-Seidel
        GaussSeidel => ["gauss_seidel", "gs"], "Gauss-Seidel",
        /// 对称 Gauss-Seidel
        SymGaussSeidel => ["sym_gauss_seidel", "sgs"], "Symmetric Gauss-Seidel",
        /// GMRES
        Gmres => ["gmres"], "GMRES",
        /// 柔性 GMRES
        Fgmres => ["fgmres"], "Flexible GMRES",
        /// Jacobi
        Jacobi => ["jacobi"], "Jacobi",
        /// MINRES
        Minres => ["minres"], "MinRes",
        /// MUMPS 直接求解（LU）
        Mumps => ["mumps"], "MUMPS (LU factorization)",
        /// MUMPS 直接求解（LDLt）
        MumpsLdlt => ["mumps_ldlt"], "MUMPS (LDLt factorization)",
        /// 不求解
        None => ["none"], "None",
        /// Golub-Kahan 双对角化 + CG
        GkbCg => ["gkb_cg"], "GKB with CG",
        /// Golub-Kahan 双对角化 + GMRES
        GkbGmres => ["gkb_gmres"], "GKB with GMRES",
    }
}

keyword_enum! {
    /// 代数多重网格类型
    pub enum AmgType {
        /// 不使用
        None => ["none", ""], "None",
        /// 内置 V 循环
        HouseV => ["v_cycle"], "Native V-cycle",
        /// 内置 K 循环
        HouseK => ["k_cycle"], "Native K-cycle",
        /// HYPRE BoomerAMG
        HypreBoomer => ["boomer"], "Boomer (HYPRE)",
        /// PETSc GAMG
        PetscGamg => ["gamg"], "GAMG (PETSc)",
        /// PETSc PCMG
        PetscPcmg => ["pcmg"], "PCMG (PETSc)",
    }
}

impl AmgType {
    /// 该 AMG 所属的求解器族
    pub fn solver_class(&self) -> Option<SolverClass> {
        match self {
            Self::None => None,
            Self::HouseV | Self::HouseK => Some(SolverClass::Cs),
            Self::HypreBoomer => Some(SolverClass::Hypre),
            Self::PetscGamg | Self::PetscPcmg => Some(SolverClass::Petsc),
        }
    }
}

keyword_enum! {
    /// 残差归一化方式
    pub enum ResNormType {
        /// 不归一化（相对初始残差）
        None => ["none", "false"], "None",
        /// 右端项 2-范数
        NormRhs => ["rhs"], "Euclidean norm of the RHS",
        /// 加权右端项范数
        WeightedRhs => ["weighted_rhs", "weighted"], "Weighted Euclidean norm of the RHS",
        /// 过滤后的右端项范数
        FilteredRhs => ["filtered_rhs", "filtered"], "Filtered Euclidean norm of the RHS",
    }
}

/// 线性求解器参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlesParam {
    /// 输出详细程度
    pub verbosity: i32,
    /// 关联场编号（-1 表示尚未关联）
    pub field_id: i32,
    /// 求解器族
    pub solver_class: SolverClass,
    /// 预条件子
    pub precond: Preconditioner,
    /// 迭代求解器
    pub solver: IterativeSolver,
    /// AMG 类型
    pub amg_type: AmgType,
    /// 最大迭代次数
    pub n_max_iter: usize,
    /// 收敛阈值
    pub eps: f64,
    /// 残差归一化方式
    pub resnorm_type: ResNormType,
    /// 是否已完成求解器配置
    #[serde(skip)]
    pub setup_done: bool,
}

impl Default for SlesParam {
    fn default() -> Self {
        Self {
            verbosity: 0,
            field_id: -1,
            solver_class: SolverClass::Cs,
            precond: Preconditioner::Diag,
            solver: IterativeSolver::Gmres,
            amg_type: AmgType::None,
            n_max_iter: 10000,
            eps: 1e-8,
            resnorm_type: ResNormType::None,
            setup_done: false,
        }
    }
}
