// apps/cs_cli/src/commands/mod.rs

//! 子命令

pub mod info;
pub mod run;
pub mod validate;

use clap::Args;
use cs_cdo::sles::SlesBackends;

/// 可用的外部求解器库
#[derive(Args, Debug, Clone, Copy)]
pub struct BackendArgs {
    /// PETSc 可用
    #[arg(long)]
    pub petsc: bool,

    /// PETSc 内的 HYPRE 可用（隐含 --petsc）
    #[arg(long)]
    pub hypre: bool,

    /// PETSc 内的 MUMPS 可用（隐含 --petsc）
    #[arg(long)]
    pub mumps: bool,
}

impl BackendArgs {
    /// 转为求解器配置使用的可用库集合
    pub fn backends(&self) -> SlesBackends {
        SlesBackends {
            petsc: self.petsc || self.hypre || self.mumps,
            hypre: self.hypre,
            mumps: self.mumps,
        }
    }
}
