// apps/cs_cli/src/commands/run.rs

//! 运行命令
//!
//! 锁定全部方程，组装源项向量并配置线性求解器。使用 `--solve` 时，对顶点型
//! 标量方程再用内置求解器求解集中质量系统 `M·x = b`，得到顶点上的源项密度。

use super::BackendArgs;
use anyhow::{Context, Result};
use clap::Args;
use cs_cdo::config::SetupConfig;
use cs_cdo::linalg::CsrMatrix;
use cs_cdo::param::SpaceScheme;
use cs_cdo::sles::{setup_sles, NativeSolver, SlesPlan, SlesSetup};
use cs_cdo::source_term::SourceTermSetup;
use cs_foundation::CsError;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 设置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 源项求值时刻（覆盖设置文件）
    #[arg(short = 't', long)]
    pub time: Option<f64>,

    /// 求解顶点型方程的集中质量系统
    #[arg(long)]
    pub solve: bool,

    /// 把每个方程的设置摘要写入日志
    #[arg(long)]
    pub summary: bool,

    /// 结果输出文件（JSON）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub backends: BackendArgs,
}

/// 单个方程的运行结果
#[derive(Debug, Serialize)]
struct EquationReport {
    name: String,
    space_scheme: String,
    n_source_terms: usize,
    source_integral: Vec<f64>,
    sles: Option<SlesSetup>,
    solve: Option<SolveReport>,
}

#[derive(Debug, Serialize)]
struct SolveReport {
    iterations: usize,
    residual_norm: f64,
    converged: bool,
    min: f64,
    max: f64,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== CDO 设置运行 ===");
    let start = Instant::now();

    let config = SetupConfig::from_file(&args.config).context("无法读取设置文件")?;
    let time = args.time.unwrap_or(config.time);
    let mut setup = config.build().context("构建方程参数失败")?;
    info!(
        "网格: {} 顶点, {} 单元; 求值时刻 t = {}",
        setup.mesh.n_vertices(),
        setup.mesh.n_cells(),
        time
    );

    let backends = args.backends.backends();
    let mut reports = Vec::with_capacity(setup.equations.len());

    for eqp in &mut setup.equations {
        eqp.last_stage()?;
        if args.summary {
            eqp.log_summary();
        }
        let dim = eqp.dim();
        let scheme = eqp.space_scheme();

        let rhs = if eqp.source_terms().is_empty() {
            Vec::new()
        } else {
            let st = SourceTermSetup::init(scheme, eqp.source_terms(), &setup.zones)
                .with_context(|| format!("方程 \"{}\" 的源项", eqp.name()))?;
            st.assemble(eqp.source_terms(), &setup.mesh, &setup.quant, time)
                .with_context(|| format!("方程 \"{}\" 的源项组装", eqp.name()))?
        };

        // Fb/HHO 的全局向量按单元交错存放分量，其余格式为标量
        let stride = match scheme {
            SpaceScheme::CdoVb | SpaceScheme::CdoVcb => 1,
            _ => dim,
        };
        let mut integral = vec![0.0; stride];
        for (i, v) in rhs.iter().enumerate() {
            integral[i % stride] += v;
        }
        info!("方程 \"{}\": 源项积分 {:?}", eqp.name(), integral);

        let sles = setup_sles(eqp, &backends).with_context(|| format!("方程 \"{}\" 的求解器", eqp.name()))?;

        let solve = match (&sles, args.solve) {
            (Some(SlesSetup { plan: SlesPlan::Native(plan), .. }), true)
                if scheme == SpaceScheme::CdoVb && !rhs.is_empty() =>
            {
                match NativeSolver::from_plan(plan.clone()) {
                    Ok(mut solver) => {
                        let mass = CsrMatrix::diagonal(&setup.quant.dual_volumes);
                        let mut x = vec![0.0; rhs.len()];
                        let result = solver.solve(&mass, &rhs, &mut x)?;
                        if !result.is_converged() {
                            warn!("方程 \"{}\": 求解未收敛 ({:?})", eqp.name(), result.status);
                        }
                        Some(SolveReport {
                            iterations: result.iterations,
                            residual_norm: result.residual_norm,
                            converged: result.is_converged(),
                            min: x.iter().copied().fold(f64::INFINITY, f64::min),
                            max: x.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                        })
                    }
                    Err(e @ CsError::Unsupported { .. }) => {
                        warn!("方程 \"{}\": {}，跳过求解", eqp.name(), e);
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            (_, true) => {
                warn!("方程 \"{}\": 仅支持内置求解器下的顶点型方程求解，跳过", eqp.name());
                None
            }
            _ => None,
        };

        reports.push(EquationReport {
            name: eqp.name().to_string(),
            space_scheme: scheme.to_string(),
            n_source_terms: eqp.source_terms().len(),
            source_integral: integral,
            sles,
            solve,
        });
    }

    for r in &reports {
        println!("方程 \"{}\" ({})", r.name, r.space_scheme);
        println!("  源项: {} 个, 积分 {:?}", r.n_source_terms, r.source_integral);
        if let Some(s) = &r.sles {
            println!("  求解器: {}", s);
        }
        if let Some(s) = &r.solve {
            println!(
                "  求解: {} 次迭代, 残差 {:e}, 密度范围 [{:.6}, {:.6}]",
                s.iterations, s.residual_norm, s.min, s.max
            );
        }
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(path, json).with_context(|| format!("无法写入 {}", path.display()))?;
        info!("结果已写入 {}", path.display());
    }

    info!("完成，耗时 {:.3} s", start.elapsed().as_secs_f64());
    Ok(())
}
