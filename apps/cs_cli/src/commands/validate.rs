// apps/cs_cli/src/commands/validate.rs

//! 设置验证命令
//!
//! 构建全部方程参数并锁定，检查源项分派与求解器配置是否可行。

use super::BackendArgs;
use anyhow::{bail, Context, Result};
use clap::Args;
use cs_cdo::config::{check_source_arrays, SetupConfig};
use cs_cdo::sles::setup_sles;
use cs_cdo::source_term::SourceTermSetup;
use cs_cdo::EquationParam;
use cs_mesh::ZoneRegistry;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 设置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,

    /// 打印每个方程的设置摘要
    #[arg(long)]
    pub summary: bool,

    #[command(flatten)]
    pub backends: BackendArgs,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== CDO 设置验证 ===");
    println!("检查设置文件: {}", args.config.display());

    let config = SetupConfig::from_file(&args.config).context("无法读取设置文件")?;
    let mut result = ValidationResult::default();

    let mesh = match config.build_mesh() {
        Ok(mesh) => mesh,
        Err(e) => {
            result.add_error(format!("网格: {}", e));
            return print_validation_result(&result, args.strict);
        }
    };
    let quant = mesh.compute_quantities();
    println!("  ✓ 网格: {} 顶点, {} 单元", mesh.n_vertices(), mesh.n_cells());

    let zones = match config.build_zones(&mesh, &quant) {
        Ok(zones) => zones,
        Err(e) => {
            result.add_error(format!("区域: {}", e));
            return print_validation_result(&result, args.strict);
        }
    };
    for z in zones.volume_zones().iter().filter(|z| z.elt_ids.is_empty()) {
        result.add_warning(format!("体区域 \"{}\" 不含任何单元", z.name));
    }

    let backends = args.backends.backends();
    for eq_config in &config.equations {
        match eq_config.build(&zones) {
            Ok(mut eqp) => {
                if let Err(e) = check_source_arrays(&eqp, &mesh) {
                    result.add_error(e.to_string());
                }
                check_equation(&mut eqp, &zones, &backends, &mut result);
                if args.summary {
                    println!("{}", eqp.summary());
                }
            }
            Err(e) => result.add_error(format!("方程 \"{}\": {}", eq_config.name, e)),
        }
    }

    print_validation_result(&result, args.strict)
}

fn check_equation(
    eqp: &mut EquationParam,
    zones: &ZoneRegistry,
    backends: &cs_cdo::SlesBackends,
    result: &mut ValidationResult,
) {
    let name = eqp.name().to_string();

    if let Err(e) = eqp.last_stage() {
        result.add_error(format!("方程 \"{}\": {}", name, e));
        return;
    }

    if !eqp.source_terms().is_empty() {
        if let Err(e) = SourceTermSetup::init(eqp.space_scheme(), eqp.source_terms(), zones) {
            result.add_error(format!("方程 \"{}\" 源项: {}", name, e));
        }
    }

    if eqp.bc().defs.is_empty() {
        result.add_warning(format!(
            "方程 \"{}\" 没有边界条件定义，全部边界使用默认条件 {}",
            name,
            eqp.bc().default_bc
        ));
    }
    if eqp.sles().eps > 1e-3 {
        result.add_warning(format!("方程 \"{}\" 的求解器容差 {:e} 偏大", name, eqp.sles().eps));
    }

    match setup_sles(eqp, backends) {
        Ok(Some(setup)) => println!("  ✓ 方程 \"{}\": {}", name, setup),
        Ok(None) => {}
        Err(e) => result.add_error(format!("方程 \"{}\" 求解器: {}", name, e)),
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    if result.is_ok(strict) {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}
