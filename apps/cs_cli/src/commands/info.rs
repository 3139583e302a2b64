// apps/cs_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示可用关键字、默认参数以及设置文件中各方程的摘要。

use anyhow::{Context, Result};
use clap::Args;
use cs_cdo::config::SetupConfig;
use cs_cdo::equation_param::EquationKey;
use cs_cdo::param::{BcType, EquationType};
use cs_cdo::EquationParam;
use std::path::PathBuf;
use tracing::info;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 设置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 列出全部关键字及其取值
    #[arg(long)]
    pub keys: bool,

    /// 显示默认参数
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== CDO 设置信息 ===");

    if args.keys {
        print_keys();
    }

    if args.defaults {
        print_defaults();
    }

    if let Some(path) = &args.config {
        print_config(path)?;
    }

    if args.config.is_none() && !args.keys && !args.defaults {
        println!("cs_cli 版本: {}", env!("CARGO_PKG_VERSION"));
        println!();
        print_keys();
    }

    Ok(())
}

fn print_keys() {
    println!("=== 方程关键字 ===");
    for kw in EquationKey::KEYWORDS {
        let Some(key) = EquationKey::from_keyword(kw) else { continue };
        let values = key.accepted_values();
        if values.is_empty() {
            println!("  {:<28} <数值>", kw);
        } else {
            println!("  {:<28} {}", kw, values.join(" | "));
        }
    }
}

fn print_defaults() {
    println!("=== 默认参数 ===");
    let eqp = EquationParam::new("default", EquationType::User, 1, BcType::HmgNeumann);
    println!("{}", eqp.summary());
}

fn print_config(path: &PathBuf) -> Result<()> {
    let config = SetupConfig::from_file(path).context("无法读取设置文件")?;
    let setup = config.build().context("构建方程参数失败")?;

    println!("=== 设置文件: {} ===", path.display());
    println!(
        "网格: {} 顶点, {} 单元",
        setup.mesh.n_vertices(),
        setup.mesh.n_cells()
    );
    for z in setup.zones.volume_zones() {
        println!("  体区域 #{} \"{}\": {} 单元", z.id, z.name, z.elt_ids.len());
    }
    for z in setup.zones.boundary_zones() {
        println!("  边界区域 #{} \"{}\": {} 面", z.id, z.name, z.elt_ids.len());
    }

    for eqp in &setup.equations {
        println!("{}", eqp.summary());
    }
    Ok(())
}
