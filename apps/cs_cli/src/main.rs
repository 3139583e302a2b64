// apps/cs_cli/src/main.rs

//! CDO 方程设置命令行界面
//!
//! 读取 JSON 设置文件，检查方程参数，组装源项并配置线性求解器。
//! 库内部通过 `log` 输出，这里由 `tracing-subscriber` 统一收集。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;

/// CDO 方程设置工具
#[derive(Parser)]
#[command(name = "cs_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CDO equation setup, source terms and linear solver configuration", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 组装源项并配置求解器
    Run(commands::run::RunArgs),
    /// 显示关键字与设置摘要
    Info(commands::info::InfoArgs),
    /// 验证设置文件
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // try_init 同时把 log 记录转发到 tracing
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {}", e))?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
