use std::path::PathBuf;

use draftpad_config::{AppConfig, ConfigError};
use draftpad_frontend::SessionOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "用法: draftpad [--config <文件>] [--script <文件>] [--open <DXF>] [--export] [--output <DXF>]";

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut options = SessionOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_override = Some(require_path(&mut args, "--config")),
            "--script" => options.overrides.script = Some(require_path(&mut args, "--script")),
            "--open" => options.overrides.seed_dxf = Some(require_path(&mut args, "--open")),
            "--export" => options.export = true,
            "--output" => options.export_path = Some(require_path(&mut args, "--output")),
            "--help" | "-h" => {
                println!("{USAGE}");
                return;
            }
            other => {
                eprintln!("未知参数：{other}");
                eprintln!("{USAGE}");
                std::process::exit(1);
            }
        }
    }

    let (config, config_error) = match load_configuration(config_override) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    init_logging(&config);
    if let Some(err) = config_error {
        warn!(error = %err, "加载配置失败，使用内建默认值");
    }
    info!("启动 DraftPad");

    match draftpad_frontend::run_cli_session(&config, &options) {
        Ok(report) => info!(
            shapes = report.shapes,
            dimensions = report.dimensions,
            frames = report.frames,
            "会话结束"
        ),
        Err(err) => {
            error!(error = %err, "执行 CLI 会话失败");
            std::process::exit(1);
        }
    }
}

fn require_path(args: &mut impl Iterator<Item = String>, flag: &str) -> PathBuf {
    match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("`{flag}` 需要提供路径");
            std::process::exit(1);
        }
    }
}

/// 显式路径优先，否则按环境变量与 `./config/default.toml` 自动发现。
fn load_configuration(override_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 重复初始化时忽略
    let _ = fmt().with_env_filter(filter).try_init();
}
