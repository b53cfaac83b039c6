pub mod cli;
pub mod errors;
pub mod loader;
pub mod script;

use std::path::PathBuf;

use draftpad_config::AppConfig;
use draftpad_io::ExportOptions;
use errors::FrontendError;
use tracing::info;

pub use cli::{ExportRequest, SessionReport};
pub use loader::SessionOverrides;

/// CLI 会话的启动参数。
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub overrides: SessionOverrides,
    /// 是否在回放结束后导出 DXF。
    pub export: bool,
    /// 导出路径，缺省时使用配置中的 `[export]` 设置。
    pub export_path: Option<PathBuf>,
}

/// 加载并回放会话脚本，按需导出 DXF。
pub fn run_cli_session(
    config: &AppConfig,
    options: &SessionOptions,
) -> Result<SessionReport, FrontendError> {
    info!("启动 CLI 会话前端");
    let overrides = options.overrides.clone().or_env();
    let loaded = loader::load_session(config, &overrides)?;
    let export = (options.export || options.export_path.is_some()).then(|| ExportRequest {
        path: options
            .export_path
            .clone()
            .unwrap_or_else(|| config.export.target_path()),
        options: ExportOptions {
            include_dimensions: config.export.include_dimensions,
        },
    });
    cli::run_session(loaded, export)
}
