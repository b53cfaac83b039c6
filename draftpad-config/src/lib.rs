use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "DRAFTPAD_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub hit: HitConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DRAFTPAD_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let cwd = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(&cwd)
    }

    /// 在给定目录下寻找 `config/default.toml`，不读取环境变量。
    pub fn discover_in(base_dir: &Path) -> Result<Self, ConfigError> {
        let default_path = base_dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 视口参数。合法性由引擎在构造视口时校验。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_zoom")]
    pub default_zoom: f64,
    #[serde(default = "ViewportConfig::default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "ViewportConfig::default_max_zoom")]
    pub max_zoom: f64,
    #[serde(default = "ViewportConfig::default_zoom_intensity")]
    pub zoom_intensity: f64,
    #[serde(default = "ViewportConfig::default_canvas_width")]
    pub canvas_width: f64,
    #[serde(default = "ViewportConfig::default_canvas_height")]
    pub canvas_height: f64,
}

impl ViewportConfig {
    fn default_zoom() -> f64 {
        3.5
    }

    fn default_min_zoom() -> f64 {
        3.0
    }

    fn default_max_zoom() -> f64 {
        1_000.0
    }

    fn default_zoom_intensity() -> f64 {
        0.02
    }

    fn default_canvas_width() -> f64 {
        1280.0
    }

    fn default_canvas_height() -> f64 {
        720.0
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            default_zoom: Self::default_zoom(),
            min_zoom: Self::default_min_zoom(),
            max_zoom: Self::default_max_zoom(),
            zoom_intensity: Self::default_zoom_intensity(),
            canvas_width: Self::default_canvas_width(),
            canvas_height: Self::default_canvas_height(),
        }
    }
}

/// 点图形的命中判定方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointHitSetting {
    /// 距离平方小于 4。
    #[default]
    Radius,
    /// 距离不超过 1。
    Near,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HitConfig {
    #[serde(default)]
    pub point_mode: PointHitSetting,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub include_dimensions: bool,
    /// 不含扩展名的文件名。
    #[serde(default = "ExportConfig::default_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl ExportConfig {
    fn default_file_name() -> String {
        "drawing".to_string()
    }

    /// 导出文件的完整路径，未配置目录时位于当前目录。
    pub fn target_path(&self) -> PathBuf {
        let file = format!("{}.dxf", self.file_name);
        match &self.directory {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_dimensions: false,
            file_name: Self::default_file_name(),
            directory: None,
        }
    }
}

/// CLI 会话的输入来源。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub script: Option<PathBuf>,
    #[serde(default)]
    pub seed_dxf: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
