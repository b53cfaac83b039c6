use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use draftpad_config::{AppConfig, PointHitSetting};
use draftpad_core::shape::PointHitMode;
use draftpad_engine::controller::{EditorController, EditorSettings};
use draftpad_engine::viewport::ViewportSettings;
use draftpad_io::DxfFacade;
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::script::SessionScript;

/// 覆盖会话脚本路径的环境变量。
pub const SCRIPT_ENV: &str = "DRAFTPAD_SCRIPT";
/// 覆盖初始 DXF 路径的环境变量。
pub const SEED_DXF_ENV: &str = "DRAFTPAD_SEED_DXF";

/// 未提供脚本时回放的内置示例：一条线、一个圆、两个点与一处标注。
pub const DEMO_SCRIPT: &str = "\
units logical
key 1
down 0 0
up 0 0
move 20 0
down 20 0
up 20 0
key 2
down 10 10
move 10 18
up 10 18
key 3
down 0 0
up 0 0
down 20 0
up 20 0
key 4
down 0 0
up 0 0
down 20 0
up 20 0
command select_tool none
wheel -1
";

/// 脚本来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    File(PathBuf),
    Demo,
}

/// 命令行对配置的覆盖。
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub script: Option<PathBuf>,
    pub seed_dxf: Option<PathBuf>,
}

/// 统一封装加载后的编辑器、脚本与元信息。
#[derive(Debug)]
pub struct LoadedSession {
    pub editor: EditorController,
    pub script: SessionScript,
    pub source: ScriptSource,
    /// 成功读入的初始 DXF 及其图形数量。
    pub seeded_from: Option<(PathBuf, usize)>,
}

pub fn editor_settings(config: &AppConfig) -> EditorSettings {
    let viewport = &config.viewport;
    EditorSettings {
        viewport: ViewportSettings {
            default_zoom: viewport.default_zoom,
            min_zoom: viewport.min_zoom,
            max_zoom: viewport.max_zoom,
            zoom_intensity: viewport.zoom_intensity,
            canvas_width: viewport.canvas_width,
            canvas_height: viewport.canvas_height,
        },
        point_hit_mode: match config.hit.point_mode {
            PointHitSetting::Radius => PointHitMode::Radius,
            PointHitSetting::Near => PointHitMode::Near,
        },
    }
}

impl SessionOverrides {
    /// 用环境变量 `DRAFTPAD_SCRIPT` 与 `DRAFTPAD_SEED_DXF` 补齐未显式指定的路径。
    pub fn or_env(self) -> Self {
        self.or_lookup(|key| env::var_os(key))
    }

    fn or_lookup(self, lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        Self {
            script: self.script.or_else(|| lookup(SCRIPT_ENV).map(PathBuf::from)),
            seed_dxf: self
                .seed_dxf
                .or_else(|| lookup(SEED_DXF_ENV).map(PathBuf::from)),
        }
    }
}

/// 构建编辑器并准备脚本。覆盖路径优先于配置文件，环境变量需事先经
/// [`SessionOverrides::or_env`] 合并。
/// 初始 DXF 读取失败时只记录警告并从空白图纸开始。
pub fn load_session(
    config: &AppConfig,
    overrides: &SessionOverrides,
) -> Result<LoadedSession, FrontendError> {
    let mut editor = EditorController::new(editor_settings(config))?;

    let seed_path = overrides.seed_dxf.clone().or_else(|| config.session.seed_dxf.clone());
    let script_path = overrides.script.clone().or_else(|| config.session.script.clone());

    let mut seeded_from = None;
    if let Some(path) = seed_path {
        match DxfFacade::new().load(&path) {
            Ok(document) => {
                let shapes = document.shapes();
                let mut stored = 0;
                for shape in &shapes {
                    if editor.scene_mut().add_shape(shape).is_some() {
                        stored += 1;
                    }
                }
                info!(path = %path.display(), shapes = stored, "从 DXF 载入初始图形");
                seeded_from = Some((path, stored));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载初始 DXF 失败，使用空白图纸");
            }
        }
    }

    let (script, source) = match script_path {
        Some(path) => {
            let script = SessionScript::from_file(&path)?;
            info!(path = %path.display(), steps = script.len(), "会话脚本已读取");
            (script, ScriptSource::File(path))
        }
        None => (SessionScript::parse(DEMO_SCRIPT)?, ScriptSource::Demo),
    };

    Ok(LoadedSession {
        editor,
        script,
        source,
        seeded_from,
    })
}
