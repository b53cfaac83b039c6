use std::path::PathBuf;

use draftpad_engine::errors::EngineError;
use draftpad_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("会话脚本第 {line} 行: {message}")]
    Script { line: usize, message: String },
    #[error("读取会话脚本 {path:?} 失败: {source}")]
    ScriptIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl FrontendError {
    pub(crate) fn script(line: usize, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }
}
