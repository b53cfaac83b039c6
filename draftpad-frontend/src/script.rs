//! 会话脚本：逐行描述的输入事件日志，由 CLI 前端回放。
//!
//! ```text
//! # 注释
//! units logical
//! key 1
//! down 0 0
//! move 20 0
//! down 20 0 primary
//! wheel -1
//! command select_tool none
//! ```

use std::fs;
use std::path::Path;

use draftpad_engine::command::CommandRequest;
use draftpad_engine::controller::{KeyCode, PointerButton};

use crate::errors::FrontendError;

/// 指针坐标的解释方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinateSpace {
    /// 设备像素，y 轴向下。
    #[default]
    Device,
    /// 绘图单位，回放时按当时的视口换算为像素。
    Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    Pointer {
        phase: PointerPhase,
        x: f64,
        y: f64,
        button: PointerButton,
    },
    Wheel(f64),
    Key(KeyCode),
    Resize {
        width: f64,
        height: f64,
    },
    Command(CommandRequest),
    Units(CoordinateSpace),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    /// 源文件中的行号，从 1 开始。
    pub line: usize,
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionScript {
    steps: Vec<ScriptStep>,
}

impl SessionScript {
    pub fn from_file(path: &Path) -> Result<Self, FrontendError> {
        let source = fs::read_to_string(path).map_err(|source| FrontendError::ScriptIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self, FrontendError> {
        let mut steps = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let tokens: Vec<&str> = content.split_whitespace().collect();
            let action = parse_action(line, &tokens)?;
            steps.push(ScriptStep { line, action });
        }
        Ok(Self { steps })
    }

    #[inline]
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn parse_action(line: usize, tokens: &[&str]) -> Result<ScriptAction, FrontendError> {
    let (verb, args) = match tokens.split_first() {
        Some((verb, args)) => (verb.to_ascii_lowercase(), args),
        None => return Err(FrontendError::script(line, "空指令")),
    };
    match verb.as_str() {
        "down" | "move" | "up" => {
            let phase = match verb.as_str() {
                "down" => PointerPhase::Down,
                "move" => PointerPhase::Move,
                _ => PointerPhase::Up,
            };
            let (x, y, rest) = match args {
                [x, y, rest @ ..] => (number(line, x)?, number(line, y)?, rest),
                _ => return Err(FrontendError::script(line, format!("{verb} 需要 x y 坐标"))),
            };
            let button = match (phase, rest) {
                (_, []) => PointerButton::Primary,
                (PointerPhase::Move, _) => {
                    return Err(FrontendError::script(line, "move 不接受按键参数"));
                }
                (_, [name]) => button(line, name)?,
                _ => return Err(FrontendError::script(line, "参数过多")),
            };
            Ok(ScriptAction::Pointer {
                phase,
                x,
                y,
                button,
            })
        }
        "wheel" => match args {
            [delta] => Ok(ScriptAction::Wheel(number(line, delta)?)),
            _ => Err(FrontendError::script(line, "wheel 需要一个 delta_y 参数")),
        },
        "key" => match args {
            [name] => match KeyCode::from_name(name) {
                KeyCode::Other => Err(FrontendError::script(line, format!("不支持的按键: {name}"))),
                key => Ok(ScriptAction::Key(key)),
            },
            _ => Err(FrontendError::script(line, "key 需要一个按键名")),
        },
        "resize" => match args {
            [width, height] => Ok(ScriptAction::Resize {
                width: number(line, width)?,
                height: number(line, height)?,
            }),
            _ => Err(FrontendError::script(line, "resize 需要宽度与高度")),
        },
        "command" => match args.split_first() {
            Some((name, rest)) => Ok(ScriptAction::Command(CommandRequest::new(
                *name,
                rest.iter().copied(),
            ))),
            None => Err(FrontendError::script(line, "command 缺少命令名")),
        },
        "units" => match args {
            [space] if space.eq_ignore_ascii_case("device") => {
                Ok(ScriptAction::Units(CoordinateSpace::Device))
            }
            [space] if space.eq_ignore_ascii_case("logical") => {
                Ok(ScriptAction::Units(CoordinateSpace::Logical))
            }
            _ => Err(FrontendError::script(line, "units 只接受 device 或 logical")),
        },
        other => Err(FrontendError::script(line, format!("未知指令: {other}"))),
    }
}

fn number(line: usize, raw: &str) -> Result<f64, FrontendError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| FrontendError::script(line, format!("\"{raw}\" 不是有效数字")))
}

fn button(line: usize, raw: &str) -> Result<PointerButton, FrontendError> {
    match raw.to_ascii_lowercase().as_str() {
        "primary" | "left" => Ok(PointerButton::Primary),
        "middle" => Ok(PointerButton::Middle),
        "secondary" | "right" => Ok(PointerButton::Secondary),
        _ => Err(FrontendError::script(line, format!("未知指针按键: {raw}"))),
    }
}
