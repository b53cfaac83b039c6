//! 绘图工具的显式状态机：`Idle → Anchored → Previewing → Committed → Idle`。

use std::str::FromStr;

use draftpad_core::dimension::Dimension;
use draftpad_core::geometry::Point2;
use draftpad_core::shape::{Shape, ShapeKind};

use crate::errors::EngineError;

/// 工具栏上可选的工具。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Line,
    Circle,
    Point,
    Dimension,
    Eraser,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Line => "line",
            ToolKind::Circle => "circle",
            ToolKind::Point => "point",
            ToolKind::Dimension => "dimension",
            ToolKind::Eraser => "eraser",
        }
    }

    /// 对应的绘图图形种类；标注与橡皮擦不产生图形。
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Line => Some(ShapeKind::Line),
            ToolKind::Circle => Some(ShapeKind::Circle),
            ToolKind::Point => Some(ShapeKind::Point),
            ToolKind::Dimension | ToolKind::Eraser => None,
        }
    }
}

impl FromStr for ToolKind {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "line" => Ok(ToolKind::Line),
            "circle" => Ok(ToolKind::Circle),
            "point" => Ok(ToolKind::Point),
            "dimension" | "dim" => Ok(ToolKind::Dimension),
            "eraser" => Ok(ToolKind::Eraser),
            other => Err(EngineError::UnknownTool(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolState {
    Idle,
    /// 首次点击已记录，图形两端重合。
    Anchored { anchor: Point2, shape: Shape },
    /// 指针移动中，图形作为草稿实时更新但不入库。
    Previewing { anchor: Point2, shape: Shape },
}

/// 状态转换的结果，由控制器据此更新场景。
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// 没有可见变化。
    Unchanged,
    Preview(Shape),
    /// 需要提交的工作实例；场景只会存它的副本。
    Commit(Shape),
    Cancelled,
}

/// 点、线、圆的绘图工具。
#[derive(Debug, Clone)]
pub struct DrawingTool {
    kind: ShapeKind,
    state: ToolState,
}

impl DrawingTool {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            state: ToolState::Idle,
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    pub fn state(&self) -> &ToolState {
        &self.state
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, ToolState::Idle)
    }

    /// 指针按下。点工具一次点击即提交；其他工具首次按下锚定，再次按下提交。
    pub fn press(&mut self, at: Point2) -> ToolOutcome {
        match std::mem::replace(&mut self.state, ToolState::Idle) {
            ToolState::Idle => {
                let shape = Shape::anchored(self.kind, at);
                if self.kind == ShapeKind::Point {
                    return ToolOutcome::Commit(shape);
                }
                self.state = ToolState::Anchored {
                    anchor: at,
                    shape: shape.clone(),
                };
                ToolOutcome::Preview(shape)
            }
            ToolState::Anchored { anchor, mut shape }
            | ToolState::Previewing { anchor, mut shape } => {
                shape.set_pos(anchor, at);
                ToolOutcome::Commit(shape)
            }
        }
    }

    /// 指针移动，只在锚定后生效。
    pub fn motion(&mut self, at: Point2) -> ToolOutcome {
        match std::mem::replace(&mut self.state, ToolState::Idle) {
            ToolState::Idle => ToolOutcome::Unchanged,
            ToolState::Anchored { anchor, mut shape }
            | ToolState::Previewing { anchor, mut shape } => {
                shape.set_pos(anchor, at);
                self.state = ToolState::Previewing {
                    anchor,
                    shape: shape.clone(),
                };
                ToolOutcome::Preview(shape)
            }
        }
    }

    /// 指针抬起：拖拽到不同位置后抬起即提交，原地抬起则保持锚定等待第二次点击。
    pub fn release(&mut self, at: Point2) -> ToolOutcome {
        let dragged = matches!(&self.state, ToolState::Previewing { anchor, .. } if *anchor != at);
        if dragged {
            self.press(at)
        } else {
            ToolOutcome::Unchanged
        }
    }

    pub fn cancel(&mut self) -> ToolOutcome {
        match std::mem::replace(&mut self.state, ToolState::Idle) {
            ToolState::Idle => ToolOutcome::Unchanged,
            _ => ToolOutcome::Cancelled,
        }
    }
}

/// 尺寸标注工具的两点取点流程。
#[derive(Debug, Clone, Default)]
pub struct DimensionPicker {
    first: Option<Point2>,
}

impl DimensionPicker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn first(&self) -> Option<Point2> {
        self.first
    }

    /// 记录一次取点。第二个点到来时返回标注并复位；未取到点时传 `None`。
    pub fn pick(&mut self, picked: Option<Point2>) -> Option<Dimension> {
        match (self.first, picked) {
            (_, None) => None,
            (None, Some(point)) => {
                self.first = Some(point);
                None
            }
            (Some(first), Some(second)) => {
                self.first = None;
                Some(Dimension::from_picks(Some(first), Some(second)))
            }
        }
    }

    /// 取消取点，返回此前是否已有第一个点。
    pub fn cancel(&mut self) -> bool {
        self.first.take().is_some()
    }

    /// 按当前状态立即生成标注；缺点时得到零尺寸哨兵。
    pub fn current(&self, second: Option<Point2>) -> Dimension {
        Dimension::from_picks(self.first, second)
    }
}
