use draftpad_core::geometry::{Point2, Vector2};
use draftpad_core::shape::{PointHitMode, ShapeId, ShapeKind};
use tracing::debug;

use crate::errors::EngineError;
use crate::render::{Frame, Renderer};
use crate::scene::{HitFilter, SceneStore};
use crate::tool::{DimensionPicker, DrawingTool, ToolKind, ToolOutcome};
use crate::viewport::{ViewportSettings, ViewportTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// 控制器识别的按键，其余按键统一归为 `Other`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Escape,
    Space,
    Delete,
    Other,
}

impl KeyCode {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "1" | "digit1" => KeyCode::Digit1,
            "2" | "digit2" => KeyCode::Digit2,
            "3" | "digit3" => KeyCode::Digit3,
            "4" | "digit4" => KeyCode::Digit4,
            "5" | "digit5" => KeyCode::Digit5,
            "escape" | "esc" => KeyCode::Escape,
            "space" => KeyCode::Space,
            "delete" | "del" => KeyCode::Delete,
            _ => KeyCode::Other,
        }
    }
}

/// 事件层交给控制器的输入，坐标均为设备像素。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown {
        position: Point2,
        button: PointerButton,
    },
    PointerMove {
        position: Point2,
    },
    PointerUp {
        position: Point2,
        button: PointerButton,
    },
    /// 只关心 `delta_y` 的符号。
    Wheel {
        delta_y: f64,
    },
    Key(KeyCode),
    Resize {
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    pub redraw: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditorSettings {
    pub viewport: ViewportSettings,
    pub point_hit_mode: PointHitMode,
}

#[derive(Debug, Clone)]
enum ActiveTool {
    None,
    Draw(DrawingTool),
    Dimension(DimensionPicker),
    Eraser,
}

impl ActiveTool {
    fn kind(&self) -> Option<ToolKind> {
        match self {
            ActiveTool::None => None,
            ActiveTool::Draw(tool) => Some(match tool.kind() {
                ShapeKind::Point => ToolKind::Point,
                ShapeKind::Line => ToolKind::Line,
                ShapeKind::Circle => ToolKind::Circle,
            }),
            ActiveTool::Dimension(_) => Some(ToolKind::Dimension),
            ActiveTool::Eraser => Some(ToolKind::Eraser),
        }
    }
}

/// 独占场景与视口的输入控制器。所有修改都在事件处理函数中同步完成。
#[derive(Debug)]
pub struct EditorController {
    scene: SceneStore,
    viewport: ViewportTransform,
    tool: ActiveTool,
    pan_anchor: Option<Point2>,
    cursor: Option<Point2>,
}

impl EditorController {
    pub fn new(settings: EditorSettings) -> Result<Self, EngineError> {
        Ok(Self {
            scene: SceneStore::with_point_hit_mode(settings.point_hit_mode),
            viewport: ViewportTransform::new(settings.viewport)?,
            tool: ActiveTool::None,
            pan_anchor: None,
            cursor: None,
        })
    }

    #[inline]
    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut SceneStore {
        &mut self.scene
    }

    #[inline]
    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    #[inline]
    pub fn active_tool(&self) -> Option<ToolKind> {
        self.tool.kind()
    }

    #[inline]
    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// 最近一次指针位置的逻辑坐标，用于状态栏显示。
    #[inline]
    pub fn cursor_logical(&self) -> Option<Point2> {
        self.cursor
    }

    /// 处理单个输入事件，返回是否需要重绘。
    pub fn handle_event(&mut self, event: InputEvent) -> EventOutcome {
        let viewport_changed = match event {
            InputEvent::PointerDown { position, button } => {
                self.pointer_down(position, button);
                false
            }
            InputEvent::PointerMove { position } => self.pointer_move(position),
            InputEvent::PointerUp { position, button } => {
                self.pointer_up(position, button);
                false
            }
            InputEvent::Wheel { delta_y } => self.viewport.zoom_by_wheel(delta_y),
            InputEvent::Key(key) => self.key(key),
            InputEvent::Resize { width, height } => {
                self.viewport.resize(width, height);
                true
            }
        };
        let scene_changed = self.scene.take_redraw_request();
        EventOutcome {
            redraw: viewport_changed || scene_changed,
        }
    }

    /// 处理事件并在需要时通知渲染协作者。
    pub fn dispatch(&mut self, event: InputEvent, renderer: &mut dyn Renderer) -> EventOutcome {
        let outcome = self.handle_event(event);
        if outcome.redraw {
            self.render(renderer);
        }
        outcome
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.render(&Frame::new(&self.scene, &self.viewport));
    }

    /// 切换工具。进行中的草稿与取点会被丢弃。
    pub fn select_tool(&mut self, kind: Option<ToolKind>) {
        self.cancel();
        self.tool = match kind {
            None => ActiveTool::None,
            Some(ToolKind::Dimension) => ActiveTool::Dimension(DimensionPicker::new()),
            Some(ToolKind::Eraser) => ActiveTool::Eraser,
            Some(other) => match other.shape_kind() {
                Some(shape_kind) => ActiveTool::Draw(DrawingTool::new(shape_kind)),
                None => ActiveTool::None,
            },
        };
        debug!(tool = kind.map(ToolKind::name).unwrap_or("none"), "切换工具");
    }

    /// 取消进行中的手势，回到 Idle；返回是否有状态被丢弃。
    pub fn cancel(&mut self) -> bool {
        let cancelled = match &mut self.tool {
            ActiveTool::Draw(tool) => tool.cancel() == ToolOutcome::Cancelled,
            ActiveTool::Dimension(picker) => picker.cancel(),
            ActiveTool::None | ActiveTool::Eraser => false,
        };
        if self.scene.preview().is_some() {
            self.scene.set_preview_shape(None);
        }
        if cancelled {
            debug!("手势已取消");
        }
        cancelled
    }

    /// 视口回到画布中心并恢复默认缩放。
    pub fn center_view(&mut self) {
        self.viewport.reset();
    }

    /// 删除逻辑坐标处命中的第一个图形。
    pub fn erase_at(&mut self, logical: Point2) -> Option<ShapeId> {
        let id = self.scene.shape_at(logical, HitFilter::Any)?.id();
        self.scene.remove_shape(id);
        Some(id)
    }

    fn pointer_down(&mut self, position: Point2, button: PointerButton) {
        let logical = self.viewport.to_logical(position);
        self.cursor = Some(logical);
        let pans = match button {
            PointerButton::Middle => true,
            PointerButton::Primary => matches!(self.tool, ActiveTool::None),
            PointerButton::Secondary => false,
        };
        if pans {
            self.pan_anchor = Some(position);
            return;
        }
        if button != PointerButton::Primary {
            return;
        }

        match &mut self.tool {
            ActiveTool::Draw(tool) => {
                let outcome = tool.press(logical);
                self.apply(outcome);
            }
            ActiveTool::Dimension(picker) => {
                let picked = self
                    .scene
                    .hover_test(position, &self.viewport, HitFilter::PointsOnly)
                    .map(|shape| shape.origin());
                if let Some(dimension) = picker.pick(picked) {
                    self.scene.add_dimension(dimension);
                }
            }
            ActiveTool::Eraser => {
                self.erase_at(logical);
            }
            ActiveTool::None => {}
        }
    }

    fn pointer_move(&mut self, position: Point2) -> bool {
        let logical = self.viewport.to_logical(position);
        self.cursor = Some(logical);
        if let Some(anchor) = self.pan_anchor {
            self.viewport.pan_by(Vector2::from_points(anchor, position));
            self.pan_anchor = Some(position);
            return true;
        }
        if let ActiveTool::Draw(tool) = &mut self.tool {
            let outcome = tool.motion(logical);
            self.apply(outcome);
        }
        false
    }

    fn pointer_up(&mut self, position: Point2, button: PointerButton) {
        let logical = self.viewport.to_logical(position);
        self.cursor = Some(logical);
        if self.pan_anchor.take().is_some() {
            return;
        }
        if button != PointerButton::Primary {
            return;
        }
        if let ActiveTool::Draw(tool) = &mut self.tool {
            let outcome = tool.release(logical);
            self.apply(outcome);
        }
    }

    fn key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Digit1 => self.select_tool(Some(ToolKind::Line)),
            KeyCode::Digit2 => self.select_tool(Some(ToolKind::Circle)),
            KeyCode::Digit3 => self.select_tool(Some(ToolKind::Point)),
            KeyCode::Digit4 => self.select_tool(Some(ToolKind::Dimension)),
            KeyCode::Digit5 => self.select_tool(Some(ToolKind::Eraser)),
            KeyCode::Escape => {
                self.cancel();
            }
            KeyCode::Space => {
                self.center_view();
                return true;
            }
            KeyCode::Delete => {
                if let Some(cursor) = self.cursor {
                    self.erase_at(cursor);
                }
            }
            KeyCode::Other => {}
        }
        false
    }

    fn apply(&mut self, outcome: ToolOutcome) {
        match outcome {
            ToolOutcome::Unchanged => {}
            ToolOutcome::Preview(shape) => self.scene.set_preview_shape(Some(&shape)),
            ToolOutcome::Commit(shape) => {
                self.scene.add_shape(&shape);
                self.scene.set_preview_shape(None);
            }
            ToolOutcome::Cancelled => self.scene.set_preview_shape(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DisplayList;

    fn controller() -> EditorController {
        EditorController::new(EditorSettings::default()).expect("default settings are valid")
    }

    /// 逻辑坐标对应的设备像素位置。
    fn at(editor: &EditorController, x: f64, y: f64) -> Point2 {
        editor.viewport().to_device(Point2::new(x, y))
    }

    fn click(editor: &mut EditorController, x: f64, y: f64) {
        let position = at(editor, x, y);
        editor.handle_event(InputEvent::PointerDown {
            position,
            button: PointerButton::Primary,
        });
        editor.handle_event(InputEvent::PointerUp {
            position,
            button: PointerButton::Primary,
        });
    }

    fn hover(editor: &mut EditorController, x: f64, y: f64) -> EventOutcome {
        let position = at(editor, x, y);
        editor.handle_event(InputEvent::PointerMove { position })
    }

    #[test]
    fn keymap_selects_tools() {
        let mut editor = controller();
        assert_eq!(editor.active_tool(), None);
        let cases = [
            (KeyCode::Digit1, ToolKind::Line),
            (KeyCode::Digit2, ToolKind::Circle),
            (KeyCode::Digit3, ToolKind::Point),
            (KeyCode::Digit4, ToolKind::Dimension),
            (KeyCode::Digit5, ToolKind::Eraser),
        ];
        for (key, expected) in cases {
            editor.handle_event(InputEvent::Key(key));
            assert_eq!(editor.active_tool(), Some(expected));
        }
        assert_eq!(KeyCode::from_name("Escape"), KeyCode::Escape);
        assert_eq!(KeyCode::from_name("Digit3"), KeyCode::Digit3);
        assert_eq!(KeyCode::from_name("F1"), KeyCode::Other);
    }

    #[test]
    fn line_is_drawn_with_preview_then_committed() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit1));
        click(&mut editor, 0.0, 0.0);
        assert!(editor.scene().preview().is_some());

        let outcome = hover(&mut editor, 6.0, 8.0);
        assert!(outcome.redraw);
        let preview = editor.scene().preview().expect("preview during drag");
        assert_eq!(preview.end(), Some(Point2::new(6.0, 8.0)));
        assert!(editor.scene().is_empty());

        click(&mut editor, 10.0, 0.0);
        assert!(editor.scene().preview().is_none());
        assert_eq!(editor.scene().len(), 1);
        let line = &editor.scene().shapes()[0];
        assert_eq!(line.kind(), ShapeKind::Line);
        assert_eq!(line.origin(), Point2::new(0.0, 0.0));
        assert_eq!(line.end(), Some(Point2::new(10.0, 0.0)));
        assert_eq!(editor.active_tool(), Some(ToolKind::Line));
    }

    #[test]
    fn circle_drag_gesture_commits_on_release() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit2));
        let center = at(&editor, 0.0, 0.0);
        let rim = at(&editor, 0.0, 7.0);
        editor.handle_event(InputEvent::PointerDown {
            position: center,
            button: PointerButton::Primary,
        });
        editor.handle_event(InputEvent::PointerMove { position: rim });
        editor.handle_event(InputEvent::PointerUp {
            position: rim,
            button: PointerButton::Primary,
        });
        assert_eq!(editor.scene().len(), 1);
        assert_eq!(editor.scene().shapes()[0].radius(), Some(7.0));
    }

    #[test]
    fn escape_cancels_without_commit() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit1));
        click(&mut editor, 0.0, 0.0);
        hover(&mut editor, 5.0, 5.0);
        let outcome = editor.handle_event(InputEvent::Key(KeyCode::Escape));
        assert!(outcome.redraw);
        assert!(editor.scene().preview().is_none());
        assert!(editor.scene().is_empty());

        // 取消后移动不会再产生预览
        let outcome = hover(&mut editor, 8.0, 8.0);
        assert!(!outcome.redraw);
        assert!(editor.scene().preview().is_none());
    }

    #[test]
    fn point_tool_places_once_per_coordinate() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit3));
        click(&mut editor, 4.0, 4.0);
        click(&mut editor, 4.0, 4.0);
        click(&mut editor, 5.0, 4.0);
        assert_eq!(editor.scene().len(), 2);
        assert!(editor.scene().preview().is_none());
    }

    #[test]
    fn dimension_tool_picks_two_points() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit3));
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 30.0, 40.0);

        editor.handle_event(InputEvent::Key(KeyCode::Digit4));
        // 空白处的点击不算取点
        click(&mut editor, 15.0, -20.0);
        click(&mut editor, 0.0, 0.0);
        assert!(editor.scene().dimensions().is_empty());
        click(&mut editor, 30.0, 40.0);

        let dimensions = editor.scene().dimensions();
        assert_eq!(dimensions.len(), 1);
        assert!((dimensions[0].length - 50.0).abs() < 1e-9);
        assert_eq!(dimensions[0].label_anchor, Point2::new(15.0, 20.0));
    }

    #[test]
    fn dimension_on_same_point_is_not_stored() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit3));
        click(&mut editor, 0.0, 0.0);
        editor.handle_event(InputEvent::Key(KeyCode::Digit4));
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 0.0, 0.0);
        assert!(editor.scene().dimensions().is_empty());
    }

    #[test]
    fn eraser_and_delete_remove_hovered_shape() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit3));
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 20.0, 0.0);

        editor.handle_event(InputEvent::Key(KeyCode::Digit5));
        click(&mut editor, 0.0, 0.0);
        assert_eq!(editor.scene().len(), 1);

        hover(&mut editor, 20.0, 0.0);
        let outcome = editor.handle_event(InputEvent::Key(KeyCode::Delete));
        assert!(outcome.redraw);
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn middle_drag_pans_and_space_recenters() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit1));
        let start = editor.viewport().pan_offset();
        editor.handle_event(InputEvent::PointerDown {
            position: Point2::new(100.0, 100.0),
            button: PointerButton::Middle,
        });
        assert!(editor.is_panning());
        let outcome = editor.handle_event(InputEvent::PointerMove {
            position: Point2::new(130.0, 90.0),
        });
        assert!(outcome.redraw);
        editor.handle_event(InputEvent::PointerMove {
            position: Point2::new(140.0, 95.0),
        });
        editor.handle_event(InputEvent::PointerUp {
            position: Point2::new(140.0, 95.0),
            button: PointerButton::Middle,
        });
        assert!(!editor.is_panning());
        assert!(editor.scene().preview().is_none());
        let pan = editor.viewport().pan_offset();
        assert_eq!(pan.x() - start.x(), 40.0);
        assert_eq!(pan.y() - start.y(), -5.0);

        let outcome = editor.handle_event(InputEvent::Key(KeyCode::Space));
        assert!(outcome.redraw);
        assert_eq!(editor.viewport().pan_offset(), start);
    }

    #[test]
    fn primary_drag_pans_without_tool() {
        let mut editor = controller();
        let start = editor.viewport().pan_offset();
        editor.handle_event(InputEvent::PointerDown {
            position: Point2::new(0.0, 0.0),
            button: PointerButton::Primary,
        });
        editor.handle_event(InputEvent::PointerMove {
            position: Point2::new(-12.0, 6.0),
        });
        editor.handle_event(InputEvent::PointerUp {
            position: Point2::new(-12.0, 6.0),
            button: PointerButton::Primary,
        });
        let pan = editor.viewport().pan_offset();
        assert_eq!(pan.x(), start.x() - 12.0);
        assert_eq!(pan.y(), start.y() + 6.0);
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn wheel_zoom_requests_redraw_until_clamped() {
        let mut editor = controller();
        assert!(editor.handle_event(InputEvent::Wheel { delta_y: -1.0 }).redraw);
        assert!(!editor.handle_event(InputEvent::Wheel { delta_y: 0.0 }).redraw);
        for _ in 0..200 {
            editor.handle_event(InputEvent::Wheel { delta_y: 1.0 });
        }
        assert!(!editor.handle_event(InputEvent::Wheel { delta_y: 1.0 }).redraw);
    }

    #[test]
    fn cursor_reports_logical_position() {
        let mut editor = controller();
        assert!(editor.cursor_logical().is_none());
        hover(&mut editor, -3.0, 12.0);
        assert_eq!(editor.cursor_logical(), Some(Point2::new(-3.0, 12.0)));
    }

    #[test]
    fn dispatch_renders_only_when_needed() {
        let mut editor = controller();
        let mut list = DisplayList::new();
        editor.dispatch(InputEvent::Key(KeyCode::Digit3), &mut list);
        assert_eq!(list.frames(), 0);

        let position = at(&editor, 1.0, 1.0);
        editor.dispatch(
            InputEvent::PointerDown {
                position,
                button: PointerButton::Primary,
            },
            &mut list,
        );
        assert_eq!(list.frames(), 1);
        editor.dispatch(InputEvent::Wheel { delta_y: -1.0 }, &mut list);
        assert_eq!(list.frames(), 2);
        editor.dispatch(InputEvent::Resize { width: 800.0, height: 600.0 }, &mut list);
        assert_eq!(list.frames(), 3);
    }

    #[test]
    fn zooming_does_not_move_committed_geometry() {
        let mut editor = controller();
        editor.handle_event(InputEvent::Key(KeyCode::Digit1));
        click(&mut editor, -5.0, 5.0);
        click(&mut editor, 5.0, -5.0);
        for _ in 0..10 {
            editor.handle_event(InputEvent::Wheel { delta_y: -1.0 });
        }
        let line = &editor.scene().shapes()[0];
        assert_eq!(line.origin(), Point2::new(-5.0, 5.0));
        assert_eq!(line.end(), Some(Point2::new(5.0, -5.0)));
    }
}
