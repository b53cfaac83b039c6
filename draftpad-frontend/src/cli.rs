use std::fs;
use std::path::{Path, PathBuf};

use draftpad_core::geometry::Point2;
use draftpad_core::shape::Geometry;
use draftpad_engine::command::{CommandBus, CommandContext};
use draftpad_engine::controller::{EditorController, InputEvent};
use draftpad_engine::render::DisplayList;
use draftpad_io::{DxfFacade, ExportOptions, IoError, export_document};
use tracing::{debug, info, warn};

use crate::errors::FrontendError;
use crate::loader::{LoadedSession, ScriptSource};
use crate::script::{CoordinateSpace, PointerPhase, ScriptAction, SessionScript};

/// 导出目标与选项。
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub path: PathBuf,
    pub options: ExportOptions,
}

/// 回放统计。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub steps: usize,
    pub commands_failed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub stats: ReplayStats,
    pub frames: usize,
    pub shapes: usize,
    pub dimensions: usize,
    pub exported: Option<PathBuf>,
}

/// 把脚本逐步交给控制器；命令失败只记录警告，不中断回放。
pub fn replay(
    editor: &mut EditorController,
    script: &SessionScript,
    renderer: &mut DisplayList,
) -> ReplayStats {
    let bus = CommandBus::new();
    let mut space = CoordinateSpace::default();
    let mut stats = ReplayStats::default();

    for step in script.steps() {
        stats.steps += 1;
        let event = match &step.action {
            ScriptAction::Units(next) => {
                space = *next;
                continue;
            }
            ScriptAction::Command(request) => {
                let response = bus.dispatch(
                    request,
                    &mut CommandContext {
                        editor: &mut *editor,
                    },
                );
                let message = response.message.unwrap_or_default();
                if response.success {
                    println!("[命令] {}: {message}", request.name);
                    editor.render(renderer);
                } else {
                    stats.commands_failed += 1;
                    warn!(line = step.line, command = %request.name, "命令执行失败: {message}");
                }
                continue;
            }
            ScriptAction::Pointer {
                phase,
                x,
                y,
                button,
            } => {
                let raw = Point2::new(*x, *y);
                let position = match space {
                    CoordinateSpace::Device => raw,
                    CoordinateSpace::Logical => editor.viewport().to_device(raw),
                };
                match phase {
                    PointerPhase::Down => InputEvent::PointerDown {
                        position,
                        button: *button,
                    },
                    PointerPhase::Move => InputEvent::PointerMove { position },
                    PointerPhase::Up => InputEvent::PointerUp {
                        position,
                        button: *button,
                    },
                }
            }
            ScriptAction::Wheel(delta_y) => InputEvent::Wheel { delta_y: *delta_y },
            ScriptAction::Key(key) => InputEvent::Key(*key),
            ScriptAction::Resize { width, height } => InputEvent::Resize {
                width: *width,
                height: *height,
            },
        };
        let outcome = editor.dispatch(event, renderer);
        debug!(line = step.line, redraw = outcome.redraw, "脚本事件已处理");
    }
    stats
}

/// 回放会话、打印概览，并按需导出 DXF。
pub fn run_session(
    loaded: LoadedSession,
    export: Option<ExportRequest>,
) -> Result<SessionReport, FrontendError> {
    let LoadedSession {
        mut editor,
        script,
        source,
        seeded_from,
    } = loaded;

    let mut display = DisplayList::new();
    editor.render(&mut display);
    let stats = replay(&mut editor, &script, &mut display);
    let frames = display.frames();
    info!(
        steps = stats.steps,
        frames = frames,
        shapes = editor.scene().len(),
        "会话回放完成"
    );

    println!("DraftPad CLI 会话回放");
    match &source {
        ScriptSource::File(path) => println!("已从脚本回放：{}", path.display()),
        ScriptSource::Demo => println!("已回放内置示例脚本"),
    }
    if let Some((path, count)) = &seeded_from {
        println!("初始图形 {count} 个，来自 DXF：{}", path.display());
    }
    print_summary(&editor, &display, &stats);

    let exported = match export {
        Some(request) => {
            export_scene(&editor, &request)?;
            println!("已导出 DXF：{}", request.path.display());
            Some(request.path)
        }
        None => None,
    };

    Ok(SessionReport {
        stats,
        frames: display.frames(),
        shapes: editor.scene().len(),
        dimensions: editor.scene().dimensions().len(),
        exported,
    })
}

/// 以场景的逻辑坐标写出 DXF，目标目录不存在时先创建。
pub fn export_scene(
    editor: &EditorController,
    request: &ExportRequest,
) -> Result<(), FrontendError> {
    ensure_parent(&request.path)?;
    let scene = editor.scene();
    let document = export_document(scene.shapes(), scene.dimensions(), &request.options);
    DxfFacade::new().save(&document, &request.path)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), IoError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| IoError::WriteError {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn print_summary(editor: &EditorController, display: &DisplayList, stats: &ReplayStats) {
    let viewport = editor.viewport();
    let scene = editor.scene();

    println!(
        "回放 {} 步，渲染 {} 帧，最后一帧 {} 个图元",
        stats.steps,
        display.frames(),
        display.primitives().len()
    );
    if stats.commands_failed > 0 {
        println!("其中 {} 条命令执行失败", stats.commands_failed);
    }
    let pan = viewport.pan_offset();
    println!(
        "视口缩放={:.3}, 平移=({:.2}, {:.2})",
        viewport.zoom(),
        pan.x(),
        pan.y()
    );
    match editor.cursor_logical() {
        Some(cursor) => println!("光标逻辑坐标=({:.0}, {:.0})", cursor.x(), cursor.y()),
        None => println!("光标尚未进入画布"),
    }
    match editor.active_tool() {
        Some(tool) => println!("当前工具：{}", tool.name()),
        None => println!("当前工具：无"),
    }

    if scene.is_empty() {
        println!("图纸中尚无图形。");
    } else {
        println!("当前图形：");
    }
    for shape in scene.shapes() {
        let id = shape.id().get();
        match shape.geometry() {
            Geometry::Point(point) => println!(
                "  - 点 #{id}, 坐标=({:.2}, {:.2})",
                point.position.x(),
                point.position.y()
            ),
            Geometry::Line(line) => println!(
                "  - 线段 #{id}, 起点=({:.2}, {:.2}), 终点=({:.2}, {:.2}), 长度={:.2}",
                line.start().x(),
                line.start().y(),
                line.end().x(),
                line.end().y(),
                line.length()
            ),
            Geometry::Circle(circle) => println!(
                "  - 圆 #{id}, 圆心=({:.2}, {:.2}), 半径={:.2}",
                circle.center().x(),
                circle.center().y(),
                circle.radius()
            ),
        }
    }

    if !scene.dimensions().is_empty() {
        println!("尺寸标注：");
    }
    for dimension in scene.dimensions() {
        println!(
            "  - {}, ({:.2}, {:.2}) 至 ({:.2}, {:.2}), 角度={:.1}°",
            dimension.label_text(),
            dimension.start.x(),
            dimension.start.y(),
            dimension.end.x(),
            dimension.end.y(),
            dimension.angle_degrees
        );
    }
}

#[cfg(test)]
mod tests {
    use draftpad_config::AppConfig;
    use draftpad_core::shape::ShapeKind;
    use draftpad_io::DxfEntity;

    use super::*;
    use crate::loader::{DEMO_SCRIPT, SessionOverrides, editor_settings, load_session};

    fn demo_editor() -> (EditorController, DisplayList, ReplayStats) {
        let mut editor =
            EditorController::new(editor_settings(&AppConfig::default())).expect("valid settings");
        let script = SessionScript::parse(DEMO_SCRIPT).expect("demo parses");
        let mut display = DisplayList::new();
        let stats = replay(&mut editor, &script, &mut display);
        (editor, display, stats)
    }

    #[test]
    fn demo_script_draws_expected_scene() {
        let (editor, display, stats) = demo_editor();
        assert_eq!(stats.commands_failed, 0);
        let kinds: Vec<ShapeKind> = editor.scene().shapes().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![ShapeKind::Line, ShapeKind::Circle, ShapeKind::Point, ShapeKind::Point]
        );
        assert_eq!(editor.scene().shapes()[1].radius(), Some(8.0));

        let dimensions = editor.scene().dimensions();
        assert_eq!(dimensions.len(), 1);
        assert_eq!(dimensions[0].label_text(), "20.00mm");
        assert_eq!(editor.active_tool(), None);
        assert!(display.frames() > 0);
    }

    #[test]
    fn device_coordinates_are_used_by_default() {
        let mut editor =
            EditorController::new(editor_settings(&AppConfig::default())).expect("valid settings");
        let script = SessionScript::parse("key 3\ndown 675 325\nup 675 325\n").expect("parses");
        let mut display = DisplayList::new();
        replay(&mut editor, &script, &mut display);
        assert_eq!(editor.scene().shapes()[0].origin(), Point2::new(10.0, 10.0));
    }

    #[test]
    fn failed_commands_are_counted() {
        let mut editor =
            EditorController::new(editor_settings(&AppConfig::default())).expect("valid settings");
        let script = SessionScript::parse("command remove_shape 999999\ncommand center_view\n")
            .expect("parses");
        let mut display = DisplayList::new();
        let stats = replay(&mut editor, &script, &mut display);
        assert_eq!(stats.steps, 2);
        assert_eq!(stats.commands_failed, 1);
        assert_eq!(display.frames(), 1);
    }

    #[test]
    fn run_session_exports_with_dimensions() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("out").join("demo.dxf");
        let loaded =
            load_session(&AppConfig::default(), &SessionOverrides::default()).expect("loads");
        let request = ExportRequest {
            path: path.clone(),
            options: ExportOptions {
                include_dimensions: true,
            },
        };
        let report = run_session(loaded, Some(request)).expect("session runs");
        assert_eq!(report.shapes, 4);
        assert_eq!(report.dimensions, 1);
        assert_eq!(report.exported.as_deref(), Some(path.as_path()));

        let document = DxfFacade::new().load(&path).expect("exported file loads");
        assert_eq!(document.len(), 7);
        assert!(matches!(
            document.entities()[0],
            DxfEntity::Line { ref start, ref end, .. }
                if *start == Point2::new(0.0, 0.0) && *end == Point2::new(20.0, 0.0)
        ));
        assert_eq!(document.shapes().len(), 4);
    }
}
