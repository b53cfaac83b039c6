
use std::path::PathBuf;

use glam::DVec2;

use draftpad_core::dimension::compute_dimension;
use draftpad_core::geometry::Point2;
use draftpad_core::shape::{Shape, ShapeKind};
use draftpad_engine::controller::{EditorController, EditorSettings, InputEvent, PointerButton};
use draftpad_io::{DIMENSION_LAYER, DxfEntity, DxfFacade, ExportOptions, IoError, export_document};
use golden::assert_golden;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

fn sample_shapes() -> Vec<Shape> {
    vec![
        Shape::point(Point2::new(1.0, 2.0)),
        Shape::line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)),
        Shape::circle(Point2::new(-3.0, 4.0), 2.5),
    ]
}

#[test]
fn load_basic_shapes_matches_expected_document() {
    let loader = DxfFacade::new();
    let doc = loader.load(&fixture("basic_shapes.dxf")).expect("读取 DXF 失败");
    assert_golden("basic_shapes", &doc);

    let shapes = doc.shapes();
    let kinds: Vec<ShapeKind> = shapes.iter().map(Shape::kind).collect();
    assert_eq!(kinds, vec![ShapeKind::Line, ShapeKind::Circle, ShapeKind::Point]);
    assert_eq!(shapes[1].radius(), Some(40.0));
}

#[test]
fn annotated_export_matches_golden() {
    let dimensions = vec![compute_dimension(0.0, 0.0, 10.0, 0.0)];
    let options = ExportOptions {
        include_dimensions: true,
    };
    let doc = export_document(&sample_shapes(), &dimensions, &options);
    assert_golden("annotated_export", &doc);
}

#[test]
fn save_then_load_preserves_entities() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("drawing.dxf");
    let dimensions = vec![compute_dimension(-2.0, 1.0, 6.0, 7.0)];
    let options = ExportOptions {
        include_dimensions: true,
    };
    let document = export_document(&sample_shapes(), &dimensions, &options);

    let facade = DxfFacade::new();
    facade.save(&document, &path).expect("写出 DXF 失败");
    let loaded = facade.load(&path).expect("读取 DXF 失败");

    assert_eq!(loaded, document);
    let dimension_lines = loaded
        .entities()
        .iter()
        .filter(|entity| entity.layer() == DIMENSION_LAYER)
        .count();
    assert_eq!(dimension_lines, 3);
    // 标注图层不会回到场景
    assert_eq!(loaded.shapes(), sample_shapes());
}

#[test]
fn export_is_independent_of_view_state() {
    let mut editor =
        EditorController::new(EditorSettings::default()).expect("默认视口设置应当有效");
    editor
        .scene_mut()
        .add_shape(&Shape::line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)));
    editor
        .scene_mut()
        .add_shape(&Shape::circle(Point2::new(0.0, 0.0), 5.0));
    let before = export_document(editor.scene().shapes(), &[], &ExportOptions::default());

    // 中键拖动平移，再滚轮缩放几次
    for (from, to) in [((100.0, 100.0), (340.0, 20.0)), ((500.0, 400.0), (120.0, 610.0))] {
        editor.handle_event(InputEvent::PointerDown {
            position: Point2::new(from.0, from.1),
            button: PointerButton::Middle,
        });
        editor.handle_event(InputEvent::PointerMove {
            position: Point2::new(to.0, to.1),
        });
        editor.handle_event(InputEvent::PointerUp {
            position: Point2::new(to.0, to.1),
            button: PointerButton::Middle,
        });
    }
    for delta_y in [-120.0, -120.0, -120.0, 120.0] {
        editor.handle_event(InputEvent::Wheel { delta_y });
    }
    let default_zoom = EditorSettings::default().viewport.default_zoom;
    assert_ne!(editor.viewport().zoom(), default_zoom);
    assert_ne!(editor.viewport().pan_offset(), editor.viewport().canvas_center());

    let doc = export_document(editor.scene().shapes(), &[], &ExportOptions::default());
    assert_eq!(doc, before);
    assert_eq!(doc.len(), 2);
    match &doc.entities()[0] {
        DxfEntity::Line { start, end, .. } => {
            assert_eq!(start.as_vec2(), DVec2::new(0.0, 0.0));
            assert_eq!(end.as_vec2(), DVec2::new(10.0, 0.0));
        }
        other => panic!("期望 LINE，得到 {other:?}"),
    }
    match &doc.entities()[1] {
        DxfEntity::Circle { center, radius, .. } => {
            assert_eq!(center.as_vec2(), DVec2::ZERO);
            assert_eq!(*radius, 5.0);
        }
        other => panic!("期望 CIRCLE，得到 {other:?}"),
    }

    let text = doc.stringify();
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let line_at = lines.iter().position(|l| *l == "LINE").expect("LINE 实体");
    assert_eq!(
        &lines[line_at + 1..line_at + 13],
        ["8", "0", "10", "0", "20", "0", "30", "0", "11", "10", "21", "0"]
    );
    let circle_at = lines.iter().position(|l| *l == "CIRCLE").expect("CIRCLE 实体");
    assert_eq!(
        &lines[circle_at + 1..circle_at + 11],
        ["8", "0", "10", "0", "20", "0", "30", "0", "40", "5"]
    );
}

#[test]
fn missing_file_reports_read_error() {
    let loader = DxfFacade::new();
    let err = loader
        .load(&fixture("does_not_exist.dxf"))
        .expect_err("缺失文件应当报错");
    assert!(matches!(err, IoError::ReadError { .. }));
}

#[test]
fn save_into_missing_directory_reports_write_error() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("missing").join("drawing.dxf");
    let document = export_document(&sample_shapes(), &[], &ExportOptions::default());
    let err = DxfFacade::new()
        .save(&document, &path)
        .expect_err("目录不存在时写出应失败");
    assert!(matches!(err, IoError::WriteError { .. }));
}
