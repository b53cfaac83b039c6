//! 渲染协作者接口。核心只交出“图形 + 变换”，像素如何落地由实现者决定。

use draftpad_core::dimension::{Dimension, offset_point};
use draftpad_core::geometry::{Point2, Vector2};
use draftpad_core::shape::{Geometry, Shape};

use crate::scene::SceneStore;
use crate::viewport::ViewportTransform;

/// 网格间距（逻辑单位）。
pub const GRID_SPACING: f64 = 5.0;
/// 点与端点标记的像素半径。
pub const MARKER_RADIUS: f64 = 2.0;
/// 原点标记的像素半径。
pub const ORIGIN_MARKER_RADIUS: f64 = 5.0;
/// 标注文字相对锚点的像素偏移。
pub const LABEL_OFFSET: (f64, f64) = (-10.0, -15.0);

/// 一次重绘所需的全部只读数据。
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub viewport: &'a ViewportTransform,
    pub shapes: &'a [Shape],
    pub preview: Option<&'a Shape>,
    pub dimensions: &'a [Dimension],
}

impl<'a> Frame<'a> {
    pub fn new(scene: &'a SceneStore, viewport: &'a ViewportTransform) -> Self {
        Self {
            viewport,
            shapes: scene.shapes(),
            preview: scene.preview(),
            dimensions: scene.dimensions(),
        }
    }
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Grid,
    Origin,
    Shape,
    Preview,
    Dimension,
}

/// 设备坐标下的绘制指令。
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Segment {
        from: Point2,
        to: Point2,
        style: Style,
    },
    Circle {
        center: Point2,
        radius: f64,
        style: Style,
    },
    Marker {
        center: Point2,
        radius: f64,
        style: Style,
    },
    Label {
        position: Point2,
        text: String,
        style: Style,
    },
}

impl Primitive {
    pub fn style(&self) -> Style {
        match self {
            Primitive::Segment { style, .. }
            | Primitive::Circle { style, .. }
            | Primitive::Marker { style, .. }
            | Primitive::Label { style, .. } => *style,
        }
    }
}

/// 把每帧记录为一组设备坐标图元的渲染器，CLI 与测试都使用它。
///
/// 绘制顺序：网格、已提交图形、预览、尺寸标注。
#[derive(Debug, Default)]
pub struct DisplayList {
    primitives: Vec<Primitive>,
    frames: usize,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// 已渲染的帧数。
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn count_style(&self, style: Style) -> usize {
        self.primitives
            .iter()
            .filter(|primitive| primitive.style() == style)
            .count()
    }

    fn push_grid(&mut self, viewport: &ViewportTransform) {
        let spacing = viewport.scale_length(GRID_SPACING);
        let (width, height) = viewport.canvas_size();
        let pan = viewport.pan_offset();
        if spacing > 0.0 {
            let offset_x = pan.x() % spacing;
            let offset_y = pan.y() % spacing;
            let columns = (width / spacing).ceil() as usize;
            let rows = (height / spacing).ceil() as usize;
            for i in 0..columns {
                let x = i as f64 * spacing + offset_x;
                self.primitives.push(Primitive::Segment {
                    from: Point2::new(x, 0.0),
                    to: Point2::new(x, height),
                    style: Style::Grid,
                });
            }
            for i in 0..rows {
                let y = i as f64 * spacing + offset_y;
                self.primitives.push(Primitive::Segment {
                    from: Point2::new(0.0, y),
                    to: Point2::new(width, y),
                    style: Style::Grid,
                });
            }
        }
        self.primitives.push(Primitive::Marker {
            center: Point2::new(pan.x(), pan.y()),
            radius: ORIGIN_MARKER_RADIUS,
            style: Style::Origin,
        });
    }

    fn push_shape(&mut self, shape: &Shape, viewport: &ViewportTransform, style: Style) {
        match shape.geometry() {
            Geometry::Point(point) => self.primitives.push(Primitive::Marker {
                center: viewport.to_device(point.position),
                radius: MARKER_RADIUS,
                style,
            }),
            Geometry::Line(line) => {
                let from = viewport.to_device(line.start());
                let to = viewport.to_device(line.end());
                self.primitives.push(Primitive::Segment { from, to, style });
                for center in [from, to] {
                    self.primitives.push(Primitive::Marker {
                        center,
                        radius: MARKER_RADIUS,
                        style,
                    });
                }
            }
            Geometry::Circle(circle) => self.primitives.push(Primitive::Circle {
                center: viewport.to_device(circle.center()),
                radius: viewport.scale_length(circle.radius()),
                style,
            }),
        }
    }

    fn push_dimension(&mut self, dimension: &Dimension, viewport: &ViewportTransform) {
        let distance = viewport.scale_length(dimension.witness_offset());
        let witness_tip = |device: Point2| {
            let (x, y) = offset_point(device.x(), device.y(), dimension.angle_degrees, distance);
            Point2::new(x, y)
        };
        let start = viewport.to_device(dimension.start);
        let end = viewport.to_device(dimension.end);
        let start_tip = witness_tip(start);
        let end_tip = witness_tip(end);
        for (from, to) in [(start, start_tip), (end, end_tip), (start_tip, end_tip)] {
            self.primitives.push(Primitive::Segment {
                from,
                to,
                style: Style::Dimension,
            });
        }
        let anchor = viewport.to_device(dimension.label_anchor);
        self.primitives.push(Primitive::Label {
            position: anchor.translate(Vector2::new(LABEL_OFFSET.0, LABEL_OFFSET.1)),
            text: dimension.label_text(),
            style: Style::Dimension,
        });
    }
}

impl Renderer for DisplayList {
    fn render(&mut self, frame: &Frame<'_>) {
        self.primitives.clear();
        self.push_grid(frame.viewport);
        for shape in frame.shapes {
            self.push_shape(shape, frame.viewport, Style::Shape);
        }
        if let Some(preview) = frame.preview {
            self.push_shape(preview, frame.viewport, Style::Preview);
        }
        for dimension in frame.dimensions {
            self.push_dimension(dimension, frame.viewport);
        }
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use draftpad_core::dimension::compute_dimension;

    use super::*;
    use crate::viewport::ViewportSettings;

    fn small_viewport() -> ViewportTransform {
        ViewportTransform::new(ViewportSettings {
            canvas_width: 100.0,
            canvas_height: 50.0,
            default_zoom: 5.0,
            ..ViewportSettings::default()
        })
        .expect("valid settings")
    }

    fn close(a: Point2, b: Point2) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn grid_follows_zoom_and_pan() {
        let viewport = small_viewport();
        let scene = SceneStore::new();
        let mut list = DisplayList::new();
        list.render(&Frame::new(&scene, &viewport));

        // 间距 25 像素：100/25 = 4 列，50/25 = 2 行
        assert_eq!(list.count_style(Style::Grid), 6);
        assert_eq!(list.count_style(Style::Origin), 1);
        assert_eq!(list.frames(), 1);
        match &list.primitives()[0] {
            Primitive::Segment { from, .. } => assert!((from.x() - 0.0).abs() < 1e-9),
            other => panic!("unexpected primitive: {other:?}"),
        }
    }

    #[test]
    fn shapes_render_in_store_order_then_preview() {
        let viewport = small_viewport();
        let mut scene = SceneStore::new();
        scene.add_shape(&Shape::line(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)));
        scene.add_shape(&Shape::circle(Point2::new(0.0, 0.0), 3.0));
        scene.set_preview_shape(Some(&Shape::point(Point2::new(1.0, 1.0))));

        let mut list = DisplayList::new();
        list.render(&Frame::new(&scene, &viewport));
        let drawn: Vec<&Primitive> = list
            .primitives()
            .iter()
            .filter(|p| !matches!(p.style(), Style::Grid | Style::Origin))
            .collect();

        assert_eq!(drawn.len(), 5);
        assert_eq!(
            drawn[0],
            &Primitive::Segment {
                from: Point2::new(50.0, 25.0),
                to: Point2::new(60.0, 25.0),
                style: Style::Shape,
            }
        );
        assert!(matches!(drawn[1], Primitive::Marker { style: Style::Shape, .. }));
        assert!(matches!(drawn[2], Primitive::Marker { style: Style::Shape, .. }));
        assert_eq!(
            drawn[3],
            &Primitive::Circle {
                center: Point2::new(50.0, 25.0),
                radius: 15.0,
                style: Style::Shape,
            }
        );
        assert_eq!(
            drawn[4],
            &Primitive::Marker {
                center: Point2::new(55.0, 20.0),
                radius: MARKER_RADIUS,
                style: Style::Preview,
            }
        );
    }

    #[test]
    fn dimension_witness_lines_match_logical_geometry() {
        let mut viewport = small_viewport();
        viewport.pan_by(Vector2::new(7.0, -3.0));
        let mut scene = SceneStore::new();
        let dimension = compute_dimension(-2.0, 1.0, 6.0, 7.0);
        scene.add_dimension(dimension);

        let mut list = DisplayList::new();
        list.render(&Frame::new(&scene, &viewport));
        let segments: Vec<(Point2, Point2)> = list
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Segment {
                    from,
                    to,
                    style: Style::Dimension,
                } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(segments.len(), 3);

        let logical = dimension.witness_lines();
        assert!(close(segments[0].1, viewport.to_device(logical.start.1)));
        assert!(close(segments[1].1, viewport.to_device(logical.end.1)));
        assert!(close(segments[2].0, viewport.to_device(logical.dimension_line.0)));

        let label = list
            .primitives()
            .iter()
            .find_map(|p| match p {
                Primitive::Label { position, text, .. } => Some((*position, text.clone())),
                _ => None,
            })
            .expect("label is drawn");
        assert_eq!(label.1, "10.00mm");
        let anchor = viewport.to_device(Point2::new(2.0, 4.0));
        assert!(close(label.0, Point2::new(anchor.x() - 10.0, anchor.y() - 15.0)));
    }

    #[test]
    fn witness_length_scales_with_zoom() {
        let mut scene = SceneStore::new();
        scene.add_dimension(compute_dimension(0.0, 0.0, 10.0, 0.0));

        for zoom in [5.0, 20.0] {
            let mut viewport = small_viewport();
            viewport.set_zoom(zoom);
            let mut list = DisplayList::new();
            list.render(&Frame::new(&scene, &viewport));
            let (from, to) = list
                .primitives()
                .iter()
                .find_map(|p| match p {
                    Primitive::Segment {
                        from,
                        to,
                        style: Style::Dimension,
                    } => Some((*from, *to)),
                    _ => None,
                })
                .expect("witness line is drawn");
            // 长度 10 的 1/5 为 2 个逻辑单位
            assert!((from.distance(to) - 2.0 * zoom).abs() < 1e-9);
        }
    }

    #[test]
    fn each_render_replaces_previous_frame() {
        let viewport = small_viewport();
        let mut scene = SceneStore::new();
        let mut list = DisplayList::new();
        list.render(&Frame::new(&scene, &viewport));
        let empty = list.primitives().len();

        scene.add_shape(&Shape::point(Point2::new(0.0, 0.0)));
        list.render(&Frame::new(&scene, &viewport));
        assert_eq!(list.primitives().len(), empty + 1);
        assert_eq!(list.frames(), 2);
    }
}
