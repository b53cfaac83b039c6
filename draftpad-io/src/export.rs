//! 场景图形到 DXF 实体流的写出。坐标按逻辑坐标原样写出，与视口无关。

use std::collections::BTreeSet;

use draftpad_core::dimension::Dimension;
use draftpad_core::geometry::Point2;
use draftpad_core::shape::{Geometry, Shape};
use serde::{Deserialize, Serialize};

/// 图形所在的默认图层。
pub const DEFAULT_LAYER: &str = "0";
/// 导出尺寸标注时使用的派生图层，读取时会被跳过。
pub const DIMENSION_LAYER: &str = "DIMENSIONS";
/// `$INSUNITS` 中毫米对应的取值。
pub const INSUNITS_MILLIMETERS: i16 = 4;

/// 实体写出接口，按种类逐个接收图形。
pub trait EntitySink {
    fn add_point(&mut self, layer: &str, position: Point2);
    fn add_line(&mut self, layer: &str, start: Point2, end: Point2);
    fn add_circle(&mut self, layer: &str, center: Point2, radius: f64);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum DxfEntity {
    Point {
        layer: String,
        position: Point2,
    },
    Line {
        layer: String,
        start: Point2,
        end: Point2,
    },
    Circle {
        layer: String,
        center: Point2,
        radius: f64,
    },
}

impl DxfEntity {
    pub fn layer(&self) -> &str {
        match self {
            DxfEntity::Point { layer, .. }
            | DxfEntity::Line { layer, .. }
            | DxfEntity::Circle { layer, .. } => layer,
        }
    }

    /// DXF 实体类型名。
    pub fn kind(&self) -> &'static str {
        match self {
            DxfEntity::Point { .. } => "POINT",
            DxfEntity::Line { .. } => "LINE",
            DxfEntity::Circle { .. } => "CIRCLE",
        }
    }

    pub fn to_shape(&self) -> Shape {
        match self {
            DxfEntity::Point { position, .. } => Shape::point(*position),
            DxfEntity::Line { start, end, .. } => Shape::line(*start, *end),
            DxfEntity::Circle { center, radius, .. } => Shape::circle(*center, *radius),
        }
    }
}

/// 导出选项。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// 为每个尺寸标注额外写出三条 LINE（两条尺寸界线与尺寸线）。
    pub include_dimensions: bool,
}

/// 内存中的 DXF 文档：单位与有序实体列表。
#[derive(Debug, Clone, PartialEq)]
pub struct DxfDocument {
    units: i16,
    entities: Vec<DxfEntity>,
}

impl Default for DxfDocument {
    fn default() -> Self {
        Self {
            units: INSUNITS_MILLIMETERS,
            entities: Vec::new(),
        }
    }
}

impl DxfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$INSUNITS` 值。
    #[inline]
    pub fn units(&self) -> i16 {
        self.units
    }

    #[inline]
    pub fn is_millimeters(&self) -> bool {
        self.units == INSUNITS_MILLIMETERS
    }

    pub(crate) fn set_units(&mut self, units: i16) {
        self.units = units;
    }

    #[inline]
    pub fn entities(&self) -> &[DxfEntity] {
        &self.entities
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub(crate) fn push(&mut self, entity: DxfEntity) {
        self.entities.push(entity);
    }

    /// 文档中用到的图层，始终包含默认图层。
    pub fn layers(&self) -> Vec<&str> {
        let mut layers: BTreeSet<&str> = self.entities.iter().map(DxfEntity::layer).collect();
        layers.insert(DEFAULT_LAYER);
        layers.into_iter().collect()
    }

    /// 还原为场景图形（全新标识），派生的标注图层不参与。
    pub fn shapes(&self) -> Vec<Shape> {
        self.entities
            .iter()
            .filter(|entity| entity.layer() != DIMENSION_LAYER)
            .map(DxfEntity::to_shape)
            .collect()
    }

    /// 生成 HEADER、TABLES、ENTITIES 三段与 EOF 组成的 ASCII DXF 文本。
    pub fn stringify(&self) -> String {
        let mut out = PairWriter::default();

        out.section("HEADER");
        out.pair(9, "$INSUNITS");
        out.pair(70, self.units);
        out.end_section();

        let layers = self.layers();
        out.section("TABLES");
        out.pair(0, "TABLE");
        out.pair(2, "LAYER");
        out.pair(70, layers.len());
        for layer in layers {
            out.pair(0, "LAYER");
            out.pair(2, layer);
            out.pair(70, 0);
            out.pair(62, 7);
            out.pair(6, "CONTINUOUS");
        }
        out.pair(0, "ENDTAB");
        out.end_section();

        out.section("ENTITIES");
        for entity in &self.entities {
            out.pair(0, entity.kind());
            out.pair(8, entity.layer());
            match entity {
                DxfEntity::Point { position, .. } => out.point(0, *position),
                DxfEntity::Line { start, end, .. } => {
                    out.point(0, *start);
                    out.point(1, *end);
                }
                DxfEntity::Circle { center, radius, .. } => {
                    out.point(0, *center);
                    out.pair(40, radius);
                }
            }
        }
        out.end_section();
        out.pair(0, "EOF");
        out.finish()
    }
}

impl EntitySink for DxfDocument {
    fn add_point(&mut self, layer: &str, position: Point2) {
        self.push(DxfEntity::Point {
            layer: layer.to_string(),
            position,
        });
    }

    fn add_line(&mut self, layer: &str, start: Point2, end: Point2) {
        self.push(DxfEntity::Line {
            layer: layer.to_string(),
            start,
            end,
        });
    }

    fn add_circle(&mut self, layer: &str, center: Point2, radius: f64) {
        self.push(DxfEntity::Circle {
            layer: layer.to_string(),
            center,
            radius,
        });
    }
}

#[derive(Default)]
struct PairWriter {
    buffer: String,
}

impl PairWriter {
    fn pair(&mut self, code: i32, value: impl std::fmt::Display) {
        self.buffer.push_str(&format!("{code:>3}\n{value}\n"));
    }

    /// 以 `10 + offset`、`20 + offset`、`30 + offset` 写出二维点，Z 固定为 0。
    fn point(&mut self, offset: i32, point: Point2) {
        self.pair(10 + offset, point.x());
        self.pair(20 + offset, point.y());
        self.pair(30 + offset, 0.0);
    }

    fn section(&mut self, name: &str) {
        self.pair(0, "SECTION");
        self.pair(2, name);
    }

    fn end_section(&mut self) {
        self.pair(0, "ENDSEC");
    }

    fn finish(self) -> String {
        self.buffer
    }
}

/// 按存储顺序把图形（以及可选的尺寸标注）写入任意实体接收端。
pub fn write_entities<S: EntitySink + ?Sized>(
    sink: &mut S,
    shapes: &[Shape],
    dimensions: &[Dimension],
    options: &ExportOptions,
) {
    for shape in shapes {
        match shape.geometry() {
            Geometry::Point(point) => sink.add_point(DEFAULT_LAYER, point.position),
            Geometry::Line(line) => sink.add_line(DEFAULT_LAYER, line.start(), line.end()),
            Geometry::Circle(circle) => {
                sink.add_circle(DEFAULT_LAYER, circle.center(), circle.radius())
            }
        }
    }
    if !options.include_dimensions {
        return;
    }
    for dimension in dimensions.iter().filter(|dimension| !dimension.is_zero()) {
        let lines = dimension.witness_lines();
        for (start, end) in [lines.start, lines.end, lines.dimension_line] {
            sink.add_line(DIMENSION_LAYER, start, end);
        }
    }
}

pub fn export_document(
    shapes: &[Shape],
    dimensions: &[Dimension],
    options: &ExportOptions,
) -> DxfDocument {
    let mut document = DxfDocument::new();
    write_entities(&mut document, shapes, dimensions, options);
    document
}
