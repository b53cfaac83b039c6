pub mod command;
pub mod controller;
pub mod render;
pub mod tool;
pub mod viewport;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("视口参数无效: {message}")]
        InvalidViewport { message: String },
        #[error("未知工具: {0}")]
        UnknownTool(String),
        #[error("命令 {command} 参数无效: {message}")]
        InvalidArgument { command: String, message: String },
        #[error("图形 {0} 不存在")]
        ShapeNotFound(u64),
    }

    impl EngineError {
        pub(crate) fn invalid_viewport(message: impl Into<String>) -> Self {
            Self::InvalidViewport {
                message: message.into(),
            }
        }

        pub(crate) fn invalid_argument(
            command: impl Into<String>,
            message: impl Into<String>,
        ) -> Self {
            Self::InvalidArgument {
                command: command.into(),
                message: message.into(),
            }
        }
    }
}

pub mod scene {
    use draftpad_core::dimension::Dimension;
    use draftpad_core::geometry::{Bounds2D, Point2};
    use draftpad_core::shape::{PointHitMode, Shape, ShapeId};
    use tracing::debug;

    use crate::viewport::ViewportTransform;

    /// 悬停测试的过滤条件。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum HitFilter {
        Any,
        /// 只返回点图形，供尺寸标注工具取点。
        PointsOnly,
    }

    /// 图纸内容：已提交图形（插入顺序即绘制顺序）、一个预览图形以及尺寸标注。
    ///
    /// 所有存入的图形都是调用方实例的副本，彼此之间不共享可变状态。
    #[derive(Debug, Default)]
    pub struct SceneStore {
        shapes: Vec<Shape>,
        preview: Option<Shape>,
        dimensions: Vec<Dimension>,
        point_hit_mode: PointHitMode,
        redraw_requested: bool,
    }

    impl SceneStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_point_hit_mode(point_hit_mode: PointHitMode) -> Self {
            Self {
                point_hit_mode,
                ..Self::default()
            }
        }

        #[inline]
        pub fn point_hit_mode(&self) -> PointHitMode {
            self.point_hit_mode
        }

        #[inline]
        pub fn set_point_hit_mode(&mut self, mode: PointHitMode) {
            self.point_hit_mode = mode;
        }

        /// 提交图形副本。若为点且已存在坐标完全相同的点，则静默忽略并返回 `None`。
        pub fn add_shape(&mut self, shape: &Shape) -> Option<ShapeId> {
            if shape.is_point() && self.has_point_at(shape.origin()) {
                debug!(
                    x = shape.origin().x(),
                    y = shape.origin().y(),
                    "重复点已忽略"
                );
                return None;
            }
            let stored = shape.copy();
            let id = stored.id();
            debug!(id = id.get(), kind = stored.kind().describe(), "图形已提交");
            self.shapes.push(stored);
            self.request_redraw();
            Some(id)
        }

        fn has_point_at(&self, origin: Point2) -> bool {
            self.shapes
                .iter()
                .any(|existing| existing.is_point() && existing.origin() == origin)
        }

        /// 删除指定图形，返回是否确实删除；不存在时为空操作。
        pub fn remove_shape(&mut self, id: ShapeId) -> bool {
            let before = self.shapes.len();
            self.shapes.retain(|shape| shape.id() != id);
            let removed = self.shapes.len() != before;
            if removed {
                debug!(id = id.get(), "图形已删除");
                self.request_redraw();
            }
            removed
        }

        #[inline]
        pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
            self.shapes.iter().find(|shape| shape.id() == id)
        }

        #[inline]
        pub fn shapes(&self) -> &[Shape] {
            &self.shapes
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.shapes.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.shapes.is_empty()
        }

        /// 所有已提交图形的深拷贝（全新标识），导出后再修改场景不会影响已导出的文档。
        pub fn copy_shapes(&self) -> Vec<Shape> {
            self.shapes.iter().map(Shape::copy).collect()
        }

        /// 替换预览图形；传入 `None` 清除预览。
        pub fn set_preview_shape(&mut self, shape: Option<&Shape>) {
            self.preview = shape.cloned();
            self.request_redraw();
        }

        #[inline]
        pub fn preview(&self) -> Option<&Shape> {
            self.preview.as_ref()
        }

        /// 把设备坐标换算为逻辑坐标后，按存储顺序返回第一个命中的图形。
        pub fn hover_test(
            &self,
            device: Point2,
            viewport: &ViewportTransform,
            filter: HitFilter,
        ) -> Option<&Shape> {
            let logical = viewport.to_logical(device);
            self.shape_at(logical, filter)
        }

        /// 逻辑坐标下的命中查询，先命中者优先，不做 z 序重排。
        pub fn shape_at(&self, logical: Point2, filter: HitFilter) -> Option<&Shape> {
            self.shapes.iter().find(|shape| {
                let accepted = match filter {
                    HitFilter::Any => true,
                    HitFilter::PointsOnly => shape.is_point(),
                };
                accepted && shape.is_hovered_with(logical, self.point_hit_mode)
            })
        }

        /// 追加尺寸标注；零尺寸哨兵不会被存储。
        pub fn add_dimension(&mut self, dimension: Dimension) -> bool {
            if dimension.is_zero() {
                debug!("零长度尺寸已忽略");
                return false;
            }
            debug!(
                length = dimension.length,
                angle = dimension.angle_degrees,
                "尺寸标注已添加"
            );
            self.dimensions.push(dimension);
            self.request_redraw();
            true
        }

        #[inline]
        pub fn dimensions(&self) -> &[Dimension] {
            &self.dimensions
        }

        pub fn clear_dimensions(&mut self) {
            if !self.dimensions.is_empty() {
                self.dimensions.clear();
                self.request_redraw();
            }
        }

        /// 清空图形、预览与标注。
        pub fn clear(&mut self) {
            self.shapes.clear();
            self.preview = None;
            self.dimensions.clear();
            self.request_redraw();
        }

        /// 已提交图形的整体范围。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            for shape in &self.shapes {
                bounds.include_bounds(&shape.bounds());
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        #[inline]
        fn request_redraw(&mut self) {
            self.redraw_requested = true;
        }

        /// 读取并清除重绘请求。
        pub fn take_redraw_request(&mut self) -> bool {
            std::mem::take(&mut self.redraw_requested)
        }
    }

}
