use draftpad_core::geometry::{Point2, Vector2};
use tracing::debug;

use crate::errors::EngineError;

pub const DEFAULT_ZOOM: f64 = 3.5;
pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 1_000.0;
pub const ZOOM_INTENSITY: f64 = 0.02;

/// 视口的可配置参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSettings {
    pub default_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_intensity: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            default_zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_intensity: ZOOM_INTENSITY,
            canvas_width: 1280.0,
            canvas_height: 720.0,
        }
    }
}

impl ViewportSettings {
    fn validate(&self) -> Result<(), EngineError> {
        let finite = [
            self.default_zoom,
            self.min_zoom,
            self.max_zoom,
            self.zoom_intensity,
            self.canvas_width,
            self.canvas_height,
        ]
        .iter()
        .all(|value| value.is_finite());
        if !finite {
            return Err(EngineError::invalid_viewport("视口参数必须为有限数值"));
        }
        if self.min_zoom <= 0.0 || self.min_zoom > self.max_zoom {
            return Err(EngineError::invalid_viewport(format!(
                "缩放范围无效: [{}, {}]",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.default_zoom) {
            return Err(EngineError::invalid_viewport(format!(
                "默认缩放 {} 不在 [{}, {}] 内",
                self.default_zoom, self.min_zoom, self.max_zoom
            )));
        }
        if self.zoom_intensity <= 0.0 {
            return Err(EngineError::invalid_viewport("缩放强度必须为正数"));
        }
        if self.canvas_width < 0.0 || self.canvas_height < 0.0 {
            return Err(EngineError::invalid_viewport("画布尺寸不能为负"));
        }
        Ok(())
    }
}

/// 设备坐标（像素，y 向下）与逻辑坐标（绘图单位，y 向上）之间的双向映射。
///
/// 逻辑坐标在 [`ViewportTransform::to_logical`] 中取整，绘图单位始终为整数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    zoom: f64,
    pan_offset: Vector2,
    canvas_width: f64,
    canvas_height: f64,
    settings: ViewportSettings,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        let settings = ViewportSettings::default();
        let mut viewport = Self {
            zoom: settings.default_zoom,
            pan_offset: Vector2::new(0.0, 0.0),
            canvas_width: settings.canvas_width,
            canvas_height: settings.canvas_height,
            settings,
        };
        viewport.reset();
        viewport
    }
}

impl ViewportTransform {
    pub fn new(settings: ViewportSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        let mut viewport = Self {
            zoom: settings.default_zoom,
            pan_offset: Vector2::new(0.0, 0.0),
            canvas_width: settings.canvas_width,
            canvas_height: settings.canvas_height,
            settings,
        };
        viewport.reset();
        Ok(viewport)
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[inline]
    pub fn pan_offset(&self) -> Vector2 {
        self.pan_offset
    }

    #[inline]
    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    #[inline]
    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    #[inline]
    pub fn canvas_center(&self) -> Vector2 {
        Vector2::new(self.canvas_width / 2.0, self.canvas_height / 2.0)
    }

    /// 设备坐标转逻辑坐标，结果取整。
    pub fn to_logical(&self, device: Point2) -> Point2 {
        let x = ((device.x() - self.pan_offset.x()) / self.zoom).round();
        let y = -((device.y() - self.pan_offset.y()) / self.zoom).round();
        Point2::new(x, y)
    }

    pub fn to_device(&self, logical: Point2) -> Point2 {
        Point2::new(
            logical.x() * self.zoom + self.pan_offset.x(),
            -logical.y() * self.zoom + self.pan_offset.y(),
        )
    }

    /// 逻辑长度换算为像素长度。
    #[inline]
    pub fn scale_length(&self, logical: f64) -> f64 {
        logical * self.zoom
    }

    /// 设置缩放倍数（自动限制在合法范围内）。
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.settings.min_zoom, self.settings.max_zoom);
        }
    }

    /// 按滚轮方向缩放：`delta_y < 0` 放大，`delta_y > 0` 缩小，0 忽略。返回缩放是否发生变化。
    pub fn zoom_by_wheel(&mut self, delta_y: f64) -> bool {
        if delta_y == 0.0 || delta_y.is_nan() {
            return false;
        }
        let direction = if delta_y < 0.0 { 1.0 } else { -1.0 };
        let before = self.zoom;
        self.set_zoom(before * (direction * self.settings.zoom_intensity).exp());
        debug!(before, after = self.zoom, "视口缩放");
        self.zoom != before
    }

    /// 平移手势期间直接累加像素增量。
    pub fn pan_by(&mut self, delta: Vector2) {
        self.pan_offset = Vector2::from(self.pan_offset.as_vec2() + delta.as_vec2());
    }

    /// 回到画布中心并恢复默认缩放。
    pub fn reset(&mut self) {
        self.pan_offset = self.canvas_center();
        self.zoom = self.settings.default_zoom;
    }

    /// 画布尺寸变化时重新居中，缩放保持不变。
    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas_width = width.max(0.0);
        self.canvas_height = height.max(0.0);
        self.pan_offset = self.canvas_center();
    }
}
