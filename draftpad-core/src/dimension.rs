//! 线性尺寸标注：由两点派生长度、角度与文字锚点。

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

/// 尺寸界线长度相对于标注长度的比例。
pub const WITNESS_RATIO: f64 = 0.2;

/// 线性尺寸。创建后不可变，需要重算时整体替换。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub start: Point2,
    pub end: Point2,
    /// 由 `atan2` 得到的有符号角度，范围 (-180, 180]。
    pub angle_degrees: f64,
    pub length: f64,
    pub label_anchor: Point2,
}

/// 标注的三段辅助线（逻辑坐标）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WitnessLines {
    pub start: (Point2, Point2),
    pub end: (Point2, Point2),
    pub dimension_line: (Point2, Point2),
}

impl Dimension {
    /// 零尺寸哨兵值：取点未完成时返回它而不是报错。
    pub const ZERO: Dimension = Dimension {
        start: Point2::ORIGIN,
        end: Point2::ORIGIN,
        angle_degrees: 0.0,
        length: 0.0,
        label_anchor: Point2::ORIGIN,
    };

    pub fn between(start: Point2, end: Point2) -> Self {
        let delta = start.vector_to(end);
        Self {
            start,
            end,
            angle_degrees: delta.y().atan2(delta.x()).to_degrees(),
            length: delta.length(),
            label_anchor: start.midpoint(end),
        }
    }

    /// 两点取点流程的入口，任一点缺失时得到 [`Dimension::ZERO`]。
    pub fn from_picks(first: Option<Point2>, second: Option<Point2>) -> Self {
        match (first, second) {
            (Some(start), Some(end)) => Self::between(start, end),
            _ => Self::ZERO,
        }
    }

    /// 长度为 0 的标注没有意义，调用方在渲染或保存前应检查。
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.length == 0.0
    }

    /// 尺寸界线偏移距离（逻辑单位）。
    ///
    /// 取长度的 1/5，渲染时再乘以缩放倍数，因此屏幕上的界线长度随缩放变化，与导出的几何一致。
    #[inline]
    pub fn witness_offset(&self) -> f64 {
        self.length * WITNESS_RATIO
    }

    pub fn label_text(&self) -> String {
        format!("{:.2}mm", self.length)
    }

    /// 逻辑坐标下的尺寸界线，与渲染时在设备坐标中用 [`offset_point`] 求得的结果一致。
    pub fn witness_lines(&self) -> WitnessLines {
        // 设备坐标 y 轴向下，先翻转到设备朝向求偏移再翻回来。
        let offset = |point: Point2| {
            let (x, y) = offset_point(
                point.x(),
                -point.y(),
                self.angle_degrees,
                self.witness_offset(),
            );
            Point2::new(x, -y)
        };
        let start_tip = offset(self.start);
        let end_tip = offset(self.end);
        WitnessLines {
            start: (self.start, start_tip),
            end: (self.end, end_tip),
            dimension_line: (start_tip, end_tip),
        }
    }
}

pub fn compute_dimension(x1: f64, y1: f64, x2: f64, y2: f64) -> Dimension {
    Dimension::between(Point2::new(x1, y1), Point2::new(x2, y2))
}

/// 沿 `-(90 + angle)` 方向偏移 `distance`，坐标系为 y 轴向下的设备坐标。
pub fn offset_point(x: f64, y: f64, angle_degrees: f64, distance: f64) -> (f64, f64) {
    let radians = (-(90.0 + angle_degrees)).to_radians();
    (x + distance * radians.cos(), y + distance * radians.sin())
}
