use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds2D, Point2};

/// 点图形在默认模式下的命中半径平方（即半径 2 个绘图单位）。
pub const POINT_HIT_RADIUS_SQUARED: f64 = 4.0;
/// 点图形在“贴近”模式下的命中距离。
pub const POINT_NEAR_DISTANCE: f64 = 1.0;
/// 线段命中容差：到两端点距离之和允许超出线段长度的量。
pub const LINE_HIT_TOLERANCE: f64 = 1.0;
/// 圆命中带宽：与半径的差值需严格小于该值。
pub const CIRCLE_HIT_BAND: f64 = 1.0;

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

/// 图形的唯一标识，构造时分配，之后不再改变。仅用于查找与删除，不参与相等比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(u64);

impl ShapeId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 生成进程内唯一的新标识。
    pub fn fresh() -> Self {
        Self(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 提供原始数值，便于序列化或日志输出。
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Point,
    Line,
    Circle,
}

impl ShapeKind {
    pub fn describe(self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Line => "line",
            ShapeKind::Circle => "circle",
        }
    }
}

/// 点图形的命中判定方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointHitMode {
    /// 距离平方小于 [`POINT_HIT_RADIUS_SQUARED`]。
    #[default]
    Radius,
    /// 距离不超过 [`POINT_NEAR_DISTANCE`]。
    Near,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointShape {
    pub position: Point2,
}

/// 线段。`middle` 由端点派生，只能通过 [`LineShape::set_endpoints`] 间接更新。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineShape {
    start: Point2,
    end: Point2,
    middle: Point2,
}

impl LineShape {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self {
            start,
            end,
            middle: start.midpoint(end),
        }
    }

    #[inline]
    pub fn start(&self) -> Point2 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Point2 {
        self.end
    }

    #[inline]
    pub fn middle(&self) -> Point2 {
        self.middle
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn set_endpoints(&mut self, start: Point2, end: Point2) {
        self.start = start;
        self.end = end;
        self.middle = start.midpoint(end);
    }
}

/// 圆。半径始终非负，半径为 0 的圆合法，但永远不会被命中。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleShape {
    center: Point2,
    radius: f64,
}

impl CircleShape {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }

    /// 以圆心与圆周上一点构造。
    pub fn through(center: Point2, rim: Point2) -> Self {
        Self::new(center, center.distance(rim))
    }

    #[inline]
    pub fn center(&self) -> Point2 {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Point(PointShape),
    Line(LineShape),
    Circle(CircleShape),
}

/// 绘图图元：唯一标识 + 几何数据。图形是纯值对象，不持有任何绘制上下文。
///
/// 相等比较只看几何，不看 `id`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    id: ShapeId,
    geometry: Geometry,
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.geometry == other.geometry
    }
}

impl Shape {
    pub fn point(position: Point2) -> Self {
        Self::from_geometry(Geometry::Point(PointShape { position }))
    }

    pub fn line(start: Point2, end: Point2) -> Self {
        Self::from_geometry(Geometry::Line(LineShape::new(start, end)))
    }

    pub fn circle(center: Point2, radius: f64) -> Self {
        Self::from_geometry(Geometry::Circle(CircleShape::new(center, radius)))
    }

    /// 按种类构造一个两端重合的退化图形，供绘图工具在首次点击时使用。
    pub fn anchored(kind: ShapeKind, at: Point2) -> Self {
        match kind {
            ShapeKind::Point => Self::point(at),
            ShapeKind::Line => Self::line(at, at),
            ShapeKind::Circle => Self::circle(at, 0.0),
        }
    }

    pub fn from_geometry(geometry: Geometry) -> Self {
        Self {
            id: ShapeId::fresh(),
            geometry,
        }
    }

    #[inline]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self.geometry {
            Geometry::Point(_) => ShapeKind::Point,
            Geometry::Line(_) => ShapeKind::Line,
            Geometry::Circle(_) => ShapeKind::Circle,
        }
    }

    #[inline]
    pub fn is_point(&self) -> bool {
        matches!(self.geometry, Geometry::Point(_))
    }

    /// 点本身、线段起点或圆心。
    #[inline]
    pub fn origin(&self) -> Point2 {
        match &self.geometry {
            Geometry::Point(point) => point.position,
            Geometry::Line(line) => line.start,
            Geometry::Circle(circle) => circle.center,
        }
    }

    #[inline]
    pub fn end(&self) -> Option<Point2> {
        match &self.geometry {
            Geometry::Line(line) => Some(line.end),
            _ => None,
        }
    }

    #[inline]
    pub fn middle(&self) -> Option<Point2> {
        match &self.geometry {
            Geometry::Line(line) => Some(line.middle),
            _ => None,
        }
    }

    #[inline]
    pub fn radius(&self) -> Option<f64> {
        match &self.geometry {
            Geometry::Circle(circle) => Some(circle.radius),
            _ => None,
        }
    }

    /// 以两角点手势重新定位图形。点只使用 `origin`；圆的半径取两点距离。
    pub fn set_pos(&mut self, origin: Point2, end: Point2) {
        match &mut self.geometry {
            Geometry::Point(point) => point.position = origin,
            Geometry::Line(line) => line.set_endpoints(origin, end),
            Geometry::Circle(circle) => *circle = CircleShape::through(origin, end),
        }
    }

    /// 使用默认点命中模式的命中测试，坐标为逻辑坐标。
    #[inline]
    pub fn is_hovered(&self, at: Point2) -> bool {
        self.is_hovered_with(at, PointHitMode::default())
    }

    /// 命中测试。容差以逻辑单位表示，不随缩放变化。
    pub fn is_hovered_with(&self, at: Point2, point_mode: PointHitMode) -> bool {
        match &self.geometry {
            Geometry::Point(point) => {
                let distance_squared = at.distance_squared(point.position);
                match point_mode {
                    PointHitMode::Radius => distance_squared < POINT_HIT_RADIUS_SQUARED,
                    PointHitMode::Near => distance_squared.sqrt() <= POINT_NEAR_DISTANCE,
                }
            }
            Geometry::Line(line) => {
                // 退化椭圆判定：到两端距离之和接近线段长度即视为在线上。
                let sum = at.distance(line.start) + at.distance(line.end);
                sum <= line.length() + LINE_HIT_TOLERANCE
            }
            Geometry::Circle(circle) => {
                let distance_squared = at.distance_squared(circle.center);
                let min = (circle.radius - CIRCLE_HIT_BAND).powi(2);
                let max = (circle.radius + CIRCLE_HIT_BAND).powi(2);
                distance_squared > min && distance_squared < max
            }
        }
    }

    /// 返回几何参数相同、但标识全新的独立实例。
    pub fn copy(&self) -> Shape {
        Shape::from_geometry(self.geometry)
    }

    pub fn bounds(&self) -> Bounds2D {
        let mut bounds = Bounds2D::empty();
        match &self.geometry {
            Geometry::Point(point) => bounds.include_point(point.position),
            Geometry::Line(line) => {
                bounds.include_point(line.start);
                bounds.include_point(line.end);
            }
            Geometry::Circle(circle) => {
                let (center, radius) = (circle.center, circle.radius);
                bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
                bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
            }
        }
        bounds
    }
}
