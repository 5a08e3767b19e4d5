use kurbo::{Affine, Point, Rect};

/// How a closed primitive (rect, ellipse, arc, polygon) is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawStyle {
    Stroked,
    Filled,
    FilledAndStroked,
}

impl DrawStyle {
    pub fn fills(self) -> bool {
        matches!(self, DrawStyle::Filled | DrawStyle::FilledAndStroked)
    }

    pub fn strokes(self) -> bool {
        matches!(self, DrawStyle::Stroked | DrawStyle::FilledAndStroked)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathDrawMode {
    Filled,
    FilledEvenOdd,
    Stroked,
}

/// Rendering mode flags carried by the draw state.
///
/// `integral` snaps coordinates to device pixels before drawing so that thin horizontal and
/// vertical strokes stay crisp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DrawMode {
    pub antialias: bool,
    pub integral: bool,
}

impl DrawMode {
    pub const ALIASED: DrawMode = DrawMode {
        antialias: false,
        integral: false,
    };
    pub const ANTIALIAS: DrawMode = DrawMode {
        antialias: true,
        integral: false,
    };

    pub fn with_integral(mut self, integral: bool) -> Self {
        self.integral = integral;
        self
    }

    pub fn integral_mode(&self) -> bool {
        self.integral
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterpolationQuality {
    #[default]
    Default,
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Cap, join and dash pattern of stroked primitives.
///
/// Dash lengths are expressed in multiples of the line width, like the software renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineStyle {
    pub cap: LineCap,
    pub join: LineJoin,
    pub dashes: Vec<f64>,
    pub dash_phase: f64,
}

impl LineStyle {
    pub fn solid() -> Self {
        Self::default()
    }

    pub fn on_off_dash() -> Self {
        Self {
            dashes: vec![1.0, 1.0],
            ..Self::default()
        }
    }

    pub fn new(cap: LineCap, join: LineJoin, dashes: Vec<f64>, dash_phase: f64) -> Self {
        Self {
            cap,
            join,
            dashes,
            dash_phase,
        }
    }

    pub fn is_dashed(&self) -> bool {
        !self.dashes.is_empty()
    }
}

/// True when the rect covers no area. NaN extents count as empty.
pub fn rect_is_empty(rect: &Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

pub fn make_integral_point(p: Point) -> Point {
    Point::new((p.x + 0.5).floor(), (p.y + 0.5).floor())
}

pub fn make_integral_rect(rect: Rect) -> Rect {
    let p0 = make_integral_point(Point::new(rect.x0, rect.y0));
    let p1 = make_integral_point(Point::new(rect.x1, rect.y1));
    Rect::new(p0.x, p0.y, p1.x, p1.y)
}

/// Snaps `p` to the nearest pixel in the space produced by `tm` and maps it back.
pub fn pixel_align_point(tm: &Affine, p: Point) -> Point {
    let transformed = make_integral_point(*tm * p);
    tm.inverse() * transformed
}

pub fn pixel_align_rect(tm: &Affine, rect: Rect) -> Rect {
    let transformed = make_integral_rect(tm.transform_rect_bbox(rect));
    tm.inverse().transform_rect_bbox(transformed)
}
