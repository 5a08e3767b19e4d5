use kurbo::{Affine, Arc, BezPath, Ellipse, PathEl, Point, Rect, Shape, Vec2};
use peniko::Fill;
use tracing::warn;

use crate::native::NativeContext;

const ARC_TOLERANCE: f64 = 0.1;

/// A path handed to the context. Only paths made by this backend expose a native view.
pub trait PlatformGraphicsPath<N: NativeContext> {
    fn as_native(&self) -> Option<&dyn NativePath<N>>;
}

pub trait NativePath<N: NativeContext> {
    fn geometry(&self, native: &mut N, fill: Fill) -> Option<N::Geometry>;
    fn transformed_geometry(
        &self,
        native: &mut N,
        transform: &Affine,
        fill: Fill,
    ) -> Option<N::Geometry>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct D2DGraphicsPathFactory;

impl D2DGraphicsPathFactory {
    pub fn create_path(&self) -> D2DGraphicsPath {
        D2DGraphicsPath::default()
    }
}

/// Figures built in logical coordinates; angles are in degrees, clockwise in y-down space.
#[derive(Clone, Debug, Default)]
pub struct D2DGraphicsPath {
    path: BezPath,
}

impl D2DGraphicsPath {
    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    fn has_current_point(&self) -> bool {
        !matches!(self.path.elements().last(), None | Some(PathEl::ClosePath))
    }

    pub fn begin_subpath(&mut self, start: Point) {
        self.path.move_to(start);
    }

    pub fn add_line(&mut self, to: Point) {
        if self.has_current_point() {
            self.path.line_to(to);
        } else {
            self.path.move_to(to);
        }
    }

    pub fn add_bezier_curve(&mut self, control1: Point, control2: Point, end: Point) {
        if !self.has_current_point() {
            self.path.move_to(control1);
        }
        self.path.curve_to(control1, control2, end);
    }

    /// Adds the arc of the ellipse inscribed in `rect` from `start_deg` to `end_deg`.
    ///
    /// Connects to the current figure with a line, or starts a new figure at the arc start.
    pub fn add_arc(&mut self, rect: Rect, start_deg: f64, end_deg: f64, clockwise: bool) {
        let sweep = if clockwise {
            full_turn_if_zero((end_deg - start_deg).rem_euclid(360.0))
        } else {
            -full_turn_if_zero((start_deg - end_deg).rem_euclid(360.0))
        };
        let arc = Arc {
            center: rect.center(),
            radii: Vec2::new(rect.width() / 2.0, rect.height() / 2.0),
            start_angle: start_deg.to_radians(),
            sweep_angle: sweep.to_radians(),
            x_rotation: 0.0,
        };
        let start = arc.center
            + Vec2::new(
                arc.radii.x * arc.start_angle.cos(),
                arc.radii.y * arc.start_angle.sin(),
            );
        self.add_line(start);
        self.path.extend(arc.append_iter(ARC_TOLERANCE));
    }

    pub fn add_rect(&mut self, rect: Rect) {
        self.path.move_to((rect.x0, rect.y0));
        self.path.line_to((rect.x1, rect.y0));
        self.path.line_to((rect.x1, rect.y1));
        self.path.line_to((rect.x0, rect.y1));
        self.path.close_path();
    }

    pub fn add_ellipse(&mut self, rect: Rect) {
        self.path
            .extend(Ellipse::from_rect(rect).path_elements(ARC_TOLERANCE));
    }

    pub fn close_subpath(&mut self) {
        if self.has_current_point() {
            self.path.close_path();
        }
    }

    pub fn bounds(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            self.path.bounding_box()
        }
    }
}

fn full_turn_if_zero(sweep: f64) -> f64 {
    if sweep == 0.0 { 360.0 } else { sweep }
}

impl<N: NativeContext> PlatformGraphicsPath<N> for D2DGraphicsPath {
    fn as_native(&self) -> Option<&dyn NativePath<N>> {
        Some(self)
    }
}

impl<N: NativeContext> NativePath<N> for D2DGraphicsPath {
    fn geometry(&self, native: &mut N, fill: Fill) -> Option<N::Geometry> {
        materialize(native, &self.path, fill)
    }

    fn transformed_geometry(
        &self,
        native: &mut N,
        transform: &Affine,
        fill: Fill,
    ) -> Option<N::Geometry> {
        materialize(native, &(*transform * self.path.clone()), fill)
    }
}

fn materialize<N: NativeContext>(native: &mut N, path: &BezPath, fill: Fill) -> Option<N::Geometry> {
    match native.create_path_geometry(path, fill) {
        Ok(geometry) => Some(geometry),
        Err(err) => {
            warn!(%err, "failed to create path geometry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockContext};

    fn assert_near(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-6, "{a:?} != {b:?}");
    }

    fn end(el: &PathEl) -> Point {
        match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => p,
            PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => p,
            PathEl::ClosePath => panic!("close has no end point"),
        }
    }

    #[test]
    fn lines_start_a_figure_when_none_is_open() {
        let mut path = D2DGraphicsPathFactory.create_path();
        path.add_line(Point::new(1.0, 1.0));
        path.add_line(Point::new(5.0, 1.0));
        path.close_subpath();
        path.add_line(Point::new(2.0, 2.0));
        assert!(matches!(path.bez_path().elements()[0], PathEl::MoveTo(_)));
        assert!(matches!(path.bez_path().elements()[1], PathEl::LineTo(_)));
        assert!(matches!(path.bez_path().elements()[2], PathEl::ClosePath));
        assert!(matches!(path.bez_path().elements()[3], PathEl::MoveTo(_)));
    }

    #[test]
    fn clockwise_quarter_arc() {
        let mut path = D2DGraphicsPath::default();
        path.add_arc(Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, 90.0, true);
        let elements = path.bez_path().elements();
        assert_near(end(&elements[0]), Point::new(20.0, 10.0));
        assert_near(end(elements.last().unwrap()), Point::new(10.0, 20.0));
        let bounds = path.bounds();
        assert!(bounds.x0 > 9.0 && bounds.y0 > 9.0);
    }

    #[test]
    fn counter_clockwise_arc_goes_the_long_way() {
        let mut path = D2DGraphicsPath::default();
        path.add_arc(Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, 90.0, false);
        let bounds = path.bounds();
        assert!(bounds.x0 < 0.1 && bounds.y0 < 0.1);
        assert_near(
            end(path.bez_path().elements().last().unwrap()),
            Point::new(10.0, 20.0),
        );
    }

    #[test]
    fn equal_angles_make_a_full_ellipse() {
        let mut path = D2DGraphicsPath::default();
        path.add_arc(Rect::new(0.0, 0.0, 10.0, 4.0), 45.0, 45.0, true);
        let bounds = path.bounds();
        assert!((bounds.width() - 10.0).abs() < 1e-2);
        assert!((bounds.height() - 4.0).abs() < 1e-2);
    }

    #[test]
    fn shapes_and_bounds() {
        let mut path = D2DGraphicsPath::default();
        assert_eq!(path.bounds(), Rect::ZERO);
        path.add_rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        path.add_ellipse(Rect::new(10.0, 10.0, 20.0, 16.0));
        let bounds = path.bounds();
        assert_eq!((bounds.x0, bounds.y0), (1.0, 2.0));
        assert!((bounds.x1 - 20.0).abs() < 1e-2 && (bounds.y1 - 16.0).abs() < 1e-2);
    }

    #[test]
    fn transformed_geometry_uses_transformed_curve() {
        let mut path = D2DGraphicsPath::default();
        path.add_rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        let mut native = MockContext::new(10.0, 10.0);
        let log = native.log();
        let native_path = PlatformGraphicsPath::<MockContext>::as_native(&path).unwrap();
        native_path
            .transformed_geometry(&mut native, &Affine::scale(3.0), Fill::EvenOdd)
            .unwrap();
        assert_eq!(
            log.calls(),
            vec![Call::CreatePathGeometry {
                even_odd: true,
                bounds: Rect::new(0.0, 0.0, 6.0, 6.0),
            }]
        );
    }
}
