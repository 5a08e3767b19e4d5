//! The slice of the Direct2D device-context API the drawing core relies on.
//!
//! [`NativeContext`] and [`NativeDevice`] are implemented by the `windows` crate wrappers in
//! [`direct2d`] on Windows. Everything above this seam is plain Rust, so the state machine can
//! be exercised with a recording implementation in tests.

use gfx_device::{LineCap, LineJoin, LineStyle};
use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};
use peniko::{Color, Fill};
use thiserror::Error;

#[cfg(windows)]
pub mod direct2d;

/// Identity of a native object (the interface pointer on Windows).
pub type NativeId = usize;

pub type NativeBitmap<D> = <<D as NativeDevice>::Context as NativeContext>::Bitmap;
pub type NativeBitmapSource<D> = <<D as NativeDevice>::Context as NativeContext>::BitmapSource;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    #[error("native call failed with HRESULT {0:#010x}")]
    Hresult(i32),
    #[error("native resource unavailable: {0}")]
    Unavailable(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AntialiasMode {
    PerPrimitive,
    Aliased,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAntialiasMode {
    ClearType,
    Grayscale,
    Aliased,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitmapInterpolation {
    NearestNeighbor,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapStyle {
    Flat,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinStyle {
    Miter,
    Round,
    Bevel,
}

/// Stroke style description handed to the native factory.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeProperties {
    pub start_cap: CapStyle,
    pub end_cap: CapStyle,
    pub dash_cap: CapStyle,
    pub line_join: JoinStyle,
    pub miter_limit: f32,
    pub dash_offset: f32,
    /// Custom dash pattern; empty means a solid stroke.
    pub dashes: Vec<f32>,
}

impl StrokeProperties {
    pub fn from_line_style(style: &LineStyle, miter_limit: f32) -> Self {
        let cap = match style.cap {
            LineCap::Butt => CapStyle::Flat,
            LineCap::Round => CapStyle::Round,
            LineCap::Square => CapStyle::Square,
        };
        let line_join = match style.join {
            LineJoin::Miter => JoinStyle::Miter,
            LineJoin::Round => JoinStyle::Round,
            LineJoin::Bevel => JoinStyle::Bevel,
        };
        Self {
            start_cap: cap,
            end_cap: cap,
            dash_cap: cap,
            line_join,
            miter_limit,
            dash_offset: style.dash_phase as f32,
            dashes: style.dashes.iter().map(|d| *d as f32).collect(),
        }
    }
}

/// A native device context bound to one render target.
pub trait NativeContext: 'static {
    type Brush: Clone;
    type StrokeStyle: Clone;
    type Geometry: Clone;
    type GradientStops;
    type Bitmap: Clone;
    type BitmapSource;
    type TextLayout: ?Sized;

    fn size(&self) -> Size;

    fn begin_draw(&mut self);
    fn end_draw(&mut self) -> Result<(), NativeError>;

    fn transform(&self) -> Affine;
    fn set_transform(&mut self, transform: Affine);

    fn push_axis_aligned_clip(&mut self, rect: Rect, antialias: AntialiasMode);
    fn pop_axis_aligned_clip(&mut self);
    fn push_layer(&mut self, mask: &Self::Geometry, antialias: AntialiasMode);
    fn pop_layer(&mut self);

    fn create_rectangle_geometry(&mut self, rect: Rect) -> Result<Self::Geometry, NativeError>;
    fn create_path_geometry(
        &mut self,
        path: &BezPath,
        fill: Fill,
    ) -> Result<Self::Geometry, NativeError>;
    fn create_solid_brush(&mut self, color: Color) -> Result<Self::Brush, NativeError>;
    fn create_stroke_style(
        &mut self,
        properties: &StrokeProperties,
    ) -> Result<Self::StrokeStyle, NativeError>;
    fn create_gradient_stops(
        &mut self,
        stops: &[(f32, Color)],
    ) -> Result<Self::GradientStops, NativeError>;
    fn create_linear_gradient_brush(
        &mut self,
        start: Point,
        end: Point,
        stops: &Self::GradientStops,
    ) -> Result<Self::Brush, NativeError>;
    fn create_radial_gradient_brush(
        &mut self,
        center: Point,
        origin_offset: Vec2,
        radius: f64,
        stops: &Self::GradientStops,
    ) -> Result<Self::Brush, NativeError>;
    fn create_bitmap(&mut self, source: &Self::BitmapSource) -> Result<Self::Bitmap, NativeError>;
    fn bitmap_size(&self, bitmap: &Self::Bitmap) -> Size;

    fn draw_line(
        &mut self,
        p0: Point,
        p1: Point,
        brush: &Self::Brush,
        width: f64,
        stroke: Option<&Self::StrokeStyle>,
    );
    fn fill_rectangle(&mut self, rect: Rect, brush: &Self::Brush);
    fn draw_rectangle(
        &mut self,
        rect: Rect,
        brush: &Self::Brush,
        width: f64,
        stroke: Option<&Self::StrokeStyle>,
    );
    fn fill_ellipse(&mut self, center: Point, radii: Vec2, brush: &Self::Brush);
    fn draw_ellipse(
        &mut self,
        center: Point,
        radii: Vec2,
        brush: &Self::Brush,
        width: f64,
        stroke: Option<&Self::StrokeStyle>,
    );
    fn fill_geometry(&mut self, geometry: &Self::Geometry, brush: &Self::Brush);
    fn draw_geometry(
        &mut self,
        geometry: &Self::Geometry,
        brush: &Self::Brush,
        width: f64,
        stroke: Option<&Self::StrokeStyle>,
    );
    fn draw_bitmap(
        &mut self,
        bitmap: &Self::Bitmap,
        dest: Rect,
        opacity: f32,
        interpolation: BitmapInterpolation,
        source: Rect,
    );
    fn clear(&mut self, color: Color);
    fn set_text_antialias_mode(&mut self, mode: TextAntialiasMode);
    fn draw_text_layout(&mut self, origin: Point, layout: &Self::TextLayout, brush: &Self::Brush);
}

/// A native rendering device: the factory for bitmap render targets.
pub trait NativeDevice: 'static {
    type Context: NativeContext;

    fn id(&self) -> NativeId;
    fn create_bitmap_target(
        &self,
        source: &<Self::Context as NativeContext>::BitmapSource,
    ) -> Result<Self::Context, NativeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_properties_follow_line_style() {
        let style = LineStyle::new(LineCap::Round, LineJoin::Bevel, vec![2.0, 1.0], 0.5);
        let props = StrokeProperties::from_line_style(&style, 10.0);
        assert_eq!(props.start_cap, CapStyle::Round);
        assert_eq!(props.end_cap, CapStyle::Round);
        assert_eq!(props.dash_cap, CapStyle::Round);
        assert_eq!(props.line_join, JoinStyle::Bevel);
        assert_eq!(props.dashes, vec![2.0, 1.0]);
        assert_eq!(props.dash_offset, 0.5);
        assert_eq!(props.miter_limit, 10.0);

        let solid = StrokeProperties::from_line_style(&LineStyle::solid(), 4.0);
        assert_eq!(solid.start_cap, CapStyle::Flat);
        assert_eq!(solid.line_join, JoinStyle::Miter);
        assert!(solid.dashes.is_empty());
    }

    #[test]
    fn hresult_is_printed_as_hex() {
        let err = NativeError::Hresult(0x8899000Cu32 as i32);
        assert_eq!(err.to_string(), "native call failed with HRESULT 0x8899000c");
    }
}
