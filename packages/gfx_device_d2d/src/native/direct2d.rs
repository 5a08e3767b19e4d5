//! `windows` crate implementation of the native seam.
//!
//! Bitmap contexts render into WIC bitmaps through a software WIC render target, queried
//! for `ID2D1DeviceContext` so the same code path serves window and offscreen targets.

use std::mem::ManuallyDrop;

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Size, Vec2};
use peniko::{Color, Fill};
use windows::Foundation::Numerics::Matrix3x2;
use windows::Win32::Graphics::Direct2D::Common::*;
use windows::Win32::Graphics::Direct2D::*;
use windows::Win32::Graphics::DirectWrite::IDWriteTextLayout;
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_UNKNOWN;
use windows::Win32::Graphics::Imaging::IWICBitmap;
use windows::Win32::System::Diagnostics::Debug::OutputDebugStringA;
use windows::core::{Interface, PCSTR};

use super::{
    AntialiasMode, BitmapInterpolation, CapStyle, JoinStyle, NativeContext, NativeDevice,
    NativeError, NativeId, StrokeProperties, TextAntialiasMode,
};

impl From<windows::core::Error> for NativeError {
    fn from(err: windows::core::Error) -> Self {
        NativeError::Hresult(err.code().0)
    }
}

fn debug_log_d2d(msg: &str) {
    let mut bytes = msg.as_bytes().to_vec();
    if !bytes.ends_with(b"\n") {
        bytes.push(b'\n');
    }
    bytes.push(0);
    unsafe {
        OutputDebugStringA(PCSTR(bytes.as_ptr()));
    }
}

fn rect_f(rect: Rect) -> D2D_RECT_F {
    D2D_RECT_F {
        left: rect.x0 as f32,
        top: rect.y0 as f32,
        right: rect.x1 as f32,
        bottom: rect.y1 as f32,
    }
}

fn point_f(p: Point) -> D2D_POINT_2F {
    D2D_POINT_2F {
        x: p.x as f32,
        y: p.y as f32,
    }
}

fn color_f(color: Color) -> D2D1_COLOR_F {
    let [r, g, b, a] = color.components;
    D2D1_COLOR_F { r, g, b, a }
}

fn matrix(transform: Affine) -> Matrix3x2 {
    let [a, b, c, d, e, f] = transform.as_coeffs();
    Matrix3x2 {
        M11: a as f32,
        M12: b as f32,
        M21: c as f32,
        M22: d as f32,
        M31: e as f32,
        M32: f as f32,
    }
}

fn affine(m: &Matrix3x2) -> Affine {
    Affine::new([
        m.M11 as f64,
        m.M12 as f64,
        m.M21 as f64,
        m.M22 as f64,
        m.M31 as f64,
        m.M32 as f64,
    ])
}

fn antialias(mode: AntialiasMode) -> D2D1_ANTIALIAS_MODE {
    match mode {
        AntialiasMode::PerPrimitive => D2D1_ANTIALIAS_MODE_PER_PRIMITIVE,
        AntialiasMode::Aliased => D2D1_ANTIALIAS_MODE_ALIASED,
    }
}

fn cap_style(cap: CapStyle) -> D2D1_CAP_STYLE {
    match cap {
        CapStyle::Flat => D2D1_CAP_STYLE_FLAT,
        CapStyle::Round => D2D1_CAP_STYLE_ROUND,
        CapStyle::Square => D2D1_CAP_STYLE_SQUARE,
    }
}

fn line_join(join: JoinStyle) -> D2D1_LINE_JOIN {
    match join {
        JoinStyle::Miter => D2D1_LINE_JOIN_MITER,
        JoinStyle::Round => D2D1_LINE_JOIN_ROUND,
        JoinStyle::Bevel => D2D1_LINE_JOIN_BEVEL,
    }
}

fn infinite_rect() -> D2D_RECT_F {
    D2D_RECT_F {
        left: -f32::MAX,
        top: -f32::MAX,
        right: f32::MAX,
        bottom: f32::MAX,
    }
}

/// A shared `ID2D1Device`.
#[derive(Clone)]
pub struct Direct2DDevice {
    device: ID2D1Device,
}

impl Direct2DDevice {
    pub fn new(device: ID2D1Device) -> Self {
        Self { device }
    }

    pub fn raw(&self) -> &ID2D1Device {
        &self.device
    }
}

impl NativeDevice for Direct2DDevice {
    type Context = Direct2DContext;

    fn id(&self) -> NativeId {
        self.device.as_raw() as NativeId
    }

    fn create_bitmap_target(&self, source: &IWICBitmap) -> Result<Direct2DContext, NativeError> {
        unsafe {
            let mut factory: Option<ID2D1Factory> = None;
            self.device.GetFactory(&mut factory);
            let factory = factory.ok_or(NativeError::Unavailable("ID2D1Factory"))?;
            let properties = D2D1_RENDER_TARGET_PROPERTIES {
                r#type: D2D1_RENDER_TARGET_TYPE_SOFTWARE,
                pixelFormat: D2D1_PIXEL_FORMAT {
                    format: DXGI_FORMAT_UNKNOWN,
                    alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
                },
                dpiX: 0.0,
                dpiY: 0.0,
                usage: D2D1_RENDER_TARGET_USAGE_NONE,
                minLevel: D2D1_FEATURE_LEVEL_DEFAULT,
            };
            let target = factory.CreateWicBitmapRenderTarget(source, &properties)?;
            let context: ID2D1DeviceContext = target.cast()?;
            Ok(Direct2DContext::with_factory(context, factory))
        }
    }
}

/// An `ID2D1DeviceContext` plus the factory that created it.
pub struct Direct2DContext {
    ctx: ID2D1DeviceContext,
    factory: ID2D1Factory,
}

impl Direct2DContext {
    pub fn new(ctx: ID2D1DeviceContext) -> Result<Self, NativeError> {
        let mut factory: Option<ID2D1Factory> = None;
        unsafe {
            ctx.GetFactory(&mut factory);
        }
        let factory = factory.ok_or(NativeError::Unavailable("ID2D1Factory"))?;
        Ok(Self::with_factory(ctx, factory))
    }

    fn with_factory(ctx: ID2D1DeviceContext, factory: ID2D1Factory) -> Self {
        Self { ctx, factory }
    }

    pub fn raw(&self) -> &ID2D1DeviceContext {
        &self.ctx
    }
}

impl NativeContext for Direct2DContext {
    type Brush = ID2D1Brush;
    type StrokeStyle = ID2D1StrokeStyle;
    type Geometry = ID2D1Geometry;
    type GradientStops = ID2D1GradientStopCollection;
    type Bitmap = ID2D1Bitmap;
    type BitmapSource = IWICBitmap;
    type TextLayout = IDWriteTextLayout;

    fn size(&self) -> Size {
        let size = unsafe { self.ctx.GetSize() };
        Size::new(size.width as f64, size.height as f64)
    }

    fn begin_draw(&mut self) {
        unsafe { self.ctx.BeginDraw() }
    }

    fn end_draw(&mut self) -> Result<(), NativeError> {
        unsafe { self.ctx.EndDraw(None, None) }.map_err(|err| {
            debug_log_d2d(&format!("EndDraw error {:?}", err));
            err.into()
        })
    }

    fn transform(&self) -> Affine {
        let mut m = Matrix3x2::default();
        unsafe { self.ctx.GetTransform(&mut m) };
        affine(&m)
    }

    fn set_transform(&mut self, transform: Affine) {
        unsafe { self.ctx.SetTransform(&matrix(transform)) }
    }

    fn push_axis_aligned_clip(&mut self, rect: Rect, mode: AntialiasMode) {
        unsafe { self.ctx.PushAxisAlignedClip(&rect_f(rect), antialias(mode)) }
    }

    fn pop_axis_aligned_clip(&mut self) {
        unsafe { self.ctx.PopAxisAlignedClip() }
    }

    fn push_layer(&mut self, mask: &ID2D1Geometry, mode: AntialiasMode) {
        let parameters = D2D1_LAYER_PARAMETERS {
            contentBounds: infinite_rect(),
            geometricMask: ManuallyDrop::new(Some(mask.clone())),
            maskAntialiasMode: antialias(mode),
            maskTransform: Matrix3x2::identity(),
            opacity: 1.0,
            opacityBrush: ManuallyDrop::new(None),
            layerOptions: D2D1_LAYER_OPTIONS_NONE,
        };
        unsafe { self.ctx.PushLayer(&parameters, None::<&ID2D1Layer>) };
        drop(ManuallyDrop::into_inner(parameters.geometricMask));
    }

    fn pop_layer(&mut self) {
        unsafe { self.ctx.PopLayer() }
    }

    fn create_rectangle_geometry(&mut self, rect: Rect) -> Result<ID2D1Geometry, NativeError> {
        let geometry = unsafe { self.factory.CreateRectangleGeometry(&rect_f(rect))? };
        Ok(geometry.cast()?)
    }

    fn create_path_geometry(
        &mut self,
        path: &BezPath,
        fill: Fill,
    ) -> Result<ID2D1Geometry, NativeError> {
        unsafe {
            let geometry = self.factory.CreatePathGeometry()?;
            let sink = geometry.Open()?;
            sink.SetFillMode(match fill {
                Fill::NonZero => D2D1_FILL_MODE_WINDING,
                Fill::EvenOdd => D2D1_FILL_MODE_ALTERNATE,
            });
            let mut figure_open = false;
            for el in path.elements() {
                match *el {
                    PathEl::MoveTo(p) => {
                        if figure_open {
                            sink.EndFigure(D2D1_FIGURE_END_OPEN);
                        }
                        sink.BeginFigure(point_f(p), D2D1_FIGURE_BEGIN_FILLED);
                        figure_open = true;
                    }
                    PathEl::LineTo(p) => {
                        if figure_open {
                            sink.AddLine(point_f(p));
                        }
                    }
                    PathEl::QuadTo(p1, p2) => {
                        if figure_open {
                            let segment = D2D1_QUADRATIC_BEZIER_SEGMENT {
                                point1: point_f(p1),
                                point2: point_f(p2),
                            };
                            sink.AddQuadraticBezier(&segment);
                        }
                    }
                    PathEl::CurveTo(p1, p2, p3) => {
                        if figure_open {
                            let segment = D2D1_BEZIER_SEGMENT {
                                point1: point_f(p1),
                                point2: point_f(p2),
                                point3: point_f(p3),
                            };
                            sink.AddBezier(&segment);
                        }
                    }
                    PathEl::ClosePath => {
                        if figure_open {
                            sink.EndFigure(D2D1_FIGURE_END_CLOSED);
                            figure_open = false;
                        }
                    }
                }
            }
            if figure_open {
                sink.EndFigure(D2D1_FIGURE_END_OPEN);
            }
            sink.Close()?;
            Ok(geometry.cast()?)
        }
    }

    fn create_solid_brush(&mut self, color: Color) -> Result<ID2D1Brush, NativeError> {
        let brush = unsafe { self.ctx.CreateSolidColorBrush(&color_f(color), None)? };
        Ok(brush.cast()?)
    }

    fn create_stroke_style(
        &mut self,
        properties: &StrokeProperties,
    ) -> Result<ID2D1StrokeStyle, NativeError> {
        let native = D2D1_STROKE_STYLE_PROPERTIES {
            startCap: cap_style(properties.start_cap),
            endCap: cap_style(properties.end_cap),
            dashCap: cap_style(properties.dash_cap),
            lineJoin: line_join(properties.line_join),
            miterLimit: properties.miter_limit,
            dashStyle: if properties.dashes.is_empty() {
                D2D1_DASH_STYLE_SOLID
            } else {
                D2D1_DASH_STYLE_CUSTOM
            },
            dashOffset: properties.dash_offset,
        };
        let dashes = (!properties.dashes.is_empty()).then_some(properties.dashes.as_slice());
        Ok(unsafe { self.factory.CreateStrokeStyle(&native, dashes)? })
    }

    fn create_gradient_stops(
        &mut self,
        stops: &[(f32, Color)],
    ) -> Result<ID2D1GradientStopCollection, NativeError> {
        let stops: Vec<D2D1_GRADIENT_STOP> = stops
            .iter()
            .map(|(position, color)| D2D1_GRADIENT_STOP {
                position: *position,
                color: color_f(*color),
            })
            .collect();
        let collection = unsafe {
            self.ctx.CreateGradientStopCollection(
                &stops,
                D2D1_COLOR_SPACE_SRGB,
                D2D1_COLOR_SPACE_SRGB,
                D2D1_BUFFER_PRECISION_8BPC_UNORM,
                D2D1_EXTEND_MODE_CLAMP,
                D2D1_COLOR_INTERPOLATION_MODE_STRAIGHT,
            )?
        };
        Ok(collection.cast()?)
    }

    fn create_linear_gradient_brush(
        &mut self,
        start: Point,
        end: Point,
        stops: &ID2D1GradientStopCollection,
    ) -> Result<ID2D1Brush, NativeError> {
        let properties = D2D1_LINEAR_GRADIENT_BRUSH_PROPERTIES {
            startPoint: point_f(start),
            endPoint: point_f(end),
        };
        let brush = unsafe { self.ctx.CreateLinearGradientBrush(&properties, None, stops)? };
        Ok(brush.cast()?)
    }

    fn create_radial_gradient_brush(
        &mut self,
        center: Point,
        origin_offset: Vec2,
        radius: f64,
        stops: &ID2D1GradientStopCollection,
    ) -> Result<ID2D1Brush, NativeError> {
        let properties = D2D1_RADIAL_GRADIENT_BRUSH_PROPERTIES {
            center: point_f(center),
            gradientOriginOffset: point_f(origin_offset.to_point()),
            radiusX: radius as f32,
            radiusY: radius as f32,
        };
        let brush = unsafe { self.ctx.CreateRadialGradientBrush(&properties, None, stops)? };
        Ok(brush.cast()?)
    }

    fn create_bitmap(&mut self, source: &IWICBitmap) -> Result<ID2D1Bitmap, NativeError> {
        let bitmap = unsafe { self.ctx.CreateBitmapFromWicBitmap(source, None)? };
        Ok(bitmap.cast()?)
    }

    fn bitmap_size(&self, bitmap: &ID2D1Bitmap) -> Size {
        let size = unsafe { bitmap.GetSize() };
        Size::new(size.width as f64, size.height as f64)
    }

    fn draw_line(
        &mut self,
        p0: Point,
        p1: Point,
        brush: &ID2D1Brush,
        width: f64,
        stroke: Option<&ID2D1StrokeStyle>,
    ) {
        unsafe {
            self.ctx
                .DrawLine(point_f(p0), point_f(p1), brush, width as f32, stroke)
        }
    }

    fn fill_rectangle(&mut self, rect: Rect, brush: &ID2D1Brush) {
        unsafe { self.ctx.FillRectangle(&rect_f(rect), brush) }
    }

    fn draw_rectangle(
        &mut self,
        rect: Rect,
        brush: &ID2D1Brush,
        width: f64,
        stroke: Option<&ID2D1StrokeStyle>,
    ) {
        unsafe {
            self.ctx
                .DrawRectangle(&rect_f(rect), brush, width as f32, stroke)
        }
    }

    fn fill_ellipse(&mut self, center: Point, radii: Vec2, brush: &ID2D1Brush) {
        let ellipse = D2D1_ELLIPSE {
            point: point_f(center),
            radiusX: radii.x as f32,
            radiusY: radii.y as f32,
        };
        unsafe { self.ctx.FillEllipse(&ellipse, brush) }
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        radii: Vec2,
        brush: &ID2D1Brush,
        width: f64,
        stroke: Option<&ID2D1StrokeStyle>,
    ) {
        let ellipse = D2D1_ELLIPSE {
            point: point_f(center),
            radiusX: radii.x as f32,
            radiusY: radii.y as f32,
        };
        unsafe { self.ctx.DrawEllipse(&ellipse, brush, width as f32, stroke) }
    }

    fn fill_geometry(&mut self, geometry: &ID2D1Geometry, brush: &ID2D1Brush) {
        unsafe { self.ctx.FillGeometry(geometry, brush, None) }
    }

    fn draw_geometry(
        &mut self,
        geometry: &ID2D1Geometry,
        brush: &ID2D1Brush,
        width: f64,
        stroke: Option<&ID2D1StrokeStyle>,
    ) {
        unsafe { self.ctx.DrawGeometry(geometry, brush, width as f32, stroke) }
    }

    fn draw_bitmap(
        &mut self,
        bitmap: &ID2D1Bitmap,
        dest: Rect,
        opacity: f32,
        interpolation: BitmapInterpolation,
        source: Rect,
    ) {
        let mode = match interpolation {
            BitmapInterpolation::NearestNeighbor => D2D1_BITMAP_INTERPOLATION_MODE_NEAREST_NEIGHBOR,
            BitmapInterpolation::Linear => D2D1_BITMAP_INTERPOLATION_MODE_LINEAR,
        };
        let target: &ID2D1RenderTarget = &self.ctx;
        unsafe {
            target.DrawBitmap(
                bitmap,
                Some(&rect_f(dest)),
                opacity,
                mode,
                Some(&rect_f(source)),
            )
        }
    }

    fn clear(&mut self, color: Color) {
        unsafe { self.ctx.Clear(Some(&color_f(color))) }
    }

    fn set_text_antialias_mode(&mut self, mode: TextAntialiasMode) {
        let mode = match mode {
            TextAntialiasMode::ClearType => D2D1_TEXT_ANTIALIAS_MODE_CLEARTYPE,
            TextAntialiasMode::Grayscale => D2D1_TEXT_ANTIALIAS_MODE_GRAYSCALE,
            TextAntialiasMode::Aliased => D2D1_TEXT_ANTIALIAS_MODE_ALIASED,
        };
        unsafe { self.ctx.SetTextAntialiasMode(mode) }
    }

    fn draw_text_layout(&mut self, origin: Point, layout: &IDWriteTextLayout, brush: &ID2D1Brush) {
        unsafe {
            self.ctx
                .DrawTextLayout(point_f(origin), layout, brush, D2D1_DRAW_TEXT_OPTIONS_NONE)
        }
    }
}
