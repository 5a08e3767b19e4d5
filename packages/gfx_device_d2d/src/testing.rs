//! Recording stand-ins for the native seam.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Affine, BezPath, Point, Rect, Shape, Size, Vec2};
use peniko::{Color, Fill};

use crate::bitmap::PlatformBitmap;
use crate::native::{
    AntialiasMode, BitmapInterpolation, NativeContext, NativeDevice, NativeError, NativeId,
    StrokeProperties, TextAntialiasMode,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    BeginDraw,
    EndDraw,
    SetTransform(Affine),
    PushClip(Rect),
    PopClip,
    CreateRectGeometry(Rect),
    CreatePathGeometry { even_odd: bool, bounds: Rect },
    PushLayer,
    PopLayer,
    CreateBrush([f32; 4]),
    CreateStrokeStyle(StrokeProperties),
    CreateGradientStops(Vec<(f32, [f32; 4])>),
    CreateLinearBrush(Point, Point),
    CreateRadialBrush(Point, Vec2, f64),
    CreateBitmap(u32),
    DrawLine(Point, Point, f64),
    FillRect(Rect),
    DrawRect(Rect, f64),
    FillEllipse(Point, Vec2),
    DrawEllipse(Point, Vec2, f64),
    FillGeometry(u32),
    DrawGeometry(u32, f64),
    DrawBitmap {
        dest: Rect,
        opacity: f32,
        interpolation: BitmapInterpolation,
        source: Rect,
    },
    Clear([f32; 4]),
    SetTextAntialias(TextAntialiasMode),
    DrawText(Point, [f32; 4]),
}

#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn brush_colors(&self) -> Vec<[f32; 4]> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::CreateBrush(color) => Some(*color),
                _ => None,
            })
            .collect()
    }

    /// Calls that put pixels on the target.
    pub fn draws(&self) -> Vec<Call> {
        self.0
            .borrow()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::DrawLine(..)
                        | Call::FillRect(_)
                        | Call::DrawRect(..)
                        | Call::FillEllipse(..)
                        | Call::DrawEllipse(..)
                        | Call::FillGeometry(_)
                        | Call::DrawGeometry(..)
                        | Call::DrawBitmap { .. }
                        | Call::Clear(_)
                        | Call::DrawText(..)
                )
            })
            .cloned()
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MockBrush {
    pub id: u32,
    pub color: [f32; 4],
}

#[derive(Clone, Debug, PartialEq)]
pub struct MockSource {
    pub id: u32,
    pub size: Size,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MockBitmap {
    pub source_id: u32,
    pub size: Size,
}

pub struct MockContext {
    size: Size,
    log: CallLog,
    transform: Affine,
    clip_depth: usize,
    layer_depth: usize,
    next_id: u32,
    pub fail_geometry: bool,
    pub fail_brushes: bool,
    pub fail_bitmaps: bool,
    pub fail_end_draw: bool,
}

impl MockContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_log(Size::new(width, height), CallLog::default())
    }

    pub fn with_log(size: Size, log: CallLog) -> Self {
        Self {
            size,
            log,
            transform: Affine::IDENTITY,
            clip_depth: 0,
            layer_depth: 0,
            next_id: 0,
            fail_geometry: false,
            fail_brushes: false,
            fail_bitmaps: false,
            fail_end_draw: false,
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    pub fn layer_depth(&self) -> usize {
        self.layer_depth
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

const FAILED: NativeError = NativeError::Hresult(0x8899_0001_u32 as i32);

impl NativeContext for MockContext {
    type Brush = MockBrush;
    type StrokeStyle = u32;
    type Geometry = u32;
    type GradientStops = Vec<(f32, Color)>;
    type Bitmap = MockBitmap;
    type BitmapSource = MockSource;
    type TextLayout = str;

    fn size(&self) -> Size {
        self.size
    }

    fn begin_draw(&mut self) {
        self.log.push(Call::BeginDraw);
    }

    fn end_draw(&mut self) -> Result<(), NativeError> {
        if !std::thread::panicking() {
            assert_eq!(self.clip_depth, 0, "clip still pushed at end of draw");
            assert_eq!(self.layer_depth, 0, "layer still pushed at end of draw");
        }
        self.log.push(Call::EndDraw);
        if self.fail_end_draw { Err(FAILED) } else { Ok(()) }
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
        self.log.push(Call::SetTransform(transform));
    }

    fn push_axis_aligned_clip(&mut self, rect: Rect, _antialias: AntialiasMode) {
        self.clip_depth += 1;
        self.log.push(Call::PushClip(rect));
    }

    fn pop_axis_aligned_clip(&mut self) {
        assert!(self.clip_depth > 0, "unbalanced clip pop");
        self.clip_depth -= 1;
        self.log.push(Call::PopClip);
    }

    fn push_layer(&mut self, _mask: &u32, _antialias: AntialiasMode) {
        self.layer_depth += 1;
        self.log.push(Call::PushLayer);
    }

    fn pop_layer(&mut self) {
        assert!(self.layer_depth > 0, "unbalanced layer pop");
        self.layer_depth -= 1;
        self.log.push(Call::PopLayer);
    }

    fn create_rectangle_geometry(&mut self, rect: Rect) -> Result<u32, NativeError> {
        if self.fail_geometry {
            return Err(FAILED);
        }
        self.log.push(Call::CreateRectGeometry(rect));
        Ok(self.next_id())
    }

    fn create_path_geometry(&mut self, path: &BezPath, fill: Fill) -> Result<u32, NativeError> {
        if self.fail_geometry {
            return Err(FAILED);
        }
        self.log.push(Call::CreatePathGeometry {
            even_odd: fill == Fill::EvenOdd,
            bounds: path.bounding_box(),
        });
        Ok(self.next_id())
    }

    fn create_solid_brush(&mut self, color: Color) -> Result<MockBrush, NativeError> {
        if self.fail_brushes {
            return Err(FAILED);
        }
        self.log.push(Call::CreateBrush(color.components));
        Ok(MockBrush {
            id: self.next_id(),
            color: color.components,
        })
    }

    fn create_stroke_style(&mut self, properties: &StrokeProperties) -> Result<u32, NativeError> {
        self.log.push(Call::CreateStrokeStyle(properties.clone()));
        Ok(self.next_id())
    }

    fn create_gradient_stops(
        &mut self,
        stops: &[(f32, Color)],
    ) -> Result<Vec<(f32, Color)>, NativeError> {
        self.log.push(Call::CreateGradientStops(
            stops.iter().map(|(o, c)| (*o, c.components)).collect(),
        ));
        Ok(stops.to_vec())
    }

    fn create_linear_gradient_brush(
        &mut self,
        start: Point,
        end: Point,
        _stops: &Vec<(f32, Color)>,
    ) -> Result<MockBrush, NativeError> {
        if self.fail_brushes {
            return Err(FAILED);
        }
        self.log.push(Call::CreateLinearBrush(start, end));
        Ok(MockBrush {
            id: self.next_id(),
            color: [0.0; 4],
        })
    }

    fn create_radial_gradient_brush(
        &mut self,
        center: Point,
        origin_offset: Vec2,
        radius: f64,
        _stops: &Vec<(f32, Color)>,
    ) -> Result<MockBrush, NativeError> {
        if self.fail_brushes {
            return Err(FAILED);
        }
        self.log
            .push(Call::CreateRadialBrush(center, origin_offset, radius));
        Ok(MockBrush {
            id: self.next_id(),
            color: [0.0; 4],
        })
    }

    fn create_bitmap(&mut self, source: &MockSource) -> Result<MockBitmap, NativeError> {
        if self.fail_bitmaps {
            return Err(FAILED);
        }
        self.log.push(Call::CreateBitmap(source.id));
        Ok(MockBitmap {
            source_id: source.id,
            size: source.size,
        })
    }

    fn bitmap_size(&self, bitmap: &MockBitmap) -> Size {
        bitmap.size
    }

    fn draw_line(
        &mut self,
        p0: Point,
        p1: Point,
        _brush: &MockBrush,
        width: f64,
        _stroke: Option<&u32>,
    ) {
        self.log.push(Call::DrawLine(p0, p1, width));
    }

    fn fill_rectangle(&mut self, rect: Rect, _brush: &MockBrush) {
        self.log.push(Call::FillRect(rect));
    }

    fn draw_rectangle(&mut self, rect: Rect, _brush: &MockBrush, width: f64, _stroke: Option<&u32>) {
        self.log.push(Call::DrawRect(rect, width));
    }

    fn fill_ellipse(&mut self, center: Point, radii: Vec2, _brush: &MockBrush) {
        self.log.push(Call::FillEllipse(center, radii));
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        radii: Vec2,
        _brush: &MockBrush,
        width: f64,
        _stroke: Option<&u32>,
    ) {
        self.log.push(Call::DrawEllipse(center, radii, width));
    }

    fn fill_geometry(&mut self, geometry: &u32, _brush: &MockBrush) {
        self.log.push(Call::FillGeometry(*geometry));
    }

    fn draw_geometry(&mut self, geometry: &u32, _brush: &MockBrush, width: f64, _stroke: Option<&u32>) {
        self.log.push(Call::DrawGeometry(*geometry, width));
    }

    fn draw_bitmap(
        &mut self,
        _bitmap: &MockBitmap,
        dest: Rect,
        opacity: f32,
        interpolation: BitmapInterpolation,
        source: Rect,
    ) {
        self.log.push(Call::DrawBitmap {
            dest,
            opacity,
            interpolation,
            source,
        });
    }

    fn clear(&mut self, color: Color) {
        self.log.push(Call::Clear(color.components));
    }

    fn set_text_antialias_mode(&mut self, mode: TextAntialiasMode) {
        self.log.push(Call::SetTextAntialias(mode));
    }

    fn draw_text_layout(&mut self, origin: Point, _layout: &str, brush: &MockBrush) {
        self.log.push(Call::DrawText(origin, brush.color));
    }
}

pub struct MockDevice {
    pub id: NativeId,
    pub log: CallLog,
    pub fail_targets: bool,
}

impl MockDevice {
    pub fn new(id: NativeId) -> Self {
        Self {
            id,
            log: CallLog::default(),
            fail_targets: false,
        }
    }
}

impl NativeDevice for MockDevice {
    type Context = MockContext;

    fn id(&self) -> NativeId {
        self.id
    }

    fn create_bitmap_target(&self, source: &MockSource) -> Result<MockContext, NativeError> {
        if self.fail_targets {
            return Err(FAILED);
        }
        Ok(MockContext::with_log(source.size, self.log.clone()))
    }
}

pub struct TestBitmap {
    pub id: u64,
    pub source: Option<MockSource>,
    pub scale_factor: f64,
    pub size: Size,
}

impl TestBitmap {
    pub fn new(id: u64, width: f64, height: f64) -> Self {
        let size = Size::new(width, height);
        Self {
            id,
            source: Some(MockSource {
                id: id as u32,
                size,
            }),
            scale_factor: 1.0,
            size,
        }
    }
}

impl PlatformBitmap<MockContext> for TestBitmap {
    fn id(&self) -> u64 {
        self.id
    }

    fn native_source(&self) -> Option<&MockSource> {
        self.source.as_ref()
    }

    fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    fn size(&self) -> Size {
        self.size
    }
}
