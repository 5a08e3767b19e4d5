use std::sync::atomic::{AtomicU64, Ordering};

use gfx_device::{
    DrawError, DrawMode, DrawResult, DrawStyle, GraphicsDeviceContext, InterpolationQuality,
    LineStyle, PathDrawMode, make_integral_point, make_integral_rect, pixel_align_rect,
    rect_is_empty,
};
use kurbo::{Affine, Line, Point, Rect, Vec2};
use peniko::{Color, Fill};
use tracing::{debug, warn};

use crate::bitmap::PlatformBitmap;
use crate::compose::{TransformGuard, has_rotation};
use crate::config::D2DContextConfig;
use crate::device::D2DGraphicsDevice;
use crate::gradient::PlatformGradient;
use crate::native::{
    AntialiasMode, BitmapInterpolation, NativeContext, NativeDevice, TextAntialiasMode,
};
use crate::path::{D2DGraphicsPath, D2DGraphicsPathFactory, PlatformGraphicsPath};
use crate::state::{DrawState, Painter};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a context, used to key device-side caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

type Native<D> = <D as NativeDevice>::Context;

/// A drawing context on top of one native Direct2D device context.
///
/// The native context only sees the effective transform of the current call and, outside of
/// rotated draws, the device-space clip of the most recently composed state. Both are put
/// back into a clean state by [`end_draw`](GraphicsDeviceContext::end_draw), which also runs on
/// drop.
pub struct D2DGraphicsDeviceContext<D: NativeDevice> {
    device: D2DGraphicsDevice<D>,
    native: Native<D>,
    id: ContextId,
    config: D2DContextConfig,
    state: DrawState<Native<D>>,
    state_stack: Vec<DrawState<Native<D>>>,
    scale_factor: f64,
    /// Device-space clip on the native context. `Some(empty)` means applied with nothing
    /// pushed.
    applied_clip: Option<Rect>,
    begin_draw_called: bool,
    global_transform: Affine,
}

impl<D: NativeDevice> D2DGraphicsDeviceContext<D> {
    pub fn new(device: D2DGraphicsDevice<D>, native: Native<D>, global_transform: Affine) -> Self {
        Self::with_config(device, native, global_transform, D2DContextConfig::from_env())
    }

    pub fn with_config(
        device: D2DGraphicsDevice<D>,
        native: Native<D>,
        global_transform: Affine,
        config: D2DContextConfig,
    ) -> Self {
        if config.verbose_logging {
            crate::set_verbose_logging(true);
        }
        let target = Rect::from_origin_size(Point::ZERO, native.size());
        let clip = global_transform.inverse().transform_rect_bbox(target);
        let id = ContextId::next();
        debug!(context = id.get(), ?clip, "created device context");
        Self {
            device,
            native,
            id,
            config,
            state: DrawState::new(clip),
            state_stack: Vec::new(),
            scale_factor: 1.0,
            applied_clip: None,
            begin_draw_called: false,
            global_transform,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn native(&self) -> &Native<D> {
        &self.native
    }

    pub fn config(&self) -> &D2DContextConfig {
        &self.config
    }

    pub fn graphics_path_factory(&self) -> D2DGraphicsPathFactory {
        D2DGraphicsPathFactory
    }

    pub fn global_transform(&self) -> Affine {
        self.global_transform
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    pub fn state_depth(&self) -> usize {
        self.state_stack.len()
    }

    pub fn clip_rect(&self) -> Rect {
        self.state.clip
    }

    pub fn transform_matrix(&self) -> Affine {
        self.state.transform
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    pub fn line_style(&self) -> &LineStyle {
        &self.state.line_style
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.state.draw_mode
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    pub fn fill_color(&self) -> Color {
        self.state.fill_color
    }

    pub fn frame_color(&self) -> Color {
        self.state.frame_color
    }

    /// Applies the current transform and clip to the native context and runs `draw`.
    ///
    /// Returns `None` without touching the native context when the logical clip is empty.
    fn compose<R>(
        &mut self,
        offset: Vec2,
        draw: impl FnOnce(&mut Painter<'_, Native<D>>) -> R,
    ) -> Option<R> {
        if rect_is_empty(&self.state.clip) {
            vlog!("compose: empty clip {:?}", self.state.clip);
            return None;
        }
        let mut guard = TransformGuard::new(&mut self.native);
        let transform = guard.saved()
            * self.global_transform
            * self.state.transform
            * Affine::scale(self.scale_factor)
            * Affine::translate(offset);
        let device_clip = self.global_transform.transform_rect_bbox(self.state.clip);

        let mut layered = false;
        if self.config.rotated_clip_layers && has_rotation(&transform) {
            match guard.create_rectangle_geometry(device_clip) {
                Ok(mask) => {
                    if let Some(applied) = self.applied_clip.take() {
                        if !rect_is_empty(&applied) {
                            guard.pop_axis_aligned_clip();
                        }
                    }
                    guard.push_clip_layer(&mask);
                    layered = true;
                    vlog!("compose: layer clip {:?}", device_clip);
                }
                Err(err) => debug!(%err, "clip layer unavailable, using axis-aligned clip"),
            }
        }
        if !layered && self.applied_clip != Some(device_clip) {
            if let Some(applied) = self.applied_clip {
                if !rect_is_empty(&applied) {
                    guard.pop_axis_aligned_clip();
                }
            }
            if !rect_is_empty(&device_clip) {
                guard.push_axis_aligned_clip(device_clip, AntialiasMode::Aliased);
            }
            self.applied_clip = Some(device_clip);
            vlog!("compose: axis clip {:?}", device_clip);
        }
        guard.set_transform(transform);

        let mut painter = Painter {
            native: &mut *guard,
            state: &mut self.state,
            miter_limit: self.config.miter_limit,
        };
        Some(draw(&mut painter))
    }

    fn fill_path(
        &mut self,
        path: &dyn PlatformGraphicsPath<Native<D>>,
        fill: Fill,
        transform: Option<&Affine>,
        brush: impl FnOnce(&mut Native<D>) -> Option<<Native<D> as NativeContext>::Brush>,
    ) -> DrawResult {
        let path = path.as_native().ok_or(DrawError::IncompatiblePath)?;
        self.compose(Vec2::ZERO, |p| {
            let Some(brush) = brush(p.native) else {
                return;
            };
            let geometry = match transform {
                Some(tm) => path.transformed_geometry(p.native, tm, fill),
                None => path.geometry(p.native, fill),
            };
            if let Some(geometry) = geometry {
                p.native.fill_geometry(&geometry, &brush);
            }
        });
        Ok(())
    }

    fn draw_shape_path(&mut self, path: &D2DGraphicsPath, style: DrawStyle) -> DrawResult {
        if style.fills() {
            self.draw_graphics_path(path, PathDrawMode::Filled, None)?;
        }
        if style.strokes() {
            self.draw_graphics_path(path, PathDrawMode::Stroked, None)?;
        }
        Ok(())
    }

    /// Draws a pre-shaped text layout with its origin at `pos`.
    pub fn draw_text_layout(
        &mut self,
        layout: &<Native<D> as NativeContext>::TextLayout,
        pos: Point,
        color: Color,
        antialias: bool,
    ) -> DrawResult {
        self.compose(Vec2::ZERO, |p| {
            p.native.set_text_antialias_mode(if antialias {
                TextAntialiasMode::ClearType
            } else {
                TextAntialiasMode::Aliased
            });
            let mut origin = pos;
            if p.state.draw_mode.integral_mode() {
                origin = make_integral_point(origin);
            }
            origin.y += 0.5;
            if let Some(brush) = p.font_brush(color) {
                p.native.draw_text_layout(origin, layout, &brush);
            }
        });
        Ok(())
    }
}

impl<D: NativeDevice> GraphicsDeviceContext for D2DGraphicsDeviceContext<D> {
    type Device = D2DGraphicsDevice<D>;
    type Bitmap = dyn PlatformBitmap<Native<D>>;
    type Path = dyn PlatformGraphicsPath<Native<D>>;
    type Gradient = dyn PlatformGradient<Native<D>>;

    fn device(&self) -> &D2DGraphicsDevice<D> {
        &self.device
    }

    fn begin_draw(&mut self) -> bool {
        self.begin_draw_called = true;
        self.native.begin_draw();
        true
    }

    fn end_draw(&mut self) -> bool {
        if let Some(applied) = self.applied_clip.take() {
            if !rect_is_empty(&applied) {
                self.native.pop_axis_aligned_clip();
            }
        }
        if !self.begin_draw_called {
            return true;
        }
        self.begin_draw_called = false;
        match self.native.end_draw() {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, context = self.id.get(), "EndDraw failed");
                false
            }
        }
    }

    fn draw_line(&mut self, line: Line) -> DrawResult {
        self.draw_lines(&[line])
    }

    fn draw_lines(&mut self, lines: &[Line]) -> DrawResult {
        let offset = self.state.line_width_offset();
        self.compose(offset, |p| {
            let Some(brush) = p.frame_brush() else {
                return;
            };
            let stroke = p.stroke_style();
            for line in lines {
                let (p0, p1) = p.state.snap_line(*line);
                p.native
                    .draw_line(p0, p1, &brush, p.state.line_width, stroke.as_ref());
            }
        });
        Ok(())
    }

    fn draw_polygon(&mut self, points: &[Point], style: DrawStyle) -> DrawResult {
        let (first, rest) = points.split_first().ok_or(DrawError::EmptyPolygon)?;
        let mut path = self.graphics_path_factory().create_path();
        path.begin_subpath(*first);
        for point in rest {
            path.add_line(*point);
        }
        self.draw_shape_path(&path, style)
    }

    fn draw_rect(&mut self, rect: Rect, style: DrawStyle) -> DrawResult {
        let offset = self.state.line_width_offset();
        self.compose(Vec2::ZERO, |p| {
            let mut rect = rect;
            if style != DrawStyle::Filled {
                rect.x1 -= 1.0;
                rect.y1 -= 1.0;
            }
            if style.fills() {
                if let Some(brush) = p.fill_brush() {
                    p.native.fill_rectangle(rect, &brush);
                }
            }
            if style.strokes() {
                if let Some(brush) = p.frame_brush() {
                    let stroke = p.stroke_style();
                    p.native.draw_rectangle(
                        rect + offset,
                        &brush,
                        p.state.line_width,
                        stroke.as_ref(),
                    );
                }
            }
        });
        Ok(())
    }

    fn draw_arc(
        &mut self,
        rect: Rect,
        start_angle: f64,
        end_angle: f64,
        style: DrawStyle,
    ) -> DrawResult {
        let rect = if self.state.draw_mode.integral_mode() {
            pixel_align_rect(&self.state.transform, rect)
        } else {
            rect
        };
        let mut path = self.graphics_path_factory().create_path();
        path.add_arc(rect, start_angle, end_angle, true);
        self.draw_shape_path(&path, style)
    }

    fn draw_ellipse(&mut self, rect: Rect, style: DrawStyle) -> DrawResult {
        self.compose(Vec2::ZERO, |p| {
            let mut rect = rect;
            if p.state.draw_mode.integral_mode() {
                rect = pixel_align_rect(&p.state.transform, rect);
            }
            if style == DrawStyle::Stroked {
                rect = rect.inset(-0.5);
            }
            let center = rect.center();
            let radii = Vec2::new(rect.width() / 2.0, rect.height() / 2.0);
            if style.fills() {
                if let Some(brush) = p.fill_brush() {
                    p.native.fill_ellipse(center, radii, &brush);
                }
            }
            if style.strokes() {
                if let Some(brush) = p.frame_brush() {
                    let stroke = p.stroke_style();
                    p.native
                        .draw_ellipse(center, radii, &brush, p.state.line_width, stroke.as_ref());
                }
            }
        });
        Ok(())
    }

    fn draw_point(&mut self, _point: Point, _color: Color) -> DrawResult {
        Err(DrawError::Unsupported)
    }

    fn draw_bitmap(
        &mut self,
        bitmap: &Self::Bitmap,
        dest: Rect,
        offset: Point,
        alpha: f64,
        quality: InterpolationQuality,
    ) -> DrawResult {
        if bitmap.native_source().is_none() {
            return Err(DrawError::MissingBitmapSource);
        }
        if rect_is_empty(&self.state.clip) {
            return Ok(());
        }
        let native_bitmap = self
            .device
            .bitmap_cache()
            .get_or_create(bitmap, self.id, &mut self.native)
            .ok_or(DrawError::BitmapUnavailable)?;

        let scale = match bitmap.scale_factor() {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let original = self.state.transform;
        self.state.transform = original * Affine::scale(1.0 / scale);
        let dest = Affine::scale(scale).transform_rect_bbox(dest);
        let interpolation = match quality {
            InterpolationQuality::Low => BitmapInterpolation::NearestNeighbor,
            _ => BitmapInterpolation::Linear,
        };
        let opacity = (alpha * self.state.global_alpha) as f32;
        self.compose(Vec2::ZERO, |p| {
            let d = Rect::from_origin_size(dest.origin(), bitmap.size()) - offset.to_vec2();
            let source = Rect::from_origin_size(Point::ZERO, p.native.bitmap_size(&native_bitmap));
            p.native.draw_bitmap(
                &native_bitmap,
                make_integral_rect(d),
                opacity,
                interpolation,
                source,
            );
        });
        self.state.transform = original;
        Ok(())
    }

    fn clear_rect(&mut self, rect: Rect) -> DrawResult {
        if rect_is_empty(&self.state.clip) || rect_is_empty(&rect) {
            return Ok(());
        }
        let transform = self.global_transform * self.state.transform;
        let mut guard = TransformGuard::new(&mut self.native);
        guard.set_transform(transform);
        guard.push_axis_aligned_clip(rect, AntialiasMode::Aliased);
        guard.clear(Color::new([1.0, 1.0, 1.0, 0.0]));
        guard.pop_axis_aligned_clip();
        Ok(())
    }

    fn draw_graphics_path(
        &mut self,
        path: &Self::Path,
        mode: PathDrawMode,
        transform: Option<&Affine>,
    ) -> DrawResult {
        let native_path = path.as_native().ok_or(DrawError::IncompatiblePath)?;
        let fill = match mode {
            PathDrawMode::FilledEvenOdd => Fill::EvenOdd,
            _ => Fill::NonZero,
        };
        self.compose(Vec2::ZERO, |p| {
            let brush = match mode {
                PathDrawMode::Stroked => p.frame_brush(),
                _ => p.fill_brush(),
            };
            let Some(brush) = brush else {
                return;
            };
            let geometry = match transform {
                Some(tm) => native_path.transformed_geometry(p.native, tm, fill),
                None => native_path.geometry(p.native, fill),
            };
            let Some(geometry) = geometry else {
                return;
            };
            match mode {
                PathDrawMode::Stroked => {
                    let stroke = p.stroke_style();
                    p.native
                        .draw_geometry(&geometry, &brush, p.state.line_width, stroke.as_ref());
                }
                _ => p.native.fill_geometry(&geometry, &brush),
            }
        });
        Ok(())
    }

    fn fill_linear_gradient(
        &mut self,
        path: &Self::Path,
        gradient: &Self::Gradient,
        start: Point,
        end: Point,
        even_odd: bool,
        transform: Option<&Affine>,
    ) -> DrawResult {
        path.as_native().ok_or(DrawError::IncompatiblePath)?;
        let gradient = gradient
            .as_native()
            .ok_or(DrawError::IncompatibleGradient)?;
        let alpha = self.state.global_alpha as f32;
        self.fill_path(path, fill_rule(even_odd), transform, |native| {
            let stops = gradient.create_stops(native, alpha)?;
            native
                .create_linear_gradient_brush(start, end, &stops)
                .map_err(|err| warn!(%err, "failed to create linear gradient brush"))
                .ok()
        })
    }

    fn fill_radial_gradient(
        &mut self,
        path: &Self::Path,
        gradient: &Self::Gradient,
        center: Point,
        radius: f64,
        origin_offset: Point,
        even_odd: bool,
        transform: Option<&Affine>,
    ) -> DrawResult {
        path.as_native().ok_or(DrawError::IncompatiblePath)?;
        let gradient = gradient
            .as_native()
            .ok_or(DrawError::IncompatibleGradient)?;
        let alpha = self.state.global_alpha as f32;
        self.fill_path(path, fill_rule(even_odd), transform, |native| {
            let stops = gradient.create_stops(native, alpha)?;
            native
                .create_radial_gradient_brush(center, origin_offset.to_vec2(), radius, &stops)
                .map_err(|err| warn!(%err, "failed to create radial gradient brush"))
                .ok()
        })
    }

    fn save_global_state(&mut self) {
        self.state_stack.push(self.state.clone());
    }

    fn restore_global_state(&mut self) -> DrawResult {
        match self.state_stack.pop() {
            Some(state) => {
                self.state = state;
                Ok(())
            }
            None => {
                warn!(context = self.id.get(), "restore without a matching save");
                Err(DrawError::UnbalancedRestore)
            }
        }
    }

    fn set_line_style(&mut self, style: &LineStyle) {
        if self.state.line_style != *style {
            self.state.line_style = style.clone();
            self.state.stroke_style = None;
        }
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_draw_mode(&mut self, mode: DrawMode) {
        self.state.draw_mode = mode;
    }

    fn set_clip_rect(&mut self, clip: Rect) {
        self.state.clip = clip;
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color.components != color.components {
            self.state.fill_color = color;
            self.state.fill_brush = None;
        }
    }

    fn set_frame_color(&mut self, color: Color) {
        if self.state.frame_color.components != color.components {
            self.state.frame_color = color;
            self.state.frame_brush = None;
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if self.state.global_alpha != alpha {
            self.state.global_alpha = alpha;
            self.state.clear_brushes();
        }
    }

    fn set_transform_matrix(&mut self, transform: Affine) {
        self.state.transform = transform;
    }
}

fn fill_rule(even_odd: bool) -> Fill {
    if even_odd { Fill::EvenOdd } else { Fill::NonZero }
}

impl<D: NativeDevice> Drop for D2DGraphicsDeviceContext<D> {
    fn drop(&mut self) {
        self.end_draw();
        self.device.bitmap_cache().remove_context(self.id);
    }
}
