use kurbo::{Affine, Line, Point, Rect};
use peniko::Color;

use crate::{DrawMode, DrawResult, DrawStyle, InterpolationQuality, LineStyle, PathDrawMode};

/// Identifies an output (screen) a device should render for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenId(pub u64);

/// A stateful drawing surface bound to one render target.
///
/// All state lives in a current draw state that [`save_global_state`] pushes and
/// [`restore_global_state`] pops. Contexts are single-threaded: callers serialize access.
///
/// [`save_global_state`]: GraphicsDeviceContext::save_global_state
/// [`restore_global_state`]: GraphicsDeviceContext::restore_global_state
pub trait GraphicsDeviceContext {
    type Device: GraphicsDevice;
    type Bitmap: ?Sized;
    type Path: ?Sized;
    type Gradient: ?Sized;

    fn device(&self) -> &Self::Device;

    fn begin_draw(&mut self) -> bool;
    /// Ends the session started by [`begin_draw`](Self::begin_draw). Calling it without a
    /// matching begin is a no-op.
    fn end_draw(&mut self) -> bool;

    fn draw_line(&mut self, line: Line) -> DrawResult;
    fn draw_lines(&mut self, lines: &[Line]) -> DrawResult;
    fn draw_polygon(&mut self, points: &[Point], style: DrawStyle) -> DrawResult;
    fn draw_rect(&mut self, rect: Rect, style: DrawStyle) -> DrawResult;
    /// Angles are in degrees, measured clockwise from the positive x axis.
    fn draw_arc(
        &mut self,
        rect: Rect,
        start_angle: f64,
        end_angle: f64,
        style: DrawStyle,
    ) -> DrawResult;
    fn draw_ellipse(&mut self, rect: Rect, style: DrawStyle) -> DrawResult;
    fn draw_point(&mut self, point: Point, color: Color) -> DrawResult;
    fn draw_bitmap(
        &mut self,
        bitmap: &Self::Bitmap,
        dest: Rect,
        offset: Point,
        alpha: f64,
        quality: InterpolationQuality,
    ) -> DrawResult;
    fn clear_rect(&mut self, rect: Rect) -> DrawResult;
    fn draw_graphics_path(
        &mut self,
        path: &Self::Path,
        mode: PathDrawMode,
        transform: Option<&Affine>,
    ) -> DrawResult;
    #[allow(clippy::too_many_arguments)]
    fn fill_linear_gradient(
        &mut self,
        path: &Self::Path,
        gradient: &Self::Gradient,
        start: Point,
        end: Point,
        even_odd: bool,
        transform: Option<&Affine>,
    ) -> DrawResult;
    #[allow(clippy::too_many_arguments)]
    fn fill_radial_gradient(
        &mut self,
        path: &Self::Path,
        gradient: &Self::Gradient,
        center: Point,
        radius: f64,
        origin_offset: Point,
        even_odd: bool,
        transform: Option<&Affine>,
    ) -> DrawResult;

    fn save_global_state(&mut self);
    fn restore_global_state(&mut self) -> DrawResult;

    fn set_line_style(&mut self, style: &LineStyle);
    fn set_line_width(&mut self, width: f64);
    fn set_draw_mode(&mut self, mode: DrawMode);
    fn set_clip_rect(&mut self, clip: Rect);
    fn set_fill_color(&mut self, color: Color);
    fn set_frame_color(&mut self, color: Color);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_transform_matrix(&mut self, transform: Affine);
}

/// A rendering device able to create contexts for offscreen bitmaps.
pub trait GraphicsDevice {
    type Context;
    type Bitmap: ?Sized;

    fn create_bitmap_context(&self, bitmap: &Self::Bitmap) -> Option<Self::Context>;
}

/// Registry of the devices available to the process.
pub trait GraphicsDeviceFactory {
    type Device;

    fn device_for_screen(&self, screen: ScreenId) -> Option<Self::Device>;
}
