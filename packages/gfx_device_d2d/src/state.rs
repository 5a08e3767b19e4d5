use gfx_device::{DrawMode, LineStyle, pixel_align_point};
use kurbo::{Affine, Line, Point, Rect, Vec2};
use peniko::Color;
use tracing::warn;

use crate::native::{NativeContext, StrokeProperties};

/// The saved/restored part of a context.
///
/// Cached native resources are only valid for the fields that produced them; setters clear
/// them and [`Painter`] recreates them on the next use.
pub(crate) struct DrawState<N: NativeContext> {
    pub clip: Rect,
    pub line_style: LineStyle,
    pub draw_mode: DrawMode,
    pub line_width: f64,
    pub global_alpha: f64,
    pub fill_color: Color,
    pub frame_color: Color,
    pub font_color: Color,
    pub transform: Affine,
    pub stroke_style: Option<N::StrokeStyle>,
    pub fill_brush: Option<N::Brush>,
    pub frame_brush: Option<N::Brush>,
    pub font_brush: Option<N::Brush>,
}

impl<N: NativeContext> DrawState<N> {
    pub fn new(clip: Rect) -> Self {
        Self {
            clip,
            line_style: LineStyle::solid(),
            draw_mode: DrawMode::default(),
            line_width: 1.0,
            global_alpha: 1.0,
            fill_color: Color::TRANSPARENT,
            frame_color: Color::TRANSPARENT,
            font_color: Color::TRANSPARENT,
            transform: Affine::IDENTITY,
            stroke_style: None,
            fill_brush: None,
            frame_brush: None,
            font_brush: None,
        }
    }

    /// Half-pixel nudge that centers odd integral stroke widths on device pixels.
    pub fn line_width_offset(&self) -> Vec2 {
        let truncated = self.line_width as i32;
        if truncated as f64 == self.line_width && truncated % 2 != 0 {
            Vec2::new(0.5, 0.5)
        } else {
            Vec2::ZERO
        }
    }

    pub fn snap_point(&self, p: Point) -> Point {
        if self.draw_mode.integral_mode() {
            pixel_align_point(&self.transform, p)
        } else {
            p
        }
    }

    pub fn snap_line(&self, line: Line) -> (Point, Point) {
        (self.snap_point(line.p0), self.snap_point(line.p1))
    }

    pub fn clear_brushes(&mut self) {
        self.fill_brush = None;
        self.frame_brush = None;
        self.font_brush = None;
    }
}

impl<N: NativeContext> Clone for DrawState<N> {
    fn clone(&self) -> Self {
        Self {
            clip: self.clip,
            line_style: self.line_style.clone(),
            draw_mode: self.draw_mode,
            line_width: self.line_width,
            global_alpha: self.global_alpha,
            fill_color: self.fill_color,
            frame_color: self.frame_color,
            font_color: self.font_color,
            transform: self.transform,
            stroke_style: self.stroke_style.clone(),
            fill_brush: self.fill_brush.clone(),
            frame_brush: self.frame_brush.clone(),
            font_brush: self.font_brush.clone(),
        }
    }
}

pub(crate) fn color_with_alpha(color: Color, alpha: f64) -> Color {
    color.with_alpha(color.components[3] * alpha as f32)
}

/// What a draw closure gets: the composed native context and the current state.
pub(crate) struct Painter<'a, N: NativeContext> {
    pub native: &'a mut N,
    pub state: &'a mut DrawState<N>,
    pub miter_limit: f32,
}

impl<N: NativeContext> Painter<'_, N> {
    pub fn fill_brush(&mut self) -> Option<N::Brush> {
        if self.state.fill_brush.is_none() {
            let color = color_with_alpha(self.state.fill_color, self.state.global_alpha);
            self.state.fill_brush = solid_brush(self.native, color, "fill");
        }
        self.state.fill_brush.clone()
    }

    pub fn frame_brush(&mut self) -> Option<N::Brush> {
        if self.state.frame_brush.is_none() {
            let color = color_with_alpha(self.state.frame_color, self.state.global_alpha);
            self.state.frame_brush = solid_brush(self.native, color, "frame");
        }
        self.state.frame_brush.clone()
    }

    pub fn font_brush(&mut self, color: Color) -> Option<N::Brush> {
        if self.state.font_color.components != color.components {
            self.state.font_color = color;
            self.state.font_brush = None;
        }
        if self.state.font_brush.is_none() {
            let color = color_with_alpha(self.state.font_color, self.state.global_alpha);
            self.state.font_brush = solid_brush(self.native, color, "font");
        }
        self.state.font_brush.clone()
    }

    pub fn stroke_style(&mut self) -> Option<N::StrokeStyle> {
        if self.state.stroke_style.is_none() {
            let properties =
                StrokeProperties::from_line_style(&self.state.line_style, self.miter_limit);
            match self.native.create_stroke_style(&properties) {
                Ok(style) => self.state.stroke_style = Some(style),
                Err(err) => warn!(%err, "failed to create stroke style"),
            }
        }
        self.state.stroke_style.clone()
    }
}

fn solid_brush<N: NativeContext>(native: &mut N, color: Color, role: &str) -> Option<N::Brush> {
    match native.create_solid_brush(color) {
        Ok(brush) => Some(brush),
        Err(err) => {
            warn!(%err, role, "failed to create solid brush");
            None
        }
    }
}
