//! Backend-neutral platform graphics device API.
//!
//! Widget drawing code talks to a [`GraphicsDeviceContext`]: a stateful surface with
//! save/restore semantics, clip and transform setters, cached colors and line styles, and a
//! fixed set of primitives. Backends (see `gfx_device_d2d`) translate these calls into the
//! native rendering API while keeping the pixel conventions of the legacy software renderer:
//! half-open rectangles, half-pixel offsets for odd stroke widths and integral snapping.
//!
//! Geometry and colors are the linebender types (`kurbo`, `peniko`) so callers can share
//! them with the rest of the stack.

mod context;
mod draw;
mod error;

pub use context::{GraphicsDevice, GraphicsDeviceContext, GraphicsDeviceFactory, ScreenId};
pub use draw::{
    DrawMode, DrawStyle, InterpolationQuality, LineCap, LineJoin, LineStyle, PathDrawMode,
    make_integral_point, make_integral_rect, pixel_align_point, pixel_align_rect, rect_is_empty,
};
pub use error::{DrawError, DrawResult};

pub use kurbo;
pub use peniko;
pub use kurbo::{Affine, Line, Point, Rect, Size, Vec2};
pub use peniko::Color;
