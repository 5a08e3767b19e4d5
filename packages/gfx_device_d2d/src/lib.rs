//! Direct2D backend for the `gfx_device` abstraction.
//!
//! The backend emulates the software renderer's contract on top of Direct2D:
//!
//! 1. Draw state (clip, transform, colors, line style) is saved and restored on a stack that
//!    Direct2D knows nothing about.
//! 2. Every primitive runs inside a composition step that applies the effective transform and
//!    clip to the native context and restores the native transform afterwards. Axis-aligned
//!    clips stay pushed across calls until they change; rotated transforms fall back to a
//!    layer masked by the clip rectangle, popped after the call.
//! 3. Solid brushes and stroke styles are cached in the draw state and dropped as soon as the
//!    color, alpha or line style that produced them changes.
//!
//! The native API is reached through [`NativeContext`] / [`NativeDevice`]; on Windows these
//! are implemented by `native::direct2d` on top of the `windows` crate.

use std::sync::atomic::{AtomicBool, Ordering};

// Runtime-switchable verbose logging (disabled by default for perf)
static VERBOSE_LOG: AtomicBool = AtomicBool::new(false);

pub fn set_verbose_logging(enabled: bool) {
    VERBOSE_LOG.store(enabled, Ordering::Relaxed);
}

pub fn verbose_logging() -> bool {
    VERBOSE_LOG.load(Ordering::Relaxed)
}

// Skips formatting entirely while verbose logging is off.
macro_rules! vlog {
    ($($t:tt)*) => {
        if $crate::verbose_logging() {
            tracing::trace!($($t)*);
        }
    };
}

mod bitmap;
mod compose;
mod config;
mod context;
mod device;
mod factory;
mod gradient;
pub mod native;
mod path;
mod state;

#[cfg(test)]
mod testing;

pub use bitmap::{BitmapCache, PlatformBitmap};
pub use config::D2DContextConfig;
pub use context::{ContextId, D2DGraphicsDeviceContext};
pub use device::D2DGraphicsDevice;
pub use factory::D2DGraphicsDeviceFactory;
pub use gradient::{D2DGradient, NativeGradient, PlatformGradient};
pub use native::{NativeContext, NativeDevice, NativeError, NativeId};
pub use path::{D2DGraphicsPath, D2DGraphicsPathFactory, NativePath, PlatformGraphicsPath};

#[cfg(windows)]
pub use native::direct2d::{Direct2DContext, Direct2DDevice};
