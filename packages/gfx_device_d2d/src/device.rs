use std::fmt;
use std::sync::Arc;

use gfx_device::GraphicsDevice;
use kurbo::Affine;
use tracing::warn;

use crate::bitmap::{BitmapCache, PlatformBitmap};
use crate::context::D2DGraphicsDeviceContext;
use crate::native::{NativeDevice, NativeId};

struct DeviceInner<D: NativeDevice> {
    native: D,
    bitmap_cache: BitmapCache<D::Context>,
}

/// Shared handle to one native rendering device.
///
/// Clones share the device and its bitmap cache. Two handles are equal when they wrap the same
/// native device.
pub struct D2DGraphicsDevice<D: NativeDevice> {
    inner: Arc<DeviceInner<D>>,
}

impl<D: NativeDevice> D2DGraphicsDevice<D> {
    pub fn new(native: D) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                native,
                bitmap_cache: BitmapCache::default(),
            }),
        }
    }

    pub fn native(&self) -> &D {
        &self.inner.native
    }

    pub fn id(&self) -> NativeId {
        self.inner.native.id()
    }

    pub fn bitmap_cache(&self) -> &BitmapCache<D::Context> {
        &self.inner.bitmap_cache
    }
}

impl<D: NativeDevice> Clone for D2DGraphicsDevice<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: NativeDevice> PartialEq for D2DGraphicsDevice<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<D: NativeDevice> Eq for D2DGraphicsDevice<D> {}

impl<D: NativeDevice> fmt::Debug for D2DGraphicsDevice<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("D2DGraphicsDevice")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("cached_bitmaps", &self.bitmap_cache().len())
            .finish()
    }
}

impl<D: NativeDevice> GraphicsDevice for D2DGraphicsDevice<D> {
    type Context = D2DGraphicsDeviceContext<D>;
    type Bitmap = dyn PlatformBitmap<D::Context>;

    /// Binds a new render target to `bitmap`. The bitmap's scale factor becomes the context's
    /// global transform, and device bitmaps made from its old pixels are dropped.
    fn create_bitmap_context(&self, bitmap: &Self::Bitmap) -> Option<Self::Context> {
        let source = bitmap.native_source()?;
        let native = match self.native().create_bitmap_target(source) {
            Ok(native) => native,
            Err(err) => {
                warn!(%err, bitmap = bitmap.id(), "failed to create bitmap render target");
                return None;
            }
        };
        self.bitmap_cache().remove_bitmap(bitmap.id());
        Some(D2DGraphicsDeviceContext::new(
            self.clone(),
            native,
            Affine::scale(bitmap.scale_factor()),
        ))
    }
}
