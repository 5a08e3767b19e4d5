use std::sync::{Mutex, MutexGuard, PoisonError};

use kurbo::Size;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::context::ContextId;
use crate::native::NativeContext;

/// A platform bitmap the Direct2D backend can draw.
///
/// `native_source` is the decoded pixel source (a WIC bitmap on Windows); bitmaps without one
/// cannot be drawn or rendered into.
pub trait PlatformBitmap<N: NativeContext> {
    /// Stable identity used as the device-side cache key.
    fn id(&self) -> u64;
    fn native_source(&self) -> Option<&N::BitmapSource>;
    /// Physical pixels per logical unit.
    fn scale_factor(&self) -> f64;
    /// Size in physical pixels.
    fn size(&self) -> Size;
}

/// Device-owned cache of native bitmaps, one per (bitmap, context) pair.
pub struct BitmapCache<N: NativeContext> {
    entries: Mutex<FxHashMap<(u64, ContextId), N::Bitmap>>,
}

impl<N: NativeContext> Default for BitmapCache<N> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<N: NativeContext> BitmapCache<N> {
    fn entries(&self) -> MutexGuard<'_, FxHashMap<(u64, ContextId), N::Bitmap>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached native bitmap, creating it on `native` on a miss.
    pub fn get_or_create(
        &self,
        bitmap: &dyn PlatformBitmap<N>,
        context: ContextId,
        native: &mut N,
    ) -> Option<N::Bitmap> {
        let key = (bitmap.id(), context);
        if let Some(cached) = self.entries().get(&key) {
            return Some(cached.clone());
        }
        let source = bitmap.native_source()?;
        match native.create_bitmap(source) {
            Ok(created) => {
                self.entries().insert(key, created.clone());
                Some(created)
            }
            Err(err) => {
                warn!(%err, bitmap = bitmap.id(), "failed to create device bitmap");
                None
            }
        }
    }

    /// Drops every entry for `bitmap`; its pixels changed or it went away.
    pub fn remove_bitmap(&self, bitmap: u64) {
        self.entries().retain(|(id, _), _| *id != bitmap);
    }

    /// Drops every entry created for `context`.
    pub fn remove_context(&self, context: ContextId) {
        self.entries().retain(|(_, ctx), _| *ctx != context);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
