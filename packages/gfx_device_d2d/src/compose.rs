use std::ops::{Deref, DerefMut};

use kurbo::Affine;

use crate::native::{AntialiasMode, NativeContext};

/// Holds the native context for the duration of one draw call.
///
/// The native transform captured at creation is put back on drop, after popping the clip
/// layer if one was pushed through [`push_clip_layer`](Self::push_clip_layer).
pub(crate) struct TransformGuard<'a, N: NativeContext> {
    native: &'a mut N,
    saved: Affine,
    layer_pushed: bool,
}

impl<'a, N: NativeContext> TransformGuard<'a, N> {
    pub fn new(native: &'a mut N) -> Self {
        let saved = native.transform();
        Self {
            native,
            saved,
            layer_pushed: false,
        }
    }

    pub fn saved(&self) -> Affine {
        self.saved
    }

    pub fn push_clip_layer(&mut self, mask: &N::Geometry) {
        debug_assert!(!self.layer_pushed, "one clip layer per draw call");
        self.native.push_layer(mask, AntialiasMode::Aliased);
        self.layer_pushed = true;
    }
}

impl<N: NativeContext> Deref for TransformGuard<'_, N> {
    type Target = N;

    fn deref(&self) -> &N {
        self.native
    }
}

impl<N: NativeContext> DerefMut for TransformGuard<'_, N> {
    fn deref_mut(&mut self) -> &mut N {
        self.native
    }
}

impl<N: NativeContext> Drop for TransformGuard<'_, N> {
    fn drop(&mut self) {
        if self.layer_pushed {
            self.native.pop_layer();
        }
        self.native.set_transform(self.saved);
    }
}

/// Rotation or shear: the device's axis-aligned clip can no longer express the clip rect.
pub(crate) fn has_rotation(transform: &Affine) -> bool {
    let [_, b, c, _, _, _] = transform.as_coeffs();
    b != 0.0 || c != 0.0
}
