use peniko::Color;
use tracing::warn;

use crate::native::NativeContext;
use crate::state::color_with_alpha;

/// A gradient handed to the context. Only gradients made by this backend expose a native view.
pub trait PlatformGradient<N: NativeContext> {
    fn as_native(&self) -> Option<&dyn NativeGradient<N>>;
}

pub trait NativeGradient<N: NativeContext> {
    /// Builds the native stop collection with every stop's alpha scaled by `global_alpha`.
    fn create_stops(&self, native: &mut N, global_alpha: f32) -> Option<N::GradientStops>;
}

/// Color stops ordered by offset.
#[derive(Clone, Debug, Default)]
pub struct D2DGradient {
    stops: Vec<(f32, Color)>,
}

impl D2DGradient {
    pub fn new(stops: impl IntoIterator<Item = (f32, Color)>) -> Self {
        let mut gradient = Self::default();
        for (offset, color) in stops {
            gradient.add_color_stop(offset, color);
        }
        gradient
    }

    /// Inserts after any existing stop at the same offset.
    pub fn add_color_stop(&mut self, offset: f32, color: Color) {
        let index = self.stops.partition_point(|(o, _)| *o <= offset);
        self.stops.insert(index, (offset, color));
    }

    pub fn stops(&self) -> &[(f32, Color)] {
        &self.stops
    }
}

impl<N: NativeContext> PlatformGradient<N> for D2DGradient {
    fn as_native(&self) -> Option<&dyn NativeGradient<N>> {
        Some(self)
    }
}

impl<N: NativeContext> NativeGradient<N> for D2DGradient {
    fn create_stops(&self, native: &mut N, global_alpha: f32) -> Option<N::GradientStops> {
        let stops: Vec<_> = self
            .stops
            .iter()
            .map(|(offset, color)| (*offset, color_with_alpha(*color, global_alpha as f64)))
            .collect();
        match native.create_gradient_stops(&stops) {
            Ok(collection) => Some(collection),
            Err(err) => {
                warn!(%err, "failed to create gradient stop collection");
                None
            }
        }
    }
}
