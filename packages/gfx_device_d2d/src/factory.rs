use std::sync::{Mutex, MutexGuard, PoisonError};

use gfx_device::{GraphicsDeviceFactory, ScreenId};
use tracing::debug;

use crate::device::D2DGraphicsDevice;
use crate::native::{NativeDevice, NativeId};

/// Registry of the devices the process renders with.
///
/// Lookups by screen return the first registered device: every device is assumed able to
/// render for every output.
pub struct D2DGraphicsDeviceFactory<D: NativeDevice> {
    devices: Mutex<Vec<D2DGraphicsDevice<D>>>,
}

impl<D: NativeDevice> Default for D2DGraphicsDeviceFactory<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: NativeDevice> D2DGraphicsDeviceFactory<D> {
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
        }
    }

    fn devices(&self) -> MutexGuard<'_, Vec<D2DGraphicsDevice<D>>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn find(&self, native: NativeId) -> Option<D2DGraphicsDevice<D>> {
        self.devices().iter().find(|d| d.id() == native).cloned()
    }

    pub fn add_device(&self, device: D2DGraphicsDevice<D>) {
        debug!(device = device.id(), "registering graphics device");
        self.devices().push(device);
    }

    /// Unregisters `device`; does nothing if it was never added.
    pub fn remove_device(&self, device: &D2DGraphicsDevice<D>) {
        let mut devices = self.devices();
        if let Some(index) = devices.iter().position(|d| d == device) {
            devices.remove(index);
            debug!(device = device.id(), "unregistered graphics device");
        }
    }

    pub fn len(&self) -> usize {
        self.devices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices().is_empty()
    }

    /// Releases every registered device.
    pub fn clear(&self) {
        self.devices().clear();
    }
}

impl<D: NativeDevice> GraphicsDeviceFactory for D2DGraphicsDeviceFactory<D> {
    type Device = D2DGraphicsDevice<D>;

    fn device_for_screen(&self, _screen: ScreenId) -> Option<D2DGraphicsDevice<D>> {
        self.devices().first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDevice;

    #[test]
    fn any_screen_gets_the_first_device() {
        let factory = D2DGraphicsDeviceFactory::<MockDevice>::new();
        assert!(factory.device_for_screen(ScreenId(0)).is_none());

        let first = D2DGraphicsDevice::new(MockDevice::new(10));
        factory.add_device(first.clone());
        factory.add_device(D2DGraphicsDevice::new(MockDevice::new(20)));
        assert_eq!(factory.device_for_screen(ScreenId(0)), Some(first.clone()));
        assert_eq!(factory.device_for_screen(ScreenId(5)), Some(first));
    }

    #[test]
    fn register_find_and_unregister() {
        let factory = D2DGraphicsDeviceFactory::<MockDevice>::default();
        let device = D2DGraphicsDevice::new(MockDevice::new(10));
        factory.add_device(device.clone());
        assert_eq!(factory.find(10), Some(device.clone()));
        assert!(factory.find(11).is_none());

        factory.remove_device(&D2DGraphicsDevice::new(MockDevice::new(11)));
        assert_eq!(factory.len(), 1);
        factory.remove_device(&device);
        assert!(factory.is_empty());
        factory.remove_device(&device);

        factory.add_device(device);
        factory.clear();
        assert!(factory.is_empty());
    }
}
