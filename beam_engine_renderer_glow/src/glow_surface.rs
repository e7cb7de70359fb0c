/// GlowSurface - host surface handing a glow context to the engine

use std::sync::{Arc, Mutex, PoisonError};
use beam_engine::beam::{ContextAttributes, ContextProvider, Error, Result, Surface};
use beam_engine::engine_debug;

use crate::glow_device::GlowDevice;

/// Surface wrapping a context the host already created
///
/// The context can be acquired once; the drawable size is shared so the
/// host can report resizes after the engine took ownership.
pub struct GlowSurface {
    context: Mutex<Option<glow::Context>>,
    size: Arc<Mutex<(u32, u32)>>,
}

impl GlowSurface {
    pub fn new(context: glow::Context, width: u32, height: u32) -> Self {
        Self {
            context: Mutex::new(Some(context)),
            size: Arc::new(Mutex::new((width, height))),
        }
    }

    /// Handle for reporting size changes
    pub fn size_handle(&self) -> Arc<Mutex<(u32, u32)>> {
        self.size.clone()
    }

    /// Record a new drawable size
    pub fn resize(&self, width: u32, height: u32) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) = (width, height);
    }
}

impl Surface for GlowSurface {
    fn size(&self) -> (u32, u32) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContextProvider for GlowSurface {
    type Device = GlowDevice;

    /// Attributes are fixed when the host creates the context; they are only logged here.
    fn acquire_context(&self, attributes: &ContextAttributes) -> Result<GlowDevice> {
        let context = self
            .context
            .lock()
            .map_err(|_| Error::InitializationFailed("surface lock poisoned".to_string()))?
            .take()
            .ok_or_else(|| Error::InitializationFailed("context already acquired".to_string()))?;

        engine_debug!("beam::glow", "Acquired context (requested attributes: {:?})", attributes);
        Ok(GlowDevice::new(context))
    }
}
