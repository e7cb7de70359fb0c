/// Vertex buffers resource - one GPU buffer per named attribute
///
/// The full key set is fixed at creation: `set` replaces the data of an
/// existing key and rejects unknown ones. Data uploads as 32-bit floats to
/// the array buffer binding point with static usage.

use std::fmt;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::{lock_device, BufferHandle, BufferTarget, GraphicsDevice, SharedDevice};
use crate::{engine_bail, engine_trace};

/// State of a VertexBuffers resource
pub type VertexBuffersState = FxHashMap<String, Vec<f32>>;

/// Named vertex attribute buffers
pub struct VertexBuffersResource {
    device: SharedDevice,
    buffers: FxHashMap<String, BufferHandle>,
    state: VertexBuffersState,
}

impl VertexBuffersResource {
    /// Allocate and fill one buffer per key of `state`
    pub fn new(device: SharedDevice, state: VertexBuffersState) -> Result<Self> {
        let mut buffers = FxHashMap::default();
        {
            let mut gpu = lock_device(&device)?;
            for (key, data) in &state {
                let buffer = match gpu.create_buffer() {
                    Ok(buffer) => buffer,
                    Err(err) => {
                        for (_, created) in buffers.drain() {
                            gpu.delete_buffer(created);
                        }
                        return Err(err);
                    }
                };
                upload(&mut *gpu, buffer, data);
                buffers.insert(key.clone(), buffer);
            }
        }
        engine_trace!("beam::VertexBuffers", "Created {} vertex buffers", buffers.len());
        Ok(Self { device, buffers, state })
    }

    /// Replace the data of an existing key
    pub fn set(&mut self, key: &str, data: impl Into<Vec<f32>>) -> Result<&mut Self> {
        let Some(buffer) = self.buffers.get(key).copied() else {
            engine_bail!("beam::VertexBuffers", InvalidResource,
                "unknown vertex buffer '{}' (keys are fixed at creation)", key);
        };
        let data = data.into();
        upload(&mut *lock_device(&self.device)?, buffer, &data);
        self.state.insert(key.to_string(), data);
        Ok(self)
    }

    /// Delete the buffer of one key and forget the key
    pub fn destroy(&mut self, key: &str) -> Result<()> {
        let Some(buffer) = self.buffers.get(key).copied() else {
            engine_bail!("beam::VertexBuffers", InvalidResource, "unknown vertex buffer '{}'", key);
        };
        lock_device(&self.device)?.delete_buffer(buffer);
        self.buffers.remove(key);
        self.state.remove(key);
        Ok(())
    }

    /// Delete every buffer
    pub fn destroy_all(&mut self) -> Result<()> {
        let mut gpu = lock_device(&self.device)?;
        for (_, buffer) in self.buffers.drain() {
            gpu.delete_buffer(buffer);
        }
        self.state.clear();
        Ok(())
    }

    /// Live buffer of a key
    pub fn buffer(&self, key: &str) -> Option<BufferHandle> {
        self.buffers.get(key).copied()
    }

    pub fn state(&self) -> &VertexBuffersState {
        &self.state
    }

    pub(crate) fn live_buffers(&self) -> impl Iterator<Item = (&str, BufferHandle)> {
        self.buffers.iter().map(|(k, b)| (k.as_str(), *b))
    }
}

impl fmt::Debug for VertexBuffersResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexBuffersResource")
            .field("buffers", &self.buffers)
            .finish_non_exhaustive()
    }
}

fn upload(device: &mut dyn GraphicsDevice, buffer: BufferHandle, data: &[f32]) {
    device.bind_buffer(BufferTarget::Array, Some(buffer));
    device.buffer_data(BufferTarget::Array, bytemuck::cast_slice(data));
}

#[cfg(test)]
#[path = "vertex_buffers_tests.rs"]
mod tests;
