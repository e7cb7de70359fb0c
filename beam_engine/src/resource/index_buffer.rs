/// Index buffer resource - one GPU buffer of 32-bit indices
///
/// `offset` and `count` select the range drawn; they default to `0` and
/// the array length, and are re-derived on every `set`.

use std::fmt;
use crate::error::Result;
use crate::graphics_device::{lock_device, BufferHandle, BufferTarget, GraphicsDevice, SharedDevice};
use crate::engine_bail;

/// Requested state of an IndexBuffer resource
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexBufferState {
    pub array: Vec<u32>,
    /// First index drawn (defaults to 0)
    pub offset: Option<u32>,
    /// Number of indices drawn (defaults to the array length)
    pub count: Option<u32>,
}

impl IndexBufferState {
    pub fn new(array: impl Into<Vec<u32>>) -> Self {
        Self {
            array: array.into(),
            offset: None,
            count: None,
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }
}

/// Indexed draw range over one element buffer
pub struct IndexBufferResource {
    device: SharedDevice,
    buffer: Option<BufferHandle>,
    array: Vec<u32>,
    offset: u32,
    count: u32,
}

impl IndexBufferResource {
    /// Allocate and fill the element buffer
    pub fn new(device: SharedDevice, state: IndexBufferState) -> Result<Self> {
        let buffer = {
            let mut gpu = lock_device(&device)?;
            let buffer = gpu.create_buffer()?;
            upload(&mut *gpu, buffer, &state.array);
            buffer
        };
        let (offset, count) = resolve_range(&state);
        Ok(Self {
            device,
            buffer: Some(buffer),
            array: state.array,
            offset,
            count,
        })
    }

    /// Replace the whole state; omitted `offset`/`count` fall back to their defaults
    pub fn set(&mut self, state: IndexBufferState) -> Result<&mut Self> {
        let Some(buffer) = self.buffer else {
            engine_bail!("beam::IndexBuffer", InvalidResource, "set on a destroyed index buffer");
        };
        upload(&mut *lock_device(&self.device)?, buffer, &state.array);
        let (offset, count) = resolve_range(&state);
        self.offset = offset;
        self.count = count;
        self.array = state.array;
        Ok(self)
    }

    /// Delete the element buffer
    pub fn destroy(&mut self) -> Result<()> {
        if let Some(buffer) = self.buffer.take() {
            lock_device(&self.device)?.delete_buffer(buffer);
        }
        self.array.clear();
        Ok(())
    }

    /// Live element buffer, `None` after `destroy`
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn array(&self) -> &[u32] {
        &self.array
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl fmt::Debug for IndexBufferResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBufferResource")
            .field("buffer", &self.buffer)
            .field("offset", &self.offset)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

fn resolve_range(state: &IndexBufferState) -> (u32, u32) {
    (
        state.offset.unwrap_or(0),
        state.count.unwrap_or(state.array.len() as u32),
    )
}

fn upload(device: &mut dyn GraphicsDevice, buffer: BufferHandle, indices: &[u32]) {
    device.bind_buffer(BufferTarget::ElementArray, Some(buffer));
    device.buffer_data(BufferTarget::ElementArray, bytemuck::cast_slice(indices));
}

#[cfg(test)]
#[path = "index_buffer_tests.rs"]
mod tests;
