/// Draw binder - per-draw binding of a shader and its resources
///
/// One draw performs, in order:
/// 1. program bind through the `ProgramStateCache`
/// 2. attribute binding for every schema buffer with a live vertex buffer
/// 3. index buffer binding
/// 4. uniform uploads (supplied value, else schema default) and sampler
///    unit assignment, in key order
/// 5. one indexed draw with 32-bit indices
///
/// Anomalies (missing buffers, textures, locations, degenerate values) are
/// logged and skipped. The only failure is a shader without a program.

use crate::error::{Error, Result};
use crate::graphics_device::{BufferTarget, GraphicsDevice, PrimitiveMode, TextureTarget};
use crate::draw::program_cache::ProgramStateCache;
use crate::draw::uniform_dispatch::resolve_upload;
use crate::resource::GroupedResources;
use crate::schema::{DrawMode, SchemaType};
use crate::shader::Shader;
use crate::{engine_error, engine_trace, engine_warn};

/// Size in bytes of one index
const INDEX_SIZE: u32 = 4;

/// Bind everything `shader` reads and issue its indexed draw
pub fn draw(
    device: &mut dyn GraphicsDevice,
    cache: &mut ProgramStateCache,
    shader: &Shader,
    resources: &GroupedResources<'_>,
) -> Result<()> {
    let Some(program) = shader.program() else {
        engine_error!("beam::DrawBinder", "Draw rejected: shader has no linked program");
        return Err(Error::ShaderUnavailable);
    };

    cache.bind_if_changed(device, program);
    bind_attributes(device, shader, resources);

    let index_buffer = resources.index_buffer.and_then(|indices| {
        indices.buffer().map(|buffer| (buffer, indices))
    });
    if let Some((buffer, _)) = index_buffer {
        device.bind_buffer(BufferTarget::ElementArray, Some(buffer));
    }

    bind_uniforms(device, shader, resources);

    let Some((_, indices)) = index_buffer else {
        engine_warn!("beam::DrawBinder", "No live index buffer, draw skipped");
        return Ok(());
    };
    let (offset, count) = (indices.offset(), indices.count());
    let Some(byte_offset) = index_range(offset, count, indices.array().len()) else {
        engine_warn!(
            "beam::DrawBinder",
            "Index range {}+{} outside {} indices, draw skipped",
            offset,
            count,
            indices.array().len()
        );
        return Ok(());
    };

    let mode = match shader.schema().mode() {
        DrawMode::Triangles => PrimitiveMode::Triangles,
        DrawMode::Lines => PrimitiveMode::Lines,
    };
    device.draw_elements(mode, count, byte_offset);
    engine_trace!("beam::DrawBinder", "Drew {} indices from offset {}", count, offset);
    Ok(())
}

/// Byte offset of the range, `None` when it does not fit in the array
fn index_range(offset: u32, count: u32, len: usize) -> Option<u32> {
    let end = u64::from(offset) + u64::from(count);
    if end > len as u64 {
        return None;
    }
    offset.checked_mul(INDEX_SIZE)
}

fn bind_attributes(device: &mut dyn GraphicsDevice, shader: &Shader, resources: &GroupedResources<'_>) {
    for (key, attribute) in shader.attributes() {
        let Some(buffer) = resources.vertex_buffers.get(key.as_str()).copied() else {
            continue;
        };
        let Some(location) = attribute.location else {
            engine_warn!("beam::DrawBinder", "Attribute '{}' is not active in the program", key);
            continue;
        };
        device.bind_buffer(BufferTarget::Array, Some(buffer));
        device.vertex_attrib_pointer(location, attribute.components, false, 0, 0);
        device.enable_vertex_attrib_array(location);
    }
}

fn bind_uniforms(device: &mut dyn GraphicsDevice, shader: &Shader, resources: &GroupedResources<'_>) {
    let schema = shader.schema();
    let mut next_unit = 0u32;

    for (key, uniform) in shader.uniforms() {
        if uniform.ty.is_sampler() {
            let unit = next_unit;
            next_unit += 1;

            let Some(texture) = resources.textures.get(key.as_str()).copied() else {
                engine_warn!("beam::DrawBinder", "Missing texture {} at unit {}", key, unit);
                continue;
            };
            let Some(location) = uniform.location else {
                continue;
            };
            let target = match uniform.ty {
                SchemaType::TexCube => TextureTarget::CubeMap,
                _ => TextureTarget::Texture2D,
            };
            device.uniform_1i(location, unit as i32);
            device.active_texture(unit);
            device.bind_texture(target, Some(texture));
            continue;
        }

        let value = resources
            .uniforms
            .get(key.as_str())
            .copied()
            .or_else(|| schema.uniform_default(key));
        let Some(value) = value else {
            continue;
        };
        let Some(location) = uniform.location else {
            continue;
        };
        match resolve_upload(uniform.ty, value) {
            Ok(upload) => upload.apply(device, location),
            Err(reason) => engine_warn!("beam::DrawBinder", "Uniform '{}' skipped: {}", key, reason),
        }
    }
}

#[cfg(test)]
#[path = "draw_binder_tests.rs"]
mod tests;
