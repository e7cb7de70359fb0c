/// Conversions from beam_engine device enums to GL constants

use beam_engine::beam::device::{
    Attachment, BufferTarget, Capability, ClearMask, CubeFace, FilterMode, PixelFormat, PixelType,
    PrimitiveMode, RenderbufferFormat, ShaderStage, TexImageTarget, TextureParameter,
    TextureTarget, WrapMode,
};

/// `UNPACK_FLIP_Y_WEBGL`, only meaningful on WebGL contexts
pub(crate) const UNPACK_FLIP_Y_WEBGL: u32 = 0x9240;

pub(crate) fn shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

pub(crate) fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

pub(crate) fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

pub(crate) fn cube_face(face: CubeFace) -> u32 {
    match face {
        CubeFace::PositiveX => glow::TEXTURE_CUBE_MAP_POSITIVE_X,
        CubeFace::NegativeX => glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
        CubeFace::PositiveY => glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
        CubeFace::NegativeY => glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
        CubeFace::PositiveZ => glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
        CubeFace::NegativeZ => glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
    }
}

pub(crate) fn tex_image_target(target: TexImageTarget) -> u32 {
    match target {
        TexImageTarget::Texture2D => glow::TEXTURE_2D,
        TexImageTarget::CubeFace(face) => cube_face(face),
    }
}

/// Internal format passed to `tex_image_2d`
pub(crate) fn internal_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgb => glow::RGB,
        PixelFormat::Rgba => glow::RGBA,
        PixelFormat::Srgb => glow::SRGB,
        PixelFormat::SrgbAlpha => glow::SRGB_ALPHA,
        PixelFormat::DepthComponent => glow::DEPTH_COMPONENT,
    }
}

/// Layout of the client pixel data
///
/// sRGB formats describe storage only; the uploaded bytes are plain RGB(A).
pub(crate) fn external_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgb | PixelFormat::Srgb => glow::RGB,
        PixelFormat::Rgba | PixelFormat::SrgbAlpha => glow::RGBA,
        PixelFormat::DepthComponent => glow::DEPTH_COMPONENT,
    }
}

pub(crate) fn pixel_type(ty: PixelType) -> u32 {
    match ty {
        PixelType::UnsignedByte => glow::UNSIGNED_BYTE,
        PixelType::UnsignedShort => glow::UNSIGNED_SHORT,
    }
}

/// Size of one client pixel in bytes
pub(crate) fn bytes_per_pixel(format: PixelFormat, ty: PixelType) -> usize {
    let components = match format {
        PixelFormat::Rgb | PixelFormat::Srgb => 3,
        PixelFormat::Rgba | PixelFormat::SrgbAlpha => 4,
        PixelFormat::DepthComponent => 1,
    };
    let size = match ty {
        PixelType::UnsignedByte => 1,
        PixelType::UnsignedShort => 2,
    };
    components * size
}

/// Copy of `pixels` with rows in reverse order
pub(crate) fn flip_rows(pixels: &[u8], row_bytes: usize) -> Vec<u8> {
    if row_bytes == 0 {
        return pixels.to_vec();
    }
    pixels.chunks(row_bytes).rev().flatten().copied().collect()
}

fn wrap_mode(mode: WrapMode) -> u32 {
    match mode {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
    }
}

fn filter_mode(mode: FilterMode) -> u32 {
    match mode {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
        FilterMode::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        FilterMode::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        FilterMode::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }
}

/// Parameter name and value for `tex_parameter_i32`
pub(crate) fn texture_parameter(parameter: TextureParameter) -> (u32, i32) {
    let (name, value) = match parameter {
        TextureParameter::WrapS(mode) => (glow::TEXTURE_WRAP_S, wrap_mode(mode)),
        TextureParameter::WrapT(mode) => (glow::TEXTURE_WRAP_T, wrap_mode(mode)),
        TextureParameter::MinFilter(mode) => (glow::TEXTURE_MIN_FILTER, filter_mode(mode)),
        TextureParameter::MagFilter(mode) => (glow::TEXTURE_MAG_FILTER, filter_mode(mode)),
    };
    (name, value as i32)
}

pub(crate) fn attachment(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color0 => glow::COLOR_ATTACHMENT0,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
    }
}

pub(crate) fn renderbuffer_format(format: RenderbufferFormat) -> u32 {
    match format {
        RenderbufferFormat::DepthComponent16 => glow::DEPTH_COMPONENT16,
    }
}

pub(crate) fn primitive_mode(mode: PrimitiveMode) -> u32 {
    match mode {
        PrimitiveMode::Triangles => glow::TRIANGLES,
        PrimitiveMode::Lines => glow::LINES,
    }
}

pub(crate) fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
    }
}

pub(crate) fn clear_mask(mask: ClearMask) -> u32 {
    let mut bits = 0;
    if mask.contains(ClearMask::COLOR) {
        bits |= glow::COLOR_BUFFER_BIT;
    }
    if mask.contains(ClearMask::DEPTH) {
        bits |= glow::DEPTH_BUFFER_BIT;
    }
    if mask.contains(ClearMask::STENCIL) {
        bits |= glow::STENCIL_BUFFER_BIT;
    }
    bits
}

#[cfg(test)]
#[path = "glow_format_tests.rs"]
mod tests;
