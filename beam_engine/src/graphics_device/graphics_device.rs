/// GraphicsDevice trait - the immediate-mode API the engine drives
///
/// One method per imperative call of a GL-style context (bind buffer,
/// buffer data, uniform upload, tex image, framebuffer attachment, draw
/// elements...). The engine never talks to a driver directly: backends
/// implement this trait (see `beam_engine_renderer_glow`) and tests use
/// `MockGraphicsDevice`, which records every call.
///
/// GPU objects are identified by opaque slotmap handles. Handles are only
/// meaningful to the device that created them.

use std::sync::{Arc, Mutex, MutexGuard};
use bitflags::bitflags;
use slotmap::new_key_type;
use crate::error::{Error, Result};

// ============================================================================
// Handles
// ============================================================================

new_key_type! {
    /// Vertex or index buffer object
    pub struct BufferHandle;
    /// 2D or cube-map texture object
    pub struct TextureHandle;
    /// Compiled shader stage object
    pub struct ShaderHandle;
    /// Linked program object
    pub struct ProgramHandle;
    /// Framebuffer object
    pub struct FramebufferHandle;
    /// Renderbuffer object
    pub struct RenderbufferHandle;
    /// Resolved uniform location inside a program
    pub struct UniformLocation;
}

/// Device shared between the engine and the resource handles it creates
pub type SharedDevice = Arc<Mutex<dyn GraphicsDevice>>;

/// Lock the shared device, mapping lock poisoning to a backend error
pub fn lock_device(device: &SharedDevice) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))
}

// ============================================================================
// Enumerations
// ============================================================================

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data (`ARRAY_BUFFER`)
    Array,
    /// Index data (`ELEMENT_ARRAY_BUFFER`)
    ElementArray,
}

/// Texture binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
}

/// Cube map face, in upload order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All faces in the order images are consumed
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];
}

/// Target of a `tex_image_2d` upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexImageTarget {
    Texture2D,
    CubeFace(CubeFace),
}

/// Pixel format of uploaded image data (also used as internal format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Srgb,
    SrgbAlpha,
    DepthComponent,
}

/// Component type of uploaded image data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    UnsignedByte,
    UnsignedShort,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

/// Texture parameter and its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    WrapS(WrapMode),
    WrapT(WrapMode),
    MinFilter(FilterMode),
    MagFilter(FilterMode),
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color0,
    Depth,
}

/// Renderbuffer storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    DepthComponent16,
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    /// Incomplete, with the raw status code reported by the driver
    Incomplete(u32),
}

/// Primitive assembly mode for indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Triangles,
    Lines,
}

/// Server-side capability toggled with `enable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
}

bitflags! {
    /// Buffers cleared by `clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Parameters of a `tex_image_2d` call
#[derive(Debug, Clone, Copy)]
pub struct TexImage2d<'a> {
    /// 2D texture or cube face
    pub target: TexImageTarget,
    /// Mip level
    pub level: u32,
    /// Internal and external format
    pub format: PixelFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Component type
    pub pixel_type: PixelType,
    /// Pixel data, or `None` to allocate storage only
    pub pixels: Option<&'a [u8]>,
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Stateful immediate-mode graphics API
///
/// Methods mirror the underlying calls one to one and follow their
/// non-throwing style: only object creation and shader building report
/// failures, everything else is a state setter.
pub trait GraphicsDevice {
    // ===== Extensions =====

    /// Request an extension; returns whether it is now enabled
    fn enable_extension(&mut self, name: &str) -> bool;

    /// Whether an extension was enabled
    fn extension_enabled(&self, name: &str) -> bool;

    // ===== Shaders & programs =====

    /// Compile one shader stage. Failure carries the driver info log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle>;

    /// Delete a shader stage object
    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Link a program from a vertex and a fragment stage
    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> Result<ProgramHandle>;

    /// Delete a program object
    fn delete_program(&mut self, program: ProgramHandle);

    /// Location of a vertex attribute, `None` when the program has no such active attribute
    fn attrib_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Location of a uniform, `None` when the program has no such active uniform
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Make a program current (`None` unbinds)
    fn use_program(&mut self, program: Option<ProgramHandle>);

    // ===== Buffers =====

    fn create_buffer(&mut self) -> Result<BufferHandle>;

    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Replace the data store of the buffer bound to `target` (static draw usage)
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]);

    /// Describe float attribute data of the bound array buffer
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u32,
        normalized: bool,
        stride: u32,
        offset: u32,
    );

    fn enable_vertex_attrib_array(&mut self, location: u32);

    // ===== Uniforms (current program) =====

    fn uniform_1i(&mut self, location: UniformLocation, value: i32);
    fn uniform_1iv(&mut self, location: UniformLocation, values: &[i32]);
    fn uniform_1f(&mut self, location: UniformLocation, value: f32);
    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_matrix_2fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]);
    fn uniform_matrix_3fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]);
    fn uniform_matrix_4fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]);

    // ===== Textures =====

    fn create_texture(&mut self) -> Result<TextureHandle>;

    fn delete_texture(&mut self, texture: TextureHandle);

    /// Select the active texture unit (0-based)
    fn active_texture(&mut self, unit: u32);

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>);

    fn tex_image_2d(&mut self, image: &TexImage2d<'_>);

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter);

    fn generate_mipmap(&mut self, target: TextureTarget);

    /// Flip rows vertically on subsequent uploads
    fn set_unpack_flip_y(&mut self, flip: bool);

    // ===== Framebuffers =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle>;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Bind a framebuffer (`None` restores the default framebuffer)
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>);

    /// Attach a 2D texture to the bound framebuffer
    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: Option<TextureHandle>);

    fn create_renderbuffer(&mut self) -> Result<RenderbufferHandle>;

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferHandle>);

    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32);

    /// Attach a renderbuffer to the bound framebuffer
    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: Option<RenderbufferHandle>);

    fn check_framebuffer_status(&mut self) -> FramebufferStatus;

    // ===== Frame state & drawing =====

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    fn clear_color(&mut self, color: [f32; 4]);

    fn clear_depth(&mut self, depth: f32);

    fn clear(&mut self, mask: ClearMask);

    fn enable(&mut self, capability: Capability);

    /// Draw `count` 32-bit indices of the bound element buffer, starting at `byte_offset`
    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, byte_offset: u32);
}
