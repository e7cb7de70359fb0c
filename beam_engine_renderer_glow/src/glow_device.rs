/// GlowDevice - GraphicsDevice implementation over a glow context
///
/// Engine handles are slotmap keys; each map below owns the native glow
/// object behind a key. A handle unknown to this device binds nothing.

use std::fmt;
use beam_engine::beam::{Error, Result};
use beam_engine::beam::device::{
    Attachment, BufferHandle, BufferTarget, Capability, ClearMask, FramebufferHandle,
    FramebufferStatus, GraphicsDevice, PrimitiveMode, ProgramHandle, RenderbufferFormat,
    RenderbufferHandle, ShaderHandle, ShaderStage, TexImage2d, TextureHandle, TextureParameter,
    TextureTarget, UniformLocation,
};
use beam_engine::beam::{EXT_DEPTH_TEXTURE, EXT_ELEMENT_INDEX_UINT, EXT_SRGB};
use beam_engine::{engine_debug, engine_warn};
use glow::HasContext;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{Key, SlotMap};

use crate::glow_format as format;

type GlShader = <glow::Context as HasContext>::Shader;
type GlProgram = <glow::Context as HasContext>::Program;
type GlBuffer = <glow::Context as HasContext>::Buffer;
type GlTexture = <glow::Context as HasContext>::Texture;
type GlFramebuffer = <glow::Context as HasContext>::Framebuffer;
type GlRenderbuffer = <glow::Context as HasContext>::Renderbuffer;
type GlUniformLocation = <glow::Context as HasContext>::UniformLocation;

/// Extensions that are core in GL 3.3 and WebGL 2
const CORE_EXTENSIONS: [&str; 3] = [EXT_ELEMENT_INDEX_UINT, EXT_DEPTH_TEXTURE, EXT_SRGB];

struct GlowProgram {
    native: GlProgram,
    uniforms: FxHashMap<String, UniformLocation>,
}

/// glow-backed graphics device
pub struct GlowDevice {
    gl: glow::Context,
    extensions: FxHashSet<String>,
    shaders: SlotMap<ShaderHandle, GlShader>,
    programs: SlotMap<ProgramHandle, GlowProgram>,
    uniform_locations: SlotMap<UniformLocation, GlUniformLocation>,
    buffers: SlotMap<BufferHandle, GlBuffer>,
    textures: SlotMap<TextureHandle, GlTexture>,
    framebuffers: SlotMap<FramebufferHandle, GlFramebuffer>,
    renderbuffers: SlotMap<RenderbufferHandle, GlRenderbuffer>,
    flip_y: bool,
}

impl GlowDevice {
    /// Wrap a current glow context
    pub fn new(gl: glow::Context) -> Self {
        unsafe {
            // Tightly packed RGB rows
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        }
        Self {
            gl,
            extensions: FxHashSet::default(),
            shaders: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            uniform_locations: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
            flip_y: false,
        }
    }

    /// Underlying glow context
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn location(&self, location: UniformLocation) -> Option<&GlUniformLocation> {
        self.uniform_locations.get(location)
    }

    fn buffer(&self, buffer: Option<BufferHandle>) -> Option<GlBuffer> {
        lookup(&self.buffers, buffer, "buffer")
    }

    fn texture(&self, texture: Option<TextureHandle>) -> Option<GlTexture> {
        lookup(&self.textures, texture, "texture")
    }

    fn renderbuffer(&self, renderbuffer: Option<RenderbufferHandle>) -> Option<GlRenderbuffer> {
        lookup(&self.renderbuffers, renderbuffer, "renderbuffer")
    }

    /// Error for a failed object creation, `OutOfMemory` when the driver reports it
    fn creation_error(&self, what: &str, message: String) -> Error {
        if unsafe { self.gl.get_error() } == glow::OUT_OF_MEMORY {
            Error::OutOfMemory
        } else {
            Error::BackendError(format!("{} creation failed: {}", what, message))
        }
    }
}

fn lookup<K: Key, V: Copy>(map: &SlotMap<K, V>, key: Option<K>, what: &str) -> Option<V> {
    let key = key?;
    let native = map.get(key).copied();
    if native.is_none() {
        engine_warn!("beam::glow", "Unknown {} handle {:?}, binding none", what, key);
    }
    native
}


impl GraphicsDevice for GlowDevice {
    // ===== Extensions =====

    fn enable_extension(&mut self, name: &str) -> bool {
        let supported = CORE_EXTENSIONS.contains(&name) || {
            let available = self.gl.supported_extensions();
            available.contains(name) || available.contains(&format!("GL_{}", name))
        };
        if supported {
            self.extensions.insert(name.to_string());
        }
        supported
    }

    fn extension_enabled(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    // ===== Shaders & programs =====

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        unsafe {
            let shader = self
                .gl
                .create_shader(format::shader_stage(stage))
                .map_err(|message| self.creation_error("Shader", message))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(Error::ShaderCompilation { stage, log });
            }
            Ok(self.shaders.insert(shader))
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        if let Some(native) = self.shaders.remove(shader) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> Result<ProgramHandle> {
        let (Some(&vs), Some(&fs)) = (self.shaders.get(vertex), self.shaders.get(fragment)) else {
            return Err(Error::ProgramLink("unknown shader object".to_string()));
        };
        unsafe {
            let program = self.gl.create_program().map_err(|message| self.creation_error("Program", message))?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(Error::ProgramLink(log));
            }
            Ok(self.programs.insert(GlowProgram { native: program, uniforms: FxHashMap::default() }))
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(removed) = self.programs.remove(program) {
            for location in removed.uniforms.values() {
                self.uniform_locations.remove(*location);
            }
            unsafe { self.gl.delete_program(removed.native) };
        }
    }

    fn attrib_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        let native = self.programs.get(program)?.native;
        unsafe { self.gl.get_attrib_location(native, name) }
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let slot = self.programs.get_mut(program)?;
        if let Some(location) = slot.uniforms.get(name) {
            return Some(*location);
        }
        let native = unsafe { self.gl.get_uniform_location(slot.native, name) }?;
        let location = self.uniform_locations.insert(native);
        slot.uniforms.insert(name.to_string(), location);
        Some(location)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        let native = program.and_then(|handle| self.programs.get(handle)).map(|slot| slot.native);
        unsafe { self.gl.use_program(native) };
    }

    // ===== Buffers =====

    fn create_buffer(&mut self) -> Result<BufferHandle> {
        let native = unsafe { self.gl.create_buffer() }.map_err(|message| self.creation_error("Buffer", message))?;
        Ok(self.buffers.insert(native))
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(native) = self.buffers.remove(buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let native = self.buffer(buffer);
        unsafe { self.gl.bind_buffer(format::buffer_target(target), native) };
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(format::buffer_target(target), data, glow::STATIC_DRAW)
        };
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u32,
        normalized: bool,
        stride: u32,
        offset: u32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                components as i32,
                glow::FLOAT,
                normalized,
                stride as i32,
                offset as i32,
            )
        };
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) };
    }

    // ===== Uniforms (current program) =====

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(self.location(location), value) };
    }

    fn uniform_1iv(&mut self, location: UniformLocation, values: &[i32]) {
        unsafe { self.gl.uniform_1_i32_slice(self.location(location), values) };
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(self.location(location), value) };
    }

    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_1_f32_slice(self.location(location), values) };
    }

    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_2_f32_slice(self.location(location), values) };
    }

    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_3_f32_slice(self.location(location), values) };
    }

    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_4_f32_slice(self.location(location), values) };
    }

    fn uniform_matrix_2fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]) {
        unsafe { self.gl.uniform_matrix_2_f32_slice(self.location(location), transpose, values) };
    }

    fn uniform_matrix_3fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]) {
        unsafe { self.gl.uniform_matrix_3_f32_slice(self.location(location), transpose, values) };
    }

    fn uniform_matrix_4fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]) {
        unsafe { self.gl.uniform_matrix_4_f32_slice(self.location(location), transpose, values) };
    }

    // ===== Textures =====

    fn create_texture(&mut self) -> Result<TextureHandle> {
        let native = unsafe { self.gl.create_texture() }.map_err(|message| self.creation_error("Texture", message))?;
        Ok(self.textures.insert(native))
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(native) = self.textures.remove(texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>) {
        let native = self.texture(texture);
        unsafe { self.gl.bind_texture(format::texture_target(target), native) };
    }

    fn tex_image_2d(&mut self, image: &TexImage2d<'_>) {
        // Desktop GL has no unpack flip: rows are reversed here instead.
        let flipped = match image.pixels {
            Some(pixels) if self.flip_y && !cfg!(target_arch = "wasm32") => {
                let row = image.width as usize * format::bytes_per_pixel(image.format, image.pixel_type);
                Some(format::flip_rows(pixels, row))
            }
            _ => None,
        };
        let pixels = flipped.as_deref().or(image.pixels);

        unsafe {
            self.gl.tex_image_2d(
                format::tex_image_target(image.target),
                image.level as i32,
                format::internal_format(image.format) as i32,
                image.width as i32,
                image.height as i32,
                0,
                format::external_format(image.format),
                format::pixel_type(image.pixel_type),
                pixels,
            )
        };
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        let (name, value) = format::texture_parameter(parameter);
        unsafe { self.gl.tex_parameter_i32(format::texture_target(target), name, value) };
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        unsafe { self.gl.generate_mipmap(format::texture_target(target)) };
    }

    fn set_unpack_flip_y(&mut self, flip: bool) {
        self.flip_y = flip;
        if cfg!(target_arch = "wasm32") {
            unsafe { self.gl.pixel_store_bool(format::UNPACK_FLIP_Y_WEBGL, flip) };
        }
    }

    // ===== Framebuffers =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        let native = unsafe { self.gl.create_framebuffer() }.map_err(|message| self.creation_error("Framebuffer", message))?;
        Ok(self.framebuffers.insert(native))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(native) = self.framebuffers.remove(framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        let native = lookup(&self.framebuffers, framebuffer, "framebuffer");
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, native) };
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: Option<TextureHandle>) {
        let native = self.texture(texture);
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                format::attachment(attachment),
                glow::TEXTURE_2D,
                native,
                0,
            )
        };
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferHandle> {
        let native = unsafe { self.gl.create_renderbuffer() }.map_err(|message| self.creation_error("Renderbuffer", message))?;
        Ok(self.renderbuffers.insert(native))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        if let Some(native) = self.renderbuffers.remove(renderbuffer) {
            unsafe { self.gl.delete_renderbuffer(native) };
        }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferHandle>) {
        let native = self.renderbuffer(renderbuffer);
        unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, native) };
    }

    fn renderbuffer_storage(&mut self, storage: RenderbufferFormat, width: u32, height: u32) {
        unsafe {
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                format::renderbuffer_format(storage),
                width as i32,
                height as i32,
            )
        };
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: Option<RenderbufferHandle>) {
        let native = self.renderbuffer(renderbuffer);
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                format::attachment(attachment),
                glow::RENDERBUFFER,
                native,
            )
        };
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        let status = unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) };
        if status == glow::FRAMEBUFFER_COMPLETE {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::Incomplete(status)
        }
    }

    // ===== Frame state & drawing =====

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, width as i32, height as i32) };
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) };
    }

    fn clear(&mut self, mask: ClearMask) {
        unsafe { self.gl.clear(format::clear_mask(mask)) };
    }

    fn enable(&mut self, capability: Capability) {
        unsafe { self.gl.enable(format::capability(capability)) };
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, byte_offset: u32) {
        unsafe {
            self.gl.draw_elements(
                format::primitive_mode(mode),
                count as i32,
                glow::UNSIGNED_INT,
                byte_offset as i32,
            )
        };
    }
}

impl fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDevice")
            .field("extensions", &self.extensions)
            .field("programs", &self.programs.len())
            .field("buffers", &self.buffers.len())
            .field("textures", &self.textures.len())
            .field("framebuffers", &self.framebuffers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for GlowDevice {
    fn drop(&mut self) {
        let leaked = self.buffers.len() + self.textures.len() + self.framebuffers.len() + self.renderbuffers.len();
        if leaked > 0 {
            engine_debug!("beam::glow", "Dropping device with {} live GPU objects", leaked);
        }
    }
}
