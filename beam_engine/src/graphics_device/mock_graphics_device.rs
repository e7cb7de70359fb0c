/// Mock graphics device for tests (no GPU required)
///
/// `MockGraphicsDevice` allocates real slotmap handles and records every call
/// it receives as a `DeviceCall` in a shared `CallLog`, so tests can assert
/// on the exact sequence the engine issues. Failures (compile, link, missing
/// locations, incomplete framebuffers, unsupported extensions) are injected
/// through `MockDeviceConfig`.

use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use crate::config::ContextAttributes;
use crate::engine::{ContextProvider, Surface};
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, BufferHandle, TextureHandle, ShaderHandle, ProgramHandle,
    FramebufferHandle, RenderbufferHandle, UniformLocation,
    ShaderStage, BufferTarget, TextureTarget, TexImageTarget, TexImage2d,
    PixelFormat, PixelType, TextureParameter, Attachment, RenderbufferFormat,
    FramebufferStatus, ClearMask, Capability, PrimitiveMode, SharedDevice,
};

/// Status code reported for an incomplete framebuffer (`FRAMEBUFFER_INCOMPLETE_ATTACHMENT`)
pub const MOCK_INCOMPLETE_STATUS: u32 = 0x8CD6;

// ============================================================================
// Recorded calls
// ============================================================================

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    EnableExtension(String),
    CompileShader { stage: ShaderStage, source: String },
    DeleteShader(ShaderHandle),
    LinkProgram { vertex: ShaderHandle, fragment: ShaderHandle },
    DeleteProgram(ProgramHandle),
    GetAttribLocation { program: ProgramHandle, name: String },
    GetUniformLocation { program: ProgramHandle, name: String },
    UseProgram(Option<ProgramHandle>),
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    BufferData { target: BufferTarget, data: Vec<u8> },
    VertexAttribPointer { location: u32, components: u32, normalized: bool, stride: u32, offset: u32 },
    EnableVertexAttribArray(u32),
    Uniform1i(UniformLocation, i32),
    Uniform1iv(UniformLocation, Vec<i32>),
    Uniform1f(UniformLocation, f32),
    Uniform1fv(UniformLocation, Vec<f32>),
    Uniform2fv(UniformLocation, Vec<f32>),
    Uniform3fv(UniformLocation, Vec<f32>),
    Uniform4fv(UniformLocation, Vec<f32>),
    UniformMatrix2fv { location: UniformLocation, transpose: bool, values: Vec<f32> },
    UniformMatrix3fv { location: UniformLocation, transpose: bool, values: Vec<f32> },
    UniformMatrix4fv { location: UniformLocation, transpose: bool, values: Vec<f32> },
    CreateTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<TextureHandle>),
    TexImage2d {
        target: TexImageTarget,
        level: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
        pixel_type: PixelType,
        pixels: Option<Vec<u8>>,
    },
    TexParameter(TextureTarget, TextureParameter),
    GenerateMipmap(TextureTarget),
    SetUnpackFlipY(bool),
    CreateFramebuffer(FramebufferHandle),
    DeleteFramebuffer(FramebufferHandle),
    BindFramebuffer(Option<FramebufferHandle>),
    FramebufferTexture2d(Attachment, Option<TextureHandle>),
    CreateRenderbuffer(RenderbufferHandle),
    DeleteRenderbuffer(RenderbufferHandle),
    BindRenderbuffer(Option<RenderbufferHandle>),
    RenderbufferStorage { format: RenderbufferFormat, width: u32, height: u32 },
    FramebufferRenderbuffer(Attachment, Option<RenderbufferHandle>),
    CheckFramebufferStatus(FramebufferStatus),
    Viewport { x: i32, y: i32, width: u32, height: u32 },
    ClearColor([f32; 4]),
    ClearDepth(f32),
    Clear(ClearMask),
    Enable(Capability),
    DrawElements { mode: PrimitiveMode, count: u32, byte_offset: u32 },
}

/// Shared, cloneable log of recorded calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeviceCall>> {
        // A test that panicked mid-record leaves the log readable
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, call: DeviceCall) {
        self.lock().push(call);
    }

    /// Snapshot of every call recorded so far
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.lock().clone()
    }

    /// Number of recorded calls
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every recorded call
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of recorded calls matching `predicate`
    pub fn count<F: Fn(&DeviceCall) -> bool>(&self, predicate: F) -> usize {
        self.lock().iter().filter(|call| predicate(call)).count()
    }

    /// Index of the first recorded call matching `predicate`
    pub fn position<F: Fn(&DeviceCall) -> bool>(&self, predicate: F) -> Option<usize> {
        self.lock().iter().position(|call| predicate(call))
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Failure injection for `MockGraphicsDevice`
#[derive(Debug, Clone, Default)]
pub struct MockDeviceConfig {
    /// Stage whose compilation fails
    pub fail_compile: Option<ShaderStage>,
    /// Whether program linking fails
    pub fail_link: bool,
    /// Attribute and uniform names reported as inactive (no location)
    pub missing_locations: FxHashSet<String>,
    /// Whether framebuffer completeness checks fail
    pub incomplete_framebuffer: bool,
    /// Extension names the device refuses
    pub unsupported_extensions: FxHashSet<String>,
    /// Live buffers, textures, framebuffers and renderbuffers allowed before
    /// creation fails with `OutOfMemory`
    pub max_objects: Option<usize>,
}

// ============================================================================
// Mock device
// ============================================================================

#[derive(Default)]
struct MockProgram {
    attributes: FxHashMap<String, u32>,
    uniforms: FxHashMap<String, UniformLocation>,
}

/// Recording graphics device
pub struct MockGraphicsDevice {
    config: MockDeviceConfig,
    log: CallLog,
    extensions: FxHashSet<String>,
    buffers: SlotMap<BufferHandle, ()>,
    textures: SlotMap<TextureHandle, ()>,
    shaders: SlotMap<ShaderHandle, ShaderStage>,
    programs: SlotMap<ProgramHandle, MockProgram>,
    uniform_locations: SlotMap<UniformLocation, ProgramHandle>,
    framebuffers: SlotMap<FramebufferHandle, ()>,
    renderbuffers: SlotMap<RenderbufferHandle, ()>,
}

impl MockGraphicsDevice {
    /// Device that succeeds at everything, with its own log
    pub fn new() -> Self {
        Self::with_config(MockDeviceConfig::default(), CallLog::new())
    }

    /// Device with injected failures, recording into `log`
    pub fn with_config(config: MockDeviceConfig, log: CallLog) -> Self {
        Self {
            config,
            log,
            extensions: FxHashSet::default(),
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            uniform_locations: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
        }
    }

    /// Handle on the call log (shared with this device)
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Wrap as a shared device, keeping a handle on the log
    pub fn into_shared(self) -> (SharedDevice, CallLog) {
        let log = self.log.clone();
        (Arc::new(Mutex::new(self)), log)
    }

    /// Number of GPU objects currently alive (buffers, textures, shaders,
    /// programs, framebuffers, renderbuffers)
    pub fn live_objects(&self) -> usize {
        self.buffers.len()
            + self.textures.len()
            + self.shaders.len()
            + self.programs.len()
            + self.framebuffers.len()
            + self.renderbuffers.len()
    }
}

impl MockGraphicsDevice {
    fn reserve_object(&self) -> Result<()> {
        let live = self.buffers.len() + self.textures.len() + self.framebuffers.len() + self.renderbuffers.len();
        match self.config.max_objects {
            Some(max) if live >= max => Err(Error::OutOfMemory),
            _ => Ok(()),
        }
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    // ===== Extensions =====

    fn enable_extension(&mut self, name: &str) -> bool {
        self.log.push(DeviceCall::EnableExtension(name.to_string()));
        if self.config.unsupported_extensions.contains(name) {
            return false;
        }
        self.extensions.insert(name.to_string());
        true
    }

    fn extension_enabled(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    // ===== Shaders & programs =====

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        self.log.push(DeviceCall::CompileShader { stage, source: source.to_string() });
        if self.config.fail_compile == Some(stage) {
            return Err(Error::ShaderCompilation {
                stage,
                log: "mock compile failure".to_string(),
            });
        }
        Ok(self.shaders.insert(stage))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.log.push(DeviceCall::DeleteShader(shader));
        self.shaders.remove(shader);
    }

    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> Result<ProgramHandle> {
        self.log.push(DeviceCall::LinkProgram { vertex, fragment });
        if !self.shaders.contains_key(vertex) || !self.shaders.contains_key(fragment) {
            return Err(Error::ProgramLink("unknown shader object".to_string()));
        }
        if self.config.fail_link {
            return Err(Error::ProgramLink("mock link failure".to_string()));
        }
        Ok(self.programs.insert(MockProgram::default()))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.log.push(DeviceCall::DeleteProgram(program));
        if let Some(removed) = self.programs.remove(program) {
            for location in removed.uniforms.values() {
                self.uniform_locations.remove(*location);
            }
        }
    }

    fn attrib_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.log.push(DeviceCall::GetAttribLocation { program, name: name.to_string() });
        if self.config.missing_locations.contains(name) {
            return None;
        }
        let slot = self.programs.get_mut(program)?;
        let next = slot.attributes.len() as u32;
        Some(*slot.attributes.entry(name.to_string()).or_insert(next))
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.log.push(DeviceCall::GetUniformLocation { program, name: name.to_string() });
        if self.config.missing_locations.contains(name) {
            return None;
        }
        let slot = self.programs.get_mut(program)?;
        if let Some(location) = slot.uniforms.get(name) {
            return Some(*location);
        }
        let location = self.uniform_locations.insert(program);
        slot.uniforms.insert(name.to_string(), location);
        Some(location)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.log.push(DeviceCall::UseProgram(program));
    }

    // ===== Buffers =====

    fn create_buffer(&mut self) -> Result<BufferHandle> {
        self.reserve_object()?;
        let buffer = self.buffers.insert(());
        self.log.push(DeviceCall::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.log.push(DeviceCall::DeleteBuffer(buffer));
        self.buffers.remove(buffer);
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.log.push(DeviceCall::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        self.log.push(DeviceCall::BufferData { target, data: data.to_vec() });
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u32,
        normalized: bool,
        stride: u32,
        offset: u32,
    ) {
        self.log.push(DeviceCall::VertexAttribPointer { location, components, normalized, stride, offset });
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.log.push(DeviceCall::EnableVertexAttribArray(location));
    }

    // ===== Uniforms =====

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        self.log.push(DeviceCall::Uniform1i(location, value));
    }

    fn uniform_1iv(&mut self, location: UniformLocation, values: &[i32]) {
        self.log.push(DeviceCall::Uniform1iv(location, values.to_vec()));
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        self.log.push(DeviceCall::Uniform1f(location, value));
    }

    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.log.push(DeviceCall::Uniform1fv(location, values.to_vec()));
    }

    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.log.push(DeviceCall::Uniform2fv(location, values.to_vec()));
    }

    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.log.push(DeviceCall::Uniform3fv(location, values.to_vec()));
    }

    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.log.push(DeviceCall::Uniform4fv(location, values.to_vec()));
    }

    fn uniform_matrix_2fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]) {
        self.log.push(DeviceCall::UniformMatrix2fv { location, transpose, values: values.to_vec() });
    }

    fn uniform_matrix_3fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]) {
        self.log.push(DeviceCall::UniformMatrix3fv { location, transpose, values: values.to_vec() });
    }

    fn uniform_matrix_4fv(&mut self, location: UniformLocation, transpose: bool, values: &[f32]) {
        self.log.push(DeviceCall::UniformMatrix4fv { location, transpose, values: values.to_vec() });
    }

    // ===== Textures =====

    fn create_texture(&mut self) -> Result<TextureHandle> {
        self.reserve_object()?;
        let texture = self.textures.insert(());
        self.log.push(DeviceCall::CreateTexture(texture));
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.log.push(DeviceCall::DeleteTexture(texture));
        self.textures.remove(texture);
    }

    fn active_texture(&mut self, unit: u32) {
        self.log.push(DeviceCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>) {
        self.log.push(DeviceCall::BindTexture(target, texture));
    }

    fn tex_image_2d(&mut self, image: &TexImage2d<'_>) {
        self.log.push(DeviceCall::TexImage2d {
            target: image.target,
            level: image.level,
            format: image.format,
            width: image.width,
            height: image.height,
            pixel_type: image.pixel_type,
            pixels: image.pixels.map(|p| p.to_vec()),
        });
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        self.log.push(DeviceCall::TexParameter(target, parameter));
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        self.log.push(DeviceCall::GenerateMipmap(target));
    }

    fn set_unpack_flip_y(&mut self, flip: bool) {
        self.log.push(DeviceCall::SetUnpackFlipY(flip));
    }

    // ===== Framebuffers =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        self.reserve_object()?;
        let framebuffer = self.framebuffers.insert(());
        self.log.push(DeviceCall::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.log.push(DeviceCall::DeleteFramebuffer(framebuffer));
        self.framebuffers.remove(framebuffer);
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        self.log.push(DeviceCall::BindFramebuffer(framebuffer));
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: Option<TextureHandle>) {
        self.log.push(DeviceCall::FramebufferTexture2d(attachment, texture));
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferHandle> {
        self.reserve_object()?;
        let renderbuffer = self.renderbuffers.insert(());
        self.log.push(DeviceCall::CreateRenderbuffer(renderbuffer));
        Ok(renderbuffer)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        self.log.push(DeviceCall::DeleteRenderbuffer(renderbuffer));
        self.renderbuffers.remove(renderbuffer);
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferHandle>) {
        self.log.push(DeviceCall::BindRenderbuffer(renderbuffer));
    }

    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32) {
        self.log.push(DeviceCall::RenderbufferStorage { format, width, height });
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: Option<RenderbufferHandle>) {
        self.log.push(DeviceCall::FramebufferRenderbuffer(attachment, renderbuffer));
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        let status = if self.config.incomplete_framebuffer {
            FramebufferStatus::Incomplete(MOCK_INCOMPLETE_STATUS)
        } else {
            FramebufferStatus::Complete
        };
        self.log.push(DeviceCall::CheckFramebufferStatus(status));
        status
    }

    // ===== Frame state & drawing =====

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.log.push(DeviceCall::Viewport { x, y, width, height });
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.log.push(DeviceCall::ClearColor(color));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.log.push(DeviceCall::ClearDepth(depth));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.log.push(DeviceCall::Clear(mask));
    }

    fn enable(&mut self, capability: Capability) {
        self.log.push(DeviceCall::Enable(capability));
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, byte_offset: u32) {
        self.log.push(DeviceCall::DrawElements { mode, count, byte_offset });
    }
}

// ============================================================================
// Mock surface
// ============================================================================

/// Host surface handing out `MockGraphicsDevice`s that record into a shared log
///
/// Clones share size, log and the last context attributes, so a test can
/// keep a clone after passing the surface to `Beam::new`.
#[derive(Clone)]
pub struct MockSurface {
    size: Arc<Mutex<(u32, u32)>>,
    config: MockDeviceConfig,
    log: CallLog,
    attributes: Arc<Mutex<Option<ContextAttributes>>>,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(width, height, MockDeviceConfig::default())
    }

    pub fn with_config(width: u32, height: u32, config: MockDeviceConfig) -> Self {
        Self {
            size: Arc::new(Mutex::new((width, height))),
            config,
            log: CallLog::new(),
            attributes: Arc::new(Mutex::new(None)),
        }
    }

    /// Call log shared with every device this surface creates
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Change the reported size (host window resize)
    pub fn resize(&self, width: u32, height: u32) {
        *self.size.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = (width, height);
    }

    /// Attributes passed to the last `acquire_context`
    pub fn last_attributes(&self) -> Option<ContextAttributes> {
        self.attributes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Surface for MockSurface {
    fn size(&self) -> (u32, u32) {
        *self.size.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ContextProvider for MockSurface {
    type Device = MockGraphicsDevice;

    fn acquire_context(&self, attributes: &ContextAttributes) -> Result<MockGraphicsDevice> {
        *self.attributes.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(attributes.clone());
        Ok(MockGraphicsDevice::with_config(self.config.clone(), self.log.clone()))
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
