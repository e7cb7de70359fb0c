/// Beam engine - facade over one graphics context
///
/// `Beam` owns the device acquired from the host surface, the programs it
/// links, the last-bound program cache and the registered commands.
/// Resources it creates share the device and are handed to the caller.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;
use crate::command::Command;
use crate::config::{BeamConfig, ContextAttributes};
use crate::draw::{self, ProgramStateCache};
use crate::error::Result;
use crate::graphics_device::{
    lock_device, Capability, ClearMask, GraphicsDevice, ProgramHandle, SharedDevice,
};
use crate::resource::{
    group_resources, IndexBufferResource, IndexBufferState, OffscreenTargetResource,
    OffscreenTargetState, Resource, ResourceKind, ResourceRef, ResourceState, TexturesResource,
    TexturesState, UniformsResource, UniformsState, VertexBuffersResource, VertexBuffersState,
};
use crate::shader::{Shader, ShaderTemplate};
use crate::{engine_debug, engine_err, engine_info, engine_warn};

// ============================================================================
// Host surface
// ============================================================================

/// Rendering target provided by the host (canvas, window)
pub trait Surface {
    /// Current drawable size in pixels
    fn size(&self) -> (u32, u32);
}

/// Surface able to create the graphics context the engine drives
pub trait ContextProvider: Surface {
    type Device: GraphicsDevice + 'static;

    /// Create the context with the given attributes
    fn acquire_context(&self, attributes: &ContextAttributes) -> Result<Self::Device>;
}

// ============================================================================
// Beam
// ============================================================================

/// Engine facade
///
/// # Example
///
/// ```no_run
/// use beam_engine::beam::{Beam, BeamConfig};
/// use beam_engine::beam::device::mock_graphics_device::MockSurface;
/// use beam_engine::beam::schema::{Schema, SchemaType};
/// use beam_engine::beam::shader::ShaderTemplate;
/// use beam_engine::beam::resource::IndexBufferState;
///
/// let mut beam = Beam::new(MockSurface::new(640, 480), BeamConfig::default())?;
/// let schema = Schema::builder().buffer("position", SchemaType::Vec3).build()?;
/// let shader = beam.shader(&ShaderTemplate::new("...", "...", schema))?;
/// let indices = beam.index_buffer(IndexBufferState::new([0, 1, 2]))?;
///
/// beam.clear([0.0, 0.0, 0.0, 1.0])?.draw(&shader, &[(&indices).into()])?;
/// # Ok::<(), beam_engine::beam::Error>(())
/// ```
pub struct Beam {
    surface: Box<dyn Surface>,
    device: SharedDevice,
    config: BeamConfig,
    extensions: Vec<String>,
    state_cache: ProgramStateCache,
    programs: Vec<ProgramHandle>,
    commands: FxHashMap<String, Command>,
}

impl Beam {
    /// Acquire a context from `surface` and enable the configured extensions
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the context cannot be created.
    /// Unsupported extensions are logged, not fatal.
    pub fn new<S: ContextProvider + 'static>(surface: S, config: BeamConfig) -> Result<Self> {
        let mut device = surface.acquire_context(&config.context_attributes)?;

        let mut extensions = Vec::new();
        for name in &config.extensions {
            if device.enable_extension(name) {
                extensions.push(name.clone());
            } else {
                engine_warn!("beam::Engine", "Extension {} is not supported", name);
            }
        }

        let (width, height) = surface.size();
        engine_info!("beam::Engine", "Context created ({}x{}, extensions: {:?})", width, height, extensions);

        let device: SharedDevice = Arc::new(Mutex::new(device));
        Ok(Self {
            surface: Box::new(surface),
            device,
            config,
            extensions,
            state_cache: ProgramStateCache::new(),
            programs: Vec::new(),
            commands: FxHashMap::default(),
        })
    }

    /// Extensions the device granted
    pub fn enabled_extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    /// Shared handle on the device
    pub fn device(&self) -> SharedDevice {
        self.device.clone()
    }

    /// Current surface size
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface.size()
    }

    /// Reset the viewport to the surface and clear color and depth
    ///
    /// Also enables depth testing. Pass `[0.0; 4]` for the usual
    /// transparent black.
    pub fn clear(&mut self, color: [f32; 4]) -> Result<&mut Self> {
        let (width, height) = self.surface.size();
        {
            let mut gpu = lock_device(&self.device)?;
            gpu.viewport(0, 0, width, height);
            gpu.clear_color(color);
            gpu.clear_depth(1.0);
            gpu.clear(ClearMask::COLOR | ClearMask::DEPTH);
            gpu.enable(Capability::DepthTest);
        }
        Ok(self)
    }

    /// Compile and link a shader template
    ///
    /// Compile and link failures do not fail this call: they are logged
    /// and the returned shader is rejected by `draw`.
    pub fn shader(&mut self, template: &ShaderTemplate) -> Result<Shader> {
        let shader = {
            let mut gpu = lock_device(&self.device)?;
            Shader::build(&mut *gpu, template)
        };
        if let Some(program) = shader.program() {
            self.programs.push(program);
        }
        Ok(shader)
    }

    /// Create a resource of `kind`
    ///
    /// # Errors
    ///
    /// `InvalidResource` when `state` belongs to another kind, or when an
    /// IndexBuffer is created without state.
    pub fn resource(&mut self, kind: ResourceKind, state: Option<ResourceState>) -> Result<Resource> {
        let resource = Resource::create(self.device.clone(), kind, state)?;
        engine_debug!("beam::Engine", "Created {} resource", kind);
        Ok(resource)
    }

    pub fn vertex_buffers(&mut self, state: VertexBuffersState) -> Result<VertexBuffersResource> {
        VertexBuffersResource::new(self.device.clone(), state)
    }

    pub fn index_buffer(&mut self, state: IndexBufferState) -> Result<IndexBufferResource> {
        IndexBufferResource::new(self.device.clone(), state)
    }

    pub fn uniforms(&mut self, state: UniformsState) -> UniformsResource {
        UniformsResource::new(state)
    }

    pub fn textures(&mut self, state: TexturesState) -> Result<TexturesResource> {
        TexturesResource::new(self.device.clone(), state)
    }

    pub fn offscreen_target(&mut self, state: OffscreenTargetState) -> Result<OffscreenTargetResource> {
        OffscreenTargetResource::new(self.device.clone(), state)
    }

    /// Draw `shader` with the given resources (any order)
    ///
    /// # Errors
    ///
    /// `ShaderUnavailable` when the shader failed to build.
    pub fn draw(&mut self, shader: &Shader, resources: &[ResourceRef<'_>]) -> Result<&mut Self> {
        let grouped = group_resources(resources);
        {
            let mut gpu = lock_device(&self.device)?;
            draw::draw(&mut *gpu, &mut self.state_cache, shader, &grouped)?;
        }
        Ok(self)
    }

    /// Register a command, replacing one with the same name
    pub fn define(&mut self, command: Command) -> &mut Self {
        engine_debug!("beam::Engine", "Defined command '{}'", command.name);
        self.commands.insert(command.name.clone(), command);
        self
    }

    /// Run a registered command around `modifier`
    ///
    /// # Errors
    ///
    /// `UnknownCommand` when no command is registered under `name`; hook and
    /// modifier errors are returned as-is and stop the sequence.
    pub fn run<F>(&mut self, name: &str, arg: &dyn Any, modifier: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Beam) -> Result<()>,
    {
        let Some(command) = self.commands.get(name).cloned() else {
            return Err(engine_err!("beam::Engine", UnknownCommand, "{}", name));
        };

        if let Some(hook) = &command.on_before {
            hook(&mut *lock_device(&self.device)?, arg)?;
        }
        modifier(self)?;
        if let Some(hook) = &command.on_after {
            hook(&mut *lock_device(&self.device)?, arg)?;
        }
        Ok(self)
    }

    /// Forget the last bound program
    ///
    /// Call after touching program state outside the engine.
    pub fn reset_state_cache(&mut self) {
        self.state_cache.reset();
    }
}

impl fmt::Debug for Beam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Beam")
            .field("extensions", &self.extensions)
            .field("programs", &self.programs.len())
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Drop for Beam {
    fn drop(&mut self) {
        match lock_device(&self.device) {
            Ok(mut gpu) => {
                for program in self.programs.drain(..) {
                    gpu.delete_program(program);
                }
            }
            Err(err) => {
                engine_warn!("beam::Engine", "Programs not released: {}", err);
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
