/// Offscreen target resource - framebuffer for render-to-texture passes
///
/// Two layouts, chosen by `depth`:
/// - `false`: RGBA color texture plus a 16-bit depth renderbuffer
/// - `true`: RGBA color texture plus a depth texture (shadow maps), which
///   needs the `WEBGL_depth_texture` extension
///
/// Both textures are `size x size` with Nearest filtering. An incomplete
/// framebuffer is logged and the resource is still returned.

use std::fmt;
use std::sync::{Arc, Weak};
use crate::config::EXT_DEPTH_TEXTURE;
use crate::error::Result;
use crate::graphics_device::{
    lock_device, Attachment, FilterMode, FramebufferHandle, FramebufferStatus, GraphicsDevice,
    PixelFormat, PixelType, RenderbufferFormat, RenderbufferHandle, SharedDevice, TexImage2d,
    TexImageTarget, TextureHandle, TextureParameter, TextureTarget,
};
use crate::{engine_debug, engine_error, engine_warn};

/// Default edge length of an offscreen target
pub const DEFAULT_OFFSCREEN_SIZE: u32 = 2048;

/// State of an OffscreenTarget resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenTargetState {
    /// Edge length in pixels
    pub size: u32,
    /// Attach a depth texture instead of a depth renderbuffer
    pub depth: bool,
}

impl Default for OffscreenTargetState {
    fn default() -> Self {
        Self {
            size: DEFAULT_OFFSCREEN_SIZE,
            depth: false,
        }
    }
}

/// Framebuffer with its attachments
pub struct OffscreenTargetResource {
    device: SharedDevice,
    state: OffscreenTargetState,
    framebuffer: Option<FramebufferHandle>,
    renderbuffer: Option<RenderbufferHandle>,
    color_texture: Option<TextureHandle>,
    depth_texture: Option<TextureHandle>,
    /// Dropped on destroy; Textures slots sampling this target hold a `Weak`
    lease: Option<Arc<()>>,
}

impl OffscreenTargetResource {
    /// Allocate the framebuffer and its attachments
    pub fn new(device: SharedDevice, state: OffscreenTargetState) -> Result<Self> {
        let (framebuffer, renderbuffer, color_texture, depth_texture) = {
            let mut gpu = lock_device(&device)?;
            if state.depth {
                let (fb, color, depth) = init_depth_layout(&mut *gpu, state.size)?;
                (fb, None, color, Some(depth))
            } else {
                let (fb, rb, color) = init_color_layout(&mut *gpu, state.size)?;
                (fb, Some(rb), color, None)
            }
        };
        engine_debug!("beam::OffscreenTarget", "Created {}x{} target (depth texture: {})",
            state.size, state.size, state.depth);

        Ok(Self {
            device,
            state,
            framebuffer: Some(framebuffer),
            renderbuffer,
            color_texture: Some(color_texture),
            depth_texture,
            lease: Some(Arc::new(())),
        })
    }

    pub fn state(&self) -> OffscreenTargetState {
        self.state
    }

    pub fn size(&self) -> u32 {
        self.state.size
    }

    pub fn framebuffer(&self) -> Option<FramebufferHandle> {
        self.framebuffer
    }

    pub fn renderbuffer(&self) -> Option<RenderbufferHandle> {
        self.renderbuffer
    }

    pub fn color_texture(&self) -> Option<TextureHandle> {
        self.color_texture
    }

    pub fn depth_texture(&self) -> Option<TextureHandle> {
        self.depth_texture
    }

    /// Texture a Textures slot samples: depth texture when present, else color
    pub fn sampled_texture(&self) -> Option<TextureHandle> {
        if self.state.depth {
            self.depth_texture
        } else {
            self.color_texture
        }
    }

    pub(crate) fn lease(&self) -> Weak<()> {
        self.lease.as_ref().map(Arc::downgrade).unwrap_or_default()
    }

    /// Delete the framebuffer and every attachment
    ///
    /// Textures slots sampling this target stop binding its texture.
    pub fn destroy(&mut self) -> Result<()> {
        let mut gpu = lock_device(&self.device)?;
        self.lease = None;
        if let Some(framebuffer) = self.framebuffer.take() {
            gpu.delete_framebuffer(framebuffer);
        }
        if let Some(renderbuffer) = self.renderbuffer.take() {
            gpu.delete_renderbuffer(renderbuffer);
        }
        for texture in [self.color_texture.take(), self.depth_texture.take()].into_iter().flatten() {
            gpu.delete_texture(texture);
        }
        Ok(())
    }
}

impl fmt::Debug for OffscreenTargetResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffscreenTargetResource")
            .field("state", &self.state)
            .field("framebuffer", &self.framebuffer)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Layouts
// ============================================================================

fn allocate_storage(device: &mut dyn GraphicsDevice, format: PixelFormat, pixel_type: PixelType, size: u32) {
    device.tex_image_2d(&TexImage2d {
        target: TexImageTarget::Texture2D,
        level: 0,
        format,
        width: size,
        height: size,
        pixel_type,
        pixels: None,
    });
}

fn nearest_filters(device: &mut dyn GraphicsDevice) {
    device.tex_parameter(TextureTarget::Texture2D, TextureParameter::MinFilter(FilterMode::Nearest));
    device.tex_parameter(TextureTarget::Texture2D, TextureParameter::MagFilter(FilterMode::Nearest));
}

fn check_status(device: &mut dyn GraphicsDevice) {
    if let FramebufferStatus::Incomplete(code) = device.check_framebuffer_status() {
        engine_error!("beam::OffscreenTarget", "Framebuffer object is incomplete: 0x{:X}", code);
    }
}

fn init_color_layout(
    device: &mut dyn GraphicsDevice,
    size: u32,
) -> Result<(FramebufferHandle, RenderbufferHandle, TextureHandle)> {
    let framebuffer = device.create_framebuffer()?;
    let renderbuffer = match device.create_renderbuffer() {
        Ok(renderbuffer) => renderbuffer,
        Err(err) => {
            device.delete_framebuffer(framebuffer);
            return Err(err);
        }
    };
    let color = match device.create_texture() {
        Ok(color) => color,
        Err(err) => {
            device.delete_renderbuffer(renderbuffer);
            device.delete_framebuffer(framebuffer);
            return Err(err);
        }
    };

    device.bind_texture(TextureTarget::Texture2D, Some(color));
    allocate_storage(device, PixelFormat::Rgba, PixelType::UnsignedByte, size);
    nearest_filters(device);

    device.bind_renderbuffer(Some(renderbuffer));
    device.renderbuffer_storage(RenderbufferFormat::DepthComponent16, size, size);

    device.bind_framebuffer(Some(framebuffer));
    device.framebuffer_texture_2d(Attachment::Color0, Some(color));
    device.framebuffer_renderbuffer(Attachment::Depth, Some(renderbuffer));
    check_status(device);

    device.bind_framebuffer(None);
    device.bind_texture(TextureTarget::Texture2D, None);
    device.bind_renderbuffer(None);

    Ok((framebuffer, renderbuffer, color))
}

fn init_depth_layout(
    device: &mut dyn GraphicsDevice,
    size: u32,
) -> Result<(FramebufferHandle, TextureHandle, TextureHandle)> {
    if !device.extension_enabled(EXT_DEPTH_TEXTURE) {
        engine_warn!("beam::OffscreenTarget", "{} is not enabled, depth texture may be unsupported",
            EXT_DEPTH_TEXTURE);
    }

    let framebuffer = device.create_framebuffer()?;
    let color = match device.create_texture() {
        Ok(color) => color,
        Err(err) => {
            device.delete_framebuffer(framebuffer);
            return Err(err);
        }
    };
    let depth = match device.create_texture() {
        Ok(depth) => depth,
        Err(err) => {
            device.delete_texture(color);
            device.delete_framebuffer(framebuffer);
            return Err(err);
        }
    };

    device.bind_texture(TextureTarget::Texture2D, Some(color));
    allocate_storage(device, PixelFormat::Rgba, PixelType::UnsignedByte, size);
    nearest_filters(device);

    device.bind_texture(TextureTarget::Texture2D, Some(depth));
    nearest_filters(device);
    allocate_storage(device, PixelFormat::DepthComponent, PixelType::UnsignedShort, size);

    device.bind_framebuffer(Some(framebuffer));
    device.framebuffer_texture_2d(Attachment::Color0, Some(color));
    device.framebuffer_texture_2d(Attachment::Depth, Some(depth));
    check_status(device);

    device.bind_texture(TextureTarget::Texture2D, None);
    device.bind_framebuffer(None);

    Ok((framebuffer, color, depth))
}

#[cfg(test)]
#[path = "offscreen_target_tests.rs"]
mod tests;
