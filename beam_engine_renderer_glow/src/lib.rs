/*!
# Beam Engine - glow Renderer Backend

OpenGL / WebGL implementation of the beam_engine `GraphicsDevice` trait.

This crate maps every device call onto the `glow` bindings, so the same
backend runs on desktop GL 3.3+ contexts and on WebGL contexts in the
browser. The host creates the `glow::Context` (glutin, sdl2, web-sys) and
hands it to a `GlowSurface`, which the engine consumes.
*/

mod glow_format;
mod glow_device;
mod glow_surface;

pub use glow_device::GlowDevice;
pub use glow_surface::GlowSurface;
