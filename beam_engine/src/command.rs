/// Registered composite commands
///
/// A `Command` wraps a caller-supplied operation with device hooks: `run`
/// calls `on_before(device, arg)`, then the modifier, then
/// `on_after(device, arg)`. The `offscreen_2d` preset renders into an
/// offscreen target.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::resource::OffscreenTargetResource;
use crate::engine_bail;

/// Hook run around a command's modifier
pub type CommandHook = Arc<dyn Fn(&mut dyn GraphicsDevice, &dyn Any) -> Result<()> + Send + Sync>;

/// Named command with optional before/after hooks
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub on_before: Option<CommandHook>,
    pub on_after: Option<CommandHook>,
}

impl Command {
    /// Command without hooks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_before: None,
            on_after: None,
        }
    }

    /// Set the hook run before the modifier
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn GraphicsDevice, &dyn Any) -> Result<()> + Send + Sync + 'static,
    {
        self.on_before = Some(Arc::new(hook));
        self
    }

    /// Set the hook run after the modifier
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn GraphicsDevice, &dyn Any) -> Result<()> + Send + Sync + 'static,
    {
        self.on_after = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("on_before", &self.on_before.is_some())
            .field("on_after", &self.on_after.is_some())
            .finish()
    }
}

/// Name of the [`offscreen_2d`] command
pub const OFFSCREEN_2D: &str = "offscreen2D";

/// Render-to-texture pass
///
/// The argument must be an `OffscreenTargetResource`. Before the modifier,
/// its framebuffer is bound and the viewport covers the whole target; after,
/// the default framebuffer is restored.
pub fn offscreen_2d() -> Command {
    Command::new(OFFSCREEN_2D)
        .before(|device, arg| {
            let target = offscreen_target(arg)?;
            let Some(framebuffer) = target.framebuffer() else {
                engine_bail!("beam::Command", InvalidResource, "offscreen target was destroyed");
            };
            device.bind_framebuffer(Some(framebuffer));
            device.viewport(0, 0, target.size(), target.size());
            Ok(())
        })
        .after(|device, _arg| {
            device.bind_framebuffer(None);
            Ok(())
        })
}

fn offscreen_target(arg: &dyn Any) -> Result<&OffscreenTargetResource> {
    match arg.downcast_ref::<OffscreenTargetResource>() {
        Some(target) => Ok(target),
        None => engine_bail!("beam::Command", InvalidResource, "{} expects an OffscreenTargetResource", OFFSCREEN_2D),
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
