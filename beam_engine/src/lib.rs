/*!
# Beam Engine

Schema-driven resource and draw binding over an immediate-mode graphics API.

The caller describes GPU resources and draw invocations through a typed
schema; the engine performs the imperative sequence of device calls needed to
create, update, bind and destroy the underlying GPU objects.

## Architecture

- **GraphicsDevice**: trait mirroring a stateful GL-style context, one method per call
- **Schema**: named buffers, uniforms, textures and draw mode for one program
- **Shader**: linked program plus resolved attribute and uniform locations
- **Resource**: vertex buffers, index buffer, uniforms, textures, offscreen target
- **DrawBinder**: per-draw binding of program, attributes, indices, uniforms and samplers
- **Beam**: facade owning the device, the program cache and registered commands

Backends (see `beam_engine_renderer_glow`) implement `GraphicsDevice`; tests
drive the engine through `MockGraphicsDevice`, which records every call.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod command;
pub mod graphics_device;
pub mod schema;
pub mod shader;
pub mod resource;
pub mod draw;

// Main beam namespace module
pub mod beam {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade and host surface traits
    pub use crate::engine::{Beam, Surface, ContextProvider};

    // Configuration
    pub use crate::config::{BeamConfig, ContextAttributes, EXT_DEPTH_TEXTURE, EXT_ELEMENT_INDEX_UINT, EXT_SRGB};

    // Commands
    pub use crate::command::{Command, CommandHook, offscreen_2d, OFFSCREEN_2D};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        pub use crate::log::{set_logger, reset_logger, log, log_detailed};
    }

    // Device sub-module
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Schema sub-module
    pub mod schema {
        pub use crate::schema::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Draw sub-module
    pub mod draw {
        pub use crate::draw::*;
    }
}

// Re-export math library at crate root
pub use glam;
