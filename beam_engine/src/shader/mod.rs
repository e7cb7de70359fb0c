/// Shader module - program linking and location resolution

pub mod shader;

pub use shader::*;
