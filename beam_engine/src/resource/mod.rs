//! Resource module
//!
//! GPU resources created by the engine and consumed by draws: vertex
//! buffers, index buffer, uniforms, textures and offscreen targets.

pub mod uniforms;
pub mod vertex_buffers;
pub mod index_buffer;
pub mod textures;
pub mod offscreen_target;
mod resource;

pub use uniforms::{UniformValue, UniformsState, UniformsResource};
pub use vertex_buffers::{VertexBuffersState, VertexBuffersResource};
pub use index_buffer::{IndexBufferState, IndexBufferResource};
pub use textures::{
    TextureKind, ColorSpace, ImageData,
    TextureState, TextureSource, TexturesState, TexturesResource,
};
pub use offscreen_target::{
    OffscreenTargetState, OffscreenTargetResource, DEFAULT_OFFSCREEN_SIZE,
};
pub use resource::{
    ResourceKind, ResourceState, Resource, ResourceRef,
    GroupedResources, group_resources,
};
