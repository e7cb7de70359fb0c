/// Resource sum type, factory and draw-time grouping
///
/// `Resource::create` is the single allocation entry point used by the
/// engine. Draws take borrowed `ResourceRef`s in any order; `group_resources`
/// folds them into one view per kind.

use std::fmt;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::{BufferHandle, SharedDevice, TextureHandle};
use crate::resource::{
    IndexBufferResource, IndexBufferState, OffscreenTargetResource, OffscreenTargetState,
    TexturesResource, TexturesState, UniformValue, UniformsResource, UniformsState,
    VertexBuffersResource, VertexBuffersState,
};
use crate::{engine_bail, engine_debug};

// ============================================================================
// Kinds and states
// ============================================================================

/// Resource kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    VertexBuffers,
    IndexBuffer,
    Uniforms,
    Textures,
    OffscreenTarget,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::VertexBuffers => "VertexBuffers",
            ResourceKind::IndexBuffer => "IndexBuffer",
            ResourceKind::Uniforms => "Uniforms",
            ResourceKind::Textures => "Textures",
            ResourceKind::OffscreenTarget => "OffscreenTarget",
        };
        f.write_str(name)
    }
}

/// Initial state of a resource, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState {
    VertexBuffers(VertexBuffersState),
    IndexBuffer(IndexBufferState),
    Uniforms(UniformsState),
    Textures(TexturesState),
    OffscreenTarget(OffscreenTargetState),
}

impl ResourceState {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceState::VertexBuffers(_) => ResourceKind::VertexBuffers,
            ResourceState::IndexBuffer(_) => ResourceKind::IndexBuffer,
            ResourceState::Uniforms(_) => ResourceKind::Uniforms,
            ResourceState::Textures(_) => ResourceKind::Textures,
            ResourceState::OffscreenTarget(_) => ResourceKind::OffscreenTarget,
        }
    }
}

impl From<VertexBuffersState> for ResourceState {
    fn from(state: VertexBuffersState) -> Self {
        ResourceState::VertexBuffers(state)
    }
}

impl From<IndexBufferState> for ResourceState {
    fn from(state: IndexBufferState) -> Self {
        ResourceState::IndexBuffer(state)
    }
}

impl From<UniformsState> for ResourceState {
    fn from(state: UniformsState) -> Self {
        ResourceState::Uniforms(state)
    }
}

impl From<TexturesState> for ResourceState {
    fn from(state: TexturesState) -> Self {
        ResourceState::Textures(state)
    }
}

impl From<OffscreenTargetState> for ResourceState {
    fn from(state: OffscreenTargetState) -> Self {
        ResourceState::OffscreenTarget(state)
    }
}

// ============================================================================
// Resource
// ============================================================================

/// Resource handle returned by the engine
#[derive(Debug)]
pub enum Resource {
    VertexBuffers(VertexBuffersResource),
    IndexBuffer(IndexBufferResource),
    Uniforms(UniformsResource),
    Textures(TexturesResource),
    OffscreenTarget(OffscreenTargetResource),
}

impl Resource {
    /// Allocate a resource of `kind`
    ///
    /// A missing state means an empty resource, except for IndexBuffer which
    /// requires its array. A state of another kind is rejected.
    pub fn create(device: SharedDevice, kind: ResourceKind, state: Option<ResourceState>) -> Result<Self> {
        if let Some(state) = &state {
            if state.kind() != kind {
                engine_bail!("beam::Resource", InvalidResource,
                    "{} resource given {} state", kind, state.kind());
            }
        }

        let resource = match (kind, state) {
            (ResourceKind::VertexBuffers, Some(ResourceState::VertexBuffers(state))) => {
                Resource::VertexBuffers(VertexBuffersResource::new(device, state)?)
            }
            (ResourceKind::VertexBuffers, _) => {
                Resource::VertexBuffers(VertexBuffersResource::new(device, VertexBuffersState::default())?)
            }
            (ResourceKind::IndexBuffer, Some(ResourceState::IndexBuffer(state))) => {
                Resource::IndexBuffer(IndexBufferResource::new(device, state)?)
            }
            (ResourceKind::IndexBuffer, _) => {
                engine_bail!("beam::Resource", InvalidResource, "IndexBuffer requires an index array");
            }
            (ResourceKind::Uniforms, Some(ResourceState::Uniforms(state))) => {
                Resource::Uniforms(UniformsResource::new(state))
            }
            (ResourceKind::Uniforms, _) => Resource::Uniforms(UniformsResource::default()),
            (ResourceKind::Textures, Some(ResourceState::Textures(state))) => {
                Resource::Textures(TexturesResource::new(device, state)?)
            }
            (ResourceKind::Textures, _) => {
                Resource::Textures(TexturesResource::new(device, TexturesState::default())?)
            }
            (ResourceKind::OffscreenTarget, Some(ResourceState::OffscreenTarget(state))) => {
                Resource::OffscreenTarget(OffscreenTargetResource::new(device, state)?)
            }
            (ResourceKind::OffscreenTarget, _) => {
                Resource::OffscreenTarget(OffscreenTargetResource::new(device, OffscreenTargetState::default())?)
            }
        };
        Ok(resource)
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::VertexBuffers(_) => ResourceKind::VertexBuffers,
            Resource::IndexBuffer(_) => ResourceKind::IndexBuffer,
            Resource::Uniforms(_) => ResourceKind::Uniforms,
            Resource::Textures(_) => ResourceKind::Textures,
            Resource::OffscreenTarget(_) => ResourceKind::OffscreenTarget,
        }
    }

    /// Release every GPU object the resource owns
    pub fn destroy(&mut self) -> Result<()> {
        match self {
            Resource::VertexBuffers(buffers) => buffers.destroy_all(),
            Resource::IndexBuffer(indices) => indices.destroy(),
            Resource::Uniforms(_) => Ok(()),
            Resource::Textures(textures) => textures.destroy_all(),
            Resource::OffscreenTarget(target) => target.destroy(),
        }
    }

    pub fn as_vertex_buffers_mut(&mut self) -> Option<&mut VertexBuffersResource> {
        match self {
            Resource::VertexBuffers(buffers) => Some(buffers),
            _ => None,
        }
    }

    pub fn as_index_buffer_mut(&mut self) -> Option<&mut IndexBufferResource> {
        match self {
            Resource::IndexBuffer(indices) => Some(indices),
            _ => None,
        }
    }

    pub fn as_uniforms_mut(&mut self) -> Option<&mut UniformsResource> {
        match self {
            Resource::Uniforms(uniforms) => Some(uniforms),
            _ => None,
        }
    }

    pub fn as_textures_mut(&mut self) -> Option<&mut TexturesResource> {
        match self {
            Resource::Textures(textures) => Some(textures),
            _ => None,
        }
    }

    pub fn as_offscreen_target(&self) -> Option<&OffscreenTargetResource> {
        match self {
            Resource::OffscreenTarget(target) => Some(target),
            _ => None,
        }
    }

    /// Borrow for a draw list
    pub fn draw_ref(&self) -> ResourceRef<'_> {
        ResourceRef::from(self)
    }
}

// ============================================================================
// Borrowed resources
// ============================================================================

/// Resource borrowed for one draw
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    VertexBuffers(&'a VertexBuffersResource),
    IndexBuffer(&'a IndexBufferResource),
    Uniforms(&'a UniformsResource),
    Textures(&'a TexturesResource),
    OffscreenTarget(&'a OffscreenTargetResource),
}

impl ResourceRef<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::VertexBuffers(_) => ResourceKind::VertexBuffers,
            ResourceRef::IndexBuffer(_) => ResourceKind::IndexBuffer,
            ResourceRef::Uniforms(_) => ResourceKind::Uniforms,
            ResourceRef::Textures(_) => ResourceKind::Textures,
            ResourceRef::OffscreenTarget(_) => ResourceKind::OffscreenTarget,
        }
    }
}

impl<'a> From<&'a Resource> for ResourceRef<'a> {
    fn from(resource: &'a Resource) -> Self {
        match resource {
            Resource::VertexBuffers(buffers) => ResourceRef::VertexBuffers(buffers),
            Resource::IndexBuffer(indices) => ResourceRef::IndexBuffer(indices),
            Resource::Uniforms(uniforms) => ResourceRef::Uniforms(uniforms),
            Resource::Textures(textures) => ResourceRef::Textures(textures),
            Resource::OffscreenTarget(target) => ResourceRef::OffscreenTarget(target),
        }
    }
}

impl<'a> From<&'a VertexBuffersResource> for ResourceRef<'a> {
    fn from(buffers: &'a VertexBuffersResource) -> Self {
        ResourceRef::VertexBuffers(buffers)
    }
}

impl<'a> From<&'a IndexBufferResource> for ResourceRef<'a> {
    fn from(indices: &'a IndexBufferResource) -> Self {
        ResourceRef::IndexBuffer(indices)
    }
}

impl<'a> From<&'a UniformsResource> for ResourceRef<'a> {
    fn from(uniforms: &'a UniformsResource) -> Self {
        ResourceRef::Uniforms(uniforms)
    }
}

impl<'a> From<&'a TexturesResource> for ResourceRef<'a> {
    fn from(textures: &'a TexturesResource) -> Self {
        ResourceRef::Textures(textures)
    }
}

impl<'a> From<&'a OffscreenTargetResource> for ResourceRef<'a> {
    fn from(target: &'a OffscreenTargetResource) -> Self {
        ResourceRef::OffscreenTarget(target)
    }
}

// ============================================================================
// Grouping
// ============================================================================

/// Draw inputs folded by kind
#[derive(Debug, Default)]
pub struct GroupedResources<'a> {
    /// Live vertex buffers by attribute name
    pub vertex_buffers: FxHashMap<&'a str, BufferHandle>,
    /// Last index buffer of the list
    pub index_buffer: Option<&'a IndexBufferResource>,
    /// Uniform values by dotted path
    pub uniforms: FxHashMap<&'a str, &'a UniformValue>,
    /// Sampled textures by slot name
    pub textures: FxHashMap<&'a str, TextureHandle>,
}

/// Fold a draw list into one view per kind
///
/// Same-kind resources merge by key with later entries winning; the last
/// index buffer wins; offscreen targets are not draw inputs and are ignored.
pub fn group_resources<'a>(resources: &[ResourceRef<'a>]) -> GroupedResources<'a> {
    let mut grouped = GroupedResources::default();
    for resource in resources {
        match *resource {
            ResourceRef::VertexBuffers(buffers) => grouped.vertex_buffers.extend(buffers.live_buffers()),
            ResourceRef::IndexBuffer(indices) => grouped.index_buffer = Some(indices),
            ResourceRef::Uniforms(uniforms) => grouped.uniforms.extend(uniforms.iter()),
            ResourceRef::Textures(textures) => grouped.textures.extend(textures.live_textures()),
            ResourceRef::OffscreenTarget(_) => {
                engine_debug!("beam::Resource", "Offscreen target in a draw list is ignored");
            }
        }
    }
    grouped
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
