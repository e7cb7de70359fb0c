/// Unit tests for Resource, ResourceRef and draw-list grouping

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{DeviceCall, MockGraphicsDevice};
use crate::resource::*;

fn vertex_state(keys: &[&str]) -> VertexBuffersState {
    keys.iter().map(|k| (k.to_string(), vec![0.0, 1.0, 2.0])).collect()
}

fn uniform_state(entries: &[(&str, f32)]) -> UniformsState {
    entries.iter().map(|(k, v)| (k.to_string(), UniformValue::Float(*v))).collect()
}

// ============================================================================
// create
// ============================================================================

#[test]
fn test_create_each_kind() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();

    let kinds: [(ResourceKind, Option<ResourceState>); 5] = [
        (ResourceKind::VertexBuffers, Some(vertex_state(&["position"]).into())),
        (ResourceKind::IndexBuffer, Some(IndexBufferState::new([0, 1, 2]).into())),
        (ResourceKind::Uniforms, None),
        (ResourceKind::Textures, None),
        (ResourceKind::OffscreenTarget, Some(OffscreenTargetState { size: 16, depth: false }.into())),
    ];
    for (kind, state) in kinds {
        let resource = Resource::create(device.clone(), kind, state).unwrap();
        assert_eq!(resource.kind(), kind);
    }
}

#[test]
fn test_create_index_buffer_requires_state() {
    let (device, log) = MockGraphicsDevice::new().into_shared();

    let result = Resource::create(device, ResourceKind::IndexBuffer, None);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(log.is_empty());
}

#[test]
fn test_create_rejects_mismatched_state() {
    let (device, log) = MockGraphicsDevice::new().into_shared();

    let result = Resource::create(
        device,
        ResourceKind::Textures,
        Some(IndexBufferState::new([0]).into()),
    );

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(log.is_empty());
}

#[test]
fn test_create_offscreen_default_size() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let resource = Resource::create(device, ResourceKind::OffscreenTarget, None).unwrap();

    assert_eq!(resource.as_offscreen_target().unwrap().size(), DEFAULT_OFFSCREEN_SIZE);
}

#[test]
fn test_destroy_dispatches_per_kind() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let mut buffers = Resource::create(
        device.clone(),
        ResourceKind::VertexBuffers,
        Some(vertex_state(&["position", "normal"]).into()),
    )
    .unwrap();
    let mut uniforms = Resource::create(device, ResourceKind::Uniforms, None).unwrap();
    log.clear();

    buffers.destroy().unwrap();
    uniforms.destroy().unwrap();

    assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteBuffer(_))), 2);
    assert_eq!(log.len(), 2);
}

#[test]
fn test_typed_accessors() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let mut resource = Resource::create(device, ResourceKind::Uniforms, None).unwrap();

    assert!(resource.as_textures_mut().is_none());
    resource.as_uniforms_mut().unwrap().set("time", 1.5f32);

    match resource.draw_ref() {
        ResourceRef::Uniforms(uniforms) => assert_eq!(uniforms.get("time"), Some(&UniformValue::Float(1.5))),
        other => panic!("unexpected ref: {:?}", other.kind()),
    }
}

// ============================================================================
// group_resources
// ============================================================================

#[test]
fn test_group_merges_same_kind_later_wins() {
    let first = UniformsResource::new(uniform_state(&[("a", 1.0), ("b", 2.0)]));
    let second = UniformsResource::new(uniform_state(&[("b", 3.0)]));

    let grouped = group_resources(&[(&first).into(), (&second).into()]);

    assert_eq!(grouped.uniforms.len(), 2);
    assert_eq!(grouped.uniforms["a"], &UniformValue::Float(1.0));
    assert_eq!(grouped.uniforms["b"], &UniformValue::Float(3.0));
}

#[test]
fn test_group_last_index_buffer_wins() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let first = IndexBufferResource::new(device.clone(), IndexBufferState::new([0, 1, 2])).unwrap();
    let second = IndexBufferResource::new(device, IndexBufferState::new([0, 1])).unwrap();

    let grouped = group_resources(&[(&first).into(), (&second).into()]);

    assert_eq!(grouped.index_buffer.map(|i| i.count()), Some(2));
}

#[test]
fn test_group_order_irrelevant_across_kinds() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let buffers = VertexBuffersResource::new(device.clone(), vertex_state(&["position"])).unwrap();
    let indices = IndexBufferResource::new(device, IndexBufferState::new([0, 1, 2])).unwrap();
    let uniforms = UniformsResource::new(uniform_state(&[("t", 0.0)]));

    let a = group_resources(&[(&buffers).into(), (&indices).into(), (&uniforms).into()]);
    let b = group_resources(&[(&uniforms).into(), (&indices).into(), (&buffers).into()]);

    assert_eq!(a.vertex_buffers, b.vertex_buffers);
    assert_eq!(a.uniforms, b.uniforms);
    assert_eq!(a.index_buffer.map(|i| i.buffer()), b.index_buffer.map(|i| i.buffer()));
}

#[test]
fn test_group_skips_destroyed_vertex_buffers() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let mut buffers = VertexBuffersResource::new(device, vertex_state(&["position", "uv"])).unwrap();
    buffers.destroy("uv").unwrap();

    let grouped = group_resources(&[(&buffers).into()]);

    assert!(grouped.vertex_buffers.contains_key("position"));
    assert!(!grouped.vertex_buffers.contains_key("uv"));
}

#[test]
fn test_group_ignores_offscreen_targets() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let target = OffscreenTargetResource::new(device, OffscreenTargetState { size: 8, depth: false }).unwrap();

    let grouped = group_resources(&[(&target).into()]);

    assert!(grouped.vertex_buffers.is_empty());
    assert!(grouped.index_buffer.is_none());
    assert!(grouped.uniforms.is_empty());
    assert!(grouped.textures.is_empty());
}
