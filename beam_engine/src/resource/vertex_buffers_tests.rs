/// Unit tests for VertexBuffersResource

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{CallLog, DeviceCall, MockDeviceConfig, MockGraphicsDevice};
use crate::graphics_device::BufferTarget;
use crate::resource::vertex_buffers::*;

fn state() -> VertexBuffersState {
    let mut state = VertexBuffersState::default();
    state.insert("position".to_string(), vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    state
}

#[test]
fn test_create_uploads_floats() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let buffers = VertexBuffersResource::new(device, state()).unwrap();

    let buffer = buffers.buffer("position").unwrap();
    let calls = log.calls();
    assert_eq!(calls[0], DeviceCall::CreateBuffer(buffer));
    assert_eq!(calls[1], DeviceCall::BindBuffer(BufferTarget::Array, Some(buffer)));
    match &calls[2] {
        DeviceCall::BufferData { target, data } => {
            assert_eq!(*target, BufferTarget::Array);
            // 9 floats of 4 bytes
            assert_eq!(data.len(), 36);
            assert_eq!(&data[12..16], &1.0f32.to_ne_bytes());
        }
        other => panic!("unexpected call: {:?}", other),
    }
}

#[test]
fn test_set_reuses_buffer() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let mut buffers = VertexBuffersResource::new(device, state()).unwrap();
    log.clear();

    buffers.set("position", vec![1.0, 2.0, 3.0]).unwrap();

    assert_eq!(log.count(|c| matches!(c, DeviceCall::CreateBuffer(_))), 0);
    assert_eq!(log.count(|c| matches!(c, DeviceCall::BufferData { .. })), 1);
    assert_eq!(buffers.state()["position"], vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_set_unknown_key_rejected() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let mut buffers = VertexBuffersResource::new(device, state()).unwrap();
    log.clear();

    let result = buffers.set("normal", vec![0.0, 1.0, 0.0]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(log.is_empty());
}

#[test]
fn test_destroy_removes_key() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let mut buffers = VertexBuffersResource::new(device, state()).unwrap();
    let buffer = buffers.buffer("position").unwrap();

    buffers.destroy("position").unwrap();

    assert!(log.calls().contains(&DeviceCall::DeleteBuffer(buffer)));
    assert_eq!(buffers.buffer("position"), None);
    assert!(buffers.state().is_empty());
    assert!(matches!(buffers.set("position", vec![0.0]), Err(Error::InvalidResource(_))));
}

#[test]
fn test_destroy_all() {
    let mut full = state();
    full.insert("uv".to_string(), vec![0.0, 1.0]);
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let mut buffers = VertexBuffersResource::new(device, full).unwrap();

    buffers.destroy_all().unwrap();

    assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteBuffer(_))), 2);
    assert_eq!(buffers.live_buffers().count(), 0);
}

#[test]
fn test_failed_creation_releases_created_buffers() {
    let config = MockDeviceConfig { max_objects: Some(1), ..Default::default() };
    let (device, log) = MockGraphicsDevice::with_config(config, CallLog::new()).into_shared();
    let mut state = state();
    state.insert("normal".to_string(), vec![0.0, 0.0, 1.0]);

    let result = VertexBuffersResource::new(device, state);

    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert_eq!(log.count(|c| matches!(c, DeviceCall::CreateBuffer(_))), 1);
    assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteBuffer(_))), 1);
}
