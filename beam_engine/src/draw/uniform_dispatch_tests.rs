/// Unit tests for the uniform dispatch table

use std::borrow::Cow;
use glam::{Mat4, Vec3};
use crate::draw::uniform_dispatch::*;
use crate::graphics_device::mock_graphics_device::{DeviceCall, MockGraphicsDevice};
use crate::graphics_device::{GraphicsDevice, ShaderStage, UniformLocation};
use crate::resource::UniformValue;
use crate::schema::SchemaType;

fn device_with_location() -> (MockGraphicsDevice, UniformLocation) {
    let mut device = MockGraphicsDevice::new();
    let vs = device.compile_shader(ShaderStage::Vertex, "void main() {}").unwrap();
    let fs = device.compile_shader(ShaderStage::Fragment, "void main() {}").unwrap();
    let program = device.link_program(vs, fs).unwrap();
    let location = device.uniform_location(program, "u").unwrap();
    device.log().clear();
    (device, location)
}

// ============================================================================
// int / float slots
// ============================================================================

#[test]
fn test_int_scalar_and_sequence() {
    assert_eq!(resolve_upload(SchemaType::Int, &UniformValue::Int(3)), Ok(UniformUpload::Int(3)));
    assert_eq!(
        resolve_upload(SchemaType::Int, &UniformValue::Ints(vec![1, 2])),
        Ok(UniformUpload::Ints(Cow::Owned(vec![1, 2])))
    );
}

#[test]
fn test_float_scalar_and_sequence() {
    assert_eq!(resolve_upload(SchemaType::Float, &UniformValue::Float(0.5)), Ok(UniformUpload::Float(0.5)));
    assert_eq!(
        resolve_upload(SchemaType::Float, &UniformValue::Floats(vec![0.5, 1.5])),
        Ok(UniformUpload::Floats(Cow::Owned(vec![0.5, 1.5])))
    );
}

#[test]
fn test_zero_is_a_real_value() {
    assert_eq!(resolve_upload(SchemaType::Int, &UniformValue::Int(0)), Ok(UniformUpload::Int(0)));
    assert_eq!(resolve_upload(SchemaType::Float, &UniformValue::Float(0.0)), Ok(UniformUpload::Float(0.0)));
}

#[test]
fn test_scalar_type_conversions() {
    assert_eq!(resolve_upload(SchemaType::Int, &UniformValue::Float(2.9)), Ok(UniformUpload::Int(2)));
    assert_eq!(resolve_upload(SchemaType::Float, &UniformValue::Int(2)), Ok(UniformUpload::Float(2.0)));
    assert_eq!(
        resolve_upload(SchemaType::Float, &UniformValue::Ints(vec![1, 2])),
        Ok(UniformUpload::Floats(Cow::Owned(vec![1.0, 2.0])))
    );
}

#[test]
fn test_text_parses_as_slot_type() {
    assert_eq!(resolve_upload(SchemaType::Int, &"7.8".into()), Ok(UniformUpload::Int(7)));
    assert_eq!(resolve_upload(SchemaType::Float, &" 0.25 ".into()), Ok(UniformUpload::Float(0.25)));
    assert_eq!(
        resolve_upload(SchemaType::Float, &"abc".into()),
        Err(Degenerate::Unparsable("abc".to_string()))
    );
}

#[test]
fn test_empty_sequence_is_degenerate() {
    assert_eq!(resolve_upload(SchemaType::Int, &UniformValue::Ints(vec![])), Err(Degenerate::Empty));
    assert_eq!(resolve_upload(SchemaType::Float, &UniformValue::Floats(vec![])), Err(Degenerate::Empty));
    assert_eq!(resolve_upload(SchemaType::Vec3, &UniformValue::Floats(vec![])), Err(Degenerate::Empty));
}

// ============================================================================
// vector / matrix slots
// ============================================================================

#[test]
fn test_vectors_and_matrices() {
    let vec3: UniformValue = Vec3::new(1.0, 2.0, 3.0).into();
    let upload = resolve_upload(SchemaType::Vec3, &vec3).unwrap();
    assert_eq!(upload, UniformUpload::Vec3(Cow::Owned(vec![1.0, 2.0, 3.0])));

    let identity: UniformValue = Mat4::IDENTITY.into();
    match resolve_upload(SchemaType::Mat4, &identity).unwrap() {
        UniformUpload::Mat4(values) => assert_eq!(values.len(), 16),
        other => panic!("unexpected upload: {:?}", other),
    }
}

#[test]
fn test_vector_arrays_accepted() {
    let value = UniformValue::Floats(vec![0.0; 8]);
    assert!(matches!(resolve_upload(SchemaType::Vec4, &value), Ok(UniformUpload::Vec4(_))));
    assert!(matches!(resolve_upload(SchemaType::Vec2, &value), Ok(UniformUpload::Vec2(_))));
}

#[test]
fn test_int_sequence_widened_for_vectors() {
    assert_eq!(
        resolve_upload(SchemaType::Vec2, &UniformValue::Ints(vec![1, 2])),
        Ok(UniformUpload::Vec2(Cow::Owned(vec![1.0, 2.0])))
    );
}

#[test]
fn test_wrong_length_is_degenerate() {
    assert_eq!(
        resolve_upload(SchemaType::Vec3, &UniformValue::Floats(vec![1.0, 2.0])),
        Err(Degenerate::Length { len: 2, components: 3 })
    );
    assert_eq!(
        resolve_upload(SchemaType::Mat3, &UniformValue::Floats(vec![0.0; 16])),
        Err(Degenerate::Length { len: 16, components: 9 })
    );
}

#[test]
fn test_scalar_for_vector_is_degenerate() {
    assert_eq!(
        resolve_upload(SchemaType::Vec4, &UniformValue::Float(1.0)),
        Err(Degenerate::ScalarForVector(SchemaType::Vec4))
    );
    assert_eq!(
        resolve_upload(SchemaType::Mat2, &"1".into()),
        Err(Degenerate::ScalarForVector(SchemaType::Mat2))
    );
}

#[test]
fn test_sampler_slot_rejected() {
    assert_eq!(
        resolve_upload(SchemaType::Tex2D, &UniformValue::Int(0)),
        Err(Degenerate::Sampler(SchemaType::Tex2D))
    );
}

#[test]
fn test_degenerate_display() {
    assert_eq!(Degenerate::Empty.to_string(), "empty sequence");
    assert_eq!(
        Degenerate::Length { len: 5, components: 4 }.to_string(),
        "5 values is not a multiple of 4"
    );
}

// ============================================================================
// apply
// ============================================================================

#[test]
fn test_apply_issues_matching_call() {
    let (mut device, location) = device_with_location();

    UniformUpload::Int(4).apply(&mut device, location);
    UniformUpload::Floats(Cow::Owned(vec![1.0, 2.0])).apply(&mut device, location);
    UniformUpload::Vec4(Cow::Owned(vec![0.0; 4])).apply(&mut device, location);
    UniformUpload::Mat2(Cow::Owned(vec![1.0, 0.0, 0.0, 1.0])).apply(&mut device, location);

    assert_eq!(
        device.log().calls(),
        vec![
            DeviceCall::Uniform1i(location, 4),
            DeviceCall::Uniform1fv(location, vec![1.0, 2.0]),
            DeviceCall::Uniform4fv(location, vec![0.0; 4]),
            DeviceCall::UniformMatrix2fv { location, transpose: false, values: vec![1.0, 0.0, 0.0, 1.0] },
        ]
    );
}
