/// Uniform type dispatch table
///
/// Maps a schema value type and a `UniformValue` to the exact device upload:
///
/// | Schema type | Scalar / text | Sequence |
/// |---|---|---|
/// | `int` | `uniform_1i` | `uniform_1iv` |
/// | `float` | `uniform_1f` | `uniform_1fv` |
/// | `vec2`/`vec3`/`vec4` | degenerate | `uniform_{2,3,4}fv` |
/// | `mat2`/`mat3`/`mat4` | degenerate | `uniform_matrix_{2,3,4}fv`, no transpose |
///
/// Sequences must be non-empty and a multiple of the type's component
/// count. Samplers never go through this table; the draw binder assigns
/// them texture units.

use std::borrow::Cow;
use std::fmt;
use crate::graphics_device::{GraphicsDevice, UniformLocation};
use crate::resource::UniformValue;
use crate::schema::SchemaType;

/// One resolved uniform upload
#[derive(Debug, Clone, PartialEq)]
pub enum UniformUpload<'a> {
    Int(i32),
    Ints(Cow<'a, [i32]>),
    Float(f32),
    Floats(Cow<'a, [f32]>),
    Vec2(Cow<'a, [f32]>),
    Vec3(Cow<'a, [f32]>),
    Vec4(Cow<'a, [f32]>),
    Mat2(Cow<'a, [f32]>),
    Mat3(Cow<'a, [f32]>),
    Mat4(Cow<'a, [f32]>),
}

impl UniformUpload<'_> {
    /// Issue the upload on `device`
    pub fn apply(&self, device: &mut dyn GraphicsDevice, location: UniformLocation) {
        match self {
            UniformUpload::Int(value) => device.uniform_1i(location, *value),
            UniformUpload::Ints(values) => device.uniform_1iv(location, values),
            UniformUpload::Float(value) => device.uniform_1f(location, *value),
            UniformUpload::Floats(values) => device.uniform_1fv(location, values),
            UniformUpload::Vec2(values) => device.uniform_2fv(location, values),
            UniformUpload::Vec3(values) => device.uniform_3fv(location, values),
            UniformUpload::Vec4(values) => device.uniform_4fv(location, values),
            UniformUpload::Mat2(values) => device.uniform_matrix_2fv(location, false, values),
            UniformUpload::Mat3(values) => device.uniform_matrix_3fv(location, false, values),
            UniformUpload::Mat4(values) => device.uniform_matrix_4fv(location, false, values),
        }
    }
}

/// Why a value cannot be uploaded to a slot
#[derive(Debug, Clone, PartialEq)]
pub enum Degenerate {
    /// Empty sequence
    Empty,
    /// Text that does not parse as a number
    Unparsable(String),
    /// Scalar given to a vector or matrix slot
    ScalarForVector(SchemaType),
    /// Sequence length not a multiple of the component count
    Length { len: usize, components: u32 },
    /// Sampler slots take texture units, not values
    Sampler(SchemaType),
}

impl fmt::Display for Degenerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degenerate::Empty => write!(f, "empty sequence"),
            Degenerate::Unparsable(text) => write!(f, "'{}' is not a number", text),
            Degenerate::ScalarForVector(ty) => write!(f, "scalar given to a {:?} slot", ty),
            Degenerate::Length { len, components } => {
                write!(f, "{} values is not a multiple of {}", len, components)
            }
            Degenerate::Sampler(ty) => write!(f, "{:?} slot takes a texture", ty),
        }
    }
}

/// Resolve the upload for a value on a slot of type `ty`
pub fn resolve_upload(ty: SchemaType, value: &UniformValue) -> Result<UniformUpload<'_>, Degenerate> {
    match ty {
        SchemaType::Int => resolve_int(value),
        SchemaType::Float => resolve_float(value),
        SchemaType::Tex2D | SchemaType::TexCube => Err(Degenerate::Sampler(ty)),
        _ => {
            let values = float_sequence(ty, value)?;
            let components = ty.component_count();
            if values.len() % components as usize != 0 {
                return Err(Degenerate::Length { len: values.len(), components });
            }
            Ok(match ty {
                SchemaType::Vec2 => UniformUpload::Vec2(values),
                SchemaType::Vec3 => UniformUpload::Vec3(values),
                SchemaType::Vec4 => UniformUpload::Vec4(values),
                SchemaType::Mat2 => UniformUpload::Mat2(values),
                SchemaType::Mat3 => UniformUpload::Mat3(values),
                _ => UniformUpload::Mat4(values),
            })
        }
    }
}

fn parse_number(text: &str) -> Result<f64, Degenerate> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Degenerate::Unparsable(text.to_string()))
}

fn resolve_int(value: &UniformValue) -> Result<UniformUpload<'_>, Degenerate> {
    match value {
        UniformValue::Int(v) => Ok(UniformUpload::Int(*v)),
        UniformValue::Float(v) => Ok(UniformUpload::Int(*v as i32)),
        UniformValue::Text(text) => Ok(UniformUpload::Int(parse_number(text)?.trunc() as i32)),
        UniformValue::Ints(values) if values.is_empty() => Err(Degenerate::Empty),
        UniformValue::Ints(values) => Ok(UniformUpload::Ints(Cow::Borrowed(values))),
        UniformValue::Floats(values) if values.is_empty() => Err(Degenerate::Empty),
        UniformValue::Floats(values) => {
            Ok(UniformUpload::Ints(values.iter().map(|v| *v as i32).collect()))
        }
    }
}

fn resolve_float(value: &UniformValue) -> Result<UniformUpload<'_>, Degenerate> {
    match value {
        UniformValue::Int(v) => Ok(UniformUpload::Float(*v as f32)),
        UniformValue::Float(v) => Ok(UniformUpload::Float(*v)),
        UniformValue::Text(text) => Ok(UniformUpload::Float(parse_number(text)? as f32)),
        UniformValue::Ints(values) if values.is_empty() => Err(Degenerate::Empty),
        UniformValue::Ints(values) => {
            Ok(UniformUpload::Floats(values.iter().map(|v| *v as f32).collect()))
        }
        UniformValue::Floats(values) if values.is_empty() => Err(Degenerate::Empty),
        UniformValue::Floats(values) => Ok(UniformUpload::Floats(Cow::Borrowed(values))),
    }
}

fn float_sequence(ty: SchemaType, value: &UniformValue) -> Result<Cow<'_, [f32]>, Degenerate> {
    match value {
        UniformValue::Int(_) | UniformValue::Float(_) | UniformValue::Text(_) => {
            Err(Degenerate::ScalarForVector(ty))
        }
        UniformValue::Floats(values) if values.is_empty() => Err(Degenerate::Empty),
        UniformValue::Floats(values) => Ok(Cow::Borrowed(values)),
        UniformValue::Ints(values) if values.is_empty() => Err(Degenerate::Empty),
        UniformValue::Ints(values) => Ok(values.iter().map(|v| *v as f32).collect()),
    }
}

#[cfg(test)]
#[path = "uniform_dispatch_tests.rs"]
mod tests;
