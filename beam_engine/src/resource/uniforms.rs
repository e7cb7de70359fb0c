/// Uniforms resource and uniform values
///
/// Uniform state is a flat map keyed by the full dotted path used in the
/// shader (`"dirLight.direction"`), matching the schema declaration names.
/// No GPU object is owned; values are uploaded by the draw binder.

use rustc_hash::FxHashMap;
use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// Value held in a Uniforms resource or used as a schema default
///
/// Sequences are column-major for matrices.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    /// Scalar given as text, parsed against the slot type at draw time
    Text(String),
    Ints(Vec<i32>),
    Floats(Vec<f32>),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<u32> for UniformValue {
    fn from(value: u32) -> Self {
        UniformValue::Int(value as i32)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Int(value as i32)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<f64> for UniformValue {
    fn from(value: f64) -> Self {
        UniformValue::Float(value as f32)
    }
}

impl From<&str> for UniformValue {
    fn from(value: &str) -> Self {
        UniformValue::Text(value.to_string())
    }
}

impl From<String> for UniformValue {
    fn from(value: String) -> Self {
        UniformValue::Text(value)
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(values: Vec<f32>) -> Self {
        UniformValue::Floats(values)
    }
}

impl From<Vec<i32>> for UniformValue {
    fn from(values: Vec<i32>) -> Self {
        UniformValue::Ints(values)
    }
}

impl From<&[f32]> for UniformValue {
    fn from(values: &[f32]) -> Self {
        UniformValue::Floats(values.to_vec())
    }
}

impl From<&[i32]> for UniformValue {
    fn from(values: &[i32]) -> Self {
        UniformValue::Ints(values.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for UniformValue {
    fn from(values: [f32; N]) -> Self {
        UniformValue::Floats(values.to_vec())
    }
}

impl<const N: usize> From<[i32; N]> for UniformValue {
    fn from(values: [i32; N]) -> Self {
        UniformValue::Ints(values.to_vec())
    }
}

// ===== glam conversions =====

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Floats(v.to_array().to_vec())
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Floats(v.to_array().to_vec())
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Floats(v.to_array().to_vec())
    }
}

impl From<Mat2> for UniformValue {
    fn from(m: Mat2) -> Self {
        UniformValue::Floats(m.to_cols_array().to_vec())
    }
}

impl From<Mat3> for UniformValue {
    fn from(m: Mat3) -> Self {
        UniformValue::Floats(m.to_cols_array().to_vec())
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Floats(m.to_cols_array().to_vec())
    }
}

/// State of a Uniforms resource
pub type UniformsState = FxHashMap<String, UniformValue>;

/// Uniforms resource
#[derive(Debug, Clone, Default)]
pub struct UniformsResource {
    values: UniformsState,
}

impl UniformsResource {
    pub fn new(state: UniformsState) -> Self {
        Self { values: state }
    }

    /// Set the value at a dotted path
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<UniformValue>) -> &mut Self {
        self.values.insert(path.into(), value.into());
        self
    }

    /// Value at a dotted path
    pub fn get(&self, path: &str) -> Option<&UniformValue> {
        self.values.get(path)
    }

    pub fn state(&self) -> &UniformsState {
        &self.values
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
#[path = "uniforms_tests.rs"]
mod tests;
