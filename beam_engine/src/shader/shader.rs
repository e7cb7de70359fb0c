/// Shader linker - builds a program from sources plus schema
///
/// Both stages are compiled with the template's defines prepended, linked,
/// and every schema key is resolved to a location: buffers to attribute
/// locations, uniforms and textures to uniform locations. A failed compile
/// or link is logged and produces a `Shader` without program, which the
/// draw path rejects.

use std::collections::BTreeMap;
use crate::graphics_device::{GraphicsDevice, ProgramHandle, ShaderHandle, ShaderStage, UniformLocation};
use crate::schema::{Schema, SchemaType};
use crate::{engine_debug, engine_error};

// ============================================================================
// Template
// ============================================================================

/// Value of a preprocessor define
#[derive(Debug, Clone, PartialEq)]
pub enum DefineValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl DefineValue {
    /// Source text emitted after the define name, `None` when the define is off
    fn emitted(&self) -> Option<String> {
        match self {
            DefineValue::Bool(true) => Some("1".to_string()),
            DefineValue::Bool(false) => None,
            DefineValue::Int(0) => None,
            DefineValue::Int(v) => Some(v.to_string()),
            DefineValue::Float(v) if *v == 0.0 || v.is_nan() => None,
            DefineValue::Float(v) => Some(format!("{:?}", v)),
            DefineValue::Text(s) if s.is_empty() => None,
            DefineValue::Text(s) => Some(s.clone()),
        }
    }
}

impl From<bool> for DefineValue {
    fn from(value: bool) -> Self {
        DefineValue::Bool(value)
    }
}

impl From<i32> for DefineValue {
    fn from(value: i32) -> Self {
        DefineValue::Int(value as i64)
    }
}

impl From<i64> for DefineValue {
    fn from(value: i64) -> Self {
        DefineValue::Int(value)
    }
}

impl From<u32> for DefineValue {
    fn from(value: u32) -> Self {
        DefineValue::Int(value as i64)
    }
}

impl From<f32> for DefineValue {
    fn from(value: f32) -> Self {
        DefineValue::Float(value as f64)
    }
}

impl From<f64> for DefineValue {
    fn from(value: f64) -> Self {
        DefineValue::Float(value)
    }
}

impl From<&str> for DefineValue {
    fn from(value: &str) -> Self {
        DefineValue::Text(value.to_string())
    }
}

impl From<String> for DefineValue {
    fn from(value: String) -> Self {
        DefineValue::Text(value)
    }
}

/// Sources, schema and defines of one program
#[derive(Debug, Clone)]
pub struct ShaderTemplate {
    /// Vertex shader source
    pub vs: String,
    /// Fragment shader source
    pub fs: String,
    pub schema: Schema,
    /// Defines in emission order
    pub defines: Vec<(String, DefineValue)>,
}

impl ShaderTemplate {
    pub fn new(vs: impl Into<String>, fs: impl Into<String>, schema: Schema) -> Self {
        Self {
            vs: vs.into(),
            fs: fs.into(),
            schema,
            defines: Vec::new(),
        }
    }

    /// Add a define (emitted only when truthy)
    pub fn define(mut self, name: impl Into<String>, value: impl Into<DefineValue>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }
}

/// Prepend `#define NAME VALUE` lines for the truthy defines
///
/// When the source starts with a `#version` directive the defines go right
/// after it, since GLSL requires the directive first.
pub fn inject_defines(source: &str, defines: &[(String, DefineValue)]) -> String {
    let block: String = defines
        .iter()
        .filter_map(|(name, value)| value.emitted().map(|v| format!("#define {} {}\n", name, v)))
        .collect();

    if block.is_empty() {
        return source.to_string();
    }

    let trimmed = source.trim_start();
    if trimmed.starts_with("#version") {
        let (version, rest) = match trimmed.find('\n') {
            Some(end) => trimmed.split_at(end + 1),
            None => (trimmed, ""),
        };
        let mut out = String::with_capacity(source.len() + block.len() + 1);
        out.push_str(version);
        if !version.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&block);
        out.push_str(rest);
        out
    } else {
        block + source
    }
}

// ============================================================================
// Shader
// ============================================================================

/// Resolved vertex attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeRef {
    pub ty: SchemaType,
    /// Component count given to the attribute pointer
    pub components: u32,
    /// `None` when the program has no such active attribute
    pub location: Option<u32>,
}

/// Resolved uniform or sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformRef {
    pub ty: SchemaType,
    /// `None` when the program has no such active uniform
    pub location: Option<UniformLocation>,
}

/// Linked program with its schema and resolved locations
///
/// The program itself is owned by the `Beam` engine that built the shader
/// and deleted when the engine is dropped.
#[derive(Debug, Clone)]
pub struct Shader {
    program: Option<ProgramHandle>,
    schema: Schema,
    attributes: BTreeMap<String, AttributeRef>,
    uniforms: BTreeMap<String, UniformRef>,
}

impl Shader {
    /// Compile, link and resolve a template on `device`
    ///
    /// Never fails: compile and link errors are logged and yield a shader
    /// whose [`Shader::is_linked`] is false.
    pub fn build(device: &mut dyn GraphicsDevice, template: &ShaderTemplate) -> Self {
        let program = link(device, template);
        let schema = template.schema.clone();

        let mut attributes = BTreeMap::new();
        for (key, ty, components) in schema.buffers() {
            let location = program.and_then(|p| device.attrib_location(p, key));
            attributes.insert(key.to_string(), AttributeRef { ty, components, location });
        }

        let mut uniforms = BTreeMap::new();
        let uniform_keys = schema.uniforms().map(|(k, ty, _)| (k, ty)).chain(schema.textures());
        for (key, ty) in uniform_keys {
            let location = program.and_then(|p| device.uniform_location(p, key));
            uniforms.insert(key.to_string(), UniformRef { ty, location });
        }

        if program.is_some() {
            engine_debug!("beam::ShaderLinker", "Linked program with {} attributes and {} uniforms",
                attributes.len(), uniforms.len());
        }

        Self { program, schema, attributes, uniforms }
    }

    /// Whether compilation and linking succeeded
    pub fn is_linked(&self) -> bool {
        self.program.is_some()
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Attribute map, one entry per schema buffer
    pub fn attributes(&self) -> &BTreeMap<String, AttributeRef> {
        &self.attributes
    }

    /// Uniform map, one entry per schema uniform and texture
    pub fn uniforms(&self) -> &BTreeMap<String, UniformRef> {
        &self.uniforms
    }
}

fn compile(device: &mut dyn GraphicsDevice, stage: ShaderStage, source: &str) -> Option<ShaderHandle> {
    match device.compile_shader(stage, source) {
        Ok(shader) => Some(shader),
        Err(err) => {
            engine_error!("beam::ShaderLinker", "{}", err);
            None
        }
    }
}

fn link(device: &mut dyn GraphicsDevice, template: &ShaderTemplate) -> Option<ProgramHandle> {
    let vs_source = inject_defines(&template.vs, &template.defines);
    let fs_source = inject_defines(&template.fs, &template.defines);

    let vertex = compile(device, ShaderStage::Vertex, &vs_source);
    let fragment = compile(device, ShaderStage::Fragment, &fs_source);

    let (vertex, fragment) = match (vertex, fragment) {
        (Some(v), Some(f)) => (v, f),
        (v, f) => {
            for shader in v.into_iter().chain(f) {
                device.delete_shader(shader);
            }
            return None;
        }
    };

    let program = match device.link_program(vertex, fragment) {
        Ok(program) => Some(program),
        Err(err) => {
            engine_error!("beam::ShaderLinker", "{}", err);
            None
        }
    };

    // Stage objects are released whether or not linking succeeded
    device.delete_shader(vertex);
    device.delete_shader(fragment);
    program
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
