/// Schema - static description of the inputs of one shader program
///
/// A schema names every vertex buffer, uniform and texture the program
/// reads, with its value type, plus the primitive mode of its draws. Each
/// key belongs to exactly one category: entries live in a single sorted
/// map, which also makes texture-unit assignment deterministic.

use std::collections::BTreeMap;
use crate::error::{Error, Result};
use crate::resource::UniformValue;

// ============================================================================
// Schema types
// ============================================================================

/// Value type of a schema entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Vec4,
    Vec3,
    Vec2,
    Int,
    Float,
    Mat4,
    Mat3,
    Mat2,
    Tex2D,
    TexCube,
}

impl SchemaType {
    /// Whether the type is a texture sampler
    pub fn is_sampler(self) -> bool {
        matches!(self, SchemaType::Tex2D | SchemaType::TexCube)
    }

    /// Whether the type is a square matrix
    pub fn is_matrix(self) -> bool {
        matches!(self, SchemaType::Mat2 | SchemaType::Mat3 | SchemaType::Mat4)
    }

    /// Number of scalar components of one value of this type
    ///
    /// Samplers count as one integer (the texture unit).
    pub fn component_count(self) -> u32 {
        match self {
            SchemaType::Vec4 => 4,
            SchemaType::Vec3 => 3,
            SchemaType::Vec2 => 2,
            SchemaType::Int | SchemaType::Float => 1,
            SchemaType::Mat4 => 16,
            SchemaType::Mat3 => 9,
            SchemaType::Mat2 => 4,
            SchemaType::Tex2D | SchemaType::TexCube => 1,
        }
    }
}

/// Primitive mode used by every draw of a shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    #[default]
    Triangles,
    Lines,
}

/// One declared schema key
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntry {
    /// Per-vertex attribute fed from a VertexBuffers resource
    Buffer {
        ty: SchemaType,
        /// Overrides the type's component count for the attribute pointer
        components: Option<u32>,
    },
    /// Uniform fed from a Uniforms resource
    Uniform {
        ty: SchemaType,
        /// Uploaded when no Uniforms resource supplies the key
        default: Option<UniformValue>,
    },
    /// Sampler fed from a Textures resource
    Texture {
        ty: SchemaType,
    },
}

impl SchemaEntry {
    pub fn ty(&self) -> SchemaType {
        match self {
            SchemaEntry::Buffer { ty, .. }
            | SchemaEntry::Uniform { ty, .. }
            | SchemaEntry::Texture { ty } => *ty,
        }
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Immutable schema of one shader program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    entries: BTreeMap<String, SchemaEntry>,
    mode: DrawMode,
}

impl Schema {
    /// Start declaring a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.get(key)
    }

    /// Every entry, sorted by key
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SchemaEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Vertex buffer keys with their type and effective component count
    pub fn buffers(&self) -> impl Iterator<Item = (&str, SchemaType, u32)> {
        self.entries.iter().filter_map(|(key, entry)| match entry {
            SchemaEntry::Buffer { ty, components } => {
                Some((key.as_str(), *ty, components.unwrap_or_else(|| ty.component_count())))
            }
            _ => None,
        })
    }

    /// Uniform keys with their type and default value
    pub fn uniforms(&self) -> impl Iterator<Item = (&str, SchemaType, Option<&UniformValue>)> {
        self.entries.iter().filter_map(|(key, entry)| match entry {
            SchemaEntry::Uniform { ty, default } => Some((key.as_str(), *ty, default.as_ref())),
            _ => None,
        })
    }

    /// Texture keys with their sampler type
    pub fn textures(&self) -> impl Iterator<Item = (&str, SchemaType)> {
        self.entries.iter().filter_map(|(key, entry)| match entry {
            SchemaEntry::Texture { ty } => Some((key.as_str(), *ty)),
            _ => None,
        })
    }

    /// Default value of a uniform key
    pub fn uniform_default(&self, key: &str) -> Option<&UniformValue> {
        match self.entries.get(key) {
            Some(SchemaEntry::Uniform { default, .. }) => default.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// SchemaBuilder
// ============================================================================

/// Builder validating schema declarations
///
/// The first rejected declaration is kept and returned by [`SchemaBuilder::build`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entries: BTreeMap<String, SchemaEntry>,
    mode: DrawMode,
    error: Option<Error>,
}

impl SchemaBuilder {
    /// Declare a vertex buffer
    pub fn buffer(self, key: impl Into<String>, ty: SchemaType) -> Self {
        self.declare(key.into(), SchemaEntry::Buffer { ty, components: None })
    }

    /// Declare a vertex buffer with an explicit component count (1 to 4)
    pub fn buffer_with_components(self, key: impl Into<String>, ty: SchemaType, components: u32) -> Self {
        self.declare(key.into(), SchemaEntry::Buffer { ty, components: Some(components) })
    }

    /// Declare a uniform without default
    pub fn uniform(self, key: impl Into<String>, ty: SchemaType) -> Self {
        self.declare(key.into(), SchemaEntry::Uniform { ty, default: None })
    }

    /// Declare a uniform with a default value
    pub fn uniform_with_default(
        self,
        key: impl Into<String>,
        ty: SchemaType,
        default: impl Into<UniformValue>,
    ) -> Self {
        self.declare(key.into(), SchemaEntry::Uniform { ty, default: Some(default.into()) })
    }

    /// Declare a texture sampler
    ///
    /// Textures have no default: a sampler always reads the Textures resource.
    pub fn texture(self, key: impl Into<String>, ty: SchemaType) -> Self {
        self.declare(key.into(), SchemaEntry::Texture { ty })
    }

    /// Primitive mode (Triangles when unset)
    pub fn mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    /// Finish the schema, failing with the first rejected declaration
    pub fn build(self) -> Result<Schema> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Schema {
                entries: self.entries,
                mode: self.mode,
            }),
        }
    }

    fn declare(mut self, key: String, entry: SchemaEntry) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(err) = Self::validate(&self.entries, &key, &entry) {
            self.error = Some(err);
            return self;
        }
        self.entries.insert(key, entry);
        self
    }

    fn validate(entries: &BTreeMap<String, SchemaEntry>, key: &str, entry: &SchemaEntry) -> Result<()> {
        if entries.contains_key(key) {
            crate::engine_bail!("beam::Schema", InvalidSchema, "key '{}' declared twice", key);
        }

        match entry {
            SchemaEntry::Buffer { ty, components } => {
                if ty.is_sampler() || ty.is_matrix() {
                    crate::engine_bail!("beam::Schema", InvalidSchema,
                        "buffer '{}' cannot have type {:?}", key, ty);
                }
                if let Some(n) = components {
                    if !(1..=4).contains(n) {
                        crate::engine_bail!("beam::Schema", InvalidSchema,
                            "buffer '{}' component count {} out of range 1..=4", key, n);
                    }
                }
            }
            SchemaEntry::Uniform { ty, .. } => {
                if ty.is_sampler() {
                    crate::engine_bail!("beam::Schema", InvalidSchema,
                        "uniform '{}' has sampler type {:?}, declare it as a texture", key, ty);
                }
            }
            SchemaEntry::Texture { ty } => {
                if !ty.is_sampler() {
                    crate::engine_bail!("beam::Schema", InvalidSchema,
                        "texture '{}' has non-sampler type {:?}", key, ty);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
