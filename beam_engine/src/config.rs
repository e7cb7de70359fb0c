/// Engine configuration
///
/// `BeamConfig` is handed to `Beam::new`. Context attributes are passed
/// through unvalidated to the host's `ContextProvider`; extensions are
/// requested from the acquired device one by one.

/// Extension enabling 32-bit element indices
pub const EXT_ELEMENT_INDEX_UINT: &str = "OES_element_index_uint";

/// Extension enabling depth textures (offscreen targets with `depth: true`)
pub const EXT_DEPTH_TEXTURE: &str = "WEBGL_depth_texture";

/// Extension enabling sRGB texture formats
pub const EXT_SRGB: &str = "EXT_sRGB";

/// Context creation attributes (WebGL semantics and defaults)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAttributes {
    /// Drawing buffer has an alpha channel
    pub alpha: bool,
    /// Drawing buffer has a depth buffer of at least 16 bits
    pub depth: bool,
    /// Drawing buffer has a stencil buffer of at least 8 bits
    pub stencil: bool,
    /// Multisample the default framebuffer
    pub antialias: bool,
    /// Colors in the drawing buffer are premultiplied by alpha
    pub premultiplied_alpha: bool,
    /// Keep drawing buffer contents after presentation
    pub preserve_drawing_buffer: bool,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
        }
    }
}

/// Beam engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeamConfig {
    /// Attributes for context acquisition
    pub context_attributes: ContextAttributes,
    /// Extensions requested at construction, in order
    pub extensions: Vec<String>,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            context_attributes: ContextAttributes::default(),
            extensions: vec![
                EXT_ELEMENT_INDEX_UINT.to_string(),
                EXT_DEPTH_TEXTURE.to_string(),
            ],
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
