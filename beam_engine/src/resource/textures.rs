/// Textures resource - one GPU texture per named slot
///
/// Each slot keeps the accumulated `TextureState`; `set` merges a partial
/// state onto it and re-uploads only what the partial supplies (new image
/// data, new parameters). A slot can instead sample an offscreen target's
/// texture, which it borrows and never deletes.
///
/// Upload rules:
/// - 2D: unit 0, bind, unpack flip, `tex_image_2d` in the slot's color
///   space, mipmaps when both dimensions are powers of two, otherwise
///   ClampToEdge wrapping and Linear minification unless supplied.
/// - Cube: parameters first, then `6 x (level + 1)` images in face-major
///   order (+X, -X, +Y, -Y, +Z, -Z).
/// - Parameters are only sent when supplied.

use std::fmt;
use std::sync::{Arc, Weak};
use rustc_hash::FxHashMap;
use crate::config::EXT_SRGB;
use crate::error::Result;
use crate::graphics_device::{
    lock_device, CubeFace, FilterMode, GraphicsDevice, PixelFormat, PixelType, SharedDevice,
    TexImage2d, TexImageTarget, TextureHandle, TextureParameter, TextureTarget, WrapMode,
};
use crate::resource::OffscreenTargetResource;
use crate::{engine_bail, engine_trace, engine_warn};

// ============================================================================
// Texture state
// ============================================================================

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Tex2D,
    Cube,
}

impl TextureKind {
    pub fn target(self) -> TextureTarget {
        match self {
            TextureKind::Tex2D => TextureTarget::Texture2D,
            TextureKind::Cube => TextureTarget::CubeMap,
        }
    }
}

/// Color space of uploaded pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Rgb,
    Rgba,
    /// sRGB, falls back to RGBA without the `EXT_sRGB` extension
    Srgb,
    /// sRGB with alpha, falls back to RGBA without the `EXT_sRGB` extension
    SrgbAlpha,
}

impl ColorSpace {
    /// Device format for this space
    pub fn pixel_format(self, srgb_supported: bool) -> PixelFormat {
        match self {
            ColorSpace::Rgb => PixelFormat::Rgb,
            ColorSpace::Rgba => PixelFormat::Rgba,
            ColorSpace::Srgb if srgb_supported => PixelFormat::Srgb,
            ColorSpace::SrgbAlpha if srgb_supported => PixelFormat::SrgbAlpha,
            ColorSpace::Srgb | ColorSpace::SrgbAlpha => PixelFormat::Rgba,
        }
    }
}

/// Tightly packed 8-bit image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Whether mipmaps can be generated (both dimensions powers of two)
    pub fn supports_mipmap(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    fn required_len(&self, format: PixelFormat) -> usize {
        let channels = match format {
            PixelFormat::Rgb | PixelFormat::Srgb => 3,
            _ => 4,
        };
        self.width as usize * self.height as usize * channels
    }
}

/// Partial or accumulated state of one texture slot
///
/// Every field is optional: a partial state given to `set` only changes
/// the fields it supplies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureState {
    /// Explicit kind; otherwise cube when `images` is present, else 2D
    pub kind: Option<TextureKind>,
    /// 2D image
    pub image: Option<ImageData>,
    /// Cube images, face-major, `level + 1` per face
    pub images: Option<Vec<ImageData>>,
    /// Highest cube mip level supplied (defaults to 0)
    pub level: Option<u32>,
    /// Flip rows vertically on upload
    pub flip: Option<bool>,
    /// Pixel color space (defaults to RGBA)
    pub space: Option<ColorSpace>,
    pub wrap_s: Option<WrapMode>,
    pub wrap_t: Option<WrapMode>,
    pub min_filter: Option<FilterMode>,
    pub mag_filter: Option<FilterMode>,
}

impl TextureState {
    /// 2D state from one image
    pub fn from_image(image: ImageData) -> Self {
        Self {
            image: Some(image),
            ..Default::default()
        }
    }

    /// Cube state from face-major images
    pub fn from_images(images: Vec<ImageData>) -> Self {
        Self {
            images: Some(images),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: TextureKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip = Some(flip);
        self
    }

    pub fn with_space(mut self, space: ColorSpace) -> Self {
        self.space = Some(space);
        self
    }

    pub fn with_wrap(mut self, wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        self.wrap_s = Some(wrap_s);
        self.wrap_t = Some(wrap_t);
        self
    }

    pub fn with_filters(mut self, min_filter: FilterMode, mag_filter: FilterMode) -> Self {
        self.min_filter = Some(min_filter);
        self.mag_filter = Some(mag_filter);
        self
    }

    /// Overwrite the fields `partial` supplies
    pub fn merge(&mut self, partial: &TextureState) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }
        take(&mut self.kind, &partial.kind);
        take(&mut self.image, &partial.image);
        take(&mut self.images, &partial.images);
        take(&mut self.level, &partial.level);
        take(&mut self.flip, &partial.flip);
        take(&mut self.space, &partial.space);
        take(&mut self.wrap_s, &partial.wrap_s);
        take(&mut self.wrap_t, &partial.wrap_t);
        take(&mut self.min_filter, &partial.min_filter);
        take(&mut self.mag_filter, &partial.mag_filter);
    }

    /// Kind this state describes
    pub fn resolved_kind(&self) -> TextureKind {
        match self.kind {
            Some(kind) => kind,
            None if self.images.is_some() => TextureKind::Cube,
            None => TextureKind::Tex2D,
        }
    }
}

/// Source given to `TexturesResource::set`
pub enum TextureSource<'a> {
    /// Partial state merged onto the slot
    Raw(TextureState),
    /// Sample an offscreen target (depth texture when it has one, else color)
    RenderTarget(&'a OffscreenTargetResource),
}

impl From<TextureState> for TextureSource<'_> {
    fn from(state: TextureState) -> Self {
        TextureSource::Raw(state)
    }
}

impl<'a> From<&'a OffscreenTargetResource> for TextureSource<'a> {
    fn from(target: &'a OffscreenTargetResource) -> Self {
        TextureSource::RenderTarget(target)
    }
}

/// State of a Textures resource
pub type TexturesState = FxHashMap<String, TextureState>;

// ============================================================================
// Textures resource
// ============================================================================

#[derive(Debug)]
struct TextureSlot {
    kind: TextureKind,
    /// Texture allocated by this resource
    owned: Option<TextureHandle>,
    /// Offscreen target texture sampled instead of `owned`
    borrowed: Option<BorrowedTexture>,
    state: TextureState,
}

/// Texture of an offscreen target, valid while the target is not destroyed
#[derive(Debug)]
struct BorrowedTexture {
    texture: TextureHandle,
    lease: Weak<()>,
}

impl BorrowedTexture {
    fn live(&self) -> Option<TextureHandle> {
        (self.lease.strong_count() > 0).then_some(self.texture)
    }
}

impl TextureSlot {
    fn sampled(&self) -> Option<TextureHandle> {
        self.borrowed.as_ref().and_then(BorrowedTexture::live).or(self.owned)
    }
}

/// Named texture slots
pub struct TexturesResource {
    device: SharedDevice,
    slots: FxHashMap<String, TextureSlot>,
}

impl TexturesResource {
    /// Allocate and upload one texture per key of `state`
    pub fn new(device: SharedDevice, state: TexturesState) -> Result<Self> {
        let mut resource = Self {
            device,
            slots: FxHashMap::default(),
        };
        for (key, slot_state) in state {
            if let Err(err) = resource.allocate(key, slot_state) {
                resource.destroy_all()?;
                return Err(err);
            }
        }
        Ok(resource)
    }

    /// Merge a source onto a slot, allocating the slot on first use
    pub fn set<'a>(&mut self, key: &str, source: impl Into<TextureSource<'a>>) -> Result<&mut Self> {
        match source.into() {
            TextureSource::RenderTarget(target) => {
                let Some(texture) = target.sampled_texture() else {
                    engine_bail!("beam::Textures", InvalidResource,
                        "slot '{}' given a destroyed offscreen target", key);
                };
                let slot = self.slots.entry(key.to_string()).or_insert_with(|| TextureSlot {
                    kind: TextureKind::Tex2D,
                    owned: None,
                    borrowed: None,
                    state: TextureState::default(),
                });
                if slot.owned.is_some() && slot.kind != TextureKind::Tex2D {
                    engine_bail!("beam::Textures", InvalidResource,
                        "slot '{}' is a cube map and cannot sample a render target", key);
                }
                slot.borrowed = Some(BorrowedTexture { texture, lease: target.lease() });
                engine_trace!("beam::Textures", "Slot '{}' samples an offscreen target", key);
            }
            TextureSource::Raw(partial) => {
                let Some(slot) = self.slots.get_mut(key) else {
                    self.allocate(key.to_string(), partial)?;
                    return Ok(self);
                };

                let mut merged = slot.state.clone();
                merged.merge(&partial);
                let kind = merged.resolved_kind();

                let mut gpu = lock_device(&self.device)?;
                match slot.owned {
                    Some(texture) => {
                        if kind != slot.kind {
                            engine_bail!("beam::Textures", InvalidResource,
                                "slot '{}' cannot change from {:?} to {:?}", key, slot.kind, kind);
                        }
                        upload(&mut *gpu, texture, kind, &merged, &partial);
                    }
                    None => {
                        let texture = gpu.create_texture()?;
                        upload(&mut *gpu, texture, kind, &merged, &merged);
                        slot.owned = Some(texture);
                        slot.kind = kind;
                    }
                }
                slot.borrowed = None;
                slot.state = merged;
            }
        }
        Ok(self)
    }

    /// Delete the slot's own texture and forget the slot
    ///
    /// A borrowed offscreen target texture is left alive.
    pub fn destroy(&mut self, key: &str) -> Result<()> {
        let Some(slot) = self.slots.get(key) else {
            engine_bail!("beam::Textures", InvalidResource, "unknown texture '{}'", key);
        };
        if let Some(texture) = slot.owned {
            lock_device(&self.device)?.delete_texture(texture);
        }
        self.slots.remove(key);
        Ok(())
    }

    /// Delete every owned texture
    pub fn destroy_all(&mut self) -> Result<()> {
        let mut gpu = lock_device(&self.device)?;
        for (_, slot) in self.slots.drain() {
            if let Some(texture) = slot.owned {
                gpu.delete_texture(texture);
            }
        }
        Ok(())
    }

    /// Texture sampled by a slot
    pub fn texture(&self, key: &str) -> Option<TextureHandle> {
        self.slots.get(key).and_then(TextureSlot::sampled)
    }

    /// Accumulated state of a slot
    pub fn state(&self, key: &str) -> Option<&TextureState> {
        self.slots.get(key).map(|slot| &slot.state)
    }

    /// Kind of a slot
    pub fn kind(&self, key: &str) -> Option<TextureKind> {
        self.slots.get(key).map(|slot| slot.kind)
    }

    pub(crate) fn live_textures(&self) -> impl Iterator<Item = (&str, TextureHandle)> {
        self.slots
            .iter()
            .filter_map(|(key, slot)| slot.sampled().map(|t| (key.as_str(), t)))
    }

    fn allocate(&mut self, key: String, state: TextureState) -> Result<()> {
        let kind = state.resolved_kind();
        let texture = {
            let mut gpu = lock_device(&self.device)?;
            let texture = gpu.create_texture()?;
            upload(&mut *gpu, texture, kind, &state, &state);
            texture
        };
        engine_trace!("beam::Textures", "Allocated {:?} texture '{}'", kind, key);
        self.slots.insert(key, TextureSlot {
            kind,
            owned: Some(texture),
            borrowed: None,
            state,
        });
        Ok(())
    }
}

impl fmt::Debug for TexturesResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TexturesResource")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Upload `changes` to `texture`, reading flip/space/level from `merged`
fn upload(
    device: &mut dyn GraphicsDevice,
    texture: TextureHandle,
    kind: TextureKind,
    merged: &TextureState,
    changes: &TextureState,
) {
    let format = merged
        .space
        .unwrap_or(ColorSpace::Rgba)
        .pixel_format(device.extension_enabled(EXT_SRGB));
    let flip = merged.flip.unwrap_or(false);

    device.active_texture(0);
    device.bind_texture(kind.target(), Some(texture));

    match kind {
        TextureKind::Tex2D => upload_2d(device, format, flip, changes),
        TextureKind::Cube => upload_cube(device, format, flip, merged.level.unwrap_or(0), changes),
    }
}

fn upload_2d(device: &mut dyn GraphicsDevice, format: PixelFormat, flip: bool, changes: &TextureState) {
    let target = TextureTarget::Texture2D;
    let mut wrap_s = changes.wrap_s;
    let mut wrap_t = changes.wrap_t;
    let mut min_filter = changes.min_filter;

    if let Some(image) = &changes.image {
        if upload_image(device, TexImageTarget::Texture2D, 0, format, flip, image) {
            if image.supports_mipmap() {
                device.generate_mipmap(target);
            } else {
                // Non power-of-two images cannot repeat or sample mipmaps
                wrap_s.get_or_insert(WrapMode::ClampToEdge);
                wrap_t.get_or_insert(WrapMode::ClampToEdge);
                min_filter.get_or_insert(FilterMode::Linear);
            }
        }
    }

    apply_parameters(device, target, wrap_s, wrap_t, min_filter, changes.mag_filter);
}

fn upload_cube(
    device: &mut dyn GraphicsDevice,
    format: PixelFormat,
    flip: bool,
    level: u32,
    changes: &TextureState,
) {
    apply_parameters(
        device,
        TextureTarget::CubeMap,
        changes.wrap_s,
        changes.wrap_t,
        changes.min_filter,
        changes.mag_filter,
    );

    let Some(images) = &changes.images else {
        return;
    };

    let expected = 6 * (level as usize + 1);
    if images.len() < expected {
        engine_warn!("beam::Textures", "Cube texture expects {} images, got {}", expected, images.len());
    }

    let mut index = 0;
    for face in CubeFace::ALL {
        for mip in 0..=level {
            match images.get(index) {
                Some(image) => {
                    upload_image(device, TexImageTarget::CubeFace(face), mip, format, flip, image);
                }
                None => engine_warn!("beam::Textures", "Missing cube image {:?} level {}", face, mip),
            }
            index += 1;
        }
    }
}

/// Returns whether the image was uploaded
fn upload_image(
    device: &mut dyn GraphicsDevice,
    target: TexImageTarget,
    level: u32,
    format: PixelFormat,
    flip: bool,
    image: &ImageData,
) -> bool {
    let required = image.required_len(format);
    if image.pixels.len() < required {
        engine_warn!("beam::Textures", "Image {}x{} has {} bytes, {} required; upload skipped",
            image.width, image.height, image.pixels.len(), required);
        return false;
    }

    device.set_unpack_flip_y(flip);
    device.tex_image_2d(&TexImage2d {
        target,
        level,
        format,
        width: image.width,
        height: image.height,
        pixel_type: PixelType::UnsignedByte,
        pixels: Some(&image.pixels[..]),
    });
    true
}

fn apply_parameters(
    device: &mut dyn GraphicsDevice,
    target: TextureTarget,
    wrap_s: Option<WrapMode>,
    wrap_t: Option<WrapMode>,
    min_filter: Option<FilterMode>,
    mag_filter: Option<FilterMode>,
) {
    if let Some(mode) = wrap_s {
        device.tex_parameter(target, TextureParameter::WrapS(mode));
    }
    if let Some(mode) = wrap_t {
        device.tex_parameter(target, TextureParameter::WrapT(mode));
    }
    if let Some(filter) = min_filter {
        device.tex_parameter(target, TextureParameter::MinFilter(filter));
    }
    if let Some(filter) = mag_filter {
        device.tex_parameter(target, TextureParameter::MagFilter(filter));
    }
}

#[cfg(test)]
#[path = "textures_tests.rs"]
mod tests;
