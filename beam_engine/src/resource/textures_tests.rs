/// Unit tests for TexturesResource and TextureState

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{CallLog, DeviceCall, MockDeviceConfig, MockGraphicsDevice};
use crate::graphics_device::{
    CubeFace, FilterMode, PixelFormat, TexImageTarget, TextureParameter, TextureTarget, WrapMode,
};
use crate::resource::offscreen_target::{OffscreenTargetResource, OffscreenTargetState};
use crate::resource::textures::*;

fn pot_image() -> ImageData {
    ImageData::new(2, 2, vec![255u8; 16])
}

fn npot_image() -> ImageData {
    ImageData::new(3, 2, vec![128u8; 24])
}

fn single(key: &str, state: TextureState) -> TexturesState {
    let mut textures = TexturesState::default();
    textures.insert(key.to_string(), state);
    textures
}

fn params(log: &CallLog) -> Vec<TextureParameter> {
    log.calls()
        .into_iter()
        .filter_map(|c| match c {
            DeviceCall::TexParameter(_, p) => Some(p),
            _ => None,
        })
        .collect()
}

// ============================================================================
// TextureState
// ============================================================================

#[test]
fn test_merge_keeps_other_fields() {
    let mut state = TextureState::from_image(pot_image())
        .with_space(ColorSpace::Rgb)
        .with_wrap(WrapMode::Repeat, WrapMode::Repeat);
    let before = state.clone();

    state.merge(&TextureState::default().with_flip(true));

    assert_eq!(state.flip, Some(true));
    assert_eq!(state.image, before.image);
    assert_eq!(state.space, before.space);
    assert_eq!(state.wrap_s, before.wrap_s);
    assert_eq!(state.wrap_t, before.wrap_t);
}

#[test]
fn test_resolved_kind() {
    assert_eq!(TextureState::default().resolved_kind(), TextureKind::Tex2D);
    assert_eq!(TextureState::from_images(vec![]).resolved_kind(), TextureKind::Cube);
    assert_eq!(
        TextureState::from_images(vec![]).with_kind(TextureKind::Tex2D).resolved_kind(),
        TextureKind::Tex2D
    );
}

#[test]
fn test_srgb_falls_back_to_rgba() {
    assert_eq!(ColorSpace::Srgb.pixel_format(false), PixelFormat::Rgba);
    assert_eq!(ColorSpace::SrgbAlpha.pixel_format(false), PixelFormat::Rgba);
    assert_eq!(ColorSpace::Srgb.pixel_format(true), PixelFormat::Srgb);
    assert_eq!(ColorSpace::Rgb.pixel_format(false), PixelFormat::Rgb);
}

// ============================================================================
// 2D uploads
// ============================================================================

#[test]
fn test_2d_pot_upload_generates_mipmaps() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let textures = TexturesResource::new(device, single("img", TextureState::from_image(pot_image()))).unwrap();
    let texture = textures.texture("img").unwrap();

    let calls = log.calls();
    assert_eq!(calls[0], DeviceCall::CreateTexture(texture));
    assert_eq!(calls[1], DeviceCall::ActiveTexture(0));
    assert_eq!(calls[2], DeviceCall::BindTexture(TextureTarget::Texture2D, Some(texture)));
    assert_eq!(calls[3], DeviceCall::SetUnpackFlipY(false));
    assert!(matches!(
        &calls[4],
        DeviceCall::TexImage2d { target: TexImageTarget::Texture2D, level: 0, format: PixelFormat::Rgba, width: 2, height: 2, .. }
    ));
    assert_eq!(calls[5], DeviceCall::GenerateMipmap(TextureTarget::Texture2D));
    assert!(params(&log).is_empty());
}

#[test]
fn test_2d_npot_upload_gets_default_params() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    TexturesResource::new(device, single("img", TextureState::from_image(npot_image()))).unwrap();

    assert_eq!(log.count(|c| matches!(c, DeviceCall::GenerateMipmap(_))), 0);
    assert_eq!(
        params(&log),
        vec![
            TextureParameter::WrapS(WrapMode::ClampToEdge),
            TextureParameter::WrapT(WrapMode::ClampToEdge),
            TextureParameter::MinFilter(FilterMode::Linear),
        ]
    );
}

#[test]
fn test_2d_npot_supplied_params_win() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let state = TextureState::from_image(npot_image()).with_filters(FilterMode::Nearest, FilterMode::Nearest);
    TexturesResource::new(device, single("img", state)).unwrap();

    assert_eq!(
        params(&log),
        vec![
            TextureParameter::WrapS(WrapMode::ClampToEdge),
            TextureParameter::WrapT(WrapMode::ClampToEdge),
            TextureParameter::MinFilter(FilterMode::Nearest),
            TextureParameter::MagFilter(FilterMode::Nearest),
        ]
    );
}

#[test]
fn test_short_pixel_buffer_skipped() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let broken = ImageData::new(4, 4, vec![0u8; 8]);
    TexturesResource::new(device, single("img", TextureState::from_image(broken))).unwrap();

    assert_eq!(log.count(|c| matches!(c, DeviceCall::TexImage2d { .. })), 0);
    assert_eq!(log.count(|c| matches!(c, DeviceCall::GenerateMipmap(_))), 0);
}

#[test]
fn test_srgb_uses_extension_when_enabled() {
    use crate::graphics_device::GraphicsDevice;

    let mut device = MockGraphicsDevice::new();
    device.enable_extension("EXT_sRGB");
    let (device, log) = device.into_shared();

    let state = TextureState::from_image(pot_image()).with_space(ColorSpace::SrgbAlpha);
    TexturesResource::new(device, single("img", state)).unwrap();

    assert_eq!(
        log.count(|c| matches!(c, DeviceCall::TexImage2d { format: PixelFormat::SrgbAlpha, .. })),
        1
    );
}

// ============================================================================
// set
// ============================================================================

#[test]
fn test_set_params_only_does_not_reupload() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let mut textures = TexturesResource::new(device, single("img", TextureState::from_image(pot_image()))).unwrap();
    log.clear();

    textures
        .set("img", TextureState::default().with_wrap(WrapMode::Repeat, WrapMode::MirroredRepeat))
        .unwrap();

    assert_eq!(log.count(|c| matches!(c, DeviceCall::TexImage2d { .. })), 0);
    assert_eq!(log.count(|c| matches!(c, DeviceCall::CreateTexture(_))), 0);
    assert_eq!(
        params(&log),
        vec![
            TextureParameter::WrapS(WrapMode::Repeat),
            TextureParameter::WrapT(WrapMode::MirroredRepeat),
        ]
    );
}

#[test]
fn test_set_flip_merges_and_applies_on_next_image() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let initial = TextureState::from_image(pot_image()).with_space(ColorSpace::Rgb);
    let mut textures = TexturesResource::new(device, single("img", initial)).unwrap();

    textures.set("img", TextureState::default().with_flip(true)).unwrap();
    let state = textures.state("img").unwrap();
    assert_eq!(state.flip, Some(true));
    assert_eq!(state.space, Some(ColorSpace::Rgb));
    assert_eq!(state.image, Some(pot_image()));

    log.clear();
    textures.set("img", TextureState::from_image(ImageData::new(2, 2, vec![0u8; 12]))).unwrap();

    let calls = log.calls();
    assert!(calls.contains(&DeviceCall::SetUnpackFlipY(true)));
    assert_eq!(
        log.count(|c| matches!(c, DeviceCall::TexImage2d { format: PixelFormat::Rgb, .. })),
        1
    );
}

#[test]
fn test_set_new_slot_allocates() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let mut textures = TexturesResource::new(device, TexturesState::default()).unwrap();

    textures.set("fresh", TextureState::from_image(pot_image())).unwrap();

    assert!(textures.texture("fresh").is_some());
    assert_eq!(log.count(|c| matches!(c, DeviceCall::CreateTexture(_))), 1);
}

#[test]
fn test_set_cannot_change_kind() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let mut textures = TexturesResource::new(device, single("img", TextureState::from_image(pot_image()))).unwrap();

    let result = textures.set("img", TextureState::default().with_kind(TextureKind::Cube));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// Cube uploads
// ============================================================================

#[test]
fn test_cube_upload_order() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let images: Vec<ImageData> = (0..12).map(|_| pot_image()).collect();
    let state = TextureState::from_images(images)
        .with_level(1)
        .with_filters(FilterMode::LinearMipmapLinear, FilterMode::Linear);
    let textures = TexturesResource::new(device, single("sky", state)).unwrap();

    assert_eq!(textures.kind("sky"), Some(TextureKind::Cube));

    let calls = log.calls();
    let first_param = calls.iter().position(|c| matches!(c, DeviceCall::TexParameter(..))).unwrap();
    let first_image = calls.iter().position(|c| matches!(c, DeviceCall::TexImage2d { .. })).unwrap();
    assert!(first_param < first_image);

    let uploads: Vec<(TexImageTarget, u32)> = calls
        .into_iter()
        .filter_map(|c| match c {
            DeviceCall::TexImage2d { target, level, .. } => Some((target, level)),
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), 12);
    assert_eq!(uploads[0], (TexImageTarget::CubeFace(CubeFace::PositiveX), 0));
    assert_eq!(uploads[1], (TexImageTarget::CubeFace(CubeFace::PositiveX), 1));
    assert_eq!(uploads[2], (TexImageTarget::CubeFace(CubeFace::NegativeX), 0));
    assert_eq!(uploads[11], (TexImageTarget::CubeFace(CubeFace::NegativeZ), 1));
}

#[test]
fn test_cube_missing_images_skipped() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let images: Vec<ImageData> = (0..4).map(|_| pot_image()).collect();
    TexturesResource::new(device, single("sky", TextureState::from_images(images))).unwrap();

    assert_eq!(log.count(|c| matches!(c, DeviceCall::TexImage2d { .. })), 4);
}

// ============================================================================
// Render target sources
// ============================================================================

#[test]
fn test_render_target_slot_borrows_texture() {
    let (device, log) = MockGraphicsDevice::new().into_shared();
    let target = OffscreenTargetResource::new(device.clone(), OffscreenTargetState { size: 64, depth: true }).unwrap();
    let mut textures = TexturesResource::new(device, TexturesState::default()).unwrap();
    log.clear();

    textures.set("shadowMap", &target).unwrap();
    assert_eq!(textures.texture("shadowMap"), target.depth_texture());
    assert!(log.is_empty());

    textures.destroy("shadowMap").unwrap();
    assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteTexture(_))), 0);
    assert_eq!(textures.texture("shadowMap"), None);
}

#[test]
fn test_raw_set_after_render_target_restores_own_texture() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let target = OffscreenTargetResource::new(device.clone(), OffscreenTargetState { size: 64, depth: false }).unwrap();
    let mut textures = TexturesResource::new(device, single("img", TextureState::from_image(pot_image()))).unwrap();
    let own = textures.texture("img");

    textures.set("img", &target).unwrap();
    assert_eq!(textures.texture("img"), target.color_texture());

    textures.set("img", TextureState::default().with_flip(true)).unwrap();
    assert_eq!(textures.texture("img"), own);
}

#[test]
fn test_destroyed_target_releases_slot_binding() {
    let (device, _log) = MockGraphicsDevice::new().into_shared();
    let mut target = OffscreenTargetResource::new(device.clone(), OffscreenTargetState { size: 64, depth: false }).unwrap();
    let mut textures = TexturesResource::new(device, single("img", TextureState::from_image(pot_image()))).unwrap();
    let own = textures.texture("img");
    textures.set("shadow", &target).unwrap();
    textures.set("img", &target).unwrap();
    assert_eq!(textures.texture("img"), target.color_texture());

    target.destroy().unwrap();

    assert_eq!(textures.texture("shadow"), None);
    assert_eq!(textures.texture("img"), own);
    assert!(matches!(textures.set("img", &target), Err(Error::InvalidResource(_))));
}

#[test]
fn test_failed_creation_releases_allocated_slots() {
    let config = MockDeviceConfig { max_objects: Some(1), ..Default::default() };
    let (device, log) = MockGraphicsDevice::with_config(config, CallLog::new()).into_shared();
    let mut state = single("albedo", TextureState::from_image(pot_image()));
    state.insert("normal".to_string(), TextureState::from_image(pot_image()));

    let result = TexturesResource::new(device, state);

    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert_eq!(log.count(|c| matches!(c, DeviceCall::CreateTexture(_))), 1);
    assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteTexture(_))), 1);
}

#[test]
fn test_destroy_unknown_slot() {
    let config = MockDeviceConfig::default();
    let (device, _log) = MockGraphicsDevice::with_config(config, CallLog::new()).into_shared();
    let mut textures = TexturesResource::new(device, TexturesState::default()).unwrap();

    assert!(matches!(textures.destroy("nope"), Err(Error::InvalidResource(_))));
}
