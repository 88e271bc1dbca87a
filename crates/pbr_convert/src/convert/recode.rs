//! Texture channel recoding
//!
//! Produces a new texture from an existing one by rewriting every pixel with
//! a per-pixel function. The whole source image is decoded before the first
//! output pixel is written, and the source texture is never modified.

use thiserror::Error;

use crate::scene::{PixelBuffer, Texture, TextureError, TextureImage};

/// Four RGBA8 channels of one pixel
pub type Pixel = [u8; 4];

/// Channel index holding glossiness in a specular-glossiness texture
pub const ALPHA: usize = 3;

/// Channel index read as roughness from a metallic-roughness texture
pub const ROUGHNESS: usize = 1;

/// Channel index read as metalness from a metallic-roughness texture
pub const METALNESS: usize = 2;

/// Recoding errors
#[derive(Error, Debug)]
pub enum RecodeError {
    /// Output buffer does not match the source size
    #[error("Output buffer is {actual:?} but source image is {expected:?}")]
    DimensionMismatch {
        /// Source `(width, height)`
        expected: (u32, u32),
        /// Output `(width, height)`
        actual: (u32, u32),
    },

    /// Source could not be decoded or output could not be encoded
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Rewrite `target` pixel by pixel from `source`
///
/// Each target pixel starts as a copy of its source pixel, then `rewrite`
/// receives the source channels and the target channels to overwrite.
/// Pixels are visited in row-major order; `rewrite` is `Fn` so it cannot
/// carry state from one pixel to the next.
pub fn rewrite_pixels<F>(source: &PixelBuffer, target: &mut PixelBuffer, rewrite: F) -> Result<(), RecodeError>
where
    F: Fn(&Pixel, &mut Pixel),
{
    if source.dimensions() != target.dimensions() {
        return Err(RecodeError::DimensionMismatch {
            expected: source.dimensions(),
            actual: target.dimensions(),
        });
    }

    let (width, height) = source.dimensions();
    for y in 0..height {
        for x in 0..width {
            let src = source.pixel(x, y);
            let dst = target.pixel_mut(x, y);
            *dst = src;
            rewrite(&src, dst);
        }
    }
    Ok(())
}

/// Build a new texture by recoding `source`
///
/// # Arguments
/// * `source` - Texture to read; left untouched
/// * `name` - Name for the new texture
/// * `encode_png` - Store the result as PNG bytes instead of raw pixels
/// * `rewrite` - Per-pixel channel rewrite
pub fn recode_texture<F>(
    source: &Texture,
    name: Option<String>,
    encode_png: bool,
    rewrite: F,
) -> Result<Texture, RecodeError>
where
    F: Fn(&Pixel, &mut Pixel),
{
    let pixels = source.image.decode()?;
    let (width, height) = pixels.dimensions();

    let mut output = PixelBuffer::new(width, height);
    rewrite_pixels(&pixels, &mut output, rewrite)?;

    let (image, mime_type) = if encode_png {
        (TextureImage::Encoded(output.encode_png()?), "image/png".to_string())
    } else {
        (TextureImage::Pixels(output), source.mime_type.clone())
    };

    log::trace!(
        "Recoded {}x{} texture '{}' into '{}'",
        width,
        height,
        source.name.as_deref().unwrap_or("unnamed"),
        name.as_deref().unwrap_or("unnamed")
    );

    Ok(Texture {
        name,
        uri: None,
        mime_type,
        image,
    })
}

/// Keep RGB, force alpha opaque
///
/// Turns a specular-glossiness texture into a specular texture.
pub fn strip_glossiness(_source: &Pixel, target: &mut Pixel) {
    target[ALPHA] = 255;
}

/// Roughness byte for a glossiness byte scaled by the glossiness factor
///
/// `255 - round(alpha * glossiness)`, clamped to the byte range.
pub fn roughness_from_glossiness(alpha: u8, glossiness_factor: f32) -> u8 {
    let gloss = (f32::from(alpha) * glossiness_factor).round();
    (255.0 - gloss).clamp(0.0, 255.0) as u8
}

/// Rewrite producing a metallic-roughness pixel from a specular-glossiness pixel
///
/// Occlusion (R) and metalness (B) are zeroed, roughness (G) is the inverted
/// scaled glossiness and alpha is opaque.
pub fn glossiness_to_roughness(glossiness_factor: f32) -> impl Fn(&Pixel, &mut Pixel) {
    move |source, target| {
        target[0] = 0;
        target[ROUGHNESS] = roughness_from_glossiness(source[ALPHA], glossiness_factor);
        target[METALNESS] = 0;
        target[ALPHA] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic non-uniform test image
    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut pixels = PixelBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = (x * 37 + y * 91) as u8;
                *pixels.pixel_mut(x, y) = [v, v.wrapping_add(50), v.wrapping_mul(3), v.wrapping_add(7)];
            }
        }
        pixels
    }

    #[test]
    fn test_rewrite_preserves_dimensions_and_copies() {
        let source = gradient(5, 3);
        let mut target = PixelBuffer::new(5, 3);

        rewrite_pixels(&source, &mut target, |_, _| {}).unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn test_rewrite_rejects_size_mismatch() {
        let source = gradient(4, 4);
        let mut target = PixelBuffer::new(4, 2);

        let result = rewrite_pixels(&source, &mut target, strip_glossiness);
        assert!(matches!(
            result,
            Err(RecodeError::DimensionMismatch { expected: (4, 4), actual: (4, 2) })
        ));
    }

    #[test]
    fn test_strip_glossiness_keeps_rgb() {
        let source = gradient(6, 4);
        let mut target = PixelBuffer::new(6, 4);
        rewrite_pixels(&source, &mut target, strip_glossiness).unwrap();

        for y in 0..4 {
            for x in 0..6 {
                let src = source.pixel(x, y);
                let dst = target.pixel(x, y);
                assert_eq!(&dst[..3], &src[..3]);
                assert_eq!(dst[ALPHA], 255);
            }
        }
    }

    #[test]
    fn test_glossiness_to_roughness_channels() {
        let source = gradient(6, 4);
        let mut target = PixelBuffer::new(6, 4);
        rewrite_pixels(&source, &mut target, glossiness_to_roughness(0.8)).unwrap();

        for y in 0..4 {
            for x in 0..6 {
                let alpha = source.get(x, y, ALPHA);
                let expected = 255 - (f32::from(alpha) * 0.8).round() as u8;
                assert_eq!(target.pixel(x, y), [0, expected, 0, 255]);
            }
        }
    }

    #[test]
    fn test_roughness_from_glossiness_values() {
        assert_eq!(roughness_from_glossiness(255, 1.0), 0);
        assert_eq!(roughness_from_glossiness(0, 1.0), 255);
        assert_eq!(roughness_from_glossiness(200, 0.5), 155);
        // 255 * 0.5 = 127.5 rounds up
        assert_eq!(roughness_from_glossiness(255, 0.5), 127);
        assert_eq!(roughness_from_glossiness(255, 0.0), 255);
        // Out-of-range factors clamp instead of wrapping
        assert_eq!(roughness_from_glossiness(255, 2.0), 0);
    }

    #[test]
    fn test_recode_texture_leaves_source_untouched() {
        let source = Texture::from_pixels(gradient(3, 3)).with_name("sg");
        let before = source.clone();

        let specular = recode_texture(&source, Some("sg_specular".into()), false, strip_glossiness).unwrap();
        assert_eq!(source, before);
        assert_eq!(specular.name.as_deref(), Some("sg_specular"));
        assert_eq!(specular.uri, None);

        let TextureImage::Pixels(pixels) = &specular.image else {
            panic!("Expected raw pixels");
        };
        assert_eq!(pixels.dimensions(), (3, 3));
        assert_eq!(pixels.get(2, 2, ALPHA), 255);
    }

    #[test]
    fn test_recode_encoded_source_to_png() {
        let pixels = PixelBuffer::solid(2, 2, [10, 20, 30, 128]);
        let source = Texture::from_encoded(pixels.encode_png().unwrap(), "image/png");

        let texture = recode_texture(&source, None, true, glossiness_to_roughness(1.0)).unwrap();
        assert_eq!(texture.mime_type, "image/png");

        let decoded = texture.image.decode().unwrap();
        assert_eq!(decoded.pixel(1, 1), [0, 127, 0, 255]);
    }

    #[test]
    fn test_recode_fails_on_undecodable_source() {
        let source = Texture::from_encoded(vec![1, 2, 3], "image/png");
        let result = recode_texture(&source, None, false, strip_glossiness);
        assert!(matches!(result, Err(RecodeError::Texture(TextureError::Decode(_)))));
    }
}
