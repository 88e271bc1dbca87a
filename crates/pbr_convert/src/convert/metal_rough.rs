//! Specular/glossiness to metallic/roughness conversion
//!
//! Every material carrying a `KHR_materials_pbrSpecularGlossiness` record is
//! rewritten to the core metallic/roughness model plus `KHR_materials_ior`
//! and `KHR_materials_specular`:
//! - base_color = diffuse
//! - metallic = 0, roughness = 1, ior = 1000 (keeps the specular term exact
//!   instead of approximating it with metalness)
//! - specular = 1, specular_color = specular
//! - a combined specular-glossiness texture is split into a specular texture
//!   (RGB kept, alpha opaque) and a metallic-roughness texture (roughness
//!   from inverted glossiness); without it, roughness = 1 - glossiness
//!
//! Conversion runs in two passes. The plan pass reads the document and does
//! all fallible work (texture decoding and recoding); the apply pass only
//! writes. An error therefore leaves the document exactly as it was.

use thiserror::Error;

use super::recode::{self, RecodeError};
use crate::config::{ConfigError, ConverterConfig};
use crate::foundation::collections::{InsertionSet, MaterialKey, TextureKey};
use crate::scene::{
    Document, ExtensionKind, Ior, Material, PbrSpecularGlossiness, Specular, Texture,
    TextureBinding, TextureInfo, TextureSlot,
};

/// IOR written to every converted material
pub const PLACEHOLDER_IOR: f32 = 1000.0;

/// Metallic factor written to every converted material
pub const PLACEHOLDER_METALLIC: f32 = 0.0;

/// Roughness factor written before glossiness is folded in
pub const PLACEHOLDER_ROUGHNESS: f32 = 1.0;

/// Conversion errors
#[derive(Error, Debug)]
pub enum ConvertError {
    /// A spec/gloss record points at a texture that is not in the document
    #[error("Material {material:?} binds missing texture {texture:?} in slot {slot:?}")]
    MissingTexture {
        /// Material holding the dangling binding
        material: MaterialKey,
        /// Binding site
        slot: TextureSlot,
        /// Dangling key
        texture: TextureKey,
    },

    /// The specular-glossiness texture could not be recoded
    #[error("Failed to recode specular-glossiness texture of material {material:?}: {source}")]
    Recode {
        /// Material being converted
        material: MaterialKey,
        /// Underlying failure
        #[source]
        source: RecodeError,
    },

    /// Converter settings are unusable
    #[error("Invalid converter configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Summary of one conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// The document did not use the spec/gloss extension; nothing was done
    pub skipped: bool,
    /// Materials rewritten, in document order
    pub materials_converted: Vec<MaterialKey>,
    /// Textures generated from specular-glossiness textures
    pub textures_created: Vec<TextureKey>,
    /// Textures disposed because no material referenced them anymore
    pub textures_disposed: Vec<TextureKey>,
}

impl ConversionReport {
    /// Report for a document that had nothing to convert
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Recoded texture waiting to be added to the document
struct PendingTexture {
    texture: Texture,
    info: TextureInfo,
}

/// Everything needed to rewrite one material, computed without mutation
struct MaterialPlan {
    material: MaterialKey,
    base_color_factor: [f32; 4],
    roughness_factor: f32,
    base_color_texture: Option<TextureBinding>,
    specular: Specular,
    specular_texture: Option<PendingTexture>,
    metal_rough_texture: Option<PendingTexture>,
}

/// Converts specular/glossiness materials to metallic/roughness
#[derive(Debug, Clone, Default)]
pub struct MetalRoughConverter {
    config: ConverterConfig,
}

impl MetalRoughConverter {
    /// Create a converter with the given settings
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Converter settings
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert every spec/gloss material in `doc`
    ///
    /// Returns a skipped report when the document does not declare the
    /// spec/gloss extension, so running twice is the same as running once.
    pub fn convert(&self, doc: &mut Document) -> Result<ConversionReport, ConvertError> {
        self.config.validate()?;

        if !doc.extensions().is_used(ExtensionKind::PbrSpecularGlossiness) {
            log::warn!(
                "Document does not use {}, skipping metallic/roughness conversion",
                ExtensionKind::PbrSpecularGlossiness
            );
            return Ok(ConversionReport::skipped());
        }

        // Plan pass: reads only, may fail
        let mut cleanup = InsertionSet::new();
        let mut plans = Vec::new();
        for (key, material) in doc.materials() {
            let Some(spec_gloss) = material.extension::<PbrSpecularGlossiness>() else {
                continue;
            };

            cleanup.extend_present([
                spec_gloss.specular_glossiness_texture.map(|b| b.texture),
                material.base_color_texture.map(|b| b.texture),
                material.metallic_roughness_texture.map(|b| b.texture),
            ]);

            plans.push(self.plan_material(doc, key, material, spec_gloss)?);
        }

        // Apply pass: infallible from here on
        let mut report = ConversionReport::default();
        if plans.is_empty() {
            log::info!(
                "No material carries {}, removing the unused declaration",
                ExtensionKind::PbrSpecularGlossiness
            );
        } else {
            let specular_ext = doc.extensions_mut().create(ExtensionKind::Specular);
            let ior_ext = doc.extensions_mut().create(ExtensionKind::Ior);
            log::debug!("Declared {} and {}", specular_ext.kind(), ior_ext.kind());

            for plan in plans {
                Self::apply_plan(doc, plan, &mut report);
            }
        }
        doc.dispose_extension(ExtensionKind::PbrSpecularGlossiness);

        if self.config.dispose_orphans {
            for texture in cleanup {
                if doc.list_texture_parents(texture).len() == 1 {
                    doc.dispose_texture(texture);
                    report.textures_disposed.push(texture);
                }
            }
        }

        log::info!(
            "Converted {} material(s) to metallic/roughness: {} texture(s) created, {} disposed",
            report.materials_converted.len(),
            report.textures_created.len(),
            report.textures_disposed.len()
        );

        Ok(report)
    }

    fn plan_material(
        &self,
        doc: &Document,
        key: MaterialKey,
        material: &Material,
        spec_gloss: &PbrSpecularGlossiness,
    ) -> Result<MaterialPlan, ConvertError> {
        let mut plan = MaterialPlan {
            material: key,
            base_color_factor: spec_gloss.diffuse_factor,
            roughness_factor: PLACEHOLDER_ROUGHNESS,
            base_color_texture: material.base_color_texture,
            specular: Specular {
                specular_factor: 1.0,
                specular_color_factor: spec_gloss.specular_factor,
                specular_texture: None,
            },
            specular_texture: None,
            metal_rough_texture: None,
        };

        if let Some(diffuse) = spec_gloss.diffuse_texture {
            Self::require_texture(doc, key, TextureSlot::Diffuse, diffuse.texture)?;
            plan.base_color_texture = Some(diffuse);
        }

        match spec_gloss.specular_glossiness_texture {
            Some(binding) => {
                let source = Self::require_texture(doc, key, TextureSlot::SpecularGlossiness, binding.texture)?;
                let recode_err = |err| ConvertError::Recode { material: key, source: err };

                let specular = recode::recode_texture(
                    source,
                    Self::texture_name(source, material, &self.config.specular_suffix),
                    self.config.encode_png,
                    recode::strip_glossiness,
                )
                .map_err(recode_err)?;

                let metal_rough = recode::recode_texture(
                    source,
                    Self::texture_name(source, material, &self.config.metal_rough_suffix),
                    self.config.encode_png,
                    recode::glossiness_to_roughness(spec_gloss.glossiness_factor),
                )
                .map_err(recode_err)?;

                plan.specular_texture = Some(PendingTexture { texture: specular, info: binding.info });
                plan.metal_rough_texture = Some(PendingTexture { texture: metal_rough, info: binding.info });
            }
            None => {
                plan.roughness_factor = 1.0 - spec_gloss.glossiness_factor;
            }
        }

        log::debug!(
            "Planned conversion of material '{}' ({})",
            material.name.as_deref().unwrap_or("unnamed"),
            if plan.metal_rough_texture.is_some() { "textured" } else { "factors only" }
        );

        Ok(plan)
    }

    fn apply_plan(doc: &mut Document, plan: MaterialPlan, report: &mut ConversionReport) {
        let mut created = |doc: &mut Document, pending: Option<PendingTexture>| {
            pending.map(|p| {
                let texture = doc.create_texture(p.texture);
                report.textures_created.push(texture);
                TextureBinding::with_info(texture, p.info)
            })
        };
        let specular_texture = created(doc, plan.specular_texture);
        let metal_rough_texture = created(doc, plan.metal_rough_texture);

        let Some(material) = doc.material_mut(plan.material) else {
            return;
        };

        material.base_color_factor = plan.base_color_factor;
        material.metallic_factor = PLACEHOLDER_METALLIC;
        material.roughness_factor = plan.roughness_factor;
        material.base_color_texture = plan.base_color_texture;
        if metal_rough_texture.is_some() {
            material.metallic_roughness_texture = metal_rough_texture;
        }

        material.set_extension(Ior { ior: PLACEHOLDER_IOR });
        material.set_extension(Specular {
            specular_texture,
            ..plan.specular
        });
        material.detach_extension(ExtensionKind::PbrSpecularGlossiness);

        report.materials_converted.push(plan.material);
    }

    fn require_texture(
        doc: &Document,
        material: MaterialKey,
        slot: TextureSlot,
        texture: TextureKey,
    ) -> Result<&Texture, ConvertError> {
        doc.texture(texture)
            .ok_or(ConvertError::MissingTexture { material, slot, texture })
    }

    fn texture_name(source: &Texture, material: &Material, suffix: &str) -> Option<String> {
        source
            .name
            .as_deref()
            .or(material.name.as_deref())
            .map(|base| format!("{base}{suffix}"))
    }
}

/// Convert every spec/gloss material in `doc` with the given settings
pub fn convert_to_metal_rough(
    doc: &mut Document,
    config: &ConverterConfig,
) -> Result<ConversionReport, ConvertError> {
    MetalRoughConverter::new(config.clone()).convert(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::logging;
    use crate::scene::{PixelBuffer, Sampler, TextureImage, WrapMode, MinFilter};
    use approx::assert_relative_eq;

    fn spec_gloss_doc() -> Document {
        let mut doc = Document::new();
        doc.extensions_mut().create(ExtensionKind::PbrSpecularGlossiness);
        doc
    }

    fn sg_texture(doc: &mut Document, alpha: u8) -> TextureKey {
        doc.create_texture(
            Texture::from_pixels(PixelBuffer::solid(4, 2, [40, 80, 120, alpha])).with_name("sg"),
        )
    }

    #[test]
    fn test_factor_only_conversion() {
        logging::init_for_tests();
        let mut doc = spec_gloss_doc();
        let key = doc.create_material(Material::new().with_extension(PbrSpecularGlossiness {
            diffuse_factor: [0.2, 0.4, 0.6, 0.8],
            specular_factor: [0.1, 0.2, 0.3],
            glossiness_factor: 0.25,
            ..Default::default()
        }));

        let report = MetalRoughConverter::default().convert(&mut doc).unwrap();
        assert!(!report.skipped);
        assert_eq!(report.materials_converted, vec![key]);
        assert!(report.textures_created.is_empty());

        let material = doc.material(key).unwrap();
        assert_eq!(material.base_color_factor, [0.2, 0.4, 0.6, 0.8]);
        assert_eq!(material.metallic_factor, 0.0);
        assert_relative_eq!(material.roughness_factor, 0.75);
        assert_eq!(material.extension::<Ior>().unwrap().ior, 1000.0);

        let specular = material.extension::<Specular>().unwrap();
        assert_eq!(specular.specular_factor, 1.0);
        assert_eq!(specular.specular_color_factor, [0.1, 0.2, 0.3]);
        assert!(specular.specular_texture.is_none());
        assert!(!material.has_extension(ExtensionKind::PbrSpecularGlossiness));
    }

    #[test]
    fn test_textured_conversion_keeps_placeholder_roughness() {
        logging::init_for_tests();
        let mut doc = spec_gloss_doc();
        let sg = sg_texture(&mut doc, 200);
        let info = TextureInfo {
            tex_coord: 1,
            sampler: Sampler {
                wrap_s: WrapMode::ClampToEdge,
                wrap_t: WrapMode::MirroredRepeat,
                mag_filter: None,
                min_filter: Some(MinFilter::LinearMipmapLinear),
            },
        };
        let key = doc.create_material(Material::new().with_extension(PbrSpecularGlossiness {
            glossiness_factor: 0.5,
            specular_glossiness_texture: Some(TextureBinding::with_info(sg, info)),
            ..Default::default()
        }));

        let report = MetalRoughConverter::default().convert(&mut doc).unwrap();
        assert_eq!(report.textures_created.len(), 2);
        assert_eq!(report.textures_disposed, vec![sg]);

        let material = doc.material(key).unwrap();
        assert_eq!(material.roughness_factor, 1.0);

        let metal_rough = material.metallic_roughness_texture.unwrap();
        assert_eq!(metal_rough.info, info);
        let specular = material.extension::<Specular>().unwrap().specular_texture.unwrap();
        assert_eq!(specular.info, info);
        assert_ne!(specular.texture, metal_rough.texture);

        let mr = doc.texture(metal_rough.texture).unwrap();
        assert_eq!(mr.name.as_deref(), Some("sg_metallic_roughness"));
        let pixels = mr.image.decode().unwrap();
        assert_eq!(pixels.pixel(3, 1), [0, 155, 0, 255]);

        let spec = doc.texture(specular.texture).unwrap();
        assert_eq!(spec.name.as_deref(), Some("sg_specular"));
        assert_eq!(spec.image.decode().unwrap().pixel(0, 0), [40, 80, 120, 255]);
    }

    #[test]
    fn test_diffuse_texture_becomes_base_color() {
        let mut doc = spec_gloss_doc();
        let diffuse = doc.create_texture(Texture::from_pixels(PixelBuffer::solid(1, 1, [255; 4])));
        let info = TextureInfo { tex_coord: 2, ..Default::default() };
        let key = doc.create_material(Material::new().with_extension(PbrSpecularGlossiness {
            diffuse_texture: Some(TextureBinding::with_info(diffuse, info)),
            ..Default::default()
        }));

        let report = MetalRoughConverter::default().convert(&mut doc).unwrap();
        assert!(report.textures_disposed.is_empty());
        assert!(doc.contains_texture(diffuse));
        assert_eq!(
            doc.material(key).unwrap().base_color_texture,
            Some(TextureBinding::with_info(diffuse, info))
        );
    }

    #[test]
    fn test_skips_document_without_extension() {
        let mut doc = Document::new();
        let key = doc.create_material(Material::new().with_extension(PbrSpecularGlossiness::default()));

        let report = convert_to_metal_rough(&mut doc, &ConverterConfig::default()).unwrap();
        assert_eq!(report, ConversionReport::skipped());
        assert!(doc.material(key).unwrap().has_extension(ExtensionKind::PbrSpecularGlossiness));
        assert!(doc.extensions().used_names().is_empty());
    }

    #[test]
    fn test_missing_texture_aborts_without_mutation() {
        let mut doc = spec_gloss_doc();
        let gone = sg_texture(&mut doc, 10);
        doc.dispose_texture(gone);

        let untouched = doc.create_material(Material::new().with_extension(PbrSpecularGlossiness {
            glossiness_factor: 0.3,
            ..Default::default()
        }));
        let broken = doc.create_material(Material::new().with_extension(PbrSpecularGlossiness {
            specular_glossiness_texture: Some(TextureBinding::new(gone)),
            ..Default::default()
        }));

        let err = MetalRoughConverter::default().convert(&mut doc).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::MissingTexture { material, slot: TextureSlot::SpecularGlossiness, .. }
                if material == broken
        ));

        // The first material was planned but never applied
        let material = doc.material(untouched).unwrap();
        assert!(material.has_extension(ExtensionKind::PbrSpecularGlossiness));
        assert_eq!(material.roughness_factor, 1.0);
        assert!(doc.extensions().is_used(ExtensionKind::PbrSpecularGlossiness));
        assert!(!doc.extensions().is_used(ExtensionKind::Ior));
    }

    #[test]
    fn test_undecodable_texture_is_fatal() {
        let mut doc = spec_gloss_doc();
        let bad = doc.create_texture(Texture::from_encoded(vec![0; 8], "image/png"));
        doc.create_material(Material::new().with_extension(PbrSpecularGlossiness {
            specular_glossiness_texture: Some(TextureBinding::new(bad)),
            ..Default::default()
        }));

        let err = MetalRoughConverter::default().convert(&mut doc).unwrap_err();
        assert!(matches!(err, ConvertError::Recode { .. }));
        assert_eq!(doc.texture_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut doc = spec_gloss_doc();
        let config = ConverterConfig::default().with_suffixes("_a", "_a");

        let err = convert_to_metal_rough(&mut doc, &config).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
        assert!(doc.extensions().is_used(ExtensionKind::PbrSpecularGlossiness));
    }

    #[test]
    fn test_encode_png_and_keep_orphans() {
        let mut doc = spec_gloss_doc();
        let sg = sg_texture(&mut doc, 255);
        let key = doc.create_material(Material::new().with_name("mat").with_extension(PbrSpecularGlossiness {
            specular_glossiness_texture: Some(TextureBinding::new(sg)),
            ..Default::default()
        }));

        let config = ConverterConfig::default()
            .with_encode_png(true)
            .with_dispose_orphans(false);
        let report = convert_to_metal_rough(&mut doc, &config).unwrap();

        assert!(report.textures_disposed.is_empty());
        assert!(doc.contains_texture(sg));
        assert_eq!(doc.list_texture_parents(sg).len(), 1);

        let mr = doc.material(key).unwrap().metallic_roughness_texture.unwrap();
        let texture = doc.texture(mr.texture).unwrap();
        assert_eq!(texture.mime_type, "image/png");
        assert!(matches!(texture.image, TextureImage::Encoded(_)));
        assert_eq!(texture.image.decode().unwrap().pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_unnamed_source_uses_material_name() {
        let mut doc = spec_gloss_doc();
        let sg = doc.create_texture(Texture::from_pixels(PixelBuffer::solid(1, 1, [0; 4])));
        let key = doc.create_material(Material::new().with_name("Hull").with_extension(PbrSpecularGlossiness {
            specular_glossiness_texture: Some(TextureBinding::new(sg)),
            ..Default::default()
        }));

        MetalRoughConverter::default().convert(&mut doc).unwrap();
        let specular = doc.material(key).unwrap().extension::<Specular>().unwrap().specular_texture.unwrap();
        assert_eq!(doc.texture(specular.texture).unwrap().name.as_deref(), Some("Hull_specular"));
    }
}
