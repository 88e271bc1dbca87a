//! Material definitions and texture bindings
//!
//! Materials follow the glTF 2.0 metallic/roughness model. Workflow-specific
//! side data lives in typed extension records keyed by [`ExtensionKind`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::extensions::{ExtensionKind, ExtensionRecord, MaterialExtension};
use crate::foundation::collections::TextureKey;

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMode {
    /// Tile the texture
    #[default]
    Repeat,
    /// Clamp coordinates to the edge texels
    ClampToEdge,
    /// Tile the texture, mirroring every other repetition
    MirroredRepeat,
}

/// Magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MagFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
}

/// Minification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Nearest texel from the nearest mip level
    NearestMipmapNearest,
    /// Bilinear on the nearest mip level
    LinearMipmapNearest,
    /// Nearest texel, blended between mip levels
    NearestMipmapLinear,
    /// Trilinear
    LinearMipmapLinear,
}

/// Sampler settings of a texture binding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sampler {
    /// Wrapping along U
    pub wrap_s: WrapMode,
    /// Wrapping along V
    pub wrap_t: WrapMode,
    /// Magnification filter, renderer default when `None`
    pub mag_filter: Option<MagFilter>,
    /// Minification filter, renderer default when `None`
    pub min_filter: Option<MinFilter>,
}

/// Per-binding texture parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureInfo {
    /// Texture coordinate set index
    pub tex_coord: u32,
    /// Sampler settings
    pub sampler: Sampler,
}

/// Association between a material slot and a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureBinding {
    /// Bound texture
    pub texture: TextureKey,
    /// Coordinate set and sampler
    pub info: TextureInfo,
}

impl TextureBinding {
    /// Bind a texture with default coordinate set and sampler
    pub fn new(texture: TextureKey) -> Self {
        Self {
            texture,
            info: TextureInfo::default(),
        }
    }

    /// Bind a texture with explicit parameters
    pub fn with_info(texture: TextureKey, info: TextureInfo) -> Self {
        Self { texture, info }
    }
}

/// Every place a material can reference a texture from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextureSlot {
    /// Core base color texture
    BaseColor,
    /// Core metallic-roughness texture
    MetallicRoughness,
    /// Core normal map
    Normal,
    /// Core occlusion map
    Occlusion,
    /// Core emissive texture
    Emissive,
    /// Spec/gloss diffuse texture
    Diffuse,
    /// Spec/gloss combined specular+glossiness texture
    SpecularGlossiness,
    /// Specular extension texture
    Specular,
}

/// Material resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Optional name for debugging
    pub name: Option<String>,
    /// Linear RGBA base color
    pub base_color_factor: [f32; 4],
    /// Metallic factor (0.0 = dielectric, 1.0 = metal)
    pub metallic_factor: f32,
    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness_factor: f32,
    /// Base color texture
    pub base_color_texture: Option<TextureBinding>,
    /// Metallic (B) and roughness (G) texture
    pub metallic_roughness_texture: Option<TextureBinding>,
    /// Tangent-space normal map
    pub normal_texture: Option<TextureBinding>,
    /// Ambient occlusion map
    pub occlusion_texture: Option<TextureBinding>,
    /// Emissive texture
    pub emissive_texture: Option<TextureBinding>,
    /// Attached extension records
    extensions: BTreeMap<ExtensionKind, ExtensionRecord>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            extensions: BTreeMap::new(),
        }
    }
}

impl Material {
    /// Create a material with glTF default factors
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the material name for debugging
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach an extension record, builder style
    pub fn with_extension<T: MaterialExtension>(mut self, extension: T) -> Self {
        self.set_extension(extension);
        self
    }

    /// Typed access to an attached extension record
    pub fn extension<T: MaterialExtension>(&self) -> Option<&T> {
        self.extensions.get(&T::KIND).and_then(T::from_record)
    }

    /// Typed mutable access to an attached extension record
    pub fn extension_mut<T: MaterialExtension>(&mut self) -> Option<&mut T> {
        self.extensions.get_mut(&T::KIND).and_then(T::from_record_mut)
    }

    /// Attach an extension record, replacing any record of the same kind
    pub fn set_extension<T: MaterialExtension>(&mut self, extension: T) -> Option<ExtensionRecord> {
        self.extensions.insert(T::KIND, extension.into_record())
    }

    /// Detach the record of the given kind without touching the registry
    pub fn detach_extension(&mut self, kind: ExtensionKind) -> Option<ExtensionRecord> {
        self.extensions.remove(&kind)
    }

    /// Check whether a record of the given kind is attached
    pub fn has_extension(&self, kind: ExtensionKind) -> bool {
        self.extensions.contains_key(&kind)
    }

    /// Kinds of all attached records
    pub fn extension_kinds(&self) -> impl Iterator<Item = ExtensionKind> + '_ {
        self.extensions.keys().copied()
    }

    /// Every texture binding of this material, core slots first
    pub fn texture_bindings(&self) -> Vec<(TextureSlot, TextureBinding)> {
        let core = [
            (TextureSlot::BaseColor, self.base_color_texture),
            (TextureSlot::MetallicRoughness, self.metallic_roughness_texture),
            (TextureSlot::Normal, self.normal_texture),
            (TextureSlot::Occlusion, self.occlusion_texture),
            (TextureSlot::Emissive, self.emissive_texture),
        ];

        core.into_iter()
            .filter_map(|(slot, binding)| binding.map(|b| (slot, b)))
            .chain(self.extensions.values().flat_map(ExtensionRecord::texture_bindings))
            .collect()
    }

    /// Clear every binding that points at `texture`, returning how many were cleared
    pub(crate) fn unbind_texture(&mut self, texture: TextureKey) -> usize {
        let mut cleared = 0;
        for slot in [
            &mut self.base_color_texture,
            &mut self.metallic_roughness_texture,
            &mut self.normal_texture,
            &mut self.occlusion_texture,
            &mut self.emissive_texture,
        ] {
            if slot.is_some_and(|b| b.texture == texture) {
                *slot = None;
                cleared += 1;
            }
        }

        for record in self.extensions.values_mut() {
            cleared += record.unbind_texture(texture);
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::extensions::{Ior, PbrSpecularGlossiness, Specular};
    use slotmap::SlotMap;

    fn texture_keys(count: usize) -> Vec<TextureKey> {
        let mut arena: SlotMap<TextureKey, ()> = SlotMap::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn test_default_factors() {
        let material = Material::new();
        assert_eq!(material.base_color_factor, [1.0; 4]);
        assert_eq!(material.metallic_factor, 1.0);
        assert_eq!(material.roughness_factor, 1.0);
        assert_eq!(material.extension_kinds().count(), 0);
    }

    #[test]
    fn test_typed_extension_access() {
        let mut material = Material::new()
            .with_name("Glossy")
            .with_extension(Ior { ior: 1.33 });

        assert_eq!(material.extension::<Ior>().map(|e| e.ior), Some(1.33));
        assert!(material.extension::<Specular>().is_none());

        if let Some(ior) = material.extension_mut::<Ior>() {
            ior.ior = 2.0;
        }
        let previous = material.set_extension(Ior { ior: 3.0 });
        assert_eq!(previous, Some(ExtensionRecord::Ior(Ior { ior: 2.0 })));

        let detached = material.detach_extension(ExtensionKind::Ior);
        assert!(detached.is_some());
        assert!(!material.has_extension(ExtensionKind::Ior));
    }

    #[test]
    fn test_texture_bindings_include_extensions() {
        let keys = texture_keys(3);
        let mut material = Material::new();
        material.base_color_texture = Some(TextureBinding::new(keys[0]));
        material.set_extension(PbrSpecularGlossiness {
            diffuse_texture: Some(TextureBinding::new(keys[0])),
            specular_glossiness_texture: Some(TextureBinding::new(keys[1])),
            ..Default::default()
        });
        material.normal_texture = Some(TextureBinding::new(keys[2]));

        let slots: Vec<_> = material.texture_bindings().into_iter().map(|(slot, _)| slot).collect();
        assert_eq!(
            slots,
            vec![
                TextureSlot::BaseColor,
                TextureSlot::Normal,
                TextureSlot::Diffuse,
                TextureSlot::SpecularGlossiness,
            ]
        );
    }

    #[test]
    fn test_unbind_texture_clears_all_slots() {
        let keys = texture_keys(2);
        let mut material = Material::new();
        material.base_color_texture = Some(TextureBinding::new(keys[0]));
        material.emissive_texture = Some(TextureBinding::new(keys[0]));
        material.normal_texture = Some(TextureBinding::new(keys[1]));
        material.set_extension(Specular {
            specular_texture: Some(TextureBinding::new(keys[0])),
            ..Default::default()
        });

        assert_eq!(material.unbind_texture(keys[0]), 3);
        assert!(material.base_color_texture.is_none());
        assert!(material.emissive_texture.is_none());
        assert!(material.normal_texture.is_some());
        assert!(material.extension::<Specular>().unwrap().specular_texture.is_none());
    }
}
