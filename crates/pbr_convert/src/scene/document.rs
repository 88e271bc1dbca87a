//! Document arena owning every material and texture
//!
//! Textures and materials live in slot maps and are addressed by stable keys.
//! Texture parent lists are derived on demand from the material bindings, so
//! there is no reference count to keep in sync.

use serde::{Deserialize, Serialize};

use super::extensions::{ExtensionKind, ExtensionRegistry};
use super::material::{Material, TextureSlot};
use super::texture::Texture;
use crate::foundation::collections::{MaterialKey, SlotMap, TextureKey};

/// Something that holds a reference to a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureParent {
    /// The owning document; present for every live texture
    Document,
    /// A material binding, core or extension
    Material {
        /// Referencing material
        material: MaterialKey,
        /// Binding site within the material
        slot: TextureSlot,
    },
}

/// In-memory scene description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    textures: SlotMap<TextureKey, Texture>,
    materials: SlotMap<MaterialKey, Material>,
    material_order: Vec<MaterialKey>,
    extensions: ExtensionRegistry,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Extensions -------------------------------------------------------

    /// Extension declarations
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Mutable extension declarations
    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.extensions
    }

    /// Dispose an extension: detach its records from every material and drop
    /// the used/required declaration
    ///
    /// # Returns
    /// The number of material records detached
    pub fn dispose_extension(&mut self, kind: ExtensionKind) -> usize {
        let detached = self
            .materials
            .values_mut()
            .filter_map(|material| material.detach_extension(kind))
            .count();

        let declared = self.extensions.remove(kind);
        log::debug!(
            "Disposed extension {} (declared: {}, records detached: {})",
            kind,
            declared,
            detached
        );
        detached
    }

    // ---- Materials --------------------------------------------------------

    /// Add a material
    pub fn create_material(&mut self, material: Material) -> MaterialKey {
        let key = self.materials.insert(material);
        self.material_order.push(key);
        key
    }

    /// Get a material by key
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Get a mutable material by key
    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    /// Remove a material
    pub fn remove_material(&mut self, key: MaterialKey) -> Option<Material> {
        let material = self.materials.remove(key)?;
        self.material_order.retain(|k| *k != key);
        Some(material)
    }

    /// Material keys in insertion order
    pub fn material_keys(&self) -> Vec<MaterialKey> {
        self.material_order.clone()
    }

    /// Materials in insertion order
    pub fn materials(&self) -> impl Iterator<Item = (MaterialKey, &Material)> {
        self.material_order
            .iter()
            .filter_map(|key| self.materials.get(*key).map(|m| (*key, m)))
    }

    /// Number of materials
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // ---- Textures ---------------------------------------------------------

    /// Add a texture
    pub fn create_texture(&mut self, texture: Texture) -> TextureKey {
        self.textures.insert(texture)
    }

    /// Get a texture by key
    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    /// Get a mutable texture by key
    pub fn texture_mut(&mut self, key: TextureKey) -> Option<&mut Texture> {
        self.textures.get_mut(key)
    }

    /// Check whether a texture key is still live
    pub fn contains_texture(&self, key: TextureKey) -> bool {
        self.textures.contains_key(key)
    }

    /// All textures, in arena order
    pub fn textures(&self) -> impl Iterator<Item = (TextureKey, &Texture)> {
        self.textures.iter()
    }

    /// Number of textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Everything that references a texture
    ///
    /// The document itself is always listed first for a live texture, so a
    /// texture with exactly one parent is not bound by any material. Unknown
    /// keys yield an empty list.
    pub fn list_texture_parents(&self, key: TextureKey) -> Vec<TextureParent> {
        if !self.textures.contains_key(key) {
            return Vec::new();
        }

        let mut parents = vec![TextureParent::Document];
        for (material_key, material) in self.materials() {
            parents.extend(
                material
                    .texture_bindings()
                    .into_iter()
                    .filter(|(_, binding)| binding.texture == key)
                    .map(|(slot, _)| TextureParent::Material {
                        material: material_key,
                        slot,
                    }),
            );
        }
        parents
    }

    /// Remove a texture and clear every binding that pointed at it
    ///
    /// The key is invalid afterwards.
    pub fn dispose_texture(&mut self, key: TextureKey) -> Option<Texture> {
        let texture = self.textures.remove(key)?;

        let unbound: usize = self
            .materials
            .values_mut()
            .map(|material| material.unbind_texture(key))
            .sum();

        log::debug!(
            "Disposed texture {:?} ({}), cleared {} binding(s)",
            key,
            texture.name.as_deref().unwrap_or("unnamed"),
            unbound
        );
        Some(texture)
    }
}
