//! Material extension records and the document-scoped extension registry
//!
//! The set of known extensions is closed: every record is one variant of
//! [`ExtensionRecord`], and [`MaterialExtension`] gives typed access to it.

use serde::{Deserialize, Serialize};

use super::material::{TextureBinding, TextureSlot};
use crate::foundation::collections::TextureKey;

/// Known material extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExtensionKind {
    /// `KHR_materials_pbrSpecularGlossiness`
    PbrSpecularGlossiness,
    /// `KHR_materials_ior`
    Ior,
    /// `KHR_materials_specular`
    Specular,
}

impl ExtensionKind {
    /// All known kinds
    pub const ALL: [Self; 3] = [Self::PbrSpecularGlossiness, Self::Ior, Self::Specular];

    /// Registered glTF extension name
    pub const fn name(self) -> &'static str {
        match self {
            Self::PbrSpecularGlossiness => "KHR_materials_pbrSpecularGlossiness",
            Self::Ior => "KHR_materials_ior",
            Self::Specular => "KHR_materials_specular",
        }
    }

    /// Look up a kind by its glTF extension name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `KHR_materials_pbrSpecularGlossiness` material record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbrSpecularGlossiness {
    /// Linear RGBA diffuse color
    pub diffuse_factor: [f32; 4],
    /// Linear RGB specular color
    pub specular_factor: [f32; 3],
    /// Glossiness (0.0 = rough, 1.0 = mirror)
    pub glossiness_factor: f32,
    /// Diffuse texture
    pub diffuse_texture: Option<TextureBinding>,
    /// Specular in RGB, glossiness in A
    pub specular_glossiness_texture: Option<TextureBinding>,
}

impl Default for PbrSpecularGlossiness {
    fn default() -> Self {
        Self {
            diffuse_factor: [1.0, 1.0, 1.0, 1.0],
            specular_factor: [1.0, 1.0, 1.0],
            glossiness_factor: 1.0,
            diffuse_texture: None,
            specular_glossiness_texture: None,
        }
    }
}

/// `KHR_materials_ior` material record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ior {
    /// Index of refraction
    pub ior: f32,
}

impl Default for Ior {
    fn default() -> Self {
        Self { ior: 1.5 }
    }
}

/// `KHR_materials_specular` material record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specular {
    /// Specular strength
    pub specular_factor: f32,
    /// Linear RGB F0 color
    pub specular_color_factor: [f32; 3],
    /// Specular texture (RGB used)
    pub specular_texture: Option<TextureBinding>,
}

impl Default for Specular {
    fn default() -> Self {
        Self {
            specular_factor: 1.0,
            specular_color_factor: [1.0, 1.0, 1.0],
            specular_texture: None,
        }
    }
}

/// Extension record attached to a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtensionRecord {
    /// Specular/glossiness workflow input
    PbrSpecularGlossiness(PbrSpecularGlossiness),
    /// Index of refraction
    Ior(Ior),
    /// Specular strength and color
    Specular(Specular),
}

impl ExtensionRecord {
    /// Kind of this record
    pub const fn kind(&self) -> ExtensionKind {
        match self {
            Self::PbrSpecularGlossiness(_) => ExtensionKind::PbrSpecularGlossiness,
            Self::Ior(_) => ExtensionKind::Ior,
            Self::Specular(_) => ExtensionKind::Specular,
        }
    }

    /// Texture bindings held by this record
    pub fn texture_bindings(&self) -> Vec<(TextureSlot, TextureBinding)> {
        match self {
            Self::PbrSpecularGlossiness(sg) => [
                (TextureSlot::Diffuse, sg.diffuse_texture),
                (TextureSlot::SpecularGlossiness, sg.specular_glossiness_texture),
            ]
            .into_iter()
            .filter_map(|(slot, binding)| binding.map(|b| (slot, b)))
            .collect(),
            Self::Ior(_) => Vec::new(),
            Self::Specular(specular) => specular
                .specular_texture
                .map(|b| (TextureSlot::Specular, b))
                .into_iter()
                .collect(),
        }
    }

    pub(crate) fn unbind_texture(&mut self, texture: TextureKey) -> usize {
        let slots: Vec<&mut Option<TextureBinding>> = match self {
            Self::PbrSpecularGlossiness(sg) => {
                vec![&mut sg.diffuse_texture, &mut sg.specular_glossiness_texture]
            }
            Self::Ior(_) => Vec::new(),
            Self::Specular(specular) => vec![&mut specular.specular_texture],
        };

        let mut cleared = 0;
        for slot in slots {
            if slot.is_some_and(|b| b.texture == texture) {
                *slot = None;
                cleared += 1;
            }
        }
        cleared
    }
}

/// Typed view of one [`ExtensionRecord`] variant
pub trait MaterialExtension: Sized {
    /// Kind this record type belongs to
    const KIND: ExtensionKind;

    /// Borrow the typed record out of a generic one
    fn from_record(record: &ExtensionRecord) -> Option<&Self>;

    /// Mutably borrow the typed record out of a generic one
    fn from_record_mut(record: &mut ExtensionRecord) -> Option<&mut Self>;

    /// Wrap into the generic record
    fn into_record(self) -> ExtensionRecord;
}

macro_rules! impl_material_extension {
    ($ty:ident) => {
        impl MaterialExtension for $ty {
            const KIND: ExtensionKind = ExtensionKind::$ty;

            fn from_record(record: &ExtensionRecord) -> Option<&Self> {
                match record {
                    ExtensionRecord::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_record_mut(record: &mut ExtensionRecord) -> Option<&mut Self> {
                match record {
                    ExtensionRecord::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_record(self) -> ExtensionRecord {
                ExtensionRecord::$ty(self)
            }
        }
    };
}

impl_material_extension!(PbrSpecularGlossiness);
impl_material_extension!(Ior);
impl_material_extension!(Specular);

/// Handle returned when an extension is created for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionHandle {
    kind: ExtensionKind,
}

impl ExtensionHandle {
    /// Kind this handle creates records for
    pub const fn kind(self) -> ExtensionKind {
        self.kind
    }

    /// Whether records created through this handle must be understood by loaders
    pub fn set_required(self, registry: &mut ExtensionRegistry, required: bool) {
        registry.set_required(self.kind, required);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct RegisteredExtension {
    kind: ExtensionKind,
    required: bool,
}

/// Document-scoped list of extensions declared as used
///
/// Records are attached to materials directly; the registry only tracks
/// declarations. Disposal is done through
/// [`Document::dispose_extension`](super::Document::dispose_extension) since
/// it also has to reach every material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRegistry {
    used: Vec<RegisteredExtension>,
}

impl ExtensionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an extension as used, returning its creation handle
    ///
    /// Creating an already declared extension returns the same handle.
    pub fn create(&mut self, kind: ExtensionKind) -> ExtensionHandle {
        if !self.is_used(kind) {
            log::debug!("Declaring extension {}", kind);
            self.used.push(RegisteredExtension { kind, required: false });
        }
        ExtensionHandle { kind }
    }

    /// Mark a declared extension as required (no-op if not declared)
    pub fn set_required(&mut self, kind: ExtensionKind, required: bool) {
        if let Some(entry) = self.used.iter_mut().find(|e| e.kind == kind) {
            entry.required = required;
        }
    }

    /// Check whether an extension is declared as used
    pub fn is_used(&self, kind: ExtensionKind) -> bool {
        self.used.iter().any(|e| e.kind == kind)
    }

    /// Check whether an extension is declared as required
    pub fn is_required(&self, kind: ExtensionKind) -> bool {
        self.used.iter().any(|e| e.kind == kind && e.required)
    }

    /// Names of used extensions in declaration order
    pub fn used_names(&self) -> Vec<&'static str> {
        self.used.iter().map(|e| e.kind.name()).collect()
    }

    /// Names of required extensions in declaration order
    pub fn required_names(&self) -> Vec<&'static str> {
        self.used
            .iter()
            .filter(|e| e.required)
            .map(|e| e.kind.name())
            .collect()
    }

    /// Remove a declaration, returning whether it existed
    pub(crate) fn remove(&mut self, kind: ExtensionKind) -> bool {
        let before = self.used.len();
        self.used.retain(|e| e.kind != kind);
        before != self.used.len()
    }
}
