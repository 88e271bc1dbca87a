//! Scene graph holding materials, textures and extension records
//!
//! This is the in-memory document the converter operates on. It owns all
//! data before and after conversion; the converter only reads and mutates it
//! through the operations exposed here.

pub mod document;
pub mod extensions;
pub mod material;
pub mod texture;

pub use document::{Document, TextureParent};
pub use extensions::{
    ExtensionHandle, ExtensionKind, ExtensionRecord, ExtensionRegistry, Ior, MaterialExtension,
    PbrSpecularGlossiness, Specular,
};
pub use material::{
    MagFilter, Material, MinFilter, Sampler, TextureBinding, TextureInfo, TextureSlot, WrapMode,
};
pub use texture::{PixelBuffer, Texture, TextureError, TextureImage};
