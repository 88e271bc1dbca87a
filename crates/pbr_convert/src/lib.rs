//! # PBR Convert
//!
//! Converts materials authored in the specular/glossiness PBR workflow
//! (`KHR_materials_pbrSpecularGlossiness`) into the metallic/roughness
//! workflow, using `KHR_materials_ior` and `KHR_materials_specular` to keep
//! the specular response exact.
//!
//! ## Quick Start
//!
//! ```rust
//! use pbr_convert::prelude::*;
//!
//! let mut doc = Document::new();
//! doc.extensions_mut().create(ExtensionKind::PbrSpecularGlossiness);
//! let key = doc.create_material(Material::new().with_extension(PbrSpecularGlossiness {
//!     diffuse_factor: [1.0, 0.0, 0.0, 1.0],
//!     specular_factor: [0.5, 0.5, 0.5],
//!     glossiness_factor: 0.8,
//!     ..Default::default()
//! }));
//!
//! let report = MetalRoughConverter::default().convert(&mut doc).unwrap();
//! assert_eq!(report.materials_converted, vec![key]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod foundation;
pub mod config;
pub mod scene;
pub mod convert;

/// Common imports for converter users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ConverterConfig},
        convert::{convert_to_metal_rough, ConversionReport, ConvertError, MetalRoughConverter},
        foundation::collections::{MaterialKey, TextureKey},
        scene::{
            Document, ExtensionKind, Ior, Material, PbrSpecularGlossiness, PixelBuffer, Sampler,
            Specular, Texture, TextureBinding, TextureInfo,
        },
    };
}
