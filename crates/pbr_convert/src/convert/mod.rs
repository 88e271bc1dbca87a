//! Workflow conversion
//!
//! - [`metal_rough`]: specular/glossiness to metallic/roughness materials
//! - [`recode`]: per-pixel texture channel rewriting used by the converter

pub mod metal_rough;
pub mod recode;

pub use metal_rough::{
    convert_to_metal_rough, ConversionReport, ConvertError, MetalRoughConverter, PLACEHOLDER_IOR,
};
pub use recode::{recode_texture, rewrite_pixels, Pixel, RecodeError};
