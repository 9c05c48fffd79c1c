//! QR Style Core - option validation and resolution for QR rendering
//!
//! # Guarantees
//! 1. Every setter validates before it mutates
//! 2. The first invalid field aborts resolution
//! 3. Overlay selectors come from static registries only
//! 4. The renderer only ever sees a resolved bundle
//! 5. Identical requests produce identical fingerprints

pub mod assets;
pub mod color;
pub mod config;
pub mod hashing;
pub mod label;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod validation;

pub use assets::{AssetError, AssetRegistry, OverlayFamily};
pub use color::ColorValue;
pub use config::{ConfigError, StyleConfig};
pub use hashing::{canonical_json, render_fingerprint};
pub use label::{Alignment, LabelConfig, MarginVector};
pub use options::{QrMargin, QrOptions};
pub use output::OutputFormat;
pub use pipeline::{GenerateRequest, GeneratedCode, GenerationPipeline, PipelineError};
pub use render::{QrcodeRenderer, RenderError, Renderer};
pub use resolver::{RenderOptionsResolver, ResolvedLabel, ResolvedRenderOptions};
pub use validation::OptionsError;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
