//! Generation Pipeline - Single Entry Point
//!
//! `generate` always resolves options before anything reaches the
//! renderer. There is no path that renders unvalidated input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{ConfigError, StyleConfig};
use crate::hashing::{payload_hash, render_fingerprint};
use crate::options::QrOptions;
use crate::output::OutputFormat;
use crate::render::{QrcodeRenderer, RenderError, Renderer};
use crate::resolver::{RenderOptionsResolver, ResolvedRenderOptions};
use crate::validation::OptionsError;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid options: {0}")]
    Options(#[from] OptionsError),

    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub content: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    OutputFormat::default().to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCode {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub format: OutputFormat,
    pub mime_type: String,
    pub fingerprint: String,
    pub options: ResolvedRenderOptions,
    pub data_base64: String,
    pub hash: String,
}

impl GeneratedCode {
    pub fn data(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &self.data_base64)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// Resolver plus renderer collaborator.
pub struct GenerationPipeline {
    resolver: RenderOptionsResolver,
    renderer: Box<dyn Renderer>,
}

impl GenerationPipeline {
    pub fn new(config: StyleConfig) -> Result<Self, ConfigError> {
        Self::with_renderer(config, Box::new(QrcodeRenderer::new()))
    }

    pub fn with_renderer(config: StyleConfig, renderer: Box<dyn Renderer>) -> Result<Self, ConfigError> {
        Ok(Self {
            resolver: RenderOptionsResolver::new(config)?,
            renderer,
        })
    }

    pub fn resolver(&self) -> &RenderOptionsResolver {
        &self.resolver
    }

    /// Fresh configuration seeded from this pipeline's defaults.
    pub fn options(&self) -> QrOptions {
        self.resolver.options()
    }

    /// Generate from a raw request.
    pub fn generate(&self, request: &GenerateRequest) -> Result<GeneratedCode, PipelineError> {
        let format: OutputFormat = request.format.parse()?;
        // MANDATORY: resolution runs before rendering, every time.
        let resolved = self.resolver.resolve(&request.options)?;
        self.render(&request.content, resolved, format)
    }

    /// Generate from an options object built with the fluent setters.
    pub fn generate_with(
        &self,
        content: &str,
        options: &QrOptions,
        format: OutputFormat,
    ) -> Result<GeneratedCode, PipelineError> {
        let resolved = self.resolver.resolve_options(options)?;
        self.render(content, resolved, format)
    }

    fn render(
        &self,
        content: &str,
        resolved: ResolvedRenderOptions,
        format: OutputFormat,
    ) -> Result<GeneratedCode, PipelineError> {
        if content.is_empty() {
            return Err(PipelineError::EmptyContent);
        }

        let fingerprint = render_fingerprint(content, &resolved, format, ENGINE_VERSION)?;
        let data = self.renderer.render(content, &resolved, format)?;
        let hash = payload_hash(&data);

        tracing::debug!(%format, bytes = data.len(), fingerprint = %fingerprint, "generated QR code");

        Ok(GeneratedCode {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            format,
            mime_type: format.mime_type().to_string(),
            fingerprint,
            options: resolved,
            data_base64: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &data),
            hash,
        })
    }
}

impl Default for GenerationPipeline {
    fn default() -> Self {
        Self {
            resolver: RenderOptionsResolver::default(),
            renderer: Box::new(QrcodeRenderer::new()),
        }
    }
}
