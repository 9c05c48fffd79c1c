//! Rendering Collaborator
//!
//! The core never encodes QR symbols itself. A [`Renderer`] receives the
//! resolved bundle and returns encoded bytes. [`QrcodeRenderer`] delegates
//! symbol encoding to the `qrcode` crate and raster output to `image`.

use thiserror::Error;

use crate::label::Alignment;
use crate::output::OutputFormat;
use crate::resolver::ResolvedRenderOptions;

#[derive(Debug, Error)]
pub enum RenderError {
    #[cfg(feature = "render")]
    #[error("QR encode error: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[cfg(feature = "render")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[cfg(feature = "render")]
    #[error("Failed to load overlay asset {}: {source}", .path.display())]
    Asset {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Canvas side of {0} px exceeds the 256 MiB pixel buffer limit")]
    CanvasTooLarge(u64),

    #[error("Rendering requires the 'render' feature to be enabled")]
    Unavailable,
}

/// External renderer seam. Implementations must not mutate the bundle.
pub trait Renderer {
    fn render(
        &self,
        content: &str,
        options: &ResolvedRenderOptions,
        format: OutputFormat,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Square module matrix, row-major, `true` for dark modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    width: u32,
    dark: Vec<bool>,
}

impl ModuleGrid {
    pub fn new(width: u32, dark: Vec<bool>) -> Option<Self> {
        (dark.len() as u64 == width as u64 * width as u64).then_some(Self { width, dark })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.width && self.dark[(y * self.width + x) as usize]
    }
}

/// Upper bound on an RGBA canvas buffer (256 MiB, an 8192 px square).
pub const MAX_CANVAS_BYTES: u64 = 1 << 28;

/// Pixel placement of the symbol inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub scale: u32,
    pub offset: u32,
    pub canvas: u32,
}

/// Modules are scaled by the largest whole factor that fits `size`,
/// centred, then padded by `margin` on every side.
pub fn compute_layout(modules: u32, size: u32, margin: u32) -> Result<Layout, RenderError> {
    let modules = modules.max(1);
    let scale = (size / modules).max(1);
    let drawn = modules as u64 * scale as u64;
    let inner = (size as u64).max(drawn);
    let canvas = inner + 2 * margin as u64;
    if canvas.saturating_mul(canvas).saturating_mul(4) > MAX_CANVAS_BYTES {
        tracing::warn!(canvas, size, margin, "canvas rejected before allocation");
        return Err(RenderError::CanvasTooLarge(canvas));
    }
    Ok(Layout {
        scale,
        offset: margin + ((inner - drawn) / 2) as u32,
        canvas: canvas as u32,
    })
}

/// Renders modules as a single SVG path. The label, when present, is
/// written below the symbol as a `<text>` element.
pub fn render_svg(grid: &ModuleGrid, options: &ResolvedRenderOptions) -> Result<String, RenderError> {
    let layout = compute_layout(grid.width(), options.size(), options.margin())?;
    let bg = options.background();
    let fg = options.foreground();

    let label_band = options
        .label()
        .map(|l| l.font_size as i64 + l.margin.top() as i64 + l.margin.bottom() as i64)
        .unwrap_or(0)
        .max(0) as u64;
    let height = layout.canvas as u64 + label_band;

    let mut out = String::new();
    out += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    out += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\" stroke=\"none\">\n",
        layout.canvas, height
    );
    out += &format!(
        "\t<rect width=\"100%\" height=\"100%\" fill=\"{}\" fill-opacity=\"{:.3}\"/>\n",
        hex_rgb(bg.rgba()),
        bg.a as f64 / 255.0
    );
    out += "\t<path d=\"";
    let mut first = true;
    for y in 0..grid.width() {
        for x in 0..grid.width() {
            if grid.is_dark(x, y) {
                if !first {
                    out += " ";
                }
                first = false;
                out += &format!(
                    "M{},{}h{s}v{s}h-{s}z",
                    layout.offset + x * layout.scale,
                    layout.offset + y * layout.scale,
                    s = layout.scale
                );
            }
        }
    }
    out += &format!(
        "\" fill=\"{}\" fill-opacity=\"{:.3}\"/>\n",
        hex_rgb(fg.rgba()),
        fg.a as f64 / 255.0
    );

    if let Some(label) = options.label() {
        let (x, anchor) = match label.alignment {
            Alignment::Left => (label.margin.left() as i64, "start"),
            Alignment::Center => (layout.canvas as i64 / 2, "middle"),
            Alignment::Right => (layout.canvas as i64 - label.margin.right() as i64, "end"),
        };
        let y = layout.canvas as i64 + label.margin.top() as i64 + label.font_size as i64;
        out += &format!(
            "\t<text x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"{}\" fill=\"{}\" fill-opacity=\"{:.3}\">{}</text>\n",
            x,
            y,
            label.font_size,
            anchor,
            hex_rgb(label.color.rgba()),
            label.color.a as f64 / 255.0,
            label.text
        );
    }

    out += "</svg>\n";
    Ok(out)
}

fn hex_rgb([r, g, b, _]: [u8; 4]) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Default renderer backed by the `qrcode` and `image` crates.
#[derive(Debug, Clone, Default)]
pub struct QrcodeRenderer;

impl QrcodeRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "render")]
impl QrcodeRenderer {
    fn encode(content: &str) -> Result<ModuleGrid, RenderError> {
        let code = qrcode::QrCode::new(content.as_bytes())?;
        let width = code.width() as u32;
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        ModuleGrid::new(width, dark).ok_or(RenderError::CanvasTooLarge(width as u64))
    }

    fn render_png(grid: &ModuleGrid, options: &ResolvedRenderOptions) -> Result<Vec<u8>, RenderError> {
        use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

        let layout = compute_layout(grid.width(), options.size(), options.margin())?;
        let fg = Rgba(options.foreground().rgba());
        let mut img = RgbaImage::from_pixel(layout.canvas, layout.canvas, Rgba(options.background().rgba()));

        for y in 0..grid.width() {
            for x in 0..grid.width() {
                if !grid.is_dark(x, y) {
                    continue;
                }
                let px = layout.offset + x * layout.scale;
                let py = layout.offset + y * layout.scale;
                for dy in 0..layout.scale {
                    for dx in 0..layout.scale {
                        img.put_pixel(px + dx, py + dy, fg);
                    }
                }
            }
        }

        if let Some(path) = options.marker_asset_path() {
            Self::overlay_markers(&mut img, path, grid.width(), &layout)?;
        }
        if options.label().is_some() {
            tracing::debug!("label is not rasterized in PNG output");
        }

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Covers the three 7x7 finder patterns with the marker asset.
    fn overlay_markers(
        img: &mut image::RgbaImage,
        path: &std::path::Path,
        modules: u32,
        layout: &Layout,
    ) -> Result<(), RenderError> {
        use image::imageops::{self, FilterType};

        const FINDER: u32 = 7;
        if modules < FINDER {
            return Ok(());
        }

        let marker = image::open(path)
            .map_err(|source| RenderError::Asset { path: path.to_path_buf(), source })?
            .to_rgba8();
        let side = FINDER * layout.scale;
        let marker = imageops::resize(&marker, side, side, FilterType::Nearest);

        let near = layout.offset as i64;
        let far = (layout.offset + (modules - FINDER) * layout.scale) as i64;
        for (x, y) in [(near, near), (far, near), (near, far)] {
            imageops::overlay(img, &marker, x, y);
        }
        Ok(())
    }
}

impl Renderer for QrcodeRenderer {
    #[cfg(feature = "render")]
    fn render(
        &self,
        content: &str,
        options: &ResolvedRenderOptions,
        format: OutputFormat,
    ) -> Result<Vec<u8>, RenderError> {
        let grid = Self::encode(content)?;
        tracing::debug!(modules = grid.width(), %format, "encoded QR symbol");
        match format {
            OutputFormat::Png => Self::render_png(&grid, options),
            OutputFormat::Svg => Ok(render_svg(&grid, options)?.into_bytes()),
        }
    }

    #[cfg(not(feature = "render"))]
    fn render(
        &self,
        content: &str,
        options: &ResolvedRenderOptions,
        format: OutputFormat,
    ) -> Result<Vec<u8>, RenderError> {
        let _ = (content, options, format);
        Err(RenderError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::RenderOptionsResolver;
    use std::collections::BTreeMap;

    fn resolve(pairs: &[(&str, &str)]) -> ResolvedRenderOptions {
        let raw: BTreeMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        RenderOptionsResolver::default().resolve(&raw).unwrap()
    }

    fn checker(width: u32) -> ModuleGrid {
        let dark = (0..width * width).map(|i| i % 2 == 0).collect();
        ModuleGrid::new(width, dark).unwrap()
    }

    #[test]
    fn test_grid_rejects_wrong_length() {
        assert!(ModuleGrid::new(3, vec![true; 8]).is_none());
        assert!(!checker(3).is_dark(5, 0));
    }

    #[test]
    fn test_layout_scales_and_centres() {
        let layout = compute_layout(21, 300, 20).unwrap();
        assert_eq!(layout.scale, 14);
        assert_eq!(layout.canvas, 340);
        // 300 - 21 * 14 = 6, split evenly
        assert_eq!(layout.offset, 23);
    }

    #[test]
    fn test_layout_never_below_one_pixel_per_module() {
        let layout = compute_layout(25, 10, 0).unwrap();
        assert_eq!(layout.scale, 1);
        assert_eq!(layout.canvas, 25);
        assert_eq!(layout.offset, 0);
    }

    #[test]
    fn test_layout_rejects_oversized_canvas() {
        let err = compute_layout(21, 3_000_000_000, 0).unwrap_err();
        assert!(matches!(err, RenderError::CanvasTooLarge(3_000_000_000)));
        assert!(compute_layout(21, u32::MAX, 1000).is_err());

        // 8192 * 8192 * 4 is exactly the limit.
        assert_eq!(compute_layout(1, 8192, 0).unwrap().canvas, 8192);
        assert!(compute_layout(1, 8192, 1).is_err());
    }

    #[test]
    fn test_svg_rejects_oversized_canvas() {
        let options = resolve(&[("size", "3000000000")]);
        assert!(matches!(
            render_svg(&checker(21), &options),
            Err(RenderError::CanvasTooLarge(_))
        ));
    }

    #[test]
    fn test_svg_uses_resolved_colors() {
        let options = resolve(&[("color", "#FF5733"), ("background_color", "#00000080"), ("size", "21")]);
        let svg = render_svg(&checker(21), &options).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("fill=\"#FF5733\" fill-opacity=\"1.000\""));
        assert!(svg.contains("fill=\"#000000\" fill-opacity=\"0.502\""));
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn test_svg_label_is_escaped_and_aligned() {
        let options = resolve(&[("label_text", "A & B"), ("label_align", "right"), ("size", "21"), ("margin", "0")]);
        let svg = render_svg(&checker(21), &options).unwrap();
        assert!(svg.contains("text-anchor=\"end\""));
        assert!(svg.contains(">A &amp; B</text>"));
        // 21 canvas + default label band of 20 + 0 + 10
        assert!(svg.contains("viewBox=\"0 0 21 51\""));
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_png_output_dimensions() {
        let options = resolve(&[("size", "200"), ("margin", "8")]);
        let bytes = QrcodeRenderer::new()
            .render("https://example.com", &options, OutputFormat::Png)
            .unwrap();
        assert_eq!(&bytes[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), img.height());
        assert_eq!(img.width(), 216);
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_png_oversized_canvas_is_an_error() {
        let options = resolve(&[("size", "3000000000")]);
        let err = QrcodeRenderer::new()
            .render("https://example.com", &options, OutputFormat::Png)
            .unwrap_err();
        assert!(matches!(err, RenderError::CanvasTooLarge(3_000_000_000)));
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_missing_marker_asset_is_reported() {
        let options = resolve(&[("marker", "M1")]);
        let err = QrcodeRenderer::new()
            .render("hello", &options, OutputFormat::Png)
            .unwrap_err();
        assert!(matches!(err, RenderError::Asset { .. }));
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_marker_overlay_applied() {
        use image::{Rgba, RgbaImage};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers/marker_1.png");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(7, 7, Rgba([255, 0, 0, 255])).save(&path).unwrap();

        let resolver = RenderOptionsResolver::new(crate::config::StyleConfig {
            asset_root: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        let mut options = resolver.options();
        options.set_marker("M1").unwrap().set_margin(0).unwrap();
        let resolved = resolver.resolve_options(&options).unwrap();

        let bytes = QrcodeRenderer::new().render("hello", &resolved, OutputFormat::Png).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        let layout = compute_layout(21, 300, 0).unwrap();
        assert_eq!(img.get_pixel(layout.offset, layout.offset), &Rgba([255, 0, 0, 255]));
    }
}
