// src/transform/images.rs

//! Image compression.
//!
//! PNG sources are re-encoded with the best deflate setting, JPEG sources at
//! a configured quality, SVG sources are stripped of comments, prolog and
//! whitespace between tags. Anything else is copied unchanged. A result that
//! is not smaller than its source is discarded in favour of the original
//! bytes.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use tracing::debug;

use crate::config::{ImageSection, PathConfig};
use crate::transform::glob::expand;
use crate::transform::{
    TransformError, TransformFuture, TransformOutput, TransformResult, TransformUnit, copy_file,
    io_err, spawn_blocking_transform, write_file,
};

static SVG_PROLOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>|<!DOCTYPE[^>]*>").expect("static regex"));
static SVG_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static SVG_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").expect("static regex"));

#[derive(Debug, Clone)]
pub struct ImageCompressUnit {
    root: PathBuf,
    source: String,
    compressed_dir: PathBuf,
    bkg_source: String,
    bkg_dest: PathBuf,
    jpeg_quality: u8,
    skip_unchanged: bool,
}

impl ImageCompressUnit {
    pub fn from_paths(root: &Path, paths: &PathConfig, images: &ImageSection) -> Self {
        Self {
            root: root.to_path_buf(),
            source: paths.initial_img.clone(),
            compressed_dir: root.join(&paths.compressed_img),
            bkg_source: paths.compressed_img_bkg.clone(),
            bkg_dest: root.join(&paths.dist.bkg_img),
            jpeg_quality: images.jpeg_quality,
            skip_unchanged: images.skip_unchanged,
        }
    }

    fn run(&self) -> TransformResult<TransformOutput> {
        let mut out = TransformOutput::default();

        for m in expand(&self.root, &self.source)? {
            let target = self.compressed_dir.join(&m.relative);
            if self.skip_unchanged && is_up_to_date(&m.path, &target) {
                debug!(path = ?m.path, "unchanged; skipping");
                continue;
            }

            let bytes = std::fs::read(&m.path).map_err(io_err(&m.path))?;
            let compressed = compress(&m.path, &bytes, self.jpeg_quality)?;
            debug!(
                path = ?m.path,
                before = bytes.len(),
                after = compressed.len(),
                "compressed image"
            );
            write_file(&target, &compressed)?;
            out.push(target);
        }

        for m in expand(&self.root, &self.bkg_source)? {
            let target = self.bkg_dest.join(&m.relative);
            copy_file(&m.path, &target)?;
            out.push(target);
        }

        Ok(out)
    }
}

impl TransformUnit for ImageCompressUnit {
    fn name(&self) -> &str {
        "image-compress"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        let unit = self.clone();
        spawn_blocking_transform(move || unit.run())
    }
}

/// True when `target` exists and is at least as new as `source`.
fn is_up_to_date(source: &Path, target: &Path) -> bool {
    let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(source), modified(target)) {
        (Some(src), Some(dst)) => dst >= src,
        _ => false,
    }
}

/// Compress one image, choosing the codec from the file extension.
pub fn compress(path: &Path, bytes: &[u8], jpeg_quality: u8) -> TransformResult<Vec<u8>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let encoded = match ext.as_deref() {
        Some("png") => Some(encode_png(path, bytes)?),
        Some("jpg") | Some("jpeg") => Some(encode_jpeg(path, bytes, jpeg_quality)?),
        Some("svg") => std::str::from_utf8(bytes)
            .ok()
            .map(|text| minify_svg(text).into_bytes()),
        _ => None,
    };

    Ok(match encoded {
        Some(smaller) if smaller.len() < bytes.len() => smaller,
        _ => bytes.to_vec(),
    })
}

fn decode(path: &Path, bytes: &[u8], format: ImageFormat) -> TransformResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, format).map_err(|source| TransformError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn encode_png(path: &Path, bytes: &[u8]) -> TransformResult<Vec<u8>> {
    let img = decode(path, bytes, ImageFormat::Png)?;
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|source| TransformError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(out)
}

fn encode_jpeg(path: &Path, bytes: &[u8], quality: u8) -> TransformResult<Vec<u8>> {
    let img = decode(path, bytes, ImageFormat::Jpeg)?;
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|source| TransformError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(out)
}

/// Strip prolog, doctype, comments and inter-tag whitespace from an SVG.
pub fn minify_svg(text: &str) -> String {
    let text = SVG_PROLOG.replace_all(text, "");
    let text = SVG_COMMENT.replace_all(&text, "");
    let text = SVG_GAP.replace_all(&text, "><");
    text.trim().to_string()
}
