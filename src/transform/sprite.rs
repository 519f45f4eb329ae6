// src/transform/sprite.rs

//! SVG sprite synthesis.
//!
//! Icons are stacked vertically into one SVG document. A stylesheet partial
//! describes the sprite: `.svg-common` carries the background image and one
//! class per icon carries its size and offset. The sprite is also copied into
//! the output tree next to the compiled stylesheets.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::PathConfig;
use crate::transform::glob::{GlobMatch, expand};
use crate::transform::{
    TransformError, TransformFuture, TransformOutput, TransformResult, TransformUnit, io_err,
    spawn_blocking_transform, write_file,
};

/// Class shared by every sprite icon.
pub const COMMON_CLASS: &str = "svg-common";

static ROOT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<svg\b([^>]*)>").expect("static regex"));
static WIDTH: LazyLock<Regex> = LazyLock::new(|| attr_regex("width"));
static HEIGHT: LazyLock<Regex> = LazyLock::new(|| attr_regex("height"));
static VIEW_BOX: LazyLock<Regex> = LazyLock::new(|| attr_regex("viewBox"));

fn attr_regex(name: &str) -> Regex {
    Regex::new(&format!(r#"(?:^|\s){name}\s*=\s*["']([^"']*)["']"#)).expect("static regex")
}

/// One parsed icon.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteIcon {
    pub class: String,
    pub width: f64,
    pub height: f64,
    pub view_box: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct SvgSpriteUnit {
    root: PathBuf,
    source: String,
    sprite: PathBuf,
    stylesheet: PathBuf,
    sprite_url: String,
    dist_dir: PathBuf,
}

impl SvgSpriteUnit {
    pub fn from_paths(root: &Path, paths: &PathConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            source: paths.minified_svg.clone(),
            sprite: root.join(&paths.sprite_svg),
            stylesheet: root.join(&paths.sprite_stylesheet),
            sprite_url: paths.sprite_url.clone(),
            dist_dir: root.join(&paths.dist.svg_sprite),
        }
    }

    fn run(&self) -> TransformResult<TransformOutput> {
        let mut icons = Vec::new();
        for m in expand(&self.root, &self.source)? {
            icons.push(load_icon(&m)?);
        }

        let document = render_sprite(&icons);
        let partial = render_stylesheet(&icons, &self.sprite_url);

        let mut out = TransformOutput::default();
        write_file(&self.sprite, document.as_bytes())?;
        out.push(self.sprite.clone());
        write_file(&self.stylesheet, partial.as_bytes())?;
        out.push(self.stylesheet.clone());

        let file_name = self
            .sprite
            .file_name()
            .ok_or_else(|| TransformError::Sprite {
                path: self.sprite.clone(),
                message: "sprite path has no file name".into(),
            })?;
        let copy = self.dist_dir.join(file_name);
        write_file(&copy, document.as_bytes())?;
        out.push(copy);

        Ok(out)
    }
}

impl TransformUnit for SvgSpriteUnit {
    fn name(&self) -> &str {
        "svg-sprite-build"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        let unit = self.clone();
        spawn_blocking_transform(move || unit.run())
    }
}

fn load_icon(m: &GlobMatch) -> TransformResult<SpriteIcon> {
    let text = std::fs::read_to_string(&m.path).map_err(io_err(&m.path))?;
    parse_icon(&class_name(&m.relative), &text).map_err(|message| TransformError::Sprite {
        path: m.path.clone(),
        message,
    })
}

/// CSS class for an icon: its path below the glob base without extension,
/// with separators and unsupported characters turned into `-`.
pub fn class_name(relative: &Path) -> String {
    let stem = relative.with_extension("");
    let raw = stem.to_string_lossy();
    let mut class: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect();
    if class.starts_with(|c: char| c.is_ascii_digit()) {
        class.insert_str(0, "svg-");
    }
    class
}

/// Parse the root element of an SVG document.
pub fn parse_icon(class: &str, text: &str) -> Result<SpriteIcon, String> {
    let caps = ROOT_TAG
        .captures(text)
        .ok_or_else(|| "no <svg> root element".to_string())?;
    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let open_end = caps.get(0).map_or(0, |m| m.end());

    let body = if attrs.trim_end().ends_with('/') {
        String::new()
    } else {
        let close = text
            .rfind("</svg>")
            .ok_or_else(|| "missing closing </svg>".to_string())?;
        if close < open_end {
            return Err("missing closing </svg>".into());
        }
        text[open_end..close].trim().to_string()
    };

    let view_box = capture(&VIEW_BOX, attrs);
    let from_view_box = view_box.as_deref().and_then(view_box_size);

    let width = capture(&WIDTH, attrs)
        .and_then(|w| parse_length(&w))
        .or(from_view_box.map(|(w, _)| w))
        .ok_or_else(|| "no usable width or viewBox".to_string())?;
    let height = capture(&HEIGHT, attrs)
        .and_then(|h| parse_length(&h))
        .or(from_view_box.map(|(_, h)| h))
        .ok_or_else(|| "no usable height or viewBox".to_string())?;

    Ok(SpriteIcon {
        class: class.to_string(),
        width,
        height,
        view_box: view_box.unwrap_or_else(|| format!("0 0 {} {}", num(width), num(height))),
        body,
    })
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim().trim_end_matches("px");
    value.parse::<f64>().ok().filter(|v| *v > 0.0)
}

fn view_box_size(view_box: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = view_box
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    match parts.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
        _ => None,
    }
}

/// Integral values print without a fraction.
fn num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Stack `icons` vertically into one SVG document.
pub fn render_sprite(icons: &[SpriteIcon]) -> String {
    let width = icons.iter().map(|i| i.width).fold(0.0, f64::max);
    let height: f64 = icons.iter().map(|i| i.height).sum();

    let mut doc = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height),
    );
    let mut y = 0.0;
    for icon in icons {
        let _ = write!(
            doc,
            r#"<svg x="0" y="{}" width="{}" height="{}" viewBox="{}">{}</svg>"#,
            num(y),
            num(icon.width),
            num(icon.height),
            icon.view_box,
            icon.body
        );
        y += icon.height;
    }
    doc.push_str("</svg>\n");
    doc
}

/// Stylesheet partial positioning each icon inside the sprite.
pub fn render_stylesheet(icons: &[SpriteIcon], sprite_url: &str) -> String {
    let mut css = format!(
        ".{COMMON_CLASS} {{\n  background-image: url(\"{sprite_url}\");\n  background-repeat: no-repeat;\n}}\n"
    );
    let mut y = 0.0;
    for icon in icons {
        let offset = if y == 0.0 { "0".to_string() } else { format!("-{}px", num(y)) };
        let _ = write!(
            css,
            "\n.{} {{\n  width: {}px;\n  height: {}px;\n  background-position: 0 {};\n}}\n",
            icon.class,
            num(icon.width),
            num(icon.height),
            offset
        );
        y += icon.height;
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_from_attributes_or_view_box() {
        let a = parse_icon("a", r#"<svg width="16px" height="12"><path/></svg>"#).unwrap();
        assert_eq!((a.width, a.height), (16.0, 12.0));
        assert_eq!(a.body, "<path/>");

        let b = parse_icon("b", r#"<svg viewBox="0 0 24 20"><g/></svg>"#).unwrap();
        assert_eq!((b.width, b.height), (24.0, 20.0));
        assert_eq!(b.view_box, "0 0 24 20");
    }

    #[test]
    fn rejects_icon_without_size() {
        assert!(parse_icon("x", "<svg><path/></svg>").is_err());
        assert!(parse_icon("x", "<div/>").is_err());
    }

    #[test]
    fn stroke_width_is_not_width() {
        let icon = parse_icon("c", r#"<svg stroke-width="3" viewBox="0 0 8 8"></svg>"#).unwrap();
        assert_eq!(icon.width, 8.0);
    }

    #[test]
    fn class_names_are_sanitized() {
        assert_eq!(class_name(Path::new("social/fb.svg")), "social-fb");
        assert_eq!(class_name(Path::new("arrow left.svg")), "arrow-left");
        assert_eq!(class_name(Path::new("1up.svg")), "svg-1up");
    }

    #[test]
    fn stylesheet_offsets_follow_stacking_order() {
        let icons = vec![
            parse_icon("a", r#"<svg width="10" height="10"></svg>"#).unwrap(),
            parse_icon("b", r#"<svg width="20" height="5"></svg>"#).unwrap(),
        ];
        let css = render_stylesheet(&icons, "sprite/svg-sprite.svg");
        assert!(css.contains(".svg-common {"));
        assert!(css.contains(".a {\n  width: 10px;\n  height: 10px;\n  background-position: 0 0;"));
        assert!(css.contains(".b {\n  width: 20px;\n  height: 5px;\n  background-position: 0 -10px;"));

        let doc = render_sprite(&icons);
        assert!(doc.contains(r#"width="20" height="15""#));
        assert!(doc.contains(r#"<svg x="0" y="10" width="20" height="5""#));
    }
}
