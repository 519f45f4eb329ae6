// src/transform/styles.rs

//! Stylesheet compilation with `grass` (SCSS to compressed CSS).

use std::path::{Path, PathBuf};

use crate::config::PathConfig;
use crate::transform::glob::{expand, static_base};
use crate::transform::markup::is_partial;
use crate::transform::{
    TransformError, TransformFuture, TransformOutput, TransformResult, TransformUnit, gzip,
    spawn_blocking_transform, write_file,
};

#[derive(Debug, Clone)]
pub struct StylesheetCompileUnit {
    root: PathBuf,
    source: String,
    dest: PathBuf,
    gzip: bool,
}

impl StylesheetCompileUnit {
    pub fn new(
        root: impl Into<PathBuf>,
        source: impl Into<String>,
        dest: impl AsRef<Path>,
        gzip: bool,
    ) -> Self {
        let root = root.into();
        let dest = root.join(dest);
        Self {
            root,
            source: source.into(),
            dest,
            gzip,
        }
    }

    pub fn from_paths(root: &Path, paths: &PathConfig, gzip: bool) -> Self {
        Self::new(root, paths.styles.clone(), &paths.dist.css, gzip)
    }

    fn run(&self) -> TransformResult<TransformOutput> {
        let load_path = self.root.join(static_base(&self.source));
        let options = grass::Options::default()
            .style(grass::OutputStyle::Compressed)
            .load_path(&load_path);

        let mut out = TransformOutput::default();
        for m in expand(&self.root, &self.source)? {
            if is_partial(&m.relative) {
                continue;
            }

            let css = grass::from_path(&m.path, &options).map_err(|e| {
                TransformError::Stylesheet {
                    path: m.path.clone(),
                    message: e.to_string(),
                }
            })?;

            let target = self.dest.join(m.relative.with_extension("css"));
            write_file(&target, css.as_bytes())?;
            out.push(target.clone());
            if self.gzip {
                out.push(gzip::write_sibling(&target, css.as_bytes())?);
            }
        }
        Ok(out)
    }
}

impl TransformUnit for StylesheetCompileUnit {
    fn name(&self) -> &str {
        "stylesheet-compile"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        let unit = self.clone();
        spawn_blocking_transform(move || unit.run())
    }
}
