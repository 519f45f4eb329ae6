// src/transform/fonts.rs

use std::path::{Path, PathBuf};

use crate::config::PathConfig;
use crate::transform::glob::expand;
use crate::transform::{
    TransformFuture, TransformOutput, TransformResult, TransformUnit, copy_file,
    spawn_blocking_transform,
};

/// Copies font files into the output tree, keeping their layout below the
/// source glob's base directory.
#[derive(Debug, Clone)]
pub struct FontCopyUnit {
    root: PathBuf,
    source: String,
    dest: PathBuf,
}

impl FontCopyUnit {
    pub fn new(root: impl Into<PathBuf>, source: impl Into<String>, dest: impl AsRef<Path>) -> Self {
        let root = root.into();
        let dest = root.join(dest);
        Self {
            root,
            source: source.into(),
            dest,
        }
    }

    pub fn from_paths(root: &Path, paths: &PathConfig) -> Self {
        Self::new(root, paths.fonts.clone(), &paths.dist.fonts)
    }

    fn run(&self) -> TransformResult<TransformOutput> {
        let mut out = TransformOutput::default();
        for m in expand(&self.root, &self.source)? {
            let target = self.dest.join(&m.relative);
            copy_file(&m.path, &target)?;
            out.push(target);
        }
        Ok(out)
    }
}

impl TransformUnit for FontCopyUnit {
    fn name(&self) -> &str {
        "font-copy"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        let unit = self.clone();
        spawn_blocking_transform(move || unit.run())
    }
}
