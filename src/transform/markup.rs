// src/transform/markup.rs

//! Markup compilation with minijinja.
//!
//! Every top-level template matched by the source glob is rendered to HTML.
//! Templates may `include`/`extend` files relative to the glob's base
//! directory; files whose name starts with `_` are partials and are not
//! rendered on their own.

use std::path::{Path, PathBuf};

use minijinja::{Environment, context, path_loader};

use crate::config::PathConfig;
use crate::transform::glob::{expand, static_base};
use crate::transform::{
    TransformError, TransformFuture, TransformOutput, TransformResult, TransformUnit, gzip,
    spawn_blocking_transform, write_file,
};

#[derive(Debug, Clone)]
pub struct MarkupCompileUnit {
    root: PathBuf,
    source: String,
    dest: PathBuf,
    gzip: bool,
    client_script: Option<String>,
}

impl MarkupCompileUnit {
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
            client_script: None,
        }
    }

    pub fn from_paths(root: &Path, paths: &PathConfig, gzip: bool) -> Self {
        Self::new(root, paths.templates.clone(), &paths.dist.html, gzip)
    }

    /// Insert `tag` before `</body>` of every rendered page.
    pub fn with_client_script(mut self, tag: impl Into<String>) -> Self {
        self.client_script = Some(tag.into());
        self
    }

    fn run(&self) -> TransformResult<TransformOutput> {
        let base = self.root.join(static_base(&self.source));
        let mut env = Environment::new();
        env.set_loader(path_loader(&base));

        let mut out = TransformOutput::default();
        for m in expand(&self.root, &self.source)? {
            if is_partial(&m.relative) {
                continue;
            }

            let name = m.relative.to_string_lossy().replace('\\', "/");
            let template = env
                .get_template(&name)
                .map_err(|source| TransformError::Template {
                    name: name.clone(),
                    source,
                })?;
            let mut html = template
                .render(context! { live_reload => self.client_script.is_some() })
                .map_err(|source| TransformError::Template {
                    name: name.clone(),
                    source,
                })?;
            if let Some(tag) = &self.client_script {
                html = inject_before_body_end(&html, tag);
            }

            let target = self.dest.join(&m.relative);
            write_file(&target, html.as_bytes())?;
            out.push(target.clone());
            if self.gzip {
                out.push(gzip::write_sibling(&target, html.as_bytes())?);
            }
        }
        Ok(out)
    }
}

impl TransformUnit for MarkupCompileUnit {
    fn name(&self) -> &str {
        "markup-compile"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        let unit = self.clone();
        spawn_blocking_transform(move || unit.run())
    }
}

pub(crate) fn is_partial(relative: &Path) -> bool {
    relative
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Insert `tag` before the last `</body>`, or append it when there is none.
pub fn inject_before_body_end(html: &str, tag: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => format!("{}{}{}", &html[..idx], tag, &html[idx..]),
        None => format!("{html}{tag}"),
    }
}
