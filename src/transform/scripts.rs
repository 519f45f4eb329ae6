// src/transform/scripts.rs

//! Script bundling: ordered concatenation with `;` between sources, then
//! an optional pass through an external minifier (`esbuild --minify`) that
//! reads the bundle on stdin and writes the result to stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::warn;

use crate::config::PathConfig;
use crate::transform::glob::expand;
use crate::transform::{
    TransformError, TransformFuture, TransformOutput, TransformResult, TransformUnit, gzip,
    io_err, spawn_blocking_transform, write_file,
};

/// Placed between concatenated sources.
pub const SEPARATOR: &str = ";";

#[derive(Debug, Clone)]
pub struct ScriptBundleUnit {
    root: PathBuf,
    sources: Vec<String>,
    target: PathBuf,
    gzip: bool,
    minifier: Option<String>,
}

impl ScriptBundleUnit {
    pub fn new(
        root: impl Into<PathBuf>,
        sources: Vec<String>,
        target: impl AsRef<Path>,
        gzip: bool,
    ) -> Self {
        let root = root.into();
        let target = root.join(target);
        Self {
            root,
            sources,
            target,
            gzip,
            minifier: None,
        }
    }

    /// Pipe the bundle through `command` (an esbuild-compatible CLI).
    pub fn with_minifier(mut self, command: impl Into<String>) -> Self {
        self.minifier = Some(command.into());
        self
    }

    pub fn from_paths(root: &Path, paths: &PathConfig, gzip: bool) -> Self {
        let target = Path::new(&paths.dist.js).join(&paths.dist.script_bundle);
        Self::new(root, paths.scripts.clone(), target, gzip)
    }

    /// Read every source in glob order; files matched by several globs are
    /// included once, at their first position.
    fn collect_sources(&self) -> TransformResult<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = Vec::new();
        for pattern in &self.sources {
            for m in expand(&self.root, pattern)? {
                if !files.contains(&m.path) {
                    files.push(m.path);
                }
            }
        }
        if files.is_empty() {
            return Err(TransformError::NoInput(self.sources.join(", ")));
        }
        Ok(files)
    }

    fn run(&self) -> TransformResult<TransformOutput> {
        let files = self.collect_sources()?;

        let mut parts = Vec::with_capacity(files.len());
        for file in &files {
            let text = std::fs::read_to_string(file).map_err(io_err(file))?;
            parts.push(text);
        }
        let mut bundle = parts.join(SEPARATOR);
        if let Some(command) = &self.minifier {
            if let Some(minified) = minify(command, &bundle)? {
                bundle = minified;
            }
        }

        let mut out = TransformOutput::default();
        write_file(&self.target, bundle.as_bytes())?;
        out.push(self.target.clone());
        if self.gzip {
            out.push(gzip::write_sibling(&self.target, bundle.as_bytes())?);
        }
        Ok(out)
    }
}

/// Run `command --minify --loader=js` over `source`.
///
/// A minifier that is not installed yields `Ok(None)` and the bundle stays
/// as concatenated; a minifier that runs and fails is an error.
fn minify(command: &str, source: &str) -> TransformResult<Option<String>> {
    let fail = |message: String| TransformError::Minify {
        command: command.to_string(),
        message,
    };

    let child = Command::new(command)
        .arg("--minify")
        .arg("--loader=js")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match child {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(minifier = %command, "minifier not found; writing the bundle unminified");
            return Ok(None);
        }
        Err(e) => return Err(fail(e.to_string())),
    };

    // Fed from a helper thread so a large bundle cannot deadlock on full pipes.
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| fail("stdin not captured".into()))?;
    let input = source.as_bytes().to_vec();
    let feeder = std::thread::spawn(move || stdin.write_all(&input));

    let output = child.wait_with_output().map_err(|e| fail(e.to_string()))?;
    let fed = feeder.join();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fail(format!("{}: {}", output.status, stderr.trim())));
    }
    match fed {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(fail(format!("writing stdin: {e}"))),
        Err(_) => return Err(fail("stdin writer panicked".into())),
    }
    let minified = String::from_utf8(output.stdout).map_err(|e| fail(e.to_string()))?;
    Ok(Some(minified))
}

impl TransformUnit for ScriptBundleUnit {
    fn name(&self) -> &str {
        "script-bundle"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        let unit = self.clone();
        spawn_blocking_transform(move || unit.run())
    }
}
