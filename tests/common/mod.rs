#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use tempfile::TempDir;
use walkdir::WalkDir;

pub use assetdag_test_utils::builders;
pub use assetdag_test_utils::{init_tracing, with_timeout};

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

pub fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

/// A small project in the standard layout: two fonts, two icons, one page
/// with a partial, one stylesheet importing the sprite partial, two scripts.
pub fn standard_project() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    write(root, "src/app/fonts/roboto.woff", b"woff-bytes");
    write(root, "src/app/fonts/icons/icons.ttf", b"ttf-bytes");

    // minifyImg writes these to compressed/ico, where the sprite picks them up.
    write(
        root,
        "src/app/img/initial/ico/arrow.svg",
        r#"<?xml version="1.0"?>
<!-- arrow -->
<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20" viewBox="0 0 10 20">
  <path d="M0 0L10 10"/>
</svg>"#,
    );
    write(
        root,
        "src/app/img/initial/ico/close.svg",
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><path d="M0 0"/></svg>"#,
    );

    write(
        root,
        "src/app/templates/_layout.html",
        "<html><body>{% block content %}{% endblock %}</body></html>",
    );
    write(
        root,
        "src/app/templates/index.html",
        r#"{% extends "_layout.html" %}{% block content %}<h1>Home</h1>{% endblock %}"#,
    );

    write(
        root,
        "src/app/styles/main.scss",
        "@import \"partials/svg-sprite\";\n$accent: #ff0000;\nbody { color: $accent; }\n",
    );

    write(root, "src/app/js/jslibs/a.js", "var a = 1");
    write(root, "src/app/js/app.js", "console.log(a)");

    tmp
}

/// Relative path -> bytes for every file under `dir`.
pub fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (rel, std::fs::read(e.path()).unwrap())
        })
        .collect()
}
