// src/transform/gzip.rs

//! Precompressed `.gz` siblings for text outputs.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::transform::{TransformResult, io_err, write_file};

/// gzip level used for precompressed outputs.
pub const GZIP_LEVEL: u32 = 9;

/// Compress `bytes` at [`GZIP_LEVEL`].
pub fn gzip_bytes(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(GZIP_LEVEL));
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Path of the gzip sibling for `path` (`app.js` -> `app.js.gz`).
pub fn sibling_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".gz");
    PathBuf::from(os)
}

/// Write `bytes` gzip-compressed next to `path` and return the sibling path.
pub fn write_sibling(path: &Path, bytes: &[u8]) -> TransformResult<PathBuf> {
    let target = sibling_path(path);
    let compressed = gzip_bytes(bytes).map_err(io_err(&target))?;
    write_file(&target, &compressed)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn sibling_appends_gz_extension() {
        assert_eq!(
            sibling_path(Path::new("dist/css/main.css")),
            PathBuf::from("dist/css/main.css.gz")
        );
    }

    #[test]
    fn gzip_output_is_deterministic_and_decodes() {
        let input = b"body{color:red}".repeat(20);
        let a = gzip_bytes(&input).unwrap();
        let b = gzip_bytes(&input).unwrap();
        assert_eq!(a, b);

        let mut decoded = Vec::new();
        GzDecoder::new(&a[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, input);
    }
}
