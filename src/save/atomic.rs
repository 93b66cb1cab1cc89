use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// write-to-sibling, fsync, rename. a crash leaves either the old file
/// or the new one, never a torn write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = sibling(path);
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}

/// atomic write with optional gzip compression
pub fn write_atomic_maybe_gz(path: &Path, bytes: &[u8], gzip: bool) -> std::io::Result<()> {
    if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes)?;
        write_atomic(path, &encoder.finish()?)
    } else {
        write_atomic(path, bytes)
    }
}

/// read a file that may or may not be gzipped; the magic bytes decide
pub fn read_transparent(path: &Path) -> std::io::Result<Vec<u8>> {
    let raw = std::fs::read(path)?;
    if raw.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(raw)
    }
}

fn sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_plain_and_gzipped() {
        let dir = tempfile::tempdir().unwrap();
        let payload = b"{\"hello\": \"world\"}".to_vec();
        for gzip in [false, true] {
            let path = dir.path().join(format!("data-{}.json", gzip));
            write_atomic_maybe_gz(&path, &payload, gzip).unwrap();
            assert_eq!(read_transparent(&path).unwrap(), payload);
        }
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.bin");
        write_atomic(&path, b"abc").unwrap();
        let names = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["x.bin".to_string()]);
    }
}
