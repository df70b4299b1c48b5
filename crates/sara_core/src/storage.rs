use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SaraError};
use crate::index::FlatIndex;
use crate::model::Researcher;

// Little-endian layout: magic, format version (u32), dim (u32), count (u32),
// then count * dim f32 values.
const MAGIC: [u8; 8] = *b"SARAFLAT";
const FORMAT_VERSION: u32 = 1;

/// Companion metadata location for an index path: `uam.index` →
/// `uam.index.meta.json`.
pub fn metadata_path(index_path: &Path) -> PathBuf {
    let mut name = index_path.as_os_str().to_os_string();
    name.push(".meta.json");
    PathBuf::from(name)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> SaraError {
    SaraError::CorruptIndex {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Persist the (index, metadata) pair as a unit.
///
/// Both artifacts are written to temporary siblings first and renamed into
/// place only after both writes succeed, so a failed rebuild never clobbers
/// a previously good pair. The instant between the two renames is the one
/// window where the pair on disk can disagree; a reader hitting it sees a
/// count mismatch and gets `CorruptIndex` rather than wrong answers.
pub fn save_index(index: &FlatIndex, metadata: &[Researcher], path: &Path) -> Result<()> {
    if index.len() != metadata.len() {
        return Err(corrupt(
            path,
            format!(
                "vector count {} does not match metadata count {}",
                index.len(),
                metadata.len()
            ),
        ));
    }

    let meta_path = metadata_path(path);
    let tmp_index = tmp_sibling(path);
    let tmp_meta = tmp_sibling(&meta_path);

    if let Err(err) = write_vectors(&tmp_index, index) {
        let _ = fs::remove_file(&tmp_index);
        return Err(err);
    }
    if let Err(err) = write_metadata(&tmp_meta, metadata) {
        let _ = fs::remove_file(&tmp_index);
        let _ = fs::remove_file(&tmp_meta);
        return Err(err);
    }

    fs::rename(&tmp_index, path)?;
    fs::rename(&tmp_meta, &meta_path)?;

    debug!(
        records = metadata.len(),
        dim = index.dim(),
        path = %path.display(),
        "index pair saved"
    );
    Ok(())
}

/// Load a persisted pair, re-asserting the positional invariant.
pub fn load_index(path: &Path) -> Result<(FlatIndex, Vec<Researcher>)> {
    let meta_path = metadata_path(path);
    if !path.exists() || !meta_path.exists() {
        return Err(SaraError::IndexNotFound {
            path: path.to_path_buf(),
        });
    }

    let index = read_vectors(path)?;
    let metadata = read_metadata(path, &meta_path)?;

    if index.len() != metadata.len() {
        return Err(corrupt(
            path,
            format!(
                "vector count {} does not match metadata count {}",
                index.len(),
                metadata.len()
            ),
        ));
    }

    Ok((index, metadata))
}

fn write_vectors(path: &Path, index: &FlatIndex) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    writer.write_all(&(index.dim() as u32).to_le_bytes())?;
    writer.write_all(&(index.len() as u32).to_le_bytes())?;
    for vector in index.vectors() {
        for value in vector {
            writer.write_all(&value.to_le_bytes())?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn write_metadata(path: &Path, metadata: &[Researcher]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, metadata)?;
    writer.flush()?;
    Ok(())
}

fn read_vectors(path: &Path) -> Result<FlatIndex> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    reader
        .read_exact(&mut magic)
        .map_err(|_| corrupt(path, "file too short for header"))?;
    if magic != MAGIC {
        return Err(corrupt(path, "bad magic, not a SARA index file"));
    }

    let version = read_u32(&mut reader, path)?;
    if version != FORMAT_VERSION {
        return Err(corrupt(
            path,
            format!("unsupported format version {version}, expected {FORMAT_VERSION}"),
        ));
    }

    let dim = read_u32(&mut reader, path)? as usize;
    let count = read_u32(&mut reader, path)? as usize;
    if dim == 0 {
        return Err(corrupt(path, "zero vector dimension"));
    }

    let payload_len = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt(path, "vector payload size overflows"))?;
    let mut payload = vec![0u8; payload_len];
    reader
        .read_exact(&mut payload)
        .map_err(|_| corrupt(path, format!("truncated payload, expected {count} vectors of dim {dim}")))?;

    let mut trailing = [0u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(corrupt(path, "trailing bytes after vector payload"));
    }

    let mut vectors = Vec::with_capacity(count);
    for chunk in payload.chunks_exact(dim * 4) {
        let vector: Vec<f32> = chunk
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        vectors.push(vector);
    }

    Ok(FlatIndex::from_vectors(dim, vectors))
}

fn read_metadata(index_path: &Path, meta_path: &Path) -> Result<Vec<Researcher>> {
    let file = File::open(meta_path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|err| corrupt(index_path, format!("invalid metadata json: {err}")))
}

fn read_u32(reader: &mut impl Read, path: &Path) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| corrupt(path, "file too short for header"))?;
    Ok(u32::from_le_bytes(buf))
}
