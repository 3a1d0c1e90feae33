//! Artifact Cache
//!
//! Cached pipeline outputs are named after digests of the inputs that
//! produced them, so a file that exists under the expected name is reusable.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

/// SHA-256 digest identifying a set of inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex characters, used in file names
    pub fn short(&self) -> String {
        self.to_string()[..16].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Digests of the inputs of one reduction run
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactKey {
    /// Embedding source and reference corpus
    similarity: Fingerprint,
    /// Additionally the threshold
    reduced: Fingerprint,
}

impl ArtifactKey {
    /// Key for an embedding file on disk
    pub fn for_source_file(source: &Path, corpus: &[String], threshold: f32) -> io::Result<Self> {
        Ok(Self::new(&source_identity(source)?, corpus, threshold))
    }

    /// Key from an explicit source identity string
    pub fn new(source_identity: &str, corpus: &[String], threshold: f32) -> Self {
        let mut words: Vec<&str> = corpus.iter().map(String::as_str).collect();
        words.sort_unstable();
        words.dedup();

        let mut hasher = Sha256::new();
        hasher.update(b"source\0");
        hasher.update(source_identity.as_bytes());
        hasher.update(b"\0corpus\0");
        for word in &words {
            hasher.update(word.as_bytes());
            hasher.update(b"\0");
        }
        let similarity = Fingerprint(hasher.clone().finalize().into());

        hasher.update(b"threshold\0");
        hasher.update(threshold.to_bits().to_le_bytes());
        let reduced = Fingerprint(hasher.finalize().into());

        Self {
            similarity,
            reduced,
        }
    }

    pub fn similarity(&self) -> Fingerprint {
        self.similarity
    }

    pub fn reduced(&self) -> Fingerprint {
        self.reduced
    }
}

/// Locations of cached artifacts under one directory
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub max_similarity: PathBuf,
    pub reduced_store: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, key: &ArtifactKey) -> Self {
        Self {
            max_similarity: dir.join(format!("maxsim-{}.bin", key.similarity.short())),
            reduced_store: dir.join(format!("reduced-{}.w2v", key.reduced.short())),
        }
    }
}

/// Path plus size and modification time; changes when the file is replaced
pub fn source_identity(path: &Path) -> io::Result<String> {
    let canonical = fs::canonicalize(path)?;
    let metadata = fs::metadata(&canonical)?;
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(format!(
        "{}|{}|{}",
        canonical.display(),
        metadata.len(),
        modified
    ))
}

/// Write a file through a temporary sibling and rename it into place
pub fn write_atomic<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
