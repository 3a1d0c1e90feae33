//! Max-Similarity Buffer File
//!
//! Memory-mapped output of the reduction: one `f32` per vocabulary row.
//! Progress is recorded in the header after every flushed wave so an
//! interrupted run resumes where it stopped.
//!
//! ```text
//! ┌─────────┬─────────┬──────────┬────────────────┬──────────────┬──────────┐
//! │  Magic  │ Version │   Rows   │ Completed rows │ Fingerprint  │ Reserved │
//! │ 4 bytes │ 4 bytes │ 8 bytes  │    8 bytes     │   32 bytes   │ 8 bytes  │
//! └─────────┴─────────┴──────────┴────────────────┴──────────────┴──────────┘
//! followed by rows × f32, little-endian
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut, MmapOptions};
use tracing::{debug, warn};

use super::artifacts::Fingerprint;
use crate::error::{Error, ReductionStage, Result};

const MAGIC: &[u8; 4] = b"EMXS";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 64;
const BYTES_PER_F32: usize = 4;

const ROWS_OFFSET: usize = 8;
const COMPLETED_OFFSET: usize = 16;
const FINGERPRINT_OFFSET: usize = 24;

#[derive(Debug, Clone, Copy)]
struct Header {
    rows: u64,
    completed: u64,
    fingerprint: Fingerprint,
}

impl Header {
    fn encode(&self, buf: &mut [u8]) {
        buf[..HEADER_SIZE].fill(0);
        buf[0..4].copy_from_slice(MAGIC);
        buf[4..8].copy_from_slice(&VERSION.to_le_bytes());
        buf[ROWS_OFFSET..ROWS_OFFSET + 8].copy_from_slice(&self.rows.to_le_bytes());
        buf[COMPLETED_OFFSET..COMPLETED_OFFSET + 8].copy_from_slice(&self.completed.to_le_bytes());
        buf[FINGERPRINT_OFFSET..FINGERPRINT_OFFSET + 32].copy_from_slice(self.fingerprint.as_bytes());
    }

    fn decode(buf: &[u8]) -> std::result::Result<Self, String> {
        if buf.len() < HEADER_SIZE {
            return Err("file shorter than header".to_string());
        }
        if &buf[0..4] != MAGIC {
            return Err("invalid magic".to_string());
        }
        let version = u32::from_le_bytes(read_array(buf, 4));
        if version != VERSION {
            return Err(format!("unsupported version {version}"));
        }
        let header = Self {
            rows: u64::from_le_bytes(read_array(buf, ROWS_OFFSET)),
            completed: u64::from_le_bytes(read_array(buf, COMPLETED_OFFSET)),
            fingerprint: Fingerprint::from_bytes(read_array(buf, FINGERPRINT_OFFSET)),
        };
        let expected_len = HEADER_SIZE as u64 + header.rows * BYTES_PER_F32 as u64;
        if buf.len() as u64 != expected_len {
            return Err(format!(
                "length {} does not match {} rows",
                buf.len(),
                header.rows
            ));
        }
        if header.completed > header.rows {
            return Err("completed rows exceed total rows".to_string());
        }
        Ok(header)
    }
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

fn decode_values(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Writable, resumable max-similarity buffer
#[derive(Debug)]
pub struct MaxSimilarityFile {
    path: PathBuf,
    mmap: MmapMut,
    header: Header,
}

impl MaxSimilarityFile {
    /// Open an unfinished buffer for the same inputs, or start a new one
    pub fn create_or_resume(path: &Path, rows: usize, fingerprint: Fingerprint) -> Result<Self> {
        if path.exists() {
            match Self::resume(path, rows, fingerprint) {
                Ok(file) => return Ok(file),
                Err(reason) => warn!(
                    "Discarding partial buffer {}: {}",
                    path.display(),
                    reason
                ),
            }
        }
        Self::create(path, rows, fingerprint)
    }

    fn resume(path: &Path, rows: usize, fingerprint: Fingerprint) -> std::result::Result<Self, String> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| e.to_string())?;
        let mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|e| e.to_string())?;

        let header = Header::decode(&mmap)?;
        if header.rows != rows as u64 {
            return Err(format!("built for {} rows, need {}", header.rows, rows));
        }
        if header.fingerprint != fingerprint {
            return Err("built from different inputs".to_string());
        }

        debug!(
            "Resuming {} at row {}/{}",
            path.display(),
            header.completed,
            header.rows
        );
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            header,
        })
    }

    fn create(path: &Path, rows: usize, fingerprint: Fingerprint) -> Result<Self> {
        let exhausted = |stage, e| Error::exhausted(stage, None, e);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| exhausted(ReductionStage::AllocateBuffer, e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| exhausted(ReductionStage::AllocateBuffer, e))?;
        file.set_len((HEADER_SIZE + rows * BYTES_PER_F32) as u64)
            .map_err(|e| exhausted(ReductionStage::AllocateBuffer, e))?;

        let mut mmap = unsafe { MmapOptions::new().map_mut(&file) }
            .map_err(|e| exhausted(ReductionStage::MapBuffer, e))?;

        let header = Header {
            rows: rows as u64,
            completed: 0,
            fingerprint,
        };
        header.encode(&mut mmap);
        mmap.flush_range(0, HEADER_SIZE)
            .map_err(|e| exhausted(ReductionStage::Flush, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            header,
        })
    }

    pub fn rows(&self) -> usize {
        self.header.rows as usize
    }

    /// Rows already computed and flushed
    pub fn completed_rows(&self) -> usize {
        self.header.completed as usize
    }

    pub fn is_complete(&self) -> bool {
        self.header.completed == self.header.rows
    }

    /// Copy values for rows `start..start + values.len()` into the map
    pub fn write_rows(&mut self, start: usize, values: &[f32]) {
        let offset = HEADER_SIZE + start * BYTES_PER_F32;
        let dst = &mut self.mmap[offset..offset + values.len() * BYTES_PER_F32];
        for (bytes, value) in dst.chunks_exact_mut(BYTES_PER_F32).zip(values) {
            bytes.copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Flush rows up to `completed` and record the progress in the header
    pub fn commit(&mut self, completed: usize) -> std::io::Result<()> {
        let flushed_from = HEADER_SIZE + self.completed_rows() * BYTES_PER_F32;
        let flushed_to = HEADER_SIZE + completed * BYTES_PER_F32;
        if flushed_to > flushed_from {
            self.mmap.flush_range(flushed_from, flushed_to - flushed_from)?;
        }

        self.header.completed = completed as u64;
        self.header.encode(&mut self.mmap);
        self.mmap.flush_range(0, HEADER_SIZE)
    }

    /// Move the finished buffer to `final_path` and return its values
    pub fn finish(self, final_path: &Path) -> Result<Vec<f32>> {
        if !self.is_complete() {
            return Err(Error::InvalidArtifact {
                path: self.path.clone(),
                reason: format!(
                    "only {} of {} rows computed",
                    self.header.completed, self.header.rows
                ),
            });
        }
        self.mmap
            .flush()
            .map_err(|e| Error::exhausted(ReductionStage::Flush, None, e))?;
        let values = decode_values(&self.mmap[HEADER_SIZE..]);
        drop(self.mmap);
        fs::rename(&self.path, final_path)?;
        Ok(values)
    }

    /// Read a finished buffer for the given inputs
    pub fn load(path: &Path, rows: usize, fingerprint: Fingerprint) -> Result<Vec<f32>> {
        let invalid = |reason: String| Error::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path)?;
        let mmap: Mmap = unsafe { MmapOptions::new().map(&file)? };
        let header = Header::decode(&mmap).map_err(invalid)?;

        if header.rows != rows as u64 {
            return Err(invalid(format!("built for {} rows, need {}", header.rows, rows)));
        }
        if header.fingerprint != fingerprint {
            return Err(invalid("built from different inputs".to_string()));
        }
        if header.completed != header.rows {
            return Err(invalid(format!(
                "incomplete: {} of {} rows",
                header.completed, header.rows
            )));
        }
        Ok(decode_values(&mmap[HEADER_SIZE..]))
    }
}
