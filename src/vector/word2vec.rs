//! word2vec Binary Format
//!
//! Streams embeddings into a [`VectorStore`] and writes them back.
//!
//! ```text
//! "<count> <dim>\n"
//! repeated count times:
//!   <word bytes> ' ' <dim × f32 little-endian> ['\n']
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use super::store::VectorStore;
use crate::error::{Error, Result};

const BYTES_PER_F32: usize = 4;

/// Longest accepted word, guards against reading garbage as a word
const MAX_WORD_BYTES: usize = 4096;

/// Upper bound on components reserved up front; larger files grow as they stream
const MAX_PREALLOCATED_VALUES: usize = 1 << 24;

/// Read a word2vec binary file
pub fn read(path: &Path) -> Result<VectorStore> {
    info!("Loading embeddings from {}", path.display());
    let file = File::open(path)?;
    let store = read_from(BufReader::with_capacity(1 << 20, file))?;
    info!(
        "Loaded {} vectors of dimension {} from {}",
        store.len(),
        store.dimension(),
        path.display()
    );
    Ok(store)
}

/// Read the word2vec binary format from any buffered reader
pub fn read_from<R: BufRead>(mut reader: R) -> Result<VectorStore> {
    let (count, dimension) = read_header(&mut reader)?;
    let rows = count.min(MAX_PREALLOCATED_VALUES / dimension);
    let mut store = VectorStore::with_capacity(dimension, rows);

    let mut word_buf = Vec::with_capacity(64);
    let mut vec_bytes = vec![0u8; dimension * BYTES_PER_F32];
    let mut vector = vec![0f32; dimension];
    let mut duplicates = 0usize;

    for entry in 0..count {
        read_word(&mut reader, &mut word_buf, entry)?;
        reader.read_exact(&mut vec_bytes).map_err(|e| truncated(entry, e))?;

        for (value, bytes) in vector.iter_mut().zip(vec_bytes.chunks_exact(BYTES_PER_F32)) {
            *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        let word = String::from_utf8_lossy(&word_buf).into_owned();
        match store.push(word, &vector) {
            Ok(_) => {}
            Err(Error::DuplicateWord(word)) => {
                duplicates += 1;
                debug!("Skipping duplicate word '{}' at entry {}", word, entry);
            }
            Err(e) => return Err(e),
        }
    }

    if duplicates > 0 {
        warn!("Skipped {} duplicate words", duplicates);
    }

    Ok(store)
}

/// Write a store in word2vec binary format
pub fn write(store: &VectorStore, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_to(store, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_to<W: Write>(store: &VectorStore, writer: &mut W) -> Result<()> {
    writeln!(writer, "{} {}", store.len(), store.dimension())?;
    for entry in store.entries() {
        writer.write_all(entry.word.as_bytes())?;
        writer.write_all(b" ")?;
        for value in entry.vector {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.write_all(b"\n")?;
    }
    Ok(())
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<(usize, usize)> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let mut parts = line.split_whitespace();
    let parse = |part: Option<&str>, what: &str| -> Result<usize> {
        part.and_then(|p| p.parse().ok()).ok_or_else(|| {
            Error::Configuration(format!("invalid word2vec header {line:?}: bad {what}"))
        })
    };
    let count = parse(parts.next(), "count")?;
    let dimension = parse(parts.next(), "dimension")?;

    if dimension == 0 {
        return Err(Error::Configuration(
            "word2vec header declares zero dimensions".to_string(),
        ));
    }
    if count
        .checked_mul(dimension)
        .and_then(|values| values.checked_mul(BYTES_PER_F32))
        .is_none()
    {
        return Err(Error::Configuration(format!(
            "word2vec header declares {count} vectors of dimension {dimension}, too large to address"
        )));
    }
    Ok((count, dimension))
}

/// Read one word, skipping the newline some writers put before it
fn read_word<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, entry: usize) -> Result<()> {
    buf.clear();
    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte).map_err(|e| truncated(entry, e))?;
        match byte[0] {
            b' ' => break,
            b'\n' if buf.is_empty() => continue,
            b => buf.push(b),
        }
        if buf.len() > MAX_WORD_BYTES {
            return Err(Error::Configuration(format!(
                "word2vec entry {entry}: word longer than {MAX_WORD_BYTES} bytes"
            )));
        }
    }
    Ok(())
}

fn truncated(entry: usize, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("word2vec file truncated at entry {entry}"),
        ))
    } else {
        Error::Io(e)
    }
}
