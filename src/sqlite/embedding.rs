//! Embedding BLOB conversion.

use super::Error;

pub type Result<T> = std::result::Result<T, Error>;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Reject vectors that cannot be stored.
///
/// # Errors
///
/// - Returns `Error::InvalidEmbedding` if the vector is empty.
/// - Returns `Error::InvalidEmbedding` if any value is NaN or infinite.
pub fn validate(vec: &[f32]) -> Result<()> {
    if vec.is_empty() {
        return Err(Error::InvalidEmbedding("Vector is empty".to_string()));
    }
    if vec.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding(
            "Vector contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

/// Convert a vector of f32 embedding values to a BLOB (little-endian bytes).
///
/// # Errors
///
/// Returns `Error::InvalidEmbedding` if the vector fails [`validate`].
pub fn vec_to_blob(vec: &[f32]) -> Result<Vec<u8>> {
    validate(vec)?;
    Ok(vec.iter().flat_map(|&x| x.to_le_bytes()).collect())
}

/// Convert a BLOB (little-endian bytes) back to `dims` f32 values.
///
/// # Errors
///
/// Returns `Error::InvalidBlobSize` if the blob is not exactly `dims * 4` bytes.
pub fn blob_to_vec(blob: &[u8], dims: usize) -> Result<Vec<f32>> {
    let expected = dims.saturating_mul(F32_BYTES);
    if blob.len() != expected {
        return Err(Error::InvalidBlobSize {
            expected,
            actual: blob.len(),
        });
    }
    let mut vec = Vec::with_capacity(dims);
    for chunk in blob.chunks_exact(F32_BYTES) {
        let val = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        vec.push(val);
    }
    Ok(vec)
}
