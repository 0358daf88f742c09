//! Binary persisted format for a [`ChunkNameEncoder`], following the same
//! magic/version/length-prefixed layout convention this codebase uses for its other binary
//! streams (see the `.rrd` file header in the sibling log-encoding crate this was modeled on).

use chunk_id::ChunkId;

use crate::encoder::ChunkNameEncoder;
use crate::error::{EncoderError, Result};

/// 4-byte magic identifying a persisted chunk-name index.
const MAGIC: [u8; 4] = *b"CIDX";

/// Format version. Bump and branch on read if the on-disk layout ever changes.
const VERSION: u16 = 1;

/// Size in bytes of one `(chunk_id, last_sample_index)` row: 16 bytes of id + 8 bytes of index.
const ROW_SIZE: usize = 16 + 8;

/// Encodes `encoder` into its self-describing persisted byte layout.
///
/// Layout: `[magic:4][version:2][row_count:4][rows: row_count * 24 bytes][connectivity bitset]`.
pub fn encode(encoder: &ChunkNameEncoder) -> Vec<u8> {
    let (chunk_ids, last_sample_index, connected_to_next) = encoder.rows();
    let row_count = chunk_ids.len();

    let bitset_len = row_count.div_ceil(8);
    let mut out = Vec::with_capacity(4 + 2 + 4 + row_count * ROW_SIZE + bitset_len);

    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(row_count as u32).to_le_bytes());

    for (id, &last) in chunk_ids.iter().zip(last_sample_index) {
        out.extend_from_slice(&id.as_u128().to_le_bytes());
        out.extend_from_slice(&last.to_le_bytes());
    }

    let mut bitset = vec![0_u8; bitset_len];
    for (i, &connected) in connected_to_next.iter().enumerate() {
        if connected {
            bitset[i / 8] |= 1 << (i % 8);
        }
    }
    out.extend_from_slice(&bitset);

    out
}

/// Decodes a byte buffer produced by [`encode`] back into a [`ChunkNameEncoder`].
pub fn decode(bytes: &[u8]) -> Result<ChunkNameEncoder> {
    let header_len = 4 + 2 + 4;
    if bytes.len() < header_len {
        return Err(malformed("buffer shorter than the fixed header"));
    }

    let magic: [u8; 4] = bytes[0..4].try_into().expect("checked length");
    if magic != MAGIC {
        return Err(malformed(&format!("bad magic: {magic:?}")));
    }

    let version = u16::from_le_bytes(bytes[4..6].try_into().expect("checked length"));
    if version != VERSION {
        return Err(malformed(&format!("unsupported version: {version}")));
    }

    let row_count = u32::from_le_bytes(bytes[6..10].try_into().expect("checked length")) as usize;

    let rows_start = header_len;
    let rows_end = rows_start + row_count * ROW_SIZE;
    let bitset_len = row_count.div_ceil(8);
    let bitset_end = rows_end + bitset_len;
    if bytes.len() < bitset_end {
        return Err(malformed("buffer truncated before end of rows or connectivity bitset"));
    }

    let mut chunk_ids = Vec::with_capacity(row_count);
    let mut last_sample_index = Vec::with_capacity(row_count);
    for i in 0..row_count {
        let row = &bytes[rows_start + i * ROW_SIZE..rows_start + (i + 1) * ROW_SIZE];
        let id = u128::from_le_bytes(row[0..16].try_into().expect("checked length"));
        let last = u64::from_le_bytes(row[16..24].try_into().expect("checked length"));
        chunk_ids.push(ChunkId::from_u128(id));
        last_sample_index.push(last);
    }

    let bitset = &bytes[rows_end..bitset_end];
    let connected_to_next = (0..row_count)
        .map(|i| bitset[i / 8] & (1 << (i % 8)) != 0)
        .collect();

    Ok(ChunkNameEncoder::from_columns(chunk_ids, last_sample_index, connected_to_next))
}

fn malformed(reason: &str) -> EncoderError {
    EncoderError::Malformed {
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_observationally_equal(a: &ChunkNameEncoder, b: &ChunkNameEncoder) {
        assert_eq!(a.rows(), b.rows());
        assert_eq!(a.num_chunks(), b.num_chunks());
        assert_eq!(a.num_samples(), b.num_samples());
    }

    #[test]
    fn round_trip_empty() {
        let enc = ChunkNameEncoder::new();
        let decoded = decode(&encode(&enc)).unwrap();
        assert_observationally_equal(&enc, &decoded);
    }

    #[test]
    fn round_trip_mixed_connectivity() {
        let mut enc = ChunkNameEncoder::new();
        enc.attach_samples_to_new_chunk(1, false).unwrap();
        enc.attach_samples_to_last_chunk(5, true).unwrap();
        enc.attach_samples_to_new_chunk(0, true).unwrap();
        enc.attach_samples_to_new_chunk(0, false).unwrap();
        enc.attach_samples_to_new_chunk(100, false).unwrap();

        let bytes = encode(&enc);
        assert_eq!(&bytes[0..4], b"CIDX");
        let decoded = decode(&bytes).unwrap();
        assert_observationally_equal(&enc, &decoded);

        // Lookups against the decoded encoder must agree with the original.
        for i in 0..enc.num_samples() as i64 {
            assert_eq!(
                enc.get_chunk_names(i).unwrap(),
                decoded.get_chunk_names(i).unwrap()
            );
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode(&ChunkNameEncoder::new());
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(EncoderError::Malformed { .. })));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let mut enc = ChunkNameEncoder::new();
        enc.attach_samples_to_new_chunk(5, false).unwrap();
        let bytes = encode(&enc);
        assert!(matches!(
            decode(&bytes[..bytes.len() - 1]),
            Err(EncoderError::Malformed { .. })
        ));
    }
}
