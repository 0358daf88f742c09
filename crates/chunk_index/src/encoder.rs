use chunk_id::ChunkId;

use crate::error::{EncoderError, Result};

/// Maintains the compact index mapping a global, monotonically-increasing sample index to the
/// ordered set of chunks that hold it.
///
/// The index is three parallel, append-only columns rather than a `Vec` of row structs: this
/// keeps the hot binary-search column (`last_sample_index`) tightly packed for cache locality,
/// matching how this crate's sibling columnar stores lay out their indices.
#[derive(Debug, Clone, Default)]
pub struct ChunkNameEncoder {
    chunk_ids: Vec<ChunkId>,
    last_sample_index: Vec<u64>,
    connected_to_next: Vec<bool>,
}

impl ChunkNameEncoder {
    /// Creates an empty encoder with no chunks attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks ever attached.
    #[inline]
    pub fn num_chunks(&self) -> usize {
        debug_assert_eq!(self.chunk_ids.len(), self.last_sample_index.len());
        debug_assert_eq!(self.chunk_ids.len(), self.connected_to_next.len());
        self.chunk_ids.len()
    }

    /// Number of samples appended so far.
    #[inline]
    pub fn num_samples(&self) -> u64 {
        self.last_sample_index.last().map_or(0, |&last| last + 1)
    }

    /// Raw row columns, for the persisted-format codec and for tests.
    pub(crate) fn rows(&self) -> (&[ChunkId], &[u64], &[bool]) {
        (&self.chunk_ids, &self.last_sample_index, &self.connected_to_next)
    }

    /// Rebuilds an encoder directly from its three parallel columns.
    ///
    /// Only used by the persisted-format decoder, which has already validated column lengths.
    pub(crate) fn from_columns(
        chunk_ids: Vec<ChunkId>,
        last_sample_index: Vec<u64>,
        connected_to_next: Vec<bool>,
    ) -> Self {
        Self {
            chunk_ids,
            last_sample_index,
            connected_to_next,
        }
    }

    /// Opens a new chunk and attaches `n` new samples to it.
    ///
    /// `n == 0` is only legal as the terminator (or further continuation) of a sample that is
    /// currently split across chunks, i.e. the previous row must have `connected_to_next == true`.
    pub fn attach_samples_to_new_chunk(&mut self, n: i64, connected_to_next: bool) -> Result<String> {
        if n < 0 {
            return Err(EncoderError::InvalidArgument {
                reason: format!("sample count must be >= 0, got {n}"),
            });
        }
        let n = n as u64;

        let new_last = match self.last_sample_index.last().copied() {
            Some(prev_last) => {
                if n == 0 {
                    let prev_connected = *self.connected_to_next.last().expect("parity");
                    if !prev_connected {
                        return Err(EncoderError::InvalidState {
                            reason: "cannot open a new chunk containing zero samples unless continuing a split sample".to_owned(),
                        });
                    }
                    prev_last
                } else {
                    prev_last + n
                }
            }
            None => {
                if n == 0 {
                    return Err(EncoderError::InvalidState {
                        reason: "cannot open a new chunk containing zero samples when no previous chunk exists".to_owned(),
                    });
                }
                n - 1
            }
        };

        let id = ChunkId::generate();
        self.chunk_ids.push(id);
        self.last_sample_index.push(new_last);
        self.connected_to_next.push(connected_to_next);

        tracing::trace!(
            chunk = %id,
            n,
            connected_to_next,
            num_chunks = self.num_chunks(),
            "attached new chunk"
        );

        Ok(id.name())
    }

    /// Extends the currently-last chunk with `n` more samples.
    pub fn attach_samples_to_last_chunk(&mut self, n: i64, connected_to_next: bool) -> Result<String> {
        if n <= 0 {
            return Err(EncoderError::InvalidArgument {
                reason: format!("sample count must be >= 1, got {n}"),
            });
        }
        let n = n as u64;

        if self.last_sample_index.is_empty() {
            return Err(EncoderError::InvalidState {
                reason: "cannot extend the last chunk: no chunk has been attached yet".to_owned(),
            });
        }
        let was_connected = *self.connected_to_next.last().expect("parity");
        if was_connected {
            return Err(EncoderError::InvalidState {
                reason: "cannot extend the last chunk: it is sealed mid-split (connected_to_next was already true)".to_owned(),
            });
        }

        let last = self.last_sample_index.last_mut().expect("checked non-empty above");
        *last += n;
        *self.connected_to_next.last_mut().expect("parity") = connected_to_next;

        let id = *self.chunk_ids.last().expect("parity");
        tracing::trace!(chunk = %id, n, connected_to_next, "extended last chunk");
        Ok(id.name())
    }

    /// Finds the row index of the leftmost row covering `global_index`, i.e. the first row with
    /// `last_sample_index >= global_index`.
    fn locate(&self, global_index: u64) -> usize {
        self.last_sample_index.partition_point(|&last| last < global_index)
    }

    /// Index of the earliest row belonging to the same split-sample run as row `r`.
    fn group_start(&self, r: usize) -> usize {
        let last = self.last_sample_index[r];
        let mut start = r;
        while start > 0
            && self.last_sample_index[start - 1] == last
            && self.connected_to_next[start - 1]
        {
            start -= 1;
        }
        start
    }

    /// Index one past the last row belonging to the same split-sample run as row `r`.
    ///
    /// If the last row of the whole encoder is reached while it is still `connected_to_next`
    /// (the sample is open/mid-split and has not yet been continued into a next chunk), that row
    /// is treated as the end of the currently-known chain rather than walked past.
    fn group_end(&self, r: usize) -> usize {
        let mut end = r;
        while end + 1 < self.chunk_ids.len() && self.connected_to_next[end] {
            end += 1;
        }
        end
    }

    fn check_index(&self, global_index: i64) -> Result<u64> {
        let num_samples = self.num_samples();
        if global_index < 0 || global_index as u64 >= num_samples {
            return Err(EncoderError::OutOfRange {
                index: global_index,
                num_samples,
            });
        }
        Ok(global_index as u64)
    }

    /// Returns, in chunk order, the names of every chunk that holds `global_index`.
    pub fn get_chunk_names(&self, global_index: i64) -> Result<Vec<String>> {
        let gi = self.check_index(global_index)?;
        let r = self.locate(gi);
        let start = self.group_start(r);
        let end = self.group_end(r);
        Ok(self.chunk_ids[start..=end].iter().map(ChunkId::name).collect())
    }

    /// Returns the offset of `global_index` within the first chunk that holds it.
    pub fn get_local_sample_index(&self, global_index: i64) -> Result<u64> {
        let gi = self.check_index(global_index)?;
        let r = self.locate(gi);
        let start = self.group_start(r);
        Ok(match start.checked_sub(1) {
            Some(p) => gi - self.last_sample_index[p] - 1,
            None => gi,
        })
    }
}
