//! Recording buffer
//!
//! Browsers deliver audio and video recordings as a series of chunks. The
//! buffer collects them in arrival order and concatenates them into one blob
//! when the recording stops.

/// Accumulates recording chunks in memory
#[derive(Debug, Clone)]
pub struct RecordingBuffer {
    content_type: String,
    chunks: Vec<Vec<u8>>,
    total: usize,
}

impl RecordingBuffer {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            chunks: Vec::new(),
            total: 0,
        }
    }

    /// Append a chunk; empty chunks are dropped
    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.total += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Concatenate all chunks into a single blob
    pub fn finish(self) -> (Vec<u8>, String) {
        let mut blob = Vec::with_capacity(self.total);
        for chunk in self.chunks {
            blob.extend_from_slice(&chunk);
        }
        (blob, self.content_type)
    }
}
