//! Note chunking
//!
//! `MGI_NoteChunk.note` is a bounded-width column, so a note is stored as an
//! ordered run of chunks. Lengths are counted in chars, never bytes, so a
//! chunk boundary cannot fall inside a UTF-8 sequence.

/// One stored segment of a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChunkText {
    /// 1-based position of the chunk within its note
    pub sequence_num: i64,
    pub text: String,
}

/// Split `text` into consecutive chunks of at most `max_len` chars
///
/// Concatenating the chunks in sequence order gives back `text`. An empty
/// note has no chunks. A `max_len` of zero is treated as one.
pub fn chunk_note(text: &str, max_len: usize) -> Vec<NoteChunkText> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for c in text.chars() {
        if current_len == max_len {
            chunks.push(NoteChunkText {
                sequence_num: chunks.len() as i64 + 1,
                text: std::mem::take(&mut current),
            });
            current_len = 0;
        }
        current.push(c);
        current_len += 1;
    }

    if !current.is_empty() {
        chunks.push(NoteChunkText {
            sequence_num: chunks.len() as i64 + 1,
            text: current,
        });
    }

    chunks
}

/// Concatenate chunks in sequence order
pub fn reassemble(chunks: &[NoteChunkText]) -> String {
    let mut ordered: Vec<&NoteChunkText> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.sequence_num);
    ordered.into_iter().map(|c| c.text.as_str()).collect()
}
