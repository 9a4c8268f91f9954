//! Corpus chunking.
//!
//! Splits a corpus on [`BLOCK_SEPARATOR`] and greedily packs whole blocks
//! into chunks of at most `max_chunk_chars` characters. A block is never
//! split: one that alone exceeds the budget becomes its own chunk.

use digestr_core::BLOCK_SEPARATOR;
use tracing::debug;

/// Split `corpus` into ordered chunks.
///
/// Each block costs its length plus the separator. Joining the returned
/// chunks with [`BLOCK_SEPARATOR`] reproduces `corpus` exactly. An empty
/// corpus yields no chunks.
pub fn split_corpus(corpus: &str, max_chunk_chars: usize) -> Vec<String> {
    if corpus.is_empty() {
        return Vec::new();
    }

    let separator_len = BLOCK_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for block in corpus.split(BLOCK_SEPARATOR) {
        let block_cost = block.chars().count() + separator_len;

        if current_len + block_cost > max_chunk_chars && !current.is_empty() {
            chunks.push(current.join(BLOCK_SEPARATOR));
            current.clear();
            current_len = 0;
        }

        current.push(block);
        current_len += block_cost;
    }

    if !current.is_empty() {
        chunks.push(current.join(BLOCK_SEPARATOR));
    }

    debug!(chunks = chunks.len(), max_chunk_chars, "Split corpus");
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_of(blocks: &[String]) -> String {
        blocks.join(BLOCK_SEPARATOR)
    }

    fn blocks(count: usize, len: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let tag = format!("#{i}:");
                format!("{tag}{}", "x".repeat(len.saturating_sub(tag.len())))
            })
            .collect()
    }

    #[test]
    fn empty_corpus_yields_nothing() {
        assert!(split_corpus("", 100).is_empty());
    }

    #[test]
    fn fitting_corpus_is_one_chunk() {
        let corpus = corpus_of(&blocks(3, 10));
        let chunks = split_corpus(&corpus, 1_000);
        assert_eq!(chunks, vec![corpus]);
    }

    #[test]
    fn chunks_cover_every_block_in_order() {
        let source = blocks(25, 40);
        let corpus = corpus_of(&source);
        let chunks = split_corpus(&corpus, 150);

        assert!(chunks.len() > 1);
        assert_eq!(chunks.join(BLOCK_SEPARATOR), corpus);

        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.split(BLOCK_SEPARATOR))
            .collect();
        assert_eq!(rejoined, source.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn chunks_respect_budget() {
        let corpus = corpus_of(&blocks(40, 33));
        for chunk in split_corpus(&corpus, 120) {
            assert!(chunk.chars().count() <= 120, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn oversized_block_kept_whole_in_own_chunk() {
        let big = "B".repeat(500);
        let corpus = corpus_of(&["small one".into(), big.clone(), "small two".into()]);
        let chunks = split_corpus(&corpus, 100);

        assert_eq!(chunks, vec!["small one".to_string(), big, "small two".to_string()]);
    }

    #[test]
    fn oversized_first_block() {
        let big = "B".repeat(300);
        let corpus = corpus_of(&[big.clone(), "tail".into()]);
        let chunks = split_corpus(&corpus, 100);
        assert_eq!(chunks[0], big);
        assert_eq!(chunks[1], "tail");
    }

    #[test]
    fn separator_overhead_counted() {
        // Two 4-char blocks cost 6 each; a budget of 10 cannot hold both.
        let chunks = split_corpus("aaaa\n\nbbbb", 10);
        assert_eq!(chunks, vec!["aaaa", "bbbb"]);
        let chunks = split_corpus("aaaa\n\nbbbb", 12);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb"]);
    }

    #[test]
    fn rechunking_a_chunk_is_stable() {
        let corpus = corpus_of(&blocks(10, 30));
        let chunks = split_corpus(&corpus, 100);
        for chunk in &chunks {
            assert_eq!(split_corpus(chunk, 100), vec![chunk.clone()]);
        }
    }
}
