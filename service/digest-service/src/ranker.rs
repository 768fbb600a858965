use embedding_provider::similarity::cosine_similarities;
use embedding_provider::{Embedder, EmbedderError};
use section_model::{Query, RankedSection, Section};

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 16;

/// Cosine similarity of every section to the query, index-aligned with `sections`.
///
/// The query is embedded once; sections are embedded as `title. content` in
/// batches of `batch_size`.
pub fn score_sections<E: Embedder + ?Sized>(
    embedder: &E,
    query: &Query,
    sections: &[Section],
    batch_size: usize,
) -> Result<Vec<f32>, EmbedderError> {
    if sections.is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = embedder.embed(&query.text())?;
    let texts: Vec<String> = sections.iter().map(Section::embedding_text).collect();
    let mut vectors = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(batch_size.max(1)) {
        let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
        vectors.extend(embedder.embed_batch(&refs)?);
    }
    if vectors.len() != sections.len() {
        return Err(EmbedderError::ProviderFailure {
            message: format!("embedded {} sections, got {} vectors", sections.len(), vectors.len()),
        });
    }
    Ok(cosine_similarities(&query_vector, &vectors))
}

/// Order section indices by similarity, highest first; ties keep document order.
///
/// NaN scores rank last.
pub fn order_by_similarity(similarities: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..similarities.len()).collect();
    order.sort_by(|&a, &b| sort_key(similarities[b]).total_cmp(&sort_key(similarities[a])));
    order
}

/// Total-order key: NaN below every score and `-0.0` equal to `0.0`.
fn sort_key(similarity: f32) -> f32 {
    if similarity.is_nan() {
        f32::NEG_INFINITY
    } else if similarity == 0.0 {
        0.0
    } else {
        similarity
    }
}

/// Top `min(top_n, sections.len())` sections by similarity to the query.
///
/// `sections` is left untouched; an empty slice skips embedding entirely.
pub fn rank_sections<E: Embedder + ?Sized>(
    embedder: &E,
    query: &Query,
    sections: &[Section],
    top_n: usize,
    batch_size: usize,
) -> Result<Vec<RankedSection>, EmbedderError> {
    let similarities = score_sections(embedder, query, sections, batch_size)?;
    Ok(order_by_similarity(&similarities)
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, section_index)| RankedSection {
            section_index,
            rank: i + 1,
            similarity: similarities[section_index],
        })
        .collect())
}
