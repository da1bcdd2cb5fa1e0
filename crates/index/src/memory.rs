use crate::{DocumentRecord, IndexError, SearchBackend, SimilarityHit, StoredDocument};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    /// Vector dimensionality fixed by `ensure_index`.
    dims: Option<usize>,
    /// Insertion order, used as the tie-break for equal scores.
    order: Vec<String>,
    docs: HashMap<String, DocumentRecord>,
}

/// An in-memory backend using a `RwLock` around a `HashMap`.
///
/// Keyword queries match lowercase whitespace-separated terms against the
/// lowercase text and rank by the number of distinct matching terms.
pub struct InMemoryBackend {
    inner: RwLock<Inner>,
    keyword_limit: usize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_keyword_limit(10)
    }

    pub fn with_keyword_limit(keyword_limit: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            keyword_limit: keyword_limit.max(1),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, IndexError> {
        self.inner
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, IndexError> {
        self.inner
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))
    }

    fn check_dims(inner: &Inner, actual: usize) -> Result<(), IndexError> {
        match inner.dims {
            Some(expected) if expected != actual => {
                Err(IndexError::DimensionMismatch { expected, actual })
            }
            Some(_) => Ok(()),
            None => Err(IndexError::backend("index does not exist, call ensure_index first")),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0f64;
    let mut norm_a = 0f64;
    let mut norm_b = 0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    async fn ping(&self) -> Result<(), IndexError> {
        self.read().map(|_| ())
    }

    async fn ensure_index(&self, dims: usize) -> Result<(), IndexError> {
        let mut guard = self.write()?;
        if guard.dims.is_none() {
            guard.dims = Some(dims);
        }
        Ok(())
    }

    async fn index_document(&self, record: &DocumentRecord) -> Result<(), IndexError> {
        let mut guard = self.write()?;
        Self::check_dims(&guard, record.embedding.len())?;
        if guard.docs.insert(record.id.clone(), record.clone()).is_none() {
            guard.order.push(record.id.clone());
        }
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<StoredDocument, IndexError> {
        let guard = self.read()?;
        guard
            .docs
            .get(id)
            .map(|doc| StoredDocument {
                id: doc.id.clone(),
                text: doc.text.clone(),
            })
            .ok_or_else(|| IndexError::NotFound(format!("document {id:?} not found")))
    }

    async fn list_document_ids(&self) -> Result<Vec<String>, IndexError> {
        Ok(self.read()?.order.clone())
    }

    async fn keyword_query(&self, query: &str) -> Result<Vec<String>, IndexError> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let guard = self.read()?;

        let mut matches: Vec<(usize, usize, &str)> = guard
            .order
            .iter()
            .enumerate()
            .filter_map(|(pos, id)| {
                let text = guard.docs.get(id)?.text.to_lowercase();
                let count = terms.iter().filter(|t| text.contains(t.as_str())).count();
                (count > 0).then_some((count, pos, id.as_str()))
            })
            .collect();

        matches.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(matches
            .into_iter()
            .take(self.keyword_limit)
            .map(|(_, _, id)| id.to_string())
            .collect())
    }

    async fn similarity_query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SimilarityHit>, IndexError> {
        let guard = self.read()?;
        Self::check_dims(&guard, vector.len())?;

        let mut hits: Vec<(usize, SimilarityHit)> = guard
            .order
            .iter()
            .enumerate()
            .filter_map(|(pos, id)| {
                let doc = guard.docs.get(id)?;
                Some((
                    pos,
                    SimilarityHit {
                        document_id: id.clone(),
                        score: cosine_similarity(vector, &doc.embedding) + 1.0,
                    },
                ))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits.truncate(k);
        Ok(hits.into_iter().map(|(_, hit)| hit).collect())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
