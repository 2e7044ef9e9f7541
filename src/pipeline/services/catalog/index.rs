use std::cmp::Ordering;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::pipeline::services::catalog::{Catalog, CatalogEntry, IndexConfig};
use crate::pipeline::types::{Embedding, dot};

/// A catalog entry paired with its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntry<'a> {
    pub entry: &'a CatalogEntry,
    pub similarity: f32,
    /// Insertion position of the entry in the catalog.
    pub position: usize,
}

/// Read-only nearest-neighbor index over a catalog snapshot.
///
/// Entry embeddings are L2-normalized once, so cosine similarity is a dot
/// product. Small catalogs are scanned exactly; large ones are split into
/// k-means partitions and only the partitions closest to the query are
/// scanned. Both paths rank by descending similarity and break ties by
/// insertion order.
#[derive(Debug)]
pub struct CatalogIndex {
    catalog: Catalog,
    dim: usize,
    rows: Vec<f32>,
    partitions: Option<Partitions>,
}

#[derive(Debug)]
struct Partitions {
    centroids: Vec<Vec<f32>>,
    members: Vec<Vec<usize>>,
    probes: usize,
}

impl CatalogIndex {
    pub fn build(catalog: Catalog, config: &IndexConfig) -> Self {
        let dim = catalog.dim().unwrap_or(0);
        let mut rows = Vec::with_capacity(catalog.len() * dim);
        for entry in catalog.iter() {
            rows.extend_from_slice(entry.embedding.normalized().as_slice());
        }

        let partitions = if catalog.len() >= config.ivf_min_entries && catalog.len() > 1 {
            let partitions = Partitions::build(&rows, dim, config);
            info!(
                "Built partitioned catalog index: {} entries in {} partitions, {} probes",
                catalog.len(),
                partitions.centroids.len(),
                partitions.probes
            );
            Some(partitions)
        } else {
            debug!("Built flat catalog index over {} entries", catalog.len());
            None
        };

        Self {
            catalog,
            dim,
            rows,
            partitions,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn is_partitioned(&self) -> bool {
        self.partitions.is_some()
    }

    /// Every scanned entry ranked by similarity.
    pub fn match_embedding(&self, query: &Embedding) -> Result<Vec<ScoredEntry<'_>>, PipelineError> {
        self.search(query, None)
    }

    /// The `k` best matches.
    pub fn match_top_k(
        &self,
        query: &Embedding,
        k: usize,
    ) -> Result<Vec<ScoredEntry<'_>>, PipelineError> {
        self.search(query, Some(k))
    }

    fn search(
        &self,
        query: &Embedding,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredEntry<'_>>, PipelineError> {
        if self.catalog.is_empty() {
            return Err(PipelineError::EmptyCatalog);
        }
        if query.dim() != self.dim {
            return Err(PipelineError::inference(format!(
                "query has dimension {}, catalog expects {}",
                query.dim(),
                self.dim
            )));
        }
        if !query.is_finite() {
            return Err(PipelineError::inference("query embedding is not finite"));
        }

        let query = query.normalized();
        let query = query.as_slice();

        let mut scored: Vec<(usize, f32)> = match &self.partitions {
            Some(partitions) => partitions
                .probe(query)
                .into_iter()
                .flat_map(|p| partitions.members[p].iter().copied())
                .map(|i| (i, similarity(self.row(i), query)))
                .collect(),
            None => (0..self.catalog.len())
                .map(|i| (i, similarity(self.row(i), query)))
                .collect(),
        };

        rank(&mut scored);
        if let Some(k) = limit {
            scored.truncate(k);
        }

        Ok(scored
            .into_iter()
            .filter_map(|(position, similarity)| {
                self.catalog.get_index(position).map(|entry| ScoredEntry {
                    entry,
                    similarity,
                    position,
                })
            })
            .collect())
    }

    fn row(&self, index: usize) -> &[f32] {
        &self.rows[index * self.dim..(index + 1) * self.dim]
    }
}

/// Dot product with `-0.0` folded into `+0.0`, so equal scores compare equal.
fn similarity(row: &[f32], query: &[f32]) -> f32 {
    dot(row, query) + 0.0
}

/// Descending score, ties by ascending index. Scores are finite.
fn rank(scored: &mut [(usize, f32)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
}

impl Partitions {
    fn build(rows: &[f32], dim: usize, config: &IndexConfig) -> Self {
        let n = rows.len() / dim.max(1);
        let k = config.partitions.clamp(1, n);
        let row = |i: usize| &rows[i * dim..(i + 1) * dim];

        // evenly spaced seeds in insertion order
        let mut centroids: Vec<Vec<f32>> = (0..k).map(|c| row(c * n / k).to_vec()).collect();
        let mut assignment = vec![0usize; n];

        for round in 0..config.iterations.max(1) {
            let mut changed = 0;
            for (i, slot) in assignment.iter_mut().enumerate() {
                let best = nearest(&centroids, row(i));
                if *slot != best || round == 0 {
                    changed += 1;
                }
                *slot = best;
            }

            let mut sums = vec![vec![0.0f32; dim]; k];
            let mut counts = vec![0usize; k];
            for (i, &c) in assignment.iter().enumerate() {
                counts[c] += 1;
                for (acc, v) in sums[c].iter_mut().zip(row(i)) {
                    *acc += v;
                }
            }
            for (c, sum) in sums.into_iter().enumerate() {
                // an empty partition keeps its previous centroid
                if counts[c] > 0 {
                    centroids[c] = Embedding::new(sum).normalized().as_slice().to_vec();
                }
            }

            if changed == 0 {
                break;
            }
        }

        let mut members = vec![Vec::new(); k];
        for i in 0..n {
            members[nearest(&centroids, row(i))].push(i);
        }

        Self {
            centroids,
            members,
            probes: config.probes.clamp(1, k),
        }
    }

    fn probe(&self, query: &[f32]) -> Vec<usize> {
        let mut scored: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(c, centroid)| (c, dot(centroid, query)))
            .collect();
        rank(&mut scored);
        scored.into_iter().take(self.probes).map(|(c, _)| c).collect()
    }
}

fn nearest(centroids: &[Vec<f32>], row: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let score = dot(centroid, row);
        if score > best_score {
            best = c;
            best_score = score;
        }
    }
    best
}
