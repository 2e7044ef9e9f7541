use serde::Deserialize;

/// Tuning for the catalog nearest-neighbor index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Catalogs with at least this many entries get a partitioned (IVF) index.
    pub ivf_min_entries: usize,
    pub partitions: usize,
    /// Partitions scanned per query.
    pub probes: usize,
    /// k-means refinement rounds when building partitions.
    pub iterations: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ivf_min_entries: 4096,
            partitions: 64,
            probes: 8,
            iterations: 10,
        }
    }
}

impl IndexConfig {
    /// Exact scan regardless of catalog size.
    pub fn flat() -> Self {
        Self {
            ivf_min_entries: usize::MAX,
            ..Self::default()
        }
    }

    pub fn with_partitions(mut self, partitions: usize, probes: usize) -> Self {
        self.partitions = partitions;
        self.probes = probes;
        self
    }

    pub fn with_ivf_min_entries(mut self, ivf_min_entries: usize) -> Self {
        self.ivf_min_entries = ivf_min_entries;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.partitions == 0 {
            return Err("Index partitions must be greater than 0".to_string());
        }

        if self.probes == 0 || self.probes > self.partitions {
            return Err("Index probes must be between 1 and the partition count".to_string());
        }

        Ok(())
    }
}
