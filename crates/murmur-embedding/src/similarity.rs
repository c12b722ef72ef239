//! Vector math shared by clustering and aggregation.

/// Cosine similarity between two vectors.
///
/// Accumulates in f64. Returns 0.0 when the lengths differ or either vector
/// has zero magnitude, so empty sentences never attract other items.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Scale a vector to unit length in place. Zero vectors are left as-is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f64 = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x = (*x as f64 / norm) as f32;
        }
    }
}

/// Incrementally maintained mean of the vectors added so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningCentroid {
    mean: Vec<f64>,
    count: usize,
}

impl RunningCentroid {
    /// Start a centroid from its first member.
    pub fn new(first: &[f32]) -> Self {
        Self {
            mean: first.iter().map(|x| *x as f64).collect(),
            count: 1,
        }
    }

    /// Fold one more vector into the mean: `m += (x - m) / n`.
    pub fn add(&mut self, v: &[f32]) {
        self.count += 1;
        let n = self.count as f64;
        for (m, x) in self.mean.iter_mut().zip(v.iter()) {
            *m += (*x as f64 - *m) / n;
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn as_vec(&self) -> Vec<f32> {
        self.mean.iter().map(|x| *x as f32).collect()
    }

    pub fn similarity(&self, v: &[f32]) -> f64 {
        cosine_similarity(&self.as_vec(), v)
    }
}

/// Mean of a set of vectors. Returns an empty vector for an empty set.
pub fn mean_vector<'a>(vectors: impl IntoIterator<Item = &'a [f32]>) -> Vec<f32> {
    let mut iter = vectors.into_iter();
    match iter.next() {
        Some(first) => {
            let mut centroid = RunningCentroid::new(first);
            for v in iter {
                centroid.add(v);
            }
            centroid.as_vec()
        }
        None => Vec::new(),
    }
}
