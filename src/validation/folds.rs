//! Fold-generation strategies for cross-validation.

use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Produces train/test index partitions over `n_samples` observations.
///
/// Every sample must appear in exactly one test set across the returned
/// partitions; the validation loops rely on this to assemble a complete
/// out-of-fold prediction vector.
pub trait FoldStrategy {
    /// Return `(train_indices, test_indices)` pairs.
    fn folds(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)>;
}

/// K-fold cross-validation with shuffled, approximately equal folds.
///
/// Observations are shuffled with a seeded RNG, then distributed
/// round-robin, so partitions are reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct KFold {
    n_folds: usize,
    seed: u64,
}

impl KFold {
    /// Create a strategy with `n_folds` folds and seed 0.
    pub fn new(n_folds: usize) -> Self {
        Self { n_folds, seed: 0 }
    }

    /// Set the shuffle seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl FoldStrategy for KFold {
    fn folds(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let k = self.n_folds.min(n_samples).max(1);

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let mut test_sets: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (i, &idx) in indices.iter().enumerate() {
            test_sets[i % k].push(idx);
        }

        test_sets
            .into_iter()
            .map(|test| {
                let mut in_test = vec![false; n_samples];
                for &i in &test {
                    in_test[i] = true;
                }
                let train = (0..n_samples).filter(|&i| !in_test[i]).collect();
                (train, test)
            })
            .collect()
    }
}

/// Leave-one-out cross-validation: one fold per observation.
#[derive(Debug, Clone)]
pub struct LeaveOneOut;

impl FoldStrategy for LeaveOneOut {
    fn folds(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        (0..n_samples)
            .map(|held_out| {
                let train = (0..n_samples).filter(|&i| i != held_out).collect();
                (train, vec![held_out])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kfold_every_sample_tested_once() {
        let folds = KFold::new(4).seed(7).folds(22);
        assert_eq!(folds.len(), 4);

        let mut seen = vec![0usize; 22];
        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 22);
            for &i in test {
                seen[i] += 1;
            }
            for &i in train {
                assert!(!test.contains(&i));
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_kfold_approximately_equal_sizes() {
        let folds = KFold::new(5).seed(1).folds(23);
        for (_, test) in &folds {
            assert!(test.len() == 4 || test.len() == 5);
        }
    }

    #[test]
    fn test_kfold_reproducible_for_seed() {
        let a = KFold::new(3).seed(42).folds(15);
        let b = KFold::new(3).seed(42).folds(15);
        assert_eq!(a, b);
    }

    #[test]
    fn test_kfold_differs_across_seeds() {
        let a = KFold::new(3).seed(1).folds(15);
        let b = KFold::new(3).seed(2).folds(15);
        assert_ne!(a, b);
    }

    #[test]
    fn test_kfold_more_folds_than_samples() {
        let folds = KFold::new(10).seed(0).folds(4);
        assert_eq!(folds.len(), 4);
        for (_, test) in &folds {
            assert_eq!(test.len(), 1);
        }
    }

    #[test]
    fn test_leave_one_out() {
        let folds = LeaveOneOut.folds(6);
        assert_eq!(folds.len(), 6);
        for (i, (train, test)) in folds.iter().enumerate() {
            assert_eq!(test, &vec![i]);
            assert_eq!(train.len(), 5);
            assert!(!train.contains(&i));
        }
    }
}
