//! Gini random forest classifier over small dense feature matrices.
//!
//! Trees are grown one after another from a seeded ChaCha stream, so a given
//! configuration and training set always yields the same forest.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn per split (floor of sqrt of total if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        probs: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Single classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
    n_classes: usize,
}

struct TreeBuilder<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
}

impl TreeBuilder<'_> {
    fn class_probabilities(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1.0;
        }
        let n = indices.len().max(1) as f64;
        counts.iter().map(|c| c / n).collect()
    }

    fn gini(&self, indices: &[usize]) -> f64 {
        1.0 - self
            .class_probabilities(indices)
            .iter()
            .map(|p| p * p)
            .sum::<f64>()
    }

    fn build(&self, indices: &[usize], depth: usize, rng: &mut ChaCha8Rng) -> Node {
        let impurity = self.gini(indices);
        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);

        if depth_reached || indices.len() < self.min_samples_split || impurity < 1e-10 {
            return Node::Leaf {
                probs: self.class_probabilities(indices),
            };
        }

        match self.best_split(indices, impurity, rng) {
            Some(split) => {
                let left = self.build(&split.left, depth + 1, rng);
                let right = self.build(&split.right, depth + 1, rng);
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => Node::Leaf {
                probs: self.class_probabilities(indices),
            },
        }
    }

    /// Draw `max_features` candidate features; keep drawing from the rest only while
    /// no valid split has been found.
    fn best_split(&self, indices: &[usize], parent: f64, rng: &mut ChaCha8Rng) -> Option<SplitCandidate> {
        let n_features = self.features.first().map_or(0, Vec::len);
        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }

            let mut values: Vec<f64> = indices.iter().map(|&i| self.features[i][feature]).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();

            for w in values.windows(2) {
                let threshold = (w[0] + w[1]) / 2.0;
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| self.features[i][feature] <= threshold);

                if left.len() < self.min_samples_leaf || right.len() < self.min_samples_leaf {
                    continue;
                }

                let n = indices.len() as f64;
                let weighted = (left.len() as f64 * self.gini(&left)
                    + right.len() as f64 * self.gini(&right))
                    / n;
                let gain = parent - weighted;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                        left,
                        right,
                    });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { probs } => return probs,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }
}

/// Bagged ensemble of [`DecisionTree`]s voting by averaged class probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Train on `features` (one row per sample) and dense class `labels` in `0..n_classes`.
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[usize], n_classes: usize) {
        self.trees.clear();
        self.n_classes = n_classes;

        let n = features.len().min(labels.len());
        if n == 0 || n_classes == 0 || labels.iter().any(|&l| l >= n_classes) {
            return;
        }

        let n_features = features[0].len();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .clamp(1, n_features.max(1));

        let builder = TreeBuilder {
            features,
            labels,
            n_classes,
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split.max(2),
            min_samples_leaf: self.config.min_samples_leaf.max(1),
            max_features,
        };

        for i in 0..self.config.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
            let sample: Vec<usize> = if self.config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };

            let root = builder.build(&sample, 0, &mut rng);
            self.trees.push(DecisionTree { root, n_classes });
        }

        tracing::debug!(
            "Fitted random forest: {} trees on {} samples, {} classes",
            self.trees.len(),
            n,
            n_classes
        );
    }

    /// Averaged class probabilities for one row
    pub fn predict_proba_one(&self, row: &[f64]) -> Vec<f64> {
        let mut probs = vec![0.0; self.n_classes];
        if self.trees.is_empty() {
            return probs;
        }
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p /= n);
        probs
    }

    /// Most probable class; the lowest class index wins ties. `None` before fitting.
    pub fn predict_one(&self, row: &[f64]) -> Option<usize> {
        if self.trees.is_empty() {
            return None;
        }
        let probs = self.predict_proba_one(row);
        let mut best = 0;
        for (class, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = class;
            }
        }
        Some(best)
    }

    pub fn predict(&self, features: &[Vec<f64>]) -> Option<Vec<usize>> {
        features.iter().map(|row| self.predict_one(row)).collect()
    }
}
