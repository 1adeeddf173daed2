//! CART decision tree on Gini impurity

use crate::InferenceError;
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Index of a node inside [`DecisionTree::nodes`]
pub type NodeIndex = usize;

/// Minimum impurity decrease for a split to be kept
const IMPURITY_EPSILON: f64 = 1e-12;

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Terminal node with its weighted class totals
    Leaf { class: u8, weights: [f64; 2] },
    /// `x[feature] <= threshold` goes left, otherwise right
    Split {
        feature: usize,
        threshold: f64,
        left: NodeIndex,
        right: NodeIndex,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Binary decision tree stored as a flat node arena; root is node 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree over the samples with non-zero weight
    pub(crate) fn fit<R: Rng>(
        x: &[FeatureVector],
        y: &[u8],
        sample_weights: &[f64],
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let indices: Vec<usize> = (0..x.len()).filter(|&i| sample_weights[i] > 0.0).collect();
        let mut builder = TreeBuilder {
            x,
            y,
            weights: sample_weights,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.build(indices, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Predicted class for a standardized vector
    pub fn predict(&self, vector: &FeatureVector) -> u8 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class, .. } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if vector.values[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Check node references after deserialization
    ///
    /// Children must point past their parent, so every path ends in a leaf.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.nodes.is_empty() {
            return Err(InferenceError::InvalidModel("tree has no nodes".into()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { class, .. } if *class > 1 => {
                    return Err(InferenceError::InvalidModel(format!(
                        "node {} has class {}",
                        idx, class
                    )));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_DIMENSION || !threshold.is_finite() {
                        return Err(InferenceError::InvalidModel(format!(
                            "node {} splits on feature {} at {}",
                            idx, feature, threshold
                        )));
                    }
                    for &child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(InferenceError::InvalidModel(format!(
                                "node {} points to child {}",
                                idx, child
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Leaf classes
    pub(crate) fn leaf_classes(&self) -> impl Iterator<Item = u8> + '_ {
        self.nodes.iter().filter_map(|n| match n {
            Node::Leaf { class, .. } => Some(*class),
            Node::Split { .. } => None,
        })
    }

    /// All nodes
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: NodeIndex) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

/// Gini impurity of weighted class totals
fn gini(weights: [f64; 2]) -> f64 {
    let total = weights[0] + weights[1];
    if total <= 0.0 {
        return 0.0;
    }
    let p0 = weights[0] / total;
    let p1 = weights[1] / total;
    1.0 - (p0 * p0 + p1 * p1)
}

struct TreeBuilder<'a, R: Rng> {
    x: &'a [FeatureVector],
    y: &'a [u8],
    weights: &'a [f64],
    params: TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
}

impl<'a, R: Rng> TreeBuilder<'a, R> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> NodeIndex {
        let totals = self.class_totals(&indices);
        let pure = totals[0] <= 0.0 || totals[1] <= 0.0;

        if pure || depth >= self.params.max_depth || indices.len() < self.params.min_samples_split {
            return self.push_leaf(totals);
        }

        let Some(split) = self.best_split(&indices, totals) else {
            return self.push_leaf(totals);
        };

        let x = self.x;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i].values[split.feature] <= split.threshold);

        // Reserve the slot so children get higher indices
        let node = self.push_leaf(totals);
        let left = self.build(left, depth + 1);
        let right = self.build(right, depth + 1);
        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    fn class_totals(&self, indices: &[usize]) -> [f64; 2] {
        let mut totals = [0.0; 2];
        for &i in indices {
            totals[self.y[i] as usize] += self.weights[i];
        }
        totals
    }

    fn push_leaf(&mut self, weights: [f64; 2]) -> NodeIndex {
        // Ties go to class 0
        let class = u8::from(weights[1] > weights[0]);
        self.nodes.push(Node::Leaf { class, weights });
        self.nodes.len() - 1
    }

    fn best_split(&mut self, indices: &[usize], totals: [f64; 2]) -> Option<Candidate> {
        let total = totals[0] + totals[1];
        let parent = gini(totals);
        let features = index::sample(&mut *self.rng, FEATURE_DIMENSION, self.params.max_features);

        let (x, y, w) = (self.x, self.y, self.weights);
        let mut sorted = indices.to_vec();
        let mut best: Option<Candidate> = None;

        for feature in features.iter() {
            sorted.sort_by(|&a, &b| x[a].values[feature].total_cmp(&x[b].values[feature]));

            let mut left = [0.0; 2];
            for k in 0..sorted.len() - 1 {
                let i = sorted[k];
                left[y[i] as usize] += w[i];

                let lo = x[i].values[feature];
                let hi = x[sorted[k + 1]].values[feature];
                if lo >= hi {
                    continue;
                }

                let right = [totals[0] - left[0], totals[1] - left[1]];
                let w_left = left[0] + left[1];
                let w_right = total - w_left;
                let impurity = (w_left * gini(left) + w_right * gini(right)) / total;

                if best.map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best.filter(|b| b.impurity < parent - IMPURITY_EPSILON)
    }
}
