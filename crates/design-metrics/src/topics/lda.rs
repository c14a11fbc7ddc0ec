//! Latent Dirichlet Allocation by collapsed Gibbs sampling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::vectorize::DocumentTermCounts;
use crate::utils::Matrix;

/// Sweeps over every token.
pub const ITERATIONS: usize = 200;

/// Fitted LDA matrices.
#[derive(Debug, Clone)]
pub struct LdaFit {
    /// `topics × terms` pseudo-counts (`n_kw + eta`).
    pub components: Matrix,
    /// `documents × topics` proportions; rows sum to one.
    pub doc_topics: Matrix,
}

/// Fit `topics` topics with symmetric priors `alpha = eta = 1/topics`.
#[must_use]
pub fn fit(counts: &DocumentTermCounts, topics: usize, seed: u64) -> LdaFit {
    let vocab = counts.vocabulary.len();
    let docs = counts.documents.len();
    let prior = 1.0 / topics as f64;
    let (alpha, eta) = (prior, prior);
    let mut rng = StdRng::seed_from_u64(seed);

    // One entry per token occurrence: (document, term).
    let tokens: Vec<(usize, usize)> = counts
        .documents
        .iter()
        .enumerate()
        .flat_map(|(d, terms)| {
            terms.iter().flat_map(move |&(w, c)| std::iter::repeat_n((d, w), c as usize))
        })
        .collect();

    let mut doc_topic = vec![0u32; docs * topics];
    let mut topic_term = vec![0u32; topics * vocab];
    let mut topic_total = vec![0u32; topics];
    let mut assignment = Vec::with_capacity(tokens.len());

    for &(d, w) in &tokens {
        let k = rng.random_range(0..topics);
        assignment.push(k);
        doc_topic[d * topics + k] += 1;
        topic_term[k * vocab + w] += 1;
        topic_total[k] += 1;
    }

    let vocab_eta = vocab as f64 * eta;
    let mut weights = vec![0.0f64; topics];
    for _ in 0..ITERATIONS {
        for (t, &(d, w)) in tokens.iter().enumerate() {
            let old = assignment[t];
            doc_topic[d * topics + old] -= 1;
            topic_term[old * vocab + w] -= 1;
            topic_total[old] -= 1;

            let mut total = 0.0;
            for k in 0..topics {
                let p = (f64::from(doc_topic[d * topics + k]) + alpha)
                    * (f64::from(topic_term[k * vocab + w]) + eta)
                    / (f64::from(topic_total[k]) + vocab_eta);
                total += p;
                weights[k] = total;
            }
            let target = rng.random::<f64>() * total;
            let new = weights.iter().position(|&c| target < c).unwrap_or(topics - 1);

            assignment[t] = new;
            doc_topic[d * topics + new] += 1;
            topic_term[new * vocab + w] += 1;
            topic_total[new] += 1;
        }
    }

    let mut components = Matrix::zeros(topics, vocab);
    for k in 0..topics {
        for w in 0..vocab {
            components.set(k, w, f64::from(topic_term[k * vocab + w]) + eta);
        }
    }

    let mut doc_topics = Matrix::zeros(docs, topics);
    for d in 0..docs {
        let length: u32 = (0..topics).map(|k| doc_topic[d * topics + k]).sum();
        let denominator = f64::from(length) + topics as f64 * alpha;
        for k in 0..topics {
            doc_topics.set(d, k, (f64::from(doc_topic[d * topics + k]) + alpha) / denominator);
        }
    }

    tracing::debug!(topics, documents = docs, tokens = tokens.len(), "Fitted LDA");
    LdaFit { components, doc_topics }
}
