use anyhow::{ensure, Result};
use std::collections::{BTreeMap, HashMap};

mod ranker;
mod tokenizer;

pub use ranker::shortlist;
pub use tokenizer::Tokenizer;

use crate::transaction::Transaction;

/// Probability assigned to terms a class has never seen.
const UNSEEN_TERM_PROBABILITY: f64 = 1e-11;

#[derive(Debug, Default)]
struct TrainingData {
    /// Per term, one term-frequency sample per learned document.
    term_frequencies: HashMap<String, Vec<f64>>,
    /// Number of terms learned for this class.
    total: usize,
}

/// Collects labeled examples. TF-IDF weights are only computed once in [`ClassifierBuilder::build`].
#[derive(Debug)]
pub struct ClassifierBuilder {
    tokenizer: Tokenizer,
    classes: BTreeMap<String, TrainingData>,
    learned: usize,
}

impl ClassifierBuilder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            classes: BTreeMap::new(),
            learned: 0,
        }
    }

    /// Descriptions without any terms carry no signal and are ignored.
    pub fn learn(&mut self, description: &str, class: &str) {
        let terms = self.tokenizer.tokenize(description);
        if terms.is_empty() {
            return;
        }
        let data = self.classes.entry(class.to_string()).or_default();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for term in &terms {
            *counts.entry(term.as_str()).or_default() += 1;
        }
        let document_len = terms.len() as f64;
        for (term, count) in counts {
            data.term_frequencies
                .entry(term.to_string())
                .or_default()
                .push(count as f64 / document_len);
        }
        data.total += terms.len();
        self.learned += 1;
    }

    pub fn build(self) -> Result<Classifier> {
        ensure!(
            self.classes.len() >= 2,
            "Expected at least two categories to train the classifier, found {}",
            self.classes.len(),
        );
        let learned = self.learned as f64;
        let (classes, data): (Vec<String>, Vec<ClassData>) = self
            .classes
            .into_iter()
            .map(|(class, training)| {
                let idf = (learned / training.total as f64).ln_1p();
                let weights = training
                    .term_frequencies
                    .into_iter()
                    .map(|(term, samples)| {
                        let weight = samples.iter().map(|tf| tf.ln_1p() * idf).sum();
                        (term, weight)
                    })
                    .collect();
                (
                    class,
                    ClassData {
                        weights,
                        total: training.total,
                    },
                )
            })
            .unzip();
        let all_terms: usize = data.iter().map(|d| d.total).sum();
        let log_priors = data
            .iter()
            .map(|d| (d.total as f64 / all_terms as f64).ln())
            .collect();
        for class in &classes {
            log::debug!("Class: {class}");
        }
        Ok(Classifier {
            tokenizer: self.tokenizer,
            classes,
            data,
            log_priors,
        })
    }
}

#[derive(Debug)]
struct ClassData {
    weights: HashMap<String, f64>,
    total: usize,
}

impl ClassData {
    fn term_probability(&self, term: &str) -> f64 {
        match self.weights.get(term) {
            Some(weight) => weight / self.total as f64,
            None => UNSEEN_TERM_PROBABILITY,
        }
    }
}

/// Multinomial naive Bayes over TF-IDF weighted description terms.
#[derive(Debug)]
pub struct Classifier {
    tokenizer: Tokenizer,
    classes: Vec<String>,
    data: Vec<ClassData>,
    log_priors: Vec<f64>,
}

impl Classifier {
    /// Trains on the target accounts of `history`, skipping transfers and
    /// asset/equity/liability targets.
    pub fn train(history: &[Transaction], tokenizer: Tokenizer) -> Result<Self> {
        let mut builder = ClassifierBuilder::new(tokenizer);
        for transaction in history {
            if transaction.skip_classification || transaction.to_account.is_empty() {
                continue;
            }
            builder.learn(&transaction.description, &transaction.to_account);
        }
        builder.build()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// One log-likelihood per class, in the order of [`Classifier::classes`].
    pub fn log_scores(&self, description: &str) -> Vec<f64> {
        let terms = self.tokenizer.tokenize(description);
        self.data
            .iter()
            .zip(&self.log_priors)
            .map(|(data, log_prior)| {
                log_prior
                    + terms
                        .iter()
                        .map(|term| data.term_probability(term).ln())
                        .sum::<f64>()
            })
            .collect()
    }

    /// The most likely categories for `description`, best first. Never empty.
    pub fn top_hits(&self, description: &str) -> Vec<&str> {
        shortlist(&self.log_scores(description))
            .into_iter()
            .map(|index| self.classes[index].as_str())
            .collect()
    }
}
