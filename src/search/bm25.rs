//! BM25-style ranking of the documents matched by a query.
//!
//! The "document frequency" of a word is the sum of its frequencies over
//! the matched documents (not the number of documents containing it), and
//! the collection is the match set itself.

use std::collections::{BTreeMap, HashMap};

use derivative::Derivative;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{Score, ScoredDocument};
use crate::base::DocId;

#[derive(Derivative, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
pub struct Bm25Parameters {
    /// Term frequency saturation
    #[derivative(Default(value = "2.0"))]
    pub k1: f64,

    /// Document length normalization
    #[derivative(Default(value = "0.75"))]
    pub b: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Bm25 {
    parameters: Bm25Parameters,
}

impl Bm25 {
    pub fn new(parameters: Bm25Parameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &Bm25Parameters {
        &self.parameters
    }

    /// `ln((N - df + 0.5) / (df + 0.5))`
    ///
    /// `N - df` wraps around when `df > N`, which makes the IDF of very
    /// frequent words large and positive.
    pub fn idf(documents: u64, frequency: u64) -> Score {
        ((documents.wrapping_sub(frequency) as f64 + 0.5) / (frequency as f64 + 0.5)).ln()
    }

    /// Saturated term frequency, normalized by the document length
    pub fn tf(&self, frequency: u64, length: u64, average_length: f64) -> Score {
        let Bm25Parameters { k1, b } = self.parameters;
        let f = frequency as f64;
        let ratio = if average_length > 0. {
            length as f64 / average_length
        } else {
            0.
        };
        f * (k1 + 1.) / (f + k1 * (1. - b + b * ratio))
    }

    pub fn score(
        &self,
        documents: u64,
        document_frequency: u64,
        frequency: u64,
        length: u64,
        average_length: f64,
    ) -> Score {
        Self::idf(documents, document_frequency) * self.tf(frequency, length, average_length)
    }
}

/// Ranks a set of matched documents
#[derive(Clone, Copy, Debug, Default)]
pub struct Bm25Ranker {
    bm25: Bm25,
}

impl Bm25Ranker {
    pub fn new(parameters: Bm25Parameters) -> Self {
        Self {
            bm25: Bm25::new(parameters),
        }
    }

    /// Scores every document of `lengths` (the match set, with the number of
    /// words of each document) and returns them by decreasing score.
    ///
    /// `frequencies` gives, for each query word found in the index, its
    /// frequency in the documents where it occurs; entries for documents
    /// outside the match set are ignored.
    pub fn rank(
        &self,
        lengths: &BTreeMap<DocId, u64>,
        frequencies: &HashMap<String, BTreeMap<DocId, u64>>,
    ) -> Vec<ScoredDocument> {
        if lengths.is_empty() {
            return Vec::new();
        }

        let documents = lengths.len() as u64;
        let average_length = lengths.values().sum::<u64>() as f64 / documents as f64;

        let mut scores: BTreeMap<DocId, Score> = BTreeMap::new();
        for (word, word_frequencies) in frequencies.iter() {
            let document_frequency: u64 = word_frequencies
                .iter()
                .filter(|(docid, _)| lengths.contains_key(docid))
                .map(|(_, frequency)| frequency)
                .sum();
            debug!(
                "{}: frequency {} over {} documents",
                word, document_frequency, documents
            );

            for (&docid, &length) in lengths.iter() {
                let frequency = word_frequencies.get(&docid).copied().unwrap_or(0);
                *scores.entry(docid).or_insert(0.) += self.bm25.score(
                    documents,
                    document_frequency,
                    frequency,
                    length,
                    average_length,
                );
            }
        }

        let mut ranked: Vec<ScoredDocument> = scores
            .into_iter()
            .map(|(docid, score)| ScoredDocument { docid, score })
            .collect();
        ranked.sort();
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::assert_about_eq;

    #[test]
    fn test_default_parameters() {
        let parameters = Bm25Parameters::default();
        assert_about_eq!(parameters.k1, 2.0);
        assert_about_eq!(parameters.b, 0.75);
    }

    #[test]
    fn test_idf() {
        assert_about_eq!(Bm25::idf(1000, 10), 4.546835, 1e-5);
        assert_about_eq!(Bm25::idf(1000, 500), 0.0, 1e-5);
        assert_about_eq!(Bm25::idf(1000, 999), -6.501790, 1e-5);
    }

    #[test]
    fn test_idf_frequency_above_documents() {
        // 2 - 3 wraps around
        let idf = Bm25::idf(2, 3);
        assert!(idf > 0.);
        assert_about_eq!(idf, ((u64::MAX as f64 + 0.5) / 3.5).ln(), 1e-9);
    }

    #[test]
    fn test_tf() {
        let bm25 = Bm25::default();
        // 9 / 6.5
        assert_about_eq!(bm25.tf(3, 100, 50.), 1.384615, 1e-5);
        // 15 / 7
        assert_about_eq!(bm25.tf(5, 100, 100.), 2.142857, 1e-5);
        assert_about_eq!(bm25.tf(1, 50, 50.), 1.0, 1e-9);
        assert_about_eq!(bm25.tf(0, 50, 50.), 0.0);
    }

    #[test]
    fn test_tf_empty_documents() {
        let bm25 = Bm25::default();
        // k1 * (1 - b) = 0.5
        assert_about_eq!(bm25.tf(1, 0, 0.), 3. / 1.5, 1e-9);
    }

    #[test]
    fn test_score() {
        let bm25 = Bm25::default();
        assert_about_eq!(
            bm25.score(1000, 10, 3, 100, 50.),
            Bm25::idf(1000, 10) * bm25.tf(3, 100, 50.),
            1e-9
        );
    }

    #[test]
    fn test_rank() {
        let lengths: BTreeMap<DocId, u64> = (1..=10).map(|docid| (docid, 10)).collect();
        let mut frequencies = HashMap::new();
        frequencies.insert(
            "word".to_string(),
            [(1, 1), (3, 2), (42, 100)].into_iter().collect::<BTreeMap<_, _>>(),
        );

        let ranked = Bm25Ranker::default().rank(&lengths, &frequencies);
        assert_eq!(ranked.len(), 10);
        let docids: Vec<DocId> = ranked.iter().map(|d| d.docid).collect();
        assert_eq!(docids[..3], [3, 1, 2]);

        // df = 3 for N = 10, and L = Lavg
        let bm25 = Bm25::default();
        assert_about_eq!(ranked[0].score, Bm25::idf(10, 3) * bm25.tf(2, 10, 10.), 1e-9);
        assert_about_eq!(ranked[1].score, Bm25::idf(10, 3) * bm25.tf(1, 10, 10.), 1e-9);
        assert_about_eq!(ranked[9].score, 0.0);
    }

    #[test]
    fn test_rank_sums_words() {
        let lengths: BTreeMap<DocId, u64> = [(1, 4), (2, 12)].into_iter().collect();
        let mut frequencies = HashMap::new();
        frequencies.insert("a".to_string(), [(1, 1)].into_iter().collect());
        frequencies.insert("b".to_string(), [(1, 1), (2, 2)].into_iter().collect());

        let ranked = Bm25Ranker::default().rank(&lengths, &frequencies);
        let bm25 = Bm25::default();
        let expected_1 = Bm25::idf(2, 1) * bm25.tf(1, 4, 8.) + Bm25::idf(2, 3) * bm25.tf(1, 4, 8.);
        let expected_2 = Bm25::idf(2, 3) * bm25.tf(2, 12, 8.);

        let score = |docid| {
            ranked
                .iter()
                .find(|d| d.docid == docid)
                .map(|d| d.score)
                .unwrap()
        };
        assert_about_eq!(score(1), expected_1, 1e-9);
        assert_about_eq!(score(2), expected_2, 1e-9);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_rank_empty() {
        let frequencies = HashMap::new();
        assert!(Bm25Ranker::default()
            .rank(&BTreeMap::new(), &frequencies)
            .is_empty());
    }
}
