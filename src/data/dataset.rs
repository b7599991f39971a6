use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::sentiment::Sentiment;

/// One encoded, fixed-length training sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSample {
    pub input_ids: Vec<u32>,
    pub label:     Sentiment,
}

impl SentimentSample {
    pub fn new(input_ids: Vec<u32>, label: Sentiment) -> Self {
        Self { input_ids, label }
    }
}

pub struct SentimentDataset {
    samples: Vec<SentimentSample>,
}

impl SentimentDataset {
    pub fn new(samples: Vec<SentimentSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<SentimentSample> for SentimentDataset {
    fn get(&self, index: usize) -> Option<SentimentSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
