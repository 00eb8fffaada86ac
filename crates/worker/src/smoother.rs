// SPDX-License-Identifier: MIT

//! Smooths raw per-window classifier outputs over a short ring buffer to
//! stabilize the reported prediction.

use std::collections::VecDeque;

use ndarray::Array1;

pub struct Smoother {
    window: usize,
    buffer: VecDeque<Array1<f32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedResult {
    pub probabilities: Array1<f32>,
    pub argmax: usize,
    pub confidence: f32,
}

impl Smoother {
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "smoothing window must be positive");
        Self { window, buffer: VecDeque::with_capacity(window) }
    }

    /// Push a raw probability vector and return the smoothed result so far.
    /// Always produces a result once at least one vector has been pushed.
    pub fn push(&mut self, raw: Array1<f32>) -> SmoothedResult {
        if self.buffer.len() == self.window {
            self.buffer.pop_front();
        }
        self.buffer.push_back(raw);

        let mut sum = Array1::zeros(self.buffer[0].len());
        for v in &self.buffer {
            sum += v;
        }
        let mean = sum / self.buffer.len() as f32;

        let (argmax, &confidence) = mean
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, &0.0));

        SmoothedResult { probabilities: mean, argmax, confidence }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
