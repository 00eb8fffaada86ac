// SPDX-License-Identifier: MIT

//! Messages a client may send to a worker.

use serde::{Deserialize, Serialize};
use signrt_core::LandmarkFrame;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Ping,
    Landmarks {
        data: LandmarkFrame,
    },
    LandmarksSequence {
        data: LandmarksSequence,
    },
}

/// A batch of frames, processed by the worker in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandmarksSequence {
    pub sequence: Vec<LandmarkFrame>,
    pub frame_count: u64,
    pub timestamp: f64,
}
