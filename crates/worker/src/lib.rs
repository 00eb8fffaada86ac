// SPDX-License-Identifier: MIT

//! The per-client recognition pipeline run inside each spawned worker
//! process: preprocessing, classification, smoothing, session bookkeeping,
//! idle shutdown, and the WebSocket surface that ties them together.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod classifier;
pub mod config;
pub mod error;
pub mod idle;
pub mod preprocess;
pub mod server;
pub mod session;
pub mod smoother;

pub use classifier::{Classifier, ClassifierError, DenseSequenceClassifier};
pub use config::WorkerConfig;
pub use error::WorkerError;
pub use idle::IdleShutdownTimer;
pub use preprocess::preprocess;
pub use session::{ClassificationEvent, SessionManager};
pub use smoother::{SmoothedResult, Smoother};
