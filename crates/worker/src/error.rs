// SPDX-License-Identifier: MIT

use thiserror::Error;

use signrt_core::ModelDescriptorError;

use crate::classifier::ClassifierError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to read descriptor {path}: {source}")]
    DescriptorIo { path: String, source: std::io::Error },
    #[error("invalid descriptor {path}: {source}")]
    DescriptorInvalid { path: String, source: ModelDescriptorError },
    #[error("failed to load classifier: {0}")]
    ClassifierLoad(#[from] ClassifierError),
    #[error("failed to bind listener on port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("malformed inbound message: {0}")]
    Protocol(String),
}
