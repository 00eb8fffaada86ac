// SPDX-License-Identifier: MIT

//! Data-plane wire protocol between a worker and one connected client.
//!
//! Framing: one JSON text value per message, tagged by a `type` field.
//! Binary frames are rejected at the transport layer before reaching this codec.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod inbound;
mod outbound;

pub use inbound::{Inbound, LandmarksSequence};
pub use outbound::{ClassificationResult, Outbound};
