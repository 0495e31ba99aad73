// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("message has no signature, cannot push: {0}")]
    Unsigned(String),
}
