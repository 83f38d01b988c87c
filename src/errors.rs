// ABOUTME: Structured error types for the query helper operations
// ABOUTME: One recoverable-then-fatal kind (query failed) plus pool acquisition failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Errors surfaced by the query helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// A statement failed on both attempts.
    ///
    /// The message carries the fully rendered query text; the driver error
    /// from the final attempt is attached as the source for diagnosability.
    #[error("query has failed: {query}")]
    QueryFailed {
        /// Rendered SQL text of the statement that exhausted its retry budget
        query: String,
        /// Driver error from the last attempt
        #[source]
        source: anyhow::Error,
    },

    /// Leasing a connection from the pool failed. Acquisition is not retried.
    #[error("failed to acquire a pooled connection")]
    Connect(#[source] anyhow::Error),
}
