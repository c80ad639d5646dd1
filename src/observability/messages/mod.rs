// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with typed fields attached.
//!
//! # Usage Pattern
//!
//! ```rust
//! use queueflow::observability::messages::operator::StageAttached;
//! use queueflow::observability::messages::StructuredLog;
//!
//! let msg = StageAttached {
//!     stage: "map",
//!     source: "numbers",
//!     destination: "#3",
//! };
//!
//! let span = msg.span("stage");
//! let _guard = span.enter();
//! msg.log();
//! ```

use tracing::Span;

pub mod operator;
pub mod queue;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the event at the message's level.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
