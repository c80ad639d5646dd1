// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout queueflow. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names consistent between the human-readable and structured output
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::queue` - Queue lifecycle: creation, naming, closing, rejected pushes
//! * `messages::operator` - Operator stage lifecycle and error routing
//!
//! # Usage
//!
//! ```rust
//! use queueflow::observability::messages::queue::QueueClosed;
//! use queueflow::observability::messages::StructuredLog;
//!
//! let msg = QueueClosed {
//!     queue: "results",
//!     consumers: 2,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
