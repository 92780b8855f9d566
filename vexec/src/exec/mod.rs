// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query execution context and errors

pub mod context;
pub mod error;

pub use context::ExecutionContext;
pub use error::{ExecutionError, ExecutionResult};
