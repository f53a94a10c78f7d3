// SDB - SQL Script Debugger
// Copyright (C) 2026 The SDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! SDB Common - Shared functionality for SDB components
//!
//! This crate provides the pieces shared by the debug adapter and the
//! client: the wire-frame codec, breakpoint bookkeeping, variable and
//! scope value types, condition-expression helpers, and the stepping
//! algorithm both sides simulate execution with.

/// Protocol types used throughout SDB: frames, breakpoints, variables, scopes and threads
pub mod types;

/// Condition-expression helpers shared by breakpoint conditions and `evaluate`
pub mod expression;
/// Logging setup and utilities for consistent logging across SDB components
pub mod logging;
/// The pure breakpoint/stepping algorithm shared by the adapter and the client
pub mod stepping;

pub use expression::*;
pub use logging::*;
pub use stepping::*;
