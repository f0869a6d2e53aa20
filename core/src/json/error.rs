/*
 * error.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Spindle, a memory-bounded JSON web API client.
 *
 * Spindle is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Decode errors with diagnostic codes.

use std::io;

use thiserror::Error;

/// Error during filtered JSON decoding. Output populated before the error must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended before any value started.
    #[error("empty input")]
    EmptyInput,
    /// The input ended in the middle of a value.
    #[error("incomplete input at byte {offset}")]
    IncompleteInput { offset: usize },
    /// The input is not valid JSON.
    #[error("invalid input at byte {offset}: {message}")]
    InvalidInput { offset: usize, message: &'static str },
    /// Nesting exceeded the budget's depth limit.
    #[error("nesting deeper than {limit} levels")]
    TooDeep { limit: usize },
    /// A token that cannot be truncated (a number) did not fit the scratch budget.
    #[error("token exceeds decode budget of {limit} bytes")]
    NoMemory { limit: usize },
    /// The transport failed while the body was being read.
    #[error("transport read failed: {0:?}")]
    Io(io::ErrorKind),
}

impl DecodeError {
    /// Short diagnostic code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::EmptyInput => "EmptyInput",
            DecodeError::IncompleteInput { .. } => "IncompleteInput",
            DecodeError::InvalidInput { .. } => "InvalidInput",
            DecodeError::TooDeep { .. } => "TooDeep",
            DecodeError::NoMemory { .. } => "NoMemory",
            DecodeError::Io(_) => "Io",
        }
    }

    pub(crate) fn invalid(offset: usize, message: &'static str) -> Self {
        DecodeError::InvalidInput { offset, message }
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        DecodeError::Io(e.kind())
    }
}
