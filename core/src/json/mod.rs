/*
 * mod.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Spindle, a memory-bounded JSON web API client.
 *
 * Spindle is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Spindle is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Spindle.  If not, see <http://www.gnu.org/licenses/>.
 */

//! JSON: a filtered pull decoder that reads straight off the transport, path-addressed
//! field events on top of it, and a streaming writer for request bodies.
//!
//! - [`Filter`] declares which part of a document is wanted.
//! - [`decode_filtered`] walks the document once, skipping everything else, and delivers
//!   events on a [`JsonContentHandler`].
//! - [`PathTracker`] turns those events into `(path, indices, value)` calls on a [`FieldSink`].

mod error;
mod filter;
mod handler;
mod number;
mod parser;
mod path;
mod source;
mod writer;

pub use error::DecodeError;
pub use filter::Filter;
pub use handler::JsonContentHandler;
pub use number::JsonNumber;
pub use parser::{decode_filtered, DecodeBudget, FilteredDecoder};
pub use path::{FieldSink, PathTracker, Scalar};
pub use source::{ByteSource, SliceSource, TransportSource};
pub use writer::JsonWriter;
