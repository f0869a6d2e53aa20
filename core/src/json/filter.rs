/*
 * filter.rs
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

//! Field allowlist: a tree mirroring the part of a document the caller wants.
//!
//! ```
//! use spindle_core::json::Filter;
//!
//! let filter = Filter::object()
//!     .field("is_playing")
//!     .child("item", Filter::object().field("name"));
//! assert!(filter.get("item").is_some());
//! assert!(filter.get("device").is_none());
//! ```

use std::borrow::Cow;

static ACCEPT: Filter = Filter::Accept;

/// Declarative allowlist. Siblings not listed are skipped by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Admit the whole value, whatever its shape.
    Accept,
    /// Admit an object, but only the listed members.
    Object(Vec<(Cow<'static, str>, Filter)>),
    /// Admit an array; every element is filtered with the inner filter.
    Array(Box<Filter>),
}

impl Filter {
    pub fn accept() -> Self {
        Filter::Accept
    }

    /// Empty object filter; add members with [`field`](Self::field) and [`child`](Self::child).
    pub fn object() -> Self {
        Filter::Object(Vec::new())
    }

    /// Array filter applying `element` to each element.
    pub fn array(element: Filter) -> Self {
        Filter::Array(Box::new(element))
    }

    /// Admit a member whole. No-op on non-object filters.
    pub fn field(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.child(name, Filter::Accept)
    }

    /// Admit a member filtered by `filter`. A repeated name replaces the earlier entry.
    pub fn child(mut self, name: impl Into<Cow<'static, str>>, filter: Filter) -> Self {
        if let Filter::Object(ref mut members) = self {
            let name = name.into();
            match members.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = filter,
                None => members.push((name, filter)),
            }
        }
        self
    }

    /// Filter for the member `key`, or None when the member is not admitted.
    pub fn get(&self, key: &str) -> Option<&Filter> {
        match self {
            Filter::Accept => Some(&ACCEPT),
            Filter::Object(members) => members.iter().find(|(k, _)| k == key).map(|(_, f)| f),
            Filter::Array(_) => None,
        }
    }

    /// Filter for array elements, or None when arrays are not admitted here.
    pub fn element(&self) -> Option<&Filter> {
        match self {
            Filter::Accept => Some(&ACCEPT),
            Filter::Array(inner) => Some(inner),
            Filter::Object(_) => None,
        }
    }

    pub(crate) fn admits_object(&self) -> bool {
        matches!(self, Filter::Accept | Filter::Object(_))
    }

    pub(crate) fn admits_array(&self) -> bool {
        matches!(self, Filter::Accept | Filter::Array(_))
    }

    pub(crate) fn admits_scalar(&self) -> bool {
        matches!(self, Filter::Accept)
    }
}
