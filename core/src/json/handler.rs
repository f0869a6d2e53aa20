/*
 * handler.rs
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

//! Content handler for JSON decode events.

use crate::json::number::JsonNumber;

/// Handler for JSON parsing events. The decoder calls these methods only for values the
/// filter admits; everything else is skipped without an event.
/// String/key data is valid only for the duration of the call.
pub trait JsonContentHandler {
    fn start_object(&mut self);
    fn end_object(&mut self);
    fn start_array(&mut self);
    fn end_array(&mut self);
    fn number_value(&mut self, number: JsonNumber);
    fn string_value(&mut self, value: &str);
    fn boolean_value(&mut self, value: bool);
    fn null_value(&mut self);
    /// Key (property name) in an object; always follows start_object or a previous value.
    fn key(&mut self, key: &str);

    /// A string that did not fit the decoder's scratch budget. `prefix` is the longest
    /// prefix that did, cut on a character boundary.
    fn truncated_string_value(&mut self, prefix: &str) {
        self.string_value(prefix);
    }

    /// Called before each element of an admitted array. Returning false skips the element
    /// (no events are delivered for it) while the decoder still validates its syntax.
    fn start_element(&mut self, _index: usize) -> bool {
        true
    }
}
