/*
 * dispatch.rs
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

//! Result callback dispatch for list-shaped responses.
//!
//! A [`ListShape`] names the array to iterate and maps each admitted field of an element
//! into a slot. While the body is decoded, a [`ListCollector`] fills one slot per element
//! up to the caller's limit, storing strings in the client's [`StringArena`]; elements past
//! the limit are skipped by the decoder and only counted. Once the array is closed the
//! total is known and [`dispatch`] hands each slot to the callback as an [`ElementRef`],
//! a view that cannot outlive the arena borrow.

use tracing::{trace, warn};

use crate::arena::{Span, StringArena};
use crate::json::{FieldSink, Filter, Scalar};

/// Callback verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl From<bool> for Flow {
    /// `true` continues, `false` stops.
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }
}

/// Outcome of a list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// HTTP status of the response.
    pub status: u16,
    /// Callback invocations.
    pub delivered: usize,
    /// Elements the server returned.
    pub total: usize,
    /// The arena filled before `limit` elements were collected. Delivered elements are
    /// complete; the ones after them were counted but not kept.
    pub truncated: bool,
}

/// How to decode one kind of list.
pub struct ListShape<S> {
    /// Allowlist for the whole document.
    pub filter: Filter,
    /// Dotted path of the array, e.g. `devices` or `tracks.items`.
    pub list_path: &'static str,
    /// Store a field of the current element. `path` is relative to the element and the
    /// indices are those of arrays nested inside it, outermost first.
    pub on_field: fn(&mut S, &str, &[usize], Scalar<'_>, &mut StringArena),
}

/// Borrowed view of one decoded element. Valid only inside the callback it is passed to.
pub struct ElementRef<'a, S> {
    slot: &'a S,
    arena: &'a StringArena,
}

impl<'a, S> ElementRef<'a, S> {
    pub(crate) fn new(slot: &'a S, arena: &'a StringArena) -> Self {
        Self { slot, arena }
    }

    pub fn slot(&self) -> &'a S {
        self.slot
    }

    /// Text of a span recorded in this element's slot.
    pub fn text(&self, span: Span) -> &'a str {
        self.arena.get(span)
    }
}

impl<S> Clone for ElementRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ElementRef<'_, S> {}

/// Field sink that fills list slots while a body is decoded.
pub struct ListCollector<'c, S> {
    shape: &'c ListShape<S>,
    arena: &'c mut StringArena,
    slots: Vec<S>,
    element_prefix: String,
    depth: usize,
    limit: usize,
    total: usize,
    /// Arena usage when the current element started; None while not collecting.
    element_mark: Option<usize>,
    overflowed: bool,
}

impl<'c, S: Default> ListCollector<'c, S> {
    /// Collector for at most `limit` elements. Resets `arena`.
    pub fn new(shape: &'c ListShape<S>, arena: &'c mut StringArena, limit: usize) -> Self {
        arena.reset();
        let mut element_prefix = String::with_capacity(shape.list_path.len() + 2);
        if !shape.list_path.is_empty() {
            element_prefix.push_str(shape.list_path);
            element_prefix.push('.');
        }
        element_prefix.push('#');
        Self {
            shape,
            arena,
            slots: Vec::new(),
            element_prefix,
            depth: shape.list_path.matches('#').count() + 1,
            limit,
            total: 0,
            element_mark: None,
            overflowed: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn collected(&self) -> usize {
        self.slots.len()
    }

    /// True once an element did not fit in the arena; it and every later element were
    /// dropped.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    fn drop_current(&mut self, mark: usize) {
        self.slots.pop();
        self.arena.rollback(mark);
        self.element_mark = None;
        self.overflowed = true;
        warn!(
            kept = self.slots.len(),
            capacity = self.arena.capacity(),
            "result arena full; remaining elements dropped"
        );
    }

    /// Hand the collected slots to `callback`; see [`dispatch`].
    pub fn dispatch<F>(&self, callback: F) -> usize
    where
        F: FnMut(ElementRef<'_, S>, usize, usize) -> Flow,
    {
        dispatch(&self.slots, &*self.arena, self.total, callback)
    }
}

impl<S: Default> FieldSink for ListCollector<'_, S> {
    fn field(&mut self, path: &str, indices: &[usize], value: Scalar<'_>) {
        let Some(rest) = path.strip_prefix(self.element_prefix.as_str()) else {
            return;
        };
        let relative = match rest.strip_prefix('.') {
            Some(r) => r,
            None if rest.is_empty() => rest,
            // a sibling whose name merely starts with the list name
            None => return,
        };
        let Some(mark) = self.element_mark else {
            return;
        };
        let nested = indices.get(self.depth..).unwrap_or(&[]);
        if let Some(slot) = self.slots.last_mut() {
            (self.shape.on_field)(slot, relative, nested, value, self.arena);
        }
        if self.arena.exhausted() {
            self.drop_current(mark);
        }
    }

    fn accept_element(&mut self, path: &str, index: usize) -> bool {
        if path != self.shape.list_path {
            return true;
        }
        self.total = self.total.max(index + 1);
        if index < self.limit && !self.overflowed {
            self.element_mark = Some(self.arena.used());
            self.slots.push(S::default());
            true
        } else {
            trace!(index, "list element skipped");
            self.element_mark = None;
            false
        }
    }
}

/// Invoke `callback(element, index, total)` for each slot in order until it returns
/// [`Flow::Stop`]. Returns the number of invocations.
pub fn dispatch<S, F>(slots: &[S], arena: &StringArena, total: usize, mut callback: F) -> usize
where
    F: FnMut(ElementRef<'_, S>, usize, usize) -> Flow,
{
    let mut delivered = 0;
    for (index, slot) in slots.iter().enumerate() {
        delivered += 1;
        if callback(ElementRef::new(slot, arena), index, total) == Flow::Stop {
            break;
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{decode_filtered, DecodeBudget, PathTracker, SliceSource};

    #[derive(Default)]
    struct NameSlot {
        name: Span,
        volume: Option<u64>,
    }

    fn name_field(slot: &mut NameSlot, path: &str, _: &[usize], value: Scalar<'_>, arena: &mut StringArena) {
        match path {
            "name" => {
                if let Some(s) = value.as_str() {
                    slot.name = arena.alloc(s, 80);
                }
            }
            "volume_percent" => slot.volume = value.as_u64(),
            _ => {}
        }
    }

    fn shape() -> ListShape<NameSlot> {
        ListShape {
            filter: Filter::object().child(
                "devices",
                Filter::array(Filter::object().field("name").field("volume_percent")),
            ),
            list_path: "devices",
            on_field: name_field,
        }
    }

    fn twelve_devices() -> String {
        let items: Vec<String> = (0..12)
            .map(|i| format!(r#"{{"id":"x{i}","name":"dev{i}","volume_percent":{i}}}"#))
            .collect();
        format!(r#"{{"devices":[{}],"devicesExtra":[{{"name":"no"}}]}}"#, items.join(","))
    }

    fn collect<'c>(
        shape: &'c ListShape<NameSlot>,
        arena: &'c mut StringArena,
        json: &str,
        limit: usize,
    ) -> ListCollector<'c, NameSlot> {
        let mut tracker = PathTracker::new(ListCollector::new(shape, arena, limit));
        decode_filtered(
            SliceSource::new(json.as_bytes()),
            &shape.filter,
            DecodeBudget::default(),
            &mut tracker,
        )
        .unwrap();
        tracker.into_sink()
    }

    #[test]
    fn limit_bounds_callbacks_total_counts_all() {
        let shape = shape();
        let mut arena = StringArena::with_capacity(256);
        let json = twelve_devices();
        let collector = collect(&shape, &mut arena, &json, 5);
        let mut seen = Vec::new();
        let delivered = collector.dispatch(|el, index, total| {
            seen.push((el.text(el.slot().name).to_string(), index, total));
            Flow::Continue
        });
        assert_eq!(delivered, 5);
        assert_eq!(
            seen,
            (0..5).map(|i| (format!("dev{i}"), i, 12)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn stop_ends_early() {
        let shape = shape();
        let mut arena = StringArena::with_capacity(256);
        let json = twelve_devices();
        let collector = collect(&shape, &mut arena, &json, 10);
        let mut calls = 0;
        let delivered = collector.dispatch(|el, index, _| {
            calls += 1;
            assert_eq!(el.slot().volume, Some(index as u64));
            Flow::from(index < 2)
        });
        assert_eq!(delivered, 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn empty_list() {
        let shape = shape();
        let mut arena = StringArena::with_capacity(16);
        let collector = collect(&shape, &mut arena, r#"{"devices":[]}"#, 5);
        assert_eq!(collector.total(), 0);
        assert_eq!(collector.dispatch(|_, _, _| Flow::Continue), 0);
    }

    #[test]
    fn element_that_overflows_the_arena_is_dropped() {
        let shape = shape();
        // room for two four-byte names
        let mut arena = StringArena::with_capacity(10);
        let json = r#"{"devices":[{"name":"aaaa"},{"name":"bbbb"},{"name":"cccc","volume_percent":3},{"name":"dddd"}]}"#;
        let collector = collect(&shape, &mut arena, json, 10);
        assert!(collector.overflowed());
        assert_eq!(collector.collected(), 2);
        assert_eq!(collector.total(), 4);
        let mut names = Vec::new();
        collector.dispatch(|el, _, total| {
            names.push((el.text(el.slot().name).to_string(), el.slot().volume, total));
            Flow::Continue
        });
        assert_eq!(
            names,
            [("aaaa".to_string(), None, 4), ("bbbb".to_string(), None, 4)]
        );
    }

    #[test]
    fn huge_limit_allocates_lazily() {
        let shape = shape();
        let mut arena = StringArena::with_capacity(64);
        let collector = collect(&shape, &mut arena, &twelve_devices(), usize::MAX);
        assert_eq!(collector.collected(), 12);
        assert!(!collector.overflowed());
    }
}
