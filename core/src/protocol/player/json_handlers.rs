/*
 * json_handlers.rs
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

//! Allowlists and field sinks for player API responses.
//!
//! Each response has a filter naming the fields it needs and a sink mapping the dotted
//! paths the decoder reports onto a result type. Owned results copy into bounded
//! strings; list elements copy into the client arena.

use tracing::trace;

use crate::arena::{Span, StringArena};
use crate::bounded::{BoundedStr, Window};
use crate::dispatch::ListShape;
use crate::json::{FieldSink, Filter, Scalar};

use super::types::{
    Artist, CurrentlyPlaying, Device, DeviceSlot, Image, PlayerDetails, PlayingType,
    RepeatMode, SearchSlot, DEVICE_ID_LEN, DEVICE_NAME_LEN, DEVICE_TYPE_LEN, MAX_IMAGES,
    NAME_LEN, URI_LEN, URL_LEN,
};

fn image_filter() -> Filter {
    Filter::object().field("height").field("width").field("url")
}

fn name_uri_filter() -> Filter {
    Filter::object().field("name").field("uri")
}

fn device_filter() -> Filter {
    Filter::object()
        .field("id")
        .field("name")
        .field("type")
        .field("is_active")
        .field("is_private_session")
        .field("is_restricted")
        .field("volume_percent")
}

pub(crate) fn currently_playing_filter() -> Filter {
    let item = Filter::object()
        .field("duration_ms")
        .field("name")
        .field("uri")
        .child("artists", Filter::array(name_uri_filter()))
        .child(
            "album",
            name_uri_filter().child("images", Filter::array(image_filter())),
        )
        // episodes
        .child("show", name_uri_filter())
        .child("images", Filter::array(image_filter()));
    Filter::object()
        .field("is_playing")
        .field("currently_playing_type")
        .field("progress_ms")
        .child("context", Filter::object().field("uri"))
        .child("item", item)
}

pub(crate) fn player_details_filter() -> Filter {
    Filter::object()
        .child("device", device_filter())
        .field("progress_ms")
        .field("is_playing")
        .field("shuffle_state")
        .field("repeat_state")
}

fn set<const N: usize>(dst: &mut BoundedStr<N>, value: Scalar<'_>) {
    if let Some(s) = value.as_str() {
        if dst.set(s) || value.is_truncated() {
            trace!(capacity = N - 1, "string field truncated");
        }
    }
}

fn dimension(value: Scalar<'_>) -> u32 {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

fn volume(value: Scalar<'_>) -> Option<u8> {
    value.as_u64().and_then(|n| u8::try_from(n).ok())
}

fn image_field(image: &mut Image, key: &str, value: Scalar<'_>) {
    match key {
        "height" => image.height = dimension(value),
        "width" => image.width = dimension(value),
        "url" => set(&mut image.url, value),
        _ => {}
    }
}

fn artist_field(artist: &mut Artist, key: &str, value: Scalar<'_>) {
    match key {
        "name" => set(&mut artist.name, value),
        "uri" => set(&mut artist.uri, value),
        _ => {}
    }
}

// ── CurrentlyPlaying ──────────────────────────────────────────────────

/// Sink for `/me/player/currently-playing`. The playing type arrives after the item,
/// so track and episode fields are both collected and reconciled in [`finish`].
///
/// [`finish`]: CurrentlyPlayingSink::finish
#[derive(Debug, Default)]
pub(crate) struct CurrentlyPlayingSink {
    current: CurrentlyPlaying,
    show: Artist,
    episode_images: Window<Image, MAX_IMAGES>,
}

impl CurrentlyPlayingSink {
    pub(crate) fn finish(self) -> CurrentlyPlaying {
        let mut current = self.current;
        if current.playing_type == PlayingType::Episode {
            current.artists.clear();
            current.artists.push_value(self.show);
            current.album_name.clear();
            current.album_uri.clear();
            current.images = self.episode_images;
        }
        current
    }
}

impl FieldSink for CurrentlyPlayingSink {
    fn field(&mut self, path: &str, _indices: &[usize], value: Scalar<'_>) {
        let current = &mut self.current;
        match path {
            "is_playing" => current.is_playing = value.as_bool().unwrap_or(false),
            "progress_ms" => current.progress_ms = value.as_u64().unwrap_or(0),
            "currently_playing_type" => {
                if let Some(s) = value.as_str() {
                    current.playing_type = PlayingType::from_api(s);
                }
            }
            "context.uri" => set(&mut current.context_uri, value),
            "item.duration_ms" => current.duration_ms = value.as_u64().unwrap_or(0),
            "item.name" => set(&mut current.track_name, value),
            "item.uri" => set(&mut current.track_uri, value),
            "item.album.name" => set(&mut current.album_name, value),
            "item.album.uri" => set(&mut current.album_uri, value),
            _ => {
                if let Some(key) = path.strip_prefix("item.artists.#.") {
                    if let Some(artist) = current.artists.last_mut() {
                        artist_field(artist, key, value);
                    }
                } else if let Some(key) = path.strip_prefix("item.album.images.#.") {
                    if let Some(image) = current.images.last_mut() {
                        image_field(image, key, value);
                    }
                } else if let Some(key) = path.strip_prefix("item.images.#.") {
                    if let Some(image) = self.episode_images.last_mut() {
                        image_field(image, key, value);
                    }
                } else if let Some(key) = path.strip_prefix("item.show.") {
                    artist_field(&mut self.show, key, value);
                }
            }
        }
    }

    fn accept_element(&mut self, path: &str, _index: usize) -> bool {
        match path {
            "item.artists" => {
                self.current.artists.push();
                true
            }
            "item.album.images" => {
                self.current.images.push();
                true
            }
            "item.images" => {
                self.episode_images.push();
                true
            }
            _ => true,
        }
    }
}

// ── PlayerDetails ─────────────────────────────────────────────────────

fn device_field(device: &mut Device, key: &str, value: Scalar<'_>) {
    match key {
        "id" => set(&mut device.id, value),
        "name" => set(&mut device.name, value),
        "type" => set(&mut device.kind, value),
        "is_active" => device.is_active = value.as_bool().unwrap_or(false),
        "is_private_session" => device.is_private_session = value.as_bool().unwrap_or(false),
        "is_restricted" => device.is_restricted = value.as_bool().unwrap_or(false),
        "volume_percent" => device.volume_percent = volume(value),
        _ => {}
    }
}

/// Sink for `/me/player`.
#[derive(Debug, Default)]
pub(crate) struct PlayerDetailsSink {
    pub(crate) details: PlayerDetails,
}

impl FieldSink for PlayerDetailsSink {
    fn field(&mut self, path: &str, _indices: &[usize], value: Scalar<'_>) {
        let details = &mut self.details;
        match path {
            "progress_ms" => details.progress_ms = value.as_u64().unwrap_or(0),
            "is_playing" => details.is_playing = value.as_bool().unwrap_or(false),
            "shuffle_state" => details.shuffle_state = value.as_bool().unwrap_or(false),
            "repeat_state" => {
                if let Some(s) = value.as_str() {
                    details.repeat_state = RepeatMode::from_api(s);
                }
            }
            _ => {
                if let Some(key) = path.strip_prefix("device.") {
                    device_field(&mut details.device, key, value);
                }
            }
        }
    }
}

// ── List shapes ───────────────────────────────────────────────────────

fn alloc(arena: &mut StringArena, value: Scalar<'_>, capacity: usize) -> Option<Span> {
    value.as_str().map(|s| arena.alloc(s, capacity - 1))
}

fn device_slot_field(
    slot: &mut DeviceSlot,
    path: &str,
    _nested: &[usize],
    value: Scalar<'_>,
    arena: &mut StringArena,
) {
    match path {
        "id" => slot.id = alloc(arena, value, DEVICE_ID_LEN).unwrap_or_default(),
        "name" => slot.name = alloc(arena, value, DEVICE_NAME_LEN).unwrap_or_default(),
        "type" => slot.kind = alloc(arena, value, DEVICE_TYPE_LEN).unwrap_or_default(),
        "is_active" => slot.is_active = value.as_bool().unwrap_or(false),
        "is_private_session" => slot.is_private_session = value.as_bool().unwrap_or(false),
        "is_restricted" => slot.is_restricted = value.as_bool().unwrap_or(false),
        "volume_percent" => slot.volume_percent = volume(value),
        _ => {}
    }
}

/// `{"devices":[...]}`.
pub(crate) fn devices_shape() -> ListShape<DeviceSlot> {
    ListShape {
        filter: Filter::object().child("devices", Filter::array(device_filter())),
        list_path: "devices",
        on_field: device_slot_field,
    }
}

/// Element `index` of a windowed array, starting elements up to it.
fn window_at<T: Default, const N: usize>(window: &mut Window<T, N>, index: usize) -> Option<&mut T> {
    while window.seen() <= index {
        window.push();
    }
    window.last_mut()
}

fn search_slot_field(
    slot: &mut SearchSlot,
    path: &str,
    nested: &[usize],
    value: Scalar<'_>,
    arena: &mut StringArena,
) {
    let inner = nested.first().copied().unwrap_or(0);
    match path {
        "name" => slot.track_name = alloc(arena, value, NAME_LEN).unwrap_or_default(),
        "uri" => slot.track_uri = alloc(arena, value, URI_LEN).unwrap_or_default(),
        "album.name" => slot.album_name = alloc(arena, value, NAME_LEN).unwrap_or_default(),
        "album.uri" => slot.album_uri = alloc(arena, value, URI_LEN).unwrap_or_default(),
        "artists.#.name" | "artists.#.uri" => {
            if let Some(artist) = window_at(&mut slot.artists, inner) {
                match path {
                    "artists.#.name" => artist.name = alloc(arena, value, NAME_LEN).unwrap_or_default(),
                    _ => artist.uri = alloc(arena, value, URI_LEN).unwrap_or_default(),
                }
            }
        }
        _ => {
            let Some(key) = path.strip_prefix("album.images.#.") else {
                return;
            };
            if let Some(image) = window_at(&mut slot.images, inner) {
                match key {
                    "height" => image.height = dimension(value),
                    "width" => image.width = dimension(value),
                    "url" => image.url = alloc(arena, value, URL_LEN).unwrap_or_default(),
                    _ => {}
                }
            }
        }
    }
}

/// `{"tracks":{"items":[...]}}`.
pub(crate) fn search_shape() -> ListShape<SearchSlot> {
    let item = name_uri_filter()
        .child("artists", Filter::array(name_uri_filter()))
        .child(
            "album",
            name_uri_filter().child("images", Filter::array(image_filter())),
        );
    ListShape {
        filter: Filter::object().child(
            "tracks",
            Filter::object().child("items", Filter::array(item)),
        ),
        list_path: "tracks.items",
        on_field: search_slot_field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Flow, ListCollector};
    use crate::protocol::player::types::MAX_ARTISTS;
    use crate::json::{decode_filtered, DecodeBudget, PathTracker, SliceSource};

    fn decode<S: FieldSink>(json: &str, filter: &Filter, sink: S) -> S {
        let mut tracker = PathTracker::new(sink);
        decode_filtered(
            SliceSource::new(json.as_bytes()),
            filter,
            DecodeBudget::default(),
            &mut tracker,
        )
        .unwrap();
        tracker.into_sink()
    }

    fn images(n: usize) -> String {
        let list: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"height":{h},"width":{h},"url":"https://i.example/{i}"}}"#, h = 640 - i * 100))
            .collect();
        format!("[{}]", list.join(","))
    }

    #[test]
    fn track_keeps_last_images_and_last_artists() {
        let artists: Vec<String> = (0..7)
            .map(|i| format!(r#"{{"name":"A{i}","uri":"spotify:artist:{i}","genres":["x"]}}"#))
            .collect();
        let json = format!(
            r#"{{"timestamp":1,"context":{{"uri":"spotify:playlist:p","type":"playlist"}},"progress_ms":1000,
                "item":{{"album":{{"name":"Album","uri":"spotify:album:a","images":{}}},
                "artists":[{}],"duration_ms":200000,"name":"Song","uri":"spotify:track:t","popularity":3}},
                "currently_playing_type":"track","actions":{{"disallows":{{}}}},"is_playing":true}}"#,
            images(5),
            artists.join(",")
        );
        let c = decode(&json, &currently_playing_filter(), CurrentlyPlayingSink::default()).finish();
        assert!(c.is_playing);
        assert_eq!(c.playing_type, PlayingType::Track);
        assert_eq!(c.progress_ms, 1000);
        assert_eq!(c.duration_ms, 200_000);
        assert_eq!(c.context_uri, "spotify:playlist:p");
        assert_eq!(c.track_name, "Song");
        assert_eq!(c.album_uri, "spotify:album:a");
        let urls: Vec<&str> = c.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://i.example/2", "https://i.example/3", "https://i.example/4"]);
        assert_eq!(c.images.get(2).unwrap().height, 240);
        assert_eq!(c.artists.len(), MAX_ARTISTS);
        assert_eq!(c.artists.seen(), 7);
        let names: Vec<&str> = c.artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["A2", "A3", "A4", "A5", "A6"]);
    }

    #[test]
    fn episode_uses_show_as_artist() {
        let json = format!(
            r#"{{"context":null,"progress_ms":5,"item":{{"name":"Ep 1","uri":"spotify:episode:e",
                "show":{{"name":"The Show","uri":"spotify:show:s"}},"images":{},"duration_ms":9}},
                "currently_playing_type":"episode","is_playing":false}}"#,
            images(2)
        );
        let c = decode(&json, &currently_playing_filter(), CurrentlyPlayingSink::default()).finish();
        assert_eq!(c.playing_type, PlayingType::Episode);
        assert!(c.context_uri.is_empty());
        assert_eq!(c.artists.len(), 1);
        assert_eq!(c.artists.get(0).unwrap().name, "The Show");
        assert!(c.album_name.is_empty());
        assert_eq!(c.images.len(), 2);
        assert_eq!(c.track_uri, "spotify:episode:e");
    }

    #[test]
    fn only_allowed_fields_are_populated() {
        let json = r#"{"a":1,"b":[1,2],"c":{"d":"e"},"f":null,"g":true,"h":"i","j":2.5,"k":[],"l":{},
            "is_playing":true,"item":{"name":"Only","uri":"spotify:track:x"},"m":"n"}"#;
        let filter = Filter::object()
            .field("is_playing")
            .child("item", Filter::object().field("name"));
        let c = decode(json, &filter, CurrentlyPlayingSink::default()).finish();
        let expected = CurrentlyPlaying {
            is_playing: true,
            track_name: "Only".into(),
            ..CurrentlyPlaying::default()
        };
        assert_eq!(c, expected);
    }

    #[test]
    fn long_names_truncate_to_capacity() {
        let name = "n".repeat(150);
        let json = format!(r#"{{"item":{{"name":"{}"}}}}"#, name);
        let c = decode(&json, &currently_playing_filter(), CurrentlyPlayingSink::default()).finish();
        assert_eq!(c.track_name.as_str(), &name[..NAME_LEN - 1]);
    }

    #[test]
    fn player_details() {
        let json = r#"{"device":{"id":"d1","is_active":true,"is_private_session":false,"is_restricted":false,
            "name":"Kitchen","type":"Speaker","volume_percent":42,"supports_volume":true},
            "shuffle_state":true,"repeat_state":"context","timestamp":0,"progress_ms":77,"is_playing":true}"#;
        let d = decode(json, &player_details_filter(), PlayerDetailsSink::default()).details;
        assert_eq!(d.device.name, "Kitchen");
        assert_eq!(d.device.kind, "Speaker");
        assert_eq!(d.device.volume_percent, Some(42));
        assert!(d.shuffle_state);
        assert_eq!(d.repeat_state, RepeatMode::Context);
        assert_eq!(d.progress_ms, 77);
    }

    #[test]
    fn search_slots_window_nested_arrays() {
        let many: Vec<String> = (0..7)
            .map(|i| format!(r#"{{"name":"A{i}","uri":"u:{i}"}}"#))
            .collect();
        let json = format!(
            r#"{{"tracks":{{"href":"h","items":[
                {{"album":{{"name":"Al","uri":"spotify:album:1","images":{}}},
                  "artists":[{{"name":"X","uri":"u:x"}},{{"name":"Y","uri":"u:y"}}],
                  "name":"T1","uri":"spotify:track:1"}},
                {{"album":{{"name":"B","uri":"spotify:album:2","images":[]}},"artists":[{}],"name":"T2","uri":"spotify:track:2"}}
            ],"total":2}}}}"#,
            images(4),
            many.join(",")
        );
        let shape = search_shape();
        let mut arena = StringArena::with_capacity(1024);
        let mut tracker = PathTracker::new(ListCollector::new(&shape, &mut arena, 10));
        decode_filtered(
            SliceSource::new(json.as_bytes()),
            &shape.filter,
            DecodeBudget::default(),
            &mut tracker,
        )
        .unwrap();
        let collector = tracker.into_sink();
        let mut owned = Vec::new();
        collector.dispatch(|view, _, total| {
            assert_eq!(total, 2);
            owned.push(view.to_owned());
            Flow::Continue
        });
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].track_name, "T1");
        assert_eq!(owned[0].artists.len(), 2);
        assert_eq!(owned[0].artists.get(1).unwrap().uri, "u:y");
        let urls: Vec<&str> = owned[0].images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://i.example/1", "https://i.example/2", "https://i.example/3"]);
        assert_eq!(owned[1].album_name, "B");
        assert!(owned[1].images.is_empty());
        let uris: Vec<&str> = owned[1].artists.iter().map(|a| a.uri.as_str()).collect();
        assert_eq!(uris, ["u:2", "u:3", "u:4", "u:5", "u:6"]);
    }
}
