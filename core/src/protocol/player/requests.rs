/*
 * requests.rs
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

//! Request paths and JSON bodies for player API calls.
//! Bodies are generated with `JsonWriter`.

use crate::json::JsonWriter;
use crate::protocol::http::PathBuilder;

use super::types::{PlayOptions, RepeatMode};

pub const CURRENTLY_PLAYING_PATH: &str = "/v1/me/player/currently-playing";
pub const PLAYER_PATH: &str = "/v1/me/player";
pub const DEVICES_PATH: &str = "/v1/me/player/devices";
pub const PLAY_PATH: &str = "/v1/me/player/play";
pub const PAUSE_PATH: &str = "/v1/me/player/pause";
pub const NEXT_PATH: &str = "/v1/me/player/next";
pub const PREVIOUS_PATH: &str = "/v1/me/player/previous";
pub const VOLUME_PATH: &str = "/v1/me/player/volume";
pub const SHUFFLE_PATH: &str = "/v1/me/player/shuffle";
pub const REPEAT_PATH: &str = "/v1/me/player/repeat";
pub const SEEK_PATH: &str = "/v1/me/player/seek";
pub const SEARCH_PATH: &str = "/v1/search";

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

/// Currently playing, episodes included.
pub fn currently_playing_path(market: Option<&str>) -> String {
    PathBuilder::new(CURRENTLY_PLAYING_PATH)
        .query("additional_types", "episode")
        .query_opt("market", non_empty(market))
        .build()
}

pub fn player_path(market: Option<&str>) -> String {
    PathBuilder::new(PLAYER_PATH)
        .query_opt("market", non_empty(market))
        .build()
}

/// Track search for `query`, asking the server for at most `limit` hits.
pub fn search_path(query: &str, limit: usize) -> String {
    PathBuilder::new(SEARCH_PATH)
        .query("q", query)
        .query("type", "track")
        .query("limit", &limit.to_string())
        .build()
}

/// `base` targeted at `device_id`, if given.
pub fn control_path(base: &str, device_id: Option<&str>) -> String {
    PathBuilder::new(base)
        .query_opt("device_id", non_empty(device_id))
        .build()
}

/// Volume is clamped to 0..=100.
pub fn volume_path(percent: u8, device_id: Option<&str>) -> String {
    PathBuilder::new(VOLUME_PATH)
        .query("volume_percent", &percent.min(100).to_string())
        .query_opt("device_id", non_empty(device_id))
        .build()
}

pub fn shuffle_path(state: bool, device_id: Option<&str>) -> String {
    PathBuilder::new(SHUFFLE_PATH)
        .query("state", if state { "true" } else { "false" })
        .query_opt("device_id", non_empty(device_id))
        .build()
}

pub fn repeat_path(mode: RepeatMode, device_id: Option<&str>) -> String {
    PathBuilder::new(REPEAT_PATH)
        .query("state", mode.as_str())
        .query_opt("device_id", non_empty(device_id))
        .build()
}

pub fn seek_path(position_ms: u64, device_id: Option<&str>) -> String {
    PathBuilder::new(SEEK_PATH)
        .query("position_ms", &position_ms.to_string())
        .query_opt("device_id", non_empty(device_id))
        .build()
}

/// Body for `PUT /me/player/play`. Unset options are left out.
pub fn build_play_body(options: &PlayOptions<'_>) -> Vec<u8> {
    let mut w = JsonWriter::new();
    w.write_start_object();
    if let Some(context_uri) = options.context_uri {
        w.field_str("context_uri", context_uri);
    }
    if !options.uris.is_empty() {
        w.field_str_array("uris", options.uris);
    }
    if let Some(position) = options.offset_position {
        w.write_key("offset");
        w.write_start_object();
        w.field_u64("position", u64::from(position));
        w.write_end_object();
    }
    if let Some(position_ms) = options.position_ms {
        w.field_u64("position_ms", position_ms);
    }
    w.write_end_object();
    w.into_bytes().to_vec()
}

/// Body for `PUT /me/player`: `{"device_ids":["…"],"play":bool}`.
pub fn build_transfer_body(device_id: &str, play: bool) -> Vec<u8> {
    let mut w = JsonWriter::with_capacity(64);
    w.write_start_object();
    w.field_str_array("device_ids", &[device_id]);
    w.field_bool("play", play);
    w.write_end_object();
    w.into_bytes().to_vec()
}
