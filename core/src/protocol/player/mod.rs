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

//! Web player API: playback state, devices, search and playback control.
//!
//! - Paths and JSON request bodies live in `requests` (bodies built with `JsonWriter`)
//! - Response allowlists and field sinks live in `json_handlers`
//! - Endpoints are methods on [`ApiClient`]
//!
//! State reads return `Ok(None)` on 204 (nothing active). Control calls return
//! `Ok(true)` for any 2xx and never decode the response body.

pub mod requests;
pub mod types;

mod json_handlers;

pub use types::{
    Artist, CurrentlyPlaying, Device, DeviceView, Image, PlayOptions, PlayerDetails,
    PlayingType, RepeatMode, SearchResult, SearchView, MAX_ARTISTS, MAX_IMAGES,
};

use tracing::debug;

use crate::client::ApiClient;
use crate::dispatch::{Dispatch, Flow};
use crate::error::ClientError;
use crate::json::PathTracker;
use crate::oauth::Clock;
use crate::protocol::http::Method;
use crate::transport::Transport;

use json_handlers::{
    currently_playing_filter, devices_shape, player_details_filter, search_shape,
    CurrentlyPlayingSink, PlayerDetailsSink,
};
use requests::*;

/// Map a state read's status: 200 decoded, 204 nothing, anything else an error.
fn state_result<R>(status: u16, decoded: impl FnOnce() -> R) -> Result<Option<R>, ClientError> {
    match status {
        200 => Ok(Some(decoded())),
        204 => Ok(None),
        other => Err(ClientError::UnexpectedStatus(other)),
    }
}

impl<T: Transport, C: Clock> ApiClient<T, C> {
    // ── State ─────────────────────────────────────────────────────────

    /// What is playing now, or `None` when nothing is.
    pub fn currently_playing(&mut self, market: Option<&str>) -> Result<Option<CurrentlyPlaying>, ClientError> {
        let path = currently_playing_path(market);
        let mut tracker = PathTracker::new(CurrentlyPlayingSink::default());
        let status = self.decode_filtered(&path, &currently_playing_filter(), &mut tracker)?;
        state_result(status, || tracker.into_sink().finish())
    }

    /// Active device and playback settings, or `None` when no device is active.
    pub fn player_details(&mut self, market: Option<&str>) -> Result<Option<PlayerDetails>, ClientError> {
        let path = player_path(market);
        let mut tracker = PathTracker::new(PlayerDetailsSink::default());
        let status = self.decode_filtered(&path, &player_details_filter(), &mut tracker)?;
        state_result(status, || tracker.into_sink().details)
    }

    /// Call `callback(device, index, total)` for each available device.
    pub fn devices<F>(&mut self, callback: F) -> Result<Dispatch, ClientError>
    where
        F: FnMut(DeviceView<'_>, usize, usize) -> Flow,
    {
        let limit = self.config().max_list_results;
        self.for_each_result(DEVICES_PATH, &devices_shape(), limit, callback)
    }

    /// Track search. At most `limit` hits are requested and delivered.
    pub fn search<F>(&mut self, query: &str, limit: usize, callback: F) -> Result<Dispatch, ClientError>
    where
        F: FnMut(SearchView<'_>, usize, usize) -> Flow,
    {
        let limit = limit.clamp(1, self.config().max_list_results);
        let path = search_path(query, limit);
        debug!(limit, "searching tracks");
        self.for_each_result(&path, &search_shape(), limit, callback)
    }

    // ── Control ───────────────────────────────────────────────────────

    /// Resume playback.
    pub fn play(&mut self, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Put, &control_path(PLAY_PATH, device_id), b"")
    }

    /// Start playback of a context or of explicit tracks.
    pub fn play_with(&mut self, options: &PlayOptions<'_>, device_id: Option<&str>) -> Result<bool, ClientError> {
        let body = build_play_body(options);
        self.control(Method::Put, &control_path(PLAY_PATH, device_id), &body)
    }

    pub fn pause(&mut self, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Put, &control_path(PAUSE_PATH, device_id), b"")
    }

    pub fn next_track(&mut self, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Post, &control_path(NEXT_PATH, device_id), b"")
    }

    pub fn previous_track(&mut self, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Post, &control_path(PREVIOUS_PATH, device_id), b"")
    }

    /// Values above 100 are sent as 100.
    pub fn set_volume(&mut self, percent: u8, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Put, &volume_path(percent, device_id), b"")
    }

    pub fn set_shuffle(&mut self, state: bool, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Put, &shuffle_path(state, device_id), b"")
    }

    pub fn set_repeat(&mut self, mode: RepeatMode, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Put, &repeat_path(mode, device_id), b"")
    }

    pub fn seek(&mut self, position_ms: u64, device_id: Option<&str>) -> Result<bool, ClientError> {
        self.control(Method::Put, &seek_path(position_ms, device_id), b"")
    }

    /// Move playback to `device_id`, starting it if `play`.
    pub fn transfer_playback(&mut self, device_id: &str, play: bool) -> Result<bool, ClientError> {
        let body = build_transfer_body(device_id, play);
        self.control(Method::Put, PLAYER_PATH, &body)
    }
}
