/*
 * types.rs
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

//! Player API result types.
//!
//! Owned results (`CurrentlyPlaying`, `PlayerDetails`, `Device`, `SearchResult`) copy
//! their strings into fixed-capacity buffers. List endpoints hand out borrowed views
//! (`DeviceView`, `SearchView`) over the client's string arena instead; call
//! `to_owned()` on a view to keep it past the callback.

use crate::arena::Span;
use crate::bounded::{BoundedStr, Window};
use crate::dispatch::ElementRef;

pub const NAME_LEN: usize = 100;
pub const URI_LEN: usize = 40;
pub const URL_LEN: usize = 70;
pub const DEVICE_ID_LEN: usize = 45;
pub const DEVICE_NAME_LEN: usize = 80;
pub const DEVICE_TYPE_LEN: usize = 30;
/// Images kept per item: the last (smallest) ones.
pub const MAX_IMAGES: usize = 3;
/// Artists kept per item: the last ones.
pub const MAX_ARTISTS: usize = 5;

pub type Name = BoundedStr<NAME_LEN>;
pub type Uri = BoundedStr<URI_LEN>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayingType {
    Track,
    Episode,
    #[default]
    Other,
}

impl PlayingType {
    pub fn from_api(s: &str) -> Self {
        match s {
            "track" => PlayingType::Track,
            "episode" => PlayingType::Episode,
            _ => PlayingType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepeatMode {
    Track,
    Context,
    #[default]
    Off,
}

impl RepeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Track => "track",
            RepeatMode::Context => "context",
            RepeatMode::Off => "off",
        }
    }

    /// Unknown states read as `Off`.
    pub fn from_api(s: &str) -> Self {
        match s {
            "track" => RepeatMode::Track,
            "context" => RepeatMode::Context,
            _ => RepeatMode::Off,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub height: u32,
    pub width: u32,
    pub url: BoundedStr<URL_LEN>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artist {
    pub name: Name,
    pub uri: Uri,
}

/// Snapshot of what is playing. For an episode the show is the only artist, the album
/// is blank and the images are the episode's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentlyPlaying {
    pub is_playing: bool,
    pub progress_ms: u64,
    pub duration_ms: u64,
    /// Empty when the response has no context.
    pub context_uri: Uri,
    pub playing_type: PlayingType,
    pub track_name: Name,
    pub track_uri: Uri,
    pub album_name: Name,
    pub album_uri: Uri,
    pub artists: Window<Artist, MAX_ARTISTS>,
    pub images: Window<Image, MAX_IMAGES>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    pub id: BoundedStr<DEVICE_ID_LEN>,
    pub name: BoundedStr<DEVICE_NAME_LEN>,
    pub kind: BoundedStr<DEVICE_TYPE_LEN>,
    pub is_active: bool,
    pub is_private_session: bool,
    pub is_restricted: bool,
    /// None when the device does not report a volume.
    pub volume_percent: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerDetails {
    pub device: Device,
    pub progress_ms: u64,
    pub is_playing: bool,
    pub shuffle_state: bool,
    pub repeat_state: RepeatMode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub track_name: Name,
    pub track_uri: Uri,
    pub album_name: Name,
    pub album_uri: Uri,
    pub artists: Window<Artist, MAX_ARTISTS>,
    pub images: Window<Image, MAX_IMAGES>,
}

/// Options for starting playback.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions<'a> {
    /// Album, artist or playlist to play.
    pub context_uri: Option<&'a str>,
    /// Tracks to play, in order.
    pub uris: &'a [&'a str],
    /// Zero-based track position inside the context.
    pub offset_position: Option<u32>,
    pub position_ms: Option<u64>,
}

// ── Arena-backed list slots ───────────────────────────────────────────

/// Device fields of one list element, strings in the arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceSlot {
    pub(crate) id: Span,
    pub(crate) name: Span,
    pub(crate) kind: Span,
    pub(crate) is_active: bool,
    pub(crate) is_private_session: bool,
    pub(crate) is_restricted: bool,
    pub(crate) volume_percent: Option<u8>,
}

/// Device borrowed from the client arena; valid only inside the callback.
pub type DeviceView<'a> = ElementRef<'a, DeviceSlot>;

impl<'a> ElementRef<'a, DeviceSlot> {
    pub fn id(&self) -> &'a str {
        self.text(self.slot().id)
    }

    pub fn name(&self) -> &'a str {
        self.text(self.slot().name)
    }

    pub fn kind(&self) -> &'a str {
        self.text(self.slot().kind)
    }

    pub fn is_active(&self) -> bool {
        self.slot().is_active
    }

    pub fn is_private_session(&self) -> bool {
        self.slot().is_private_session
    }

    pub fn is_restricted(&self) -> bool {
        self.slot().is_restricted
    }

    pub fn volume_percent(&self) -> Option<u8> {
        self.slot().volume_percent
    }

    /// Copy into an owned [`Device`].
    pub fn to_owned(&self) -> Device {
        Device {
            id: self.id().into(),
            name: self.name().into(),
            kind: self.kind().into(),
            is_active: self.is_active(),
            is_private_session: self.is_private_session(),
            is_restricted: self.is_restricted(),
            volume_percent: self.volume_percent(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArtistSpan {
    pub(crate) name: Span,
    pub(crate) uri: Span,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSpan {
    pub(crate) height: u32,
    pub(crate) width: u32,
    pub(crate) url: Span,
}

/// Search hit fields of one list element, strings in the arena.
#[derive(Debug, Clone, Default)]
pub struct SearchSlot {
    pub(crate) track_name: Span,
    pub(crate) track_uri: Span,
    pub(crate) album_name: Span,
    pub(crate) album_uri: Span,
    pub(crate) artists: Window<ArtistSpan, MAX_ARTISTS>,
    pub(crate) images: Window<ImageSpan, MAX_IMAGES>,
}

/// Search hit borrowed from the client arena; valid only inside the callback.
pub type SearchView<'a> = ElementRef<'a, SearchSlot>;

impl<'a> ElementRef<'a, SearchSlot> {
    pub fn track_name(&self) -> &'a str {
        self.text(self.slot().track_name)
    }

    pub fn track_uri(&self) -> &'a str {
        self.text(self.slot().track_uri)
    }

    pub fn album_name(&self) -> &'a str {
        self.text(self.slot().album_name)
    }

    pub fn album_uri(&self) -> &'a str {
        self.text(self.slot().album_uri)
    }

    /// `(name, uri)` of each kept artist, in source order.
    pub fn artists(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let this = *self;
        self.slot()
            .artists
            .iter()
            .map(move |a| (this.text(a.name), this.text(a.uri)))
    }

    /// `(height, width, url)` of each kept image, in source order.
    pub fn images(&self) -> impl Iterator<Item = (u32, u32, &'a str)> + 'a {
        let this = *self;
        self.slot()
            .images
            .iter()
            .map(move |i| (i.height, i.width, this.text(i.url)))
    }

    /// Copy into an owned [`SearchResult`].
    pub fn to_owned(&self) -> SearchResult {
        let mut result = SearchResult {
            track_name: self.track_name().into(),
            track_uri: self.track_uri().into(),
            album_name: self.album_name().into(),
            album_uri: self.album_uri().into(),
            ..SearchResult::default()
        };
        for (name, uri) in self.artists() {
            let artist = result.artists.push();
            artist.name.set(name);
            artist.uri.set(uri);
        }
        for (height, width, url) in self.images() {
            let image = result.images.push();
            image.height = height;
            image.width = width;
            image.url.set(url);
        }
        result
    }
}
