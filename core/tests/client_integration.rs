/*
 * client_integration.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * End-to-end tests of the API client over the scripted in-memory transport:
 * request framing, status parsing, the credential gate, filtered decoding and
 * list dispatch. No network access is needed.
 *
 * Run with:
 *   cargo test -p spindle_core --test client_integration
 */

use spindle_core::json::{FieldSink, Filter, PathTracker, Scalar};
use spindle_core::oauth::ManualClock;
use spindle_core::protocol::http::{parse_status_line, RequestDescriptor, CONTENT_TYPE_JSON};
use spindle_core::protocol::player::PlayOptions;
use spindle_core::transport::memory::MemoryTransport;
use spindle_core::{ApiClient, ClientConfig, ClientError, CredentialState, Dispatch, Flow, Method};

const OAUTH: &str = r#"
[oauth]
client_id = "cid"
client_secret = "csecret"
refresh_token = "rt-1"
"#;

fn oauth_client(extra: &str) -> (ApiClient<MemoryTransport, ManualClock>, ManualClock) {
    let clock = ManualClock::new(1_000);
    let config = ClientConfig::from_toml_str(&format!("{}\n{}", extra, OAUTH)).unwrap();
    (
        ApiClient::with_clock(MemoryTransport::new(), config, clock.clone()),
        clock,
    )
}

fn bearer_client() -> ApiClient<MemoryTransport, ManualClock> {
    ApiClient::with_clock(MemoryTransport::new(), ClientConfig::default(), ManualClock::new(0))
        .with_static_bearer("static-token")
}

fn header_value<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    let head = request.split("\r\n\r\n").next()?;
    head.lines()
        .find_map(|line| line.strip_prefix(name)?.strip_prefix(": "))
}

fn body_of(request: &str) -> &str {
    request.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

/// Records every scalar it sees as `path=value`.
#[derive(Default)]
struct Recorder(Vec<String>);

impl FieldSink for Recorder {
    fn field(&mut self, path: &str, _: &[usize], value: Scalar<'_>) {
        let text = match value {
            Scalar::Null => "null".to_string(),
            other => other
                .as_str()
                .map(str::to_string)
                .or_else(|| other.as_bool().map(|b| b.to_string()))
                .or_else(|| other.as_i64().map(|n| n.to_string()))
                .unwrap_or_default(),
        };
        self.0.push(format!("{}={}", path, text));
    }
}

// ── Framing ───────────────────────────────────────────────────────────

#[test]
fn content_length_matches_body_bytes() {
    let mut c = bearer_client();
    let bodies: [&[u8]; 4] = [b"", b"{}", "{\"name\":\"Sigur Rós\"}".as_bytes(), &[b'x'; 1000]];
    for (i, body) in bodies.iter().enumerate() {
        c.transport_mut().push_http("HTTP/1.1 204 No Content", &[], "");
        let request = RequestDescriptor::put("api.example.com", "/v1/thing").with_body(CONTENT_TYPE_JSON, body);
        let view = c.send_request(&request).unwrap();
        assert_eq!(view.status(), 204);
        drop(view);
        let sent = &c.transport().requests()[i];
        let text = String::from_utf8_lossy(sent);
        let length: usize = header_value(&text, "Content-Length").unwrap().parse().unwrap();
        assert_eq!(length, body.len());
        let head_end = sent.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        assert_eq!(&sent[head_end..], *body);
    }
}

#[test]
fn get_requests_carry_no_length() {
    let mut c = bearer_client();
    c.transport_mut().push_http("HTTP/1.1 204 No Content", &[], "");
    assert_eq!(c.currently_playing(None).unwrap(), None);
    let text = c.transport().request_text(0);
    assert_eq!(header_value(&text, "Content-Length"), None);
    assert_eq!(header_value(&text, "Authorization"), Some("Bearer static-token"));
    assert_eq!(header_value(&text, "Host"), Some("api.spotify.com"));
}

#[test]
fn status_codes_are_parsed_literally() {
    for minor in ["0", "1"] {
        for code in 100u16..=599 {
            let line = format!("HTTP/1.{} {} Whatever Reason", minor, code);
            assert_eq!(parse_status_line(line.as_bytes()), Some(code), "{}", line);
        }
    }
    for line in ["", "HTTP/1.1", "HTTP/1.1 OK 200", "HTTP/3 200 OK", "\r\n", "HTTP/1.1 -20 No"] {
        assert_eq!(parse_status_line(line.as_bytes()), None, "{:?}", line);
    }
}

#[test]
fn garbled_status_line_closes_and_reports_sentinel() {
    let mut c = bearer_client();
    c.transport_mut().push_response("<html>oops</html>");
    let err = c.pause(None).unwrap_err();
    assert!(matches!(err, ClientError::MalformedStatusLine));
    assert_eq!(err.status(), -3);
    assert_eq!(c.transport().close_count(), 1);
    assert!(!c.transport().is_open());
}

#[test]
fn refused_connection_reports_sentinel() {
    let mut c = bearer_client();
    c.transport_mut().refuse_connections(true);
    let err = c.next_track(None).unwrap_err();
    assert_eq!(err.status(), -1);
    assert!(err.is_retryable());
}

// ── Credential lifecycle ──────────────────────────────────────────────

#[test]
fn ensure_valid_twice_refreshes_once() {
    let (mut c, _) = oauth_client("");
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600}"#);
    assert!(c.ensure_valid_credential().unwrap());
    assert!(!c.ensure_valid_credential().unwrap());
    assert_eq!(c.transport().requests().len(), 1);
    assert_eq!(c.credentials().state(), CredentialState::Valid);

    let refresh = c.transport().request_text(0);
    assert!(refresh.starts_with("POST /api/token HTTP/1.1\r\n"));
    assert_eq!(header_value(&refresh, "Host"), Some("accounts.spotify.com"));
    assert_eq!(
        header_value(&refresh, "Content-Type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        body_of(&refresh),
        "grant_type=refresh_token&refresh_token=rt-1&client_id=cid&client_secret=csecret"
    );
}

#[test]
fn refresh_happens_once_just_past_expiry() {
    let (mut c, clock) = oauth_client("");
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"abc","expires_in":3600}"#);
    c.ensure_valid_credential().unwrap();

    // default safety margin is 2000 ms
    let lifetime = 3600 * 1000 - 2000;
    clock.advance(lifetime - 1);
    c.transport_mut().push_http("HTTP/1.1 204 No Content", &[], "");
    assert!(c.pause(None).unwrap());
    assert_eq!(c.transport().requests().len(), 2);

    clock.advance(2);
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"def","expires_in":3600}"#)
        .push_http("HTTP/1.1 204 No Content", &[], "");
    assert!(c.pause(None).unwrap());
    let t = c.transport();
    assert_eq!(t.requests().len(), 4);
    assert!(t.request_text(2).starts_with("POST /api/token"));
    assert_eq!(header_value(&t.request_text(3), "Authorization"), Some("Bearer def"));
}

#[test]
fn rejected_refresh_keeps_credential_and_backs_off() {
    let (mut c, clock) = oauth_client("");
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"abc","expires_in":60}"#);
    c.ensure_valid_credential().unwrap();
    clock.advance(60_000);

    c.transport_mut().push_http(
        "HTTP/1.1 400 Bad Request",
        &[],
        r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#,
    );
    let err = c.ensure_valid_credential().unwrap_err();
    assert_eq!(err.status(), -6);
    assert!(err.to_string().contains("Refresh token revoked"));
    assert_eq!(c.credentials().access_token(), Some("abc"));
    assert_eq!(c.credentials().state(), CredentialState::RefreshFailed);

    // suppressed: no network
    let err = c.ensure_valid_credential().unwrap_err();
    assert!(err.to_string().contains("suppressed"));
    assert_eq!(c.transport().requests().len(), 2);

    clock.advance(1_000);
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"ghi","expires_in":60,"refresh_token":"rt-2"}"#);
    assert!(c.ensure_valid_credential().unwrap());
    assert_eq!(c.credentials().refresh_token(), Some("rt-2"));
    assert_eq!(c.credentials().state(), CredentialState::Valid);
}

#[test]
fn basic_client_authentication() {
    let (mut c, _) = oauth_client("client_auth = \"basic\"");
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"abc"}"#);
    c.ensure_valid_credential().unwrap();
    let refresh = c.transport().request_text(0);
    // base64("cid:csecret")
    assert_eq!(header_value(&refresh, "Authorization"), Some("Basic Y2lkOmNzZWNyZXQ="));
    assert_eq!(body_of(&refresh), "grant_type=refresh_token&refresh_token=rt-1");
    assert_eq!(c.credentials().credential().unwrap().ttl_ms(), Some(3600 * 1000 - 2000));
}

#[test]
fn authorization_code_exchange() {
    let (mut c, _) = oauth_client("");
    c.transport_mut().push_http(
        "HTTP/1.1 200 OK",
        &[],
        r#"{"access_token":"first","token_type":"Bearer","scope":"user-read-playback-state","expires_in":3600,"refresh_token":"rt-new"}"#,
    );
    c.request_access_tokens("code/123", "http://localhost:8888/callback").unwrap();
    assert_eq!(c.credentials().access_token(), Some("first"));
    assert_eq!(c.credentials().refresh_token(), Some("rt-new"));
    let body = body_of(&c.transport().request_text(0)).to_string();
    assert!(body.starts_with("grant_type=authorization_code&code=code%2F123&redirect_uri=http%3A%2F%2Flocalhost%3A8888%2Fcallback"));
}

#[test]
fn unauthorized_retry_is_bounded() {
    let (mut c, _) = oauth_client("retry_on_unauthorized = true");
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"a","expires_in":3600}"#)
        .push_http("HTTP/1.1 401 Unauthorized", &[], r#"{"error":{"status":401,"message":"The access token expired"}}"#)
        .push_http("HTTP/1.1 200 OK", &[], r#"{"access_token":"b","expires_in":3600}"#)
        .push_http("HTTP/1.1 200 OK", &[], r#"{"is_playing":false,"progress_ms":7}"#);
    let details = c.player_details(None).unwrap().unwrap();
    assert_eq!(details.progress_ms, 7);
    let t = c.transport();
    assert_eq!(t.requests().len(), 4);
    assert_eq!(t.close_count(), 4);
    assert_eq!(header_value(&t.request_text(3), "Authorization"), Some("Bearer b"));
}

// ── Decoding ──────────────────────────────────────────────────────────

#[test]
fn allowlist_populates_only_requested_fields() {
    let mut c = bearer_client();
    c.transport_mut().push_http(
        "HTTP/1.1 200 OK",
        &[("Content-Type", "application/json")],
        r#"{"device":{"id":"x","name":"y"},"repeat_state":"off","shuffle_state":false,
            "context":{"uri":"c","href":"h"},"timestamp":1700000000000,"progress_ms":12,
            "is_playing":true,"item":{"name":"Only This","uri":"spotify:track:z","popularity":80},
            "currently_playing_type":"track","actions":{"disallows":{"resuming":true}},
            "smart_shuffle":false,"extra":[1,2,3]}"#,
    );
    let filter = Filter::object()
        .field("is_playing")
        .child("item", Filter::object().field("name"));
    let mut tracker = PathTracker::new(Recorder::default());
    let status = c.decode_filtered("/v1/me/player", &filter, &mut tracker).unwrap();
    assert_eq!(status, 200);
    assert_eq!(tracker.sink().0, ["is_playing=true", "item.name=Only This"]);
}

#[test]
fn images_window_and_names_truncate() {
    let mut c = bearer_client();
    let images: Vec<String> = (0..7)
        .map(|i| format!(r#"{{"height":{h},"width":{h},"url":"https://i.scdn.co/image/{i}"}}"#, h = 640 - i * 64))
        .collect();
    let long_name = "n".repeat(150);
    c.transport_mut().push_http(
        "HTTP/1.1 200 OK",
        &[],
        &format!(
            r#"{{"is_playing":true,"item":{{"name":"{}","album":{{"name":"A","images":[{}]}},"artists":[]}},"currently_playing_type":"track"}}"#,
            long_name,
            images.join(",")
        ),
    );
    let now = c.currently_playing(None).unwrap().unwrap();
    let urls: Vec<&str> = now.images.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://i.scdn.co/image/4",
            "https://i.scdn.co/image/5",
            "https://i.scdn.co/image/6"
        ]
    );
    assert_eq!(now.images.get(2).unwrap().height, 640 - 6 * 64);
    assert_eq!(now.track_name.as_str(), &long_name[..99]);
}

#[test]
fn malformed_body_is_a_decode_error() {
    let mut c = bearer_client();
    c.transport_mut()
        .push_http("HTTP/1.1 200 OK", &[], r#"{"is_playing":tru"#);
    let err = c.player_details(None).unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert_eq!(err.status(), -5);
    assert_eq!(c.transport().close_count(), 1);
}

// ── Control and lists ─────────────────────────────────────────────────

#[test]
fn no_content_control_skips_decoder() {
    let mut c = bearer_client();
    // a decoder would reject this body
    c.transport_mut()
        .push_http("HTTP/1.1 204 No Content", &[], "not json at all");
    assert!(c.set_volume(55, Some("kitchen")).unwrap());
    let text = c.transport().request_text(0);
    assert!(text.starts_with("PUT /v1/me/player/volume?volume_percent=55&device_id=kitchen HTTP/1.1\r\n"));
    assert_eq!(header_value(&text, "Content-Length"), Some("0"));
}

#[test]
fn play_body_is_valid_json() {
    let mut c = bearer_client();
    c.transport_mut().push_http("HTTP/1.1 202 Accepted", &[], "");
    let uris = ["spotify:track:1", "spotify:track:\"2\""];
    let options = PlayOptions {
        uris: &uris,
        offset_position: Some(1),
        position_ms: Some(30_000),
        ..Default::default()
    };
    assert!(c.play_with(&options, Some("dev 1")).unwrap());
    let text = c.transport().request_text(0);
    assert!(text.starts_with("PUT /v1/me/player/play?device_id=dev%201 HTTP/1.1\r\n"));
    let body: serde_json::Value = serde_json::from_str(body_of(&text)).unwrap();
    assert_eq!(body["uris"][1], "spotify:track:\"2\"");
    assert_eq!(body["offset"]["position"], 1);
    assert_eq!(body["position_ms"], 30_000);
    assert!(body.get("context_uri").is_none());
}

#[test]
fn twelve_hits_limit_five() {
    let mut c = bearer_client();
    let items: Vec<String> = (0..12)
        .map(|i| {
            format!(
                r#"{{"name":"Track {i}","uri":"spotify:track:{i}","album":{{"name":"Album","uri":"spotify:album:a","images":[]}},"artists":[{{"name":"Artist","uri":"spotify:artist:r"}}],"popularity":{i}}}"#
            )
        })
        .collect();
    c.transport_mut().push_http(
        "HTTP/1.1 200 OK",
        &[],
        &format!(r#"{{"tracks":{{"href":"h","items":[{}],"limit":20,"total":900}}}}"#, items.join(",")),
    );
    let mut calls = Vec::new();
    let dispatch = c
        .search("track", 5, |hit, index, total| {
            calls.push((index, total, hit.track_name().to_string()));
            Flow::Continue
        })
        .unwrap();
    assert_eq!(
        dispatch,
        Dispatch {
            status: 200,
            delivered: 5,
            total: 12,
            truncated: false,
        }
    );
    let indices: Vec<usize> = calls.iter().map(|c| c.0).collect();
    assert_eq!(indices, [0, 1, 2, 3, 4]);
    assert!(calls.iter().all(|c| c.1 == 12));
    assert_eq!(calls[4].2, "Track 4");
}

#[test]
fn full_arena_drops_whole_hits_and_reports_truncation() {
    let mut c = bearer_client();
    let items: Vec<String> = (0..20)
        .map(|i| {
            let images: Vec<String> = [640, 300, 64]
                .iter()
                .map(|size| {
                    format!(
                        r#"{{"height":{size},"width":{size},"url":"https://i.scdn.co/image/ab67616d0000b273{i:020}{size:04}"}}"#
                    )
                })
                .collect();
            format!(
                r#"{{"name":"Get Lucky {i}","uri":"spotify:track:{i:022}","album":{{"name":"Random Access Memories","uri":"spotify:album:{i:022}","images":[{}]}},"artists":[{{"name":"Daft Punk","uri":"spotify:artist:4tZwfgrHOc3mvqYlEYSvVi"}}]}}"#,
                images.join(",")
            )
        })
        .collect();
    c.transport_mut().push_http(
        "HTTP/1.1 200 OK",
        &[],
        &format!(r#"{{"tracks":{{"items":[{}],"total":20}}}}"#, items.join(",")),
    );
    let mut hits = Vec::new();
    let dispatch = c
        .search("get lucky", 20, |hit, index, total| {
            assert_eq!(total, 20);
            hits.push((index, hit.to_owned()));
            Flow::Continue
        })
        .unwrap();
    assert!(dispatch.truncated);
    assert_eq!(dispatch.total, 20);
    assert!(dispatch.delivered > 0 && dispatch.delivered < 20);
    assert_eq!(hits.len(), dispatch.delivered);
    for (index, hit) in &hits {
        assert_eq!(hit.track_name.as_str(), format!("Get Lucky {index}"));
        assert_eq!(hit.album_name.as_str(), "Random Access Memories");
        assert_eq!(hit.artists.len(), 1);
        assert_eq!(hit.images.len(), 3);
        for image in hit.images.iter() {
            assert!(image.url.as_str().ends_with(&format!("{:04}", image.width)));
        }
    }
}

#[test]
fn list_error_status_dispatches_nothing() {
    let mut c = bearer_client();
    c.transport_mut()
        .push_http("HTTP/1.1 503 Service Unavailable", &[], "");
    let mut called = false;
    let dispatch = c
        .devices(|_, _, _| {
            called = true;
            Flow::Continue
        })
        .unwrap();
    assert!(!called);
    assert_eq!(dispatch.status, 503);
    assert_eq!(dispatch.total, 0);
}

#[test]
fn every_request_uses_a_fresh_connection() {
    let mut c = bearer_client();
    for _ in 0..3 {
        c.transport_mut().push_http("HTTP/1.1 204 No Content", &[], "");
    }
    c.pause(None).unwrap();
    c.control(Method::Post, "/v1/me/player/queue?uri=spotify%3Atrack%3Ax", b"").unwrap();
    c.transfer_playback("abc", true).unwrap();
    assert_eq!(c.transport().connections().len(), 3);
    assert_eq!(c.transport().close_count(), 3);
    assert!(!c.transport().is_open());
}
