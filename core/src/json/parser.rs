/*
 * parser.rs
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

//! Filtered streaming JSON decoder: pulls bytes from a [`ByteSource`] and delivers events
//! on a [`JsonContentHandler`] only for values the [`Filter`] admits.
//!
//! # Memory contract
//!
//! The decoder never holds more than one token. Admitted keys, strings and numbers are
//! assembled in a scratch buffer of `DecodeBudget::scratch_bytes`, allocated once per
//! decoder. Values outside the filter are scanned and validated but never stored. Strings
//! longer than the scratch buffer are delivered truncated (`truncated_string_value`);
//! object keys longer than it cannot match any filter entry and their values are skipped.
//! Nesting is limited to `DecodeBudget::max_depth`.
//!
//! Decoding stops right after the root value; trailing bytes are left unread so a peer
//! that keeps the connection open does not block the caller.

use zeroize::Zeroizing;

use crate::json::error::DecodeError;
use crate::json::filter::Filter;
use crate::json::handler::JsonContentHandler;
use crate::json::number::JsonNumber;
use crate::json::source::ByteSource;

/// Memory limits for one decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeBudget {
    /// Largest key, string or number held at once.
    pub scratch_bytes: usize,
    /// Deepest object/array nesting accepted (skipped values included).
    pub max_depth: usize,
}

impl Default for DecodeBudget {
    fn default() -> Self {
        Self {
            scratch_bytes: 512,
            max_depth: 10,
        }
    }
}

/// Pull-model decoder. One decoder decodes one document.
pub struct FilteredDecoder<S: ByteSource> {
    source: S,
    budget: DecodeBudget,
    scratch: Zeroizing<Vec<u8>>,
    depth: usize,
    offset: usize,
}

/// Decode one document from `source`, delivering admitted values to `handler`.
pub fn decode_filtered<S, H>(
    source: S,
    filter: &Filter,
    budget: DecodeBudget,
    handler: &mut H,
) -> Result<(), DecodeError>
where
    S: ByteSource,
    H: JsonContentHandler + ?Sized,
{
    FilteredDecoder::new(source, budget).decode(filter, handler)
}

impl<S: ByteSource> FilteredDecoder<S> {
    pub fn new(source: S, budget: DecodeBudget) -> Self {
        Self {
            source,
            budget,
            scratch: Zeroizing::new(Vec::with_capacity(budget.scratch_bytes)),
            depth: 0,
            offset: 0,
        }
    }

    /// Bytes consumed from the source so far.
    pub fn bytes_consumed(&self) -> usize {
        self.offset
    }

    /// Decode the root value.
    pub fn decode<H: JsonContentHandler + ?Sized>(
        &mut self,
        filter: &Filter,
        handler: &mut H,
    ) -> Result<(), DecodeError> {
        self.depth = 0;
        if self.source.peek_byte()? == Some(0xef) {
            for expected in [0xefu8, 0xbb, 0xbf] {
                if self.next()? != Some(expected) {
                    return Err(DecodeError::invalid(self.offset, "invalid byte order mark"));
                }
            }
        }
        if self.skip_ws()?.is_none() {
            return Err(DecodeError::EmptyInput);
        }
        self.value(Some(filter), handler)
    }

    fn next(&mut self) -> Result<Option<u8>, DecodeError> {
        let b = self.source.next_byte()?;
        if b.is_some() {
            self.offset += 1;
        }
        Ok(b)
    }

    fn require(&mut self) -> Result<u8, DecodeError> {
        self.next()?.ok_or(DecodeError::IncompleteInput {
            offset: self.offset,
        })
    }

    fn incomplete(&self) -> DecodeError {
        DecodeError::IncompleteInput {
            offset: self.offset,
        }
    }

    /// Skip whitespace and return the next significant byte without consuming it.
    fn skip_ws(&mut self) -> Result<Option<u8>, DecodeError> {
        loop {
            match self.source.peek_byte()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => {
                    self.next()?;
                }
                other => return Ok(other),
            }
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        self.depth += 1;
        if self.depth > self.budget.max_depth {
            return Err(DecodeError::TooDeep {
                limit: self.budget.max_depth,
            });
        }
        Ok(())
    }

    fn value<H: JsonContentHandler + ?Sized>(
        &mut self,
        filter: Option<&Filter>,
        h: &mut H,
    ) -> Result<(), DecodeError> {
        let b = self.skip_ws()?.ok_or_else(|| self.incomplete())?;
        match b {
            b'{' => self.object(filter.filter(|f| f.admits_object()), h),
            b'[' => self.array(filter.filter(|f| f.admits_array()), h),
            b'"' => {
                self.next()?;
                if filter.is_some_and(Filter::admits_scalar) {
                    let truncated = self.read_string()?;
                    let s = self.scratch_str(truncated)?;
                    if truncated {
                        h.truncated_string_value(s);
                    } else {
                        h.string_value(s);
                    }
                    Ok(())
                } else {
                    self.skip_string()
                }
            }
            b't' => {
                self.literal(b"true")?;
                if filter.is_some_and(Filter::admits_scalar) {
                    h.boolean_value(true);
                }
                Ok(())
            }
            b'f' => {
                self.literal(b"false")?;
                if filter.is_some_and(Filter::admits_scalar) {
                    h.boolean_value(false);
                }
                Ok(())
            }
            b'n' => {
                self.literal(b"null")?;
                // null is reported wherever the path is admitted, whatever shape was expected
                if filter.is_some() {
                    h.null_value();
                }
                Ok(())
            }
            b'-' | b'0'..=b'9' => {
                let number = self.number()?;
                if filter.is_some_and(Filter::admits_scalar) {
                    h.number_value(number);
                }
                Ok(())
            }
            _ => Err(DecodeError::invalid(self.offset, "unexpected character")),
        }
    }

    fn object<H: JsonContentHandler + ?Sized>(
        &mut self,
        filter: Option<&Filter>,
        h: &mut H,
    ) -> Result<(), DecodeError> {
        self.next()?; // '{'
        self.enter()?;
        if filter.is_some() {
            h.start_object();
        }
        let mut first = true;
        loop {
            match self.skip_ws()? {
                Some(b'}') if first => {
                    self.next()?;
                    break;
                }
                Some(b'"') => {
                    self.next()?;
                }
                Some(_) => return Err(DecodeError::invalid(self.offset, "expected object key")),
                None => return Err(self.incomplete()),
            }
            let child = match filter {
                Some(f) => {
                    if self.read_string()? {
                        None
                    } else {
                        let key = self.scratch_str(false)?;
                        let child = f.get(key);
                        if child.is_some() {
                            h.key(key);
                        }
                        child
                    }
                }
                None => {
                    self.skip_string()?;
                    None
                }
            };
            match self.skip_ws()? {
                Some(b':') => {
                    self.next()?;
                }
                Some(_) => return Err(DecodeError::invalid(self.offset, "expected ':'")),
                None => return Err(self.incomplete()),
            }
            self.value(child, h)?;
            match self.skip_ws()? {
                Some(b',') => {
                    self.next()?;
                    first = false;
                }
                Some(b'}') => {
                    self.next()?;
                    break;
                }
                Some(_) => return Err(DecodeError::invalid(self.offset, "expected ',' or '}'")),
                None => return Err(self.incomplete()),
            }
        }
        self.depth -= 1;
        if filter.is_some() {
            h.end_object();
        }
        Ok(())
    }

    fn array<H: JsonContentHandler + ?Sized>(
        &mut self,
        filter: Option<&Filter>,
        h: &mut H,
    ) -> Result<(), DecodeError> {
        self.next()?; // '['
        self.enter()?;
        let element = filter.and_then(Filter::element);
        if filter.is_some() {
            h.start_array();
        }
        match self.skip_ws()? {
            Some(b']') => {
                self.next()?;
            }
            Some(_) => {
                let mut index = 0;
                loop {
                    let child = match element {
                        Some(e) if h.start_element(index) => Some(e),
                        _ => None,
                    };
                    self.value(child, h)?;
                    index += 1;
                    match self.skip_ws()? {
                        Some(b',') => {
                            self.next()?;
                        }
                        Some(b']') => {
                            self.next()?;
                            break;
                        }
                        Some(_) => {
                            return Err(DecodeError::invalid(self.offset, "expected ',' or ']'"))
                        }
                        None => return Err(self.incomplete()),
                    }
                }
            }
            None => return Err(self.incomplete()),
        }
        self.depth -= 1;
        if filter.is_some() {
            h.end_array();
        }
        Ok(())
    }

    /// Read a string body (opening quote already consumed) into scratch.
    /// Returns true if it did not fit and was truncated.
    fn read_string(&mut self) -> Result<bool, DecodeError> {
        self.scratch.clear();
        let mut truncated = false;
        loop {
            match self.require()? {
                b'"' => return Ok(truncated),
                b'\\' => {
                    let ch = self.escape()?;
                    let mut buf = [0u8; 4];
                    self.push_scratch(ch.encode_utf8(&mut buf).as_bytes(), &mut truncated);
                }
                0x00..=0x1f => {
                    return Err(DecodeError::invalid(
                        self.offset,
                        "unescaped control character in string",
                    ))
                }
                b => self.push_scratch(&[b], &mut truncated),
            }
        }
    }

    fn push_scratch(&mut self, bytes: &[u8], truncated: &mut bool) {
        if *truncated {
            return;
        }
        if self.scratch.len() + bytes.len() > self.budget.scratch_bytes {
            *truncated = true;
        } else {
            self.scratch.extend_from_slice(bytes);
        }
    }

    /// Scratch contents as text. A truncated string may end inside a multi-byte
    /// character; that partial character is dropped.
    fn scratch_str(&self, truncated: bool) -> Result<&str, DecodeError> {
        match std::str::from_utf8(&self.scratch) {
            Ok(s) => Ok(s),
            Err(e) if truncated && e.error_len().is_none() => {
                std::str::from_utf8(&self.scratch[..e.valid_up_to()])
                    .map_err(|_| DecodeError::invalid(self.offset, "invalid UTF-8 in string"))
            }
            Err(_) => Err(DecodeError::invalid(self.offset, "invalid UTF-8 in string")),
        }
    }

    /// Consume a string body (opening quote already consumed) without storing it.
    fn skip_string(&mut self) -> Result<(), DecodeError> {
        loop {
            match self.require()? {
                b'"' => return Ok(()),
                b'\\' => {
                    self.escape()?;
                }
                0x00..=0x1f => {
                    return Err(DecodeError::invalid(
                        self.offset,
                        "unescaped control character in string",
                    ))
                }
                _ => {}
            }
        }
    }

    /// Decode the escape sequence after a backslash.
    fn escape(&mut self) -> Result<char, DecodeError> {
        Ok(match self.require()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let hi = self.hex4()?;
                let code = if (0xd800..0xdc00).contains(&hi) {
                    if self.require()? != b'\\' || self.require()? != b'u' {
                        return Err(DecodeError::invalid(self.offset, "unpaired surrogate"));
                    }
                    let lo = self.hex4()?;
                    if !(0xdc00..0xe000).contains(&lo) {
                        return Err(DecodeError::invalid(self.offset, "unpaired surrogate"));
                    }
                    0x10000 + ((hi - 0xd800) << 10) + (lo - 0xdc00)
                } else {
                    hi
                };
                char::from_u32(code)
                    .ok_or(DecodeError::invalid(self.offset, "invalid Unicode code point"))?
            }
            _ => return Err(DecodeError::invalid(self.offset, "invalid escape")),
        })
    }

    fn hex4(&mut self) -> Result<u32, DecodeError> {
        let mut v = 0u32;
        for _ in 0..4 {
            let d = (self.require()? as char)
                .to_digit(16)
                .ok_or(DecodeError::invalid(self.offset, "invalid \\u hex"))?;
            v = (v << 4) | d;
        }
        Ok(v)
    }

    fn literal(&mut self, word: &[u8]) -> Result<(), DecodeError> {
        for &expected in word {
            if self.require()? != expected {
                return Err(DecodeError::invalid(self.offset, "invalid literal"));
            }
        }
        Ok(())
    }

    fn number(&mut self) -> Result<JsonNumber, DecodeError> {
        self.scratch.clear();
        while let Some(b @ (b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')) =
            self.source.peek_byte()?
        {
            if self.scratch.len() >= self.budget.scratch_bytes {
                return Err(DecodeError::NoMemory {
                    limit: self.budget.scratch_bytes,
                });
            }
            self.next()?;
            self.scratch.push(b);
        }
        if !is_json_number(&self.scratch) {
            return Err(DecodeError::invalid(self.offset, "invalid number"));
        }
        std::str::from_utf8(&self.scratch)
            .ok()
            .and_then(JsonNumber::from_token)
            .ok_or(DecodeError::invalid(self.offset, "invalid number"))
    }
}

/// True if `data` is exactly one number in JSON grammar (no leading zeros, digits after
/// '.', digits in the exponent).
fn is_json_number(data: &[u8]) -> bool {
    let digit = |i: usize| matches!(data.get(i), Some(b'0'..=b'9'));
    let mut i = 0;
    if data.first() == Some(&b'-') {
        i += 1;
    }
    match data.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            while digit(i) {
                i += 1;
            }
        }
        _ => return false,
    }
    if data.get(i) == Some(&b'.') {
        i += 1;
        if !digit(i) {
            return false;
        }
        while digit(i) {
            i += 1;
        }
    }
    if matches!(data.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(data.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if !digit(i) {
            return false;
        }
        while digit(i) {
            i += 1;
        }
    }
    i == data.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::source::SliceSource;

    /// Records events as compact strings.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip_from: Option<usize>,
    }

    impl JsonContentHandler for Recorder {
        fn start_object(&mut self) {
            self.events.push("{".into());
        }
        fn end_object(&mut self) {
            self.events.push("}".into());
        }
        fn start_array(&mut self) {
            self.events.push("[".into());
        }
        fn end_array(&mut self) {
            self.events.push("]".into());
        }
        fn number_value(&mut self, number: JsonNumber) {
            self.events.push(format!("n:{}", number.as_f64()));
        }
        fn string_value(&mut self, value: &str) {
            self.events.push(format!("s:{}", value));
        }
        fn truncated_string_value(&mut self, prefix: &str) {
            self.events.push(format!("t:{}", prefix));
        }
        fn boolean_value(&mut self, value: bool) {
            self.events.push(format!("b:{}", value));
        }
        fn null_value(&mut self) {
            self.events.push("null".into());
        }
        fn key(&mut self, key: &str) {
            self.events.push(format!("k:{}", key));
        }
        fn start_element(&mut self, index: usize) -> bool {
            self.skip_from.map_or(true, |limit| index < limit)
        }
    }

    fn run(json: &str, filter: &Filter) -> Result<Vec<String>, DecodeError> {
        run_with(json, filter, DecodeBudget::default())
    }

    fn run_with(json: &str, filter: &Filter, budget: DecodeBudget) -> Result<Vec<String>, DecodeError> {
        let mut rec = Recorder::default();
        decode_filtered(SliceSource::new(json.as_bytes()), filter, budget, &mut rec)?;
        Ok(rec.events)
    }

    #[test]
    fn accept_delivers_everything() {
        let ev = run(r#"{"a":[1,true,null],"b":"x"}"#, &Filter::accept()).unwrap();
        assert_eq!(
            ev,
            vec!["{", "k:a", "[", "n:1", "b:true", "null", "]", "k:b", "s:x", "}"]
        );
    }

    #[test]
    fn unlisted_siblings_are_skipped() {
        let json = r#"{"device":{"id":"d1","volume":5},"is_playing":true,"item":{"name":"Song","album":{"name":"A"}},"other":[{"x":"y"}]}"#;
        let filter = Filter::object()
            .field("is_playing")
            .child("item", Filter::object().field("name"));
        let ev = run(json, &filter).unwrap();
        assert_eq!(ev, vec!["{", "k:is_playing", "b:true", "k:item", "{", "k:name", "s:Song", "}", "}"]);
    }

    #[test]
    fn array_filter_applies_to_each_element() {
        let json = r#"{"images":[{"url":"u1","h":1},{"url":"u2","h":2}]}"#;
        let filter = Filter::object().child("images", Filter::array(Filter::object().field("url")));
        let ev = run(json, &filter).unwrap();
        assert_eq!(ev, vec!["{", "k:images", "[", "{", "k:url", "s:u1", "}", "{", "k:url", "s:u2", "}", "]", "}"]);
    }

    #[test]
    fn start_element_can_skip_elements() {
        let mut rec = Recorder {
            skip_from: Some(1),
            ..Default::default()
        };
        decode_filtered(
            SliceSource::new(br#"["a","b","c"]"#),
            &Filter::accept(),
            DecodeBudget::default(),
            &mut rec,
        )
        .unwrap();
        assert_eq!(rec.events, vec!["[", "s:a", "]"]);
    }

    #[test]
    fn escapes_and_surrogate_pairs() {
        let ev = run(r#""a\"b\\cé😀\n""#, &Filter::accept()).unwrap();
        assert_eq!(ev, vec!["s:a\"b\\cé😀\n"]);
        assert!(run(r#""\ud83d""#, &Filter::accept()).is_err());
    }

    #[test]
    fn long_strings_are_truncated_on_char_boundary() {
        let budget = DecodeBudget {
            scratch_bytes: 4,
            max_depth: 4,
        };
        let ev = run_with(r#"["abcdef","aé€"]"#, &Filter::accept(), budget).unwrap();
        // "aé€" is 1 + 2 + 3 bytes; only "aé" fits in four
        assert_eq!(ev, vec!["[", "t:abcd", "t:aé", "]"]);
    }

    #[test]
    fn overlong_key_never_matches() {
        let budget = DecodeBudget {
            scratch_bytes: 3,
            max_depth: 4,
        };
        let filter = Filter::object().field("abcdef").field("ok");
        let ev = run_with(r#"{"abcdef":1,"ok":2}"#, &filter, budget).unwrap();
        assert_eq!(ev, vec!["{", "k:ok", "n:2", "}"]);
    }

    #[test]
    fn skipped_values_are_still_validated() {
        let filter = Filter::object().field("a");
        let err = run(r#"{"a":1,"b":[1,}"#, &filter).unwrap_err();
        assert_eq!(err.code(), "InvalidInput");
    }

    #[test]
    fn diagnostic_codes() {
        assert_eq!(run("", &Filter::accept()).unwrap_err(), DecodeError::EmptyInput);
        assert_eq!(run("   ", &Filter::accept()).unwrap_err(), DecodeError::EmptyInput);
        assert_eq!(run(r#"{"a":"#, &Filter::accept()).unwrap_err().code(), "IncompleteInput");
        assert_eq!(run(r#"{"a":1,}"#, &Filter::accept()).unwrap_err().code(), "InvalidInput");
        assert_eq!(run("[1,]", &Filter::accept()).unwrap_err().code(), "InvalidInput");
        assert_eq!(run("01", &Filter::accept()).unwrap_err().code(), "InvalidInput");
        assert_eq!(run("tru", &Filter::accept()).unwrap_err().code(), "IncompleteInput");
        assert_eq!(run("nul!", &Filter::accept()).unwrap_err().code(), "InvalidInput");
    }

    #[test]
    fn depth_limit_applies_to_skipped_values() {
        let budget = DecodeBudget {
            scratch_bytes: 16,
            max_depth: 3,
        };
        let filter = Filter::object().field("keep");
        let err = run_with(r#"{"skip":[[[[1]]]],"keep":1}"#, &filter, budget).unwrap_err();
        assert_eq!(err, DecodeError::TooDeep { limit: 3 });
    }

    #[test]
    fn numbers() {
        let ev = run("[0,-1.5,2e3,1E-2]", &Filter::accept()).unwrap();
        assert_eq!(ev, vec!["[", "n:0", "n:-1.5", "n:2000", "n:0.01", "]"]);
        let budget = DecodeBudget {
            scratch_bytes: 3,
            max_depth: 2,
        };
        assert_eq!(
            run_with("12345", &Filter::accept(), budget).unwrap_err(),
            DecodeError::NoMemory { limit: 3 }
        );
    }

    #[test]
    fn stops_after_root_value() {
        let data = br#"{"a":1} trailing"#;
        let mut source = SliceSource::new(data);
        let mut rec = Recorder::default();
        FilteredDecoder::new(&mut source, DecodeBudget::default())
            .decode(&Filter::accept(), &mut rec)
            .unwrap();
        assert_eq!(source.remaining(), b" trailing");
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let ev = run("\u{feff}true", &Filter::accept()).unwrap();
        assert_eq!(ev, vec!["b:true"]);
    }
}
