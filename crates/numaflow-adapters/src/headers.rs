//! Header wire encoding shared by every broker adapter.
//!
//! Reserved keys mirror the ISB wire format: `id`, `key`, `eventTime`,
//! `startTime`, `endTime` carry millisecond-since-epoch decimal strings, and
//! `window` carries the literal `"1"` when the message belongs to a window.

use numaflow_core::message::Header;

pub const KEY_ID: &str = "id";
pub const KEY_KEY: &str = "key";
pub const KEY_EVENT_TIME: &str = "eventTime";
pub const KEY_START_TIME: &str = "startTime";
pub const KEY_END_TIME: &str = "endTime";
pub const KEY_WINDOW: &str = "window";
pub const WINDOW_TRUE: &str = "1";

#[derive(Debug, thiserror::Error)]
pub enum HeaderDecodeError {
    #[error("missing header: {key}")]
    Missing { key: &'static str },
    #[error("malformed timestamp in header {key}: {value}")]
    MalformedTimestamp { key: &'static str, value: String },
}

/// Encode a `Header` as the ordered `(key, value)` wire pairs used by every
/// broker adapter's publish call.
#[must_use]
pub fn encode(header: &Header) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        (KEY_ID, header.id.clone()),
        (KEY_KEY, header.key.clone()),
        (KEY_EVENT_TIME, header.event_time.timestamp_millis().to_string()),
        (KEY_START_TIME, header.start_time.timestamp_millis().to_string()),
        (KEY_END_TIME, header.end_time.timestamp_millis().to_string()),
    ];
    if header.is_window {
        pairs.push((KEY_WINDOW, WINDOW_TRUE.to_string()));
    }
    pairs
}

/// Decode a `Header` from wire pairs produced by [`encode`]. Any lookup
/// function works: callers pass a closure over whatever header-map type
/// their broker client uses.
pub fn decode<'a>(
    get: impl Fn(&str) -> Option<&'a str>,
) -> Result<Header, HeaderDecodeError> {
    let id = get(KEY_ID)
        .ok_or(HeaderDecodeError::Missing { key: KEY_ID })?
        .to_string();
    let key = get(KEY_KEY)
        .ok_or(HeaderDecodeError::Missing { key: KEY_KEY })?
        .to_string();
    let event_time = parse_millis(&get, KEY_EVENT_TIME)?;
    let start_time = parse_millis(&get, KEY_START_TIME)?;
    let end_time = parse_millis(&get, KEY_END_TIME)?;
    let is_window = get(KEY_WINDOW) == Some(WINDOW_TRUE);

    Ok(Header {
        id,
        key,
        event_time,
        start_time,
        end_time,
        is_window,
    })
}

fn parse_millis<'a>(
    get: &impl Fn(&str) -> Option<&'a str>,
    key: &'static str,
) -> Result<chrono::DateTime<chrono::Utc>, HeaderDecodeError> {
    let raw = get(key).ok_or(HeaderDecodeError::Missing { key })?;
    let millis: i64 = raw
        .parse()
        .map_err(|_| HeaderDecodeError::MalformedTimestamp { key, value: raw.to_string() })?;
    chrono::DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| HeaderDecodeError::MalformedTimestamp { key, value: raw.to_string() })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample_header() -> Header {
        Header {
            id: "msg-1".to_string(),
            key: "partition-a".to_string(),
            event_time: chrono::DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            start_time: chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            end_time: chrono::DateTime::from_timestamp_millis(1_700_000_060_000).unwrap(),
            is_window: false,
        }
    }

    #[test]
    fn round_trips_through_the_wire_pairs() {
        let header = Header {
            id: "msg-1".to_string(),
            key: "partition-a".to_string(),
            event_time: chrono::DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            start_time: chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            end_time: chrono::DateTime::from_timestamp_millis(1_700_000_060_000).unwrap(),
            is_window: true,
        };

        let pairs = encode(&header);
        let map: HashMap<&str, &str> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let decoded = decode(|k| map.get(k).copied()).unwrap();

        assert_eq!(decoded, header.truncated_to_millis());
    }

    #[test]
    fn missing_window_key_decodes_to_false() {
        let header = sample_header();
        let pairs = encode(&header);
        let map: HashMap<&str, &str> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let decoded = decode(|k| map.get(k).copied()).unwrap();
        assert!(!decoded.is_window);
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let err = decode(|_| None).unwrap_err();
        assert!(matches!(err, HeaderDecodeError::Missing { key: KEY_ID }));
    }
}
