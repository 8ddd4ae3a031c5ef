use rsvp_types::InviteRecord;

/// Errors from encoding or decoding a stored invite payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The payload is truncated or has the wrong shape.
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Byte-level codec for invite records.
///
/// Payloads are JSON objects with snake_case keys. The format is shared
/// with existing data files, so it must stay stable across releases.
pub struct RecordCodec;

impl RecordCodec {
    /// Encode a record into its stored form.
    pub fn encode(record: &InviteRecord) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(record).map_err(CodecError::Serialization)
    }

    /// Decode a stored payload.
    pub fn decode(data: &[u8]) -> Result<InviteRecord, CodecError> {
        serde_json::from_slice(data).map_err(CodecError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn sample() -> InviteRecord {
        let mut r = InviteRecord::new(vec!["Иван Петров".into(), "Мария Петрова".into()], 2);
        r.record_view(Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap());
        r.accept(vec!["Георги".into()], Utc.timestamp_opt(1_700_000_100, 0).unwrap())
            .unwrap();
        r
    }

    #[test]
    fn encodes_snake_case_keys() {
        let bytes = RecordCodec::encode(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["additional_count"], 2);
        assert_eq!(value["accepted"], true);
        assert!(value["viewed_at"].is_array());
        assert!(value["accepted_at"].is_string());
    }

    #[test]
    fn decodes_what_it_encodes() {
        let r = sample();
        let decoded = RecordCodec::decode(&RecordCodec::encode(&r).unwrap()).unwrap();
        assert_eq!(decoded, r);
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let bytes = RecordCodec::encode(&sample()).unwrap();
        let err = RecordCodec::decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        assert!(matches!(
            RecordCodec::decode(br#"["not", "a", "record"]"#),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            RecordCodec::decode(br#"{"people": "nobody"}"#),
            Err(CodecError::Malformed(_))
        ));
        assert!(RecordCodec::decode(b"").is_err());
    }

    fn arb_time() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..4_102_444_800, 0u32..1_000_000_000)
            .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
    }

    fn arb_record() -> impl Strategy<Value = InviteRecord> {
        (
            prop::collection::vec("\\PC{1,24}", 1..4),
            0u32..6,
            prop::collection::vec("\\PC{0,24}", 0..6),
            any::<bool>(),
            prop::collection::vec(arb_time(), 0..5),
            prop::option::of(arb_time()),
        )
            .prop_map(
                |(people, additional_count, additional, accepted, viewed_at, accepted_at)| {
                    InviteRecord {
                        people,
                        additional_count,
                        additional,
                        accepted,
                        viewed_at,
                        accepted_at,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn round_trip(r in arb_record()) {
            let bytes = RecordCodec::encode(&r).unwrap();
            prop_assert_eq!(RecordCodec::decode(&bytes).unwrap(), r);
        }
    }
}
