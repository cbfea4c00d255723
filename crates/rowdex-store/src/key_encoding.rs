//! Order-preserving key encoding for PartitionKey / RowKey fragments.
//!
//! Every scalar projected out of an entity becomes one string fragment whose
//! byte-wise ordering matches the scalar's natural ordering:
//!
//! | Kind              | Encoding                                     | Example                 |
//! |-------------------|----------------------------------------------|-------------------------|
//! | `Int32`           | zero-padded decimal, width 10                | `0000000042`            |
//! | `Int64`           | zero-padded decimal, width 19                | `0000000000000000042`   |
//! | `Guid`            | 32 lowercase hex digits                      | `6f9619ff8b86d011b42d…` |
//! | `String`          | verbatim, `/` and `\` escaped                | `R&D⇃Ops`               |
//! | `Bool`            | `True` / `False`                             | `True`                  |
//! | `Timestamp*`      | `encode_i64(i64::MAX - ticks)` (newest first)| `2518...`               |
//!
//! Fragments are joined with [`KEY_COMBINATION_CHAR`]. Integer, GUID and timestamp
//! fragments can never contain it; string fragments are not checked, so a string
//! fragment that may contain `-` must be the last fragment of its key.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rowdex_commons::KeyValue;
use uuid::Uuid;

/// Separator placed between the fragments of a composite key.
pub const KEY_COMBINATION_CHAR: char = '-';

/// 100 ns ticks between 0001-01-01T00:00:00 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

const TICKS_PER_SECOND: i64 = 10_000_000;

// Store-reserved path characters and their private-use substitutes.
const ESCAPES: [(char, char); 2] = [('/', '\u{21C3}'), ('\\', '\u{21C2}')];

/// Encode one scalar key value.
///
/// # Examples
///
/// ```
/// use rowdex_commons::KeyValue;
/// use rowdex_store::key_encoding::encode;
///
/// assert_eq!(encode(&KeyValue::Int32(42)), "0000000042");
/// assert_eq!(encode(&KeyValue::Bool(true)), "True");
/// ```
pub fn encode(value: &KeyValue) -> String {
    match value {
        KeyValue::Int32(v) => encode_i32(*v),
        KeyValue::Int64(v) => encode_i64(*v),
        KeyValue::Guid(v) => encode_guid(v),
        KeyValue::String(v) => key_encode(v),
        KeyValue::Bool(v) => encode_bool(*v),
        KeyValue::Timestamp(v) => encode_timestamp(v),
        KeyValue::TimestampOffset(v) => encode_timestamp_offset(v),
    }
}

/// Width-10 decimal. Negatives render as `-` followed by the padded magnitude.
pub fn encode_i32(value: i32) -> String {
    if value < 0 {
        format!("-{:010}", value.unsigned_abs())
    } else {
        format!("{:010}", value)
    }
}

/// Width-19 decimal. Negatives render as `-` followed by the padded magnitude.
pub fn encode_i64(value: i64) -> String {
    if value < 0 {
        format!("-{:019}", value.unsigned_abs())
    } else {
        format!("{:019}", value)
    }
}

pub fn encode_guid(value: &Uuid) -> String {
    value.simple().to_string()
}

pub fn encode_bool(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}

/// Descending encoding of a UTC timestamp: later instants produce smaller keys.
pub fn encode_timestamp(value: &DateTime<Utc>) -> String {
    encode_i64(i64::MAX.saturating_sub(ticks(&value.naive_utc())))
}

/// Descending encoding of an offset timestamp, keyed by its clock time in its own offset.
pub fn encode_timestamp_offset(value: &DateTime<FixedOffset>) -> String {
    encode_i64(i64::MAX.saturating_sub(ticks(&value.naive_local())))
}

/// 100 ns intervals elapsed since 0001-01-01T00:00:00 for a wall-clock time.
pub fn ticks(value: &NaiveDateTime) -> i64 {
    let utc = value.and_utc();
    utc.timestamp()
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(i64::from(utc.timestamp_subsec_nanos() / 100))
        .saturating_add(UNIX_EPOCH_TICKS)
}

/// Join already-encoded fragments into one composite key.
///
/// # Examples
///
/// ```
/// use rowdex_store::key_encoding::combine;
///
/// assert_eq!(combine(["0000000001", "instance"]), "0000000001-instance");
/// ```
pub fn combine<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::new();
    for (i, fragment) in fragments.into_iter().enumerate() {
        if i > 0 {
            key.push(KEY_COMBINATION_CHAR);
        }
        key.push_str(fragment.as_ref());
    }
    key
}

/// Replace store-reserved `/` and `\` with their private-use substitutes.
pub fn key_encode(key: &str) -> String {
    key.chars()
        .map(|c| {
            ESCAPES
                .iter()
                .find(|(raw, _)| *raw == c)
                .map_or(c, |(_, escaped)| *escaped)
        })
        .collect()
}

/// Restore `/` and `\` from their substitutes. Only needed for display.
pub fn key_decode(key: &str) -> String {
    key.chars()
        .map(|c| {
            ESCAPES
                .iter()
                .find(|(_, escaped)| *escaped == c)
                .map_or(c, |(raw, _)| *raw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_int_widths() {
        assert_eq!(encode_i32(0), "0000000000");
        assert_eq!(encode_i32(i32::MAX), "2147483647");
        assert_eq!(encode_i64(42), "0000000000000000042");
        assert_eq!(encode_i64(i64::MAX), "9223372036854775807");
    }

    #[test]
    fn test_negative_integers_keep_sign_prefix() {
        assert_eq!(encode_i32(-5), "-0000000005");
        assert_eq!(encode_i64(-5), "-0000000000000000005");
        assert_eq!(encode_i32(i32::MIN), "-2147483648");
    }

    #[test]
    fn test_i32_order_preserving() {
        let samples = [0, 1, 9, 10, 99, 100, 12_345, 999_999_999, 1_000_000_000, i32::MAX];
        for pair in samples.windows(2) {
            assert!(encode_i32(pair[0]) < encode_i32(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_i64_order_preserving() {
        let samples = [0_i64, 7, 70, 1 << 31, 1 << 40, 1 << 62, i64::MAX];
        for pair in samples.windows(2) {
            assert!(encode_i64(pair[0]) < encode_i64(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_guid_encoding_and_order() {
        let a = Uuid::parse_str("00000000-0000-0000-0000-000000000000").unwrap();
        let b = Uuid::parse_str("01000000-0000-0000-0000-000000000000").unwrap();
        let c = Uuid::parse_str("3ABAD168-6BFC-4B0A-9C95-2960FEE61833").unwrap();
        assert_eq!(encode_guid(&c), "3abad1686bfc4b0a9c952960fee61833");
        assert!(encode_guid(&a) < encode_guid(&b));
        assert!(encode_guid(&b) < encode_guid(&c));
        assert_eq!(encode_guid(&a).len(), 32);
    }

    #[test]
    fn test_bool_encoding() {
        assert_eq!(encode(&KeyValue::Bool(true)), "True");
        assert_eq!(encode(&KeyValue::Bool(false)), "False");
    }

    #[test]
    fn test_ticks_at_unix_epoch() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(ticks(&epoch.naive_utc()), UNIX_EPOCH_TICKS);

        let plus = epoch + Duration::microseconds(1);
        assert_eq!(ticks(&plus.naive_utc()), UNIX_EPOCH_TICKS + 10);
    }

    #[test]
    fn test_timestamp_descending() {
        let t1 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t2 = t1 + Duration::milliseconds(1);
        let t3 = Utc.with_ymd_and_hms(2031, 6, 30, 12, 0, 0).unwrap();

        assert!(encode_timestamp(&t1) > encode_timestamp(&t2));
        assert!(encode_timestamp(&t2) > encode_timestamp(&t3));
        assert_eq!(encode_timestamp(&t1).len(), 19);
    }

    #[test]
    fn test_offset_timestamp_uses_local_clock() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2021, 3, 4, 10, 0, 0).unwrap();
        let utc_same_clock = Utc.with_ymd_and_hms(2021, 3, 4, 10, 0, 0).unwrap();

        assert_eq!(
            encode(&KeyValue::TimestampOffset(local)),
            encode(&KeyValue::Timestamp(utc_same_clock))
        );
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine(Vec::<String>::new()), "");
        assert_eq!(combine(["a"]), "a");
        assert_eq!(combine(["a", "b", "c"]), "a-b-c");
    }

    #[test]
    fn test_composite_ordering_with_fixed_width_prefix() {
        let key = |a: i32, b: i32| combine([encode_i32(a), encode_i32(b)]);
        assert!(key(1, 9) < key(1, 10));
        assert!(key(1, 999) < key(2, 0));
        assert!(key(7, 0) < key(7, 1));
    }

    #[test]
    fn test_key_escaping() {
        let raw = r"R&D/Ops\West";
        let escaped = key_encode(raw);
        assert!(!escaped.contains('/'));
        assert!(!escaped.contains('\\'));
        assert_eq!(escaped, "R&D\u{21C3}Ops\u{21C2}West");
        assert_eq!(key_decode(&escaped), raw);
        assert_eq!(encode(&KeyValue::from(raw)), escaped);
    }

    #[test]
    fn test_strings_verbatim() {
        assert_eq!(encode(&KeyValue::from("Abc")), "Abc");
        assert_eq!(key_encode(""), "");
    }
}
