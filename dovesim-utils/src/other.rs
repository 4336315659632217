//! Helpers that fit no other module.

use time::{format_description, OffsetDateTime};

/// Timestamp of the current time as `YYYY-MM-DD_HH-mm-SS`, safe for use in
/// file and directory names. Falls back to UTC when the local offset cannot
/// be determined.
pub fn get_timestamp() -> String {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(
            &format_description::parse("[year]-[month]-[day]_[hour]-[minute]-[second]").unwrap(),
        )
        .unwrap()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamp_is_filename_safe() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 19);
        for (idx, c) in ts.char_indices() {
            match idx {
                4 | 7 | 13 | 16 => assert_eq!(c, '-'),
                10 => assert_eq!(c, '_'),
                _ => assert!(c.is_ascii_digit(), "unexpected {c:?} at {idx}"),
            }
        }
    }
}
