use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

/// SQLite integers are signed 64-bit.
pub fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("{value} does not fit in an SQLite INTEGER"))
}

/// Reads back an integer column into the narrower unsigned type the model uses.
pub fn from_sql_int<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T> {
    T::try_from(value).map_err(|_| anyhow!("column {column} holds out-of-range value {value}"))
}

pub fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("column {column} holds invalid timestamp {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(to_sql_int(42).unwrap(), 42);
        assert!(to_sql_int(u64::MAX).is_err());
        assert_eq!(from_sql_int::<u32>(7, "n").unwrap(), 7);
        assert!(from_sql_int::<u64>(-1, "n").is_err());
        assert!(from_sql_int::<u32>(i64::from(u32::MAX) + 1, "n").is_err());
    }

    #[test]
    fn timestamps_round_trip_through_rfc3339() {
        let now = Utc::now();
        assert_eq!(parse_timestamp(&now.to_rfc3339(), "at").unwrap(), now);
        assert!(parse_timestamp("yesterday", "at").is_err());
    }
}
