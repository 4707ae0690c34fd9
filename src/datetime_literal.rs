// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Declarative macro to create a [`Timestamp`](crate::timestamp::Timestamp) from a UTC datetime
/// literal in const context, as this is otherwise cumbersome.
///
/// Precision is limited to whole seconds, which is what tests and fixtures need.
///
/// Usage:
/// ```rust
///    # use pendwrite::{timestamp, timestamp::Timestamp};
///    const WRITE_TIME: Timestamp = timestamp!(2024-12-24 15:00:00 Z);
///    assert_eq!(WRITE_TIME.to_string(), "2024-12-24T15:00:00Z");
/// ```
#[macro_export]
macro_rules! timestamp {
    ( $year:literal-$month:literal-$day:literal $(T)? $hour:literal:$min:literal:$second:literal Z ) => {
        const {
            #[allow(clippy::zero_prefixed_literal)]
            $crate::timestamp::Timestamp::__from_millis_unchecked(
                $crate::chrono::DateTime::<$crate::chrono::Utc>::from_naive_utc_and_offset(
                    $crate::chrono::NaiveDateTime::new(
                        match $crate::chrono::NaiveDate::from_ymd_opt($year, $month, $day) {
                            Some(date) => date,
                            None => ::std::panic!("year-month-day outside expected range."),
                        },
                        match $crate::chrono::NaiveTime::from_hms_opt($hour, $min, $second) {
                            Some(time) => time,
                            None => ::std::panic!("hour:min:second outside expected range."),
                        },
                    ),
                    $crate::chrono::Utc,
                )
                .timestamp_millis(),
            )
        }
    };
}
