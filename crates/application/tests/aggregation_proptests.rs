//! Property-based tests for the aggregation fold
#![allow(clippy::unwrap_used)]

use application::aggregate_stream;
use chrono::{TimeZone, Utc};
use domain::{AggregatedInfo, ForecastRecord};
use futures::StreamExt;
use futures::stream;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

fn arb_record() -> impl Strategy<Value = ForecastRecord> {
    (
        proptest::option::of(0i64..3_000),
        proptest::option::of(-100i32..100),
        proptest::option::of("[A-Za-z]{0,8}"),
    )
        .prop_map(|(day_offset, temperature_c, summary)| ForecastRecord {
            date: day_offset.map(|off| {
                Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(off)
            }),
            temperature_c,
            summary,
        })
}

fn run_aggregate(records: Vec<ForecastRecord>) -> Option<AggregatedInfo> {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(async {
            aggregate_stream(
                stream::iter(records.into_iter().map(Ok)).boxed(),
                &CancellationToken::new(),
            )
            .await
            .unwrap()
        })
}

proptest! {
    /// Whenever an aggregate is produced its numeric invariants hold.
    #[test]
    fn aggregate_invariants(records in proptest::collection::vec(arb_record(), 0..64)) {
        if let Some(info) = run_aggregate(records) {
            prop_assert!(info.forecast_samples >= 1);
            prop_assert!(info.period_start <= info.period_end);
            prop_assert!(info.min_temperature_c <= info.avg_temperature_c);
            prop_assert!(info.avg_temperature_c <= info.max_temperature_c);
            prop_assert!(info.min_temperature_f <= info.avg_temperature_f);
            prop_assert!(info.avg_temperature_f <= info.max_temperature_f);
        }
    }

    /// The fold result does not depend on how the stream is chunked.
    #[test]
    fn chunking_does_not_change_result(
        records in proptest::collection::vec(arb_record(), 0..32),
        chunk in 1usize..8,
    ) {
        let one_shot = run_aggregate(records.clone());

        let chunked = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(async {
                let chunks: Vec<_> = records
                    .chunks(chunk)
                    .map(|c| stream::iter(c.to_vec().into_iter().map(Ok)))
                    .collect();
                let chained = stream::iter(chunks).flatten().boxed();
                aggregate_stream(chained, &CancellationToken::new())
                    .await
                    .unwrap()
            });

        prop_assert_eq!(one_shot, chunked);
    }
}
