//! # Downstream Accounting Failures
//!
//! A completed frame is delivered at most once. A failing receiver surfaces
//! an error to the submitter but never re-opens the frame or blocks the next
//! one.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use oracle_runtime::adapters::{AccountingChannelReceiver, AccountingNotice};
    use qc_18_beacon_oracle::test_utils::ManualTimeSource;
    use qc_18_beacon_oracle::{
        BeaconReportReceiver, FrameStatus, OracleApi, OracleError, OracleEvent, OracleResult,
        RecordingReceiver, ReportData,
    };

    use crate::integration::*;

    /// Fails with a non-downstream error on the first call only
    struct FlakyReceiver {
        calls: AtomicU32,
    }

    #[async_trait]
    impl BeaconReportReceiver for FlakyReceiver {
        async fn on_frame_completed(&self, _: u64, _: u128, _: u64) -> OracleResult<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(OracleError::storage("ledger locked"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_outage_does_not_block_later_frames() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let clock = Arc::new(ManualTimeSource::new(at_epoch(10)));
        let service =
            open_durable(dir.path(), config(&[1], 1), receiver.clone(), clock.clone()).unwrap();
        let mut events = service.subscribe();

        receiver.reject_with(Some("accounting offline"));
        let result = service.submit_report(report(1, 10, 1, 1, at_epoch(10))).await;
        assert_eq!(
            result,
            Err(OracleError::DownstreamRejected {
                epoch_id: 10,
                reason: "accounting offline".into()
            })
        );
        assert_eq!(service.get_current_frame_status().await, FrameStatus::Completed);

        // Completion is still announced to subscribers
        events.try_recv().unwrap();
        assert!(matches!(
            events.try_recv(),
            Ok(OracleEvent::Completed { epoch_id: 10, .. })
        ));

        receiver.reject_with(None);
        clock.set(at_epoch(20));
        let status = service
            .submit_report(report(1, 20, 2, 2, at_epoch(20)))
            .await
            .unwrap();
        assert!(status.is_completed());

        assert_eq!(
            receiver.delivered(),
            vec![ReportData::new(10, 1, 1), ReportData::new(20, 2, 2)]
        );
        assert_eq!(service.get_last_completed_epoch().await, 20);
    }

    #[tokio::test]
    async fn test_receiver_errors_reported_as_downstream() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(FlakyReceiver {
            calls: AtomicU32::new(0),
        });
        let clock = Arc::new(ManualTimeSource::new(at_epoch(10)));
        let service =
            open_durable(dir.path(), config(&[1], 1), receiver.clone(), clock).unwrap();

        let err = service
            .submit_report(report(1, 10, 1, 1, at_epoch(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::DownstreamRejected { epoch_id: 10, .. }));
        assert_eq!(err.kind().as_str(), "downstream");
        assert_eq!(receiver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closed_accounting_channel_keeps_frame_completed() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualTimeSource::new(at_epoch(10)));
        let (receiver, notices) = AccountingChannelReceiver::channel(4);
        drop(notices);

        {
            let service =
                open_durable(dir.path(), config(&[1, 2], 1), Arc::new(receiver), clock.clone())
                    .unwrap();
            let result = service.submit_report(report(1, 10, 9, 9, at_epoch(10))).await;
            assert!(matches!(result, Err(OracleError::DownstreamRejected { .. })));
        }

        // The completion was persisted before delivery was attempted
        let (receiver, mut notices) = AccountingChannelReceiver::channel(4);
        let service =
            open_durable(dir.path(), config(&[1, 2], 1), Arc::new(receiver), clock).unwrap();
        assert_eq!(service.get_last_completed_epoch().await, 10);
        assert_eq!(
            service.submit_report(report(2, 10, 9, 9, at_epoch(10))).await,
            Err(OracleError::FrameAlreadyCompleted { frame_id: 1 })
        );
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_accounting_notices_arrive_in_completion_order() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualTimeSource::new(at_epoch(10)));
        let (receiver, mut notices) = AccountingChannelReceiver::channel(8);
        let service =
            open_durable(dir.path(), config(&[1], 1), Arc::new(receiver), clock.clone()).unwrap();

        for frame in 1..=3u64 {
            let epoch = frame * 10;
            clock.set(at_epoch(epoch));
            service
                .submit_report(report(1, epoch, frame as u128, frame, at_epoch(epoch)))
                .await
                .unwrap();
        }

        let mut received = Vec::new();
        while let Ok(notice) = notices.try_recv() {
            received.push(notice);
        }
        assert_eq!(
            received,
            vec![
                AccountingNotice {
                    epoch_id: 10,
                    beacon_balance: 1,
                    beacon_validators: 1
                },
                AccountingNotice {
                    epoch_id: 20,
                    beacon_balance: 2,
                    beacon_validators: 2
                },
                AccountingNotice {
                    epoch_id: 30,
                    beacon_balance: 3,
                    beacon_validators: 3
                },
            ]
        );
    }
}
