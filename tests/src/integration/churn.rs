//! # Reconfiguration Mid-Frame
//!
//! Membership, quorum and beacon spec changes while a frame is collecting.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qc_18_beacon_oracle::test_utils::ManualTimeSource;
    use qc_18_beacon_oracle::{
        BeaconSpec, EpochRange, FrameStatus, OracleApi, OracleError, OracleEvent,
        RecordingReceiver, ReportData, VariantSupport,
    };

    use crate::integration::*;

    #[tokio::test]
    async fn test_membership_churn_then_retroactive_quorum() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let now = at_epoch(12);
        let clock = Arc::new(ManualTimeSource::new(now));
        let service =
            open_durable(dir.path(), config(&[1, 2, 3, 4], 3), receiver.clone(), clock).unwrap();
        let mut events = service.subscribe();

        service.submit_report(report(1, 11, 100, 4, now)).await.unwrap();
        service.submit_report(report(2, 11, 100, 4, now)).await.unwrap();
        service.submit_report(report(3, 11, 999, 4, now)).await.unwrap();

        // Member 1 leaves; its vote goes with it
        assert_eq!(service.remove_member(member(1)).await.unwrap(), None);
        assert_eq!(
            service.get_current_variants().await,
            vec![
                VariantSupport {
                    report: ReportData::new(11, 100, 4),
                    support: 1
                },
                VariantSupport {
                    report: ReportData::new(11, 999, 4),
                    support: 1
                },
            ]
        );

        service.add_member(member(5)).await.unwrap();
        let status = service.submit_report(report(5, 11, 100, 4, now)).await.unwrap();
        assert!(!status.is_completed());

        let completed = service.set_quorum(2).await.unwrap().unwrap();
        assert_eq!(completed.report, ReportData::new(11, 100, 4));
        assert_eq!(completed.support, 2);
        assert_eq!(receiver.delivered(), vec![ReportData::new(11, 100, 4)]);

        let mut names = Vec::new();
        while let Ok(event) = events.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec![
                "BeaconReported",
                "BeaconReported",
                "BeaconReported",
                "MemberRemoved",
                "MemberAdded",
                "BeaconReported",
                "QuorumChanged",
                "Completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_rejoining_member_reports_again() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let now = at_epoch(12);
        let clock = Arc::new(ManualTimeSource::new(now));
        let service =
            open_durable(dir.path(), config(&[1, 2, 3], 3), receiver.clone(), clock).unwrap();

        service.submit_report(report(1, 11, 7, 7, now)).await.unwrap();
        service.remove_member(member(1)).await.unwrap();
        service.add_member(member(1)).await.unwrap();

        // Eviction cleared the duplicate guard
        service.submit_report(report(1, 11, 7, 7, now)).await.unwrap();
        service.submit_report(report(2, 11, 7, 7, now)).await.unwrap();
        let status = service.submit_report(report(3, 11, 7, 7, now)).await.unwrap();
        assert!(status.is_completed());
        assert_eq!(receiver.delivery_count(), 1);
    }

    #[tokio::test]
    async fn test_spec_change_keeps_collecting_frame_window() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let clock = Arc::new(ManualTimeSource::new(at_epoch(12)));
        let service =
            open_durable(dir.path(), config(&[1, 2], 2), receiver.clone(), clock.clone()).unwrap();
        let mut events = service.subscribe();

        service
            .submit_report(report(1, 11, 50, 2, at_epoch(12)))
            .await
            .unwrap();

        let shorter = BeaconSpec {
            epochs_per_frame: 5,
            ..spec()
        };
        service.set_beacon_spec(shorter).await.unwrap();
        assert_eq!(service.get_beacon_spec().await, shorter);

        let frame = service.get_current_frame().await;
        assert_eq!((frame.frame_id, frame.first_epoch, frame.last_epoch), (1, 10, 19));
        assert_eq!(service.get_current_reporters().await, vec![member(1)]);

        // Epoch 16 lies in the pinned window even though the new geometry
        // would place it in another frame
        clock.set(at_epoch(16));
        let status = service
            .submit_report(report(2, 11, 50, 2, at_epoch(16)))
            .await
            .unwrap();
        assert!(status.is_completed());
        assert_eq!(receiver.delivered(), vec![ReportData::new(11, 50, 2)]);

        // Past the pinned window the new geometry takes over
        clock.set(at_epoch(20));
        let frame = service.get_current_frame().await;
        assert_eq!((frame.frame_id, frame.first_epoch, frame.last_epoch), (4, 20, 24));
        assert_eq!(service.get_current_frame_status().await, FrameStatus::Collecting);

        assert!(matches!(events.try_recv(), Ok(OracleEvent::BeaconReported { .. })));
        assert_eq!(
            events.try_recv().unwrap(),
            OracleEvent::BeaconSpecSet { spec: shorter }
        );
    }

    #[tokio::test]
    async fn test_spec_change_after_lapse_rolls_over_first() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let clock = Arc::new(ManualTimeSource::new(at_epoch(12)));
        let service =
            open_durable(dir.path(), config(&[1, 2], 2), receiver.clone(), clock.clone()).unwrap();

        service
            .submit_report(report(1, 11, 50, 2, at_epoch(12)))
            .await
            .unwrap();

        // Frame 1 lapsed without quorum before the change arrives
        clock.set(at_epoch(21));
        service
            .set_beacon_spec(BeaconSpec {
                epochs_per_frame: 5,
                ..spec()
            })
            .await
            .unwrap();

        let frame = service.get_current_frame().await;
        assert_eq!((frame.frame_id, frame.first_epoch), (2, 20));
        assert!(service.get_current_reporters().await.is_empty());
        assert_eq!(service.get_last_completed_report().await, None);
        assert_eq!(receiver.delivery_count(), 0);
    }

    #[tokio::test]
    async fn test_spec_change_to_slower_epochs_moves_to_earlier_frame() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let clock = Arc::new(ManualTimeSource::new(at_epoch(15)));
        let service =
            open_durable(dir.path(), config(&[1, 2], 2), receiver.clone(), clock.clone()).unwrap();

        service
            .submit_report(report(1, 15, 50, 2, at_epoch(15)))
            .await
            .unwrap();

        // 20 second epochs: t=1180 falls in epoch 9, before frame 1's window
        let now = GENESIS + 180;
        clock.set(now);
        service
            .set_beacon_spec(BeaconSpec {
                slots_per_epoch: 4,
                ..spec()
            })
            .await
            .unwrap();

        let frame = service.get_current_frame().await;
        assert_eq!((frame.frame_id, frame.first_epoch, frame.last_epoch), (0, 0, 9));
        assert_eq!(
            service.get_reportable_epoch_range(now).await,
            EpochRange {
                min_epoch: 0,
                max_epoch: 9
            }
        );
        assert!(service.get_current_reporters().await.is_empty());

        assert_eq!(
            service.submit_report(report(1, 15, 50, 2, now)).await,
            Err(OracleError::EpochOutOfRange {
                epoch_id: 15,
                min_epoch: 0,
                max_epoch: 9
            })
        );

        service.submit_report(report(1, 9, 40, 2, now)).await.unwrap();
        let status = service.submit_report(report(2, 9, 40, 2, now)).await.unwrap();
        assert!(status.is_completed());
        assert_eq!(receiver.delivered(), vec![ReportData::new(9, 40, 2)]);
        assert_eq!(service.get_last_completed_epoch().await, 9);
    }

    #[tokio::test]
    async fn test_quorum_above_member_count_blocks_completion() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let now = at_epoch(12);
        let clock = Arc::new(ManualTimeSource::new(now));
        let service =
            open_durable(dir.path(), config(&[1, 2], 2), receiver.clone(), clock).unwrap();

        service.submit_report(report(1, 11, 1, 1, now)).await.unwrap();
        assert_eq!(service.remove_member(member(2)).await.unwrap(), None);
        assert_eq!(service.get_current_frame_status().await, FrameStatus::Collecting);

        let completed = service.set_quorum(1).await.unwrap();
        assert_eq!(completed.map(|f| f.report), Some(ReportData::new(11, 1, 1)));
        assert_eq!(receiver.delivery_count(), 1);
    }
}
