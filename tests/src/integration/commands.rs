//! # Command Surface
//!
//! Drives a durable oracle through the line-delimited JSON handler the way an
//! operator session would.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use oracle_runtime::handlers::{CommandHandler, CommandResponse};
    use qc_18_beacon_oracle::test_utils::ManualTimeSource;
    use qc_18_beacon_oracle::RecordingReceiver;
    use serde_json::{json, Value};
    use tokio::sync::watch;

    use crate::integration::*;

    fn addr(n: u8) -> String {
        member(n).to_string()
    }

    fn submit(n: u8, epoch: u64, balance: &str) -> Value {
        json!({
            "command": "submit_report",
            "member": addr(n),
            "epoch_id": epoch,
            "beacon_balance": balance,
            "beacon_validators": 3
        })
    }

    async fn run_session(
        handler: &CommandHandler<DurableService<RecordingReceiver>, ManualTimeSource>,
        commands: &[Value],
    ) -> Vec<CommandResponse> {
        let input: String = commands.iter().map(|c| format!("{c}\n")).collect();
        let mut output = Vec::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        handler
            .run(input.as_bytes(), &mut output, shutdown_rx)
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_operator_session() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let clock = Arc::new(ManualTimeSource::new(at_epoch(13)));
        let service = Arc::new(
            open_durable(dir.path(), config(&[1], 1), receiver.clone(), clock.clone()).unwrap(),
        );
        let handler = CommandHandler::new(service, clock);

        let responses = run_session(
            &handler,
            &[
                json!({"command": "add_member", "member": addr(2)}),
                json!({"command": "add_member", "member": addr(3)}),
                json!({"command": "set_quorum", "quorum": 2}),
                submit(1, 12, "340282366920938463463374607431768211455"),
                submit(2, 12, "1"),
                json!({"command": "variants"}),
                submit(3, 12, "340282366920938463463374607431768211455"),
                submit(2, 12, "1"),
                json!({"command": "status"}),
            ],
        )
        .await;

        assert_eq!(responses.len(), 9);
        assert_eq!(
            responses[1].result,
            Some(json!([addr(1), addr(2), addr(3)]))
        );
        // `null` result, nothing completed by the quorum change
        assert!(responses[2].ok);
        assert_eq!(responses[2].result, None);

        let variants = responses[5].result.as_ref().unwrap().as_array().unwrap();
        assert_eq!(variants.len(), 2);

        let completed = &responses[6].result.as_ref().unwrap()["completed"];
        assert_eq!(
            completed["report"]["beacon_balance"],
            "340282366920938463463374607431768211455"
        );
        assert_eq!(completed["support"], 2);

        assert!(!responses[7].ok);
        assert_eq!(responses[7].kind.as_deref(), Some("report_validation"));

        let status = responses[8].result.as_ref().unwrap();
        assert_eq!(status["status"], "Completed");
        assert_eq!(status["quorum"], 2);
        assert_eq!(status["members"], 3);
        assert_eq!(status["last_completed_epoch"], 12);
        assert_eq!(status["reportable"], json!({"min_epoch": 13, "max_epoch": 13}));

        assert_eq!(receiver.delivered().len(), 1);
        assert_eq!(receiver.delivered()[0].beacon_balance, u128::MAX);
    }

    #[tokio::test]
    async fn test_explicit_timestamp_overrides_clock() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let clock = Arc::new(ManualTimeSource::new(at_epoch(10)));
        let service = Arc::new(
            open_durable(dir.path(), config(&[1], 1), receiver.clone(), clock.clone()).unwrap(),
        );
        let handler = CommandHandler::new(service, clock);

        let mut late = submit(1, 15, "7");
        late["now"] = json!(at_epoch(15));

        let responses = run_session(&handler, &[submit(1, 15, "7"), late]).await;
        assert_eq!(responses[0].kind.as_deref(), Some("report_validation"));
        assert!(responses[1].ok);
        assert_eq!(receiver.delivery_count(), 1);
    }

    #[tokio::test]
    async fn test_spec_command_validates() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(RecordingReceiver::new());
        let clock = Arc::new(ManualTimeSource::new(at_epoch(10)));
        let service = Arc::new(
            open_durable(dir.path(), config(&[1], 1), receiver, clock.clone()).unwrap(),
        );
        let handler = CommandHandler::new(service, clock);

        let responses = run_session(
            &handler,
            &[
                json!({
                    "command": "set_beacon_spec",
                    "epochs_per_frame": 0,
                    "slots_per_epoch": 2,
                    "seconds_per_slot": 5,
                    "genesis_time": GENESIS
                }),
                json!({
                    "command": "set_beacon_spec",
                    "epochs_per_frame": 20,
                    "slots_per_epoch": 2,
                    "seconds_per_slot": 5,
                    "genesis_time": GENESIS
                }),
                json!({"command": "status"}),
            ],
        )
        .await;

        assert_eq!(responses[0].kind.as_deref(), Some("configuration"));
        assert!(responses[1].ok);
        assert_eq!(responses[2].result.as_ref().unwrap()["spec"]["epochs_per_frame"], 20);
    }
}
