pub mod ordering {
    //! 提交顺序测试。
    //!
    //! # 测试目标（Why）
    //! - 先提交的批次即使完成得慢，后提交的批次也必须等它完成后才发起；
    //! - 监听器通知顺序与提交顺序一致；
    //! - 任意批次形状与完成延迟下，通道上的字节序列等于按提交顺序拼接的消息。

    use std::time::Duration;

    use kindle_core::Submission;
    use proptest::prelude::*;

    use super::{Behavior, Msg, ScriptedChannel, Seen, batch, connection};

    #[tokio::test(start_paused = true)]
    async fn slow_first_batch_is_not_overtaken() {
        let channel = ScriptedChannel::new(|bytes| match bytes {
            b"A" => Behavior::Complete(Duration::from_millis(50)),
            _ => Behavior::Complete(Duration::ZERO),
        });
        let (_ctx, worker, recorder) = connection(channel.clone());

        assert_eq!(worker.submit(batch(&["A"])).unwrap(), Submission::Queued);
        assert_eq!(worker.submit(batch(&["B"])).unwrap(), Submission::Queued);
        worker.finish().await;

        assert_eq!(channel.events(), ["start A", "done A", "start B", "done B"]);
        assert_eq!(
            recorder.seen(),
            vec![(Msg::from("A"), Seen::Ok), (Msg::from("B"), Seen::Ok)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn batch_items_share_one_write_and_notify_in_order() {
        let channel = ScriptedChannel::instant();
        let (_ctx, worker, recorder) = connection(channel.clone());

        let _ = worker.submit(batch(&["x", "y", "z"])).unwrap();
        let _ = worker.submit(batch(&["w"])).unwrap();
        worker.finish().await;

        assert_eq!(channel.events(), ["start xyz", "done xyz", "start w", "done w"]);
        let order: Vec<Msg> = recorder.seen().into_iter().map(|(msg, _)| msg).collect();
        assert_eq!(order, batch(&["x", "y", "z", "w"]));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_worker_still_drains_queue() {
        let channel = ScriptedChannel::new(|_| Behavior::Complete(Duration::from_millis(5)));
        let (_ctx, worker, recorder) = connection(channel.clone());

        let _ = worker.submit(batch(&["1"])).unwrap();
        let _ = worker.submit(batch(&["2"])).unwrap();
        drop(worker);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(channel.written(), b"12");
        assert_eq!(recorder.seen().len(), 2);
    }

    #[tokio::test]
    async fn encode_error_rejects_whole_batch() {
        let channel = ScriptedChannel::instant();
        let (_ctx, worker, recorder) = connection(channel.clone());

        let err = worker
            .submit(vec![Msg::from("ok"), Msg(Vec::new())])
            .unwrap_err();
        assert!(err.to_string().contains("empty message"));
        worker.finish().await;

        assert!(channel.events().is_empty());
        assert!(recorder.seen().is_empty());
    }

    fn batches() -> impl Strategy<Value = Vec<Vec<Vec<u8>>>> {
        let message = prop::collection::vec(any::<u8>(), 1..6);
        let batch = prop::collection::vec(message, 1..4);
        prop::collection::vec(batch, 1..10)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn bytes_reach_channel_in_submission_order(batches in batches()) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            let (written, notified) = runtime.block_on(async {
                // 首字节决定完成延迟，制造“前慢后快”的交错。
                let channel = ScriptedChannel::new(|bytes| {
                    Behavior::Complete(Duration::from_millis(u64::from(bytes[0] % 7)))
                });
                let (_ctx, worker, recorder) = connection(channel.clone());
                for items in &batches {
                    let items = items.iter().cloned().map(Msg).collect();
                    assert_eq!(worker.submit(items).unwrap(), Submission::Queued);
                }
                worker.finish().await;
                (channel.written(), recorder.seen())
            });

            let expected: Vec<u8> = batches.iter().flatten().flatten().copied().collect();
            prop_assert_eq!(written, expected);

            let expected: Vec<Msg> = batches.iter().flatten().cloned().map(Msg).collect();
            prop_assert!(notified.iter().all(|(_, seen)| *seen == Seen::Ok));
            let notified: Vec<Msg> = notified.into_iter().map(|(msg, _)| msg).collect();
            prop_assert_eq!(notified, expected);
        }
    }
}
