pub mod sync_retry {
    //! 同步重试循环的行为测试。
    //!
    //! # 测试目标（Why）
    //! - 锁定“`on_retry` → 重试谓词 → 停止谓词”的评估顺序与各组监听器的触发次数；
    //! - 验证终态只暴露最后一次尝试的错误。

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use kindle_core::retry::predicates::{
        never_stop, retry_if_result, stop_after_attempts, stop_after_elapsed,
    };
    use kindle_core::{Attempt, MockClock, RetryError, RetryPolicy, RetrySettings, Retryer};
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    use super::ProbeError;

    fn counter() -> Arc<AtomicU32> {
        Arc::new(AtomicU32::new(0))
    }

    #[test]
    fn retry_predicate_ends_loop_with_last_error() {
        let policy = RetryPolicy::builder()
            .retry_if(|attempt: &Attempt<(), ProbeError>| attempt.number() < 3)
            .stop_if(never_stop())
            .build();
        let calls = counter();
        let seen = Arc::clone(&calls);

        let result = Retryer::new(policy).call(|| {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            Err(ProbeError::IoFailure(n))
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(RetryError::Operation(ProbeError::IoFailure(3)))
        ));
    }

    #[test]
    fn success_listener_fires_once_for_the_winning_attempt() {
        let successes = Arc::new(Mutex::new(Vec::new()));
        let failures = counter();
        let record = Arc::clone(&successes);
        let fail_count = Arc::clone(&failures);
        let policy = RetryPolicy::builder()
            .on_success(move |attempt: &Attempt<&'static str, ProbeError>| {
                record.lock().push(attempt.number());
            })
            .on_fail(move |_: &Attempt<&'static str, ProbeError>| {
                fail_count.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        let calls = counter();
        let seen = Arc::clone(&calls);

        let result = Retryer::new(policy).call(|| {
            match seen.fetch_add(1, Ordering::SeqCst) + 1 {
                1 => Err(ProbeError::IoFailure(1)),
                _ => Ok("ready"),
            }
        });

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(*successes.lock(), vec![2]);
        assert_eq!(failures.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn persistent_io_failure_notifies_every_attempt_and_fails_once() {
        let retried = counter();
        let failed = counter();
        let retry_count = Arc::clone(&retried);
        let fail_count = Arc::clone(&failed);
        let policy = RetryPolicy::builder()
            .retry_if(|attempt: &Attempt<(), ProbeError>| attempt.number() < 3)
            .stop_if(never_stop())
            .wait(Duration::from_millis(10))
            .on_retry(move |_: &Attempt<(), ProbeError>| {
                retry_count.fetch_add(1, Ordering::SeqCst);
            })
            .on_fail(move |attempt: &Attempt<(), ProbeError>| {
                assert_eq!(attempt.number(), 3);
                fail_count.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        let calls = counter();
        let seen = Arc::clone(&calls);

        let result = Retryer::new(policy).call(|| {
            Err(ProbeError::IoFailure(seen.fetch_add(1, Ordering::SeqCst) + 1))
        });

        assert!(matches!(
            result,
            Err(RetryError::Operation(ProbeError::IoFailure(3)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retried.load(Ordering::SeqCst), 3);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn elapsed_stop_uses_time_since_first_attempt() {
        let clock = MockClock::new();
        let policy = RetryPolicy::builder()
            .stop_if(stop_after_elapsed(Duration::from_millis(100)))
            .build();
        let retryer = Retryer::new(policy).with_clock(Arc::new(clock.clone()));
        let calls = counter();
        let seen = Arc::clone(&calls);

        let result: Result<(), _> = retryer.call(|| {
            clock.advance(Duration::from_millis(40));
            Err(ProbeError::IoFailure(seen.fetch_add(1, Ordering::SeqCst) + 1))
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(RetryError::Operation(ProbeError::IoFailure(3)))
        ));
    }

    #[test]
    fn rejected_results_surface_as_rejected() {
        let policy = RetryPolicy::builder()
            .retry_if(retry_if_result(|status: &u16| *status == 503))
            .stop_if(stop_after_attempts(4))
            .build();
        let retryer: Retryer<u16, ProbeError> = Retryer::new(policy);

        let result = retryer.call(|| Ok(503));

        assert!(matches!(result, Err(RetryError::Rejected { attempts: 4 })));
    }

    #[test]
    fn settings_drive_attempt_budget() {
        let settings = RetrySettings::from_toml_str("max_attempts = 4").unwrap();
        let policy = settings.builder::<(), ProbeError>().unwrap().build();
        let calls = counter();
        let seen = Arc::clone(&calls);

        let result = Retryer::new(policy).call(|| {
            Err(ProbeError::IoFailure(seen.fetch_add(1, Ordering::SeqCst) + 1))
        });

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(
            result,
            Err(RetryError::Operation(ProbeError::IoFailure(4)))
        ));
    }

    #[test]
    #[traced_test]
    fn giving_up_is_logged() {
        let retryer: Retryer<(), ProbeError> = Retryer::new(RetryPolicy::builder().build());

        let _ = retryer.call(|| Err(ProbeError::IoFailure(0)));

        assert!(logs_contain("retrying"));
        assert!(logs_contain("retry stopped by stop predicate"));
    }
}
