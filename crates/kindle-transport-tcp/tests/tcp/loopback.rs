pub mod loopback {
    //! 回环连接测试。
    //!
    //! # 测试目标（Why）
    //! - 多个任务并发提交时，每个任务自身的消息在线路上保持提交顺序，且所有消息都被写出；
    //! - `finish` 排空写队列后对端读到 EOF；`close` 标记上下文关闭并发送 FIN；
    //! - 建连重试在端口无人监听时按配置次数放弃，并保留最后一次的 IO 错误。

    use std::io;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kindle_core::{
        ChannelContext, EncodeError, EncodedBuffer, GroupContext, Submission, WriteError,
    };
    use kindle_transport_tcp::{
        TcpListener, TcpSettings, TransportError, connect, connect_with_retry,
    };
    use tokio::io::AsyncReadExt;

    /// 以换行分隔的文本帧。
    fn encode_line(
        line: &String,
        _ctx: &ChannelContext<String>,
    ) -> Result<EncodedBuffer, EncodeError> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        Ok(EncodedBuffer::new(bytes))
    }

    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    fn group(written: Arc<AtomicUsize>) -> Arc<GroupContext<String>> {
        Arc::new(GroupContext::new("lines", encode_line).with_listener(
            move |_ctx: &ChannelContext<String>, _line: &String, outcome: Result<(), &WriteError>| {
                if outcome.is_ok() {
                    written.fetch_add(1, Ordering::SeqCst);
                }
            },
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_submitters_keep_per_task_order() {
        let server_written = Arc::new(AtomicUsize::new(0));
        let listener = TcpListener::bind(loopback(), group(server_written), TcpSettings::default())
            .await
            .expect("bind");
        let addr = listener.local_addr();

        let server = tokio::spawn(async move {
            let mut conn = listener.accept().await.expect("accept");
            let mut reader = conn.take_reader().expect("reader");
            let mut received = String::new();
            reader.read_to_string(&mut received).await.expect("read");
            received
        });

        let client_written = Arc::new(AtomicUsize::new(0));
        let client = Arc::new(
            connect_with_retry(addr, group(Arc::clone(&client_written)), &TcpSettings::default())
                .await
                .expect("connect"),
        );
        assert_eq!(client.peer_addr(), addr);

        let mut submitters = Vec::new();
        for task in 0..4 {
            let client = Arc::clone(&client);
            submitters.push(tokio::spawn(async move {
                for seq in 0..50 {
                    let batch = vec![format!("{task}:{seq}:a"), format!("{task}:{seq}:b")];
                    assert_eq!(client.submit(batch).expect("encode"), Submission::Queued);
                    tokio::task::yield_now().await;
                }
            }));
        }
        for submitter in submitters {
            submitter.await.expect("submitter");
        }

        let client = Arc::try_unwrap(client).expect("sole owner");
        client.finish().await.expect("finish");
        let received = server.await.expect("server");

        let lines: Vec<&str> = received.lines().collect();
        assert_eq!(lines.len(), 4 * 50 * 2);
        assert_eq!(client_written.load(Ordering::SeqCst), 4 * 50 * 2);
        for task in 0..4 {
            let own: Vec<&str> = lines
                .iter()
                .copied()
                .filter(|line| line.starts_with(&format!("{task}:")))
                .collect();
            let expected: Vec<String> = (0..50)
                .flat_map(|seq| [format!("{task}:{seq}:a"), format!("{task}:{seq}:b")])
                .collect();
            assert_eq!(own, expected);
        }
    }

    #[tokio::test]
    async fn close_marks_context_and_sends_fin() {
        let listener = TcpListener::bind(
            loopback(),
            group(Arc::new(AtomicUsize::new(0))),
            TcpSettings::default(),
        )
        .await
        .expect("bind");
        let addr = listener.local_addr();
        let server = tokio::spawn(async move {
            let mut conn = listener.accept().await.expect("accept");
            let mut reader = conn.take_reader().expect("reader");
            let mut received = Vec::new();
            reader.read_to_end(&mut received).await.expect("read");
            received
        });

        let conn = connect(addr, group(Arc::new(AtomicUsize::new(0))), &TcpSettings::default())
            .await
            .expect("connect");
        let ctx = Arc::clone(conn.context());
        conn.close().await.expect("close");

        assert!(ctx.is_closed());
        assert!(server.await.expect("server").is_empty());
    }

    #[tokio::test]
    async fn connect_retry_gives_up_on_closed_port() {
        let port = {
            let probe = std::net::TcpListener::bind(loopback()).expect("probe bind");
            probe.local_addr().expect("probe addr").port()
        };
        let settings = TcpSettings::from_toml_str(
            r#"
            [connect]
            max_attempts = 2
            wait_ms = 10
            "#,
        )
        .expect("settings");

        let err = connect_with_retry(
            SocketAddr::from(([127, 0, 0, 1], port)),
            group(Arc::new(AtomicUsize::new(0))),
            &settings,
        )
        .await
        .expect_err("nothing listens on the port");

        assert!(matches!(err, TransportError::ConnectExhausted { .. }));
        assert_eq!(err.code(), "kindle.transport.tcp.connect_exhausted");
        assert_eq!(
            err.io_error().map(io::Error::kind),
            Some(io::ErrorKind::ConnectionRefused)
        );
    }
}
