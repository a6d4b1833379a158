#[cfg(test)]
mod integration_tests {
    use crate::decoder::MockStreamDecoder;
    use crate::sink::MockResultSink;
    use crate::{
        BatchScheduler, Candidate, CandidateGenerator, CandidateWorker, Config, ScanError,
        ScanStatistics, StaticConfigProvider, StreamHandle, Timeouts, Validator,
    };
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_timeouts() -> Timeouts {
        Timeouts {
            connect_timeout_ms: 200,
            read_timeout_ms: 200,
        }
    }

    fn jpeg_only() -> Vec<String> {
        vec!["image/jpeg".to_string()]
    }

    async fn camera_server(delay: Option<Duration>) -> MockServer {
        let server = MockServer::start().await;
        let mut response = ResponseTemplate::new(200)
            .insert_header("content-type", "image/jpeg")
            .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        if let Some(delay) = delay {
            response = response.set_delay(delay);
        }
        Mock::given(method("GET"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn candidate_for(server: &MockServer) -> Candidate {
        Candidate::new(Ipv4Addr::LOCALHOST, server.address().port(), "/video.mjpg")
    }

    fn opening_decoder() -> MockStreamDecoder {
        let mut decoder = MockStreamDecoder::new();
        decoder
            .expect_open()
            .returning(|_| Some(StreamHandle::from_bytes(vec![0xFF, 0xD8, 0xFF])));
        decoder.expect_read_one_unit().returning(|_| true);
        decoder
    }

    fn accepting_sink() -> MockResultSink {
        let mut sink = MockResultSink::new();
        sink.expect_save().returning(|_| Ok(()));
        sink
    }

    fn worker_with(decoder: MockStreamDecoder, sink: MockResultSink) -> CandidateWorker {
        let validator = Validator::new(&fast_timeouts(), Arc::new(decoder)).unwrap();
        CandidateWorker::new(
            Arc::new(validator),
            Arc::new(sink),
            Arc::new(ScanStatistics::new()),
        )
    }

    #[tokio::test]
    async fn test_valid_camera_is_saved_once() {
        let server = camera_server(None).await;

        let mut sink = MockResultSink::new();
        sink.expect_save()
            .times(1)
            .withf(|camera| camera.content_type.as_deref() == Some("image/jpeg"))
            .returning(|_| Ok(()));

        let worker = worker_with(opening_decoder(), sink);
        let result = worker
            .process_candidate(candidate_for(&server), &jpeg_only())
            .await;

        assert!(result.valid);
        assert_eq!(result.content_type.as_deref(), Some("image/jpeg"));

        let stats = worker.stats().snapshot();
        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.invalid, 0);
    }

    #[tokio::test]
    async fn test_unopenable_stream_is_not_saved() {
        let server = camera_server(None).await;

        let mut decoder = MockStreamDecoder::new();
        decoder.expect_open().times(1).returning(|_| None);
        decoder.expect_read_one_unit().times(0);

        let mut sink = MockResultSink::new();
        sink.expect_save().times(0);

        let worker = worker_with(decoder, sink);
        let result = worker
            .process_candidate(candidate_for(&server), &jpeg_only())
            .await;

        assert!(!result.valid);
        let stats = worker.stats().snapshot();
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.valid, 0);
    }

    #[tokio::test]
    async fn test_timed_out_candidate_is_invalid() {
        let server = camera_server(Some(Duration::from_secs(2))).await;

        let mut decoder = MockStreamDecoder::new();
        decoder.expect_open().times(0);
        let mut sink = MockResultSink::new();
        sink.expect_save().times(0);

        let worker = worker_with(decoder, sink);
        let result = worker
            .process_candidate(candidate_for(&server), &jpeg_only())
            .await;

        assert!(!result.valid);
        assert_eq!(result.content_type, None);
        assert_eq!(worker.stats().snapshot().invalid, 1);
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_candidate_valid() {
        let server = camera_server(None).await;

        let mut sink = MockResultSink::new();
        sink.expect_save()
            .times(1)
            .returning(|_| Err(ScanError::SinkError("disk full".to_string())));

        let worker = worker_with(opening_decoder(), sink);
        let result = worker
            .process_candidate(candidate_for(&server), &jpeg_only())
            .await;

        assert!(result.valid);
        let stats = worker.stats().snapshot();
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.save_failures, 1);
        assert!(stats.is_balanced());
    }

    /// Scope is loopback only; each host yields ports 80, 88 and the server's port.
    fn scheduler_for(server: &MockServer, batch_size: usize, paths: &[&str]) -> BatchScheduler {
        let port = server.address().port();
        let config = Config {
            scope: vec!["127.0.0.1/32".parse().unwrap()],
            port_range: (port, port + 1),
            output_paths: paths.iter().map(|p| p.to_string()).collect(),
            content_types: jpeg_only(),
            batch_size,
            timeouts: fast_timeouts(),
            ..Default::default()
        };

        BatchScheduler::new(
            Arc::new(StaticConfigProvider::new(config)),
            CandidateGenerator::with_seed(3),
            worker_with(opening_decoder(), accepting_sink()),
        )
    }

    #[tokio::test]
    async fn test_barrier_balances_counters() {
        let server = camera_server(None).await;
        let mut scheduler = scheduler_for(&server, 2, &["/video.mjpg"]);

        let burst = scheduler.step().await.unwrap();
        assert_eq!(burst.host, Ipv4Addr::LOCALHOST);
        assert_eq!(burst.launched, 3);
        assert!(burst.drained);
        assert_eq!(scheduler.in_flight(), 0);

        let stats = scheduler.stats().snapshot();
        assert_eq!(stats.scanned, 3);
        assert!(stats.is_balanced());
        assert!(stats.valid >= 1);
        assert_eq!(stats.batches_processed, 1);
        assert_eq!(stats.iterations, 1);
    }

    #[tokio::test]
    async fn test_threshold_checked_per_host_burst() {
        let server = camera_server(None).await;
        let threshold = 10;
        let mut scheduler = scheduler_for(&server, threshold, &["/video.mjpg", "/snapshot.jpg"]);

        let mut previous = 0;
        let mut barriers = 0;
        for _ in 0..5 {
            let burst = scheduler.step().await.unwrap();
            assert_eq!(burst.launched, 6);
            assert!(previous <= threshold);
            assert!(burst.buffered <= previous + burst.launched);
            // A whole burst is launched before the check, even past the threshold.
            assert_eq!(burst.buffered, previous + 6);

            if burst.drained {
                barriers += 1;
                assert!(scheduler.stats().snapshot().is_balanced());
            }
            previous = scheduler.in_flight();
        }

        assert_eq!(barriers, 2);
        scheduler.shutdown().await;

        let stats = scheduler.stats().snapshot();
        assert_eq!(stats.batches_processed, barriers);
        assert_eq!(stats.iterations, 5);
        assert_eq!(stats.scanned, 30);
    }

    #[tokio::test]
    async fn test_below_threshold_keeps_tasks_in_flight() {
        let server = camera_server(None).await;
        let mut scheduler = scheduler_for(&server, 100, &["/video.mjpg"]);

        let burst = scheduler.step().await.unwrap();
        assert!(!burst.drained);
        assert_eq!(scheduler.in_flight(), 3);

        scheduler.shutdown().await;
        assert_eq!(scheduler.in_flight(), 0);
        let stats = scheduler.stats().snapshot();
        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.batches_processed, 0);
    }

    #[tokio::test]
    async fn test_empty_paths_launch_nothing() {
        let server = camera_server(None).await;
        let mut scheduler = scheduler_for(&server, 1, &[]);

        let burst = scheduler.step().await.unwrap();
        assert_eq!(burst.launched, 0);
        assert!(!burst.drained);
        assert_eq!(scheduler.stats().snapshot().iterations, 1);
    }

    #[tokio::test]
    async fn test_empty_scope_stops_the_loop() {
        let config = Config {
            scope: Vec::new(),
            ..Default::default()
        };
        let mut scheduler = BatchScheduler::new(
            Arc::new(StaticConfigProvider::new(config)),
            CandidateGenerator::with_seed(3),
            worker_with(MockStreamDecoder::new(), MockResultSink::new()),
        );

        let err = scheduler.run().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
