// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// Ingestion paths: buffer ownership, stream wiring checks and audio format
// handling.
use bytes::Bytes;
use framefeed::core::loopback::{LoopbackFrame, LoopbackGraph, RgbImage};
use framefeed::{AudioFormat, FrameFeedError, Session};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingListener {
    count: Arc<AtomicUsize>,
}

impl CountingListener {
    fn install<G: framefeed::GraphEngine>(session: &Session<G>) -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        session.set_error_listener(Some(Arc::new(move |_error: FrameFeedError| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        Self { count }
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[test]
fn test_every_frame_released_exactly_once() {
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::with_video_streams(Arc::clone(&graph), "in", None).unwrap();
    let errors = CountingListener::install(&session);

    let submit = |timestamp: i64| {
        let frame = LoopbackFrame::new(&ledger, 5, 640, 480, timestamp);
        session.submit_video_frame(frame, timestamp).unwrap();
    };
    submit(10);
    submit(20);
    submit(20); // duplicate
    submit(15); // older
    submit(30);
    graph.reject_next_submissions(1);
    submit(40);
    graph.fail_next_packet_creations(1);
    submit(50);

    assert_eq!(graph.submissions("in"), vec![10, 20, 30]);
    assert_eq!(errors.count(), 4);
    // Admitted frames belong to the graph until it has processed them.
    assert_eq!(ledger.frames_released(), 4);

    session.close();
    assert_eq!(ledger.frames_created(), 7);
    assert_eq!(ledger.frames_released(), 7);
    assert_eq!(ledger.packets_created(), 6);
    assert_eq!(ledger.packets_released(), 6);
}

#[test]
fn test_failures_without_listener_are_not_raised() {
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::with_video_streams(Arc::clone(&graph), "in", None).unwrap();

    graph.reject_next_submissions(1);
    let result = session.submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 10), 10);

    assert!(result.is_ok());
    assert_eq!(ledger.outstanding_frames(), 0);
}

#[test]
fn test_missing_input_stream_is_configuration_error() {
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::new(Arc::clone(&graph));
    let errors = CountingListener::install(&session);

    let err = session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 10), 10)
        .unwrap_err();
    assert!(err.is_configuration());
    let err = session
        .submit_bitmap_frame(&RgbImage::solid(2, 2, [1, 2, 3]), 10)
        .unwrap_err();
    assert!(err.is_configuration());
    let err = session
        .submit_audio_data(&[0u8; 4], 10, &AudioFormat::pcm16(1, 16_000))
        .unwrap_err();
    assert!(err.is_configuration());

    // Raised, not routed; the frame was still released and nothing started.
    assert_eq!(errors.count(), 0);
    assert_eq!(ledger.frames_released(), 1);
    assert_eq!(graph.start_count(), 0);
}

#[test]
fn test_bitmap_path() {
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::new(Arc::clone(&graph));
    session.set_video_input_stream_cpu("in_cpu").unwrap();
    let errors = CountingListener::install(&session);
    let image = RgbImage::solid(4, 2, [255, 0, 0]);

    session.submit_bitmap_frame(&image, 100).unwrap();
    session.submit_bitmap_frame(&image, 200).unwrap();
    // Malformed image: packet creation fails and is reported.
    let broken = RgbImage {
        width: 4,
        height: 4,
        pixels: vec![0; 3],
    };
    session.submit_bitmap_frame(&broken, 300).unwrap();

    assert_eq!(graph.submissions("in_cpu"), vec![100, 200]);
    assert_eq!(errors.count(), 1);
    session.close();
    assert_eq!(ledger.outstanding_packets(), 0);
}

#[test]
fn test_video_paths_are_exclusive() {
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::with_video_streams(Arc::clone(&graph), "in", None).unwrap();
    session.set_video_input_stream_cpu("in_cpu").unwrap();

    session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 10), 10)
        .unwrap();
    let err = session
        .submit_bitmap_frame(&RgbImage::solid(2, 2, [0, 0, 0]), 20)
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Gpu"));

    session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 30), 30)
        .unwrap();
    assert_eq!(graph.submissions("in"), vec![10, 30]);
    assert!(graph.submissions("in_cpu").is_empty());
}

#[test]
fn test_video_path_is_claimed_only_by_admitted_frames() {
    // A closed session admits nothing, so neither path gets claimed.
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::with_video_streams(Arc::clone(&graph), "in", None).unwrap();
    session.set_video_input_stream_cpu("in_cpu").unwrap();
    let errors = CountingListener::install(&session);
    session.close();

    session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 10), 10)
        .unwrap();
    session
        .submit_bitmap_frame(&RgbImage::solid(2, 2, [0, 0, 0]), 20)
        .unwrap();
    assert_eq!(errors.count(), 2);
    assert_eq!(ledger.outstanding_frames(), 0);

    // A frame whose lazy start fails is not admitted either.
    let graph = Arc::new(LoopbackGraph::new());
    graph.fail_start();
    let ledger = graph.ledger();
    let session = Session::with_video_streams(Arc::clone(&graph), "in", None).unwrap();
    session.set_video_input_stream_cpu("in_cpu").unwrap();
    let errors = CountingListener::install(&session);

    session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 10), 10)
        .unwrap();
    session
        .submit_bitmap_frame(&RgbImage::solid(2, 2, [0, 0, 0]), 20)
        .unwrap();
    let err = session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 30), 30)
        .unwrap_err();
    assert!(err.to_string().contains("Cpu"));
    // Start failure, then the engine refusing the bitmap.
    assert_eq!(errors.count(), 2);
    assert_eq!(ledger.outstanding_frames(), 0);
    assert_eq!(ledger.outstanding_packets(), 0);
}

#[test]
fn test_will_add_frame_runs_before_hand_off() {
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::with_video_streams(Arc::clone(&graph), "in", None).unwrap();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let engine = Arc::clone(&graph);
    session.set_on_will_add_frame_listener(Some(Arc::new(move |timestamp: i64| {
        sink.lock().push((timestamp, engine.submissions("in").len()));
    })));

    session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 10), 10)
        .unwrap();
    session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 20), 20)
        .unwrap();

    // Each notification sees the graph before its own frame arrived.
    assert_eq!(*observed.lock(), vec![(10, 0), (20, 1)]);

    session.set_on_will_add_frame_listener(None);
    session
        .submit_video_frame(LoopbackFrame::new(&ledger, 1, 8, 8, 30), 30)
        .unwrap();
    assert_eq!(observed.lock().len(), 2);
}

#[test]
fn test_audio_stream_header_pushed_at_configuration() {
    let graph = Arc::new(LoopbackGraph::new());
    let session = Session::new(Arc::clone(&graph));

    session
        .add_audio_streams(Some("audio_in"), None, 2, 48_000)
        .unwrap();

    assert!(graph.has_header("audio_in"));
    assert_eq!(graph.start_count(), 0);
    let err = session
        .add_audio_streams(Some("audio_in"), None, 2, 48_000)
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_audio_stream_parameters_validated() {
    let session = Session::new(Arc::new(LoopbackGraph::new()));

    assert!(session.add_audio_streams(Some("a"), None, 0, 16_000).is_err());
    assert!(session.add_audio_streams(Some("a"), None, 3, 16_000).is_err());
    assert!(session.add_audio_streams(Some("a"), None, 1, 0).is_err());
    assert!(session.add_audio_streams(Some("a"), Some("a"), 1, 16_000).is_err());
    assert!(session.streams().audio_format.is_none());
}

#[test]
fn test_audio_submission_computes_sample_count() {
    let graph = Arc::new(LoopbackGraph::new().with_route("audio_in", "audio_out"));
    let session = Session::new(Arc::clone(&graph));
    session
        .add_audio_streams(Some("audio_in"), Some("audio_out"), 2, 48_000)
        .unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    session.add_audio_consumer(Arc::new(
        move |data: Bytes, timestamp: i64, format: AudioFormat| {
            sink.lock().push((data.len(), timestamp, format));
        },
    ));

    let format = AudioFormat::pcm16(2, 48_000);
    session.submit_audio_data(&[7u8; 1920], 5_000, &format).unwrap();
    graph.process_pending();

    assert_eq!(graph.submissions("audio_in"), vec![5_000]);
    assert_eq!(*received.lock(), vec![(1920, 5_000, format)]);
}

#[test]
fn test_audio_format_mismatch_is_silent() {
    let graph = Arc::new(LoopbackGraph::new());
    let session = Session::new(Arc::clone(&graph));
    session
        .add_audio_streams(Some("audio_in"), None, 1, 16_000)
        .unwrap();
    let errors = CountingListener::install(&session);

    let stereo = AudioFormat::pcm16(2, 16_000);
    let result = session.submit_audio_data(&[0u8; 640], 1_000, &stereo);

    assert!(result.is_ok());
    assert!(graph.submissions("audio_in").is_empty());
    assert_eq!(errors.count(), 0);
    // The graph is still started by the attempt.
    assert_eq!(graph.start_count(), 1);
}

#[test]
fn test_audio_rejection_reported() {
    let graph = Arc::new(LoopbackGraph::new());
    let ledger = graph.ledger();
    let session = Session::new(Arc::clone(&graph));
    session
        .add_audio_streams(Some("audio_in"), None, 1, 16_000)
        .unwrap();
    let errors = CountingListener::install(&session);
    let mono = AudioFormat::pcm16(1, 16_000);

    session.submit_audio_data(&[0u8; 320], 1_000, &mono).unwrap();
    session.submit_audio_data(&[0u8; 320], 1_000, &mono).unwrap();

    assert_eq!(graph.submissions("audio_in"), vec![1_000]);
    assert_eq!(errors.count(), 1);
    session.close();
    assert_eq!(ledger.outstanding_packets(), 0);
}
