//! Integration tests for backend injection and the retry policy.
//!
//! Mock backends reject encodings, fail above a tile extent, or fail
//! unconditionally, so the engine's encoding check and its single retry with
//! halved tiles can be observed from outside.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ruvector_rqa::backend::{allocate_tile, Backend, SequentialBackend, TileRequest};
use ruvector_rqa::partition::TilePartitioner;
use ruvector_rqa::similarity::SimilarityEvaluator;
use ruvector_rqa::storage::SubMatrix;
use ruvector_rqa::{Encoding, RqaEngine, RqaError, RqaEvent, Settings, TileSize};

use helpers::{assert_matches_baseline, baseline, fixture, noise};

// ---------------------------------------------------------------------------
// Mock backends
// ---------------------------------------------------------------------------

/// Stores byte-encoded tiles only.
struct ByteOnlyBackend;

impl Backend for ByteOnlyBackend {
    fn name(&self) -> &'static str {
        "byte-only"
    }

    fn supports(&self, encoding: Encoding) -> bool {
        encoding == Encoding::Byte
    }

    fn capacity_bytes(&self) -> usize {
        1 << 20
    }

    fn evaluate_tile(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        request: &TileRequest<'_>,
        encoding: Encoding,
    ) -> Result<SubMatrix, RqaError> {
        SequentialBackend::new().evaluate_tile(evaluator, request, encoding)
    }
}

/// Fails every tile whose core is wider or taller than `max_extent`.
struct FailAboveBackend {
    max_extent: usize,
    calls: Arc<AtomicUsize>,
    inner: SequentialBackend,
}

impl FailAboveBackend {
    fn new(max_extent: usize) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = Self {
            max_extent,
            calls: Arc::clone(&calls),
            inner: SequentialBackend::new(),
        };
        (backend, calls)
    }
}

impl Backend for FailAboveBackend {
    fn name(&self) -> &'static str {
        "fail-above"
    }

    fn supports(&self, _encoding: Encoding) -> bool {
        true
    }

    fn capacity_bytes(&self) -> usize {
        self.inner.capacity_bytes()
    }

    fn evaluate_tile(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        request: &TileRequest<'_>,
        encoding: Encoding,
    ) -> Result<SubMatrix, RqaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tile = request.descriptor;
        if tile.dim_x.max(tile.dim_y) > self.max_extent {
            return Err(RqaError::backend(tile.index, "simulated out of memory"));
        }
        self.inner.evaluate_tile(evaluator, request, encoding)
    }
}

// ---------------------------------------------------------------------------
// Encoding support
// ---------------------------------------------------------------------------

#[test]
fn test_unsupported_encoding_is_rejected_before_any_tile() {
    let settings = Settings {
        encoding: Encoding::Bit,
        ..Default::default()
    };
    let err = RqaEngine::with_backend(&settings, &fixture(), Box::new(ByteOnlyBackend)).unwrap_err();
    match err {
        RqaError::DataTypeMismatch { encoding, backend } => {
            assert_eq!(encoding, Encoding::Bit);
            assert_eq!(backend, "byte-only");
        }
        other => panic!("expected DataTypeMismatch, got {other:?}"),
    }
}

#[test]
fn test_supported_encoding_runs_on_injected_backend() {
    let settings = Settings {
        radius: 0.5,
        encoding: Encoding::Byte,
        tile_size: TileSize::Fixed(4),
        ..Default::default()
    };
    let series = fixture();
    let engine = RqaEngine::with_backend(&settings, &series, Box::new(ByteOnlyBackend)).unwrap();
    assert_eq!(engine.backend_name(), "byte-only");
    let output = engine.run().unwrap();
    assert_eq!(output.recurrence_points, vec![2, 1, 2, 1, 2, 0]);
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[test]
fn test_retry_with_halved_extent_succeeds() {
    let series = noise(60, 5);
    let settings = Settings {
        radius: 0.3,
        tile_size: TileSize::Fixed(16),
        ..Default::default()
    };
    let (backend, calls) = FailAboveBackend::new(8);
    let output = RqaEngine::with_backend(&settings, &series, Box::new(backend))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(output.attempts, 2);
    assert_eq!(output.tile_extent, 8);
    assert!(calls.load(Ordering::SeqCst) > 1);
    assert!(output.events.iter().any(|e| matches!(
        e,
        RqaEvent::RetryWithSmallerTiles {
            from_extent: 16,
            to_extent: 8,
            ..
        }
    )));
    assert_matches_baseline(&output, &baseline(&series, &settings), "after retry");
}

#[test]
fn test_second_failure_aborts_after_two_attempts() {
    let settings = Settings {
        tile_size: TileSize::Fixed(4),
        ..Default::default()
    };
    let (backend, calls) = FailAboveBackend::new(0);
    let err = RqaEngine::with_backend(&settings, &noise(30, 1), Box::new(backend))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, RqaError::Backend { tile: Some(0), .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_single_cell_tiles_are_not_retried() {
    let settings = Settings {
        tile_size: TileSize::Fixed(1),
        ..Default::default()
    };
    let (backend, calls) = FailAboveBackend::new(0);
    let err = RqaEngine::with_backend(&settings, &fixture(), Box::new(backend))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_capacity_overflow_triggers_retry() {
    let series = noise(40, 9);
    let settings = Settings {
        radius: 0.25,
        encoding: Encoding::Byte,
        tile_size: TileSize::Fixed(8),
        ..Default::default()
    };
    let output = RqaEngine::with_backend(
        &settings,
        &series,
        Box::new(SequentialBackend::with_capacity(32)),
    )
    .unwrap()
    .run()
    .unwrap();
    assert_eq!(output.attempts, 2);
    assert_eq!(output.tile_extent, 4);
    assert_matches_baseline(&output, &baseline(&series, &settings), "capacity retry");
}

#[test]
fn test_allocate_tile_is_usable_by_custom_backends() {
    let tile = TilePartitioner::new(6, 3, true, false).unwrap().partition()[0];
    let bytes = allocate_tile(&tile, Encoding::Bit, 1024).unwrap();
    assert_eq!(bytes.len(), 2);
    assert!(bytes.iter().all(|&b| b == 0));
    assert!(allocate_tile(&tile, Encoding::Byte, 8).is_err());
}
