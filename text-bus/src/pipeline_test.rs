use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt as _, BufReader};
use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::sync::CancellationToken;

use super::{Pipeline, PipelineConfig, StageExit};
use crate::message::{self, Message};
use crate::{feeder, lowercase, transform};

fn cfg(rate_ms: u64, grace_ms: u64) -> PipelineConfig {
    PipelineConfig {
        rate_limit: Duration::from_millis(rate_ms),
        shutdown_grace: Duration::from_millis(grace_ms),
    }
}

#[tokio::test]
async fn test_end_to_end_example_vector() -> anyhow::Result<()> {
    let pipeline = Pipeline::new(cfg(25, 500), CancellationToken::new());
    let mut tap = pipeline.subscribe();

    let input = BufReader::new(&b"Hello World\nFOO\nexit\n"[..]);
    let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run(input)).await??;

    assert_eq!(report.feeder, StageExit::Sentinel);
    assert_eq!(report.lowercase, StageExit::Sentinel);
    assert_eq!(report.rotate, StageExit::Sentinel);
    assert_eq!(report.drain, StageExit::Sentinel);
    assert!(pipeline.is_cancelled());

    assert_eq!(tap.recv().await?, "uryyb jbeyq");
    assert_eq!(tap.recv().await?, "sbb");
    assert!(matches!(tap.try_recv(), Err(TryRecvError::Empty)));
    Ok(())
}

#[tokio::test]
async fn test_order_preserved_without_drops() -> anyhow::Result<()> {
    let lines: Vec<String> = (1..=8).map(|i| format!("Message {}", i)).collect();
    let expected: Vec<String> = lines
        .iter()
        .map(|l| transform::rot13(&transform::lowercase(l)))
        .collect();

    let pipeline = Pipeline::new(cfg(10, 500), CancellationToken::new());
    let mut tap = pipeline.subscribe();

    let data = format!("{}\nexit\n", lines.join("\n"));
    let input = BufReader::new(Cursor::new(data.into_bytes()));
    let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run(input)).await??;
    assert_eq!(report.drain, StageExit::Sentinel);

    for want in &expected {
        assert_eq!(&tap.recv().await?, want);
    }
    assert!(matches!(tap.try_recv(), Err(TryRecvError::Empty)));
    Ok(())
}

/// The pacing sleep trails each forward, so N messages cannot clear the
/// pipeline in less than N rate-limit intervals even when they arrive as one
/// burst.
#[tokio::test]
async fn test_rate_limit_holds_under_burst() -> anyhow::Result<()> {
    let pipeline = Pipeline::new(cfg(100, 500), CancellationToken::new());
    let input = BufReader::new(&b"one\ntwo\nthree\nexit\n"[..]);

    let started = std::time::Instant::now();
    let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run(input)).await??;
    let elapsed = started.elapsed();

    assert_eq!(report.drain, StageExit::Sentinel);
    assert!(
        elapsed >= Duration::from_millis(300),
        "three forwards should take at least three intervals, took {:?}",
        elapsed
    );
    assert!(elapsed < Duration::from_secs(3), "took too long: {:?}", elapsed);
    Ok(())
}

#[tokio::test]
async fn test_exit_command_cancels_and_stops_everything() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(cfg(10, 500), cancel.clone());
    assert!(!pipeline.is_cancelled());

    let input = BufReader::new(&b"exit\n"[..]);
    let report = tokio::time::timeout(Duration::from_secs(2), pipeline.run(input)).await??;

    assert!(cancel.is_cancelled());
    assert_eq!(report.feeder, StageExit::Sentinel);
    assert_eq!(report.lowercase, StageExit::Sentinel);
    assert_eq!(report.rotate, StageExit::Sentinel);
    assert_eq!(report.drain, StageExit::Sentinel);
    Ok(())
}

/// An exhausted source stops the feeder silently: no sentinel, no shutdown
/// request. The rest of the pipeline idles until someone cancels.
#[tokio::test]
async fn test_empty_input_keeps_stages_idle() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let pipeline = Arc::new(Pipeline::new(cfg(10, 200), cancel.clone()));

    let handle = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(BufReader::new(&b""[..])).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!cancel.is_cancelled());

    cancel.cancel();
    let report = tokio::time::timeout(Duration::from_secs(2), handle).await???;

    assert_eq!(report.feeder, StageExit::Closed);
    assert_eq!(report.lowercase, StageExit::Cancelled);
    assert!(matches!(
        report.rotate,
        StageExit::Cancelled | StageExit::Closed
    ));
    assert!(matches!(
        report.drain,
        StageExit::Closed | StageExit::Forced
    ));
    Ok(())
}

/// External interrupt while the source is still open: the loops stop on the
/// token, nothing is forwarded as a sentinel.
#[tokio::test]
async fn test_interrupt_without_sentinel() -> anyhow::Result<()> {
    let (mut writer, reader) = tokio::io::duplex(64);
    let cancel = CancellationToken::new();
    let pipeline = Arc::new(Pipeline::new(cfg(10, 500), cancel.clone()));
    let mut tap = pipeline.subscribe();

    let handle = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(BufReader::new(reader)).await }
    });

    writer.write_all(b"Alpha Beta\n").await?;
    let first = tokio::time::timeout(Duration::from_secs(2), tap.recv()).await??;
    assert_eq!(first, "nycun orgn");

    cancel.cancel();
    let report = tokio::time::timeout(Duration::from_secs(2), handle).await???;

    assert_eq!(report.feeder, StageExit::Cancelled);
    assert_eq!(report.lowercase, StageExit::Cancelled);
    assert!(matches!(
        report.rotate,
        StageExit::Cancelled | StageExit::Closed
    ));
    assert!(matches!(
        report.drain,
        StageExit::Closed | StageExit::Forced
    ));
    drop(writer);
    Ok(())
}

#[tokio::test]
async fn test_run_guards_against_double_start() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let pipeline = Arc::new(Pipeline::new(cfg(10, 200), cancel.clone()));

    let (_writer, reader) = tokio::io::duplex(64);
    let handle = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(BufReader::new(reader)).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(pipeline.run(BufReader::new(&b""[..])).await.is_err());

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(2), handle).await??;
    Ok(())
}

#[tokio::test]
async fn test_feeder_enqueues_verbatim_and_detects_exit() -> anyhow::Result<()> {
    let (tx, mut rx) = message::queue();
    let cancel = CancellationToken::new();

    let input = BufReader::new(&b"One\nTWO\nExit\n"[..]);
    let exit = feeder::run_feeder(input, tx, cancel.clone()).await;

    assert_eq!(exit, StageExit::Sentinel);
    assert!(cancel.is_cancelled());
    assert_eq!(rx.recv().await, Some(Message::text("One")?));
    assert_eq!(rx.recv().await, Some(Message::text("TWO")?));
    assert_eq!(rx.recv().await, Some(Message::Exit));
    Ok(())
}

#[tokio::test]
async fn test_feeder_eof_is_not_a_shutdown_request() -> anyhow::Result<()> {
    let (tx, mut rx) = message::queue();
    let cancel = CancellationToken::new();

    let exit = feeder::run_feeder(BufReader::new(&b"solo\n"[..]), tx, cancel.clone()).await;

    assert_eq!(exit, StageExit::Closed);
    assert!(!cancel.is_cancelled());
    assert_eq!(rx.recv().await, Some(Message::text("solo")?));
    assert_eq!(rx.recv().await, None);
    Ok(())
}

/// Forward faults are logged and never kill the stage; the sentinel still
/// ends the loop even when it cannot be delivered.
#[tokio::test]
async fn test_lowercase_survives_forward_faults() -> anyhow::Result<()> {
    let (in_tx, in_rx) = message::queue();
    let (link_tx, link_rx) = message::pipe();
    drop(link_rx);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(lowercase::run_lowercase(
        in_rx,
        link_tx,
        Duration::ZERO,
        cancel.clone(),
    ));

    in_tx.send(Message::text("Still Alive")?).unwrap();
    in_tx.send(Message::Exit).unwrap();

    let exit = tokio::time::timeout(Duration::from_secs(2), handle).await??;
    assert_eq!(exit, StageExit::Sentinel);
    Ok(())
}
