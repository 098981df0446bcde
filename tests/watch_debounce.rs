// tests/watch_debounce.rs

mod common;
use crate::common::{init_tracing, with_timeout, ConfigBuilder, FakeRunner, TempProject};

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Duration};

use buildgate::engine::{RunOptions, RunOrchestrator};
use buildgate::errors::Result;
use buildgate::fs::{FileSystem, RealFileSystem};
use buildgate::state::{FileHashStore, LockGuard};
use buildgate::watch::{watch_directory, ChangeNotice, RunTrigger, WatchScheduler};

#[derive(Default)]
struct CountingTrigger {
    fired: Arc<AtomicUsize>,
}

impl RunTrigger for CountingTrigger {
    fn fire(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let fired = Arc::clone(&self.fired);
        Box::pin(async move {
            fired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

fn notice(path: &str) -> ChangeNotice {
    ChangeNotice { path: path.to_string() }
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_triggers_one_run() {
    init_tracing();
    let (tx, rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut trigger = CountingTrigger::default();
    let fired = Arc::clone(&trigger.fired);

    let driver = async {
        // Five notifications, each inside the window of the previous one.
        for i in 0..5 {
            tx.send(notice(&format!("src/{i}.ts"))).unwrap();
            sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // A second, separate burst.
        tx.send(notice("src/a.ts")).unwrap();
        tx.send(notice("src/b.ts")).unwrap();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        stop_tx.send(()).unwrap();
    };

    let scheduler = WatchScheduler::new(Duration::from_millis(300));
    let shutdown = async {
        let _ = stop_rx.await;
    };
    let (summary, ()) = tokio::join!(scheduler.run(rx, &mut trigger, shutdown), driver);

    assert_eq!(summary.runs, 2);
    assert_eq!(summary.notifications, 7);
}

#[tokio::test(start_paused = true)]
async fn test_closed_change_stream_stops_watching() {
    let (tx, rx) = mpsc::unbounded_channel::<ChangeNotice>();
    drop(tx);
    let mut trigger = CountingTrigger::default();

    let summary = WatchScheduler::new(Duration::from_millis(300))
        .run(rx, &mut trigger, std::future::pending::<()>())
        .await;

    assert_eq!(summary.runs, 0);
    assert_eq!(trigger.fired.load(Ordering::SeqCst), 0);
}

/// Real filesystem + `notify`: initial run, one run per settled change, lock
/// cleared on shutdown.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_directory_reruns_on_change() {
    init_tracing();
    let project = TempProject::new();
    project.write("src/main.ts", "v1");
    let config = ConfigBuilder::new("build").watch("src/**").build();

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runner = FakeRunner::new();
    let orchestrator = RunOrchestrator::new(
        project.ctx(),
        Arc::new(config),
        Arc::clone(&fs),
        Box::new(FileHashStore::new(Arc::clone(&fs))),
        runner.clone(),
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let watch = tokio::spawn(watch_directory(
        orchestrator,
        "build".to_string(),
        RunOptions::default(),
        Duration::from_millis(100),
        async move {
            let _ = stop_rx.await;
        },
    ));

    with_timeout(async {
        while runner.run_count() < 1 {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    // Give the watcher a moment to settle before changing things.
    sleep(Duration::from_millis(200)).await;
    project.write("src/main.ts", "v2");

    with_timeout(async {
        while runner.run_count() < 2 {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    stop_tx.send(()).unwrap();
    with_timeout(watch).await.unwrap().unwrap();

    assert_eq!(runner.runs()[0].command, "build");
    assert!(!LockGuard::is_held(fs.as_ref(), &project.ctx()));
    assert!(project.hash_record().is_some());
}
