#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

pub use buildgate_test_utils::*;

use buildgate::config::ConfigFile;
use buildgate::context::RunContext;
use buildgate::engine::RunOrchestrator;
use buildgate::fs::mock::MockFileSystem;
use buildgate::fs::FileSystem;
use buildgate::state::{FileHashStore, HashStore};

/// In-memory project rooted at `proj`, with the given files (paths relative
/// to the project).
pub fn mock_project(files: &[(&str, &str)]) -> (Arc<MockFileSystem>, RunContext) {
    let fs = Arc::new(MockFileSystem::new());
    fs.add_dir("proj");
    for (rel, contents) in files {
        fs.add_file(Path::new("proj").join(rel), contents.as_bytes());
    }
    (fs, RunContext::root("proj"))
}

/// Orchestrator over `fs` with a file-backed hash store, as in production.
pub fn orchestrator(
    fs: &Arc<MockFileSystem>,
    ctx: &RunContext,
    config: ConfigFile,
    runner: FakeRunner,
) -> RunOrchestrator<FakeRunner> {
    let fs: Arc<dyn FileSystem> = fs.clone();
    let store: Box<dyn HashStore> = Box::new(FileHashStore::new(Arc::clone(&fs)));
    RunOrchestrator::new(ctx.clone(), Arc::new(config), fs, store, runner)
}
