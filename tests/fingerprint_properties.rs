// tests/fingerprint_properties.rs

mod common;
use crate::common::mock_project;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use buildgate::context::RunContext;
use buildgate::errors::GateError;
use buildgate::fingerprint::{Fingerprinter, WatchPatterns};
use buildgate::fs::mock::MockFileSystem;
use buildgate::fs::FileSystem;
use buildgate::types::Fingerprint;

fn patterns(pats: &[&str]) -> WatchPatterns {
    let owned: Vec<String> = pats.iter().map(|p| p.to_string()).collect();
    WatchPatterns::new(&owned).unwrap()
}

async fn fingerprint_of(fs: Arc<dyn FileSystem>, ctx: &RunContext, pats: &[&str]) -> Fingerprint {
    Fingerprinter::new(fs).compute(ctx, &patterns(pats)).await.unwrap()
}

fn blake3_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Delays reads of selected files so completions arrive out of order.
#[derive(Debug)]
struct SlowFileSystem {
    inner: MockFileSystem,
    slow: Vec<PathBuf>,
}

impl FileSystem for SlowFileSystem {
    fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        self.inner.read_to_string(path)
    }
    fn open_read(&self, path: &Path) -> anyhow::Result<Box<dyn Read + Send>> {
        if self.slow.iter().any(|p| p == path) {
            std::thread::sleep(Duration::from_millis(50));
        }
        self.inner.open_read(path)
    }
    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        self.inner.write(path, contents)
    }
    fn create_new(&self, path: &Path, contents: &[u8]) -> anyhow::Result<bool> {
        self.inner.create_new(path, contents)
    }
    fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        self.inner.remove_file(path)
    }
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
    fn is_symlink(&self, path: &Path) -> bool {
        self.inner.is_symlink(path)
    }
    fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }
}

#[tokio::test]
async fn test_fingerprint_is_digest_of_ordered_lines() {
    let (fs, ctx) = mock_project(&[("src/b.ts", "bee"), ("src/a.ts", "ay"), ("package.json", "{}")]);
    let fp = fingerprint_of(fs, &ctx, &["src/**", "package.json"]).await;

    let expected_text = format!(
        "src/a.ts:{}\nsrc/b.ts:{}\npackage.json:{}",
        blake3_hex(b"ay"),
        blake3_hex(b"bee"),
        blake3_hex(b"{}")
    );
    assert_eq!(fp.as_str(), blake3_hex(expected_text.as_bytes()));
}

#[tokio::test]
async fn test_no_matches_is_digest_of_empty_text() {
    let (fs, ctx) = mock_project(&[("README.md", "docs")]);
    let fp = fingerprint_of(fs, &ctx, &["src/**"]).await;
    assert_eq!(fp.as_str(), blake3_hex(b""));
}

#[tokio::test]
async fn test_pattern_order_and_duplicates_are_significant() {
    let (fs, ctx) = mock_project(&[("a.txt", "A"), ("b.txt", "B")]);

    let ab = fingerprint_of(fs.clone(), &ctx, &["a.txt", "b.txt"]).await;
    let ba = fingerprint_of(fs.clone(), &ctx, &["b.txt", "a.txt"]).await;
    let twice = fingerprint_of(fs.clone(), &ctx, &["a.txt", "*.txt"]).await;
    let once = fingerprint_of(fs, &ctx, &["*.txt"]).await;

    assert_ne!(ab, ba);
    assert_ne!(twice, once);
}

#[tokio::test]
async fn test_rename_changes_fingerprint() {
    let (fs, ctx) = mock_project(&[("src/old.ts", "same bytes")]);
    let before = fingerprint_of(fs.clone(), &ctx, &["src/**"]).await;

    fs.remove_file(Path::new("proj/src/old.ts")).unwrap();
    fs.add_file("proj/src/new.ts", "same bytes");
    let after = fingerprint_of(fs, &ctx, &["src/**"]).await;

    assert_ne!(before, after);
}

#[tokio::test]
async fn test_state_files_never_contribute() {
    let (fs, ctx) = mock_project(&[("a.txt", "A")]);
    let before = fingerprint_of(fs.clone(), &ctx, &["**"]).await;

    fs.add_file(ctx.hash_path(), "deadbeef");
    fs.add_file(ctx.lock_path(), "123");
    let after = fingerprint_of(fs, &ctx, &["**", ".buildgate-hash"]).await;

    assert_eq!(before, after);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_read_completion_order_does_not_matter() {
    let (fast, ctx) = mock_project(&[("src/a.ts", "1"), ("src/b.ts", "2"), ("src/c.ts", "3")]);
    let expected = fingerprint_of(fast.clone(), &ctx, &["src/**"]).await;

    let slow = Arc::new(SlowFileSystem {
        inner: fast.as_ref().clone(),
        slow: vec![PathBuf::from("proj/src/a.ts")],
    });
    let fp = fingerprint_of(slow, &ctx, &["src/**"]).await;

    assert_eq!(fp, expected);
}

#[tokio::test]
async fn test_unreadable_file_yields_no_fingerprint() {
    let (fs, ctx) = mock_project(&[("src/a.ts", "1")]);
    fs.add_unreadable("proj/src/broken.ts");

    let result = Fingerprinter::new(fs).compute(&ctx, &patterns(&["src/**"])).await;
    match result {
        Err(GateError::FileUnreadable { path, reason }) => {
            assert_eq!(path, PathBuf::from("proj/src/broken.ts"));
            assert!(reason.contains("Permission denied"));
        }
        other => panic!("expected FileUnreadable, got {other:?}"),
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn file_set() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    proptest::collection::btree_map("[a-d]{1,3}(/[a-d]{1,3})?", proptest::collection::vec(any::<u8>(), 0..32), 1..8)
        .prop_map(|m| m.into_iter().collect())
}

fn build_fs(files: &[(String, Vec<u8>)]) -> Arc<MockFileSystem> {
    let fs = Arc::new(MockFileSystem::new());
    fs.add_dir("proj");
    for (rel, bytes) in files {
        fs.add_file(Path::new("proj/src").join(rel), bytes.clone());
    }
    fs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // A path can't be both a file and a directory, so paths are filtered to
    // avoid `a` next to `a/b`.
    #[test]
    fn fingerprint_is_deterministic(files in file_set()) {
        let files: Vec<_> = files
            .iter()
            .filter(|(p, _)| !files.iter().any(|(q, _)| q.starts_with(&format!("{p}/"))))
            .cloned()
            .collect();
        let ctx = RunContext::root("proj");
        let rt = runtime();

        let a = rt.block_on(fingerprint_of(build_fs(&files), &ctx, &["src/**"]));
        let b = rt.block_on(fingerprint_of(build_fs(&files), &ctx, &["src/**"]));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn any_content_change_changes_fingerprint(files in file_set(), pick in any::<usize>(), extra in any::<u8>()) {
        let mut files: Vec<_> = files
            .iter()
            .filter(|(p, _)| !files.iter().any(|(q, _)| q.starts_with(&format!("{p}/"))))
            .cloned()
            .collect();
        let ctx = RunContext::root("proj");
        let rt = runtime();

        let before = rt.block_on(fingerprint_of(build_fs(&files), &ctx, &["src/**"]));
        let idx = pick % files.len();
        files[idx].1.push(extra);
        let after = rt.block_on(fingerprint_of(build_fs(&files), &ctx, &["src/**"]));
        prop_assert_ne!(before, after);
    }
}

#[cfg(unix)]
mod symlinks {
    use super::*;
    use crate::common::TempProject;
    use buildgate::fs::RealFileSystem;
    use std::os::unix::fs::symlink;

    #[tokio::test]
    async fn test_parent_pointing_symlink_is_not_followed() {
        let project = TempProject::new();
        project.write("src/a.txt", "a");
        symlink("..", project.join("src/up")).unwrap();

        let ctx = project.ctx();
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let files = patterns(&["src/**"]).expand(fs.as_ref(), ctx.base_dir()).unwrap();
        assert_eq!(files, vec!["src/a.txt"]);

        let fp = fingerprint_of(fs, &ctx, &["src/**"]).await;
        let expected = format!("src/a.txt:{}", blake3_hex(b"a"));
        assert_eq!(fp.as_str(), blake3_hex(expected.as_bytes()));
    }

    #[tokio::test]
    async fn test_dangling_symlink_is_unreadable() {
        let project = TempProject::new();
        project.write("src/a.txt", "a");
        symlink("missing.txt", project.join("src/gone.txt")).unwrap();

        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let result = Fingerprinter::new(fs)
            .compute(&project.ctx(), &patterns(&["src/**"]))
            .await;
        match result {
            Err(GateError::FileUnreadable { path, .. }) => {
                assert_eq!(path, project.join("src/gone.txt"));
            }
            other => panic!("expected FileUnreadable, got {other:?}"),
        }
    }
}
