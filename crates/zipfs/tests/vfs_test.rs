use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::TempDir;
use zipfs::{ArchiveMount, EntryKind, Error, FileSystem, MountConfig, OpenMode};
use zipfs_format::ArchiveBuilder;

const MODIFIED: &str = "2024-03-15 12:30:00";
const MODIFIED_UNIX: i64 = 1_710_505_800;

fn create_test_archive(temp_dir: &Path) -> PathBuf {
    let modified = NaiveDateTime::parse_from_str(MODIFIED, "%Y-%m-%d %H:%M:%S").unwrap();

    ArchiveBuilder::new()
        .deflated(true)
        .with_file_modified("a/b.txt", b"hello".to_vec(), modified)
        .with_directory("c/")
        .with_file_modified("deep/er/still/file.log", "line\n".repeat(64), modified)
        .with_file("x", b"shadowed".to_vec())
        .with_directory("x/")
        .write_to(temp_dir.join("fixture.zip"))
        .unwrap()
}

fn mount(temp_dir: &Path) -> ArchiveMount {
    ArchiveMount::open(create_test_archive(temp_dir), MountConfig::default()).unwrap()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn root_lists_implicit_and_explicit_directories() {
    let temp_dir = TempDir::new().unwrap();
    let fs = mount(temp_dir.path()).session();

    let root: BTreeSet<String> = fs.list_directory("").unwrap().into_iter().collect();
    assert_eq!(root, set(&["a", "c", "deep", "x"]));

    let a: BTreeSet<String> = fs.list_directory("a").unwrap().into_iter().collect();
    assert_eq!(a, set(&["b.txt"]));
}

#[test]
fn every_ancestor_is_a_directory() {
    let temp_dir = TempDir::new().unwrap();
    let mount = mount(temp_dir.path());
    let index = mount.index();

    for path in ["deep", "deep/er", "deep/er/still", "a"] {
        assert_eq!(index.kind(path), Some(EntryKind::Directory), "{}", path);
    }
    assert!(index.malformed().is_empty());
}

#[test]
fn directory_marker_wins_over_same_named_file() {
    let temp_dir = TempDir::new().unwrap();
    let fs = mount(temp_dir.path()).session();

    assert!(fs.is_directory("x"));
    assert!(!fs.is_file("x"));
    assert!(fs.list_directory("x").unwrap().is_empty());
    assert!(matches!(fs.open_for_read("x"), Err(Error::IsADirectory(_))));
}

#[test]
fn stat_reports_archive_size_and_timestamp() {
    let temp_dir = TempDir::new().unwrap();
    let fs = mount(temp_dir.path()).session();

    let st = fs.stat("/a/b.txt").unwrap();
    assert_eq!(st.size, 5);
    assert_eq!(st.mtime, MODIFIED_UNIX);
    assert_eq!(st.atime, MODIFIED_UNIX);
    assert_eq!(st.ctime, MODIFIED_UNIX);
    assert_eq!(fs.get_size("deep/er/still/file.log").unwrap(), 320);
}

#[test]
fn session_navigation_and_reads() {
    let temp_dir = TempDir::new().unwrap();
    let mut fs = mount(temp_dir.path()).session();

    fs.change_directory("a").unwrap();
    assert_eq!(fs.translate_client_path_to_internal("b.txt"), "a/b.txt");

    let mut text = String::new();
    fs.open("b.txt", OpenMode::from_mode_str("rb"))
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "hello");

    fs.change_directory("..").unwrap();
    assert_eq!(fs.current_directory(), "/");

    fs.change_directory("/deep//er/./still/").unwrap();
    let mut log = String::new();
    fs.open_for_read("file.log")
        .unwrap()
        .read_to_string(&mut log)
        .unwrap();
    assert_eq!(log, "line\n".repeat(64));
}

#[test]
fn failures_are_typed() {
    let temp_dir = TempDir::new().unwrap();
    let mut fs = mount(temp_dir.path()).session();

    assert!(matches!(fs.stat("nonexistent"), Err(Error::NotFound(_))));
    assert!(matches!(fs.open_for_read("c"), Err(Error::IsADirectory(_))));
    assert!(matches!(
        fs.list_directory("a/b.txt"),
        Err(Error::NotADirectory(_))
    ));
    assert!(matches!(
        fs.change_directory("a/b.txt"),
        Err(Error::NotADirectory(_))
    ));
    assert!(matches!(
        fs.open("a/b.txt", OpenMode::from_mode_str("wb")),
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(fs.remove_file("a/b.txt"), Err(Error::Unsupported(_))));
}

#[test]
fn sessions_read_concurrently_from_one_mount() {
    let temp_dir = TempDir::new().unwrap();
    let mount = mount(temp_dir.path());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mut fs = mount.session();
            thread::spawn(move || {
                if i % 2 == 0 {
                    fs.change_directory("deep/er/still").unwrap();
                } else {
                    fs.change_directory("/deep/er").unwrap();
                    fs.change_directory("still").unwrap();
                }
                let mut log = Vec::new();
                fs.open_for_read("file.log")
                    .unwrap()
                    .read_to_end(&mut log)
                    .unwrap();
                (fs.current_directory(), log.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ("/deep/er/still".to_string(), 320));
    }
}

#[test]
fn mount_config_is_reported_on_stat() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("zipfs.toml");
    std::fs::write(&config_path, "uid = 501\ngid = 20\n").unwrap();

    let config = MountConfig::from_toml_file(&config_path).unwrap();
    let mount = ArchiveMount::open(create_test_archive(temp_dir.path()), config).unwrap();
    let st = mount.session().stat("c").unwrap();

    assert_eq!((st.uid, st.gid), (501, 20));
    assert!(st.is_dir());
}
