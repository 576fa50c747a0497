//! Buffer manager tests against real files on disk.

use clockpool::{
    BufferManager, DiskFile, Error, ErrorKind, FileHandle, FrameId, Page, PageId, PagedFile,
    SharedBufferManager,
};
use std::path::Path;
use tempfile::tempdir;

fn open(path: &Path) -> FileHandle {
    FileHandle::new(DiskFile::open_or_create(path).unwrap())
}

/// Allocate `n` pages directly in the file.
fn allocate(file: &FileHandle, n: usize) -> Vec<PageId> {
    (0..n).map(|_| file.lock().allocate_page().unwrap()).collect()
}

/// Helper to write a string to page data.
fn copy_string(data: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    data[..bytes.len()].copy_from_slice(bytes);
    data[bytes.len()] = 0;
}

/// Helper to read a null-terminated string from page data.
fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}

#[test]
fn test_very_basic() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("basic.db"));
    let mut bpm = BufferManager::new(10).unwrap();

    let (pid, page) = bpm.alloc_page(&file).unwrap();
    copy_string(page.as_mut_slice(), "Hello, world!");
    bpm.unpin_page(&file, pid, true).unwrap();

    let page = bpm.read_page(&file, pid).unwrap();
    assert_eq!(read_string(page.as_slice()), "Hello, world!");
    bpm.unpin_page(&file, pid, false).unwrap();

    bpm.flush_file(&file).unwrap();
    bpm.dispose_page(&file, pid).unwrap();
    assert!(!bpm.contains_page(&file, pid));
}

/// Capacity 3; A, B, C pinned; loading D fails until A is unpinned, then D
/// takes A's frame.
#[test]
fn test_scenario_exhaustion_then_eviction() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("scenario_a.db"));
    let mut bpm = BufferManager::new(3).unwrap();

    let pids = allocate(&file, 4);
    let (a, b, c, d) = (pids[0], pids[1], pids[2], pids[3]);
    for &pid in &[a, b, c] {
        bpm.read_page(&file, pid).unwrap();
    }

    let err = bpm.read_page(&file, d).unwrap_err();
    assert!(matches!(err, Error::BufferPoolExhausted { pool_size: 3 }));
    assert_eq!(err.kind(), ErrorKind::ResourceExhaustion);
    assert_eq!(bpm.resident_count(), 3);

    bpm.unpin_page(&file, a, false).unwrap();
    bpm.read_page(&file, d).unwrap();

    assert!(!bpm.contains_page(&file, a));
    for &pid in &[b, c, d] {
        assert_eq!(bpm.pin_count(&file, pid), Some(1));
    }

    let snapshot = bpm.snapshot();
    assert_eq!(snapshot.frames[0].page_id, Some(d));
    assert_eq!(snapshot.valid_frames, 3);
    assert_eq!(bpm.clock_hand(), FrameId::new(0));
    bpm.verify_consistency().unwrap();
}

/// Flush while a second holder still pins a dirty page.
#[test]
fn test_scenario_flush_with_second_pin() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("scenario_b.db"));
    let bpm = SharedBufferManager::new(BufferManager::new(4).unwrap());

    let pid = allocate(&file, 1)[0];
    let mut first = bpm.fetch(&file, pid).unwrap();
    let second = bpm.fetch(&file, pid).unwrap();

    first.write(|p| p.as_mut_slice()[0] = 0x7F).unwrap();
    first.release().unwrap();

    let err = bpm.flush_file(&file).unwrap_err();
    assert!(matches!(err, Error::PagePinned { page_id, .. } if page_id == pid));
    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);

    // Nothing was written.
    assert_eq!(bpm.stats().pages_written, 0);
    assert_eq!(bpm.lock().is_dirty(&file, pid), Some(true));

    drop(second);
    bpm.flush_file(&file).unwrap();
    assert_eq!(bpm.stats().pages_written, 1);
}

/// A clean page evicted under pressure comes back with the file's content,
/// not the pool's stale copy.
#[test]
fn test_scenario_clean_eviction_rereads() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("scenario_c.db"));
    let mut bpm = BufferManager::new(2).unwrap();

    let pids = allocate(&file, 3);
    let q = pids[0];

    bpm.read_page(&file, q).unwrap().as_mut_slice()[0] = 0xEE;
    bpm.unpin_page(&file, q, false).unwrap();

    for &pid in &pids[1..] {
        bpm.read_page(&file, pid).unwrap();
        bpm.unpin_page(&file, pid, false).unwrap();
    }
    assert!(!bpm.contains_page(&file, q));

    let page = bpm.read_page(&file, q).unwrap();
    assert_eq!(page.as_slice()[0], 0);
    assert_eq!(bpm.stats().pages_written, 0);
}

#[test]
fn test_data_survives_eviction_cycles() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("cycles.db"));
    let mut bpm = BufferManager::new(2).unwrap();

    let mut pids = Vec::new();
    for i in 0u8..6 {
        let (pid, page) = bpm.alloc_page(&file).unwrap();
        page.as_mut_slice()[0] = i;
        page.as_mut_slice()[1] = i.wrapping_mul(3);
        bpm.unpin_page(&file, pid, true).unwrap();
        pids.push(pid);
    }
    assert!(bpm.stats().evictions >= 4);

    for (i, &pid) in pids.iter().enumerate() {
        let page = bpm.read_page(&file, pid).unwrap();
        assert_eq!(page.as_slice()[0], i as u8);
        assert_eq!(page.as_slice()[1], (i as u8).wrapping_mul(3));
        bpm.unpin_page(&file, pid, false).unwrap();
    }
    bpm.verify_consistency().unwrap();
}

/// After a flush the file holds exactly the pooled bytes, all 4 KiB of them.
#[test]
fn test_flush_writes_whole_page() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("whole.db"));
    let mut bpm = BufferManager::new(4).unwrap();

    let (pid, page) = bpm.alloc_page(&file).unwrap();
    for (i, byte) in page.as_mut_slice().iter_mut().enumerate() {
        *byte = (i * 31 + 7) as u8;
    }
    bpm.unpin_page(&file, pid, true).unwrap();
    bpm.flush_file(&file).unwrap();

    let mut stored = Page::new();
    file.lock().read_page(pid, &mut stored).unwrap();

    let pooled = bpm.read_page(&file, pid).unwrap();
    assert_eq!(pooled.as_slice(), stored.as_slice());
    assert_eq!(stored.as_slice()[0], 7);
}

#[test]
fn test_alloc_page_is_zeroed() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("zeroed.db"));
    let mut bpm = BufferManager::new(2).unwrap();

    let (pid, page) = bpm.alloc_page(&file).unwrap();
    assert!(page.as_slice().iter().all(|&b| b == 0));
    bpm.unpin_page(&file, pid, false).unwrap();

    // A reused id comes back zeroed too.
    bpm.dispose_page(&file, pid).unwrap();
    let (again, page) = bpm.alloc_page(&file).unwrap();
    assert_eq!(again, pid);
    assert!(page.as_slice().iter().all(|&b| b == 0));
}

#[test]
fn test_flush_and_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let data = b"persistent!";

    let pid = {
        let file = open(&path);
        let mut bpm = BufferManager::new(4).unwrap();

        let (pid, page) = bpm.alloc_page(&file).unwrap();
        page.as_mut_slice()[..data.len()].copy_from_slice(data);
        bpm.unpin_page(&file, pid, true).unwrap();

        bpm.flush_file(&file).unwrap();
        assert_eq!(bpm.is_dirty(&file, pid), Some(false));
        pid
    };

    let file = open(&path);
    let mut bpm = BufferManager::new(4).unwrap();
    let page = bpm.read_page(&file, pid).unwrap();
    assert_eq!(&page.as_slice()[..data.len()], data);
}

#[test]
fn test_disposed_page_is_reused_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dispose.db");

    let disposed = {
        let file = open(&path);
        let mut bpm = BufferManager::new(4).unwrap();

        let pids = allocate(&file, 3);
        bpm.read_page(&file, pids[1]).unwrap().as_mut_slice()[0] = 0xAA;
        bpm.unpin_page(&file, pids[1], true).unwrap();
        bpm.dispose_page(&file, pids[1]).unwrap();

        assert_eq!(file.lock().page_ids(), vec![pids[0], pids[2]]);
        assert_eq!(bpm.stats().pages_written, 0);
        pids[1]
    };

    let mut disk = DiskFile::open(&path).unwrap();
    assert_eq!(disk.page_count(), 3);
    assert_eq!(disk.free_count(), 1);
    assert_eq!(disk.allocate_page().unwrap(), disposed);

    let file = FileHandle::new(disk);
    let mut bpm = BufferManager::new(4).unwrap();
    let page = bpm.read_page(&file, disposed).unwrap();
    assert!(page.as_slice().iter().all(|&b| b == 0));
}

#[test]
fn test_read_unallocated_page() {
    let dir = tempdir().unwrap();
    let file = open(&dir.path().join("missing.db"));
    let mut bpm = BufferManager::new(2).unwrap();

    let err = bpm.read_page(&file, PageId::new(5)).unwrap_err();
    assert!(matches!(err, Error::InvalidPage { .. }));
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(bpm.resident_count(), 0);
    bpm.verify_consistency().unwrap();
}
