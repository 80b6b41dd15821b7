//! End-to-end scheduler scenarios: a full multi-mirror session, persistence
//! across an interruption, and graceful recovery from a corrupt resume file.

use std::fs;

use mapfetch::download::{ByteRange, ChunkScheduler, ChunkStatus, NextChunk, RECORD_SIZE};
use tempfile::TempDir;

fn two_mirror_scheduler() -> ChunkScheduler {
    ChunkScheduler::new(vec!["A".to_string(), "B".to_string()], 1000, 300).unwrap()
}

fn assignment(sched: &mut ChunkScheduler) -> (String, ByteRange) {
    match sched.next_chunk() {
        NextChunk::Assigned(a) => (a.url, a.range),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn full_session_with_two_mirrors() {
    let temp = TempDir::new().unwrap();
    let resume = temp.path().join("pkg.resume");
    let mut sched = two_mirror_scheduler();

    // 1000 bytes in 300-byte chunks: positions 0, 300, 600, 900.
    let positions: Vec<i64> = sched.table().chunks().iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![0, 300, 600, 900]);

    // Both mirrors get work in order; a third ask backs off.
    let (url_a, first) = assignment(&mut sched);
    let (url_b, second) = assignment(&mut sched);
    assert_eq!((url_a.as_str(), first), ("A", ByteRange::new(0, 300)));
    assert_eq!((url_b.as_str(), second), ("B", ByteRange::new(300, 600)));
    assert_eq!(sched.next_chunk(), NextChunk::NoIdleMirror);

    // A finishes and is immediately reusable for the next range.
    assert_eq!(sched.chunk_finished(true, first).unwrap(), "A");
    let (url, third) = assignment(&mut sched);
    assert_eq!((url.as_str(), third), ("A", ByteRange::new(600, 900)));

    // Drain the rest successfully.
    sched.chunk_finished(true, second).unwrap();
    let (_, fourth) = assignment(&mut sched);
    assert_eq!(fourth, ByteRange::new(900, 1000));
    sched.chunk_finished(true, third).unwrap();
    sched.chunk_finished(true, fourth).unwrap();

    assert_eq!(sched.next_chunk(), NextChunk::Complete);
    assert_eq!(sched.bytes_complete(), 1000);

    // Persisted table: 4 packed records, all Complete.
    sched.save(&resume).unwrap();
    let data = fs::read(&resume).unwrap();
    assert_eq!(data.len(), 4 * RECORD_SIZE);
    for record in data.chunks_exact(RECORD_SIZE) {
        assert_eq!(record[8], ChunkStatus::Complete.as_u8());
    }
}

#[test]
fn interrupted_session_resumes_without_refetching() {
    let temp = TempDir::new().unwrap();
    let resume = temp.path().join("pkg.resume");

    // First session: finish two chunks, leave one in flight, then "crash".
    let mut sched = two_mirror_scheduler();
    let (_, first) = assignment(&mut sched);
    let (_, second) = assignment(&mut sched);
    sched.chunk_finished(true, first).unwrap();
    sched.chunk_finished(true, second).unwrap();
    let (_, third) = assignment(&mut sched);
    assert_eq!(third, ByteRange::new(600, 900));
    sched.save(&resume).unwrap();

    // Second session adopts the table: 600 bytes already done, the stale
    // in-flight chunk is offered again, completed chunks are not.
    let mut sched = two_mirror_scheduler();
    let already = sched.load_or_init(&resume, 1000, 300).unwrap();
    assert_eq!(already, 600);
    assert_eq!(sched.in_flight(), 0);

    let (_, next) = assignment(&mut sched);
    assert_eq!(next, ByteRange::new(600, 900));
    let (_, last) = assignment(&mut sched);
    assert_eq!(last, ByteRange::new(900, 1000));

    sched.chunk_finished(true, next).unwrap();
    sched.chunk_finished(true, last).unwrap();
    assert_eq!(sched.next_chunk(), NextChunk::Complete);
}

#[test]
fn corrupt_resume_file_degrades_to_fresh_start() {
    let temp = TempDir::new().unwrap();
    let resume = temp.path().join("pkg.resume");
    fs::write(&resume, b"not a chunk table at all").unwrap();

    let mut sched = two_mirror_scheduler();
    let already = sched.load_or_init(&resume, 1000, 300).unwrap();

    assert_eq!(already, 0);
    assert_eq!(sched.table().len(), 4);
    assert_eq!(sched.table().count_with_status(ChunkStatus::Free), 4);

    // Behaves exactly like a fresh init.
    let (_, first) = assignment(&mut sched);
    assert_eq!(first, ByteRange::new(0, 300));
}

#[test]
fn resume_file_from_other_chunking_is_ignored() {
    let temp = TempDir::new().unwrap();
    let resume = temp.path().join("pkg.resume");

    let mut sched = two_mirror_scheduler();
    let (_, first) = assignment(&mut sched);
    sched.chunk_finished(true, first).unwrap();
    sched.save(&resume).unwrap();

    // The same path loaded for a different session shape starts fresh.
    let mut other = ChunkScheduler::new(vec!["A".to_string()], 1000, 400).unwrap();
    let already = other.load_or_init(&resume, 1000, 400).unwrap();
    assert_eq!(already, 0);
    assert_eq!(other.table().len(), 3);
}

#[test]
fn mirror_failure_requeues_until_driver_gives_up() {
    let mut sched = two_mirror_scheduler();

    // Mirror B fails its chunk; the range stays available and gets handed
    // out again. The scheduler never gives up on its own, however many
    // times this repeats.
    let (_, first) = assignment(&mut sched);
    let (_, second) = assignment(&mut sched);
    assert_eq!(sched.chunk_finished(false, second).unwrap(), "B");
    assert_eq!(sched.chunk_finished(true, first).unwrap(), "A");
    assert_eq!(sched.in_flight(), 0);

    let (_, retried) = assignment(&mut sched);
    assert_eq!(retried, second);

    // The driver decides the session is dead.
    sched.mark_failed();
    assert_eq!(sched.next_chunk(), NextChunk::Failed);
}
