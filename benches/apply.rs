//! Benchmarks for applying edits to a document.

use collabsync::edit::{BufferId, Edit, EditKind};
use collabsync::session::Session;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

const DOC: BufferId = BufferId(1);

fn synced_session(lines: usize) -> Session {
    let mut session = Session::new();
    session
        .apply(Edit::new(
            DOC,
            EditKind::BufferSync {
                filename: "bench.txt".to_string(),
                lines: (0..lines).map(|i| format!("line {i} of the document")).collect(),
            },
        ))
        .unwrap();
    session
}

fn typing_burst() -> Vec<Edit> {
    (0..200)
        .map(|i| {
            Edit::new(
                DOC,
                EditKind::InsertText {
                    line: 500,
                    index: i,
                    text: "a".to_string(),
                },
            )
        })
        .collect()
}

fn bench_apply_typing(c: &mut Criterion) {
    c.bench_function("apply_200_inserts", |b| {
        b.iter_batched(
            || (synced_session(1000), typing_burst()),
            |(mut session, edits)| black_box(session.applier().apply_all(edits)),
            BatchSize::SmallInput,
        );
    });
}

fn bench_full_sync(c: &mut Criterion) {
    let snapshot: Vec<String> = (0..1000).map(|i| format!("rewritten {i}")).collect();
    c.bench_function("sync_1000_lines", |b| {
        b.iter_batched(
            || synced_session(1000),
            |mut session| {
                let edit = Edit::new(
                    DOC,
                    EditKind::BufferSync {
                        filename: "bench.txt".to_string(),
                        lines: snapshot.clone(),
                    },
                );
                black_box(session.apply(edit))
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_apply_typing, bench_full_sync);
criterion_main!(benches);
