use criterion::{black_box, criterion_group, criterion_main, Criterion};

use atompull::{
    normalize_and_merge, Atom, AtomSchema, IdentityKind, IsolatedIdMap, StaticRegistry, TagId,
    Value,
};

const TAG: TagId = 10;

fn registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new();
    registry.insert(
        TAG,
        AtomSchema::new(Some(IdentityKind::Scalar { position: 1 }), [3, 4]),
    );
    registry
}

/// Batch with `hosts` distinct identities, each pulled `dups` times plus one
/// isolated duplicate.
fn build_batch(hosts: i64, dups: usize) -> Vec<Atom> {
    let mut batch = Vec::with_capacity(hosts as usize * (dups + 1));
    for id in 0..hosts {
        for _ in 0..dups {
            batch.push(Atom::from_values(
                TAG,
                vec![
                    Value::Int(id),
                    Value::Str("fg".to_string()),
                    Value::Int(100),
                    Value::Int(200),
                ],
            ));
        }
        batch.push(Atom::from_values(
            TAG,
            vec![
                Value::Int(90_000 + id),
                Value::Str("fg".to_string()),
                Value::Int(100),
                Value::Int(200),
            ],
        ));
    }
    batch
}

fn bench_normalize_and_merge(c: &mut Criterion) {
    let registry = registry();
    let resolver = IsolatedIdMap::new();
    for id in 0..256 {
        resolver.insert(90_000 + id, id);
    }

    c.bench_function("reconcile_256x4", |b| {
        let template = build_batch(256, 3);
        b.iter(|| {
            let mut batch = template.clone();
            normalize_and_merge(black_box(&mut batch), &registry, &resolver, TAG).unwrap();
            black_box(batch.len())
        });
    });

    c.bench_function("reconcile_no_duplicates", |b| {
        let template = build_batch(1024, 0);
        b.iter(|| {
            let mut batch = template.clone();
            normalize_and_merge(black_box(&mut batch), &registry, &resolver, TAG).unwrap();
            black_box(batch.len())
        });
    });
}

criterion_group!(benches, bench_normalize_and_merge);
criterion_main!(benches);
