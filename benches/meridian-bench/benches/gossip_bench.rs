//! Gossip hot-path benchmarks: digest assembly and reconciliation.

use {
    criterion::{criterion_group, criterion_main, Criterion},
    meridian_bench::populated_table,
    meridian_gossip::{
        digest::{digest_list, GossipDigest},
        reconcile::reconcile,
    },
};

const PEERS: usize = 256;

fn bench_digest_list(c: &mut Criterion) {
    let table = populated_table(PEERS);
    let mut rng = rand::rng();
    c.bench_function("gossip/digest_list_256", |b| {
        b.iter(|| digest_list(&table, &mut rng))
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let table = populated_table(PEERS);
    // a remote view that is behind on every node: worst-case delta volume
    let behind: Vec<GossipDigest> = digest_list(&table, &mut rand::rng())
        .into_iter()
        .map(|digest| GossipDigest::new(digest.node, digest.generation, 0))
        .collect();
    // and one that matches exactly: the silent case
    let level = digest_list(&table, &mut rand::rng());

    c.bench_function("gossip/reconcile_behind_256", |b| {
        b.iter(|| reconcile(&table, &behind))
    });
    c.bench_function("gossip/reconcile_level_256", |b| {
        b.iter(|| reconcile(&table, &level))
    });
}

criterion_group!(benches, bench_digest_list, bench_reconcile);
criterion_main!(benches);
