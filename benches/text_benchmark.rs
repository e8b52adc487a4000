use criterion::{criterion_group, criterion_main, Criterion};
use rantboard::models::{Stance, StanceStats, StanceValue};
use rantboard::text::{extract_hashtags, extract_mentions};
use std::hint::black_box;

fn benchmark_extraction(c: &mut Criterion) {
    // A full-length rant with tags and mentions spread through it
    let mut rant = String::new();
    while rant.chars().count() < 480 {
        rant.push_str("Deploys on #friday again @oncall_team, why #devops ");
    }

    // Same length, nothing to extract
    let plain = "a".repeat(rant.len());

    let mut group = c.benchmark_group("text_extraction");

    group.bench_function("hashtags_and_mentions", |b| {
        b.iter(|| {
            (
                extract_hashtags(black_box(&rant)),
                extract_mentions(black_box(&rant)),
            )
        })
    });

    group.bench_function("plain_text", |b| {
        b.iter(|| extract_hashtags(black_box(&plain)))
    });

    group.finish();
}

fn benchmark_stance_stats(c: &mut Criterion) {
    let stances: Vec<Stance> = (0..10_000)
        .map(|i| Stance {
            user_id: format!("user{}", i),
            rant_id: "rant".to_string(),
            stance: if i % 3 == 0 {
                StanceValue::Against
            } else {
                StanceValue::Favor
            },
            created_at: None,
            updated_at: None,
        })
        .collect();

    c.bench_function("stance_stats_10k", |b| {
        b.iter(|| StanceStats::from_stances(black_box(&stances)))
    });
}

criterion_group!(benches, benchmark_extraction, benchmark_stance_stats);
criterion_main!(benches);
