// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Benchmarks for catalog merging and changelog analysis
//!
//! Run with: cargo bench

use chrono::{DateTime, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;
use takaro_modules::catalog::merge;
use takaro_modules::changelog::aggregate::aggregate;
use takaro_modules::changelog::analyze::analyze;
use takaro_modules::changelog::types::ChangelogEntry;
use takaro_modules::types::{Command, Module, ModuleSource, ModuleVersion, ModuleWithMeta, Permission};

fn module(name: &str, commands: usize) -> Module {
    Module {
        name: name.into(),
        takaro_version: "1.0.0".into(),
        versions: vec![ModuleVersion {
            tag: "latest".into(),
            commands: (0..commands)
                .map(|i| Command {
                    name: format!("cmd{i}"),
                    trigger: format!("cmd{i}"),
                    ..Default::default()
                })
                .collect(),
            permissions: (0..commands / 4)
                .map(|i| Permission {
                    permission: format!("{}.P{i}", name.to_uppercase()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }],
    }
}

fn entry(name: &str, source: ModuleSource) -> ModuleWithMeta {
    ModuleWithMeta {
        module: module(name, 4),
        source,
        path: PathBuf::from(format!("{name}.json")),
        category: None,
    }
}

/// Benchmark catalog merge with overlapping sources
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [10usize, 100, 1000] {
        let community: Vec<_> = (0..size).map(|i| entry(&format!("m{i}"), ModuleSource::Community)).collect();
        let builtin: Vec<_> = (size / 2..size + size / 2)
            .map(|i| entry(&format!("m{i}"), ModuleSource::Builtin))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(merge(community.clone(), builtin.clone())))
        });
    }

    group.finish();
}

/// Benchmark snapshot diffing
fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for size in [10usize, 100, 1000] {
        let before = module("Shop", size);
        let after = module("Shop", size + size / 10);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(analyze(Some(&before), &after, "Shop")))
        });
    }

    group.finish();
}

/// Benchmark aggregation of many entries
fn bench_aggregate(c: &mut Criterion) {
    let entries: Vec<_> = (0..2000i64)
        .map(|i| ChangelogEntry {
            module_name: format!("m{}", i % 50),
            category: "uncategorized".into(),
            date: DateTime::<Utc>::from_timestamp(i * 3600, 0).unwrap_or_default(),
            title: "Module Updated".into(),
            description: String::new(),
            commit_hash: format!("{i:08x}"),
            is_new: false,
            details: vec![],
        })
        .collect();
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    c.bench_function("aggregate_2000", |b| {
        b.iter(|| black_box(aggregate(entries.clone(), at)))
    });
}

criterion_group!(benches, bench_merge, bench_analyze, bench_aggregate);
criterion_main!(benches);
