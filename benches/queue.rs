// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use fieldmark::export::markers_csv;
use fieldmark::store::{LocalStorage, PendingQueue};

mod fixtures;

use fixtures::{Case, TempDir};

// Benchmark identity (keep stable):
// - Group names in this file: `store.pending_persist`, `store.pending_load`,
//   `export.markers_csv`
// - Case IDs (the string after the `/`) must remain stable across refactors.
fn benches_queue(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("store.pending_persist");
        for case in Case::ALL {
            let markers = fixtures::markers(case);
            group.bench_function(case.id(), move |b| {
                b.iter_batched_ref(
                    || TempDir::new("pending_persist"),
                    |tmp| {
                        let queue = PendingQueue::new(LocalStorage::new(tmp.path()));
                        queue.try_persist(black_box(&markers)).expect("persist queue");
                    },
                    BatchSize::SmallInput,
                )
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("store.pending_load");
        for case in Case::ALL {
            let tmp = TempDir::new("pending_load");
            let queue = PendingQueue::new(LocalStorage::new(tmp.path()));
            queue.try_persist(&fixtures::markers(case)).expect("persist queue");
            group.bench_function(case.id(), move |b| {
                let _keep = &tmp;
                b.iter(|| black_box(queue.load().len()))
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("export.markers_csv");
        for case in Case::ALL {
            let markers = fixtures::markers(case);
            group.bench_function(case.id(), move |b| {
                b.iter(|| black_box(markers_csv(black_box(&markers)).map(|csv| csv.len())))
            });
        }
        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = fixtures::criterion();
    targets = benches_queue
}
criterion_main!(benches);
