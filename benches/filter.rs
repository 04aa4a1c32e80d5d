// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fieldmark::query::{apply_filters, filters_to_query, parse_filters};

mod fixtures;

use fixtures::Case;

// Benchmark identity (keep stable):
// - Group names in this file: `query.parse_filters`, `query.filter_markers`,
//   `query.filter_drawings`
// - Case IDs (the string after the `/`) must remain stable across refactors so
//   results stay comparable over time (e.g. `small`, `medium`, `large`).
fn benches_filter(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("query.parse_filters");
        for (case_id, query) in [
            ("single", "state.eq(done)"),
            ("mixed", "state.eq(marked);tags.overlaps(green,fence);tags.contains(north)"),
        ] {
            let roundtrip = filters_to_query(&parse_filters(query));
            group.bench_function(case_id, move |b| {
                b.iter(|| black_box(parse_filters(black_box(&roundtrip))))
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("query.filter_markers");
        let filters = parse_filters("state.eq(done);name.eq(marker 42)");
        for case in Case::ALL {
            let markers = fixtures::markers(case);
            group.throughput(Throughput::Elements(markers.len() as u64));
            let filters = filters.clone();
            group.bench_function(case.id(), move |b| {
                b.iter(|| black_box(apply_filters(black_box(&markers), &filters).len()))
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("query.filter_drawings");
        let filters = parse_filters("tags.contains(green);tags.overlaps(north,fence)");
        for case in Case::ALL {
            let drawings = fixtures::drawings(case);
            group.throughput(Throughput::Elements(drawings.len() as u64));
            let filters = filters.clone();
            group.bench_function(case.id(), move |b| {
                b.iter(|| black_box(apply_filters(black_box(&drawings), &filters).len()))
            });
        }
        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = fixtures::criterion();
    targets = benches_filter
}
criterion_main!(benches);
