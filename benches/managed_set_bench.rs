use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pkgaudit::manifest::ManagedSet;
use std::hint::black_box;

/// `rpm -qlav` style lines: `packages` packages with `files` files each
fn synthetic_listing(packages: usize, files: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(packages * (files + 2));
    for p in 0..packages {
        lines.push(format!(
            "drwxr-xr-x    2 root    root        0 Jan  1 00:00 /usr/share/pkg{p}"
        ));
        for f in 0..files {
            lines.push(format!(
                "-rw-r--r--    1 root    root     1024 Jan  1 00:00 /usr/share/pkg{p}/data/file{f}.dat"
            ));
        }
        lines.push(format!(
            "lrwxrwxrwx    1 root    root       20 Jan  1 00:00 /usr/lib/pkg{p} -> /usr/share/pkg{p}"
        ));
    }
    lines
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("managed_set_build");

    for packages in &[10, 100, 1000] {
        let lines = synthetic_listing(*packages, 50);
        group.bench_with_input(BenchmarkId::from_parameter(packages), &lines, |b, lines| {
            b.iter(|| ManagedSet::from_listing(black_box(lines)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let set = ManagedSet::from_listing(&synthetic_listing(1000, 50)).unwrap();

    c.bench_function("has_managed_descendant_hit", |b| {
        b.iter(|| set.has_managed_descendant(black_box("/usr/share/pkg500")));
    });

    c.bench_function("has_managed_descendant_sibling_prefix", |b| {
        b.iter(|| set.has_managed_descendant(black_box("/usr/share/pkg5000")));
    });

    c.bench_function("is_managed_dir", |b| {
        b.iter(|| set.is_managed_dir(black_box("/usr/share/pkg999/data")));
    });
}

criterion_group!(benches, benchmark_build, benchmark_lookup);
criterion_main!(benches);
