use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgframe::{DataFrame, InjectionGuard, SqlWriter, Value};

/// A frame with `n` rows: id, name, price.
fn build_frame(n: usize) -> DataFrame {
    let rows = (0..n)
        .map(|i| {
            vec![
                Value::Int(i as i64),
                Value::Text(format!("car {i}")),
                Value::Float(1000.0 + i as f64),
            ]
        })
        .collect();
    DataFrame::from_rows(&["id", "name", "price"], rows).unwrap()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_writer/insert");
    let writer = SqlWriter::new();

    for n in [1, 10, 100, 1000] {
        let frame = build_frame(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &frame, |b, frame| {
            b.iter(|| black_box(writer.insert_statement("t", frame, false).unwrap()));
        });
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_writer/update");
    let writer = SqlWriter::new();

    for n in [1, 10, 100, 1000] {
        let frame = build_frame(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &frame, |b, frame| {
            b.iter(|| black_box(writer.update_statement("t", frame, &["id"]).unwrap()));
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_writer/delete_in_list");
    let writer = SqlWriter::new();

    for n in [10, 100, 1000] {
        let frame = build_frame(n).select(&["id"]).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &frame, |b, frame| {
            b.iter(|| black_box(writer.delete_statement("t", frame).unwrap()));
        });
    }

    group.finish();
}

fn bench_guard(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_writer/guard");
    let guard = InjectionGuard::default();

    for len in [16, 256, 4096] {
        let text = "a b c ' d ".repeat(len / 10);
        group.bench_with_input(BenchmarkId::from_parameter(len), &text, |b, text| {
            b.iter(|| black_box(guard.check_str(text, "col").is_ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_update, bench_delete, bench_guard);
criterion_main!(benches);
