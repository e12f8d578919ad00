use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hpx::loader::split_lines;
use hpx::script::{normalize_equality, resolve_block, BufferConsole, Interpreter};

fn counting_program(limit: u32) -> Vec<String> {
    split_lines(&format!(
        "\
store i to 0
store total to 0
repeat until i = {limit}
    store i to i + 1
    when i % 3 = 0
        store total to total + i
    or i % 5 = 0
        store total to total - 1
    complete
        store total to total + 1
print(total)
"
    ))
}

fn nested_program(depth: usize) -> Vec<String> {
    let mut src = String::new();
    for d in 0..depth {
        src.push_str(&" ".repeat(d * 4));
        src.push_str("when true\n");
    }
    src.push_str(&" ".repeat(depth * 4));
    src.push_str("print(1)\n");
    split_lines(&src)
}

fn bench_dispatch(c: &mut Criterion) {
    let small = counting_program(100);
    let large = counting_program(10_000);

    let mut g = c.benchmark_group("dispatch");
    g.bench_function("counting_loop_100", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new(BufferConsole::new());
            interp.execute(black_box(&small)).unwrap();
        })
    });
    g.bench_function("counting_loop_10k", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new(BufferConsole::new());
            interp.execute(black_box(&large)).unwrap();
        })
    });
    g.finish();
}

fn bench_resolver(c: &mut Criterion) {
    let nested = nested_program(64);
    c.bench_function("resolve_block_nested_64", |b| {
        b.iter(|| resolve_block(black_box(&nested), 0))
    });
}

fn bench_normalize(c: &mut Criterion) {
    let expr = "a = 1 and b != 2 or c <= 3 and d = 'x = y' and e >= 4";
    c.bench_function("normalize_equality", |b| {
        b.iter(|| normalize_equality(black_box(expr)))
    });
}

criterion_group!(benches, bench_dispatch, bench_resolver, bench_normalize);
criterion_main!(benches);
