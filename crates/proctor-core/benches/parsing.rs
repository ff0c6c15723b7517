use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use proctor_core::parser::{parse_exam_str, validate_exam};

fn bench_toml_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_exam");

    for n in [10, 100] {
        let toml = generate_exam_toml(n);
        group.bench_function(format!("{n}_questions"), |b| {
            b.iter(|| parse_exam_str(black_box(&toml), black_box(Path::new("bench.toml"))))
        });
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let toml = generate_exam_toml(100);
    let Ok(exam) = parse_exam_str(&toml, Path::new("bench.toml")) else {
        return;
    };
    c.bench_function("validate_exam/100_questions", |b| {
        b.iter(|| validate_exam(black_box(&exam)))
    });
}

fn generate_exam_toml(n: usize) -> String {
    let mut s = format!(
        r#"[exam]
id = "bench"
name = "Benchmark"
duration = 3600
total_marks = {}
passing_marks = 10
"#,
        n * 4
    );
    for i in 0..n {
        s.push_str(&format!(
            r#"
[[questions]]
id = "q_{i}"
name = "Question {i}"
correct_option = "B"
explanation = "Because {i}."

[questions.options]
A = "first"
B = "second"
C = "third"
D = "fourth"
"#
        ));
    }
    s
}

criterion_group!(benches, bench_toml_parsing, bench_validation);
criterion_main!(benches);
