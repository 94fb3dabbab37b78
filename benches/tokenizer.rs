use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nmrstar::tokenizer::{normalize, tokenize};
use nmrstar::{from_str_with_options, to_string, Entry, Loop, ParseOptions, TokenizerBackend};

const BACKENDS: [TokenizerBackend; 2] = [TokenizerBackend::Portable, TokenizerBackend::Accelerated];

fn shift_list(rows: usize) -> Entry {
    let mut entry = Entry::new("bench");
    let frame = entry.append_saveframe("assigned_chem_shifts").unwrap();
    frame
        .add_tag("_Assigned_chem_shift_list.Sf_category", "assigned_chemical_shifts")
        .unwrap();
    frame
        .add_tag("Details", "Shifts referenced\nagainst DSS\n")
        .unwrap();

    let mut lp = Loop::new();
    for tag in ["ID", "Comp_ID", "Atom_ID", "Val", "Details"] {
        lp.append_tag(&format!("_Atom_chem_shift.{}", tag)).unwrap();
    }
    for i in 0..rows {
        let id = i.to_string();
        let val = format!("{}.{:03}", 100 + i % 80, i % 1000);
        let details = if i % 10 == 0 { "not assigned" } else { "." };
        lp.add_row([id.as_str(), "ALA", "CA", val.as_str(), details])
            .unwrap();
    }
    frame.append_loop(lp).unwrap();
    entry
}

fn benchmark_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for size in [100, 1_000, 10_000].iter() {
        let text = normalize(&to_string(&shift_list(*size)).unwrap());
        for backend in BACKENDS {
            group.bench_with_input(BenchmarkId::new(backend.as_str(), size), &text, |b, text| {
                b.iter(|| tokenize(backend, black_box(text)))
            });
        }
    }
    group.finish();
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_entry");

    let text = to_string(&shift_list(1_000)).unwrap();
    for backend in BACKENDS {
        let options = ParseOptions::default().with_backend(backend);
        group.bench_function(backend.as_str(), |b| {
            b.iter(|| from_str_with_options(black_box(&text), &options))
        });
    }
    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let entry = shift_list(1_000);

    c.bench_function("render_entry", |b| b.iter(|| to_string(black_box(&entry))));
}

criterion_group!(benches, benchmark_tokenize, benchmark_parse, benchmark_render);
criterion_main!(benches);
