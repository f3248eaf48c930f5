//! Conversion benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use novelistic_core::html::{encode_data_uri, sanitize};
use novelistic_core::{generate_epub, EpubDecoder, Episode, Novel, NovelId};

fn sample_novel(chapters: usize) -> (Novel, Vec<Episode>) {
    let mut image = b"\x89PNG\r\n\x1a\n".to_vec();
    image.extend((0..16 * 1024).map(|i| (i % 251) as u8));
    let image = encode_data_uri("image/png", &image);

    let episodes = (0..chapters)
        .map(|i| {
            let mut content = String::new();
            for p in 0..40 {
                content.push_str(&format!(
                    "<p class=\"para\">Paragraph {p} of chapter {i}, with <b>some</b> <i>markup</i>.</p>\n"
                ));
            }
            content.push_str(&format!("<p><img src=\"{image}\"></p>"));
            Episode::new(NovelId(1), format!("Chapter {}", i + 1), content, i as u32)
        })
        .collect();
    (Novel::new("Benchmark").with_author("Bench"), episodes)
}

fn conversion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("epub");
    for chapters in [1, 10, 50] {
        let (novel, episodes) = sample_novel(chapters);
        group.bench_with_input(BenchmarkId::new("export", chapters), &episodes, |b, episodes| {
            b.iter(|| generate_epub(&novel, std::hint::black_box(episodes)))
        });

        let epub = generate_epub(&novel, &episodes).expect("export");
        group.bench_with_input(BenchmarkId::new("import", chapters), &epub.data, |b, data| {
            b.iter(|| EpubDecoder::new().decode(std::hint::black_box(data)))
        });
    }
    group.finish();

    let (_, episodes) = sample_novel(1);
    c.bench_function("sanitize", |b| {
        b.iter(|| sanitize(std::hint::black_box(&episodes[0].content)))
    });
}

criterion_group!(benches, conversion_benchmark);
criterion_main!(benches);
