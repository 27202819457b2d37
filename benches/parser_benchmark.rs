//! Parser benchmark: styled text to grid.
//!
//! Target: a full 200×50 screen of styled text in well under a frame.

use bubblegum::ansi::{parse, Parser};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// A screen of text where every word changes color and style.
fn styled_screen(width: usize, height: usize) -> String {
    let mut out = String::new();
    for y in 0..height {
        let mut col = 0;
        let mut word = 0;
        while col + 6 < width {
            let color = (y * 31 + word * 7) % 256;
            let style = if word % 3 == 0 { "1;" } else { "" };
            out.push_str(&format!("\x1b[{style}38;5;{color}mword{}\x1b[0m ", word % 10));
            col += 6;
            word += 1;
        }
        if y + 1 < height {
            out.push_str("\r\n");
        }
    }
    out
}

fn parse_plain(c: &mut Criterion) {
    let line = "The quick brown fox jumps over the lazy dog. ".repeat(4);
    let text = vec![line; 50].join("\n");

    let mut group = c.benchmark_group("parse_plain");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("200x50", |b| b.iter(|| parse(black_box(&text), 200, 50)));
    group.finish();
}

fn parse_styled(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_styled");

    for (width, height) in [(80, 24), (200, 50)] {
        let text = styled_screen(width, height);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &text,
            |b, text| b.iter(|| parse(black_box(text), width, height)),
        );
    }

    group.finish();
}

fn parse_truecolor(c: &mut Criterion) {
    let mut text = String::new();
    for i in 0..2000 {
        let (r, g, b) = (i % 256, (i * 3) % 256, (i * 7) % 256);
        text.push_str(&format!("\x1b[38;2;{r};{g};{b};48;2;{b};{g};{r}m#"));
    }

    c.bench_function("parse_truecolor_2000_cells", |b| {
        b.iter(|| parse(black_box(&text), 200, 10));
    });
}

fn parse_streamed(c: &mut Criterion) {
    let text = styled_screen(200, 50);
    let chunks: Vec<&str> = text
        .char_indices()
        .step_by(61)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect::<Vec<_>>()
        .windows(2)
        .map(|w| &text[w[0]..w[1]])
        .collect();

    c.bench_function("parse_streamed_200x50", |b| {
        b.iter(|| {
            let mut parser = Parser::new(200, 50);
            for chunk in &chunks {
                parser.feed(black_box(chunk));
            }
            parser.finish()
        });
    });
}

criterion_group!(benches, parse_plain, parse_styled, parse_truecolor, parse_streamed);
criterion_main!(benches);
