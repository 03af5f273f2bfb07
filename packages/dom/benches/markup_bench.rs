use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quire_dom::{parse_document, parse_fragment, to_html, SerializeOptions};

fn parse_head(c: &mut Criterion) {
    let source = r#"
        <head>
            <meta charset="utf-8">
            <meta name="generator" content="quire@0.1.0">
            <title>Explorable</title>
            <link rel="stylesheet" href="theme.css">
            <style data-ww-theme="base" blocking="render">body { margin: 0 }</style>
            <noscript><meta http-equiv="refresh" content="0; url=nojs.html"></noscript>
        </head>
    "#;

    c.bench_function("parse_head", |b| b.iter(|| parse_fragment(black_box(source))));
}

fn parse_large_document(c: &mut Criterion) {
    let mut body = String::new();
    for i in 0..200 {
        body.push_str(&format!(
            r#"<section id="s{i}"><h2>Section {i}</h2><!--id☛c-{i}♦--><p>Some <em>text</em> &amp; <a href="/x/{i}">a link</a></p><!--id☛c-{i}♦♦--><ul><li>one<li>two</ul></section>"#
        ));
    }
    let source = format!("<!DOCTYPE html><html><head><title>Large</title></head><body>{body}</body></html>");

    c.bench_function("parse_large_document", |b| {
        b.iter(|| parse_document(black_box(&source)))
    });
}

fn serialize_large_document(c: &mut Criterion) {
    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!(r#"<div class="row"><p data-n="{i}">a &lt; b</p><br></div>"#));
    }
    let nodes = parse_fragment(&source).unwrap();
    let options = SerializeOptions::default();

    c.bench_function("serialize_large_document", |b| {
        b.iter(|| to_html(black_box(&nodes), &options))
    });
}

criterion_group!(benches, parse_head, parse_large_document, serialize_large_document);
criterion_main!(benches);
