use criterion::{Criterion, criterion_group, criterion_main};
use dyncdn_lib::{Context, DomainRegistry, RewriteContext, RewriteEngine, srcset};
use std::hint::black_box;

/// A large page with a mix of uploads, theme assets and foreign links
fn document() -> String {
    let snippet = r#"
        <img src="http://localhost/wp-content/uploads/2016/06/puppy-{i}.jpg" />
        <link rel="stylesheet" href="/wp-content/themes/site/style.css?ver={i}">
        <script src='//localhost/wp-includes/js/jquery.js'></script>
        <a href="https://example.com/page-{i}.html">Elsewhere</a>
        <img src=\"\/wp-content\/uploads\/escaped-{i}.png\" \/>
        <p>Some text without any references at all.</p>
    "#;
    (0..2000)
        .map(|i| snippet.replace("{i}", &i.to_string()))
        .collect()
}

fn registry() -> DomainRegistry {
    let registry = DomainRegistry::new("localhost");
    registry.extend(["cdn1.com", "cdn2.com", "cdn3.com"], Context::Uploads);
    registry.extend(["https://static.cdn.com"], Context::Assets);
    registry
}

fn benchmark_rewrite(c: &mut Criterion) {
    let input = document();
    let registry = registry();
    let context = RewriteContext::new("localhost");
    let engine = RewriteEngine::default();

    c.bench_function("rewrite_all on a large document", |b| {
        b.iter(|| engine.rewrite_all(black_box(&input), &registry, &context))
    });

    c.bench_function("rewrite_uploads_only on a large document", |b| {
        b.iter(|| engine.rewrite_uploads_only(black_box(&input), &registry, &context))
    });

    let empty = DomainRegistry::new("localhost");
    c.bench_function("rewrite_all with empty pools", |b| {
        b.iter(|| engine.rewrite_all(black_box(&input), &empty, &context))
    });
}

fn benchmark_srcset(c: &mut Criterion) {
    let registry = registry();
    let context = RewriteContext::new("localhost");
    let engine = RewriteEngine::default();
    let srcset = (1..=8)
        .map(|i| format!("http://localhost/wp-content/uploads/image-{i}.jpg {}w", i * 320))
        .collect::<Vec<_>>()
        .join(", ");

    c.bench_function("srcset::parse", |b| b.iter(|| srcset::parse(black_box(&srcset))));

    c.bench_function("rewrite_srcset_attr", |b| {
        b.iter(|| engine.rewrite_srcset_attr(black_box(&srcset), &registry, &context))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_rewrite, benchmark_srcset
);
criterion_main!(benches);
