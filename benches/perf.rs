use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use club_fixtures::extract::{BlockText, extract_text_block};
use club_fixtures::locate::extract_season_document;
use club_fixtures::normalize::find_date_parts;
use club_fixtures::schema::assemble;
use club_fixtures::season::SeasonContext;

const SEASON_PAGE: &str = include_str!("../tests/fixtures/season_2023_24.html");
const TABLE_PAGE: &str = include_str!("../tests/fixtures/season_2018_19_table.html");
const EMBEDDED_PAGE: &str = include_str!("../tests/fixtures/season_2024_25_embedded.html");

fn ctx() -> SeasonContext {
    SeasonContext::new("87216", "2023/24 season", "Banks o' Dee")
}

/// A long results page built from repeated date groups.
fn large_page(groups: usize) -> String {
    let mut html = String::from("<html><body><div class=\"results-list\">");
    for i in 0..groups {
        let day = i % 28 + 1;
        html.push_str(&format!(
            "<div class=\"date-group\"><div class=\"date-header\">Sat, {day:02} Sep</div>\
             <div class=\"fixture-item\"><span class=\"comp\">Highland League</span>\
             <span class=\"teams\">Banks o' Dee {} - {} Team {i}</span>\
             <span class=\"ground\">Venue: Spain Park</span></div></div>",
            i % 5,
            i % 3
        ));
    }
    html.push_str("</div></body></html>");
    html
}

fn bench_container_page(c: &mut Criterion) {
    let ctx = ctx();
    c.bench_function("container_page_extract", |b| {
        b.iter(|| {
            let outcome = extract_season_document(black_box(SEASON_PAGE), &ctx);
            black_box(outcome.into_fixtures().len());
        })
    });
}

fn bench_table_page(c: &mut Criterion) {
    let ctx = SeasonContext::new("58857", "2018/2019 Season", "Banks o' Dee");
    c.bench_function("table_page_extract", |b| {
        b.iter(|| {
            let outcome = extract_season_document(black_box(TABLE_PAGE), &ctx);
            black_box(outcome.into_fixtures().len());
        })
    });
}

fn bench_embedded_json_page(c: &mut Criterion) {
    let ctx = ctx();
    c.bench_function("embedded_json_extract", |b| {
        b.iter(|| {
            let outcome = extract_season_document(black_box(EMBEDDED_PAGE), &ctx);
            black_box(outcome.into_fixtures().len());
        })
    });
}

fn bench_large_page(c: &mut Criterion) {
    let ctx = ctx();
    let page = large_page(400);
    c.bench_function("large_page_extract", |b| {
        b.iter(|| {
            let outcome = extract_season_document(black_box(&page), &ctx);
            black_box(outcome.into_fixtures().len());
        })
    });
}

fn bench_text_block(c: &mut Criterion) {
    let ctx = ctx();
    let block = BlockText::from_fragments([
        "Sat, 02 Sep",
        "Highland League",
        "Banks o' Dee",
        "3 - 1",
        "Deveronvale",
        "Venue: Spain Park",
    ]);
    c.bench_function("text_block_extract", |b| {
        b.iter(|| {
            let fixture = extract_text_block(black_box(&block), None, &ctx).unwrap();
            black_box(fixture.is_some());
        })
    });
}

fn bench_date_scan(c: &mut Criterion) {
    let text = "Results Sun, 02 Sep KO 15:00 then Sat 9th Mar and Sep 23 ".repeat(50);
    c.bench_function("date_scan", |b| {
        b.iter(|| {
            black_box(find_date_parts(black_box(&text)).len());
        })
    });
}

fn bench_schema_fold(c: &mut Criterion) {
    let ctx = ctx();
    let fixtures = extract_season_document(&large_page(400), &ctx).into_fixtures();
    c.bench_function("schema_fold", |b| {
        b.iter(|| {
            let schema = assemble(black_box(&fixtures));
            black_box(schema.teams.len());
        })
    });
}

criterion_group!(
    perf,
    bench_container_page,
    bench_table_page,
    bench_embedded_json_page,
    bench_large_page,
    bench_text_block,
    bench_date_scan,
    bench_schema_fold
);
criterion_main!(perf);
