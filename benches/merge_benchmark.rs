use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use irish_weather::models::{ObservationRow, Resolution};
use irish_weather::processors::data_merger::{apply_retention, merge_rows, RetentionPolicy};
use irish_weather::readers::ObservationReader;

// Daily rows for `station_count` stations over `days` days
fn create_daily_rows(station_count: u32, days: i64, first: NaiveDate) -> Vec<ObservationRow> {
    let rain = Resolution::Daily.field_index("rain").unwrap();
    let mut rows = Vec::with_capacity(station_count as usize * days as usize);

    for station_id in 1..=station_count {
        for day in 0..days {
            let ts = (first + chrono::Duration::days(day))
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let mut row = ObservationRow::empty(Resolution::Daily, station_id, ts);
            row.values[rain] = Some((day % 17) as f64 * 0.3);
            rows.push(row);
        }
    }

    rows
}

fn create_daily_table(days: i64) -> String {
    let mut table = String::from(
        "Station Name: BENCH\nStation Height: 10 M\n\ndate,ind,maxtp,ind,mintp,igmin,gmin,ind,rain\n",
    );
    let first = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
    for day in 0..days {
        let date = first + chrono::Duration::days(day);
        table.push_str(&format!(
            "{},0,{:.1},0,{:.1},0,{:.1},0,{:.1}\n",
            date.format("%d-%b-%Y"),
            10.0 + (day % 9) as f64,
            2.0 + (day % 5) as f64,
            (day % 3) as f64,
            (day % 11) as f64 * 0.2
        ));
    }
    table
}

fn benchmark_merge_rows(c: &mut Criterion) {
    let existing = create_daily_rows(50, 365, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    let new_rows = create_daily_rows(50, 60, NaiveDate::from_ymd_opt(2022, 12, 1).unwrap());

    c.bench_function("merge_rows", |b| {
        b.iter(|| {
            let (rows, added, updated) = merge_rows(existing.clone(), new_rows.clone());
            black_box((rows.len(), added, updated))
        })
    });
}

fn benchmark_retention(c: &mut Criterion) {
    let rows = create_daily_rows(50, 365, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    let policy = RetentionPolicy::new(Some(10_000), NaiveDate::from_ymd_opt(2022, 9, 1).unwrap());

    c.bench_function("apply_retention", |b| {
        b.iter(|| {
            let mut rows = rows.clone();
            black_box(apply_retention(&mut rows, &policy))
        })
    });
}

fn benchmark_parse_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_daily_table");
    let reader = ObservationReader::new(Resolution::Daily);

    for &days in &[365_i64, 3650, 18250] {
        let table = create_daily_table(days);
        group.bench_with_input(BenchmarkId::new("days", days), &table, |b, table| {
            b.iter(|| black_box(reader.parse_table(table, 1).map(|rows| rows.len()).unwrap_or(0)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_merge_rows,
    benchmark_retention,
    benchmark_parse_by_size
);
criterion_main!(benches);
