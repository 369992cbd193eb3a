//! Benchmark for json-marshal using city data.
//!
//! Builds a graph where every city points at shared state and country
//! records, so the encoder has real reference work to do. Falls back to a
//! synthetic dataset when no data file is given.

use std::collections::HashMap;
use std::fs;
use std::time::{Duration, Instant};

use json_marshal::{Date, ObjectBuilder, Options, Serializer, Value, ValueMap, ValueSet};
use serde::Deserialize;

// =============================================================================
// INPUT ROWS
// =============================================================================

/// One row of the cities dataset. State and country columns are grouped so
/// the converter can share one record per state and per country.
#[derive(Debug, Deserialize)]
struct CityRow {
    id: u32,
    name: String,
    #[serde(flatten)]
    state: StateColumns,
    #[serde(flatten)]
    country: CountryColumns,
    latitude: String,
    longitude: String,
    native: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    population: Option<i64>,
    timezone: Option<String>,
    translations: Option<HashMap<String, String>>,
    #[serde(rename = "wikiDataId")]
    wikidata: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateColumns {
    state_id: u32,
    state_code: String,
    state_name: String,
}

#[derive(Debug, Deserialize)]
struct CountryColumns {
    country_id: u32,
    country_code: String,
    country_name: String,
}

/// Deterministic stand-in for the real dataset.
fn synthetic_rows(count: u32) -> Vec<CityRow> {
    (0..count)
        .map(|id| {
            let state_id = id / 40;
            let country_id = state_id / 25;
            CityRow {
                id,
                name: format!("City {id}"),
                state: StateColumns {
                    state_id,
                    state_code: format!("S{state_id}"),
                    state_name: format!("State {state_id}"),
                },
                country: CountryColumns {
                    country_id,
                    country_code: format!("C{country_id}"),
                    country_name: format!("Country {country_id}"),
                },
                latitude: format!("{:.5}", (id % 180) as f64 - 90.0 + 0.12345),
                longitude: format!("{:.5}", (id % 360) as f64 - 180.0 + 0.54321),
                native: (id % 3 == 0).then(|| format!("Native {id}")),
                kind: (id % 5 == 0).then(|| "city".to_string()),
                population: (id % 2 == 0).then_some(i64::from(id) * 137),
                timezone: Some(format!("Zone/{}", country_id % 24)),
                translations: (id % 7 == 0).then(|| {
                    HashMap::from([
                        ("fr".to_string(), format!("Ville {id}")),
                        ("de".to_string(), format!("Stadt {id}")),
                    ])
                }),
                wikidata: (id % 4 == 0).then(|| format!("Q{}", 1000 + id)),
            }
        })
        .collect()
}

// =============================================================================
// CONVERSION TO A VALUE GRAPH
// =============================================================================

fn city_record(row: &CityRow, state: &Value) -> Value {
    let mut builder = ObjectBuilder::new()
        .field("id", row.id)
        .field("name", row.name.as_str())
        .field("state", state.clone());

    if let Some(native) = row.native.as_deref().filter(|n| !n.is_empty()) {
        builder = builder.field("native", native);
    }
    if let Some(kind) = &row.kind {
        builder = builder.field("type", kind.as_str());
    }
    if let Some(population) = row.population {
        builder = builder.field("population", population);
    }
    if let (Ok(lat), Ok(lon)) = (row.latitude.parse::<f64>(), row.longitude.parse::<f64>()) {
        builder = builder.array("location", |a| a.push(lon).push(lat));
    }
    if let Some(zone) = &row.timezone {
        builder = builder.field("timezone", zone.as_str());
    }
    if let Some(wikidata) = &row.wikidata {
        builder = builder.field("wikidata", wikidata.as_str());
    }
    if let Some(translations) = &row.translations {
        // Sorted so the synthetic graph is identical from run to run.
        let mut pairs: Vec<_> = translations.iter().collect();
        pairs.sort();
        builder = builder.object("translations", |mut t| {
            for (lang, text) in pairs {
                t = t.field(lang.as_str(), text.as_str());
            }
            t
        });
    }

    builder.build()
}

/// Builds the graph: shared state and country records plus a timezone index
/// whose sets point back at the same city records.
fn city_graph(rows: &[CityRow]) -> Value {
    let mut countries: HashMap<u32, Value> = HashMap::new();
    let mut states: HashMap<u32, Value> = HashMap::new();
    let by_timezone = ValueMap::new();
    let mut items = Vec::with_capacity(rows.len());

    for row in rows {
        let country = countries
            .entry(row.country.country_id)
            .or_insert_with(|| {
                ObjectBuilder::new()
                    .field("name", row.country.country_name.as_str())
                    .field("code", row.country.country_code.as_str())
                    .build()
            })
            .clone();

        let state = states
            .entry(row.state.state_id)
            .or_insert_with(|| {
                ObjectBuilder::new()
                    .field("name", row.state.state_name.as_str())
                    .field("code", row.state.state_code.as_str())
                    .field("country", country.clone())
                    .build()
            })
            .clone();

        let value = city_record(row, &state);

        if let Some(zone) = &row.timezone {
            let key = Value::from(zone.as_str());
            let bucket = match by_timezone.get(&key) {
                Some(bucket) => bucket,
                None => {
                    let bucket = Value::host(ValueSet::new());
                    by_timezone.set(key, bucket.clone());
                    bucket
                }
            };
            if let Some(set) = bucket.downcast_host::<ValueSet>() {
                set.add(value.clone());
            }
        }
        items.push(value);
    }

    ObjectBuilder::new()
        .field("name", "Cities Import")
        .field("created", Value::host(Date::from_millis(1_704_067_200_000.0)))
        .field("cities", Value::array(items))
        .field("byTimezone", Value::host(by_timezone))
        .build()
}

fn count_cities(value: &Value) -> usize {
    value
        .as_object()
        .and_then(|r| r.get("cities"))
        .and_then(|c| c.as_array().map(|a| a.len()))
        .unwrap_or(0)
}

fn megabytes(len: usize) -> f64 {
    len as f64 / 1_000_000.0
}

/// Prints one timed pass over `len` bytes of JSON text.
fn report(label: &str, len: usize, elapsed: Duration) {
    println!("\n{label}: {len} bytes in {elapsed:?}");
    println!("  {:.2} MB/s", megabytes(len) / elapsed.as_secs_f64());
}

/// Runs `pass` once to warm up, then `runs` times, and returns the last
/// result with the mean time per run.
fn timed<T>(runs: u32, mut pass: impl FnMut() -> T) -> (T, Duration) {
    let mut last = pass();
    let start = Instant::now();
    for _ in 0..runs {
        last = pass();
    }
    (last, start.elapsed() / runs)
}

fn main() {
    let rows: Vec<CityRow> = match std::env::args().nth(1) {
        Some(path) => {
            println!("Reading rows from {path}");
            let text = fs::read_to_string(&path).expect("Failed to read data file");
            serde_json::from_str(&text).expect("Failed to parse data file")
        }
        None => {
            println!("No data file given, generating rows");
            synthetic_rows(50_000)
        }
    };

    let start = Instant::now();
    let graph = city_graph(&rows);
    println!("{} rows -> value graph in {:?}", rows.len(), start.elapsed());

    let insertion = Serializer::new(Options::with_builtin_adapters()).expect("Invalid options");
    let stable = Serializer::new(Options::with_builtin_adapters().stable(true)).expect("Invalid options");
    const RUNS: u32 = 10;

    let (text, dehydrate_time) = timed(RUNS, || insertion.serialize(&graph).expect("dehydrate"));
    report("Dehydrate", text.len(), dehydrate_time);

    let (stable_text, stable_time) = timed(RUNS, || stable.serialize(&graph).expect("dehydrate stable"));
    report("Dehydrate (stable)", stable_text.len(), stable_time);
    println!(
        "  cost of sorting: {:.1}x",
        stable_time.as_secs_f64() / dehydrate_time.as_secs_f64()
    );
    assert_eq!(
        stable.serialize(&graph).expect("dehydrate stable"),
        stable_text,
        "stable output changed between runs"
    );

    let (hydrated, hydrate_time) = timed(RUNS, || insertion.deserialize(&text).expect("hydrate"));
    report("Hydrate", text.len(), hydrate_time);
    assert_eq!(count_cities(&hydrated), rows.len());
    assert_eq!(
        insertion.serialize(&hydrated).expect("dehydrate hydrated graph"),
        text,
        "hydrated graph dehydrates to different text"
    );

    // Parsing alone, with no reference resolution or adapters.
    let (_, parse_time) = timed(RUNS, || {
        serde_json::from_str::<serde_json::Value>(&text).expect("parse")
    });
    report("serde_json parse only", text.len(), parse_time);
    println!(
        "  hydrate / parse: {:.1}x",
        hydrate_time.as_secs_f64() / parse_time.as_secs_f64()
    );

    println!(
        "\n{} cities, {:.1} MB insertion order, {:.1} MB stable",
        rows.len(),
        megabytes(text.len()),
        megabytes(stable_text.len())
    );
}
