//! Writes a deterministic synthetic dataset with the same layout as the
//! published cleaned CSV, plus matching region boundaries and a checksum
//! manifest, so the dashboard can be tried without the real files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde_json::json;
use sha2::{Digest, Sha256};

const REGIONS: [&str; 16] = [
    "Ahafo",
    "Ashanti",
    "Bono",
    "Bono East",
    "Central",
    "Eastern",
    "Greater Accra",
    "North East",
    "Northern",
    "Oti",
    "Savannah",
    "Upper East",
    "Upper West",
    "Volta",
    "Western",
    "Western North",
];

const CSV_NAME: &str = "ghana_infectious_disease_model_dataset_cleaned.csv";
const PARQUET_NAME: &str = "ghana_infectious_disease_model_dataset_cleaned.parquet";
const GEOJSON_NAME: &str = "geoBoundaries-GHA-ADM1_simplified.geojson";
const MANIFEST_NAME: &str = "SHA256SUMS";

const COLUMNS: [&str; 8] = [
    "hiv_incidence",
    "malaria_incidence",
    "tb_incidence",
    "education_access_index",
    "condom_use_rate",
    "urbanization_level",
    "hiv_awareness_index",
    "youth_unemployment_rate",
];

#[derive(Parser)]
#[command(about = "Generate a synthetic Ghana disease dataset")]
struct Args {
    /// Output directory
    #[arg(default_value = ".")]
    out_dir: PathBuf,

    /// First year of monthly observations
    #[arg(long, default_value_t = 2010)]
    from_year: i32,

    /// Last year of monthly observations
    #[arg(long, default_value_t = 2023)]
    to_year: i32,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One generated row.
struct Row {
    date: NaiveDate,
    region: &'static str,
    values: [f64; COLUMNS.len()],
}

fn generate_rows(from_year: i32, to_year: i32, rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for (r, &region) in REGIONS.iter().enumerate() {
        // Region-level baselines; northern regions get more malaria and less
        // urbanization.
        let north = (7..=12).contains(&r);
        let urban_base = if region == "Greater Accra" { 0.9 } else if north { 0.25 } else { 0.45 };
        let malaria_base = if north { 320.0 } else { 210.0 };
        let hiv_base = 1.0 + rng.next_f64() * 1.5;

        for year in from_year..=to_year {
            let t = (year - from_year) as f64;
            for month in 1..=12 {
                let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) else {
                    continue;
                };
                let season = (2.0 * std::f64::consts::PI * date.month0() as f64 / 12.0).sin();
                let urban = (urban_base + 0.006 * t + rng.gauss(0.0, 0.01)).clamp(0.0, 1.0);
                let education = (0.5 + 0.4 * urban + 0.01 * t + rng.gauss(0.0, 0.02)).clamp(0.0, 1.0);
                let awareness = (0.4 + 0.02 * t + rng.gauss(0.0, 0.03)).clamp(0.0, 1.0);
                let condom = (0.2 + 0.3 * awareness + rng.gauss(0.0, 0.02)).clamp(0.0, 1.0);
                let unemployment = (0.12 + 0.05 * (1.0 - urban) + rng.gauss(0.0, 0.01)).max(0.0);

                rows.push(Row {
                    date,
                    region,
                    values: [
                        (hiv_base * (1.0 - 0.6 * condom) + rng.gauss(0.0, 0.05)).max(0.0),
                        (malaria_base * (1.0 + 0.25 * season) - 4.0 * t + rng.gauss(0.0, 8.0)).max(0.0),
                        (45.0 - 1.2 * t + 10.0 * (1.0 - education) + rng.gauss(0.0, 2.0)).max(0.0),
                        education,
                        condom,
                        urban,
                        awareness,
                        unemployment,
                    ],
                });
            }
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    let mut header = vec!["date", "region"];
    header.extend(COLUMNS);
    writer.write_record(&header)?;
    for row in rows {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string(), row.region.to_string()];
        record.extend(row.values.iter().map(|v| format!("{v:.4}")));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;

    let mut fields = vec![
        Field::new("date", DataType::Date32, false),
        Field::new("region", DataType::Utf8, false),
    ];
    fields.extend(COLUMNS.iter().map(|c| Field::new(*c, DataType::Float64, true)));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(
            rows.iter()
                .map(|r| (r.date - epoch).num_days() as i32)
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(rows.iter().map(|r| r.region).collect::<Vec<_>>())),
    ];
    for i in 0..COLUMNS.len() {
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.values[i]).collect::<Vec<_>>(),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Rectangular stand-in boundaries: a 4×4 grid over Ghana's bounding box.
fn write_geojson(path: &Path) -> Result<()> {
    let (lon0, lon1, lat0, lat1) = (-3.3, 1.2, 4.7, 11.2);
    let (dx, dy) = ((lon1 - lon0) / 4.0, (lat1 - lat0) / 4.0);

    let features: Vec<_> = REGIONS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let (col, row) = ((i % 4) as f64, (i / 4) as f64);
            let (x0, y1) = (lon0 + col * dx, lat1 - row * dy);
            let (x1, y0) = (x0 + dx, y1 - dy);
            json!({
                "type": "Feature",
                "properties": { "shapeName": name },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
                }
            })
        })
        .collect();

    let collection = json!({ "type": "FeatureCollection", "features": features });
    std::fs::write(path, serde_json::to_string_pretty(&collection)?).context("writing GeoJSON")?;
    Ok(())
}

fn write_manifest(dir: &Path, files: &[&str]) -> Result<()> {
    let mut out = String::new();
    for file in files {
        let bytes = std::fs::read(dir.join(file)).with_context(|| format!("reading {file}"))?;
        writeln!(out, "{:x}  {file}", Sha256::digest(&bytes))?;
    }
    std::fs::write(dir.join(MANIFEST_NAME), out).context("writing manifest")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(args.from_year, args.to_year, &mut rng);

    write_csv(&args.out_dir.join(CSV_NAME), &rows)?;
    write_parquet(&args.out_dir.join(PARQUET_NAME), &rows)?;
    write_geojson(&args.out_dir.join(GEOJSON_NAME))?;
    write_manifest(&args.out_dir, &[CSV_NAME, PARQUET_NAME, GEOJSON_NAME])?;

    println!(
        "Wrote {} rows for {} regions to {}",
        rows.len(),
        REGIONS.len(),
        args.out_dir.display()
    );
    Ok(())
}
