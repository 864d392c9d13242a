use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const COUNTRIES: [(&str, &str, f64); 24] = [
    ("Senegal", "Africa", 0.51),
    ("Nigeria", "Africa", 0.54),
    ("Kenya", "Africa", 0.58),
    ("Morocco", "Africa", 0.68),
    ("Egypt", "Africa", 0.73),
    ("South Africa", "Africa", 0.71),
    ("France", "Europe", 0.90),
    ("Germany", "Europe", 0.94),
    ("Spain", "Europe", 0.90),
    ("Poland", "Europe", 0.88),
    ("Norway", "Europe", 0.96),
    ("Italy", "Europe", 0.89),
    ("Brazil", "Americas", 0.75),
    ("Chile", "Americas", 0.85),
    ("Mexico", "Americas", 0.76),
    ("Canada", "Americas", 0.94),
    ("Peru", "Americas", 0.76),
    ("United States", "Americas", 0.92),
    ("India", "Asia", 0.63),
    ("Japan", "Asia", 0.92),
    ("Vietnam", "Asia", 0.70),
    ("Indonesia", "Asia", 0.71),
    ("United Arab Emirates", "Asia", 0.91),
    ("Australia", "Oceania", 0.95),
];

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

/// Round to two decimals, like published indicator tables.
fn r2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut country = Vec::new();
    let mut region = Vec::new();
    let mut hdi = Vec::new();
    let mut edu = Vec::new();
    let mut dropout = Vec::new();
    let mut unemployment = Vec::new();
    let mut health = Vec::new();
    let mut infant = Vec::new();
    let mut parliament = Vec::new();
    let mut survey_date = Vec::new();
    let mut updated = Vec::new();

    // 2022-01-01T00:00:00Z
    let base_ts: i64 = 1_640_995_200;

    for (i, &(name, reg, h)) in COUNTRIES.iter().enumerate() {
        // Development drives the other indicators, plus some noise.
        let gap = 1.0 - h;
        country.push(name);
        region.push(reg);
        hdi.push(h);
        edu.push(r2((3.0 + 3.0 * h + rng.gauss(0.0, 0.6)).max(1.0)));
        dropout.push(r2((45.0 * gap + rng.gauss(0.0, 3.0)).max(0.5)));
        unemployment.push(r2((4.0 + 12.0 * gap + rng.gauss(0.0, 2.0)).max(1.0)));
        health.push(r2((2.0 + 9.0 * h + rng.gauss(0.0, 1.0)).max(1.0)));
        infant.push(r2((80.0 * gap * gap + 2.0 + rng.gauss(0.0, 2.0)).max(1.5)));
        parliament.push(r2((10.0 + 35.0 * h + rng.gauss(0.0, 6.0)).clamp(3.0, 60.0)));

        let day = 1 + (i % 28);
        let month = 1 + (i % 12);
        survey_date.push(format!("2022/{month:02}/{day:02} {:02}:{:02}:00", i % 24, (i * 7) % 60));
        updated.push(base_ts + (i as i64) * 86_400 * 9);
    }

    let n_rows = country.len();
    let schema = Arc::new(Schema::new(vec![
        Field::new("country", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("HDI_XXI", DataType::Float64, false),
        Field::new("gdp_perc_education", DataType::Float64, false),
        Field::new("kids_perc_dropout", DataType::Float64, false),
        Field::new("unemployement", DataType::Float64, false),
        Field::new("gdp_perc_health", DataType::Float64, false),
        Field::new("infant_mortality", DataType::Float64, false),
        Field::new("parliament_gender_equity", DataType::Float64, false),
        Field::new("survey_date", DataType::Utf8, false),
        Field::new(
            "last_update",
            DataType::Timestamp(TimeUnit::Second, Some("+01:00".into())),
            false,
        ),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(country)),
        Arc::new(StringArray::from(region)),
        Arc::new(Float64Array::from(hdi)),
        Arc::new(Float64Array::from(edu)),
        Arc::new(Float64Array::from(dropout)),
        Arc::new(Float64Array::from(unemployment)),
        Arc::new(Float64Array::from(health)),
        Arc::new(Float64Array::from(infant)),
        Arc::new(Float64Array::from(parliament)),
        Arc::new(StringArray::from(survey_date)),
        Arc::new(TimestampSecondArray::from(updated).with_timezone("+01:00")),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    // Write Parquet
    let output_path = "sample_world.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    println!("Wrote {n_rows} countries to {output_path}");
    Ok(())
}
