use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Heavy-tailed sales figure in millions: most titles sell little.
    fn sales(&mut self) -> f64 {
        let u = self.next_f64().max(1e-6);
        (0.01 / u.powf(0.9)).min(40.0)
    }
}

/// One generated row; `None` fields are written as blanks / nulls.
struct Row {
    name: String,
    platform: Option<&'static str>,
    year: Option<i64>,
    genre: &'static str,
    publisher: Option<&'static str>,
    na: f64,
    eu: f64,
    jp: f64,
    other: f64,
}

impl Row {
    fn total(&self) -> f64 {
        round2(self.na + self.eu + self.jp + self.other)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// (platform, first year, last year)
const PLATFORMS: [(&str, i64, i64); 10] = [
    ("NES", 1983, 1994),
    ("SNES", 1990, 1999),
    ("N64", 1996, 2002),
    ("PS", 1994, 2003),
    ("PS2", 2000, 2011),
    ("XB", 2001, 2008),
    ("GBA", 2001, 2008),
    ("DS", 2004, 2014),
    ("Wii", 2006, 2015),
    ("PS3", 2006, 2016),
];
const GENRES: [&str; 8] = [
    "Action", "Sports", "Shooter", "Role-Playing", "Platform", "Racing", "Puzzle", "Misc",
];
const PUBLISHERS: [&str; 8] = [
    "Nintendo",
    "Electronic Arts",
    "Activision",
    "Sony Computer Entertainment",
    "Ubisoft",
    "Take-Two Interactive",
    "THQ",
    "Konami Digital Entertainment",
];
const WORDS: [&str; 12] = [
    "Legend", "Super", "Racer", "Quest", "Galaxy", "Strike", "Kingdom", "Party", "Dragon",
    "Turbo", "Shadow", "World",
];

fn generate(rng: &mut SimpleRng, n: usize) -> Vec<Row> {
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let (platform, first, last) = PLATFORMS[(rng.next_u64() % PLATFORMS.len() as u64) as usize];
        let year = first + (rng.next_u64() % (last - first + 1) as u64) as i64;
        let total = rng.sales();
        let jp_bias = if rng.next_f64() < 0.2 { 0.6 } else { 0.1 };
        let na = round2(total * (0.5 - jp_bias / 2.0));
        let jp = round2(total * jp_bias);
        let eu = round2(total * 0.3);
        let other = round2((total - na - jp - eu).max(0.0));

        let mut row = Row {
            name: format!("{} {} {}", rng.pick(&WORDS), rng.pick(&WORDS), i % 97),
            platform: Some(platform),
            year: Some(year),
            genre: rng.pick(&GENRES),
            publisher: Some(rng.pick(&PUBLISHERS)),
            na,
            eu,
            jp,
            other,
        };
        // A few incomplete rows, like the published dataset.
        match i % 150 {
            7 => row.year = None,
            61 => row.publisher = None,
            113 => row.platform = None,
            _ => {}
        }
        rows.push(row);
    }
    rows
}

fn write_csv(rows: &[Row], path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "Rank", "Name", "Platform", "Year", "Genre", "Publisher", "NA_Sales", "EU_Sales",
        "JP_Sales", "Other_Sales", "Total_Sales",
    ])?;
    for (rank, row) in rows.iter().enumerate() {
        writer.write_record([
            (rank + 1).to_string(),
            row.name.clone(),
            row.platform.unwrap_or("").to_string(),
            row.year.map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string()),
            row.genre.to_string(),
            row.publisher.unwrap_or("").to_string(),
            format!("{:.2}", row.na),
            format!("{:.2}", row.eu),
            format!("{:.2}", row.jp),
            format!("{:.2}", row.other),
            format!("{:.2}", row.total()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let text = |f: &dyn Fn(&Row) -> Option<String>| -> StringArray {
        rows.iter().map(f).collect()
    };
    let float = |f: &dyn Fn(&Row) -> f64| -> Float64Array { rows.iter().map(f).collect::<Vec<_>>().into() };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Name", DataType::Utf8, false),
        Field::new("Platform", DataType::Utf8, true),
        Field::new("Year", DataType::Int64, true),
        Field::new("Genre", DataType::Utf8, false),
        Field::new("Publisher", DataType::Utf8, true),
        Field::new("NA_Sales", DataType::Float64, false),
        Field::new("EU_Sales", DataType::Float64, false),
        Field::new("JP_Sales", DataType::Float64, false),
        Field::new("Other_Sales", DataType::Float64, false),
        Field::new("Total_Sales", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text(&|r| Some(r.name.clone()))),
            Arc::new(text(&|r| r.platform.map(str::to_string))),
            Arc::new(rows.iter().map(|r| r.year).collect::<Int64Array>()),
            Arc::new(text(&|r| Some(r.genre.to_string()))),
            Arc::new(text(&|r| r.publisher.map(str::to_string))),
            Arc::new(float(&|r| r.na)),
            Arc::new(float(&|r| r.eu)),
            Arc::new(float(&|r| r.jp)),
            Arc::new(float(&|r| r.other)),
            Arc::new(float(&|r| r.total())),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng, 3000);

    write_csv(&rows, "vgsales_sample.csv")?;
    write_parquet(&rows, "vgsales_sample.parquet")?;

    println!(
        "Wrote {} rows ({} incomplete) to vgsales_sample.csv and vgsales_sample.parquet",
        rows.len(),
        rows.iter()
            .filter(|r| r.year.is_none() || r.publisher.is_none() || r.platform.is_none())
            .count()
    );
    Ok(())
}
