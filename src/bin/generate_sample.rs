use std::sync::Arc;

use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let n_rows = 300;

    let lines = ["Line_A", "Line_B", "Line_C"];
    let operators = ["Alice", "Bob", "Carol", "Dan"];

    let mut temperature = Vec::with_capacity(n_rows);
    let mut pressure = Vec::with_capacity(n_rows);
    let mut yield_pct = Vec::with_capacity(n_rows);
    let mut batch_size = Vec::with_capacity(n_rows);
    let mut line = Vec::with_capacity(n_rows);
    let mut operator = Vec::with_capacity(n_rows);
    let mut passed = Vec::with_capacity(n_rows);

    for _ in 0..n_rows {
        let l = rng.pick(&lines);
        // Each line runs a little hotter than the previous one.
        let offset = match l {
            "Line_A" => 0.0,
            "Line_B" => 8.0,
            _ => 16.0,
        };
        let t = rng.gauss(180.0 + offset, 6.0);
        let p = rng.gauss(2.0 + t / 200.0, 0.15);
        let y = (95.0 - (t - 188.0).abs() * 0.8 + rng.gauss(0.0, 2.0)).min(100.0);
        let size = 50 + (rng.next_u64() % 450) as i64;

        temperature.push(t);
        pressure.push(p);
        yield_pct.push(y);
        batch_size.push(size);
        line.push(l);
        operator.push(rng.pick(&operators));
        passed.push(y > 85.0);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("temperature", DataType::Float64, false),
        Field::new("pressure", DataType::Float64, false),
        Field::new("yield_pct", DataType::Float64, false),
        Field::new("batch_size", DataType::Int64, false),
        Field::new("line", DataType::Utf8, false),
        Field::new("operator", DataType::Utf8, false),
        Field::new("passed", DataType::Boolean, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(temperature)),
            Arc::new(Float64Array::from(pressure)),
            Arc::new(Float64Array::from(yield_pct)),
            Arc::new(Int64Array::from(batch_size)),
            Arc::new(StringArray::from(line)),
            Arc::new(StringArray::from(operator)),
            Arc::new(BooleanArray::from(passed)),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!("Wrote {n_rows} rows to {output_path}");
}
