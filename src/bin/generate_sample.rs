use std::sync::Arc;

use arrow::array::{Float64Builder, Int64Array, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// One synthetic reflectance spectrum: a gently sloping baseline with
/// Gaussian absorption bands carved out of it.
fn generate_spectrum(
    wavelengths: &[f64],
    bands: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    let first = wavelengths[0];
    let last = wavelengths[wavelengths.len() - 1];
    wavelengths
        .iter()
        .map(|&wl| {
            let baseline = 0.92 - 0.05 * (wl - first) / (last - first);
            let absorption: f64 = bands
                .iter()
                .map(|&(mu, sigma, depth)| gaussian(wl, mu, sigma, depth))
                .sum();
            (baseline - absorption + rng.gauss(0.0, noise_level)).clamp(0.01, 1.0)
        })
        .collect()
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

fn main() {
    let mut rng = SimpleRng::new(42);

    // Wavelengths: 1000 → 2598 nm, step 2
    let wavelengths: Vec<f64> = (0..800).map(|i| 1000.0 + i as f64 * 2.0).collect();

    // Absorption bands per mineral: (centre nm, width nm, depth)
    let mineral_bands: Vec<(&str, Vec<(f64, f64, f64)>)> = vec![
        ("olivine", vec![(1050.0, 90.0, 0.25), (1250.0, 60.0, 0.10)]),
        ("pyroxene", vec![(1000.0, 70.0, 0.30), (2000.0, 120.0, 0.25)]),
        ("gypsum", vec![(1450.0, 40.0, 0.20), (1950.0, 50.0, 0.35), (2200.0, 45.0, 0.15)]),
    ];
    let grain_sizes = [45_i64, 125, 250];
    let spots_per_sample = 3;

    // Collect all rows
    let mut all_x: Vec<Vec<f64>> = Vec::new();
    let mut all_y: Vec<Vec<f64>> = Vec::new();
    let mut all_mineral: Vec<String> = Vec::new();
    let mut all_grain: Vec<i64> = Vec::new();
    let mut all_id: Vec<i64> = Vec::new();

    let mut row_id: i64 = 0;
    for (mineral, bands) in &mineral_bands {
        for &grain in &grain_sizes {
            // Coarser grains deepen the bands a little.
            let scale = 0.8 + 0.1 * (grain as f64).log10();
            let scaled: Vec<(f64, f64, f64)> = bands
                .iter()
                .map(|&(mu, sigma, depth)| (mu, sigma, depth * scale))
                .collect();

            for _ in 0..spots_per_sample {
                let y = generate_spectrum(&wavelengths, &scaled, 0.004, &mut rng);

                all_x.push(wavelengths.clone());
                all_y.push(y);
                all_mineral.push(mineral.to_string());
                all_grain.push(grain);
                all_id.push(row_id);
                row_id += 1;
            }
        }
    }

    // Build Arrow arrays
    let mut x_builder = ListBuilder::new(Float64Builder::new());
    for row in &all_x {
        let values = x_builder.values();
        for &v in row {
            values.append_value(v);
        }
        x_builder.append(true);
    }
    let x_array = x_builder.finish();

    let mut y_builder = ListBuilder::new(Float64Builder::new());
    for row in &all_y {
        let values = y_builder.values();
        for &v in row {
            values.append_value(v);
        }
        y_builder.append(true);
    }
    let y_array = y_builder.finish();

    let mineral_array =
        StringArray::from(all_mineral.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    let grain_array = Int64Array::from(all_grain);
    let id_array = Int64Array::from(all_id);

    let schema = Arc::new(Schema::new(vec![
        Field::new(
            "x",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
        Field::new(
            "y",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
        Field::new("mineral", DataType::Utf8, false),
        Field::new("grain_size", DataType::Int64, false),
        Field::new("measurement_id", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(x_array),
            Arc::new(y_array),
            Arc::new(mineral_array),
            Arc::new(grain_array),
            Arc::new(id_array),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_reflectance.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} spectra ({} wavelengths each) to {output_path}",
        row_id,
        wavelengths.len()
    );
}
