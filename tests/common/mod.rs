use abtest_stats::{Column, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded normal draws (Box-Muller), so test fixtures are reproducible.
#[allow(dead_code)]
pub fn normal_sample(seed: u64, n: usize, mean: f64, std: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mean + std * z
        })
        .collect()
}

#[allow(dead_code)]
pub fn bernoulli_sample(seed: u64, n: usize, rate: f64) -> Vec<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_bool(rate)).collect()
}

/// Stack control rows then treatment rows into one table with a boolean
/// `group` column.
#[allow(dead_code)]
pub fn ab_table(metric: &str, control: Vec<f64>, treatment: Vec<f64>) -> Table {
    let group: Vec<bool> = std::iter::repeat(false)
        .take(control.len())
        .chain(std::iter::repeat(true).take(treatment.len()))
        .collect();
    let mut values = control;
    values.extend(treatment);
    Table::from_columns(vec![
        (metric, Column::Float(values)),
        ("group", Column::Bool(group)),
    ])
    .unwrap()
}

#[allow(dead_code)]
pub fn assert_close(actual: f64, expected: f64, tol: f64, what: &str) {
    assert!(
        (actual - expected).abs() < tol,
        "{}: expected {} got {} (tol {})",
        what,
        expected,
        actual,
        tol
    );
}
