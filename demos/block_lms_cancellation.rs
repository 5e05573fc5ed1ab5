use blockdsp::adaptive::{BlockLmsConfig, BlockLmsFilter};
use blockdsp::common::SampleSliceExt;
use blockdsp::Filter;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    const SAMPLE_RATE: usize = 22050;
    const DURATION_SECONDS: usize = 5;
    const CHUNK_SIZE: usize = 512;

    // Using notation from https://en.wikipedia.org/wiki/Least_mean_squares_filter

    // x, the reference signal we want to remove from d
    let mut rng = StdRng::seed_from_u64(1);
    let sample_count = SAMPLE_RATE * DURATION_SECONDS;
    let x: Vec<f32> = (0..sample_count)
        .map(|_| rng.gen_range(-0.5..=0.5))
        .collect();
    // y, the version of x present in d, here x through a short echo path
    let echo_path: [f32; 8] = [0.0, 0.6, 0.0, -0.3, 0.15, 0.0, 0.0, 0.05];
    let y: Vec<f32> = (0..sample_count)
        .map(|n| {
            echo_path
                .iter()
                .enumerate()
                .filter(|(k, _)| *k <= n)
                .map(|(k, h)| h * x[n - k])
                .sum()
        })
        .collect();
    // v, the interference, i.e a signal added to y to form d
    let v: Vec<f32> = (0..sample_count)
        .map(|n| 0.05 * (2.0 * std::f32::consts::PI * 440.0 * n as f32 / SAMPLE_RATE as f32).sin())
        .collect();
    // d, the signal to remove y from, the sum of v and y
    let d: Vec<f32> = v.iter().zip(y.iter()).map(|(v, y)| *v + *y).collect();

    let config = BlockLmsConfig {
        size: 32,
        memory: 0.999_99,
        mu: 0.01,
        learning: true,
    };
    println!(
        "Filtering (μ={}, memory={}, size={})",
        config.mu, config.memory, config.size
    );
    println!("");

    let mut filter = BlockLmsFilter::<f32>::from_config(&config).unwrap();
    let mut prediction = vec![0.0; sample_count];
    for ((x, d), prediction) in x
        .chunks(CHUNK_SIZE)
        .zip(d.chunks(CHUNK_SIZE))
        .zip(prediction.chunks_mut(CHUNK_SIZE))
    {
        filter.process(&[x, d], &mut [prediction]);
    }

    // e, the signal formed by subtracting the (one block late) estimate of y from d
    let e: Vec<f32> = d
        .iter()
        .zip(prediction[config.size..].iter())
        .map(|(d, y)| *d - *y)
        .collect();

    for (second, (e, d)) in e
        .chunks(SAMPLE_RATE)
        .zip(d.chunks(SAMPLE_RATE))
        .enumerate()
    {
        println!(
            "{}s: d(n) {:.1} dB, e(n) {:.1} dB",
            second,
            d.rms_level_db(),
            e.rms_level_db()
        );
    }
    println!("");
    println!("v(n) {:.1} dB", v.rms_level_db());
    println!("Estimated echo path {:.3?}", filter.impulse_response());
}
