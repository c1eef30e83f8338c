use arnold_cat_map::{
    detect_period, detect_periods, generate, CatMapSession, PixelGrid, Rgba, TransformMatrix,
    TransformPlan,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("# Performance Benchmark Results\n");

    benchmark_period_detection();
    benchmark_step_throughput();
    benchmark_sequence();
    benchmark_batch_periods();

    println!("\nBenchmark complete.");
}

/// Cells are pairwise distinct up to 256x256, so the grid period equals the
/// matrix order mod N.
fn coordinate_grid(side: usize) -> PixelGrid {
    match PixelGrid::from_fn(side, |x, y| {
        Rgba::new((x % 256) as u8, (y % 256) as u8, ((x / 256) * 16 + y / 256) as u8, 255)
    }) {
        Ok(grid) => grid,
        Err(e) => panic!("failed to build {}x{} grid: {}", side, side, e),
    }
}

fn benchmark_period_detection() {
    println!("### Period Detection Scalability\n");
    println!("| Side | Period | Time (ms) |");
    println!("|------|--------|-----------|");

    for side in [16, 32, 64, 128, 256] {
        let grid = coordinate_grid(side);
        let start = Instant::now();
        let result = detect_period(&grid, TransformMatrix::CLASSIC, 1500);
        let duration = start.elapsed();

        println!(
            "| {} | {} | {:.2} |",
            side,
            result
                .period()
                .map(|p| p.to_string())
                .unwrap_or_else(|| ">limit".to_string()),
            duration.as_secs_f64() * 1000.0
        );
    }
    println!();
}

fn benchmark_step_throughput() {
    println!("### Step Throughput (500 x 500)\n");

    let grid = coordinate_grid(500);
    let steps = 100;

    let start = Instant::now();
    let plan = TransformPlan::new(TransformMatrix::CLASSIC, 500);
    let plan_time = start.elapsed();

    let start = Instant::now();
    let mut current = grid.clone();
    for _ in 0..steps {
        current = match plan.apply(&current) {
            Ok(next) => next,
            Err(e) => panic!("step failed: {}", e),
        };
    }
    let step_time = start.elapsed();

    let start = Instant::now();
    let mut session = CatMapSession::new(grid, TransformMatrix::CLASSIC);
    let session_setup = start.elapsed();
    let start = Instant::now();
    for _ in 0..steps {
        session.step_forward();
    }
    for _ in 0..steps {
        session.step_backward();
    }
    for _ in 0..steps {
        session.step_forward();
    }
    let replay_time = start.elapsed();

    println!("- plan build: {:.2} ms", plan_time.as_secs_f64() * 1000.0);
    println!(
        "- {} planned steps: {:.2} ms",
        steps,
        step_time.as_secs_f64() * 1000.0
    );
    println!(
        "- session setup (period search, {}): {:.2} ms",
        session.period(),
        session_setup.as_secs_f64() * 1000.0
    );
    println!(
        "- {} forward + {} back + {} replayed steps: {:.2} ms",
        steps,
        steps,
        steps,
        replay_time.as_secs_f64() * 1000.0
    );
    println!();
}

fn benchmark_sequence() {
    println!("### Sequence Generation (64 x 64)\n");
    println!("| Count | Frames | Period Index | Time (ms) |");
    println!("|-------|--------|--------------|-----------|");

    let grid = coordinate_grid(64);
    for count in [10, 100, 1000] {
        let start = Instant::now();
        let seq = generate(&grid, TransformMatrix::CLASSIC, count);
        let duration = start.elapsed();
        println!(
            "| {} | {} | {:?} | {:.2} |",
            count,
            seq.frames().len(),
            seq.period_index(),
            duration.as_secs_f64() * 1000.0
        );
    }
    println!();
}

fn benchmark_batch_periods() {
    println!("### Batch Period Search (101 x 101)\n");

    let grid = coordinate_grid(101);
    let matrices: Vec<TransformMatrix> = (1..=4)
        .flat_map(|a| (1..=4).map(move |d| TransformMatrix::new(a, 1, 1, d)))
        .collect();

    let start = Instant::now();
    let results = detect_periods(&grid, &matrices, 1500);
    let duration = start.elapsed();

    for (m, r) in matrices.iter().zip(&results) {
        println!("- {}: {}", m, r);
    }
    println!(
        "\n{} matrices in {:.2} ms",
        matrices.len(),
        duration.as_secs_f64() * 1000.0
    );
}
