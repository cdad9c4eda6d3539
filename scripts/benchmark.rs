// scripts/benchmark.rs
use ndarray::Array1;
use neurint::analytics::exact;
use neurint::math_utils::Timer;
use neurint::mc::ensemble::{run_ensemble, run_trajectory, EnsembleConfig, EnsembleSummary};
use neurint::models::{DynamicalModel, Lif, LifGroup, OuProcess};
use neurint::rng::ZeroNoise;
use neurint::{get_integrator, Equation, IntegratorConfig};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Label/value pairs describing the machine and build a run was made on
fn host_description() -> Vec<(&'static str, String)> {
    // only Linux exposes a model name this way; elsewhere it stays unknown
    let cpu = std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|info| {
            info.lines()
                .find_map(|line| line.strip_prefix("model name"))
                .and_then(|rest| rest.split(':').nth(1))
                .map(|model| model.trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };

    vec![
        ("Platform", format!("{}-{}", env::consts::OS, env::consts::ARCH)),
        ("CPU", cpu),
        ("Logical cores", num_cpus::get().to_string()),
        ("Ensemble threads", rayon::current_num_threads().to_string()),
        ("Profile", profile.to_string()),
    ]
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    /// Element-steps performed (state length × steps × paths)
    work: usize,
    time_ms: f64,
    throughput: f64,
    value: f64,
    reference: Option<f64>,
    relative_error: Option<f64>,
}

impl BenchmarkResult {
    fn new(name: String, work: usize, time_ms: f64, value: f64, reference: Option<f64>) -> Self {
        Self {
            name,
            work,
            time_ms,
            throughput: work as f64 / (time_ms / 1000.0),
            value,
            reference,
            relative_error: reference.map(|r| (value - r).abs() / r.abs()),
        }
    }
}

/// Relaxation `dV/dt = (E - V)/tau` of a large population under each
/// deterministic scheme
fn run_deterministic_benchmarks() -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    let (e, tau) = (-65.0, 10.0);
    let equation = Equation::ode("V", move |v, _, _| v.mapv(|x| (e - x) / tau)).expect("valid equation");

    let neurons = 10_000;
    let steps = 1_000;
    let dt = 0.1;
    let v0 = Array1::from_elem(neurons, 0.0);
    let reference = exact::relaxation(0.0, e, tau, steps as f64 * dt);

    for method in ["euler", "midpoint", "rk2", "rk3", "rk4", "rk4_alternative"] {
        println!("Benchmarking {}...", method);
        let step = get_integrator(method)
            .and_then(|integrator| integrator.build(&equation, &IntegratorConfig::with_dt(dt)))
            .expect("deterministic scheme");

        let timer = Timer::new();
        let v = run_trajectory(&step, &v0, 0.0, steps, &[], &mut ZeroNoise);
        results.push(BenchmarkResult::new(
            format!("Relaxation {}", method),
            neurons * steps,
            timer.elapsed_ms(),
            v[0],
            Some(reference),
        ));
    }

    println!("Benchmarking LIF population (exponential)...");
    let config = IntegratorConfig::with_dt(dt);
    let mut group = LifGroup::new(
        Lif::default(),
        neurons,
        &get_integrator("exponential").expect("registered"),
        &config,
    )
    .expect("valid LIF parameters");
    let input = Array1::from_shape_fn(neurons, |i| 15.0 + 20.0 * i as f64 / neurons as f64);

    let timer = Timer::new();
    let mut spikes = 0;
    for k in 0..steps {
        spikes += group.update(k as f64 * dt, &input, &mut ZeroNoise);
    }
    results.push(BenchmarkResult::new(
        "LIF population spikes".to_string(),
        neurons * steps,
        timer.elapsed_ms(),
        spikes as f64,
        None,
    ));

    results
}

/// Ornstein–Uhlenbeck ensembles; the value column is the terminal variance
fn run_stochastic_benchmarks() -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    let ou = OuProcess::new(0.0, 0.5, 1.0);
    let dt = 0.01;
    let config = EnsembleConfig {
        paths: 100_000,
        steps: 100,
        seed: 42,
        ..Default::default()
    };
    let reference = exact::ou_variance(ou.sigma, ou.tau, config.steps as f64 * dt);
    let y0 = ou.initial_state(1);

    let plain = ou.equation().expect("valid OU parameters");
    let linearized = ou.linearized_equation().expect("valid OU parameters");

    for (method, equation) in [
        ("euler", &plain),
        ("heun", &plain),
        ("milstein", &plain),
        ("milstein_stra", &plain),
        ("exponential", &linearized),
    ] {
        println!("Benchmarking OU ensemble with {}...", method);
        let step = get_integrator(method)
            .and_then(|integrator| integrator.build(equation, &IntegratorConfig::with_dt(dt)))
            .expect("stochastic scheme");

        let timer = Timer::new();
        let finals = run_ensemble(&step, &y0, &[], &config).expect("valid ensemble");
        let time_ms = timer.elapsed_ms();
        let summary = EnsembleSummary::of_element(&finals, 0);
        results.push(BenchmarkResult::new(
            format!("OU variance {}", method),
            config.paths * config.steps,
            time_ms,
            summary.variance,
            Some(reference),
        ));
    }

    results
}

fn write_results_to_csv(
    results: &[BenchmarkResult],
    host: &[(&'static str, String)],
    filename: &str,
) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);

    for (label, value) in host {
        writeln!(file, "# {}: {}", label, value)?;
    }
    writeln!(file, "# Run at: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;

    writeln!(file, "Benchmark,Work,Time_ms,Throughput_steps_per_sec,Value,Reference,Relative_Error")?;
    for result in results {
        writeln!(
            file,
            "{},{},{:.2},{:.0},{:.6},{},{}",
            result.name,
            result.work,
            result.time_ms,
            result.throughput,
            result.value,
            result
                .reference
                .map(|v| format!("{:.6}", v))
                .unwrap_or_else(|| "N/A".to_string()),
            result
                .relative_error
                .map(|e| format!("{:.6}", e))
                .unwrap_or_else(|| "N/A".to_string())
        )?;
    }
    file.flush()
}

fn main() {
    println!("neurint Integrator Benchmark Suite");
    println!("==================================\n");

    let host = host_description();
    for (label, value) in &host {
        println!("{:<18} {}", format!("{}:", label), value);
    }
    println!();

    println!("Running deterministic benchmarks...");
    let mut all_results = run_deterministic_benchmarks();
    println!("\nRunning stochastic benchmarks...");
    all_results.extend(run_stochastic_benchmarks());

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<30} {:>10} {:>12} {:>15} {:>10} {:>10} {:>10}",
        "Benchmark", "Work", "Time (ms)", "Steps/sec", "Value", "Reference", "Rel Error"
    );
    println!("{:-<96}", "");
    for result in &all_results {
        println!(
            "{:<30} {:>10} {:>12.2} {:>15.0} {:>10.4} {:>10} {:>10}",
            result.name,
            result.work,
            result.time_ms,
            result.throughput,
            result.value,
            result
                .reference
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "N/A".to_string()),
            result
                .relative_error
                .map(|e| format!("{:.2}%", e * 100.0))
                .unwrap_or_else(|| "N/A".to_string())
        );
    }
    println!("{:=<96}", "");

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    match write_results_to_csv(&all_results, &host, &filename) {
        Ok(()) => println!("\nResults saved to: {}", filename),
        Err(e) => eprintln!("\nCould not write {}: {}", filename, e),
    }
    println!("\nTo reproduce: cargo run --bin benchmark --release");
}
