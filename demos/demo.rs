// demos/demo.rs
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use ndarray::{array, Array1};
use neurint::analytics::exact;
use neurint::compiler::StateMap;
use neurint::math_utils::Timer;
use neurint::mc::ensemble::{record_trajectory, run_ensemble, EnsembleConfig, EnsembleSummary};
use neurint::models::{DynamicalModel, FitzHughNagumo, Lif, LifGroup, OuProcess};
use neurint::output;
use neurint::rng::ZeroNoise;
use neurint::{get_integrator, Equation, IntegratorConfig, IntegratorResult};

fn init_logging() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("logging disabled: {}", e),
    }
}

fn main() -> IntegratorResult<()> {
    init_logging();
    println!("Running neurint Integrator Demo\n");

    compare_deterministic_schemes()?;
    lif_frequency_current_curve()?;
    ou_ensembles()?;
    fitzhugh_nagumo_trace()?;

    println!("\nDemo complete.");
    Ok(())
}

fn compare_deterministic_schemes() -> IntegratorResult<()> {
    println!("--- dy/dt = -y on [0, 1], dt = 0.1 ---");
    let equation = Equation::ode("y", |y, _, _| -y)?;
    let reference = exact::exponential_decay(1.0, -1.0, 1.0);

    println!("{:<18} {:>14} {:>12}", "Method", "y(1)", "Abs Error");
    for method in ["euler", "midpoint", "heun", "rk2", "rk3", "rk4", "rk4_alternative"] {
        let step = get_integrator(method)?.build(&equation, &IntegratorConfig::with_dt(0.1))?;
        let trajectory = record_trajectory(&step, &array![1.0], 0.0, 10, &[], &mut ZeroNoise);
        let y1 = trajectory.last().map_or(f64::NAN, |s| s[0]);
        println!("{:<18} {:>14.10} {:>12.2e}", method, y1, (y1 - reference).abs());
    }
    println!();
    Ok(())
}

fn lif_frequency_current_curve() -> IntegratorResult<()> {
    println!("--- LIF f-I curve (exponential Euler, 1 s) ---");
    let config = IntegratorConfig::with_dt(0.1);
    let currents = Array1::linspace(0.0, 60.0, 13);
    let mut group = LifGroup::new(
        Lif::default(),
        currents.len(),
        &get_integrator("exponential")?,
        &config,
    )?;

    let steps = 10_000;
    let mut counts = vec![0usize; currents.len()];
    let timer = Timer::new();
    for k in 0..steps {
        group.update(k as f64 * config.dt, &currents, &mut ZeroNoise);
        for (count, fired) in counts.iter_mut().zip(&group.spike) {
            *count += usize::from(*fired);
        }
    }
    println!("{} neuron-steps in {:.1} ms", currents.len() * steps, timer.elapsed_ms());

    println!("{:>10} {:>10}", "I", "Rate (Hz)");
    for (current, count) in currents.iter().zip(&counts) {
        println!("{:>10.1} {:>10.1}", current, *count as f64);
    }

    // subthreshold membrane trace
    let equation = Lif::default().equation()?;
    let step = get_integrator("exponential")?.build(&equation, &config)?;
    let trace = record_trajectory(&step, &array![-5.0], 0.0, 500, &[array![15.0]], &mut ZeroNoise);
    match output::write_trajectory_to_csv("lif_trace.csv", "V", &trace) {
        Ok(()) => println!("Membrane trace written to lif_trace.csv"),
        Err(e) => eprintln!("Could not write lif_trace.csv: {}", e),
    }
    println!();
    Ok(())
}

fn ou_ensembles() -> IntegratorResult<()> {
    println!("--- Ornstein-Uhlenbeck ensembles, T = 1 ---");
    let ou = OuProcess::new(1.0, 0.5, 1.0);
    let dt = 0.01;
    let config = EnsembleConfig {
        paths: 20_000,
        steps: 100,
        ..Default::default()
    };
    let t_end = config.steps as f64 * dt;
    println!(
        "analytic mean {:.4}, variance {:.4}",
        exact::ou_mean(0.0, ou.mean, ou.tau, t_end),
        exact::ou_variance(ou.sigma, ou.tau, t_end)
    );

    let plain = ou.equation()?;
    let linearized = ou.linearized_equation()?;
    let mut rows = Vec::new();
    for (method, equation) in [
        ("euler", &plain),
        ("milstein", &plain),
        ("heun", &plain),
        ("exponential", &linearized),
    ] {
        let step = get_integrator(method)?.build(equation, &IntegratorConfig::with_dt(dt))?;
        let finals = run_ensemble(&step, &array![0.0], &[], &config)?;
        let summary = EnsembleSummary::of_element(&finals, 0);
        println!(
            "{:<12} mean {:.4} ± {:.4}, variance {:.4}",
            method, summary.mean, summary.std_error, summary.variance
        );
        rows.push((method, summary));
    }
    if let Err(e) = output::write_summary_to_csv("ou_summary.csv", &rows) {
        eprintln!("Could not write ou_summary.csv: {}", e);
    }
    println!();
    Ok(())
}

fn fitzhugh_nagumo_trace() -> IntegratorResult<()> {
    println!("--- FitzHugh-Nagumo, merged RK4 system, I = 0.5 ---");
    let config = IntegratorConfig::with_dt(0.05).merged();
    let system = FitzHughNagumo::default().system(&get_integrator("rk4")?, &config)?;

    let mut states: StateMap = [("V".to_string(), array![-1.0]), ("w".to_string(), array![-0.5])]
        .into_iter()
        .collect();
    let inputs: StateMap = [("I".to_string(), array![0.5])].into_iter().collect();

    for k in 0..4000 {
        system.advance(&mut states, k as f64 * config.dt, &inputs, &mut ZeroNoise)?;
        if k % 400 == 0 {
            println!(
                "t = {:>6.1}  V = {:>7.3}  w = {:>7.3}",
                k as f64 * config.dt,
                states["V"][0],
                states["w"][0]
            );
        }
    }
    Ok(())
}
