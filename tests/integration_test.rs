// tests/integration_test.rs
use ndarray::array;
use neurint::compiler::{StateMap, StepCompiler, System};
use neurint::equation::{Diffusion, MultiReturn};
use neurint::mc::ensemble::{record_trajectory, run_ensemble, EnsembleConfig};
use neurint::models::{DynamicalModel, FitzHughNagumo, Lif, LifGroup};
use neurint::rng::{FixedNoise, GaussianNoise, ZeroNoise};
use neurint::symbolic::Scope;
use neurint::{
    get_integrator, CompileFlags, Equation, IntegratorConfig, IntegratorError, MergeMode,
};

const DETERMINISTIC: [&str; 8] = [
    "euler",
    "midpoint",
    "heun",
    "rk2",
    "rk3",
    "rk4",
    "rk4_alternative",
    "exponential",
];
const STOCHASTIC: [&str; 4] = ["euler", "heun", "milstein", "milstein_stra"];

#[test]
fn test_lif_firing_rate_agrees_across_schemes() {
    // constant drive of 30 mV against a 20 mV threshold:
    // ISI = t_ref + tau·ln((R·I - V_reset) / (R·I - V_th)) ≈ 13.5 ms
    let config = IntegratorConfig::with_dt(0.1);
    let input = array![30.0];
    let mut counts = Vec::new();

    for method in ["exponential", "rk4", "euler"] {
        let integrator = get_integrator(method).unwrap();
        let mut group = LifGroup::new(Lif::default(), 4, &integrator, &config).unwrap();
        let mut spikes = 0;
        for k in 0..2000 {
            spikes += group.update(k as f64 * config.dt, &input, &mut ZeroNoise);
        }
        println!("{}: {} spikes from 4 neurons", method, spikes);
        assert_eq!(spikes % 4, 0, "identical neurons must fire together");
        counts.push(spikes / 4);
    }

    for count in &counts {
        assert!((13..=16).contains(count), "unexpected spike count {}", count);
    }
    assert!((counts[0] as i64 - counts[1] as i64).abs() <= 1);
}

#[test]
fn test_fitzhugh_nagumo_limit_cycle() {
    let fhn = FitzHughNagumo::default();
    let config = IntegratorConfig::with_dt(0.05).merged();
    let system = fhn.system(&get_integrator("rk4").unwrap(), &config).unwrap();

    let mut states: StateMap = [("V".to_string(), array![-1.0]), ("w".to_string(), array![-0.5])]
        .into_iter()
        .collect();
    let inputs: StateMap = [("I".to_string(), array![0.5])].into_iter().collect();

    let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for k in 0..6000 {
        system
            .advance(&mut states, k as f64 * config.dt, &inputs, &mut ZeroNoise)
            .unwrap();
        if k >= 2000 {
            let v = states["V"][0];
            v_min = v_min.min(v);
            v_max = v_max.max(v);
        }
    }
    println!("V oscillates in [{:.3}, {:.3}]", v_min, v_max);
    assert!(v_max > 1.5 && v_min < -1.5);
}

#[test]
fn test_aux_values_pass_through_every_scheme() {
    let drift = |y: &neurint::State, t: f64, _: &[neurint::State]| {
        MultiReturn::new(-y, vec![y * 2.0, array![t]])
    };
    let ode = Equation::ode_multi("y", drift).unwrap();
    let y0 = array![1.0, 3.0];

    for method in DETERMINISTIC {
        let step = get_integrator(method)
            .unwrap()
            .build(&ode, &IntegratorConfig::with_dt(0.1))
            .unwrap();
        let out = step.call_ode(&y0, 0.5, &[]);
        assert_eq!(out.aux, vec![array![2.0, 6.0], array![0.5]], "{}", method);
    }

    for g in [Diffusion::Scalar(0.2), Diffusion::function(|y, _, _| y * 0.1)] {
        let sde = Equation::sde_multi("y", drift, g).unwrap();
        for method in STOCHASTIC {
            let step = get_integrator(method)
                .unwrap()
                .build(&sde, &IntegratorConfig::with_dt(0.1))
                .unwrap();
            let out = step.call(&y0, 0.5, &[], &mut FixedNoise::constant(0.7));
            assert_eq!(out.aux.len(), 2, "{}", method);
            assert_eq!(out.aux[0], array![2.0, 6.0], "{}", method);
        }
    }
}

#[test]
fn test_single_valued_drift_has_no_aux() {
    let eq = Equation::ode("y", |y, _, _| -y).unwrap();
    for method in DETERMINISTIC {
        let step = get_integrator(method)
            .unwrap()
            .build(&eq, &IntegratorConfig::default())
            .unwrap();
        assert!(step.call_ode(&array![1.0], 0.0, &[]).aux.is_empty());
    }
}

#[test]
fn test_merged_unit_steps_like_standalone_function() {
    let scope: Scope = [("E".to_string(), -65.0), ("tau".to_string(), 10.0)]
        .into_iter()
        .collect();
    let eq = Equation::from_expression("V", "(-(V - E) + I)/tau", &["I"], scope).unwrap();
    let integrator = get_integrator("heun").unwrap();

    let standalone = StepCompiler::new(IntegratorConfig::with_dt(0.2))
        .unwrap()
        .compile(&integrator, &eq)
        .unwrap()
        .into_function();

    let mut system = System::new();
    let merged = StepCompiler::new(IntegratorConfig::with_dt(0.2).merged()).unwrap();
    system
        .add(merged.compile(&integrator, &eq).unwrap().into_unit().unwrap())
        .unwrap();

    let mut states: StateMap = [("V".to_string(), array![-70.0, -50.0])].into_iter().collect();
    let inputs: StateMap = [("I".to_string(), array![5.0])].into_iter().collect();
    let mut v = states["V"].clone();
    for k in 0..20 {
        let t = k as f64 * 0.2;
        v = standalone.call_ode(&v, t, &[inputs["I"].clone()]).state;
        system.advance(&mut states, t, &inputs, &mut ZeroNoise).unwrap();
    }
    for (a, b) in v.iter().zip(states["V"].iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_compile_flags_do_not_change_results() {
    let scope: Scope = [("k".to_string(), 0.5)].into_iter().collect();
    let eq = Equation::from_expression("x", "-(2*k + 1)*x + sin(t)", &[], scope).unwrap();
    let rk3 = get_integrator("rk3").unwrap();

    let mut outputs = Vec::new();
    for flags in [CompileFlags::NONE, CompileFlags::FOLD_CONSTANTS, CompileFlags::all()] {
        let config = IntegratorConfig {
            dt: 0.05,
            merge_mode: MergeMode::Standalone,
            flags,
        };
        let step = StepCompiler::new(config)
            .unwrap()
            .compile(&rk3, &eq)
            .unwrap()
            .into_function();
        let trajectory = record_trajectory(&step, &array![1.0], 0.0, 40, &[], &mut ZeroNoise);
        outputs.push(trajectory.component(0));
    }
    for other in &outputs[1..] {
        for (a, b) in outputs[0].iter().zip(other) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn test_ensemble_reproducible_for_seed() {
    let eq = Equation::sde("x", |y, _, _| -y, Diffusion::function(|y, _, _| y * 0.3)).unwrap();
    let step = get_integrator("milstein")
        .unwrap()
        .build(&eq, &IntegratorConfig::with_dt(0.01))
        .unwrap();
    let config = EnsembleConfig {
        paths: 256,
        steps: 50,
        seed: 11,
        ..Default::default()
    };

    let a = run_ensemble(&step, &array![1.0, 2.0], &[], &config).unwrap();
    let b = run_ensemble(&step, &array![1.0, 2.0], &[], &config).unwrap();
    assert_eq!(a, b);

    let other_seed = EnsembleConfig { seed: 12, ..config };
    let c = run_ensemble(&step, &array![1.0, 2.0], &[], &other_seed).unwrap();
    assert_ne!(a, c);
}

#[test]
fn test_symbolic_diffusion_expression() {
    let scope: Scope = [("sigma".to_string(), 0.5)].into_iter().collect();
    let additive = Equation::from_expression("x", "-x", &[], scope.clone())
        .unwrap()
        .with_diffusion_expression("sigma*2")
        .unwrap();
    assert!(additive.diffusion().unwrap().is_constant());

    let multiplicative = Equation::from_expression("x", "-x", &[], scope)
        .unwrap()
        .with_diffusion_expression("sigma*x")
        .unwrap();
    assert!(!multiplicative.diffusion().unwrap().is_constant());

    let step = get_integrator("euler")
        .unwrap()
        .build(&multiplicative, &IntegratorConfig::with_dt(0.04))
        .unwrap();
    // x + (-x)·dt + σx·√dt·dW = 2 - 0.08 + 0.5·2·0.2·1
    let x1 = step.call(&array![2.0], 0.0, &[], &mut FixedNoise::constant(1.0)).state[0];
    assert!((x1 - 2.12).abs() < 1e-12);
}

#[test]
fn test_error_paths() {
    let unknown = get_integrator("leapfrog").unwrap_err();
    assert!(unknown.to_string().contains("leapfrog"));

    let sde = Equation::sde("x", |y, _, _| -y, 0.1).unwrap();
    let err = get_integrator("exp_euler")
        .unwrap()
        .build(&sde, &IntegratorConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        IntegratorError::MissingLinearCoefficient {
            variable: "x".to_string()
        }
    );

    assert!(matches!(
        Equation::sde("x", |y, _, _| -y, f64::NAN),
        Err(IntegratorError::InvalidDiffusionTerm { .. })
    ));
    assert!(matches!(
        Equation::from_expression("x", "-x +", &[], Scope::new()),
        Err(IntegratorError::SymbolicError { .. })
    ));
    assert!(matches!(
        Equation::from_expression("x", "-x", &["x"], Scope::new()),
        Err(IntegratorError::InvalidEquation { .. })
    ));
    assert!(matches!(
        Lif {
            tau: -1.0,
            ..Default::default()
        }
        .equation(),
        Err(IntegratorError::InvalidEquation { .. })
    ));
}

#[test]
fn test_noise_sources_drive_same_trajectory() {
    let eq = Equation::sde("x", |y, _, _| y * 0.0, 1.0).unwrap();
    let step = get_integrator("euler")
        .unwrap()
        .build(&eq, &IntegratorConfig::with_dt(0.25))
        .unwrap();

    let mut a = GaussianNoise::seeded(3);
    let mut b = GaussianNoise::seeded(3);
    let ta = record_trajectory(&step, &array![0.0], 0.0, 10, &[], &mut a);
    let tb = record_trajectory(&step, &array![0.0], 0.0, 10, &[], &mut b);
    assert_eq!(ta, tb);
    assert_eq!(ta.times.len(), 11);
    assert!((ta.times[10] - 2.5).abs() < 1e-12);
}
