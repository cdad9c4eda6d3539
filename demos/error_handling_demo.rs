// demos/error_handling_demo.rs
use ndarray::array;
use neurint::compiler::{StateMap, StepCompiler, System};
use neurint::error::IntegratorError;
use neurint::mc::ensemble::{run_ensemble, EnsembleConfig};
use neurint::models::{DynamicalModel, Lif};
use neurint::rng::ZeroNoise;
use neurint::symbolic::Scope;
use neurint::{get_integrator, CompileFlags, Equation, IntegratorConfig, MergeMode};

fn report<T>(result: Result<T, IntegratorError>) {
    match result {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }
}

fn main() {
    println!("Error Handling Demo for neurint");
    println!("===============================\n");

    println!("1. Unknown integration method...");
    report(get_integrator("leapfrog"));

    println!("\n2. Stochastic equation with a deterministic-only scheme...");
    let ou = Equation::sde("x", |y, _, _| -y, 0.3).expect("valid equation");
    report(get_integrator("rk4").and_then(|rk4| rk4.build(&ou, &IntegratorConfig::default())));

    println!("\n3. Exponential Euler on an SDE without a linear coefficient...");
    report(get_integrator("exponential").and_then(|exp| exp.build(&ou, &IntegratorConfig::default())));

    println!("\n4. Non-finite diffusion constant...");
    report(Equation::sde("x", |y, _, _| -y, f64::NAN));

    println!("\n5. Zero RK2 stage parameter...");
    report(get_integrator("rk2").and_then(|rk2| rk2.with_beta(0.0)));

    println!("\n6. Non-positive step size...");
    let eq = Equation::ode("x", |y, _, _| -y).expect("valid equation");
    report(get_integrator("euler").and_then(|euler| euler.build(&eq, &IntegratorConfig::with_dt(0.0))));

    println!("\n7. Malformed drift expression...");
    report(Equation::from_expression("V", "-(V - E_L", &[], Scope::new()));

    println!("\n8. LIF reset above threshold...");
    let lif = Lif {
        v_reset: 25.0,
        ..Default::default()
    };
    report(lif.equation());

    println!("\n9. Zero-path ensemble...");
    let step = get_integrator("euler")
        .and_then(|euler| euler.build(&ou, &IntegratorConfig::default()))
        .expect("euler supports SDEs");
    let config = EnsembleConfig {
        paths: 0,
        ..Default::default()
    };
    report(run_ensemble(&step, &array![0.0], &[], &config));

    println!("\n10. Name collision when merging without isolation...");
    let shared: Scope = [("tau".to_string(), 5.0)].into_iter().collect();
    let other: Scope = [("tau".to_string(), 20.0)].into_iter().collect();
    let compiler = StepCompiler::new(IntegratorConfig {
        dt: 0.1,
        merge_mode: MergeMode::Merge,
        flags: CompileFlags::FOLD_CONSTANTS,
    })
    .expect("valid configuration");
    let euler = get_integrator("euler").expect("registered");
    let mut system = System::new();
    let fast = Equation::from_expression("a", "-a/tau", &[], shared).expect("valid expression");
    let slow = Equation::from_expression("b", "-b/tau", &[], other).expect("valid expression");
    let merged = compiler
        .compile_unit(&euler, &fast)
        .and_then(|unit| system.add(unit))
        .and_then(|_| compiler.compile_unit(&euler, &slow))
        .and_then(|unit| system.add(unit));
    report(merged);

    println!("\n11. Error type matching on an unbound argument...");
    let driven = Equation::from_expression("V", "I - V", &["I"], Scope::new()).expect("valid expression");
    let mut system = System::new();
    let added = compiler
        .compile_unit(&euler, &driven)
        .and_then(|unit| system.add(unit));
    if let Err(e) = added {
        println!("   Unexpected error: {}", e);
    }
    let states: StateMap = [("V".to_string(), array![0.0])].into_iter().collect();
    match system.step(&states, 0.0, &StateMap::new(), &mut ZeroNoise) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(IntegratorError::UnboundArgument { variable, argument }) => {
            println!("   ✓ Caught UnboundArgument: '{}' needs '{}'", variable, argument);
        }
        Err(other) => println!("   Unexpected error type: {}", other),
    }

    println!("\n12. Valid configuration...");
    match get_integrator("Milstein").and_then(|m| m.build(&ou, &IntegratorConfig::with_dt(0.01))) {
        Ok(step) => println!("   ✓ Built '{}' for '{}' with dt = {}", step.method(), step.variable(), step.dt()),
        Err(e) => println!("   Unexpected error: {}", e),
    }

    println!("\n✓ Error handling demo complete!");
}
