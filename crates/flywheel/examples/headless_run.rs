//! Runs one experiment headlessly against simulated time and prints the
//! measured results.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example headless_run
//! ```

use std::rc::Rc;

use flywheel::{Environment, NullView, ParametersBuilder, Session, VirtualScheduler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let params = ParametersBuilder::new()
        .flywheel_mass_kg(5.0)
        .flywheel_diameter_cm(10.0)
        .ring_mass_g(200.0)
        .winding_count(1)
        .environment(Environment::Earth)
        .build()?;

    let scheduler = VirtualScheduler::new();
    let mut session = Session::new(
        Rc::new(scheduler.clone()),
        Rc::new(scheduler.clock()),
        Rc::new(NullView),
    );
    session.set_params(params)?;
    session.start()?;
    scheduler.run_until_idle();

    let run = session.run_state();
    println!("total rotations: {:.2}", run.total_rotations());
    println!("lap time:        {:.2} s", session.lap_seconds().unwrap_or(0.0));
    println!("theoretical I:   {:.6} kg·m²", session.theoretical_inertia());
    println!("observed I:      {:.6} kg·m²", session.observed_inertia()?);
    println!("{}", session.export_run_json()?);
    Ok(())
}
