//! Benchmark for model building and solving.
//!
//! Run with: cargo run --release --bin bench [small|large]

use shift_scheduler::demo_data::{self, DemoData};
use shift_scheduler::ilp::{AbortToken, MicroLpSolver};
use shift_scheduler::{console, optimizer};
use std::time::Instant;

fn main() {
    let demo = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<DemoData>().ok())
        .unwrap_or(DemoData::Small);
    let problem = demo_data::generate(demo);

    println!("Benchmark: Shift Model ({})", demo.as_str());
    println!("  Employees: {}", problem.employees.len());
    println!("  Open hours: {}", problem.demand.operating_hours());
    println!();

    let build_start = Instant::now();
    let model = match optimizer::prepare(&problem) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Invalid demo problem: {}", e);
            std::process::exit(1);
        }
    };
    let build_time = build_start.elapsed();
    println!(
        "Model: {} variables, {} constraints ({:.2?})",
        model.program().variable_count(),
        model.program().constraint_count(),
        build_time
    );

    let solve_start = Instant::now();
    let outcome = optimizer::solve_model(
        &model,
        &MicroLpSolver::new(),
        problem.config.time_limit,
        &AbortToken::new(),
    );
    let solve_time = solve_start.elapsed();

    println!();
    println!("Results:");
    println!("  Build: {:.2?}", build_time);
    println!("  Solve + extract: {:.2?}", solve_time);
    console::print_solving_ended(build_time + solve_time, &outcome);
    if let Ok(result) = &outcome {
        console::print_schedule(result, &problem.employees);
    }
}
