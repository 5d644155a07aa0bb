//! Colorful console output for solve progress.

use chrono::Local;
use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};

use crate::domain::Employee;
use crate::error::OptimizeError;
use crate::extract::{CoverageStatus, ScheduleResult};

/// Inner width of the summary box.
const BOX_WIDTH: usize = 56;

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  ____  _     _  __ _     ____       _              _       _
 / ___|| |__ (_)/ _| |_  / ___|  ___| |__   ___  __| |_   _| | ___ _ __
 \___ \| '_ \| | |_| __| \___ \ / __| '_ \ / _ \/ _` | | | | |/ _ \ '__|
  ___) | | | | |  _| |_   ___) | (__| | | |  __/ (_| | |_| | |  __/ |
 |____/|_| |_|_|_|  \__| |____/ \___|_| |_|\___|\__,_|\__,_|_|\___|_|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Shift Scheduler".bright_cyan()
    );
}

/// Prints the problem size once the model is built.
pub fn print_config(employees: usize, open_hours: usize, variables: usize, constraints: usize) {
    println!(
        "{} {} {} Problem: employees ({}), open hours ({}), variables ({}), constraints ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        employees.to_formatted_string(&Locale::en).bright_yellow(),
        open_hours.to_formatted_string(&Locale::en).bright_yellow(),
        variables.to_formatted_string(&Locale::en).bright_yellow(),
        constraints.to_formatted_string(&Locale::en).bright_yellow()
    );
}

/// Prints a phase start message.
pub fn print_phase_start(phase_name: &str, phase_index: usize) {
    println!(
        "{} {} {} {} phase ({}) started",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", phase_name).bright_cyan(),
        phase_name.white().bold(),
        phase_index.to_string().yellow()
    );
}

/// Prints a phase end message.
pub fn print_phase_end(phase_name: &str, phase_index: usize, duration: Duration, detail: &str) {
    println!(
        "{} {} {} {} phase ({}) ended: time spent ({}), {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", phase_name).bright_cyan(),
        phase_name.white().bold(),
        phase_index.to_string().yellow(),
        format_duration(duration).yellow(),
        detail
    );
}

/// Prints the completion line and a summary box.
pub fn print_solving_ended(total_duration: Duration, outcome: &Result<ScheduleResult, OptimizeError>) {
    let status = match outcome {
        Ok(result) => result.status().as_str(),
        Err(e) => e.kind(),
    };
    println!(
        "{} {} {} Solving ended: time spent ({}), status ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        format_duration(total_duration).yellow(),
        format_status(status)
    );

    let border = "═".repeat(BOX_WIDTH + 2);
    println!();
    println!("{}", format!("╔{}╗", border).bright_cyan());

    let (headline, ok) = match outcome {
        Ok(result) if result.statistics().shortage == 0 => ("✓ DEMAND FULLY COVERED", true),
        Ok(_) => ("⚠ SCHEDULE WITH SHORTAGE", true),
        Err(_) => ("✗ NO SCHEDULE FOUND", false),
    };
    let colored = if ok {
        headline.bright_green().bold().to_string()
    } else {
        headline.bright_red().bold().to_string()
    };
    let padding = (BOX_WIDTH + 2).saturating_sub(headline.chars().count());
    let left_pad = padding / 2;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        colored,
        " ".repeat(padding - left_pad),
        "║".bright_cyan()
    );
    println!("{}", format!("╠{}╣", border).bright_cyan());

    match outcome {
        Ok(result) => {
            let stats = result.statistics();
            box_row("Status:", result.status().as_str());
            box_row("Total Cost:", &format!("${:.2}", result.total_cost()));
            box_row("Objective:", &format!("{:.2}", result.objective_value()));
            if let Some(gap) = result.gap() {
                box_row("MIP Gap:", &format!("{:.2}%", gap * 100.0));
            }
            box_row("Planned Staff:", &stats.planned_employees.to_string());
            box_row("Staff Hours:", &stats.total_hours.to_string());
            box_row("Shortage:", &format!("{} staff-hours", stats.shortage));
            box_row("Surplus:", &format!("{} staff-hours", stats.surplus));
        }
        Err(e) => {
            box_row("Error:", e.kind());
        }
    }
    box_row("Solving Time:", &format!("{:.2}s", total_duration.as_secs_f64()));

    println!("{}", format!("╚{}╝", border).bright_cyan());
    println!();
}

/// Prints one line per employee and one per open hour.
pub fn print_schedule(result: &ScheduleResult, roster: &[Employee]) {
    for (emp, assignment) in roster.iter().zip(result.assignments()) {
        let shifts = if assignment.shifts.is_empty() {
            "off".bright_black().to_string()
        } else {
            assignment
                .shifts
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "    {} {:<20} │ {:>2}h │ {:>9} │ {}",
            "→".bright_blue(),
            emp.name,
            assignment.hours,
            format!("${:.2}", assignment.cost),
            shifts
        );
    }
    println!();
    for hour in result.coverage() {
        let marker = match hour.status {
            CoverageStatus::Under => "under".bright_red().to_string(),
            CoverageStatus::Exact => "exact".bright_green().to_string(),
            CoverageStatus::Over => "over".yellow().to_string(),
        };
        println!(
            "    {:02}:00 │ required {:>3} │ assigned {:>3} │ {}",
            hour.hour, hour.required, hour.assigned, marker
        );
    }
}

fn box_row(label: &str, value: &str) {
    println!(
        "{}  {:<18}{:>36}  {}",
        "║".bright_cyan(),
        label,
        value,
        "║".bright_cyan()
    );
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn format_status(status: &str) -> String {
    match status {
        "OPTIMAL" => status.bright_green().to_string(),
        "TIME_LIMIT_REACHED" | "INTERRUPTED" => status.yellow().to_string(),
        _ => status.bright_red().to_string(),
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Times one pipeline phase and reports it on the console.
pub struct PhaseTimer {
    start: Instant,
    phase_name: String,
    phase_index: usize,
}

impl PhaseTimer {
    pub fn start(phase_name: impl Into<String>, phase_index: usize) -> Self {
        let name = phase_name.into();
        print_phase_start(&name, phase_index);
        Self {
            start: Instant::now(),
            phase_name: name,
            phase_index,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self, detail: &str) -> Duration {
        let elapsed = self.start.elapsed();
        print_phase_end(&self.phase_name, self.phase_index, elapsed, detail);
        elapsed
    }
}
