use colored::Colorize;

use crate::directory::DirectoryUser;
use crate::leaderboard::{LeaderboardRow, StoreSummary};
use crate::provider::models::{WarehouseHandle, WarehouseState, WarehouseSummary};
use crate::provisioner::TeardownReport;

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg.green());
}

/// Print an error message.
pub fn print_error(msg: &str) {
    println!("{} {}", "✗".red().bold(), msg.red());
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "!".yellow().bold(), msg.yellow());
}

fn colored_state(state: WarehouseState) -> String {
    let s = state.as_str();
    match state {
        WarehouseState::Running => s.green().to_string(),
        WarehouseState::Starting | WarehouseState::Stopping => s.yellow().to_string(),
        WarehouseState::Stopped => s.blue().to_string(),
        WarehouseState::Deleting | WarehouseState::Deleted => s.dimmed().to_string(),
        WarehouseState::Unknown => s.to_string(),
    }
}

/// One line per creation attempt, in creation order.
pub fn print_creation_results(handles: &[WarehouseHandle]) {
    for handle in handles {
        if handle.success {
            print_success(&format!(
                "{} created ({})  {}",
                handle.name.bold(),
                handle.id,
                handle.connection_path.dimmed()
            ));
        } else {
            print_error(&format!(
                "{} failed: {}",
                handle.name,
                handle.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
}

pub fn print_warehouse_list(warehouses: &[WarehouseSummary]) {
    if warehouses.is_empty() {
        println!("{}", "No warehouses found.".dimmed());
        return;
    }

    println!();
    println!("{}", "SQL Warehouses".bold().cyan());
    println!("{}", "─".repeat(90));
    println!(
        "  {:<18} {:<28} {:<10} {:<10} {:<10} {}",
        "ID".bold(),
        "NAME".bold(),
        "SIZE".bold(),
        "AUTO-STOP".bold(),
        "TYPE".bold(),
        "STATE".bold()
    );
    println!("{}", "─".repeat(90));

    for wh in warehouses {
        let auto_stop = wh
            .auto_stop_mins
            .map(|m| format!("{}m", m))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<18} {:<28} {:<10} {:<10} {:<10} {}",
            wh.id,
            wh.name,
            wh.cluster_size.as_deref().unwrap_or("-"),
            auto_stop,
            wh.warehouse_type.as_deref().unwrap_or("-"),
            colored_state(wh.state)
        );
    }

    println!();
    println!("  {} warehouse(s) total.", warehouses.len());
    println!();
}

pub fn print_tracked(session: &str, handles: &[WarehouseHandle]) {
    if handles.is_empty() {
        println!("{}", format!("No warehouses tracked in session '{}'.", session).dimmed());
        return;
    }
    println!();
    println!("{} {}", "Session:".bold().cyan(), session.bold());
    for handle in handles {
        println!(
            "  {:<18} {:<28} {}",
            handle.id,
            handle.name,
            handle.connection_path.dimmed()
        );
    }
    println!();
}

pub fn print_teardown(report: &TeardownReport) {
    if report.all_deleted() {
        print_success(&report.to_string());
    } else {
        print_warning(&report.to_string());
        if report.forget_error.is_none() {
            println!(
                "  {}",
                "Failed warehouses are no longer tracked; remove them from the workspace manually."
                    .dimmed()
            );
        }
    }
    if let Some(ref e) = report.forget_error {
        print_warning(&format!("Session entries were kept: {}", e));
    }
}

pub fn print_users(users: &[DirectoryUser]) {
    println!();
    println!(
        "  {:<30} {:<34} {}",
        "NAME".bold(),
        "EMAIL".bold(),
        "ACTIVE".bold()
    );
    println!("{}", "─".repeat(76));
    for user in users {
        let active = if user.active {
            "yes".green().to_string()
        } else {
            "no".dimmed().to_string()
        };
        println!("  {:<30} {:<34} {}", user.display_name, user.email, active);
    }
    println!();
    println!("  {} user(s).", users.len());
    println!();
}

pub fn print_store_summary(summary: &StoreSummary) {
    for warning in &summary.bootstrap.warnings {
        print_warning(warning);
    }
    print_success(&format!(
        "Stored {} participant(s) in {} using warehouse {} ({})",
        summary.rows_written,
        summary.table.bold(),
        summary.warehouse.name,
        summary.warehouse.readiness
    ));
}

/// Render leaderboard rows as a pipe-separated column table.
pub fn format_leaderboard(rows: &[LeaderboardRow]) -> String {
    let columns = ["RANK", "NAME", "EMAIL", "STATUS", "SCORE", "LAST UPDATED"];
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.rank.to_string(),
                r.display_name.clone(),
                r.email.clone(),
                r.status.clone(),
                r.score.to_string(),
                r.last_updated.clone(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (i, val) in row.iter().enumerate() {
            widths[i] = widths[i].max(val.chars().count());
        }
    }

    let mut output = String::new();

    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&sep.join("-+-"));
    output.push('\n');

    for row in &cells {
        let vals: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:width$}", v, width = widths[i]))
            .collect();
        output.push_str(vals.join(" | ").trim_end());
        output.push('\n');
    }

    output.push_str(&format!("\n({} rows)", rows.len()));
    output
}
