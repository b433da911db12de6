//! Terminal output formatting.

use chrono::{DateTime, Duration, Utc};
use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthStr;

use crm_core::client::{Client, ClientStatus};
use crm_core::deal::{ClosedOutcome, Deal, Orphan, Placement};
use crm_core::metrics::{PipelineMetrics, StageSummary};
use crm_core::stage::{Stage, StageKind, StageRegistry};

/// One board column: a stage and the deals currently in it.
struct BoardColumn<'a> {
    stage: &'a Stage,
    deals: Vec<&'a Deal>,
}

fn board_columns<'a>(registry: &'a StageRegistry, deals: &'a [Deal]) -> Vec<BoardColumn<'a>> {
    registry
        .stages()
        .iter()
        .map(|stage| BoardColumn {
            stage,
            deals: deals
                .iter()
                .filter(|d| d.stage_id() == Some(stage.id.as_str()))
                .collect(),
        })
        .collect()
}

/// Has the deal sat in its stage longer than the stage allows?
fn is_overdue(stage: &Stage, deal: &Deal, now: DateTime<Utc>) -> bool {
    stage
        .time_limit_days
        .is_some_and(|days| deal.time_in_stage(now) > Duration::days(i64::from(days)))
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

/// Dollar amount with thousands separators.
fn format_amount(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}.{:02}", grouped, cents % 100)
}

fn format_days(d: Duration) -> String {
    format!("{}d", d.num_days())
}

/// Column header text: title plus count.
fn column_header_plain(column: &BoardColumn<'_>, max_width: usize) -> String {
    let suffix = format!(" {}", column.deals.len());
    let suffix_width = UnicodeWidthStr::width(suffix.as_str());
    let name_budget = max_width.saturating_sub(suffix_width).max(1);
    let title = truncate_visual(&column.stage.title.to_uppercase(), name_budget);
    format!("{}{}", title, suffix)
}

fn column_header_colored(column: &BoardColumn<'_>, max_width: usize) -> ColoredString {
    let label = column_header_plain(column, max_width);
    match column.stage.kind {
        StageKind::Pinned => label.blue().bold(),
        StageKind::System(_) => label.yellow().bold(),
        StageKind::User => label.normal().bold(),
    }
}

/// One deal card line, padded to the column width.
fn format_deal_card(deal: &Deal, width: usize, overdue: bool) -> String {
    let indicator = if overdue { "! " } else { "  " };
    let amount = deal.amount.map(format_amount).unwrap_or_default();
    let amount_width = UnicodeWidthStr::width(amount.as_str());
    let name_width = width.saturating_sub(3 + amount_width).max(1);
    let name = pad_right(&truncate_visual(&deal.client_name, name_width), name_width);
    let body = format!("{} {}{}", indicator, name, amount);
    let body = pad_right(&truncate_visual(&body, width), width);
    if overdue {
        body.red().to_string()
    } else {
        body
    }
}

/// Print the pipeline board.
pub fn print_board(registry: &StageRegistry, deals: &[Deal], now: DateTime<Utc>) {
    let columns = board_columns(registry, deals);
    if deals.is_empty() {
        println!("{}", "No open deals.".dimmed());
        return;
    }

    let width = term_width();
    if width < 60 {
        print_board_compact(&columns, now);
    } else {
        print_board_wide(&columns, width, now);
    }
}

/// Side-by-side layout. Narrower terminals hide empty columns.
fn print_board_wide(columns: &[BoardColumn<'_>], term_w: usize, now: DateTime<Utc>) {
    let visible: Vec<&BoardColumn<'_>> = if term_w < 160 {
        columns.iter().filter(|c| !c.deals.is_empty()).collect()
    } else {
        columns.iter().collect()
    };
    if visible.is_empty() {
        return;
    }

    let num_cols = visible.len();
    let available = if term_w > num_cols + 1 {
        term_w - num_cols - 1
    } else {
        num_cols * 10
    };
    let col_width = (available / num_cols).clamp(12, 30);

    let rule = |left: &str, mid: &str, right: &str| {
        let mut line = left.to_string();
        for i in 0..num_cols {
            line.push_str(&"─".repeat(col_width));
            if i < num_cols - 1 {
                line.push_str(mid);
            }
        }
        line.push_str(right);
        println!("{}", line.dimmed());
    };

    rule("┌", "┬", "┐");
    print!("{}", "│".dimmed());
    for (i, col) in visible.iter().enumerate() {
        let plain = column_header_plain(col, col_width);
        let padding = col_width.saturating_sub(UnicodeWidthStr::width(plain.as_str()));
        let left_pad = padding / 2;
        print!(
            "{}{}{}",
            " ".repeat(left_pad),
            column_header_colored(col, col_width),
            " ".repeat(padding - left_pad)
        );
        if i < num_cols - 1 {
            print!("{}", "│".dimmed());
        }
    }
    println!("{}", "│".dimmed());
    rule("├", "┼", "┤");

    let max_deals = visible.iter().map(|c| c.deals.len()).max().unwrap_or(0);
    for row in 0..max_deals {
        print!("{}", "│".dimmed());
        for (i, col) in visible.iter().enumerate() {
            match col.deals.get(row) {
                Some(deal) => print!("{}", format_deal_card(deal, col_width, is_overdue(col.stage, deal, now))),
                None => print!("{}", " ".repeat(col_width)),
            }
            if i < num_cols - 1 {
                print!("{}", "│".dimmed());
            }
        }
        println!("{}", "│".dimmed());
    }
    rule("└", "┴", "┘");

    print_board_summary(columns);
}

/// Vertical layout for narrow terminals.
fn print_board_compact(columns: &[BoardColumn<'_>], now: DateTime<Utc>) {
    println!("{}", " PIPELINE ".on_blue().white().bold());
    println!();

    for col in columns.iter().filter(|c| !c.deals.is_empty()) {
        println!(" {} {}", "▸".dimmed(), column_header_colored(col, 30));
        for deal in &col.deals {
            let title: ColoredString = if is_overdue(col.stage, deal, now) {
                deal.client_name.as_str().red()
            } else {
                deal.client_name.as_str().normal()
            };
            let amount = deal.amount.map(format_amount).unwrap_or_default();
            println!("   {} {} {}", title, amount.green(), deal.id.dimmed());
        }
        println!();
    }
    print_board_summary(columns);
}

fn print_board_summary(columns: &[BoardColumn<'_>]) {
    let total: usize = columns.iter().map(|c| c.deals.len()).sum();
    let value: f64 = columns
        .iter()
        .flat_map(|c| c.deals.iter())
        .filter_map(|d| d.amount)
        .sum();
    println!(
        " {} {} deals {} {} in quotes",
        "■".cyan(),
        total.to_string().bold(),
        "·".dimmed(),
        format_amount(value).green()
    );
}

/// Print deals as a table.
pub fn print_deals_table(registry: &StageRegistry, deals: &[Deal], now: DateTime<Utc>) {
    if deals.is_empty() {
        println!("{}", "No deals found.".dimmed());
        return;
    }

    println!(
        "{:<14} {:<24} {:<24} {:<24} {:>12} {:>6}",
        "ID", "Client", "Title", "Stage", "Amount", "Age"
    );
    println!("{}", "─".repeat(109));

    for deal in deals {
        let stage = match &deal.placement {
            Placement::Stage(id) => {
                let title = registry.get(id).map_or(id.as_str(), |s| s.title.as_str());
                pad_right(&truncate_visual(title, 24), 24).normal()
            }
            Placement::Closed(outcome) => {
                let label = pad_right(outcome.label(), 24);
                match outcome {
                    ClosedOutcome::Won => label.green(),
                    ClosedOutcome::Lost => label.dimmed(),
                }
            }
        };
        println!(
            "{} {} {} {} {:>12} {:>6}",
            pad_right(&truncate_visual(&deal.id, 14), 14).dimmed(),
            pad_right(&truncate_visual(&deal.client_name, 24), 24),
            pad_right(&truncate_visual(&deal.title, 24), 24),
            stage,
            deal.amount.map(format_amount).unwrap_or_else(|| "-".to_string()),
            format_days(deal.age(now))
        );
    }

    println!();
    println!("{} deal(s) total", deals.len());
}

/// Print headline metrics.
pub fn print_metrics(metrics: &PipelineMetrics, window_days: i64) {
    println!("{}", "Pipeline Metrics".bold());
    println!();
    println!("  {:<24} {}", "Open leads", metrics.open_leads.to_string().cyan());
    println!(
        "  {:<24} {}",
        format!("Conversion ({}d)", window_days),
        format!("{:.1}%", metrics.conversion_rate).cyan()
    );
    println!("  {:<24} {}", "Pipeline value", format_amount(metrics.pipeline_value).green());
    println!("  {:<24} {} day(s)", "Average lead age", metrics.average_lead_age_days);
    println!();
}

/// Print per-stage counts and totals.
pub fn print_stage_summaries(summaries: &[StageSummary]) {
    println!("{:<28} {:>6} {:>14}", "Stage", "Deals", "Value");
    println!("{}", "─".repeat(50));
    for summary in summaries {
        let count = if summary.count == 0 {
            summary.count.to_string().dimmed()
        } else {
            summary.count.to_string().normal()
        };
        println!(
            "{} {:>6} {:>14}",
            pad_right(&truncate_visual(&summary.title, 28), 28),
            count,
            format_amount(summary.total_amount)
        );
    }
    println!();
}

/// Print deals past their stage's time limit.
pub fn print_overdue(registry: &StageRegistry, deals: &[&Deal], now: DateTime<Utc>) {
    if deals.is_empty() {
        println!("{} No deals past their stage time limit", "✓".green());
        return;
    }
    println!("{}", "Past stage time limit".bold());
    for deal in deals {
        let stage = deal.stage_id().and_then(|id| registry.get(id));
        let (title, limit) = stage.map_or(("?", 0), |s| (s.title.as_str(), s.time_limit_days.unwrap_or(0)));
        println!(
            "  {} {} in {} for {} (limit {}d)",
            "⚠".red(),
            deal.client_name,
            title.cyan(),
            format_days(deal.time_in_stage(now)).red(),
            limit
        );
    }
}

/// Print the stage registry.
pub fn print_stages(registry: &StageRegistry) {
    println!("{:<4} {:<26} {:<28} {:<8} {:>6}", "#", "ID", "Title", "Kind", "Limit");
    println!("{}", "─".repeat(76));
    for stage in registry.stages() {
        let kind = match stage.kind {
            StageKind::Pinned => pad_right("pinned", 8).blue(),
            StageKind::User => pad_right("user", 8).normal(),
            StageKind::System(_) => pad_right("system", 8).yellow(),
        };
        println!(
            "{:<4} {} {} {} {:>6}",
            stage.order,
            pad_right(&truncate_visual(&stage.id, 26), 26).dimmed(),
            pad_right(&truncate_visual(&stage.title, 28), 28),
            kind,
            stage.time_limit_days.map_or_else(|| "-".to_string(), |d| format!("{}d", d))
        );
    }
}

/// Print clients with their request counts.
pub fn print_clients(rows: &[(&Client, usize)]) {
    if rows.is_empty() {
        println!("{}", "No clients found.".dimmed());
        return;
    }

    println!("{:<10} {:<28} {:<9} {:<32} {:>8}", "ID", "Name", "Status", "Contact", "Requests");
    println!("{}", "─".repeat(91));
    for (client, request_count) in rows {
        let status = pad_right(client.status.as_str(), 9);
        let status = match client.status {
            ClientStatus::Lead => status.yellow(),
            ClientStatus::Active => status.green(),
            ClientStatus::Archived => status.dimmed(),
        };
        println!(
            "{} {} {} {} {:>8}",
            pad_right(&truncate_visual(&client.id, 10), 10).dimmed(),
            pad_right(&truncate_visual(&client.name, 28), 28),
            status,
            pad_right(&truncate_visual(&client.contact_line(), 32), 32),
            request_count
        );
    }
}

/// Print records left out of derivation.
pub fn print_orphans(orphans: &[Orphan]) {
    for orphan in orphans {
        println!(
            "{} {} {} skipped: client {} not found",
            "⚠".yellow(),
            orphan.kind,
            orphan.id.dimmed(),
            orphan.client_id
        );
    }
}

/// Print a rejected action.
pub fn print_denied(notice: &str) {
    println!("{} {}", "✗".red().bold(), notice.yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "$0.00");
        assert_eq!(format_amount(800.0), "$800.00");
        assert_eq!(format_amount(1250.5), "$1,250.50");
        assert_eq!(format_amount(1234567.891), "$1,234,567.89");
    }

    #[test]
    fn test_truncate_visual() {
        assert_eq!(truncate_visual("Birchwood HOA", 20), "Birchwood HOA");
        assert_eq!(truncate_visual("Acme Property Management", 10), "Acme Pro..");
        assert_eq!(pad_right("abc", 5), "abc  ");
    }
}
