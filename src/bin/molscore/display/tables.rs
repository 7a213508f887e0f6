use std::io::{self, Write};

use molscore::{SubmissionReport, TopOneReport};

use crate::util::text::{percent, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

/// Key/value summary of what was read.
pub fn print_inputs(title: &str, rows: &[(&str, String)]) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    print_kv_table(&mut out, title, rows);
}

/// Valid, unique and novel counts against the submission size.
pub fn print_rate_breakdown(report: &SubmissionReport) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let rows = [
        ("Valid", report.valid),
        ("Unique", report.unique),
        ("Novel", report.novel),
        ("Invalid", report.total - report.valid),
    ];
    print_rate_table(&mut out, "Submission Breakdown", &rows, report.total);
}

pub fn print_top1_summary(report: &TopOneReport) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let rows = [
        ("Scored Rows", report.scored.to_string()),
        ("Dropped Rows", report.dropped.to_string()),
        ("Exact Matches", report.correct.to_string()),
        ("Accuracy", format!("{:.4}", report.accuracy)),
    ];
    print_kv_table(&mut out, "Top-1 Summary", &rows);
}

fn print_rate_table(out: &mut impl Write, title: &str, data: &[(&str, usize)], total: usize) {
    let name_w = 10usize;
    let count_w = 8usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);
    let max_bar_width = dist_w.saturating_sub(8).min(20);

    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{INDENT}{left}{}{mid}{}{mid}{}{right}",
            "─".repeat(name_w + 2),
            "─".repeat(count_w + 2),
            "─".repeat(dist_w + 2)
        )
    };

    let _ = writeln!(
        out,
        "{INDENT}┌─ {} ─┐",
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
        "Molecules", "Count", "of submission"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (name, count) in data {
        let pct = percent(*count, total);
        let cell = format!("{}  {:>5.1}%", make_bar(pct, max_bar_width), pct);
        let _ = writeln!(
            out,
            "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            truncate(name, name_w),
            count,
            cell
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{INDENT}{left}{}{mid}{}{right}",
            "─".repeat(key_w + 2),
            "─".repeat(val_w + 2)
        )
    };

    let _ = writeln!(
        out,
        "{INDENT}┌─ {} ─┐",
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(out, "{INDENT}│ {:<key_w$} │ {:>val_w$} │", "Item", "Value");
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{INDENT}│ {:<key_w$} │ {:>val_w$} │",
            truncate(key, key_w),
            truncate(val, val_w)
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn make_bar(pct: f64, max_width: usize) -> String {
    let filled = (((pct / 100.0) * max_width as f64).round() as usize).min(max_width);
    let empty = max_width - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
