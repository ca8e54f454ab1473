use std::io::{self, Write};
use std::path::Path;

use graph_forge::io::{SourceMode, Units};
use graph_forge::{DatasetSummary, RejectionReason, RunMetadata};

use crate::util::convert::source_display_name;
use crate::util::text::{percent, threshold, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

const MAX_ROWS: usize = 15;

pub fn print_store_info(
    name: &str,
    root: &Path,
    mode: SourceMode,
    units: Units,
    molecules: usize,
    conformations: Option<usize>,
) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut rows = vec![
        ("Name", name.to_string()),
        ("Location", root.display().to_string()),
        ("Layout", source_display_name(mode).to_string()),
        ("Raw units", format!("{}, {}", units.energy, units.length)),
        ("Molecules", molecules.to_string()),
    ];
    if let Some(count) = conformations {
        rows.push(("Conformations", count.to_string()));
    }

    print_kv_table(&mut out, "Structure Set", &rows);
}

pub fn print_settings(metadata: &RunMetadata) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let energy = metadata.energy_unit.as_str();
    let force = format!("{}/Å", metadata.energy_unit);
    let rows = vec![
        ("Max energy", threshold(metadata.max_energy, energy)),
        ("Max force", threshold(metadata.max_force, &force)),
        ("Duplicate tolerance", threshold(metadata.duplicate_tolerance, "Å")),
        ("Energy reference", metadata.energy_reference.clone()),
        ("Non-bonded cutoff", threshold(metadata.nonbonded_cutoff, "Å")),
        ("Charges", metadata.charge_method.clone()),
    ];

    print_kv_table(&mut out, "Settings", &rows);
}

pub fn print_summary(summary: &DatasetSummary) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let range = |r: Option<graph_forge::dataset::ValueRange>| match r {
        Some(r) => format!("{:.2} … {:.2} (mean {:.2})", r.min, r.max, r.mean),
        None => "n/a".to_string(),
    };

    let rows = vec![
        ("Molecules processed", summary.molecules_processed.to_string()),
        ("Molecules assigned", summary.molecules_assigned.to_string()),
        ("Failed assignment", summary.molecules_failed.to_string()),
        ("All rejected", summary.molecules_all_rejected.to_string()),
        ("Conformations read", summary.conformations_total.to_string()),
        ("Conformations kept", summary.conformations_accepted.to_string()),
        ("Rel. energy (kcal/mol)", range(summary.relative_energy)),
        ("|F| (kcal/mol/Å)", range(summary.force_magnitude)),
    ];

    print_kv_table(&mut out, "Dataset Summary", &rows);
}

/// Conformation rejections by reason, then assignment failures by kind.
pub fn print_rejections(summary: &DatasetSummary) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let reasons: Vec<(String, usize)> = RejectionReason::ALL
        .iter()
        .map(|r| (r.to_string(), summary.rejected.get(*r)))
        .filter(|(_, count)| *count > 0)
        .collect();
    if !reasons.is_empty() {
        print_distribution_table(
            &mut out,
            "Rejected Conformations",
            "Reason",
            &reasons,
            summary.conformations_total,
        );
    }

    let mut failures: Vec<(String, usize)> = summary
        .assignment_failures
        .iter()
        .map(|(kind, count)| (kind.replace('_', " "), *count))
        .collect();
    failures.sort_by(|a, b| b.1.cmp(&a.1));
    if !failures.is_empty() {
        print_distribution_table(
            &mut out,
            "Assignment Failures",
            "Kind",
            &failures,
            summary.molecules_processed,
        );
    }
}

fn print_distribution_table(
    out: &mut impl Write,
    title: &str,
    label: &str,
    data: &[(String, usize)],
    total: usize,
) {
    let name_w = 22usize;
    let count_w = 7usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead + 4);
    let max_bar_width = dist_w.saturating_sub(8).min(12);

    let rule = |l: &str, m: &str, r: &str| {
        format!(
            "{INDENT}{l}{}{m}{}{m}{}{r}",
            "─".repeat(name_w + 2),
            "─".repeat(count_w + 2),
            "─".repeat(dist_w + 2)
        )
    };

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
        label, "Count", "Share"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (name, count) in data.iter().take(MAX_ROWS) {
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
    if data.len() > MAX_ROWS {
        let _ = writeln!(
            out,
            "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            "...",
            "...",
            format!("({} more)", data.len() - MAX_ROWS)
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 22usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let rule = |l: &str, m: &str, r: &str| {
        format!(
            "{INDENT}{l}{}{m}{}{r}",
            "─".repeat(key_w + 2),
            "─".repeat(val_w + 2)
        )
    };

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
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
    let filled = ((pct / 100.0) * max_width as f64).round() as usize;
    let filled = filled.min(max_width);
    format!("{}{}", "█".repeat(filled), "░".repeat(max_width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_clamped() {
        assert_eq!(make_bar(50.0, 4), "██░░");
        assert_eq!(make_bar(150.0, 4), "████");
        assert_eq!(make_bar(0.0, 3), "░░░");
    }

    #[test]
    fn kv_rows_fit_the_box() {
        let mut buf = Vec::new();
        print_kv_table(
            &mut buf,
            "Settings",
            &[("Max energy", "50 kcal/mol".to_string())],
        );
        let text = String::from_utf8(buf).unwrap();
        let widths: Vec<usize> = text
            .lines()
            .skip(1)
            .map(|l| l.chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{text}");
    }
}
