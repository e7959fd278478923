//! Text rendering of a table report

use std::fmt::Write;

use dining_core::TableReport;

/// Render `report` as aligned columns
pub fn render(report: &TableReport) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<12} {:>8} {:>12} {:>8} {:>12} {:>8} {:>12}",
        "Philosopher", "Thinking", "avg (ms)", "Hungry", "avg (ms)", "Eating", "avg (ms)"
    );
    for p in &report.philosophers {
        let _ = writeln!(
            out,
            "{:<12} {:>8} {:>12.2} {:>8} {:>12.2} {:>8} {:>12.2}",
            p.id,
            p.thinking.turns,
            p.thinking.average_ms,
            p.hungry.turns,
            p.hungry.average_ms,
            p.eating.turns,
            p.eating.average_ms
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{:<12} {:>12} {:>8}", "Utensil", "Acquired", "Timeouts");
    for u in &report.utensils {
        let _ = writeln!(out, "{:<12} {:>12} {:>8}", u.id, u.acquisitions, u.timeouts);
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Seed {}: {} meals served in {:.0}ms",
        report.seed,
        report.total_meals(),
        report.elapsed_ms
    );

    out
}
