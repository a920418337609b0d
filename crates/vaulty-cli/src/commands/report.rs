//! Issue table printing

use colored::{ColoredString, Colorize};
use vaulty_core::{Issue, IssueCounts, Severity};

use super::plural;

const SEVERITY_WIDTH: usize = 8;
const MESSAGE_WIDTH: usize = 60;

/// Print `issues` as a table followed by their counts.
pub fn print_issues(issues: &[Issue]) {
    let counts = IssueCounts::of(issues);
    if counts.total == 0 {
        println!("{}", "No issues found".dimmed());
        return;
    }

    let headline = |text: &str| -> ColoredString {
        if counts.errors > 0 {
            text.red().bold()
        } else {
            text.yellow().bold()
        }
    };

    println!("{}", headline("The following issues were found."));
    println!();
    for line in issue_table(issues) {
        println!("{line}");
    }
    println!();

    let marker = if counts.errors > 0 { "✖" } else { "⚠" };
    println!("{}", headline(&format!("{marker} {}", summary(&counts))));
    if counts.fixes > 0 {
        println!(
            "{}",
            headline(&format!(
                "⚒ {} available with \"{}\"",
                plural(counts.fixes, "fix", "fixes"),
                "vaulty audit fix".italic()
            ))
        );
    }
}

/// `3 issues (1 error, 2 warnings)`.
pub fn summary(counts: &IssueCounts) -> String {
    format!(
        "{} ({}, {})",
        plural(counts.total, "issue", "issues"),
        plural(counts.errors, "error", "errors"),
        plural(counts.warnings, "warning", "warnings"),
    )
}

/// Table rows: fix marker, scope, severity, message, source.
///
/// Columns are padded before coloring. Multi-line messages continue under
/// the message column.
fn issue_table(issues: &[Issue]) -> Vec<String> {
    let scope_width = issues
        .iter()
        .map(|issue| issue.scope.as_str().len())
        .chain(["Scope".len()])
        .max()
        .unwrap_or_default();
    let message_width = issues
        .iter()
        .flat_map(|issue| issue.message.lines())
        .map(|line| line.chars().count())
        .chain(["Message".len()])
        .max()
        .unwrap_or_default()
        .min(MESSAGE_WIDTH);

    let mut lines = vec![format!(
        "  {}  {}  {}  {}",
        pad("Scope", scope_width).bold(),
        pad("Severity", SEVERITY_WIDTH).bold(),
        pad("Message", message_width).bold(),
        "Source".bold()
    )];

    let continuation = 2 + scope_width + 2 + SEVERITY_WIDTH + 2;
    for issue in issues {
        let fix = if issue.fix.is_some() {
            "⚒".dimmed()
        } else {
            " ".normal()
        };
        let severity = pad(issue.severity.as_str(), SEVERITY_WIDTH);
        let severity = match issue.severity {
            Severity::Error => severity.red(),
            Severity::Warn => severity.yellow(),
        };
        let source = issue.source.as_deref().unwrap_or("n/a");

        let mut message = issue.message.lines();
        lines.push(format!(
            "{} {}  {}  {}  {}",
            fix,
            pad(issue.scope.as_str(), scope_width).dimmed(),
            severity,
            pad(message.next().unwrap_or_default(), message_width),
            source.dimmed()
        ));
        for line in message {
            lines.push(format!("{:continuation$}{line}", ""));
        }
    }
    lines
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}
