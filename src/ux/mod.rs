use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use crate::normalize::Provenance;
use crate::wire::{AutomationCase, AutomationRecommendationSet};

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn show_result(set: &AutomationRecommendationSet, provenance: Option<&Provenance>, example_data: bool) {
    if example_data {
        print_example_notice(provenance);
    }
    if !set.role_analysis.is_empty() {
        println!("\n{}", "=== ROLE ANALYSIS ===".bold());
        println!("{}", set.role_analysis);
    }
    if !set.best_practices.is_empty() {
        println!("\n{}", "=== BEST PRACTICES ===".bold());
        println!("{}", set.best_practices);
    }
    println!("\n{}", format!("=== AUTOMATION CASES ({}) ===", set.automation_cases.len()).bold());
    show_cases(&set.automation_cases, 0);
}

/// Prints `cases` numbered from `offset + 1`; ids use the absolute index.
pub fn show_cases(cases: &[AutomationCase], offset: usize) {
    for (i, c) in cases.iter().enumerate() {
        let index = offset + i;
        println!(
            "\n{}. {}  {}",
            index + 1,
            c.title.green().bold(),
            c.id(index).dimmed()
        );
        if !c.description.is_empty() {
            println!("{}", indent(&c.description, 3));
        }
        println!(
            "   {}: {}   {}: {}   {}: {}",
            "priority".bold(),
            or_dash(&c.priority),
            "ROI".bold(),
            or_dash(&c.roi_estimate),
            "complexity".bold(),
            or_dash(&c.complexity)
        );
        if !c.tools.is_empty() {
            println!("   {}: {}", "tools".bold(), c.tools.join(", ").cyan());
        }
        let pipeline = &c.automation_pipeline;
        if !pipeline.steps.is_empty() {
            println!("   {} ({})", "pipeline".bold(), or_dash(&pipeline.platform));
            for s in &pipeline.steps {
                println!("     {}. {} [{}] {}", s.step, s.action, s.tool.yellow(), s.description.dimmed());
            }
        }
        if !c.system_prompt.is_empty() {
            println!("   {}:", "system prompt".bold());
            println!("{}", indent(&c.system_prompt, 5));
        }
    }
}

pub fn print_example_notice(provenance: Option<&Provenance>) {
    let detail = match provenance {
        Some(Provenance::Fallback { reason }) => format!("model output was unusable ({reason})"),
        Some(Provenance::Padded { generated, padded }) => {
            format!("model returned {generated} case(s); {padded} example case(s) added")
        }
        _ => "some cases are examples".to_string(),
    };
    println!(
        "\n{} {}",
        "[EXAMPLE DATA]".on_yellow().black().bold(),
        format!("{detail}; these are not tailored to your role.").yellow()
    );
}

pub fn confirm(prompt: &str) -> bool {
    if !io::stdin().is_terminal() {
        return false;
    }
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        let ans = s.trim().to_lowercase();
        ans == "y" || ans == "yes" || ans == "д" || ans == "да"
    } else {
        false
    }
}

/// Reads one trimmed line; `None` when stdin is not a terminal or the line is empty.
pub fn ask_line(prompt: &str) -> Option<String> {
    if !io::stdin().is_terminal() {
        return None;
    }
    print!("{}: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    io::stdin().read_line(&mut s).ok()?;
    let line = s.trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}
