//! Human-readable run log on stdout.
//!
//! Diagnostics go through `tracing` to stderr; this is the narrative a CI log
//! reader follows.

pub mod icons;

use chrono::Local;
use console::style;

use crate::classifier::Category;
use crate::dispatch::{AttemptStatus, FixAttempt};
use crate::fixes::FixOutcome;
use crate::github::Issue;
use icons::*;

const RULE_WIDTH: usize = 60;

/// Title length used in log lines.
const TITLE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn print_header(repo: Option<&str>, max_fixes: usize, dry_run: bool) {
    println!("{}", style("Auto-Fix Issues").bold());
    if let Some(repo) = repo {
        println!("   Repository: {}", style(repo).cyan());
    }
    println!("   Max fixes: {}", max_fixes);
    println!("   Dry run: {}", dry_run);
    println!("   Timestamp: {}", Local::now().format("%Y-%m-%dT%H:%M:%S"));
    println!("{}", rule());
}

pub fn print_issue_count(count: usize) {
    println!("\n{}Found {} open issues", CLIPBOARD, count);
}

pub fn print_listing_failed(error: &anyhow::Error) {
    println!("\n{}Could not list issues: {:#}", CROSS, error);
}

/// One line per selected issue.
pub fn print_candidate(issue: &Issue, category: Option<Category>) {
    match category {
        Some(category) => println!(
            "  {}#{}: [{}] {}",
            CHECK,
            issue.number,
            style(category).yellow(),
            issue.short_title(TITLE_WIDTH)
        ),
        None => println!(
            "  {}#{}: [{}] {}",
            GENERIC,
            issue.number,
            style("generic").dim(),
            issue.short_title(TITLE_WIDTH)
        ),
    }
}

pub fn print_fix_start(issue: &Issue, category: Option<Category>) {
    println!("\n{}", rule());
    println!("{}Fixing #{}: {}", WRENCH, issue.number, issue.title);
    println!(
        "   Category: {}",
        category.map(|c| c.as_str()).unwrap_or("unclassified")
    );
}

pub fn print_attempt(attempt: &FixAttempt) {
    if let Some(branch) = &attempt.branch {
        println!("   {}{}", BRANCH, style(branch).dim());
    }
    match &attempt.status {
        AttemptStatus::Fixed { pull_request } => {
            println!("   {}Fix applied successfully!", CHECK);
            println!(
                "   PR: {}",
                style(pull_request.as_deref().unwrap_or("dry-run")).cyan()
            );
        }
        AttemptStatus::NoChange => {
            println!("   {}No auto-fix available for this issue", SKIP);
        }
        AttemptStatus::Failed(message) => {
            println!("   {}Error fixing issue: {}", CROSS, style(message).red());
        }
    }
}

pub fn print_no_fixable() {
    println!("\n{}No fixable issues found!", SPARKLE);
    println!("\n{}Running general maintenance fixes...", WRENCH);
}

pub fn print_maintenance(outcome: &anyhow::Result<FixOutcome>) {
    match outcome {
        Ok(FixOutcome::Fixed { pull_request, .. }) => println!(
            "{}Maintenance PR: {}",
            CHECK,
            style(pull_request.as_deref().unwrap_or("dry-run")).cyan()
        ),
        Ok(FixOutcome::NoChange { .. }) => println!("No maintenance changes needed."),
        Err(err) => println!("{}Maintenance failed: {:#}", CROSS, err),
    }
}

pub fn print_summary(applied: usize, max_fixes: usize, failed: usize) {
    println!("\n{}", rule());
    if failed > 0 {
        println!(
            "{}Summary: {}/{} fixes applied, {} failed",
            PROGRESS, applied, max_fixes, failed
        );
    } else {
        println!(
            "{}Summary: {}/{} fixes applied",
            PROGRESS, applied, max_fixes
        );
    }
}
