use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::profile::FarmProfile;
use crate::wire::{ChatMessage, CropSuggestion};

pub fn show_profile(p: &FarmProfile) {
    println!("\n{}", "=== FARM PROFILE ===".bold());
    println!("  {:<18} {}", "Soil type:".bold(), p.soil_type);
    println!("  {:<18} {} acres", "Land size:".bold(), p.land_size);
    println!("  {:<18} {}", "Location:".bold(), p.location);
    println!("  {:<18} {}", "Water:".bold(), p.water_availability);
    let previous = if p.previous_crops.trim().is_empty() { "-" } else { p.previous_crops.as_str() };
    println!("  {:<18} {}", "Previous crops:".bold(), previous);
    if let Some(issues) = p.current_issues() {
        println!("  {:<18} {}", "Current issues:".bold(), issues);
    }
    println!();
}

fn confidence_label(c: u8) -> String {
    let text = format!("{c}% match");
    match c {
        75..=100 => text.green().bold().to_string(),
        40..=74 => text.yellow().bold().to_string(),
        _ => text.red().bold().to_string(),
    }
}

pub fn show_suggestions(list: &[CropSuggestion]) {
    println!("\n{}", "=== CROP SUGGESTIONS ===".bold());
    for (i, s) in list.iter().enumerate() {
        println!(
            "{}. {}  {}",
            i + 1,
            s.name.green().bold(),
            confidence_label(s.confidence)
        );
        println!(
            "   {} {}   {} {}   {} {}",
            "Water:".cyan(), s.water_needs,
            "Sun:".yellow(), s.sunlight,
            "Temp:".magenta(), s.temperature
        );
        println!("   {}", s.description);

        if s.organic_guide.is_empty() {
            println!();
            continue;
        }
        println!("   {}", "Organic farming guide".bold());
        for (phase, steps) in s.organic_guide.phases() {
            if steps.is_empty() {
                continue;
            }
            println!("     {}", phase.underline());
            for (n, step) in steps.iter().enumerate() {
                println!("       {}. {}", n + 1, step);
            }
        }
        println!();
    }
}

pub fn show_message(m: &ChatMessage) {
    let who = if m.is_bot { "Guide".green().bold() } else { "You".cyan().bold() };
    let at = m.timestamp.with_timezone(&chrono::Local).format("%H:%M");
    if m.loading {
        println!("[{}] {}: {}", at, who, "thinking…".dimmed());
        return;
    }
    println!("[{}] {}: {}", at, who, m.text);
    if m.image_url.is_some() {
        println!("        {}", "(photo attached)".dimmed());
    }
}

pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        let ans = s.trim().to_lowercase();
        ans == "y" || ans == "yes"
    } else {
        false
    }
}

/// `None` on end of input.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().lock().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim_end_matches(['\r', '\n']).to_string()),
    }
}

pub fn spinner(msg: &str, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}
