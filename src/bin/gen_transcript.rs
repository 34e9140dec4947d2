//! Synthetic transcript generator for stress testing chatlens.
//!
//! Usage: cargo run --features gen-test --bin gen_transcript -- [messages] [output] [format]
//! Example: cargo run --features gen-test --bin gen_transcript -- 100000 big_chat.txt dashed

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

const SENDERS: &[&str] = &["Alice", "Bob", "Priya", "Rahul", "Мария", "🔥FireUser🔥"];

const FILLER: &[&str] = &[
    "kal milte hain",
    "pizza khana hai",
    "movie dekhne chalein",
    "office mein bahut kaam hai",
    "haha sach mein",
    "ok done",
    "kya kar rahe ho",
    "chai peete hain",
];

const COMPLIMENTS: &[&str] = &["you look beautiful", "tum bahut cute ho", "amazing yaar", "so sweet"];

const RED_FLAGS: &[&str] = &["mujhe ignore mat karo", "itna gussa kyun", "why so jealous"];

const SYSTEM_LINES: &[&str] = &[
    "Messages and calls are end-to-end encrypted.",
    "<Media omitted>",
    "This message was deleted",
];

#[derive(Clone, Copy)]
enum Grammar {
    Bracketed,
    Dashed,
    Mixed,
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100_000);
    let output = args.get(2).map(String::as_str).unwrap_or("big_chat.txt");
    let grammar = match args.get(3).map(String::as_str).unwrap_or("mixed") {
        "bracketed" | "ios" => Grammar::Bracketed,
        "dashed" | "android" => Grammar::Dashed,
        "mixed" => Grammar::Mixed,
        other => {
            eprintln!("Unknown format: {other}. Use 'bracketed', 'dashed' or 'mixed'");
            std::process::exit(1);
        }
    };

    println!("Transcript generator");
    println!("   Messages: {count}");
    println!("   Output:   {output}");

    let file = File::create(output)?;
    let mut writer = BufWriter::with_capacity(1024 * 1024, file);
    let mut rng = rand::thread_rng();

    let start = Instant::now();
    let mut bytes_written: usize = 0;
    let mut at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap_or_default();

    for i in 0..count {
        at += next_gap(&mut rng);
        let sender = SENDERS.choose(&mut rng).copied().unwrap_or("Alice");
        let text = generate_message(&mut rng);

        let grammar = match grammar {
            Grammar::Mixed if i % 2 == 0 => Grammar::Bracketed,
            Grammar::Mixed => Grammar::Dashed,
            g => g,
        };
        let mut line = format!("{} {sender}: {text}\n", prefix(grammar, at));

        // Continuation lines and noise
        if i % 50 == 25 {
            line.push_str("aur haan ek aur baat\n");
        }
        if i % 1000 == 500 {
            line.push_str("garbage line without any header\n");
        }

        bytes_written += line.len();
        writer.write_all(line.as_bytes())?;
    }

    writer.flush()?;

    let elapsed = start.elapsed();
    println!("Done!");
    println!("   Size:  {:.2} MB", bytes_written as f64 / 1_000_000.0);
    println!("   Time:  {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

/// Mostly minutes apart, sometimes a new day.
fn next_gap(rng: &mut impl Rng) -> Duration {
    if rng.gen_range(0..100) < 3 {
        Duration::hours(rng.gen_range(24..72))
    } else {
        Duration::minutes(rng.gen_range(0..30))
    }
}

fn prefix(grammar: Grammar, at: DateTime<Utc>) -> String {
    match grammar {
        Grammar::Dashed => format!("{} -", at.format("%d/%m/%y, %H:%M")),
        _ => format!("[{}]", at.format("%m/%d/%Y, %-I:%M %p")),
    }
}

fn pick(list: &[&str], rng: &mut impl Rng) -> String {
    list.choose(rng).copied().unwrap_or_default().to_string()
}

fn generate_message(rng: &mut impl Rng) -> String {
    match rng.gen_range(0..20) {
        0 => pick(COMPLIMENTS, rng),
        1 => pick(RED_FLAGS, rng),
        2 => pick(SYSTEM_LINES, rng),
        3 => format!("{} 😂😂", pick(FILLER, rng)),
        _ => pick(FILLER, rng),
    }
}
