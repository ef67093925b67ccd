//! Scan a short text for a handful of phrases.
//!
//! Run with `RUST_LOG=debug cargo run --example scan_text` to see the
//! compile statistics.

use seqmatch::{PatternMatcher, PatternMatches, Result};

fn main() -> Result<()> {
    env_logger::init();

    let mut matcher = PatternMatcher::new();
    for (key, phrase) in [
        "new york",
        "york",
        "new york city",
        "city",
        "city hall",
        "hall",
    ]
    .iter()
    .enumerate()
    {
        matcher.add_pattern(key, phrase)?;
    }
    matcher.compile()?;

    let text = "we walked from new york city hall to the old york city gate";
    let mut plain = PatternMatches::without_suffixes();
    matcher.find_patterns(text, &mut plain)?;

    let mut all = PatternMatches::with_suffixes();
    matcher.complete_with_suffix_matches(&plain, &mut all)?;

    println!("longest matches:");
    for m in &plain {
        println!("  pattern {} ends at word {}", m.key, m.end_pos);
    }
    println!("all matches:");
    for m in &all {
        println!("  pattern {} ends at word {}", m.key, m.end_pos);
    }
    Ok(())
}
