use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;

/// Print newline, word and byte counts for each file, or for stdin.
#[derive(Parser)]
#[command(name = "wc")]
struct Args {
    files: Vec<PathBuf>,
}

fn count_stats(content: &str) -> (usize, usize, usize) {
    let lines = content.matches('\n').count();
    let words = content.split_whitespace().count();
    let bytes = content.len();
    (lines, words, bytes)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.files.is_empty() {
        let mut content = String::new();
        io::stdin().lock().read_to_string(&mut content)?;
        let (lines, words, bytes) = count_stats(&content);
        println!("{:>8} {:>8} {:>8}", lines, words, bytes);
        return Ok(());
    }

    let (mut total_lines, mut total_words, mut total_bytes) = (0, 0, 0);
    for path in &args.files {
        let (lines, words, bytes) = match std::fs::read_to_string(path) {
            Ok(content) => count_stats(&content),
            Err(e) => {
                eprintln!("wc: {}: {}", path.display(), e);
                (0, 0, 0)
            }
        };
        println!("{:>8} {:>8} {:>8} {}", lines, words, bytes, path.display());
        total_lines += lines;
        total_words += words;
        total_bytes += bytes;
    }

    if args.files.len() > 1 {
        println!(
            "{:>8} {:>8} {:>8} total",
            total_lines, total_words, total_bytes
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_stats() {
        assert_eq!(count_stats("one two\nthree\n"), (2, 3, 14));
        assert_eq!(count_stats(""), (0, 0, 0));
        assert_eq!(count_stats("no newline"), (0, 2, 10));
    }

    #[test]
    fn test_count_stats_bytes_not_chars() {
        // Cyrillic is two bytes per letter in UTF-8.
        assert_eq!(count_stats("да\n"), (1, 1, 5));
    }
}
