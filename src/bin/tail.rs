use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;

const FILE_LINES: usize = 10;
const STDIN_LINES: usize = 17;

/// Print the last lines of each file, or of stdin when no file is given.
#[derive(Parser)]
#[command(name = "tail")]
struct Args {
    files: Vec<PathBuf>,
}

fn last_lines(lines: &[String], count: usize) -> &[String] {
    let start = lines.len().saturating_sub(count);
    &lines[start..]
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let lines = BufReader::new(file).lines().collect::<Result<_, _>>()?;
    Ok(lines)
}

fn main() {
    let args = Args::parse();

    if args.files.is_empty() {
        let lines: Vec<String> = io::stdin().lock().lines().map_while(Result::ok).collect();
        for line in last_lines(&lines, STDIN_LINES) {
            println!("{}", line);
        }
        return;
    }

    let print_header = args.files.len() > 1;
    for (index, path) in args.files.iter().enumerate() {
        if index > 0 && print_header {
            println!();
        }
        if print_header {
            println!("==> {} <==", path.display());
        }
        match read_lines(path) {
            Ok(lines) => {
                for line in last_lines(&lines, FILE_LINES) {
                    println!("{}", line);
                }
            }
            Err(e) => eprintln!("tail: {}: {}", path.display(), e),
        }
    }
}
