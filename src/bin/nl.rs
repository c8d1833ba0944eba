use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;

/// Number the lines of a file, or of stdin when no file is given.
#[derive(Parser)]
#[command(name = "nl")]
struct Args {
    file: Option<PathBuf>,
}

fn number_lines(input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
    for (index, line) in input.lines().enumerate() {
        writeln!(output, "{:>6}\t{}", index + 1, line?)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let stdout = io::stdout().lock();
    match args.file {
        Some(path) => number_lines(BufReader::new(std::fs::File::open(path)?), stdout),
        None => number_lines(io::stdin().lock(), stdout),
    }
}
