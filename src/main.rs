use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use std::fs;
use std::io::{self, Read};
use std::process;

use textpat::{Pattern, Rule, Text, replace_all};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read text from a file instead of stdin
    #[arg(short, long, global = true, value_name = "FILE")]
    file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print matches of a pattern
    Find {
        pattern: String,

        /// Print all matches, not just the first
        #[arg(short, long)]
        all: bool,

        /// Also print each match's captures
        #[arg(short, long)]
        captures: bool,
    },
    /// Rewrite the text through PATTERN REPLACEMENT rule pairs
    Replace {
        /// One or more PATTERN REPLACEMENT pairs, tried in order
        #[arg(required = true, num_args = 2.., value_names = ["PATTERN", "REPLACEMENT"])]
        rules: Vec<String>,

        /// Backreference marker pattern
        #[arg(short, long, default_value = "\\")]
        backref: String,

        /// Re-expand bracket captures through the rules
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print the chunks between matches, one per line
    Split { pattern: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let input = match args.file.as_ref() {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let text = Text::new(&input);

    match args.command {
        Command::Find {
            pattern,
            all,
            captures,
        } => {
            let pattern = Pattern::new(pattern.as_str());
            let found = if all {
                pattern.find_all(&text)?
            } else {
                pattern.find(&text, 1)?.into_iter().collect()
            };
            if found.is_empty() {
                process::exit(1);
            }
            for m in &found {
                println!("{}:{}", m.index, m.text);
                if captures {
                    for capture in &m.captures {
                        println!("\t{capture}");
                    }
                }
            }
        }
        Command::Replace {
            rules,
            backref,
            recursive,
        } => {
            ensure!(
                rules.len() % 2 == 0,
                "replace expects PATTERN REPLACEMENT pairs, got {} arguments",
                rules.len()
            );
            let rules: Vec<Rule> = rules
                .iter()
                .tuples()
                .map(|(pattern, replacement)| Rule::new(pattern.as_str(), replacement.as_str()))
                .collect();
            let out = replace_all(&text, &rules, &Pattern::new(backref.as_str()), recursive)?;
            print!("{out}");
        }
        Command::Split { pattern } => {
            for chunk in Pattern::new(pattern.as_str()).split(&text)? {
                println!("{chunk}");
            }
        }
    }
    Ok(())
}
