//! Offline tokenizer command

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use lexiplan_core::{tokenize, Token};

/// Arguments for the tokenize command
#[derive(Parser, Debug)]
pub struct TokenizeArgs {
    /// Sentence to split (reads stdin when omitted)
    pub text: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    text: &'a str,
    tokens: Vec<Token>,
}

/// Print `{ text, tokens }` for the given sentence
pub fn run_tokenize(args: TokenizeArgs) -> Result<()> {
    let text = match args.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let output = Output {
        text: &text,
        tokens: tokenize(&text),
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");
    Ok(())
}
