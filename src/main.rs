use anyhow::Result;
use clap::Parser as ClapParser;
use pascalet::config::Dialect;
use pascalet::diagnostics;
use pascalet::interpreter::environment::Environment;
use pascalet::interpreter::Interpreter;
use pascalet::keywords::{load_keywords, Keywords};
use pascalet::parser::Parser;
use pascalet::scanner::Scanner;
use rustyline::DefaultEditor;
use std::fs;
use std::io::{self, BufRead, Write};

#[derive(ClapParser)]
#[command(name = "pascalet")]
#[command(about = "A tree-walking interpreter for a small Pascal-flavored language")]
struct Cli {
    /// Script file to run (omit for REPL)
    script: Option<String>,

    /// Path to keywords JSON file
    #[arg(short, long)]
    keywords: Option<String>,

    /// Parse + and - left-associatively instead of the historical
    /// right-recursive grammar
    #[arg(long)]
    left_assoc_sums: bool,

    /// Evaluate an IF condition once even when an ELSE branch is present
    #[arg(long)]
    single_eval_else: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let keywords = load_keywords(cli.keywords.as_deref())?;
    let dialect = Dialect {
        left_assoc_sums: cli.left_assoc_sums,
        single_eval_else: cli.single_eval_else,
    };
    let mut interpreter = Interpreter::new(
        Environment::new(),
        dialect,
        io::stdin().lock(),
        io::stdout(),
    );

    match cli.script {
        None => run_prompt(&keywords, dialect, &mut interpreter)?,
        Some(path) => run_file(&path, &keywords, dialect, &mut interpreter)?,
    }

    Ok(())
}

fn run_prompt<R: BufRead, W: Write>(
    keywords: &Keywords,
    dialect: Dialect,
    interpreter: &mut Interpreter<R, W>,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut buffer = String::new();

    let history_path = dirs::home_dir().map(|p| p.join(".pascalet_history"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if buffer.is_empty() { "> " } else { "| " };

        match rl.readline(prompt) {
            Ok(line) => {
                buffer.push_str(&line);
                buffer.push('\n');

                if is_complete(&buffer, keywords) {
                    if !buffer.trim().is_empty() {
                        let _ = rl.add_history_entry(buffer.trim());
                        run(&buffer, keywords, dialect, interpreter);
                    }
                    buffer.clear();
                }
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                buffer.clear();
                println!("^C");
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

// A buffered snippet is runnable once every BEGIN has its END. Line comments
// are stripped first so a commented-out BEGIN does not hold the prompt open.
fn is_complete(code: &str, keywords: &Keywords) -> bool {
    let mut depth: i64 = 0;
    for line in code.lines() {
        let line = match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        };
        for word in line.split(|c: char| !c.is_ascii_alphanumeric()) {
            if word == keywords.begin {
                depth += 1;
            } else if word == keywords.end {
                depth -= 1;
            }
        }
    }
    depth <= 0
}

fn run_file<R: BufRead, W: Write>(
    path: &str,
    keywords: &Keywords,
    dialect: Dialect,
    interpreter: &mut Interpreter<R, W>,
) -> Result<()> {
    let contents = fs::read_to_string(path)?;
    run(&contents, keywords, dialect, interpreter);
    Ok(())
}

fn run<R: BufRead, W: Write>(
    source: &str,
    keywords: &Keywords,
    dialect: Dialect,
    interpreter: &mut Interpreter<R, W>,
) {
    let scanner = Scanner::new(source);
    let parser = match Parser::new(scanner, keywords.clone(), dialect) {
        Ok(parser) => parser,
        Err(e) => {
            eprint!("{}", diagnostics::render(source, "parse", e.line, &e.message));
            return;
        }
    };

    match parser.parse_program() {
        Ok(program) => {
            if let Err(e) = interpreter.run(&program) {
                eprintln!("error[runtime]: {}", e.message);
            }
        }
        Err(e) => {
            eprint!("{}", diagnostics::render(source, "parse", e.line, &e.message));
        }
    }
}
