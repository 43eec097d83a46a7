use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use corvid::ast::Stmt;
use corvid::error::{CorvidError, ErrorReporter};
use corvid::interpreter::Interpreter;
use corvid::parser::Parser;
use corvid::resolver::Resolver;
use corvid::scanner::scan;
use corvid::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the source file to run
    source: Vec<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let args: Cli = Cli::parse();

    let mut reporter: ErrorReporter = ErrorReporter::new();

    // Exactly one source path; zero or several is a usage error.
    let [path] = &args.source[..] else {
        reporter.error(&CorvidError::lex(0, "Source file not provided!"));

        return Ok(ExitCode::from(64));
    };

    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
    reader.read_to_end(&mut buf)?;

    // Scan errors don't stop the parser: the tokens on either side of a bad
    // lexeme still produce useful diagnostics.
    let tokens: Vec<Token> = scan(&buf, &mut reporter);

    let statements: Vec<Stmt> = Parser::new(tokens, &mut reporter).parse();

    if reporter.had_error() {
        return Ok(ExitCode::from(65));
    }

    let mut interpreter: Interpreter = Interpreter::default();

    Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

    if reporter.had_error() {
        return Ok(ExitCode::from(65));
    }

    interpreter.interpret(&statements, &mut reporter);

    if reporter.had_runtime_error() {
        return Ok(ExitCode::from(70));
    }

    Ok(ExitCode::SUCCESS)
}
