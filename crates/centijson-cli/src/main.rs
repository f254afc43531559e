//! `centijson`: parse a JSON file and write it back out, optionally
//! minimized.
//!
//! A line-for-line rendition of `original_source/utils/json-parse.c`: read
//! the input (a named file, or stdin for `-`/no positional argument) in
//! fixed-size chunks, feed each chunk to the DOM builder, and on success
//! serialize the resulting tree to the output (a named file, or stdout for
//! `-`/no `--output`). On failure, print the error and its location to
//! stderr and exit with a non-zero status, per `utils/json-err.c`.
//!
//! Disclaimer (carried from the original's `print_usage`): this is meant for
//! testing, benchmarking, and example purposes rather than as a serious
//! general-purpose utility.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use centijson::{Dom, DomFlags, ErrorCode, JsonConfig, ParserError, StreamingParser};
use clap::Parser;

const BUFFER_SIZE: usize = 4096;

/// Parse and write down a JSON file.
#[derive(Debug, Parser)]
#[command(name = "centijson", version, about)]
struct Cli {
    /// Input file to read. Reads stdin if omitted or `-`.
    input: Option<PathBuf>,

    /// Output file to write. Writes stdout if omitted or `-`.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write minimized output (no whitespace) instead of pretty-printed.
    #[arg(short, long)]
    minimize: bool,
}

fn open_input(path: Option<&PathBuf>) -> io::Result<Box<dyn Read>> {
    match path {
        None => Ok(Box::new(io::stdin())),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(io::stdin())),
        Some(p) => Ok(Box::new(File::open(p)?)),
    }
}

fn open_output(path: Option<&PathBuf>) -> io::Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(io::stdout())),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(io::stdout())),
        Some(p) => Ok(Box::new(File::create(p)?)),
    }
}

fn error_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::OutOfMemory => "Out of memory.",
        ErrorCode::Internal => "Internal error.",
        ErrorCode::Syntax => "Syntax error.",
        ErrorCode::BadCloser => "Object/array closer mismatch.",
        ErrorCode::BadRootType => "Prohibited root value type.",
        ErrorCode::ExpectedValue => "Value expected.",
        ErrorCode::ExpectedKey => "Key expected.",
        ErrorCode::ExpectedValueOrCloser => "Value or closer expected.",
        ErrorCode::ExpectedKeyOrCloser => "Key or closer expected.",
        ErrorCode::ExpectedColon => "Colon ':' expected.",
        ErrorCode::ExpectedCommaOrCloser => "Comma ',' or closer expected.",
        ErrorCode::ExpectedEof => "End of file expected.",
        ErrorCode::MaxTotalLen => "Input file too long.",
        ErrorCode::MaxTotalValues => "Too many data records.",
        ErrorCode::MaxNestingLevel => "Too deep object/array nesting.",
        ErrorCode::MaxNumberLen => "Too long number.",
        ErrorCode::MaxStringLen => "Too long string.",
        ErrorCode::MaxKeyLen => "Too long key.",
        ErrorCode::UnclosedString => "Unclosed string.",
        ErrorCode::UnescapedControl => "Unescaped control character.",
        ErrorCode::InvalidEscape => "Invalid escape sequence.",
        ErrorCode::InvalidUtf8 => "Ill formed UTF-8.",
        ErrorCode::DupKey => "Duplicate object key.",
        ErrorCode::Aborted(_) => "Parsing aborted by callback.",
        _ => "Unknown parsing error.",
    }
}

fn print_error(err: &ParserError) {
    eprintln!("{}", error_message(err.code));
    eprintln!("Offset: {}", err.pos.offset);
    eprintln!("Line:   {}", err.pos.line);
    eprintln!("Column: {}", err.pos.column);
}

fn process(cli: &Cli) -> Result<(), ()> {
    let mut input = open_input(cli.input.as_ref()).map_err(|e| {
        eprintln!("Cannot open input: {e}");
    })?;

    let config = JsonConfig::default();
    let mut parser = StreamingParser::new(config);
    let mut dom = Dom::new(DomFlags::default());

    let mut buffer = [0u8; BUFFER_SIZE];
    let feed_result = loop {
        let n = match input.read(&mut buffer) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) => {
                eprintln!("Input error: {e}");
                return Err(());
            }
        };
        if let Err(err) = parser.feed(&buffer[..n], &mut dom) {
            break Err(err);
        }
    };

    let finish_result = match feed_result {
        Ok(()) => parser.finish(&mut dom),
        Err(err) => Err(err),
    };

    let root = match finish_result {
        Ok(_pos) => dom.into_value(),
        Err(err) => {
            let err = ParserError {
                code: dom.take_dup_key_error(err.code),
                pos: err.pos,
            };
            print_error(&err);
            return Err(());
        }
    };

    let mut output = open_output(cli.output.as_ref()).map_err(|e| {
        eprintln!("Cannot open output: {e}");
    })?;

    let opts = centijson::SerializeOptions {
        layout: if cli.minimize {
            centijson::Layout::Minimize
        } else {
            centijson::Layout::Pretty
        },
        dict_order: centijson::DictOrder::Sorted,
    };

    let write_result: Result<(), io::Error> = centijson::serializer::write(&root, opts, &mut |bytes: &[u8]| {
        output.write_all(bytes)
    });
    if let Err(e) = write_result {
        eprintln!("Output error: {e}");
        return Err(());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match process(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}
