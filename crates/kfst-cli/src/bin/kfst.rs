// kfst: Finite-state transducer interpreter.
//
// Loads a transducer from an AT&T textual file or a KFST binary file and
// runs an interactive lookup REPL over standard input.
//
// Usage:
//   kfst [-d] [-s] [-f {textual|binary|auto}] FST_FILE
//
// Options:
//   -d                      Enable debug tracing to standard error
//   -s                      Print the transducer's sorted symbol texts and exit
//   -f {textual|binary|auto} Force the input format (default: auto)

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use kfst_core::{Symbol, Transducer};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match Options::parse(&args) {
        Ok(o) => o,
        Err(e) => fatal(&e),
    };

    let mut transducer = load(&options.fst_path, options.format.as_deref()).unwrap_or_else(|e| fatal(&e));
    transducer.debug = options.debug;

    if options.print_symbols {
        let mut texts: Vec<String> = transducer.symbols().iter().map(Symbol::text).collect();
        texts.sort();
        for text in texts {
            println!("{text}");
        }
        return;
    }

    repl(&transducer);
}

struct Options {
    fst_path: PathBuf,
    debug: bool,
    print_symbols: bool,
    format: Option<String>,
}

impl Options {
    fn parse(args: &[String]) -> Result<Options, String> {
        let mut debug = false;
        let mut print_symbols = false;
        let mut format = None;
        let mut positional = None;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "-d" => debug = true,
                "-s" => print_symbols = true,
                "-f" => {
                    i += 1;
                    let value = args.get(i).ok_or_else(|| "-f requires a value".to_string())?;
                    if !matches!(value.as_str(), "textual" | "binary" | "auto") {
                        return Err(format!("invalid -f value: {value} (expected textual, binary or auto)"));
                    }
                    format = Some(value.clone());
                }
                other if positional.is_none() => positional = Some(PathBuf::from(other)),
                other => return Err(format!("unexpected argument: {other}")),
            }
            i += 1;
        }

        let fst_path = positional.ok_or_else(|| "missing transducer file path".to_string())?;
        Ok(Options {
            fst_path,
            debug,
            print_symbols,
            format,
        })
    }
}

fn load(path: &Path, forced_format: Option<&str>) -> Result<Transducer, String> {
    let use_binary = match forced_format.unwrap_or("auto") {
        "binary" => true,
        "textual" => false,
        _ => path.extension().is_some_and(|ext| ext == "kfst"),
    };

    let result = if use_binary {
        Transducer::from_binary_file(path)
    } else {
        Transducer::from_textual_file(path)
    };

    result.map_err(|e| format!("failed to load {}: {e}", path.display()))
}

fn repl(transducer: &Transducer) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        match transducer.lookup(&line, 0, true) {
            Ok(results) => {
                for (output, weight) in results {
                    let _ = writeln!(out, "{output}\t{weight}");
                }
                let _ = writeln!(out);
            }
            Err(_) => {
                eprintln!("could not tokenize input: {line}");
            }
        }
    }
}

fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}
