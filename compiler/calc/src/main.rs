//! Calc CLI
//!
//! Staged evaluation of arithmetic expressions.

use std::path::Path;

use calc::commands::{
    eval_file, parse_bench_options, parse_eval_options, parse_verify_options, print_file,
    run_bench, run_verify, simplify_file,
};
use calc::{init_tracing, CalcError};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "print" => {
            let path = file_arg(&args, "calc print <file.json>");
            print_file(path)
        }
        "simplify" => {
            let path = file_arg(&args, "calc simplify <file.json>");
            simplify_file(path)
        }
        "eval" => {
            if args.len() < 3 {
                eprintln!("Usage: calc eval <file.json> [name=value ...] [--backend=<backend>]");
                eprintln!();
                eprintln!("Backends: naive (default), indexed, specialized, native");
                std::process::exit(1);
            }
            parse_eval_options(&args[3..]).and_then(|options| eval_file(Path::new(&args[2]), &options))
        }
        "bench" => parse_bench_options(&args[2..]).and_then(|options| run_bench(&options)),
        "verify" => parse_verify_options(&args[2..]).and_then(|options| run_verify(&options)),
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "version" | "--version" | "-V" => {
            println!("calc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(err) => {
            report(&err);
            std::process::exit(1);
        }
    }
}

fn file_arg<'a>(args: &'a [String], usage: &str) -> &'a Path {
    if args.len() < 3 {
        eprintln!("Usage: {usage}");
        std::process::exit(1);
    }
    Path::new(&args[2])
}

fn report(err: &CalcError) {
    let mut chain = err.chain().into_iter();
    if let Some(message) = chain.next() {
        eprintln!("error: {message}");
    }
    for cause in chain {
        eprintln!("  caused by: {cause}");
    }
}

fn print_usage() {
    println!("Calc - staged arithmetic evaluator");
    println!();
    println!("Usage: calc <command> [options]");
    println!();
    println!("Commands:");
    println!("  print <file.json>              Render the expression");
    println!("  simplify <file.json>           Render the simplified expression");
    println!("  eval <file.json> [x=1 ...]     Evaluate the expression");
    println!("      --backend=<backend>        naive (default), indexed, specialized, native");
    println!("  bench [options]                Time backends on the matrix workload");
    println!("      --size=<n>                 Matrix dimension (default 10)");
    println!("      --iterations=<n>           Calls per backend (default 1000)");
    println!("      --backend=<backend>        Repeatable; default is every backend");
    println!("  verify [options]               Check all backends agree");
    println!("      --size=<n>                 Matrix dimension (default 4)");
    println!("      --trials=<n>               Environments to try (default 256)");
    println!("      --no-native                Skip the native backend");
    println!("  help                           Show this message");
    println!("  version                        Show version information");
    println!();
    println!("Environment:");
    println!("  CAL_CC, CC                     C compiler for the native backend");
    println!("  CAL_OPT_LEVEL                  0, 1, 2 or 3 (default 2)");
    println!("  CAL_CFLAGS                     Extra compiler flags");
    println!("  CAL_SCRATCH_DIR                Parent of native scratch directories");
    println!("  RUST_LOG                       Enable logging (e.g. RUST_LOG=cal_eval=debug)");
    println!("  CAL_LOG_TREE                   Log as an indented span tree");
}
