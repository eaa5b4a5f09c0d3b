//! Command line front end: analyse a While program and print the report.

use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use whilesign::report::Report;
use whilesign::{syntax, vm, Error};

#[derive(Parser, Debug)]
#[command(name = "whilesign")]
#[command(about = "Sign and exception analysis of While programs")]
struct Args {
    /// Path to the While program to analyse
    program: PathBuf,

    /// Print the compiled code, and trace every configuration
    #[arg(short, long)]
    debug: bool,

    /// Wait for enter after every step of the search
    #[arg(short, long)]
    step: bool,

    /// Give up after visiting this many configurations
    #[arg(long)]
    max_configurations: Option<usize>,
}

fn run(args: &Args) -> Result<(), Error> {
    let source = std::fs::read_to_string(&args.program)?;
    let program = syntax::parse(&source)?;
    let compiled = syntax::compile(&program);

    println!("{}", source.trim_end());
    if args.debug {
        println!("\n{}", compiled.code());
    }

    let mut options = vm::OptionsBuilder::new();
    if let Some(max_configurations) = args.max_configurations {
        options = options.max_configurations(max_configurations);
    }

    let mut vm = vm::Vm::new(compiled.code().clone(), options.build());
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        if args.step {
            for configuration in vm.frontier() {
                println!("{}", configuration);
            }
            line.clear();
            stdin.lock().read_line(&mut line)?;
        }
        if !vm.execute_step()? {
            break;
        }
    }
    log::info!(
        "Visited {} configurations in {} steps",
        vm.visited().len(),
        vm.steps()
    );

    let analysis = vm.analysis();
    println!("\n{}", Report::new(&program, &compiled, &analysis)?);
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.debug {
        simplelog::LevelFilter::Trace
    } else {
        simplelog::LevelFilter::Info
    };
    if let Err(e) = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("Could not initialise logging: {}", e);
    }

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        process::exit(1);
    }
}
