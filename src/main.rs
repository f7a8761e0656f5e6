use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as ClapParser;
use pprof::protos::Message;

use monkey::object::Object;
use monkey::{define_macros, eval, expand_macros, parse, repl, Environment};

#[derive(ClapParser)]
#[command(
    name = "monkey",
    version,
    about = "Tree-walking interpreter for the Monkey programming language"
)]
struct Args {
    /// Script to run; starts the REPL when omitted
    script: Option<PathBuf>,

    /// Save a pprof CPU profile of the run to this path
    #[arg(short = 'p', long = "cpuprofile", value_name = "PATH")]
    cpuprofile: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let code = match args.script {
        Some(script) => run_file(&script, args.cpuprofile.as_deref()),
        None => match repl::run() {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("monkey: {}", err);
                1
            }
        },
    };

    process::exit(code);
}

fn run_file(script: &Path, cpuprofile: Option<&Path>) -> i32 {
    let source = match std::fs::read_to_string(script) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("monkey: {}: {}", script.display(), err);
            return 1;
        }
    };

    let guard = match cpuprofile {
        Some(_) => pprof::ProfilerGuard::new(97).ok(),
        None => None,
    };

    let (mut program, errors) = parse(&source);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("{}", error);
        }
        return 1;
    }

    let macro_env = Environment::new();
    define_macros(&mut program, &macro_env);
    let expanded = expand_macros(program, &macro_env);

    let env = Environment::new();
    let code = match eval(&expanded, &env) {
        Ok(value) => {
            if !matches!(value.as_ref(), Object::Null) {
                println!("{}", value);
            }
            0
        }
        Err(err) => {
            eprintln!("ERROR: {}", err);
            1
        }
    };

    if let (Some(path), Some(guard)) = (cpuprofile, guard) {
        write_profile(path, &guard);
    }

    code
}

fn write_profile(path: &Path, guard: &pprof::ProfilerGuard) {
    let report = match guard.report().build() {
        Ok(report) => report,
        Err(err) => {
            eprintln!("monkey: failed to build CPU profile: {}", err);
            return;
        }
    };

    let profile = match report.pprof() {
        Ok(profile) => profile,
        Err(err) => {
            eprintln!("monkey: failed to encode CPU profile: {}", err);
            return;
        }
    };

    let mut content = Vec::new();
    if profile.encode(&mut content).is_err() {
        eprintln!("monkey: failed to encode CPU profile");
        return;
    }

    match File::create(path).and_then(|mut file| file.write_all(&content)) {
        Ok(()) => {}
        Err(err) => eprintln!("monkey: {}: {}", path.display(), err),
    }
}
