use std::process::ExitCode;

use dbn::Config;
use dbn_vm::Vm;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let src = match read_in() {
        Ok(src) => src,
        Err(e) => {
            eprintln!("failed to read stdin: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut vm = match Vm::parse(&src, &Config::default()) {
        Ok(vm) => vm,
        Err(errs) => {
            let mut o = "".to_owned();
            for err in errs {
                o.push_str(&format!("\n{err}"));
            }
            eprintln!("unable to run:{o}");
            return ExitCode::FAILURE;
        }
    };
    match vm.run() {
        Ok(()) => {
            print!("{}", vm.canvas().to_pgm());
            ExitCode::SUCCESS
        }
        Err(e) => {
            let what = if e.is_user_error() {
                "runtime error"
            } else {
                "internal error"
            };
            eprintln!("{what} at instruction {}: {e}", e.pointer);
            ExitCode::FAILURE
        }
    }
}

fn read_in() -> std::io::Result<String> {
    use std::io::{stdin, Read};
    let mut out = String::new();
    stdin().read_to_string(&mut out)?;
    Ok(out)
}
