//! A minimal terminal driver: wires a stdout console and a logged LED readout onto
//! `vm_core`, loads a program word file (and optionally a filesystem-convention
//! project directory) via `vm_loader`, and runs the machine to HALT or a reported
//! fault (§6 "drivers embed it").

mod devices;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{info, LevelFilter};
use thiserror::Error;

use vm_core::devices::DeviceSet;
use vm_core::{register, ConstructError, Cpu};
use vm_loader::LoadError;

use devices::{StdoutConsole, TerminalLeds};

/// Run a program word file against the assembly-fiddle virtual machine core.
#[derive(Parser, Debug)]
#[command(name = "vm_cli", version, about)]
struct Args {
    /// Path to a program-word file (decimal words, `#` line comments).
    program: PathBuf,

    /// RAM size in words.
    #[arg(long, default_value_t = 4096)]
    ram: usize,

    /// Stack size in words.
    #[arg(long, default_value_t = 256)]
    stack: usize,

    /// Optional directory of files named by decimal word index (§6 filesystem
    /// convention), loaded into RAM after the program itself.
    #[arg(long)]
    fs_dir: Option<PathBuf>,

    /// Print the register file after the machine halts.
    #[arg(long)]
    dump_registers: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Construct(#[from] ConstructError),
}

fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vm_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let words = vm_loader::load_program_words(&args.program)?;

    let devices = DeviceSet::new().with_console(StdoutConsole).with_leds(TerminalLeds);
    let mut cpu = Cpu::new(args.ram, args.stack, devices)?;
    cpu.load_program(&words);

    if let Some(dir) = &args.fs_dir {
        let images = vm_loader::load_project(dir)?;
        for image in &images {
            info!("loading {} at word index {}", image.path.display(), image.word_index);
        }
        vm_loader::apply_to(&mut cpu, &images);
    }

    cpu.run();

    if args.dump_registers {
        print_registers(&cpu);
    }

    Ok(())
}

fn print_registers(cpu: &Cpu) {
    const NAMES: [&str; register::REGISTER_COUNT] = [
        "SP", "BP", "IP", "AX", "BX", "CX", "DX", "SI", "DI", "R08", "R09", "R10", "R11", "R12",
        "R13", "R14", "R15", "FLAGS",
    ];
    for (idx, name) in NAMES.iter().enumerate() {
        println!("{name:>5} = {}", cpu.register(idx));
    }
}

fn init_logging() {
    env_logger::Builder::new()
        .format(|f, record| writeln!(f, "{}: {}", record.level(), record.args()))
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();
}
