//! Entrypoint for CLI
mod clock;
mod config;
mod error;

use std::{env, error::Error, fs, time::Instant};

use chip8::{constants::*, prelude::*, IMPL_VERSION};
use log::{debug, error, info, warn};

use self::{
    clock::{Clock, Hz},
    config::RunConf,
    error::CliError,
};

static USAGE: &str = r#"
usage: chip8 CMD FILE [CONFIG]

commands:
    run     Run the target ROM file headless, and print the display when done
    dis     Disassemble the target ROM into readable assembly

examples:
    chip8 run breakout.rom
    chip8 run breakout.rom breakout.yaml
    chip8 dis breakout.rom
"#;

fn run_bytecode(filepath: impl AsRef<str>, conf: RunConf) -> Result<(), CliError> {
    info!("running {}", filepath.as_ref());

    let bytecode = fs::read(filepath.as_ref())?;

    let mut vm = Chip8Vm::new(conf.vm_conf());
    vm.load_bytecode(bytecode.as_slice())?;

    let start = Instant::now();
    let result = run_loop(&mut vm, &conf);
    let end = Instant::now();

    println!(
        "time taken: {}ms",
        end.duration_since(start).as_nanos() as f64 / 1000000.0
    ); // to millis
    println!("{}", vm.dump_display()?);
    println!("{}", vm.dump_keys()?);

    result
}

/// Drive the machine for the configured number of cycles.
///
/// Timers are ticked at 60Hz on their own clock, independent of the
/// instruction clock.
fn run_loop(vm: &mut Chip8Vm, conf: &RunConf) -> Result<(), CliError> {
    let mut cpu_clock = Clock::new(conf.clock_frequency.into());
    let mut timer_clock = Clock::new(Hz(TIMER_FREQUENCY).into());
    let cycles_per_tick = (conf.clock_frequency.0 / TIMER_FREQUENCY).max(1);

    let events = conf.sorted_input();
    let mut input = events.iter().peekable();
    let mut buzzing = false;

    for cycle in 0..conf.cycles {
        while let Some(event) = input.next_if(|event| event.cycle <= cycle) {
            debug!("cycle {cycle}: {} pressed={}", event.key, event.pressed);
            vm.set_key(event.key, event.pressed);
        }

        if conf.throttle {
            cpu_clock.wait();
            if timer_clock.tick() {
                vm.tick_timers();
            }
        } else if (cycle + 1) % cycles_per_tick == 0 {
            vm.tick_timers();
        }

        if let Flow::KeyWait = vm.step()? {
            if input.peek().is_none() {
                warn!("cycle {cycle}: waiting for a key, but no input is left");
                break;
            }
        }

        if vm.is_buzzing() != buzzing {
            buzzing = vm.is_buzzing();
            info!("cycle {cycle}: buzzer {}", if buzzing { "on" } else { "off" });
        }
    }

    Ok(())
}

fn run_disassembler(filepath: impl AsRef<str>) -> Result<(), CliError> {
    info!("disassembling {}", filepath.as_ref());

    let bytecode = fs::read(filepath.as_ref())?;
    if bytecode.len() > MAX_PROGRAM_SIZE {
        warn!(
            "program is {} bytes, larger than the {MAX_PROGRAM_SIZE} bytes that fit in memory",
            bytecode.len()
        );
    }

    Disassembler::new(bytecode.as_slice()).print_bytecode()?;

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    let result = match parse_args() {
        Some(Cmd::Run { filepath, config }) => {
            let conf = match config {
                Some(path) => RunConf::load(path)?,
                None => RunConf::default(),
            };
            run_bytecode(filepath, conf)
        }
        Some(Cmd::Dis { filepath }) => run_disassembler(filepath),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    if let Err(err) = result {
        error!("{err}");
        return Err(err.into());
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next() {
        Some(cmd) => {
            // don't format me T.T
            match cmd.as_str() {
                "run" => Some(Cmd::Run {
                    filepath: args.next()?,
                    config: args.next(),
                }),
                "dis" => Some(Cmd::Dis {
                    filepath: args.next()?,
                }),
                _ => None,
            }
        }
        None => None,
    }
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run {
        filepath: String,
        config: Option<String>,
    },
    /// Disassemble
    Dis { filepath: String },
}
