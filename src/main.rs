//! Driver reading a parameter file, running the full pipeline once and
//! printing the velocity of every particle.

use ibstokes::errors::*;
use ibstokes::kernel::KernelTable;
use ibstokes::settings;
use log::{error, info};
use std::env;

fn run(param_file: &str) -> Result<()> {
    let settings = settings::read_parameter_file(param_file)
        .chain_err(|| "Error reading parameter file.")?;
    info!("Read parameter file '{}'", param_file);

    let table = KernelTable::default();
    let mut pipeline = settings
        .build_pipeline(&table)
        .chain_err(|| "Error setting up the pipeline.")?;

    let velocities = pipeline.run().chain_err(|| "Error during the solve.")?;

    println!("# particle velocity");
    for (i, u) in velocities.outer_iter().enumerate() {
        let u: Vec<String> = u.iter().map(|v| format!("{:.16e}", v)).collect();
        println!("{} {}", i, u.join(" "));
    }

    Ok(())
}

fn main() {
    env_logger::init();

    // parse command line arguments
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => {
            println!("Please pass a parameter file.");
            std::process::exit(1)
        }
        2 => {
            if let Err(e) = run(&args[1]) {
                error!("{}", e);
                for e in e.iter().skip(1) {
                    error!("caused by: {}", e);
                }
                std::process::exit(1)
            }
        }
        _ => {
            println!("You've passed too many arguments. Please don't do that.");
            std::process::exit(1)
        }
    }
}
