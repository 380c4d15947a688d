//! cubemx-pin - pin lookup in STM32CubeMX device description files.
//!
//! Load failures terminate the process with a status that identifies the
//! failure class (4: file not found, 5: no `<Mcu>` element, 6: parse failure),
//! unless `--lenient` is given. A lookup without a match exits with 1, and a
//! failure to write the `--json` listing exits with 3.

use clap::{Parser, Subcommand};
use cubemx_rs_xml::{DeviceDescriptor, LoadPolicy, McuInfo, Pin};
use log::{debug, error};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;

const EXIT_NOT_FOUND: i32 = 1;
const EXIT_OUTPUT_FAILURE: i32 = 3;

#[derive(Parser)]
#[command(name = "cubemx-pin")]
#[command(about = "Pin lookup for STM32CubeMX device description files", long_about = None)]
#[command(version)]
struct Cli {
    /// Continue with an empty device instead of exiting when the file cannot be loaded
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the name of the pin at a package position
    Name {
        /// Path to the CubeMX MCU .xml file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based package position (e.g. 33)
        #[arg(value_name = "NUMBER", allow_hyphen_values = true)]
        number: String,
    },

    /// Print the package position of a named pin
    Number {
        /// Path to the CubeMX MCU .xml file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pin name (e.g. PB12)
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List every pin of the device
    List {
        /// Path to the CubeMX MCU .xml file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct PinListing<'a> {
    mcu: Option<McuInfo<'a>>,
    pins: Vec<Pin<'a>>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Name { file, number } => handle_name(&file, &number, cli.lenient),
        Commands::Number { file, name } => handle_number(&file, &name, cli.lenient),
        Commands::List { file, json } => handle_list(&file, json, cli.lenient),
    };

    process::exit(exit_code);
}

/// Loads `file`, mapping a load error to its exit status.
fn load(file: &Path, lenient: bool) -> Result<DeviceDescriptor, i32> {
    let policy = if lenient {
        LoadPolicy::Degrade
    } else {
        LoadPolicy::FailFast
    };

    DeviceDescriptor::load(file, policy).map_err(|e| {
        error!("{}", e);
        eprintln!("Error: {}", e);
        e.exit_code()
    })
}

fn handle_name(file: &Path, number: &str, lenient: bool) -> i32 {
    let descriptor = match load(file, lenient) {
        Ok(d) => d,
        Err(code) => return code,
    };

    match descriptor.pin_name_for_number(number) {
        Some(name) => {
            println!("{}", name);
            0
        }
        None => {
            eprintln!("No pin at position {} in {}", number, file.display());
            EXIT_NOT_FOUND
        }
    }
}

fn handle_number(file: &Path, name: &str, lenient: bool) -> i32 {
    let descriptor = match load(file, lenient) {
        Ok(d) => d,
        Err(code) => return code,
    };

    match descriptor.pin_number_for_name(name) {
        Some(position) => {
            println!("{}", position);
            0
        }
        None => {
            eprintln!("No pin named {} in {}", name, file.display());
            EXIT_NOT_FOUND
        }
    }
}

fn handle_list(file: &Path, json: bool, lenient: bool) -> i32 {
    let descriptor = match load(file, lenient) {
        Ok(d) => d,
        Err(code) => return code,
    };
    debug!("Listing pins of {:?}", descriptor.mcu());

    if json {
        let listing = PinListing {
            mcu: descriptor.mcu(),
            pins: descriptor.pins().collect(),
        };
        return print_json(&listing);
    }

    if let Some(ref_name) = descriptor.mcu().and_then(|m| m.ref_name) {
        println!("{}", ref_name);
    }
    for pin in descriptor.pins() {
        println!(
            "{:>4}  {:<16} {}",
            pin.position(),
            pin.name(),
            pin.pin_type().unwrap_or("-")
        );
    }
    0
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            0
        }
        Err(e) => {
            error!("Failed to serialize pin list: {}", e);
            eprintln!("Error: failed to serialize pin list: {}", e);
            EXIT_OUTPUT_FAILURE
        }
    }
}
