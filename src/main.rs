//! ONI element reference
//!
//! Browse and filter Oxygen Not Included element definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;
use tracing_subscriber::EnvFilter;

use oniref::query::predicates::is_state;
use oniref::query::{stable_over, ElementAttr};
use oniref::report::{build_report, default_columns};
use oniref::{loader, Elements, Quantity, State, StringTable};

#[derive(Parser)]
#[command(name = "oniref")]
#[command(about = "Element reference for Oxygen Not Included")]
struct Cli {
    /// Directory of element definition files (*.json); the built-in sample is used if omitted
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Gettext template with display names (strings_template.pot)
    #[arg(short, long)]
    strings: Option<PathBuf>,

    /// Log loading and query details
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all elements
    List,

    /// Show details for one element
    Show {
        /// Element ID (e.g. "Water")
        name: String,
    },

    /// Search element IDs and display names
    Find {
        needle: String,

        /// Treat the needle as a regular expression
        #[arg(long)]
        regex: bool,
    },

    /// Elements of a state that stay in that state over a temperature range
    Stable {
        #[arg(long, value_enum, default_value = "liquid")]
        state: StateArg,

        /// Lower bound in °C
        #[arg(long, default_value = "30")]
        from: f64,

        /// Upper bound in °C
        #[arg(long, default_value = "90")]
        to: f64,
    },

    /// Heat needed to change the temperature of some mass of an element
    Heat {
        name: String,

        /// Mass in kg
        #[arg(short, long, default_value = "1.0")]
        mass: f64,

        /// Temperature change in °C
        #[arg(short = 't', long, default_value = "1.0", allow_negative_numbers = true)]
        delta: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StateArg {
    Solid,
    Liquid,
    Gas,
}

impl From<StateArg> for State {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Solid => State::Solid,
            StateArg::Liquid => State::Liquid,
            StateArg::Gas => State::Gas,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    let elements = load(&cli)?;

    match cli.command {
        Commands::List => {
            println!("{:<24} {:<28} {:<8}", "ID", "Name", "State");
            println!("{}", "-".repeat(62));
            for e in &elements {
                println!("{:<24} {:<28} {:<8}", e.name, e.pretty_name, e.state);
            }
            println!("\n{} elements", elements.len());
        }

        Commands::Show { name } => {
            let e = elements.lookup(name.as_str())?;
            println!("Element: {}", e.pretty_name);
            println!("  ID: {}", e.name);
            println!("  State: {}", e.state);
            println!("  Specific heat capacity: {:.3}", e.specific_heat_capacity);
            println!("  Thermal conductivity: {:.3}", e.thermal_conductivity);
            println!("  Molar mass: {:.3}", e.molar_mass);
            println!("  Radiation absorption: {}", e.radiation_absorption.magnitude());
            println!("  Radioactivity: {}", e.radioactivity);
            if let Some(mass) = &e.mass_per_tile {
                println!("  Mass per tile: {mass}");
            }
            if let Some(density) = e.density() {
                println!("  Density: {:.3}", density.to("kg/m^3")?);
            }
            if let Some(diffusivity) = e.thermal_diffusivity()? {
                println!("  Thermal diffusivity: {:.4}", diffusivity.to("mm^2/s")?);
            }
            for (label, transition) in [("Melts/boils", &e.high_transition), ("Freezes/condenses", &e.low_transition)] {
                if let Some(t) = transition {
                    print!("  {label}: {} @ {:.1}", elements.target(t).pretty_name, t.temperature);
                    match (&t.byproduct_name, t.byproduct_ratio) {
                        (Some(ore), Some(ratio)) => println!(" (+{ore}, {:.0}%)", ratio * 100.0),
                        (Some(ore), None) => println!(" (+{ore})"),
                        _ => println!(),
                    }
                }
            }
        }

        Commands::Find { needle, regex } => {
            let found = if regex {
                let pattern = Regex::new(&needle).with_context(|| format!("Invalid pattern '{needle}'"))?;
                elements.find(&pattern)?
            } else {
                elements.find(needle.as_str())?
            };

            if found.is_empty() {
                println!("No elements match '{needle}'");
            } else {
                for e in found {
                    println!("  {:<24} {}", e.name, e.pretty_name);
                }
            }
        }

        Commands::Stable { state, from, to } => {
            let lo = Quantity::new(from, "degC")?;
            let hi = Quantity::new(to, "degC")?;
            let predicate = is_state(state.into()) & stable_over(&lo, &hi);
            let found = elements.find(&predicate)?;
            let sorted = elements.sorted_by(found, &ElementAttr::thermal_conductivity())?;

            println!("{predicate}\n");
            if sorted.is_empty() {
                println!("No elements match.");
            } else {
                print!("{}", build_report(&elements, sorted, &default_columns())?);
            }
        }

        Commands::Heat { name, mass, delta } => {
            let e = elements.lookup(name.as_str())?;
            let mass = Quantity::new(mass, "kg")?;
            let delta = Quantity::new(delta, "delta_degC")?;
            let energy = e.heat_energy(&delta, &mass)?;
            println!(
                "{} x {}: {:.1} to change by {}",
                mass,
                e.pretty_name,
                energy.to("kDTU")?,
                delta
            );
        }
    }

    Ok(())
}

fn load(cli: &Cli) -> Result<Elements> {
    let Some(dir) = &cli.data else {
        return Ok(loader::load_sample()?);
    };

    let strings = match &cli.strings {
        Some(path) => loader::load_strings(path)?,
        None => StringTable::new(),
    };
    let elements = loader::load_directory(dir, &strings)
        .with_context(|| format!("Failed to load element data from {}", dir.display()))?;
    if elements.is_empty() {
        anyhow::bail!("No element definitions found under {}", dir.display());
    }
    Ok(elements)
}
