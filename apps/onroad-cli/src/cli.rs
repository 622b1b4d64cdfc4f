use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "onroad", version, about = "On-road price calculator")]
pub struct Cli {
    /// Configuration file path (default: platform config dir)
    #[arg(short, long, global = true, env = "ONROAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Location storage file, overriding the configured one
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Print debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Price one vehicle at the stored (or given) location
    Quote {
        /// Ex-showroom price, e.g. 8,70,900 or 870900.50
        price: String,

        /// Fuel or energy type tag
        #[arg(short, long, default_value = "Petrol")]
        fuel: String,

        /// "City, Region" to use instead of the stored selection
        #[arg(short, long)]
        location: Option<String>,

        /// Show every charge
        #[arg(short, long)]
        breakup: bool,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Price a JSON list of `{ "id", "price", "fuel" }` rows
    Batch {
        /// Input file, or `-` for stdin
        input: PathBuf,
    },

    /// Show or change the stored location
    Location {
        #[command(subcommand)]
        action: LocationCommands,
    },

    /// List registration rates
    Rates {
        /// Only this region
        #[arg(short, long)]
        region: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum LocationCommands {
    /// Print the current location
    Show,
    /// Store a new "City, Region"
    Set { location: String },
    /// Forget the stored location
    Clear,
}
