use clap::Parser;
use std::path::PathBuf;

/// IPFIX exporter driven by a YAML export definition
#[derive(Parser, Debug)]
#[command(name = "ipfix_exporter")]
#[command(about = "Export IPFIX flow records described in a YAML file")]
#[command(version)]
pub struct Cli {
    /// Path to the YAML export definition
    ///
    /// The file lists the information elements, templates and records to
    /// export; see the crate README for the schema.
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Destination IP:PORT for UDP export
    ///
    /// Format: IP:PORT (e.g., "192.168.1.100:4739")
    /// Defaults to 127.0.0.1:4739 if not specified.
    #[arg(short, long, value_name = "IP:PORT")]
    pub dest: Option<String>,

    /// Write the export to a file instead of sending via UDP
    ///
    /// When specified, messages are written back to back into a binary
    /// file instead of being transmitted over the network.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum bytes per exported message
    ///
    /// 0 selects the largest expressible message (65535 bytes). For UDP
    /// export pick a value below the path MTU, e.g. 1472.
    #[arg(short, long, value_name = "BYTES", default_value = "0")]
    pub mtu: u16,

    /// Enable verbose output
    ///
    /// Displays detailed information about templates, records and
    /// transmission.
    #[arg(short, long)]
    pub verbose: bool,
}
