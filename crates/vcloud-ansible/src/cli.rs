//! Clap derive structures for the vCloud Ansible binaries.
//!
//! Only depends on clap and clap_complete so `build.rs` can include it to
//! render man pages.

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

// ── vcd-inventory ────────────────────────────────────────────────────

/// Ansible dynamic inventory for VMware vCloud Director
#[derive(Debug, Parser)]
#[command(
    name = "vcd-inventory",
    version,
    about = "Ansible dynamic inventory for VMware vCloud Director",
    long_about = "Discovers VMs through the vCloud Director API and prints an Ansible\n\
        inventory document. Results are cached for 15 minutes per org and user.\n\n\
        Credentials are read from VCD_URL, VCD_USER, VCD_PASSWORD and VCD_ORG."
)]
pub struct InventoryCli {
    /// Print the whole inventory (default)
    #[arg(long, conflicts_with = "host")]
    pub list: bool,

    /// Print the variables of a single host
    #[arg(long, value_name = "HOSTNAME")]
    pub host: Option<String>,

    /// Ignore the cache and query vCloud Director
    #[arg(long, conflicts_with = "host")]
    pub refresh_cache: bool,

    /// Settings file (defaults to the platform config dir)
    #[arg(long, value_name = "PATH", env = "VCD_ANSIBLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub completions: Option<Shell>,
}

// ── vcd-vapp-network ─────────────────────────────────────────────────

/// Ansible module: manage a vApp network in vCloud Director
#[derive(Debug, Parser)]
#[command(
    name = "vcd-vapp-network",
    version,
    about = "Ansible module: create or delete a vApp network in vCloud Director",
    long_about = "Reads module arguments from a JSON file and prints one JSON result\n\
        object (changed, msg, warnings, failed) on stdout."
)]
pub struct NetworkModuleCli {
    /// JSON file with the module arguments
    #[arg(value_name = "ARGS_FILE")]
    pub args_file: PathBuf,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}
