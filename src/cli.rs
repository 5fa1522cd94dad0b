use std::path::PathBuf;

use ch_core::FlowVariant;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "clubhouse", version, about = "Club registration with phone verification")]
pub struct Cli {
    /// TOML configuration file. Defaults to `clubhouse.toml` in the platform config dir.
    #[arg(long, short, env = "CLUBHOUSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a registration flow interactively.
    Register {
        #[arg(value_enum)]
        flow: FlowArg,
    },
    /// Print the effective configuration as TOML.
    ShowConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowArg {
    Membership,
    Donor,
}

impl From<FlowArg> for FlowVariant {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::Membership => FlowVariant::Membership,
            FlowArg::Donor => FlowVariant::BloodDonor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_with_config() {
        let cli = Cli::try_parse_from(["clubhouse", "--config", "club.toml", "register", "donor"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("club.toml")));
        assert!(matches!(
            cli.command,
            Command::Register {
                flow: FlowArg::Donor
            }
        ));
    }

    #[test]
    fn flow_arg_maps_to_variant() {
        assert_eq!(FlowVariant::from(FlowArg::Membership), FlowVariant::Membership);
        assert_eq!(FlowVariant::from(FlowArg::Donor), FlowVariant::BloodDonor);
    }
}
