use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::profile::{FarmProfile, SoilType, WaterAvailability};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(alias = "openai")]
    #[serde(alias = "open-ai")]
    OpenAI,
    Anthropic,
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "farmassist", version, about = "Crop suggestions and organic farming advice from an AI model")]
pub struct Args {
    /// TOML config file; defaults plus environment are used when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Save every prompt and raw reply under the artifacts directory.
    #[arg(long, default_value_t = false, global = true)]
    pub save_exchanges: bool,

    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,

    /// Show a spinner while waiting for the model.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, global = true)]
    pub progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save or show the farm profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Ask the model which crops suit the saved farm.
    Suggest,
    /// Ask farming questions; interactive unless --question is given.
    Chat {
        #[arg(long, short)]
        question: Option<String>,
        /// Plant photo to attach to the question (max 5 MB).
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Replace the saved profile.
    Set(ProfileArgs),
    Show,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long, value_enum)]
    pub soil_type: SoilType,
    /// In acres.
    #[arg(long)]
    pub land_size: f64,
    /// City, State
    #[arg(long)]
    pub location: String,
    #[arg(long, value_enum)]
    pub water: WaterAvailability,
    #[arg(long, default_value = "")]
    pub previous_crops: String,
    /// Current problems, e.g. pests or poor yield.
    #[arg(long)]
    pub issues: Option<String>,
}

impl From<ProfileArgs> for FarmProfile {
    fn from(a: ProfileArgs) -> Self {
        FarmProfile {
            soil_type: a.soil_type,
            land_size: a.land_size,
            location: a.location,
            water_availability: a.water,
            previous_crops: a.previous_crops,
            issues: a.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_set() {
        let args = Args::try_parse_from([
            "farmassist", "profile", "set", "--soil-type", "peat", "--land-size", "1.5",
            "--location", "Thrissur, Kerala", "--water", "abundant",
        ])
        .unwrap();
        let Command::Profile(ProfileCommand::Set(p)) = args.command else {
            panic!("expected profile set");
        };
        let profile = FarmProfile::from(p);
        assert_eq!(profile.soil_type, SoilType::Peat);
        assert_eq!(profile.previous_crops, "");
        assert_eq!(profile.issues, None);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from(["farmassist", "chat", "-q", "hello", "--provider", "openai", "--progress", "false"]).unwrap();
        assert_eq!(args.provider, Some(ProviderKind::OpenAI));
        assert!(!args.progress);
        assert!(matches!(args.command, Command::Chat { question: Some(_), image: None }));
    }
}
