use chrono::NaiveDate;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "birthday-wisher")]
#[command(about = "Sends a birthday greeting to each contact once per year")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "birthday-wisher.toml")]
    pub config: String,

    /// Contacts file, overrides [store] path from the config
    #[arg(long)]
    pub contacts: Option<String>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Show who would be greeted today without sending or saving
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
