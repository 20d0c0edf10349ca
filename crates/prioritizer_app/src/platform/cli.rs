use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::config::Overrides;

#[derive(Parser, Debug)]
#[command(
    name = "prioritizer",
    about = "Generate user stories and watch agents prioritize them"
)]
pub struct Cli {
    /// Backend base URL; the chat socket is derived from it.
    #[arg(long, env = "PRIORITIZER_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[arg(long, env = "PRIORITIZER_MODEL", global = true)]
    pub model: Option<String>,

    /// RON config file (default: ./prioritizer.ron when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// off, error, warn, info, debug or trace.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate stories from a vision and MVP, given inline or as files.
    Generate(GenerateArgs),
    /// Upload a CSV of stories.
    Upload(UploadArgs),
    /// Check stories against a requirements framework.
    Check(CheckArgs),
    /// Stream a multi-agent prioritization run and print the final table.
    Prioritize(PrioritizeArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, requires = "mvp", conflicts_with_all = ["vision_file", "mvp_file"])]
    pub vision: Option<String>,

    #[arg(long, requires = "vision")]
    pub mvp: Option<String>,

    #[arg(long, requires = "mvp_file")]
    pub vision_file: Option<PathBuf>,

    #[arg(long, requires = "vision_file")]
    pub mvp_file: Option<PathBuf>,

    /// Write the returned stories as JSON.
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    pub csv: PathBuf,

    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Stories as JSON, or a CSV to upload first.
    #[arg(long)]
    pub stories: PathBuf,

    #[arg(long, default_value = "INVEST framework")]
    pub framework: String,

    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PrioritizeArgs {
    /// Stories as JSON, or a CSV to upload first.
    #[arg(long)]
    pub stories: PathBuf,

    /// 100_Dollar, WSJF, MOSCOW, KANO or AHP.
    #[arg(long, default_value = "100_Dollar")]
    pub technique: String,

    #[arg(long, default_value = "")]
    pub feedback: String,

    /// Copy the transcript to the clipboard when the run ends.
    #[arg(long)]
    pub copy: bool,

    /// Directory to write the transcript into when the run ends.
    #[arg(long)]
    pub transcript_out: Option<PathBuf>,
}
