mod app;
mod cli;
mod clipboard;
mod config;
mod effects;
mod flow;
mod logging;
mod render;
mod stories;
mod timers;

use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use chat_logging::{chat_error, chat_info};
use clap::Parser;
use prioritizer_core::{AppState, PrioritizationKind, StorySource};
use prioritizer_engine::{
    export_transcript, EngineError, EngineHandle, ExportError, ExportOptions, PersistError,
    RunSummary,
};
use thiserror::Error;

use self::app::App;
use self::cli::{Cli, Command, GenerateArgs};
use self::clipboard::SystemClipboard;
use self::config::{AppConfig, ConfigError};
use self::effects::{Console, EffectRunner, InboxSink};
use self::flow::{Flow, Outcome, RunOptions};
use self::stories::{read_story_file, write_story_file};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0}")]
    Usage(String),
    #[error("stories file {path}: {message}")]
    Stories { path: PathBuf, message: String },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("cannot export transcript: {0}")]
    Export(#[from] ExportError),
    #[error("{0}")]
    Failed(String),
}

/// What to do with the final state once the flow is done.
enum Save {
    Stories(Option<PathBuf>),
    Compliance(Option<PathBuf>),
    Transcript {
        dir: Option<PathBuf>,
        summary: RunSummary,
    },
}

pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?.apply(cli.overrides());
    logging::initialize(config.log_destination, config.level_filter()?);
    chat_info!("prioritizer starting against {}", config.base_url);

    let (flow, save) = plan(cli.command, &config)?;
    let reveal = config.reveal_settings()?;
    let with_channel = matches!(flow, Flow::Prioritize { .. });

    let (tx, rx) = mpsc::channel();
    let engine = EngineHandle::spawn(
        config.engine_settings(with_channel)?,
        Arc::new(InboxSink::new(tx)),
    )?;
    let runner = EffectRunner::new(Box::new(engine), Box::new(SystemClipboard::default()));
    let app = App::new(reveal, rx, runner, Console::stdio(), flow);

    // The engine shuts down when the app (and its runner) is dropped.
    let (outcome, state) = app.run();
    match outcome {
        Outcome::Done => save_results(save, &state),
        Outcome::Failed(message) => {
            chat_error!("run failed: {}", message);
            Err(AppError::Failed(message))
        }
    }
}

fn plan(command: Command, config: &AppConfig) -> Result<(Flow, Save), AppError> {
    let model = config.model.clone();
    match command {
        Command::Generate(args) => {
            let save = Save::Stories(args.save.clone());
            Ok((Flow::fetch(generate_source(args, model)?), save))
        }
        Command::Upload(args) => Ok((
            Flow::fetch(StorySource::Csv { file: args.csv }),
            Save::Stories(args.save),
        )),
        Command::Check(args) => Ok((
            Flow::check(read_story_file(&args.stories)?, args.framework, model),
            Save::Compliance(args.save),
        )),
        Command::Prioritize(args) => {
            let technique = PrioritizationKind::parse(&args.technique).ok_or_else(|| {
                AppError::Usage(format!(
                    "unknown technique `{}`; expected one of {}",
                    args.technique,
                    PrioritizationKind::ALL
                        .iter()
                        .map(|kind| kind.as_tag())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
            let summary = RunSummary {
                technique: technique.as_tag().to_string(),
                model: model.clone(),
                result_rows: 0,
            };
            let flow = Flow::prioritize(
                read_story_file(&args.stories)?,
                RunOptions {
                    technique,
                    model,
                    feedback: args.feedback,
                    copy: args.copy,
                },
            );
            Ok((
                flow,
                Save::Transcript {
                    dir: args.transcript_out,
                    summary,
                },
            ))
        }
    }
}

fn generate_source(args: GenerateArgs, model: String) -> Result<StorySource, AppError> {
    match args {
        GenerateArgs {
            vision: Some(vision),
            mvp: Some(mvp),
            ..
        } => Ok(StorySource::Text { vision, mvp, model }),
        GenerateArgs {
            vision_file: Some(vision_file),
            mvp_file: Some(mvp_file),
            ..
        } => Ok(StorySource::Files {
            vision_file,
            mvp_file,
            model,
        }),
        _ => Err(AppError::Usage(
            "give --vision and --mvp, or --vision-file and --mvp-file".to_string(),
        )),
    }
}

fn save_results(save: Save, state: &AppState) -> Result<(), AppError> {
    match save {
        Save::Stories(Some(path)) => {
            let rows: Vec<_> = state.stories().iter().map(|s| s.to_wire()).collect();
            let written = write_story_file(&path, &rows)?;
            chat_info!("saved {} stories to {}", rows.len(), written.display());
        }
        Save::Compliance(Some(path)) => {
            let rows: Vec<_> = state.compliance().iter().map(|s| s.to_wire()).collect();
            let written = write_story_file(&path, &rows)?;
            chat_info!("saved {} checked stories to {}", rows.len(), written.display());
        }
        Save::Transcript {
            dir: Some(dir),
            mut summary,
        } => {
            summary.result_rows = state.result().map_or(0, |table| table.rows.len());
            let written =
                export_transcript(&dir, state.transcript(), &summary, &ExportOptions::default())?;
            chat_info!(
                "transcript ({} chars) written to {}",
                written.chars,
                written.transcript_path.display()
            );
        }
        Save::Stories(None) | Save::Compliance(None) | Save::Transcript { dir: None, .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn unknown_technique_is_a_usage_error() {
        let cli = Cli::try_parse_from([
            "prioritizer",
            "prioritize",
            "--stories",
            "missing.json",
            "--technique",
            "RICE",
        ])
        .unwrap();
        let Err(AppError::Usage(message)) = plan(cli.command, &config()) else {
            panic!("expected usage error");
        };
        assert!(message.contains("100_DOLLAR"));
    }

    #[test]
    fn generate_uses_configured_model() {
        let cli =
            Cli::try_parse_from(["prioritizer", "generate", "--vision", "v", "--mvp", "m"]).unwrap();
        let (flow, _) = plan(cli.command, &config()).unwrap();
        assert_eq!(
            flow,
            Flow::fetch(StorySource::Text {
                vision: "v".into(),
                mvp: "m".into(),
                model: "gpt-4o-mini".into(),
            })
        );
    }

    #[test]
    fn generate_without_input_is_rejected() {
        let cli = Cli::try_parse_from(["prioritizer", "generate"]).unwrap();
        assert!(matches!(
            plan(cli.command, &config()),
            Err(AppError::Usage(_))
        ));
    }
}
