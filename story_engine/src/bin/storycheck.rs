//! storycheck - validate a story and prove it can be finished.
//!
//! Without a story argument the configured story (see `STORY_ENGINE_CONFIG`)
//! or the built-in one is checked.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use story_engine::telemetry::init_tracing;
use story_engine::{Autoplayer, ConfigError, EngineConfig, Outcome, Strategy};
use story_graph::{Severity, StoryError};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "storycheck")]
#[command(about = "Validate a ModelIt story and play it through", long_about = None)]
struct Cli {
    /// Story TOML file; overrides `story_path` from the config
    story: Option<PathBuf>,

    /// Reject the story on warning-level findings too
    #[arg(long)]
    strict: bool,
}

impl Cli {
    fn apply(self, config: &mut EngineConfig) {
        if let Some(path) = self.story {
            config.story_path = Some(path);
        }
        if self.strict {
            config.strict = true;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("storycheck: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);
    init_tracing(&config);

    let store = match config.load_story() {
        Ok(store) => store,
        Err(e) => {
            error!(target: "storycheck", error = %e, "story rejected");
            if let ConfigError::Story(StoryError::Invalid { findings }) = &e {
                for finding in findings {
                    println!("{finding}");
                }
            }
            return ExitCode::FAILURE;
        }
    };

    let report = store.validate();
    for finding in &report.findings {
        match finding.severity {
            Severity::Error => error!(target: "storycheck", "{finding}"),
            Severity::Warning => warn!(target: "storycheck", "{finding}"),
        }
    }
    println!(
        "{}: {} screens, {} chapters, {} fundamentals, {} error(s), {} warning(s)",
        store.title(),
        store.len(),
        store.chapters().count(),
        store.fundamental_count(),
        report.errors().count(),
        report.warnings().count()
    );

    let mut ok = true;
    for strategy in [Strategy::AlwaysCorrect, Strategy::WrongFirst] {
        match Autoplayer::new(strategy).play(&store) {
            Ok(play) if play.outcome == Outcome::Completed => {
                info!(target: "storycheck", ?strategy, steps = play.steps, "playthrough completed");
                println!(
                    "{strategy:?}: completed in {} steps, {} attempt(s)",
                    play.steps,
                    play.run.attempts()
                );
            }
            Ok(play) => {
                ok = false;
                println!("{strategy:?}: stopped {:?} after {} steps", play.outcome, play.steps);
            }
            Err(e) => {
                ok = false;
                error!(target: "storycheck", ?strategy, error = %e, "playthrough failed");
            }
        }
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
