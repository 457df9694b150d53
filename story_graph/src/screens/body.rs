//! Kind-specific screen payloads.

use serde::{Deserialize, Serialize};

use super::{Next, OptionTarget, ScreenId, SENTINEL};

/// A line of dialogue from a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueBody {
    pub speaker: String,

    /// May embed lightweight markup for emphasis; the engine never reads it.
    pub text: String,

    #[serde(default)]
    pub image: String,

    pub next: Next,
}

impl DialogueBody {
    /// Create a dialogue line that ends the story until a successor is set.
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            image: String::new(),
            next: Next::End,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_next(mut self, next: Next) -> Self {
        self.next = next;
        self
    }
}

/// An explainer teaching one numbered fundamental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningBody {
    /// 1-based fundamental number, unique across the story.
    pub fundamental: u8,
    pub title: String,
    pub content: String,

    #[serde(default)]
    pub image: String,

    pub next: Next,
}

impl LearningBody {
    pub fn new(fundamental: u8, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            fundamental,
            title: title.into(),
            content: content.into(),
            image: String::new(),
            next: Next::End,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_next(mut self, next: Next) -> Self {
        self.next = next;
        self
    }
}

/// What a wrong answer on a boss screen does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Show the feedback, then let the player answer the same question again.
    #[default]
    Retry,
    /// End the run.
    GameOver,
}

/// Payload shared by narrative choices and boss questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceBody {
    pub question: String,

    #[serde(default)]
    pub image: String,

    pub options: Vec<ChoiceOption>,

    /// Returned when the player asks for a hint on this screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(default)]
    pub on_failure: FailureMode,
}

impl ChoiceBody {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            image: String::new(),
            options: Vec::new(),
            hint: None,
            on_failure: FailureMode::Retry,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_option(mut self, option: ChoiceOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.on_failure = mode;
        self
    }

    /// Look up an option by its display index.
    pub fn option(&self, index: usize) -> Option<&ChoiceOption> {
        self.options.get(index)
    }

    /// Options that move the story forward (`game_over == false`).
    pub fn progressing_options(&self) -> impl Iterator<Item = (usize, &ChoiceOption)> {
        self.options.iter().enumerate().filter(|(_, o)| o.is_correct())
    }

    /// Index of the first progressing option.
    pub fn correct_index(&self) -> Option<usize> {
        self.progressing_options().next().map(|(i, _)| i)
    }
}

/// One answer the player can pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOption", into = "RawOption")]
pub struct ChoiceOption {
    pub text: String,

    /// Shown to the player after picking this option.
    pub feedback: String,

    /// Marks a wrong answer. On boss screens this is a soft failure.
    pub game_over: bool,

    pub next: OptionTarget,
}

impl ChoiceOption {
    /// A progressing option leading to `next`.
    pub fn correct(text: impl Into<String>, feedback: impl Into<String>, next: u32) -> Self {
        Self {
            text: text.into(),
            feedback: feedback.into(),
            game_over: false,
            next: OptionTarget::Screen(ScreenId(next)),
        }
    }

    /// A wrong answer that sends the player back to the same screen.
    pub fn wrong(text: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            feedback: feedback.into(),
            game_over: true,
            next: OptionTarget::Retry,
        }
    }

    /// A progressing option that ends the story.
    pub fn ending(text: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            feedback: feedback.into(),
            game_over: false,
            next: OptionTarget::End,
        }
    }

    pub fn is_correct(&self) -> bool {
        !self.game_over
    }
}

/// Authored shape of an option: `next = -1` means "retry" on a game-over
/// option and "end of story" on a progressing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawOption {
    text: String,
    feedback: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    game_over: bool,
    next: i64,
}

impl TryFrom<RawOption> for ChoiceOption {
    type Error = String;

    fn try_from(raw: RawOption) -> Result<Self, Self::Error> {
        let next = match (raw.next, raw.game_over) {
            (SENTINEL, true) => OptionTarget::Retry,
            (SENTINEL, false) => OptionTarget::End,
            (id, _) => u32::try_from(id)
                .map(|id| OptionTarget::Screen(ScreenId(id)))
                .map_err(|_| format!("option '{}' has invalid next {id}", raw.text))?,
        };
        Ok(Self {
            text: raw.text,
            feedback: raw.feedback,
            game_over: raw.game_over,
            next,
        })
    }
}

impl From<ChoiceOption> for RawOption {
    fn from(option: ChoiceOption) -> Self {
        let next = match option.next {
            OptionTarget::Screen(id) => id.0 as i64,
            OptionTarget::Retry | OptionTarget::End => SENTINEL,
        };
        Self {
            text: option.text,
            feedback: option.feedback,
            game_over: option.game_over,
            next,
        }
    }
}
