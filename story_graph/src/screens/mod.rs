//! Screen definitions - the nodes of the story graph.

mod body;

pub use body::*;

use serde::{Deserialize, Serialize};

/// Unique identifier for screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(pub u32);

impl std::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ScreenId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Authored value used for "no real screen" in the story file.
pub const SENTINEL: i64 = -1;

/// Successor of a dialogue or learning screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Next {
    Screen(ScreenId),
    /// The story ends after this screen.
    End,
}

impl TryFrom<i64> for Next {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            SENTINEL => Ok(Next::End),
            id => u32::try_from(id)
                .map(|id| Next::Screen(ScreenId(id)))
                .map_err(|_| format!("invalid next screen {id}, expected a screen id or {SENTINEL}")),
        }
    }
}

impl From<Next> for i64 {
    fn from(next: Next) -> Self {
        match next {
            Next::Screen(id) => id.0 as i64,
            Next::End => SENTINEL,
        }
    }
}

/// Where picking an option leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionTarget {
    Screen(ScreenId),
    /// Show the same choice screen again.
    Retry,
    /// The story ends.
    End,
}

impl OptionTarget {
    /// The target screen, if this target names one.
    pub fn screen(&self) -> Option<ScreenId> {
        match self {
            OptionTarget::Screen(id) => Some(*id),
            OptionTarget::Retry | OptionTarget::End => None,
        }
    }
}

/// The four kinds of screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Dialogue,
    Learning,
    Choice,
    Boss,
}

impl ScreenKind {
    /// Whether the screen waits for `choose` rather than `continue`.
    pub fn is_choice(&self) -> bool {
        matches!(self, ScreenKind::Choice | ScreenKind::Boss)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenKind::Dialogue => "dialogue",
            ScreenKind::Learning => "learning",
            ScreenKind::Choice => "choice",
            ScreenKind::Boss => "boss",
        }
    }
}

impl std::fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific screen payload, tagged by `type` in the story file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenBody {
    Dialogue(DialogueBody),
    Learning(LearningBody),
    Choice(ChoiceBody),
    /// A choice graded as a boss checkpoint.
    Boss(ChoiceBody),
}

/// One unit of displayed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: ScreenId,

    /// Chapter this screen belongs to. Non-decreasing along the play order by
    /// authoring convention only.
    pub chapter: u32,

    #[serde(flatten)]
    pub body: ScreenBody,
}

impl Screen {
    /// Create a dialogue screen.
    pub fn dialogue(id: u32, chapter: u32, body: DialogueBody) -> Self {
        Self {
            id: ScreenId(id),
            chapter,
            body: ScreenBody::Dialogue(body),
        }
    }

    /// Create a learning screen.
    pub fn learning(id: u32, chapter: u32, body: LearningBody) -> Self {
        Self {
            id: ScreenId(id),
            chapter,
            body: ScreenBody::Learning(body),
        }
    }

    /// Create a narrative choice screen.
    pub fn choice(id: u32, chapter: u32, body: ChoiceBody) -> Self {
        Self {
            id: ScreenId(id),
            chapter,
            body: ScreenBody::Choice(body),
        }
    }

    /// Create a boss screen.
    pub fn boss(id: u32, chapter: u32, body: ChoiceBody) -> Self {
        Self {
            id: ScreenId(id),
            chapter,
            body: ScreenBody::Boss(body),
        }
    }

    pub fn kind(&self) -> ScreenKind {
        match &self.body {
            ScreenBody::Dialogue(_) => ScreenKind::Dialogue,
            ScreenBody::Learning(_) => ScreenKind::Learning,
            ScreenBody::Choice(_) => ScreenKind::Choice,
            ScreenBody::Boss(_) => ScreenKind::Boss,
        }
    }

    /// Successor for dialogue and learning screens; `None` for choices.
    pub fn next(&self) -> Option<Next> {
        match &self.body {
            ScreenBody::Dialogue(d) => Some(d.next),
            ScreenBody::Learning(l) => Some(l.next),
            ScreenBody::Choice(_) | ScreenBody::Boss(_) => None,
        }
    }

    /// The choice payload of a `Choice` or `Boss` screen.
    pub fn choice_body(&self) -> Option<&ChoiceBody> {
        match &self.body {
            ScreenBody::Choice(c) | ScreenBody::Boss(c) => Some(c),
            ScreenBody::Dialogue(_) | ScreenBody::Learning(_) => None,
        }
    }

    /// Fundamental taught by a learning screen.
    pub fn fundamental(&self) -> Option<u8> {
        match &self.body {
            ScreenBody::Learning(l) => Some(l.fundamental),
            _ => None,
        }
    }

    /// Opaque asset key for the renderer.
    pub fn image(&self) -> &str {
        match &self.body {
            ScreenBody::Dialogue(d) => &d.image,
            ScreenBody::Learning(l) => &l.image,
            ScreenBody::Choice(c) | ScreenBody::Boss(c) => &c.image,
        }
    }

    /// Whether the story ends on this screen.
    pub fn is_terminal(&self) -> bool {
        self.next() == Some(Next::End)
    }

    /// Every screen this screen can lead to, excluding retry self-loops.
    pub fn successors(&self) -> Vec<ScreenId> {
        match &self.body {
            ScreenBody::Dialogue(_) | ScreenBody::Learning(_) => match self.next() {
                Some(Next::Screen(id)) => vec![id],
                _ => Vec::new(),
            },
            ScreenBody::Choice(c) | ScreenBody::Boss(c) => {
                let mut targets: Vec<ScreenId> =
                    c.options.iter().filter_map(|o| o.next.screen()).collect();
                targets.dedup();
                targets
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_boss() -> Screen {
        Screen::boss(
            19,
            3,
            ChoiceBody::new("What happens to the Enzyme?")
                .with_option(ChoiceOption::wrong("It turns ON", "No"))
                .with_option(ChoiceOption::correct("It stays OFF", "Yes", 20))
                .with_option(ChoiceOption::wrong("It crashes", "No")),
        )
    }

    #[test]
    fn test_next_from_raw() {
        assert_eq!(Next::try_from(5i64), Ok(Next::Screen(ScreenId(5))));
        assert_eq!(Next::try_from(-1i64), Ok(Next::End));
        assert!(Next::try_from(-7i64).is_err());
        assert_eq!(i64::from(Next::End), -1);
    }

    #[test]
    fn test_screen_kind() {
        let boss = sample_boss();
        assert_eq!(boss.kind(), ScreenKind::Boss);
        assert!(boss.kind().is_choice());
        assert!(boss.next().is_none());
        assert!(!boss.is_terminal());
    }

    #[test]
    fn test_terminal_dialogue() {
        let last = Screen::dialogue(59, 10, DialogueBody::new("Dr. Maya", "Bye!").with_next(Next::End));
        assert!(last.is_terminal());
        assert!(last.successors().is_empty());
    }

    #[test]
    fn test_boss_successors_skip_retry() {
        assert_eq!(sample_boss().successors(), vec![ScreenId(20)]);
    }

    #[test]
    fn test_learning_fundamental() {
        let screen = Screen::learning(
            32,
            6,
            LearningBody::new(7, "Attractors", "Stable states").with_next(Next::Screen(ScreenId(33))),
        );
        assert_eq!(screen.fundamental(), Some(7));
        assert_eq!(screen.successors(), vec![ScreenId(33)]);
    }

    #[test]
    fn test_screen_id_display() {
        assert_eq!(ScreenId(42).to_string(), "#42");
    }
}
