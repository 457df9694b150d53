//! Static validation pass over a whole story.
//!
//! The checks mirror the structural invariants the run engine relies on:
//! 1. **Closure**: every `next` and option target names an existing screen
//! 2. **Choices**: at least two options; bosses have exactly one progressing option
//! 3. **Fundamentals**: numbered `1..=N` in order of first appearance, no repeats
//! 4. **Shape**: the graph is acyclic apart from boss retry self-loops
//!
//! Error-level findings make a story unusable. Warning-level findings describe
//! authoring conventions (chapter order, reachability) and only fail the load
//! in strict mode.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::screens::{Next, OptionTarget, Screen, ScreenBody, ScreenId};
use crate::store::Story;

/// Highest fundamental number a story may teach.
pub const MAX_FUNDAMENTALS: u8 = 10;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// What a finding is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FindingKind {
    DuplicateScreenId,
    DuplicateChapter { chapter: u32 },
    MissingStart,
    UnknownChapter { chapter: u32 },
    /// A reference to a screen that does not exist.
    DanglingReference { target: ScreenId },
    TooFewOptions { count: usize },
    /// Boss screens need exactly one progressing option.
    BossProgressingOptions { count: usize },
    NoProgressingOption,
    /// Narrative choices cannot fail; the option advances regardless.
    GameOverOnNarrativeChoice { option: usize },
    /// An option that always advances must not loop back to its own screen.
    /// This covers every option of a narrative choice.
    RetryOnProgressingOption { option: usize },
    FundamentalOutOfRange { fundamental: u8 },
    DuplicateFundamental { fundamental: u8 },
    FundamentalOutOfOrder { expected: u8, found: u8 },
    /// Part of a cycle other than a boss retry.
    Cycle,
    ChapterRegression { previous: u32, chapter: u32 },
    DivergentChoiceTargets,
    Unreachable,
}

impl FindingKind {
    /// Default severity of this kind of finding.
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::ChapterRegression { .. }
            | FindingKind::GameOverOnNarrativeChoice { .. }
            | FindingKind::DivergentChoiceTargets
            | FindingKind::Unreachable => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// One validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Screen the finding is attached to, if any.
    pub screen: Option<ScreenId>,
    pub kind: FindingKind,
}

impl Finding {
    pub fn new(screen: Option<ScreenId>, kind: FindingKind) -> Self {
        Self {
            severity: kind.severity(),
            screen,
            kind,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.screen {
            Some(id) => write!(f, "{level} at screen {id}: ")?,
            None => write!(f, "{level}: ")?,
        }
        match &self.kind {
            FindingKind::DuplicateScreenId => write!(f, "screen id is used more than once"),
            FindingKind::DuplicateChapter { chapter } => {
                write!(f, "chapter {chapter} is declared more than once")
            }
            FindingKind::MissingStart => write!(f, "start screen does not exist"),
            FindingKind::UnknownChapter { chapter } => {
                write!(f, "chapter {chapter} has no chapter entry")
            }
            FindingKind::DanglingReference { target } => {
                write!(f, "references missing screen {target}")
            }
            FindingKind::TooFewOptions { count } => {
                write!(f, "has {count} option(s), at least 2 required")
            }
            FindingKind::BossProgressingOptions { count } => {
                write!(f, "boss has {count} progressing option(s), exactly 1 required")
            }
            FindingKind::NoProgressingOption => write!(f, "choice has no progressing option"),
            FindingKind::GameOverOnNarrativeChoice { option } => {
                write!(f, "narrative choice option {option} is marked game_over and will advance anyway")
            }
            FindingKind::RetryOnProgressingOption { option } => {
                write!(f, "option {option} always advances but loops back to its own screen")
            }
            FindingKind::FundamentalOutOfRange { fundamental } => {
                write!(f, "fundamental {fundamental} is outside 1..={MAX_FUNDAMENTALS}")
            }
            FindingKind::DuplicateFundamental { fundamental } => {
                write!(f, "fundamental {fundamental} is taught twice")
            }
            FindingKind::FundamentalOutOfOrder { expected, found } => {
                write!(f, "expected fundamental {expected}, found {found}")
            }
            FindingKind::Cycle => write!(f, "screen is part of a cycle"),
            FindingKind::ChapterRegression { previous, chapter } => {
                write!(f, "chapter goes back from {previous} to {chapter}")
            }
            FindingKind::DivergentChoiceTargets => {
                write!(f, "narrative choice options lead to different screens")
            }
            FindingKind::Unreachable => write!(f, "screen is unreachable from the start"),
        }
    }
}

/// All findings of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    fn push(&mut self, screen: Option<ScreenId>, kind: FindingKind) {
        self.findings.push(Finding::new(screen, kind));
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings attached to one screen.
    pub fn for_screen(&self, id: ScreenId) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.screen == Some(id)).collect()
    }

    /// Whether any finding matches the predicate.
    pub fn contains<F>(&self, predicate: F) -> bool
    where
        F: Fn(&FindingKind) -> bool,
    {
        self.findings.iter().any(|f| predicate(&f.kind))
    }
}

/// Run every check over the story.
pub fn validate(story: &Story) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut ids: HashSet<ScreenId> = HashSet::new();
    for screen in &story.screens {
        if !ids.insert(screen.id) {
            report.push(Some(screen.id), FindingKind::DuplicateScreenId);
        }
    }

    let mut chapters: HashSet<u32> = HashSet::new();
    for chapter in &story.chapters {
        if !chapters.insert(chapter.id) {
            report.push(None, FindingKind::DuplicateChapter { chapter: chapter.id });
        }
    }

    if !ids.contains(&story.start) {
        report.push(Some(story.start), FindingKind::MissingStart);
    }

    let mut fundamentals: HashSet<u8> = HashSet::new();
    let mut previous_chapter: Option<u32> = None;

    for screen in &story.screens {
        let id = Some(screen.id);

        if !chapters.contains(&screen.chapter) {
            report.push(id, FindingKind::UnknownChapter { chapter: screen.chapter });
        }
        if let Some(previous) = previous_chapter {
            if screen.chapter < previous {
                report.push(
                    id,
                    FindingKind::ChapterRegression {
                        previous,
                        chapter: screen.chapter,
                    },
                );
            }
        }
        previous_chapter = Some(screen.chapter);

        match &screen.body {
            ScreenBody::Dialogue(_) | ScreenBody::Learning(_) => {
                if let Some(Next::Screen(target)) = screen.next() {
                    if !ids.contains(&target) {
                        report.push(id, FindingKind::DanglingReference { target });
                    }
                }
                if let Some(fundamental) = screen.fundamental() {
                    check_fundamental(&mut report, &mut fundamentals, screen.id, fundamental);
                }
            }
            ScreenBody::Choice(_) | ScreenBody::Boss(_) => check_choice(&mut report, &ids, screen),
        }
    }

    for id in find_cycles(story, &ids) {
        report.push(Some(id), FindingKind::Cycle);
    }

    if ids.contains(&story.start) {
        let reachable = reachable_from(story, story.start);
        for screen in &story.screens {
            if !reachable.contains(&screen.id) {
                report.push(Some(screen.id), FindingKind::Unreachable);
            }
        }
    }

    report
}

fn check_fundamental(
    report: &mut ValidationReport,
    seen: &mut HashSet<u8>,
    screen: ScreenId,
    fundamental: u8,
) {
    if fundamental == 0 || fundamental > MAX_FUNDAMENTALS {
        report.push(Some(screen), FindingKind::FundamentalOutOfRange { fundamental });
        return;
    }
    if seen.contains(&fundamental) {
        report.push(Some(screen), FindingKind::DuplicateFundamental { fundamental });
        return;
    }
    let expected = seen.len() as u8 + 1;
    if fundamental != expected {
        report.push(
            Some(screen),
            FindingKind::FundamentalOutOfOrder {
                expected,
                found: fundamental,
            },
        );
    }
    seen.insert(fundamental);
}

fn check_choice(report: &mut ValidationReport, ids: &HashSet<ScreenId>, screen: &Screen) {
    let id = Some(screen.id);
    let Some(body) = screen.choice_body() else {
        return;
    };
    let is_boss = matches!(screen.body, ScreenBody::Boss(_));

    if body.options.len() < 2 {
        report.push(id, FindingKind::TooFewOptions { count: body.options.len() });
    }

    for (index, option) in body.options.iter().enumerate() {
        if let OptionTarget::Screen(target) = option.next {
            if !ids.contains(&target) {
                report.push(id, FindingKind::DanglingReference { target });
            }
        }
        let advances = option.is_correct() || !is_boss;
        if advances && option.next == OptionTarget::Retry {
            report.push(id, FindingKind::RetryOnProgressingOption { option: index });
        }
        if !is_boss && option.game_over {
            report.push(id, FindingKind::GameOverOnNarrativeChoice { option: index });
        }
    }

    let progressing = body.progressing_options().count();
    if is_boss {
        if progressing != 1 {
            report.push(id, FindingKind::BossProgressingOptions { count: progressing });
        }
    } else if progressing == 0 {
        report.push(id, FindingKind::NoProgressingOption);
    } else {
        let targets: HashSet<OptionTarget> = body.options.iter().map(|o| o.next).collect();
        if targets.len() > 1 {
            report.push(id, FindingKind::DivergentChoiceTargets);
        }
    }
}

/// Screens on a cycle, ignoring retry self-loops (which are not edges here).
fn find_cycles(story: &Story, ids: &HashSet<ScreenId>) -> Vec<ScreenId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let edges: HashMap<ScreenId, Vec<ScreenId>> = story
        .screens
        .iter()
        .map(|s| {
            let succ = s.successors().into_iter().filter(|t| ids.contains(t)).collect();
            (s.id, succ)
        })
        .collect();

    let mut marks: HashMap<ScreenId, Mark> =
        edges.keys().map(|id| (*id, Mark::Unvisited)).collect();
    let mut on_cycle: Vec<ScreenId> = Vec::new();

    let mut roots: Vec<ScreenId> = edges.keys().copied().collect();
    roots.sort();

    for root in roots {
        if marks[&root] != Mark::Unvisited {
            continue;
        }
        // Iterative DFS: (node, index of next successor to visit).
        let mut stack: Vec<(ScreenId, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::InProgress);

        while let Some((node, next_child)) = stack.pop() {
            let children = &edges[&node];
            if next_child < children.len() {
                stack.push((node, next_child + 1));
                let child = children[next_child];
                match marks[&child] {
                    Mark::Unvisited => {
                        marks.insert(child, Mark::InProgress);
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        // Everything on the stack from `child` upward is on the cycle.
                        if let Some(pos) = stack.iter().position(|(n, _)| *n == child) {
                            on_cycle.extend(stack[pos..].iter().map(|(n, _)| *n));
                        }
                    }
                    Mark::Done => {}
                }
            } else {
                marks.insert(node, Mark::Done);
            }
        }
    }

    on_cycle.sort();
    on_cycle.dedup();
    on_cycle
}

fn reachable_from(story: &Story, start: ScreenId) -> HashSet<ScreenId> {
    let by_id: HashMap<ScreenId, &Screen> = story.screens.iter().map(|s| (s.id, s)).collect();
    let mut seen: HashSet<ScreenId> = HashSet::new();
    let mut queue = vec![start];

    while let Some(id) = queue.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(screen) = by_id.get(&id) {
            queue.extend(screen.successors());
        }
    }

    seen
}
