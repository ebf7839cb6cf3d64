use std::fmt;
use std::rc::Rc;

use cq_state::{PuzzleId, QuestId};
use serde::Serialize;

use crate::game::{Game, Hook};

/// Characters of a ROT1 solution that are enough to accept a decoded answer.
const ROT1_PREFIX_CHARS: usize = 20;

/// Dial band used when a frequency puzzle does not set its own, in tenths of
/// a megahertz.
const DEFAULT_MIN_TENTHS: u32 = 500;
const DEFAULT_MAX_TENTHS: u32 = 5000;
const DEFAULT_START_TENTHS: u32 = 1000;

/// A dial locks on when it is less than 0.5 MHz from the target.
const LOCK_TOLERANCE_TENTHS: u32 = 5;

/// Why a puzzle reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Wrong answer with tries left; `remaining` is `None` when attempts are
    /// unlimited.
    Wrong { remaining: Option<u32> },
    /// Last allowed attempt was wrong; the puzzle closes.
    Exhausted,
}

pub type FailureHook = Rc<dyn Fn(&mut Game, FailureKind)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Number,
}

/// What the player has to do to solve a puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleKind {
    /// Type one of the configured answers.
    Password,
    /// Decode a message shifted one letter forward.
    Rot1 { encrypted: String, solution: String },
    /// Tune a receiver onto the target frequency and lock it.
    Frequency(FrequencyDial),
}

impl PuzzleKind {
    pub fn label(&self) -> &'static str {
        match self {
            PuzzleKind::Password => "password",
            PuzzleKind::Rot1 { .. } => "rot1",
            PuzzleKind::Frequency(_) => "frequency",
        }
    }
}

/// Shifts ASCII letters one place forward, wrapping `z` to `a`.
pub fn rot1_encode(plain: &str) -> String {
    plain
        .chars()
        .map(|c| match c {
            'z' => 'a',
            'Z' => 'A',
            c if c.is_ascii_alphabetic() => char::from(c as u8 + 1),
            c => c,
        })
        .collect()
}

/// Decoded answers are compared upper-cased. Long messages are accepted as
/// soon as the answer contains the first twenty characters of the solution.
pub fn rot1_matches(input: &str, solution: &str) -> bool {
    let answer = input.trim().to_uppercase();
    let solution = solution.to_uppercase();
    let prefix: String = solution.chars().take(ROT1_PREFIX_CHARS).collect();
    answer == solution || answer.contains(&prefix)
}

fn to_tenths(mhz: f64) -> u32 {
    (mhz.max(0.0) * 10.0).round() as u32
}

fn tenths_label(tenths: u32) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Receiver dial of a frequency puzzle. Positions are kept in tenths of a
/// megahertz so every setting lands on the 0.1 MHz grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyDial {
    target: u32,
    min: u32,
    max: u32,
    current: u32,
}

impl FrequencyDial {
    /// Dial for `target_mhz` on the 50-500 MHz band, starting at 100 MHz.
    pub fn new(target_mhz: f64) -> Self {
        Self {
            target: to_tenths(target_mhz),
            min: DEFAULT_MIN_TENTHS,
            max: DEFAULT_MAX_TENTHS,
            current: DEFAULT_START_TENTHS,
        }
    }

    pub fn band(mut self, min_mhz: f64, max_mhz: f64) -> Self {
        self.min = to_tenths(min_mhz);
        self.max = to_tenths(max_mhz).max(self.min);
        self.current = self.current.clamp(self.min, self.max);
        self
    }

    pub fn start_at(mut self, mhz: f64) -> Self {
        self.current = to_tenths(mhz).clamp(self.min, self.max);
        self
    }

    pub fn frequency_mhz(&self) -> f64 {
        f64::from(self.current) / 10.0
    }

    pub fn target_mhz(&self) -> f64 {
        f64::from(self.target) / 10.0
    }

    /// Turns the dial by `delta_mhz`, clamped to the band. Returns the new
    /// frequency.
    pub fn tune(&mut self, delta_mhz: f64) -> f64 {
        let delta = (delta_mhz * 10.0).round() as i64;
        let next = (i64::from(self.current) + delta).clamp(i64::from(self.min), i64::from(self.max));
        self.current = u32::try_from(next).unwrap_or(self.current);
        self.frequency_mhz()
    }

    /// Jumps straight to `mhz`, as a slider or typed value would.
    pub fn set(&mut self, mhz: f64) -> f64 {
        self.current = to_tenths(mhz).clamp(self.min, self.max);
        self.frequency_mhz()
    }

    fn distance(&self) -> u32 {
        self.current.abs_diff(self.target)
    }

    /// Percentage shown on the signal meter; ten points per megahertz off.
    pub fn signal_strength(&self) -> u32 {
        100u32.saturating_sub(self.distance())
    }

    pub fn is_locked_on(&self) -> bool {
        self.distance() < LOCK_TOLERANCE_TENTHS
    }

    pub fn view(&self) -> TunerView {
        TunerView {
            frequency_mhz: tenths_label(self.current),
            min_mhz: tenths_label(self.min),
            max_mhz: tenths_label(self.max),
            signal_strength: self.signal_strength(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunerView {
    pub frequency_mhz: String,
    pub min_mhz: String,
    pub max_mhz: String,
    pub signal_strength: u32,
}

#[derive(Clone)]
pub struct PuzzleConfig {
    pub id: PuzzleId,
    pub title: String,
    pub description: String,
    pub kind: PuzzleKind,
    pub correct_answers: Vec<String>,
    pub case_sensitive: bool,
    pub hint: Option<String>,
    pub placeholder: Option<String>,
    /// Zero means unlimited.
    pub max_attempts: u32,
    pub input_type: InputType,
    /// Quest completed automatically once the puzzle is solved.
    pub completes_quest: Option<QuestId>,
    pub on_success: Option<Hook>,
    pub on_failure: Option<FailureHook>,
}

impl PuzzleConfig {
    pub fn new(id: impl Into<PuzzleId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            kind: PuzzleKind::Password,
            correct_answers: Vec::new(),
            case_sensitive: false,
            hint: None,
            placeholder: None,
            max_attempts: 0,
            input_type: InputType::Text,
            completes_quest: None,
            on_success: None,
            on_failure: None,
        }
    }

    /// Password prompt with a single exact, case-sensitive solution.
    pub fn password(
        id: impl Into<PuzzleId>,
        title: impl Into<String>,
        solution: impl Into<String>,
    ) -> Self {
        Self::new(id, title).answer(solution).case_sensitive(true)
    }

    /// Turns this into a ROT1 decoding puzzle for `solution`; the encrypted
    /// text shown to the player is derived from it.
    pub fn rot1(mut self, solution: impl Into<String>) -> Self {
        let solution = solution.into();
        self.kind = PuzzleKind::Rot1 {
            encrypted: rot1_encode(&solution),
            solution,
        };
        self
    }

    pub fn frequency(mut self, dial: FrequencyDial) -> Self {
        self.kind = PuzzleKind::Frequency(dial);
        self.input_type = InputType::Number;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answers.push(answer.into());
        self
    }

    pub fn answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.correct_answers
            .extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn numeric(mut self) -> Self {
        self.input_type = InputType::Number;
        self
    }

    pub fn completes_quest(mut self, quest: impl Into<QuestId>) -> Self {
        self.completes_quest = Some(quest.into());
        self
    }

    pub fn on_success(mut self, hook: impl Fn(&mut Game) + 'static) -> Self {
        self.on_success = Some(Rc::new(hook));
        self
    }

    pub fn on_failure(mut self, hook: impl Fn(&mut Game, FailureKind) + 'static) -> Self {
        self.on_failure = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for PuzzleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleConfig")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("kind", &self.kind.label())
            .field("answers", &self.correct_answers.len())
            .field("case_sensitive", &self.case_sensitive)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Normalises player input the way answers are compared: trimmed, and
/// lower-cased unless the puzzle is case-sensitive.
pub fn normalize(input: &str, case_sensitive: bool) -> String {
    let trimmed = input.trim();
    if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

pub fn answer_matches(input: &str, answers: &[String], case_sensitive: bool) -> bool {
    let candidate = normalize(input, case_sensitive);
    answers.iter().any(|answer| {
        if case_sensitive {
            *answer == candidate
        } else {
            answer.to_lowercase() == candidate
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleState {
    Active,
    Solved,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tone", content = "message", rename_all = "snake_case")]
pub enum PuzzleFeedback {
    Success(String),
    Error(String),
}

impl PuzzleFeedback {
    pub fn message(&self) -> &str {
        match self {
            PuzzleFeedback::Success(message) | PuzzleFeedback::Error(message) => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Solved,
    Wrong { remaining: Option<u32> },
    Exhausted,
    /// The puzzle already finished; the submission was ignored.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleView {
    pub id: PuzzleId,
    pub kind: &'static str,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub placeholder: String,
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuner: Option<TunerView>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub input_enabled: bool,
    pub state: PuzzleState,
}

/// One showing of a puzzle. Attempts start at zero and a frequency dial
/// starts at its configured position every time the puzzle is shown.
#[derive(Debug)]
pub struct Puzzle {
    config: PuzzleConfig,
    dial: Option<FrequencyDial>,
    attempts: u32,
    state: PuzzleState,
    session: u64,
}

impl Puzzle {
    pub fn new(config: PuzzleConfig, session: u64) -> Self {
        let dial = match &config.kind {
            PuzzleKind::Frequency(dial) => Some(*dial),
            _ => None,
        };
        Self {
            config,
            dial,
            attempts: 0,
            state: PuzzleState::Active,
            session,
        }
    }

    pub fn id(&self) -> &PuzzleId {
        &self.config.id
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn kind(&self) -> &PuzzleKind {
        &self.config.kind
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn state(&self) -> PuzzleState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn dial(&self) -> Option<&FrequencyDial> {
        self.dial.as_ref()
    }

    /// Turns the dial of an active frequency puzzle.
    pub fn tune(&mut self, delta_mhz: f64) -> Option<f64> {
        if self.state != PuzzleState::Active {
            return None;
        }
        self.dial.as_mut().map(|dial| dial.tune(delta_mhz))
    }

    /// Checks one answer. A frequency puzzle takes an optional typed
    /// frequency and then locks whatever the dial shows.
    pub fn submit(&mut self, input: &str) -> SubmitOutcome {
        if self.state != PuzzleState::Active {
            return SubmitOutcome::Rejected;
        }
        self.attempts += 1;
        let solved = match &self.config.kind {
            PuzzleKind::Password => {
                answer_matches(input, &self.config.correct_answers, self.config.case_sensitive)
            }
            PuzzleKind::Rot1 { solution, .. } => rot1_matches(input, solution),
            PuzzleKind::Frequency(_) => self.dial.as_mut().is_some_and(|dial| {
                let typed = input.trim();
                if !typed.is_empty() {
                    match typed.parse::<f64>() {
                        Ok(mhz) => {
                            dial.set(mhz);
                        }
                        Err(_) => log::debug!("ignoring non-numeric frequency {typed:?}"),
                    }
                }
                dial.is_locked_on()
            }),
        };
        if solved {
            self.state = PuzzleState::Solved;
            return SubmitOutcome::Solved;
        }
        if self.config.max_attempts == 0 {
            return SubmitOutcome::Wrong { remaining: None };
        }
        let remaining = self.config.max_attempts.saturating_sub(self.attempts);
        if remaining == 0 {
            self.state = PuzzleState::Exhausted;
            SubmitOutcome::Exhausted
        } else {
            SubmitOutcome::Wrong {
                remaining: Some(remaining),
            }
        }
    }

    pub fn view(&self) -> PuzzleView {
        let default_placeholder = match self.config.kind {
            PuzzleKind::Password => "Enter password...",
            PuzzleKind::Rot1 { .. } => "Enter the decoded message...",
            PuzzleKind::Frequency(_) => "MHz",
        };
        PuzzleView {
            id: self.config.id.clone(),
            kind: self.config.kind.label(),
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            hint: self.config.hint.clone(),
            placeholder: self
                .config
                .placeholder
                .clone()
                .unwrap_or_else(|| default_placeholder.to_string()),
            input_type: self.config.input_type,
            encrypted_text: match &self.config.kind {
                PuzzleKind::Rot1 { encrypted, .. } => Some(encrypted.clone()),
                _ => None,
            },
            tuner: self.dial.as_ref().map(FrequencyDial::view),
            attempts: self.attempts,
            max_attempts: self.config.max_attempts,
            input_enabled: self.state == PuzzleState::Active,
            state: self.state,
        }
    }
}

pub fn feedback_for(kind: &PuzzleKind, outcome: SubmitOutcome) -> Option<PuzzleFeedback> {
    let wrong = match kind {
        PuzzleKind::Password => "✗ Incorrect password.",
        PuzzleKind::Rot1 { .. } => "✗ That doesn't seem right. Try again.",
        PuzzleKind::Frequency(_) => "✗ No clear signal at this frequency.",
    };
    match outcome {
        SubmitOutcome::Solved => Some(PuzzleFeedback::Success(match kind {
            PuzzleKind::Password => "✓ Correct! Access granted.".to_string(),
            _ => "✓ Puzzle solved!".to_string(),
        })),
        SubmitOutcome::Exhausted => Some(PuzzleFeedback::Error(
            "✗ Maximum attempts reached. Access denied.".to_string(),
        )),
        SubmitOutcome::Wrong {
            remaining: Some(remaining),
        } => Some(PuzzleFeedback::Error(format!(
            "{wrong} ({remaining} attempts left)"
        ))),
        SubmitOutcome::Wrong { remaining: None } => {
            Some(PuzzleFeedback::Error(wrong.to_string()))
        }
        SubmitOutcome::Rejected => None,
    }
}
