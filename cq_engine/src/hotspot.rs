use std::fmt;
use std::rc::Rc;

use cq_state::{FlagKey, Item, ItemId, QuestId, SceneId};
use serde::{Deserialize, Serialize};

use crate::dialogue::DialogueLine;
use crate::game::{Game, Hook};
use crate::puzzle::PuzzleConfig;

/// Clickable area in percent of the scene size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Where the player walks to before interacting: horizontally centred,
    /// at the bottom edge but never below the walkable band.
    pub fn walk_target(&self) -> (f32, f32) {
        (
            self.x + self.width / 2.0,
            (self.y + self.height).min(90.0),
        )
    }
}

/// Gate on story progress, evaluated against the live game state.
#[derive(Clone)]
pub enum Condition {
    Flag(FlagKey),
    NotFlag(FlagKey),
    HasItem(ItemId),
    QuestActive(QuestId),
    QuestCompleted(QuestId),
    StoryPartAtLeast(u32),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Predicate(Rc<dyn Fn(&Game) -> bool>),
}

impl Condition {
    pub fn flag(key: impl Into<FlagKey>) -> Self {
        Condition::Flag(key.into())
    }

    pub fn not_flag(key: impl Into<FlagKey>) -> Self {
        Condition::NotFlag(key.into())
    }

    pub fn has_item(item: impl Into<ItemId>) -> Self {
        Condition::HasItem(item.into())
    }

    pub fn predicate(check: impl Fn(&Game) -> bool + 'static) -> Self {
        Condition::Predicate(Rc::new(check))
    }

    pub fn evaluate(&self, game: &Game) -> bool {
        match self {
            Condition::Flag(key) => game.is_flag_set(key.as_str()),
            Condition::NotFlag(key) => !game.is_flag_set(key.as_str()),
            Condition::HasItem(item) => game.has_item(item.as_str()),
            Condition::QuestActive(quest) => game.quests().is_active(quest.as_str()),
            Condition::QuestCompleted(quest) => game.quests().is_completed(quest.as_str()),
            Condition::StoryPartAtLeast(part) => game.story_part() >= *part,
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(game)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(game)),
            Condition::Not(inner) => !inner.evaluate(game),
            Condition::Predicate(check) => check(game),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Flag(key) => write!(f, "Flag({key})"),
            Condition::NotFlag(key) => write!(f, "NotFlag({key})"),
            Condition::HasItem(item) => write!(f, "HasItem({item})"),
            Condition::QuestActive(quest) => write!(f, "QuestActive({quest})"),
            Condition::QuestCompleted(quest) => write!(f, "QuestCompleted({quest})"),
            Condition::StoryPartAtLeast(part) => write!(f, "StoryPartAtLeast({part})"),
            Condition::All(conditions) => f.debug_tuple("All").field(conditions).finish(),
            Condition::Any(conditions) => f.debug_tuple("Any").field(conditions).finish(),
            Condition::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Text that is either fixed or computed from the state at click time.
#[derive(Clone)]
pub enum Message {
    Static(String),
    Dynamic(Rc<dyn Fn(&Game) -> String>),
}

impl Message {
    pub fn resolve(&self, game: &Game) -> String {
        match self {
            Message::Static(text) => text.clone(),
            Message::Dynamic(build) => build(game),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Static(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Static(text)
    }
}

#[derive(Clone)]
pub struct Hotspot {
    pub id: String,
    pub name: String,
    pub rect: Rect,
    pub visible: bool,
    pub skip_walk: bool,
    pub enabled: Option<Condition>,
    pub disabled_message: Option<String>,
    pub condition: Option<Condition>,
    pub fail_message: Option<String>,
    pub look_message: Option<Message>,
    pub action: Option<Hook>,
    pub target_scene: Option<SceneId>,
    pub item: Option<Item>,
    pub dialogue: Option<Vec<DialogueLine>>,
    /// Puzzle opened after every other effect of the click.
    pub puzzle: Option<PuzzleConfig>,
}

impl Hotspot {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rect,
            visible: true,
            skip_walk: false,
            enabled: None,
            disabled_message: None,
            condition: None,
            fail_message: None,
            look_message: None,
            action: None,
            target_scene: None,
            item: None,
            dialogue: None,
            puzzle: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn skip_walk(mut self) -> Self {
        self.skip_walk = true;
        self
    }

    pub fn enabled_when(mut self, condition: Condition, disabled_message: Option<&str>) -> Self {
        self.enabled = Some(condition);
        self.disabled_message = disabled_message.map(str::to_string);
        self
    }

    pub fn requires(mut self, condition: Condition, fail_message: Option<&str>) -> Self {
        self.condition = Some(condition);
        self.fail_message = fail_message.map(str::to_string);
        self
    }

    pub fn look(mut self, message: impl Into<Message>) -> Self {
        self.look_message = Some(message.into());
        self
    }

    pub fn look_with(mut self, build: impl Fn(&Game) -> String + 'static) -> Self {
        self.look_message = Some(Message::Dynamic(Rc::new(build)));
        self
    }

    pub fn action(mut self, action: impl Fn(&mut Game) + 'static) -> Self {
        self.action = Some(Rc::new(action));
        self
    }

    pub fn leads_to(mut self, scene: impl Into<SceneId>) -> Self {
        self.target_scene = Some(scene.into());
        self
    }

    pub fn gives(mut self, item: Item) -> Self {
        self.item = Some(item);
        self
    }

    pub fn dialogue(mut self, lines: Vec<DialogueLine>) -> Self {
        self.dialogue = Some(lines);
        self
    }

    pub fn puzzle(mut self, config: PuzzleConfig) -> Self {
        self.puzzle = Some(config);
        self
    }

    pub fn view(&self) -> HotspotView {
        HotspotView {
            id: self.id.clone(),
            name: self.name.clone(),
            rect: self.rect,
        }
    }
}

impl fmt::Debug for Hotspot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hotspot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rect", &self.rect)
            .field("visible", &self.visible)
            .field("enabled", &self.enabled)
            .field("condition", &self.condition)
            .field("target_scene", &self.target_scene)
            .field("puzzle", &self.puzzle.as_ref().map(|puzzle| &puzzle.id))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotView {
    pub id: String,
    pub name: String,
    pub rect: Rect,
}

/// Result of clicking a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A dialogue or puzzle is in progress; clicks are ignored.
    Blocked,
    UnknownHotspot,
    Disabled,
    ConditionFailed,
    Activated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_target_stays_in_walkable_band() {
        assert_eq!(Rect::new(10.0, 40.0, 20.0, 10.0).walk_target(), (20.0, 50.0));
        assert_eq!(Rect::new(0.0, 80.0, 10.0, 30.0).walk_target(), (5.0, 90.0));
    }

    #[test]
    fn conditions_debug_without_closures() {
        let condition = Condition::All(vec![
            Condition::flag("usb_analyzed"),
            Condition::Not(Box::new(Condition::has_item("key"))),
            Condition::predicate(|_| true),
        ]);
        assert_eq!(
            format!("{condition:?}"),
            "All([Flag(usb_analyzed), Not(HasItem(key)), Predicate(..)])"
        );
    }
}
