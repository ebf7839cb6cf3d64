use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use cq_state::SceneId;
use serde::Serialize;

use crate::game::{Game, Hook};
use crate::hotspot::{Hotspot, HotspotView};
use crate::player::PlayerPosition;

/// Static description of a scene: what is drawn and what can be clicked.
#[derive(Debug, Clone)]
pub struct SceneDescriptor {
    pub id: SceneId,
    pub name: String,
    pub background: Option<String>,
    pub background_color: Option<String>,
    pub hotspots: Vec<Hotspot>,
    pub idle_thoughts: Vec<String>,
    pub player_start: Option<(f32, f32)>,
    pub hide_player: bool,
}

impl SceneDescriptor {
    pub fn new(id: impl Into<SceneId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            background: None,
            background_color: None,
            hotspots: Vec::new(),
            idle_thoughts: Vec::new(),
            player_start: None,
            hide_player: false,
        }
    }

    pub fn background(mut self, path: impl Into<String>) -> Self {
        self.background = Some(path.into());
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn hotspot(mut self, hotspot: Hotspot) -> Self {
        self.hotspots.push(hotspot);
        self
    }

    pub fn idle_thoughts<I, S>(mut self, thoughts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.idle_thoughts = thoughts.into_iter().map(Into::into).collect();
        self
    }

    pub fn player_start(mut self, x: f32, y: f32) -> Self {
        self.player_start = Some((x, y));
        self
    }

    pub fn hide_player(mut self) -> Self {
        self.hide_player = true;
        self
    }

    pub fn find_hotspot(&self, id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|hotspot| hotspot.id == id)
    }

    /// Hotspots marked invisible are not offered to the player.
    pub fn visible_hotspots(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.iter().filter(|hotspot| hotspot.visible)
    }
}

/// A scene the engine can enter. Cleanup of timers, dialogue, overlays and
/// characters is done by the engine, so `on_exit` only needs to undo what
/// the scene itself changed outside those.
pub trait Scene {
    fn descriptor(&self) -> &SceneDescriptor;
    fn on_enter(&self, _game: &mut Game) {}
    fn on_exit(&self, _game: &mut Game) {}
}

impl fmt::Debug for dyn Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene({})", self.descriptor().id)
    }
}

/// Scene assembled from a descriptor and optional enter/exit closures.
pub struct ScriptedScene {
    descriptor: SceneDescriptor,
    on_enter: Option<Hook>,
    on_exit: Option<Hook>,
}

impl ScriptedScene {
    pub fn new(descriptor: SceneDescriptor) -> Self {
        Self {
            descriptor,
            on_enter: None,
            on_exit: None,
        }
    }

    pub fn on_enter(mut self, hook: impl Fn(&mut Game) + 'static) -> Self {
        self.on_enter = Some(Rc::new(hook));
        self
    }

    pub fn on_exit(mut self, hook: impl Fn(&mut Game) + 'static) -> Self {
        self.on_exit = Some(Rc::new(hook));
        self
    }
}

impl Scene for ScriptedScene {
    fn descriptor(&self) -> &SceneDescriptor {
        &self.descriptor
    }

    fn on_enter(&self, game: &mut Game) {
        if let Some(hook) = &self.on_enter {
            hook(game);
        }
    }

    fn on_exit(&self, game: &mut Game) {
        if let Some(hook) = &self.on_exit {
            hook(game);
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneRegistry {
    scenes: BTreeMap<SceneId, Rc<dyn Scene>>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scene under its descriptor id. Returns `true` if a scene
    /// with that id was replaced.
    pub fn register(&mut self, scene: Rc<dyn Scene>) -> bool {
        let id = scene.descriptor().id.clone();
        self.scenes.insert(id, scene).is_some()
    }

    pub fn get(&self, id: &str) -> Option<Rc<dyn Scene>> {
        self.scenes.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SceneId> {
        self.scenes.keys()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Fade out, swap, fade in; each half takes the configured transition time.
    #[default]
    Fade,
    Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneView {
    pub id: SceneId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    pub hotspots: Vec<HotspotView>,
    pub hide_player: bool,
    pub player: PlayerPosition,
}

impl SceneView {
    pub fn new(descriptor: &SceneDescriptor, player: PlayerPosition) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            background: descriptor.background.clone(),
            background_color: descriptor.background_color.clone(),
            hotspots: descriptor.visible_hotspots().map(Hotspot::view).collect(),
            hide_player: descriptor.hide_player,
            player,
        }
    }
}
