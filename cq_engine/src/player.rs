use serde::Serialize;

const DEFAULT_START: (f32, f32) = (50.0, 85.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
}

/// The player sprite as far as the story cares: where it stands, whether it
/// is shown, and its thought bubble.
#[derive(Debug)]
pub struct Player {
    position: PlayerPosition,
    hidden: bool,
    thought: Option<u64>,
    next_thought: u64,
    idle_thoughts: Vec<String>,
    idle_cursor: usize,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: PlayerPosition {
                x: DEFAULT_START.0,
                y: DEFAULT_START.1,
            },
            hidden: false,
            thought: None,
            next_thought: 1,
            idle_thoughts: Vec::new(),
            idle_cursor: 0,
        }
    }
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets placement for a newly entered scene.
    pub fn enter_scene(&mut self, start: Option<(f32, f32)>, hidden: bool, idle: Vec<String>) {
        let (x, y) = start.unwrap_or(DEFAULT_START);
        self.position = PlayerPosition { x, y };
        self.hidden = hidden;
        self.idle_thoughts = idle;
        self.idle_cursor = 0;
    }

    pub fn walk_to(&mut self, x: f32, y: f32) {
        self.position = PlayerPosition { x, y };
    }

    pub fn position(&self) -> PlayerPosition {
        self.position
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_thinking(&self) -> bool {
        self.thought.is_some()
    }

    /// Starts a thought unless one is already showing. Returns the token the
    /// caller uses to clear it later.
    pub fn begin_thought(&mut self) -> Option<u64> {
        if self.thought.is_some() {
            return None;
        }
        let token = self.next_thought;
        self.next_thought += 1;
        self.thought = Some(token);
        Some(token)
    }

    pub fn end_thought(&mut self, token: u64) -> bool {
        if self.thought == Some(token) {
            self.thought = None;
            true
        } else {
            false
        }
    }

    pub fn has_idle_thoughts(&self) -> bool {
        !self.idle_thoughts.is_empty()
    }

    /// Next idle thought, cycling through the scene's list in order.
    pub fn next_idle_thought(&mut self) -> Option<String> {
        if self.idle_thoughts.is_empty() {
            return None;
        }
        let thought = self.idle_thoughts[self.idle_cursor % self.idle_thoughts.len()].clone();
        self.idle_cursor = (self.idle_cursor + 1) % self.idle_thoughts.len();
        Some(thought)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_thought_at_a_time() {
        let mut player = Player::new();
        let token = player.begin_thought().expect("free to think");
        assert!(player.begin_thought().is_none());
        assert!(!player.end_thought(token + 1));
        assert!(player.end_thought(token));
        assert!(player.begin_thought().is_some());
    }

    #[test]
    fn idle_thoughts_cycle_in_order() {
        let mut player = Player::new();
        player.enter_scene(
            Some((20.0, 85.0)),
            false,
            vec!["Love this old tech smell...".to_string(), "Signal processing is poetry.".to_string()],
        );
        assert_eq!(player.position(), PlayerPosition { x: 20.0, y: 85.0 });
        assert_eq!(player.next_idle_thought().as_deref(), Some("Love this old tech smell..."));
        assert_eq!(player.next_idle_thought().as_deref(), Some("Signal processing is poetry."));
        assert_eq!(player.next_idle_thought().as_deref(), Some("Love this old tech smell..."));
    }

    #[test]
    fn scene_without_start_uses_default_spot() {
        let mut player = Player::new();
        player.walk_to(10.0, 10.0);
        player.enter_scene(None, true, Vec::new());
        assert_eq!(player.position(), PlayerPosition { x: 50.0, y: 85.0 });
        assert!(player.is_hidden());
        assert!(player.next_idle_thought().is_none());
    }
}
