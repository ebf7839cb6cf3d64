use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterView {
    /// Unique per scene; repeats of the same character get a numeric suffix.
    pub id: String,
    pub name: String,
    pub image: String,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

pub const DEFAULT_CHARACTER_SCALE: f32 = 0.3;

pub fn character_image(name: &str) -> String {
    format!("assets/images/characters/{name}_southpark.svg")
}

/// NPC sprites placed on the current scene.
#[derive(Debug, Default)]
pub struct CharacterLayer {
    characters: Vec<CharacterView>,
}

impl CharacterLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, name: &str, x: f32, y: f32, scale: f32) -> CharacterView {
        let copies = self
            .characters
            .iter()
            .filter(|character| character.name == name)
            .count();
        let id = if copies == 0 {
            name.to_string()
        } else {
            format!("{name}-{}", copies + 1)
        };
        let view = CharacterView {
            id,
            name: name.to_string(),
            image: character_image(name),
            x,
            y,
            scale,
        };
        self.characters.push(view.clone());
        view
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.characters.len();
        self.characters.retain(|character| character.id != id);
        before != self.characters.len()
    }

    /// Removes every character and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.characters.len();
        self.characters.clear();
        count
    }

    pub fn characters(&self) -> &[CharacterView] {
        &self.characters
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_characters_get_unique_ids() {
        let mut layer = CharacterLayer::new();
        let first = layer.show("volkov", 60.0, 80.0, DEFAULT_CHARACTER_SCALE);
        let second = layer.show("volkov", 20.0, 80.0, 0.5);
        assert_eq!(first.id, "volkov");
        assert_eq!(second.id, "volkov-2");
        assert_eq!(first.image, "assets/images/characters/volkov_southpark.svg");

        assert!(layer.remove("volkov"));
        assert!(!layer.remove("volkov"));
        assert_eq!(layer.clear(), 1);
        assert!(layer.is_empty());
    }
}
