//! Health, lives and key bookkeeping plus the per-level key thresholds.

use serde::{Deserialize, Serialize};

/// Scene identifier that routes back to the title screen.
pub const MAIN_MENU_SCENE: &str = "mainmenu";

/// Health and lives are unsigned and saturate, so neither can leave `[0, max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vitals {
    max_health: u32,
    health: u32,
    lives: u32,
    keys: u32,
}

impl Vitals {
    /// Starts at full health with `lives` lives. Lives are only ever lost.
    pub fn new(max_health: u32, lives: u32) -> Self {
        Self {
            max_health,
            health: max_health,
            lives,
            keys: 0,
        }
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    #[cfg(test)]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn keys(&self) -> u32 {
        self.keys
    }

    /// Returns `true` when this hit is the one that brought health to zero.
    pub fn damage(&mut self, amount: u32) -> bool {
        let was_alive = self.health > 0;
        self.health = self.health.saturating_sub(amount);
        was_alive && self.health == 0
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    /// Returns the remaining lives.
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn add_key(&mut self) -> u32 {
        self.keys = self.keys.saturating_add(1);
        self.keys
    }

    pub fn health_text(&self) -> String {
        format!("Health: {}", self.health)
    }

    pub fn lives_text(&self) -> String {
        format!("Lives: {}", self.lives)
    }
}

/// Key threshold and destination for the level the player was spawned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelProgression {
    pub required_keys: u32,
    pub next_scene: Option<String>,
}

impl LevelProgression {
    /// Used for scenes missing from the table: the level can never be completed.
    pub fn unlisted() -> Self {
        Self {
            required_keys: u32::MAX,
            next_scene: None,
        }
    }

    pub fn is_met(&self, keys: u32) -> bool {
        keys >= self.required_keys
    }

    pub fn keys_text(&self, keys: u32) -> String {
        if self.required_keys == u32::MAX {
            format!("Keys: {keys}")
        } else {
            format!("Keys: {keys}/{}", self.required_keys)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub scene: String,
    pub required_keys: u32,
    pub next_scene: String,
}

impl LevelEntry {
    fn new(scene: &str, required_keys: u32, next_scene: &str) -> Self {
        Self {
            scene: scene.to_owned(),
            required_keys,
            next_scene: next_scene.to_owned(),
        }
    }
}

/// Static lookup from scene identifier to its progression rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressionTable {
    pub levels: Vec<LevelEntry>,
}

impl Default for ProgressionTable {
    fn default() -> Self {
        Self {
            levels: vec![
                LevelEntry::new("level1", 5, "level2"),
                LevelEntry::new("level2", 15, "level3"),
                LevelEntry::new("level3", 25, MAIN_MENU_SCENE),
            ],
        }
    }
}

impl ProgressionTable {
    pub fn lookup(&self, scene: &str) -> Option<LevelProgression> {
        self.levels
            .iter()
            .find(|entry| entry.scene == scene)
            .map(|entry| LevelProgression {
                required_keys: entry.required_keys,
                next_scene: Some(entry.next_scene.clone()),
            })
    }

    pub fn first_scene(&self) -> Option<&str> {
        self.levels.first().map(|entry| entry.scene.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_saturates_and_reports_death_once() {
        let mut vitals = Vitals::new(100, 3);

        assert!(!vitals.damage(60));
        assert_eq!(vitals.health(), 40);
        assert!(vitals.damage(70));
        assert_eq!(vitals.health(), 0);
        assert!(!vitals.damage(10));
        assert_eq!(vitals.health(), 0);
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut vitals = Vitals::new(100, 3);
        vitals.damage(30);
        vitals.heal(10);
        assert_eq!(vitals.health(), 80);
        vitals.heal(500);
        assert_eq!(vitals.health(), 100);
    }

    #[test]
    fn lives_never_go_below_zero() {
        let mut vitals = Vitals::new(100, 1);
        assert_eq!(vitals.lose_life(), 0);
        assert_eq!(vitals.lose_life(), 0);
        assert_eq!(vitals.lives(), 0);
    }

    #[test]
    fn default_table_matches_shipped_levels() {
        let table = ProgressionTable::default();

        let first = table.lookup("level1").expect("level1 listed");
        assert_eq!(first.required_keys, 5);
        assert_eq!(first.next_scene.as_deref(), Some("level2"));

        let last = table.lookup("level3").expect("level3 listed");
        assert_eq!(last.required_keys, 25);
        assert_eq!(last.next_scene.as_deref(), Some(MAIN_MENU_SCENE));

        assert_eq!(table.first_scene(), Some("level1"));
        assert!(table.lookup("bonus").is_none());
    }

    #[test]
    fn unlisted_scene_never_completes() {
        let progression = LevelProgression::unlisted();
        assert!(!progression.is_met(10_000));
        assert_eq!(progression.keys_text(3), "Keys: 3");
    }

    #[test]
    fn key_text_shows_threshold() {
        let progression = LevelProgression {
            required_keys: 5,
            next_scene: Some("level2".to_owned()),
        };
        assert_eq!(progression.keys_text(2), "Keys: 2/5");
    }
}
