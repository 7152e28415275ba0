//! The player state machine.
//!
//! `PlayerController` owns every piece of player state that is not physics: vitals, the level's
//! key threshold, the knockback timer, jump bookkeeping and the control phase. It is driven from
//! two clocks:
//!
//! * the frame tick calls [`PlayerController::sample_input`] and [`PlayerController::check_fall`];
//! * the physics tick calls [`PlayerController::physics_tick`] before the integrator runs and
//!   [`PlayerController::settle_jump`] after it.
//!
//! Within one physics tick the body's velocity is written either by the knockback override or by
//! the movement resolver, never both. Trigger handlers (`take_damage`, `heal`, `collect_key`)
//! may run between ticks. Everything that the host should react to is pushed onto an outbox of
//! [`PlayerEvent`]s.

use std::time::Duration;

use bevy::prelude::*;

use crate::animation::{derive_visual_state, Facing};
use crate::capabilities::{
    Collectible, Displays, InputSource, PhysicsBody, SceneHost, ShapeCaster, VisualSink,
};
use crate::config::ControllerSettings;
use crate::ground::{GroundProbe, JumpState};
use crate::knockback::{knockback_impulse, KnockbackState, KnockbackTick};
use crate::movement::resolve_velocity;
use crate::progression::{LevelProgression, ProgressionTable, Vitals};

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Jumped,
    Damaged { amount: u32, health: u32 },
    /// Health reached zero. Reported once per drop to zero; not terminal.
    Died,
    KnockbackEnded,
    Healed { health: u32 },
    KeyCollected { keys: u32 },
    LevelComplete,
    Respawned { lives: u32 },
    /// Lives exhausted; the controller ignores everything from here on.
    GameOver,
    SceneRequested(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlPhase {
    #[default]
    Playing,
    /// Key threshold met. Input is ignored until the host proceeds to the next scene.
    LevelComplete,
    /// Out of lives. Terminal.
    Defeated,
}

#[derive(Component, Debug)]
pub struct PlayerController {
    settings: ControllerSettings,
    vitals: Vitals,
    progression: LevelProgression,
    probe: GroundProbe,
    knockback: KnockbackState,
    jump: JumpState,
    phase: ControlPhase,
    move_input: Vec2,
    /// Horizontal input used for the sprite: the device axis when it is non-zero, otherwise
    /// the on-screen axis.
    facing_axis: f32,
    running: bool,
    outbox: Vec<PlayerEvent>,
}

impl PlayerController {
    pub fn new(settings: ControllerSettings, progression: LevelProgression) -> Self {
        Self {
            vitals: Vitals::new(settings.max_health, settings.max_lives),
            probe: GroundProbe::new(settings.ground_probe_distance, settings.ground_layers),
            settings,
            progression,
            knockback: KnockbackState::default(),
            jump: JumpState::default(),
            phase: ControlPhase::default(),
            move_input: Vec2::ZERO,
            facing_axis: 0.0,
            running: false,
            outbox: Vec::new(),
        }
    }

    /// Resolves the key threshold for the host's current scene from `table`.
    pub fn for_scene(
        settings: ControllerSettings,
        table: &ProgressionTable,
        host: &dyn SceneHost,
    ) -> Self {
        let scene = host.current_scene();
        let progression = table.lookup(scene).unwrap_or_else(|| {
            warn!(
                "Scene '{}' has no progression entry; the level cannot be completed.",
                scene
            );
            LevelProgression::unlisted()
        });

        Self::new(settings, progression)
    }

    pub fn required_keys(&self) -> u32 {
        self.progression.required_keys
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, PlayerEvent> {
        self.outbox.drain(..)
    }

    /// Pushes the current health, lives and key count to the HUD.
    pub fn refresh_displays(&self, displays: &mut Displays<'_>) {
        displays.show_health(&self.vitals.health_text());
        self.refresh_counters(displays);
    }

    fn refresh_counters(&self, displays: &mut Displays<'_>) {
        displays.show_lives(&self.vitals.lives_text());
        displays.show_keys(&self.progression.keys_text(self.vitals.keys()));
    }

    /// Frame tick: latches the move vector and handles a pending jump trigger.
    pub fn sample_input(
        &mut self,
        input: &mut dyn InputSource,
        body: &mut dyn PhysicsBody,
        caster: &dyn ShapeCaster,
    ) {
        if self.phase != ControlPhase::Playing {
            // Triggers pressed while control is off are dropped, not carried over.
            input.poll_jump_triggered();
            return;
        }

        self.move_input = input.sample_move();
        self.facing_axis = input.facing_axis().unwrap_or(self.move_input.x);
        self.running = input.run_held();

        if input.poll_jump_triggered() {
            self.try_jump(body, caster);
        }
    }

    pub fn try_jump(&mut self, body: &mut dyn PhysicsBody, caster: &dyn ShapeCaster) -> bool {
        if self.phase != ControlPhase::Playing {
            return false;
        }

        let jumped = self
            .jump
            .try_jump(&self.probe, self.settings.jump_force, body, caster);
        if jumped {
            debug!("Player jumped.");
            self.outbox.push(PlayerEvent::Jumped);
        }
        jumped
    }

    /// Physics tick, before integration. Advances the knockback countdown, then lets exactly one
    /// of knockback or the movement resolver write the velocity, then classifies the motion.
    pub fn physics_tick(
        &mut self,
        delta: Duration,
        body: &mut dyn PhysicsBody,
        visual: &mut dyn VisualSink,
    ) {
        if self.phase == ControlPhase::Defeated {
            return;
        }

        match self.knockback.tick(delta) {
            KnockbackTick::Active => {}
            KnockbackTick::Expired => {
                body.set_velocity(Vec2::ZERO);
                debug!("Knockback ended.");
                self.outbox.push(PlayerEvent::KnockbackEnded);
            }
            KnockbackTick::Idle => {
                if self.phase == ControlPhase::Playing {
                    let speed = if self.running {
                        self.settings.run_speed
                    } else {
                        self.settings.move_speed
                    };
                    let velocity = resolve_velocity(self.move_input.x, speed, body.velocity());
                    body.set_velocity(velocity);
                }
            }
        }

        let (state, facing) =
            derive_visual_state(self.facing_axis, self.running, body.velocity().y);
        if let Some(facing) = facing {
            visual.set_facing_left(facing == Facing::Left);
        }
        visual.set_visual_state(state);
    }

    /// Physics tick, after integration: refreshes ground contact against the committed velocity
    /// and clears a finished jump.
    pub fn settle_jump(&mut self, body: &dyn PhysicsBody, caster: &dyn ShapeCaster) {
        if self.phase == ControlPhase::Defeated {
            return;
        }

        let grounded = self.probe.is_grounded(body, caster);
        self.jump.settle(grounded, body.velocity().y);
    }

    /// Applies a hit unless a knockback is already running. `direction` is the raw push
    /// direction; it is normalized here. Returns whether the hit was accepted.
    pub fn take_damage(
        &mut self,
        amount: u32,
        direction: Vec2,
        body: &mut dyn PhysicsBody,
        displays: &mut Displays<'_>,
    ) -> bool {
        if self.phase == ControlPhase::Defeated {
            return false;
        }

        if !self.knockback.try_begin(self.settings.knock_back_duration()) {
            return false;
        }

        let died = self.vitals.damage(amount);
        let health = self.vitals.health();
        self.outbox.push(PlayerEvent::Damaged { amount, health });
        if died {
            info!("Player health reached zero.");
            self.outbox.push(PlayerEvent::Died);
        }

        let impulse = knockback_impulse(
            direction.normalize_or_zero(),
            self.settings.knock_back_thrust,
            body.mass(),
        );
        body.set_velocity(Vec2::ZERO);
        body.apply_impulse(impulse);
        debug!(
            "Knockback started for {:?} (health {}).",
            self.settings.knock_back_duration(),
            health
        );

        displays.show_health(&self.vitals.health_text());
        true
    }

    pub fn heal(&mut self, amount: u32, displays: &mut Displays<'_>) {
        if self.phase == ControlPhase::Defeated {
            return;
        }

        self.vitals.heal(amount);
        self.outbox.push(PlayerEvent::Healed {
            health: self.vitals.health(),
        });
        displays.show_health(&self.vitals.health_text());
    }

    /// Counts a key, removes it from the world and completes the level on reaching the
    /// threshold. Returns `true` only for the pickup that completed the level.
    pub fn collect_key(
        &mut self,
        item: &mut dyn Collectible,
        body: &mut dyn PhysicsBody,
        displays: &mut Displays<'_>,
    ) -> bool {
        if self.phase == ControlPhase::Defeated {
            return false;
        }

        let keys = self.vitals.add_key();
        self.refresh_counters(displays);
        item.destroy();
        self.outbox.push(PlayerEvent::KeyCollected { keys });

        if self.phase != ControlPhase::Playing || !self.progression.is_met(keys) {
            return false;
        }

        self.phase = ControlPhase::LevelComplete;
        self.move_input = Vec2::ZERO;
        self.facing_axis = 0.0;
        self.running = false;
        body.set_velocity(Vec2::ZERO);
        info!("Level complete with {} keys.", keys);
        self.outbox.push(PlayerEvent::LevelComplete);
        true
    }

    /// Frame tick: costs a life when the body drops below the fall threshold. Respawns at the
    /// recovery point while lives remain.
    pub fn check_fall(&mut self, body: &mut dyn PhysicsBody, displays: &mut Displays<'_>) {
        if self.phase != ControlPhase::Playing {
            return;
        }

        if body.position().y >= self.settings.fall_threshold {
            return;
        }

        let lives = self.vitals.lose_life();
        if lives == 0 {
            self.phase = ControlPhase::Defeated;
            info!("Game over.");
            self.outbox.push(PlayerEvent::GameOver);
        } else {
            body.set_position(self.settings.recovery_point());
            info!("Fell out of the level; {} lives left.", lives);
            self.outbox.push(PlayerEvent::Respawned { lives });
        }

        self.refresh_counters(displays);
    }

    /// Operator action from the proceed prompt. Only valid once the level is complete.
    pub fn request_next_level(&mut self, host: &mut dyn SceneHost) -> bool {
        if self.phase != ControlPhase::LevelComplete {
            return false;
        }

        let Some(next) = self.progression.next_scene.as_deref() else {
            return false;
        };

        info!("Requesting scene '{}'.", next);
        host.request_scene_transition(next);
        self.outbox.push(PlayerEvent::SceneRequested(next.to_owned()));
        true
    }
}

#[cfg(test)]
impl PlayerController {
    pub fn health(&self) -> u32 {
        self.vitals.health()
    }

    pub fn lives(&self) -> u32 {
        self.vitals.lives()
    }

    pub fn keys(&self) -> u32 {
        self.vitals.keys()
    }

    pub fn phase(&self) -> ControlPhase {
        self.phase
    }

    pub fn is_knocked_back(&self) -> bool {
        self.knockback.is_active()
    }

    pub fn knockback_remaining(&self) -> Duration {
        self.knockback.remaining()
    }

    pub fn is_jumping(&self) -> bool {
        self.jump.is_jumping()
    }

    pub fn move_input(&self) -> Vec2 {
        self.move_input
    }
}
