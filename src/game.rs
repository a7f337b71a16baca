//! Headless beach-volley match.
//!
//! Two bot players, an ellipse ball, a net and four bounds quads, all driven
//! through the [`Simulator`]. The bots steer under the ball and jump at
//! random; the collision callbacks implement the rules:
//!
//! - ball vs net/walls/sky: box-ellipse bounce
//! - ball vs player: header (ellipse bounce of the ball only), counted per
//!   player; more than `max_headers` in a row concedes the point
//! - ball vs ground: point for the player on the other side
//! - player vs net/own wall: horizontal clamp
//! - player vs ground: vertical clamp
//!
//! Callbacks only record a pending point. The match applies it after the
//! step, resetting the court and freezing the ball until a bot moves again.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::components::collision::{CollisionResponder, responder_fn};
use crate::components::entity::{EntityId, SceneEntity};
use crate::components::simbody::{BodyHandle, ForceHandle, SimBody};
use crate::resources::gameconfig::GameConfig;
use crate::resources::scene::{EntityStore, Scene};
use crate::systems::response::{BoxEllipse, resolve_ellipse_ellipse};
use crate::systems::simulator::{BodySnapshot, Simulator};

pub const LAYER_BACKGROUND: u32 = 0;
pub const LAYER_NET: u32 = 5;
pub const LAYER_BALL: u32 = 6;
pub const LAYER_PLAYERS: u32 = 7;
const DRAW_LAYERS: [u32; 4] = [LAYER_BACKGROUND, LAYER_NET, LAYER_BALL, LAYER_PLAYERS];

const NET_HALF_WIDTH: f32 = 0.01;
const NET_CLEARANCE: f32 = 0.01;
const PLAYER_START: Vec2 = Vec2::new(0.5, -0.8);
const SERVE_POSITION: Vec2 = Vec2::new(0.65, 0.25);
/// Frames the bots stand still after a point.
const SERVE_PAUSE_FRAMES: u32 = 30;
const STEER_DEADZONE: f32 = 0.02;
/// Bots stand this far behind the ball so headers go toward the net.
const HEADER_OFFSET: f32 = 0.04;
const JUMP_REACH: f32 = 0.25;
const JUMP_CHANCE: f32 = 0.15;
const GROUND_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// -1 for the left half of the court, 1 for the right.
    fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    fn owns(self, x: f32) -> bool {
        match self {
            Side::Left => x < 0.0,
            Side::Right => x >= 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointReason {
    /// The ball touched the ground on the loser's side.
    Landed,
    /// The loser headed the ball too many times in a row.
    TooManyHeaders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEvent {
    pub frame: u32,
    pub scorer: Side,
    pub reason: PointReason,
    /// Score after the point, left then right.
    pub scores: [u32; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub frames: u32,
    pub scores: [u32; 2],
    pub headers: [u32; 2],
    pub points: Vec<PointEvent>,
}

/// Per-frame dump for hosts that stream the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: u32,
    pub scores: [u32; 2],
    pub ball_frozen: bool,
    pub bodies: Vec<BodySnapshot>,
}

/// Entity ids of everything on the court.
#[derive(Debug, Clone, Copy)]
pub struct Court {
    pub background: EntityId,
    pub ball: EntityId,
    pub players: [EntityId; 2],
    pub net: EntityId,
    pub left_wall: EntityId,
    pub right_wall: EntityId,
    pub sky: EntityId,
    pub ground: EntityId,
}

/// Rule state shared with the collision callbacks.
#[derive(Debug, Default)]
struct MatchState {
    scores: [u32; 2],
    headers: [u32; 2],
    streak: Option<(Side, u32)>,
    pending: Option<(Side, PointReason)>,
}

impl MatchState {
    /// First point of the frame wins; later ones are dropped.
    fn award(&mut self, scorer: Side, reason: PointReason) {
        if self.pending.is_none() {
            debug!("Point pending for {:?} ({:?})", scorer, reason);
            self.pending = Some((scorer, reason));
        }
    }

    fn header(&mut self, side: Side, max_headers: u32) {
        self.headers[side.index()] += 1;
        let streak = match self.streak {
            Some((last, count)) if last == side => count + 1,
            _ => 1,
        };
        self.streak = Some((side, streak));
        if streak > max_headers {
            self.award(side.other(), PointReason::TooManyHeaders);
        }
    }
}

fn clamp_horizontal(store: &mut dyn EntityStore, player: &mut SimBody, min_x: f32, max_x: f32) {
    player.velocity.x = 0.0;
    player.pos.x = player.pos.x.clamp(min_x, max_x);
    store.set_position(player.entity_id(), player.pos);
}

fn clamp_vertical(store: &mut dyn EntityStore, player: &mut SimBody, min_y: f32) {
    if player.pos.y < min_y {
        player.pos.y = min_y;
    }
    if player.velocity.y < 0.0 {
        player.velocity.y = 0.0;
    }
    store.set_position(player.entity_id(), player.pos);
}

pub struct BeachMatch {
    config: GameConfig,
    scene: Rc<RefCell<Scene>>,
    sim: Simulator,
    court: Court,
    ball_body: BodyHandle,
    player_bodies: [BodyHandle; 2],
    ball_gravity: ForceHandle,
    ball_frozen: bool,
    serve_pause: u32,
    state: Rc<RefCell<MatchState>>,
    rng: fastrand::Rng,
    frame: u32,
    points: Vec<PointEvent>,
}

impl BeachMatch {
    /// Build the court and register every body, force and callback.
    pub fn new(config: GameConfig) -> Result<Self, String> {
        let s = config.player_scale;
        if s <= 0.0 || -1.0 + s > -(s + NET_HALF_WIDTH + NET_CLEARANCE) {
            return Err(format!("Player scale {} does not fit on the court", s));
        }

        let scene = Rc::new(RefCell::new(Scene::new()));
        let court = Self::spawn_court(&mut scene.borrow_mut(), &config);
        let mut sim = Simulator::new(scene.clone());

        let missing = |id: EntityId| format!("Failed to add a body for entity {}", id);
        let ball_body = sim
            .add_body(court.ball, Vec2::ZERO)
            .ok_or_else(|| missing(court.ball))?;
        let mut player_bodies = [ball_body; 2];
        for side in Side::BOTH {
            let id = court.players[side.index()];
            player_bodies[side.index()] = sim.add_body(id, Vec2::ZERO).ok_or_else(|| missing(id))?;
        }
        for id in [court.net, court.left_wall, court.right_wall, court.sky, court.ground] {
            sim.add_body(id, Vec2::ZERO).ok_or_else(|| missing(id))?;
        }

        let gravity = Vec2::new(0.0, config.gravity);
        // Zero until the first serve.
        let ball_gravity = sim
            .add_force(court.ball, Vec2::ZERO)
            .ok_or_else(|| missing(court.ball))?;
        for id in court.players {
            sim.add_force(id, gravity).ok_or_else(|| missing(id))?;
        }

        let state = Rc::new(RefCell::new(MatchState::default()));
        Self::register_rules(&mut sim, &court, &config, &state);

        info!(
            "Beach match ready: {} entities, {} bodies, {} collision rules",
            scene.borrow().len(),
            sim.body_count(),
            sim.rule_count()
        );

        Ok(Self {
            rng: fastrand::Rng::with_seed(config.seed),
            config,
            scene,
            sim,
            court,
            ball_body,
            player_bodies,
            ball_gravity,
            ball_frozen: true,
            serve_pause: SERVE_PAUSE_FRAMES,
            state,
            frame: 0,
            points: Vec::new(),
        })
    }

    fn spawn_court(scene: &mut Scene, config: &GameConfig) -> Court {
        let quad = |center: Vec2, scale: Vec2| {
            SceneEntity::new().with_transform(center, scale, 0.0)
        };
        let player_scale = Vec2::splat(config.player_scale);

        let background = scene.spawn(LAYER_BACKGROUND, quad(Vec2::ZERO, Vec2::ONE));
        let left_wall = scene.spawn(LAYER_BACKGROUND, quad(Vec2::new(-2.0, 0.0), Vec2::ONE));
        let right_wall = scene.spawn(LAYER_BACKGROUND, quad(Vec2::new(2.0, 0.0), Vec2::ONE));
        let ground = scene.spawn(
            LAYER_BACKGROUND,
            quad(Vec2::new(0.0, config.floor - 1.0), Vec2::ONE),
        );
        let sky = scene.spawn(LAYER_BACKGROUND, quad(Vec2::new(0.0, 2.0), Vec2::ONE));
        let net = scene.spawn(
            LAYER_NET,
            quad(Vec2::new(0.0, -0.5), Vec2::new(NET_HALF_WIDTH, 0.5)),
        );
        let ball = scene.spawn(
            LAYER_BALL,
            quad(SERVE_POSITION * Vec2::new(-1.0, 1.0), Vec2::splat(config.ball_scale)),
        );
        let players = [
            scene.spawn(LAYER_PLAYERS, quad(PLAYER_START * Vec2::new(-1.0, 1.0), player_scale)),
            scene.spawn(LAYER_PLAYERS, quad(PLAYER_START, player_scale)),
        ];

        Court {
            background,
            ball,
            players,
            net,
            left_wall,
            right_wall,
            sky,
            ground,
        }
    }

    fn register_rules(
        sim: &mut Simulator,
        court: &Court,
        config: &GameConfig,
        state: &Rc<RefCell<MatchState>>,
    ) {
        let bounce: Rc<dyn CollisionResponder> = Rc::new(BoxEllipse);
        for id in [court.net, court.left_wall, court.right_wall, court.sky] {
            sim.add_collision_rule(id, court.ball, Rc::clone(&bounce));
        }

        let landed = Rc::clone(state);
        sim.add_collision_callback(
            court.ground,
            court.ball,
            responder_fn(move |_store, _ground, ball, _dt| {
                let scorer = if Side::Left.owns(ball.pos.x) {
                    Side::Right
                } else {
                    Side::Left
                };
                landed.borrow_mut().award(scorer, PointReason::Landed);
            }),
        );

        let s = config.player_scale;
        let inner = s + NET_HALF_WIDTH + NET_CLEARANCE;
        let outer = 1.0 - s;
        let floor = config.floor + s;
        for side in Side::BOTH {
            let player = court.players[side.index()];

            let headers = Rc::clone(state);
            let max_headers = config.max_headers;
            sim.add_collision_callback(
                player,
                court.ball,
                responder_fn(move |store, player, ball, dt| {
                    // The player drives the ball, not the other way round.
                    let (pos, velocity) = (player.pos, player.velocity);
                    let before = ball.velocity;
                    resolve_ellipse_ellipse(store, player, ball, dt);
                    player.pos = pos;
                    player.velocity = velocity;
                    store.set_position(player.entity_id(), pos);
                    if ball.velocity != before {
                        headers.borrow_mut().header(side, max_headers);
                    }
                }),
            );

            let (min_x, max_x) = match side {
                Side::Left => (-outer, -inner),
                Side::Right => (inner, outer),
            };
            let own_wall = match side {
                Side::Left => court.left_wall,
                Side::Right => court.right_wall,
            };
            for wall in [court.net, own_wall] {
                sim.add_collision_callback(
                    player,
                    wall,
                    responder_fn(move |store, player, _wall, _dt| {
                        clamp_horizontal(store, player, min_x, max_x);
                    }),
                );
            }
            sim.add_collision_callback(
                player,
                court.ground,
                responder_fn(move |store, player, _ground, _dt| {
                    clamp_vertical(store, player, floor);
                }),
            );
        }
    }

    pub fn court(&self) -> &Court {
        &self.court
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn scene(&self) -> &Rc<RefCell<Scene>> {
        &self.scene
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn scores(&self) -> [u32; 2] {
        self.state.borrow().scores
    }

    pub fn ball_frozen(&self) -> bool {
        self.ball_frozen
    }

    /// Visible entity ids in drawing order, back to front.
    pub fn draw_list(&self) -> Vec<EntityId> {
        let mut scene = self.scene.borrow_mut();
        DRAW_LAYERS
            .iter()
            .flat_map(|&layer| scene.ids_in_layer(layer))
            .collect()
    }

    /// Advance one fixed step.
    pub fn step_frame(&mut self) {
        self.drive_bots();
        self.sim.step(self.config.dt);
        self.apply_pending_point();
        self.frame += 1;
    }

    /// Play `frames` fixed steps and report the result so far.
    pub fn run(&mut self, frames: u32) -> MatchReport {
        for _ in 0..frames {
            self.step_frame();
        }
        self.report()
    }

    pub fn report(&self) -> MatchReport {
        let state = self.state.borrow();
        MatchReport {
            frames: self.frame,
            scores: state.scores,
            headers: state.headers,
            points: self.points.clone(),
        }
    }

    pub fn frame_record(&self) -> FrameRecord {
        FrameRecord {
            frame: self.frame,
            scores: self.scores(),
            ball_frozen: self.ball_frozen,
            bodies: self.sim.snapshot(),
        }
    }

    fn drive_bots(&mut self) {
        if self.serve_pause > 0 {
            self.serve_pause -= 1;
            return;
        }
        let Some(ball_pos) = self.sim.body(self.ball_body).map(|body| body.pos) else {
            return;
        };

        let min_y = self.config.floor + self.config.player_scale + GROUND_TOLERANCE;
        let mut moved = false;
        for side in Side::BOTH {
            let roll = self.rng.f32();
            let Some(body) = self.sim.body_mut(self.player_bodies[side.index()]) else {
                continue;
            };

            let target_x = if side.owns(ball_pos.x) {
                ball_pos.x + side.sign() * HEADER_OFFSET
            } else {
                side.sign() * PLAYER_START.x
            };
            let dx = target_x - body.pos.x;
            body.velocity.x = if dx.abs() > STEER_DEADZONE {
                dx.signum() * self.config.move_speed
            } else {
                0.0
            };

            let grounded = body.pos.y <= min_y;
            let in_reach = (ball_pos.x - body.pos.x).abs() < JUMP_REACH && ball_pos.y > body.pos.y;
            if grounded && in_reach && roll < JUMP_CHANCE {
                body.velocity.y = self.config.jump_momentum;
                debug!("{:?} player jumps at frame {}", side, self.frame);
            }
            moved |= body.velocity.x != 0.0 || body.velocity.y > 0.0;
        }

        if moved && self.ball_frozen {
            self.sim
                .set_force(self.ball_gravity, Vec2::new(0.0, self.config.gravity));
            self.ball_frozen = false;
            debug!("Ball released at frame {}", self.frame);
        }
    }

    fn apply_pending_point(&mut self) {
        let (scorer, reason, scores) = {
            let mut state = self.state.borrow_mut();
            let Some((scorer, reason)) = state.pending.take() else {
                return;
            };
            state.scores[scorer.index()] += 1;
            state.streak = None;
            (scorer, reason, state.scores)
        };
        info!(
            "Point to {:?} ({:?}) at frame {}: {} - {}",
            scorer, reason, self.frame, scores[0], scores[1]
        );
        self.points.push(PointEvent {
            frame: self.frame,
            scorer,
            reason,
            scores,
        });
        self.reset_court(scorer);
    }

    /// Put everyone back in place; the scorer serves.
    fn reset_court(&mut self, server: Side) {
        self.place(self.ball_body, SERVE_POSITION * Vec2::new(server.sign(), 1.0));
        for side in Side::BOTH {
            self.place(
                self.player_bodies[side.index()],
                PLAYER_START * Vec2::new(side.sign(), 1.0),
            );
        }
        self.sim.set_force(self.ball_gravity, Vec2::ZERO);
        self.ball_frozen = true;
        self.serve_pause = SERVE_PAUSE_FRAMES;
    }

    fn place(&mut self, handle: BodyHandle, pos: Vec2) {
        let Some(body) = self.sim.body_mut(handle) else {
            return;
        };
        body.pos = pos;
        body.velocity = Vec2::ZERO;
        let id = body.entity_id();
        self.scene.borrow_mut().set_position(id, pos);
    }
}
