//! # Monster AI
//!
//! The dormant/aggro state machine and the per-tick pursuit routine.
//!
//! A monster has exactly two states. Dormant monsters never act. A dormant
//! monster may wake when the player enters (or re-observes) its tile: an
//! independent 50% roll per monster, derived from the world seed, era,
//! coordinate, turn, and monster id, so a replayed session wakes the same
//! monsters. Aggro is sticky; only [`reset_all_aggro`] clears it.
//!
//! Aggro monsters advance one step per game tick toward the player, greedily
//! minimizing Manhattan distance with a fixed direction priority for
//! tie-breaking. Movement emits arrival events and at most one footsteps cue
//! per tick; shadows are a pull-based query evaluated at render time.

use crate::game::{Direction, Position};
use crate::rng::StreamKey;
use crate::world::{Grid, World};
use crate::config;
use rand::Rng;

/// A monster stepping onto the player's tile this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub id: u64,
    pub name: String,
    /// Compass side the monster arrived from, from the player's view.
    pub from: Direction,
}

/// The single footsteps cue a tick may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footsteps {
    /// Mover ended the tick 3-6 tiles away.
    Faint(Direction),
    /// Mover ended the tick exactly 2 tiles away.
    Loud(Direction),
}

/// Everything one movement tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub arrivals: Vec<Arrival>,
    pub footsteps: Option<Footsteps>,
}

/// Evaluates aggro rolls for every dormant monster on the player's tile.
///
/// Returns the yell messages produced by fresh activations; a monster yells
/// exactly once per activation no matter how often the tile is re-entered.
pub fn entry_aggro_check(world: &mut World, year: i32, pos: Position) -> Vec<String> {
    let global_seed = world.global_seed;
    let turn = world.turn;
    let Some(state) = world.year_state_mut(year) else {
        return Vec::new();
    };
    let mut yells = Vec::new();
    if let Some(list) = state.monsters_mut(pos) {
        for monster in list.iter_mut() {
            if monster.aggro {
                continue;
            }
            let mut rng = StreamKey::new(global_seed)
                .year(year)
                .coord(pos)
                .part(turn as i64)
                .part(monster.id as i64)
                .tag("aggro-enter")
                .stream();
            if rng.gen_bool(config::AGGRO_CHANCE) {
                monster.aggro = true;
                monster.seen = true;
                if !monster.has_yelled_this_aggro {
                    monster.has_yelled_this_aggro = true;
                    yells.push(format!(
                        "The {} snaps upright and lets out a blood-freezing yell!",
                        monster.name
                    ));
                }
            }
        }
    }
    yells
}

/// Advances every aggro monster in the player's era by one step.
///
/// Runs only when at least one monster in the era is aggro. Dormant monsters
/// never move here. Processing order is deterministic: tiles sorted, then
/// list order within a tile; the first qualifying mover claims the tick's
/// footsteps slot.
pub fn move_monsters_one_tick(world: &mut World, year: i32, player_pos: Position) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    let Some(state) = world.year_state_mut(year) else {
        return outcome;
    };
    if !state.any_aggro() {
        return outcome;
    }

    for (pos, id) in state.aggro_monsters_in_order() {
        let Some(direction) = best_step(&state.grid, pos, player_pos) else {
            continue;
        };
        let Some(monster) = state.take_monster(pos, id) else {
            continue;
        };
        let dest = pos.offset(direction);
        let arrival = (dest == player_pos).then(|| Arrival {
            id: monster.id,
            name: monster.name.clone(),
            from: direction.opposite(),
        });
        state.put_monster(dest, monster);

        if let Some(arrival) = arrival {
            outcome.arrivals.push(arrival);
            continue;
        }
        if outcome.footsteps.is_none() {
            let distance = dest.manhattan_distance(player_pos);
            if let Some(toward) = Direction::toward(player_pos, dest) {
                if distance == 2 {
                    outcome.footsteps = Some(Footsteps::Loud(toward));
                } else if (3..=6).contains(&distance) {
                    outcome.footsteps = Some(Footsteps::Faint(toward));
                }
            }
        }
    }
    outcome
}

/// Cardinal directions in which a tile adjacent to the player holds a
/// monster. Pull-based; queried at render time, never stored.
pub fn shadow_directions(world: &World, year: i32, player_pos: Position) -> Vec<Direction> {
    let Some(state) = world.year_state(year) else {
        return Vec::new();
    };
    Direction::PRIORITY
        .iter()
        .copied()
        .filter(|direction| {
            state
                .grid
                .step(player_pos, *direction)
                .is_some_and(|adjacent| state.has_monsters(adjacent))
        })
        .collect()
}

/// Forces every monster in the era back to dormancy (player death/respawn,
/// area reset). Clears the yell guard so the next activation yells again.
pub fn reset_all_aggro(world: &mut World, year: i32) {
    if let Some(state) = world.year_state_mut(year) {
        state.for_each_monster_mut(|monster| monster.reset_aggro());
    }
}

/// The step that best closes the gap to the player, or None when no
/// direction strictly reduces Manhattan distance.
///
/// Directions are evaluated in the fixed priority order; only in-bounds
/// steps that strictly reduce the distance are candidates, and ties on the
/// resulting distance keep the earlier-priority direction.
fn best_step(grid: &Grid, from: Position, player_pos: Position) -> Option<Direction> {
    let current = from.manhattan_distance(player_pos);
    let mut best: Option<(u32, Direction)> = None;
    for direction in Direction::PRIORITY {
        let Some(dest) = grid.step(from, direction) else {
            continue;
        };
        let distance = dest.manhattan_distance(player_pos);
        if distance >= current {
            continue;
        }
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, direction));
        }
    }
    best.map(|(_, direction)| direction)
}
