//! # Generation Module
//!
//! Deterministic procedural content for each era: item and monster targets
//! drawn from purpose-tagged streams, the idempotent top-up routine that
//! converges toward those targets, the daily top-up gate, and the lazy room
//! descriptions.
//!
//! Generation never fails outright: when no eligible tile remains, top-up
//! places nothing and returns. The only fatal condition is a corrupted
//! topology (a non-walkable origin) at era creation.

use crate::game::Position;
use crate::rng::StreamKey;
use crate::world::{
    canonical_spawn_kind, spawnable_kinds, Grid, ItemInstance, MonsterIdAllocator,
    MonsterInstance, World, YearState,
};
use crate::{config, EramudError, EramudResult};
use chrono::NaiveDate;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws the item target for an era: uniform on
/// `[mean * (1 - spread), mean * (1 + spread)]`.
pub fn item_target(global_seed: u64, year: i32) -> usize {
    let mut rng = StreamKey::new(global_seed)
        .year(year)
        .tag("item-target")
        .stream();
    let mean = f64::from(config::ITEM_TARGET_MEAN);
    let low = (mean * (1.0 - config::ITEM_TARGET_SPREAD)).round() as usize;
    let high = (mean * (1.0 + config::ITEM_TARGET_SPREAD)).round() as usize;
    rng.gen_range(low..=high)
}

/// The monster target for an era: a fixed fraction of walkable tiles.
///
/// The system this replaces also computed a 35% ceiling alongside the 3%
/// rate; the ceiling could never bind, so only the effective rate is kept
/// (see DESIGN.md).
pub fn monster_target(walkable_count: usize) -> usize {
    (walkable_count as f64 * config::MONSTER_SPAWN_RATE).round() as usize
}

/// Builds a fresh era: grid, targets, and initial content.
///
/// The origin tile is excluded from initial monster placement so a new
/// arrival never materializes on top of one.
pub fn initialize_year(
    global_seed: u64,
    year: i32,
    ids: &mut MonsterIdAllocator,
) -> EramudResult<YearState> {
    let grid = Grid::new();
    if !grid.is_open(Position::origin()) {
        return Err(EramudError::GenerationFailed(format!(
            "era {}: origin tile is not walkable",
            year
        )));
    }
    let walkable = grid.walkable_count();
    let mut state = YearState::new(
        grid,
        item_target(global_seed, year),
        monster_target(walkable),
    );
    let items = top_up_items(global_seed, year, &mut state, "initial");
    let monsters = top_up_monsters(
        global_seed,
        year,
        &mut state,
        ids,
        "initial",
        Some(Position::origin()),
    );
    info!(
        "era {} seeded: {} items (target {}), {} monsters (target {})",
        year, items, state.item_target, monsters, state.monster_target
    );
    Ok(state)
}

/// Places items until the era meets its target or runs out of bare tiles.
///
/// Idempotent: a second invocation against unchanged state places nothing.
/// Returns the number of items placed.
pub fn top_up_items(global_seed: u64, year: i32, state: &mut YearState, tag: &str) -> usize {
    let current = state.ground_total();
    let target = state.item_target;
    if current >= target {
        return 0;
    }
    let mut tiles: Vec<Position> = state
        .grid
        .walkable_coords()
        .into_iter()
        .filter(|pos| !state.has_ground(*pos))
        .collect();
    let mut rng = StreamKey::new(global_seed)
        .year(year)
        .tag(tag)
        .tag("items")
        .stream();
    tiles.shuffle(&mut rng);

    let kinds = spawnable_kinds();
    let wanted = target - current;
    let mut placed = 0;
    for pos in tiles {
        if placed >= wanted {
            break;
        }
        let kind = kinds[rng.gen_range(0..kinds.len())];
        state.add_ground(pos, ItemInstance::new(kind.key));
        placed += 1;
    }
    placed
}

/// Places monsters until the era meets its target or runs out of eligible
/// tiles (walkable, monster-free, and item-free).
///
/// `exclude` shields one tile (the origin during era creation). Returns the
/// number of monsters placed.
pub fn top_up_monsters(
    global_seed: u64,
    year: i32,
    state: &mut YearState,
    ids: &mut MonsterIdAllocator,
    tag: &str,
    exclude: Option<Position>,
) -> usize {
    let current = state.monster_total();
    let target = state.monster_target;
    if current >= target {
        return 0;
    }
    let mut tiles: Vec<Position> = state
        .grid
        .walkable_coords()
        .into_iter()
        .filter(|pos| {
            !state.has_monsters(*pos) && !state.has_ground(*pos) && Some(*pos) != exclude
        })
        .collect();
    let mut rng = StreamKey::new(global_seed)
        .year(year)
        .tag(tag)
        .tag("monsters")
        .stream();
    tiles.shuffle(&mut rng);

    let kind = canonical_spawn_kind();
    let wanted = target - current;
    let mut placed = 0;
    for pos in tiles {
        if placed >= wanted {
            break;
        }
        state.put_monster(pos, MonsterInstance::new(kind, ids.allocate()));
        placed += 1;
    }
    placed
}

/// Runs the daily top-up across every known era, at most once per calendar
/// day. `today` is injected so tests and replays stay deterministic.
///
/// Returns true when a top-up actually ran.
pub fn daily_top_up(world: &mut World, today: NaiveDate) -> bool {
    if world.last_topup_date == Some(today) {
        return false;
    }
    let global_seed = world.global_seed;
    let (years, ids) = world.topup_parts();
    for (year, state) in years.iter_mut() {
        let items = top_up_items(global_seed, *year, state, "daily");
        let monsters = top_up_monsters(global_seed, *year, state, ids, "daily", None);
        debug!(
            "daily top-up for era {}: +{} items, +{} monsters",
            year, items, monsters
        );
    }
    world.last_topup_date = Some(today);
    true
}

const ROOM_LEADS: &[&str] = &[
    "A cracked boulevard",
    "A silted underpass",
    "A collapsed arcade",
    "A rust-stained plaza",
    "A wind-scoured lot",
    "A leaning tenement shell",
    "A dry fountain court",
    "A buckled overpass ramp",
];

const ROOM_DETAILS: &[&str] = &[
    "littered with powdered glass.",
    "where old wiring hums faintly.",
    "half-buried in gray drift.",
    "smelling of ozone and rot.",
    "scrawled with faded warnings.",
    "strewn with shell casings.",
    "silent except for settling dust.",
    "picked clean long ago.",
];

/// A short flavor line for a tile, stable for a given seed.
pub fn room_description(global_seed: u64, year: i32, pos: Position) -> String {
    let mut rng = StreamKey::new(global_seed)
        .year(year)
        .coord(pos)
        .tag("room-desc")
        .stream();
    let lead = ROOM_LEADS[rng.gen_range(0..ROOM_LEADS.len())];
    let detail = ROOM_DETAILS[rng.gen_range(0..ROOM_DETAILS.len())];
    format!("{} {}", lead, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fresh_year(seed: u64, year: i32) -> (YearState, MonsterIdAllocator) {
        let mut ids = MonsterIdAllocator::default();
        let state = initialize_year(seed, year, &mut ids).unwrap();
        (state, ids)
    }

    #[test]
    fn test_item_target_in_band() {
        for seed in 0..20 {
            let target = item_target(seed, 2000);
            assert!((360..=440).contains(&target), "target {} out of band", target);
        }
    }

    #[test]
    fn test_item_target_is_deterministic() {
        assert_eq!(item_target(42, 2000), item_target(42, 2000));
    }

    #[test]
    fn test_monster_target_rate() {
        assert_eq!(monster_target(900), 27);
        assert_eq!(monster_target(0), 0);
    }

    #[test]
    fn test_initial_seeding_meets_targets() {
        let (state, _) = fresh_year(42, 2000);
        assert_eq!(state.ground_total(), state.item_target);
        assert_eq!(state.monster_total(), state.monster_target);
        assert!(state.monsters_at(Position::origin()).is_empty());
    }

    #[test]
    fn test_top_up_is_idempotent() {
        let (mut state, mut ids) = fresh_year(42, 2000);
        assert_eq!(top_up_items(42, 2000, &mut state, "initial"), 0);
        assert_eq!(
            top_up_monsters(42, 2000, &mut state, &mut ids, "initial", None),
            0
        );
    }

    #[test]
    fn test_top_up_converges_after_removal() {
        let (mut state, _) = fresh_year(42, 2000);
        let occupied: Vec<Position> = state
            .grid
            .walkable_coords()
            .into_iter()
            .filter(|pos| state.has_ground(*pos))
            .take(25)
            .collect();
        for pos in occupied {
            state.remove_ground(pos, 0);
        }
        let placed = top_up_items(42, 2000, &mut state, "debug");
        assert_eq!(placed, 25);
        assert_eq!(state.ground_total(), state.item_target);
    }

    #[test]
    fn test_top_up_never_overshoots() {
        let (mut state, _) = fresh_year(42, 2000);
        // Push the era over target by hand, then ask for more.
        state.add_ground(Position::origin(), ItemInstance::new("battery-cell"));
        let before = state.ground_total();
        assert_eq!(top_up_items(42, 2000, &mut state, "debug"), 0);
        assert_eq!(state.ground_total(), before);
    }

    #[test]
    fn test_top_up_handles_tile_exhaustion() {
        let mut ids = MonsterIdAllocator::default();
        let grid = Grid::new();
        // Target far above what one item per tile can satisfy.
        let mut state = YearState::new(grid, grid.walkable_count() + 50, 0);
        let placed = top_up_items(42, 2000, &mut state, "initial");
        assert_eq!(placed, grid.walkable_count());
        // A second pass finds no eligible tile and places nothing.
        assert_eq!(top_up_items(42, 2000, &mut state, "initial"), 0);
        assert_eq!(
            top_up_monsters(42, 2000, &mut state, &mut ids, "initial", None),
            0
        );
    }

    #[test]
    fn test_same_seed_same_placements() {
        let (a, _) = fresh_year(42, 2000);
        let (b, _) = fresh_year(42, 2000);
        for pos in a.grid.walkable_coords() {
            assert_eq!(a.ground_at(pos), b.ground_at(pos), "ground differs at {}", pos);
            assert_eq!(
                a.monsters_at(pos).len(),
                b.monsters_at(pos).len(),
                "monsters differ at {}",
                pos
            );
        }
    }

    #[test]
    fn test_different_years_differ() {
        let (a, _) = fresh_year(42, 2000);
        let (b, _) = fresh_year(42, 2104);
        let same = a
            .grid
            .walkable_coords()
            .into_iter()
            .all(|pos| a.ground_at(pos) == b.ground_at(pos));
        assert!(!same, "eras 2000 and 2104 generated identical ground");
    }

    #[test]
    fn test_daily_top_up_gates_on_date() {
        let mut world = World::new(42);
        world.year(2000).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert!(daily_top_up(&mut world, today));
        assert_eq!(world.last_topup_date, Some(today));
        // Same day: skipped entirely.
        assert!(!daily_top_up(&mut world, today));
        // Next day: runs again (and is a no-op placement-wise).
        let tomorrow = today.succ_opt().unwrap();
        assert!(daily_top_up(&mut world, tomorrow));
        assert_eq!(world.last_topup_date, Some(tomorrow));
    }

    #[test]
    fn test_room_description_stable() {
        let a = room_description(42, 2000, Position::new(3, 3));
        let b = room_description(42, 2000, Position::new(3, 3));
        assert_eq!(a, b);
        let c = room_description(42, 2000, Position::new(3, 4));
        // Neighboring tiles draw from independent streams; they are allowed
        // to collide but the combined tables make it unlikely everywhere.
        let _ = c;
    }
}
