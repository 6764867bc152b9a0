mod attrition;
mod constriction;
mod scavenge;
mod wander;

pub use attrition::AttritionSystem;
pub use constriction::ConstrictionSystem;
pub use scavenge::ScavengeSystem;
pub use wander::WanderSystem;

use tracing::debug;

use crate::{
    coord::Coord,
    entity::{Mid, MID_PLAYER},
    error::StoreError,
    world::World,
};

/// The store refusing an action (occupied cell, full arena, ...) is part of
/// normal play: note it and move on.
fn note_refusal<T>(system: &str, result: Result<T, StoreError>) {
    if let Err(err) = result {
        debug!(system, %err, "action refused");
    }
}

fn cell_is_free(world: &World, cell: Coord) -> bool {
    world.monster_at(cell).is_none() && world.player().position != Some(cell)
}

/// The mid of whoever stands on `cell`.
fn actor_at(world: &World, cell: Coord) -> Option<Mid> {
    if world.player().position == Some(cell) {
        return Some(MID_PLAYER);
    }
    let id = world.monster_at(cell)?;
    world.monster(id).map(|monster| monster.mid)
}
