use anyhow::Result;
use rand::{seq::SliceRandom, Rng};

use crate::{
    coord::Coord,
    engine::{System, TurnContext},
    rng::SystemRng,
    scenario::ChurnConfig,
    world::World,
};

use super::{cell_is_free, note_refusal};

/// Moves every monster one step in a random open direction, and the player
/// now and then.
pub struct WanderSystem {
    player_move_chance: f64,
}

impl WanderSystem {
    pub fn new(churn: &ChurnConfig) -> Self {
        Self {
            player_move_chance: churn.player_move_chance,
        }
    }
}

impl Default for WanderSystem {
    fn default() -> Self {
        Self::new(&ChurnConfig::default())
    }
}

fn open_neighbours(world: &World, here: Coord) -> Vec<Coord> {
    here.neighbours()
        .filter(|cell| cell_is_free(world, *cell))
        .collect()
}

impl System for WanderSystem {
    fn name(&self) -> &str {
        "wander"
    }

    fn run(
        &mut self,
        _ctx: &TurnContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in world.monsters().handles() {
            let Some(monster) = world.monster(id) else {
                continue;
            };
            let options = open_neighbours(world, monster.position);
            if let Some(&to) = options.choose(rng) {
                note_refusal(self.name(), world.move_monster(id, to));
            }
        }

        if let Some(here) = world.player().position {
            if rng.gen_bool(self.player_move_chance) {
                let options = open_neighbours(world, here);
                if let Some(&to) = options.choose(rng) {
                    note_refusal(self.name(), world.place_player(to));
                }
            }
        }
        Ok(())
    }
}
