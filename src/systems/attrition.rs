use anyhow::Result;
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::{
    engine::{System, TurnContext},
    entity::MonsterKind,
    rng::SystemRng,
    scenario::{random_free_cell, ChurnConfig},
    world::World,
};

use super::note_refusal;

/// Kills monsters at random, dropping what they carry, and spawns
/// replacements from the roster while the level is below its population.
pub struct AttritionSystem {
    kill_chance: f64,
    spawn_chance: f64,
    roster: Vec<MonsterKind>,
}

impl AttritionSystem {
    pub fn new(churn: &ChurnConfig, roster: Vec<MonsterKind>) -> Self {
        Self {
            kill_chance: churn.kill_chance,
            spawn_chance: churn.spawn_chance,
            roster,
        }
    }
}

impl Default for AttritionSystem {
    fn default() -> Self {
        Self::new(&ChurnConfig::default(), Vec::new())
    }
}

impl System for AttritionSystem {
    fn name(&self) -> &str {
        "attrition"
    }

    fn run(
        &mut self,
        ctx: &TurnContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in world.monsters().handles() {
            if rng.gen_bool(self.kill_chance) {
                note_refusal(self.name(), world.kill_monster(id));
            }
        }

        if world.monsters().len() >= self.roster.len() || !rng.gen_bool(self.spawn_chance) {
            return Ok(());
        }
        let Some(&kind) = self.roster.choose(rng) else {
            return Ok(());
        };
        match random_free_cell(world, rng) {
            Ok(cell) => note_refusal(self.name(), world.spawn_monster(kind, cell)),
            Err(err) => debug!(turn = ctx.turn, %err, "no room to spawn"),
        }
        Ok(())
    }
}
