use anyhow::Result;
use rand::{seq::SliceRandom, Rng};

use crate::{
    engine::{System, TurnContext},
    entity::{Mid, MonsterKind, MID_PLAYER},
    rng::SystemRng,
    scenario::ChurnConfig,
    world::World,
};

use super::{actor_at, note_refusal};

/// Constrictors grab a free neighbour; grips loosen at random.
pub struct ConstrictionSystem {
    constrict_chance: f64,
    release_chance: f64,
}

impl ConstrictionSystem {
    pub fn new(churn: &ChurnConfig) -> Self {
        Self {
            constrict_chance: churn.constrict_chance,
            release_chance: churn.release_chance,
        }
    }
}

impl Default for ConstrictionSystem {
    fn default() -> Self {
        Self::new(&ChurnConfig::default())
    }
}

impl System for ConstrictionSystem {
    fn name(&self) -> &str {
        "constriction"
    }

    fn run(
        &mut self,
        _ctx: &TurnContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let held: Vec<Mid> = world
            .monsters()
            .iter()
            .filter(|(_, monster)| monster.alive && monster.constricted_by.is_some())
            .map(|(_, monster)| monster.mid)
            .chain(world.player().constricted_by.map(|_| MID_PLAYER))
            .collect();
        for victim in held {
            if rng.gen_bool(self.release_chance) {
                note_refusal(self.name(), world.release_constriction(victim));
            }
        }

        for id in world.monsters().handles() {
            let Some(monster) = world.monster(id) else {
                continue;
            };
            let able = monster.kind.is_some_and(MonsterKind::can_constrict);
            if !able || !monster.constricting.is_empty() {
                continue;
            }
            let constrictor = monster.mid;
            let targets: Vec<Mid> = monster
                .position
                .neighbours()
                .filter_map(|cell| actor_at(world, cell))
                .filter(|mid| {
                    world
                        .actor(*mid)
                        .is_some_and(|actor| actor.constricted_by.is_none())
                })
                .collect();

            if let Some(&victim) = targets.choose(rng) {
                if rng.gen_bool(self.constrict_chance) {
                    note_refusal(self.name(), world.start_constriction(constrictor, victim));
                }
            }
        }
        Ok(())
    }
}
