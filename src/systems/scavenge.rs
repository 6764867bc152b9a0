use anyhow::Result;
use rand::Rng;

use crate::{
    engine::{System, TurnContext},
    entity::{ItemId, MonsterKind},
    rng::SystemRng,
    scenario::ChurnConfig,
    world::{Placement, World},
};

use super::note_refusal;

/// Monsters that care about loot pick up the top item of their cell, and
/// sometimes drop something they carry.
pub struct ScavengeSystem {
    pickup_chance: f64,
    drop_chance: f64,
}

impl ScavengeSystem {
    pub fn new(churn: &ChurnConfig) -> Self {
        Self {
            pickup_chance: churn.pickup_chance,
            drop_chance: churn.drop_chance,
        }
    }
}

impl Default for ScavengeSystem {
    fn default() -> Self {
        Self::new(&ChurnConfig::default())
    }
}

impl System for ScavengeSystem {
    fn name(&self) -> &str {
        "scavenge"
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
            if !monster.kind.is_some_and(MonsterKind::scavenges) {
                continue;
            }
            let here = monster.position;
            let carried: Vec<ItemId> = monster.carried().map(|(_, item)| item).collect();

            let pickup = world.items_at(here).next().and_then(|item| {
                let kind = world.item(item)?.kind?;
                let slot = world.monster(id)?.free_slot_for(kind)?;
                Some((item, slot))
            });
            if let Some((item, slot)) = pickup {
                if rng.gen_bool(self.pickup_chance) {
                    note_refusal(
                        self.name(),
                        world.move_item(item, Placement::Monster { holder: id, slot }),
                    );
                    continue;
                }
            }

            if !carried.is_empty() && rng.gen_bool(self.drop_chance) {
                let item = carried[rng.gen_range(0..carried.len())];
                let summoned = world.item(item).is_some_and(|item| item.summoned);
                let result = if summoned {
                    world.destroy_item(item)
                } else {
                    world.move_item(item, Placement::Floor(here))
                };
                note_refusal(self.name(), result);
            }
        }
        Ok(())
    }
}
