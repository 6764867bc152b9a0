use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    coord::{Coord, GXM, GYM},
    entity::{ItemKind, MonsterId, MonsterKind, MAX_ITEMS, MAX_MONSTERS},
    rng::RngManager,
    world::{Placement, World},
};

fn default_turns() -> u64 {
    100
}

fn default_audit_interval_turns() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".into()
}

fn default_quantity() -> u32 {
    1
}

fn default_carried_fraction() -> f64 {
    0.25
}

fn default_max_attempts() -> u32 {
    5
}

fn default_kill_chance() -> f64 {
    0.01
}

fn default_spawn_chance() -> f64 {
    0.2
}

fn default_pickup_chance() -> f64 {
    0.3
}

fn default_drop_chance() -> f64 {
    0.05
}

fn default_constrict_chance() -> f64 {
    0.3
}

fn default_release_chance() -> f64 {
    0.2
}

fn default_player_move_chance() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub turns: Option<u64>,
    #[serde(default = "default_audit_interval_turns")]
    pub audit_interval_turns: u64,
    #[serde(default)]
    pub report_interval_turns: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub level: LevelSpec,
    #[serde(default)]
    pub churn: ChurnConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelSpec {
    #[serde(default)]
    pub monsters: Vec<MonsterGroup>,
    #[serde(default)]
    pub items: Vec<ItemGroup>,
    /// Share of items handed to monsters instead of left on the floor.
    #[serde(default = "default_carried_fraction")]
    pub carried_fraction: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonsterGroup {
    pub kind: MonsterKind,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemGroup {
    pub kind: ItemKind,
    pub count: usize,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Summoned items are only ever generated in monster hands.
    #[serde(default)]
    pub summoned: bool,
}

/// Per-turn probabilities used by the simulation systems.
#[derive(Debug, Clone, Deserialize)]
pub struct ChurnConfig {
    #[serde(default = "default_kill_chance")]
    pub kill_chance: f64,
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f64,
    #[serde(default = "default_pickup_chance")]
    pub pickup_chance: f64,
    #[serde(default = "default_drop_chance")]
    pub drop_chance: f64,
    #[serde(default = "default_constrict_chance")]
    pub constrict_chance: f64,
    #[serde(default = "default_release_chance")]
    pub release_chance: f64,
    #[serde(default = "default_player_move_chance")]
    pub player_move_chance: f64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            kill_chance: default_kill_chance(),
            spawn_chance: default_spawn_chance(),
            pickup_chance: default_pickup_chance(),
            drop_chance: default_drop_chance(),
            constrict_chance: default_constrict_chance(),
            release_chance: default_release_chance(),
            player_move_chance: default_player_move_chance(),
        }
    }
}

impl ChurnConfig {
    fn chances(&self) -> [(&'static str, f64); 7] {
        [
            ("kill_chance", self.kill_chance),
            ("spawn_chance", self.spawn_chance),
            ("pickup_chance", self.pickup_chance),
            ("drop_chance", self.drop_chance),
            ("constrict_chance", self.constrict_chance),
            ("release_chance", self.release_chance),
            ("player_move_chance", self.player_move_chance),
        ]
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        for (name, chance) in self.churn.chances() {
            if !(0.0..=1.0).contains(&chance) {
                bail!("churn.{name} must be between 0 and 1, got {chance}");
            }
        }
        if !(0.0..=1.0).contains(&self.level.carried_fraction) {
            bail!(
                "level.carried_fraction must be between 0 and 1, got {}",
                self.level.carried_fraction
            );
        }
        if self.level.max_attempts == 0 {
            bail!("level.max_attempts must be at least 1");
        }
        let monsters = self.level.population();
        // one cell is kept for the player
        if monsters > MAX_MONSTERS || monsters + 1 > (GXM * GYM) as usize {
            bail!("level asks for {monsters} monsters, at most {MAX_MONSTERS} fit");
        }
        let items: usize = self.level.items.iter().map(|group| group.count).sum();
        if items > MAX_ITEMS {
            bail!("level asks for {items} items, at most {MAX_ITEMS} fit");
        }
        if let Some(group) = self.level.items.iter().find(|group| group.quantity == 0) {
            bail!("item group {:?} has zero quantity", group.kind);
        }
        Ok(())
    }

    /// Generates the level from the scenario seed.
    pub fn build_world(&self) -> Result<World> {
        let mut rng = RngManager::new(self.seed);
        LevelBuilder::new(&self.level).build(&mut rng.stream("level"))
    }

    pub fn turns(&self, override_turns: Option<u64>) -> u64 {
        override_turns.or(self.turns).unwrap_or_else(default_turns)
    }
}

impl LevelSpec {
    pub fn population(&self) -> usize {
        self.monsters.iter().map(|group| group.count).sum()
    }

    /// One entry per monster the level starts with, so picking uniformly
    /// from it keeps the scenario's mix.
    pub fn roster(&self) -> Vec<MonsterKind> {
        self.monsters
            .iter()
            .flat_map(|group| std::iter::repeat(group.kind).take(group.count))
            .collect()
    }
}

/// Populates fresh levels. Every generated level is audited before it is
/// handed out; a level that fails is thrown away and generated again.
pub struct LevelBuilder<'a> {
    spec: &'a LevelSpec,
}

impl<'a> LevelBuilder<'a> {
    pub fn new(spec: &'a LevelSpec) -> Self {
        Self { spec }
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<World> {
        self.build_with_hook(rng, |_, _| {})
    }

    /// Like [`build`](Self::build), but calls `hook` with the attempt number
    /// and the generated world before it is audited.
    pub fn build_with_hook<R, F>(&self, rng: &mut R, mut hook: F) -> Result<World>
    where
        R: Rng + ?Sized,
        F: FnMut(u32, &mut World),
    {
        for attempt in 1..=self.spec.max_attempts {
            let mut world = self.generate(rng)?;
            hook(attempt, &mut world);

            let report = world.audit();
            if report.is_clean() {
                info!(
                    attempt,
                    monsters = world.monsters().len(),
                    items = world.items().len(),
                    "level generated"
                );
                return Ok(world);
            }
            for violation in &report.violations {
                warn!(attempt, %violation, "generated level is inconsistent");
            }
        }
        bail!(
            "level failed its consistency audit {} times in a row",
            self.spec.max_attempts
        )
    }

    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<World> {
        let mut world = World::new();

        for group in &self.spec.monsters {
            for _ in 0..group.count {
                let cell = random_free_cell(&world, rng)?;
                world
                    .spawn_monster(group.kind, cell)
                    .with_context(|| format!("Failed to place {:?} at {cell}", group.kind))?;
            }
        }
        let start = random_free_cell(&world, rng)?;
        world.place_player(start)?;

        for group in &self.spec.items {
            for _ in 0..group.count {
                self.place_item(&mut world, group, rng)?;
            }
        }
        Ok(world)
    }

    fn place_item<R: Rng + ?Sized>(
        &self,
        world: &mut World,
        group: &ItemGroup,
        rng: &mut R,
    ) -> Result<()> {
        let carried = group.summoned || rng.gen_bool(self.spec.carried_fraction);
        let placement = if carried {
            match random_holder(world, group.kind, rng) {
                Some(placement) => placement,
                None if group.summoned => {
                    debug!(kind = ?group.kind, "no monster can hold a summoned item; skipped");
                    return Ok(());
                }
                None => Placement::Floor(random_cell(rng)),
            }
        } else {
            Placement::Floor(random_cell(rng))
        };

        let id = world
            .spawn_item(group.kind, group.quantity, placement)
            .with_context(|| format!("Failed to place {:?}", group.kind))?;
        if group.summoned {
            world.mark_summoned(id)?;
        }
        Ok(())
    }
}

fn random_cell<R: Rng + ?Sized>(rng: &mut R) -> Coord {
    Coord::new(rng.gen_range(0..GXM), rng.gen_range(0..GYM))
}

/// A random cell with neither a monster nor the player on it.
pub fn random_free_cell<R: Rng + ?Sized>(world: &World, rng: &mut R) -> Result<Coord> {
    let is_free =
        |cell: Coord| world.monster_at(cell).is_none() && world.player().position != Some(cell);
    for _ in 0..64 {
        let cell = random_cell(rng);
        if is_free(cell) {
            return Ok(cell);
        }
    }
    // crowded map: fall back to a scan from a random start
    let cells = (GXM * GYM) as usize;
    let start = rng.gen_range(0..cells);
    (0..cells)
        .map(|offset| Coord::from_index((start + offset) % cells))
        .find(|cell| is_free(*cell))
        .context("No free cell left on the map")
}

fn random_holder<R: Rng + ?Sized>(
    world: &World,
    kind: ItemKind,
    rng: &mut R,
) -> Option<Placement> {
    let candidates: Vec<(MonsterId, _)> = world
        .monsters()
        .iter()
        .filter(|(_, monster)| monster.alive)
        .filter_map(|(id, monster)| monster.free_slot_for(kind).map(|slot| (id, slot)))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let (holder, slot) = candidates[rng.gen_range(0..candidates.len())];
    Some(Placement::Monster { holder, slot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const LEVEL: &str = r#"
name: unit
seed: 3
level:
  monsters:
    - { kind: goblin, count: 6 }
    - { kind: naga, count: 2 }
  items:
    - { kind: gold, count: 10, quantity: 25 }
    - { kind: wand, count: 2, summoned: true }
"#;

    fn scenario() -> Scenario {
        serde_yaml::from_str(LEVEL).unwrap()
    }

    #[test]
    fn test_defaults_fill_in() {
        let scenario = scenario();
        assert_eq!(scenario.turns(None), 100);
        assert_eq!(scenario.turns(Some(7)), 7);
        assert_eq!(scenario.audit_interval_turns, 1);
        assert_eq!(scenario.report_interval_turns, 0);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.level.max_attempts, 5);
        assert_eq!(scenario.level.population(), 8);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_generated_level_is_clean() {
        let scenario = scenario();
        let world = scenario.build_world().unwrap();
        assert_eq!(world.monsters().len(), 8);
        assert!(world.player().position.is_some());
        assert!(world.audit().is_clean());
        assert!(world
            .items()
            .iter()
            .filter(|(_, item)| item.summoned)
            .all(|(_, item)| !matches!(item.location, crate::entity::ItemLocation::Floor(_))));
    }

    #[test]
    fn test_bad_probability_is_rejected() {
        let mut scenario = scenario();
        scenario.churn.kill_chance = 1.5;
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("kill_chance"));
    }

    #[test]
    fn test_random_free_cell_skips_occupied() {
        let mut world = World::new();
        world.place_player(Coord::new(0, 0)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let cell = random_free_cell(&world, &mut rng).unwrap();
            assert_ne!(cell, Coord::new(0, 0));
            world.spawn_monster(MonsterKind::Rat, cell).unwrap();
        }
        assert_eq!(world.monsters().len(), 50);
    }
}
