use cellar::{
    coord::Coord,
    entity::{InvSlot, ItemKind, ItemLocation, MonsterKind, MAX_MONSTERS},
    Placement, StoreError, ViolationKind, World,
};

#[test]
fn item_moved_into_inventory_leaves_the_floor() {
    let mut world = World::new();
    let cell = Coord::new(5, 5);
    let monster = world.spawn_monster(MonsterKind::Goblin, cell).unwrap();
    let item = world
        .spawn_item(ItemKind::Weapon, 1, Placement::Floor(cell))
        .unwrap();

    world
        .move_item(
            item,
            Placement::Monster {
                holder: monster,
                slot: InvSlot::Weapon,
            },
        )
        .unwrap();

    let mid = world.monster(monster).unwrap().mid;
    assert_eq!(world.items_at(cell).count(), 0);
    assert_eq!(world.resolve_mid(mid), Some(monster));
    assert_eq!(
        world.item(item).unwrap().location,
        ItemLocation::Monster(monster)
    );
    assert!(world.run_consistency_check().is_empty());
}

#[test]
fn destroying_a_holder_is_refused_until_inventory_is_dropped() {
    let mut world = World::new();
    let cell = Coord::new(5, 5);
    let monster = world.spawn_monster(MonsterKind::Orc, cell).unwrap();
    let item = world
        .spawn_item(
            ItemKind::Armour,
            1,
            Placement::Monster {
                holder: monster,
                slot: InvSlot::Armour,
            },
        )
        .unwrap();

    assert_eq!(
        world.destroy_monster(monster),
        Err(StoreError::MonsterHoldsItems { count: 1 })
    );

    assert_eq!(world.drop_inventory(monster).unwrap(), 1);
    world.destroy_monster(monster).unwrap();
    assert_eq!(world.items_at(cell).collect::<Vec<_>>(), vec![item]);
    assert!(world.run_consistency_check().is_empty());
}

#[test]
fn bypassing_the_refusal_is_caught_as_a_dangling_holder() {
    let mut world = World::new();
    let cell = Coord::new(5, 5);
    let monster = world.spawn_monster(MonsterKind::Orc, cell).unwrap();
    world
        .spawn_item(
            ItemKind::Armour,
            1,
            Placement::Monster {
                holder: monster,
                slot: InvSlot::Armour,
            },
        )
        .unwrap();

    // tear the monster down by hand, skipping its inventory
    let mid = world.monster(monster).unwrap().mid;
    world.grid_mut().set_monster_at(cell, None);
    world.mid_cache_mut().unregister(mid);
    world.monsters_mut().free(monster);

    let violations = world.run_consistency_check();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::DanglingHolderReference);
}

#[test]
fn identity_survives_churn_of_other_monsters() {
    let mut world = World::new();
    let keeper = world
        .spawn_monster(MonsterKind::Ogre, Coord::new(0, 0))
        .unwrap();
    let keeper_mid = world.monster(keeper).unwrap().mid;

    let mut retired = Vec::new();
    for round in 0..5 {
        let spawned: Vec<_> = (1..20)
            .map(|x| {
                world
                    .spawn_monster(MonsterKind::Rat, Coord::new(x, round + 1))
                    .unwrap()
            })
            .collect();
        for id in spawned {
            retired.push(world.monster(id).unwrap().mid);
            world.destroy_monster(id).unwrap();
        }
        assert_eq!(world.resolve_mid(keeper_mid), Some(keeper));
    }

    for mid in retired {
        assert_eq!(world.resolve_mid(mid), None);
    }
    assert!(world.audit().is_clean());
}

#[test]
fn monster_arena_reports_exhaustion() {
    let mut world = World::new();
    for index in 0..MAX_MONSTERS {
        world
            .spawn_monster(MonsterKind::Rat, Coord::from_index(index))
            .unwrap();
    }
    let err = world
        .spawn_monster(MonsterKind::Rat, Coord::from_index(MAX_MONSTERS))
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::OutOfCapacity {
            arena: "monster",
            capacity: MAX_MONSTERS
        }
    );
    assert!(world.audit().is_clean());
}

#[test]
fn player_blocks_monsters_and_carries_items() {
    let mut world = World::new();
    world.place_player(Coord::new(10, 10)).unwrap();
    assert_eq!(
        world.spawn_monster(MonsterKind::Goblin, Coord::new(10, 10)),
        Err(StoreError::CellOccupied(Coord::new(10, 10)))
    );

    let goblin = world
        .spawn_monster(MonsterKind::Goblin, Coord::new(11, 10))
        .unwrap();
    assert_eq!(
        world.move_monster(goblin, Coord::new(10, 10)),
        Err(StoreError::CellOccupied(Coord::new(10, 10)))
    );
    assert_eq!(
        world.place_player(Coord::new(11, 10)),
        Err(StoreError::CellOccupied(Coord::new(11, 10)))
    );

    let scroll = world
        .spawn_item(ItemKind::Scroll, 2, Placement::Floor(Coord::new(10, 10)))
        .unwrap();
    world.move_item(scroll, Placement::Player).unwrap();
    assert_eq!(world.item(scroll).unwrap().location, ItemLocation::Player);
    assert!(world.audit().is_clean());
}

#[test]
fn player_moving_away_breaks_the_grip() {
    let mut world = World::new();
    let naga = world
        .spawn_monster(MonsterKind::Naga, Coord::new(20, 20))
        .unwrap();
    let naga_mid = world.monster(naga).unwrap().mid;
    world.place_player(Coord::new(21, 21)).unwrap();

    world
        .start_constriction(naga_mid, cellar::entity::MID_PLAYER)
        .unwrap();
    assert_eq!(world.player().constricted_by, Some(naga_mid));

    world.place_player(Coord::new(22, 21)).unwrap();
    assert_eq!(world.player().constricted_by, None);
    assert!(world.monster(naga).unwrap().constricting.is_empty());
    assert!(world.audit().is_clean());
}

#[test]
fn constriction_needs_live_actors() {
    let mut world = World::new();
    let naga = world
        .spawn_monster(MonsterKind::Naga, Coord::new(1, 1))
        .unwrap();
    let mid = world.monster(naga).unwrap().mid;
    let ghost = cellar::entity::Mid(9_999);

    assert_eq!(
        world.start_constriction(mid, ghost),
        Err(StoreError::UnknownActor(ghost))
    );
    assert_eq!(
        world.start_constriction(ghost, mid),
        Err(StoreError::UnknownActor(ghost))
    );
    assert!(!world.actor_exists(ghost));
}
