mod support;

use keeper_core::{Command, Event, PlayerId, RuleRates, SelectionRect};
use keeper_world::{query, World};

use support::*;

fn build(world: &mut World, from: (u32, u32), to: (u32, u32)) -> Vec<Event> {
    run(
        world,
        Command::Build {
            area: SelectionRect::new(at(from.0, from.1), at(to.0, to.1)),
            player: KEEPER,
            room: TREASURY,
        },
    )
}

fn removed(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::RoomInstanceRemoved { .. }))
        .count()
}

#[test]
fn level_rooms_are_discovered_at_load() {
    let world = world(&["TT_tt", "L____"]);

    let instances: Vec<_> = query::room_instances(&world).collect();
    assert_eq!(instances.len(), 3);
    assert_rooms_are_maximal(&world);

    let ours = query::room_instance_at(&world, at(1, 0)).expect("keeper treasury");
    assert_eq!(ours.room(), TREASURY);
    assert_eq!(ours.tiles(), &[at(0, 0), at(1, 0)]);
    assert_eq!(query::max_gold_capacity(&world, ours.id()), Some(200));
    let lair = query::room_instance_at(&world, at(0, 1)).expect("lair");
    assert_eq!(query::stored_gold(&world, lair.id()), None);
}

#[test]
fn building_next_to_a_room_merges_it() {
    let mut world = world(&["#####", "_____", "#####"]);

    let _ = build(&mut world, (0, 1), (1, 1));
    let _ = build(&mut world, (3, 1), (4, 1));
    assert_eq!(query::room_instances(&world).count(), 2);

    let events = build(&mut world, (2, 1), (2, 1));

    assert_eq!(removed(&events), 2);
    let merged = query::room_instance_at(&world, at(2, 1)).expect("merged room");
    assert_eq!(merged.tiles().len(), 5);
    assert_eq!(query::room_instances(&world).count(), 1);
    assert_rooms_are_maximal(&world);
}

#[test]
fn building_requires_owned_open_ground() {
    let world = world(&[",_#.T"]);

    assert!(!query::is_buildable(&world, at(0, 0), KEEPER, TREASURY));
    assert!(query::is_buildable(&world, at(1, 0), KEEPER, TREASURY));
    assert!(!query::is_buildable(&world, at(2, 0), KEEPER, TREASURY));
    assert!(!query::is_buildable(&world, at(3, 0), KEEPER, TREASURY));
    assert!(!query::is_buildable(&world, at(4, 0), KEEPER, TREASURY));
    assert!(!query::is_buildable(&world, at(1, 0), KEEPER, BRIDGE));
}

#[test]
fn rooms_of_different_owners_stay_apart() {
    let mut world = world(&["_,"]);
    let _ = run(
        &mut world,
        Command::Build {
            area: SelectionRect::single(at(1, 0)),
            player: RIVAL,
            room: TREASURY,
        },
    );
    let _ = build(&mut world, (0, 0), (0, 0));

    let ours = query::room_instance_at(&world, at(0, 0)).expect("keeper room");
    let theirs = query::room_instance_at(&world, at(1, 0)).expect("rival room");
    assert_ne!(ours.id(), theirs.id());
    assert_rooms_are_maximal(&world);
}

#[test]
fn selling_the_middle_of_a_room_splits_it() {
    let mut world = world(&["TTTTT"]);
    assert!(query::is_sellable(&world, at(2, 0), KEEPER));
    assert!(!query::is_sellable(&world, at(2, 0), RIVAL));

    let events = run(
        &mut world,
        Command::Sell {
            area: SelectionRect::single(at(2, 0)),
            player: KEEPER,
        },
    );

    assert_eq!(removed(&events), 1);
    assert_eq!(terrain_of(&world, at(2, 0)), FLOOR);
    assert_eq!(owner_of(&world, at(2, 0)), KEEPER);
    assert!(query::room_instance_at(&world, at(2, 0)).is_none());
    assert_eq!(query::room_instances(&world).count(), 2);
    assert_rooms_are_maximal(&world);
}

#[test]
fn bridges_restore_the_liquid_they_span() {
    let mut world = world(&["_~^"]);
    let _ = run(
        &mut world,
        Command::Build {
            area: SelectionRect::new(at(1, 0), at(2, 0)),
            player: KEEPER,
            room: BRIDGE,
        },
    );
    assert_eq!(terrain_of(&world, at(1, 0)), BRIDGE_TERRAIN);
    assert_eq!(terrain_of(&world, at(2, 0)), BRIDGE_TERRAIN);
    assert_eq!(query::room_instances(&world).count(), 1);

    let _ = run(
        &mut world,
        Command::Sell {
            area: SelectionRect::new(at(0, 0), at(2, 0)),
            player: KEEPER,
        },
    );

    assert_eq!(terrain_of(&world, at(1, 0)), WATER);
    assert_eq!(terrain_of(&world, at(2, 0)), LAVA);
    assert_eq!(query::room_instances(&world).count(), 0);
}

#[test]
fn room_damage_converts_every_tile_at_once() {
    let rates = RuleRates {
        attack_room: 12,
        ..RuleRates::default()
    };
    let mut world = world_with_rates(&["_tt"], rates);
    let claim = Command::ApplyClaim {
        tile: at(1, 0),
        player: KEEPER,
    };

    let first = run(&mut world, claim.clone());
    assert!(changed_tiles(&first).is_empty());
    assert_eq!(health_of(&world, at(1, 0)), 4);
    assert_eq!(health_of(&world, at(2, 0)), 4);
    assert_eq!(owner_of(&world, at(1, 0)), RIVAL);
    assert_eq!(owner_of(&world, at(2, 0)), RIVAL);

    let second = run(&mut world, claim);

    assert_eq!(changed_tiles(&second), vec![at(1, 0), at(2, 0)]);
    for tile in [at(1, 0), at(2, 0)] {
        assert_eq!(owner_of(&world, tile), KEEPER);
        assert_eq!(health_of(&world, tile), 10);
    }
    assert!(second
        .iter()
        .any(|event| matches!(event, Event::RoomClaimed { player, .. } if *player == KEEPER)));
    let room = query::room_instance_at(&world, at(2, 0)).expect("converted room");
    assert_eq!(room.owner(), KEEPER);
    assert_eq!(room.tiles().len(), 2);
    assert_rooms_are_maximal(&world);
}

#[test]
fn converted_room_joins_adjacent_room_of_the_claimant() {
    let mut world = world(&["TTt"]);

    let _ = run(
        &mut world,
        Command::DamageRoom {
            tile: at(2, 0),
            player: KEEPER,
        },
    );

    let room = query::room_instance_at(&world, at(0, 0)).expect("merged room");
    assert_eq!(room.tiles().len(), 3);
    assert_rooms_are_maximal(&world);
}

#[test]
fn walls_are_invalidated_for_walled_rooms_only() {
    let mut world = world(&["_T.", "_L."]);

    let walled = run(
        &mut world,
        Command::AlterTerrain {
            tile: at(2, 0),
            terrain: ROCK,
            owner: PlayerId::NEUTRAL,
        },
    );
    let treasury = query::room_instance_at(&world, at(1, 0)).expect("treasury").id();
    assert!(walled.contains(&Event::RoomWallsInvalidated {
        instances: vec![treasury],
    }));

    let unwalled = run(
        &mut world,
        Command::AlterTerrain {
            tile: at(2, 1),
            terrain: ROCK,
            owner: PlayerId::NEUTRAL,
        },
    );
    assert!(!unwalled
        .iter()
        .any(|event| matches!(event, Event::RoomWallsInvalidated { .. })));
}
