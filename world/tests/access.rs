mod support;

use keeper_core::{CreatureAbilities, CreatureAbility, CreatureProfile, TileCoord};
use keeper_world::{query, BreadthFirstPaths, RoomInstance, RoomObstacles};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use support::*;

fn creature(abilities: &[CreatureAbility]) -> CreatureProfile {
    CreatureProfile::new(abilities.iter().copied().collect::<CreatureAbilities>())
}

#[derive(Debug)]
struct BlockedTile(TileCoord);

impl RoomObstacles for BlockedTile {
    fn is_tile_accessible(&self, _instance: &RoomInstance, tile: TileCoord) -> bool {
        tile != self.0
    }
}

#[test]
fn liquids_need_matching_abilities() {
    let world = world(&["#~^T"]);
    let walker = creature(&[]);
    let swimmer = creature(&[CreatureAbility::CanWalkOnWater]);
    let fire_walker = creature(&[CreatureAbility::CanWalkOnLava]);
    let flyer = creature(&[CreatureAbility::CanFly]);

    for profile in [walker, swimmer, fire_walker, flyer] {
        assert!(!query::is_accessible(&world, at(0, 0), &profile));
        assert!(query::is_accessible(&world, at(3, 0), &profile));
    }
    assert!(!query::is_accessible(&world, at(1, 0), &walker));
    assert!(query::is_accessible(&world, at(1, 0), &swimmer));
    assert!(!query::is_accessible(&world, at(1, 0), &fire_walker));
    assert!(query::is_accessible(&world, at(1, 0), &flyer));

    assert!(!query::is_accessible(&world, at(2, 0), &walker));
    assert!(!query::is_accessible(&world, at(2, 0), &swimmer));
    assert!(query::is_accessible(&world, at(2, 0), &fire_walker));
    assert!(query::is_accessible(&world, at(2, 0), &flyer));

    assert!(!query::is_accessible(&world, at(9, 0), &flyer));
}

#[test]
fn room_obstacles_decide_room_tiles() {
    let mut world = world(&["TT_"]);
    world.set_room_obstacles(BlockedTile(at(1, 0)));
    let flyer = creature(&[CreatureAbility::CanFly]);

    assert!(query::is_accessible(&world, at(0, 0), &flyer));
    assert!(!query::is_accessible(&world, at(1, 0), &flyer));
    assert!(query::is_accessible(&world, at(2, 0), &flyer));
}

#[test]
fn paths_walk_around_rock() {
    let world = world(&["_#_", "_#_", "___"]);
    let mut paths = BreadthFirstPaths::default();
    let walker = creature(&[]);

    let path = query::find_path(&world, &mut paths, at(0, 0), at(2, 0), &walker)
        .expect("path around the rock");

    assert_eq!(path.first(), Some(&at(0, 0)));
    assert_eq!(path.last(), Some(&at(2, 0)));
    assert_eq!(path.len(), 7);
    assert!(path
        .iter()
        .all(|tile| query::is_accessible(&world, *tile, &walker)));
    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
    }
}

#[test]
fn water_cuts_off_walkers_but_not_swimmers() {
    let world = world(&["_~_"]);
    let mut paths = BreadthFirstPaths::default();

    let walker = creature(&[]);
    assert!(query::find_path(&world, &mut paths, at(0, 0), at(2, 0), &walker).is_none());

    let swimmer = creature(&[CreatureAbility::CanWalkOnWater]);
    let path = query::find_path(&world, &mut paths, at(0, 0), at(2, 0), &swimmer)
        .expect("swimmer crosses");
    assert_eq!(path, vec![at(0, 0), at(1, 0), at(2, 0)]);
}

#[test]
fn paths_to_blocked_destinations_fail() {
    let world = world(&["__#"]);
    let mut paths = BreadthFirstPaths::default();
    let walker = creature(&[]);

    assert!(query::find_path(&world, &mut paths, at(0, 0), at(2, 0), &walker).is_none());
    assert_eq!(
        query::find_path(&world, &mut paths, at(1, 0), at(1, 0), &walker),
        Some(vec![at(1, 0)])
    );
}

#[test]
fn random_tiles_are_accessible_and_never_the_start() {
    let world = world(&["#####", "#___#", "#_~_#", "#___#", "#####"]);
    let walker = creature(&[]);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..32 {
        let tile = query::find_random_accessible_tile(&world, at(2, 2), 4, &walker, &mut rng)
            .expect("open tiles nearby");
        assert_ne!(tile, at(2, 2));
        assert!(query::is_accessible(&world, tile, &walker));
    }
}

#[test]
fn random_tile_search_can_come_up_empty() {
    let world = world(&["###", "#_#", "###"]);
    let walker = creature(&[]);
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    assert_eq!(
        query::find_random_accessible_tile(&world, at(1, 1), 2, &walker, &mut rng),
        None
    );
}
