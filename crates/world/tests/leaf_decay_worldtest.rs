//! Leaf decay worldtest: felling generated trees clears their canopies.

use std::collections::BTreeSet;

use terralite_core::Tile;
use terralite_world::{LeafDecay, World, SUPPORT_RADIUS, TRUNK_BREAK_RADIUS};

const WORLD_SEED: u64 = 42;
const FELL_MIN: i32 = -100;
const FELL_MAX: i32 = 100;
/// Columns far enough from unfelled trees to lose all support.
const INNER_MIN: i32 = FELL_MIN + 20;
const INNER_MAX: i32 = FELL_MAX - 20;

#[test]
fn solitary_trunk_supports_single_leaf() {
    let mut world = World::new(WORLD_SEED);
    for y in 0..16 {
        for x in -12..12 {
            world.set(x, y, Tile::Empty);
        }
    }
    world.set(0, 8, Tile::Trunk);
    world.set(0, 7, Tile::Leaves);

    let mut decay = LeafDecay::new();
    world.set(0, 8, Tile::Empty);
    decay.on_trunk_broken(&mut world, 0, 8);

    let dt = 1.0 / 60.0;
    for _ in 0..90 {
        decay.update(dt, &mut world);
    }
    assert!(decay.clock() >= 1.4);
    assert_eq!(world.get(0, 7), Tile::Empty);
}

#[test]
fn felled_forest_loses_its_leaves() {
    let mut world = World::new(WORLD_SEED);
    let mut trunks = Vec::new();
    for x in FELL_MIN..=FELL_MAX {
        for y in 0..120 {
            if world.get(x, y) == Tile::Trunk {
                trunks.push((x, y));
            }
        }
    }
    assert!(!trunks.is_empty(), "no trees generated near spawn");

    // Leaves the felling will reach directly.
    let mut doomed = BTreeSet::new();
    for &(tx, ty) in &trunks {
        for y in (ty - TRUNK_BREAK_RADIUS)..=(ty + TRUNK_BREAK_RADIUS) {
            for x in (tx - TRUNK_BREAK_RADIUS)..=(tx + TRUNK_BREAK_RADIUS) {
                if (INNER_MIN..=INNER_MAX).contains(&x) && world.get(x, y) == Tile::Leaves {
                    doomed.insert((x, y));
                }
            }
        }
    }
    assert!(!doomed.is_empty());

    let mut decay = LeafDecay::new();
    for &(x, y) in &trunks {
        world.set(x, y, Tile::Empty);
        decay.on_trunk_broken(&mut world, x, y);
    }

    for _ in 0..600 {
        decay.update(0.1, &mut world);
        if decay.pending_len() == 0 {
            break;
        }
    }

    for &(x, y) in &doomed {
        assert_eq!(world.get(x, y), Tile::Empty, "leaf at ({x}, {y}) survived");
    }
}

#[test]
fn supported_canopy_survives_neighbouring_felling() {
    let mut world = World::new(WORLD_SEED);
    for y in 0..20 {
        for x in -30..30 {
            world.set(x, y, Tile::Empty);
        }
    }
    // Two hand-built trees, twelve columns apart.
    for y in 10..16 {
        world.set(-6, y, Tile::Trunk);
        world.set(6, y, Tile::Trunk);
    }
    for x in -9..=-3 {
        world.set(x, 9, Tile::Leaves);
    }
    for x in 3..=9 {
        world.set(x, 9, Tile::Leaves);
    }

    let mut decay = LeafDecay::new();
    for y in 10..16 {
        world.set(-6, y, Tile::Empty);
        decay.on_trunk_broken(&mut world, -6, y);
    }
    for _ in 0..200 {
        decay.update(0.1, &mut world);
    }

    // The right trunk is out of reach of every left leaf.
    assert!(6 - (-3) > SUPPORT_RADIUS);
    for x in -9..=-3 {
        assert_eq!(world.get(x, 9), Tile::Empty, "x={x}");
    }
    for x in 3..=9 {
        assert_eq!(world.get(x, 9), Tile::Leaves);
    }
}

#[test]
fn decay_is_reproducible() {
    fn run() -> Vec<Tile> {
        let mut world = World::new(WORLD_SEED);
        let mut decay = LeafDecay::new();
        let mut trunks = Vec::new();
        for x in -40..40 {
            for y in 0..120 {
                if world.get(x, y) == Tile::Trunk {
                    trunks.push((x, y));
                }
            }
        }
        for (x, y) in trunks {
            world.set(x, y, Tile::Empty);
            decay.on_trunk_broken(&mut world, x, y);
        }
        for _ in 0..30 {
            decay.update(1.0 / 60.0 * 3.0, &mut world);
        }
        let mut out = Vec::new();
        for x in -40..40 {
            for y in 0..120 {
                out.push(world.get(x, y));
            }
        }
        out
    }
    assert_eq!(run(), run());
}
