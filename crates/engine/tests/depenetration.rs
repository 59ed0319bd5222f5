//! Depenetration behavior of the collision resolution stage.

use engine::{EngineParams, NullPolicy, Particle, ParticleEngine, SocialMatrix, SpeciesData};
use glam::Vec3;

const DIAMETER: f32 = 0.05;

fn pair_engine() -> ParticleEngine<NullPolicy> {
    let params = EngineParams {
        max_particles: 16,
        chunk_side: 32,
        chunk_size: 0.1,
        particle_diameter: DIAMETER,
        damping: 0.99,
        threads: Some(2),
        multithreading: true,
    };
    ParticleEngine::new(
        params,
        vec![SpeciesData::default()],
        SocialMatrix::new(1),
        NullPolicy,
    )
}

/// Positions of the live pair, ordered by x.
fn pair_positions(engine: &ParticleEngine<NullPolicy>) -> (Vec3, Vec3) {
    let particles = engine.particles();
    assert_eq!(particles.len(), 2);
    let (a, b) = (particles[0].position, particles[1].position);
    if a.x <= b.x {
        (a, b)
    } else {
        (b, a)
    }
}

#[test]
fn half_overlapping_pair_separates_to_exactly_one_diameter() {
    let mut engine = pair_engine();
    // Two particles of the same species at half-diameter separation along
    // x, no other particles, no external constraints.
    let offset = 0.25 * DIAMETER;
    assert!(engine.try_emit(Particle::new(Vec3::new(-offset, 0.0, 0.0), 0)));
    assert!(engine.try_emit(Particle::new(Vec3::new(offset, 0.0, 0.0), 0)));

    engine.step();

    let (left, right) = pair_positions(&engine);
    let separation = right.x - left.x;
    assert!(
        (separation - DIAMETER).abs() < 1e-6,
        "one pass must separate to exactly one diameter, got {separation}"
    );
    // The push is along the connecting axis and split evenly, so the
    // midpoint stays put and the other axes stay untouched.
    assert!((left.x + right.x).abs() < 1e-6);
    assert!(left.y.abs() < 1e-7 && left.z.abs() < 1e-7);
    assert!(right.y.abs() < 1e-7 && right.z.abs() < 1e-7);
}

#[test]
fn separated_pair_is_left_alone() {
    let mut engine = pair_engine();
    let a = Vec3::new(-DIAMETER, 0.0, 0.0);
    let b = Vec3::new(DIAMETER, 0.0, 0.0);
    assert!(engine.try_emit(Particle::new(a, 0)));
    assert!(engine.try_emit(Particle::new(b, 0)));

    engine.step();

    let (left, right) = pair_positions(&engine);
    assert_eq!(left, a);
    assert_eq!(right, b);
}

#[test]
fn overlap_across_a_chunk_boundary_is_found() {
    let mut engine = pair_engine();
    // The pair straddles the cell boundary at x = 0.05: the scan has to
    // reach into the adjacent chunk to see the partner.
    assert!(engine.try_emit(Particle::new(Vec3::new(0.049, 0.0, 0.0), 0)));
    assert!(engine.try_emit(Particle::new(Vec3::new(0.051, 0.0, 0.0), 0)));

    engine.step();

    let (left, right) = pair_positions(&engine);
    let separation = right.x - left.x;
    assert!(
        (separation - DIAMETER).abs() < 1e-6,
        "boundary-straddling pair must still depenetrate, got {separation}"
    );
    assert!((left.x + right.x - 0.1).abs() < 1e-6, "midpoint must hold");
}

#[test]
fn depenetration_matches_in_both_threading_modes() {
    let run = |multithreading: bool| {
        let mut engine = pair_engine();
        engine.set_multithreading(multithreading);
        engine.try_emit(Particle::new(Vec3::new(-0.01, 0.0, 0.0), 0));
        engine.try_emit(Particle::new(Vec3::new(0.01, 0.0, 0.0), 0));
        engine.step();
        pair_positions(&engine)
    };

    assert_eq!(run(true), run(false));
}
