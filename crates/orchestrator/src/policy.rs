//! Reference interaction policy: central attraction field, spherical
//! containment, per-species drag, and soft social/collision pairs.
//!
//! This is the embedder-side behavior object the core is exercised with;
//! applications with different ecosystems supply their own
//! [`InteractionPolicy`] implementation instead.

use engine::{InteractionPolicy, Particle, SocialData, SpeciesData};
use glam::Vec3;

use crate::config::SimulationConfig;

/// Field-driven policy: particles outside the field radius are nudged back
/// toward the center each tick and hard-contained by the constraint pass;
/// overlapping pairs feel a soft species-scaled repulsion and in-range
/// pairs feel the social force of their species pair.
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    center: Vec3,
    radius: f32,
    force: f32,
    collision_diameter: f32,
}

impl FieldPolicy {
    /// Create a policy with an explicit field.
    pub fn new(center: Vec3, radius: f32, force: f32, collision_diameter: f32) -> Self {
        Self {
            center,
            radius,
            force,
            collision_diameter,
        }
    }

    /// Build the policy a configuration describes.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            Vec3::from_array(config.field.center),
            config.field.radius,
            config.field.force,
            config.engine.particle_diameter,
        )
    }

    /// Center of the attraction field.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Containment radius of the field.
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl InteractionPolicy for FieldPolicy {
    fn global_forces(&self, particle: &mut Particle, species: &SpeciesData) {
        // Drag removes a fraction of the implied velocity.
        if species.drag > 0.0 {
            particle.position -= species.drag * (particle.position - particle.prev_position);
        }

        // Strays get a constant-magnitude pull back toward the field.
        let to_center = self.center - particle.position;
        let dist = to_center.length();
        if dist > self.radius {
            particle.position += to_center * (self.force / dist);
        }
    }

    fn constraints(&self, particle: &mut Particle, _species: &SpeciesData) {
        // Project escapees onto the field sphere; the engine doubles this
        // correction, reflecting them back inside.
        let offset = particle.position - self.center;
        let dist = offset.length();
        if dist > self.radius {
            particle.position = self.center + offset * (self.radius / dist);
        }
    }

    fn pairwise(
        &self,
        particle: &Particle,
        species: &SpeciesData,
        other: &Particle,
        other_species: &SpeciesData,
        social: &SocialData,
    ) -> Option<Vec3> {
        let to_other = other.position - particle.position;
        let dist_sq = to_other.length_squared();
        if dist_sq <= f32::EPSILON {
            return None;
        }
        let dist = dist_sq.sqrt();
        let dir = to_other / dist;

        let mut total = Vec3::ZERO;
        let mut interacted = false;

        if dist < self.collision_diameter {
            let strength = 0.5 * (species.collision_force + other_species.collision_force);
            if strength != 0.0 {
                let penetration = 1.0 - dist / self.collision_diameter;
                total -= dir * (penetration * strength);
                interacted = true;
            }
        }

        if social.force != 0.0 && dist < social.range {
            total += dir * social.force;
            interacted = true;
        }

        interacted.then_some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FieldPolicy {
        FieldPolicy::new(Vec3::ZERO, 0.5, 0.01, 0.05)
    }

    #[test]
    fn inside_the_field_feels_no_pull() {
        let mut p = Particle::new(Vec3::new(0.1, 0.0, 0.0), 0);
        policy().global_forces(&mut p, &SpeciesData::default());
        assert_eq!(p.position, Vec3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn strays_are_pulled_back_toward_center() {
        let mut p = Particle::new(Vec3::new(1.0, 0.0, 0.0), 0);
        policy().global_forces(&mut p, &SpeciesData::default());
        assert!(p.position.x < 1.0);
        assert!((p.position.x - 0.99).abs() < 1e-6);
    }

    #[test]
    fn drag_shrinks_implied_velocity() {
        let mut p = Particle::with_velocity(Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0), 0);
        let species = SpeciesData {
            drag: 0.5,
            ..SpeciesData::default()
        };
        policy().global_forces(&mut p, &species);
        assert!((p.position.x - (-0.05)).abs() < 1e-6);
    }

    #[test]
    fn constraint_projects_onto_the_sphere() {
        let mut p = Particle::new(Vec3::new(0.0, 2.0, 0.0), 0);
        policy().constraints(&mut p, &SpeciesData::default());
        assert!((p.position.length() - 0.5).abs() < 1e-6);
        assert!(p.position.y > 0.0);
    }

    #[test]
    fn social_attraction_points_at_the_partner() {
        let p = Particle::new(Vec3::ZERO, 0);
        let other = Particle::new(Vec3::new(0.2, 0.0, 0.0), 1);
        let social = SocialData {
            force: 0.002,
            range: 0.3,
        };
        let contribution = policy()
            .pairwise(
                &p,
                &SpeciesData::default(),
                &other,
                &SpeciesData::default(),
                &social,
            )
            .expect("in range");
        assert!(contribution.x > 0.0);
        assert_eq!(contribution.y, 0.0);
    }

    #[test]
    fn overlapping_pair_is_softly_repelled() {
        let p = Particle::new(Vec3::ZERO, 0);
        let other = Particle::new(Vec3::new(0.02, 0.0, 0.0), 0);
        let species = SpeciesData {
            collision_force: 0.01,
            ..SpeciesData::default()
        };
        let contribution = policy()
            .pairwise(&p, &species, &other, &species, &SocialData::default())
            .expect("overlapping");
        assert!(contribution.x < 0.0, "repulsion must point away");
    }

    #[test]
    fn distant_inert_pair_contributes_nothing() {
        let p = Particle::new(Vec3::ZERO, 0);
        let other = Particle::new(Vec3::new(0.4, 0.0, 0.0), 0);
        let result = policy().pairwise(
            &p,
            &SpeciesData::default(),
            &other,
            &SpeciesData::default(),
            &SocialData::default(),
        );
        assert!(result.is_none());
    }
}
