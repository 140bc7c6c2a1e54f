//! Synthetic quadruped gait generation.
//!
//! Produces a plausible walking plan: sinusoidal base motion plus four
//! phase-offset feet. Each foot leaves the contact list for part of its
//! cycle, so the generated trajectory exercises the pipeline's slot
//! resolution over variable-length contact lists.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strideview_core::{BaseAxis, BaseCoordinate, ContactPoint, TrajectoryStep, WholeBodyTrajectory};

/// Nominal foot offsets from the base, meters.
const FEET: [(&str, f64, f64); 4] = [
    ("lf_foot", 0.35, 0.25),
    ("rf_foot", 0.35, -0.25),
    ("lh_foot", -0.35, 0.25),
    ("rh_foot", -0.35, -0.25),
];

/// Fraction of a foot's cycle during which it is absent from the plan.
const UNTRACKED_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct GaitParams {
    pub steps: usize,
    /// Sample spacing, seconds.
    pub dt: f64,
    /// Forward speed, m/s.
    pub speed: f64,
    pub base_height: f64,
    /// Gait cycle period, seconds.
    pub cycle: f64,
    /// Uniform position jitter amplitude, meters.
    pub noise: f64,
    pub seed: u64,
}

impl Default for GaitParams {
    fn default() -> Self {
        Self {
            steps: 120,
            dt: 0.05,
            speed: 0.4,
            base_height: 0.55,
            cycle: 1.2,
            noise: 0.0,
            seed: 42,
        }
    }
}

pub fn generate(params: &GaitParams) -> WholeBodyTrajectory {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut jitter = |rng: &mut StdRng| {
        if params.noise > 0.0 {
            rng.gen_range(-params.noise..=params.noise)
        } else {
            0.0
        }
    };

    let mut trajectory = WholeBodyTrajectory::new("odom", 0.0);
    for i in 0..params.steps {
        let t = i as f64 * params.dt;
        let phase = t / params.cycle * std::f64::consts::TAU;

        let mut step = TrajectoryStep {
            base: vec![
                BaseCoordinate::new(BaseAxis::LinearX, params.speed * t + jitter(&mut rng)),
                BaseCoordinate::new(BaseAxis::LinearY, 0.02 * phase.sin()),
                BaseCoordinate::new(
                    BaseAxis::LinearZ,
                    params.base_height + 0.01 * (2.0 * phase).sin(),
                ),
                BaseCoordinate::new(BaseAxis::AngularX, 0.01 * phase.cos()),
                BaseCoordinate::new(BaseAxis::AngularY, 0.02 * (2.0 * phase).sin()),
                BaseCoordinate::new(BaseAxis::AngularZ, 0.05 * phase.sin()),
            ],
            contacts: Vec::new(),
        };

        for (k, (name, fx, fy)) in FEET.iter().enumerate() {
            // Quarter-phase offsets give a walking sequence.
            let foot_phase = (t / params.cycle + k as f64 * 0.25).fract();
            if foot_phase >= 1.0 - UNTRACKED_FRACTION {
                continue;
            }

            // Swing window: the foot moves forward and lifts.
            let (dx, dz) = if foot_phase > 0.6 {
                let s = (foot_phase - 0.6) / 0.2;
                (
                    0.1 * (2.0 * s - 1.0),
                    0.06 * (s * std::f64::consts::PI).sin(),
                )
            } else {
                (-0.05 * foot_phase / 0.6, 0.0)
            };

            step.contacts.push(ContactPoint::new(
                *name,
                Vector3::new(
                    fx + dx + jitter(&mut rng),
                    fy + jitter(&mut rng),
                    -params.base_height + dz,
                ),
            ));
        }

        trajectory.steps.push(step);
    }
    trajectory
}
