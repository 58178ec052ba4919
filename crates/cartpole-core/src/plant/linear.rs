//! Linearized cart-pendulum dynamics
//!
//! Small-angle state-space model about the upright equilibrium, after the
//! standard derivation (University of Michigan control tutorials):
//!
//! ẋ = A·x + B·u,  x = [x, ẋ, φ, φ̇]
//!
//! where φ is the deviation from upright in the textbook clockwise-positive
//! sense. The published angle is converted back to the canonical
//! counter-clockwise convention as θ = −(φ + π) mod 2π, so consumers see
//! the same contract as with the nonlinear model.

use nalgebra::{Matrix4, Vector4};

use crate::config::{InitialState, PlantParams};
use crate::{wrap_angle, CONTROL_DT, GRAVITY};

use super::{PlantModel, PlantOutput, SimpleRng};

/// Pendulum moment of inertia about its center of mass [kg·m²]
const MOMENT_OF_INERTIA: f64 = 0.006;

/// Linearized plant model
///
/// The A and B matrices are built once per session from the plant
/// parameters; each tick performs one explicit Euler step.
#[derive(Debug, Clone)]
pub struct LinearPlant {
    a: Matrix4<f64>,
    b: Vector4<f64>,
    /// [x, ẋ, φ, φ̇] with φ clockwise-positive from upright
    state: Vector4<f64>,
}

impl LinearPlant {
    pub fn new(params: PlantParams, initial: &InitialState) -> Self {
        let mut rng = SimpleRng::new(initial.seed);
        let theta0 = initial.theta + rng.next_symmetric(initial.theta_jitter);
        let theta_dot0 = rng.next_symmetric(initial.theta_dot_jitter);

        let (a, b) = Self::build_matrices(&params);

        Self {
            a,
            b,
            // Canonical counter-clockwise deviation → clockwise state
            state: Vector4::new(0.0, 0.0, -theta0, -theta_dot0),
        }
    }

    fn build_matrices(params: &PlantParams) -> (Matrix4<f64>, Vector4<f64>) {
        let m_cart = params.cart_mass;
        let m_pend = params.pendulum_mass;
        let l = params.length;
        let b = params.friction;
        let i = MOMENT_OF_INERTIA;

        let denom = i * (m_cart + m_pend) + m_cart * m_pend * l * l;

        #[rustfmt::skip]
        let a_mat = Matrix4::new(
            0.0, 1.0, 0.0, 0.0,
            0.0, -(i + m_pend * l * l) * b / denom, m_pend * m_pend * GRAVITY * l * l / denom, 0.0,
            0.0, 0.0, 0.0, 1.0,
            0.0, -m_pend * l * b / denom, m_pend * GRAVITY * l * (m_cart + m_pend) / denom, 0.0,
        );

        let b_vec = Vector4::new(0.0, (i + m_pend * l * l) / denom, 0.0, m_pend * l / denom);

        (a_mat, b_vec)
    }

    /// State-space matrices, mainly for controller design against the
    /// same model the simulation integrates.
    pub fn matrices(&self) -> (&Matrix4<f64>, &Vector4<f64>) {
        (&self.a, &self.b)
    }
}

impl PlantModel for LinearPlant {
    fn step(&mut self, force: f64) -> PlantOutput {
        self.state += (self.a * self.state + self.b * force) * CONTROL_DT;

        PlantOutput {
            position: self.state[0],
            angle: wrap_angle(-(self.state[2] + std::f64::consts::PI)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::NonlinearPlant;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn exact_initial(theta: f64) -> InitialState {
        InitialState {
            theta,
            theta_jitter: 0.0,
            theta_dot_jitter: 0.0,
            seed: 1,
        }
    }

    #[test]
    fn test_matrix_entries() {
        let params = PlantParams {
            cart_mass: 0.5,
            pendulum_mass: 0.2,
            length: 0.3,
            friction: 0.1,
            damping: 0.0,
        };
        let plant = LinearPlant::new(params.clone(), &exact_initial(0.0));
        let (a, b) = plant.matrices();

        let denom = MOMENT_OF_INERTIA * 0.7 + 0.5 * 0.2 * 0.3 * 0.3;
        assert_relative_eq!(a[(1, 1)], -(MOMENT_OF_INERTIA + 0.2 * 0.09) * 0.1 / denom);
        assert_relative_eq!(a[(3, 2)], 0.2 * GRAVITY * 0.3 * 0.7 / denom);
        assert_relative_eq!(b[1], (MOMENT_OF_INERTIA + 0.2 * 0.09) / denom);
        assert_relative_eq!(b[3], 0.2 * 0.3 / denom);
    }

    #[test]
    fn test_upright_publishes_pi() {
        let mut plant = LinearPlant::new(PlantParams::default(), &exact_initial(0.0));
        let out = plant.step(0.0);
        assert_relative_eq!(out.angle, PI, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_always_wrapped() {
        // Uncontrolled, the linear model diverges exponentially; the
        // published angle must stay wrapped regardless
        let mut plant = LinearPlant::new(PlantParams::default(), &InitialState::default());
        for _ in 0..200 {
            let out = plant.step(0.0);
            assert!((0.0..2.0 * PI).contains(&out.angle));
        }
    }

    #[test]
    fn test_divergence_direction_matches_nonlinear_model() {
        // Both models must publish the same convention: starting slightly
        // counter-clockwise of upright, the published angle grows in both.
        let theta0 = 0.02;
        let mut linear = LinearPlant::new(PlantParams::default(), &exact_initial(theta0));
        let mut nonlinear = NonlinearPlant::at_rest(PlantParams::default(), theta0);

        let mut lin_out = linear.step(0.0);
        let mut non_out = nonlinear.step(0.0);
        for _ in 0..30 {
            lin_out = linear.step(0.0);
            non_out = nonlinear.step(0.0);
        }

        assert!(lin_out.angle > PI + theta0);
        assert!(non_out.angle > PI + theta0);
    }

    #[test]
    fn test_force_moves_cart_positive() {
        let mut plant = LinearPlant::new(PlantParams::default(), &exact_initial(0.0));
        let mut out = plant.step(1.0);
        for _ in 0..20 {
            out = plant.step(1.0);
        }
        assert!(out.position > 0.0);
    }
}
