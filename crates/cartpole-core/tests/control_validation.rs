//! Control validation tests
//!
//! End-to-end properties of the control engine:
//! 1. The published angle convention holds across both plant models
//! 2. Stabilizing controllers hold the simulated pendulum upright
//! 3. Swing-up pumping raises the swing amplitude from a hanging start
//! 4. The supervisor handoff obeys the hysteresis window

use approx::assert_relative_eq;
use std::f64::consts::PI;

use cartpole_core::config::{
    CascadedConfig, InitialState, PidGains, PlantParams, SwingUpConfig, SwingUpStrategy,
};
use cartpole_core::control::{
    CascadedPidController, ControlLaw, EnergySwingUp, Measurement, PhaseSwingUp, PidController,
};
use cartpole_core::plant::{LinearPlant, NonlinearPlant, PlantModel};
use cartpole_core::swingup::{SupervisorPhase, SwingUpSupervisor};
use cartpole_core::CONTROL_DT;

/// Smallest distance between two wrapped angles
fn angle_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(2.0 * PI);
    diff.min(2.0 * PI - diff)
}

fn exact_initial(theta: f64) -> InitialState {
    InitialState {
        theta,
        theta_jitter: 0.0,
        theta_dot_jitter: 0.0,
        seed: 1,
    }
}

mod angle_convention {
    use super::*;

    #[test]
    fn test_nonlinear_angle_wrapped_and_continuous() {
        let mut plant = NonlinearPlant::new(PlantParams::default(), &InitialState::default());
        let mut prev = plant.step(0.0).angle;

        for i in 0..2000 {
            let force = if i % 40 < 20 { 2.0 } else { -2.0 };
            let out = plant.step(force);

            assert!((0.0..2.0 * PI).contains(&out.angle));
            // Continuity modulo 2π: one 10 ms tick never jumps half a turn
            assert!(
                angle_distance(out.angle, prev) < 0.5,
                "tick {i}: {prev} -> {}",
                out.angle
            );
            prev = out.angle;
        }
    }

    #[test]
    fn test_linear_angle_wrapped_and_continuous() {
        // Short horizon: the uncontrolled linear model diverges
        // exponentially, but while the small-angle assumption holds the
        // published angle must evolve smoothly
        let mut plant = LinearPlant::new(PlantParams::default(), &exact_initial(0.05));
        let mut prev = plant.step(0.0).angle;

        for _ in 0..50 {
            let out = plant.step(0.0);
            assert!((0.0..2.0 * PI).contains(&out.angle));
            assert!(angle_distance(out.angle, prev) < 0.5);
            prev = out.angle;
        }
    }

    #[test]
    fn test_models_agree_near_upright() {
        // Both models start slightly counter-clockwise of upright and must
        // publish angles drifting the same way for the first few ticks.
        let theta0 = 0.02;
        let mut linear = LinearPlant::new(PlantParams::default(), &exact_initial(theta0));
        let mut nonlinear = NonlinearPlant::at_rest(PlantParams::default(), theta0);

        for _ in 0..20 {
            let lin = linear.step(0.0).angle;
            let non = nonlinear.step(0.0).angle;
            assert!(lin > PI);
            assert!(non > PI);
            assert!(angle_distance(lin, non) < 0.05);
        }
    }
}

mod stabilization {
    use super::*;

    #[test]
    fn test_pid_holds_nonlinear_plant_upright() {
        let mut plant = NonlinearPlant::at_rest(PlantParams::default(), 0.05);
        let mut pid = PidController::new(PidGains {
            kp: 20.0,
            ki: 0.0,
            kd: 1.0,
        });

        let mut out = plant.step(0.0);
        for _ in 0..1000 {
            let command = pid.tick(
                Measurement {
                    position: out.position,
                    angle: out.angle,
                },
                CONTROL_DT,
            );
            out = plant.step(command.force);
            assert!(
                angle_distance(out.angle, PI) < 0.5,
                "pendulum fell over: angle = {}",
                out.angle
            );
        }

        // After 10 s the deviation has shrunk well below the start offset
        assert!(angle_distance(out.angle, PI) < 0.05);
    }

    #[test]
    fn test_cascaded_holds_upright_and_publishes_setpoint() {
        let mut plant = NonlinearPlant::at_rest(PlantParams::default(), 0.03);
        let mut cascaded = CascadedPidController::new(CascadedConfig::default());
        let five_degrees = 5f64.to_radians();

        let mut out = plant.step(0.0);
        for _ in 0..1000 {
            let command = cascaded.tick(
                Measurement {
                    position: out.position,
                    angle: out.angle,
                },
                CONTROL_DT,
            );

            let desired = command.desired_angle.expect("cascaded always publishes");
            assert!(desired >= PI - five_degrees - 1e-9);
            assert!(desired <= PI + five_degrees + 1e-9);

            out = plant.step(command.force);
            assert!(angle_distance(out.angle, PI) < 0.5);
        }
    }

    #[test]
    fn test_pid_integral_linearity_against_live_clock() {
        // Holding the measurement constant, the integral contribution must
        // grow linearly in tick count
        let mut pid = PidController::new(PidGains {
            kp: 0.0,
            ki: 2.0,
            kd: 0.0,
        });
        let frozen = Measurement {
            position: 0.0,
            angle: PI - 0.1,
        };

        let after_10 = (0..10)
            .map(|_| pid.tick(frozen, CONTROL_DT).force)
            .last()
            .unwrap();
        let after_20 = (0..10)
            .map(|_| pid.tick(frozen, CONTROL_DT).force)
            .last()
            .unwrap();

        assert_relative_eq!(after_20, 2.0 * after_10, epsilon = 1e-9);
    }
}

mod swingup_behavior {
    use super::*;

    #[test]
    fn test_phase_swingup_raises_amplitude_from_hanging() {
        // Hanging start, tiny perturbation so the quadrant logic has a sign
        let mut plant = NonlinearPlant::at_rest(PlantParams::default(), PI - 0.01);
        let config = SwingUpConfig {
            strategy: SwingUpStrategy::Phase,
            ..SwingUpConfig::default()
        };
        let mut law = PhaseSwingUp::new(config, CONTROL_DT);

        let mut out = plant.step(0.0);
        let mut best = angle_distance(out.angle, 0.0);
        for _ in 0..1000 {
            let command = law.tick(
                Measurement {
                    position: out.position,
                    angle: out.angle,
                },
                CONTROL_DT,
            );
            out = plant.step(command.force);
            // Deviation from hanging-down (published angle 0/2π)
            best = best.max(angle_distance(out.angle, 0.0));
        }

        assert!(best > 0.3, "no pumping progress, peak deviation {best}");
    }

    #[test]
    fn test_supervisor_hysteresis_with_oscillating_signal() {
        let config = SwingUpConfig {
            stable_window: 8,
            catch_angle: 0.2,
            catch_momentum: 0.5,
            ..SwingUpConfig::default()
        };
        let swingup = EnergySwingUp::new(config, &PlantParams::default());
        let stabilizer = PidController::new(PidGains::default());
        let mut supervisor = SwingUpSupervisor::new(Box::new(swingup), Box::new(stabilizer));

        // Synthetic signal dipping in and out of the catch window: every
        // 4th tick the angle jumps far away, resetting the counter
        for i in 0..100 {
            let angle = if i % 4 == 0 { PI + 1.5 } else { PI };
            supervisor.tick(
                Measurement {
                    position: 0.0,
                    angle,
                },
                CONTROL_DT,
            );
            assert_eq!(supervisor.phase(), SupervisorPhase::SwingingUp, "tick {i}");
        }

        // A clean settled stretch satisfies the window and hands off
        for _ in 0..12 {
            supervisor.tick(
                Measurement {
                    position: 0.0,
                    angle: PI,
                },
                CONTROL_DT,
            );
        }
        assert_eq!(supervisor.phase(), SupervisorPhase::Stabilizing);
    }

    #[test]
    fn test_energy_swingup_commands_zero_after_catch() {
        let config = SwingUpConfig {
            stable_window: 3,
            ..SwingUpConfig::default()
        };
        let mut law = EnergySwingUp::new(config, &PlantParams::default());

        let settled = Measurement {
            position: 0.0,
            angle: PI,
        };
        let mut last = law.tick(settled, CONTROL_DT);
        for _ in 0..10 {
            last = law.tick(settled, CONTROL_DT);
        }
        assert!(last.handoff);
        assert_eq!(last.force, 0.0);
    }
}
