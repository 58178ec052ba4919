//! Static controller registry
//!
//! Maps a controller-name tag to a constructor and a declared parameter
//! schema, resolved at start time. The embedding configuration layer
//! enumerates [`catalog`] to present tuning fields and calls
//! [`stabilizer_from_params`] with the values the user entered; typed
//! callers go straight through [`build_stabilizer`] / [`build_swingup`].

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{
    CascadedConfig, ControllerConfig, LqrGains, PidGains, PlantParams, SwingUpConfig,
    SwingUpStrategy,
};

use super::{
    CascadedPidController, ControlLaw, EnergySwingUp, LqrController, PhaseSwingUp, PidController,
};

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown controller tag `{0}`")]
    UnknownController(String),
    #[error("controller `{tag}` has no parameter `{name}`")]
    UnknownParameter { tag: String, name: String },
    #[error("parameter `{name}` = {value} outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Declared type of a tunable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Float,
    Integer,
}

/// One tunable parameter of a controller
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    /// Accepted closed range
    pub min: f64,
    pub max: f64,
}

const fn gain(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        ty: ParamType::Float,
        min: -10_000.0,
        max: 10_000.0,
    }
}

/// One registered controller
#[derive(Debug, Clone, Copy)]
pub struct ControllerSpec {
    pub tag: &'static str,
    pub summary: &'static str,
    pub params: &'static [ParamSpec],
}

/// The static plugin table.
///
/// Tags are stable identifiers; they double as the serde tag of
/// [`ControllerConfig`] and the [`ControlLaw::name`] of the built law.
pub const CATALOG: &[ControllerSpec] = &[
    ControllerSpec {
        tag: "pid",
        summary: "Single-loop PID on the pendulum angle",
        params: &[gain("kp"), gain("ki"), gain("kd")],
    },
    ControllerSpec {
        tag: "cascaded_pid",
        summary: "Outer position loop commanding an inner angle loop",
        params: &[
            gain("outer_kp"),
            gain("outer_ki"),
            gain("outer_kd"),
            gain("inner_kp"),
            gain("inner_ki"),
            gain("inner_kd"),
        ],
    },
    ControllerSpec {
        tag: "lqr",
        summary: "Full-state feedback with finite-difference velocities",
        params: &[
            gain("k_x"),
            gain("k_x_dot"),
            gain("k_theta"),
            gain("k_theta_dot"),
        ],
    },
    ControllerSpec {
        tag: "energy_swingup",
        summary: "Energy-shaping swing-up stage",
        params: &[
            ParamSpec {
                name: "catch_angle",
                ty: ParamType::Float,
                min: 0.0,
                max: std::f64::consts::PI,
            },
            ParamSpec {
                name: "catch_momentum",
                ty: ParamType::Float,
                min: 0.0,
                max: 100.0,
            },
        ],
    },
    ControllerSpec {
        tag: "phase_swingup",
        summary: "Bang-bang quadrant-pumping swing-up stage",
        params: &[
            ParamSpec {
                name: "catch_angle",
                ty: ParamType::Float,
                min: 0.0,
                max: std::f64::consts::PI,
            },
            ParamSpec {
                name: "catch_momentum",
                ty: ParamType::Float,
                min: 0.0,
                max: 100.0,
            },
        ],
    },
];

/// All registered controllers, for configuration UIs
pub fn catalog() -> &'static [ControllerSpec] {
    CATALOG
}

/// Look up one registered controller by tag
pub fn find(tag: &str) -> Option<&'static ControllerSpec> {
    CATALOG.iter().find(|spec| spec.tag == tag)
}

/// Build the stabilizing control law selected by a typed configuration.
pub fn build_stabilizer(config: &ControllerConfig) -> Box<dyn ControlLaw> {
    match config {
        ControllerConfig::Pid(gains) => Box::new(PidController::new(*gains)),
        ControllerConfig::CascadedPid(config) => {
            Box::new(CascadedPidController::new(config.clone()))
        }
        ControllerConfig::Lqr(gains) => Box::new(LqrController::new(*gains)),
    }
}

/// Build the selected swing-up stage.
pub fn build_swingup(config: &SwingUpConfig, plant: &PlantParams, dt: f64) -> Box<dyn ControlLaw> {
    match config.strategy {
        SwingUpStrategy::Energy => Box::new(EnergySwingUp::new(config.clone(), plant)),
        SwingUpStrategy::Phase => Box::new(PhaseSwingUp::new(config.clone(), dt)),
    }
}

/// Resolve a tag plus named parameter values into a typed configuration,
/// validating every value against the declared schema. Parameters not
/// supplied keep the variant defaults.
pub fn stabilizer_from_params(
    tag: &str,
    params: &HashMap<String, f64>,
) -> Result<ControllerConfig, RegistryError> {
    let spec = find(tag).ok_or_else(|| RegistryError::UnknownController(tag.into()))?;

    for (name, &value) in params {
        let declared = spec
            .params
            .iter()
            .find(|p| p.name == name.as_str())
            .ok_or_else(|| RegistryError::UnknownParameter {
                tag: tag.into(),
                name: name.clone(),
            })?;
        if value < declared.min || value > declared.max {
            return Err(RegistryError::OutOfRange {
                name: name.clone(),
                value,
                min: declared.min,
                max: declared.max,
            });
        }
    }

    let get = |name: &str, default: f64| params.get(name).copied().unwrap_or(default);

    match tag {
        "pid" => {
            let defaults = PidGains::default();
            Ok(ControllerConfig::Pid(PidGains {
                kp: get("kp", defaults.kp),
                ki: get("ki", defaults.ki),
                kd: get("kd", defaults.kd),
            }))
        }
        "cascaded_pid" => {
            let defaults = CascadedConfig::default();
            Ok(ControllerConfig::CascadedPid(CascadedConfig {
                outer: PidGains {
                    kp: get("outer_kp", defaults.outer.kp),
                    ki: get("outer_ki", defaults.outer.ki),
                    kd: get("outer_kd", defaults.outer.kd),
                },
                inner: PidGains {
                    kp: get("inner_kp", defaults.inner.kp),
                    ki: get("inner_ki", defaults.inner.ki),
                    kd: get("inner_kd", defaults.inner.kd),
                },
                ..defaults
            }))
        }
        "lqr" => {
            let defaults = LqrGains::default();
            Ok(ControllerConfig::Lqr(LqrGains {
                k_x: get("k_x", defaults.k_x),
                k_x_dot: get("k_x_dot", defaults.k_x_dot),
                k_theta: get("k_theta", defaults.k_theta),
                k_theta_dot: get("k_theta_dot", defaults.k_theta_dot),
            }))
        }
        // Swing-up stages are selected via SwingUpConfig, not as stabilizers
        _ => Err(RegistryError::UnknownController(tag.into())),
    }
}
