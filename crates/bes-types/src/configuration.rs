//! Device configurations and the tunable parameter space.
//!
//! A [`Configuration`] describes one bioelectrochemical device setup:
//! immutable identity/descriptor fields (what the device is built from) plus
//! the five continuous [`OperatingParameters`] the optimizer is allowed to
//! move. [`ParameterSpace`] declares the `[min, max]` bounds for each tunable
//! and is the single place bounds are enforced.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of bioelectrochemical system being modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemType {
    #[serde(rename = "MFC")]
    MicrobialFuelCell,
    #[serde(rename = "MEC")]
    MicrobialElectrolysisCell,
    #[serde(rename = "MDC")]
    MicrobialDesalinationCell,
}

impl Default for SystemType {
    fn default() -> Self {
        Self::MicrobialFuelCell
    }
}

/// One of the five continuous parameters the optimizer may adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TunableParam {
    /// Operating temperature, °C.
    Temperature,
    /// Anolyte pH.
    Ph,
    /// Substrate concentration, g/L.
    SubstrateConcentration,
    /// Feed flow rate, mL/min.
    FlowRate,
    /// External electrical load, Ω.
    ExternalLoad,
}

impl TunableParam {
    /// All tunable parameters in their canonical order.
    ///
    /// This order is load-bearing: single-point crossover and parameter
    /// snapshots both iterate it, so it must stay stable.
    pub const ALL: [TunableParam; 5] = [
        TunableParam::Temperature,
        TunableParam::Ph,
        TunableParam::SubstrateConcentration,
        TunableParam::FlowRate,
        TunableParam::ExternalLoad,
    ];
}

impl std::fmt::Display for TunableParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Temperature => "temperature",
            Self::Ph => "ph",
            Self::SubstrateConcentration => "substrateConcentration",
            Self::FlowRate => "flowRate",
            Self::ExternalLoad => "externalLoad",
        };
        write!(f, "{name}")
    }
}

/// The mutable record of the five tunables carried by every [`Configuration`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingParameters {
    pub temperature: f64,
    pub ph: f64,
    pub substrate_concentration: f64,
    pub flow_rate: f64,
    pub external_load: f64,
}

impl OperatingParameters {
    pub fn get(&self, param: TunableParam) -> f64 {
        match param {
            TunableParam::Temperature => self.temperature,
            TunableParam::Ph => self.ph,
            TunableParam::SubstrateConcentration => self.substrate_concentration,
            TunableParam::FlowRate => self.flow_rate,
            TunableParam::ExternalLoad => self.external_load,
        }
    }

    pub fn set(&mut self, param: TunableParam, value: f64) {
        match param {
            TunableParam::Temperature => self.temperature = value,
            TunableParam::Ph => self.ph = value,
            TunableParam::SubstrateConcentration => self.substrate_concentration = value,
            TunableParam::FlowRate => self.flow_rate = value,
            TunableParam::ExternalLoad => self.external_load = value,
        }
    }
}

impl Default for OperatingParameters {
    fn default() -> Self {
        Self {
            temperature: 30.0,
            ph: 7.0,
            substrate_concentration: 1.0,
            flow_rate: 2.0,
            external_load: 100.0,
        }
    }
}

/// Inclusive `[min, max]` bounds for a single tunable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub min: f64,
    pub max: f64,
}

impl ParameterBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Declared bounds for every tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpace {
    pub temperature: ParameterBounds,
    pub ph: ParameterBounds,
    pub substrate_concentration: ParameterBounds,
    pub flow_rate: ParameterBounds,
    pub external_load: ParameterBounds,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self {
            temperature: ParameterBounds::new(15.0, 45.0),
            ph: ParameterBounds::new(5.5, 8.5),
            substrate_concentration: ParameterBounds::new(0.1, 5.0),
            flow_rate: ParameterBounds::new(0.1, 10.0),
            external_load: ParameterBounds::new(10.0, 1000.0),
        }
    }
}

impl ParameterSpace {
    pub fn bounds(&self, param: TunableParam) -> ParameterBounds {
        match param {
            TunableParam::Temperature => self.temperature,
            TunableParam::Ph => self.ph,
            TunableParam::SubstrateConcentration => self.substrate_concentration,
            TunableParam::FlowRate => self.flow_rate,
            TunableParam::ExternalLoad => self.external_load,
        }
    }

    /// Width of the declared range for `param`.
    pub fn range(&self, param: TunableParam) -> f64 {
        self.bounds(param).range()
    }

    /// Clamp `value` into the declared bounds for `param`.
    pub fn clip(&self, param: TunableParam, value: f64) -> f64 {
        self.bounds(param).clip(value)
    }

    /// Draw a full parameter set uniformly within bounds.
    pub fn sample(&self, rng: &mut impl Rng) -> OperatingParameters {
        let mut params = OperatingParameters::default();
        for param in TunableParam::ALL {
            let b = self.bounds(param);
            params.set(param, rng.random_range(b.min..=b.max));
        }
        params
    }

    /// True when every tunable in `params` lies within its declared bounds.
    pub fn contains(&self, params: &OperatingParameters) -> bool {
        TunableParam::ALL
            .iter()
            .all(|&p| self.bounds(p).contains(params.get(p)))
    }
}

/// A complete device configuration: descriptors plus tunables.
///
/// Only `parameters` ever changes during optimization; all descriptor fields
/// are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub id: Uuid,
    pub name: String,
    pub system_type: SystemType,
    pub anode_material: String,
    pub cathode_material: String,
    pub membrane_type: String,
    pub microbial_species: String,
    pub substrate_type: String,
    pub parameters: OperatingParameters,
}

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            system_type: SystemType::default(),
            anode_material: "carbon felt".to_string(),
            cathode_material: "carbon cloth".to_string(),
            membrane_type: "Nafion".to_string(),
            microbial_species: "Geobacter sulfurreducens".to_string(),
            substrate_type: "acetate".to_string(),
            parameters: OperatingParameters::default(),
        }
    }

    pub fn with_system_type(mut self, system_type: SystemType) -> Self {
        self.system_type = system_type;
        self
    }

    pub fn with_parameters(mut self, parameters: OperatingParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Clone this configuration with all tunables redrawn uniformly in bounds.
    ///
    /// Descriptor fields are preserved — only the operating point moves.
    pub fn redrawn(&self, space: &ParameterSpace, rng: &mut impl Rng) -> Self {
        let mut clone = self.clone();
        clone.parameters = space.sample(rng);
        clone
    }
}
