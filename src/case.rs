//! Load case identity
//!
//! A case is identified by its name, its material and load parameters and
//! the checksums of the input files it was built from. The identity hashes
//! to a UUID v5 that keys the result cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LinResult;

/// Plastic hardening model applied when the case was solved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PlasticityModel {
    /// Linear elastic, no yield
    Elastic,
    /// Bilinear isotropic hardening
    Bilinear { yield_strength: f64, tangent_modulus: f64 },
    /// Nonlinear isotropic hardening, `sigma = sigma_y * (E eps / sigma_y)^n`
    PowerLaw { yield_strength: f64, exponent: f64 },
    /// Piecewise-linear true stress / plastic strain table
    Table { points: Vec<(f64, f64)> },
}

impl Default for PlasticityModel {
    fn default() -> Self {
        Self::Elastic
    }
}

impl PlasticityModel {
    /// Short tag used in case names
    pub fn tag(&self) -> String {
        match self {
            Self::Elastic => "el".to_string(),
            Self::Bilinear { yield_strength, tangent_modulus } => format!(
                "y{}_t{}",
                format_identifier(*yield_strength),
                format_identifier(*tangent_modulus)
            ),
            Self::PowerLaw { yield_strength, exponent } => format!(
                "y{}_n{}",
                format_identifier(*yield_strength),
                format_identifier(*exponent)
            ),
            Self::Table { points } => format!("tab{}", points.len()),
        }
    }
}

/// Named scalar inputs of one case, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseParameters {
    #[serde(default)]
    pub values: Vec<(String, f64)>,
    #[serde(default)]
    pub plasticity: PlasticityModel,
}

impl CaseParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or overwrite a named parameter
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn with_plasticity(mut self, plasticity: PlasticityModel) -> Self {
        self.plasticity = plasticity;
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    /// Human-readable name such as `e200e5_p150e-1_el`
    pub fn identifier(&self) -> String {
        let mut parts: Vec<String> = self
            .values
            .iter()
            .map(|(n, v)| format!("{}{}", n, format_identifier(*v)))
            .collect();
        parts.push(self.plasticity.tag());
        parts.join("_")
    }
}

/// Everything that determines one case's linearized result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseIdentity {
    pub name: String,
    pub parameters: CaseParameters,
    /// Input file label to content checksum
    pub checksums: BTreeMap<String, Uuid>,
}

impl CaseIdentity {
    pub fn new(name: impl Into<String>, parameters: CaseParameters) -> Self {
        Self {
            name: name.into(),
            parameters,
            checksums: BTreeMap::new(),
        }
    }

    /// Record the checksum of an input file under `label`
    pub fn with_file(mut self, label: impl Into<String>, path: impl AsRef<Path>) -> LinResult<Self> {
        self.checksums.insert(label.into(), file_checksum(path)?);
        Ok(self)
    }

    pub fn with_checksum(mut self, label: impl Into<String>, checksum: Uuid) -> Self {
        self.checksums.insert(label.into(), checksum);
        self
    }

    /// Deterministic content hash over the canonical JSON of the identity
    pub fn hash(&self) -> LinResult<Uuid> {
        let canonical = serde_json::to_vec(self)?;
        Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &canonical))
    }
}

/// Read case name to parameters from a JSON object such as
/// `{"w1": {"values": [["e", 200000.0]], "plasticity": {"model": "elastic"}}}`
pub fn read_case_parameters(path: impl AsRef<Path>) -> LinResult<BTreeMap<String, CaseParameters>> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

/// Content checksum of a file
pub fn file_checksum(path: impl AsRef<Path>) -> LinResult<Uuid> {
    let bytes = fs::read(path.as_ref())?;
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &bytes))
}

/// Three significant digits followed by the decimal exponent of `x`
///
/// The sign is dropped and the exponent is written as a plain integer, so
/// zero maps to `"0e0"`, `200000.0` to `"200e5"` and `2.5e-5` to `"250e-5"`.
pub fn format_identifier(x: f64) -> String {
    if x == 0.0 {
        return "0e0".to_string();
    }
    if !x.is_finite() {
        return format!("{}", x.abs());
    }
    let formatted = format!("{:.10e}", x.abs());
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).take(3).collect();
    format!("{digits}e{exponent}")
}
