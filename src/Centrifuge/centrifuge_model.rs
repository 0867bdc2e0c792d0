//! # Centrifuge Model Module
//!
//! ## Aim
//! Separative power of a single gas centrifuge as a function of its cut, computed with the
//! Ratz equation in the form given by Glaser (Science & Global Security, 2008).
//!
//! ## Main Data Structures
//! - `CentrifugeSpec`: physical and operating parameters of one machine type (immutable)
//! - `CentrifugeModel`: cheap-to-clone handle sharing one `CentrifugeSpec` between all stages
//!
//! ## Nomenclature
//!
//! | Symbol | Field | Units |
//! |--------|-------|-------|
//! | `v_a` | peripheral_velocity | m/s |
//! | `Z` | height | m |
//! | `d` | diameter | m |
//! | `F` | feed_rate (UF6) | kg/s |
//! | `T` | temperature | K |
//! | `M` | gas_molar_mass | kg/mol |
//! | `dM` | molar_mass_diff | kg/mol |
//! | `x` | pressure_ratio (wall/axis) | - |
//! | `L` | internal_flow_ratio | - |
//! | `ρD` | diffusion_coefficient | kg/(m·s) |
//!
//! ## Ratz equation
//! ```text
//! dU = F_U·eff·θ(1-θ)/2·C_therm²·C_scale·[(1+L)/θ·(1-exp(-A_p·Z_p)) + L/(1-θ)·(1-exp(-A_w·(Z-Z_p)))]²
//! ```
//! with `F_U = F·M_238/M` the elemental uranium feed and `Z_p` the feed injection height.
//! The result is positive and unimodal in the cut θ.
use crate::cascade_errors::{CascadeError, CascadeResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// Universal gas constant in J/(mol·K)
pub const R_G: f64 = 8.314;
/// Diffusion coefficient times density of UF6, kg/(m·s)
pub const D_RHO: f64 = 2.2e-5;
/// Atomic mass of U-238, kg/mol
pub const M_238: f64 = 0.238;
/// Above this peripheral velocity the radius ratio follows from the pressure ratio
pub const HIGH_SPEED_VELOCITY: f64 = 380.0;
/// Empirical inner/outer withdrawal radius ratio of low-speed machines
pub const LOW_SPEED_RADIUS_RATIO: f64 = 0.534;
/// Heavy-fraction withdrawal radius as a fraction of the rotor radius (0.96-0.99 in service)
pub const WITHDRAWAL_RADIUS_FRACTION: f64 = 0.975;

fn default_diffusion_coefficient() -> f64 {
    D_RHO
}
fn default_gas_constant() -> f64 {
    R_G
}
fn default_u238_molar_mass() -> f64 {
    M_238
}

/// Physical and operating parameters of one centrifuge type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentrifugeSpec {
    pub peripheral_velocity: f64,
    pub height: f64,
    pub diameter: f64,
    /// UF6 feed rate of one machine, kg/s
    pub feed_rate: f64,
    pub temperature: f64,
    pub efficiency: f64,
    pub gas_molar_mass: f64,
    pub molar_mass_diff: f64,
    pub pressure_ratio: f64,
    pub internal_flow_ratio: f64,
    #[serde(default = "default_diffusion_coefficient")]
    pub diffusion_coefficient: f64,
    #[serde(default = "default_gas_constant")]
    pub gas_constant: f64,
    #[serde(default = "default_u238_molar_mass")]
    pub u238_molar_mass: f64,
}

impl Default for CentrifugeSpec {
    /// Glaser's reference machine: 485 m/s, 0.5 m long, 15 cm rotor, 15 mg/s of UF6
    fn default() -> Self {
        Self::new(485.0, 0.5, 0.15, 15e-6, 320.0, 1.0, 0.352, 0.003, 1000.0, 2.0)
    }
}

impl CentrifugeSpec {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        peripheral_velocity: f64,
        height: f64,
        diameter: f64,
        feed_rate: f64,
        temperature: f64,
        efficiency: f64,
        gas_molar_mass: f64,
        molar_mass_diff: f64,
        pressure_ratio: f64,
        internal_flow_ratio: f64,
    ) -> Self {
        Self {
            peripheral_velocity,
            height,
            diameter,
            feed_rate,
            temperature,
            efficiency,
            gas_molar_mass,
            molar_mass_diff,
            pressure_ratio,
            internal_flow_ratio,
            diffusion_coefficient: D_RHO,
            gas_constant: R_G,
            u238_molar_mass: M_238,
        }
    }

    /// Checks that every parameter is finite and positive and that the machine
    /// geometry gives a real withdrawal radius ratio
    pub fn validate(&self) -> CascadeResult<()> {
        let fields = [
            ("peripheral_velocity", self.peripheral_velocity),
            ("height", self.height),
            ("diameter", self.diameter),
            ("feed_rate", self.feed_rate),
            ("temperature", self.temperature),
            ("efficiency", self.efficiency),
            ("gas_molar_mass", self.gas_molar_mass),
            ("molar_mass_diff", self.molar_mass_diff),
            ("pressure_ratio", self.pressure_ratio),
            ("internal_flow_ratio", self.internal_flow_ratio),
            ("diffusion_coefficient", self.diffusion_coefficient),
            ("gas_constant", self.gas_constant),
            ("u238_molar_mass", self.u238_molar_mass),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CascadeError::InvalidParameter(format!(
                    "centrifuge {} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if self.pressure_ratio <= 1.0 {
            return Err(CascadeError::InvalidParameter(format!(
                "pressure ratio must exceed 1, got {}",
                self.pressure_ratio
            )));
        }
        let ratio = self.radius_ratio();
        if !(ratio.is_finite() && ratio > 0.0 && ratio < 1.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "withdrawal radius ratio r1/r2 = {} is not in (0,1): pressure ratio too high for v_a = {} m/s",
                ratio, self.peripheral_velocity
            )));
        }
        Ok(())
    }

    /// Fraction of the UF6 mass carried by uranium
    pub fn uranium_mass_fraction(&self) -> f64 {
        self.u238_molar_mass / self.gas_molar_mass
    }

    /// Machine feed converted to elemental uranium, kg/s
    pub fn uranium_feed(&self) -> f64 {
        self.feed_rate * self.uranium_mass_fraction()
    }

    /// r1/r2, ratio of the light-fraction to the heavy-fraction withdrawal radius
    pub fn radius_ratio(&self) -> f64 {
        if self.peripheral_velocity > HIGH_SPEED_VELOCITY {
            let v2 = self.peripheral_velocity.powi(2);
            (1.0 - 2.0 * self.gas_constant * self.temperature * self.pressure_ratio.ln()
                / self.gas_molar_mass
                / v2)
                .sqrt()
        } else {
            LOW_SPEED_RADIUS_RATIO
        }
    }

    /// C_therm = dM·v_a²/(2RT)
    pub fn thermal_term(&self) -> f64 {
        self.molar_mass_diff * self.peripheral_velocity.powi(2)
            / (2.0 * self.gas_constant * self.temperature)
    }

    /// Vertical position of the feed injection point for a given cut
    pub fn feed_height(&self, cut: f64) -> f64 {
        let l = self.internal_flow_ratio;
        self.height * (1.0 - cut) * (1.0 + l) / (1.0 - cut + l)
    }
}

/// Separative power model of one machine type. Cloning shares the same spec.
#[derive(Debug, Clone, PartialEq)]
pub struct CentrifugeModel {
    spec: Arc<CentrifugeSpec>,
}

impl CentrifugeModel {
    /// Validates the machine parameters and wraps them for sharing between stages
    pub fn new(spec: CentrifugeSpec) -> CascadeResult<Self> {
        spec.validate()?;
        Ok(Self {
            spec: Arc::new(spec),
        })
    }

    pub fn spec(&self) -> &CentrifugeSpec {
        &self.spec
    }

    /// Separative power dU of one machine operated at `cut`, kg·SWU/s
    pub fn compute_separative_power(&self, cut: f64) -> CascadeResult<f64> {
        if !(cut > 0.0 && cut < 1.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "cut must lie in (0,1), got {}",
                cut
            )));
        }
        let s = &*self.spec;
        let l = s.internal_flow_ratio;

        let a = s.diameter / 2.0;
        let r_2 = WITHDRAWAL_RADIUS_FRACTION * a;
        let r_12 = s.radius_ratio();
        let r_1 = r_2 * r_12;

        let z_p = s.feed_height(cut);
        let feed_u = s.uranium_feed();

        // Glaser eq. 11: axial decay lengths of the enriching and stripping sections
        let c1 = 2.0 * PI * (s.diffusion_coefficient * s.uranium_mass_fraction()) / (r_2 / r_1).ln();
        let a_p = c1 / feed_u * (cut / ((1.0 + l) * (1.0 - cut + l)));
        let a_w = c1 / feed_u * ((1.0 - cut) / (l * (1.0 - cut + l)));

        let c_therm = s.thermal_term();
        let c_scale = (r_2 / a).powi(4) * (1.0 - r_12.powi(2)).powi(2);

        let enriching = (1.0 + l) / cut * (1.0 - (-a_p * z_p).exp());
        let stripping = l / (1.0 - cut) * (1.0 - (-a_w * (s.height - z_p)).exp());

        let major_term =
            0.5 * cut * (1.0 - cut) * c_therm.powi(2) * c_scale * (enriching + stripping).powi(2);
        let delta_u = feed_u * major_term * s.efficiency;

        if !delta_u.is_finite() || delta_u <= 0.0 {
            return Err(CascadeError::InvalidParameter(format!(
                "separative power at cut {} is not a positive number: {}",
                cut, delta_u
            )));
        }
        Ok(delta_u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_machine_separative_power() {
        let model = CentrifugeModel::new(CentrifugeSpec::default()).unwrap();
        let du = model.compute_separative_power(0.5).unwrap();
        assert_relative_eq!(du, 8.638345e-08, max_relative = 1e-6);
    }

    #[test]
    fn test_separative_power_positive_and_unimodal() {
        let model = CentrifugeModel::new(CentrifugeSpec::default()).unwrap();
        let grid: Vec<f64> = (2..99).map(|i| i as f64 / 100.0).collect();
        let values: Vec<f64> = grid
            .iter()
            .map(|&cut| model.compute_separative_power(cut).unwrap())
            .collect();
        assert!(values.iter().all(|&v| v > 0.0));

        let (i_max, _) = values
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        let cut_max = grid[i_max];
        assert!(cut_max > 0.4 && cut_max < 0.7, "maximum at cut {}", cut_max);
        for i in 0..i_max {
            assert!(values[i] < values[i + 1]);
        }
        for i in i_max..values.len() - 1 {
            assert!(values[i] > values[i + 1]);
        }
    }

    #[test]
    fn test_low_speed_regime_uses_empirical_radius_ratio() {
        let mut spec = CentrifugeSpec::default();
        spec.peripheral_velocity = 300.0;
        assert_eq!(spec.radius_ratio(), LOW_SPEED_RADIUS_RATIO);
        let model = CentrifugeModel::new(spec).unwrap();
        let du = model.compute_separative_power(0.5).unwrap();
        assert!(du > 0.0);
        let fast = CentrifugeModel::new(CentrifugeSpec::default()).unwrap();
        assert!(du < fast.compute_separative_power(0.5).unwrap());
    }

    #[test]
    fn test_invalid_cut_rejected() {
        let model = CentrifugeModel::new(CentrifugeSpec::default()).unwrap();
        for cut in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            match model.compute_separative_power(cut) {
                Err(CascadeError::InvalidParameter(_)) => {}
                other => panic!("expected InvalidParameter for cut {}, got {:?}", cut, other),
            }
        }
    }

    #[test]
    fn test_invalid_spec_rejected() {
        let mut spec = CentrifugeSpec::default();
        spec.temperature = -1.0;
        assert!(matches!(
            CentrifugeModel::new(spec),
            Err(CascadeError::InvalidParameter(_))
        ));

        let mut spec = CentrifugeSpec::default();
        spec.pressure_ratio = 1e30;
        assert!(matches!(
            CentrifugeModel::new(spec),
            Err(CascadeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_spec_from_json_uses_default_constants() {
        let json = r#"{
            "peripheral_velocity": 485.0, "height": 0.5, "diameter": 0.15,
            "feed_rate": 1.5e-5, "temperature": 320.0, "efficiency": 1.0,
            "gas_molar_mass": 0.352, "molar_mass_diff": 0.003,
            "pressure_ratio": 1000.0, "internal_flow_ratio": 2.0
        }"#;
        let spec: CentrifugeSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec, CentrifugeSpec::default());
    }
}
