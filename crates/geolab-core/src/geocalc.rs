//! Small field-geology calculators. Angles are in degrees.

use crate::error::CalcError;

fn check(name: &'static str, expected: &'static str, value: f64, ok: bool) -> Result<(), CalcError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::OutOfDomain { name, expected, value })
    }
}

fn dip_domain(name: &'static str, deg: f64) -> Result<(), CalcError> {
    check(name, "in (0, 90] degrees", deg, deg > 0.0 && deg <= 90.0)
}

/// True dip from an apparent dip measured `angle_deg` off strike.
pub fn true_dip(apparent_deg: f64, angle_deg: f64) -> Result<f64, CalcError> {
    check("apparent dip", "in [0, 90) degrees", apparent_deg, (0.0..90.0).contains(&apparent_deg))?;
    dip_domain("angle from strike", angle_deg)?;
    let t = apparent_deg.to_radians().tan() / angle_deg.to_radians().sin();
    Ok(t.atan().to_degrees())
}

/// Porosity in percent.
pub fn porosity(pore_volume: f64, total_volume: f64) -> Result<f64, CalcError> {
    check("total volume", "positive", total_volume, total_volume > 0.0)?;
    check(
        "pore volume",
        "between 0 and the total volume",
        pore_volume,
        pore_volume >= 0.0 && pore_volume <= total_volume,
    )?;
    Ok(100.0 * pore_volume / total_volume)
}

pub fn true_thickness(measured: f64, dip_deg: f64) -> Result<f64, CalcError> {
    check("measured thickness", "non-negative", measured, measured >= 0.0)?;
    dip_domain("dip", dip_deg)?;
    Ok(measured * dip_deg.to_radians().sin())
}

/// Slope gradient in percent.
pub fn slope_gradient(rise: f64, run: f64) -> Result<f64, CalcError> {
    check("run", "positive", run, run > 0.0)?;
    check("rise", "finite", rise, true)?;
    Ok(100.0 * rise / run)
}

/// Krumbein phi grain size from a diameter in millimetres.
pub fn phi_from_mm(size_mm: f64) -> Result<f64, CalcError> {
    check("grain size", "positive", size_mm, size_mm > 0.0)?;
    Ok(-size_mm.log2())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn formulas() {
        // Perpendicular to strike the apparent dip is the true dip.
        assert_abs_diff_eq!(true_dip(30.0, 90.0).unwrap(), 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(true_dip(20.0, 30.0).unwrap(), 36.05, epsilon = 0.01);
        assert_abs_diff_eq!(porosity(12.5, 50.0).unwrap(), 25.0, epsilon = 1e-12);
        assert_abs_diff_eq!(true_thickness(10.0, 30.0).unwrap(), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(slope_gradient(-5.0, 50.0).unwrap(), -10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phi_from_mm(0.25).unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phi_from_mm(4.0).unwrap(), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_domain_inputs_are_rejected() {
        assert!(true_dip(30.0, 0.0).is_err());
        assert!(true_dip(30.0, 91.0).is_err());
        assert!(porosity(1.0, 0.0).is_err());
        assert!(porosity(6.0, 5.0).is_err());
        assert!(porosity(-1.0, 5.0).is_err());
        assert!(true_thickness(10.0, 0.0).is_err());
        assert!(slope_gradient(1.0, 0.0).is_err());
        assert!(phi_from_mm(0.0).is_err());
        assert!(phi_from_mm(f64::NAN).is_err());

        let err = porosity(1.0, -2.0).unwrap_err();
        assert_eq!(err.to_string(), "total volume must be positive, got -2");
    }
}
