//! Spray mix calculator.
//!
//! Pure arithmetic over a fixed dosage table; no store access. Available
//! to every role.

use std::fmt;

use crate::error::DomainError;

/// Default water volume when the caller gives none, in liters per hectare.
pub const DEFAULT_WATER_PER_HECTARE: f64 = 200.0;

/// Products with a known dosage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    Glifosato,
    Mancozeb,
    Clorpirifos,
}

impl Product {
    /// Dosage in milliliters of product per hectare.
    pub fn dosage_ml_per_hectare(&self) -> f64 {
        match self {
            Product::Glifosato => 2000.0,
            Product::Mancozeb => 1500.0,
            Product::Clorpirifos => 1000.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Product::Glifosato => "Glifosato",
            Product::Mancozeb => "Mancozeb",
            Product::Clorpirifos => "Clorpirifós",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input to the calculator.
#[derive(Debug, Clone, Copy)]
pub struct MixInput {
    pub product: Product,
    pub hectares: f64,
    /// Liters of water per hectare; defaults to
    /// [`DEFAULT_WATER_PER_HECTARE`] when `None`.
    pub water_per_hectare: Option<f64>,
}

/// The computed mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixPlan {
    pub product: Product,
    pub hectares: f64,
    pub water_per_hectare: f64,
    pub total_water_liters: f64,
    pub total_product_ml: f64,
}

/// Compute the water and product totals for an area.
///
/// Rejects non-finite or non-positive inputs rather than producing a
/// nonsense plan.
pub fn calculate(input: MixInput) -> Result<MixPlan, DomainError> {
    if !input.hectares.is_finite() || input.hectares <= 0.0 {
        return Err(DomainError::Validation(format!(
            "hectares must be a positive number, got {}",
            input.hectares
        )));
    }
    let water_per_hectare = input.water_per_hectare.unwrap_or(DEFAULT_WATER_PER_HECTARE);
    if !water_per_hectare.is_finite() || water_per_hectare <= 0.0 {
        return Err(DomainError::Validation(format!(
            "water per hectare must be a positive number, got {}",
            water_per_hectare
        )));
    }

    Ok(MixPlan {
        product: input.product,
        hectares: input.hectares,
        water_per_hectare,
        total_water_liters: input.hectares * water_per_hectare,
        total_product_ml: input.hectares * input.product.dosage_ml_per_hectare(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_hectares_of_glifosato() {
        let plan = calculate(MixInput {
            product: Product::Glifosato,
            hectares: 10.0,
            water_per_hectare: None,
        })
        .unwrap();
        assert_eq!(plan.total_water_liters, 2000.0);
        assert_eq!(plan.total_product_ml, 20000.0);
        assert_eq!(plan.water_per_hectare, 200.0);
    }

    #[test]
    fn caller_supplied_water_volume_overrides_the_default() {
        let plan = calculate(MixInput {
            product: Product::Mancozeb,
            hectares: 2.0,
            water_per_hectare: Some(150.0),
        })
        .unwrap();
        assert_eq!(plan.total_water_liters, 300.0);
        assert_eq!(plan.total_product_ml, 3000.0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        for hectares in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let result = calculate(MixInput {
                product: Product::Clorpirifos,
                hectares,
                water_per_hectare: None,
            });
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
        let result = calculate(MixInput {
            product: Product::Clorpirifos,
            hectares: 1.0,
            water_per_hectare: Some(0.0),
        });
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
