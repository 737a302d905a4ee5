//! Built-in statutory defaults.

use rust_decimal::Decimal;

use crate::models::{Money, StatutoryParameters, TaxBand};

impl StatutoryParameters {
    /// Kenyan monthly statutory parameters.
    ///
    /// - PAYE: 10% to 24,000; 25% to 32,333.33; 30% to 500,000;
    ///   32.5% to 800,000; 35% above
    /// - Personal relief: 2,400 per month
    /// - NSSF: 6% employee and 6% employer, tier 1 to 6,000, tier 2 to 18,000
    /// - Housing levy (NHDF): 1.5% of gross
    /// - SHA: 2.75% of gross
    ///
    /// `config/ke/statutory_defaults.yaml` ships the same values.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{Money, StatutoryParameters};
    ///
    /// let defaults = StatutoryParameters::kenya();
    /// assert_eq!(defaults.paye_bands.len(), 5);
    /// assert_eq!(defaults.personal_relief, Money::from_whole(2_400));
    /// assert!(defaults.validate().is_ok());
    /// ```
    pub fn kenya() -> Self {
        Self {
            paye_bands: vec![
                TaxBand::up_to(Money::from_whole(24_000), Decimal::new(10, 2), "10%"),
                TaxBand::up_to(Money::from_minor(3_233_333), Decimal::new(25, 2), "25%"),
                TaxBand::up_to(Money::from_whole(500_000), Decimal::new(30, 2), "30%"),
                TaxBand::up_to(Money::from_whole(800_000), Decimal::new(325, 3), "32.5%"),
                TaxBand::unbounded(Decimal::new(35, 2), "35%"),
            ],
            personal_relief: Money::from_whole(2_400),
            nssf_employee_rate: Decimal::new(6, 2),
            nssf_employer_rate: Decimal::new(6, 2),
            nssf_employee_tier2_rate: None,
            nssf_employer_tier2_rate: None,
            nssf_tier1_limit: Money::from_whole(6_000),
            nssf_tier2_limit: Money::from_whole(18_000),
            nhdf_rate: Decimal::new(15, 3),
            sha_rate: Decimal::new(275, 4),
        }
    }
}
