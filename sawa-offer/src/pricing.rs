use serde::{Deserialize, Serialize};

use crate::models::{OfferError, PriceBreakdown, MAX_PRICE_CENTS};

/// Marketplace fees applied on top of a host's base price, in basis points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeSchedule {
    pub platform_fee_bps: u32,
    /// Only charged when the host belongs to an office
    pub office_fee_bps: u32,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_fee_bps: 1000,
            office_fee_bps: 500,
        }
    }
}

impl FeeSchedule {
    pub fn new(platform_fee_bps: u32, office_fee_bps: u32) -> Self {
        Self { platform_fee_bps, office_fee_bps }
    }

    /// Split a base price (cents) into the breakdown the traveler sees.
    /// Bases outside `1..=MAX_PRICE_CENTS`, or fees that would overflow,
    /// are rejected.
    pub fn breakdown(&self, base: i64, has_office: bool) -> Result<PriceBreakdown, OfferError> {
        if base <= 0 {
            return Err(OfferError::Invalid("offer price must be positive".to_string()));
        }
        if base > MAX_PRICE_CENTS {
            return Err(OfferError::Invalid(format!("offer price exceeds {} cents", MAX_PRICE_CENTS)));
        }

        let office_fee = if has_office { apply_bps(base, self.office_fee_bps) } else { Some(0) };
        let breakdown = PriceBreakdown {
            base,
            platform_fee: apply_bps(base, self.platform_fee_bps).ok_or_else(fee_overflow)?,
            office_fee: office_fee.ok_or_else(fee_overflow)?,
        };
        breakdown.total().ok_or_else(fee_overflow)?;
        Ok(breakdown)
    }
}

fn fee_overflow() -> OfferError {
    OfferError::Invalid("fees overflow the offer price".to_string())
}

/// Half-up rounding to the cent. `None` when the fee does not fit in i64.
fn apply_bps(amount: i64, bps: u32) -> Option<i64> {
    if amount <= 0 || bps == 0 {
        return Some(0);
    }
    let fee = (i128::from(amount) * i128::from(bps) + 5_000) / 10_000;
    i64::try_from(fee).ok()
}
