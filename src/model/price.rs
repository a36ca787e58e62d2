//! Price point normalization shared by the generator, the store and the feeds.

/// Smallest price a point may take. Generated prices are floored here.
pub const MIN_PRICE: f64 = 0.01;

/// Fractional digits kept on every stored price.
pub const PRICE_DECIMALS: i32 = 2;

/// Round to [`PRICE_DECIMALS`] digits.
pub fn round_price(value: f64) -> f64 {
    let scale = 10f64.powi(PRICE_DECIMALS);
    (value * scale).round() / scale
}

/// Floor at [`MIN_PRICE`] and round. Non-finite input collapses to the floor.
pub fn normalize(raw: f64) -> f64 {
    if !raw.is_finite() {
        return MIN_PRICE;
    }
    round_price(raw.max(MIN_PRICE))
}

/// Reason a point cannot enter the series, if any.
pub fn validate(value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("price {} is not finite", value));
    }
    if value < 0.0 {
        return Err(format!("price {} is negative", value));
    }
    Ok(())
}
