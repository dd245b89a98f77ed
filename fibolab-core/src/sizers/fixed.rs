//! Fixed Quantity Sizer
//!
//! Trade the same quantity on every entry, regardless of equity or stop.

use super::{PositionSizer, SizingRejected};

#[derive(Debug, Clone)]
pub struct FixedQuantitySizer {
    quantity: f64,
}

impl FixedQuantitySizer {
    pub fn new(quantity: f64) -> Self {
        assert!(quantity > 0.0, "quantity must be > 0");
        Self { quantity }
    }
}

impl PositionSizer for FixedQuantitySizer {
    fn size(&self, equity: f64, _price: f64, _stop_loss: f64) -> Result<f64, SizingRejected> {
        if !(equity > 0.0 && equity.is_finite()) {
            return Err(SizingRejected::NoEquity);
        }
        Ok(self.quantity)
    }

    fn name(&self) -> &str {
        "fixed_quantity"
    }
}
