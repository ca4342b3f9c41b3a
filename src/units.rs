// src/units.rs

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassUnit {
    pub name: &'static str,
    pub grams: f64,
}

pub const TROY_OUNCE: MassUnit = MassUnit {
    name: "oz",
    grams: 31.1034768,
};

/// Traditional retail unit for gold and silver.
pub const DON: MassUnit = MassUnit {
    name: "don",
    grams: 3.75,
};

/// Rescale a price quoted per `from` into a price per `to`.
pub fn convert_price(price: f64, from: MassUnit, to: MassUnit) -> f64 {
    price / from.grams * to.grams
}

pub fn to_local(price: f64, fx_rate: f64) -> f64 {
    price * fx_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAM: MassUnit = MassUnit {
        name: "g",
        grams: 1.0,
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn ounce_to_don_and_back() {
        for price in [0.0, 1.0, 2034.7, 23.119, 1e6] {
            let per_don = convert_price(price, TROY_OUNCE, DON);
            let back = convert_price(per_don, DON, TROY_OUNCE);
            assert!(close(price, back), "{price} -> {per_don} -> {back}");
        }
    }

    #[test]
    fn gram_price_scales_to_ounce_price() {
        assert!(close(convert_price(1.0, GRAM, TROY_OUNCE), 31.1034768));
    }

    #[test]
    fn don_price_from_ounce_price() {
        // 2000 USD/oz -> 2000 / 31.1034768 * 3.75
        let per_don = convert_price(2000.0, TROY_OUNCE, DON);
        assert!(close(per_don, 241.130_599_264_709_8));
        assert!(close(to_local(per_don, 1300.0), per_don * 1300.0));
    }
}
