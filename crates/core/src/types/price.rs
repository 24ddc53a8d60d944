//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are kept exact through every computation. Rounding only happens in
//! [`Price::display`], which is the single place that turns a decimal into
//! something a shopper reads.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupiah, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Indonesian rupiah, the storefront's display currency.
    #[must_use]
    pub const fn idr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::IDR)
    }

    /// Format for display (e.g., "Rp 1.500.000" or "$19.99").
    ///
    /// Rounds half away from zero to the currency's minor-unit precision.
    #[must_use]
    pub fn display(&self) -> String {
        let code = self.currency_code;
        let mut rounded = self
            .amount
            .round_dp_with_strategy(code.fraction_digits(), RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(code.fraction_digits());

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let text = rounded.abs().to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let mut out = format!(
            "{sign}{}{}",
            code.symbol(),
            group_thousands(whole, code.group_separator())
        );
        if !fraction.is_empty() {
            out.push(code.decimal_separator());
            out.push_str(fraction);
        }
        out
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    IDR,
    USD,
}

impl CurrencyCode {
    /// Display prefix, including any trailing space.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::IDR => "Rp\u{a0}",
            Self::USD => "$",
        }
    }

    /// ISO code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::IDR => "IDR",
            Self::USD => "USD",
        }
    }

    /// Number of fraction digits shown to shoppers.
    #[must_use]
    pub const fn fraction_digits(self) -> u32 {
        match self {
            Self::IDR => 0,
            Self::USD => 2,
        }
    }

    const fn group_separator(self) -> char {
        match self {
            Self::IDR => '.',
            Self::USD => ',',
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Self::IDR => ',',
            Self::USD => '.',
        }
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}
