//! Ledger configuration.

use std::env;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::InputError;
use crate::money::Percent;
use crate::parser::parse_percent;

pub const CURRENCY_VAR: &str = "SPLITTER_CURRENCY";
pub const PERCENTAGE_TOLERANCE_VAR: &str = "SPLITTER_PERCENTAGE_TOLERANCE";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
    Jpy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Fixes the number of decimal places of every amount in the ledger.
    pub currency: Currency,
    /// How far the percentages of a split may be from 100 and still be accepted.
    pub percentage_tolerance: Percent,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
        }
    }

    /// Number of decimal places, i.e. `10^exponent` minor units make a major unit.
    pub fn exponent(self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }

    pub fn minor_per_major(self) -> i64 {
        10i64.pow(self.exponent())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INR" | "RS" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            _ => Err(InputError::unsupported_currency(s)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            currency: Currency::default(),
            percentage_tolerance: Percent::ZERO,
        }
    }
}

impl Config {
    pub fn with_percentage_tolerance(mut self, tolerance: Percent) -> Config {
        self.percentage_tolerance = tolerance;
        self
    }

    /// Read the configuration from the environment, falling back to the defaults for
    /// missing variables.
    pub fn from_env() -> Result<Config, InputError> {
        let mut config = Config::default();

        if let Ok(code) = env::var(CURRENCY_VAR) {
            config.currency = code.parse()?;
        }
        if let Ok(tolerance) = env::var(PERCENTAGE_TOLERANCE_VAR) {
            config.percentage_tolerance = parse_tolerance(&tolerance)?;
        }

        debug!("Using configuration {:?}", config);
        Ok(config)
    }
}

/// The tolerance may be written with or without the trailing `%`.
fn parse_tolerance(s: &str) -> Result<Percent, InputError> {
    let s = s.trim();
    let with_sign = if s.ends_with('%') {
        s.to_string()
    } else {
        format!("{s}%")
    };
    let tolerance = parse_percent(&with_sign)?;
    if tolerance.is_negative() {
        Err(InputError::invalid_percent(s))
    } else {
        Ok(tolerance)
    }
}
