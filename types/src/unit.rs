//! Credit units: the ten sub-balances that can receive converted accrual.

use crate::amount::ConversionRate;
use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named sub-balance that accrual can be routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unit {
    Btc,
    Eth,
    Usdt,
    Usdc,
    Bnb,
    Doge,
    Ltc,
    Xrp,
    Ada,
    Sol,
}

impl Unit {
    /// Every unit, in display order.
    pub const ALL: [Unit; 10] = [
        Unit::Btc,
        Unit::Eth,
        Unit::Usdt,
        Unit::Usdc,
        Unit::Bnb,
        Unit::Doge,
        Unit::Ltc,
        Unit::Xrp,
        Unit::Ada,
        Unit::Sol,
    ];

    /// Ticker symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Usdt => "USDT",
            Self::Usdc => "USDC",
            Self::Bnb => "BNB",
            Self::Doge => "DOGE",
            Self::Ltc => "LTC",
            Self::Xrp => "XRP",
            Self::Ada => "ADA",
            Self::Sol => "SOL",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Btc => "Bitcoin",
            Self::Eth => "Ethereum",
            Self::Usdt => "Tether",
            Self::Usdc => "USD Coin",
            Self::Bnb => "Binance Coin",
            Self::Doge => "Dogecoin",
            Self::Ltc => "Litecoin",
            Self::Xrp => "Ripple",
            Self::Ada => "Cardano",
            Self::Sol => "Solana",
        }
    }

    /// Units credited per one unit of flat currency.
    ///
    /// Raw values are at `AMOUNT_SCALE` (10^12), e.g. BTC 0.000025 = 25_000_000.
    pub fn conversion_rate(&self) -> ConversionRate {
        let raw = match self {
            Self::Btc => 25_000_000,
            Self::Eth => 400_000_000,
            Self::Usdt => 1_000_000_000_000,
            Self::Usdc => 1_000_000_000_000,
            Self::Bnb => 2_000_000_000,
            Self::Doge => 5_000_000_000_000,
            Self::Ltc => 5_000_000_000,
            Self::Xrp => 1_200_000_000_000,
            Self::Ada => 1_500_000_000_000,
            Self::Sol => 10_000_000_000,
        };
        ConversionRate::from_raw(raw)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = TypesError;

    /// Parse a ticker symbol, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Unit::ALL
            .into_iter()
            .find(|u| u.symbol().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TypesError::UnknownUnit(s.to_string()))
    }
}
