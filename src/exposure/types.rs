//! Snapshot entities fetched each cycle and the results derived from them.

use crate::math::FixedDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Market identifier, the lowercase asset symbol (e.g. `eth`).
///
/// Deserialization only accepts ids that are already normalised, so two map
/// keys differing in case are an error rather than one silently replacing
/// the other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarketId(String);

impl MarketId {
    pub fn new(symbol: &str) -> Self {
        Self(symbol.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MarketId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let id = Self::new(&value);
        if id.0 != value {
            return Err(format!("market id '{value}' must be lowercase without padding, e.g. '{id}'"));
        }
        Ok(id)
    }
}

impl From<&str> for MarketId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<MarketId> for String {
    fn from(value: MarketId) -> Self {
        value.0
    }
}

/// 20-byte account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| format!("address '{s}' must start with 0x"))?;
        let bytes = hex::decode(digits).map_err(|e| format!("address '{s}': {e}"))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| format!("address '{s}' must be 20 bytes"))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Role a user occupies in a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Maker,
    Long,
    Short,
    /// No open position.
    None,
}

/// Open interest per role. All quantities are non-negative by protocol invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub maker: FixedDecimal,
    pub long: FixedDecimal,
    pub short: FixedDecimal,
}

impl Position {
    pub fn new(maker: FixedDecimal, long: FixedDecimal, short: FixedDecimal) -> Self {
        Self { maker, long, short }
    }

    /// Name of the first negative field, if any.
    pub fn negative_field(&self) -> Option<&'static str> {
        [("maker", self.maker), ("long", self.long), ("short", self.short)]
            .into_iter()
            .find(|(_, value)| value.is_negative())
            .map(|(name, _)| name)
    }
}

/// Which global position feeds the calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionView {
    /// Settled at the latest oracle version.
    Current,
    /// Includes pending changes not yet settled.
    #[default]
    Next,
}

/// Protocol-wide state of one market at the latest oracle version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub market_id: MarketId,
    pub latest_price: FixedDecimal,
    pub current_position: Position,
    pub next_position: Position,
}

impl MarketSnapshot {
    pub fn position(&self, view: PositionView) -> &Position {
        match view {
            PositionView::Current => &self.current_position,
            PositionView::Next => &self.next_position,
        }
    }
}

/// One user's state in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMarketSnapshot {
    pub market_id: MarketId,
    /// Market contract, watched for update events.
    pub market: Address,
    pub side: Side,
    pub collateral: FixedDecimal,
    /// Only the quantity for `side` is meaningful.
    pub next_position: Position,
    pub next_leverage: FixedDecimal,
}

impl UserMarketSnapshot {
    pub fn has_position(&self) -> bool {
        self.side != Side::None
    }
}

/// Everything one fetch cycle returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSet {
    pub market: BTreeMap<MarketId, MarketSnapshot>,
    pub user: BTreeMap<MarketId, UserMarketSnapshot>,
}

/// Display-ready statistics for one market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureResult {
    pub market_id: MarketId,
    pub price: FixedDecimal,
    pub usd_price: String,
    pub maker_quantity: String,
    /// Signed, in payoff units of the underlying.
    pub maker_exposure: String,
    /// Display-only USD value of the exposure.
    pub usd_maker_exposure: f64,
    pub collateral_usd: String,
    pub leverage: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x0142a8bfF8D887Fc4f04469fCA6c66F5e9936Ea7";

    #[test]
    fn test_market_id_is_lowercased() {
        assert_eq!(MarketId::new(" ETH "), MarketId::new("eth"));
        assert_eq!(MarketId::from("Btc").as_str(), "btc");
    }

    #[test]
    fn test_market_id_deserialization_is_strict() {
        let id: MarketId = serde_json::from_str("\"eth\"").unwrap();
        assert_eq!(id, MarketId::new("eth"));
        assert!(serde_json::from_str::<MarketId>("\"ETH\"").is_err());
        assert!(serde_json::from_str::<MarketId>("\" eth\"").is_err());
    }

    #[test]
    fn test_snapshot_keys_differing_in_case_are_rejected() {
        let position = r#"{ "maker": "1", "long": "0", "short": "0" }"#;
        let market = |id: &str| {
            format!(
                r#"{{ "marketId": "{id}", "latestPrice": "1", "currentPosition": {position}, "nextPosition": {position} }}"#
            )
        };
        let json = format!(
            r#"{{ "market": {{ "ETH": {}, "eth": {} }}, "user": {{}} }}"#,
            market("eth"),
            market("eth")
        );

        let err = serde_json::from_str::<SnapshotSet>(&json).unwrap_err();
        assert!(err.to_string().contains("market id 'ETH'"), "{err}");
    }

    #[test]
    fn test_address_round_trip() {
        let addr: Address = ADDR.parse().unwrap();
        assert_eq!(addr.to_string(), ADDR.to_lowercase());
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0142a8bfF8D887Fc4f04469fCA6c66F5e9936Ea7".parse::<Address>().is_err());
        assert!("0xzz42a8bfF8D887Fc4f04469fCA6c66F5e9936Ea7".parse::<Address>().is_err());
    }

    #[test]
    fn test_negative_field() {
        let ok = Position::new(FixedDecimal::ONE, FixedDecimal::ZERO, FixedDecimal::ONE);
        assert_eq!(ok.negative_field(), None);

        let bad = Position::new(FixedDecimal::ONE, FixedDecimal::from_units(-1), FixedDecimal::ONE);
        assert_eq!(bad.negative_field(), Some("long"));
    }

    #[test]
    fn test_snapshot_set_from_json() {
        let json = format!(
            r#"{{
                "market": {{
                    "eth": {{
                        "marketId": "eth",
                        "latestPrice": "1000",
                        "currentPosition": {{ "maker": "90", "long": "140", "short": "50" }},
                        "nextPosition": {{ "maker": "100", "long": "150", "short": "50" }}
                    }}
                }},
                "user": {{
                    "eth": {{
                        "marketId": "eth",
                        "market": "{ADDR}",
                        "side": "maker",
                        "collateral": "500.5",
                        "nextPosition": {{ "maker": "10", "long": "0", "short": "0" }},
                        "nextLeverage": "2.5"
                    }}
                }}
            }}"#
        );

        let set: SnapshotSet = serde_json::from_str(&json).unwrap();
        let eth = MarketId::new("eth");
        let market = &set.market[&eth];
        assert_eq!(market.latest_price, FixedDecimal::from_units(1000));
        assert_eq!(
            market.position(PositionView::Current).maker,
            FixedDecimal::from_units(90)
        );
        assert_eq!(
            market.position(PositionView::Next).maker,
            FixedDecimal::from_units(100)
        );

        let user = &set.user[&eth];
        assert_eq!(user.side, Side::Maker);
        assert!(user.has_position());
        assert_eq!(user.next_leverage.to_float_string(), "2.5");
    }
}
