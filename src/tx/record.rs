use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    #[default]
    External,
    Receive,
    Change,
}

impl AddressType {
    pub fn is_change(self) -> bool {
        matches!(self, Self::Change)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TxInput {
    #[serde(default)]
    pub value_sats: Option<u64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_mine: bool,
    #[serde(default)]
    pub derivation_path: Option<String>,
    #[serde(default)]
    pub prev_txid: String,
    #[serde(default)]
    pub prev_vout: u32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TxOutput {
    pub index: u32,
    #[serde(default)]
    pub value_sats: u64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_mine: bool,
    #[serde(default)]
    pub derivation_path: Option<String>,
    #[serde(default)]
    pub address_type: AddressType,
}

/// A transaction as handed over by the wallet layer.
///
/// Nothing here is validated; missing optional fields show up as unknown
/// placeholders in the graph.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TxRecord {
    pub txid: String,
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub fee_sats: Option<u64>,
    #[serde(default)]
    pub fee_rate_sat_per_vb: Option<f64>,
    #[serde(default)]
    pub virtual_size: Option<u64>,
}
