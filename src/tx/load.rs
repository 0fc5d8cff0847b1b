use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::record::{AddressType, TxInput, TxOutput, TxRecord};

pub fn load_transaction(path: &Path) -> Result<TxRecord> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read transaction file {}", path.display()))?;
    parse_transaction(&raw)
        .with_context(|| format!("failed to parse transaction file {}", path.display()))
}

pub fn parse_transaction(raw: &str) -> Result<TxRecord> {
    let record: TxRecord = serde_json::from_str(raw).context("invalid transaction JSON")?;
    if record.txid.trim().is_empty() {
        return Err(anyhow!("transaction JSON has an empty txid"));
    }
    Ok(record)
}

/// Transaction shown when the viewer is started without `--tx`.
pub fn demo_transaction() -> TxRecord {
    let inputs = (0..14u32)
        .map(|index| TxInput {
            value_sats: Some(25_000 + u64::from(index) * 1_750),
            address: (index % 5 != 3).then(|| format!("bc1qdemo{index:02}x7k2v9s0l3m4n5p6q")),
            is_mine: index % 2 == 0,
            derivation_path: (index % 2 == 0).then(|| format!("m/84'/0'/0'/0/{index}")),
            prev_txid: format!("{index:02x}9f4c1d2e3b4a5968778695a4b3c2d1e0f1a2b3c4d5e6f708192a3b4c5d6e7f8"),
            prev_vout: index % 3,
        })
        .collect::<Vec<_>>();

    let mut outputs = (0..9u32)
        .map(|index| TxOutput {
            index,
            value_sats: 31_000 + u64::from(index) * 900,
            address: Some(format!("bc1qpayee{index:02}r8t6y4u2i0o9p7a5s3d1f")),
            is_mine: false,
            derivation_path: None,
            address_type: AddressType::External,
        })
        .collect::<Vec<_>>();
    outputs.push(TxOutput {
        index: 9,
        value_sats: 48_210,
        address: Some("bc1qchange0w4e6r8t0y2u4i6o8p0a2s4d6f8g".to_owned()),
        is_mine: true,
        derivation_path: Some("m/84'/0'/0'/1/7".to_owned()),
        address_type: AddressType::Change,
    });

    TxRecord {
        txid: "5d2f0c7b9a1e4f3d8c6b2a0918273645f5e4d3c2b1a09f8e7d6c5b4a39281706".to_owned(),
        inputs,
        outputs,
        fee_sats: Some(4_210),
        fee_rate_sat_per_vb: Some(4.2),
        virtual_size: Some(1_002),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_record_with_defaults() {
        let record = parse_transaction(
            r#"{
                "txid": "abcd",
                "inputs": [{ "prev_txid": "ff00", "prev_vout": 1 }],
                "outputs": [{ "index": 0, "value_sats": 1200, "address_type": "change" }]
            }"#,
        )
        .expect("parse");

        assert_eq!(record.txid, "abcd");
        assert_eq!(record.inputs.len(), 1);
        assert!(record.inputs[0].value_sats.is_none());
        assert!(record.inputs[0].address.is_none());
        assert!(record.outputs[0].address_type.is_change());
        assert!(record.fee_sats.is_none());
    }

    #[test]
    fn rejects_empty_txid() {
        assert!(parse_transaction(r#"{ "txid": "  " }"#).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_transaction("{ not json").is_err());
    }
}
