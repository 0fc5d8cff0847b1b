const SATS_PER_BTC: u64 = 100_000_000;

/// `1 234 567 sat` style grouping, or BTC with eight decimals for large amounts.
pub fn format_sats(sats: u64) -> String {
    if sats >= SATS_PER_BTC {
        let whole = sats / SATS_PER_BTC;
        let fraction = sats % SATS_PER_BTC;
        return format!("{whole}.{fraction:08} BTC");
    }

    let digits = sats.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }
    format!("{grouped} sat")
}

/// Keeps both ends of a long address or id: `bc1qxy…f3k9`.
pub fn short_label(text: &str, keep: usize) -> String {
    let count = text.chars().count();
    if count <= keep * 2 + 1 {
        return text.to_owned();
    }
    let head = text.chars().take(keep).collect::<String>();
    let tail = text.chars().skip(count - keep).collect::<String>();
    format!("{head}…{tail}")
}
