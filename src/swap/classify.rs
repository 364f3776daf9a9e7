//! Maps free-text chain failures onto a closed set of categories.
//!
//! Revert strings are not a fixed vocabulary, so matching is heuristic:
//! case-insensitive substring rules checked in order, first hit wins.
//! Anything unmatched is `Unknown` and keeps the raw text.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "raw", rename_all = "snake_case")]
pub enum FailureKind {
    InsufficientFunds,
    SlippageExceeded,
    InsufficientLiquidity,
    Expired,
    RouterRejected,
    Unknown(String),
}

// Order matters: deadline and output-bound reverts are also "execution
// reverted", so they must be matched before the generic router rule.
const RULES: &[(&[&str], FailureKind)] = &[
    (&["EXPIRED", "DEADLINE"], FailureKind::Expired),
    (
        &[
            "INSUFFICIENT_OUTPUT_AMOUNT",
            "EXCESSIVE_INPUT_AMOUNT",
            "TOO LITTLE RECEIVED",
            "SLIPPAGE",
        ],
        FailureKind::SlippageExceeded,
    ),
    (&["INSUFFICIENT_LIQUIDITY"], FailureKind::InsufficientLiquidity),
    (
        &[
            "INSUFFICIENT FUNDS",
            "INSUFFICIENT BALANCE",
            "EXCEEDS BALANCE",
            "TRANSFER_FROM_FAILED",
            "OUT OF GAS",
            "INTRINSIC GAS TOO LOW",
            "GAS REQUIRED EXCEEDS ALLOWANCE",
        ],
        FailureKind::InsufficientFunds,
    ),
    (
        &[
            "INVALID_PATH",
            "IDENTICAL_ADDRESSES",
            "ZERO_ADDRESS",
            "INSUFFICIENT_INPUT_AMOUNT",
            "INSUFFICIENT ALLOWANCE",
            "INSUFFICIENT_ALLOWANCE",
            "TRANSFER_FAILED",
            "EXECUTION REVERTED",
        ],
        FailureKind::RouterRejected,
    ),
];

pub fn classify(raw: &str) -> FailureKind {
    let upper = raw.to_uppercase();
    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| upper.contains(n)))
        .map(|(_, kind)| kind.clone())
        .unwrap_or_else(|| FailureKind::Unknown(raw.to_string()))
}
