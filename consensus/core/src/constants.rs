/// Transaction version produced by the fixture builders.
pub const TX_VERSION: u32 = 1;

/// Satoshis per BSV coin.
pub const SATOSHI_PER_COIN: u64 = 100_000_000;
