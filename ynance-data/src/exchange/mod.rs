//! Exchange-specific WebSocket message formats.

/// Binance spot and USD-M futures market streams.
pub mod binance;
