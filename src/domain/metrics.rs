//! Metric kinds and the fixed catalogue of instruments derived from the
//! monitored process's log output.

use crate::domain::errors::RegistryError;
use crate::domain::ports::MetricSink;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    /// Static key/value metadata, exposed as a gauge fixed at 1.
    Info,
}

impl MetricKind {
    /// Suffix appended to the base name in the text exposition
    pub fn exposition_suffix(&self) -> &'static str {
        match self {
            MetricKind::Counter => "_total",
            MetricKind::Gauge => "",
            MetricKind::Info => "_info",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// Declaration of one instrument. For info records `labels` are the keys of
/// the payload.
#[derive(Debug, Clone, Copy)]
pub struct MetricDescriptor {
    pub kind: MetricKind,
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl MetricDescriptor {
    const fn new(
        kind: MetricKind,
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            kind,
            name,
            help,
            labels,
        }
    }
}

// Counters
pub const DATA_FRAMES_PROCESSED: &str = "data_frames_processed";
pub const PROPOSAL_REQUESTS_SENT: &str = "proposal_requests_sent";
pub const PROPOSAL_RESPONSES_RECEIVED: &str = "proposal_responses_received";
pub const CONNECT_REQUESTS_SENT: &str = "connect_requests_sent";
pub const AUTHORIZATION_REQUESTS_SENT: &str = "authorization_requests_sent";
pub const STRATEGY_EXECUTIONS: &str = "strategy_executions";
pub const ORDER_LEVEL_ADJUSTMENTS: &str = "order_level_adjustments";
pub const TRANSACTION_COST_ADJUSTMENTS: &str = "transaction_cost_adjustments";
pub const ERROR_COUNT: &str = "error_count";

// Per-symbol market gauges
pub const SPREAD: &str = "spread";
pub const POSITION: &str = "position";
pub const VOLATILITY: &str = "volatility";
pub const BID_PRICE: &str = "bid_price";
pub const ASK_PRICE: &str = "ask_price";

// Validator identity
pub const UPTIME_PERCENTAGE: &str = "uptime_percentage";
pub const SOFTWARE_VERSION: &str = "software_version";
pub const VALIDATOR_INFO: &str = "validator_info";
pub const BENEFICIARY_ADDRESS: &str = "beneficiary_address";
pub const VALIDATOR_ADDRESS: &str = "validator_address";

const EXCHANGE_SYMBOL: &[&str] = &["exchange", "symbol"];
const SYMBOL: &[&str] = &["symbol"];
const NO_LABELS: &[&str] = &[];

/// Every instrument the exporter exposes, in declaration order
pub const CATALOGUE: &[MetricDescriptor] = &[
    MetricDescriptor::new(
        MetricKind::Counter,
        DATA_FRAMES_PROCESSED,
        "Number of data frames processed",
        EXCHANGE_SYMBOL,
    ),
    MetricDescriptor::new(
        MetricKind::Counter,
        PROPOSAL_REQUESTS_SENT,
        "Number of proposal requests sent",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Counter,
        PROPOSAL_RESPONSES_RECEIVED,
        "Number of proposal responses received",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Counter,
        CONNECT_REQUESTS_SENT,
        "Number of connect requests sent",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Counter,
        AUTHORIZATION_REQUESTS_SENT,
        "Number of authorization requests sent",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Counter,
        STRATEGY_EXECUTIONS,
        "Number of strategy executions",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Counter,
        ORDER_LEVEL_ADJUSTMENTS,
        "Number of order level adjustments",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Counter,
        TRANSACTION_COST_ADJUSTMENTS,
        "Number of transaction cost adjustments",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Gauge,
        SPREAD,
        "Spread between bid and ask prices",
        SYMBOL,
    ),
    MetricDescriptor::new(MetricKind::Gauge, POSITION, "Current position", SYMBOL),
    MetricDescriptor::new(MetricKind::Gauge, VOLATILITY, "Current volatility", SYMBOL),
    MetricDescriptor::new(MetricKind::Gauge, BID_PRICE, "Current bid price", SYMBOL),
    MetricDescriptor::new(MetricKind::Gauge, ASK_PRICE, "Current ask price", SYMBOL),
    MetricDescriptor::new(
        MetricKind::Counter,
        ERROR_COUNT,
        "Number of errors encountered",
        NO_LABELS,
    ),
    MetricDescriptor::new(
        MetricKind::Info,
        VALIDATOR_INFO,
        "Information about the validator",
        &["display_name"],
    ),
    MetricDescriptor::new(
        MetricKind::Info,
        SOFTWARE_VERSION,
        "Software version of the validator",
        &["version"],
    ),
    MetricDescriptor::new(
        MetricKind::Info,
        BENEFICIARY_ADDRESS,
        "Beneficiary address of the validator",
        &["address"],
    ),
    MetricDescriptor::new(
        MetricKind::Info,
        VALIDATOR_ADDRESS,
        "Address of the validator",
        &["address"],
    ),
    MetricDescriptor::new(
        MetricKind::Gauge,
        UPTIME_PERCENTAGE,
        "Uptime percentage of the validator",
        NO_LABELS,
    ),
];

/// Declare every catalogue instrument on `sink`
pub fn declare_catalogue(sink: &dyn MetricSink) -> Result<(), RegistryError> {
    for descriptor in CATALOGUE {
        sink.declare(
            descriptor.kind,
            descriptor.name,
            descriptor.help,
            descriptor.labels,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_names_are_unique() {
        let names: HashSet<_> = CATALOGUE.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), CATALOGUE.len());
    }

    #[test]
    fn test_info_records_have_payload_keys() {
        for descriptor in CATALOGUE.iter().filter(|d| d.kind == MetricKind::Info) {
            assert!(!descriptor.labels.is_empty(), "{}", descriptor.name);
        }
    }

    #[test]
    fn test_exposition_suffixes() {
        assert_eq!(MetricKind::Counter.exposition_suffix(), "_total");
        assert_eq!(MetricKind::Gauge.exposition_suffix(), "");
        assert_eq!(MetricKind::Info.exposition_suffix(), "_info");
    }
}
