//! Extraction rules recognising event categories in the monitored process's
//! log lines. Each rule tests one line independently of the others; the
//! phrase chains inside a rule are first-match-wins.

use crate::domain::errors::ExtractionError;
use crate::domain::log_event::{DataFrameId, IdentityField, MarketSnapshot};
use crate::domain::metrics;
use crate::domain::ports::MetricSink;
use regex::Regex;
use std::collections::HashMap;

pub trait ExtractionRule: Send + Sync {
    fn name(&self) -> &str;

    /// Apply the rule to `line`, updating `sink` for every fact found.
    /// A pattern miss is not an error.
    fn apply(&self, line: &str, sink: &dyn MetricSink) -> Result<(), ExtractionError>;
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ExtractionError> {
    value
        .parse::<f64>()
        .map_err(|_| ExtractionError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// `data_frame_id=<exchange>-<symbol>-<rest>`
#[derive(Clone)]
pub struct DataFrameIdPattern {
    pattern: Regex,
}

impl DataFrameIdPattern {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"data_frame_id=([\w.]+)-([\w-]+)-")?,
        })
    }

    pub fn find(&self, line: &str) -> Option<DataFrameId> {
        let caps = self.pattern.captures(line)?;
        Some(DataFrameId {
            exchange: caps[1].to_string(),
            symbol: caps[2].to_string(),
        })
    }
}

/// Counts incoming data frames per exchange and symbol
pub struct DataFrameRule {
    ids: DataFrameIdPattern,
}

impl DataFrameRule {
    pub const TRIGGER: &'static str = "processing incoming data frame";

    pub fn new(ids: DataFrameIdPattern) -> Self {
        Self { ids }
    }
}

impl ExtractionRule for DataFrameRule {
    fn name(&self) -> &str {
        "data_frame"
    }

    fn apply(&self, line: &str, sink: &dyn MetricSink) -> Result<(), ExtractionError> {
        if !line.contains(Self::TRIGGER) {
            return Ok(());
        }
        if let Some(id) = self.ids.find(line) {
            sink.increment(
                metrics::DATA_FRAMES_PROCESSED,
                &[id.exchange.as_str(), id.symbol.as_str()],
            )?;
        }
        Ok(())
    }
}

/// Ordered phrase → counter links; the first phrase found in the line wins
pub struct PhraseChain {
    name: &'static str,
    links: Vec<(&'static str, &'static str)>,
}

impl PhraseChain {
    pub fn new(name: &'static str, links: Vec<(&'static str, &'static str)>) -> Self {
        Self { name, links }
    }

    pub fn proposals() -> Self {
        Self::new(
            "proposal",
            vec![
                ("sending proposal request", metrics::PROPOSAL_REQUESTS_SENT),
                ("received proposal response", metrics::PROPOSAL_RESPONSES_RECEIVED),
            ],
        )
    }

    pub fn connections() -> Self {
        Self::new(
            "connection",
            vec![
                ("sending connect request", metrics::CONNECT_REQUESTS_SENT),
                (
                    "sending authorization request",
                    metrics::AUTHORIZATION_REQUESTS_SENT,
                ),
            ],
        )
    }

    pub fn strategy_executions() -> Self {
        Self::new(
            "strategy_execution",
            vec![("[strategy_executor]", metrics::STRATEGY_EXECUTIONS)],
        )
    }

    pub fn adjustments() -> Self {
        Self::new(
            "adjustment",
            vec![
                ("order levels", metrics::ORDER_LEVEL_ADJUSTMENTS),
                (
                    "transaction cost adjustment",
                    metrics::TRANSACTION_COST_ADJUSTMENTS,
                ),
            ],
        )
    }
}

impl ExtractionRule for PhraseChain {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, line: &str, sink: &dyn MetricSink) -> Result<(), ExtractionError> {
        if let Some((_, counter)) = self.links.iter().find(|(phrase, _)| line.contains(phrase)) {
            sink.increment(counter, &[])?;
        }
        Ok(())
    }
}

/// Updates the per-symbol quote gauges from a market snapshot block
pub struct MarketSnapshotRule {
    pattern: Regex,
    ids: DataFrameIdPattern,
}

impl MarketSnapshotRule {
    const FIELDS: [&'static str; 7] = ["bb", "ba", "ob", "oa", "q", "pos", "vol"];

    pub fn new(ids: DataFrameIdPattern) -> Result<Self, regex::Error> {
        // Only q and pos may carry a sign
        let pattern = Regex::new(
            r"bb=([0-9.]+)\|ba=([0-9.]+)\|ob=([0-9.]+)\|oa=([0-9.]+)\|q=([0-9.-]+)\|pos=([0-9.-]+)\|vol=([0-9.]+)",
        )?;
        Ok(Self { pattern, ids })
    }

    /// Parse the snapshot block, `Ok(None)` when the line has none
    pub fn parse(&self, line: &str) -> Result<Option<MarketSnapshot>, ExtractionError> {
        let Some(caps) = self.pattern.captures(line) else {
            return Ok(None);
        };
        let mut values = [0.0_f64; 7];
        for (i, field) in Self::FIELDS.into_iter().enumerate() {
            values[i] = parse_number(field, &caps[i + 1])?;
        }
        let [bb, ba, ob, oa, q, pos, vol] = values;
        Ok(Some(MarketSnapshot {
            bb,
            ba,
            ob,
            oa,
            q,
            pos,
            vol,
        }))
    }
}

impl ExtractionRule for MarketSnapshotRule {
    fn name(&self) -> &str {
        "market_snapshot"
    }

    fn apply(&self, line: &str, sink: &dyn MetricSink) -> Result<(), ExtractionError> {
        let Some(snapshot) = self.parse(line)? else {
            return Ok(());
        };
        // Without a symbol the gauges are left alone
        let Some(id) = self.ids.find(line) else {
            return Ok(());
        };
        let symbol = [id.symbol.as_str()];
        sink.set(metrics::SPREAD, &symbol, snapshot.spread())?;
        sink.set(metrics::POSITION, &symbol, snapshot.pos)?;
        sink.set(metrics::VOLATILITY, &symbol, snapshot.vol)?;
        sink.set(metrics::BID_PRICE, &symbol, snapshot.bb)?;
        sink.set(metrics::ASK_PRICE, &symbol, snapshot.ba)?;
        Ok(())
    }
}

/// Validator identity lines and the daily uptime report, first match wins
pub struct ValidatorIdentityRule {
    uptime: Regex,
}

impl ValidatorIdentityRule {
    pub const UPTIME_TRIGGER: &'static str = "uptime for today as";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            uptime: Regex::new(r"uptime for today as ([0-9]+\.[0-9]+)%")?,
        })
    }

    /// Value of an identity line: the segment between the first and the
    /// second colon, trimmed. Text after a second colon is dropped.
    pub fn identity_value<'a>(
        field: IdentityField,
        line: &'a str,
    ) -> Result<&'a str, ExtractionError> {
        line.split(':')
            .nth(1)
            .map(str::trim)
            .ok_or(ExtractionError::MissingSegment {
                marker: field.marker(),
            })
    }
}

impl ExtractionRule for ValidatorIdentityRule {
    fn name(&self) -> &str {
        "validator_identity"
    }

    fn apply(&self, line: &str, sink: &dyn MetricSink) -> Result<(), ExtractionError> {
        if let Some(field) = IdentityField::ALL
            .into_iter()
            .find(|field| line.contains(field.marker()))
        {
            let value = Self::identity_value(field, line)?;
            sink.set_info(field.metric(), &HashMap::from([(field.key(), value)]))?;
        } else if line.contains(Self::UPTIME_TRIGGER) {
            // An unparsable percentage is skipped, not counted as an error
            if let Some(caps) = self.uptime.captures(line) {
                let uptime = parse_number("uptime", &caps[1])?;
                sink.set(metrics::UPTIME_PERCENTAGE, &[], uptime)?;
            }
        }
        Ok(())
    }
}

/// Counts lines tagged `[error]` in any letter case
pub struct ErrorTagRule;

impl ErrorTagRule {
    pub const TAG: &'static str = "[error]";
}

impl ExtractionRule for ErrorTagRule {
    fn name(&self) -> &str {
        "error_tag"
    }

    fn apply(&self, line: &str, sink: &dyn MetricSink) -> Result<(), ExtractionError> {
        if line.to_lowercase().contains(Self::TAG) {
            sink.increment(metrics::ERROR_COUNT, &[])?;
        }
        Ok(())
    }
}
