//! Facts extracted from a single log line of the monitored process.

use crate::domain::metrics;

/// Exchange and symbol carried by a `data_frame_id=<exchange>-<symbol>-<rest>` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrameId {
    pub exchange: String,
    pub symbol: String,
}

/// Quote and inventory fields from a `bb=..|ba=..|ob=..|oa=..|q=..|pos=..|vol=..` block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSnapshot {
    /// Best bid
    pub bb: f64,
    /// Best ask
    pub ba: f64,
    /// Own bid
    pub ob: f64,
    /// Own ask
    pub oa: f64,
    pub q: f64,
    pub pos: f64,
    pub vol: f64,
}

impl MarketSnapshot {
    pub fn spread(&self) -> f64 {
        self.ba - self.bb
    }
}

/// Validator identity lines, in the order they are tested against a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    SoftwareVersion,
    DisplayName,
    Beneficiary,
    ValidatorAddress,
}

impl IdentityField {
    pub const ALL: [IdentityField; 4] = [
        IdentityField::SoftwareVersion,
        IdentityField::DisplayName,
        IdentityField::Beneficiary,
        IdentityField::ValidatorAddress,
    ];

    /// Literal that marks the line
    pub fn marker(&self) -> &'static str {
        match self {
            IdentityField::SoftwareVersion => "SOFTWARE VERSION:",
            IdentityField::DisplayName => "DISPLAY NAME:",
            IdentityField::Beneficiary => "BENEFICIARY:",
            IdentityField::ValidatorAddress => "VALIDATOR ADDRESS:",
        }
    }

    /// Info record updated by the line
    pub fn metric(&self) -> &'static str {
        match self {
            IdentityField::SoftwareVersion => metrics::SOFTWARE_VERSION,
            IdentityField::DisplayName => metrics::VALIDATOR_INFO,
            IdentityField::Beneficiary => metrics::BENEFICIARY_ADDRESS,
            IdentityField::ValidatorAddress => metrics::VALIDATOR_ADDRESS,
        }
    }

    /// Key of the single entry in the info payload
    pub fn key(&self) -> &'static str {
        match self {
            IdentityField::SoftwareVersion => "version",
            IdentityField::DisplayName => "display_name",
            IdentityField::Beneficiary | IdentityField::ValidatorAddress => "address",
        }
    }
}
