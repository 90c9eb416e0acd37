use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimStatus {
    pub claimed: bool,
    pub address: Option<String>,
}

impl ClaimStatus {
    pub fn claimed(address: impl Into<String>) -> Self {
        ClaimStatus {
            claimed: true,
            address: Some(address.into()),
        }
    }

    pub fn unclaimed() -> Self {
        ClaimStatus::default()
    }
}
