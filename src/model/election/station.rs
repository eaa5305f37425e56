use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::ConstituencyId;

pub type StationId = u32;

/// A polling station, belonging to exactly one constituency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "_id")]
    pub id: StationId,
    pub name: String,
    pub addr_line_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr_line_2: Option<String>,
    pub postcode: String,
    pub constituency_id: ConstituencyId,
}

impl Display for Station {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
