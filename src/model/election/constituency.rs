use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub type ConstituencyId = u32;

/// An electoral area owning zero or more stations and candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituency {
    #[serde(rename = "_id")]
    pub id: ConstituencyId,
    pub name: String,
}

impl Display for Constituency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
