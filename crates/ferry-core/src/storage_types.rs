use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage policy backend kinds
///
/// Selects which storage handler executes transfers for a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Local,
    Remote,
    S3,
}

impl FromStr for PolicyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(PolicyKind::Local),
            "remote" => Ok(PolicyKind::Remote),
            "s3" => Ok(PolicyKind::S3),
            _ => Err(anyhow::anyhow!("Invalid storage policy type: {}", s)),
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PolicyKind::Local => write!(f, "local"),
            PolicyKind::Remote => write!(f, "remote"),
            PolicyKind::S3 => write!(f, "s3"),
        }
    }
}
