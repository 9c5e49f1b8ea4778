//! License export formats.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::server::{error::Error, model::db::LicenseModel};

/// File format of a license export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Encodes rows as a pretty-printed JSON array, or CSV with a header line
    pub fn encode(&self, rows: &[LicenseExportRow]) -> Result<String, Error> {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(rows)?),
            Self::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                for row in rows {
                    writer.serialize(row)?;
                }

                let bytes = writer
                    .into_inner()
                    .map_err(|e| csv::Error::from(e.into_error()))?;

                String::from_utf8(bytes).map_err(|e| Error::InternalError(e.to_string()))
            }
        }
    }
}

/// One exported license. Platform ids are written as strings so snowflakes survive
/// consumers that read numbers as doubles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseExportRow {
    pub id: i32,
    pub guild_id: String,
    pub key: String,
    pub role: String,
    pub author: String,
    pub redeemer: Option<String>,
    pub activated: bool,
    pub created_at: String,
    pub updated_at: String,
    pub valid_until: i64,
}

impl From<&LicenseModel> for LicenseExportRow {
    fn from(license: &LicenseModel) -> Self {
        Self {
            id: license.id,
            guild_id: license.guild_id.to_string(),
            key: license.key.clone(),
            role: license.role_id.to_string(),
            author: license.author_id.to_string(),
            redeemer: license.redeemer_id.map(|id| id.to_string()),
            activated: license.activated,
            created_at: license
                .created_at
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: license
                .updated_at
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            valid_until: license.valid_until,
        }
    }
}

/// Encoded export of a guild's licenses.
#[derive(Debug, Clone)]
pub struct LicenseExport {
    pub format: ExportFormat,
    pub file_name: String,
    pub count: usize,
    pub content: String,
}
