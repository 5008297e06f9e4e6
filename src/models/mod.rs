use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PCT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillType {
    #[serde(rename = "Transports")]
    Transports,
    #[serde(rename = "Restaurants et bars")]
    Restaurants,
    #[serde(rename = "Hôtel et logement")]
    Lodging,
    #[serde(rename = "Services en ligne")]
    OnlineServices,
    #[serde(rename = "IT et électronique")]
    Electronics,
    #[serde(rename = "Equipement et matériel")]
    Equipment,
    #[serde(rename = "Fournitures de bureau")]
    OfficeSupplies,
}

impl BillType {
    pub const ALL: [BillType; 7] = [
        BillType::Transports,
        BillType::Restaurants,
        BillType::Lodging,
        BillType::OnlineServices,
        BillType::Electronics,
        BillType::Equipment,
        BillType::OfficeSupplies,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BillType::Transports => "Transports",
            BillType::Restaurants => "Restaurants et bars",
            BillType::Lodging => "Hôtel et logement",
            BillType::OnlineServices => "Services en ligne",
            BillType::Electronics => "IT et électronique",
            BillType::Equipment => "Equipement et matériel",
            BillType::OfficeSupplies => "Fournitures de bureau",
        }
    }
}

impl Default for BillType {
    // First option of the expense-type select.
    fn default() -> Self {
        BillType::Transports
    }
}

impl fmt::Display for BillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BillType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        BillType::ALL
            .iter()
            .find(|t| t.label() == value)
            .copied()
            .ok_or_else(|| format!("unknown bill type: {}", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Pending,
    Accepted,
    Refused,
}

impl BillStatus {
    /// Label shown in the status pill of the bills table.
    pub fn label(&self) -> &'static str {
        match self {
            BillStatus::Pending => "En attente",
            BillStatus::Accepted => "Accepté",
            BillStatus::Refused => "Refused",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Accepted => "accepted",
            BillStatus::Refused => "refused",
        }
    }
}

impl FromStr for BillStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(BillStatus::Pending),
            "accepted" => Ok(BillStatus::Accepted),
            "refused" => Ok(BillStatus::Refused),
            other => Err(format!("unknown bill status: {}", other)),
        }
    }
}

/// A bill as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRecord {
    pub id: String,
    pub email: String,
    #[serde(rename = "type")]
    pub bill_type: BillType,
    pub name: String,
    pub amount: f64,
    /// Raw wire date, expected as `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub vat: Option<f64>,
    #[serde(default)]
    pub pct: Option<u32>,
    #[serde(default)]
    pub commentary: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_admin: Option<String>,
}

/// The record assembled by the new-bill form. Has no id and no caller-chosen status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    pub email: String,
    #[serde(rename = "type")]
    pub bill_type: BillType,
    pub name: String,
    pub amount: f64,
    pub date: String,
    pub vat: Option<f64>,
    pub pct: u32,
    pub commentary: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub status: BillStatus,
}

impl NewBill {
    pub fn into_record(self, id: String) -> BillRecord {
        BillRecord {
            id,
            email: self.email,
            bill_type: self.bill_type,
            name: self.name,
            amount: self.amount,
            date: self.date,
            vat: self.vat,
            pct: Some(self.pct),
            commentary: self.commentary,
            file_url: self.file_url,
            file_name: self.file_name,
            status: BillStatus::Pending,
            comment_admin: None,
        }
    }
}

/// Receipt file selected in the form, before upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        SelectedFile {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A stored receipt, retained by the new-bill form until submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUpload {
    pub file_url: String,
    pub file_name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedBillRow {
    pub id: String,
    pub email: String,
    #[serde(rename = "type")]
    pub bill_type: BillType,
    pub name: String,
    pub amount: f64,
    /// Display date, or the raw date when it could not be formatted.
    pub date: String,
    pub raw_date: String,
    pub vat: Option<f64>,
    pub pct: Option<u32>,
    pub commentary: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub status: BillStatus,
    pub status_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Employee,
    Admin,
}

/// The signed-in user, as persisted under the `user` session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type")]
    pub role: UserRole,
    pub email: String,
}

impl Session {
    pub fn employee(email: impl Into<String>) -> Self {
        Session {
            role: UserRole::Employee,
            email: email.into(),
        }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(value)) => Ok(Some(value)),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
