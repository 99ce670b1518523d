use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of an inventory document: entrada receives stock into the
/// warehouse, salida issues stock out of it. Stock movements reuse the same
/// enum for their direction column.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[sea_orm(string_value = "entrada")]
    Entrada,

    #[sea_orm(string_value = "salida")]
    Salida,
}

impl DocumentType {
    /// Prefix used when allocating the human-readable document number.
    pub fn number_prefix(self) -> &'static str {
        match self {
            DocumentType::Entrada => "ENT",
            DocumentType::Salida => "SAL",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Entrada => write!(f, "entrada"),
            DocumentType::Salida => write!(f, "salida"),
        }
    }
}

/// Lifecycle state of an inventory document.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,

    #[sea_orm(string_value = "confirmed")]
    Confirmed,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl DocumentStatus {
    /// Legal transitions: draft → confirmed, draft → cancelled,
    /// confirmed → cancelled. Nothing returns to draft.
    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        matches!(
            (self, next),
            (DocumentStatus::Draft, DocumentStatus::Confirmed)
                | (DocumentStatus::Draft, DocumentStatus::Cancelled)
                | (DocumentStatus::Confirmed, DocumentStatus::Cancelled)
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Draft => write!(f, "draft"),
            DocumentStatus::Confirmed => write!(f, "confirmed"),
            DocumentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Inventory document entity model.
///
/// `movements_emitted_at` records the moment stock movements were generated
/// for this document. A confirmed document with a NULL value here is
/// outstanding: it was confirmed without both signatures and its warehouse
/// effects are deferred until the signatures are completed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub document_number: String,

    pub document_type: DocumentType,

    pub document_date: Date,

    #[sea_orm(column_type = "Uuid", nullable)]
    pub warehouse_id: Option<Uuid>,

    #[sea_orm(column_type = "Uuid", nullable)]
    pub event_id: Option<Uuid>,

    pub delivered_by_name: Option<String>,

    /// Base64-encoded raster image; opaque blob, no stroke data.
    pub delivered_by_signature: Option<String>,

    pub received_by_name: Option<String>,

    pub received_by_signature: Option<String>,

    pub notes: Option<String>,

    pub status: DocumentStatus,

    pub movements_emitted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(has_many = "super::inventory_document_line::Entity")]
    Lines,
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    StockMovements,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::inventory_document_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

impl Model {
    /// True when both counterpart names and both signature images are set.
    /// Only then may stock movements be emitted for the document.
    pub fn has_complete_signatures(&self) -> bool {
        filled(&self.delivered_by_name)
            && filled(&self.delivered_by_signature)
            && filled(&self.received_by_name)
            && filled(&self.received_by_signature)
    }

    /// Only draft documents accept header or line edits.
    pub fn is_editable(&self) -> bool {
        self.status == DocumentStatus::Draft
    }

    /// Confirmed, signature gate passed, movements written.
    pub fn movements_emitted(&self) -> bool {
        self.movements_emitted_at.is_some()
    }
}

/// Signature images travel as base64-encoded blobs attached to the document
/// record. Rejects payloads that do not decode rather than persisting junk.
pub fn validate_signature_blob(blob: &str) -> bool {
    !blob.trim().is_empty() && BASE64.decode(blob.trim()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn document(status: DocumentStatus) -> Model {
        Model {
            id: Uuid::new_v4(),
            document_number: "SAL-000001".into(),
            document_type: DocumentType::Salida,
            document_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            warehouse_id: Some(Uuid::new_v4()),
            event_id: None,
            delivered_by_name: None,
            delivered_by_signature: None,
            received_by_name: None,
            received_by_signature: None,
            notes: None,
            status,
            movements_emitted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn draft_transitions_to_confirmed_or_cancelled() {
        assert!(DocumentStatus::Draft.can_transition_to(DocumentStatus::Confirmed));
        assert!(DocumentStatus::Draft.can_transition_to(DocumentStatus::Cancelled));
        assert!(DocumentStatus::Confirmed.can_transition_to(DocumentStatus::Cancelled));
    }

    #[test]
    fn nothing_returns_to_draft() {
        assert!(!DocumentStatus::Confirmed.can_transition_to(DocumentStatus::Draft));
        assert!(!DocumentStatus::Cancelled.can_transition_to(DocumentStatus::Draft));
        assert!(!DocumentStatus::Cancelled.can_transition_to(DocumentStatus::Confirmed));
        assert!(!DocumentStatus::Draft.can_transition_to(DocumentStatus::Draft));
    }

    #[test]
    fn signatures_complete_requires_all_four_fields() {
        let mut doc = document(DocumentStatus::Draft);
        assert!(!doc.has_complete_signatures());

        doc.delivered_by_name = Some("Ana Torres".into());
        doc.delivered_by_signature = Some("aW1hZ2U=".into());
        doc.received_by_name = Some("Luis Mena".into());
        assert!(!doc.has_complete_signatures());

        doc.received_by_signature = Some("ZmlybWE=".into());
        assert!(doc.has_complete_signatures());
    }

    #[test]
    fn blank_signature_fields_do_not_count() {
        let mut doc = document(DocumentStatus::Draft);
        doc.delivered_by_name = Some("  ".into());
        doc.delivered_by_signature = Some("aW1hZ2U=".into());
        doc.received_by_name = Some("Luis Mena".into());
        doc.received_by_signature = Some("ZmlybWE=".into());
        assert!(!doc.has_complete_signatures());
    }

    #[test]
    fn only_draft_is_editable() {
        assert!(document(DocumentStatus::Draft).is_editable());
        assert!(!document(DocumentStatus::Confirmed).is_editable());
        assert!(!document(DocumentStatus::Cancelled).is_editable());
    }

    #[test]
    fn signature_blob_validation() {
        assert!(validate_signature_blob("aW1hZ2U="));
        assert!(!validate_signature_blob(""));
        assert!(!validate_signature_blob("   "));
        assert!(!validate_signature_blob("not@@base64!!"));
    }
}
