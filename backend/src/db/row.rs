use crate::forms::media::DecodedMedia;
use crate::forms::submission::ValidSubmission;
use crate::forms::variant::{Column, Storage};
use rusqlite::types::Value;

/// Ordered images stored in a child table of the submission row.
#[derive(Debug, Clone, PartialEq)]
pub struct Gallery {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub images: Vec<Vec<u8>>,
}

/// One submission flattened into the columns of its table.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRow {
    pub table: &'static str,
    pub columns: Vec<(&'static str, Value)>,
    pub gallery: Option<Gallery>,
}

impl InsertRow {
    pub fn from_submission(submission: &ValidSubmission, mut media: DecodedMedia) -> Self {
        let variant = submission.variant;
        let mut columns = Vec::with_capacity(variant.columns.len() + variant.media.len());

        for column in variant.columns {
            match column {
                Column::Text { column, field } => {
                    columns.push((*column, text_value(submission.text(field))));
                }
                Column::StaffId { column } => {
                    let value = match &variant.staff_rule {
                        Some(rule) if submission.is_staff() => submission.text(rule.id_field),
                        _ => None,
                    };
                    columns.push((*column, text_value(value)));
                }
            }
        }

        let mut gallery = None;
        for slot in variant.media {
            let items = media.remove(slot.name).unwrap_or_default();
            match &slot.storage {
                Storage::Column(column) => {
                    let value = items
                        .into_iter()
                        .next()
                        .map(Value::Blob)
                        .unwrap_or(Value::Null);
                    columns.push((*column, value));
                }
                Storage::Gallery {
                    table,
                    owner_column,
                } => {
                    gallery = Some(Gallery {
                        table: *table,
                        owner_column: *owner_column,
                        images: items,
                    });
                }
            }
        }

        Self {
            table: variant.table,
            columns,
            gallery,
        }
    }

    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id, created_at",
            self.table,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    #[cfg(test)]
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

fn text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}
