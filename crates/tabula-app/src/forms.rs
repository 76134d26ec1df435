// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde_json::Value;

use crate::{ColumnType, RowId, RowPayload, RowValues, Schema};

/// Input hint for a column type name. Unknown types get an empty hint.
pub fn placeholder_for(type_name: &str) -> &'static str {
    ColumnType::parse(type_name).map_or("", ColumnType::placeholder)
}

impl ColumnType {
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Integer => "example: 123",
            Self::Real => "example: 123.45",
            Self::Char => "Single character",
            Self::String => "text",
            Self::Time => "HH:MM:SS",
            Self::TimeInterval => "HH:MM:SS-HH:MM:SS",
        }
    }
}

/// Blank-after-trim input is unset; anything else is sent exactly as typed.
pub fn normalize_input(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_owned())
    }
}

/// Edit-mode starting text for a stored value. Only null or absent values
/// start blank; a stored `0` or `false` is shown so resubmitting keeps it.
pub fn prefill_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RowId),
}

impl FormMode {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Create => "Add Row",
            Self::Edit(_) => "Edit Row",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub type_name: String,
    pub placeholder: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowForm {
    pub mode: FormMode,
    pub fields: Vec<FormField>,
    pub cursor: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl RowForm {
    pub fn build(schema: &Schema, mode: FormMode, existing: Option<&RowValues>) -> Self {
        let fields = schema
            .columns()
            .iter()
            .map(|column| FormField {
                name: column.name.clone(),
                type_name: column.type_name.clone(),
                placeholder: placeholder_for(&column.type_name),
                value: match (mode, existing) {
                    (FormMode::Edit(_), Some(values)) => prefill_value(values.get(&column.name)),
                    _ => String::new(),
                },
            })
            .collect();

        Self {
            mode,
            fields,
            cursor: 0,
            error: None,
            submitting: false,
        }
    }

    pub fn payload(&self) -> RowPayload {
        RowPayload {
            values: self
                .fields
                .iter()
                .map(|field| (field.name.clone(), normalize_input(&field.value)))
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.cursor)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.fields.is_empty() {
            return;
        }
        let len = self.fields.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.cursor) {
            field.value.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.cursor) {
            field.value.pop();
        }
    }
}

/// Validates a database, table, or column name and returns it trimmed.
pub fn validate_name(kind: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("{kind} name is required -- enter a name and retry");
    }
    if trimmed.contains('/') {
        bail!("{kind} name cannot contain '/'");
    }
    Ok(trimmed.to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFormInput {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnFormInput {
    pub fn validate(&self) -> Result<String> {
        validate_name("column", &self.name)
    }

    pub fn cycle_type(&mut self, delta: isize) {
        let all = ColumnType::ALL;
        let current = all
            .iter()
            .position(|t| *t == self.column_type)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(all.len() as isize) as usize;
        self.column_type = all[next];
    }
}

impl Default for ColumnFormInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            column_type: ColumnType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompareFormInput {
    pub left: String,
    pub right: String,
}

impl CompareFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.left.is_empty() || self.right.is_empty() {
            bail!("choose two tables to compare");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ColumnFormInput, CompareFormInput, FormMode, RowForm, normalize_input, placeholder_for,
        prefill_value, validate_name,
    };
    use crate::{Column, ColumnType, RowId, Schema};
    use serde_json::{Value, json};

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("age", ColumnType::Integer),
            Column::new("name", ColumnType::String),
            Column {
                name: "blob".to_owned(),
                type_name: "bytes".to_owned(),
            },
        ])
    }

    #[test]
    fn placeholders_cover_known_types_only() {
        for column_type in ColumnType::ALL {
            assert!(!placeholder_for(column_type.as_str()).is_empty());
            assert_eq!(
                placeholder_for(column_type.as_str()),
                placeholder_for(column_type.as_str())
            );
        }
        assert_eq!(placeholder_for("time"), "HH:MM:SS");
        assert_eq!(placeholder_for("timeInvl"), "HH:MM:SS-HH:MM:SS");
        assert_eq!(placeholder_for("bytes"), "");
        assert_eq!(placeholder_for(""), "");
    }

    #[test]
    fn blank_input_becomes_null_and_text_passes_through() {
        assert_eq!(normalize_input(""), None);
        assert_eq!(normalize_input("   \t"), None);
        assert_eq!(normalize_input("42"), Some("42".to_owned()));
        assert_eq!(normalize_input(" padded "), Some(" padded ".to_owned()));
    }

    #[test]
    fn create_form_starts_empty_with_placeholders() {
        let form = RowForm::build(&schema(), FormMode::Create, None);
        assert_eq!(form.fields.len(), 3);
        assert!(form.fields.iter().all(|field| field.value.is_empty()));
        assert_eq!(form.fields[0].placeholder, "example: 123");
        assert_eq!(form.fields[2].placeholder, "");
    }

    #[test]
    fn edit_form_prefills_from_existing_values() {
        let existing = json!({"age": 30, "name": null}).as_object().cloned();
        let form = RowForm::build(&schema(), FormMode::Edit(RowId::new(7)), existing.as_ref());
        assert_eq!(form.field("age").map(|f| f.value.as_str()), Some("30"));
        assert_eq!(form.field("name").map(|f| f.value.as_str()), Some(""));
        assert_eq!(form.field("blob").map(|f| f.value.as_str()), Some(""));
        assert_eq!(form.mode.title(), "Edit Row");
    }

    #[test]
    fn prefill_never_shows_missing_markers() {
        assert_eq!(prefill_value(None), "");
        assert_eq!(prefill_value(Some(&Value::Null)), "");
        assert_eq!(prefill_value(Some(&json!(0))), "0");
        assert_eq!(prefill_value(Some(&json!(false))), "false");
        assert_eq!(prefill_value(Some(&json!(0.0))), "0.0");
        assert_eq!(prefill_value(Some(&json!("a"))), "a");
    }

    #[test]
    fn payload_maps_every_field() {
        let mut form = RowForm::build(&schema(), FormMode::Create, None);
        assert!(form.set_value("age", "12"));
        assert!(form.set_value("name", "  "));
        assert!(!form.set_value("missing", "x"));

        let payload = form.payload();
        assert_eq!(payload.values.get("age"), Some(&Some("12".to_owned())));
        assert_eq!(payload.values.get("name"), Some(&None));
        assert_eq!(payload.values.get("blob"), Some(&None));
    }

    #[test]
    fn cursor_wraps_and_edits_focused_field() {
        let mut form = RowForm::build(&schema(), FormMode::Create, None);
        form.move_cursor(-1);
        assert_eq!(form.focused().map(|f| f.name.as_str()), Some("blob"));
        form.move_cursor(2);
        assert_eq!(form.focused().map(|f| f.name.as_str()), Some("name"));
        form.push_char('h');
        form.push_char('i');
        form.pop_char();
        assert_eq!(form.field("name").map(|f| f.value.as_str()), Some("h"));
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(validate_name("table", "  t1 ").ok(), Some("t1".to_owned()));
        assert!(validate_name("table", "   ").is_err());
        assert!(validate_name("table", "a/b").is_err());
    }

    #[test]
    fn column_form_cycles_types() {
        let mut input = ColumnFormInput::default();
        input.cycle_type(1);
        assert_eq!(input.column_type, ColumnType::Time);
        input.cycle_type(-2);
        assert_eq!(input.column_type, ColumnType::Char);
        assert!(input.validate().is_err());
    }

    #[test]
    fn compare_form_requires_both_tables() {
        let input = CompareFormInput {
            left: "a".to_owned(),
            right: String::new(),
        };
        assert!(input.validate().is_err());
    }
}
