//! Request bodies for list resources (contract lists, item lists, ...)
//!
//! A list is a set of included and excluded item references plus a set of
//! cross-reference entries. The body keys for the detail and cross-reference
//! arrays differ per list type, so callers pass them in.

use serde::Serialize;
use serde_json::{Map, Value, json};

/// A reference to a record by exactly one of its keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemReference {
    #[serde(rename = "guid")]
    Guid(String),
    #[serde(rename = "id")]
    Id(String),
    #[serde(rename = "description")]
    Description(String),
}

#[derive(Serialize)]
struct ListEntry<'a> {
    #[serde(rename = "_action")]
    action: &'a str,
    #[serde(rename = "excludeFlag")]
    exclude_flag: bool,
    #[serde(rename = "itemReference")]
    item_reference: &'a ItemReference,
}

/// Contents of a list definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDefinition {
    pub included_items: Vec<ItemReference>,
    pub excluded_items: Vec<ItemReference>,
    pub included_xrefs: Vec<ItemReference>,
    pub excluded_xrefs: Vec<ItemReference>,
    pub include_only_common_items: bool,
    pub definition_text: Option<String>,
}

impl ListDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_item(mut self, item: ItemReference) -> Self {
        self.included_items.push(item);
        self
    }

    pub fn exclude_item(mut self, item: ItemReference) -> Self {
        self.excluded_items.push(item);
        self
    }

    pub fn include_xref(mut self, item: ItemReference) -> Self {
        self.included_xrefs.push(item);
        self
    }

    pub fn exclude_xref(mut self, item: ItemReference) -> Self {
        self.excluded_xrefs.push(item);
        self
    }

    pub fn only_common_items(mut self) -> Self {
        self.include_only_common_items = true;
        self
    }

    pub fn definition_text(mut self, text: impl Into<String>) -> Self {
        self.definition_text = Some(text.into());
        self
    }

    fn entries(action: &str, included: &[ItemReference], excluded: &[ItemReference]) -> Value {
        let included = included.iter().map(|item| (item, false));
        let excluded = excluded.iter().map(|item| (item, true));
        let entries: Vec<ListEntry<'_>> = included
            .chain(excluded)
            .map(|(item_reference, exclude_flag)| ListEntry {
                action,
                exclude_flag,
                item_reference,
            })
            .collect();
        json!(entries)
    }

    /// Detail entries, included items first
    pub fn list_details(&self, action: &str) -> Value {
        Self::entries(action, &self.included_items, &self.excluded_items)
    }

    /// Cross-reference entries, included first
    pub fn list_xrefs(&self, action: &str) -> Value {
        Self::entries(action, &self.included_xrefs, &self.excluded_xrefs)
    }

    /// Full request body for creating or updating a list
    pub fn list_body(
        &self,
        action: &str,
        description: &str,
        detail_key: &str,
        xrefs_key: &str,
    ) -> Value {
        let mut body = Map::new();
        body.insert(detail_key.to_string(), self.list_details(action));
        body.insert(xrefs_key.to_string(), self.list_xrefs(action));
        body.insert("description".to_string(), json!(description));
        if self.include_only_common_items {
            body.insert("includeOnlyCommonItemsFlag".to_string(), json!(true));
        }
        if let Some(text) = &self.definition_text {
            body.insert("definitionText".to_string(), json!(text));
        }
        Value::Object(body)
    }
}
