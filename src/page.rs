//! Tolerant decoding of list-endpoint envelopes.
//!
//! Engine list endpoints are inconsistent about their response shape. [`Page`]
//! accepts all of them:
//!
//! - a bare JSON array of items
//! - `{"items": [...]}` or `{"data": [...]}`
//! - either of those with `{"page": {...}}` or `{"pagination": {...}}`
//! - and/or `{"sort": {...}}` or `{"sorting": {...}}`

use crate::error::{json_type, DecodeError};
use crate::record::Record;
use serde_json::{Map, Value};

crate::record! {
    /// Pagination metadata attached to a page. Each value is independently optional.
    pub struct PaginationInfo {
        page: i64,
        size: i64,
        total: i64,
        total_pages: i64,
        has_next: bool,
        has_previous: bool,
    }
}

crate::record! {
    /// Sorting metadata attached to a page.
    pub struct SortInfo {
        field: String,
        direction: String,
    }
}

/// An ordered page of records with optional pagination and sort metadata.
///
/// `items` keeps the server's order and is empty, never missing, when there are
/// no results. `pagination` and `sort` are present only when the envelope
/// supplied them.
///
/// # Examples
///
/// ```
/// use camrest::page::Page;
/// use camrest::models::Task;
/// use serde_json::json;
///
/// let page: Page<Task> = Page::decode(&json!({
///     "items": [{"id": "t1", "name": "Review"}],
///     "page": {"page": 1, "size": 10, "total": 1},
/// }))?;
/// assert_eq!(page.len(), 1);
/// assert_eq!(page.pagination.as_ref().and_then(|p| p.total), Some(1));
/// # Ok::<(), camrest::DecodeError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The decoded items, in server order.
    pub items: Vec<T>,
    /// Pagination metadata, if the envelope had any.
    pub pagination: Option<PaginationInfo>,
    /// Sort metadata, if the envelope had any.
    pub sort: Option<SortInfo>,
    /// The envelope as received; bare arrays are recorded as `{"items": [...]}`.
    pub raw: Map<String, Value>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
            sort: None,
            raw: Map::new(),
        }
    }
}

impl<T: Record> Page<T> {
    /// Decodes an envelope, decoding each item as a `T` record.
    ///
    /// # Errors
    ///
    /// See [`Page::decode_with`].
    pub fn decode(envelope: &Value) -> Result<Self, DecodeError> {
        Self::decode_with(envelope, T::decode_map)
    }

    /// Encodes the page: every item, plus pagination and sort when present.
    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert(
            "items".to_string(),
            Value::Array(
                self.items
                    .iter()
                    .map(|item| Value::Object(item.encode()))
                    .collect(),
            ),
        );
        if let Some(pagination) = &self.pagination {
            out.insert("pagination".to_string(), Value::Object(pagination.encode()));
        }
        if let Some(sort) = &self.sort {
            out.insert("sort".to_string(), Value::Object(sort.encode()));
        }
        out
    }
}

impl<T> Page<T> {
    /// Decodes an envelope with a custom item decoder.
    ///
    /// Items are read from `items`, else `data`, else taken as empty. Pagination
    /// comes from the first non-empty object at `page` or `pagination`, sort from
    /// `sort` or `sorting`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidEnvelope`] if the envelope is neither an
    /// array nor an object, or its item sequence is not an array, and
    /// [`DecodeError::InvalidItem`] for any item that is not an object. Errors
    /// from `item` are passed through.
    pub fn decode_with<F>(envelope: &Value, mut item: F) -> Result<Self, DecodeError>
    where
        F: FnMut(&Map<String, Value>) -> Result<T, DecodeError>,
    {
        match envelope {
            Value::Array(raw_items) => {
                let items = decode_items(raw_items, &mut item)?;
                let mut raw = Map::new();
                raw.insert("items".to_string(), envelope.clone());
                Ok(Self {
                    items,
                    pagination: None,
                    sort: None,
                    raw,
                })
            }
            Value::Object(map) => {
                let items = match first_present(map, &["items", "data"]) {
                    None => Vec::new(),
                    Some(Value::Array(raw_items)) => decode_items(raw_items, &mut item)?,
                    Some(other) => {
                        return Err(DecodeError::InvalidEnvelope {
                            found: json_type(other),
                        })
                    }
                };
                let pagination = first_object(map, &["page", "pagination"])
                    .map(PaginationInfo::decode_map)
                    .transpose()?;
                let sort = first_object(map, &["sort", "sorting"])
                    .map(SortInfo::decode_map)
                    .transpose()?;
                Ok(Self {
                    items,
                    pagination,
                    sort,
                    raw: map.clone(),
                })
            }
            other => Err(DecodeError::InvalidEnvelope {
                found: json_type(other),
            }),
        }
    }

    /// Returns the number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns an iterator over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns `true` if the pagination block says another page follows.
    pub fn has_next(&self) -> bool {
        self.pagination
            .as_ref()
            .and_then(|p| p.has_next)
            .unwrap_or(false)
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn decode_items<T, F>(raw_items: &[Value], item: &mut F) -> Result<Vec<T>, DecodeError>
where
    F: FnMut(&Map<String, Value>) -> Result<T, DecodeError>,
{
    raw_items
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => item(map),
            other => Err(DecodeError::InvalidItem {
                index,
                found: json_type(other),
            }),
        })
        .collect()
}

// Empty values (null, false, 0, "", [], {}) count as missing, so an empty
// `items` falls through to `data`.
fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !is_empty_value(value))
}

fn first_object<'a>(
    map: &'a Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Map<String, Value>> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(|value| match value {
            Value::Object(inner) if !inner.is_empty() => Some(inner),
            _ => None,
        })
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    crate::record! {
        struct Named {
            id: String,
            name: String,
        }
    }

    #[test]
    fn test_bare_array() {
        let page: Page<Named> = Page::decode(&json!([{"id": "p1"}, {"id": "p2"}])).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.items[0].id.as_deref(), Some("p1"));
        assert_eq!(page.items[1].id.as_deref(), Some("p2"));
        assert!(page.pagination.is_none());
        assert!(page.sort.is_none());
        assert!(page.raw.contains_key("items"));
    }

    #[test]
    fn test_items_with_page_block() {
        let page: Page<Named> = Page::decode(&json!({
            "items": [{"id": "p1"}],
            "page": {"page": 1, "size": 10, "total": 1},
        }))
        .unwrap();
        assert_eq!(page.len(), 1);
        let pagination = page.pagination.unwrap();
        assert_eq!(pagination.total, Some(1));
        assert_eq!(pagination.size, Some(10));
        assert_eq!(pagination.total_pages, None);
    }

    #[test]
    fn test_data_key() {
        let page: Page<Named> = Page::decode(&json!({"data": [{"name": "a"}]})).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.items[0].name.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_items_falls_through_to_data() {
        let page: Page<Named> =
            Page::decode(&json!({"items": [], "data": [{"id": "d1"}]})).unwrap();
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn test_pagination_key_camel_case() {
        let page: Page<Named> = Page::decode(&json!({
            "items": [],
            "pagination": {"page": 2, "size": 5, "totalPages": 4, "hasNext": true, "hasPrevious": false},
        }))
        .unwrap();
        let pagination = page.pagination.as_ref().unwrap();
        assert_eq!(pagination.page, Some(2));
        assert_eq!(pagination.total_pages, Some(4));
        assert_eq!(pagination.has_previous, Some(false));
        assert!(page.has_next());
    }

    #[test]
    fn test_scalar_page_falls_through_to_pagination() {
        let page: Page<Named> = Page::decode(&json!({
            "items": [],
            "page": 3,
            "pagination": {"page": 3},
        }))
        .unwrap();
        assert_eq!(page.pagination.unwrap().page, Some(3));
    }

    #[test]
    fn test_sort_and_sorting_keys() {
        let page: Page<Named> =
            Page::decode(&json!({"items": [], "sort": {"field": "name", "direction": "asc"}}))
                .unwrap();
        assert_eq!(page.sort.unwrap().field.as_deref(), Some("name"));

        let page: Page<Named> =
            Page::decode(&json!({"items": [], "sorting": {"field": "id", "direction": "desc"}}))
                .unwrap();
        assert_eq!(page.sort.unwrap().direction.as_deref(), Some("desc"));
    }

    #[test]
    fn test_empty_metadata_is_absent() {
        let page: Page<Named> =
            Page::decode(&json!({"items": [], "page": {}, "sort": {}})).unwrap();
        assert!(page.is_empty());
        assert!(page.pagination.is_none());
        assert!(page.sort.is_none());
    }

    #[test]
    fn test_empty_object_envelope() {
        let page: Page<Named> = Page::decode(&json!({})).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_non_object_item_rejected() {
        let err = Page::<Named>::decode(&json!({"items": [{"id": "ok"}, 7]})).unwrap_err();
        assert_eq!(err, DecodeError::InvalidItem { index: 1, found: "number" });
    }

    #[test]
    fn test_scalar_envelope_rejected() {
        let err = Page::<Named>::decode(&json!("nope")).unwrap_err();
        assert_eq!(err, DecodeError::InvalidEnvelope { found: "string" });
    }

    #[test]
    fn test_custom_item_decoder() {
        let page = Page::decode_with(&json!([{"id": "x"}, {"id": "y"}]), |map| {
            Ok(map.get("id").and_then(Value::as_str).unwrap_or_default().to_uppercase())
        })
        .unwrap();
        assert_eq!(page.items, vec!["X".to_string(), "Y".to_string()]);
    }

    #[test]
    fn test_encode_includes_present_blocks_only() {
        let page: Page<Named> = Page::decode(&json!({
            "items": [{"id": "p1", "extra": true}],
            "page": {"total": 1},
        }))
        .unwrap();
        let encoded = page.encode();
        assert_eq!(encoded["items"], json!([{"id": "p1", "extra": true}]));
        assert_eq!(encoded["pagination"], json!({"total": 1}));
        assert!(!encoded.contains_key("sort"));
    }
}
