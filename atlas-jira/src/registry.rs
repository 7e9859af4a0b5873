//! Per-client field state: the cached field definitions and the custom
//! fields callers asked to include in issue requests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::JiraField;

#[derive(Debug, Default)]
struct FieldState {
  definitions: Option<Arc<Vec<JiraField>>>,
  registered: Vec<String>,
}

/// Field cache plus the ordered, duplicate-free custom field registry.
///
/// The lock is never held across an await.
#[derive(Debug, Default)]
pub(crate) struct FieldRegistry {
  state: Mutex<FieldState>,
}

impl FieldRegistry {
  fn lock(&self) -> MutexGuard<'_, FieldState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub(crate) fn cached_definitions(&self) -> Option<Arc<Vec<JiraField>>> {
    self.lock().definitions.clone()
  }

  pub(crate) fn store_definitions(&self, fields: Vec<JiraField>) -> Arc<Vec<JiraField>> {
    let fields = Arc::new(fields);
    self.lock().definitions = Some(Arc::clone(&fields));
    fields
  }

  /// Add `field_id`; returns false when it was already registered
  pub(crate) fn register(&self, field_id: &str) -> bool {
    let mut state = self.lock();
    if state.registered.iter().any(|id| id == field_id) {
      return false;
    }
    state.registered.push(field_id.to_string());
    true
  }

  pub(crate) fn registered(&self) -> Vec<String> {
    self.lock().registered.clone()
  }

  pub(crate) fn clear(&self) {
    self.lock().registered.clear();
  }

  /// `requested` followed by every registered field not already in it
  pub(crate) fn merge_with(&self, requested: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(requested.len());
    for field in requested.iter().cloned().chain(self.registered()) {
      if !merged.contains(&field) {
        merged.push(field);
      }
    }
    merged
  }
}

/// Resolve a field ID from an ID, a JQL clause name such as `cf[10010]`, or
/// a display name (case-insensitive)
pub(crate) fn resolve_field_id(fields: &[JiraField], name_or_id: &str) -> Option<String> {
  let wanted = name_or_id.trim();
  if wanted.is_empty() {
    return None;
  }

  fields
    .iter()
    .find(|f| f.id == wanted)
    .or_else(|| fields.iter().find(|f| f.clause_names.iter().any(|c| c == wanted)))
    .or_else(|| fields.iter().find(|f| f.name.eq_ignore_ascii_case(wanted)))
    .map(|f| f.id.clone())
}
