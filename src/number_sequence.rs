//! C5 — Number Sequence Generator (§4.5). Thin business logic over
//! [`crate::store::NumberSequenceStore`], which owns the atomic counter.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};

use crate::domain::sequence::DocumentKind;
use crate::error::EngineResult;
use crate::ids::OrgId;
use crate::store::NumberSequenceStore;

/// Document-number format (§6, bit-exact): `^[A-Z][A-Z0-9]{0,7}-\d{6}-\d{6}$`.
pub struct NumberSequenceGenerator {
    store: Arc<dyn NumberSequenceStore>,
}

impl NumberSequenceGenerator {
    pub fn new(store: Arc<dyn NumberSequenceStore>) -> Self {
        Self { store }
    }

    /// `next(orgId, documentKind, prefix?)`.
    pub async fn next(
        &self,
        org_id: OrgId,
        kind: DocumentKind,
        prefix: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<String> {
        let prefix = normalize_prefix(prefix, kind);
        let value = self.store.increment_and_get(org_id, kind).await?;
        Ok(format!(
            "{prefix}-{:04}{:02}-{value:06}",
            now.year(),
            now.month()
        ))
    }
}

fn normalize_prefix(prefix: Option<&str>, kind: DocumentKind) -> String {
    match prefix.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_uppercase(),
        _ => kind.default_prefix().to_string(),
    }
}
