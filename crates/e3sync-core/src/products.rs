use serde::{Deserialize, Serialize};

/// Correlation key used when an upstream record carries no code at all.
pub const UNIDENTIFIED_CODE: &str = "desconhecido";
pub const DEFAULT_TITLE: &str = "Produto sem nome";
pub const DEFAULT_PRICE: &str = "0.00";
pub const DEFAULT_VENDOR: &str = "Elektro3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
}

impl WeightUnit {
    /// Shopify GraphQL `WeightUnit` enum value.
    #[must_use]
    pub fn graphql_name(self) -> &'static str {
        match self {
            WeightUnit::Kg => "KILOGRAMS",
        }
    }

    /// Shopify REST `weight_unit` value.
    #[must_use]
    pub fn rest_name(self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
}

/// A distributor product after alias resolution, ready to be sent to the
/// destination store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Distributor reference code; never empty.
    pub code: String,
    pub title: String,
    /// Decimal string, e.g. `"9.5"` or `"12.90"`.
    pub price: String,
    pub stock_quantity: i64,
    pub description_html: String,
    pub vendor: String,
    pub product_type: String,
    /// Comma-joined tag list, e.g. `"F12,Bombillas"`.
    pub tags: String,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub barcode: String,
    /// Primary image first, then additional images in upstream order.
    pub images: Vec<ProductImage>,
}

impl CanonicalProduct {
    /// Individual tags, skipping empty entries.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Identity of a product created in the destination store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedProduct {
    /// Destination identifier, e.g. `"gid://shopify/Product/123"`.
    pub id: String,
    pub title: String,
}

/// Broad cause of a per-item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The upstream record could not be turned into a product (no code).
    Normalization,
    /// The destination rejected the payload; resubmitting it unchanged will fail again.
    Validation,
    /// Connectivity, rate limiting or an unexpected destination response.
    Transport,
}

impl FailureKind {
    /// Whether resubmitting the same item later may succeed.
    #[must_use]
    pub fn is_retriable(self) -> bool {
        matches!(self, FailureKind::Transport)
    }
}

/// Outcome of importing a single upstream record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportResult {
    Success {
        upstream_code: String,
        destination_id: String,
        title: String,
    },
    Failure {
        upstream_code: String,
        error_message: String,
        kind: FailureKind,
    },
}

impl ImportResult {
    #[must_use]
    pub fn upstream_code(&self) -> &str {
        match self {
            ImportResult::Success { upstream_code, .. }
            | ImportResult::Failure { upstream_code, .. } => upstream_code,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ImportResult::Success { .. })
    }
}

/// Batch-level summary. `results` is in input order.
///
/// For a completed batch `total` equals the number of submitted records. A
/// cancelled batch only reports the records it attempted; the rest are
/// counted in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub results: Vec<ImportResult>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub skipped: usize,
}

impl ImportReport {
    #[must_use]
    pub fn from_results(results: Vec<ImportResult>) -> Self {
        let success = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            success,
            failure: results.len() - success,
            results,
            cancelled: false,
            skipped: 0,
        }
    }

    /// Partial report for a batch stopped before `skipped` records were attempted.
    #[must_use]
    pub fn cancelled(results: Vec<ImportResult>, skipped: usize) -> Self {
        Self {
            cancelled: true,
            skipped,
            ..Self::from_results(results)
        }
    }

    /// Codes of failed items worth resubmitting.
    pub fn retriable_codes(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter_map(|r| match r {
            ImportResult::Failure {
                upstream_code,
                kind,
                ..
            } if kind.is_retriable() => Some(upstream_code.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(code: &str) -> ImportResult {
        ImportResult::Success {
            upstream_code: code.to_owned(),
            destination_id: format!("gid://shopify/Product/{code}"),
            title: "Widget".to_owned(),
        }
    }

    fn failure(code: &str, kind: FailureKind) -> ImportResult {
        ImportResult::Failure {
            upstream_code: code.to_owned(),
            error_message: "boom".to_owned(),
            kind,
        }
    }

    #[test]
    fn from_results_counts_outcomes() {
        let report = ImportReport::from_results(vec![
            success("A1"),
            failure("A2", FailureKind::Validation),
            success("A3"),
        ]);
        assert_eq!(report.total, 3);
        assert_eq!(report.success, 2);
        assert_eq!(report.failure, 1);
        assert_eq!(report.success + report.failure, report.total);
        assert!(!report.cancelled);
    }

    #[test]
    fn empty_batch_report_is_all_zero() {
        let report = ImportReport::from_results(Vec::new());
        assert_eq!(report, ImportReport::default());
    }

    #[test]
    fn cancelled_report_keeps_skipped_count() {
        let report = ImportReport::cancelled(vec![success("A1")], 4);
        assert!(report.cancelled);
        assert_eq!(report.total, 1);
        assert_eq!(report.skipped, 4);
    }

    #[test]
    fn import_result_serializes_with_status_tag() {
        let json = serde_json::to_value(success("A1")).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["upstream_code"], "A1");
        assert_eq!(json["destination_id"], "gid://shopify/Product/A1");

        let json = serde_json::to_value(failure(UNIDENTIFIED_CODE, FailureKind::Normalization))
            .unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["upstream_code"], "desconhecido");
        assert_eq!(json["kind"], "normalization");
    }

    #[test]
    fn retriable_codes_only_lists_transport_failures() {
        let report = ImportReport::from_results(vec![
            failure("A1", FailureKind::Transport),
            failure("A2", FailureKind::Validation),
            success("A3"),
            failure("A4", FailureKind::Transport),
        ]);
        let codes: Vec<&str> = report.retriable_codes().collect();
        assert_eq!(codes, vec!["A1", "A4"]);
    }

    #[test]
    fn tag_list_skips_blank_entries() {
        let product = CanonicalProduct {
            code: "A1".to_owned(),
            title: DEFAULT_TITLE.to_owned(),
            price: DEFAULT_PRICE.to_owned(),
            stock_quantity: 0,
            description_html: String::new(),
            vendor: DEFAULT_VENDOR.to_owned(),
            product_type: String::new(),
            tags: "F12, ,Bombillas".to_owned(),
            weight: 0.0,
            weight_unit: WeightUnit::Kg,
            barcode: String::new(),
            images: Vec::new(),
        };
        let tags: Vec<&str> = product.tag_list().collect();
        assert_eq!(tags, vec!["F12", "Bombillas"]);
    }

    #[test]
    fn weight_unit_names() {
        assert_eq!(WeightUnit::Kg.graphql_name(), "KILOGRAMS");
        assert_eq!(WeightUnit::Kg.rest_name(), "kg");
        assert_eq!(serde_json::to_value(WeightUnit::Kg).unwrap(), "kg");
    }
}
