// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Report data model
//!
//! `Project -> CheckResult[] -> ElementResult[]`, serialized one-to-one to
//! JSON. Element rows carry the id of their check so the document can be
//! stored as two tables.

use crate::error::ContractViolation;
use crate::evaluate::Evaluation;
use ifcore_model::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Summary used for checks that produced no rows
pub const NO_ELEMENTS_SUMMARY: &str = "No elements found for this check.";

/// Verdict for one element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementStatus {
    /// Value satisfies the requirement
    Pass,
    /// Value was found and violates the requirement
    Fail,
    /// Value is borderline per the rule's own band
    Warning,
    /// Value could not be found
    Blocked,
    /// Informational row, not a judgement
    Log,
}

impl ElementStatus {
    pub const ALL: [ElementStatus; 5] = [
        ElementStatus::Pass,
        ElementStatus::Fail,
        ElementStatus::Warning,
        ElementStatus::Blocked,
        ElementStatus::Log,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementStatus::Pass => "pass",
            ElementStatus::Fail => "fail",
            ElementStatus::Warning => "warning",
            ElementStatus::Blocked => "blocked",
            ElementStatus::Log => "log",
        }
    }

    /// `fail` and `blocked` rows must explain themselves
    pub fn requires_rationale(&self) -> bool {
        matches!(self, ElementStatus::Fail | ElementStatus::Blocked)
    }
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementStatus {
    type Err = ContractViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ContractViolation::UnknownStatus(s.to_string()))
    }
}

/// Aggregate status of one check
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    Blocked,
    /// No judgement was made (no rows, or only `log` rows)
    Unknown,
    /// The rule itself failed
    Error,
}

impl CheckStatus {
    /// Fold element statuses: fail > blocked > warning > pass > log-only
    pub fn aggregate(statuses: impl IntoIterator<Item = ElementStatus>) -> Self {
        let mut seen = [false; 5];
        for status in statuses {
            seen[status as usize] = true;
        }
        let has = |status: ElementStatus| seen[status as usize];

        if has(ElementStatus::Fail) {
            CheckStatus::Fail
        } else if has(ElementStatus::Blocked) {
            CheckStatus::Blocked
        } else if has(ElementStatus::Warning) {
            CheckStatus::Warning
        } else if has(ElementStatus::Pass) {
            CheckStatus::Pass
        } else {
            CheckStatus::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Warning => "warning",
            CheckStatus::Blocked => "blocked",
            CheckStatus::Unknown => "unknown",
            CheckStatus::Error => "error",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule's verdict on one element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementResult {
    pub id: Uuid,
    /// Owning check, set when the row is attached to a [`CheckResult`]
    pub check_result_id: Option<Uuid>,
    /// GlobalId, or `None` when no element could be matched
    pub element_id: Option<String>,
    pub element_type: String,
    pub element_name: String,
    pub element_name_long: Option<String>,
    pub check_status: ElementStatus,
    pub actual_value: Option<String>,
    pub required_value: Option<String>,
    /// Rationale
    pub comment: Option<String>,
    /// Resolution trace
    pub log: Option<String>,
}

impl ElementResult {
    pub fn new(
        element_type: impl Into<String>,
        element_name: impl Into<String>,
        status: ElementStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            check_result_id: None,
            element_id: None,
            element_type: element_type.into(),
            element_name: element_name.into(),
            element_name_long: None,
            check_status: status,
            actual_value: None,
            required_value: None,
            comment: None,
            log: None,
        }
    }

    /// Row for a model element, filled from an evaluation
    ///
    /// Elements without a GlobalId are identified by their entity number.
    pub fn for_element(element: &Element, evaluation: Evaluation) -> Self {
        let element_id = element
            .global_id
            .clone()
            .unwrap_or_else(|| element.id.to_string());
        Self::new(
            element.ifc_type.name(),
            element.display_name(),
            evaluation.status,
        )
        .with_element_id(element_id)
        .with_evaluation(evaluation)
    }

    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.element_name = name.into();
        self
    }

    pub fn with_long_name(mut self, name: impl Into<String>) -> Self {
        self.element_name_long = Some(name.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual_value = Some(actual.into());
        self
    }

    pub fn with_required(mut self, required: impl Into<String>) -> Self {
        self.required_value = Some(required.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }

    /// Copy status, values and rationale from an evaluation
    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.check_status = evaluation.status;
        self.actual_value = evaluation.actual;
        self.required_value = evaluation.required;
        self.comment = evaluation.rationale;
        self
    }

    /// Check the row against the rule output contract
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.element_type.trim().is_empty() {
            return Err(ContractViolation::MissingField("element_type"));
        }
        if self.element_name.trim().is_empty() {
            return Err(ContractViolation::MissingField("element_name"));
        }
        let has_comment = self.comment.as_deref().is_some_and(|c| !c.trim().is_empty());
        if self.check_status.requires_rationale() && !has_comment {
            return Err(ContractViolation::MissingRationale(
                self.check_status.to_string(),
            ));
        }
        Ok(())
    }
}

/// Loosely typed row as produced by external rule providers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawElementRecord {
    pub element_id: Option<String>,
    pub element_type: Option<String>,
    pub element_name: Option<String>,
    pub element_name_long: Option<String>,
    #[serde(alias = "status")]
    pub check_status: Option<String>,
    pub actual_value: Option<String>,
    pub required_value: Option<String>,
    pub comment: Option<String>,
    pub log: Option<String>,
}

impl TryFrom<RawElementRecord> for ElementResult {
    type Error = ContractViolation;

    fn try_from(raw: RawElementRecord) -> Result<Self, Self::Error> {
        let element_type = raw
            .element_type
            .ok_or(ContractViolation::MissingField("element_type"))?;
        let element_name = raw
            .element_name
            .ok_or(ContractViolation::MissingField("element_name"))?;
        let status: ElementStatus = raw
            .check_status
            .ok_or(ContractViolation::MissingField("check_status"))?
            .parse()?;

        let result = ElementResult {
            element_id: raw.element_id,
            element_name_long: raw.element_name_long,
            actual_value: raw.actual_value,
            required_value: raw.required_value,
            comment: raw.comment,
            log: raw.log,
            ..ElementResult::new(element_type, element_name, status)
        };
        result.validate()?;
        Ok(result)
    }
}

/// "12 elements: 9 pass, 2 fail, 1 blocked"
pub fn summarize(elements: &[ElementResult]) -> String {
    if elements.is_empty() {
        return NO_ELEMENTS_SUMMARY.to_string();
    }

    let counts: Vec<String> = ElementStatus::ALL
        .into_iter()
        .filter_map(|status| {
            let n = elements.iter().filter(|e| e.check_status == status).count();
            (n > 0).then(|| format!("{n} {status}"))
        })
        .collect();

    let noun = if elements.len() == 1 { "element" } else { "elements" };
    format!("{} {}: {}", elements.len(), noun, counts.join(", "))
}

/// One rule's execution over a model
///
/// Status and summary are always derived from the rows; there is no way to
/// set them independently. Deserialization recomputes them as well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredCheckResult")]
pub struct CheckResult {
    pub id: Uuid,
    pub project_id: Uuid,
    pub job_id: Uuid,
    pub check_name: String,
    pub provider: String,
    status: CheckStatus,
    summary: String,
    has_elements: bool,
    elements: Vec<ElementResult>,
    pub duration_ms: u64,
    pub created_at: i64,
}

impl CheckResult {
    /// Empty check; aggregates to `unknown` until rows are attached
    pub fn new(
        project_id: Uuid,
        job_id: Uuid,
        check_name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            job_id,
            check_name: check_name.into(),
            provider: provider.into(),
            status: CheckStatus::Unknown,
            summary: NO_ELEMENTS_SUMMARY.to_string(),
            has_elements: false,
            elements: Vec::new(),
            duration_ms: 0,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Attach the rule's rows and recompute status and summary
    pub fn with_elements(mut self, elements: Vec<ElementResult>) -> Self {
        let id = self.id;
        self.elements = elements
            .into_iter()
            .map(|mut e| {
                e.check_result_id = Some(id);
                e
            })
            .collect();
        self.has_elements = !self.elements.is_empty();
        self.status = CheckStatus::aggregate(self.elements.iter().map(|e| e.check_status));
        self.summary = summarize(&self.elements);
        self
    }

    /// Mark the check as failed by a defect in the rule
    pub fn degraded(mut self, reason: impl fmt::Display) -> Self {
        self.elements.clear();
        self.has_elements = false;
        self.status = CheckStatus::Error;
        self.summary = format!("Error: {reason}");
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn has_elements(&self) -> bool {
        self.has_elements
    }

    pub fn elements(&self) -> &[ElementResult] {
        &self.elements
    }

    pub fn is_degraded(&self) -> bool {
        self.status == CheckStatus::Error
    }
}

/// Check as stored; only the rows and an error reason are trusted
#[derive(Deserialize)]
struct StoredCheckResult {
    id: Uuid,
    project_id: Uuid,
    job_id: Uuid,
    check_name: String,
    provider: String,
    #[serde(default)]
    status: Option<CheckStatus>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    elements: Vec<ElementResult>,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    created_at: i64,
}

impl From<StoredCheckResult> for CheckResult {
    fn from(stored: StoredCheckResult) -> Self {
        let base = CheckResult {
            id: stored.id,
            project_id: stored.project_id,
            job_id: stored.job_id,
            check_name: stored.check_name,
            provider: stored.provider,
            status: CheckStatus::Unknown,
            summary: NO_ELEMENTS_SUMMARY.to_string(),
            has_elements: false,
            elements: Vec::new(),
            duration_ms: stored.duration_ms,
            created_at: stored.created_at,
        };

        // An error verdict only stands for a check without rows
        if stored.elements.is_empty() && stored.status == Some(CheckStatus::Error) {
            let summary = stored.summary.unwrap_or_default();
            let reason = summary.strip_prefix("Error: ").unwrap_or(&summary);
            return base.degraded(reason);
        }
        base.with_elements(stored.elements)
    }
}

/// Caller-supplied project metadata
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectInfo {
    /// Defaults to the file name recorded in the model header
    pub name: Option<String>,
    pub file_url: Option<String>,
    pub user_id: Option<String>,
    pub region: Option<String>,
    pub building_type: Option<String>,
}

/// Check counts for one provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub provider: String,
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub warning: usize,
    pub blocked: usize,
    pub unknown: usize,
    pub error: usize,
}

impl ProviderSummary {
    fn count(&mut self, status: CheckStatus) {
        self.total += 1;
        let slot = match status {
            CheckStatus::Pass => &mut self.pass,
            CheckStatus::Fail => &mut self.fail,
            CheckStatus::Warning => &mut self.warning,
            CheckStatus::Blocked => &mut self.blocked,
            CheckStatus::Unknown => &mut self.unknown,
            CheckStatus::Error => &mut self.error,
        };
        *slot += 1;
    }
}

/// One evaluation run over one model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub file_url: Option<String>,
    pub user_id: Option<String>,
    pub ifc_schema: Option<String>,
    pub region: Option<String>,
    pub building_type: Option<String>,
    pub created_at: i64,
    /// In registration order
    pub check_results: Vec<CheckResult>,
}

impl Project {
    pub fn total_checks(&self) -> usize {
        self.check_results.len()
    }

    pub fn passed_checks(&self) -> usize {
        self.checks_with(CheckStatus::Pass)
    }

    pub fn failed_checks(&self) -> usize {
        self.checks_with(CheckStatus::Fail)
    }

    pub fn degraded_checks(&self) -> usize {
        self.checks_with(CheckStatus::Error)
    }

    pub fn total_elements(&self) -> usize {
        self.check_results.iter().map(|c| c.elements().len()).sum()
    }

    pub fn passed_elements(&self) -> usize {
        self.elements_with(ElementStatus::Pass)
    }

    pub fn failed_elements(&self) -> usize {
        self.elements_with(ElementStatus::Fail)
    }

    /// Per-provider check counts, in registration order
    pub fn summary_by_provider(&self) -> Vec<ProviderSummary> {
        let mut summaries: Vec<ProviderSummary> = Vec::new();
        for check in &self.check_results {
            let index = match summaries.iter().position(|s| s.provider == check.provider) {
                Some(index) => index,
                None => {
                    summaries.push(ProviderSummary {
                        provider: check.provider.clone(),
                        ..ProviderSummary::default()
                    });
                    summaries.len() - 1
                }
            };
            summaries[index].count(check.status());
        }
        summaries
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    fn checks_with(&self, status: CheckStatus) -> usize {
        self.check_results
            .iter()
            .filter(|c| c.status() == status)
            .count()
    }

    fn elements_with(&self, status: ElementStatus) -> usize {
        self.check_results
            .iter()
            .flat_map(|c| c.elements())
            .filter(|e| e.check_status == status)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifcore_model::IfcType;

    fn row(status: ElementStatus) -> ElementResult {
        ElementResult::new("IfcDoor", "D1", status).with_comment("reason")
    }

    fn check(statuses: &[ElementStatus]) -> CheckResult {
        CheckResult::new(Uuid::new_v4(), Uuid::new_v4(), "Door Width", "accessibility")
            .with_elements(statuses.iter().copied().map(row).collect())
    }

    #[test]
    fn test_aggregate_precedence() {
        use ElementStatus::*;
        assert_eq!(CheckStatus::aggregate([Pass, Pass, Fail, Blocked]), CheckStatus::Fail);
        assert_eq!(CheckStatus::aggregate([Pass, Blocked, Warning]), CheckStatus::Blocked);
        assert_eq!(CheckStatus::aggregate([Pass, Warning, Log]), CheckStatus::Warning);
        assert_eq!(CheckStatus::aggregate([Pass, Log]), CheckStatus::Pass);
        assert_eq!(CheckStatus::aggregate([Log, Log]), CheckStatus::Unknown);
        assert_eq!(CheckStatus::aggregate([Blocked, Blocked]), CheckStatus::Blocked);
        assert_eq!(CheckStatus::aggregate(Vec::new()), CheckStatus::Unknown);
    }

    #[test]
    fn test_summary_text() {
        use ElementStatus::*;
        let mut statuses = vec![Pass; 9];
        statuses.extend([Fail, Fail, Blocked]);
        let check = check(&statuses);

        assert_eq!(check.summary(), "12 elements: 9 pass, 2 fail, 1 blocked");
        assert_eq!(check.status(), CheckStatus::Fail);
        assert!(check.has_elements());
        assert!(check.elements().iter().all(|e| e.check_result_id == Some(check.id)));

        assert_eq!(summarize(&[row(Log)]), "1 element: 1 log");
    }

    #[test]
    fn test_empty_check_is_unknown() {
        let check = check(&[]);
        assert_eq!(check.status(), CheckStatus::Unknown);
        assert_eq!(check.summary(), NO_ELEMENTS_SUMMARY);
        assert!(!check.has_elements());
    }

    #[test]
    fn test_degraded_check() {
        let check = check(&[ElementStatus::Pass]).degraded("rule panicked: boom");
        assert_eq!(check.status(), CheckStatus::Error);
        assert_eq!(check.summary(), "Error: rule panicked: boom");
        assert!(check.elements().is_empty());
    }

    #[test]
    fn test_deserialize_recomputes_aggregate() {
        let stored = check(&[ElementStatus::Fail]);
        let mut json = serde_json::to_value(&stored).unwrap();
        json["status"] = "pass".into();
        json["summary"] = "all good".into();
        json["has_elements"] = false.into();

        let restored: CheckResult = serde_json::from_value(json).unwrap();
        assert_eq!(restored.status(), CheckStatus::Fail);
        assert_eq!(restored.summary(), "1 element: 1 fail");
        assert!(restored.has_elements());
        assert_eq!(restored, stored);

        // Rows outrank a stored error verdict
        let mut json = serde_json::to_value(&stored).unwrap();
        json["status"] = "error".into();
        let restored: CheckResult = serde_json::from_value(json).unwrap();
        assert_eq!(restored.status(), CheckStatus::Fail);
    }

    #[test]
    fn test_degraded_check_survives_json() {
        let degraded = check(&[]).degraded("rule exceeded its 30s time budget");
        let json = serde_json::to_string(&degraded).unwrap();
        let restored: CheckResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.status(), CheckStatus::Error);
        assert_eq!(restored.summary(), "Error: rule exceeded its 30s time budget");
        assert_eq!(restored, degraded);

        // Without the error status the same empty check is unknown
        let mut json = serde_json::to_value(&degraded).unwrap();
        json["status"] = "fail".into();
        let restored: CheckResult = serde_json::from_value(json).unwrap();
        assert_eq!(restored.status(), CheckStatus::Unknown);
        assert_eq!(restored.summary(), NO_ELEMENTS_SUMMARY);
    }

    #[test]
    fn test_validate_requires_rationale() {
        let bare = ElementResult::new("IfcWall", "W1", ElementStatus::Blocked);
        assert_eq!(
            bare.validate(),
            Err(ContractViolation::MissingRationale("blocked".into()))
        );
        assert!(ElementResult::new("IfcWall", "W1", ElementStatus::Pass).validate().is_ok());
        assert_eq!(
            ElementResult::new("", "W1", ElementStatus::Log).validate(),
            Err(ContractViolation::MissingField("element_type"))
        );
    }

    #[test]
    fn test_raw_record_conversion() {
        let raw: RawElementRecord = serde_json::from_str(
            r#"{"element_id":"2O2Fr$t4X7Zf8NOew3FLOH","element_type":"IfcDoor",
                "element_name":"D1","status":"fail","comment":"too narrow"}"#,
        )
        .unwrap();
        let result = ElementResult::try_from(raw).unwrap();
        assert_eq!(result.check_status, ElementStatus::Fail);
        assert_eq!(result.element_id.as_deref(), Some("2O2Fr$t4X7Zf8NOew3FLOH"));
    }

    #[test]
    fn test_raw_record_rejections() {
        let unknown = RawElementRecord {
            element_type: Some("IfcDoor".into()),
            element_name: Some("D1".into()),
            check_status: Some("unknown".into()),
            ..RawElementRecord::default()
        };
        assert_eq!(
            ElementResult::try_from(unknown),
            Err(ContractViolation::UnknownStatus("unknown".into()))
        );

        let missing = RawElementRecord {
            element_name: Some("D1".into()),
            check_status: Some("pass".into()),
            ..RawElementRecord::default()
        };
        assert_eq!(
            ElementResult::try_from(missing),
            Err(ContractViolation::MissingField("element_type"))
        );
    }

    #[test]
    fn test_for_element_falls_back_to_entity_number() {
        let element = Element::new(12, IfcType::IfcSlab).with_name("Floor");
        let result = ElementResult::for_element(&element, Evaluation::blocked("no thickness"));
        assert_eq!(result.element_id.as_deref(), Some("#12"));
        assert_eq!(result.element_type, "IfcSlab");
        assert_eq!(result.comment.as_deref(), Some("no thickness"));
    }

    #[test]
    fn test_project_aggregations_and_json() {
        use ElementStatus::*;
        let project = Project {
            id: Uuid::new_v4(),
            name: "house.ifc".into(),
            file_url: None,
            user_id: None,
            ifc_schema: Some("IFC4".into()),
            region: Some("ES".into()),
            building_type: None,
            created_at: 0,
            check_results: vec![
                check(&[Pass, Fail]),
                check(&[Pass, Pass]),
                check(&[]).degraded("timeout"),
            ],
        };

        assert_eq!(project.total_checks(), 3);
        assert_eq!(project.passed_checks(), 1);
        assert_eq!(project.failed_checks(), 1);
        assert_eq!(project.degraded_checks(), 1);
        assert_eq!(project.total_elements(), 4);
        assert_eq!(project.passed_elements(), 3);
        assert_eq!(project.failed_elements(), 1);

        let by_provider = project.summary_by_provider();
        assert_eq!(by_provider.len(), 1);
        assert_eq!(by_provider[0].total, 3);
        assert_eq!(by_provider[0].error, 1);

        let json = project.to_json(false).unwrap();
        assert!(json.contains(r#""check_status":"fail""#));
        assert_eq!(Project::from_json(&json).unwrap(), project);
    }
}
