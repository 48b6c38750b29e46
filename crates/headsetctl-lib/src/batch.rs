//! Run one set of capability requests against every discovered headset.

use std::fmt;

use serde::Serialize;

use crate::capability::CapabilityKind;
use crate::config::Disambiguation;
use crate::context::DispatchOptions;
use crate::discovery::DiscoveredHeadset;
use crate::dispatch::{FeatureRequest, FeatureResult, FeatureStatus, process_requests};
use crate::error::{HeadsetError, HeadsetResult};
use crate::hid::HidBackend;

pub const MULTIPLE_DEVICES_HINT: &str = "Multiple devices, specify with -d";
pub const FIRST_DEVICE_ONLY_HINT: &str = "Multiple devices, action sent to the first one only";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Failure,
    Partial,
}

impl OverallStatus {
    /// Success when every attempted request succeeded, failure when none
    /// did, partial otherwise. Requests skipped with a reason (an action held
    /// back because several headsets are attached) count as failed; plain
    /// unprocessed requests are ignored.
    pub fn of(results: &[FeatureResult]) -> OverallStatus {
        let (mut ok, mut failed) = (0usize, 0usize);
        for r in results {
            match r.status {
                FeatureStatus::Success | FeatureStatus::Info => ok += 1,
                FeatureStatus::NotProcessed if r.message.is_empty() => {}
                _ => failed += 1,
            }
        }
        match (ok, failed) {
            (_, 0) => OverallStatus::Success,
            (0, _) => OverallStatus::Failure,
            _ => OverallStatus::Partial,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Success => "success",
            OverallStatus::Failure => "failure",
            OverallStatus::Partial => "partial",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a batch on one headset.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub device: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub status: OverallStatus,
    pub results: Vec<FeatureResult>,
}

impl DeviceReport {
    /// Results that were actually attempted.
    pub fn processed(&self) -> impl Iterator<Item = &FeatureResult> {
        self.results
            .iter()
            .filter(|r| r.status != FeatureStatus::NotProcessed)
    }
}

/// Batch behaviour knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub dispatch: DispatchOptions,
    pub disambiguation: Disambiguation,
    /// Silently drop info requests a headset doesn't support instead of
    /// reporting them as errors.
    pub only_supported_info: bool,
}

/// Run `requests` against every headset, in discovery order.
///
/// One headset's failure never stops the batch. Fails only when several
/// headsets are attached, action requests are present and the policy is
/// [`Disambiguation::Error`].
pub fn run_batch(
    headsets: &[DiscoveredHeadset<'_>],
    backend: &dyn HidBackend,
    requests: &[FeatureRequest],
    options: BatchOptions,
) -> HeadsetResult<Vec<DeviceReport>> {
    let ambiguous = headsets.len() > 1
        && requests
            .iter()
            .any(|r| r.should_process && r.kind == CapabilityKind::Action);
    if ambiguous && options.disambiguation == Disambiguation::Error {
        return Err(HeadsetError::Discovery(MULTIPLE_DEVICES_HINT.to_string()));
    }

    let mut reports = Vec::with_capacity(headsets.len());
    for (index, headset) in headsets.iter().enumerate() {
        let mut instance = headset.instance(backend, options.dispatch);
        let supported = instance.capabilities();

        let mut pending: Vec<FeatureRequest> = requests.to_vec();
        for req in pending.iter_mut() {
            if req.kind == CapabilityKind::Info
                && options.only_supported_info
                && !supported.contains(req.capability)
            {
                req.should_process = false;
            }
            if ambiguous && req.kind == CapabilityKind::Action {
                match options.disambiguation {
                    Disambiguation::Warn => {
                        req.result = FeatureResult::skipped(req.capability, MULTIPLE_DEVICES_HINT);
                    }
                    Disambiguation::First if index > 0 => {
                        req.result =
                            FeatureResult::skipped(req.capability, FIRST_DEVICE_ONLY_HINT);
                    }
                    _ => {}
                }
            }
        }

        process_requests(&mut instance, &mut pending);
        instance.release();

        let results: Vec<FeatureResult> = pending
            .into_iter()
            .filter(|r| r.should_process)
            .map(|r| r.result)
            .collect();
        let status = OverallStatus::of(&results);
        log::debug!("{}: batch finished ({status:?})", headset.name());
        reports.push(DeviceReport {
            device: headset.name().to_string(),
            vendor_id: headset.vendor_id,
            product_id: headset.product_id,
            status,
            results,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::config::Config;
    use crate::discovery::discover;
    use crate::dispatch::FeatureParam;
    use crate::error::DeviceError;
    use crate::hid::mock::{FakeBackend, entry};
    use crate::registry::Registry;

    fn two_headsets() -> FakeBackend {
        FakeBackend::new(vec![
            entry(0x046d, 0x0a66, 0, 0xff43, 0x0202),
            entry(0x046d, 0x0a66, 3, 0xff00, 0x0001),
        ])
    }

    fn test_config() -> Config {
        Config {
            test_device: true,
            ..Config::default()
        }
    }

    #[test]
    fn overall_status_rules() {
        let mut good = FeatureResult::not_processed(Capability::Battery);
        good.status = FeatureStatus::Success;
        let err = FeatureResult::error(Capability::Battery, DeviceError::timeout("x"));
        let untouched = FeatureResult::not_processed(Capability::Lights);

        assert_eq!(OverallStatus::of(&[good.clone()]), OverallStatus::Success);
        assert_eq!(OverallStatus::of(&[err.clone()]), OverallStatus::Failure);
        assert_eq!(
            OverallStatus::of(&[good.clone(), err]),
            OverallStatus::Partial
        );
        assert_eq!(
            OverallStatus::of(&[good.clone(), untouched.clone()]),
            OverallStatus::Success
        );
        assert_eq!(OverallStatus::of(&[untouched]), OverallStatus::Success);
    }

    #[test]
    fn skipped_actions_are_not_success() {
        let mut good = FeatureResult::not_processed(Capability::Battery);
        good.status = FeatureStatus::Success;
        let skipped = FeatureResult::skipped(Capability::Sidetone, MULTIPLE_DEVICES_HINT);

        assert_eq!(OverallStatus::of(&[skipped.clone()]), OverallStatus::Failure);
        assert_eq!(OverallStatus::of(&[good, skipped]), OverallStatus::Partial);
        assert_eq!(OverallStatus::Partial.to_string(), "partial");
    }

    #[test]
    fn ambiguous_action_reports_failure_on_every_headset() {
        let registry = Registry::builtin();
        let backend = two_headsets();
        let headsets = discover(&backend, &registry, &test_config()).unwrap();
        let requests = [FeatureRequest::new(Capability::Sidetone, FeatureParam::Int(32))];
        let reports = run_batch(&headsets, &backend, &requests, BatchOptions::default()).unwrap();

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert_eq!(report.status, OverallStatus::Failure, "{}", report.device);
            assert_eq!(report.results[0].status, FeatureStatus::NotProcessed);
        }
        assert_eq!(backend.state.io_count(), 0);
    }

    #[test]
    fn actions_skipped_when_ambiguous() {
        let registry = Registry::builtin();
        let backend = two_headsets();
        let headsets = discover(&backend, &registry, &test_config()).unwrap();
        assert_eq!(headsets.len(), 2);

        let requests = [
            FeatureRequest::new(Capability::Sidetone, FeatureParam::Int(32)),
            FeatureRequest::query(Capability::Chatmix),
        ];
        let reports = run_batch(&headsets, &backend, &requests, BatchOptions::default()).unwrap();
        assert_eq!(reports.len(), 2);

        let test = &reports[0];
        assert_eq!(test.results[0].status, FeatureStatus::NotProcessed);
        assert_eq!(test.results[0].message, MULTIPLE_DEVICES_HINT);
        assert_eq!(test.results[0].value, -1);
        assert!(test.results[1].is_success());
        assert_eq!(test.status, OverallStatus::Partial);

        // chatmix unsupported on the G533 and nothing was written
        let g533 = &reports[1];
        assert_eq!(g533.status, OverallStatus::Failure);
        assert_eq!(backend.state.io_count(), 0);
    }

    #[test]
    fn first_policy_runs_actions_once() {
        let registry = Registry::builtin();
        let backend = two_headsets();
        let headsets = discover(&backend, &registry, &test_config()).unwrap();
        let requests = [FeatureRequest::new(Capability::Sidetone, FeatureParam::Int(32))];
        let options = BatchOptions {
            disambiguation: Disambiguation::First,
            ..BatchOptions::default()
        };
        let reports = run_batch(&headsets, &backend, &requests, options).unwrap();
        assert!(reports[0].results[0].is_success());
        assert_eq!(reports[0].status, OverallStatus::Success);
        assert_eq!(reports[1].results[0].message, FIRST_DEVICE_ONLY_HINT);
        assert_eq!(reports[1].status, OverallStatus::Failure);
        assert_eq!(backend.state.opens(), 0);
    }

    #[test]
    fn error_policy_refuses() {
        let registry = Registry::builtin();
        let backend = two_headsets();
        let headsets = discover(&backend, &registry, &test_config()).unwrap();
        let requests = [FeatureRequest::new(Capability::Sidetone, FeatureParam::Int(32))];
        let options = BatchOptions {
            disambiguation: Disambiguation::Error,
            ..BatchOptions::default()
        };
        let err = run_batch(&headsets, &backend, &requests, options).unwrap_err();
        assert!(err.to_string().contains(MULTIPLE_DEVICES_HINT));

        // info-only batches are never ambiguous
        let requests = [FeatureRequest::query(Capability::Battery)];
        assert!(run_batch(&headsets, &backend, &requests, options).is_ok());
    }

    #[test]
    fn only_supported_info_drops_unsupported_queries() {
        let registry = Registry::builtin();
        let backend = two_headsets();
        backend
            .state
            .queue_read(vec![0x11, 0xff, 0x07, 0x01, 0x0F, 0x0A, 0x01]);
        let headsets = discover(&backend, &registry, &test_config()).unwrap();
        let requests = [
            FeatureRequest::query(Capability::Battery),
            FeatureRequest::query(Capability::Chatmix),
        ];
        let options = BatchOptions {
            only_supported_info: true,
            ..BatchOptions::default()
        };
        let reports = run_batch(&headsets, &backend, &requests, options).unwrap();
        assert_eq!(reports[0].results.len(), 2);
        assert_eq!(reports[1].results.len(), 1);
        assert_eq!(reports[1].status, OverallStatus::Success);
        assert_eq!(reports[1].results[0].value, 50);
        assert_eq!(backend.state.closes.get(), 1);
    }

    #[test]
    fn single_headset_is_never_ambiguous() {
        let registry = Registry::builtin();
        let backend = FakeBackend::new(vec![]);
        let headsets = discover(&backend, &registry, &test_config()).unwrap();
        let requests = [FeatureRequest::new(Capability::Lights, FeatureParam::Int(1))];
        let reports = run_batch(&headsets, &backend, &requests, BatchOptions::default()).unwrap();
        assert!(reports[0].results[0].is_success());
        assert_eq!(reports[0].processed().count(), 1);
    }
}
