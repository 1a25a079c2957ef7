//! Lifecycle hooks
//!
//! Cleanup of consumed change requests and erasure of stale report entries
//! are owned by the caller. The generator only hands its storage handles to
//! the supplied functions and returns whatever they return.

use crate::change_request::AggregatedChangeRequests;
use crate::errors::Result;
use crate::model::Document;
use crate::updater::{MergeOutcome, ReportUpdater};

/// Hooks for periodic cleanup of change requests and report entries
pub trait PolicyReportEraser {
    type Client;
    type ChangeRequestLister;
    type ClusterChangeRequestLister;
    type ReportLister;
    type ClusterReportLister;

    /// Run `cleanup` over the consumed change requests
    fn cleanup_report_change_requests<F, E>(&self, cleanup: F) -> std::result::Result<(), E>
    where
        F: FnOnce(
            &Self::Client,
            &Self::ChangeRequestLister,
            &Self::ClusterChangeRequestLister,
        ) -> std::result::Result<(), E>;

    /// Run `erase` over the stored reports
    fn erase_results_entries<F, E>(&self, erase: F) -> std::result::Result<(), E>
    where
        F: FnOnce(
            &Self::Client,
            &Self::ReportLister,
            &Self::ClusterReportLister,
        ) -> std::result::Result<(), E>;
}

/// Owns the storage handles of a reporting pipeline and merges reports
pub struct ReportGenerator<C, RCR, CRCR, PR, CPR> {
    client: C,
    change_request_lister: RCR,
    cluster_change_request_lister: CRCR,
    report_lister: PR,
    cluster_report_lister: CPR,
    updater: ReportUpdater,
}

impl<C, RCR, CRCR, PR, CPR> ReportGenerator<C, RCR, CRCR, PR, CPR> {
    pub fn new(
        client: C,
        change_request_lister: RCR,
        cluster_change_request_lister: CRCR,
        report_lister: PR,
        cluster_report_lister: CPR,
        updater: ReportUpdater,
    ) -> Self {
        Self {
            client,
            change_request_lister,
            cluster_change_request_lister,
            report_lister,
            cluster_report_lister,
            updater,
        }
    }

    pub fn updater(&self) -> &ReportUpdater {
        &self.updater
    }

    /// Run one merge cycle with this generator's settings
    pub fn merge(
        &self,
        old_report: &Document,
        new_report: Document,
        requests: &AggregatedChangeRequests,
    ) -> Result<MergeOutcome> {
        self.updater.update_results(old_report, new_report, requests)
    }
}

impl<C, RCR, CRCR, PR, CPR> PolicyReportEraser for ReportGenerator<C, RCR, CRCR, PR, CPR> {
    type Client = C;
    type ChangeRequestLister = RCR;
    type ClusterChangeRequestLister = CRCR;
    type ReportLister = PR;
    type ClusterReportLister = CPR;

    fn cleanup_report_change_requests<F, E>(&self, cleanup: F) -> std::result::Result<(), E>
    where
        F: FnOnce(
            &Self::Client,
            &Self::ChangeRequestLister,
            &Self::ClusterChangeRequestLister,
        ) -> std::result::Result<(), E>,
    {
        cleanup(
            &self.client,
            &self.change_request_lister,
            &self.cluster_change_request_lister,
        )
    }

    fn erase_results_entries<F, E>(&self, erase: F) -> std::result::Result<(), E>
    where
        F: FnOnce(
            &Self::Client,
            &Self::ReportLister,
            &Self::ClusterReportLister,
        ) -> std::result::Result<(), E>,
    {
        erase(&self.client, &self.report_lister, &self.cluster_report_lister)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct Client {
        calls: RefCell<Vec<String>>,
    }

    #[derive(Debug, PartialEq)]
    struct Lister(&'static str);

    #[derive(Debug, PartialEq)]
    enum HookError {
        Unavailable(String),
    }

    fn generator() -> ReportGenerator<Client, Lister, Lister, Lister, Lister> {
        ReportGenerator::new(
            Client::default(),
            Lister("rcr"),
            Lister("crcr"),
            Lister("polr"),
            Lister("cpolr"),
            ReportUpdater::default(),
        )
    }

    #[test]
    fn test_cleanup_receives_change_request_handles() {
        let generator = generator();
        let outcome: std::result::Result<(), HookError> =
            generator.cleanup_report_change_requests(|client, rcr, crcr| {
                client
                    .calls
                    .borrow_mut()
                    .push(format!("cleanup {} {}", rcr.0, crcr.0));
                Ok(())
            });

        assert!(outcome.is_ok());
        assert_eq!(generator.client.calls.borrow().as_slice(), ["cleanup rcr crcr"]);
    }

    #[test]
    fn test_erase_receives_report_handles() {
        let generator = generator();
        let outcome: std::result::Result<(), HookError> =
            generator.erase_results_entries(|client, polr, cpolr| {
                client
                    .calls
                    .borrow_mut()
                    .push(format!("erase {} {}", polr.0, cpolr.0));
                Ok(())
            });

        assert!(outcome.is_ok());
        assert_eq!(generator.client.calls.borrow().as_slice(), ["erase polr cpolr"]);
    }

    #[test]
    fn test_hook_errors_are_returned_untouched() {
        let generator = generator();
        let err = generator
            .erase_results_entries(|_, _, _| Err(HookError::Unavailable("api server".to_string())))
            .unwrap_err();
        assert_eq!(err, HookError::Unavailable("api server".to_string()));
    }

    #[test]
    fn test_generator_merges_with_its_updater() {
        let generator = generator();
        let new_report = match json!({"results": [{
            "policy": "p",
            "rule": "r",
            "result": "pass",
            "resources": [{"kind": "Pod", "namespace": "x", "name": "y"}]
        }]}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };

        let outcome = generator
            .merge(&Document::new(), new_report, &AggregatedChangeRequests::default())
            .unwrap();
        assert_eq!(outcome.summary.pass, 1);
        assert_eq!(generator.updater().mode(), crate::table::SeedingMode::Compatible);
    }
}
