use crate::enums::SelectionItem;
use crate::structs::{CutRecord, DatasetCutFlow, DatasetSample, PlotRecord, DEFAULT_REGION};
use serde::{Deserialize, Serialize};

/// Everything the external engines measured during one analysis run.
///
/// `cutflows` is parallel to `datasets`. The core only reads a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub datasets: Vec<DatasetSample>,
    /// Region names in registration order.
    #[serde(default)]
    pub regions: Vec<String>,
    /// Cuts in execution order.
    #[serde(default)]
    pub cuts: Vec<CutRecord>,
    #[serde(default)]
    pub cutflows: Vec<DatasetCutFlow>,
    #[serde(default)]
    pub plots: Vec<PlotRecord>,
    #[serde(default)]
    pub selection: Vec<SelectionItem>,
}

impl AnalysisSession {
    /// The regions to report, falling back to the implicit default region.
    pub fn region_names(&self) -> Vec<&str> {
        if self.regions.is_empty() {
            vec![DEFAULT_REGION]
        } else {
            self.regions.iter().map(String::as_str).collect()
        }
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.region_names().contains(&region)
    }

    /// The cuts applied in `region`, in execution order.
    pub fn cuts_in_region<'a, 'r>(
        &'a self,
        region: &'r str,
    ) -> impl Iterator<Item = &'a CutRecord> + use<'a, 'r> {
        self.cuts.iter().filter(move |cut| cut.belongs_to(region))
    }

    /// Position of the session-wide cut `index` within `region`'s cut sequence.
    pub fn position_in_region(&self, region: &str, index: usize) -> Option<usize> {
        let cut = self.cuts.get(index)?;
        if !cut.belongs_to(region) {
            return None;
        }
        Some(
            self.cuts[..index]
                .iter()
                .filter(|c| c.belongs_to(region))
                .count(),
        )
    }

    pub fn dataset(&self, name: &str) -> Option<(usize, &DatasetSample)> {
        self.datasets.iter().enumerate().find(|(_, d)| d.name == name)
    }

    pub fn has_signal(&self) -> bool {
        self.datasets.iter().any(|d| !d.background)
    }

    pub fn has_background(&self) -> bool {
        self.datasets.iter().any(|d| d.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::CutKind;

    fn session_with_regions() -> AnalysisSession {
        AnalysisSession {
            regions: vec!["SR".into(), "CR".into()],
            cuts: vec![
                CutRecord::new("MET > 50", CutKind::Select).with_regions(["SR", "CR"]),
                CutRecord::new("N(j) < 2", CutKind::Reject).with_regions(["CR"]),
                CutRecord::new("PT(a[1]) > 30", CutKind::Select).with_regions(["SR", "CR"]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn default_region_is_used_without_registration() {
        let session = AnalysisSession::default();
        assert_eq!(session.region_names(), vec![DEFAULT_REGION]);
        assert!(session.has_region(DEFAULT_REGION));
    }

    #[test]
    fn regions_keep_registration_order() {
        let session = session_with_regions();
        assert_eq!(session.region_names(), vec!["SR", "CR"]);
        let names: Vec<_> = session.cuts_in_region("SR").map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["MET > 50", "PT(a[1]) > 30"]);
    }

    #[test]
    fn region_cuts_outlive_the_region_name() {
        let session = session_with_regions();
        let cuts: Vec<&CutRecord> = {
            let region = String::from("CR");
            session.cuts_in_region(&region).collect()
        };
        assert_eq!(cuts.len(), 3);
        assert_eq!(cuts[1].kind, CutKind::Reject);
    }

    #[test]
    fn session_cut_index_maps_to_region_position() {
        let session = session_with_regions();
        assert_eq!(session.position_in_region("SR", 2), Some(1));
        assert_eq!(session.position_in_region("CR", 2), Some(2));
        assert_eq!(session.position_in_region("SR", 1), None);
        assert_eq!(session.position_in_region("SR", 7), None);
    }
}
