//! Source/destination divergence classification

use dualsync_core::types::{ObjectSnapshot, ReconciliationDecision};

use crate::router::SizeRouter;

/// Pure decision function over two snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct DivergenceDetector {
    router: SizeRouter,
}

impl DivergenceDetector {
    pub fn new(router: SizeRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &SizeRouter {
        &self.router
    }

    /// Classify what the destination needs.
    ///
    /// Content is recopied when the destination is missing, or when the
    /// checksums differ and the destination is not demonstrably newer.
    /// A newer destination keeps its bytes but still gets metadata/ACL
    /// brought in line with the source.
    pub fn decide(
        &self,
        source: &ObjectSnapshot,
        destination: Option<&ObjectSnapshot>,
    ) -> ReconciliationDecision {
        let destination = match destination {
            Some(d) => d,
            None => return self.router.route(source.size_bytes),
        };

        if source.content_matches(destination) {
            return Self::auxiliary(source, destination);
        }

        if source.created_at >= destination.created_at {
            self.router.route(source.size_bytes)
        } else {
            Self::auxiliary(source, destination)
        }
    }

    /// Metadata/ACL-only classification for content-equal (or content-kept) pairs
    pub fn auxiliary(
        source: &ObjectSnapshot,
        destination: &ObjectSnapshot,
    ) -> ReconciliationDecision {
        ReconciliationDecision::from_diffs(
            !source.metadata_matches(destination),
            !source.acl_matches(destination),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use dualsync_core::types::AclEntry;
    use std::collections::HashMap;

    fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn src(checksum: &str, size: u64) -> ObjectSnapshot {
        ObjectSnapshot::new("photos", "k", checksum, size)
    }

    fn dst(checksum: &str) -> ObjectSnapshot {
        ObjectSnapshot::new("photos-delhi-backup", "k", checksum, 1)
    }

    #[test]
    fn test_missing_destination_routes_by_size() {
        let detector = DivergenceDetector::default();
        assert_eq!(
            detector.decide(&src("a", 9_990_000_000), None),
            ReconciliationDecision::CopyContent
        );
        assert_eq!(
            detector.decide(&src("a", 10_000_000_000), None),
            ReconciliationDecision::OffloadLarge
        );
    }

    #[test]
    fn test_equal_content_compares_auxiliary() {
        let detector = DivergenceDetector::default();
        let source = src("a", 10).with_metadata(meta(&[("a", "1"), ("b", "2")]));

        let same = dst("a").with_metadata(meta(&[("b", "2"), ("a", "1")]));
        assert_eq!(detector.decide(&source, Some(&same)), ReconciliationDecision::NoAction);

        let extra = dst("a").with_metadata(meta(&[("b", "2"), ("a", "1"), ("c", "3")]));
        assert_eq!(
            detector.decide(&source, Some(&extra)),
            ReconciliationDecision::SyncMetadataOnly
        );

        let acl_only = same.clone().with_acl([AclEntry::public_read()].into_iter().collect());
        assert_eq!(
            detector.decide(&source, Some(&acl_only)),
            ReconciliationDecision::SyncAclOnly
        );

        let both = extra.with_acl([AclEntry::public_read()].into_iter().collect());
        assert_eq!(detector.decide(&source, Some(&both)), ReconciliationDecision::SyncBoth);
    }

    #[test]
    fn test_stale_destination_is_recopied() {
        let detector = DivergenceDetector::default();
        let now = Utc::now();
        let source = src("new", 10).with_created_at(now);
        let older = dst("old").with_created_at(now - Duration::seconds(60));
        let same_time = dst("old").with_created_at(now);

        assert_eq!(detector.decide(&source, Some(&older)), ReconciliationDecision::CopyContent);
        assert_eq!(
            detector.decide(&source, Some(&same_time)),
            ReconciliationDecision::CopyContent
        );

        let big = src("new", 20_000_000_000).with_created_at(now);
        assert_eq!(detector.decide(&big, Some(&older)), ReconciliationDecision::OffloadLarge);
    }

    #[test]
    fn test_newer_destination_falls_through_to_auxiliary() {
        let detector = DivergenceDetector::default();
        let now = Utc::now();
        let source = src("old", 10)
            .with_created_at(now - Duration::seconds(60))
            .with_metadata(meta(&[("a", "1")]));
        let newer = dst("new").with_created_at(now);

        assert_eq!(
            detector.decide(&source, Some(&newer)),
            ReconciliationDecision::SyncMetadataOnly
        );

        let newer_synced = newer.with_metadata(meta(&[("a", "1")]));
        assert_eq!(
            detector.decide(&source, Some(&newer_synced)),
            ReconciliationDecision::NoAction
        );
    }
}
