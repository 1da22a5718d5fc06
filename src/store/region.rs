//! Region availability check for the managed service.
//!
//! The check is best effort: an unknown or unset region only produces a
//! warning, never an error.

use tracing::{info, warn};

/// Regions where the anomaly-detection service is offered.
pub const SUPPORTED_REGIONS: &[&str] = &["us-east-1", "eu-west-1", "ap-northeast-2"];

/// Outcome of a region check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionCheck {
    Supported(String),
    Unsupported(String),
    /// No region configured, so availability could not be checked.
    Unknown,
}

/// Check `region` against [`SUPPORTED_REGIONS`].
pub fn check_region(region: Option<&str>) -> RegionCheck {
    match region.map(str::trim).filter(|r| !r.is_empty()) {
        None => RegionCheck::Unknown,
        Some(r) if SUPPORTED_REGIONS.contains(&r) => RegionCheck::Supported(r.to_string()),
        Some(r) => RegionCheck::Unsupported(r.to_string()),
    }
}

/// Run [`check_region`] and log the outcome.
pub fn warn_if_unavailable(region: Option<&str>) -> RegionCheck {
    let check = check_region(region);
    match &check {
        RegionCheck::Supported(r) => info!(region = %r, "service is available in region"),
        RegionCheck::Unsupported(r) => warn!(
            region = %r,
            supported = %SUPPORTED_REGIONS.join(", "),
            "service is not available in this region; model calls will fail"
        ),
        RegionCheck::Unknown => warn!(
            "could not determine the service region; set `service.region` to check availability"
        ),
    }
    check
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_region() {
        assert_eq!(check_region(Some("eu-west-1")), RegionCheck::Supported("eu-west-1".into()));
    }

    #[test]
    fn test_unsupported_region() {
        assert_eq!(check_region(Some("sa-east-1")), RegionCheck::Unsupported("sa-east-1".into()));
    }

    #[test]
    fn test_missing_region_is_unknown() {
        assert_eq!(check_region(None), RegionCheck::Unknown);
        assert_eq!(check_region(Some("  ")), RegionCheck::Unknown);
    }
}
