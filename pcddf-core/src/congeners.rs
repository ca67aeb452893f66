//! Registry of the tracked PCDD/F congeners.
//!
//! The order of [`CONGENERS`] is the canonical row order of every table used by the models.
//! Tables read from disk are reindexed to this order before use.

/// The 2,3,7,8-substituted dibenzo-p-dioxins and dibenzofurans, in canonical order.
pub const CONGENERS: [&str; 17] = [
    "2,3,7,8-TCDD",
    "1,2,3,7,8-PeCDD",
    "1,2,3,4,7,8-HxCDD",
    "1,2,3,6,7,8-HxCDD",
    "1,2,3,7,8,9-HxCDD",
    "1,2,3,4,6,7,8-HpCDD",
    "OCDD",
    "2,3,7,8-TCDF",
    "1,2,3,7,8-PeCDF",
    "2,3,4,7,8-PeCDF",
    "1,2,3,4,7,8-HxCDF",
    "1,2,3,6,7,8-HxCDF",
    "1,2,3,7,8,9-HxCDF",
    "2,3,4,6,7,8-HxCDF",
    "1,2,3,4,6,7,8-HpCDF",
    "1,2,3,4,7,8,9-HpCDF",
    "OCDF",
];

/// Canonical congener keys as owned strings, ready to pass to [`crate::table::Table::reindex`].
pub fn congener_keys() -> Vec<String> {
    CONGENERS.iter().map(|c| c.to_string()).collect()
}

/// Position of a congener in the canonical order
pub fn position(congener: &str) -> Option<usize> {
    CONGENERS.iter().position(|c| *c == congener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_congeners_are_unique() {
        let unique: HashSet<_> = CONGENERS.iter().collect();
        assert_eq!(unique.len(), CONGENERS.len());
    }

    #[test]
    fn test_position_follows_canonical_order() {
        assert_eq!(position("2,3,7,8-TCDD"), Some(0));
        assert_eq!(position("OCDF"), Some(16));
        assert_eq!(position("PCB-126"), None);
    }
}
