use crate::types::NutritionStatus;

/// Grades acute malnutrition from anthropometry.
pub trait NutritionClassifier: Send + Sync {
    fn classify(&self, muac_cm: Option<f64>, edema: bool) -> NutritionStatus;
}

/// MUAC cut-offs for children 6 to 59 months.
#[derive(Debug, Clone, Copy)]
pub struct MuacThresholds {
    pub sam_below_cm: f64,
    pub mam_below_cm: f64,
}

impl MuacThresholds {
    pub const WHO: MuacThresholds = MuacThresholds {
        sam_below_cm: 11.5,
        mam_below_cm: 12.5,
    };
}

impl Default for MuacThresholds {
    fn default() -> Self {
        Self::WHO
    }
}

impl NutritionClassifier for MuacThresholds {
    fn classify(&self, muac_cm: Option<f64>, edema: bool) -> NutritionStatus {
        // bilateral pitting edema is SAM regardless of MUAC
        if edema {
            return NutritionStatus::Sam;
        }
        match muac_cm {
            Some(m) if m < self.sam_below_cm => NutritionStatus::Sam,
            Some(m) if m < self.mam_below_cm => NutritionStatus::Mam,
            _ => NutritionStatus::Normal,
        }
    }
}

pub fn classify(muac_cm: Option<f64>, edema: bool) -> NutritionStatus {
    MuacThresholds::WHO.classify(muac_cm, edema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn who_cut_offs() {
        assert_eq!(classify(Some(11.4), false), NutritionStatus::Sam);
        assert_eq!(classify(Some(11.5), false), NutritionStatus::Mam);
        assert_eq!(classify(Some(12.4), false), NutritionStatus::Mam);
        assert_eq!(classify(Some(12.5), false), NutritionStatus::Normal);
        assert_eq!(classify(None, false), NutritionStatus::Normal);
    }

    #[test]
    fn edema_is_always_sam() {
        assert_eq!(classify(Some(14.0), true), NutritionStatus::Sam);
        assert_eq!(classify(None, true), NutritionStatus::Sam);
    }

    #[test]
    fn thresholds_are_configurable() {
        let strict = MuacThresholds {
            sam_below_cm: 12.0,
            mam_below_cm: 13.0,
        };
        assert_eq!(strict.classify(Some(11.8), false), NutritionStatus::Sam);
        assert_eq!(strict.classify(Some(12.8), false), NutritionStatus::Mam);
        let who = MuacThresholds::default();
        assert_eq!(who.classify(Some(11.8), false), NutritionStatus::Mam);
    }
}
