use crate::matching::outcome::{KeywordCluster, Quantity};
use crate::model::HazardClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Classes that need extra regulatory attention whenever they are present.
const HIGH_RISK_CLASSES: &[HazardClass] = &[
    HazardClass::Explosive1_1,
    HazardClass::Explosive1_2,
    HazardClass::Explosive1_3,
    HazardClass::ToxicGas,
    HazardClass::ToxicSubstance,
    HazardClass::InfectiousSubstance,
];

/// Advisory flag raised on detected goods. Flags never block finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegulatoryFlag {
    HighRiskClass {
        un_number: String,
        hazard_class: HazardClass,
    },
    /// More than one primary hazard class is present.
    MixedClasses { classes: Vec<HazardClass> },
    /// Quantity stated in tonnes.
    LargeQuantity { un_number: String, quantity: Quantity },
}

impl fmt::Display for RegulatoryFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegulatoryFlag::HighRiskClass {
                un_number,
                hazard_class,
            } => write!(
                f,
                "UN{}: high-risk class {} ({})",
                un_number,
                hazard_class,
                hazard_class.name()
            ),
            RegulatoryFlag::MixedClasses { classes } => {
                let codes: Vec<&str> = classes.iter().map(|c| c.code()).collect();
                write!(
                    f,
                    "mixed hazard classes ({}), compatibility check required",
                    codes.join(", ")
                )
            }
            RegulatoryFlag::LargeQuantity {
                un_number,
                quantity,
            } => write!(
                f,
                "UN{}: large quantity {} {}, additional permits may be required",
                un_number, quantity.amount, quantity.unit
            ),
        }
    }
}

/// Flags for the best candidate of every cluster, one per UN number and kind.
pub fn regulatory_flags(clusters: &[KeywordCluster]) -> Vec<RegulatoryFlag> {
    let mut flags = Vec::new();
    let mut high_risk_seen = BTreeSet::new();
    let mut large_seen = BTreeSet::new();
    let mut classes = BTreeSet::new();

    for cluster in clusters {
        let entry = &cluster.top().catalog_entry;
        classes.insert(entry.hazard_class);

        if HIGH_RISK_CLASSES.contains(&entry.hazard_class)
            && high_risk_seen.insert(entry.un_number.clone())
        {
            flags.push(RegulatoryFlag::HighRiskClass {
                un_number: entry.un_number.clone(),
                hazard_class: entry.hazard_class,
            });
        }

        if let Some(quantity) = &cluster.details.quantity {
            if is_tonnage(&quantity.unit) && large_seen.insert(entry.un_number.clone()) {
                flags.push(RegulatoryFlag::LargeQuantity {
                    un_number: entry.un_number.clone(),
                    quantity: quantity.clone(),
                });
            }
        }
    }

    if classes.len() > 1 {
        flags.push(RegulatoryFlag::MixedClasses {
            classes: classes.into_iter().collect(),
        });
    }
    flags
}

fn is_tonnage(unit: &str) -> bool {
    matches!(unit, "t" | "tonne" | "tonnes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin::load_preset;
    use crate::matching::match_segments;
    use crate::reconcile::{reconcile, ReconcileOptions};
    use crate::segment::segment;

    fn clusters(text: &str) -> Vec<KeywordCluster> {
        let catalog = load_preset("adg-core").unwrap();
        let segments = segment(text, &[]).unwrap();
        let candidates = match_segments(&segments, &catalog, &Default::default());
        reconcile(&candidates, &ReconcileOptions::default())
    }

    #[test]
    fn test_single_class_no_flags() {
        assert!(regulatory_flags(&clusters("UN1263 Paint 20 L\n")).is_empty());
    }

    #[test]
    fn test_high_risk_and_mixed() {
        let flags = regulatory_flags(&clusters("UN1263 Paint\nUN1689\n"));
        assert!(flags.contains(&RegulatoryFlag::HighRiskClass {
            un_number: "1689".into(),
            hazard_class: HazardClass::ToxicSubstance,
        }));
        assert!(matches!(
            flags.last(),
            Some(RegulatoryFlag::MixedClasses { classes }) if classes.len() == 2
        ));
    }

    #[test]
    fn test_tonnage_flagged() {
        let flags = regulatory_flags(&clusters("UN1942 Ammonium nitrate 12 t\n"));
        assert!(matches!(
            flags.as_slice(),
            [RegulatoryFlag::LargeQuantity { un_number, .. }] if un_number == "1942"
        ));
    }

    #[test]
    fn test_empty() {
        assert!(regulatory_flags(&[]).is_empty());
    }
}
