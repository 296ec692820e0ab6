use serde::{Deserialize, Serialize};
use std::fmt;

/// IMDG/ADG hazard class or division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HazardClass {
    Explosive,
    Explosive1_1,
    Explosive1_2,
    Explosive1_3,
    Explosive1_4,
    Explosive1_5,
    Explosive1_6,
    Gas,
    FlammableGas,
    NonFlammableGas,
    ToxicGas,
    FlammableLiquid,
    Solid,
    FlammableSolid,
    SpontaneouslyCombustible,
    DangerousWhenWet,
    Oxidizing,
    Oxidizer,
    OrganicPeroxide,
    Toxic,
    ToxicSubstance,
    InfectiousSubstance,
    Radioactive,
    Corrosive,
    Miscellaneous,
}

const ALL_CLASSES: &[HazardClass] = &[
    HazardClass::Explosive,
    HazardClass::Explosive1_1,
    HazardClass::Explosive1_2,
    HazardClass::Explosive1_3,
    HazardClass::Explosive1_4,
    HazardClass::Explosive1_5,
    HazardClass::Explosive1_6,
    HazardClass::Gas,
    HazardClass::FlammableGas,
    HazardClass::NonFlammableGas,
    HazardClass::ToxicGas,
    HazardClass::FlammableLiquid,
    HazardClass::Solid,
    HazardClass::FlammableSolid,
    HazardClass::SpontaneouslyCombustible,
    HazardClass::DangerousWhenWet,
    HazardClass::Oxidizing,
    HazardClass::Oxidizer,
    HazardClass::OrganicPeroxide,
    HazardClass::Toxic,
    HazardClass::ToxicSubstance,
    HazardClass::InfectiousSubstance,
    HazardClass::Radioactive,
    HazardClass::Corrosive,
    HazardClass::Miscellaneous,
];

impl HazardClass {
    /// Class code as written on documents and labels (e.g., "4.1").
    pub fn code(&self) -> &'static str {
        match self {
            HazardClass::Explosive => "1",
            HazardClass::Explosive1_1 => "1.1",
            HazardClass::Explosive1_2 => "1.2",
            HazardClass::Explosive1_3 => "1.3",
            HazardClass::Explosive1_4 => "1.4",
            HazardClass::Explosive1_5 => "1.5",
            HazardClass::Explosive1_6 => "1.6",
            HazardClass::Gas => "2",
            HazardClass::FlammableGas => "2.1",
            HazardClass::NonFlammableGas => "2.2",
            HazardClass::ToxicGas => "2.3",
            HazardClass::FlammableLiquid => "3",
            HazardClass::Solid => "4",
            HazardClass::FlammableSolid => "4.1",
            HazardClass::SpontaneouslyCombustible => "4.2",
            HazardClass::DangerousWhenWet => "4.3",
            HazardClass::Oxidizing => "5",
            HazardClass::Oxidizer => "5.1",
            HazardClass::OrganicPeroxide => "5.2",
            HazardClass::Toxic => "6",
            HazardClass::ToxicSubstance => "6.1",
            HazardClass::InfectiousSubstance => "6.2",
            HazardClass::Radioactive => "7",
            HazardClass::Corrosive => "8",
            HazardClass::Miscellaneous => "9",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HazardClass::Explosive => "Explosives",
            HazardClass::Explosive1_1 => "Explosives (mass explosion hazard)",
            HazardClass::Explosive1_2 => "Explosives (projection hazard)",
            HazardClass::Explosive1_3 => "Explosives (fire hazard)",
            HazardClass::Explosive1_4 => "Explosives (minor hazard)",
            HazardClass::Explosive1_5 => "Very insensitive explosives",
            HazardClass::Explosive1_6 => "Extremely insensitive articles",
            HazardClass::Gas => "Gases",
            HazardClass::FlammableGas => "Flammable gas",
            HazardClass::NonFlammableGas => "Non-flammable, non-toxic gas",
            HazardClass::ToxicGas => "Toxic gas",
            HazardClass::FlammableLiquid => "Flammable liquid",
            HazardClass::Solid => "Flammable solids",
            HazardClass::FlammableSolid => "Flammable solid",
            HazardClass::SpontaneouslyCombustible => "Spontaneously combustible",
            HazardClass::DangerousWhenWet => "Dangerous when wet",
            HazardClass::Oxidizing => "Oxidizing substances",
            HazardClass::Oxidizer => "Oxidizing substance",
            HazardClass::OrganicPeroxide => "Organic peroxide",
            HazardClass::Toxic => "Toxic and infectious substances",
            HazardClass::ToxicSubstance => "Toxic substance",
            HazardClass::InfectiousSubstance => "Infectious substance",
            HazardClass::Radioactive => "Radioactive material",
            HazardClass::Corrosive => "Corrosive substance",
            HazardClass::Miscellaneous => "Miscellaneous dangerous goods",
        }
    }

    /// The class a division belongs to (`4.1` -> `4`). Top-level classes have no parent.
    pub fn parent(&self) -> Option<HazardClass> {
        let code = self.code();
        let (class, _) = code.split_once('.')?;
        HazardClass::from_code(class)
    }

    pub fn from_code(code: &str) -> Option<HazardClass> {
        let code = code.trim();
        let code = code
            .strip_prefix("Class ")
            .or_else(|| code.strip_prefix("class "))
            .unwrap_or(code)
            .trim();
        ALL_CLASSES.iter().copied().find(|c| c.code() == code)
    }

    pub fn all() -> &'static [HazardClass] {
        ALL_CLASSES
    }
}

impl fmt::Display for HazardClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<String> for HazardClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HazardClass::from_code(&value)
            .ok_or_else(|| format!("unrecognized hazard class '{}'", value))
    }
}

impl From<HazardClass> for String {
    fn from(value: HazardClass) -> Self {
        value.code().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PackingGroup {
    I,
    II,
    III,
}

impl PackingGroup {
    /// Accepts "I", "II", "III", arabic "1"-"3" and a leading "PG".
    pub fn from_str_loose(s: &str) -> Option<PackingGroup> {
        let upper = s.trim().to_uppercase();
        let stripped = upper
            .strip_prefix("PG")
            .or_else(|| upper.strip_prefix("PACKING GROUP"))
            .unwrap_or(&upper)
            .trim();
        match stripped {
            "I" | "1" => Some(PackingGroup::I),
            "II" | "2" => Some(PackingGroup::II),
            "III" | "3" => Some(PackingGroup::III),
            _ => None,
        }
    }
}

impl fmt::Display for PackingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackingGroup::I => write!(f, "I"),
            PackingGroup::II => write!(f, "II"),
            PackingGroup::III => write!(f, "III"),
        }
    }
}

/// One searchable line of an extracted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub id: String,
    /// 1-based page number.
    pub page: usize,
    /// 0-based line index within the page.
    pub line_index: usize,
    pub text: String,
    /// Byte offset of the line start within the raw document text.
    pub char_offset: usize,
}
