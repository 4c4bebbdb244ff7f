use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Parse a free-text numeric field. Blank, malformed and negative input all
/// read as "field absent".
pub fn parse_field<T>(raw: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let value = raw.trim().parse::<T>().ok()?;
    if value < T::default() {
        None
    } else {
        Some(value)
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub location: Option<GeoPoint>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

/// Raw text as typed into the patient info step.
#[derive(Debug, Clone, Default)]
pub struct PatientForm {
    pub age: String,
    pub gender: String,
    pub lat: String,
    pub lng: String,
    pub medical_history: String,
    pub allergies: String,
}

impl From<&PatientForm> for PatientInfo {
    fn from(form: &PatientForm) -> Self {
        let lat = form.lat.trim().parse::<f64>().ok();
        let lng = form.lng.trim().parse::<f64>().ok();
        Self {
            age: parse_field(&form.age),
            gender: non_blank(&form.gender),
            location: lat.zip(lng).map(|(lat, lng)| GeoPoint { lat, lng }),
            medical_history: non_blank(&form.medical_history),
            allergies: non_blank(&form.allergies),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomInput {
    selected: Vec<String>,
    pub free_text: String,
    pub duration_minutes: Option<u32>,
    pub reported_severity: Option<String>,
}

impl SymptomInput {
    pub fn new(selected: impl IntoIterator<Item = impl Into<String>>, free_text: impl Into<String>) -> Self {
        let mut input = Self {
            free_text: free_text.into(),
            ..Self::default()
        };
        for tag in selected {
            input.select(tag);
        }
        input
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Add a symptom tag. Returns false if it was already selected.
    pub fn select(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.selected.contains(&tag) {
            return false;
        }
        self.selected.push(tag);
        true
    }

    pub fn deselect(&mut self, tag: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|t| t != tag);
        before != self.selected.len()
    }

    pub fn toggle(&mut self, tag: &str) {
        if !self.deselect(tag) {
            self.select(tag);
        }
    }

    /// Selected tags followed by comma-split free text tokens, trimmed,
    /// blanks dropped, first occurrence wins.
    pub fn effective_symptoms(&self) -> Vec<String> {
        let tokens = self
            .selected
            .iter()
            .map(|s| s.trim())
            .chain(self.free_text.split(',').map(str::trim))
            .filter(|s| !s.is_empty());

        let mut symptoms: Vec<String> = Vec::new();
        for token in tokens {
            if !symptoms.iter().any(|s| s == token) {
                symptoms.push(token.to_string());
            }
        }
        symptoms
    }
}

/// Consciousness level on the AVPU scale, ordered from most to least responsive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Avpu {
    Alert,
    Verbal,
    Pain,
    Unresponsive,
}

impl Avpu {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" | "alert" => Some(Self::Alert),
            "v" | "verbal" | "voice" => Some(Self::Verbal),
            "p" | "pain" => Some(Self::Pain),
            "u" | "unresponsive" => Some(Self::Unresponsive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Alert => "Alert",
            Self::Verbal => "Verbal",
            Self::Pain => "Pain",
            Self::Unresponsive => "Unresponsive",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsInput {
    pub heart_rate_bpm: Option<u32>,
    pub bp_systolic: Option<u32>,
    pub bp_diastolic: Option<u32>,
    pub temperature_c: Option<f32>,
    pub spo2_percent: Option<u32>,
    pub respiratory_rate: Option<u32>,
    pub consciousness: Option<Avpu>,
}

/// Raw text as typed into the vitals step.
#[derive(Debug, Clone, Default)]
pub struct VitalsForm {
    pub heart_rate: String,
    pub bp_systolic: String,
    pub bp_diastolic: String,
    pub temperature: String,
    pub spo2: String,
    pub respiratory_rate: String,
    pub consciousness: String,
}

impl From<&VitalsForm> for VitalsInput {
    fn from(form: &VitalsForm) -> Self {
        Self {
            heart_rate_bpm: parse_field(&form.heart_rate),
            bp_systolic: parse_field(&form.bp_systolic),
            bp_diastolic: parse_field(&form.bp_diastolic),
            temperature_c: parse_field::<f32>(&form.temperature).filter(|t| t.is_finite()),
            spo2_percent: parse_field(&form.spo2),
            respiratory_rate: parse_field(&form.respiratory_rate),
            consciousness: Avpu::parse(&form.consciousness),
        }
    }
}
