use std::collections::BTreeMap;

use crate::error::{Result, TriageError};
use crate::models::{AssessmentRequest, PatientInfo, SymptomInput, VitalsInput};

pub const HEART_RATE: &str = "heart_rate";
pub const BP_SYSTOLIC: &str = "bp";
pub const SPO2: &str = "spo2";
pub const TEMP_C: &str = "temp_c";
pub const RESPIRATORY_RATE: &str = "respiratory_rate";

/// Sparse vitals mapping for the classifier. Only provided vitals appear.
///
/// Diastolic pressure and AVPU stay in local state and are not transmitted.
pub fn vitals_map(vitals: &VitalsInput) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    let mut put = |key: &str, value: Option<f64>| {
        if let Some(v) = value {
            map.insert(key.to_string(), v);
        }
    };
    put(HEART_RATE, vitals.heart_rate_bpm.map(f64::from));
    put(BP_SYSTOLIC, vitals.bp_systolic.map(f64::from));
    put(SPO2, vitals.spo2_percent.map(f64::from));
    put(TEMP_C, vitals.temperature_c.map(f64::from));
    put(RESPIRATORY_RATE, vitals.respiratory_rate.map(f64::from));
    map
}

/// Build the classifier request, rejecting an empty effective symptom list.
pub fn build_request(
    patient: &PatientInfo,
    symptoms: &SymptomInput,
    vitals: &VitalsInput,
) -> Result<AssessmentRequest> {
    let symptom_list = symptoms.effective_symptoms();
    if symptom_list.is_empty() {
        return Err(TriageError::validation("at least one symptom required"));
    }
    Ok(AssessmentRequest {
        symptoms: symptom_list,
        vitals: vitals_map(vitals),
        age: patient.age,
        sex: patient.gender.clone(),
    })
}

/// Out-of-range findings in a vitals mapping, most urgent first.
pub fn vital_alerts(vitals: &BTreeMap<String, f64>) -> Vec<String> {
    let mut alerts = Vec::new();

    if let Some(&spo2) = vitals.get(SPO2) {
        if spo2 < 92.0 {
            alerts.push(format!("Low oxygen saturation: {}%", spo2));
        }
    }

    if let Some(&bp) = vitals.get(BP_SYSTOLIC) {
        if bp < 90.0 {
            alerts.push(format!("Low systolic pressure: {} mmHg", bp));
        }
    }

    if let Some(&hr) = vitals.get(HEART_RATE) {
        if hr > 120.0 {
            alerts.push(format!("High heart rate: {} bpm", hr));
        } else if hr < 50.0 {
            alerts.push(format!("Low heart rate: {} bpm", hr));
        }
    }

    if let Some(&rr) = vitals.get(RESPIRATORY_RATE) {
        if rr > 30.0 {
            alerts.push(format!("High respiratory rate: {}/min", rr));
        } else if rr < 8.0 {
            alerts.push(format!("Low respiratory rate: {}/min", rr));
        }
    }

    if let Some(&temp) = vitals.get(TEMP_C) {
        if temp >= 39.5 {
            alerts.push(format!("High fever: {} °C", temp));
        } else if temp < 35.0 {
            alerts.push(format!("Hypothermia: {} °C", temp));
        }
    }

    alerts
}
