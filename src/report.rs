//! Plain-text triage and handoff reports.

use crate::models::hospital::route_length_meters;
use crate::models::{AssessmentResult, HospitalCandidate, RouteStep, TriageCase};

pub const REVIEW_BANNER: &str = "Treat as HIGH priority — flag for doctor review";

/// One line per entry, each newline-terminated.
fn render(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

fn triage_lines(result: &AssessmentResult) -> Vec<String> {
    let mut lines = vec![
        "Triage Report".to_string(),
        format!("Emergency ID: {}", result.id),
        format!("Severity: {}", result.severity),
        format!("Confidence: {}%", result.confidence),
    ];
    if result.flagged_for_review() {
        lines.push(REVIEW_BANNER.to_string());
    }
    if result.severity != result.classifier_severity {
        lines.push(format!("Classifier reported: {}", result.classifier_severity));
    }
    lines.push("Recommended actions:".to_string());
    lines.extend(result.recommended_actions.iter().map(|action| format!("• {action}")));
    lines.extend(result.disclaimers.iter().map(|disclaimer| format!("Note: {disclaimer}")));
    lines
}

pub fn triage_report(result: &AssessmentResult) -> String {
    render(triage_lines(result))
}

pub fn handoff_report(case: &TriageCase, hospital: &HospitalCandidate) -> String {
    let mut lines = triage_lines(&case.assessment);
    lines.push(String::new());
    lines.push(format!("Receiving hospital: {} ({})", hospital.name, hospital.id));
    lines.push(format!(
        "ETA: {} min, {:.1} km, beds {}/{}{}",
        hospital.eta_minutes,
        hospital.distance_km,
        hospital.beds_available,
        hospital.beds_total,
        if hospital.specialist_on_call { ", specialist on call" } else { "" }
    ));

    let patient = &case.patient;
    lines.push(format!(
        "Patient: age {}, sex {}",
        patient.age.map_or_else(|| "unknown".to_string(), |a| a.to_string()),
        patient.gender.as_deref().unwrap_or("unknown")
    ));
    if let Some(history) = &patient.medical_history {
        lines.push(format!("History: {history}"));
    }
    if let Some(allergies) = &patient.allergies {
        lines.push(format!("Allergies: {allergies}"));
    }

    lines.push(format!("Symptoms: {}", case.symptoms.effective_symptoms().join(", ")));
    if let Some(minutes) = case.symptoms.duration_minutes {
        lines.push(format!("Onset: {minutes} min ago"));
    }

    let vitals = &case.vitals;
    let mut readings = Vec::new();
    if let Some(hr) = vitals.heart_rate_bpm {
        readings.push(format!("HR {hr}"));
    }
    match (vitals.bp_systolic, vitals.bp_diastolic) {
        (Some(s), Some(d)) => readings.push(format!("BP {s}/{d}")),
        (Some(s), None) => readings.push(format!("SBP {s}")),
        _ => {}
    }
    if let Some(spo2) = vitals.spo2_percent {
        readings.push(format!("SpO2 {spo2}%"));
    }
    if let Some(rr) = vitals.respiratory_rate {
        readings.push(format!("RR {rr}"));
    }
    if let Some(t) = vitals.temperature_c {
        readings.push(format!("Temp {t:.1} °C"));
    }
    if let Some(avpu) = vitals.consciousness {
        readings.push(format!("AVPU {}", avpu.label()));
    }
    if !readings.is_empty() {
        lines.push(format!("Vitals: {}", readings.join(", ")));
    }
    render(lines)
}

pub fn route_summary(steps: &[RouteStep]) -> String {
    let mut lines: Vec<String> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| match step.distance_meters {
            Some(m) => format!("{}. {} ({} m)", i + 1, step.instruction, m),
            None => format!("{}. {}", i + 1, step.instruction),
        })
        .collect();
    lines.push(format!("Total: {} m", route_length_meters(steps)));
    render(lines)
}
