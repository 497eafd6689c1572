//! Pre-authored results for each operation kind.
//!
//! Nothing here looks at the input images; the numbers are fixed.

use serde::Serialize;

use super::OperationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Translation key for the severity label
    pub fn label_key(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// A detected damage region. Geometry is in percent of the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageArea {
    pub id: u32,
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
    pub severity: Severity,
    pub kind: String,
    pub confidence: f32,
    pub building_count: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementResult {
    pub damage_areas_detected: usize,
    pub upscale_factor: u8,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageAnalysis {
    pub areas: Vec<DamageArea>,
}

impl DamageAnalysis {
    pub fn total_buildings(&self) -> u32 {
        self.areas.iter().map(|a| a.building_count).sum()
    }

    /// Mean detection confidence, rounded to a whole percent.
    pub fn mean_confidence_percent(&self) -> u32 {
        if self.areas.is_empty() {
            return 0;
        }
        let sum: f32 = self.areas.iter().map(|a| a.confidence).sum();
        (sum / self.areas.len() as f32 * 100.0).round() as u32
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.areas.iter().filter(|a| a.severity == severity).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfrastructureImpact {
    pub name: String,
    pub damaged_units: u32,
    pub damaged_percent: u8,
    pub priority: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulationImpact {
    pub affected: u32,
    pub displaced: u32,
    pub vulnerable: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageSummary {
    pub overall_severity: Severity,
    pub affected_area_km2: f32,
    pub damage_level_percent: u8,
    pub infrastructure: Vec<InfrastructureImpact>,
    pub population: PopulationImpact,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPackage {
    /// Translation key of the report title
    pub title_key: String,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "kebab-case")]
pub enum MockPayload {
    Enhancement(EnhancementResult),
    Analysis(DamageAnalysis),
    Summary(DamageSummary),
    Report(ReportPackage),
}

pub fn payload_for(kind: OperationKind) -> MockPayload {
    match kind {
        OperationKind::Enhance => MockPayload::Enhancement(enhancement()),
        OperationKind::Analyze => MockPayload::Analysis(analysis()),
        OperationKind::Summarize => MockPayload::Summary(summary()),
        OperationKind::GenerateReport => MockPayload::Report(report()),
    }
}

pub fn enhancement() -> EnhancementResult {
    EnhancementResult {
        damage_areas_detected: damage_areas().len(),
        upscale_factor: 4,
        model: "ESRGAN-SAT v2".to_string(),
    }
}

pub fn analysis() -> DamageAnalysis {
    DamageAnalysis {
        areas: damage_areas(),
    }
}

fn damage_areas() -> Vec<DamageArea> {
    let rows = [
        (
            1,
            20,
            30,
            15,
            12,
            Severity::High,
            "Building Collapse",
            0.94,
            12,
            "Complete structural failure of residential buildings",
        ),
        (
            2,
            60,
            45,
            10,
            8,
            Severity::Medium,
            "Road Damage",
            0.87,
            0,
            "Major road infrastructure damage with debris",
        ),
        (
            3,
            35,
            65,
            18,
            10,
            Severity::High,
            "Infrastructure",
            0.91,
            8,
            "Critical infrastructure damage including power lines",
        ),
        (
            4,
            75,
            20,
            12,
            15,
            Severity::Low,
            "Debris Field",
            0.76,
            3,
            "Scattered debris with minor structural damage",
        ),
    ];

    rows.into_iter()
        .map(
            |(id, x, y, width, height, severity, kind, confidence, building_count, description)| {
                DamageArea {
                    id,
                    x,
                    y,
                    width,
                    height,
                    severity,
                    kind: kind.to_string(),
                    confidence,
                    building_count,
                    description: description.to_string(),
                }
            },
        )
        .collect()
}

pub fn summary() -> DamageSummary {
    let infrastructure = [
        ("Residential Buildings", 1247, 68, Severity::High),
        ("Hospitals & Clinics", 3, 42, Severity::High),
        ("Roads & Bridges", 28, 35, Severity::Medium),
        ("Schools", 12, 25, Severity::Medium),
        ("Power Grid", 45, 18, Severity::Low),
    ]
    .into_iter()
    .map(|(name, damaged_units, damaged_percent, priority)| InfrastructureImpact {
        name: name.to_string(),
        damaged_units,
        damaged_percent,
        priority,
    })
    .collect();

    DamageSummary {
        overall_severity: Severity::High,
        affected_area_km2: 12.5,
        damage_level_percent: 68,
        infrastructure,
        population: PopulationImpact {
            affected: 125_000,
            displaced: 45_000,
            vulnerable: 18_500,
        },
        narrative: "Severe structural damage is concentrated in dense residential blocks of \
                    Port-au-Prince. Medical access and road clearance are the immediate priorities."
            .to_string(),
    }
}

pub fn report() -> ReportPackage {
    ReportPackage {
        title_key: "disasterReport".to_string(),
        sections: vec![
            "Damage assessment".to_string(),
            "Population impact analysis".to_string(),
            "Operational recommendations".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_totals() {
        let analysis = analysis();
        assert_eq!(analysis.areas.len(), 4);
        assert_eq!(analysis.total_buildings(), 23);
        assert_eq!(analysis.mean_confidence_percent(), 87);
        assert_eq!(analysis.count_by_severity(Severity::High), 2);
    }

    #[test]
    fn test_enhancement_matches_analysis() {
        assert_eq!(enhancement().damage_areas_detected, analysis().areas.len());
    }

    #[test]
    fn test_payload_kind_matches_operation() {
        assert!(matches!(
            payload_for(OperationKind::Enhance),
            MockPayload::Enhancement(_)
        ));
        assert!(matches!(
            payload_for(OperationKind::Analyze),
            MockPayload::Analysis(_)
        ));
        assert!(matches!(
            payload_for(OperationKind::Summarize),
            MockPayload::Summary(_)
        ));
        assert!(matches!(
            payload_for(OperationKind::GenerateReport),
            MockPayload::Report(_)
        ));
    }

    #[test]
    fn test_empty_analysis_confidence() {
        let empty = DamageAnalysis { areas: vec![] };
        assert_eq!(empty.mean_confidence_percent(), 0);
    }
}
