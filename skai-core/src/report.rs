//! Export format selection for the final report.
//!
//! No file is ever written; the selection only drives the size estimate.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFormat {
    pub id: &'static str,
    pub name: &'static str,
    /// Human-readable size, `"<number> MB"` or `"<number> KB"`
    pub size: &'static str,
}

impl ReportFormat {
    /// Size in megabytes. KB values count as 0.001 MB each.
    pub fn size_mb(&self) -> f64 {
        let mut parts = self.size.split_whitespace();
        let value: f64 = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0.0);
        match parts.next() {
            Some("MB") => value,
            _ => value * 0.001,
        }
    }
}

pub static REPORT_FORMATS: [ReportFormat; 4] = [
    ReportFormat {
        id: "pdf",
        name: "PDF Report",
        size: "2.4 MB",
    },
    ReportFormat {
        id: "images",
        name: "Enhanced Images",
        size: "15.2 MB",
    },
    ReportFormat {
        id: "gis",
        name: "GIS Data",
        size: "892 KB",
    },
    ReportFormat {
        id: "json",
        name: "Raw Data (JSON)",
        size: "145 KB",
    },
];

/// Selected export formats, in the order they were picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSelection {
    selected: Vec<&'static str>,
}

impl Default for ReportSelection {
    fn default() -> Self {
        Self {
            selected: vec!["pdf"],
        }
    }
}

impl ReportSelection {
    pub fn formats(&self) -> &'static [ReportFormat] {
        &REPORT_FORMATS
    }

    /// Flip a format in or out. Unknown ids are ignored and return `false`.
    pub fn toggle(&mut self, id: &str) -> bool {
        let Some(format) = REPORT_FORMATS.iter().find(|f| f.id == id) else {
            return false;
        };
        if let Some(pos) = self.selected.iter().position(|s| *s == format.id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(format.id);
        }
        true
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| *s == id)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> impl Iterator<Item = &'static ReportFormat> + '_ {
        REPORT_FORMATS
            .iter()
            .filter(move |f| self.is_selected(f.id))
    }

    pub fn total_size_mb(&self) -> f64 {
        self.selected().map(ReportFormat::size_mb).sum()
    }

    /// Total size to one decimal, e.g. `"2.4"`.
    pub fn total_size_label(&self) -> String {
        format!("{:.1}", self.total_size_mb())
    }
}
