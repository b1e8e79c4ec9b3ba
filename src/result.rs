use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTermType {
    Standard,
    MarketFor,
    MarketIn,
    MarketBy,
}

impl MarketTermType {
    /// The connector word this classification rearranges around, or `None` for
    /// `Standard` (there is nothing to rearrange).
    pub fn connector(&self) -> Option<&'static str> {
        match self {
            MarketTermType::Standard => None,
            MarketTermType::MarketFor => Some("for"),
            MarketTermType::MarketIn => Some("in"),
            MarketTermType::MarketBy => Some("by"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStatus {
    Success,
    NoDatesPresent,
    DatesMissed,
}

/// One record per title. Constructed empty at the pipeline head, mutated in
/// place by each stage, then returned -- no stage mutates records belonging to
/// the pattern library.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub original_title: String,
    pub market_term_type: MarketTermType,
    pub extracted_date_range: Option<String>,
    pub date_status: DateStatus,
    pub extracted_report_type: Option<String>,
    pub extracted_regions: Vec<String>,
    pub topic: String,
    pub topic_name: String,
    pub confidence: f64,
    pub notes: Option<String>,
}

impl ExtractionResult {
    pub fn empty(original_title: &str) -> ExtractionResult {
        ExtractionResult {
            original_title: original_title.to_owned(),
            market_term_type: MarketTermType::Standard,
            extracted_date_range: None,
            date_status: DateStatus::NoDatesPresent,
            extracted_report_type: None,
            extracted_regions: Vec::new(),
            topic: String::new(),
            topic_name: String::new(),
            confidence: 0.0,
            notes: None,
        }
    }

    pub(crate) fn push_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.notes = Some(match self.notes.take() {
            Some(existing) => format!("{}; {}", existing, note),
            None => note,
        });
    }
}
