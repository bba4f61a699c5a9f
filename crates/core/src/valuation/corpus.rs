use crate::domain::case::HistoricalCase;
use crate::valuation::ValuationError;

/// Synchronous source of the historical corpus.
///
/// Implementations read everything in one pass and report any failure to
/// produce the corpus as `NoDataAvailable`.
pub trait CaseCorpusProvider {
    fn load_corpus(&self) -> Result<Vec<HistoricalCase>, ValuationError>;
}

impl CaseCorpusProvider for [HistoricalCase] {
    fn load_corpus(&self) -> Result<Vec<HistoricalCase>, ValuationError> {
        Ok(self.to_vec())
    }
}

impl CaseCorpusProvider for Vec<HistoricalCase> {
    fn load_corpus(&self) -> Result<Vec<HistoricalCase>, ValuationError> {
        Ok(self.clone())
    }
}
