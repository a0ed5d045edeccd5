//! BM25 term scoring.

/// BM25 with the usual term-frequency saturation (`k1`) and length
/// normalization (`b`) parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25 {
    fn default() -> Self {
        Bm25 { k1: 1.2, b: 0.75 }
    }
}

impl Bm25 {
    pub fn new(k1: f32, b: f32) -> Self {
        Bm25 { k1, b }
    }

    /// Inverse document frequency; always positive.
    pub fn idf(&self, doc_freq: usize, doc_count: usize) -> f32 {
        let n = doc_count as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Score of one term occurring `term_freq` times in a field of
    /// `field_len` tokens.
    pub fn score(
        &self,
        term_freq: u32,
        doc_freq: usize,
        doc_count: usize,
        field_len: u32,
        avg_field_len: f32,
    ) -> f32 {
        if term_freq == 0 {
            return 0.0;
        }
        let tf = term_freq as f32;
        let norm = if avg_field_len > 0.0 {
            1.0 - self.b + self.b * field_len as f32 / avg_field_len
        } else {
            1.0
        };
        self.idf(doc_freq, doc_count) * tf * (self.k1 + 1.0) / (tf + self.k1 * norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rare_terms_score_higher() {
        let bm25 = Bm25::default();
        let rare = bm25.score(1, 1, 100, 5, 5.0);
        let common = bm25.score(1, 80, 100, 5, 5.0);
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_shorter_fields_score_higher() {
        let bm25 = Bm25::default();
        assert!(bm25.score(1, 3, 100, 3, 10.0) > bm25.score(1, 3, 100, 30, 10.0));
    }

    #[test]
    fn test_frequency_saturates() {
        let bm25 = Bm25::default();
        let once = bm25.score(1, 3, 100, 10, 10.0);
        let twice = bm25.score(2, 3, 100, 10, 10.0);
        let many = bm25.score(20, 3, 100, 10, 10.0);
        assert!(twice > once);
        assert!(many < once * (bm25.k1 + 1.0) + f32::EPSILON);
        assert_eq!(bm25.score(0, 3, 100, 10, 10.0), 0.0);
    }
}
