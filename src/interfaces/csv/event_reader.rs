use crate::domain::event::LedgerEvent;
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Reads ledger events from a CSV source.
///
/// Whitespace around fields is trimmed and rows may omit trailing columns, so
/// `paid, , , 3` is as valid as a fully populated row.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes events, one `Result` per row.
    pub fn events(self) -> impl Iterator<Item = Result<LedgerEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "type, instructor, course, reference, amount, upi_id\n\
                    sale, 1, 7, ord_1, 1000\n\
                    payout, 1, , , 300, tutor@upi\n\
                    paid, , , 1";
        let reader = EventReader::new(data.as_bytes());
        let results: Vec<Result<LedgerEvent>> = reader.events().collect();

        assert_eq!(results.len(), 3);
        let sale = results[0].as_ref().unwrap();
        assert_eq!(sale.r#type, EventType::Sale);
        assert_eq!(sale.amount, Some(dec!(1000)));
        assert_eq!(sale.upi_id, None);

        let payout = results[1].as_ref().unwrap();
        assert_eq!(payout.course, None);
        assert_eq!(payout.upi_id.as_deref(), Some("tutor@upi"));

        let paid = results[2].as_ref().unwrap();
        assert_eq!(paid.reference.as_deref(), Some("1"));
        assert_eq!(paid.amount, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "type, instructor, course, reference, amount, upi_id\n\
                    refund, 1, 1, ord_1, 10\n\
                    sale, x, 1, ord_2, 10";
        let reader = EventReader::new(data.as_bytes());
        let results: Vec<Result<LedgerEvent>> = reader.events().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_err());
    }
}
