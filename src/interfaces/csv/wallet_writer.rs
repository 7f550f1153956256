use crate::domain::wallet::Wallet;
use std::io::Write;

/// Writes final wallet balances as CSV, one row per instructor.
pub struct WalletWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> WalletWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Rows are ordered by instructor id so output is stable across backends.
    pub fn write_wallets(&mut self, mut wallets: Vec<Wallet>) -> csv::Result<()> {
        wallets.sort_by_key(Wallet::instructor);

        self.writer.write_record([
            "instructor",
            "available",
            "pending",
            "withdrawable",
            "total_earned",
        ])?;
        for wallet in &wallets {
            self.writer.write_record([
                wallet.instructor().to_string(),
                wallet.available().to_string(),
                wallet.pending().to_string(),
                wallet.withdrawable().to_string(),
                wallet.total_earned().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
