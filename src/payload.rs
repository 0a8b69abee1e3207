//! Inscription payload carried in the transaction data field
//!
//! Fields are substituted into the template verbatim. Nothing is escaped, so
//! indexers see exactly the configured strings.

use std::fmt;

/// Inscription-style mint instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InscriptionPayload {
    pub protocol: String,
    pub operation: String,
    pub tick: String,
    pub amount: String,
}

impl InscriptionPayload {
    pub fn new(protocol: &str, operation: &str, tick: &str, amount: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            operation: operation.to_string(),
            tick: tick.to_string(),
            amount: amount.to_string(),
        }
    }

    /// Bytes for the transaction data field
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for InscriptionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"data:,{{"p":"{}","op":"{}","tick":"{}","amt":"{}"}}"#,
            self.protocol, self.operation, self.tick, self.amount
        )
    }
}
