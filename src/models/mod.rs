mod account;
mod credentials;
mod result;
mod transaction;

pub use account::{ScrapedAccount, TransactionsAccount};
pub use credentials::Credentials;
pub use result::ScrapingResult;
pub use transaction::{
    BeneficiaryDetails, ScrapedTransaction, Transaction, TransactionStatus, TransactionType,
    TransactionsResponse,
};
